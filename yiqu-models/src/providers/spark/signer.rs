//! Query-string request signing for the Spark WebSocket endpoint.
//!
//! The signature is `base64(HMAC-SHA256(api_secret, "host: H\ndate: D\nGET P HTTP/1.1"))`
//! and travels, together with the date and host, as URL query parameters.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use url::Url;

use crate::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// Signs connection URLs for one endpoint.
#[derive(Debug, Clone)]
pub struct RequestSigner {
    endpoint: Url,
    host: String,
}

impl RequestSigner {
    /// Parse and validate a `ws://` or `wss://` endpoint.
    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint =
            Url::parse(endpoint).map_err(|e| Error::InvalidUrl(format!("{endpoint}: {e}")))?;
        if !matches!(endpoint.scheme(), "ws" | "wss") {
            return Err(Error::InvalidUrl(format!(
                "{endpoint}: expected ws:// or wss://"
            )));
        }
        let host = match (endpoint.host_str(), endpoint.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => return Err(Error::InvalidUrl(format!("{endpoint}: missing host"))),
        };

        Ok(Self { endpoint, host })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn path(&self) -> &str {
        self.endpoint.path()
    }

    /// The string the HMAC is computed over.
    pub fn canonical_string(&self, date: &str) -> String {
        format!(
            "host: {}\ndate: {}\nGET {} HTTP/1.1",
            self.host,
            date,
            self.path()
        )
    }

    /// Build the authenticated connection URL for `date`.
    pub fn sign(&self, api_key: &str, api_secret: &str, date: DateTime<Utc>) -> Result<Url> {
        let date = rfc1123(date);
        let signature = hmac_base64(api_secret, &self.canonical_string(&date))?;
        let authorization = STANDARD.encode(format!(
            r#"api_key="{api_key}", algorithm="hmac-sha256", headers="host date request-line", signature="{signature}""#
        ));

        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("authorization", &authorization)
            .append_pair("date", &date)
            .append_pair("host", &self.host);
        Ok(url)
    }
}

/// HTTP date, e.g. `Sun, 18 Oct 2026 08:30:00 GMT`.
pub fn rfc1123(date: DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn hmac_base64(secret: &str, message: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| Error::Request(format!("signing key rejected: {e}")))?;
    mac.update(message.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}
