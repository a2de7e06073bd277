//! iFlytek Spark chat provider.
//!
//! Each call signs a fresh connection URL, opens one WebSocket session, sends the
//! whole transcript in a single frame and streams back text fragments until the
//! service marks the reply finished.
//!
//! # Example
//!
//! ```ignore
//! use yiqu_models::providers::{SparkConfig, SparkProvider};
//!
//! let provider = SparkProvider::new(SparkConfig::default(), credentials)?;
//! ```

pub mod signer;
pub mod wire;

use async_trait::async_trait;
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, warn};

use self::signer::RequestSigner;
use self::wire::{
    ChatParameter, MessageText, Parameter, RequestFrame, RequestHeader, RequestPayload,
};
use super::{ChatProvider, ChatStream};
use crate::auth::SparkCredentials;
use crate::{Error, Message, Result, StreamChunk};

/// Default Spark endpoint (v3.5 "Max").
pub const DEFAULT_ENDPOINT: &str = "wss://spark-api.xf-yun.com/v3.5/chat";

/// Default model domain for [`DEFAULT_ENDPOINT`].
pub const DEFAULT_DOMAIN: &str = "generalv3.5";

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Request parameters for the Spark service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparkConfig {
    pub endpoint: String,
    pub domain: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// End-user id sent in the request header.
    pub uid: String,
    pub auditing: String,
}

impl Default for SparkConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            domain: DEFAULT_DOMAIN.to_string(),
            temperature: 0.5,
            max_tokens: 4096,
            uid: "1234".to_string(),
            auditing: "default".to_string(),
        }
    }
}

/// Spark WebSocket chat provider.
pub struct SparkProvider {
    config: SparkConfig,
    credentials: SparkCredentials,
    signer: RequestSigner,
}

impl SparkProvider {
    /// Create a provider; fails if the endpoint is not a WebSocket URL.
    pub fn new(config: SparkConfig, credentials: SparkCredentials) -> Result<Self> {
        let signer = RequestSigner::new(&config.endpoint)?;
        Ok(Self {
            config,
            credentials,
            signer,
        })
    }

    pub fn config(&self) -> &SparkConfig {
        &self.config
    }

    /// Serialize the request frame for `messages`.
    pub fn request_frame(&self, messages: &[Message]) -> Result<String> {
        let frame = RequestFrame {
            header: RequestHeader {
                app_id: &self.credentials.app_id,
                uid: &self.config.uid,
            },
            parameter: Parameter {
                chat: ChatParameter {
                    domain: &self.config.domain,
                    temperature: self.config.temperature,
                    max_tokens: self.config.max_tokens,
                    auditing: &self.config.auditing,
                },
            },
            payload: RequestPayload {
                message: MessageText { text: messages },
            },
        };
        Ok(serde_json::to_string(&frame)?)
    }

    async fn open(&self) -> Result<Socket> {
        let url = self.signer.sign(
            self.credentials.api_key.expose_secret(),
            self.credentials.api_secret.expose_secret(),
            Utc::now(),
        )?;
        debug!(
            host = self.signer.host(),
            path = self.signer.path(),
            "opening chat session"
        );

        let (socket, _response) = connect_async(url.as_str()).await?;
        Ok(socket)
    }
}

#[async_trait]
impl ChatProvider for SparkProvider {
    fn name(&self) -> &str {
        "spark"
    }

    async fn chat_stream(&self, messages: &[Message]) -> Result<ChatStream> {
        let frame = self.request_frame(messages)?;
        let mut socket = self.open().await?;
        socket.send(WsMessage::Text(frame.into())).await?;

        Ok(Box::pin(futures_util::stream::unfold(Some(socket), next_chunk)))
    }
}

/// Read frames until one yields a chunk; close the socket after the last chunk
/// or the first error.
async fn next_chunk(socket: Option<Socket>) -> Option<(Result<StreamChunk>, Option<Socket>)> {
    let mut socket = socket?;
    loop {
        let frame = match socket.next().await {
            Some(Ok(WsMessage::Text(text))) => text,
            Some(Ok(WsMessage::Close(frame))) => {
                debug!(?frame, "server closed chat session");
                return None;
            }
            Some(Ok(_)) => continue,
            Some(Err(err)) => return Some((Err(err.into()), None)),
            None => return None,
        };

        return match wire::decode(frame.as_str()) {
            Ok(chunk) if chunk.finished => {
                close(&mut socket).await;
                Some((Ok(chunk), None))
            }
            Ok(chunk) => Some((Ok(chunk), Some(socket))),
            Err(err) => {
                if let Error::ProviderApi { code, message } = &err {
                    warn!(code, message = message.as_str(), "chat service returned an error");
                }
                close(&mut socket).await;
                Some((Err(err), None))
            }
        };
    }
}

async fn close(socket: &mut Socket) {
    if let Err(err) = socket.close(None).await {
        debug!(error = %err, "closing chat session");
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use super::*;
    use crate::auth::Secret;
    use crate::{Conversation, Role};

    fn credentials() -> SparkCredentials {
        SparkCredentials {
            app_id: "app-1".to_string(),
            api_key: Secret::new("key"),
            api_secret: Secret::new("secret"),
        }
    }

    #[test]
    fn default_config_targets_v35() {
        let config = SparkConfig::default();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.domain, "generalv3.5");
        assert_eq!(config.max_tokens, 4096);
        assert_eq!(config.uid, "1234");
    }

    #[test]
    fn new_rejects_http_endpoint() {
        let config = SparkConfig {
            endpoint: "https://example.com/chat".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            SparkProvider::new(config, credentials()),
            Err(Error::InvalidUrl(_))
        ));
    }

    #[test]
    fn request_frame_uses_config_and_credentials() {
        let config = SparkConfig {
            domain: "4.0Ultra".to_string(),
            temperature: 0.25,
            max_tokens: 2048,
            ..Default::default()
        };
        let provider = SparkProvider::new(config, credentials()).unwrap();

        let frame = provider.request_frame(&[Message::user("你好")]).unwrap();
        let json: serde_json::Value = serde_json::from_str(&frame).unwrap();

        assert_eq!(json["header"]["app_id"], "app-1");
        assert_eq!(json["header"]["uid"], "1234");
        assert_eq!(json["parameter"]["chat"]["domain"], "4.0Ultra");
        assert_eq!(json["parameter"]["chat"]["temperature"], 0.25);
        assert_eq!(json["parameter"]["chat"]["max_tokens"], 2048);
        assert_eq!(json["payload"]["message"]["text"][0]["content"], "你好");
        assert!(!frame.contains("secret"), "secrets never go into the frame");
    }

    #[test]
    fn provider_name_is_spark() {
        let provider = SparkProvider::new(SparkConfig::default(), credentials()).unwrap();
        assert_eq!(provider.name(), "spark");
    }

    // ==================== Session Tests ====================

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn fragment(status: i64, seq: i64, content: &str) -> WsMessage {
        let frame = json!({
            "header": {"code": 0, "message": "Success", "sid": "cht01", "status": status},
            "payload": {"choices": {"status": status, "seq": seq,
                "text": [{"content": content, "role": "assistant", "index": 0}]}}
        });
        WsMessage::Text(frame.to_string().into())
    }

    /// Accept one session, answer its request with `frames`, and return the
    /// request frame once the client goes away.
    async fn serve_once(frames: Vec<WsMessage>) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

            let request = match ws.next().await {
                Some(Ok(WsMessage::Text(text))) => text.as_str().to_string(),
                other => panic!("expected a text request frame, got {other:?}"),
            };
            for frame in frames {
                if ws.send(frame).await.is_err() {
                    break;
                }
            }
            while let Some(Ok(message)) = ws.next().await {
                if message.is_close() {
                    break;
                }
            }
            request
        });

        (format!("ws://{addr}/v3.5/chat"), handle)
    }

    fn local_provider(endpoint: String) -> SparkProvider {
        let config = SparkConfig {
            endpoint,
            ..Default::default()
        };
        SparkProvider::new(config, credentials()).unwrap()
    }

    #[tokio::test]
    async fn session_streams_until_final_status() {
        let (endpoint, server) = serve_once(vec![
            fragment(0, 0, "您"),
            fragment(1, 1, "好"),
            fragment(2, 2, "。"),
        ])
        .await;
        let provider = local_provider(endpoint);
        let mut conversation = Conversation::new("system");
        let mut fragments = Vec::new();

        let reply = conversation
            .send(&provider, "你好", TIMEOUT, |d| fragments.push(d.to_string()))
            .await
            .unwrap();

        assert_eq!(reply, "您好。");
        assert_eq!(fragments, vec!["您", "好", "。"]);
        assert_eq!(conversation.messages().len(), 3);
        assert_eq!(conversation.messages()[2].role, Role::Assistant);

        let request: serde_json::Value = serde_json::from_str(&server.await.unwrap()).unwrap();
        assert_eq!(request["header"]["app_id"], "app-1");
        assert_eq!(request["payload"]["message"]["text"][1]["content"], "你好");
    }

    #[tokio::test]
    async fn session_error_code_fails_the_turn() {
        let rejected = json!({
            "header": {"code": 10013, "message": "input audit failed", "sid": "cht02", "status": 2}
        });
        let (endpoint, server) =
            serve_once(vec![WsMessage::Text(rejected.to_string().into())]).await;
        let provider = local_provider(endpoint);
        let mut conversation = Conversation::new("system");

        let err = conversation
            .send(&provider, "你好", TIMEOUT, |_| {})
            .await
            .unwrap_err();

        match err {
            Error::ProviderApi { code, message } => {
                assert_eq!(code, 10013);
                assert_eq!(message, "input audit failed (sid cht02)");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(conversation.messages().len(), 1);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn session_closed_before_final_status() {
        let (endpoint, server) =
            serve_once(vec![fragment(0, 0, "半句"), WsMessage::Close(None)]).await;
        let provider = local_provider(endpoint);
        let mut conversation = Conversation::new("system");

        let err = conversation
            .send(&provider, "你好", TIMEOUT, |_| {})
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ConnectionClosed));
        assert_eq!(conversation.messages().len(), 1);
        assert!(conversation.last_reply().is_none());
        server.await.unwrap();
    }
}
