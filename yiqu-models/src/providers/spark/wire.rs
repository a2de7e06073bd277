//! JSON frames exchanged with the Spark chat endpoint.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Message, Result, StreamChunk, Usage};

/// `payload.choices.status` of the last fragment of a reply.
pub const FINAL_STATUS: i64 = 2;

// ────────────────────────────────────────────────────────────────────────────
// Request
// ────────────────────────────────────────────────────────────────────────────

/// The single frame sent after the socket opens.
#[derive(Debug, Serialize)]
pub struct RequestFrame<'a> {
    pub header: RequestHeader<'a>,
    pub parameter: Parameter<'a>,
    pub payload: RequestPayload<'a>,
}

#[derive(Debug, Serialize)]
pub struct RequestHeader<'a> {
    pub app_id: &'a str,
    pub uid: &'a str,
}

#[derive(Debug, Serialize)]
pub struct Parameter<'a> {
    pub chat: ChatParameter<'a>,
}

#[derive(Debug, Serialize)]
pub struct ChatParameter<'a> {
    pub domain: &'a str,
    pub temperature: f32,
    pub max_tokens: u32,
    pub auditing: &'a str,
}

#[derive(Debug, Serialize)]
pub struct RequestPayload<'a> {
    pub message: MessageText<'a>,
}

#[derive(Debug, Serialize)]
pub struct MessageText<'a> {
    pub text: &'a [Message],
}

// ────────────────────────────────────────────────────────────────────────────
// Response
// ────────────────────────────────────────────────────────────────────────────

/// One streamed response frame.
#[derive(Debug, Deserialize)]
pub struct ResponseFrame {
    pub header: ResponseHeader,
    #[serde(default)]
    pub payload: Option<ResponsePayload>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseHeader {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    /// Session id assigned by the service.
    #[serde(default)]
    pub sid: String,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePayload {
    pub choices: Choices,
    #[serde(default)]
    pub usage: Option<UsagePayload>,
}

#[derive(Debug, Deserialize)]
pub struct Choices {
    pub status: i64,
    #[serde(default)]
    pub seq: i64,
    #[serde(default)]
    pub text: Vec<TextPart>,
}

#[derive(Debug, Deserialize)]
pub struct TextPart {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct UsagePayload {
    pub text: UsageText,
}

#[derive(Debug, Deserialize)]
pub struct UsageText {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
}

impl ResponseFrame {
    /// Convert to a streaming chunk, turning a non-zero code into an error.
    pub fn into_chunk(self) -> Result<StreamChunk> {
        if self.header.code != 0 {
            return Err(Error::ProviderApi {
                code: self.header.code,
                message: format!("{} (sid {})", self.header.message, self.header.sid),
            });
        }

        let payload = self
            .payload
            .ok_or_else(|| Error::Request("response frame without payload".to_string()))?;

        debug!(
            sid = self.header.sid.as_str(),
            seq = payload.choices.seq,
            status = payload.choices.status,
            "response fragment"
        );

        let text: String = payload
            .choices
            .text
            .iter()
            .map(|part| part.content.as_str())
            .collect();

        Ok(StreamChunk {
            delta: (!text.is_empty()).then_some(text),
            finished: payload.choices.status == FINAL_STATUS,
            usage: payload
                .usage
                .map(|u| Usage::new(u.text.prompt_tokens, u.text.completion_tokens)),
        })
    }
}

/// Parse a text frame into a chunk.
pub fn decode(frame: &str) -> Result<StreamChunk> {
    serde_json::from_str::<ResponseFrame>(frame)?.into_chunk()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_frame_matches_wire_layout() {
        let messages = vec![Message::system("你是医疗助手"), Message::user("你好")];
        let frame = RequestFrame {
            header: RequestHeader {
                app_id: "app",
                uid: "1234",
            },
            parameter: Parameter {
                chat: ChatParameter {
                    domain: "generalv3.5",
                    temperature: 0.5,
                    max_tokens: 4096,
                    auditing: "default",
                },
            },
            payload: RequestPayload {
                message: MessageText { text: &messages },
            },
        };

        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "header": {"app_id": "app", "uid": "1234"},
                "parameter": {"chat": {
                    "domain": "generalv3.5",
                    "temperature": 0.5,
                    "max_tokens": 4096,
                    "auditing": "default"
                }},
                "payload": {"message": {"text": [
                    {"role": "system", "content": "你是医疗助手"},
                    {"role": "user", "content": "你好"}
                ]}}
            })
        );
    }

    #[test]
    fn decode_intermediate_fragment() {
        let frame = r#"{
            "header": {"code": 0, "message": "Success", "sid": "cht000", "status": 1},
            "payload": {"choices": {"status": 1, "seq": 0,
                "text": [{"content": "您好", "role": "assistant", "index": 0}]}}
        }"#;

        let chunk = decode(frame).unwrap();
        assert_eq!(chunk.delta.as_deref(), Some("您好"));
        assert!(!chunk.finished);
        assert!(chunk.usage.is_none());
    }

    #[test]
    fn decode_final_fragment_with_usage() {
        let frame = r#"{
            "header": {"code": 0, "message": "Success", "sid": "cht000", "status": 2},
            "payload": {
                "choices": {"status": 2, "seq": 3,
                    "text": [{"content": "。", "role": "assistant", "index": 0}]},
                "usage": {"text": {"question_tokens": 4, "prompt_tokens": 5,
                    "completion_tokens": 9, "total_tokens": 14}}
            }
        }"#;

        let chunk = decode(frame).unwrap();
        assert!(chunk.finished);
        assert_eq!(chunk.usage, Some(Usage::new(5, 9)));
    }

    #[test]
    fn decode_empty_text_has_no_delta() {
        let frame = r#"{"header": {"code": 0}, "payload": {"choices": {"status": 2, "text": []}}}"#;
        let chunk = decode(frame).unwrap();
        assert!(chunk.delta.is_none());
        assert!(chunk.finished);
    }

    #[test]
    fn decode_nonzero_code_is_provider_error() {
        let frame = r#"{"header": {"code": 10013, "message": "input audit failed", "sid": "cht001"}}"#;
        let err = decode(frame).unwrap_err();
        match err {
            Error::ProviderApi { code, message } => {
                assert_eq!(code, 10013);
                assert!(message.contains("input audit failed"));
                assert!(message.contains("cht001"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn decode_rejects_malformed_json() {
        assert!(matches!(decode("{not json"), Err(Error::Serialization(_))));
    }

    #[test]
    fn decode_success_without_payload_is_an_error() {
        let err = decode(r#"{"header": {"code": 0}}"#).unwrap_err();
        assert!(matches!(err, Error::Request(_)));
    }
}
