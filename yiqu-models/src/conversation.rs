//! The conversation transcript carried across chat turns.

use std::time::Duration;

use tokio_stream::StreamExt;
use tracing::{debug, warn};

use crate::providers::ChatProvider;
use crate::{Error, Message, Result, Role};

/// Ordered transcript: one system message, then user/assistant pairs.
///
/// Only [`send`](Conversation::send) appends, and it appends a user message and
/// its reply together or not at all.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
    context_window: Option<usize>,
}

impl Conversation {
    /// Start a transcript with the assistant's system prompt.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
            context_window: None,
        }
    }

    /// Only send the system prompt plus the last `window` messages.
    pub fn with_context_window(mut self, window: usize) -> Self {
        self.context_window = Some(window.max(1));
        self
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The most recent assistant reply.
    pub fn last_reply(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .map(|m| m.content.as_str())
    }

    /// Messages sent to the provider for the next turn.
    pub fn outbound(&self) -> Vec<Message> {
        let Some(window) = self.context_window else {
            return self.messages.clone();
        };

        let (system, dialog): (Vec<&Message>, Vec<&Message>) = self
            .messages
            .iter()
            .partition(|m| m.role == Role::System);
        let mut skip = dialog.len().saturating_sub(window);
        // the window must open on a user turn
        while dialog.get(skip).is_some_and(|m| m.role != Role::User) {
            skip += 1;
        }

        system
            .into_iter()
            .chain(dialog.into_iter().skip(skip))
            .cloned()
            .collect()
    }

    /// Send `content` and wait for the whole reply.
    ///
    /// `on_delta` sees each text fragment as it arrives. The reply is appended to
    /// the transcript and returned. On error or timeout the user message is removed
    /// again and nothing partial is kept.
    pub async fn send<F>(
        &mut self,
        provider: &dyn ChatProvider,
        content: impl Into<String>,
        timeout: Duration,
        mut on_delta: F,
    ) -> Result<String>
    where
        F: FnMut(&str),
    {
        self.messages.push(Message::user(content));
        let outbound = self.outbound();
        debug!(
            provider = provider.name(),
            messages = outbound.len(),
            "sending conversation turn"
        );

        let result =
            match tokio::time::timeout(timeout, collect_reply(provider, &outbound, &mut on_delta))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(Error::Timeout(timeout)),
            };

        match result {
            Ok(reply) => {
                self.messages.push(Message::assistant(reply.clone()));
                Ok(reply)
            }
            Err(err) => {
                warn!(error = %err, "chat turn failed");
                self.messages.pop();
                Err(err)
            }
        }
    }
}

async fn collect_reply<F>(
    provider: &dyn ChatProvider,
    messages: &[Message],
    on_delta: &mut F,
) -> Result<String>
where
    F: FnMut(&str),
{
    let mut stream = provider.chat_stream(messages).await?;
    let mut reply = String::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if let Some(delta) = chunk.delta.as_deref() {
            on_delta(delta);
            reply.push_str(delta);
        }
        if let Some(usage) = &chunk.usage {
            debug!(
                input = usage.input_tokens,
                output = usage.output_tokens,
                total = usage.total_tokens,
                "token usage"
            );
        }
        if chunk.finished {
            return Ok(reply);
        }
    }

    Err(Error::ConnectionClosed)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::providers::ChatStream;
    use crate::{StreamChunk, Usage};

    /// Replays fixed chunks and records what it was sent. `None` yields an API error.
    struct MockProvider {
        chunks: Vec<Option<StreamChunk>>,
        seen: Mutex<Vec<Vec<Message>>>,
    }

    impl MockProvider {
        fn replying(parts: &[&str]) -> Self {
            let mut chunks: Vec<_> = parts.iter().map(|p| Some(StreamChunk::text(*p))).collect();
            if let Some(Some(last)) = chunks.pop() {
                chunks.push(Some(StreamChunk {
                    usage: Some(Usage::new(5, 7)),
                    ..last.last()
                }));
            }
            Self::with_chunks(chunks)
        }

        fn with_chunks(chunks: Vec<Option<StreamChunk>>) -> Self {
            Self {
                chunks,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatProvider for MockProvider {
        fn name(&self) -> &str {
            "mock"
        }

        async fn chat_stream(&self, messages: &[Message]) -> Result<ChatStream> {
            self.seen.lock().unwrap().push(messages.to_vec());
            let chunks: Vec<Result<StreamChunk>> = self
                .chunks
                .iter()
                .map(|c| {
                    c.clone().ok_or_else(|| Error::ProviderApi {
                        code: 10013,
                        message: "rejected".to_string(),
                    })
                })
                .collect();
            Ok(Box::pin(tokio_stream::iter(chunks)))
        }
    }

    /// Never yields anything.
    struct StalledProvider;

    #[async_trait]
    impl ChatProvider for StalledProvider {
        fn name(&self) -> &str {
            "stalled"
        }

        async fn chat_stream(&self, _messages: &[Message]) -> Result<ChatStream> {
            Ok(Box::pin(futures_util::stream::pending::<Result<StreamChunk>>()))
        }
    }

    const TIMEOUT: Duration = Duration::from_secs(30);

    #[tokio::test]
    async fn send_accumulates_fragments_into_one_reply() {
        let provider = MockProvider::replying(&["您好，", "我是", "医疗助手。"]);
        let mut conversation = Conversation::new("你是一名医疗助手");
        let mut fragments = Vec::new();

        let reply = conversation
            .send(&provider, "你好", TIMEOUT, |d| fragments.push(d.to_string()))
            .await
            .unwrap();

        assert_eq!(reply, "您好，我是医疗助手。");
        assert_eq!(fragments, vec!["您好，", "我是", "医疗助手。"]);
        assert_eq!(conversation.last_reply(), Some("您好，我是医疗助手。"));
    }

    #[tokio::test]
    async fn transcript_alternates_after_turns() {
        let provider = MockProvider::replying(&["好的"]);
        let mut conversation = Conversation::new("system");

        conversation.send(&provider, "一", TIMEOUT, |_| {}).await.unwrap();
        conversation.send(&provider, "二", TIMEOUT, |_| {}).await.unwrap();

        let roles: Vec<_> = conversation.messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                Role::System,
                Role::User,
                Role::Assistant,
                Role::User,
                Role::Assistant
            ]
        );
    }

    #[tokio::test]
    async fn provider_receives_full_transcript() {
        let provider = MockProvider::replying(&["好"]);
        let mut conversation = Conversation::new("system");

        conversation.send(&provider, "一", TIMEOUT, |_| {}).await.unwrap();
        conversation.send(&provider, "二", TIMEOUT, |_| {}).await.unwrap();

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen[0].len(), 2);
        assert_eq!(seen[1].len(), 4);
        assert_eq!(seen[1][3], Message::user("二"));
    }

    #[tokio::test]
    async fn api_error_rolls_back_user_message() {
        let provider = MockProvider::with_chunks(vec![Some(StreamChunk::text("部分")), None]);
        let mut conversation = Conversation::new("system");

        let err = conversation
            .send(&provider, "你好", TIMEOUT, |_| {})
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ProviderApi { code: 10013, .. }));
        assert_eq!(conversation.messages().len(), 1);
        assert!(conversation.last_reply().is_none());
    }

    #[tokio::test]
    async fn stream_ending_without_final_chunk_is_an_error() {
        let provider = MockProvider::with_chunks(vec![Some(StreamChunk::text("半句"))]);
        let mut conversation = Conversation::new("system");

        let err = conversation
            .send(&provider, "你好", TIMEOUT, |_| {})
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ConnectionClosed));
        assert_eq!(conversation.messages().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_reply_times_out() {
        let mut conversation = Conversation::new("system");

        let err = conversation
            .send(&StalledProvider, "你好", Duration::from_secs(5), |_| {})
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Timeout(d) if d == Duration::from_secs(5)));
        assert_eq!(conversation.messages().len(), 1);
    }

    #[test]
    fn context_window_keeps_system_and_recent_messages() {
        let mut conversation = Conversation::new("system").with_context_window(3);
        conversation.messages.extend([
            Message::user("u1"),
            Message::assistant("a1"),
            Message::user("u2"),
            Message::assistant("a2"),
            Message::user("u3"),
        ]);

        let outbound = conversation.outbound();

        assert_eq!(
            outbound,
            vec![
                Message::system("system"),
                Message::user("u2"),
                Message::assistant("a2"),
                Message::user("u3"),
            ]
        );
    }

    #[test]
    fn even_context_window_never_opens_on_assistant() {
        let mut conversation = Conversation::new("system").with_context_window(2);
        conversation.messages.extend([
            Message::user("u1"),
            Message::assistant("a1"),
            Message::user("u2"),
        ]);

        assert_eq!(
            conversation.outbound(),
            vec![Message::system("system"), Message::user("u2")]
        );

        conversation
            .messages
            .extend([Message::assistant("a2"), Message::user("u3")]);
        let roles: Vec<_> = conversation.outbound().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User]);
    }

    #[test]
    fn no_context_window_sends_everything() {
        let mut conversation = Conversation::new("system");
        conversation
            .messages
            .extend([Message::user("u1"), Message::assistant("a1")]);
        assert_eq!(conversation.outbound().len(), 3);
    }
}
