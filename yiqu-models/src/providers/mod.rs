//! Chat provider trait and implementations.
//!
//! The [`ChatProvider`] trait is the only contract the rest of yiqu relies on:
//! hand over the transcript, get back a stream of text fragments that ends with a
//! finished chunk.
//!
//! # Example
//!
//! ```ignore
//! use yiqu_models::providers::{ChatProvider, SparkConfig, SparkProvider};
//!
//! let provider = SparkProvider::new(SparkConfig::default(), credentials)?;
//! let mut stream = provider.chat_stream(conversation.messages()).await?;
//! ```

pub mod spark;

use std::pin::Pin;

use async_trait::async_trait;
use tokio_stream::Stream;

pub use spark::{SparkConfig, SparkProvider};

use crate::{Message, Result, StreamChunk};

/// A stream of chat response chunks.
///
/// This is a pinned, boxed stream that yields [`StreamChunk`] items or errors.
pub type ChatStream = Pin<Box<dyn Stream<Item = Result<StreamChunk>> + Send>>;

/// A remote (or mock) chat service.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Provider identifier used in logs (e.g. "spark").
    fn name(&self) -> &str;

    /// Open one exchange for `messages` and stream the reply.
    ///
    /// The stream's last item is a chunk with `finished` set, or an error.
    async fn chat_stream(&self, messages: &[Message]) -> Result<ChatStream>;
}
