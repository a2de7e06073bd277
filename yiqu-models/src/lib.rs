//! Chat relay for yiqu.
//!
//! This crate provides:
//! - [`Conversation`], the transcript a CLI session carries between turns
//! - Credential management for the chat service (system keyring + env fallback)
//! - The [`ChatProvider`](providers::ChatProvider) trait and the Spark WebSocket provider
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────┐   messages    ┌──────────────────────────┐
//! │       Conversation       │ ────────────▶ │   dyn ChatProvider       │
//! │ system, user/assistant…  │ ◀──────────── │  (SparkProvider: signed  │
//! └──────────────────────────┘  StreamChunk  │   wss, one per call)     │
//!                                            └────────────┬─────────────┘
//!                                                         │
//!                                            ┌────────────▼─────────────┐
//!                                            │     CredentialStore      │
//!                                            │ (Keyring + Env Fallback) │
//!                                            └──────────────────────────┘
//! ```

mod conversation;
mod error;
mod types;

pub mod auth;
pub mod providers;

pub use conversation::Conversation;
pub use error::{Error, Result};
pub use types::{Message, Role, StreamChunk, Usage};
