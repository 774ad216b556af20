//! Factbook Core - Client library for the factbook marketing backend.
//!
//! The backend generates marketing factbooks and strategies and streams chat
//! answers as plain UTF-8 text. This crate provides:
//!
//! - **API client**: typed async access to the factbook/strategy/activity
//!   endpoints, including multipart generation requests
//! - **Streaming chat**: an incremental chat consumer that appends decoded
//!   text to the transcript as it arrives
//! - **List shaping**: the in-memory filter/sort/paginate helpers the list
//!   views are built from
//!
//! # Example
//!
//! ```rust,no_run
//! use factbook_core::api::FactbookClient;
//! use factbook_core::chat::ChatSession;
//!
//! # async fn run() -> factbook_core::Result<()> {
//! let client = FactbookClient::new("http://localhost:8000");
//!
//! let mut session = ChatSession::new(client.clone(), None);
//! session
//!     .send("Summarize the strategy", |message| {
//!         print!("{}", message.content);
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod chat;
pub mod library;

// Re-export commonly used types
pub use api::types::{
    Activity, ChatRequest, CreateFactbookRequest, CreateStrategyRequest, Factbook, LlmLog,
    Strategy,
};
pub use api::FactbookClient;
pub use chat::{ChatMessage, ChatRole, ChatSession, StreamDecoder};
pub use library::{LogFilter, LogStats, StrategyFilter, StrategySort};

/// Error types for factbook-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request failed: {status} {message}")]
    Api { status: u16, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("chat input is empty")]
    EmptyInput,

    #[error("a chat request is already in flight")]
    ChatBusy,
}

/// Result type for factbook-core operations.
pub type Result<T> = std::result::Result<T, Error>;
