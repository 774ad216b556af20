//! Streaming chat: incremental UTF-8 decoding and session state.

pub mod decoder;
pub mod session;

pub use decoder::{decode_stream, StreamDecoder};
pub use session::{ChatMessage, ChatRole, ChatSession};
