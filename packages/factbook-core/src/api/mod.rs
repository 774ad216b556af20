//! Typed async access to the factbook backend HTTP API.

pub mod client;
pub mod types;

pub use client::FactbookClient;
