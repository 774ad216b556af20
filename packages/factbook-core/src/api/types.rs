//! Wire types for the factbook backend API.
//!
//! The backend speaks snake_case JSON with naive ISO-8601 timestamps, so the
//! default serde field naming applies throughout.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ============================================================================
// Factbook Types
// ============================================================================

/// A generated marketing factbook.
///
/// Besides the stable columns, the backend returns one object per research
/// section under its own top-level key (`market-analysis`,
/// `issues-interviews`, ...). Those land in [`Factbook::sections`] and can be
/// decoded on demand with [`Factbook::section`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Factbook {
    pub id: i64,
    pub brand_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_name: Option<String>,
    #[serde(default)]
    pub views: i64,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
    #[serde(flatten)]
    pub sections: HashMap<String, serde_json::Value>,
}

impl Factbook {
    /// Decode a research section by its wire key, if present and well formed.
    pub fn section(&self, key: &str) -> Option<FactbookSection> {
        self.sections
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }
}

/// One research section of a factbook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactbookSection {
    pub title: String,
    #[serde(default)]
    pub content: SectionContent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citations: Option<serde_json::Value>,
}

/// Section bodies arrive either as one markdown string or as a list of
/// paragraphs, depending on the generating prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SectionContent {
    Text(String),
    Lines(Vec<String>),
}

impl SectionContent {
    /// Collapse to a single markdown string.
    pub fn text(&self) -> String {
        match self {
            SectionContent::Text(text) => text.clone(),
            SectionContent::Lines(lines) => lines.join("\n\n"),
        }
    }
}

impl Default for SectionContent {
    fn default() -> Self {
        SectionContent::Text(String::new())
    }
}

/// Request to generate a new factbook (multipart form).
#[derive(Debug, Clone, Default)]
pub struct CreateFactbookRequest {
    pub creator_name: String,
    pub brand_name: String,
    pub industry: String,
    pub description: Option<String>,
    /// Optional RFP document uploaded alongside the form fields.
    pub rfp_file: Option<PathBuf>,
}

// ============================================================================
// Strategy Types
// ============================================================================

/// A generated marketing strategy derived from a factbook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Strategy {
    pub id: i64,
    pub factbook_id: i64,
    #[serde(default)]
    pub creator: String,
    pub strategy_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub problem: serde_json::Value,
    #[serde(default)]
    pub insight: serde_json::Value,
    #[serde(default)]
    pub goal_target: serde_json::Value,
    #[serde(default)]
    pub direction: serde_json::Value,
    #[serde(default)]
    pub execution: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default)]
    pub views: i64,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

/// Request to generate a new strategy (multipart form).
#[derive(Debug, Clone, Default)]
pub struct CreateStrategyRequest {
    pub factbook_id: i64,
    pub strategy_type: String,
    pub objective: Option<String>,
    pub creator: Option<String>,
    pub description: Option<String>,
    /// Reference documents uploaded alongside the form fields.
    pub files: Vec<PathBuf>,
}

// ============================================================================
// Activity Types
// ============================================================================

/// One entry of the recent-activity feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub entity_id: i64,
    #[serde(default)]
    pub entity_type: String,
}

// ============================================================================
// LLM Log Types
// ============================================================================

/// One backend LLM invocation record, as shown on the admin log page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmLog {
    pub id: i64,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub strategy_id: Option<i64>,
    #[serde(default)]
    pub factbook_id: Option<i64>,
    pub llm_type: String,
    pub prompt_type: String,
    #[serde(default)]
    pub prompt_length: Option<i64>,
    #[serde(default)]
    pub completion_length: Option<i64>,
    #[serde(default)]
    pub total_tokens: Option<i64>,
    #[serde(default)]
    pub elapsed_time: Option<f64>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
}

// ============================================================================
// Chat Types
// ============================================================================

/// Body of `POST /chat/stream`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy_id: Option<i64>,
}
