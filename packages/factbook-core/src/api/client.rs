//! HTTP client for the factbook backend with streaming chat support.

use std::path::Path;
use std::time::Duration;

use futures::{Stream, StreamExt};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Serialize};

use super::types::*;
use crate::chat::decoder::decode_stream;
use crate::{Error, Result};

/// HTTP client for the factbook backend.
#[derive(Debug, Clone)]
pub struct FactbookClient {
    base_url: String,
    client: Client,
}

impl FactbookClient {
    /// Create a new client with the given base URL.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    /// Create a client with a request timeout.
    ///
    /// The timeout applies to plain request/response calls. Streaming chat
    /// reads are bounded per connection by the same setting.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ========================================================================
    // Internal HTTP Methods
    // ========================================================================

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(Error::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            })
        }
    }

    /// Make a GET request.
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// Make a POST request with a JSON body.
    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// Make a POST request with a multipart form body.
    async fn post_multipart<T: DeserializeOwned>(&self, path: &str, form: Form) -> Result<T> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .multipart(form)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// Make a DELETE request.
    async fn delete(&self, path: &str) -> Result<()> {
        let response = self
            .client
            .delete(format!("{}{}", self.base_url, path))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    // ========================================================================
    // Health API
    // ========================================================================

    /// Check whether the backend is reachable.
    pub async fn health(&self) -> Result<bool> {
        match self
            .client
            .get(format!("{}/factbooks", self.base_url))
            .send()
            .await
        {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    // ========================================================================
    // Factbook API
    // ========================================================================

    /// List all factbooks.
    pub async fn list_factbooks(&self) -> Result<Vec<Factbook>> {
        self.get("/factbooks").await
    }

    /// Get a factbook by ID.
    pub async fn get_factbook(&self, id: i64) -> Result<Factbook> {
        self.get(&format!("/factbooks/{}", id)).await
    }

    /// Delete a factbook.
    pub async fn delete_factbook(&self, id: i64) -> Result<()> {
        self.delete(&format!("/factbooks/{}", id)).await
    }

    /// Duplicate a factbook, returning the copy.
    pub async fn duplicate_factbook(&self, id: i64) -> Result<Factbook> {
        self.post(&format!("/factbooks/{}/duplicate", id), &()).await
    }

    /// List the strategies derived from a factbook.
    pub async fn factbook_strategies(&self, id: i64) -> Result<Vec<Strategy>> {
        self.get(&format!("/factbooks/{}/strategies", id)).await
    }

    /// Kick off factbook generation from brand details and an optional RFP
    /// document. The backend responds once generation has produced the row.
    pub async fn generate_factbook(&self, request: &CreateFactbookRequest) -> Result<Factbook> {
        let mut form = Form::new()
            .text("creator_name", request.creator_name.clone())
            .text("brand_name", request.brand_name.clone())
            .text("industry", request.industry.clone());
        if let Some(description) = &request.description {
            form = form.text("description", description.clone());
        }
        if let Some(path) = &request.rfp_file {
            form = form.part("files", file_part(path).await?);
        }

        tracing::debug!(brand = %request.brand_name, "generating factbook");
        self.post_multipart("/factbooks/generate/", form).await
    }

    // ========================================================================
    // Strategy API
    // ========================================================================

    /// List all strategies.
    pub async fn list_strategies(&self) -> Result<Vec<Strategy>> {
        self.get("/strategies").await
    }

    /// Get a strategy by ID.
    pub async fn get_strategy(&self, id: i64) -> Result<Strategy> {
        self.get(&format!("/strategies/{}", id)).await
    }

    /// Delete a strategy.
    pub async fn delete_strategy(&self, id: i64) -> Result<()> {
        self.delete(&format!("/strategies/{}", id)).await
    }

    /// Duplicate a strategy, returning the copy.
    pub async fn duplicate_strategy(&self, id: i64) -> Result<Strategy> {
        self.post(&format!("/strategies/{}/duplicate", id), &()).await
    }

    /// Kick off strategy generation for a factbook.
    pub async fn generate_strategy(&self, request: &CreateStrategyRequest) -> Result<Strategy> {
        let mut form = Form::new()
            .text("factbook_id", request.factbook_id.to_string())
            .text("strategy_type", request.strategy_type.clone());
        if let Some(objective) = &request.objective {
            form = form.text("objective", objective.clone());
        }
        if let Some(creator) = &request.creator {
            form = form.text("creator", creator.clone());
        }
        if let Some(description) = &request.description {
            form = form.text("description", description.clone());
        }
        for path in &request.files {
            form = form.part("files", file_part(path).await?);
        }

        tracing::debug!(
            factbook_id = request.factbook_id,
            strategy_type = %request.strategy_type,
            "generating strategy"
        );
        self.post_multipart("/strategies/generate/", form).await
    }

    // ========================================================================
    // Activity & Log API
    // ========================================================================

    /// Fetch a window of the recent-activity feed.
    pub async fn recent_activities(&self, offset: usize, limit: usize) -> Result<Vec<Activity>> {
        self.get(&format!("/activities/recent?offset={}&limit={}", offset, limit))
            .await
    }

    /// Fetch the newest LLM invocation logs.
    pub async fn llm_logs(&self, limit: usize) -> Result<Vec<LlmLog>> {
        self.get(&format!("/llm-logs?limit={}", limit)).await
    }

    // ========================================================================
    // Chat API
    // ========================================================================

    /// Open a streaming chat exchange.
    ///
    /// The response body is one continuous UTF-8 text stream with no framing;
    /// the returned stream yields decoded text chunks in arrival order, with
    /// multi-byte characters reassembled across chunk boundaries.
    pub async fn chat_stream(
        &self,
        request: &ChatRequest,
    ) -> Result<impl Stream<Item = Result<String>>> {
        let response = self
            .client
            .post(format!("{}/chat/stream", self.base_url))
            .json(request)
            .send()
            .await?;
        let response = Self::check(response).await?;

        let bytes = response.bytes_stream().map(|chunk| chunk.map_err(Error::from));
        Ok(decode_stream(bytes))
    }
}

/// Build a multipart file part from a path.
async fn file_part(path: &Path) -> Result<Part> {
    let data = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    Ok(Part::bytes(data).file_name(file_name))
}
