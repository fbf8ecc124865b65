//! Remote draft generation over HTTP.
//!
//! Request: `POST {endpoint}` with the `DraftContext` as JSON.
//! Response: `{"text": "..."}`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{DraftContext, GenerationError, TextGenerator};

#[derive(Debug, Deserialize)]
struct DraftResponse {
    #[serde(default)]
    text: String,
}

/// Generator backed by a remote text-generation service
#[derive(Clone)]
pub struct HttpDrafter {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpDrafter {
    /// `timeout` bounds each request at the transport level; the orchestrator
    /// applies its own overall deadline on top.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, GenerationError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl TextGenerator for HttpDrafter {
    async fn generate(&self, context: &DraftContext) -> Result<String, GenerationError> {
        let resp = self.http.post(&self.endpoint).json(context).send().await?;

        if !resp.status().is_success() {
            return Err(GenerationError::ServerError(resp.status()));
        }

        let body: DraftResponse = resp.json().await?;
        let text = body.text.trim();
        if text.is_empty() {
            return Err(GenerationError::Empty);
        }
        debug!(lead_id = %context.lead_id, chars = text.len(), "Remote draft received");
        Ok(text.to_string())
    }

    fn backend_name(&self) -> &'static str {
        "http"
    }
}
