//! Semantic index collaborator.
//!
//! The index itself is an external service; this module defines the
//! contract the scanner calls and an HTTP client for services that expose
//! `POST /query`.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::scanner::retry::IndexRetry;
use crate::scanner::SourceOptions;
use crate::types::{Match, MatchSource};
use crate::VERSION;

/// A hit returned by the semantic index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexHit {
    /// Path or identifier
    #[serde(alias = "path")]
    pub location: String,
    /// Text excerpt
    #[serde(alias = "content")]
    pub snippet: String,
    /// Relevance reported by the index
    #[serde(alias = "rawScore", alias = "score")]
    pub raw_score: f64,
}

impl IndexHit {
    pub fn into_match(self) -> Match {
        Match::new(MatchSource::SemanticIndex, &self.location, self.snippet)
            .with_raw_score(self.raw_score)
    }
}

/// Contract for the external semantic index.
#[async_trait]
pub trait SemanticIndex: Send + Sync {
    /// Look up hits for a natural-language query.
    async fn query(&self, text: &str, options: &SourceOptions) -> Result<Vec<IndexHit>>;
}

/// Query body sent to the index service.
#[derive(Debug, Clone, Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<usize>,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    file_patterns: &'a [String],
}

/// Accepted response shapes.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QueryResponse {
    Wrapped { results: Vec<IndexHit> },
    Bare(Vec<IndexHit>),
}

impl QueryResponse {
    fn into_hits(self) -> Vec<IndexHit> {
        match self {
            Self::Wrapped { results } => results,
            Self::Bare(hits) => hits,
        }
    }
}

/// User agent string for index requests.
fn user_agent() -> String {
    format!("jade-assist/{} (rust)", VERSION)
}

/// HTTP client for a semantic index service.
#[derive(Debug, Clone)]
pub struct HttpSemanticIndex {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    retry: IndexRetry,
}

impl HttpSemanticIndex {
    /// Create a client for the service at `base_url`.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent())
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key,
            retry: IndexRetry::default(),
        })
    }

    /// Override the retry policy.
    pub fn with_retry(mut self, retry: IndexRetry) -> Self {
        self.retry = retry;
        self
    }

    /// Get the service URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// One attempt. Every attempt of a query carries the same request id.
    async fn request(
        &self,
        body: &QueryRequest<'_>,
        request_id: Uuid,
        attempt: u32,
    ) -> Result<Vec<IndexHit>> {
        let url = format!("{}/query", self.base_url.trim_end_matches('/'));

        let mut request = self
            .client
            .post(&url)
            .header("X-Request-Id", request_id.to_string())
            .json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        debug!(
            %request_id,
            attempt,
            status = response.status().as_u16(),
            "Semantic index responded"
        );
        let hits = Self::handle_response(response).await?;
        debug!(%request_id, hits = hits.len(), "Semantic index hits");
        Ok(hits)
    }

    /// Handle the response, turning error statuses into API errors.
    async fn handle_response(response: Response) -> Result<Vec<IndexHit>> {
        let status = response.status();

        if !status.is_success() {
            let status_text = status.canonical_reason().unwrap_or("Unknown");
            let body = response.text().await.unwrap_or_default();
            return Err(Error::api(status.as_u16(), status_text, body));
        }

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| Error::Internal(format!("Failed to parse index response: {}", e)))?;
        Ok(parsed.into_hits())
    }
}

#[async_trait]
impl SemanticIndex for HttpSemanticIndex {
    async fn query(&self, text: &str, options: &SourceOptions) -> Result<Vec<IndexHit>> {
        let body = QueryRequest {
            query: text,
            limit: options.limit,
            file_patterns: &options.file_patterns,
        };
        let body = &body;
        let request_id = Uuid::new_v4();

        self.retry
            .run(options.deadline, move |attempt| {
                self.request(body, request_id, attempt)
            })
            .await
    }
}
