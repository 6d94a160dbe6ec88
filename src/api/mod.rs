// Gemini generateContent client

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    RequestFailed(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("no API key configured (set ENIGMA_API_KEY)")]
    MissingApiKey,
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        // The request URL carries the API key as a query parameter
        Self::RequestFailed(err.without_url().to_string())
    }
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: Client,
}

#[derive(Debug, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

impl GenerateContentRequest {
    /// The whole prompt is the single question; no history is sent.
    pub fn from_question(question: &str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part {
                    text: question.to_string(),
                }],
            }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Content,
}

impl GenerateContentResponse {
    /// First candidate's first text part.
    pub fn answer_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content
            .parts
            .into_iter()
            .next()
            .map(|part| part.text)
    }
}

impl GeminiClient {
    pub fn new(base_url: String, model: String, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            api_key,
            client,
        })
    }

    fn endpoint(&self, api_key: &str) -> String {
        format!(
            "{}/models/{}:generateContent?key={api_key}",
            self.base_url, self.model
        )
    }

    #[instrument(skip(self, question), fields(model = %self.model, bytes = question.len()))]
    pub async fn ask(&self, question: &str) -> Result<String, ApiError> {
        let api_key = self.api_key.as_deref().ok_or(ApiError::MissingApiKey)?;
        let request = GenerateContentRequest::from_question(question);

        info!("sending generateContent request");
        let response = self
            .client
            .post(self.endpoint(api_key))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ApiError::RequestFailed(format!(
                "API request failed with status {status}: {text}"
            )));
        }

        let body = response.text().await?;
        debug!(bytes = body.len(), "response received");

        let envelope: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| ApiError::MalformedResponse(e.to_string()))?;

        envelope
            .answer_text()
            .ok_or_else(|| ApiError::MalformedResponse("no candidate text part".to_string()))
    }
}
