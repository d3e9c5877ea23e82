//! Provider Types
//!
//! Core types for research backend interactions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Supported research backend types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    Gemini,
    OpenRouter,
    Ollama,
    Vllm,
}

impl ProviderType {
    /// Stable lowercase identifier for logs and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderType::Gemini => "gemini",
            ProviderType::OpenRouter => "openrouter",
            ProviderType::Ollama => "ollama",
            ProviderType::Vllm => "vllm",
        }
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configuration for a research backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// The backend type
    pub provider: ProviderType,
    /// API key (placeholder values for local endpoints)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Base URL override (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Model name for chat-completion backends. The stateful backend picks
    /// its own model per phase and ignores this when empty.
    #[serde(default)]
    pub model: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: ProviderType::Gemini,
            api_key: None,
            base_url: None,
            model: String::new(),
        }
    }
}

/// Errors from backend and search calls.
///
/// These never cross the pipeline driver boundary: the driver absorbs them
/// into a phase-labeled failure and the session stays retryable.
#[derive(Error, Debug, Clone)]
pub enum LlmError {
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Network error: {message}")]
    NetworkError { message: String },

    #[error("Parse error: {message}")]
    ParseError { message: String },

    #[error("Rate limited: {message}")]
    RateLimited { message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Model not found: {model}")]
    ModelNotFound { model: String },

    #[error("Server error: {message}")]
    ServerError { message: String, status: Option<u16> },

    #[error("Search error: {message}")]
    SearchError { message: String },

    #[error("{message}")]
    Other { message: String },
}

/// Result type alias for backend calls
pub type LlmResult<T> = Result<T, LlmError>;

/// A generated research plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchPlan {
    /// Server-side context token for chaining follow-up calls.
    /// `None` for stateless backends.
    pub context_id: Option<String>,
    /// Raw plan narrative as returned by the backend.
    pub text: String,
    /// Backend-specific payload kept for debugging/audit.
    pub raw: serde_json::Value,
}

/// Aggregated findings produced by the research phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchFindings {
    /// Server-side context token referencing the research job.
    /// Only meaningful with the backend that produced the plan's token.
    pub context_id: Option<String>,
    /// Aggregated findings text.
    pub text: String,
    /// Backend-specific payload kept for debugging/audit.
    pub raw: serde_json::Value,
}
