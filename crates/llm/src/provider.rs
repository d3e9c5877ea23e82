//! Research Provider Trait
//!
//! Defines the common interface for all research backends. The pipeline
//! driver talks only to this trait and never branches on the concrete
//! backend type; capability differences (infographics, context chaining)
//! are expressed as trait methods.

use async_trait::async_trait;

use research_pilot_core::ProgressReporter;

use super::types::{LlmError, LlmResult, ProviderConfig, ResearchFindings, ResearchPlan};

/// Trait that all research backends must implement.
///
/// Provides a unified interface for the four pipeline phases:
/// - Plan generation (create_plan)
/// - Task-scoped research (execute_research)
/// - Report synthesis (synthesize_report)
/// - Best-effort infographic rendering (generate_infographic)
#[async_trait]
pub trait ResearchProvider: Send + Sync {
    /// Returns the provider name for identification.
    fn name(&self) -> &'static str;

    /// Returns the current model being used.
    fn model(&self) -> &str;

    /// Returns whether this backend can render an infographic image.
    ///
    /// Default is false; text-only backends leave it that way.
    fn supports_infographics(&self) -> bool {
        false
    }

    /// Create a numbered research plan for the given goal.
    ///
    /// The prompt contract asks for 5-8 tasks in `1. [Task] - [Details]`
    /// format; the range is a request to the model, not a guarantee the
    /// adapter enforces numerically.
    async fn create_plan(&self, goal: &str) -> LlmResult<ResearchPlan>;

    /// Research the selected tasks, blocking until findings are ready.
    ///
    /// `previous_context` is the plan's context token (or `None` for
    /// stateless backends). Implementations may internally wait on a
    /// long-running backend job or iterate one request per task; either
    /// way they report progress on a 0-100 scale through `progress`.
    async fn execute_research(
        &self,
        tasks: &[String],
        previous_context: Option<&str>,
        progress: &dyn ProgressReporter,
    ) -> LlmResult<ResearchFindings>;

    /// Synthesize an executive report (Summary, Findings, Recommendations,
    /// Risks) from aggregated research text.
    ///
    /// `previous_context` is the research context token; stateless backends
    /// accept and ignore it for interface symmetry.
    async fn synthesize_report(
        &self,
        research_text: &str,
        previous_context: Option<&str>,
    ) -> LlmResult<String>;

    /// Render an infographic for the given text, best-effort.
    ///
    /// `None` means capability gap or generation failure; it is never an
    /// error and never gates the pipeline.
    async fn generate_infographic(&self, _text: &str) -> Option<Vec<u8>> {
        None
    }

    /// Check if the backend is reachable and the credentials are valid.
    async fn health_check(&self) -> LlmResult<()>;

    /// Get the configuration for this provider.
    fn config(&self) -> &ProviderConfig;
}

/// Helper function to create an error for a missing API key
pub fn missing_api_key_error(provider: &str) -> LlmError {
    LlmError::AuthenticationFailed {
        message: format!("API key not configured for {}", provider),
    }
}

/// Helper function to parse HTTP error status codes
pub fn parse_http_error(status: u16, body: &str, provider: &str) -> LlmError {
    match status {
        401 => LlmError::AuthenticationFailed {
            message: format!("{}: Invalid API key", provider),
        },
        403 => LlmError::AuthenticationFailed {
            message: format!("{}: Access denied", provider),
        },
        404 => LlmError::ModelNotFound {
            model: body.to_string(),
        },
        429 => LlmError::RateLimited {
            message: body.to_string(),
        },
        400 => LlmError::InvalidRequest {
            message: body.to_string(),
        },
        500..=599 => LlmError::ServerError {
            message: body.to_string(),
            status: Some(status),
        },
        _ => LlmError::Other {
            message: format!("HTTP {}: {}", status, body),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key_error() {
        let err = missing_api_key_error("gemini");
        match err {
            LlmError::AuthenticationFailed { message } => {
                assert!(message.contains("gemini"));
            }
            _ => panic!("Expected AuthenticationFailed"),
        }
    }

    #[test]
    fn test_parse_http_error() {
        let err = parse_http_error(401, "unauthorized", "openrouter");
        assert!(matches!(err, LlmError::AuthenticationFailed { .. }));

        let err = parse_http_error(429, "rate limited", "openrouter");
        assert!(matches!(err, LlmError::RateLimited { .. }));

        let err = parse_http_error(500, "internal error", "openrouter");
        assert!(matches!(err, LlmError::ServerError { .. }));

        let err = parse_http_error(418, "teapot", "openrouter");
        assert!(matches!(err, LlmError::Other { .. }));
    }
}
