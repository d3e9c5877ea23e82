//! Gemini Interactions Provider
//!
//! Stateful-chain adapter: the Interactions API keeps conversation state
//! server-side (every call returns an interaction id that later calls can
//! chain onto with `previous_interaction_id`) and runs deep research as a
//! background job that must be polled to completion.
//!
//! The HTTP transport sits behind the [`InteractionsApi`] trait so the poll
//! loop and text extraction can be exercised with a mock backend.

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use research_pilot_core::ProgressReporter;

use super::http_client::build_http_client;
use super::prompts;
use super::provider::{missing_api_key_error, parse_http_error, ResearchProvider};
use super::types::{LlmError, LlmResult, ProviderConfig, ResearchFindings, ResearchPlan};

/// Default Interactions API base URL
const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model used for plan generation (with search-tool augmentation)
const PLAN_MODEL: &str = "gemini-3-flash-preview";
/// Server-side deep research agent
const RESEARCH_AGENT: &str = "deep-research-pro-preview-12-2025";
/// Model used for report synthesis
const SYNTHESIS_MODEL: &str = "gemini-3-pro-preview";
/// Image model for infographic rendering
const IMAGE_MODEL: &str = "gemini-3-pro-image-preview";

/// Seconds between completion polls
const POLL_INTERVAL_SECS: u64 = 3;
/// Total polling budget in seconds
const POLL_TIMEOUT_SECS: u64 = 300;
/// Progress cap while a poll is still in flight; 100 is reserved for
/// confirmed completion.
const POLL_PROGRESS_CAP: u64 = 90;

/// Backend status value meaning "background job still running"
const STATUS_IN_PROGRESS: &str = "in_progress";

/// Request body for creating an interaction.
#[derive(Debug, Clone, Serialize, Default)]
pub struct InteractionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    pub input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<InteractionTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_interaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<bool>,
    pub store: bool,
}

/// Server-side tool requested as part of an interaction.
#[derive(Debug, Clone, Serialize)]
pub struct InteractionTool {
    #[serde(rename = "type")]
    pub tool_type: String,
}

impl InteractionTool {
    pub fn google_search() -> Self {
        Self {
            tool_type: "google_search".to_string(),
        }
    }
}

/// One interaction as reported by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub outputs: Vec<InteractionOutput>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InteractionOutput {
    #[serde(default)]
    pub text: Option<String>,
}

/// Transport seam for the Interactions API.
#[async_trait]
pub trait InteractionsApi: Send + Sync {
    /// Create a new interaction (synchronous or background).
    async fn create_interaction(&self, request: InteractionRequest) -> LlmResult<Interaction>;

    /// Fetch the current state of an interaction.
    async fn get_interaction(&self, id: &str) -> LlmResult<Interaction>;

    /// One-shot image generation; `None` when the response carries no
    /// inline image payload.
    async fn generate_image(&self, prompt: &str) -> LlmResult<Option<Vec<u8>>>;

    /// Cheap credential/endpoint check.
    async fn list_models(&self) -> LlmResult<()>;
}

/// HTTP implementation of [`InteractionsApi`].
pub struct HttpInteractionsApi {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl HttpInteractionsApi {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            client: build_http_client(),
            config,
        }
    }

    fn base_url(&self) -> &str {
        self.config.base_url.as_deref().unwrap_or(GEMINI_API_URL)
    }

    fn api_key(&self) -> LlmResult<&str> {
        self.config
            .api_key
            .as_deref()
            .ok_or_else(|| missing_api_key_error("gemini"))
    }

    async fn request_json<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> LlmResult<T> {
        let response = request.send().await.map_err(|e| LlmError::NetworkError {
            message: e.to_string(),
        })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| LlmError::NetworkError {
            message: e.to_string(),
        })?;

        if status != 200 {
            return Err(parse_http_error(status, &body, "gemini"));
        }

        serde_json::from_str(&body).map_err(|e| LlmError::ParseError {
            message: format!("Failed to parse response: {}", e),
        })
    }
}

#[async_trait]
impl InteractionsApi for HttpInteractionsApi {
    async fn create_interaction(&self, request: InteractionRequest) -> LlmResult<Interaction> {
        let key = self.api_key()?;
        self.request_json(
            self.client
                .post(format!("{}/interactions", self.base_url()))
                .header("x-goog-api-key", key)
                .json(&request),
        )
        .await
    }

    async fn get_interaction(&self, id: &str) -> LlmResult<Interaction> {
        let key = self.api_key()?;
        self.request_json(
            self.client
                .get(format!("{}/interactions/{}", self.base_url(), id))
                .header("x-goog-api-key", key),
        )
        .await
    }

    async fn generate_image(&self, prompt: &str) -> LlmResult<Option<Vec<u8>>> {
        let key = self.api_key()?;
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });
        let response: GenerateContentResponse = self
            .request_json(
                self.client
                    .post(format!(
                        "{}/models/{}:generateContent",
                        self.base_url(),
                        IMAGE_MODEL
                    ))
                    .header("x-goog-api-key", key)
                    .json(&body),
            )
            .await?;

        let Some(inline) = response.first_inline_data() else {
            return Ok(None);
        };
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(inline)
            .map_err(|e| LlmError::ParseError {
                message: format!("Invalid inline image payload: {}", e),
            })?;
        Ok(Some(bytes))
    }

    async fn list_models(&self) -> LlmResult<()> {
        let key = self.api_key()?;
        let response = self
            .client
            .get(format!("{}/models", self.base_url()))
            .header("x-goog-api-key", key)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError {
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        if status == 200 {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(parse_http_error(status, &body, "gemini"))
        }
    }
}

/// Gemini provider: server-side context chaining plus background deep
/// research.
pub struct GeminiProvider {
    config: ProviderConfig,
    api: Arc<dyn InteractionsApi>,
}

impl GeminiProvider {
    /// Create a new Gemini provider with the given configuration.
    pub fn new(config: ProviderConfig) -> Self {
        let api = Arc::new(HttpInteractionsApi::new(config.clone()));
        Self { config, api }
    }

    /// Create a provider over a custom transport (test seam).
    pub fn with_api(config: ProviderConfig, api: Arc<dyn InteractionsApi>) -> Self {
        Self { config, api }
    }

    /// Join all textual outputs of an interaction.
    fn output_text(interaction: &Interaction) -> String {
        interaction
            .outputs
            .iter()
            .filter_map(|o| o.text.as_deref())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn raw_value(interaction: &Interaction) -> serde_json::Value {
        serde_json::to_value(interaction).unwrap_or(serde_json::Value::Null)
    }

    /// Poll a background interaction until it leaves `in_progress` or the
    /// budget elapses.
    ///
    /// Progress is capped at 90 while polling and only reaches 100 on
    /// confirmed completion. On timeout the last observed state is
    /// returned, not an error: the caller surfaces the backend's status
    /// verbatim.
    async fn wait_for_completion(
        &self,
        id: &str,
        progress: &dyn ProgressReporter,
    ) -> LlmResult<Interaction> {
        let mut elapsed: u64 = 0;
        while elapsed < POLL_TIMEOUT_SECS {
            let interaction = self.api.get_interaction(id).await?;
            if interaction.status != STATUS_IN_PROGRESS {
                progress.progress(100, "Research complete");
                return Ok(interaction);
            }

            elapsed += POLL_INTERVAL_SECS;
            let percent = (elapsed * 100 / POLL_TIMEOUT_SECS).min(POLL_PROGRESS_CAP) as u8;
            progress.progress(percent, &format!("Researching... ({}s elapsed)", elapsed));
            tokio::time::sleep(Duration::from_secs(POLL_INTERVAL_SECS)).await;
        }

        // Budget exhausted: hand back whatever the backend reports now.
        tracing::warn!(interaction = id, "research poll budget exhausted");
        self.api.get_interaction(id).await
    }
}

#[async_trait]
impl ResearchProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn model(&self) -> &str {
        if self.config.model.is_empty() {
            PLAN_MODEL
        } else {
            &self.config.model
        }
    }

    fn supports_infographics(&self) -> bool {
        true
    }

    async fn create_plan(&self, goal: &str) -> LlmResult<ResearchPlan> {
        let request = InteractionRequest {
            model: Some(PLAN_MODEL.to_string()),
            input: prompts::plan_prompt(goal),
            tools: Some(vec![InteractionTool::google_search()]),
            store: true,
            ..Default::default()
        };
        let interaction = self.api.create_interaction(request).await?;
        Ok(ResearchPlan {
            context_id: Some(interaction.id.clone()),
            text: Self::output_text(&interaction),
            raw: Self::raw_value(&interaction),
        })
    }

    async fn execute_research(
        &self,
        tasks: &[String],
        previous_context: Option<&str>,
        progress: &dyn ProgressReporter,
    ) -> LlmResult<ResearchFindings> {
        if tasks.is_empty() {
            return Err(LlmError::InvalidRequest {
                message: "no tasks selected for research".to_string(),
            });
        }

        // One background job covers all selected tasks.
        let request = InteractionRequest {
            agent: Some(RESEARCH_AGENT.to_string()),
            input: prompts::research_prompt(tasks),
            previous_interaction_id: previous_context.map(str::to_string),
            background: Some(true),
            store: true,
            ..Default::default()
        };
        let interaction = self.api.create_interaction(request).await?;
        progress.progress(0, "Background research job submitted");

        let finished = self.wait_for_completion(&interaction.id, progress).await?;
        let output = Self::output_text(&finished);
        let text = if output.is_empty() {
            // Timeout or empty completion: surface the backend status verbatim.
            format!("Status: {}", finished.status)
        } else {
            output
        };

        Ok(ResearchFindings {
            context_id: Some(finished.id.clone()),
            text,
            raw: Self::raw_value(&finished),
        })
    }

    async fn synthesize_report(
        &self,
        research_text: &str,
        previous_context: Option<&str>,
    ) -> LlmResult<String> {
        let request = InteractionRequest {
            model: Some(SYNTHESIS_MODEL.to_string()),
            input: prompts::synthesis_prompt(research_text),
            previous_interaction_id: previous_context.map(str::to_string),
            store: true,
            ..Default::default()
        };
        let interaction = self.api.create_interaction(request).await?;
        Ok(Self::output_text(&interaction))
    }

    async fn generate_infographic(&self, text: &str) -> Option<Vec<u8>> {
        match self
            .api
            .generate_image(&prompts::infographic_prompt(text))
            .await
        {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!("infographic generation failed: {}", err);
                None
            }
        }
    }

    async fn health_check(&self) -> LlmResult<()> {
        self.api.list_models().await
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

/// generateContent response, reduced to the inline-image path.
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// First base64 inline payload found in the first candidate's parts.
    fn first_inline_data(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .iter()
            .find_map(|part| part.inline_data.as_ref())
            .map(|inline| inline.data.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(default, rename = "inlineData", alias = "inline_data")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct InlineData {
    data: String,
}
