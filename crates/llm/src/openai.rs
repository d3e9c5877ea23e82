//! OpenAI-Compatible Provider
//!
//! Stateless-chat adapter for OpenRouter, Ollama and vLLM. These backends
//! expose `/chat/completions` with no server-side conversation state and no
//! research agent, so research is driven manually: one search-then-summarize
//! round per selected task, with per-task failures recorded inline instead
//! of aborting the batch.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use research_pilot_core::ProgressReporter;

use super::http_client::build_http_client;
use super::prompts;
use super::provider::{missing_api_key_error, parse_http_error, ResearchProvider};
use super::search::{DuckDuckGoSearch, SearchClient, SearchHit};
use super::types::{LlmError, LlmResult, ProviderConfig, ResearchFindings, ResearchPlan};

/// Search results fed into each per-task summarization call
const MAX_SEARCH_RESULTS: usize = 3;

/// Task text shown in progress status lines is cut at this many characters
const STATUS_TASK_CHARS: usize = 50;

/// One chat completion, keeping the raw response for auditing.
#[derive(Debug, Clone)]
pub struct ChatCompletion {
    pub text: String,
    pub raw: serde_json::Value,
}

/// Transport seam for OpenAI-compatible chat endpoints.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Run a single-turn chat completion.
    async fn complete(&self, prompt: &str) -> LlmResult<ChatCompletion>;

    /// Cheap credential/endpoint check.
    async fn health_check(&self) -> LlmResult<()>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// HTTP implementation of [`ChatApi`].
pub struct HttpChatApi {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl HttpChatApi {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            client: build_http_client(),
            config,
        }
    }

    fn base_url(&self) -> LlmResult<&str> {
        self.config
            .base_url
            .as_deref()
            .ok_or_else(|| LlmError::InvalidRequest {
                message: format!("base URL not configured for {}", self.config.provider),
            })
    }

    fn api_key(&self) -> LlmResult<&str> {
        self.config
            .api_key
            .as_deref()
            .ok_or_else(|| missing_api_key_error(self.config.provider.as_str()))
    }
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn complete(&self, prompt: &str) -> LlmResult<ChatCompletion> {
        let base = self.base_url()?;
        let key = self.api_key()?;
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", base))
            .bearer_auth(key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError {
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| LlmError::NetworkError {
            message: e.to_string(),
        })?;

        if status != 200 {
            return Err(parse_http_error(status, &body, self.config.provider.as_str()));
        }

        let raw: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| LlmError::ParseError {
                message: format!("Failed to parse response: {}", e),
            })?;
        let parsed: OpenAIResponse =
            serde_json::from_value(raw.clone()).map_err(|e| LlmError::ParseError {
                message: format!("Unexpected response shape: {}", e),
            })?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        Ok(ChatCompletion { text, raw })
    }

    async fn health_check(&self) -> LlmResult<()> {
        let base = self.base_url()?;
        let key = self.api_key()?;
        let response = self
            .client
            .get(format!("{}/models", base))
            .bearer_auth(key)
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
            Err(parse_http_error(status, &body, self.config.provider.as_str()))
        }
    }
}

/// Provider for OpenAI-compatible chat backends with a manual research loop.
pub struct OpenAiCompatProvider {
    config: ProviderConfig,
    chat: Arc<dyn ChatApi>,
    search: Arc<dyn SearchClient>,
}

impl OpenAiCompatProvider {
    /// Create a new provider with the given configuration.
    pub fn new(config: ProviderConfig) -> Self {
        let chat = Arc::new(HttpChatApi::new(config.clone()));
        Self {
            config,
            chat,
            search: Arc::new(DuckDuckGoSearch::new()),
        }
    }

    /// Create a provider over custom chat and search backends (test seam).
    pub fn with_backends(
        config: ProviderConfig,
        chat: Arc<dyn ChatApi>,
        search: Arc<dyn SearchClient>,
    ) -> Self {
        Self {
            config,
            chat,
            search,
        }
    }

    /// One research round for a single task: search, then summarize the
    /// hits with the chat model.
    async fn research_task(&self, task: &str) -> LlmResult<String> {
        let hits = self.search.search(task, MAX_SEARCH_RESULTS).await?;
        let context = render_search_context(&hits);
        let completion = self
            .chat
            .complete(&prompts::extraction_prompt(task, &context))
            .await?;

        Ok(format!(
            "### Research for: {}\n{}\n\nSources:\n{}",
            task, completion.text, context
        ))
    }
}

#[async_trait]
impl ResearchProvider for OpenAiCompatProvider {
    fn name(&self) -> &'static str {
        self.config.provider.as_str()
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn create_plan(&self, goal: &str) -> LlmResult<ResearchPlan> {
        let completion = self.chat.complete(&prompts::plan_prompt(goal)).await?;
        Ok(ResearchPlan {
            context_id: None,
            text: completion.text,
            raw: completion.raw,
        })
    }

    async fn execute_research(
        &self,
        tasks: &[String],
        _previous_context: Option<&str>,
        progress: &dyn ProgressReporter,
    ) -> LlmResult<ResearchFindings> {
        if tasks.is_empty() {
            return Err(LlmError::InvalidRequest {
                message: "no tasks selected for research".to_string(),
            });
        }

        let total = tasks.len();
        let mut sections = Vec::with_capacity(total);
        for (idx, task) in tasks.iter().enumerate() {
            let percent = (idx * 100 / total) as u8;
            progress.progress(
                percent,
                &format!("Searching: {}...", truncate_chars(task, STATUS_TASK_CHARS)),
            );

            // A failed task becomes an inline error section; the batch
            // continues.
            let section = match self.research_task(task).await {
                Ok(section) => section,
                Err(err) => {
                    tracing::warn!(task = %task, "research task failed: {}", err);
                    format!("### Research for: {}\nError: {}", task, err)
                }
            };
            sections.push(section);
            progress.progress(((idx + 1) * 100 / total) as u8, "Task complete");
        }

        Ok(ResearchFindings {
            context_id: None,
            text: sections.join("\n\n"),
            raw: serde_json::json!(sections),
        })
    }

    async fn synthesize_report(
        &self,
        research_text: &str,
        _previous_context: Option<&str>,
    ) -> LlmResult<String> {
        let completion = self
            .chat
            .complete(&prompts::synthesis_prompt(research_text))
            .await?;
        Ok(completion.text)
    }

    async fn health_check(&self) -> LlmResult<()> {
        self.chat.health_check().await
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

/// Render search hits as the bullet list fed to the extraction prompt and
/// appended as the Sources section.
fn render_search_context(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|hit| format!("- {}: {} ({})", hit.title, hit.snippet, hit.url))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Character-boundary-safe prefix truncation.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
