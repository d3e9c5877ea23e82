//! Full-pipeline runs against scripted backends for both adapter families.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use research_pilot::{PipelineDriver, PipelinePhase, PipelineSession, PipelineStage};
use research_pilot_core::{NullProgress, ProgressReporter};
use research_pilot_llm::gemini::{
    GeminiProvider, Interaction, InteractionOutput, InteractionRequest, InteractionsApi,
};
use research_pilot_llm::openai::{ChatApi, ChatCompletion, OpenAiCompatProvider};
use research_pilot_llm::{
    LlmError, LlmResult, ProviderConfig, ProviderType, SearchClient, SearchHit,
};

const PLAN_TEXT: &str = "1. Market sizing - estimate TAM for the segment\n2. Competitor scan - list the top five vendors\n3. Pricing analysis - compare published tiers";

fn gemini_config() -> ProviderConfig {
    ProviderConfig {
        provider: ProviderType::Gemini,
        api_key: Some("test-key".to_string()),
        ..Default::default()
    }
}

fn openrouter_config() -> ProviderConfig {
    ProviderConfig {
        provider: ProviderType::OpenRouter,
        api_key: Some("test-key".to_string()),
        base_url: Some("https://openrouter.ai/api/v1".to_string()),
        model: "google/gemini-2.0-flash-exp:free".to_string(),
    }
}

/// Interactions backend that routes on request shape: plan and synthesis
/// complete immediately, research runs as a background job that finishes
/// after a fixed number of polls.
struct ScriptedInteractions {
    polls_until_done: usize,
    polls_seen: AtomicUsize,
}

impl ScriptedInteractions {
    fn new(polls_until_done: usize) -> Self {
        Self {
            polls_until_done,
            polls_seen: AtomicUsize::new(0),
        }
    }

    fn done(id: &str, text: &str) -> Interaction {
        Interaction {
            id: id.to_string(),
            status: "completed".to_string(),
            outputs: vec![InteractionOutput {
                text: Some(text.to_string()),
            }],
        }
    }
}

#[async_trait]
impl InteractionsApi for ScriptedInteractions {
    async fn create_interaction(&self, request: InteractionRequest) -> LlmResult<Interaction> {
        if request.agent.is_some() {
            return Ok(Interaction {
                id: "job-1".to_string(),
                status: "in_progress".to_string(),
                outputs: vec![],
            });
        }
        if request.input.starts_with("Create a numbered research plan") {
            Ok(Self::done("plan-1", PLAN_TEXT))
        } else {
            Ok(Self::done("report-1", "## Summary\nAll good."))
        }
    }

    async fn get_interaction(&self, id: &str) -> LlmResult<Interaction> {
        let seen = self.polls_seen.fetch_add(1, Ordering::SeqCst) + 1;
        if seen >= self.polls_until_done {
            Ok(Self::done(id, "Deep research findings with sources."))
        } else {
            Ok(Interaction {
                id: id.to_string(),
                status: "in_progress".to_string(),
                outputs: vec![],
            })
        }
    }

    async fn generate_image(&self, _prompt: &str) -> LlmResult<Option<Vec<u8>>> {
        Ok(Some(vec![0x89, 0x50, 0x4e, 0x47]))
    }

    async fn list_models(&self) -> LlmResult<()> {
        Ok(())
    }
}

/// Chat backend that routes on prompt wording and can fail synthesis a
/// configurable number of times.
struct ScriptedChat {
    synthesis_failures: AtomicUsize,
}

impl ScriptedChat {
    fn new(synthesis_failures: usize) -> Self {
        Self {
            synthesis_failures: AtomicUsize::new(synthesis_failures),
        }
    }

    fn reply(text: &str) -> ChatCompletion {
        ChatCompletion {
            text: text.to_string(),
            raw: serde_json::json!({ "scripted": true }),
        }
    }
}

#[async_trait]
impl ChatApi for ScriptedChat {
    async fn complete(&self, prompt: &str) -> LlmResult<ChatCompletion> {
        if prompt.starts_with("Create a numbered research plan") {
            return Ok(Self::reply(PLAN_TEXT));
        }
        if prompt.starts_with("Analyze these search results") {
            return Ok(Self::reply("Extracted facts for the task."));
        }
        if self
            .synthesis_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(LlmError::ServerError {
                message: "synthesis backend overloaded".to_string(),
                status: Some(503),
            });
        }
        Ok(Self::reply("## Summary\nSynthesized from findings."))
    }

    async fn health_check(&self) -> LlmResult<()> {
        Ok(())
    }
}

struct StaticSearch;

#[async_trait]
impl SearchClient for StaticSearch {
    async fn search(&self, _query: &str, _max_results: usize) -> LlmResult<Vec<SearchHit>> {
        Ok(vec![SearchHit {
            title: "Industry report".to_string(),
            snippet: "Key figures for the segment.".to_string(),
            url: "https://example.org/report".to_string(),
        }])
    }
}

fn reporter() -> Arc<dyn ProgressReporter> {
    Arc::new(NullProgress)
}

fn all_ordinals(session: &PipelineSession) -> BTreeSet<String> {
    session.tasks().iter().map(|t| t.ordinal.clone()).collect()
}

#[tokio::test(start_paused = true)]
async fn test_gemini_pipeline_end_to_end() {
    let provider = GeminiProvider::with_api(
        gemini_config(),
        Arc::new(ScriptedInteractions::new(3)),
    );
    let driver = PipelineDriver::new(Arc::new(provider), reporter());
    let mut session = PipelineSession::new();

    driver.generate_plan(&mut session, "B2B HR SaaS in Germany").await.unwrap();
    assert_eq!(session.stage(), PipelineStage::Planned);
    assert_eq!(session.tasks().len(), 3);
    assert_eq!(
        session.plan().and_then(|p| p.context_id.as_deref()),
        Some("plan-1")
    );

    let selected = all_ordinals(&session);
    driver.run_research(&mut session, &selected).await.unwrap();
    assert_eq!(session.stage(), PipelineStage::Researched);
    assert_eq!(
        session.findings().map(|f| f.text.as_str()),
        Some("Deep research findings with sources.")
    );

    driver.synthesize(&mut session).await.unwrap();
    assert_eq!(session.stage(), PipelineStage::Synthesized);
    assert!(session.report().unwrap().contains("Summary"));
    // Gemini renders the infographic.
    assert_eq!(session.infographic(), Some(&[0x89u8, 0x50, 0x4e, 0x47][..]));
}

#[tokio::test]
async fn test_openai_pipeline_end_to_end() {
    let provider = OpenAiCompatProvider::with_backends(
        openrouter_config(),
        Arc::new(ScriptedChat::new(0)),
        Arc::new(StaticSearch),
    );
    let driver = PipelineDriver::new(Arc::new(provider), reporter());
    let mut session = PipelineSession::new();

    driver.generate_plan(&mut session, "goal").await.unwrap();
    assert_eq!(session.tasks().len(), 3);

    // Research a subset only.
    let selected: BTreeSet<String> = ["1", "3"].iter().map(|s| s.to_string()).collect();
    driver.run_research(&mut session, &selected).await.unwrap();

    let findings = session.findings().unwrap();
    assert!(findings.text.contains("### Research for: 1. Market sizing"));
    assert!(findings.text.contains("### Research for: 3. Pricing analysis"));
    assert!(!findings.text.contains("2. Competitor scan"));
    assert!(findings.text.contains("https://example.org/report"));
    // Stateless backend carries no context token.
    assert!(findings.context_id.is_none());

    driver.synthesize(&mut session).await.unwrap();
    assert!(session.report().unwrap().contains("Synthesized"));
    // Text-only backend: no infographic, but the report still lands.
    assert!(session.infographic().is_none());
    assert_eq!(session.stage(), PipelineStage::Synthesized);
}

#[tokio::test]
async fn test_synthesis_failure_is_retryable() {
    let provider = OpenAiCompatProvider::with_backends(
        openrouter_config(),
        Arc::new(ScriptedChat::new(1)),
        Arc::new(StaticSearch),
    );
    let driver = PipelineDriver::new(Arc::new(provider), reporter());
    let mut session = PipelineSession::new();

    driver.generate_plan(&mut session, "goal").await.unwrap();
    let selected = all_ordinals(&session);
    driver.run_research(&mut session, &selected).await.unwrap();

    let err = driver.synthesize(&mut session).await.unwrap_err();
    assert_eq!(err.phase, PipelinePhase::Synthesis);
    assert_eq!(session.stage(), PipelineStage::Researched);

    // Same session, second attempt succeeds.
    driver.synthesize(&mut session).await.unwrap();
    assert_eq!(session.stage(), PipelineStage::Synthesized);
}

#[tokio::test]
async fn test_replan_discards_previous_run() {
    let provider = OpenAiCompatProvider::with_backends(
        openrouter_config(),
        Arc::new(ScriptedChat::new(0)),
        Arc::new(StaticSearch),
    );
    let driver = PipelineDriver::new(Arc::new(provider), reporter());
    let mut session = PipelineSession::new();

    driver.generate_plan(&mut session, "first goal").await.unwrap();
    let selected = all_ordinals(&session);
    driver.run_research(&mut session, &selected).await.unwrap();
    driver.synthesize(&mut session).await.unwrap();
    assert_eq!(session.stage(), PipelineStage::Synthesized);

    driver.generate_plan(&mut session, "second goal").await.unwrap();
    assert_eq!(session.stage(), PipelineStage::Planned);
    assert!(session.findings().is_none());
    assert!(session.report().is_none());
    assert!(session.infographic().is_none());
}
