//! Backend Configuration
//!
//! Resolves CLI flags and environment variables into a concrete
//! `ProviderConfig` and constructs the matching provider. Local backends
//! (Ollama, vLLM) get placeholder keys because their endpoints require a
//! bearer token syntactically but do not validate it.

use std::sync::Arc;

use research_pilot_core::{CoreError, CoreResult};
use research_pilot_llm::{
    GeminiProvider, OpenAiCompatProvider, ProviderConfig, ProviderType, ResearchProvider,
};

/// OpenRouter API endpoint
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
/// Default OpenRouter model (free tier)
pub const OPENROUTER_DEFAULT_MODEL: &str = "google/gemini-2.0-flash-exp:free";

/// Local Ollama endpoint (OpenAI-compatible surface)
pub const OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";
/// Default Ollama model
pub const OLLAMA_DEFAULT_MODEL: &str = "llama3";
/// Ollama ignores the bearer token but the wire format requires one
pub const OLLAMA_PLACEHOLDER_KEY: &str = "ollama";

/// Local vLLM endpoint
pub const VLLM_BASE_URL: &str = "http://localhost:8000/v1";
/// vLLM's conventional no-auth placeholder token
pub const VLLM_PLACEHOLDER_KEY: &str = "EMPTY";

/// Backend selection as given on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ProviderKind {
    Gemini,
    Openrouter,
    Ollama,
    Vllm,
}

impl ProviderKind {
    fn provider_type(self) -> ProviderType {
        match self {
            ProviderKind::Gemini => ProviderType::Gemini,
            ProviderKind::Openrouter => ProviderType::OpenRouter,
            ProviderKind::Ollama => ProviderType::Ollama,
            ProviderKind::Vllm => ProviderType::Vllm,
        }
    }
}

/// Raw backend settings before defaulting and validation.
#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub kind: ProviderKind,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
}

impl BackendSettings {
    /// Fill in per-backend defaults and validate required fields.
    ///
    /// Gemini and OpenRouter need a real API key; local backends fall back
    /// to placeholder tokens. Explicit flags always win over defaults.
    pub fn resolve(&self) -> CoreResult<ProviderConfig> {
        let provider = self.kind.provider_type();
        let config = match self.kind {
            ProviderKind::Gemini => ProviderConfig {
                provider,
                api_key: Some(self.require_key("gemini", "GEMINI_API_KEY")?),
                base_url: self.base_url.clone(),
                model: self.model.clone().unwrap_or_default(),
            },
            ProviderKind::Openrouter => ProviderConfig {
                provider,
                api_key: Some(self.require_key("openrouter", "OPENROUTER_API_KEY")?),
                base_url: Some(
                    self.base_url
                        .clone()
                        .unwrap_or_else(|| OPENROUTER_BASE_URL.to_string()),
                ),
                model: self
                    .model
                    .clone()
                    .unwrap_or_else(|| OPENROUTER_DEFAULT_MODEL.to_string()),
            },
            ProviderKind::Ollama => ProviderConfig {
                provider,
                api_key: Some(
                    self.api_key
                        .clone()
                        .unwrap_or_else(|| OLLAMA_PLACEHOLDER_KEY.to_string()),
                ),
                base_url: Some(
                    self.base_url
                        .clone()
                        .unwrap_or_else(|| OLLAMA_BASE_URL.to_string()),
                ),
                model: self
                    .model
                    .clone()
                    .unwrap_or_else(|| OLLAMA_DEFAULT_MODEL.to_string()),
            },
            ProviderKind::Vllm => ProviderConfig {
                provider,
                api_key: Some(
                    self.api_key
                        .clone()
                        .unwrap_or_else(|| VLLM_PLACEHOLDER_KEY.to_string()),
                ),
                base_url: Some(
                    self.base_url
                        .clone()
                        .unwrap_or_else(|| VLLM_BASE_URL.to_string()),
                ),
                model: self.model.clone().ok_or_else(|| {
                    CoreError::config("vLLM requires --model (the model the server was started with)")
                })?,
            },
        };
        Ok(config)
    }

    fn require_key(&self, name: &str, env_var: &str) -> CoreResult<String> {
        self.api_key.clone().ok_or_else(|| {
            CoreError::config(format!(
                "{} requires an API key; pass --api-key or set {}",
                name, env_var
            ))
        })
    }
}

/// Construct the provider matching a resolved configuration.
pub fn build_provider(config: ProviderConfig) -> Arc<dyn ResearchProvider> {
    match config.provider {
        ProviderType::Gemini => Arc::new(GeminiProvider::new(config)),
        ProviderType::OpenRouter | ProviderType::Ollama | ProviderType::Vllm => {
            Arc::new(OpenAiCompatProvider::new(config))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(kind: ProviderKind) -> BackendSettings {
        BackendSettings {
            kind,
            api_key: None,
            base_url: None,
            model: None,
        }
    }

    #[test]
    fn test_gemini_requires_key() {
        let err = settings(ProviderKind::Gemini).resolve().unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));

        let mut with_key = settings(ProviderKind::Gemini);
        with_key.api_key = Some("key".to_string());
        let config = with_key.resolve().unwrap();
        assert_eq!(config.provider, ProviderType::Gemini);
        assert!(config.base_url.is_none());
    }

    #[test]
    fn test_openrouter_defaults() {
        let mut s = settings(ProviderKind::Openrouter);
        s.api_key = Some("sk-or-abc".to_string());
        let config = s.resolve().unwrap();
        assert_eq!(config.base_url.as_deref(), Some(OPENROUTER_BASE_URL));
        assert_eq!(config.model, OPENROUTER_DEFAULT_MODEL);
    }

    #[test]
    fn test_ollama_placeholder_key() {
        let config = settings(ProviderKind::Ollama).resolve().unwrap();
        assert_eq!(config.api_key.as_deref(), Some(OLLAMA_PLACEHOLDER_KEY));
        assert_eq!(config.base_url.as_deref(), Some(OLLAMA_BASE_URL));
        assert_eq!(config.model, OLLAMA_DEFAULT_MODEL);
    }

    #[test]
    fn test_vllm_needs_model() {
        let err = settings(ProviderKind::Vllm).resolve().unwrap_err();
        assert!(err.to_string().contains("--model"));

        let mut s = settings(ProviderKind::Vllm);
        s.model = Some("mistralai/Mistral-7B-Instruct-v0.3".to_string());
        let config = s.resolve().unwrap();
        assert_eq!(config.api_key.as_deref(), Some(VLLM_PLACEHOLDER_KEY));
        assert_eq!(config.base_url.as_deref(), Some(VLLM_BASE_URL));
    }

    #[test]
    fn test_explicit_flags_override_defaults() {
        let mut s = settings(ProviderKind::Ollama);
        s.base_url = Some("http://gpu-box:11434/v1".to_string());
        s.model = Some("qwen2.5".to_string());
        let config = s.resolve().unwrap();
        assert_eq!(config.base_url.as_deref(), Some("http://gpu-box:11434/v1"));
        assert_eq!(config.model, "qwen2.5");
    }
}
