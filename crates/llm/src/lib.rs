//! Research Pilot LLM
//!
//! Provides a unified interface for driving the research pipeline against
//! interchangeable model backends:
//! - Gemini Interactions API (server-side context chaining + background deep research)
//! - OpenAI-compatible chat endpoints (OpenRouter, Ollama, vLLM), where the
//!   adapter composes a manual search-and-summarize research loop
//!
//! Also includes the web search client and the HTTP client factory.

pub mod gemini;
pub mod http_client;
pub mod openai;
pub mod prompts;
pub mod provider;
pub mod search;
pub mod types;

// Re-export main types
pub use gemini::GeminiProvider;
pub use http_client::build_http_client;
pub use openai::OpenAiCompatProvider;
pub use provider::ResearchProvider;
pub use search::{DuckDuckGoSearch, SearchClient, SearchHit};
pub use types::*;
