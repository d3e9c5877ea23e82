use clap::Parser;
use tracing_subscriber::EnvFilter;

use research_pilot::cli;
use research_pilot::config::{BackendSettings, ProviderKind};

const ABOUT: &str = "\
Runs a guided research workflow: the backend drafts a numbered research
plan for your goal, you pick which tasks to pursue, the backend researches
them (server-side deep research on Gemini, search-and-summarize elsewhere),
and the findings are synthesized into an executive report. Gemini can also
render the report as an infographic.";

#[derive(Debug, Parser)]
#[command(name = "research-pilot", version, about = ABOUT)]
struct Args {
    /// Backend to run against
    #[arg(long, value_enum, default_value = "gemini")]
    provider: ProviderKind,

    /// API key; falls back to GEMINI_API_KEY or OPENROUTER_API_KEY
    #[arg(long)]
    api_key: Option<String>,

    /// Override the backend base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Override the backend model
    #[arg(long)]
    model: Option<String>,
}

impl Args {
    fn into_settings(self) -> BackendSettings {
        let env_key = match self.provider {
            ProviderKind::Gemini => std::env::var("GEMINI_API_KEY").ok(),
            ProviderKind::Openrouter => std::env::var("OPENROUTER_API_KEY").ok(),
            ProviderKind::Ollama | ProviderKind::Vllm => None,
        };
        BackendSettings {
            kind: self.provider,
            api_key: self.api_key.or(env_key),
            base_url: self.base_url,
            model: self.model,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    cli::run(args.into_settings()).await
}
