//! Interactive CLI
//!
//! Walks the user through the pipeline: goal entry, plan review with
//! optional re-planning, task selection, research, and report synthesis.
//! Every phase failure offers a retry; artifacts land in the working
//! directory as files.

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::Context;
use dialoguer::{Confirm, Input, MultiSelect};

use research_pilot_core::ProgressReporter;

use crate::config::BackendSettings;
use crate::driver::{PipelineDriver, PipelineSession};

/// Report output path, relative to the working directory
const REPORT_FILE: &str = "research_report.md";
/// Infographic output path
const INFOGRAPHIC_FILE: &str = "research_infographic.png";

/// Progress reporter printing to stderr so piped stdout stays clean.
pub struct ConsoleProgress;

impl ProgressReporter for ConsoleProgress {
    fn progress(&self, percent: u8, status: &str) {
        eprintln!("  [{:>3}%] {}", percent, status);
    }

    fn error(&self, phase: &str, message: &str) {
        eprintln!("  [error] {} failed: {}", phase, message);
    }
}

/// Run the full interactive session.
pub async fn run(settings: BackendSettings) -> anyhow::Result<()> {
    let config = settings.resolve()?;
    let provider = crate::config::build_provider(config);
    println!(
        "Backend: {} (model: {})",
        provider.name(),
        provider.model()
    );

    if let Err(err) = provider.health_check().await {
        tracing::warn!("backend health check failed: {}", err);
        eprintln!("Warning: backend health check failed: {}", err);
    }

    let driver = PipelineDriver::new(provider, Arc::new(ConsoleProgress));
    let mut session = PipelineSession::new();

    let mut goal: String = Input::new()
        .with_prompt("Research goal")
        .interact_text()
        .context("failed to read research goal")?;

    // Plan loop: regenerate until the user accepts a plan with tasks.
    loop {
        if let Err(err) = driver.generate_plan(&mut session, &goal).await {
            eprintln!("{}", err);
            if !retry_prompt("Retry plan generation?")? {
                return Ok(());
            }
            continue;
        }

        println!("\n--- Research plan ---");
        if let Some(plan) = session.plan() {
            println!("{}\n", plan.text);
        }

        if session.tasks().is_empty() {
            eprintln!("No numbered tasks found in the plan above.");
            if !retry_prompt("Generate a new plan?")? {
                return Ok(());
            }
            goal = edit_goal(&goal)?;
            continue;
        }

        let accept = Confirm::new()
            .with_prompt("Use this plan?")
            .default(true)
            .interact()
            .context("failed to read confirmation")?;
        if accept {
            break;
        }
        goal = edit_goal(&goal)?;
    }

    // Research loop: selection plus retry on failure.
    loop {
        let selected = select_tasks(&session)?;
        if selected.is_empty() {
            eprintln!("Select at least one task.");
            continue;
        }

        match driver.run_research(&mut session, &selected).await {
            Ok(()) => break,
            Err(err) => {
                eprintln!("{}", err);
                if !retry_prompt("Retry research?")? {
                    return Ok(());
                }
            }
        }
    }

    if let Some(findings) = session.findings() {
        println!("\n--- Findings ---");
        println!("{}\n", findings.text);
    }

    loop {
        match driver.synthesize(&mut session).await {
            Ok(()) => break,
            Err(err) => {
                eprintln!("{}", err);
                if !retry_prompt("Retry synthesis?")? {
                    return Ok(());
                }
            }
        }
    }

    if let Some(report) = session.report() {
        println!("\n--- Executive report ---");
        println!("{}\n", report);
        tokio::fs::write(REPORT_FILE, report)
            .await
            .with_context(|| format!("failed to write {}", REPORT_FILE))?;
        println!("Report saved to {}", REPORT_FILE);
    }

    match session.infographic() {
        Some(bytes) => {
            tokio::fs::write(INFOGRAPHIC_FILE, bytes)
                .await
                .with_context(|| format!("failed to write {}", INFOGRAPHIC_FILE))?;
            println!("Infographic saved to {}", INFOGRAPHIC_FILE);
        }
        None if driver.provider().supports_infographics() => {
            eprintln!("Infographic could not be generated; report saved without it.");
        }
        None => {}
    }

    Ok(())
}

fn retry_prompt(prompt: &str) -> anyhow::Result<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(true)
        .interact()
        .context("failed to read confirmation")
}

fn edit_goal(current: &str) -> anyhow::Result<String> {
    Input::new()
        .with_prompt("Research goal")
        .with_initial_text(current)
        .interact_text()
        .context("failed to read research goal")
}

/// Multi-select over the parsed tasks, all pre-selected.
fn select_tasks(session: &PipelineSession) -> anyhow::Result<BTreeSet<String>> {
    let labels: Vec<String> = session.tasks().iter().map(|t| t.to_line()).collect();
    let defaults = vec![true; labels.len()];
    let picked = MultiSelect::new()
        .with_prompt("Tasks to research (space toggles, enter confirms)")
        .items(&labels)
        .defaults(&defaults)
        .interact()
        .context("failed to read task selection")?;

    Ok(picked
        .into_iter()
        .filter_map(|idx| session.tasks().get(idx))
        .map(|task| task.ordinal.clone())
        .collect())
}
