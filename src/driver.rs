//! Pipeline Driver
//!
//! Owns the phase state machine: Idle -> Planned -> Researched ->
//! Synthesized. Each phase runs through the backend-neutral
//! `ResearchProvider` trait; any phase may be retried, and a successful
//! re-plan clears all downstream artifacts so stale findings can never
//! leak into a new report.

use std::collections::BTreeSet;
use std::sync::Arc;

use research_pilot_core::ProgressReporter;
use research_pilot_llm::{ResearchFindings, ResearchPlan, ResearchProvider};

use crate::parser::{parse_tasks, Task};

/// Pipeline phases, used for error attribution and progress reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelinePhase {
    Plan,
    Research,
    Synthesis,
    Infographic,
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelinePhase::Plan => "plan",
            PipelinePhase::Research => "research",
            PipelinePhase::Synthesis => "synthesis",
            PipelinePhase::Infographic => "infographic",
        };
        write!(f, "{}", name)
    }
}

/// How far the session has progressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Idle,
    Planned,
    Researched,
    Synthesized,
}

/// A phase failure; the session stays at its pre-phase stage so the phase
/// can be retried.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{phase} phase failed: {message}")]
pub struct PhaseFailure {
    pub phase: PipelinePhase,
    pub message: String,
}

/// Accumulated artifacts of one research run.
///
/// Fields fill in strictly in phase order; `clear_downstream` is the only
/// way intermediate state is discarded.
#[derive(Default)]
pub struct PipelineSession {
    plan: Option<ResearchPlan>,
    tasks: Vec<Task>,
    findings: Option<ResearchFindings>,
    report: Option<String>,
    infographic: Option<Vec<u8>>,
}

impl PipelineSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current stage, derived from which artifacts exist.
    pub fn stage(&self) -> PipelineStage {
        if self.report.is_some() {
            PipelineStage::Synthesized
        } else if self.findings.is_some() {
            PipelineStage::Researched
        } else if self.plan.is_some() {
            PipelineStage::Planned
        } else {
            PipelineStage::Idle
        }
    }

    pub fn plan(&self) -> Option<&ResearchPlan> {
        self.plan.as_ref()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn findings(&self) -> Option<&ResearchFindings> {
        self.findings.as_ref()
    }

    pub fn report(&self) -> Option<&str> {
        self.report.as_deref()
    }

    pub fn infographic(&self) -> Option<&[u8]> {
        self.infographic.as_deref()
    }

    /// Drop everything derived from the plan. Called when a new plan
    /// replaces the old one.
    fn clear_downstream(&mut self) {
        self.findings = None;
        self.report = None;
        self.infographic = None;
    }
}

/// Drives a `PipelineSession` through its phases against one provider.
pub struct PipelineDriver {
    provider: Arc<dyn ResearchProvider>,
    reporter: Arc<dyn ProgressReporter>,
}

impl PipelineDriver {
    pub fn new(provider: Arc<dyn ResearchProvider>, reporter: Arc<dyn ProgressReporter>) -> Self {
        Self { provider, reporter }
    }

    pub fn provider(&self) -> &dyn ResearchProvider {
        self.provider.as_ref()
    }

    fn fail(&self, phase: PipelinePhase, message: String) -> PhaseFailure {
        self.reporter.error(&phase.to_string(), &message);
        PhaseFailure { phase, message }
    }

    /// Generate (or regenerate) the research plan.
    ///
    /// On success the new plan replaces the old one and all downstream
    /// artifacts are cleared. On failure the session is left untouched.
    pub async fn generate_plan(
        &self,
        session: &mut PipelineSession,
        goal: &str,
    ) -> Result<(), PhaseFailure> {
        self.reporter.progress(0, "Generating research plan");
        let plan = self
            .provider
            .create_plan(goal)
            .await
            .map_err(|e| self.fail(PipelinePhase::Plan, e.to_string()))?;
        if plan.text.trim().is_empty() {
            return Err(self.fail(
                PipelinePhase::Plan,
                "backend returned an empty plan".to_string(),
            ));
        }

        session.clear_downstream();
        session.tasks = parse_tasks(&plan.text);
        session.plan = Some(plan);
        self.reporter.progress(100, "Plan ready");
        Ok(())
    }

    /// Research the tasks whose ordinals appear in `selected`.
    ///
    /// Requires a plan and a non-empty selection. Task lines are sent in
    /// their `N. description` form so findings stay traceable to the plan.
    pub async fn run_research(
        &self,
        session: &mut PipelineSession,
        selected: &BTreeSet<String>,
    ) -> Result<(), PhaseFailure> {
        let plan_context = match session.plan() {
            Some(plan) => plan.context_id.clone(),
            None => {
                return Err(self.fail(
                    PipelinePhase::Research,
                    "no plan to research; generate a plan first".to_string(),
                ))
            }
        };

        let task_lines: Vec<String> = session
            .tasks
            .iter()
            .filter(|task| selected.contains(&task.ordinal))
            .map(Task::to_line)
            .collect();
        if task_lines.is_empty() {
            return Err(self.fail(
                PipelinePhase::Research,
                "no tasks selected for research".to_string(),
            ));
        }

        let findings = self
            .provider
            .execute_research(
                &task_lines,
                plan_context.as_deref(),
                self.reporter.as_ref(),
            )
            .await
            .map_err(|e| self.fail(PipelinePhase::Research, e.to_string()))?;
        if findings.text.trim().is_empty() {
            return Err(self.fail(
                PipelinePhase::Research,
                "backend returned empty findings".to_string(),
            ));
        }

        session.findings = Some(findings);
        Ok(())
    }

    /// Synthesize the executive report, then attempt the infographic.
    ///
    /// The infographic is best-effort: its absence never fails the phase.
    pub async fn synthesize(&self, session: &mut PipelineSession) -> Result<(), PhaseFailure> {
        let (research_text, research_context) = match session.findings() {
            Some(findings) => (findings.text.clone(), findings.context_id.clone()),
            None => {
                return Err(self.fail(
                    PipelinePhase::Synthesis,
                    "no findings to synthesize; run research first".to_string(),
                ))
            }
        };

        self.reporter.progress(0, "Synthesizing report");
        let report = self
            .provider
            .synthesize_report(&research_text, research_context.as_deref())
            .await
            .map_err(|e| self.fail(PipelinePhase::Synthesis, e.to_string()))?;
        if report.trim().is_empty() {
            return Err(self.fail(
                PipelinePhase::Synthesis,
                "backend returned an empty report".to_string(),
            ));
        }
        self.reporter.progress(100, "Report ready");

        session.infographic = if self.provider.supports_infographics() {
            self.reporter.progress(100, "Rendering infographic");
            self.provider.generate_infographic(&report).await
        } else {
            None
        };
        session.report = Some(report);
        Ok(())
    }
}
