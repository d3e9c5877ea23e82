//! Plan Task Parser
//!
//! Extracts the numbered task list from free-form plan text. Models are
//! asked for `1. [Task] - [Details]` but real output drifts, so the parser
//! accepts `N.`, `N)` and `N-` markers at line starts and tolerates task
//! bodies wrapped across lines.

use regex::Regex;
use std::sync::OnceLock;

/// One task extracted from a research plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// The ordinal exactly as it appeared in the plan text.
    pub ordinal: String,
    /// Task description with internal line wraps flattened to spaces.
    pub description: String,
}

impl Task {
    /// Render the task back into `N. description` form, the shape fed to
    /// research requests.
    pub fn to_line(&self) -> String {
        format!("{}. {}", self.ordinal, self.description)
    }
}

fn task_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*(\d+)[.)\-]\s+").unwrap())
}

/// Parse numbered tasks out of plan text.
///
/// A task runs from its marker to the next marker or to the first blank
/// line, whichever comes first; prose before the first marker and after a
/// blank-line break is ignored. Ordinals are kept verbatim, including
/// duplicates and gaps: the plan's own numbering is what the user selects
/// against.
pub fn parse_tasks(plan_text: &str) -> Vec<Task> {
    let markers: Vec<_> = task_marker_re().captures_iter(plan_text).collect();

    let mut tasks = Vec::with_capacity(markers.len());
    for (idx, caps) in markers.iter().enumerate() {
        let whole = caps.get(0).map(|m| (m.start(), m.end())).unwrap_or((0, 0));
        let body_end = markers
            .get(idx + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(plan_text.len());

        let body = &plan_text[whole.1..body_end];
        // Stop at the first blank line: anything after it is commentary,
        // not part of the task.
        let body = body.split("\n\n").next().unwrap_or(body);
        let description = body
            .replace("\r\n", " ")
            .replace('\n', " ")
            .trim()
            .to_string();
        if description.is_empty() {
            continue;
        }

        tasks.push(Task {
            ordinal: caps[1].to_string(),
            description,
        });
    }
    tasks
}
