//! Prompt Contracts
//!
//! Prompt builders shared by both backend adapters. Where the adapters must
//! behave identically (plan format, report sections) the wording lives here
//! so the contract cannot drift between implementations.

/// Plan prompt: numbered tasks, 5-8 requested.
///
/// The range is a request to the model; validation of what came back
/// happens at the task parser, not here.
pub fn plan_prompt(goal: &str) -> String {
    format!(
        "Create a numbered research plan for: {}\n\nFormat: 1. [Task] - [Details]\n\nInclude 5-8 specific tasks.",
        goal
    )
}

/// Research prompt for backends with a native deep-research capability.
/// All selected tasks go into one request.
pub fn research_prompt(tasks: &[String]) -> String {
    format!(
        "Research these tasks thoroughly with sources:\n\n{}",
        tasks.join("\n\n")
    )
}

/// Per-task fact-extraction prompt for the manual research loop.
pub fn extraction_prompt(task: &str, search_context: &str) -> String {
    format!(
        "Analyze these search results for the task: '{}'. Extract key facts and details.\n\nResults:\n{}",
        task, search_context
    )
}

/// Synthesis prompt: the required report sections are part of the contract.
pub fn synthesis_prompt(research_text: &str) -> String {
    format!(
        "Create an executive report with Summary, Findings, Recommendations, Risks based on this research:\n\n{}",
        research_text
    )
}

/// Infographic prompt for image-capable backends.
pub fn infographic_prompt(text: &str) -> String {
    format!(
        "Create a whiteboard summary infographic for the following: {}",
        text
    )
}
