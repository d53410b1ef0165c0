//! Text rendering for the stats table and batch summaries.

use probe_core::failure::RequirementFailure;
use probe_core::state::TestResult;

use crate::orchestrator::BatchReport;
use crate::registry::TestRegistry;

const HUMAN_MARK: &str = "\u{270B} ";
const NO_HUMAN_MARK: &str = "   ";

fn result_label(result: TestResult) -> &'static str {
    match result {
        TestResult::Unrun => "\u{26AB} Not run",
        TestResult::Success => "\u{2714}\u{FE0F} Passed",
        TestResult::Failed => "\u{274C} Failed",
    }
}

/// Fenced table of every registered test and its last result.
pub fn render_stats(registry: &TestRegistry) -> String {
    if registry.is_empty() {
        return "No tests registered.".to_string();
    }

    let width = registry
        .iter()
        .map(|test| test.name().chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::from("```\n");
    for test in registry {
        let mark = if test.needs_human() {
            HUMAN_MARK
        } else {
            NO_HUMAN_MARK
        };
        out.push_str(&format!(
            "{:>width$} {}{}\n",
            test.name(),
            mark,
            result_label(test.result()),
            width = width
        ));
    }
    out.push_str("```\n");
    out
}

/// Pass/fail counts for a finished batch, then one line per failure.
pub fn render_batch_summary(report: &BatchReport) -> String {
    if report.entries.is_empty() {
        return "No tests matched.".to_string();
    }
    let mut out = format!(
        "ran {} test(s): {} passed, {} failed",
        report.entries.len(),
        report.passed(),
        report.failed()
    );
    for entry in &report.entries {
        let Some(failure) = entry.failure else {
            continue;
        };
        out.push_str(&format!("\n  {}: {}", entry.name, failure.code()));
        let tags = failure_tags(failure);
        if !tags.is_empty() {
            out.push_str(&format!(" ({})", tags.join(", ")));
        }
    }
    out
}

fn failure_tags(failure: RequirementFailure) -> Vec<&'static str> {
    let mut tags = Vec::new();
    if failure.is_human() {
        tags.push("human verdict");
    }
    if failure.is_timeout() {
        tags.push("timed out");
    }
    tags
}
