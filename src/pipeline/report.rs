//! User-facing run summary.

use super::orchestrator::PipelineRun;
use super::state::PipelineStage;
use std::path::PathBuf;

/// Render the summary printed when a run ends
///
/// **Public** - used by the assemble command
///
/// # Arguments
/// * `run` - Finished run
/// * `analysis_url` - Where the published trace can be viewed, if known
///
/// # Returns
/// A multi-line summary on success, a single line naming the failed stage
/// and cause otherwise
pub fn render_summary(run: &PipelineRun, analysis_url: Option<&str>) -> String {
    if let Some((stage, cause)) = run.failure() {
        // Simulator stderr and HTTP bodies span several lines; the full text
        // is in the error log
        return format!(
            "Pipeline failed at stage {}: {}",
            stage,
            single_line(&cause.to_string())
        );
    }

    let display = |path: &Option<PathBuf>| {
        path.as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default()
    };

    let mut out = format!(
        "Successfully wrote output to '{}' and '{}'",
        display(&run.intermediate_path),
        display(&run.trace_path)
    );

    for stage in PipelineStage::ALL {
        if let Some(elapsed) = run.elapsed_for(stage) {
            out.push_str(&format!(
                "\n  {} took {:.3} seconds",
                stage.summary_label(),
                elapsed.as_secs_f64()
            ));
        }
    }

    if let Some(url) = analysis_url {
        out.push_str("\n  View trace analysis here:");
        out.push_str(&format!("\n    {}", url));
    }

    out
}

/// Join the non-blank lines of `text` with single spaces
fn single_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
