//! Run report export and process exit policy.

use std::path::Path;

use tracing::info;
use vconvert_models::RunReport;

use crate::error::WorkerResult;

/// Exit code when item failures are escalated.
pub const EXIT_ITEM_FAILURES: i32 = 2;

/// Write `report` as pretty-printed JSON, creating parent directories.
pub async fn write_report(report: &RunReport, path: &Path) -> WorkerResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let json = serde_json::to_vec_pretty(report)?;
    tokio::fs::write(path, json).await?;

    info!("Wrote run report to {}", path.display());
    Ok(())
}

/// Process exit code for a finished run.
///
/// Item failures only affect the exit code when `fail_on_item_error` is set.
pub fn exit_code(report: &RunReport, fail_on_item_error: bool) -> i32 {
    if fail_on_item_error && report.has_failures() {
        EXIT_ITEM_FAILURES
    } else {
        0
    }
}
