use crate::client::ActivitySource;
use crate::engine::models::{ActivityDetail, ActivitySummary};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Fetch details for every summary, skipping (and warning about) failures.
pub fn fetch_all_details<S: ActivitySource>(
    source: &S,
    summaries: &[ActivitySummary],
) -> Result<Vec<ActivityDetail>> {
    let progress = ProgressBar::new(summaries.len() as u64);
    progress.set_style(ProgressStyle::with_template(
        "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}",
    )?);
    progress.set_message("Fetching activity details…");

    let details = summaries
        .par_iter()
        .filter_map(|summary| {
            let result = source.get_activity_detail(&summary.id);
            progress.inc(1);
            match result {
                Ok(detail) => Some(detail),
                Err(e) => {
                    warn!(id = %summary.id, error = %e, "failed to fetch activity details");
                    None
                }
            }
        })
        .collect();

    progress.finish_with_message("Fetch complete");
    Ok(details)
}

/// Write `details` to `path` as pretty-printed JSON.
pub fn write_dump(path: &Path, details: &[ActivityDetail]) -> Result<()> {
    let data = serde_json::to_string_pretty(details).context("Failed to serialize activities")?;
    fs::write(path, data).with_context(|| format!("Failed to write {}", path.display()))
}
