//! Schema provisioning for the wide results tab.
//!
//! The destination grid grows a fixed set of columns per calendar day.
//! [`ensure_daily_columns`] resolves (and if needed allocates) those
//! columns and returns the label→index map every job reads from;
//! [`ensure_wide_header`] creates the tab and seeds the identity columns.

use std::collections::HashMap;

use crate::error::{BrandpulseError, RemoteError};
use crate::sheets::{SheetStore, a1};
use crate::source::Job;

/// Resolved label→column-index mapping (1-based) for one day's columns.
/// Built once per run, read-only afterwards.
pub type ColumnMap = HashMap<String, usize>;

pub const RESULTS_PRIMARY: &str = "results_primary";
pub const ANALYSIS_PRIMARY: &str = "analysis_primary";
pub const RESULTS_AUGMENTED: &str = "results_augmented";
pub const ANALYSIS_AUGMENTED: &str = "analysis_augmented";
pub const SOURCES_AUGMENTED: &str = "sources_augmented";

/// Column label for a given day and suffix, e.g. `2026-08-29_results_primary`.
pub fn label(date_key: &str, suffix: &str) -> String {
    format!("{date_key}_{suffix}")
}

/// The labels a run needs, in allocation order.
pub fn daily_labels(date_key: &str, want_augmented: bool) -> Vec<String> {
    let mut labels = vec![
        label(date_key, RESULTS_PRIMARY),
        label(date_key, ANALYSIS_PRIMARY),
    ];
    if want_augmented {
        labels.push(label(date_key, RESULTS_AUGMENTED));
        labels.push(label(date_key, ANALYSIS_AUGMENTED));
        labels.push(label(date_key, SOURCES_AUGMENTED));
    }
    labels
}

/// Create the wide tab if it does not exist, seed the identity header and
/// upsert the job rows (`prompt_id`, `prompt_text` in A and B).
pub async fn ensure_wide_header(
    store: &impl SheetStore,
    tab: &str,
    jobs: &[Job],
) -> Result<(), BrandpulseError> {
    match store.get_range(&format!("{tab}!A1:B1")).await {
        Ok(_) => {}
        // The backend reports an unknown tab as a client error on the range.
        Err(RemoteError::Status { .. }) => store.add_sheet(tab).await?,
        Err(e) => return Err(e.into()),
    }

    store
        .update_range(
            &format!("{tab}!A1:B1"),
            vec![vec!["prompt_id".to_string(), "prompt_text".to_string()]],
        )
        .await?;

    if !jobs.is_empty() {
        let rows: Vec<Vec<String>> = jobs
            .iter()
            .map(|j| vec![j.id.clone(), j.prompt_text.clone()])
            .collect();
        store
            .update_range(&format!("{tab}!A2:B{}", jobs.len() + 1), rows)
            .await?;
    }
    Ok(())
}

/// Ensure today's columns exist in the header row and return the
/// label→index mapping.
///
/// Missing labels are appended in a single update starting at the first
/// free column, then the header is re-read so every index (new and
/// reused) comes from the authoritative row. Idempotent: a second call
/// against an unmodified header performs no mutation.
pub async fn ensure_daily_columns(
    store: &impl SheetStore,
    tab: &str,
    date_key: &str,
    want_augmented: bool,
) -> Result<ColumnMap, BrandpulseError> {
    let header_range = format!("{tab}!1:1");
    let header = first_row(store.get_range(&header_range).await?);

    let mut cols = ColumnMap::new();
    let mut missing = Vec::new();
    for lbl in daily_labels(date_key, want_augmented) {
        match header.iter().position(|h| h == &lbl) {
            Some(i) => {
                cols.insert(lbl, i + 1);
            }
            None => missing.push(lbl),
        }
    }

    if !missing.is_empty() {
        let start = header.len() + 1;
        let end = start + missing.len() - 1;
        store
            .update_range(
                &format!("{tab}!{}1:{}1", a1::col_name(start), a1::col_name(end)),
                vec![missing.clone()],
            )
            .await?;

        let reread = first_row(store.get_range(&header_range).await?);
        for lbl in missing {
            let Some(i) = reread.iter().position(|h| h == &lbl) else {
                return Err(BrandpulseError::Schema(format!(
                    "column {lbl} absent after header append"
                )));
            };
            cols.insert(lbl, i + 1);
        }
    }

    Ok(cols)
}

fn first_row(rows: Vec<Vec<String>>) -> Vec<String> {
    rows.into_iter().next().unwrap_or_default()
}
