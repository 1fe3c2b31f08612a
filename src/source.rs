//! Read-only inputs for a run: settings, prompt jobs and the brand list.
//!
//! All three live as tabs in the destination spreadsheet and are read
//! once at run start through the [`SheetStore`] seam under the
//! lightweight retry preset.

use std::collections::HashMap;

use crate::error::RetryError;
use crate::retry::{self, RetryPolicy};
use crate::sheets::SheetStore;

/// One unit of work corresponding to one external prompt.
/// Insertion order from the prompt sheet determines the destination row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: String,
    pub prompt_text: String,
}

impl Job {
    /// Destination row for the job at the given list index; row 1 is the
    /// header and jobs start at row 2.
    pub fn row_for_index(index: usize) -> usize {
        index + 2
    }
}

async fn read_rows(
    store: &impl SheetStore,
    range: &str,
) -> Result<Vec<Vec<String>>, RetryError> {
    let policy = RetryPolicy::lightweight();
    retry::run(&policy, move || store.get_range(range)).await
}

/// Key→value settings from `<tab>!A1:B`. Blank keys are skipped.
pub async fn read_settings(
    store: &impl SheetStore,
    tab: &str,
) -> Result<HashMap<String, String>, RetryError> {
    let rows = read_rows(store, &format!("{tab}!A1:B")).await?;
    let mut map = HashMap::new();
    for row in rows {
        let key = row.first().map(|k| k.trim()).unwrap_or_default();
        if key.is_empty() {
            continue;
        }
        let value = row.get(1).cloned().unwrap_or_default();
        map.insert(key.to_string(), value);
    }
    Ok(map)
}

/// Jobs from `<tab>!A2:C`: rows of (id, text, enabled). Only rows with a
/// truthy enabled flag and non-empty id and text become jobs.
pub async fn read_jobs(store: &impl SheetStore, tab: &str) -> Result<Vec<Job>, RetryError> {
    let rows = read_rows(store, &format!("{tab}!A2:C")).await?;
    let jobs = rows
        .into_iter()
        .filter_map(|row| {
            let id = row.first().map(|s| s.trim().to_string())?;
            let text = row.get(1).map(|s| s.trim().to_string())?;
            let enabled = row
                .get(2)
                .map(|s| s.trim().eq_ignore_ascii_case("TRUE"))
                .unwrap_or(false);
            (enabled && !id.is_empty() && !text.is_empty()).then_some(Job {
                id,
                prompt_text: text,
            })
        })
        .collect();
    Ok(jobs)
}

/// Brand names from `<tab>!A2:A`, non-empty cells only.
pub async fn read_brands(store: &impl SheetStore, tab: &str) -> Result<Vec<String>, RetryError> {
    let rows = read_rows(store, &format!("{tab}!A2:A")).await?;
    Ok(rows
        .into_iter()
        .filter_map(|row| row.into_iter().next())
        .filter(|cell| !cell.trim().is_empty())
        .collect())
}
