//! Run coordinator: provisioning, scheduling, draining, reporting.
//!
//! One parameterized coordinator drives every run shape — plain,
//! dual-variant and batched writes are all configuration, not separate
//! code paths.

use serde::{Deserialize, Serialize};

use crate::analysis::BrandMatcher;
use crate::buffer::WriteBuffer;
use crate::config::{AppConfig, RunConfig};
use crate::error::BrandpulseError;
use crate::openai::OpenAiClient;
use crate::retry::RetryPolicy;
use crate::scheduler;
use crate::schema;
use crate::sheets::SheetsClient;
use crate::source;
use crate::ui::RunProgress;

/// Tab holding the key→value run settings.
const SETTINGS_TAB: &str = "Settings";

/// Final report of one run. Serialized as the entry point's JSON response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub ok: bool,
    pub model: String,
    pub dual: bool,
    /// Total enabled jobs read from the prompt sheet.
    pub prompts: usize,
    /// Jobs that produced a result and had their writes enqueued.
    pub processed: usize,
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// CLI-level overrides applied on top of the Settings tab.
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub model: Option<String>,
    pub dual: Option<bool>,
    pub concurrency: Option<usize>,
    pub flush_every: Option<usize>,
}

fn apply_overrides(mut cfg: RunConfig, overrides: &RunOverrides) -> RunConfig {
    if let Some(model) = &overrides.model {
        cfg.model = model.clone();
    }
    if let Some(dual) = overrides.dual {
        cfg.dual_variant = dual;
    }
    if let Some(concurrency) = overrides.concurrency {
        cfg.concurrency = concurrency.max(1);
    }
    if let Some(flush_every) = overrides.flush_every {
        cfg.flush_every = flush_every.max(crate::config::MIN_FLUSH_EVERY);
    }
    cfg
}

/// Execute one full run and return its summary.
///
/// Validates credentials eagerly, reads settings / jobs / brands,
/// provisions today's columns, fans the jobs out over the worker pool and
/// performs the final unconditional flush after the drain barrier.
/// Partial failure shows up in `errors`; configuration, provisioning and
/// final-flush failures are returned as errors instead of a summary.
pub async fn execute(
    app: &AppConfig,
    overrides: &RunOverrides,
    show_progress: bool,
) -> Result<RunSummary, BrandpulseError> {
    app.validate()?;

    let generator = match &app.openai_base_url {
        Some(base) => OpenAiClient::with_base_url(app.openai_api_key.clone(), base.clone()),
        None => OpenAiClient::new(app.openai_api_key.clone()),
    };
    let store = match &app.sheets_base_url {
        Some(base) => SheetsClient::with_base_url(
            app.sheets_token.clone(),
            app.sheet_id.clone(),
            base.clone(),
        ),
        None => SheetsClient::new(app.sheets_token.clone(), app.sheet_id.clone()),
    };

    let settings = source::read_settings(&store, SETTINGS_TAB).await?;
    let cfg = apply_overrides(
        RunConfig::from_settings(&settings, &app.default_model),
        overrides,
    );

    let jobs = source::read_jobs(&store, &cfg.tab_prompts).await?;
    if jobs.is_empty() {
        return Ok(RunSummary {
            ok: true,
            model: cfg.model,
            dual: cfg.dual_variant,
            prompts: 0,
            processed: 0,
            errors: Vec::new(),
            message: Some("No enabled prompts".to_string()),
        });
    }
    let brands = source::read_brands(&store, &cfg.tab_brands).await?;
    let matcher = BrandMatcher::new(brands);

    schema::ensure_wide_header(&store, &cfg.tab_wide, &jobs).await?;
    let date_key = app.today_key();
    let cols =
        schema::ensure_daily_columns(&store, &cfg.tab_wide, &date_key, cfg.dual_variant).await?;

    let buffer = WriteBuffer::new();
    let flush_policy = RetryPolicy::default();
    let progress = show_progress.then(|| RunProgress::start(jobs.len(), &cfg.model));

    let outcome = scheduler::run_pool(
        &cfg,
        &date_key,
        &jobs,
        &matcher,
        &cols,
        &buffer,
        &generator,
        &store,
        progress.as_ref(),
        &flush_policy,
    )
    .await?;

    // Drain barrier reached; persist the remainder below the threshold.
    buffer.flush(&store, &flush_policy).await?;

    if let Some(p) = &progress {
        p.finish();
    }

    Ok(RunSummary {
        ok: true,
        model: cfg.model,
        dual: cfg.dual_variant,
        prompts: jobs.len(),
        processed: outcome.processed,
        errors: outcome.errors,
        message: None,
    })
}
