//! Bounded-concurrency worker pool.
//!
//! Dispatches one task per job over a shared claim cursor: exactly
//! `min(concurrency, jobs)` workers run at once, each repeatedly taking
//! the next unclaimed index until none remain. Failure isolation is
//! per-job; only a flush failure is fatal to the run. The pool future
//! resolves at the drain barrier: every worker exited, no job unclaimed.

use std::sync::Mutex;

use futures::future::join_all;

use crate::analysis::BrandMatcher;
use crate::buffer::WriteBuffer;
use crate::config::RunConfig;
use crate::error::BrandpulseError;
use crate::openai::Generator;
use crate::retry::RetryPolicy;
use crate::schema::{self, ColumnMap};
use crate::sheets::{PendingWrite, SheetStore, a1};
use crate::source::Job;
use crate::ui::RunProgress;
use crate::urls;

/// Marker prefix stored in place of the augmented text when the augmented
/// call fails; the job itself still counts as processed.
pub const AUGMENTED_ERROR_PREFIX: &str = "(error augmented)";

/// Everything produced for one job. Built exactly once per job; only the
/// constituent remote calls are retried, never the job as a whole.
#[derive(Debug, Clone, PartialEq)]
pub struct JobResult {
    pub job_id: String,
    pub primary_text: String,
    pub primary_classification: String,
    pub augmented_text: Option<String>,
    pub augmented_classification: Option<String>,
    pub augmented_sources: Option<Vec<String>>,
}

/// What the pool hands back to the coordinator at the drain barrier.
#[derive(Debug, Default)]
pub struct SchedulerOutcome {
    pub processed: usize,
    pub errors: Vec<String>,
}

/// Shared pool state; every field mutated only under this lock.
struct PoolState {
    cursor: usize,
    processed: usize,
    since_flush: usize,
    errors: Vec<String>,
    fatal: Option<BrandpulseError>,
}

/// Run all jobs through the pool. Flushes the write buffer inline every
/// `cfg.flush_every` processed jobs under `flush_policy`; the remainder
/// smaller than the threshold is left pending for the coordinator's
/// final flush.
pub async fn run_pool<G: Generator, S: SheetStore>(
    cfg: &RunConfig,
    date_key: &str,
    jobs: &[Job],
    matcher: &BrandMatcher,
    cols: &ColumnMap,
    buffer: &WriteBuffer,
    generator: &G,
    store: &S,
    progress: Option<&RunProgress>,
    flush_policy: &RetryPolicy,
) -> Result<SchedulerOutcome, BrandpulseError> {
    if jobs.is_empty() {
        return Ok(SchedulerOutcome::default());
    }

    let state = Mutex::new(PoolState {
        cursor: 0,
        processed: 0,
        since_flush: 0,
        errors: Vec::new(),
        fatal: None,
    });

    let pool_size = cfg.concurrency.min(jobs.len()).max(1);
    let workers: Vec<_> = (0..pool_size)
        .map(|_| {
            worker_loop(
                cfg, date_key, jobs, matcher, cols, buffer, generator, store, progress, &state,
                flush_policy,
            )
        })
        .collect();
    join_all(workers).await;

    let state = state.into_inner().expect("pool lock poisoned");
    if let Some(fatal) = state.fatal {
        return Err(fatal);
    }
    Ok(SchedulerOutcome {
        processed: state.processed,
        errors: state.errors,
    })
}

async fn worker_loop<G: Generator, S: SheetStore>(
    cfg: &RunConfig,
    date_key: &str,
    jobs: &[Job],
    matcher: &BrandMatcher,
    cols: &ColumnMap,
    buffer: &WriteBuffer,
    generator: &G,
    store: &S,
    progress: Option<&RunProgress>,
    state: &Mutex<PoolState>,
    flush_policy: &RetryPolicy,
) {
    loop {
        let claimed = {
            let mut st = state.lock().expect("pool lock poisoned");
            if st.fatal.is_some() || st.cursor >= jobs.len() {
                None
            } else {
                let idx = st.cursor;
                st.cursor += 1;
                Some(idx)
            }
        };
        let Some(idx) = claimed else {
            break;
        };
        let job = &jobs[idx];

        let writes = match run_job(generator, matcher, cfg, job).await {
            Ok(result) => writes_for(&result, idx, &cfg.tab_wide, date_key, cols),
            Err(msg) => Err(msg),
        };

        match writes {
            Ok(writes) => {
                buffer.enqueue(writes);
                let need_flush = {
                    let mut st = state.lock().expect("pool lock poisoned");
                    st.processed += 1;
                    st.since_flush += 1;
                    if st.since_flush >= cfg.flush_every {
                        st.since_flush = 0;
                        true
                    } else {
                        false
                    }
                };
                if let Some(p) = progress {
                    p.job_done(&job.id);
                }
                if need_flush {
                    if let Err(e) = buffer.flush(store, flush_policy).await {
                        // Accumulated results would be lost; stop the run.
                        state.lock().expect("pool lock poisoned").fatal = Some(e);
                        break;
                    }
                }
            }
            Err(msg) => {
                state.lock().expect("pool lock poisoned").errors.push(msg);
                if let Some(p) = progress {
                    p.job_failed(&job.id);
                }
            }
        }
    }
}

/// Execute one job's remote calls and classification.
///
/// A primary-call failure fails the job. An augmented-call failure is
/// demoted to a degraded result: the error marker is stored as the text
/// (and still URL-scanned and classified), so the primary half survives.
async fn run_job<G: Generator>(
    generator: &G,
    matcher: &BrandMatcher,
    cfg: &RunConfig,
    job: &Job,
) -> Result<JobResult, String> {
    let primary = generator
        .primary(&cfg.model, &job.prompt_text)
        .await
        .map_err(|e| format!("job {}: {e}", job.id))?;
    let primary_classification = matcher.analyze(&primary);

    let mut result = JobResult {
        job_id: job.id.clone(),
        primary_text: primary,
        primary_classification,
        augmented_text: None,
        augmented_classification: None,
        augmented_sources: None,
    };

    if cfg.dual_variant {
        let (text, sources) = match generator.augmented(&cfg.model, &job.prompt_text).await {
            Ok(answer) => (answer.text, answer.sources),
            Err(e) => {
                let marker = format!("{AUGMENTED_ERROR_PREFIX} {e}");
                let sources = urls::dedupe_and_normalize(urls::extract_from_text(&marker));
                (marker, sources)
            }
        };
        result.augmented_classification = Some(matcher.analyze(&text));
        result.augmented_text = Some(text);
        result.augmented_sources = Some(sources);
    }

    Ok(result)
}

/// Map a job's result onto pending cell writes. Every label the job needs
/// must resolve in the column map; a missing label fails this job only.
fn writes_for(
    result: &JobResult,
    index: usize,
    tab: &str,
    date_key: &str,
    cols: &ColumnMap,
) -> Result<Vec<PendingWrite>, String> {
    let row = Job::row_for_index(index);
    let col = |suffix: &str| -> Result<usize, String> {
        let lbl = schema::label(date_key, suffix);
        cols.get(&lbl).copied().ok_or_else(|| {
            format!("job {}: column {lbl} not resolved", result.job_id)
        })
    };

    let mut writes = vec![
        PendingWrite::new(
            a1::tab_cell(tab, row, col(schema::RESULTS_PRIMARY)?),
            result.primary_text.clone(),
        ),
        PendingWrite::new(
            a1::tab_cell(tab, row, col(schema::ANALYSIS_PRIMARY)?),
            result.primary_classification.clone(),
        ),
    ];

    if let Some(text) = &result.augmented_text {
        writes.push(PendingWrite::new(
            a1::tab_cell(tab, row, col(schema::RESULTS_AUGMENTED)?),
            text.clone(),
        ));
        writes.push(PendingWrite::new(
            a1::tab_cell(tab, row, col(schema::ANALYSIS_AUGMENTED)?),
            result.augmented_classification.clone().unwrap_or_default(),
        ));
        writes.push(PendingWrite::new(
            a1::tab_cell(tab, row, col(schema::SOURCES_AUGMENTED)?),
            result.augmented_sources.clone().unwrap_or_default().join("\n"),
        ));
    }

    Ok(writes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{RemoteError, RetryError};
    use crate::openai::AugmentedAnswer;
    use crate::source::tests::FakeStore;
    use std::time::Duration;
    use tokio::time::sleep;

    fn fast_flush() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 2,
            base_delay: Duration::from_millis(1),
            backoff_factor: 2,
        }
    }

    fn test_cfg(concurrency: usize, flush_every: usize, dual: bool) -> RunConfig {
        RunConfig {
            model: "gpt-4o".into(),
            tab_prompts: "Prompts".into(),
            tab_brands: "Brands".into(),
            tab_wide: "Daily_Runs".into(),
            dual_variant: dual,
            concurrency,
            flush_every,
        }
    }

    fn test_jobs(n: usize) -> Vec<Job> {
        (1..=n)
            .map(|i| Job {
                id: format!("p{i}"),
                prompt_text: format!("prompt {i}"),
            })
            .collect()
    }

    fn test_cols(dual: bool) -> ColumnMap {
        let mut cols = ColumnMap::new();
        for (i, lbl) in schema::daily_labels("2026-08-29", dual).into_iter().enumerate() {
            cols.insert(lbl, i + 3);
        }
        cols
    }

    fn matcher() -> BrandMatcher {
        BrandMatcher::new(vec!["Acme".into(), "Sales Captain".into()])
    }

    /// Generator that tracks peak concurrency and fails on demand.
    #[derive(Default)]
    struct MockGen {
        gauge: Mutex<(usize, usize)>, // (active, peak)
        fail_primary_for: Vec<String>,
        fail_augmented: bool,
    }

    impl MockGen {
        async fn enter(&self) {
            {
                let mut g = self.gauge.lock().unwrap();
                g.0 += 1;
                g.1 = g.1.max(g.0);
            }
            sleep(Duration::from_millis(5)).await;
        }

        fn leave(&self) {
            self.gauge.lock().unwrap().0 -= 1;
        }

        fn peak(&self) -> usize {
            self.gauge.lock().unwrap().1
        }
    }

    impl Generator for MockGen {
        async fn primary(&self, _model: &str, prompt: &str) -> Result<String, RetryError> {
            self.enter().await;
            self.leave();
            if self.fail_primary_for.iter().any(|p| p == prompt) {
                return Err(RetryError::Exhausted {
                    attempts: 5,
                    source: RemoteError::Status {
                        status: 503,
                        message: "unavailable".into(),
                    },
                });
            }
            Ok(format!("Acme answer to {prompt}"))
        }

        async fn augmented(
            &self,
            _model: &str,
            prompt: &str,
        ) -> Result<AugmentedAnswer, RetryError> {
            if self.fail_augmented {
                return Err(RetryError::Fatal(RemoteError::Status {
                    status: 400,
                    message: "schema rejected, see https://errors.example.com/schema".into(),
                }));
            }
            Ok(AugmentedAnswer {
                text: format!("Sales Captain answer to {prompt}"),
                sources: vec!["https://example.com/a".into()],
            })
        }
    }

    #[tokio::test]
    async fn pool_is_bounded_and_processes_everything() {
        let cfg = test_cfg(5, 5, false);
        let jobs = test_jobs(12);
        let cols = test_cols(false);
        let buffer = WriteBuffer::new();
        let generator = MockGen::default();
        let store = FakeStore::default();

        let outcome = run_pool(
            &cfg,
            "2026-08-29",
            &jobs,
            &matcher(),
            &cols,
            &buffer,
            &generator,
            &store,
            None,
            &fast_flush(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.processed, 12);
        assert!(outcome.errors.is_empty());
        assert!(generator.peak() <= 5, "peak concurrency was {}", generator.peak());

        // Two inline flushes of 5 jobs (2 writes each); 2 jobs remain pending.
        let batches = store.batches.lock().unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].len(), 10);
        assert_eq!(batches[1].len(), 10);
        assert_eq!(buffer.pending_len(), 4);
    }

    #[tokio::test]
    async fn pool_never_runs_more_workers_than_jobs() {
        let cfg = test_cfg(50, 5, false);
        let jobs = test_jobs(3);
        let buffer = WriteBuffer::new();
        let generator = MockGen::default();
        let store = FakeStore::default();

        let outcome = run_pool(
            &cfg,
            "2026-08-29",
            &jobs,
            &matcher(),
            &test_cols(false),
            &buffer,
            &generator,
            &store,
            None,
            &fast_flush(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.processed, 3);
        assert!(generator.peak() <= 3);
    }

    #[tokio::test]
    async fn job_failure_is_isolated() {
        let cfg = test_cfg(2, 5, false);
        let jobs = test_jobs(4);
        let buffer = WriteBuffer::new();
        let generator = MockGen {
            fail_primary_for: vec!["prompt 2".into()],
            ..MockGen::default()
        };
        let store = FakeStore::default();

        let outcome = run_pool(
            &cfg,
            "2026-08-29",
            &jobs,
            &matcher(),
            &test_cols(false),
            &buffer,
            &generator,
            &store,
            None,
            &fast_flush(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.processed, 3);
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].starts_with("job p2:"));
        // 3 successful jobs x 2 writes, all still pending (threshold not hit).
        assert_eq!(buffer.pending_len(), 6);
    }

    #[tokio::test]
    async fn augmented_failure_degrades_but_job_is_processed() {
        let cfg = test_cfg(1, 5, true);
        let jobs = test_jobs(1);
        let buffer = WriteBuffer::new();
        let generator = MockGen {
            fail_augmented: true,
            ..MockGen::default()
        };
        let store = FakeStore::default();

        let outcome = run_pool(
            &cfg,
            "2026-08-29",
            &jobs,
            &matcher(),
            &test_cols(true),
            &buffer,
            &generator,
            &store,
            None,
            &fast_flush(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.processed, 1);
        assert!(outcome.errors.is_empty());

        let pending = buffer.pending_len();
        assert_eq!(pending, 5, "primary pair + full augmented triple");
    }

    #[tokio::test]
    async fn flush_failure_is_fatal_to_the_run() {
        let cfg = test_cfg(2, 5, false);
        let jobs = test_jobs(10);
        let buffer = WriteBuffer::new();
        let generator = MockGen::default();
        let store = FakeStore {
            fail_batches: true,
            ..FakeStore::default()
        };

        let result = run_pool(
            &cfg,
            "2026-08-29",
            &jobs,
            &matcher(),
            &test_cols(false),
            &buffer,
            &generator,
            &store,
            None,
            &fast_flush(),
        )
        .await;

        assert!(matches!(result, Err(BrandpulseError::Persist(_))));
        // The failed batch was re-queued, not dropped.
        assert!(buffer.pending_len() >= 10);
    }

    #[tokio::test]
    async fn missing_column_fails_the_job_not_the_run() {
        let cfg = test_cfg(2, 5, true);
        let jobs = test_jobs(2);
        let buffer = WriteBuffer::new();
        let generator = MockGen::default();
        let store = FakeStore::default();

        // Map only has the primary columns; augmented labels are absent.
        let outcome = run_pool(
            &cfg,
            "2026-08-29",
            &jobs,
            &matcher(),
            &test_cols(false),
            &buffer,
            &generator,
            &store,
            None,
            &fast_flush(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.processed, 0);
        assert_eq!(outcome.errors.len(), 2);
        assert!(outcome.errors[0].contains("not resolved"));
    }

    #[tokio::test]
    async fn degraded_marker_is_classified_and_scanned() {
        let result = run_job(
            &MockGen {
                fail_augmented: true,
                ..MockGen::default()
            },
            &matcher(),
            &test_cfg(1, 5, true),
            &test_jobs(1)[0],
        )
        .await
        .unwrap();

        let text = result.augmented_text.unwrap();
        assert!(text.starts_with(AUGMENTED_ERROR_PREFIX));
        // The URL embedded in the error body is still harvested.
        assert_eq!(
            result.augmented_sources.unwrap(),
            vec!["https://errors.example.com/schema"]
        );
        assert_eq!(result.augmented_classification.unwrap(), "SC=No | Brands=");
    }

    #[test]
    fn writes_target_the_job_row_and_mapped_columns() {
        let result = JobResult {
            job_id: "p1".into(),
            primary_text: "text".into(),
            primary_classification: "SC=No | Brands=".into(),
            augmented_text: None,
            augmented_classification: None,
            augmented_sources: None,
        };
        let writes = writes_for(&result, 0, "Daily_Runs", "2026-08-29", &test_cols(false)).unwrap();
        assert_eq!(writes[0].range, "Daily_Runs!C2");
        assert_eq!(writes[1].range, "Daily_Runs!D2");
    }
}
