// Copyright 2026 Chronosweep Contributors
// SPDX-License-Identifier: Apache-2.0

//! Page-by-page collection loop: dedup, stall detection, bounded retry.
//!
//! The collector drives a `ListingPage` until a target count of unique
//! records is held, merging rows across page boundaries without duplication
//! and failing fast when the source stops yielding anything new. Navigation
//! to the next page is the one operation with local recovery: a bounded
//! retry with linear backoff.

pub mod verify;

use crate::error::SweepError;
use crate::model::{CollectedSet, NavigationOutcome, Record};
use crate::progress::{self, SweepEvent, SweepSender};
use crate::renderer::{ListingPage, RowsWait};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Tunable bounds for a sweep. Every field is overridable for tests.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Upper bound on waiting for the row container, per page. A breach is
    /// fatal, not retried. Default 15s.
    pub row_wait_timeout_ms: u64,
    /// Total navigation attempts per page transition. Default 3.
    pub nav_max_attempts: u32,
    /// Backoff unit between failed attempts; attempt N waits N units.
    /// Default 500ms.
    pub nav_backoff_step_ms: u64,
    /// Pause after a successful navigation so the next page's content can
    /// settle before the poll. Default 150ms.
    pub settle_delay_ms: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            row_wait_timeout_ms: 15_000,
            nav_max_attempts: 3,
            nav_backoff_step_ms: 500,
            settle_delay_ms: 150,
        }
    }
}

/// Drives collection until a target count of unique records is held.
pub struct Collector {
    config: SweepConfig,
    progress: Option<SweepSender>,
}

impl Collector {
    pub fn new(config: SweepConfig) -> Self {
        Self {
            config,
            progress: None,
        }
    }

    /// Attach a progress channel; events are dropped without one.
    pub fn with_progress(mut self, tx: SweepSender) -> Self {
        self.progress = Some(tx);
        self
    }

    /// Collect up to `target` records, then certify the newest-to-oldest
    /// invariant over the result.
    ///
    /// This is the whole run: either a verified, ordered sequence or one
    /// tagged failure distinguishing the terminal cases.
    pub async fn run(
        &mut self,
        page: &mut dyn ListingPage,
        target: usize,
    ) -> Result<Vec<Record>, SweepError> {
        let set = self.collect(page, target).await?;
        let records = set.into_records();
        verify::verify_descending(&records)?;
        Ok(records)
    }

    /// Collect up to `target` unique records from the page.
    ///
    /// Returns the accumulated set on success. The set may hold fewer than
    /// `target` records when the listing runs out of pages right after a
    /// productive iteration; that short-circuit is a defined terminal state,
    /// distinct from stalling. See `SweepError` for the failure modes.
    pub async fn collect(
        &mut self,
        page: &mut dyn ListingPage,
        target: usize,
    ) -> Result<CollectedSet, SweepError> {
        let started = std::time::Instant::now();
        let mut set = CollectedSet::new();
        let mut zero_streak = 0u32;
        let mut page_no = 1u32;

        if target == 0 {
            return Ok(set);
        }

        loop {
            match page.wait_for_rows(self.config.row_wait_timeout_ms).await? {
                RowsWait::Ready => {}
                RowsWait::TimedOut => {
                    return Err(SweepError::ExtractionTimedOut {
                        timeout_ms: self.config.row_wait_timeout_ms,
                    });
                }
            }

            let snap = page.snapshot().await?;
            let added = set.merge_page(&snap.rows, target);
            debug!(page = page_no, rows = snap.rows.len(), added, total = set.len(), "merged page");
            progress::emit(
                &self.progress,
                SweepEvent::PageMerged {
                    page: page_no,
                    rows: snap.rows.len(),
                    added,
                    total: set.len(),
                },
            );

            if set.len() >= target {
                break;
            }

            zero_streak = if added > 0 { 0 } else { zero_streak + 1 };
            if added == 0 && (!snap.has_more || zero_streak > 1) {
                return Err(SweepError::CollectionStalled {
                    collected: set.len(),
                });
            }
            if !snap.has_more {
                info!(collected = set.len(), target, "listing exhausted before target");
                break;
            }

            self.advance_with_retry(page).await?;
            sleep(Duration::from_millis(self.config.settle_delay_ms)).await;
            page_no += 1;
        }

        info!(collected = set.len(), pages = page_no, "collection finished");
        progress::emit(
            &self.progress,
            SweepEvent::SweepComplete {
                collected: set.len(),
                pages: page_no,
                elapsed_ms: started.elapsed().as_millis() as u64,
            },
        );
        Ok(set)
    }

    /// Advance to the next page with bounded retry and linear backoff.
    ///
    /// A failure is either a hard navigation error or a non-success outcome.
    /// Exhausting the attempts is fatal for the run.
    async fn advance_with_retry(&mut self, page: &mut dyn ListingPage) -> Result<(), SweepError> {
        let max = self.config.nav_max_attempts;
        let mut last_error = String::from("no navigation attempts configured");

        for attempt in 1..=max {
            let failure = match page.advance().await {
                Ok(outcome) if outcome.ok => return Ok(()),
                Ok(outcome) => describe_failure(&outcome),
                Err(e) => format!("{e:#}"),
            };

            warn!(attempt, max, %failure, "navigation attempt failed");
            progress::emit(
                &self.progress,
                SweepEvent::NavigationRetry {
                    attempt,
                    error: failure.clone(),
                },
            );
            last_error = failure;

            if attempt < max {
                let backoff = self.config.nav_backoff_step_ms * u64::from(attempt);
                sleep(Duration::from_millis(backoff)).await;
            }
        }

        Err(SweepError::NavigationFailed {
            attempts: max,
            last_error,
        })
    }
}

fn describe_failure(outcome: &NavigationOutcome) -> String {
    match (&outcome.error, outcome.status) {
        (Some(err), Some(status)) => format!("{err} (status {status})"),
        (Some(err), None) => err.clone(),
        (None, Some(status)) => format!("page load returned status {status}"),
        (None, None) => "navigation did not complete".to_string(),
    }
}
