//! Live dashboard: bounded per-metric series kept in sync with the backend.
//!
//! [`watch`] drives a [`Reconciler`]: wait out the initial delay, seed once,
//! then poll on a [`Ticker`] until the tick budget runs out (or forever).

pub mod reconciler;
pub mod render;
pub mod series;
pub mod snapshot;
pub mod source;
pub mod ticker;

use std::thread;

use anyhow::Result;

pub use reconciler::{PollOutcome, Reconciler, SeedOutcome};
pub use render::{RecordingSurface, RenderSurface, SeriesUpdate, TerminalSurface};
pub use series::{Series, SeriesChange};
pub use snapshot::{CurrentStats, Metric, Snapshot, Timestamp};
pub use source::{HttpSource, SnapshotSource};
pub use ticker::Ticker;

use crate::config::schema::DashboardConfig;
use crate::eventlog::EventKind;

/// Totals for one [`watch`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchSummary {
    pub polls: u64,
    pub reconciled: u64,
    pub failed: u64,
    pub dropped_ticks: u64,
}

/// Seed `reconciler`, then poll it on the configured period.
///
/// Stops after `max_ticks` polls, or never when `None`. Poll failures are
/// counted and logged but do not end the loop.
pub fn watch<S, R>(
    reconciler: &mut Reconciler<S, R>,
    settings: &DashboardConfig,
    max_ticks: Option<u64>,
) -> Result<WatchSummary>
where
    S: SnapshotSource,
    R: RenderSurface,
{
    thread::sleep(settings.initial_delay());
    reconciler.seed()?;

    let mut ticker = Ticker::new(settings.poll_interval());
    let mut summary = WatchSummary::default();

    while max_ticks.is_none_or(|max| summary.polls < max) {
        let dropped = ticker.wait();
        if dropped > 0 {
            summary.dropped_ticks += dropped;
            reconciler.events().record(
                EventKind::Ticker,
                "dropped",
                Some(&format!("{dropped} ticks skipped behind a slow poll")),
            );
        }

        let outcome = reconciler.poll();
        summary.polls += 1;
        match outcome {
            PollOutcome::FetchFailed(_) => summary.failed += 1,
            ref o if o.mutated() => summary.reconciled += 1,
            _ => {}
        }
    }

    Ok(summary)
}
