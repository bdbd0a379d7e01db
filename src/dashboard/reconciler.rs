//! Snapshot reconciler: keeps one bounded series per metric in sync with
//! the backend's snapshot history.
//!
//! # Lifecycle
//!
//! 1. [`Reconciler::seed`] runs once. It builds every series from the full
//!    history, or from the current stats when the history is empty, and
//!    remembers the newest timestamp as `last_seen`.
//! 2. [`Reconciler::poll`] runs on every tick. It fetches the newest
//!    snapshot and does nothing if its timestamp equals `last_seen`.
//!    Otherwise it overwrites the point under the same label or appends a
//!    new point, in every series.
//!
//! Fetch failures never mutate state. `last_seen` only moves when a
//! snapshot has actually been applied, so a transient failure cannot hide
//! the next real change.
//!
//! All series share one label axis: they are seeded from the same records
//! and every poll applies the same label to each of them.

use std::collections::BTreeMap;

use anyhow::Result;

use super::render::{RenderSurface, SeriesUpdate};
use super::series::{self, DEFAULT_CAPACITY, Series, SeriesChange};
use super::snapshot::{CurrentStats, Metric, Snapshot, Timestamp, today_label};
use super::source::SnapshotSource;
use crate::eventlog::{EventKind, EventLog};

/// How the initial seed was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedOutcome {
    /// Seeded from `points` history entries (after capacity trimming).
    History { points: usize },
    /// History was empty; seeded one point per metric from current stats.
    Stats,
    /// Neither source produced data. No series exist.
    Empty,
}

/// Result of a single poll.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The source had no snapshot.
    NoSnapshot,
    /// Newest timestamp equals `last_seen`.
    Unchanged,
    /// The fetch failed. Nothing was mutated.
    FetchFailed(String),
    /// There were no series yet, so the poll seeded them from history.
    Seeded { points: usize },
    /// A new snapshot was applied to every series.
    Reconciled { label: String, change: SeriesChange },
}

impl PollOutcome {
    /// Whether this poll changed any series.
    pub fn mutated(&self) -> bool {
        matches!(self, Self::Seeded { .. } | Self::Reconciled { .. })
    }
}

/// Owns the per-metric series and the `last_seen` marker.
///
/// Polls take `&mut self`, so one reconciler can never run two polls at
/// once; the [`Ticker`](super::ticker::Ticker) drops ticks instead of
/// queueing them behind a slow poll.
pub struct Reconciler<S, R> {
    source: S,
    surface: R,
    capacity: usize,
    series: BTreeMap<Metric, Series>,
    last_seen: Option<Timestamp>,
    last_event: Option<String>,
    seeded: bool,
    events: EventLog,
}

impl<S: SnapshotSource, R: RenderSurface> Reconciler<S, R> {
    pub fn new(source: S, surface: R) -> Self {
        Self::with_capacity(source, surface, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(source: S, surface: R, capacity: usize) -> Self {
        Self {
            source,
            surface,
            capacity: capacity.max(1),
            series: BTreeMap::new(),
            last_seen: None,
            last_event: None,
            seeded: false,
            events: EventLog::disabled(),
        }
    }

    /// Record seed and poll events to `events`.
    pub fn with_event_log(mut self, events: EventLog) -> Self {
        self.events = events;
        self
    }

    // -- Seed --

    /// Build the initial series. Fetch problems are soft: they are logged
    /// and fall through to the next source, ending in
    /// [`SeedOutcome::Empty`]. Calling this a second time is an error.
    pub fn seed(&mut self) -> Result<SeedOutcome> {
        if self.seeded {
            anyhow::bail!("reconciler has already been seeded");
        }
        self.seeded = true;

        let history = match self.source.history() {
            Ok(history) => history,
            Err(e) => {
                self.events
                    .record(EventKind::Seed, "history-failed", Some(&format!("{e:#}")));
                Vec::new()
            }
        };

        if !history.is_empty() {
            let points = self.install_history(&history);
            self.events
                .record(EventKind::Seed, "history", Some(&format!("{points} points")));
            return Ok(SeedOutcome::History { points });
        }

        match self.source.current_stats() {
            Ok(Some(stats)) => {
                self.install_stats(&stats);
                self.events.record(EventKind::Seed, "stats", None);
                Ok(SeedOutcome::Stats)
            }
            Ok(None) => {
                self.events.record(EventKind::Seed, "empty", None);
                Ok(SeedOutcome::Empty)
            }
            Err(e) => {
                self.events
                    .record(EventKind::Seed, "stats-failed", Some(&format!("{e:#}")));
                Ok(SeedOutcome::Empty)
            }
        }
    }

    fn install_history(&mut self, history: &[Snapshot]) -> usize {
        let labels: Vec<String> = history.iter().map(Snapshot::label).collect();
        for metric in Metric::ALL {
            let points = labels
                .iter()
                .cloned()
                .zip(history.iter().map(|snap| snap.value(metric)));
            self.series
                .insert(metric, Series::from_points(metric, self.capacity, points));
        }
        self.last_seen = history.last().map(|snap| snap.timestamp.clone());
        self.last_event = history.last().and_then(|snap| snap.event_type.clone());
        self.render_all();
        self.series.values().next().map_or(0, Series::len)
    }

    fn install_stats(&mut self, stats: &CurrentStats) {
        let label = today_label();
        for metric in Metric::ALL {
            let points = std::iter::once((label.clone(), stats.value(metric)));
            self.series
                .insert(metric, Series::from_points(metric, self.capacity, points));
        }
        // The stats payload carries no timestamp.
        self.last_seen = None;
        self.last_event = None;
        self.render_all();
    }

    fn render_all(&mut self) {
        for series in self.series.values() {
            let annotation = series::annotation(series.current().unwrap_or(0.0));
            self.surface.update(&SeriesUpdate {
                metric: series.metric(),
                labels: series.labels(),
                values: series.values(),
                annotation: &annotation,
                change: SeriesChange::Seeded,
            });
        }
    }

    // -- Poll --

    /// Fetch the newest snapshot and reconcile it into every series.
    pub fn poll(&mut self) -> PollOutcome {
        if self.series.is_empty() {
            return self.late_seed();
        }

        let latest = match self.source.latest() {
            Ok(latest) => latest,
            Err(e) => return self.fetch_failed(e),
        };
        let Some(snapshot) = latest else {
            return PollOutcome::NoSnapshot;
        };
        if self.last_seen.as_ref() == Some(&snapshot.timestamp) {
            return PollOutcome::Unchanged;
        }

        self.last_seen = Some(snapshot.timestamp.clone());
        self.last_event = snapshot.event_type.clone();
        let label = snapshot.label();
        let mut first_change = None;

        for series in self.series.values_mut() {
            let value = snapshot.value(series.metric());
            let change = series.apply(&label, value);
            first_change.get_or_insert(change);

            let annotation = series::annotation(value);
            self.surface.update(&SeriesUpdate {
                metric: series.metric(),
                labels: series.labels(),
                values: series.values(),
                annotation: &annotation,
                change,
            });
        }

        let change = first_change.unwrap_or(SeriesChange::Seeded);
        let detail = match &self.last_event {
            Some(event) => format!("{label} ({event})"),
            None => label.clone(),
        };
        self.events
            .record(EventKind::Poll, change.describe(), Some(&detail));
        PollOutcome::Reconciled { label, change }
    }

    /// No series exist yet, either because seeding found nothing or because
    /// it never ran. Build the series from the first history that shows up;
    /// once that happens [`seed`](Self::seed) is rejected like any repeat.
    fn late_seed(&mut self) -> PollOutcome {
        let history = match self.source.history() {
            Ok(history) => history,
            Err(e) => return self.fetch_failed(e),
        };
        if history.is_empty() {
            return PollOutcome::NoSnapshot;
        }
        self.seeded = true;
        let points = self.install_history(&history);
        self.events
            .record(EventKind::Poll, "seeded", Some(&format!("{points} points")));
        PollOutcome::Seeded { points }
    }

    fn fetch_failed(&self, error: anyhow::Error) -> PollOutcome {
        let message = format!("{error:#}");
        self.events
            .record(EventKind::Poll, "fetch-failed", Some(&message));
        PollOutcome::FetchFailed(message)
    }

    // -- Accessors --

    pub fn series(&self, metric: Metric) -> Option<&Series> {
        self.series.get(&metric)
    }

    pub fn all_series(&self) -> impl Iterator<Item = &Series> {
        self.series.values()
    }

    pub fn last_seen(&self) -> Option<&Timestamp> {
        self.last_seen.as_ref()
    }

    /// Server-side event behind the newest applied snapshot.
    pub fn last_event(&self) -> Option<&str> {
        self.last_event.as_deref()
    }

    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn surface(&self) -> &R {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut R {
        &mut self.surface
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
