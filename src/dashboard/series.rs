//! Bounded per-metric chart series.

use super::snapshot::Metric;

/// Points kept per series unless configured otherwise.
pub const DEFAULT_CAPACITY: usize = 20;

/// How a series changed in one update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesChange {
    /// The whole series was (re)built.
    Seeded,
    /// The point at `index` got a new value; length unchanged.
    Overwrote { index: usize },
    /// A point was pushed at the end. `evicted` is set when the oldest
    /// point was dropped to stay within capacity.
    Appended { evicted: bool },
}

impl SeriesChange {
    pub fn describe(self) -> &'static str {
        match self {
            Self::Seeded => "seeded",
            Self::Overwrote { .. } => "overwrote",
            Self::Appended { evicted: false } => "appended",
            Self::Appended { evicted: true } => "appended+evicted",
        }
    }
}

/// Ordered `(label, value)` points for one metric, oldest first.
///
/// Labels and values are kept in two parallel vectors so that they can be
/// handed to a rendering surface as slices. The length never exceeds
/// `capacity`.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    metric: Metric,
    capacity: usize,
    labels: Vec<String>,
    values: Vec<f64>,
}

impl Series {
    /// An empty series. A zero capacity is treated as one.
    pub fn new(metric: Metric, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            metric,
            capacity,
            labels: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Build a series from chronological points. Only the newest
    /// `capacity` points are kept.
    pub fn from_points<I>(metric: Metric, capacity: usize, points: I) -> Self
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        let mut series = Self::new(metric, capacity);
        for (label, value) in points {
            series.push(label, value);
        }
        series
    }

    /// Reconcile one incoming point: overwrite the value under an existing
    /// label, or append a new point and evict from the front if the series
    /// is over capacity.
    pub fn apply(&mut self, label: &str, value: f64) -> SeriesChange {
        match self.position(label) {
            Some(index) => {
                self.values[index] = value;
                SeriesChange::Overwrote { index }
            }
            None => {
                let evicted = self.push(label.to_string(), value);
                SeriesChange::Appended { evicted }
            }
        }
    }

    /// Index of the first point carrying exactly `label`.
    pub fn position(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    fn push(&mut self, label: String, value: f64) -> bool {
        self.labels.push(label);
        self.values.push(value);
        if self.labels.len() > self.capacity {
            self.labels.remove(0);
            self.values.remove(0);
            true
        } else {
            false
        }
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Value of the newest point.
    pub fn current(&self) -> Option<f64> {
        self.values.last().copied()
    }

    pub fn points(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

/// Chart annotation for a value: `Current: 7`.
pub fn annotation(value: f64) -> String {
    format!("Current: {value}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
