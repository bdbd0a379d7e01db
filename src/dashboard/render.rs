//! Rendering surfaces: where reconciled series end up.
//!
//! The reconciler only talks to the [`RenderSurface`] trait. The terminal
//! surface draws a sparkline per metric; the recording surface keeps every
//! update for inspection.

use std::io::Write;

use colored::Colorize;

use super::series::SeriesChange;
use super::snapshot::Metric;

/// One notification sent to a surface after a series changed.
///
/// `labels` and `values` are always the full series and have equal length.
#[derive(Debug, Clone, Copy)]
pub struct SeriesUpdate<'a> {
    pub metric: Metric,
    pub labels: &'a [String],
    pub values: &'a [f64],
    pub annotation: &'a str,
    pub change: SeriesChange,
}

/// Something that can draw a line series.
///
/// Implementations must accept repeated calls for the same metric with
/// sequences that grow up to the series capacity and then stay there,
/// as well as in-place value changes that leave the length alone.
pub trait RenderSurface {
    fn update(&mut self, update: &SeriesUpdate<'_>);
}

impl<R: RenderSurface + ?Sized> RenderSurface for &mut R {
    fn update(&mut self, update: &SeriesUpdate<'_>) {
        (**self).update(update);
    }
}

// ---------------------------------------------------------------------------
// Recording surface
// ---------------------------------------------------------------------------

/// Owned copy of a [`SeriesUpdate`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedUpdate {
    pub metric: Metric,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub annotation: String,
    pub change: SeriesChange,
}

/// Surface that stores every update it receives.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub updates: Vec<RecordedUpdate>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent update for `metric`.
    pub fn last_for(&self, metric: Metric) -> Option<&RecordedUpdate> {
        self.updates.iter().rev().find(|u| u.metric == metric)
    }

    pub fn clear(&mut self) {
        self.updates.clear();
    }
}

impl RenderSurface for RecordingSurface {
    fn update(&mut self, update: &SeriesUpdate<'_>) {
        self.updates.push(RecordedUpdate {
            metric: update.metric,
            labels: update.labels.to_vec(),
            values: update.values.to_vec(),
            annotation: update.annotation.to_string(),
            change: update.change,
        });
    }
}

// ---------------------------------------------------------------------------
// Terminal surface
// ---------------------------------------------------------------------------

const SPARK_BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Surface that prints one line per update:
///
/// ```text
/// Items Borrowed       ▁▃▅█  Current: 7   Oct 16 → Oct 19  [appended]
/// ```
pub struct TerminalSurface<W: Write> {
    out: W,
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl TerminalSurface<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> RenderSurface for TerminalSurface<W> {
    fn update(&mut self, update: &SeriesUpdate<'_>) {
        let span = match (update.labels.first(), update.labels.last()) {
            (Some(first), Some(last)) if first != last => format!("{first} → {last}"),
            (Some(only), _) => only.clone(),
            _ => "no data".to_string(),
        };
        let change = match update.change {
            SeriesChange::Seeded => update.change.describe().dimmed(),
            SeriesChange::Overwrote { .. } => update.change.describe().yellow(),
            SeriesChange::Appended { .. } => update.change.describe().green(),
        };

        // Terminal write failures are not worth stopping the poll loop for.
        let _ = writeln!(
            self.out,
            "{:<20} {:<20} {:<14} {}  [{}]",
            update.metric.title().bold(),
            sparkline(update.values).cyan(),
            update.annotation,
            span.dimmed(),
            change,
        );
        let _ = self.out.flush();
    }
}

/// Render values as a block sparkline scaled from `min(0, lowest)` to the
/// highest value.
pub fn sparkline(values: &[f64]) -> String {
    let finite = values.iter().copied().filter(|v| v.is_finite());
    let (lo, hi) = finite.fold((0.0_f64, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    let range = hi - lo;
    let top = (SPARK_BARS.len() - 1) as f64;

    values
        .iter()
        .map(|&v| {
            if !v.is_finite() || range <= 0.0 {
                return SPARK_BARS[0];
            }
            let step = (((v - lo) / range) * top).round() as usize;
            SPARK_BARS[step.min(SPARK_BARS.len() - 1)]
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparkline_scales_from_zero() {
        assert_eq!(sparkline(&[0.0, 7.0]), "▁█");
        assert_eq!(sparkline(&[7.0, 7.0]), "██");
        assert_eq!(sparkline(&[]), "");
    }

    #[test]
    fn sparkline_flat_zero_series() {
        assert_eq!(sparkline(&[0.0, 0.0, 0.0]), "▁▁▁");
    }

    #[test]
    fn sparkline_ignores_non_finite() {
        assert_eq!(sparkline(&[f64::NAN, 4.0]), "▁█");
    }

    #[test]
    fn recording_surface_copies_updates() {
        let labels = vec!["Oct 18".to_string(), "Oct 19".to_string()];
        let values = vec![3.0, 4.0];
        let mut surface = RecordingSurface::new();
        surface.update(&SeriesUpdate {
            metric: Metric::Returned,
            labels: &labels,
            values: &values,
            annotation: "Current: 4",
            change: SeriesChange::Appended { evicted: false },
        });

        let last = surface.last_for(Metric::Returned).unwrap();
        assert_eq!(last.labels, labels);
        assert_eq!(last.annotation, "Current: 4");
        assert!(surface.last_for(Metric::Issued).is_none());
    }

    #[test]
    fn terminal_surface_writes_one_line_per_update() {
        colored::control::set_override(false);
        let labels = vec!["Oct 18".to_string(), "Oct 19".to_string()];
        let values = vec![3.0, 4.0];
        let mut surface = TerminalSurface::new(Vec::new());
        surface.update(&SeriesUpdate {
            metric: Metric::Borrowed,
            labels: &labels,
            values: &values,
            annotation: "Current: 4",
            change: SeriesChange::Overwrote { index: 1 },
        });

        let text = String::from_utf8(surface.into_inner()).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.contains("Items Borrowed"));
        assert!(text.contains("Current: 4"));
        assert!(text.contains("Oct 18 → Oct 19"));
        assert!(text.contains("[overwrote]"));
    }
}
