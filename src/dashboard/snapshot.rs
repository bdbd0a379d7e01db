//! Wire types for the dashboard endpoints and the metrics they carry.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};

/// Label used when a snapshot has neither a date nor a usable timestamp.
pub const FALLBACK_LABEL: &str = "Today";

/// Day label format, e.g. `Oct 19`.
const LABEL_FORMAT: &str = "%b %-d";

/// Timestamp layouts the backend is known to emit besides RFC 3339.
const NAIVE_LAYOUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
];

// ---------------------------------------------------------------------------
// Metric
// ---------------------------------------------------------------------------

/// One tracked dashboard metric. Each metric owns one chart series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Borrowed,
    Returned,
    Inventory,
    Issued,
}

impl Metric {
    /// Every tracked metric, in display order.
    pub const ALL: [Metric; 4] = [
        Metric::Borrowed,
        Metric::Returned,
        Metric::Inventory,
        Metric::Issued,
    ];

    /// Series key.
    pub fn key(self) -> &'static str {
        match self {
            Self::Borrowed => "borrowed",
            Self::Returned => "returned",
            Self::Inventory => "inventory",
            Self::Issued => "issued",
        }
    }

    /// Chart title.
    pub fn title(self) -> &'static str {
        match self {
            Self::Borrowed => "Items Borrowed",
            Self::Returned => "Items Returned",
            Self::Inventory => "Inventory Remaining",
            Self::Issued => "Items Issued",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ---------------------------------------------------------------------------
// Timestamp
// ---------------------------------------------------------------------------

/// Opaque snapshot timestamp. Only compared for equality, never ordered.
///
/// The backend sends ISO local date-times; epoch milliseconds are accepted
/// too, whole or fractional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Millis(i64),
    FractionalMillis(f64),
    Text(String),
}

impl Timestamp {
    /// Day label derived from the timestamp, if it can be interpreted.
    pub fn day_label(&self) -> Option<String> {
        match self {
            Self::Millis(ms) => Local
                .timestamp_millis_opt(*ms)
                .single()
                .map(|dt| dt.format(LABEL_FORMAT).to_string()),
            Self::FractionalMillis(ms) if ms.is_finite() => Local
                .timestamp_millis_opt(ms.trunc() as i64)
                .single()
                .map(|dt| dt.format(LABEL_FORMAT).to_string()),
            Self::FractionalMillis(_) => None,
            Self::Text(text) => parse_text_timestamp(text.trim()),
        }
    }
}

fn parse_text_timestamp(text: &str) -> Option<String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Local).format(LABEL_FORMAT).to_string());
    }
    for layout in NAIVE_LAYOUTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, layout) {
            return Some(dt.format(LABEL_FORMAT).to_string());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .map(|d| d.format(LABEL_FORMAT).to_string())
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Millis(ms) => write!(f, "{ms}"),
            Self::FractionalMillis(ms) => write!(f, "{ms}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<i64> for Timestamp {
    fn from(ms: i64) -> Self {
        Self::Millis(ms)
    }
}

impl From<&str> for Timestamp {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// Label for points built from an untimestamped stats payload.
pub fn today_label() -> String {
    Local::now().format(LABEL_FORMAT).to_string()
}

// ---------------------------------------------------------------------------
// Snapshot / stats records
// ---------------------------------------------------------------------------

/// One entry of `/api/dashboard/history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub timestamp: Timestamp,
    /// Pre-formatted day label chosen by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub items_borrowed: f64,
    pub items_returned: f64,
    pub inventory_remaining: f64,
    pub items_issued: f64,
    /// What triggered the snapshot server-side (`ITEM_ADDED`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
}

impl Snapshot {
    /// Display label: the backend's `date`, else the timestamp's day,
    /// else [`FALLBACK_LABEL`].
    pub fn label(&self) -> String {
        if let Some(date) = self.date.as_deref()
            && !date.is_empty()
        {
            return date.to_string();
        }
        self.timestamp
            .day_label()
            .unwrap_or_else(|| FALLBACK_LABEL.to_string())
    }

    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Borrowed => self.items_borrowed,
            Metric::Returned => self.items_returned,
            Metric::Inventory => self.inventory_remaining,
            Metric::Issued => self.items_issued,
        }
    }
}

/// Payload of `/api/dashboard/stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentStats {
    pub items_borrowed: f64,
    pub items_returned: f64,
    pub inventory_remaining: f64,
    pub items_issued: f64,
    #[serde(default)]
    pub items_by_type: BTreeMap<String, u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_stock_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_items: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_loans: Option<u64>,
}

impl CurrentStats {
    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Borrowed => self.items_borrowed,
            Metric::Returned => self.items_returned,
            Metric::Inventory => self.inventory_remaining,
            Metric::Issued => self.items_issued,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_backend_history_entry() {
        let json = r#"{
            "date": "Oct 19",
            "timestamp": "2026-10-19T14:03:22.123456",
            "itemsBorrowed": 4,
            "itemsReturned": 9,
            "inventoryRemaining": 120,
            "itemsIssued": 13,
            "eventType": "ITEM_ISSUED"
        }"#;
        let snap: Snapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snap.timestamp, Timestamp::from("2026-10-19T14:03:22.123456"));
        assert_eq!(snap.label(), "Oct 19");
        assert_eq!(snap.value(Metric::Inventory), 120.0);
        assert_eq!(snap.event_type.as_deref(), Some("ITEM_ISSUED"));
    }

    #[test]
    fn numeric_timestamp_is_millis() {
        let snap: Snapshot = serde_json::from_str(
            r#"{"timestamp": 2, "itemsBorrowed": 5, "itemsReturned": 0,
                "inventoryRemaining": 0, "itemsIssued": 0}"#,
        )
        .unwrap();
        assert_eq!(snap.timestamp, Timestamp::Millis(2));
        assert!(snap.date.is_none());
    }

    #[test]
    fn fractional_timestamp_is_accepted() {
        let history: Vec<Snapshot> = serde_json::from_str(
            r#"[{"timestamp": 1760000000123.5, "itemsBorrowed": 1, "itemsReturned": 0,
                 "inventoryRemaining": 0, "itemsIssued": 0}]"#,
        )
        .unwrap();
        assert_eq!(history[0].timestamp, Timestamp::FractionalMillis(1760000000123.5));
        assert_ne!(history[0].timestamp, Timestamp::Millis(1760000000123));
        assert!(history[0].timestamp.day_label().is_some());
    }

    #[test]
    fn missing_metric_is_malformed() {
        let result: Result<Snapshot, _> =
            serde_json::from_str(r#"{"timestamp": 1, "itemsBorrowed": 5}"#);
        assert!(result.is_err());
    }

    #[test]
    fn label_falls_back_to_timestamp_day() {
        let snap = Snapshot {
            timestamp: Timestamp::from("2026-01-03T09:15"),
            date: None,
            items_borrowed: 0.0,
            items_returned: 0.0,
            inventory_remaining: 0.0,
            items_issued: 0.0,
            event_type: None,
        };
        assert_eq!(snap.label(), "Jan 3");

        let empty_date = Snapshot {
            date: Some(String::new()),
            ..snap.clone()
        };
        assert_eq!(empty_date.label(), "Jan 3");
    }

    #[test]
    fn label_falls_back_to_today_literal() {
        let snap = Snapshot {
            timestamp: Timestamp::from("not a time"),
            date: None,
            items_borrowed: 0.0,
            items_returned: 0.0,
            inventory_remaining: 0.0,
            items_issued: 0.0,
            event_type: None,
        };
        assert_eq!(snap.label(), FALLBACK_LABEL);
    }

    #[test]
    fn text_timestamp_layouts() {
        assert_eq!(
            Timestamp::from("2026-10-19T14:03:22").day_label().as_deref(),
            Some("Oct 19")
        );
        assert_eq!(
            Timestamp::from("2026-10-05").day_label().as_deref(),
            Some("Oct 5")
        );
        assert!(Timestamp::from("").day_label().is_none());
    }

    #[test]
    fn stats_extras_are_optional() {
        let stats: CurrentStats = serde_json::from_str(
            r#"{"itemsBorrowed": 5, "itemsReturned": 2,
                "inventoryRemaining": 40, "itemsIssued": 3}"#,
        )
        .unwrap();
        assert_eq!(stats.value(Metric::Borrowed), 5.0);
        assert_eq!(stats.value(Metric::Issued), 3.0);
        assert!(stats.items_by_type.is_empty());
        assert!(stats.low_stock_count.is_none());
    }

    #[test]
    fn metric_keys_and_titles() {
        assert_eq!(Metric::Inventory.key(), "inventory");
        assert_eq!(Metric::Inventory.to_string(), "inventory");
        assert_eq!(Metric::Inventory.title(), "Inventory Remaining");
    }
}
