//! Where snapshots come from.

use std::time::Duration;

use anyhow::Result;

use super::snapshot::{CurrentStats, Snapshot};
use crate::config::ImsConfig;
use crate::utils::http;

/// Read-only access to the backend's dashboard data.
pub trait SnapshotSource {
    /// Full snapshot history, oldest first. May be empty.
    fn history(&self) -> Result<Vec<Snapshot>>;

    /// Current stats, used only to seed when history is empty.
    fn current_stats(&self) -> Result<Option<CurrentStats>>;

    /// The newest snapshot, i.e. the tail of [`history`](Self::history).
    fn latest(&self) -> Result<Option<Snapshot>> {
        Ok(self.history()?.pop())
    }
}

impl<S: SnapshotSource + ?Sized> SnapshotSource for &S {
    fn history(&self) -> Result<Vec<Snapshot>> {
        (**self).history()
    }

    fn current_stats(&self) -> Result<Option<CurrentStats>> {
        (**self).current_stats()
    }

    fn latest(&self) -> Result<Option<Snapshot>> {
        (**self).latest()
    }
}

/// [`SnapshotSource`] backed by the IMS HTTP endpoints.
#[derive(Debug, Clone)]
pub struct HttpSource {
    history_url: String,
    stats_url: String,
    timeout: Duration,
}

impl HttpSource {
    pub fn from_config(config: &ImsConfig) -> Self {
        let base = &config.server.base_url;
        Self {
            history_url: http::endpoint_url(base, &config.endpoints.history),
            stats_url: http::endpoint_url(base, &config.endpoints.stats),
            timeout: config.server.timeout(),
        }
    }

    pub fn history_url(&self) -> &str {
        &self.history_url
    }

    pub fn stats_url(&self) -> &str {
        &self.stats_url
    }
}

impl SnapshotSource for HttpSource {
    fn history(&self) -> Result<Vec<Snapshot>> {
        // `null` is treated like an empty history.
        let history: Option<Vec<Snapshot>> = http::get_json(&self.history_url, self.timeout)?;
        Ok(history.unwrap_or_default())
    }

    fn current_stats(&self) -> Result<Option<CurrentStats>> {
        http::get_json(&self.stats_url, self.timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_follow_config() {
        let mut cfg = ImsConfig::default();
        cfg.server.base_url = "http://ims.example:9000/".to_string();
        cfg.endpoints.history = "/v2/history".to_string();

        let source = HttpSource::from_config(&cfg);
        assert_eq!(source.history_url(), "http://ims.example:9000/v2/history");
        assert_eq!(
            source.stats_url(),
            "http://ims.example:9000/api/dashboard/stats"
        );
        assert_eq!(source.timeout, Duration::from_millis(5000));
    }
}
