/// Thin JSON-over-HTTP helpers on top of the synchronous `ureq` client.
///
/// All backend traffic goes through here so that status handling and error
/// context are uniform: a non-2xx status, a transport failure, and an
/// unparseable body all surface as an `Err` naming the URL.
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Join a base URL and an endpoint path with exactly one `/` between them.
///
/// `localhost` is rewritten to `127.0.0.1` so that hosts that try IPv6
/// first do not stall when the backend only binds IPv4.
pub fn endpoint_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}").replace("://localhost", "://127.0.0.1")
}

/// `GET` a URL and decode the JSON body.
pub fn get_json<T: DeserializeOwned>(url: &str, timeout: Duration) -> Result<T> {
    let resp = call(ureq::get(url).timeout(timeout).call(), url)?;
    resp.into_json()
        .with_context(|| format!("malformed JSON from {url}"))
}

/// `POST` a JSON body and decode the JSON reply.
pub fn post_json<B: Serialize, T: DeserializeOwned>(
    url: &str,
    timeout: Duration,
    body: &B,
) -> Result<T> {
    let resp = call(ureq::post(url).timeout(timeout).send_json(body), url)?;
    resp.into_json()
        .with_context(|| format!("malformed JSON from {url}"))
}

/// Outcome of a reachability probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    pub status: u16,
    pub latency_ms: u64,
}

/// `GET` a URL and report its status and latency. Any HTTP status counts
/// as reachable; only transport failures are errors.
pub fn probe(url: &str, timeout: Duration) -> Result<Probe> {
    let start = Instant::now();
    let status = match ureq::get(url).timeout(timeout).call() {
        Ok(resp) => resp.status(),
        Err(ureq::Error::Status(code, _)) => code,
        Err(e) => return Err(e).with_context(|| format!("{url} is unreachable")),
    };
    Ok(Probe {
        status,
        latency_ms: start.elapsed().as_millis() as u64,
    })
}

fn call(
    result: std::result::Result<ureq::Response, ureq::Error>,
    url: &str,
) -> Result<ureq::Response> {
    match result {
        Ok(resp) => Ok(resp),
        Err(ureq::Error::Status(code, _)) => anyhow::bail!("{url} returned HTTP {code}"),
        Err(e) => Err(e).with_context(|| format!("request to {url} failed")),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_url_joins_with_single_slash() {
        assert_eq!(
            endpoint_url("http://ims.local:8080/", "/api/dashboard/history"),
            "http://ims.local:8080/api/dashboard/history"
        );
        assert_eq!(
            endpoint_url("http://ims.local:8080", "api/chatbot/chat"),
            "http://ims.local:8080/api/chatbot/chat"
        );
    }

    #[test]
    fn endpoint_url_pins_localhost_to_ipv4() {
        assert_eq!(
            endpoint_url("http://localhost:8080", "/api/dashboard/stats"),
            "http://127.0.0.1:8080/api/dashboard/stats"
        );
    }

    #[test]
    fn unreachable_host_is_an_error() {
        // Port 9 (discard) on loopback is not expected to accept HTTP.
        let err = get_json::<serde_json::Value>(
            "http://127.0.0.1:9/api/dashboard/history",
            Duration::from_millis(200),
        );
        assert!(err.is_err());
    }
}
