//! CLI command implementations.
//!
//! - `imsdash watch`: live dashboard in the terminal
//! - `imsdash snapshot`: one-off view of the seeded series
//! - `imsdash chat`: talk to the IMS assistant
//! - `imsdash health`: probe every backend endpoint
//! - `imsdash events`: show the tail of the event log
//! - `imsdash config show|init|set|reset`: configuration management

use std::io::{self, BufRead, Write};

use anyhow::Result;
use colored::Colorize;

use crate::chat::{ChatClient, ChatSession, Sender};
use crate::config::{self, ImsConfig};
use crate::dashboard::render::sparkline;
use crate::dashboard::{
    self, CurrentStats, HttpSource, Metric, RecordingSurface, Reconciler, SeedOutcome,
    SnapshotSource, TerminalSurface,
};
use crate::eventlog::{EventEntry, EventLog};
use crate::utils::http;

/// Output format for read-only commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            _ => Self::Table,
        }
    }
}

// ---------------------------------------------------------------------------
// imsdash watch
// ---------------------------------------------------------------------------

/// Seed the dashboard and keep polling, printing every series change.
pub fn run_watch(ticks: Option<u64>) -> Result<()> {
    let cfg = config::load();
    let source = HttpSource::from_config(&cfg);

    println!(
        "{} {} every {} ms (keeping {} points)",
        "Watching".bold().cyan(),
        source.history_url(),
        cfg.dashboard.poll_interval_ms,
        cfg.dashboard.capacity,
    );
    println!("Press Ctrl+C to stop.\n");

    let mut reconciler =
        Reconciler::with_capacity(source, TerminalSurface::stdout(), cfg.dashboard.capacity)
            .with_event_log(EventLog::from_config(&cfg));

    let summary = dashboard::watch(&mut reconciler, &cfg.dashboard, ticks)?;

    println!();
    println!(
        "{} {} polls, {} changes, {} failed, {} ticks dropped",
        "Done:".bold(),
        summary.polls,
        summary.reconciled,
        summary.failed,
        summary.dropped_ticks,
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// imsdash snapshot
// ---------------------------------------------------------------------------

/// Seed once and print the resulting series, followed by the backend's
/// current totals when the stats endpoint answers.
pub fn run_snapshot(format: OutputFormat) -> Result<()> {
    let cfg = config::load();
    let source = HttpSource::from_config(&cfg);

    let mut reconciler =
        Reconciler::with_capacity(&source, RecordingSurface::new(), cfg.dashboard.capacity)
            .with_event_log(EventLog::from_config(&cfg));
    let outcome = reconciler.seed()?;

    if outcome == SeedOutcome::Empty {
        println!(
            "{}",
            format!("No dashboard data available from {}.", source.history_url()).yellow()
        );
        return Ok(());
    }

    // The totals panel is optional; a failing stats endpoint only hides it.
    let stats = source.current_stats().ok().flatten();

    match format {
        OutputFormat::Json => print_snapshot_json(&reconciler, stats.as_ref())?,
        OutputFormat::Table => {
            print_snapshot_table(&reconciler, &outcome);
            if let Some(stats) = &stats {
                println!();
                for line in stats_lines(stats) {
                    println!("{line}");
                }
            }
        }
    }
    Ok(())
}

/// Totals and per-type counts from the stats payload.
fn stats_lines(stats: &CurrentStats) -> Vec<String> {
    let mut lines = vec![format!("{}", "Current totals".bold())];
    let totals = [
        ("Total items", stats.total_items),
        ("Total loans", stats.total_loans),
        ("Low stock", stats.low_stock_count),
    ];
    for (name, value) in totals {
        if let Some(value) = value {
            lines.push(format!("  {name:<20} {value}"));
        }
    }
    if !stats.items_by_type.is_empty() {
        lines.push(format!("  {}", "By type".bold()));
        for (kind, count) in &stats.items_by_type {
            lines.push(format!("    {kind:<18} {count}"));
        }
    }
    lines
}

fn print_snapshot_table<S, R>(reconciler: &Reconciler<S, R>, outcome: &SeedOutcome)
where
    S: dashboard::SnapshotSource,
    R: dashboard::RenderSurface,
{
    let source_note = match outcome {
        SeedOutcome::History { points } => format!("{points} days of history"),
        SeedOutcome::Stats => "current stats only".to_string(),
        SeedOutcome::Empty => "no data".to_string(),
    };
    println!("{} ({})", "IMS Dashboard".bold().cyan(), source_note.dimmed());
    println!("{}", "=".repeat(64));
    if let Some(event) = reconciler.last_event() {
        println!("  {} {}", "Last event:".bold(), event);
    }

    for series in reconciler.all_series() {
        println!(
            "  {:<20} {:<20} Current: {}",
            series.metric().title().bold(),
            sparkline(series.values()),
            series.current().unwrap_or(0.0),
        );
    }
    println!();

    // All series share one label axis; the first one supplies the rows.
    let Some(axis) = reconciler.all_series().next() else {
        return;
    };
    print!("  {:<10}", "Date");
    for metric in Metric::ALL {
        print!(" {:>10}", metric.key());
    }
    println!();
    println!("  {}", "-".repeat(54));

    for (row, label) in axis.labels().iter().enumerate() {
        let mut line = format!("  {label:<10}");
        for metric in Metric::ALL {
            let value = reconciler
                .series(metric)
                .and_then(|s| s.values().get(row).copied());
            match value {
                Some(v) => line.push_str(&format!(" {v:>10}")),
                None => line.push_str(&format!(" {:>10}", "-")),
            }
        }
        if row % 2 == 0 {
            println!("{line}");
        } else {
            println!("{}", line.dimmed());
        }
    }
}

fn print_snapshot_json<S, R>(
    reconciler: &Reconciler<S, R>,
    stats: Option<&CurrentStats>,
) -> Result<()>
where
    S: dashboard::SnapshotSource,
    R: dashboard::RenderSurface,
{
    let series: serde_json::Map<String, serde_json::Value> = reconciler
        .all_series()
        .map(|s| {
            (
                s.metric().key().to_string(),
                serde_json::json!({
                    "title": s.metric().title(),
                    "labels": s.labels(),
                    "values": s.values(),
                    "current": s.current(),
                }),
            )
        })
        .collect();

    let value = serde_json::json!({
        "lastSeen": reconciler.last_seen(),
        "lastEvent": reconciler.last_event(),
        "stats": stats,
        "capacity": reconciler.capacity(),
        "series": series,
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// imsdash chat
// ---------------------------------------------------------------------------

/// Send one message, or run an interactive session on stdin when
/// `message` is `None`.
pub fn run_chat(message: Option<String>) -> Result<()> {
    let cfg = config::load();
    let client = ChatClient::from_config(&cfg).with_event_log(EventLog::from_config(&cfg));

    if let Some(message) = message {
        println!("{}", client.send(&message));
        return Ok(());
    }

    let mut session = ChatSession::new(client);
    session.toggle();
    println!("{}", "IMS Assistant".bold().cyan());
    println!("{}", "Type a question, or 'exit' to leave.".dimmed());
    for msg in session.messages() {
        print_bot(&msg.text);
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("{} ", "you>".bold().green());
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        if matches!(line.trim(), "exit" | "quit") {
            break;
        }
        if let Some(reply) = session.send(&line)
            && reply.sender == Sender::Bot
        {
            print_bot(&reply.text);
        }
    }

    session.toggle();
    println!();
    Ok(())
}

fn print_bot(text: &str) {
    println!("{} {}", "bot>".bold().blue(), text);
}

// ---------------------------------------------------------------------------
// imsdash health
// ---------------------------------------------------------------------------

/// Probe every configured endpoint and report reachability.
pub fn run_health() -> Result<()> {
    let cfg = config::load();
    println!("{}", "imsdash Health Check".bold().cyan());
    println!("{}", "=".repeat(50));
    println!("  {} {}", "Backend:".bold(), cfg.server.base_url);

    for (name, path) in endpoint_table(&cfg) {
        let url = http::endpoint_url(&cfg.server.base_url, path);
        match http::probe(&url, cfg.server.timeout()) {
            Ok(probe) if (200..300).contains(&probe.status) => println!(
                "  {} {:<10} HTTP {} ({} ms)",
                "✓".green(),
                name,
                probe.status,
                probe.latency_ms
            ),
            Ok(probe) => println!(
                "  {} {:<10} HTTP {} ({} ms)",
                "!".yellow(),
                name,
                probe.status,
                probe.latency_ms
            ),
            Err(e) => println!("  {} {:<10} {}", "✗".red(), name, format!("{e:#}").dimmed()),
        }
    }

    println!();
    print_path_status("Global config", config::global_config_file());
    print_path_status("Project config", config::project_config_file());
    print_path_status(
        "Event log",
        EventLog::from_config(&cfg).path().map(|p| p.to_path_buf()),
    );
    Ok(())
}

/// Endpoints probed by `health`. The chat endpoint is `POST`-only, so its
/// liveness route stands in for it.
fn endpoint_table(cfg: &ImsConfig) -> [(&'static str, &str); 3] {
    [
        ("history", cfg.endpoints.history.as_str()),
        ("stats", cfg.endpoints.stats.as_str()),
        ("chat", cfg.endpoints.chat_test.as_str()),
    ]
}

fn print_path_status(label: &str, path: Option<std::path::PathBuf>) {
    match path {
        Some(p) if p.exists() => println!("  {} {:<15} {}", "✓".green(), label, p.display()),
        Some(p) => println!(
            "  {} {:<15} {}",
            "-".dimmed(),
            label,
            format!("{} (not present)", p.display()).dimmed()
        ),
        None => println!("  {} {:<15} disabled", "-".dimmed(), label),
    }
}

// ---------------------------------------------------------------------------
// imsdash events
// ---------------------------------------------------------------------------

/// Print the last `count` event log entries.
pub fn run_events(count: usize, format: OutputFormat) -> Result<()> {
    let cfg = config::load();
    let log = EventLog::from_config(&cfg);
    let entries = log.read_recent(count);

    if entries.is_empty() {
        println!("{}", "No events recorded yet.".yellow());
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Table => {
            for entry in &entries {
                println!("{}", format_event(entry));
            }
        }
    }
    Ok(())
}

fn format_event(entry: &EventEntry) -> String {
    let when = chrono::DateTime::parse_from_rfc3339(&entry.timestamp)
        .map(|t| {
            t.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
        .unwrap_or_else(|_| entry.timestamp.clone());
    let detail = entry.detail.as_deref().unwrap_or("");
    format!(
        "{}  {:<7} {:<18} {}",
        when.dimmed(),
        entry.kind.to_string(),
        entry.outcome,
        detail
    )
}

// ---------------------------------------------------------------------------
// imsdash config
// ---------------------------------------------------------------------------

pub fn run_config_show() -> Result<()> {
    println!("{}", config::show_effective_config()?);
    Ok(())
}

pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!("{} {}", "Wrote".green(), path.display());
    Ok(())
}

pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    let path = config::set_config_value(key, value)?;
    println!("{} {key} = {value} in {}", "Set".green(), path.display());
    Ok(())
}

pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!("{} {}", "Reset".green(), path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eventlog::EventKind;

    #[test]
    fn output_format_parses() {
        assert_eq!(OutputFormat::from_str_opt(Some("json")), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str_opt(Some("table")), OutputFormat::Table);
        assert_eq!(OutputFormat::from_str_opt(Some("csv")), OutputFormat::Table);
        assert_eq!(OutputFormat::from_str_opt(None), OutputFormat::Table);
    }

    #[test]
    fn endpoint_table_uses_liveness_route_for_chat() {
        let cfg = ImsConfig::default();
        let table = endpoint_table(&cfg);
        assert_eq!(table[0], ("history", "/api/dashboard/history"));
        assert_eq!(table[2], ("chat", "/api/chatbot/test"));
    }

    #[test]
    fn stats_lines_show_totals_and_types() {
        colored::control::set_override(false);
        let stats = CurrentStats {
            items_borrowed: 5.0,
            items_returned: 2.0,
            inventory_remaining: 40.0,
            items_issued: 3.0,
            items_by_type: [("Laptop".to_string(), 4), ("Projector".to_string(), 1)]
                .into_iter()
                .collect(),
            low_stock_count: Some(2),
            total_items: Some(45),
            total_loans: None,
        };
        let lines = stats_lines(&stats);

        assert!(lines.iter().any(|l| l.contains("Total items") && l.ends_with("45")));
        assert!(lines.iter().any(|l| l.contains("Low stock") && l.ends_with('2')));
        assert!(!lines.iter().any(|l| l.contains("Total loans")));
        assert!(lines.iter().any(|l| l.contains("Laptop") && l.ends_with('4')));
    }

    #[test]
    fn format_event_keeps_outcome_and_detail() {
        colored::control::set_override(false);
        let entry = EventEntry {
            timestamp: "not-a-time".to_string(),
            kind: EventKind::Poll,
            outcome: "fetch-failed".to_string(),
            detail: Some("HTTP 503".to_string()),
        };
        let line = format_event(&entry);
        assert!(line.starts_with("not-a-time"));
        assert!(line.contains("poll"));
        assert!(line.contains("fetch-failed"));
        assert!(line.contains("HTTP 503"));
    }
}
