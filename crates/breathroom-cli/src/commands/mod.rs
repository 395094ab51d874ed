pub mod breathe;
pub mod config;
pub mod meditate;
pub mod patterns;
pub mod stats;
pub mod timer;

use std::error::Error;

use breathroom_core::{BreathingPattern, Config, Database, SessionKind};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::info;

pub type CliResult = Result<(), Box<dyn Error>>;

pub fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Resolve `--pattern`/`--cycles` against the config, falling back to the
/// configured default pattern.
pub fn resolve_pattern(
    config: &Config,
    id: Option<&str>,
    cycles: Option<u32>,
) -> Result<BreathingPattern, Box<dyn Error>> {
    let mut pattern = match id {
        Some(id) => config.find_pattern(id)?,
        None => config.default_pattern(),
    };
    if let Some(cycles) = cycles {
        pattern = pattern.with_cycles(cycles);
    }
    pattern.validate()?;
    Ok(pattern)
}

/// `[#####.....]` for a 0..=100 percentage.
pub fn progress_bar(percent: f64, width: u32) -> String {
    let width = width.max(1) as usize;
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(width - filled))
}

/// `mm:ss`, rounding up so a countdown never shows 00:00 while running.
pub fn format_clock(ms: u64) -> String {
    let secs = ms.div_ceil(1000);
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// A session that ran to completion, as reported by its timer.
pub struct FinishedSession<'a> {
    pub kind: SessionKind,
    pub pattern_id: &'a str,
    pub duration_ms: u64,
    pub cycles: u32,
    /// When the timer reached its end, which may be well before it was
    /// observed.
    pub completed_at: DateTime<Utc>,
}

/// Log a finished session unless recording is disabled.
pub fn record_session(db: &Database, config: &Config, session: &FinishedSession) -> CliResult {
    if !config.record_sessions {
        return Ok(());
    }
    let duration = Duration::milliseconds(i64::try_from(session.duration_ms)?);
    let id = db.record_session(
        session.kind,
        session.pattern_id,
        session.duration_ms / 1000,
        session.cycles,
        session.completed_at - duration,
        session.completed_at,
    )?;
    info!(
        id,
        kind = session.kind.as_str(),
        pattern_id = session.pattern_id,
        "session recorded"
    );
    Ok(())
}

/// Current-thread runtime for the live commands.
pub fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_bar_fills_proportionally() {
        assert_eq!(progress_bar(0.0, 4), "[....]");
        assert_eq!(progress_bar(50.0, 4), "[##..]");
        assert_eq!(progress_bar(100.0, 4), "[####]");
        assert_eq!(progress_bar(250.0, 2), "[##]");
    }

    #[test]
    fn clock_rounds_up_partial_seconds() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(1), "00:01");
        assert_eq!(format_clock(600_000), "10:00");
        assert_eq!(format_clock(59_001), "01:00");
    }

    #[test]
    fn resolve_pattern_applies_cycle_override() {
        let config = Config::default();
        let pattern = resolve_pattern(&config, Some("belly"), Some(3)).unwrap();
        assert_eq!(pattern.id, "belly");
        assert_eq!(pattern.cycles, 3);
        assert_eq!(resolve_pattern(&config, None, None).unwrap().id, "box");
        assert!(resolve_pattern(&config, Some("nope"), None).is_err());
    }
}
