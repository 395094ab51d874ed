use std::io::Write;
use std::time::Duration;

use breathroom_core::{Config, Database, Event, MeditationTimer, MonotonicClock, SessionKind};
use clap::Subcommand;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use super::{format_clock, progress_bar, record_session, runtime, CliResult, FinishedSession};

#[derive(Subcommand)]
pub enum MeditateAction {
    /// Count down a silent meditation until done or Ctrl-C
    Run {
        /// Session length (defaults to meditation.default_minutes)
        #[arg(short, long)]
        minutes: Option<u64>,
        /// Emit JSON events instead of the countdown display
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: MeditateAction) -> CliResult {
    match action {
        MeditateAction::Run { minutes, json } => {
            let config = Config::load_or_default();
            let minutes = minutes.unwrap_or(config.meditation.default_minutes);
            let duration_secs = session_secs(minutes)?;
            runtime()?.block_on(live(config, duration_secs, json))
        }
    }
}

fn session_secs(minutes: u64) -> Result<u64, Box<dyn std::error::Error>> {
    if minutes == 0 {
        return Err("meditation length must be at least one minute".into());
    }
    minutes
        .checked_mul(60)
        .ok_or_else(|| "meditation length too large".into())
}

async fn live(config: Config, duration_secs: u64, json: bool) -> CliResult {
    let mut timer = MeditationTimer::new(duration_secs, MonotonicClock::new());
    let frame_interval = Duration::from_millis(config.timer.frame_interval_ms.max(100));
    let mut frames = tokio::time::interval(frame_interval);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut events: Vec<Event> = timer.start().into_iter().collect();

    loop {
        for event in events.drain(..) {
            emit(&event, json)?;
            if let Event::MeditationCompleted { duration_secs, at } = event {
                let session = FinishedSession {
                    kind: SessionKind::Meditation,
                    pattern_id: "",
                    duration_ms: duration_secs.saturating_mul(1000),
                    cycles: 0,
                    completed_at: at,
                };
                record_session(&Database::open()?, &config, &session)?;
            }
        }
        if !timer.is_active() {
            break;
        }

        tokio::select! {
            _ = frames.tick() => {
                events.extend(timer.tick());
                if !json && timer.is_active() {
                    print!(
                        "\r\x1b[2K{} {}",
                        progress_bar(timer.progress(), config.display.bar_width),
                        format_clock(timer.remaining_ms()),
                    );
                    let _ = std::io::stdout().flush();
                }
            }
            _ = &mut ctrl_c => {
                debug!("interrupt received, stopping meditation");
                events.extend(timer.stop());
            }
        }
    }
    Ok(())
}

fn emit(event: &Event, json: bool) -> CliResult {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }
    match event {
        Event::MeditationStarted { duration_secs, .. } => {
            println!(
                "meditating for {}, Ctrl-C to stop",
                format_clock(duration_secs.saturating_mul(1000))
            );
        }
        Event::MeditationCompleted { .. } => println!("\r\x1b[2Kmeditation complete"),
        Event::MeditationStopped { .. } => println!("\r\x1b[2Kstopped"),
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_length_is_validated() {
        assert_eq!(session_secs(10).unwrap(), 600);
        assert!(session_secs(0).is_err());
        let err = session_secs(u64::MAX / 10).unwrap_err();
        assert!(err.to_string().contains("too large"));
    }
}
