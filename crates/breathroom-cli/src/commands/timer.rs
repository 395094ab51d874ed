use breathroom_core::storage::Database;
use breathroom_core::timer::{SavedTimer, SystemClock};
use breathroom_core::{BreathingTimer, Config, Event, SessionKind};
use clap::Subcommand;
use tracing::warn;

use super::{print_json, record_session, resolve_pattern, CliResult, FinishedSession};

const TIMER_KEY: &str = "breathing_timer";

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start (or restart) the persisted timer
    Start {
        /// Pattern id (see `patterns list`)
        #[arg(short, long)]
        pattern: Option<String>,
        /// Override the pattern's cycle count
        #[arg(short, long)]
        cycles: Option<u32>,
    },
    /// Pause the running timer
    Pause,
    /// Resume a paused timer
    Resume,
    /// Stop and reset to idle
    Stop,
    /// Catch the timer up to now and print its state as JSON
    Status,
}

fn load_timer(db: &Database, config: &Config) -> BreathingTimer<SystemClock> {
    if let Ok(Some(json)) = db.kv_get(TIMER_KEY) {
        match serde_json::from_str::<SavedTimer>(&json) {
            Ok(saved) => return BreathingTimer::restore(saved, SystemClock),
            Err(e) => warn!("discarding unreadable saved timer: {e}"),
        }
    }
    BreathingTimer::new(config.default_pattern(), SystemClock)
}

fn save_timer(db: &Database, timer: &BreathingTimer<SystemClock>) -> CliResult {
    if timer.is_active() {
        let json = serde_json::to_string(&timer.save())?;
        db.kv_set(TIMER_KEY, &json)?;
    } else {
        db.kv_delete(TIMER_KEY)?;
    }
    Ok(())
}

pub fn run(action: TimerAction) -> CliResult {
    let config = Config::load_or_default();
    let db = Database::open()?;

    let events = match action {
        TimerAction::Start { pattern, cycles } => {
            let pattern = resolve_pattern(&config, pattern.as_deref(), cycles)?;
            let mut timer = BreathingTimer::new(pattern, SystemClock);
            let events = timer.start();
            finish(&db, &config, &timer, &events)?;
            events
        }
        TimerAction::Pause => apply(&db, &config, |t| t.pause())?,
        TimerAction::Resume => apply(&db, &config, |t| t.resume())?,
        TimerAction::Stop => apply(&db, &config, |t| t.stop())?,
        TimerAction::Status => {
            let mut timer = load_timer(&db, &config);
            let events = timer.tick();
            print_json(&timer.snapshot())?;
            finish(&db, &config, &timer, &events)?;
            events
        }
    };

    for event in &events {
        print_json(event)?;
    }
    Ok(())
}

/// Catch up, run `command`, persist. Transitions that came due while no
/// process was watching are reported before the command's own events.
fn apply<F>(
    db: &Database,
    config: &Config,
    command: F,
) -> Result<Vec<Event>, Box<dyn std::error::Error>>
where
    F: FnOnce(&mut BreathingTimer<SystemClock>) -> Vec<Event>,
{
    let mut timer = load_timer(db, config);
    let mut events = timer.tick();
    events.extend(command(&mut timer));
    finish(db, config, &timer, &events)?;
    Ok(events)
}

fn finish(
    db: &Database,
    config: &Config,
    timer: &BreathingTimer<SystemClock>,
    events: &[Event],
) -> CliResult {
    save_timer(db, timer)?;
    for event in events {
        if let Event::SessionCompleted {
            pattern_id,
            cycles,
            duration_ms,
            at,
        } = event
        {
            let session = FinishedSession {
                kind: SessionKind::Breathing,
                pattern_id,
                duration_ms: *duration_ms,
                cycles: *cycles,
                completed_at: *at,
            };
            record_session(db, config, &session)?;
        }
    }
    Ok(())
}
