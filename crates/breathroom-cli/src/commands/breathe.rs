use std::io::Write;
use std::time::Duration;

use breathroom_core::{
    BreathingPattern, BreathingTimer, Config, Database, Event, MonotonicClock, SessionDriver,
    SessionKind, TimerSnapshot,
};
use clap::Subcommand;
use tracing::debug;

use super::{
    format_clock, progress_bar, record_session, resolve_pattern, runtime, CliResult,
    FinishedSession,
};

#[derive(Subcommand)]
pub enum BreatheAction {
    /// Run a guided session until it completes or Ctrl-C
    Run {
        /// Pattern id (see `patterns list`)
        #[arg(short, long)]
        pattern: Option<String>,
        /// Override the pattern's cycle count
        #[arg(short, long)]
        cycles: Option<u32>,
        /// Emit one JSON event per line instead of the progress display
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: BreatheAction) -> CliResult {
    match action {
        BreatheAction::Run {
            pattern,
            cycles,
            json,
        } => {
            let config = Config::load_or_default();
            let pattern = resolve_pattern(&config, pattern.as_deref(), cycles)?;
            runtime()?.block_on(live(config, pattern, json))
        }
    }
}

async fn live(config: Config, pattern: BreathingPattern, json: bool) -> CliResult {
    let frame_interval = Duration::from_millis(config.timer.frame_interval_ms);
    let timer = BreathingTimer::new(pattern.clone(), MonotonicClock::new());
    let mut driver = SessionDriver::spawn(timer, frame_interval);
    let mut frames = driver.subscribe();
    let draw = !json && config.display.show_progress_bar;

    driver.start();
    if !json {
        println!("{} ({}), Ctrl-C to stop", pattern.label, pattern.summary());
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;
    let mut watching = draw;
    let mut completed = None;

    loop {
        tokio::select! {
            event = driver.next_event() => {
                let Some(event) = event else { break };
                if json {
                    println!("{}", serde_json::to_string(&event)?);
                } else {
                    print_event(&event);
                }
                if let Event::SessionCompleted { cycles, duration_ms, at, .. } = event {
                    completed = Some((cycles, duration_ms, at));
                }
            }
            changed = frames.changed(), if watching => {
                if changed.is_err() {
                    watching = false;
                    continue;
                }
                let snapshot = frames.borrow_and_update().clone();
                draw_frame(&snapshot, config.display.bar_width);
            }
            _ = &mut ctrl_c, if !interrupted => {
                debug!("interrupt received, stopping session");
                interrupted = true;
                driver.stop();
            }
        }
    }

    driver.join().await?;
    if draw {
        println!();
    }

    if let Some((cycles, duration_ms, completed_at)) = completed {
        let session = FinishedSession {
            kind: SessionKind::Breathing,
            pattern_id: &pattern.id,
            duration_ms,
            cycles,
            completed_at,
        };
        record_session(&Database::open()?, &config, &session)?;
    }
    Ok(())
}

fn print_event(event: &Event) {
    let line = match event {
        Event::PhaseChanged { to, .. } => to.instruction().to_string(),
        Event::CycleCompleted {
            cycle,
            total_cycles,
            ..
        } => format!("cycle {cycle}/{total_cycles} complete"),
        Event::SessionCompleted {
            cycles,
            duration_ms,
            ..
        } => format!(
            "session complete: {cycles} cycles in {}",
            format_clock(*duration_ms)
        ),
        Event::TimerStopped { .. } => "stopped".to_string(),
        _ => return,
    };
    print!("\r\x1b[2K{line}\n");
}

fn draw_frame(snapshot: &TimerSnapshot, bar_width: u32) {
    if !snapshot.is_active {
        return;
    }
    print!(
        "\r\x1b[2K{:<12} {} {:>4.1}s  cycle {}/{}",
        snapshot.instruction,
        progress_bar(snapshot.phase_progress, bar_width),
        snapshot.phase_time_remaining,
        (snapshot.current_cycle + 1).min(snapshot.total_cycles),
        snapshot.total_cycles,
    );
    let _ = std::io::stdout().flush();
}
