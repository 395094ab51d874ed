//! Single-phase meditation countdown.
//!
//! Same wall-clock approach as the breathing timer: remaining time is
//! derived from the clock on demand, so time spent while the host is in
//! the background is accounted for when it comes back.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::clock::{Clock, SystemClock};
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeditationState {
    Idle,
    Running,
    Paused,
}

#[derive(Debug, Clone)]
pub struct MeditationTimer<C: Clock = SystemClock> {
    duration_ms: u64,
    clock: C,
    state: MeditationState,
    /// Remaining time as of `last_sync_ms`.
    remaining_ms: u64,
    last_sync_ms: Option<u64>,
    /// Set while the host is backgrounded.
    backgrounded_at_ms: Option<u64>,
}

impl<C: Clock> MeditationTimer<C> {
    pub fn new(duration_secs: u64, clock: C) -> Self {
        let duration_ms = duration_secs.saturating_mul(1000);
        Self {
            duration_ms,
            clock,
            state: MeditationState::Idle,
            remaining_ms: duration_ms,
            last_sync_ms: None,
            backgrounded_at_ms: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> MeditationState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state != MeditationState::Idle
    }

    pub fn is_paused(&self) -> bool {
        self.state == MeditationState::Paused
    }

    pub fn is_backgrounded(&self) -> bool {
        self.backgrounded_at_ms.is_some()
    }

    pub fn duration_secs(&self) -> u64 {
        self.duration_ms / 1000
    }

    /// Remaining milliseconds as of now.
    pub fn remaining_ms(&self) -> u64 {
        match (self.state, self.last_sync_ms) {
            (MeditationState::Running, Some(last)) => self
                .remaining_ms
                .saturating_sub(self.clock.now_ms().saturating_sub(last)),
            _ => self.remaining_ms,
        }
    }

    pub fn remaining_secs(&self) -> f64 {
        self.remaining_ms() as f64 / 1000.0
    }

    /// 0.0 ..= 100.0 of the session elapsed.
    pub fn progress(&self) -> f64 {
        if self.duration_ms == 0 {
            return 0.0;
        }
        let elapsed = self.duration_ms - self.remaining_ms().min(self.duration_ms);
        (elapsed as f64 / self.duration_ms as f64 * 100.0).clamp(0.0, 100.0)
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        self.remaining_ms = self.duration_ms;
        self.state = MeditationState::Running;
        self.last_sync_ms = Some(self.clock.now_ms());
        self.backgrounded_at_ms = None;
        info!(duration_ms = self.duration_ms, "meditation started");
        Some(Event::MeditationStarted {
            duration_secs: self.duration_secs(),
            at: Utc::now(),
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        if self.state != MeditationState::Running {
            return None;
        }
        self.flush_elapsed();
        self.state = MeditationState::Paused;
        self.last_sync_ms = None;
        Some(Event::MeditationPaused {
            remaining_ms: self.remaining_ms,
            at: Utc::now(),
        })
    }

    pub fn resume(&mut self) -> Option<Event> {
        if self.state != MeditationState::Paused {
            return None;
        }
        self.state = MeditationState::Running;
        self.last_sync_ms = Some(self.clock.now_ms());
        Some(Event::MeditationResumed {
            remaining_ms: self.remaining_ms,
            at: Utc::now(),
        })
    }

    pub fn stop(&mut self) -> Option<Event> {
        if self.state == MeditationState::Idle {
            return None;
        }
        self.reset();
        info!("meditation stopped");
        Some(Event::MeditationStopped { at: Utc::now() })
    }

    /// Call periodically. Returns `Some(MeditationCompleted)` once, when the
    /// countdown reaches zero.
    pub fn tick(&mut self) -> Option<Event> {
        if self.state != MeditationState::Running {
            return None;
        }
        let overshoot_ms = self
            .last_sync_ms
            .map(|last| self.clock.now_ms().saturating_sub(last))
            .unwrap_or(0)
            .saturating_sub(self.remaining_ms);
        self.flush_elapsed();
        if self.remaining_ms > 0 {
            return None;
        }
        self.reset();
        info!(
            duration_ms = self.duration_ms,
            overshoot_ms,
            "meditation complete"
        );
        let now = Utc::now();
        let overshoot = Duration::milliseconds(i64::try_from(overshoot_ms).unwrap_or(i64::MAX));
        Some(Event::MeditationCompleted {
            duration_secs: self.duration_secs(),
            at: now.checked_sub_signed(overshoot).unwrap_or(now),
        })
    }

    /// The host is going to the background; ticks will stop arriving.
    ///
    /// Remaining time is always derived from the clock, so nothing is lost
    /// while away. The timestamp only feeds the away-time log on return.
    pub fn enter_background(&mut self) {
        if self.backgrounded_at_ms.is_none() {
            self.backgrounded_at_ms = Some(self.clock.now_ms());
        }
    }

    /// The host is back. Reconciles the time spent away and completes the
    /// session if it ran out meanwhile.
    pub fn enter_foreground(&mut self) -> Option<Event> {
        let away_since = self.backgrounded_at_ms.take()?;
        debug!(
            away_ms = self.clock.now_ms().saturating_sub(away_since),
            "meditation returned to foreground"
        );
        self.tick()
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn flush_elapsed(&mut self) {
        if let Some(last) = self.last_sync_ms {
            let now = self.clock.now_ms();
            self.remaining_ms = self.remaining_ms.saturating_sub(now.saturating_sub(last));
            self.last_sync_ms = Some(now);
        }
    }

    fn reset(&mut self) {
        self.state = MeditationState::Idle;
        self.remaining_ms = self.duration_ms;
        self.last_sync_ms = None;
        self.backgrounded_at_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::clock::ManualClock;

    #[test]
    fn start_pause_resume() {
        let clock = ManualClock::new();
        let mut timer = MeditationTimer::new(60, clock.clone());
        assert_eq!(timer.state(), MeditationState::Idle);

        assert!(timer.start().is_some());
        clock.advance_ms(10_000);
        assert!(timer.pause().is_some());
        assert_eq!(timer.remaining_ms(), 50_000);

        clock.advance_ms(30_000);
        assert_eq!(timer.remaining_ms(), 50_000);
        assert!(timer.resume().is_some());
        clock.advance_ms(5_000);
        assert_eq!(timer.remaining_ms(), 45_000);
        assert!((timer.progress() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn completes_once() {
        let clock = ManualClock::new();
        let mut timer = MeditationTimer::new(5, clock.clone());
        timer.start();
        clock.advance_ms(4_999);
        assert!(timer.tick().is_none());
        clock.advance_ms(1);
        assert!(matches!(
            timer.tick(),
            Some(Event::MeditationCompleted { duration_secs: 5, .. })
        ));
        assert!(!timer.is_active());
        assert!(timer.tick().is_none());
    }

    #[test]
    fn background_time_is_reconciled() {
        let clock = ManualClock::new();
        let mut timer = MeditationTimer::new(60, clock.clone());
        timer.start();
        clock.advance_ms(10_000);
        timer.enter_background();
        assert!(timer.is_backgrounded());
        clock.advance_ms(20_000);
        assert!(timer.enter_foreground().is_none());
        assert_eq!(timer.remaining_ms(), 30_000);
        assert!(!timer.is_backgrounded());
    }

    #[test]
    fn finishing_in_background_completes_on_foreground() {
        let clock = ManualClock::new();
        let mut timer = MeditationTimer::new(60, clock.clone());
        timer.start();
        timer.enter_background();
        clock.advance_ms(120_000);
        assert!(timer.enter_foreground().is_some_and(|e| e.is_completion()));
        assert_eq!(timer.state(), MeditationState::Idle);
    }

    #[test]
    fn completion_is_stamped_when_the_countdown_ran_out() {
        let clock = ManualClock::new();
        let mut timer = MeditationTimer::new(60, clock.clone());
        timer.start();
        timer.enter_background();
        clock.advance_ms(3_660_000);
        let Some(Event::MeditationCompleted { at, .. }) = timer.enter_foreground() else {
            panic!("expected completion");
        };
        let behind = Utc::now() - at;
        assert!(
            (behind - Duration::hours(1)).num_seconds().abs() < 5,
            "{behind:?}"
        );
    }

    #[test]
    fn paused_session_does_not_accrue_in_background() {
        let clock = ManualClock::new();
        let mut timer = MeditationTimer::new(60, clock.clone());
        timer.start();
        clock.advance_ms(10_000);
        timer.pause();
        timer.enter_background();
        clock.advance_ms(600_000);
        assert!(timer.enter_foreground().is_none());
        assert_eq!(timer.remaining_ms(), 50_000);
        assert!(timer.is_paused());
    }

    #[test]
    fn stop_when_idle_is_noop() {
        let mut timer = MeditationTimer::new(60, ManualClock::new());
        assert!(timer.stop().is_none());
        timer.start();
        assert!(timer.stop().is_some());
        assert!(timer.stop().is_none());
    }
}
