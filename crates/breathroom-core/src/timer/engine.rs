//! Breathing phase timer.
//!
//! The timer is a clock-driven state machine. It does not own threads or
//! schedule callbacks; the caller invokes `tick()` (the async driver does
//! it on every frame and at every phase deadline). A late tick catches up
//! through every transition that was due, using the previous deadline as
//! the start of the next phase so no time is lost to tick jitter.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Inhale -> [Hold] -> Exhale -> [Pause] -> Inhale ... -> Idle
//! ```
//!
//! Pausing is a flag layered over the phase, not a phase of its own.
//!
//! ## Usage
//!
//! ```ignore
//! let mut timer = BreathingTimer::new(pattern, SystemClock);
//! timer.start();
//! // In a loop:
//! for event in timer.tick() { /* render */ }
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::clock::{Clock, SystemClock};
use super::pattern::{BreathingPattern, Phase};
use crate::events::Event;

/// Receives run-boundary notifications from a [`BreathingTimer`].
pub trait TimerObserver: Send {
    /// A full phase cycle finished.
    fn on_cycle_complete(&mut self) {}
    /// All cycles finished; the timer is idle again.
    fn on_complete(&mut self) {}
}

type Callback = Box<dyn FnMut() + Send>;

/// Closure-backed observer for hosts that only need one or two hooks.
#[derive(Default)]
pub struct Callbacks {
    cycle_complete: Option<Callback>,
    complete: Option<Callback>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_cycle_complete(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.cycle_complete = Some(Box::new(f));
        self
    }

    pub fn on_complete(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.complete = Some(Box::new(f));
        self
    }
}

impl TimerObserver for Callbacks {
    fn on_cycle_complete(&mut self) {
        if let Some(f) = self.cycle_complete.as_mut() {
            f();
        }
    }

    fn on_complete(&mut self) {
        if let Some(f) = self.complete.as_mut() {
            f();
        }
    }
}

/// Mutable run state exposed for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerState {
    pub is_active: bool,
    pub is_paused: bool,
    pub current_phase: Phase,
    /// 0.0 ..= 100.0 within the current phase.
    pub phase_progress: f64,
    /// Completed cycles.
    pub current_cycle: u32,
    /// Seconds.
    pub phase_time_remaining: f64,
}

impl Default for TimerState {
    fn default() -> Self {
        Self {
            is_active: false,
            is_paused: false,
            current_phase: Phase::Idle,
            phase_progress: 0.0,
            current_cycle: 0,
            phase_time_remaining: 0.0,
        }
    }
}

/// Point-in-time view of a timer, ready to serialize for a host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub pattern_id: String,
    pub is_active: bool,
    pub is_paused: bool,
    pub current_phase: Phase,
    pub phase_progress: f64,
    pub current_cycle: u32,
    pub total_cycles: u32,
    pub phase_time_remaining: f64,
    pub instruction: String,
    pub at: DateTime<Utc>,
}

impl TimerSnapshot {
    /// Snapshot of a timer that has not been started.
    pub fn idle(pattern: &BreathingPattern) -> Self {
        Self {
            pattern_id: pattern.id.clone(),
            is_active: false,
            is_paused: false,
            current_phase: Phase::Idle,
            phase_progress: 0.0,
            current_cycle: 0,
            total_cycles: pattern.cycles,
            phase_time_remaining: 0.0,
            instruction: Phase::Idle.instruction().to_string(),
            at: Utc::now(),
        }
    }
}

/// Serializable form of a timer, for carrying a run across processes.
///
/// Timestamps are in the owning clock's milliseconds, so only restore a
/// saved timer onto the same kind of clock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedTimer {
    pub pattern: BreathingPattern,
    pub state: TimerState,
    #[serde(default)]
    pub phase_started_ms: Option<u64>,
    #[serde(default)]
    pub run_started_ms: Option<u64>,
}

/// Cyclic breathing-phase timer.
pub struct BreathingTimer<C: Clock = SystemClock> {
    pattern: BreathingPattern,
    state: TimerState,
    clock: C,
    /// Clock reading at which the current phase began. Only meaningful
    /// while running; while paused the position lives in `phase_progress`.
    phase_started_ms: Option<u64>,
    run_started_ms: Option<u64>,
    /// Bumped on every start, stop and completion. Deadlines computed under
    /// an older generation are stale.
    generation: u64,
    observer: Option<Box<dyn TimerObserver>>,
}

impl<C: Clock> std::fmt::Debug for BreathingTimer<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BreathingTimer")
            .field("pattern", &self.pattern.id)
            .field("state", &self.state)
            .field("phase_started_ms", &self.phase_started_ms)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl<C: Clock> BreathingTimer<C> {
    /// Create an idle timer for `pattern`.
    pub fn new(pattern: BreathingPattern, clock: C) -> Self {
        Self {
            pattern,
            state: TimerState::default(),
            clock,
            phase_started_ms: None,
            run_started_ms: None,
            generation: 0,
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: impl TimerObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn set_observer(&mut self, observer: impl TimerObserver + 'static) {
        self.observer = Some(Box::new(observer));
    }

    /// Rebuild a timer from [`SavedTimer`]. The observer is not persisted.
    pub fn restore(saved: SavedTimer, clock: C) -> Self {
        let mut timer = Self::new(saved.pattern, clock);
        if saved.state.is_active && saved.state.current_phase != Phase::Idle {
            timer.state = saved.state;
            timer.state.phase_progress = timer.state.phase_progress.clamp(0.0, 100.0);
            timer.state.current_cycle = timer.state.current_cycle.min(timer.pattern.cycles);
            timer.phase_started_ms = saved.phase_started_ms;
            timer.run_started_ms = saved.run_started_ms;
            if !timer.state.is_paused && timer.phase_started_ms.is_none() {
                warn!("restored running timer without a phase start; resuming from saved progress");
                timer.state.is_paused = true;
                timer.resume();
            }
        }
        timer
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn save(&self) -> SavedTimer {
        SavedTimer {
            pattern: self.pattern.clone(),
            state: self.state.clone(),
            phase_started_ms: self.phase_started_ms,
            run_started_ms: self.run_started_ms,
        }
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn pattern(&self) -> &BreathingPattern {
        &self.pattern
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active
    }

    pub fn is_paused(&self) -> bool {
        self.state.is_paused
    }

    /// Active and not paused.
    pub fn is_running(&self) -> bool {
        self.state.is_active && !self.state.is_paused
    }

    pub fn current_phase(&self) -> Phase {
        self.state.current_phase
    }

    pub fn instruction(&self) -> &'static str {
        self.state.current_phase.instruction()
    }

    pub fn phase_duration_ms(&self) -> u64 {
        self.pattern.duration_ms(self.state.current_phase)
    }

    /// Clock reading at which the current phase ends, while running.
    pub fn next_transition_at_ms(&self) -> Option<u64> {
        if !self.is_running() {
            return None;
        }
        self.phase_started_ms
            .map(|start| start.saturating_add(self.phase_duration_ms()))
    }

    /// Milliseconds until the current phase ends, while running.
    pub fn time_until_transition_ms(&self) -> Option<u64> {
        self.next_transition_at_ms()
            .map(|deadline| deadline.saturating_sub(self.clock.now_ms()))
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            pattern_id: self.pattern.id.clone(),
            is_active: self.state.is_active,
            is_paused: self.state.is_paused,
            current_phase: self.state.current_phase,
            phase_progress: self.state.phase_progress,
            current_cycle: self.state.current_cycle,
            total_cycles: self.pattern.cycles,
            phase_time_remaining: self.state.phase_time_remaining,
            instruction: self.instruction().to_string(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a run from the first phase of cycle 0.
    ///
    /// Restarting an active timer resets it first; there is never more
    /// than one run per instance.
    pub fn start(&mut self) -> Vec<Event> {
        if self.state.is_active {
            info!(pattern = %self.pattern.id, "restarting active breathing timer");
        }
        self.reset();
        let now = self.clock.now_ms();

        let Some(first) = self.pattern.first_phase() else {
            warn!(
                pattern = %self.pattern.id,
                "pattern has no timed phases; completing immediately"
            );
            return self.complete_without_phases(now);
        };
        if self.pattern.cycles == 0 {
            warn!(pattern = %self.pattern.id, "pattern has zero cycles; completing immediately");
            return self.finish(now, Vec::new());
        }

        let duration_ms = self.pattern.duration_ms(first);
        self.state = TimerState {
            is_active: true,
            is_paused: false,
            current_phase: first,
            phase_progress: 0.0,
            current_cycle: 0,
            phase_time_remaining: duration_ms as f64 / 1000.0,
        };
        self.phase_started_ms = Some(now);
        self.run_started_ms = Some(now);
        info!(pattern = %self.pattern.id, cycles = self.pattern.cycles, "breathing timer started");

        vec![Event::TimerStarted {
            pattern_id: self.pattern.id.clone(),
            phase: first,
            total_cycles: self.pattern.cycles,
            at: Utc::now(),
        }]
    }

    /// Suspend the run, keeping phase and cycle position.
    ///
    /// Transitions that were already due are applied first, which may end
    /// the run instead of pausing it.
    pub fn pause(&mut self) -> Vec<Event> {
        if !self.is_running() {
            return Vec::new();
        }
        let mut events = self.tick();
        if !self.is_running() {
            return events;
        }
        self.state.is_paused = true;
        self.phase_started_ms = None;
        debug!(
            phase = %self.state.current_phase,
            progress = self.state.phase_progress,
            "breathing timer paused"
        );
        events.push(Event::TimerPaused {
            phase: self.state.current_phase,
            phase_progress: self.state.phase_progress,
            at: Utc::now(),
        });
        events
    }

    /// Continue a paused run where it left off.
    pub fn resume(&mut self) -> Vec<Event> {
        if !self.state.is_active || !self.state.is_paused {
            return Vec::new();
        }
        let now = self.clock.now_ms();
        let duration_ms = self.phase_duration_ms();
        let elapsed_ms = (self.state.phase_progress / 100.0 * duration_ms as f64).round() as u64;
        self.phase_started_ms = Some(now.saturating_sub(elapsed_ms));
        self.state.is_paused = false;
        let remaining_ms = duration_ms.saturating_sub(elapsed_ms);
        debug!(phase = %self.state.current_phase, remaining_ms, "breathing timer resumed");
        vec![Event::TimerResumed {
            phase: self.state.current_phase,
            remaining_ms,
            at: Utc::now(),
        }]
    }

    /// Cancel the run and return to idle. Safe to call at any time; no
    /// observer hook fires.
    pub fn stop(&mut self) -> Vec<Event> {
        let was_active = self.state.is_active;
        self.reset();
        if !was_active {
            return Vec::new();
        }
        info!(pattern = %self.pattern.id, "breathing timer stopped");
        vec![Event::TimerStopped { at: Utc::now() }]
    }

    /// Apply every transition due by now and refresh progress.
    ///
    /// Call periodically. Returns the events produced, oldest first.
    pub fn tick(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        if !self.is_running() {
            return events;
        }
        let now = self.clock.now_ms();
        let Some(mut started) = self.phase_started_ms else {
            return events;
        };

        loop {
            let phase = self.state.current_phase;
            let deadline = started.saturating_add(self.pattern.duration_ms(phase));
            if now < deadline {
                break;
            }
            let Some((next, wrapped)) = self.pattern.next_phase(phase) else {
                warn!(pattern = %self.pattern.id, "no phase to advance to; stopping");
                self.reset();
                return events;
            };

            if wrapped {
                self.state.current_cycle += 1;
                debug!(cycle = self.state.current_cycle, "breathing cycle complete");
                events.push(Event::CycleCompleted {
                    cycle: self.state.current_cycle,
                    total_cycles: self.pattern.cycles,
                    at: self.wall_time(deadline),
                });
                if let Some(observer) = self.observer.as_mut() {
                    observer.on_cycle_complete();
                }
                if self.state.current_cycle >= self.pattern.cycles {
                    return self.finish(deadline, events);
                }
            }

            debug!(from = %phase, to = %next, "phase transition");
            events.push(Event::PhaseChanged {
                from: phase,
                to: next,
                cycle: self.state.current_cycle,
                duration_ms: self.pattern.duration_ms(next),
                at: self.wall_time(deadline),
            });
            self.state.current_phase = next;
            started = deadline;
        }

        self.phase_started_ms = Some(started);
        self.refresh_progress(now, started);
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Wall-clock time of clock reading `at_ms`. After a catch-up the
    /// reading lies in the past, and events are stamped when they were due.
    fn wall_time(&self, at_ms: u64) -> DateTime<Utc> {
        let behind_ms = self.clock.now_ms().saturating_sub(at_ms);
        let behind = i64::try_from(behind_ms).unwrap_or(i64::MAX);
        let now = Utc::now();
        now.checked_sub_signed(Duration::milliseconds(behind)).unwrap_or(now)
    }

    fn refresh_progress(&mut self, now: u64, started: u64) {
        let duration_ms = self.phase_duration_ms();
        let elapsed_ms = now.saturating_sub(started).min(duration_ms);
        self.state.phase_progress = if duration_ms == 0 {
            0.0
        } else {
            (elapsed_ms as f64 / duration_ms as f64 * 100.0).clamp(0.0, 100.0)
        };
        self.state.phase_time_remaining = (duration_ms - elapsed_ms) as f64 / 1000.0;
    }

    fn reset(&mut self) {
        self.state = TimerState::default();
        self.phase_started_ms = None;
        self.run_started_ms = None;
        self.generation = self.generation.wrapping_add(1);
    }

    /// End the run at clock reading `end`, firing the completion hook once.
    fn finish(&mut self, end: u64, mut events: Vec<Event>) -> Vec<Event> {
        let started = self.run_started_ms.unwrap_or(end);
        let cycles = self.state.current_cycle;
        let at = self.wall_time(end);
        self.reset();
        info!(pattern = %self.pattern.id, cycles, "breathing session complete");
        events.push(Event::SessionCompleted {
            pattern_id: self.pattern.id.clone(),
            cycles,
            duration_ms: end.saturating_sub(started),
            at,
        });
        if let Some(observer) = self.observer.as_mut() {
            observer.on_complete();
        }
        events
    }

    /// A pattern with no timed phase runs every cycle in zero time.
    fn complete_without_phases(&mut self, now: u64) -> Vec<Event> {
        let mut events = Vec::new();
        for cycle in 1..=self.pattern.cycles {
            events.push(Event::CycleCompleted {
                cycle,
                total_cycles: self.pattern.cycles,
                at: Utc::now(),
            });
            if let Some(observer) = self.observer.as_mut() {
                observer.on_cycle_complete();
            }
        }
        self.state.current_cycle = self.pattern.cycles;
        self.run_started_ms = Some(now);
        self.finish(now, events)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::timer::clock::ManualClock;
    use crate::timer::pattern::find_pattern;

    fn box_timer() -> (BreathingTimer<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let timer = BreathingTimer::new(find_pattern("box", &[]).unwrap(), clock.clone());
        (timer, clock)
    }

    fn counters() -> (Callbacks, Arc<AtomicU32>, Arc<AtomicU32>) {
        let cycles = Arc::new(AtomicU32::new(0));
        let done = Arc::new(AtomicU32::new(0));
        let (c, d) = (cycles.clone(), done.clone());
        let callbacks = Callbacks::new()
            .on_cycle_complete(move || {
                c.fetch_add(1, Ordering::SeqCst);
            })
            .on_complete(move || {
                d.fetch_add(1, Ordering::SeqCst);
            });
        (callbacks, cycles, done)
    }

    #[test]
    fn starts_idle() {
        let (timer, _) = box_timer();
        assert!(!timer.is_active());
        assert_eq!(timer.current_phase(), Phase::Idle);
        assert_eq!(timer.instruction(), "Ready to begin");
        assert!(timer.next_transition_at_ms().is_none());
    }

    #[test]
    fn start_enters_inhale() {
        let (mut timer, _) = box_timer();
        let events = timer.start();
        assert!(matches!(
            events.as_slice(),
            [Event::TimerStarted {
                phase: Phase::Inhale,
                total_cycles: 8,
                ..
            }]
        ));
        let s = timer.state();
        assert!(s.is_active && !s.is_paused);
        assert_eq!(s.current_phase, Phase::Inhale);
        assert_eq!(s.current_cycle, 0);
        assert_eq!(s.phase_progress, 0.0);
        assert_eq!(s.phase_time_remaining, 4.0);
        assert_eq!(timer.next_transition_at_ms(), Some(4000));
    }

    #[test]
    fn tick_updates_progress_without_changing_phase() {
        let (mut timer, clock) = box_timer();
        timer.start();
        clock.advance_ms(1000);
        assert!(timer.tick().is_empty());
        assert_eq!(timer.current_phase(), Phase::Inhale);
        assert!((timer.state().phase_progress - 25.0).abs() < 1e-9);
        assert!((timer.state().phase_time_remaining - 3.0).abs() < 1e-9);
    }

    #[test]
    fn tick_walks_phases_in_order() {
        let (mut timer, clock) = box_timer();
        timer.start();
        let mut seen = vec![timer.current_phase()];
        for _ in 0..4 {
            clock.advance_ms(4000);
            timer.tick();
            seen.push(timer.current_phase());
        }
        assert_eq!(
            seen,
            vec![
                Phase::Inhale,
                Phase::Hold,
                Phase::Exhale,
                Phase::Pause,
                Phase::Inhale
            ]
        );
        assert_eq!(timer.state().current_cycle, 1);
    }

    #[test]
    fn restart_resets_position() {
        let (mut timer, clock) = box_timer();
        timer.start();
        clock.advance_ms(9000);
        timer.tick();
        assert_eq!(timer.current_phase(), Phase::Exhale);
        let generation = timer.generation();
        timer.start();
        assert_eq!(timer.current_phase(), Phase::Inhale);
        assert_eq!(timer.state().current_cycle, 0);
        assert_eq!(timer.next_transition_at_ms(), Some(13_000));
        assert!(timer.generation() > generation);
    }

    #[test]
    fn pause_and_resume_are_noops_when_idle() {
        let (mut timer, _) = box_timer();
        assert!(timer.pause().is_empty());
        assert!(timer.resume().is_empty());
        assert_eq!(timer.state(), &TimerState::default());
    }

    #[test]
    fn resume_requires_pause() {
        let (mut timer, _) = box_timer();
        timer.start();
        assert!(timer.resume().is_empty());
        assert!(timer.is_running());
    }

    #[test]
    fn paused_timer_does_not_advance() {
        let (mut timer, clock) = box_timer();
        timer.start();
        clock.advance_ms(1000);
        timer.pause();
        clock.advance_ms(60_000);
        assert!(timer.tick().is_empty());
        assert_eq!(timer.current_phase(), Phase::Inhale);
        assert!((timer.state().phase_progress - 25.0).abs() < 1e-9);
        assert!(timer.time_until_transition_ms().is_none());
    }

    #[test]
    fn pause_applies_due_transitions_first() {
        let (mut timer, clock) = box_timer();
        timer.start();
        clock.advance_ms(5000);
        let events = timer.pause();
        assert!(matches!(events.first(), Some(Event::PhaseChanged { to: Phase::Hold, .. })));
        assert!(matches!(events.last(), Some(Event::TimerPaused { phase: Phase::Hold, .. })));
        assert!(timer.is_paused());
        assert!((timer.state().phase_progress - 25.0).abs() < 1e-9);
    }

    #[test]
    fn stop_is_idempotent_and_silent() {
        let (callbacks, cycles, done) = counters();
        let (timer, clock) = box_timer();
        let mut timer = timer.with_observer(callbacks);
        timer.start();
        clock.advance_ms(20_000);
        timer.tick();
        assert_eq!(cycles.load(Ordering::SeqCst), 1);

        assert_eq!(timer.stop().len(), 1);
        let once = timer.state().clone();
        assert!(timer.stop().is_empty());
        assert_eq!(timer.state(), &once);
        assert_eq!(once, TimerState::default());
        assert_eq!(cycles.load(Ordering::SeqCst), 1);
        assert_eq!(done.load(Ordering::SeqCst), 0);

        clock.advance_ms(60_000);
        assert!(timer.tick().is_empty());
    }

    #[test]
    fn late_catch_up_stamps_events_when_they_were_due() {
        let clock = ManualClock::new();
        let mut timer = BreathingTimer::new(find_pattern("belly", &[]).unwrap(), clock.clone());
        timer.start();
        clock.advance_ms(86_400_000);
        let events = timer.tick();

        let Some(Event::SessionCompleted { at, duration_ms, .. }) = events.last() else {
            panic!("expected completion, got {events:?}");
        };
        assert_eq!(*duration_ms, 100_000);
        let behind = Utc::now() - *at;
        let expected = Duration::milliseconds(86_400_000 - 100_000);
        assert!((behind - expected).num_seconds().abs() < 5, "{behind:?}");

        let Some(Event::PhaseChanged { at: first_change, .. }) = events.first() else {
            panic!("expected a phase change first");
        };
        assert!(*first_change < *at);
    }

    #[test]
    fn completion_fires_once_and_returns_to_idle() {
        let (callbacks, cycles, done) = counters();
        let clock = ManualClock::new();
        let pattern = BreathingPattern::new("short", 1.0, 1.0, 2);
        let mut timer = BreathingTimer::new(pattern, clock.clone()).with_observer(callbacks);
        timer.start();
        clock.advance_ms(4000);
        let events = timer.tick();
        assert!(matches!(
            events.last(),
            Some(Event::SessionCompleted {
                cycles: 2,
                duration_ms: 4000,
                ..
            })
        ));
        assert_eq!(cycles.load(Ordering::SeqCst), 2);
        assert_eq!(done.load(Ordering::SeqCst), 1);
        assert_eq!(timer.current_phase(), Phase::Idle);
        assert!(!timer.is_active());

        clock.advance_ms(10_000);
        assert!(timer.tick().is_empty());
        assert_eq!(done.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn zero_duration_pattern_completes_on_start() {
        let (callbacks, cycles, done) = counters();
        let pattern = BreathingPattern::new("empty", 0.0, 0.0, 3);
        let mut timer = BreathingTimer::new(pattern, ManualClock::new()).with_observer(callbacks);
        let events = timer.start();
        assert!(events.last().is_some_and(Event::is_completion));
        assert_eq!(cycles.load(Ordering::SeqCst), 3);
        assert_eq!(done.load(Ordering::SeqCst), 1);
        assert!(!timer.is_active());
    }

    #[test]
    fn zero_inhale_starts_at_exhale() {
        let pattern = BreathingPattern::new("odd", 0.0, 2.0, 1);
        let mut timer = BreathingTimer::new(pattern, ManualClock::new());
        timer.start();
        assert_eq!(timer.current_phase(), Phase::Exhale);
    }

    #[test]
    fn save_and_restore_keeps_position() {
        let (mut timer, clock) = box_timer();
        timer.start();
        clock.advance_ms(6000);
        timer.tick();
        let json = serde_json::to_string(&timer.save()).unwrap();

        let saved: SavedTimer = serde_json::from_str(&json).unwrap();
        let mut restored = BreathingTimer::restore(saved, clock.clone());
        assert_eq!(restored.current_phase(), Phase::Hold);
        clock.advance_ms(2000);
        restored.tick();
        assert_eq!(restored.current_phase(), Phase::Exhale);
    }

    #[test]
    fn snapshot_reports_totals_and_instruction() {
        let (mut timer, _) = box_timer();
        timer.start();
        let snap = timer.snapshot();
        assert_eq!(snap.pattern_id, "box");
        assert_eq!(snap.total_cycles, 8);
        assert_eq!(snap.instruction, "Breathe in");
    }
}
