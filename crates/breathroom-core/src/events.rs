use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::Phase;

/// Every state change in a timer produces an Event.
/// Hosts print them, the driver forwards them, observers mirror them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        pattern_id: String,
        phase: Phase,
        total_cycles: u32,
        at: DateTime<Utc>,
    },
    PhaseChanged {
        from: Phase,
        to: Phase,
        /// Completed cycles at the moment of the change.
        cycle: u32,
        duration_ms: u64,
        at: DateTime<Utc>,
    },
    CycleCompleted {
        cycle: u32,
        total_cycles: u32,
        at: DateTime<Utc>,
    },
    SessionCompleted {
        pattern_id: String,
        cycles: u32,
        duration_ms: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        phase: Phase,
        phase_progress: f64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        phase: Phase,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    TimerStopped {
        at: DateTime<Utc>,
    },
    MeditationStarted {
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    MeditationPaused {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    MeditationResumed {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    MeditationCompleted {
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    MeditationStopped {
        at: DateTime<Utc>,
    },
}

impl Event {
    /// True for the events that end a run naturally.
    pub fn is_completion(&self) -> bool {
        matches!(
            self,
            Event::SessionCompleted { .. } | Event::MeditationCompleted { .. }
        )
    }
}
