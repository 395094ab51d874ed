//! # Breathroom Core Library
//!
//! This library provides the core logic for Breathroom, a guided breathing
//! and meditation timer. All behaviour is available through the standalone
//! CLI binary; any graphical host would be a thin layer over the same
//! library.
//!
//! ## Architecture
//!
//! - **Breathing Timer**: a clock-driven phase state machine
//!   (inhale, hold, exhale, pause) that requires the caller to invoke
//!   `tick()` for progress updates
//! - **Meditation Timer**: a single-phase countdown with background
//!   reconciliation
//! - **Session Driver**: a tokio task that ticks a timer at a fixed frame
//!   rate and at every phase deadline, publishing snapshots and events
//! - **Storage**: SQLite session log and TOML configuration
//! - **Stats**: totals, streaks and weekly buckets over recorded sessions
//!
//! ## Key Components
//!
//! - [`BreathingTimer`]: core breathing state machine
//! - [`SessionDriver`]: async host for a timer
//! - [`Database`]: session persistence
//! - [`Config`]: application configuration management

pub mod driver;
pub mod error;
pub mod events;
pub mod stats;
pub mod storage;
pub mod timer;

pub use driver::{DriverCommand, SessionDriver, DEFAULT_FRAME_INTERVAL};
pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use stats::{Stats, WeeklySummary};
pub use storage::{Config, Database, SessionKind, SessionRecord};
pub use timer::{
    BreathingPattern, BreathingTimer, Callbacks, Clock, ManualClock, MeditationTimer,
    MonotonicClock, Phase, SystemClock, TimerObserver, TimerSnapshot, TimerState,
};
