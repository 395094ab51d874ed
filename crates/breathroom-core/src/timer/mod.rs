mod clock;
mod engine;
mod meditation;
mod pattern;

pub use clock::{secs_to_ms, Clock, ManualClock, MonotonicClock, SystemClock};
pub use engine::{BreathingTimer, Callbacks, SavedTimer, TimerObserver, TimerSnapshot, TimerState};
pub use meditation::{MeditationState, MeditationTimer};
pub use pattern::{builtin_patterns, find_pattern, BreathingPattern, Phase};
