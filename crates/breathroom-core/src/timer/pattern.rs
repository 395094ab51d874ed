//! Breathing patterns and the phase sequence they drive.
//!
//! A pattern is four phase durations in seconds plus a cycle count. Hold
//! and pause are optional; any phase whose duration is missing or zero is
//! skipped, never reordered.

use serde::{Deserialize, Serialize};

use super::clock::secs_to_ms;
use crate::error::ValidationError;

/// One named segment of a breathing cycle, or `Idle` when no run is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Inhale,
    Hold,
    Exhale,
    Pause,
}

impl Phase {
    /// Fixed order of the breathing phases within a cycle.
    pub const SEQUENCE: [Phase; 4] = [Phase::Inhale, Phase::Hold, Phase::Exhale, Phase::Pause];

    /// Text shown to the user while this phase runs.
    pub fn instruction(&self) -> &'static str {
        match self {
            Phase::Idle => "Ready to begin",
            Phase::Inhale => "Breathe in",
            Phase::Hold => "Hold",
            Phase::Exhale => "Breathe out",
            Phase::Pause => "Pause",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Inhale => "inhale",
            Phase::Hold => "hold",
            Phase::Exhale => "exhale",
            Phase::Pause => "pause",
        }
    }

    fn sequence_index(&self) -> Option<usize> {
        Phase::SEQUENCE.iter().position(|p| p == self)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied durations-and-cycle-count for one breathing exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreathingPattern {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub description: String,
    /// Seconds.
    pub inhale: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hold: Option<f64>,
    /// Seconds.
    pub exhale: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pause: Option<f64>,
    pub cycles: u32,
}

impl BreathingPattern {
    pub fn new(id: impl Into<String>, inhale: f64, exhale: f64, cycles: u32) -> Self {
        Self {
            id: id.into(),
            label: String::new(),
            description: String::new(),
            inhale,
            hold: None,
            exhale,
            pause: None,
            cycles,
        }
    }

    pub fn with_hold(mut self, secs: f64) -> Self {
        self.hold = Some(secs);
        self
    }

    pub fn with_pause(mut self, secs: f64) -> Self {
        self.pause = Some(secs);
        self
    }

    pub fn with_cycles(mut self, cycles: u32) -> Self {
        self.cycles = cycles;
        self
    }

    fn labelled(mut self, label: &str, description: &str) -> Self {
        self.label = label.into();
        self.description = description.into();
        self
    }

    /// Configured duration of `phase` in seconds. Absent phases and `Idle` are 0.
    pub fn duration_secs(&self, phase: Phase) -> f64 {
        match phase {
            Phase::Idle => 0.0,
            Phase::Inhale => self.inhale,
            Phase::Hold => self.hold.unwrap_or(0.0),
            Phase::Exhale => self.exhale,
            Phase::Pause => self.pause.unwrap_or(0.0),
        }
    }

    /// Duration of `phase` in whole milliseconds.
    pub fn duration_ms(&self, phase: Phase) -> u64 {
        secs_to_ms(self.duration_secs(phase))
    }

    /// A phase is present when its duration rounds to at least one millisecond.
    pub fn is_present(&self, phase: Phase) -> bool {
        phase != Phase::Idle && self.duration_ms(phase) > 0
    }

    /// Phases that will actually be entered, in cycle order.
    pub fn present_phases(&self) -> Vec<Phase> {
        Phase::SEQUENCE
            .iter()
            .copied()
            .filter(|p| self.is_present(*p))
            .collect()
    }

    pub fn first_phase(&self) -> Option<Phase> {
        Phase::SEQUENCE.iter().copied().find(|p| self.is_present(*p))
    }

    pub fn last_phase(&self) -> Option<Phase> {
        Phase::SEQUENCE.iter().rev().copied().find(|p| self.is_present(*p))
    }

    /// Next present phase after `phase`, and whether the step wrapped into
    /// a new cycle. `None` when the pattern has no present phase.
    pub fn next_phase(&self, phase: Phase) -> Option<(Phase, bool)> {
        let start = phase.sequence_index().map(|i| i + 1).unwrap_or(0);
        Phase::SEQUENCE[start.min(Phase::SEQUENCE.len())..]
            .iter()
            .copied()
            .find(|p| self.is_present(*p))
            .map(|p| (p, false))
            .or_else(|| self.first_phase().map(|p| (p, true)))
    }

    /// Length of one cycle in milliseconds.
    pub fn cycle_ms(&self) -> u64 {
        Phase::SEQUENCE.iter().map(|p| self.duration_ms(*p)).sum()
    }

    /// Length of the whole run in milliseconds.
    pub fn total_ms(&self) -> u64 {
        self.cycle_ms().saturating_mul(self.cycles as u64)
    }

    pub fn breaths_per_minute(&self) -> f64 {
        let cycle = self.cycle_ms();
        if cycle == 0 {
            return 0.0;
        }
        60_000.0 / cycle as f64
    }

    /// Reject patterns the timer cannot run meaningfully.
    ///
    /// The timer itself tolerates invalid patterns; hosts call this before
    /// construction.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let phases: [(&'static str, f64); 4] = [
            ("inhale", self.inhale),
            ("hold", self.hold.unwrap_or(0.0)),
            ("exhale", self.exhale),
            ("pause", self.pause.unwrap_or(0.0)),
        ];
        for (phase, value) in phases {
            if !value.is_finite() || value < 0.0 {
                return Err(ValidationError::InvalidDuration { phase, value });
            }
        }
        for (phase, value) in [("inhale", self.inhale), ("exhale", self.exhale)] {
            if secs_to_ms(value) == 0 {
                return Err(ValidationError::NonPositivePhase { phase, value });
            }
        }
        if self.cycles == 0 {
            return Err(ValidationError::NoCycles);
        }
        Ok(())
    }

    /// Compact "4/4/4/4 x8" style summary.
    pub fn summary(&self) -> String {
        let fmt = |v: f64| {
            if v.fract() == 0.0 {
                format!("{}", v as u64)
            } else {
                format!("{v}")
            }
        };
        let parts: Vec<String> = Phase::SEQUENCE
            .iter()
            .map(|p| {
                if self.is_present(*p) {
                    fmt(self.duration_secs(*p))
                } else {
                    "-".to_string()
                }
            })
            .collect();
        format!("{} x{}", parts.join("/"), self.cycles)
    }
}

/// Patterns shipped with the app, in display order.
pub fn builtin_patterns() -> Vec<BreathingPattern> {
    vec![
        BreathingPattern::new("box", 4.0, 4.0, 8)
            .with_hold(4.0)
            .with_pause(4.0)
            .labelled("Box Breathing", "Equal four-count sides to steady focus."),
        BreathingPattern::new("belly", 5.0, 5.0, 10)
            .labelled("Belly Breathing", "Slow diaphragmatic breaths, no holds."),
        BreathingPattern::new("4-7-8", 4.0, 8.0, 4)
            .with_hold(7.0)
            .labelled("4-7-8", "Long hold and longer exhale for sleep and anxiety."),
        BreathingPattern::new("coherence", 6.0, 6.0, 10)
            .labelled("Coherence", "Five to six breaths a minute for heart rate variability."),
        BreathingPattern::new("deep-relax", 4.0, 8.0, 6)
            .labelled("Deep Relax", "Exhale twice as long as the inhale."),
        BreathingPattern::new("triangle", 4.0, 4.0, 8)
            .with_hold(4.0)
            .labelled("Triangle", "Inhale, hold, exhale in equal parts."),
    ]
}

/// Look a pattern up by id, preferring `custom` over the built-ins.
pub fn find_pattern(
    id: &str,
    custom: &[BreathingPattern],
) -> Result<BreathingPattern, ValidationError> {
    custom
        .iter()
        .find(|p| p.id == id)
        .cloned()
        .or_else(|| builtin_patterns().into_iter().find(|p| p.id == id))
        .ok_or_else(|| ValidationError::UnknownPattern(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_pattern_visits_every_phase() {
        let p = find_pattern("box", &[]).unwrap();
        assert_eq!(
            p.present_phases(),
            vec![Phase::Inhale, Phase::Hold, Phase::Exhale, Phase::Pause]
        );
        assert_eq!(p.cycle_ms(), 16_000);
        assert_eq!(p.summary(), "4/4/4/4 x8");
    }

    #[test]
    fn absent_phases_are_skipped_not_reordered() {
        let p = BreathingPattern::new("t", 5.0, 5.0, 1);
        assert_eq!(p.next_phase(Phase::Inhale), Some((Phase::Exhale, false)));
        assert_eq!(p.next_phase(Phase::Exhale), Some((Phase::Inhale, true)));

        let p = p.with_hold(0.0).with_pause(2.0);
        assert_eq!(p.next_phase(Phase::Inhale), Some((Phase::Exhale, false)));
        assert_eq!(p.next_phase(Phase::Exhale), Some((Phase::Pause, false)));
        assert_eq!(p.next_phase(Phase::Pause), Some((Phase::Inhale, true)));
    }

    #[test]
    fn empty_pattern_has_no_next_phase() {
        let p = BreathingPattern::new("empty", 0.0, 0.0, 3);
        assert_eq!(p.first_phase(), None);
        assert_eq!(p.next_phase(Phase::Idle), None);
    }

    #[test]
    fn validate_rejects_bad_patterns() {
        assert_eq!(
            BreathingPattern::new("a", 0.0, 4.0, 1).validate(),
            Err(ValidationError::NonPositivePhase {
                phase: "inhale",
                value: 0.0
            })
        );
        assert!(matches!(
            BreathingPattern::new("a", 4.0, 4.0, 1).with_hold(-1.0).validate(),
            Err(ValidationError::InvalidDuration { phase: "hold", .. })
        ));
        assert_eq!(
            BreathingPattern::new("a", 4.0, 4.0, 0).validate(),
            Err(ValidationError::NoCycles)
        );
        for p in builtin_patterns() {
            assert!(p.validate().is_ok(), "{} should be valid", p.id);
        }
    }

    #[test]
    fn custom_patterns_shadow_builtins() {
        let custom = vec![BreathingPattern::new("box", 3.0, 3.0, 2)];
        assert_eq!(find_pattern("box", &custom).unwrap().inhale, 3.0);
        assert!(matches!(
            find_pattern("nope", &custom),
            Err(ValidationError::UnknownPattern(_))
        ));
    }

    #[test]
    fn instructions_per_phase() {
        assert_eq!(Phase::Idle.instruction(), "Ready to begin");
        assert_eq!(Phase::Inhale.instruction(), "Breathe in");
        assert_eq!(Phase::Hold.instruction(), "Hold");
        assert_eq!(Phase::Exhale.instruction(), "Breathe out");
        assert_eq!(Phase::Pause.instruction(), "Pause");
    }
}
