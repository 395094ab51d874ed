//! Statistics module for Breathroom
//!
//! Client-side reductions over recorded sessions: totals, today's
//! practice, day streaks and weekly buckets.

mod streak;
mod weekly;

pub use streak::{current_streak, longest_streak};
pub use weekly::{week_start, weekly_summary, DayBucket, WeeklySummary};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::storage::{SessionKind, SessionRecord};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Stats {
    pub total_sessions: u64,
    pub total_minutes: f64,
    pub breathing_sessions: u64,
    pub meditation_sessions: u64,
    pub total_cycles: u64,
    pub today_sessions: u64,
    pub today_minutes: f64,
    pub current_streak_days: u32,
    pub longest_streak_days: u32,
}

/// Reduce `records` to headline numbers as of `today`.
pub fn summarize(records: &[SessionRecord], today: NaiveDate) -> Stats {
    let mut stats = Stats::default();
    for record in records {
        let minutes = record.duration_secs as f64 / 60.0;
        stats.total_sessions += 1;
        stats.total_minutes += minutes;
        stats.total_cycles += record.cycles_completed as u64;
        match record.kind {
            SessionKind::Breathing => stats.breathing_sessions += 1,
            SessionKind::Meditation => stats.meditation_sessions += 1,
        }
        if record.completed_on() == today {
            stats.today_sessions += 1;
            stats.today_minutes += minutes;
        }
    }
    let dates = || records.iter().map(SessionRecord::completed_on);
    stats.current_streak_days = current_streak(dates(), today);
    stats.longest_streak_days = longest_streak(dates());
    stats
}
