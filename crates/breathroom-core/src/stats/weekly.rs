//! Monday-anchored weekly buckets.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::storage::SessionRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayBucket {
    pub date: NaiveDate,
    /// "Mon" .. "Sun".
    pub weekday: String,
    pub sessions: u32,
    pub minutes: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySummary {
    pub week_start: NaiveDate,
    pub days: Vec<DayBucket>,
    pub total_sessions: u32,
    pub total_minutes: f64,
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Bucket `records` into the seven days of the week containing `reference`.
/// Records outside that week are ignored.
pub fn weekly_summary(records: &[SessionRecord], reference: NaiveDate) -> WeeklySummary {
    let start = week_start(reference);
    let mut days: Vec<DayBucket> = (0..7)
        .map(|i| {
            let date = start + Duration::days(i);
            DayBucket {
                date,
                weekday: date.weekday().to_string(),
                sessions: 0,
                minutes: 0.0,
            }
        })
        .collect();

    for record in records {
        let offset = (record.completed_on() - start).num_days();
        if let Some(bucket) = usize::try_from(offset).ok().and_then(|i| days.get_mut(i)) {
            bucket.sessions += 1;
            bucket.minutes += record.duration_secs as f64 / 60.0;
        }
    }

    WeeklySummary {
        week_start: start,
        total_sessions: days.iter().map(|d| d.sessions).sum(),
        total_minutes: days.iter().map(|d| d.minutes).sum(),
        days,
    }
}
