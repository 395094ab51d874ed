use breathroom_core::stats::{current_streak, longest_streak, summarize, weekly_summary};
use breathroom_core::storage::{Database, SessionRecord};
use chrono::{NaiveDate, Utc};
use clap::Subcommand;
use serde_json::json;

use super::{print_json, CliResult};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's stats
    Today,
    /// All-time stats
    All,
    /// Per-day buckets for the current week (or the week containing --date)
    Week {
        /// Any day of the week, YYYY-MM-DD
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Current and longest day streaks
    Streak,
}

pub fn run(action: StatsAction) -> CliResult {
    let db = Database::open()?;
    let records = db.all_sessions()?;
    // Sessions are bucketed by UTC completion date.
    let today = Utc::now().date_naive();

    match action {
        StatsAction::Today => {
            let stats = summarize(&records, today);
            print_json(&json!({
                "date": today,
                "sessions": stats.today_sessions,
                "minutes": stats.today_minutes,
                "current_streak_days": stats.current_streak_days,
            }))?;
        }
        StatsAction::All => {
            print_json(&summarize(&records, today))?;
        }
        StatsAction::Week { date } => {
            print_json(&weekly_summary(&records, date.unwrap_or(today)))?;
        }
        StatsAction::Streak => {
            let dates = || records.iter().map(SessionRecord::completed_on);
            print_json(&json!({
                "current_streak_days": current_streak(dates(), today),
                "longest_streak_days": longest_streak(dates()),
            }))?;
        }
    }
    Ok(())
}
