use crate::models::{DailyLog, LogStatus};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    pub total_streak: u32,
    pub goal_streak: u32,
    pub total_days_logged: usize,
    pub last_completed_date: Option<NaiveDate>,
    pub last_log_status: Option<LogStatus>,
}

pub fn history_from_logs(logs: &[DailyLog]) -> BTreeMap<NaiveDate, LogStatus> {
    logs.iter().map(|log| (log.log_date, log.status)).collect()
}

/// Derives streaks and last-log metadata from the full day history.
///
/// Both streaks walk backward from `today` and stop at the first day that breaks them,
/// so a day without a log today means both streaks are zero.
pub fn compute(history: &BTreeMap<NaiveDate, LogStatus>, today: NaiveDate) -> StatusSummary {
    let (last_completed_date, last_log_status) = history
        .iter()
        .next_back()
        .map(|(date, status)| (Some(*date), Some(*status)))
        .unwrap_or((None, None));

    StatusSummary {
        total_streak: trailing_run(history, today, |_| true),
        goal_streak: trailing_run(history, today, LogStatus::is_complete),
        total_days_logged: history.len(),
        last_completed_date,
        last_log_status,
    }
}

fn trailing_run<F>(history: &BTreeMap<NaiveDate, LogStatus>, today: NaiveDate, counts: F) -> u32
where
    F: Fn(LogStatus) -> bool,
{
    let mut run = 0;
    let mut day = Some(today);

    while let Some(current) = day {
        match history.get(&current) {
            Some(status) if counts(*status) => {
                run += 1;
                day = current.pred_opt();
            }
            _ => break,
        }
    }

    run
}
