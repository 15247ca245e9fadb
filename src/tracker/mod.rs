pub mod export;
pub mod status;

use crate::clock::Clock;
use crate::db::Database;
use crate::errors::{TrackerError, TrackerResult};
use crate::models::{ApplicationLog, DailyLog, DayRecord, DaySession, LogStatus, Settings};
use crate::tracker::status::StatusSummary;
use chrono::{NaiveDate, Utc};
use serde::Serialize;

/// Goal plus derived streaks, as reported to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerState {
    pub daily_goal: i64,
    #[serde(flatten)]
    pub summary: StatusSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishedDay {
    pub message: String,
    #[serde(skip)]
    pub log_date: NaiveDate,
    #[serde(skip)]
    pub status: LogStatus,
    #[serde(flatten)]
    pub summary: StatusSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayApplications {
    pub log_date: NaiveDate,
    pub status: Option<LogStatus>,
    pub applications: Vec<ApplicationLog>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreakDebug {
    pub backend_today: NaiveDate,
    pub logs: Vec<DebugLogEntry>,
    pub streaks: StatusSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DebugLogEntry {
    pub log_date: NaiveDate,
    pub status: LogStatus,
}

pub fn summary(database: &Database, today: NaiveDate) -> TrackerResult<StatusSummary> {
    let logs = database.daily_logs()?;
    Ok(status::compute(&status::history_from_logs(&logs), today))
}

pub fn current_state(database: &Database, clock: &dyn Clock) -> TrackerResult<TrackerState> {
    let settings = database.settings()?;

    Ok(TrackerState {
        daily_goal: settings.daily_goal,
        summary: summary(database, clock.today())?,
    })
}

/// Changes the goal for future finalizations. Past day statuses keep their snapshot.
pub fn update_goal(database: &mut Database, daily_goal: i64) -> TrackerResult<Settings> {
    if daily_goal <= 0 {
        return Err(TrackerError::validation(format!(
            "Goal must be a positive integer, got {daily_goal}"
        )));
    }

    Ok(database.set_daily_goal(daily_goal)?)
}

/// Closes out today's session and returns the recomputed streaks.
pub fn finish_day(
    database: &mut Database,
    clock: &dyn Clock,
    session: &DaySession,
) -> TrackerResult<FinishedDay> {
    if session.completed_count < 0 || session.elapsed_seconds < 0 {
        return Err(TrackerError::validation(
            "completedCount and elapsedSeconds cannot be negative",
        ));
    }

    let now = clock.now();
    let today = now.date_naive();
    let outcome = database.finalize_day(today, session, now.with_timezone(&Utc))?;

    let verb = if outcome.created { "created" } else { "updated" };

    Ok(FinishedDay {
        message: format!(
            "Day log {verb} successfully with status: {}",
            outcome.status
        ),
        log_date: today,
        status: outcome.status,
        summary: summary(database, today)?,
    })
}

pub fn session_for_date(
    database: &Database,
    date: NaiveDate,
) -> TrackerResult<Option<DayRecord>> {
    Ok(database.day_record(date)?)
}

pub fn applications_for_date(
    database: &Database,
    date: NaiveDate,
) -> TrackerResult<DayApplications> {
    let status = database.daily_log(date)?.map(|log| log.status);

    Ok(DayApplications {
        log_date: date,
        status,
        applications: database.applications_for_date(date)?,
    })
}

/// Day logs falling inside the given calendar month.
pub fn calendar_month(
    database: &Database,
    year: i32,
    month: u32,
) -> TrackerResult<Vec<DailyLog>> {
    if !(1..=12).contains(&month) {
        return Err(TrackerError::validation("Month must be 1-12"));
    }

    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| TrackerError::validation(format!("Invalid year: {year}")))?;
    let end = start
        .checked_add_months(chrono::Months::new(1))
        .ok_or_else(|| TrackerError::validation(format!("Invalid year: {year}")))?;

    Ok(database.daily_logs_between(start, end)?)
}

pub fn history(database: &Database) -> TrackerResult<Vec<DayRecord>> {
    Ok(database.day_records()?)
}

pub fn debug_streaks(database: &Database, clock: &dyn Clock) -> TrackerResult<StreakDebug> {
    let today = clock.today();
    let logs = database.daily_logs()?;
    let streaks = status::compute(&status::history_from_logs(&logs), today);

    Ok(StreakDebug {
        backend_today: today,
        logs: logs
            .into_iter()
            .map(|log| DebugLogEntry {
                log_date: log.log_date,
                status: log.status,
            })
            .collect(),
        streaks,
    })
}

pub fn reset_all(database: &mut Database) -> TrackerResult<Settings> {
    Ok(database.reset_all()?)
}

#[cfg(test)]
mod tests {
    use super::{
        applications_for_date, calendar_month, current_state, debug_streaks, finish_day,
        session_for_date, update_goal,
    };
    use crate::clock::FixedClock;
    use crate::db::Database;
    use crate::errors::TrackerError;
    use crate::models::{ApplicationInput, DaySession, LogStatus};
    use chrono::NaiveDate;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn day_session(completed_count: i64, jobs: &[&str]) -> DaySession {
        DaySession {
            completed_count,
            elapsed_seconds: 3_600,
            applications: jobs
                .iter()
                .map(|job| ApplicationInput {
                    job_name: Some(job.to_string()),
                    company: Some("Acme".to_string()),
                    resume_used: Some("main.pdf".to_string()),
                })
                .collect(),
        }
    }

    #[test]
    fn goal_boundary_decides_status() {
        let mut db = Database::open_in_memory().unwrap();
        update_goal(&mut db, 3).unwrap();

        let met = finish_day(&mut db, &FixedClock::on(date(1)), &day_session(3, &["a"]));
        let missed = finish_day(&mut db, &FixedClock::on(date(2)), &day_session(2, &["b"]));
        let (met, missed) = (met.unwrap(), missed.unwrap());

        assert_eq!(met.status, LogStatus::Complete);
        assert_eq!(missed.status, LogStatus::Incomplete);
        assert!(met.message.contains("created"));
    }

    #[test]
    fn streak_example_with_incomplete_day() {
        let mut db = Database::open_in_memory().unwrap();
        update_goal(&mut db, 3).unwrap();

        for (day, count) in [(1, 3), (2, 4), (3, 1), (4, 3)] {
            finish_day(&mut db, &FixedClock::on(date(day)), &day_session(count, &[])).unwrap();
        }

        let state = current_state(&db, &FixedClock::on(date(4))).unwrap();

        assert_eq!(state.daily_goal, 3);
        assert_eq!(state.summary.total_streak, 4);
        assert_eq!(state.summary.goal_streak, 1);
        assert_eq!(state.summary.total_days_logged, 4);
        assert_eq!(state.summary.last_completed_date, Some(date(4)));
        assert_eq!(state.summary.last_log_status, Some(LogStatus::Complete));
    }

    #[test]
    fn two_day_gap_breaks_streaks() {
        let mut db = Database::open_in_memory().unwrap();
        finish_day(&mut db, &FixedClock::on(date(1)), &day_session(5, &[])).unwrap();

        let state = current_state(&db, &FixedClock::on(date(3))).unwrap();

        assert_eq!(state.summary.total_streak, 0);
        assert_eq!(state.summary.goal_streak, 0);
        assert_eq!(state.summary.total_days_logged, 1);
    }

    #[test]
    fn empty_store_reports_default_state() {
        let db = Database::open_in_memory().unwrap();
        let state = current_state(&db, &FixedClock::on(date(1))).unwrap();

        assert_eq!(state.daily_goal, 5);
        assert_eq!(state.summary.total_days_logged, 0);
        assert_eq!(state.summary.last_completed_date, None);
        assert_eq!(state.summary.last_log_status, None);
    }

    #[test]
    fn non_positive_goals_are_rejected() {
        let mut db = Database::open_in_memory().unwrap();

        for goal in [0, -5] {
            assert!(matches!(
                update_goal(&mut db, goal),
                Err(TrackerError::Validation(_))
            ));
        }

        assert_eq!(db.settings().unwrap().daily_goal, 5);
    }

    #[test]
    fn goal_change_does_not_rewrite_past_days() {
        let mut db = Database::open_in_memory().unwrap();
        finish_day(&mut db, &FixedClock::on(date(1)), &day_session(5, &[])).unwrap();

        update_goal(&mut db, 10).unwrap();

        assert_eq!(
            db.daily_log(date(1)).unwrap().unwrap().status,
            LogStatus::Complete
        );
    }

    #[test]
    fn negative_counts_are_rejected_without_writes() {
        let mut db = Database::open_in_memory().unwrap();
        let clock = FixedClock::on(date(1));

        let mut session = day_session(1, &["a"]);
        session.elapsed_seconds = -1;

        assert!(matches!(
            finish_day(&mut db, &clock, &session),
            Err(TrackerError::Validation(_))
        ));
        assert!(session_for_date(&db, date(1)).unwrap().is_none());
    }

    #[test]
    fn refinishing_replaces_applications_and_reports_update() {
        let mut db = Database::open_in_memory().unwrap();
        let clock = FixedClock::on(date(5));

        finish_day(&mut db, &clock, &day_session(2, &["a1", "a2"])).unwrap();
        let second = finish_day(&mut db, &clock, &day_session(1, &["b1"])).unwrap();

        assert!(second.message.contains("updated"));
        let logs = applications_for_date(&db, date(5)).unwrap();
        let jobs = logs
            .applications
            .iter()
            .filter_map(|application| application.job_name.as_deref())
            .collect::<Vec<_>>();
        assert_eq!(jobs, vec!["b1"]);
        assert_eq!(logs.status, Some(LogStatus::Incomplete));
    }

    #[test]
    fn logs_for_unlogged_date_are_empty() {
        let db = Database::open_in_memory().unwrap();
        let logs = applications_for_date(&db, date(7)).unwrap();

        assert_eq!(logs.status, None);
        assert!(logs.applications.is_empty());
    }

    #[test]
    fn calendar_covers_december_and_rejects_bad_month() {
        let mut db = Database::open_in_memory().unwrap();
        let december = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        finish_day(&mut db, &FixedClock::on(december), &day_session(5, &[])).unwrap();
        finish_day(&mut db, &FixedClock::on(date(1)), &day_session(5, &[])).unwrap();

        let days = calendar_month(&db, 2023, 12).unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].log_date, december);

        assert!(matches!(
            calendar_month(&db, 2024, 13),
            Err(TrackerError::Validation(_))
        ));
    }

    #[test]
    fn debug_view_lists_engine_input() {
        let mut db = Database::open_in_memory().unwrap();
        finish_day(&mut db, &FixedClock::on(date(2)), &day_session(1, &[])).unwrap();

        let debug = debug_streaks(&db, &FixedClock::on(date(2))).unwrap();

        assert_eq!(debug.backend_today, date(2));
        assert_eq!(debug.logs.len(), 1);
        assert_eq!(debug.streaks.total_streak, 1);
        assert_eq!(debug.streaks.goal_streak, 0);
    }
}
