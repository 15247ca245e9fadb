pub mod queries;

use crate::models::{
    ApplicationLog, DEFAULT_DAILY_GOAL, DailyLog, DayRecord, DaySession, LogStatus, SETTINGS_KEY,
    Settings,
};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::info;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalizeOutcome {
    pub status: LogStatus,
    pub daily_goal: i64,
    pub created: bool,
}

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create DB directory: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open SQLite DB: {}", path.display()))?;

        Self::from_connection(conn)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory SQLite DB")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)
            .context("Failed to enable foreign keys")?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .context("Failed to set busy timeout")?;

        let database = Self { conn };
        database.init_schema()?;

        Ok(database)
    }

    pub fn init_schema(&self) -> Result<()> {
        queries::schema_statements()
            .iter()
            .try_for_each(|statement| {
                self.conn
                    .execute(statement, [])
                    .context("Failed to initialize schema")
                    .map(|_| ())
            })
    }

    /// Returns the settings row, creating it with the default goal when missing.
    pub fn settings(&self) -> Result<Settings> {
        ensure_settings(&self.conn)
    }

    pub fn set_daily_goal(&mut self, daily_goal: i64) -> Result<Settings> {
        let transaction = self
            .conn
            .transaction()
            .context("Failed to start transaction")?;

        ensure_settings(&transaction)?;
        transaction
            .execute(
                "UPDATE settings SET daily_goal = ?1 WHERE key = ?2",
                params![daily_goal, SETTINGS_KEY],
            )
            .context("Failed to update daily goal")?;
        let settings = ensure_settings(&transaction)?;

        transaction
            .commit()
            .context("Failed to commit daily goal")?;
        Ok(settings)
    }

    pub fn daily_logs(&self) -> Result<Vec<DailyLog>> {
        let mut statement = self.conn.prepare(queries::SELECT_DAILY_LOGS)?;

        let rows = statement
            .query_map([], daily_log_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to query daily logs")?;

        Ok(rows)
    }

    /// Day logs with `from <= log_date < until`, ordered by date.
    pub fn daily_logs_between(&self, from: NaiveDate, until: NaiveDate) -> Result<Vec<DailyLog>> {
        let mut statement = self.conn.prepare(
            "SELECT log_date, status, completed_count, elapsed_seconds
             FROM daily_logs
             WHERE log_date >= ?1 AND log_date < ?2
             ORDER BY log_date ASC",
        )?;

        let rows = statement
            .query_map(params![from, until], daily_log_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to query daily logs in range")?;

        Ok(rows)
    }

    pub fn daily_log(&self, date: NaiveDate) -> Result<Option<DailyLog>> {
        daily_log_in(&self.conn, date)
    }

    pub fn applications_for_date(&self, date: NaiveDate) -> Result<Vec<ApplicationLog>> {
        applications_in(&self.conn, date)
    }

    /// Reads a day log and its applications from one snapshot.
    pub fn day_record(&self, date: NaiveDate) -> Result<Option<DayRecord>> {
        let snapshot = self
            .conn
            .unchecked_transaction()
            .context("Failed to start read transaction")?;

        let record = daily_log_in(&snapshot, date)?
            .map(|log| applications_in(&snapshot, date).map(|apps| DayRecord::new(log, apps)))
            .transpose()?;

        snapshot.finish().context("Failed to finish read transaction")?;
        Ok(record)
    }

    /// Every day log with its applications, ordered by date.
    pub fn day_records(&self) -> Result<Vec<DayRecord>> {
        let snapshot = self
            .conn
            .unchecked_transaction()
            .context("Failed to start read transaction")?;

        let logs = {
            let mut statement = snapshot.prepare(queries::SELECT_DAILY_LOGS)?;
            statement
                .query_map([], daily_log_from_row)?
                .collect::<Result<Vec<_>, _>>()
                .context("Failed to query daily logs")?
        };

        let mut applications: BTreeMap<NaiveDate, Vec<ApplicationLog>> = BTreeMap::new();
        {
            let mut statement = snapshot.prepare(queries::SELECT_APPLICATIONS)?;
            statement
                .query_map([], |row| {
                    Ok((row.get::<_, NaiveDate>(1)?, application_from_row(row)?))
                })?
                .collect::<Result<Vec<_>, _>>()
                .context("Failed to query application logs")?
                .into_iter()
                .for_each(|(date, application)| {
                    applications.entry(date).or_default().push(application)
                });
        }

        snapshot.finish().context("Failed to finish read transaction")?;

        Ok(logs
            .into_iter()
            .map(|log| {
                let children = applications.remove(&log.log_date).unwrap_or_default();
                DayRecord::new(log, children)
            })
            .collect())
    }

    /// Upserts the day log for `date` and replaces its applications in one transaction.
    ///
    /// The status is computed against the goal read inside the same transaction.
    pub fn finalize_day(
        &mut self,
        date: NaiveDate,
        session: &DaySession,
        logged_at: DateTime<Utc>,
    ) -> Result<FinalizeOutcome> {
        let transaction = self
            .conn
            .transaction()
            .context("Failed to start transaction")?;

        let daily_goal = ensure_settings(&transaction)?.daily_goal;
        let status = LogStatus::from_progress(session.completed_count, daily_goal);

        let created = transaction
            .query_row(
                "SELECT 1 FROM daily_logs WHERE log_date = ?1",
                params![date],
                |_| Ok(()),
            )
            .optional()
            .context("Failed to look up daily log")?
            .is_none();

        transaction
            .execute(
                "INSERT INTO daily_logs (log_date, status, completed_count, elapsed_seconds)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(log_date)
                 DO UPDATE SET status=excluded.status, completed_count=excluded.completed_count, elapsed_seconds=excluded.elapsed_seconds",
                params![date, status, session.completed_count, session.elapsed_seconds],
            )
            .context("Failed to upsert daily log")?;

        let removed = transaction
            .execute(
                "DELETE FROM application_logs WHERE log_date = ?1",
                params![date],
            )
            .context("Failed to delete existing application logs")?;

        session.applications.iter().try_for_each(|application| {
            transaction
                .execute(
                    "INSERT INTO application_logs (log_date, job_name, company, resume_used, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        date,
                        application.job_name,
                        application.company,
                        application.resume_used,
                        logged_at
                    ],
                )
                .context("Failed to insert application log")
                .map(|_| ())
        })?;

        transaction
            .commit()
            .context("Failed to commit day log")?;

        info!(
            date = %date,
            status = %status,
            created,
            removed,
            inserted = session.applications.len(),
            "day log finalized"
        );

        Ok(FinalizeOutcome {
            status,
            daily_goal,
            created,
        })
    }

    /// Removes every log and the settings row, then recreates default settings.
    pub fn reset_all(&mut self) -> Result<Settings> {
        let transaction = self
            .conn
            .transaction()
            .context("Failed to start transaction")?;

        transaction
            .execute("DELETE FROM application_logs", [])
            .context("Failed to delete application logs")?;
        transaction
            .execute("DELETE FROM daily_logs", [])
            .context("Failed to delete daily logs")?;
        transaction
            .execute("DELETE FROM settings", [])
            .context("Failed to delete settings")?;
        let settings = ensure_settings(&transaction)?;

        transaction.commit().context("Failed to commit reset")?;
        Ok(settings)
    }
}

fn ensure_settings(conn: &Connection) -> Result<Settings> {
    let inserted = conn
        .execute(
            queries::INSERT_DEFAULT_SETTINGS,
            params![SETTINGS_KEY, DEFAULT_DAILY_GOAL],
        )
        .context("Failed to create default settings")?;

    if inserted > 0 {
        info!(daily_goal = DEFAULT_DAILY_GOAL, "settings not found, created defaults");
    }

    conn.query_row(queries::SELECT_SETTINGS, params![SETTINGS_KEY], |row| {
        Ok(Settings {
            key: row.get(0)?,
            daily_goal: row.get(1)?,
        })
    })
    .context("Failed to read settings")
}

fn daily_log_in(conn: &Connection, date: NaiveDate) -> Result<Option<DailyLog>> {
    conn.query_row(
        "SELECT log_date, status, completed_count, elapsed_seconds FROM daily_logs WHERE log_date = ?1",
        params![date],
        daily_log_from_row,
    )
    .optional()
    .context("Failed to query daily log")
}

fn applications_in(conn: &Connection, date: NaiveDate) -> Result<Vec<ApplicationLog>> {
    let mut statement = conn.prepare(
        "SELECT id, log_date, job_name, company, resume_used
         FROM application_logs
         WHERE log_date = ?1
         ORDER BY created_at ASC, id ASC",
    )?;

    let rows = statement
        .query_map(params![date], application_from_row)?
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to query application logs")?;

    Ok(rows)
}

fn daily_log_from_row(row: &Row<'_>) -> rusqlite::Result<DailyLog> {
    Ok(DailyLog {
        log_date: row.get(0)?,
        status: row.get(1)?,
        completed_count: row.get(2)?,
        elapsed_seconds: row.get(3)?,
    })
}

// Expects `id, log_date, job_name, company, resume_used`.
fn application_from_row(row: &Row<'_>) -> rusqlite::Result<ApplicationLog> {
    Ok(ApplicationLog {
        id: row.get(0)?,
        job_name: row.get(2)?,
        company: row.get(3)?,
        resume_used: row.get(4)?,
    })
}
