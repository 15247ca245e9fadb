use chrono::NaiveDate;
use rusqlite::ToSql;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

pub const SETTINGS_KEY: &str = "global_settings";
pub const DEFAULT_DAILY_GOAL: i64 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub key: String,
    pub daily_goal: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    Complete,
    Incomplete,
}

impl LogStatus {
    /// Status snapshot for a finished session against the goal in force at that moment.
    pub fn from_progress(completed_count: i64, daily_goal: i64) -> Self {
        if completed_count >= daily_goal {
            Self::Complete
        } else {
            Self::Incomplete
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Incomplete => "incomplete",
        }
    }

    pub fn is_complete(self) -> bool {
        self == Self::Complete
    }
}

impl fmt::Display for LogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for LogStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for LogStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "complete" => Ok(Self::Complete),
            "incomplete" => Ok(Self::Incomplete),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

/// Summary of one finished day. At most one per date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyLog {
    pub log_date: NaiveDate,
    pub status: LogStatus,
    pub completed_count: i64,
    pub elapsed_seconds: i64,
}

/// One completed application stored under a day log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationLog {
    pub id: i64,
    pub job_name: Option<String>,
    pub company: Option<String>,
    pub resume_used: Option<String>,
}

// Only completed applications are ever stored, so `done` is always true on the wire.
impl Serialize for ApplicationLog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ApplicationLog", 5)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("jobName", &self.job_name)?;
        state.serialize_field("company", &self.company)?;
        state.serialize_field("resume", &self.resume_used)?;
        state.serialize_field("done", &true)?;
        state.end()
    }
}

/// Application details submitted when a day is finished.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ApplicationInput {
    #[serde(rename = "jobName", default)]
    pub job_name: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(rename = "resume", default)]
    pub resume_used: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DaySession {
    pub completed_count: i64,
    pub elapsed_seconds: i64,
    pub applications: Vec<ApplicationInput>,
}

/// A day log together with its applications, as read back from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayRecord {
    pub log_date: NaiveDate,
    pub status: LogStatus,
    pub completed_count: i64,
    pub elapsed_seconds: i64,
    pub applications: Vec<ApplicationLog>,
}

impl DayRecord {
    pub fn new(log: DailyLog, applications: Vec<ApplicationLog>) -> Self {
        Self {
            log_date: log.log_date,
            status: log.status,
            completed_count: log.completed_count,
            elapsed_seconds: log.elapsed_seconds,
            applications,
        }
    }
}
