pub const CREATE_SETTINGS: &str = r#"
CREATE TABLE IF NOT EXISTS settings (
  id          INTEGER PRIMARY KEY AUTOINCREMENT,
  key         TEXT NOT NULL UNIQUE,
  daily_goal  INTEGER NOT NULL DEFAULT 5 CHECK (daily_goal > 0)
);
"#;

pub const CREATE_DAILY_LOGS: &str = r#"
CREATE TABLE IF NOT EXISTS daily_logs (
  log_date        TEXT PRIMARY KEY,
  status          TEXT NOT NULL DEFAULT 'incomplete' CHECK (status IN ('complete', 'incomplete')),
  completed_count INTEGER NOT NULL DEFAULT 0 CHECK (completed_count >= 0),
  elapsed_seconds INTEGER NOT NULL DEFAULT 0 CHECK (elapsed_seconds >= 0)
);
"#;

pub const CREATE_APPLICATION_LOGS: &str = r#"
CREATE TABLE IF NOT EXISTS application_logs (
  id          INTEGER PRIMARY KEY AUTOINCREMENT,
  log_date    TEXT NOT NULL REFERENCES daily_logs(log_date) ON DELETE CASCADE,
  job_name    TEXT,
  company     TEXT,
  resume_used TEXT,
  created_at  TEXT NOT NULL
);
"#;

pub const INDEX_APPLICATION_LOGS_DATE: &str =
    "CREATE INDEX IF NOT EXISTS idx_application_logs_log_date ON application_logs(log_date);";

pub const INSERT_DEFAULT_SETTINGS: &str =
    "INSERT OR IGNORE INTO settings (key, daily_goal) VALUES (?1, ?2)";

pub const SELECT_SETTINGS: &str = "SELECT key, daily_goal FROM settings WHERE key = ?1";

pub const SELECT_DAILY_LOGS: &str = "SELECT log_date, status, completed_count, elapsed_seconds
     FROM daily_logs
     ORDER BY log_date ASC";

pub const SELECT_APPLICATIONS: &str = "SELECT id, log_date, job_name, company, resume_used
     FROM application_logs
     ORDER BY log_date ASC, created_at ASC, id ASC";

pub fn schema_statements() -> Vec<&'static str> {
    vec![
        CREATE_SETTINGS,
        CREATE_DAILY_LOGS,
        CREATE_APPLICATION_LOGS,
        INDEX_APPLICATION_LOGS_DATE,
    ]
}
