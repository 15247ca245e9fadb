use crate::models::DayRecord;
use anyhow::{Context, Result};
use std::str::FromStr;

pub const CSV_FILENAME: &str = "jobtracker_logs.csv";

const CSV_HEADER: [&str; 7] = [
    "log_date",
    "status",
    "completed_count",
    "elapsed_seconds",
    "jobName",
    "company",
    "resume",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!("Unsupported export format: {other}. Use json or csv.")),
        }
    }
}

pub fn render(records: &[DayRecord], format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Json => {
            serde_json::to_string_pretty(records).context("Failed to serialize log history")
        }
        ExportFormat::Csv => render_csv(records),
    }
}

/// One row per application; a day without applications still gets one row with empty
/// application columns.
pub fn render_csv(records: &[DayRecord]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(CSV_HEADER)
        .context("Failed to write CSV header")?;

    for record in records {
        let date = record.log_date.format("%Y-%m-%d").to_string();
        let completed = record.completed_count.to_string();
        let elapsed = record.elapsed_seconds.to_string();
        let day = [
            date.as_str(),
            record.status.as_str(),
            completed.as_str(),
            elapsed.as_str(),
        ];

        if record.applications.is_empty() {
            writer
                .write_record(day.iter().copied().chain(["", "", ""]))
                .context("Failed to write CSV row")?;
            continue;
        }

        for application in &record.applications {
            let details = [
                application.job_name.as_deref().unwrap_or_default(),
                application.company.as_deref().unwrap_or_default(),
                application.resume_used.as_deref().unwrap_or_default(),
            ];
            writer
                .write_record(day.iter().copied().chain(details))
                .context("Failed to write CSV row")?;
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|error| anyhow::anyhow!("Failed to flush CSV output: {error}"))?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}
