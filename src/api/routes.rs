use crate::clock::Clock;
use crate::config::Config;
use crate::db::Database;
use crate::errors::TrackerError;
use crate::models::{ApplicationInput, DayRecord, DaySession, LogStatus};
use crate::tracker::export::{self, CSV_FILENAME, ExportFormat};
use crate::tracker::{self, DayApplications, FinishedDay, StreakDebug, TrackerState};
use anyhow::Context;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Clone)]
pub struct ApiState {
    pub config: Arc<Config>,
    pub clock: Arc<dyn Clock>,
}

impl ApiState {
    fn database(&self) -> ApiResult<Database> {
        Ok(Database::open(&self.config.db_path)?)
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/state", get(state_summary))
        .route("/api/goal", put(goal_update))
        .route("/api/session/:date", get(session_by_date))
        .route("/api/finish_day", post(finish_day))
        .route("/api/calendar_data", get(calendar_data))
        .route("/api/logs/:date", get(logs_by_date))
        .route("/api/reset", delete(reset))
        .route("/api/export_logs", get(export_logs))
        .route("/api/server_time", get(server_time))
        .route("/api/debug_streaks", get(debug_streaks))
        .fallback(not_found)
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct CalendarQuery {
    month: Option<String>,
    year: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExportQuery {
    format: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FinishDayPayload {
    #[serde(rename = "completedCount")]
    completed_count: Option<Value>,
    #[serde(rename = "elapsedSeconds")]
    elapsed_seconds: Option<Value>,
    applications: Option<Value>,
}

#[derive(Debug, Serialize)]
struct GoalPayload {
    #[serde(rename = "dailyGoal")]
    daily_goal: i64,
}

#[derive(Debug, Serialize)]
struct SessionPayload {
    found: bool,
    #[serde(flatten)]
    record: DayRecord,
}

#[derive(Debug, Serialize)]
struct CalendarDay {
    date: NaiveDate,
    status: LogStatus,
}

#[derive(Debug, Serialize)]
struct CalendarPayload {
    #[serde(rename = "loggedDaysStatus")]
    logged_days_status: Vec<CalendarDay>,
}

#[derive(Debug, Serialize)]
struct ServerTimePayload {
    iso: String,
    date: String,
    time: String,
    datetime: String,
    tz: String,
}

async fn state_summary(State(state): State<ApiState>) -> ApiResult<Json<TrackerState>> {
    let database = state.database()?;
    Ok(Json(tracker::current_state(&database, state.clock.as_ref())?))
}

async fn goal_update(
    State(state): State<ApiState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<GoalPayload>> {
    let Json(body) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let raw = body
        .get("goal")
        .filter(|value| !value.is_null())
        .ok_or_else(|| ApiError::BadRequest("Missing 'goal'".to_string()))?;
    let goal = whole_number(raw)
        .ok_or_else(|| ApiError::BadRequest("Invalid goal value".to_string()))?;

    let mut database = state.database()?;
    let settings = tracker::update_goal(&mut database, goal)?;
    info!(daily_goal = settings.daily_goal, "daily goal updated");

    Ok(Json(GoalPayload {
        daily_goal: settings.daily_goal,
    }))
}

async fn session_by_date(
    State(state): State<ApiState>,
    Path(date): Path<String>,
) -> ApiResult<Response> {
    let target_date = parse_date(&date)?;
    let database = state.database()?;

    let response = match tracker::session_for_date(&database, target_date)? {
        Some(record) => Json(SessionPayload {
            found: true,
            record,
        })
        .into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({ "found": false }))).into_response(),
    };

    Ok(response)
}

async fn finish_day(
    State(state): State<ApiState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<FinishedDay>> {
    let Json(body) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let session = parse_finish_day(body)?;

    let mut database = state.database()?;
    let finished = tracker::finish_day(&mut database, state.clock.as_ref(), &session)?;
    info!(
        date = %finished.log_date,
        status = %finished.status,
        applications = session.applications.len(),
        "day finished"
    );

    Ok(Json(finished))
}

async fn calendar_data(
    State(state): State<ApiState>,
    Query(query): Query<CalendarQuery>,
) -> ApiResult<Json<CalendarPayload>> {
    let (Some(month), Some(year)) = (query.month.as_deref(), query.year.as_deref()) else {
        return Err(ApiError::BadRequest("Missing 'month' or 'year'".to_string()));
    };

    let month = month
        .trim()
        .parse::<u32>()
        .map_err(|_| ApiError::BadRequest("Invalid month/year".to_string()))?;
    let year = year
        .trim()
        .parse::<i32>()
        .map_err(|_| ApiError::BadRequest("Invalid month/year".to_string()))?;

    let database = state.database()?;
    let logged_days_status = tracker::calendar_month(&database, year, month)?
        .into_iter()
        .map(|log| CalendarDay {
            date: log.log_date,
            status: log.status,
        })
        .collect();

    Ok(Json(CalendarPayload { logged_days_status }))
}

async fn logs_by_date(
    State(state): State<ApiState>,
    Path(date): Path<String>,
) -> ApiResult<Json<DayApplications>> {
    let target_date = parse_date(&date)?;
    let database = state.database()?;

    Ok(Json(tracker::applications_for_date(&database, target_date)?))
}

async fn reset(State(state): State<ApiState>) -> ApiResult<Json<Value>> {
    let mut database = state.database()?;
    let settings = tracker::reset_all(&mut database)?;
    info!(daily_goal = settings.daily_goal, "all data reset");

    Ok(Json(json!({ "message": "All data reset successfully" })))
}

async fn export_logs(
    State(state): State<ApiState>,
    Query(query): Query<ExportQuery>,
) -> ApiResult<Response> {
    let format = query
        .format
        .as_deref()
        .map(str::parse::<ExportFormat>)
        .transpose()
        .map_err(ApiError::BadRequest)?
        .unwrap_or_default();

    let database = state.database()?;
    let records = tracker::history(&database)?;

    let response = match format {
        ExportFormat::Json => Json(records).into_response(),
        ExportFormat::Csv => {
            let csv = export::render_csv(&records)?;
            let mut response = csv.into_response();
            response.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/csv; charset=utf-8"),
            );
            response.headers_mut().insert(
                header::CONTENT_DISPOSITION,
                HeaderValue::from_str(&format!("attachment; filename={CSV_FILENAME}"))
                    .context("Failed to build Content-Disposition header")?,
            );
            response
        }
    };

    Ok(response)
}

async fn server_time(State(state): State<ApiState>) -> Json<ServerTimePayload> {
    let now = state.clock.now();

    Json(ServerTimePayload {
        iso: now.to_rfc3339(),
        date: now.format("%Y-%m-%d").to_string(),
        time: now.format("%H:%M:%S").to_string(),
        datetime: now.format("%A, %B %d, %Y %H:%M:%S").to_string(),
        tz: now.format("%Z").to_string(),
    })
}

async fn debug_streaks(State(state): State<ApiState>) -> ApiResult<Json<StreakDebug>> {
    let database = state.database()?;
    Ok(Json(tracker::debug_streaks(&database, state.clock.as_ref())?))
}

async fn not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}

fn parse_finish_day(body: Value) -> ApiResult<DaySession> {
    let payload: FinishDayPayload = serde_json::from_value(body)
        .map_err(|error| ApiError::BadRequest(format!("Invalid request body: {error}")))?;

    let (Some(completed_count), Some(elapsed_seconds), Some(applications)) = (
        payload.completed_count,
        payload.elapsed_seconds,
        payload.applications,
    ) else {
        return Err(ApiError::BadRequest(
            "Missing 'completedCount', 'elapsedSeconds', or 'applications' in request body"
                .to_string(),
        ));
    };

    if !applications.is_array() {
        return Err(ApiError::BadRequest(
            "'applications' must be a list.".to_string(),
        ));
    }

    let invalid_counts =
        || ApiError::BadRequest("Invalid completedCount or elapsedSeconds.".to_string());
    let completed_count = whole_number(&completed_count).ok_or_else(invalid_counts)?;
    let elapsed_seconds = whole_number(&elapsed_seconds).ok_or_else(invalid_counts)?;

    let applications = serde_json::from_value::<Vec<ApplicationInput>>(applications)
        .map_err(|error| ApiError::BadRequest(format!("Invalid application entry: {error}")))?;

    Ok(DaySession {
        completed_count,
        elapsed_seconds,
        applications,
    })
}

/// Accepts integers, integral floats and numeric strings.
fn whole_number(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|float| float.fract() == 0.0 && float.abs() < i64::MAX as f64)
                .map(|float| float as i64)
        }),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Strict `YYYY-MM-DD`; chrono alone also accepts unpadded fields and a leading sign.
fn parse_date(input: &str) -> ApiResult<NaiveDate> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .filter(|date| date.format("%Y-%m-%d").to_string() == input)
        .ok_or_else(|| {
            ApiError::BadRequest(format!("Invalid date format: {input}. Use YYYY-MM-DD."))
        })
}

type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug)]
enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(value: anyhow::Error) -> Self {
        Self::Internal(value)
    }
}

impl From<TrackerError> for ApiError {
    fn from(value: TrackerError) -> Self {
        match value {
            TrackerError::Validation(message) => Self::BadRequest(message),
            TrackerError::Storage(error) => Self::Internal(error),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Internal(error) => {
                error!(error = ?error, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}
