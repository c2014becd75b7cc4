//! Activity Routes
//!
//! Endpoints for recording user activity.
//!
//! - POST /api/v1/activity - Single event
//! - POST /api/v1/activity/batch - Batch of events

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use std::sync::Arc;

use crate::activity::{ActivityEvent, ActivityRecord};
use crate::api::dto::{
    ActivityRequest, ActivityResponse, BatchActivityRequest, BatchActivityResponse, BatchError,
};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;

const MAX_USER_ID_LEN: usize = 128;
const MAX_ACTION_LEN: usize = 64;

/// POST /api/v1/activity
///
/// Record a single event.
pub async fn record_activity(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ActivityRequest>,
) -> ApiResult<(StatusCode, Json<ActivityResponse>)> {
    let now = Utc::now().timestamp_millis();
    let event = to_event(req, now)?;
    let timestamp = event.timestamp;

    {
        let mut log = state.activity_log.lock().await;
        log.append(&ActivityRecord::from(event))?;
    }

    Ok((
        StatusCode::CREATED,
        Json(ActivityResponse {
            status: "ok".to_string(),
            timestamp,
        }),
    ))
}

/// POST /api/v1/activity/batch
///
/// Record multiple events in a single request. Invalid events are reported
/// by index; the valid ones are still written.
pub async fn record_activity_batch(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BatchActivityRequest>,
) -> ApiResult<(StatusCode, Json<BatchActivityResponse>)> {
    if req.events.is_empty() {
        return Err(ApiError::Validation("Empty batch".to_string()));
    }

    let max = state.config.max_batch_size;
    if req.events.len() > max {
        return Err(ApiError::Validation(format!(
            "Batch size exceeds maximum of {} events",
            max
        )));
    }

    let now = Utc::now().timestamp_millis();
    let mut records = Vec::with_capacity(req.events.len());
    let mut errors = Vec::new();

    for (index, event_req) in req.events.into_iter().enumerate() {
        match to_event(event_req, now) {
            Ok(event) => records.push(ActivityRecord::from(event)),
            Err(e) => errors.push(BatchError {
                index,
                error: e.to_string(),
            }),
        }
    }

    if !records.is_empty() {
        let mut log = state.activity_log.lock().await;
        log.append_batch(&records)?;
    }

    let accepted = records.len();
    let (status, status_str) = if errors.is_empty() {
        (StatusCode::CREATED, "ok")
    } else if accepted > 0 {
        (StatusCode::MULTI_STATUS, "partial")
    } else {
        (StatusCode::BAD_REQUEST, "rejected")
    };

    tracing::info!(accepted, rejected = errors.len(), "Batch activity ingest");

    Ok((
        status,
        Json(BatchActivityResponse {
            status: status_str.to_string(),
            accepted,
            rejected: errors.len(),
            errors,
        }),
    ))
}

/// Validate a request and turn it into an event
fn to_event(req: ActivityRequest, now: i64) -> ApiResult<ActivityEvent> {
    validate_activity_request(&req, now)?;

    let mut event = ActivityEvent::with_timestamp(req.user_id.trim(), req.timestamp.unwrap_or(now));
    if let Some(action) = req.action.filter(|a| !a.trim().is_empty()) {
        event = event.action(action.trim());
    }
    Ok(event)
}

/// Validate an activity request against the current time
fn validate_activity_request(req: &ActivityRequest, now: i64) -> ApiResult<()> {
    let user_id = req.user_id.trim();
    if user_id.is_empty() {
        return Err(ApiError::Validation("User id cannot be empty".to_string()));
    }
    if user_id.len() > MAX_USER_ID_LEN {
        return Err(ApiError::Validation(format!(
            "User id exceeds maximum length of {} characters",
            MAX_USER_ID_LEN
        )));
    }

    if let Some(action) = &req.action {
        if action.len() > MAX_ACTION_LEN {
            return Err(ApiError::Validation(format!(
                "Action exceeds maximum length of {} characters",
                MAX_ACTION_LEN
            )));
        }
    }

    if let Some(ts) = req.timestamp {
        let one_day_ms = 24 * 60 * 60 * 1000_i64;
        let ten_years_ms = one_day_ms * 365 * 10;

        if ts < now - ten_years_ms {
            return Err(ApiError::Validation(
                "Timestamp is more than 10 years in the past".to_string(),
            ));
        }
        if ts > now + one_day_ms {
            return Err(ApiError::Validation(
                "Timestamp is more than 1 day in the future".to_string(),
            ));
        }
    }

    Ok(())
}
