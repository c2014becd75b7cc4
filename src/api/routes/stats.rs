//! Stats Routes
//!
//! Dashboard statistics computed from the activity log.
//!
//! - GET /api/v1/stats/weekly - 7-day daily-active-user series
//! - GET /api/v1/stats/dashboard - Dashboard summary

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::activity::{ActivityResult, Records};
use crate::analytics::{DashboardStats, WeeklyActivity};
use crate::api::dto::StatsParams;
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;

/// GET /api/v1/stats/weekly
pub async fn weekly_activity(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StatsParams>,
) -> ApiResult<Json<WeeklyActivity>> {
    let now = resolve_now(params.now.as_deref())?;
    let aggregator = state.aggregator;

    let weekly = over_log(&state, move |records| aggregator.try_aggregate(now, records)).await?;
    Ok(Json(weekly))
}

/// GET /api/v1/stats/dashboard
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StatsParams>,
) -> ApiResult<Json<DashboardStats>> {
    let now = resolve_now(params.now.as_deref())?;
    let aggregator = state.aggregator;

    let stats = over_log(&state, move |records| {
        DashboardStats::try_build(&aggregator, now, records)
    })
    .await?;
    Ok(Json(stats))
}

/// Stream a snapshot of the log through `f` on the blocking pool
///
/// Only the snapshot is taken under the log lock, ingest continues while
/// the records are read.
async fn over_log<T, F>(state: &AppState, f: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(Records) -> ActivityResult<T> + Send + 'static,
{
    let snapshot = state.log_snapshot().await?;

    let result = tokio::task::spawn_blocking(move || f(snapshot.records()?))
        .await
        .map_err(|e| ApiError::Internal(format!("Stats task failed: {}", e)))??;
    Ok(result)
}

/// Parse the optional `now` override
fn resolve_now(now: Option<&str>) -> ApiResult<DateTime<Utc>> {
    match now {
        None => Ok(Utc::now()),
        Some(text) => DateTime::parse_from_rfc3339(text)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| ApiError::Validation(format!("Invalid 'now' parameter '{}': {}", text, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_resolve_now() {
        assert_eq!(
            resolve_now(Some("2024-03-10T12:00:00+09:00")).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 10, 3, 0, 0).unwrap()
        );
        assert!(resolve_now(Some("tomorrow")).is_err());
        assert!(resolve_now(None).is_ok());
    }
}
