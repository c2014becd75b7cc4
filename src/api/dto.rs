//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use serde::{Deserialize, Serialize};

// ============================================
// ACTIVITY DTOs
// ============================================

/// Single activity ingest request
#[derive(Debug, Clone, Deserialize)]
pub struct ActivityRequest {
    /// Acting user
    #[serde(alias = "userId")]
    pub user_id: String,
    /// Optional action label
    #[serde(default)]
    pub action: Option<String>,
    /// Optional timestamp (ms since epoch), defaults to now
    #[serde(default)]
    pub timestamp: Option<i64>,
}

/// Single activity ingest response
#[derive(Debug, Serialize)]
pub struct ActivityResponse {
    /// Status: "ok"
    pub status: String,
    /// Timestamp recorded for the event
    pub timestamp: i64,
}

/// Batch ingest request
#[derive(Debug, Deserialize)]
pub struct BatchActivityRequest {
    /// Events to record
    pub events: Vec<ActivityRequest>,
}

/// Batch ingest response
#[derive(Debug, Serialize)]
pub struct BatchActivityResponse {
    /// Status: "ok", "partial" or "rejected"
    pub status: String,
    /// Number of events accepted
    pub accepted: usize,
    /// Number of events rejected
    pub rejected: usize,
    /// Errors for rejected events
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<BatchError>,
}

/// Error for a single event in batch ingest
#[derive(Debug, Serialize)]
pub struct BatchError {
    /// Index of the failed event
    pub index: usize,
    /// Error message
    pub error: String,
}

// ============================================
// STATS DTOs
// ============================================

/// Query parameters shared by the stats endpoints
#[derive(Debug, Default, Deserialize)]
pub struct StatsParams {
    /// Evaluate the window as of this RFC 3339 instant instead of now
    #[serde(default)]
    pub now: Option<String>,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Full health response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// "healthy" or "unhealthy"
    pub status: String,
    /// Activity log component status
    pub activity_log: String,
    /// Records in the activity log
    pub logged_events: u64,
    /// Seconds since the server started
    pub uptime_seconds: u64,
    /// Server version
    pub version: String,
}
