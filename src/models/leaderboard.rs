// src/models/leaderboard.rs

use serde::{Deserialize, Serialize};

use crate::models::score_entry::RankedEntry;

/// Query string for `GET /leaderboard`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardParams {
    pub topic_id: Option<String>,
    pub limit: Option<i64>,
}

/// Response body for a successful score submission.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub entry: RankedEntry,
    /// Same value as `entry.rank`, kept for older clients.
    pub position: i64,
    pub total_entries: i64,
}

/// Echo of the effective filters applied to a leaderboard query.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedFilters {
    /// The requested topic, or `"all"`.
    pub topic_id: String,
    /// Limit after defaulting and clamping.
    pub limit: usize,
}

/// Response body for `GET /leaderboard`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardResponse {
    pub entries: Vec<RankedEntry>,
    pub count: usize,
    pub total_entries: i64,
    pub filters: AppliedFilters,
}

/// Response body for a single user's standing. `entry` is `null` when the
/// user has not submitted anything for the topic yet.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingResponse {
    pub entry: Option<RankedEntry>,
    pub total_entries: i64,
}
