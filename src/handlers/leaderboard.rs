// src/handlers/leaderboard.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::{
        leaderboard::{
            AppliedFilters, LeaderboardParams, LeaderboardResponse, StandingResponse,
            SubmitResponse,
        },
        score_entry::ScoreSubmissionInput,
    },
    service::Leaderboard,
};

/// Records a completed quiz and returns the submitter's rank in the topic.
///
/// * Rejects invalid submissions and unreadable bodies with 400 before anything is stored.
/// * Returns 201 with the ranked entry and the topic's entry count.
pub async fn submit_score(
    State(leaderboard): State<Arc<Leaderboard>>,
    body: Result<Json<ScoreSubmissionInput>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(input) = body?;
    let outcome = leaderboard.submit(input).await?;

    tracing::info!(
        user_id = %outcome.entry.entry.user_id,
        topic_id = %outcome.entry.entry.topic_id,
        rank = outcome.entry.rank,
        "Score submitted"
    );

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            position: outcome.entry.rank,
            entry: outcome.entry,
            total_entries: outcome.total_entries,
        }),
    ))
}

/// Lists ranked entries, optionally filtered by topic.
///
/// `limit` defaults to the configured value and is clamped to the configured
/// maximum. An empty `topicId` is treated as absent.
pub async fn get_leaderboard(
    State(leaderboard): State<Arc<Leaderboard>>,
    query: Result<Query<LeaderboardParams>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(params) = query?;
    let topic_id = params
        .topic_id
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let outcome = leaderboard.query(topic_id, params.limit).await?;

    Ok(Json(LeaderboardResponse {
        count: outcome.entries.len(),
        entries: outcome.entries,
        total_entries: outcome.total_entries,
        filters: AppliedFilters {
            topic_id: outcome.topic_id.unwrap_or_else(|| "all".to_string()),
            limit: outcome.limit.get(),
        },
    }))
}

/// Returns one user's current rank in a topic; `entry` is null when they have none yet.
pub async fn get_standing(
    State(leaderboard): State<Arc<Leaderboard>>,
    Path((topic_id, user_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let standing = leaderboard.standing(&topic_id, &user_id).await?;

    Ok(Json(StandingResponse {
        entry: standing.entry,
        total_entries: standing.total_entries,
    }))
}
