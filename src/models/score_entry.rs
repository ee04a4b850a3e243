// src/models/score_entry.rs

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Raw score submission as received from the transport layer.
///
/// Every field is optional so that a missing value is reported by the
/// validator as a typed error instead of an opaque deserialization failure.
/// Numbers are kept as `serde_json::Number` for the same reason: `9.5` must
/// reach the validator and be rejected there.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSubmissionInput {
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub topic_id: Option<String>,
    pub score: Option<serde_json::Number>,
    pub total_questions: Option<serde_json::Number>,
    /// RFC 3339 timestamp. Defaults to the submission time when absent or empty.
    pub completed_at: Option<String>,
}

impl ScoreSubmissionInput {
    /// Builds a fully populated submission without a completion time.
    pub fn new(
        user_id: impl Into<String>,
        username: impl Into<String>,
        topic_id: impl Into<String>,
        score: i64,
        total_questions: i64,
    ) -> Self {
        Self {
            user_id: Some(user_id.into()),
            username: Some(username.into()),
            topic_id: Some(topic_id.into()),
            score: Some(score.into()),
            total_questions: Some(total_questions.into()),
            completed_at: None,
        }
    }

    pub fn completed_at(mut self, completed_at: DateTime<Utc>) -> Self {
        self.completed_at = Some(completed_at.to_rfc3339());
        self
    }
}

/// One user's current entry for one topic.
/// Maps 1:1 to a row of the `score_entries` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntry {
    pub user_id: String,
    pub username: String,
    pub topic_id: String,
    pub score: i64,
    pub total_questions: i64,
    pub completed_at: DateTime<Utc>,

    /// Stamped by the store at commit time; whatever the caller puts here is overwritten.
    pub submitted_at: DateTime<Utc>,
}

impl ScoreEntry {
    /// `round(100 * score / total_questions)`, rounding halves up.
    ///
    /// Integer arithmetic only, so equal ratios always produce equal percentages.
    /// Widened to `i128` so any pair of valid `i64` inputs is safe.
    pub fn percentage(&self) -> i64 {
        if self.total_questions <= 0 {
            return 0;
        }
        let score = i128::from(self.score);
        let total = i128::from(self.total_questions);
        ((200 * score + total) / (2 * total)) as i64
    }

    pub fn rank_key(&self) -> RankKey<'_> {
        RankKey {
            percentage: self.percentage(),
            completed_at: self.completed_at,
            user_id: &self.user_id,
        }
    }
}

/// Total ordering of entries inside a topic partition.
///
/// Sorts by percentage descending, then completion time ascending. The user id
/// is the last resort so that the order never depends on iteration order of
/// whatever collection the entries came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankKey<'a> {
    pub percentage: i64,
    pub completed_at: DateTime<Utc>,
    pub user_id: &'a str,
}

impl Ord for RankKey<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .percentage
            .cmp(&self.percentage)
            .then_with(|| self.completed_at.cmp(&other.completed_at))
            .then_with(|| self.user_id.cmp(other.user_id))
    }
}

impl PartialOrd for RankKey<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A `ScoreEntry` together with its position in the topic partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedEntry {
    #[serde(flatten)]
    pub entry: ScoreEntry,
    pub percentage: i64,
    /// 1-based. Entries with the same percentage share a rank.
    pub rank: i64,
}

impl RankedEntry {
    pub fn new(entry: ScoreEntry, rank: i64) -> Self {
        Self {
            percentage: entry.percentage(),
            entry,
            rank,
        }
    }
}
