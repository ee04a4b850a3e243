// src/service.rs

use std::{future::Future, sync::Arc, time::Duration};

use chrono::Utc;

use crate::{
    error::{LeaderboardError, ValidationError, ValidationReason},
    models::score_entry::{RankedEntry, ScoreSubmissionInput},
    ranking::{Limit, RankingEngine, Standing},
    store::{RetentionPolicy, ScoreStore},
    validation::validate,
};

/// The leaderboard's view of the service configuration.
#[derive(Debug, Clone)]
pub struct LeaderboardSettings {
    /// Used when a query does not specify a limit.
    pub default_limit: i64,
    /// Larger limits are clamped to this.
    pub max_limit: usize,
    pub retention: RetentionPolicy,
    /// Applied to every operation that is not given an explicit deadline.
    pub deadline: Duration,
}

impl Default for LeaderboardSettings {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
            retention: RetentionPolicy::LatestWins,
            deadline: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub entry: RankedEntry,
    pub total_entries: i64,
}

#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub entries: Vec<RankedEntry>,
    pub total_entries: i64,
    /// `None` when all topics were queried.
    pub topic_id: Option<String>,
    pub limit: Limit,
}

/// Entry point for score submissions and leaderboard queries.
///
/// Validates input, writes through the store and asks the ranking engine for
/// positions. Errors are returned, never logged here.
pub struct Leaderboard {
    store: Arc<dyn ScoreStore>,
    engine: RankingEngine,
    settings: LeaderboardSettings,
}

impl Leaderboard {
    pub fn new(store: Arc<dyn ScoreStore>, settings: LeaderboardSettings) -> Self {
        Self {
            engine: RankingEngine::new(store.clone()),
            store,
            settings,
        }
    }

    pub fn engine(&self) -> &RankingEngine {
        &self.engine
    }

    pub async fn submit(&self, input: ScoreSubmissionInput) -> Result<SubmitOutcome, LeaderboardError> {
        self.submit_within(input, self.settings.deadline).await
    }

    /// Validates and stores a submission, then ranks the stored entry.
    ///
    /// Under `KeepBest` the returned entry may be the previously stored one.
    pub async fn submit_within(
        &self,
        input: ScoreSubmissionInput,
        deadline: Duration,
    ) -> Result<SubmitOutcome, LeaderboardError> {
        let entry = validate(&input, Utc::now())?;

        within(deadline, async {
            let stored = self.store.upsert(entry, self.settings.retention).await?;
            let standing = self.engine.standing(&stored.topic_id, &stored.user_id).await?;
            let entry = standing.entry.ok_or_else(|| {
                LeaderboardError::Inconsistent(format!(
                    "entry for user '{}' in topic '{}' not visible after commit",
                    stored.user_id, stored.topic_id
                ))
            })?;

            Ok::<_, LeaderboardError>(SubmitOutcome {
                entry,
                total_entries: standing.total_entries,
            })
        })
        .await
    }

    pub async fn query(
        &self,
        topic_id: Option<&str>,
        limit: Option<i64>,
    ) -> Result<QueryOutcome, LeaderboardError> {
        self.query_within(topic_id, limit, self.settings.deadline).await
    }

    /// Ranked entries for one topic, or for every topic when `topic_id` is `None`.
    ///
    /// Without a topic the result is each topic's ranked range concatenated in
    /// ascending topic order. Ranks stay local to their topic and `limit`
    /// applies per topic; there is no ordering across topics.
    pub async fn query_within(
        &self,
        topic_id: Option<&str>,
        limit: Option<i64>,
        deadline: Duration,
    ) -> Result<QueryOutcome, LeaderboardError> {
        let limit = Limit::new(
            limit.unwrap_or(self.settings.default_limit),
            self.settings.max_limit,
        )?;
        if topic_id.is_some_and(|t| t.trim().is_empty()) {
            return Err(ValidationError::new("topicId", ValidationReason::MissingField).into());
        }

        within(deadline, async {
            match topic_id {
                Some(topic_id) => {
                    let range = self.engine.ranked_range(topic_id, limit).await?;
                    Ok::<_, LeaderboardError>(QueryOutcome {
                        entries: range.entries,
                        total_entries: range.total_entries,
                        topic_id: Some(topic_id.to_string()),
                        limit,
                    })
                }
                None => {
                    let mut entries = Vec::new();
                    let mut total_entries = 0;
                    for topic in self.store.topics().await? {
                        let range = self.engine.ranked_range(&topic, limit).await?;
                        entries.extend(range.entries);
                        total_entries += range.total_entries;
                    }
                    Ok(QueryOutcome {
                        entries,
                        total_entries,
                        topic_id: None,
                        limit,
                    })
                }
            }
        })
        .await
    }

    /// A single user's rank in a topic. A missing entry is not an error.
    pub async fn standing(&self, topic_id: &str, user_id: &str) -> Result<Standing, LeaderboardError> {
        within(self.settings.deadline, async {
            Ok::<_, LeaderboardError>(self.engine.standing(topic_id, user_id).await?)
        })
        .await
    }
}

async fn within<T, F>(deadline: Duration, operation: F) -> Result<T, LeaderboardError>
where
    F: Future<Output = Result<T, LeaderboardError>>,
{
    tokio::time::timeout(deadline, operation)
        .await
        .map_err(|_| LeaderboardError::DeadlineExceeded)?
}
