// src/ranking.rs

use std::sync::Arc;

use crate::{
    error::{StoreError, ValidationError, ValidationReason},
    models::score_entry::{RankedEntry, ScoreEntry},
    store::ScoreStore,
};

/// A validated result-count limit: at least 1, at most the configured maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit(usize);

impl Limit {
    /// Rejects `raw <= 0`; clamps anything above `max` down to `max`.
    pub fn new(raw: i64, max: usize) -> Result<Self, ValidationError> {
        if raw <= 0 {
            return Err(ValidationError::new("limit", ValidationReason::InvalidRange));
        }
        let raw = usize::try_from(raw).unwrap_or(usize::MAX);
        Ok(Self(raw.min(max.max(1))))
    }

    pub fn get(self) -> usize {
        self.0
    }
}

/// One user's position in a topic, read from a single snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing {
    /// `None` when the user has no entry for the topic ("no rank yet").
    pub entry: Option<RankedEntry>,
    pub total_entries: i64,
}

/// The first entries of a topic in ranked order, read from a single snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedRange {
    pub entries: Vec<RankedEntry>,
    pub total_entries: i64,
}

/// Computes ranks over topic partitions held by a `ScoreStore`.
///
/// Holds no state of its own. Every call reads a fresh snapshot of the
/// partition, so results are restartable and never stale beyond that read.
/// Rank is `1 + number of entries with a strictly higher percentage`; within
/// equal percentages entries are ordered by `RankKey` but share the rank.
#[derive(Clone)]
pub struct RankingEngine {
    store: Arc<dyn ScoreStore>,
}

impl RankingEngine {
    pub fn new(store: Arc<dyn ScoreStore>) -> Self {
        Self { store }
    }

    pub async fn rank_of(
        &self,
        topic_id: &str,
        user_id: &str,
    ) -> Result<Option<RankedEntry>, StoreError> {
        Ok(self.standing(topic_id, user_id).await?.entry)
    }

    pub async fn standing(&self, topic_id: &str, user_id: &str) -> Result<Standing, StoreError> {
        let snapshot = self.store.entries_for_topic(topic_id).await?;
        Ok(standing_in(snapshot, user_id))
    }

    pub async fn top_range(
        &self,
        topic_id: &str,
        limit: Limit,
    ) -> Result<Vec<RankedEntry>, StoreError> {
        Ok(self.ranked_range(topic_id, limit).await?.entries)
    }

    /// Like `top_range`, plus the partition size from the same snapshot.
    pub async fn ranked_range(&self, topic_id: &str, limit: Limit) -> Result<RankedRange, StoreError> {
        let snapshot = self.store.entries_for_topic(topic_id).await?;
        let total_entries = snapshot.len() as i64;
        Ok(RankedRange {
            entries: rank_top(snapshot, limit.get()),
            total_entries,
        })
    }

    pub async fn total_entries(&self, topic_id: &str) -> Result<i64, StoreError> {
        self.store.count_for_topic(topic_id).await
    }
}

/// Ranks the `limit` best entries of a partition snapshot.
///
/// Only the leading `limit` entries are fully sorted. Everything ranked above
/// an entry lies in that prefix, so prefix positions are enough to assign ranks.
pub fn rank_top(mut entries: Vec<ScoreEntry>, limit: usize) -> Vec<RankedEntry> {
    if limit == 0 {
        return Vec::new();
    }
    if limit < entries.len() {
        entries.select_nth_unstable_by(limit - 1, |a, b| a.rank_key().cmp(&b.rank_key()));
        entries.truncate(limit);
    }
    entries.sort_unstable_by(|a, b| a.rank_key().cmp(&b.rank_key()));

    let mut ranked = Vec::with_capacity(entries.len());
    let mut rank = 0;
    let mut previous = None;
    for (position, entry) in entries.into_iter().enumerate() {
        let percentage = entry.percentage();
        if previous != Some(percentage) {
            rank = position as i64 + 1;
            previous = Some(percentage);
        }
        ranked.push(RankedEntry::new(entry, rank));
    }
    ranked
}

/// Locates one user in a partition snapshot. Single pass, no sort.
fn standing_in(mut snapshot: Vec<ScoreEntry>, user_id: &str) -> Standing {
    let total_entries = snapshot.len() as i64;
    let Some(index) = snapshot.iter().position(|e| e.user_id == user_id) else {
        return Standing {
            entry: None,
            total_entries,
        };
    };

    let percentage = snapshot[index].percentage();
    let ahead = snapshot.iter().filter(|e| e.percentage() > percentage).count() as i64;
    let entry = RankedEntry::new(snapshot.swap_remove(index), ahead + 1);

    Standing {
        entry: Some(entry),
        total_entries,
    }
}
