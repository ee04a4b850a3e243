// src/store/mod.rs

pub mod memory;
pub mod postgres;

use std::{fmt, str::FromStr};

use async_trait::async_trait;

use crate::{error::StoreError, models::score_entry::ScoreEntry};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// What happens when a user submits again for a topic they already have an entry in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RetentionPolicy {
    /// The latest attempt replaces the stored one unconditionally.
    #[default]
    LatestWins,
    /// The stored entry is replaced only by an entry that ranks strictly ahead of it.
    KeepBest,
}

impl RetentionPolicy {
    /// Whether `candidate` should replace `current` under this policy.
    pub fn replaces(self, current: &ScoreEntry, candidate: &ScoreEntry) -> bool {
        match self {
            RetentionPolicy::LatestWins => true,
            RetentionPolicy::KeepBest => candidate.rank_key() < current.rank_key(),
        }
    }
}

impl FromStr for RetentionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "latest" | "latest_wins" => Ok(RetentionPolicy::LatestWins),
            "best" | "keep_best" => Ok(RetentionPolicy::KeepBest),
            other => Err(format!("unknown retention policy '{}'", other)),
        }
    }
}

impl fmt::Display for RetentionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetentionPolicy::LatestWins => f.write_str("latest"),
            RetentionPolicy::KeepBest => f.write_str("best"),
        }
    }
}

/// Durable storage of one entry per `(user_id, topic_id)`.
///
/// Implementations must make `upsert` atomic: concurrent upserts for the same
/// key serialize, and a dropped (cancelled) upsert leaves either the old or the
/// new entry, never a mix. Reads return consistent snapshots.
#[async_trait]
pub trait ScoreStore: Send + Sync {
    /// Inserts or replaces the entry for `(entry.user_id, entry.topic_id)`
    /// according to `policy`, and returns what is stored afterwards with
    /// `submitted_at` stamped at commit time.
    async fn upsert(
        &self,
        entry: ScoreEntry,
        policy: RetentionPolicy,
    ) -> Result<ScoreEntry, StoreError>;

    /// Snapshot of every entry in one topic partition, in no particular order.
    async fn entries_for_topic(&self, topic_id: &str) -> Result<Vec<ScoreEntry>, StoreError>;

    async fn get(&self, user_id: &str, topic_id: &str) -> Result<Option<ScoreEntry>, StoreError>;

    /// Ids of all non-empty topic partitions, ascending.
    async fn topics(&self) -> Result<Vec<String>, StoreError>;

    async fn count_for_topic(&self, topic_id: &str) -> Result<i64, StoreError> {
        Ok(self.entries_for_topic(topic_id).await?.len() as i64)
    }
}
