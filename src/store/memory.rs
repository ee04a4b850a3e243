// src/store/memory.rs

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{RetentionPolicy, ScoreStore};
use crate::{error::StoreError, models::score_entry::ScoreEntry};

type Partition = BTreeMap<String, ScoreEntry>;

/// Process-local store, used when no database is configured and in tests.
///
/// Partitions are keyed by topic id, entries inside a partition by user id.
/// Mutations happen entirely while the write guard is held and contain no
/// `.await`, so a cancelled upsert either never acquired the lock or fully applied.
#[derive(Debug, Default)]
pub struct MemoryStore {
    topics: RwLock<BTreeMap<String, Partition>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScoreStore for MemoryStore {
    async fn upsert(
        &self,
        mut entry: ScoreEntry,
        policy: RetentionPolicy,
    ) -> Result<ScoreEntry, StoreError> {
        let mut topics = self.topics.write().await;
        let partition = topics.entry(entry.topic_id.clone()).or_default();

        if let Some(current) = partition.get(&entry.user_id) {
            if !policy.replaces(current, &entry) {
                tracing::debug!(
                    user_id = %entry.user_id,
                    topic_id = %entry.topic_id,
                    "Kept existing entry under {} policy",
                    policy
                );
                return Ok(current.clone());
            }
        }

        // Stamped under the lock so commit order and submitted_at agree.
        entry.submitted_at = Utc::now();
        partition.insert(entry.user_id.clone(), entry.clone());
        Ok(entry)
    }

    async fn entries_for_topic(&self, topic_id: &str) -> Result<Vec<ScoreEntry>, StoreError> {
        let topics = self.topics.read().await;
        Ok(topics
            .get(topic_id)
            .map(|partition| partition.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn get(&self, user_id: &str, topic_id: &str) -> Result<Option<ScoreEntry>, StoreError> {
        let topics = self.topics.read().await;
        Ok(topics
            .get(topic_id)
            .and_then(|partition| partition.get(user_id))
            .cloned())
    }

    async fn topics(&self) -> Result<Vec<String>, StoreError> {
        let topics = self.topics.read().await;
        Ok(topics.keys().cloned().collect())
    }

    async fn count_for_topic(&self, topic_id: &str) -> Result<i64, StoreError> {
        let topics = self.topics.read().await;
        Ok(topics.get(topic_id).map_or(0, |p| p.len() as i64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone};
    use std::sync::Arc;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap()
    }

    fn entry(user: &str, topic: &str, score: i64, hour: u32) -> ScoreEntry {
        ScoreEntry {
            user_id: user.to_string(),
            username: format!("{}-name", user),
            topic_id: topic.to_string(),
            score,
            total_questions: 10,
            completed_at: at(hour),
            submitted_at: at(0),
        }
    }

    #[tokio::test]
    async fn upsert_stamps_submitted_at() {
        let store = MemoryStore::new();
        let before = Utc::now();

        let stored = store
            .upsert(entry("a", "t", 5, 1), RetentionPolicy::LatestWins)
            .await
            .unwrap();

        assert!(stored.submitted_at >= before);
        assert_eq!(store.get("a", "t").await.unwrap(), Some(stored));
    }

    #[tokio::test]
    async fn latest_submission_replaces_previous() {
        let store = MemoryStore::new();
        store.upsert(entry("a", "t", 9, 1), RetentionPolicy::LatestWins).await.unwrap();
        store.upsert(entry("a", "t", 3, 2), RetentionPolicy::LatestWins).await.unwrap();

        let entries = store.entries_for_topic("t").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].score, 3);
    }

    #[tokio::test]
    async fn keep_best_returns_existing_entry_unchanged() {
        let store = MemoryStore::new();
        let first = store.upsert(entry("a", "t", 9, 1), RetentionPolicy::KeepBest).await.unwrap();
        let second = store.upsert(entry("a", "t", 3, 2), RetentionPolicy::KeepBest).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.get("a", "t").await.unwrap().unwrap().score, 9);
    }

    #[tokio::test]
    async fn partitions_are_isolated_and_listed_in_order() {
        let store = MemoryStore::new();
        store.upsert(entry("a", "zeta", 1, 1), RetentionPolicy::LatestWins).await.unwrap();
        store.upsert(entry("a", "alpha", 1, 1), RetentionPolicy::LatestWins).await.unwrap();
        store.upsert(entry("b", "alpha", 1, 1), RetentionPolicy::LatestWins).await.unwrap();

        assert_eq!(store.topics().await.unwrap(), vec!["alpha", "zeta"]);
        assert_eq!(store.count_for_topic("alpha").await.unwrap(), 2);
        assert_eq!(store.count_for_topic("zeta").await.unwrap(), 1);
        assert_eq!(store.count_for_topic("missing").await.unwrap(), 0);
        assert!(store.get("b", "zeta").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn concurrent_upserts_for_one_key_keep_a_single_whole_entry() {
        let store = Arc::new(MemoryStore::new());
        let mut handles = Vec::new();
        for i in 0..32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let mut e = entry("same", "t", i % 11, (i % 24) as u32);
                e.username = format!("name-{}", i);
                store.upsert(e, RetentionPolicy::LatestWins).await.unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let entries = store.entries_for_topic("t").await.unwrap();
        assert_eq!(entries.len(), 1);

        // Fields must all come from the same submission.
        let stored = &entries[0];
        let i: i64 = stored.username.trim_start_matches("name-").parse().unwrap();
        assert_eq!(stored.score, i % 11);
        assert_eq!(stored.completed_at, at((i % 24) as u32));
    }
}
