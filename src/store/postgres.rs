// src/store/postgres.rs

use async_trait::async_trait;
use sqlx::PgPool;

use super::{RetentionPolicy, ScoreStore};
use crate::{error::StoreError, models::score_entry::ScoreEntry};

/// Postgres-backed store over the `score_entries` table.
///
/// Every upsert is a single transaction keyed on the `(user_id, topic_id)`
/// primary key, so Postgres row locking serializes writers to the same key and
/// a dropped future rolls back. `submitted_at` comes from `clock_timestamp()`.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScoreStore for PgStore {
    async fn upsert(
        &self,
        entry: ScoreEntry,
        policy: RetentionPolicy,
    ) -> Result<ScoreEntry, StoreError> {
        let mut tx = self.pool.begin().await?;

        let written = match policy {
            RetentionPolicy::LatestWins => {
                sqlx::query_as::<_, ScoreEntry>(
                    r#"
                    INSERT INTO score_entries
                        (user_id, topic_id, username, score, total_questions, completed_at, submitted_at)
                    VALUES ($1, $2, $3, $4, $5, $6, clock_timestamp())
                    ON CONFLICT (user_id, topic_id) DO UPDATE SET
                        username = EXCLUDED.username,
                        score = EXCLUDED.score,
                        total_questions = EXCLUDED.total_questions,
                        completed_at = EXCLUDED.completed_at,
                        submitted_at = EXCLUDED.submitted_at
                    RETURNING user_id, username, topic_id, score, total_questions, completed_at, submitted_at
                    "#,
                )
                .bind(&entry.user_id)
                .bind(&entry.topic_id)
                .bind(&entry.username)
                .bind(entry.score)
                .bind(entry.total_questions)
                .bind(entry.completed_at)
                .fetch_optional(&mut *tx)
                .await?
            }
            // Same ordering as `RankKey`: higher rounded percentage, then earlier completion.
            // NUMERIC so the percentage math cannot overflow BIGINT.
            RetentionPolicy::KeepBest => {
                sqlx::query_as::<_, ScoreEntry>(
                    r#"
                    INSERT INTO score_entries
                        (user_id, topic_id, username, score, total_questions, completed_at, submitted_at)
                    VALUES ($1, $2, $3, $4, $5, $6, clock_timestamp())
                    ON CONFLICT (user_id, topic_id) DO UPDATE SET
                        username = EXCLUDED.username,
                        score = EXCLUDED.score,
                        total_questions = EXCLUDED.total_questions,
                        completed_at = EXCLUDED.completed_at,
                        submitted_at = EXCLUDED.submitted_at
                    WHERE
                        div(200 * EXCLUDED.score::NUMERIC + EXCLUDED.total_questions, 2 * EXCLUDED.total_questions::NUMERIC)
                            > div(200 * score_entries.score::NUMERIC + score_entries.total_questions, 2 * score_entries.total_questions::NUMERIC)
                        OR (
                            div(200 * EXCLUDED.score::NUMERIC + EXCLUDED.total_questions, 2 * EXCLUDED.total_questions::NUMERIC)
                                = div(200 * score_entries.score::NUMERIC + score_entries.total_questions, 2 * score_entries.total_questions::NUMERIC)
                            AND EXCLUDED.completed_at < score_entries.completed_at
                        )
                    RETURNING user_id, username, topic_id, score, total_questions, completed_at, submitted_at
                    "#,
                )
                .bind(&entry.user_id)
                .bind(&entry.topic_id)
                .bind(&entry.username)
                .bind(entry.score)
                .bind(entry.total_questions)
                .bind(entry.completed_at)
                .fetch_optional(&mut *tx)
                .await?
            }
        };

        let stored = match written {
            Some(row) => row,
            // The guard rejected the update; the conflicting row is locked by this tx.
            None => {
                sqlx::query_as::<_, ScoreEntry>(
                    r#"
                    SELECT user_id, username, topic_id, score, total_questions, completed_at, submitted_at
                    FROM score_entries
                    WHERE user_id = $1 AND topic_id = $2
                    "#,
                )
                .bind(&entry.user_id)
                .bind(&entry.topic_id)
                .fetch_one(&mut *tx)
                .await?
            }
        };

        tx.commit().await?;

        tracing::debug!(
            user_id = %stored.user_id,
            topic_id = %stored.topic_id,
            "Committed score entry"
        );

        Ok(stored)
    }

    async fn entries_for_topic(&self, topic_id: &str) -> Result<Vec<ScoreEntry>, StoreError> {
        let entries = sqlx::query_as::<_, ScoreEntry>(
            r#"
            SELECT user_id, username, topic_id, score, total_questions, completed_at, submitted_at
            FROM score_entries
            WHERE topic_id = $1
            "#,
        )
        .bind(topic_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn get(&self, user_id: &str, topic_id: &str) -> Result<Option<ScoreEntry>, StoreError> {
        let entry = sqlx::query_as::<_, ScoreEntry>(
            r#"
            SELECT user_id, username, topic_id, score, total_questions, completed_at, submitted_at
            FROM score_entries
            WHERE user_id = $1 AND topic_id = $2
            "#,
        )
        .bind(user_id)
        .bind(topic_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    async fn topics(&self) -> Result<Vec<String>, StoreError> {
        // Byte-wise collation, so the order matches the in-memory store.
        let topics = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT topic_id COLLATE "C" AS topic_id
            FROM score_entries
            ORDER BY topic_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(topics)
    }

    async fn count_for_topic(&self, topic_id: &str) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM score_entries WHERE topic_id = $1",
        )
        .bind(topic_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
