// tests/pg_store_tests.rs
//
// Runs against the database in DATABASE_URL. Each test returns early when it is unset.

use chrono::{TimeZone, Utc};
use quiz_leaderboard::{
    models::score_entry::ScoreEntry,
    ranking::{Limit, RankingEngine},
    store::{PgStore, RetentionPolicy, ScoreStore},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

async fn connect() -> Option<PgStore> {
    let database_url = std::env::var("DATABASE_URL").ok()?;

    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    Some(PgStore::new(pool))
}

fn entry(user: &str, topic: &str, score: i64, hour: u32) -> ScoreEntry {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap();
    ScoreEntry {
        user_id: user.to_string(),
        username: format!("{}_name", user),
        topic_id: topic.to_string(),
        score,
        total_questions: 10,
        completed_at: at,
        submitted_at: at,
    }
}

fn unique_topic() -> String {
    format!("pg_{}", &uuid::Uuid::new_v4().to_string()[..8])
}

#[tokio::test]
async fn upsert_replaces_and_stamps_submitted_at() {
    let Some(store) = connect().await else { return };
    let topic = unique_topic();

    let first = store
        .upsert(entry("alice", &topic, 9, 10), RetentionPolicy::LatestWins)
        .await
        .unwrap();
    let second = store
        .upsert(entry("alice", &topic, 3, 11), RetentionPolicy::LatestWins)
        .await
        .unwrap();

    assert_eq!(second.score, 3);
    assert!(second.submitted_at >= first.submitted_at);
    assert_ne!(second.submitted_at, entry("alice", &topic, 3, 11).submitted_at);
    assert_eq!(store.count_for_topic(&topic).await.unwrap(), 1);
    assert_eq!(store.get("alice", &topic).await.unwrap(), Some(second));
}

#[tokio::test]
async fn keep_best_keeps_higher_score() {
    let Some(store) = connect().await else { return };
    let topic = unique_topic();

    store.upsert(entry("alice", &topic, 9, 10), RetentionPolicy::KeepBest).await.unwrap();
    let kept = store
        .upsert(entry("alice", &topic, 5, 11), RetentionPolicy::KeepBest)
        .await
        .unwrap();
    assert_eq!(kept.score, 9);

    let improved = store
        .upsert(entry("alice", &topic, 9, 8), RetentionPolicy::KeepBest)
        .await
        .unwrap();
    assert_eq!(improved.completed_at, entry("alice", &topic, 9, 8).completed_at);
}

#[tokio::test]
async fn engine_ranks_postgres_snapshot() {
    let Some(store) = connect().await else { return };
    let topic = unique_topic();

    for (user, score, hour) in [("alice", 9, 10), ("bob", 9, 9), ("carol", 8, 11)] {
        store.upsert(entry(user, &topic, score, hour), RetentionPolicy::LatestWins).await.unwrap();
    }

    let engine = RankingEngine::new(Arc::new(store.clone()));
    let top = engine.top_range(&topic, Limit::new(10, 100).unwrap()).await.unwrap();
    let ranked: Vec<(&str, i64)> = top.iter().map(|r| (r.entry.user_id.as_str(), r.rank)).collect();

    assert_eq!(ranked, vec![("bob", 1), ("alice", 1), ("carol", 3)]);
    assert!(store.topics().await.unwrap().contains(&topic));
}

#[tokio::test]
async fn concurrent_upserts_store_one_whole_entry() {
    let Some(store) = connect().await else { return };
    let store = Arc::new(store);
    let topic = unique_topic();

    let mut handles = Vec::new();
    for i in 0..10i64 {
        let store = store.clone();
        let topic = topic.clone();
        handles.push(tokio::spawn(async move {
            let mut e = entry("same", &topic, i, i as u32);
            e.username = format!("name_{}", i);
            store.upsert(e, RetentionPolicy::LatestWins).await.unwrap()
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let entries = store.entries_for_topic(&topic).await.unwrap();
    assert_eq!(entries.len(), 1);
    let i: i64 = entries[0].username.trim_start_matches("name_").parse().unwrap();
    assert_eq!(entries[0].score, i);
    assert_eq!(entries[0].completed_at, entry("same", &topic, i, i as u32).completed_at);
}
