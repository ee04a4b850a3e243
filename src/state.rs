// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;

use crate::service::Leaderboard;

#[derive(Clone)]
pub struct AppState {
    pub leaderboard: Arc<Leaderboard>,
}

impl FromRef<AppState> for Arc<Leaderboard> {
    fn from_ref(state: &AppState) -> Self {
        state.leaderboard.clone()
    }
}
