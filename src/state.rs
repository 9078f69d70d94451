use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

use crate::config::SiteConfig;
use crate::models::PostSummary;

pub type RefreshBroadcaster = broadcast::Sender<()>;

/// Shared application state. Templates and the post summary cache sit behind
/// RwLocks so the dev-mode watcher can swap them in place; in production they
/// are written once at startup and only ever read.
pub struct AppState {
    pub config: SiteConfig,
    pub layout_html: RwLock<String>,
    pub home_html: RwLock<String>,
    pub not_found_html: RwLock<String>, // supports {{ id }} placeholder
    pub posts: RwLock<Vec<PostSummary>>,
    pub is_development: bool,
}

#[derive(Clone)]
pub struct RouterState {
    pub app_state: Arc<AppState>,
    pub broadcaster: RefreshBroadcaster,
}

impl axum::extract::FromRef<RouterState> for Arc<AppState> {
    fn from_ref(state: &RouterState) -> Self {
        state.app_state.clone()
    }
}

impl axum::extract::FromRef<RouterState> for RefreshBroadcaster {
    fn from_ref(state: &RouterState) -> Self {
        state.broadcaster.clone()
    }
}
