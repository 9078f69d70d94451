use std::{sync::Arc, time::Duration};

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use notify_debouncer_full::{
    new_debouncer, DebouncedEvent,
    notify::{Error as NotifyError, RecursiveMode, Watcher},
};
use tracing::{debug, error, info};

use crate::content_loader::reload_content;
use crate::state::{AppState, RefreshBroadcaster};

const DEBOUNCE: Duration = Duration::from_millis(200);

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(tx): State<RefreshBroadcaster>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| notify_on_reload(socket, tx))
}

async fn notify_on_reload(mut socket: WebSocket, tx: RefreshBroadcaster) {
    let mut rx = tx.subscribe();

    // One signal per connection; the page reloads and reconnects.
    if rx.recv().await.is_ok()
        && socket.send(Message::Text("reload".into())).await.is_err()
    {
        debug!("client went away before the reload message was delivered");
    }
}

/// Watch the content directory and, on any real change, rebuild the cached
/// content and tell connected clients to refresh.
pub fn start_content_watcher(tx: RefreshBroadcaster, state: Arc<AppState>) {
    let content_dir = state.config.content_dir.clone();
    info!("Watching {} for changes...", content_dir);

    tokio::spawn(async move {
        let (change_tx, mut change_rx) = tokio::sync::mpsc::channel(1);

        let mut debouncer = new_debouncer(
            DEBOUNCE,
            None,
            move |result: Result<Vec<DebouncedEvent>, Vec<NotifyError>>| match result {
                Ok(events) => {
                    if events.iter().any(is_content_change) {
                        if let Err(e) = change_tx.blocking_send(()) {
                            error!("Failed to forward watcher event: {}", e);
                        }
                    }
                }
                Err(errors) => {
                    for e in errors {
                        error!("Watcher error: {}", e);
                    }
                }
            },
        )
        .expect("failed to create file watcher");

        debouncer
            .watcher()
            .watch(content_dir.as_ref(), RecursiveMode::Recursive)
            .expect("failed to watch content directory");

        while change_rx.recv().await.is_some() {
            info!("Content change detected, reloading...");
            reload_content(&state).await;

            if let Err(e) = tx.send(()) {
                debug!("no reload listeners connected: {}", e);
            }
        }
    });
}

/// Editor temp files (emacs lockfiles, `~` backups) churn constantly and
/// never affect rendered content.
fn is_content_change(event: &DebouncedEvent) -> bool {
    let relevant_kind =
        event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove();
    if !relevant_kind {
        return false;
    }

    !event.event.paths.iter().any(|path| {
        path.file_name()
            .and_then(|name| name.to_str())
            .map_or(false, |name| name.starts_with(".#") || name.ends_with('~'))
    })
}
