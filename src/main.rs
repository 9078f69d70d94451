mod config;
mod content_loader;
mod hot_reload;
mod markdown;
mod models;
mod render;
mod state;

use std::{net::SocketAddr, path::Path as FsPath, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Html,
    routing::{get, get_service},
    Router,
};
use tokio::{
    net::TcpListener,
    sync::{broadcast, RwLock},
};
use tower_http::services::ServeDir;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::SiteConfig;
use content_loader::{load_post, load_site};
use state::{AppState, RouterState};

async fn homepage(State(state): State<Arc<AppState>>) -> Html<String> {
    let layout = state.layout_html.read().await;
    let home = state.home_html.read().await;
    let posts = state.posts.read().await;

    let content = render::post_list(&home, &posts);
    Html(render::page(
        &layout,
        &state.config.title,
        &content,
        state.is_development,
    ))
}

async fn post_detail(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Html<String>) {
    let layout = state.layout_html.read().await;

    // The cached summary list doubles as the existence check, so an unknown
    // id never touches the filesystem.
    let known = state.posts.read().await.iter().any(|post| post.id == id);
    if !known {
        return not_found_page(&state, &layout, &id).await;
    }

    match load_post(&state.config.content_dir, &id).await {
        Ok(Some(post)) => {
            let content = render::post_page(&post);
            let page = render::page(
                &layout,
                &post.summary.title,
                &content,
                state.is_development,
            );
            (StatusCode::OK, Html(page))
        }
        // The file vanished between the existence check and the read.
        Ok(None) => not_found_page(&state, &layout, &id).await,
        Err(e) => {
            error!("Failed to load post {}: {}", id, e);
            not_found_page(&state, &layout, &id).await
        }
    }
}

async fn not_found_page(
    state: &AppState,
    layout: &str,
    id: &str,
) -> (StatusCode, Html<String>) {
    let template = state.not_found_html.read().await;
    let content = render::not_found(&template, id);
    let page = render::page(layout, "Post Not Found", &content, state.is_development);
    (StatusCode::NOT_FOUND, Html(page))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let is_development = std::env::var("RUST_ENV")
        .map(|v| v == "development")
        .unwrap_or(false);

    let config = SiteConfig::load(FsPath::new("blog.toml"));
    info!(
        title = %config.title,
        content_dir = %config.content_dir,
        "starting blog server"
    );

    let site = load_site(&config.content_dir)
        .await
        .expect("failed to load initial site content");
    info!("Loaded {} posts", site.posts.len());

    let static_dir = get_service(ServeDir::new(format!("{}/static", config.content_dir)));

    let state = Arc::new(AppState {
        config,
        layout_html: RwLock::new(site.layout_html),
        home_html: RwLock::new(site.home_html),
        not_found_html: RwLock::new(site.not_found_html),
        posts: RwLock::new(site.posts),
        is_development,
    });

    let (tx, _rx) = broadcast::channel(16);
    if is_development {
        info!("Development mode, hot reload enabled");
        hot_reload::start_content_watcher(tx.clone(), state.clone());
    }

    let router_state = RouterState {
        app_state: state,
        broadcaster: tx,
    };

    let app = Router::new()
        .route("/", get(homepage))
        .route("/posts/{id}", get(post_detail))
        .nest_service("/static", static_dir)
        .route("/ws", get(hot_reload::ws_handler))
        .with_state(router_state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!(%addr, "listening");
    let listener = TcpListener::bind(addr)
        .await
        .expect("failed to bind listener");
    axum::serve(listener, app).await.expect("server error");
}
