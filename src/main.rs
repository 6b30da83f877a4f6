mod aggregator;
mod cache;
mod config;
mod constants;
mod routes;
mod store;
mod upstream;

use axum::{Router, routing::get};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;

use crate::cache::QueryCache;
use crate::config::Config;
use crate::store::UserStore;
use crate::upstream::SearchClient;

pub struct AppState {
    pub search: SearchClient,
    pub cache: QueryCache,
    pub users: UserStore,
    pub config: Config,
}

async fn health() -> &'static str {
    "ok"
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    let search = SearchClient::new(Duration::from_secs(config.upstream_timeout_secs))
        .expect("Failed to build upstream HTTP client");
    let cache = QueryCache::new(
        Duration::from_secs(config.cache_ttl_secs),
        config.cache_capacity,
    );
    let users = UserStore::new();

    let state = Arc::new(AppState {
        search,
        cache,
        users,
        config: config.clone(),
    });

    let app = Router::new()
        .route("/health", get(health))
        .merge(routes::build_routes())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind to {}: {}", addr, e));

    println!("Listening on http://{}", addr);
    println!(
        "[config] fan-out={} pages, timeout={}s, cache ttl={}s capacity={}, shuffle={}",
        config.fetch_pages,
        config.upstream_timeout_secs,
        config.cache_ttl_secs,
        config.cache_capacity,
        config.shuffle_results
    );
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Server failed");
}
