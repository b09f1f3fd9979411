//! Demo HTTP surface over the locator core: token decoding, record
//! search, and the diagnostic sample export.

mod handlers;
mod state;

use axum::routing::get;
use axum::Router;
use state::AppState;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;

use crate::location::LocationArbiter;
use crate::records::BurialRecord;

pub fn build_router(records: Vec<BurialRecord>, arbiter: LocationArbiter) -> Router {
    let state = Arc::new(AppState {
        records,
        arbiter: Mutex::new(arbiter),
    });

    Router::new()
        .route("/api/decode", get(handlers::decode))
        .route("/api/search", get(handlers::search))
        .route("/api/samples", get(handlers::samples))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start(host: &str, port: u16, records: Vec<BurialRecord>, arbiter: LocationArbiter) {
    let app = build_router(records, arbiter);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            eprintln!("Error: Cannot bind to {}: {}", addr, e);
            std::process::exit(1);
        });

    eprintln!("  Lapida Trace server listening on http://{}", addr);
    eprintln!("  Press Ctrl+C to stop.");

    axum::serve(listener, app)
        .await
        .unwrap_or_else(|e| {
            eprintln!("Server error: {}", e);
            std::process::exit(1);
        });
}
