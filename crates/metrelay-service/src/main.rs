//! metrelay service binary.
//!
//! - Strict YAML config (path from argv, defaults to metrelay.yaml)
//! - Backend selection + catalog load + bulk registration at startup
//! - HTTP/JSON surface on the configured listener

use std::net::SocketAddr;
use tracing_subscriber::{fmt, EnvFilter};

use metrelay_service::{app_state, config, router};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "metrelay.yaml".to_string());
    let cfg = config::load_from_file(&config_path).expect("config load failed");

    let listen: SocketAddr = cfg
        .service
        .listen
        .parse()
        .expect("service.listen must be a valid SocketAddr");

    let state = app_state::AppState::new(&cfg).expect("framework init failed");
    let app = router::build_router(state);

    tracing::info!(%listen, "metrelay-service starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .expect("failed to bind");

    axum::serve(listener, app).await.expect("server failed");
}
