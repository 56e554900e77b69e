// Standalone mock booking site, for running the watcher against by hand:
//   cargo run --features test-server --bin test-server -- 3000
//   IPA_LOGIN_URL=http://127.0.0.1:3000/login IPA_ENTRY_URL=http://127.0.0.1:3000/entry \
//   IPA_USER_ID=demo IPA_PASSWORD=demo-pass seatwatch run --plain

use std::net::SocketAddr;
use tracing::{Level, info};

// Include the shared mock site
include!("../../tests/test_server_app.rs");

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let app = create_app().await;

    let port: u16 = std::env::args()
        .nth(1)
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind");

    info!("Mock booking site listening on http://{}/login", addr);

    axum::serve(listener, app).await.expect("Server failed");
}
