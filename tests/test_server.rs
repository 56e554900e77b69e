// Mock booking site served for browser tests

use std::net::SocketAddr;
use tokio::sync::OnceCell;

// Include the mock site inline
include!("test_server_app.rs");

static TEST_SERVER: OnceCell<TestServerHandle> = OnceCell::const_new();

pub struct TestServerHandle {
    pub addr: SocketAddr,
    pub base_url: String,
}

/// Start the mock site once for all tests
pub async fn ensure_test_server() -> &'static TestServerHandle {
    TEST_SERVER
        .get_or_init(|| async {
            let std_listener =
                std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind test server");
            let addr = std_listener.local_addr().unwrap();
            let base_url = format!("http://{}", addr);
            drop(std_listener);

            // Own thread and runtime so the server outlives any single test's runtime
            std::thread::spawn(move || {
                let runtime = tokio::runtime::Runtime::new().expect("Failed to create runtime");
                runtime.block_on(async {
                    let listener = tokio::net::TcpListener::bind(addr)
                        .await
                        .expect("Failed to bind in thread");
                    axum::serve(listener, create_app().await)
                        .await
                        .expect("Test server failed");
                });
            });

            let login_url = format!("{}/login", base_url);
            for attempt in 0..30 {
                tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
                if let Ok(response) = reqwest::get(&login_url).await
                    && response.status().is_success()
                {
                    eprintln!("Mock site ready at {} after {} attempts", base_url, attempt + 1);
                    return TestServerHandle { addr, base_url };
                }
            }
            panic!("Mock site failed to start");
        })
        .await
}
