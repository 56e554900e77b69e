use anyhow::{Context, Result};
use std::process::{Child, Command, Stdio};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::webdriver::BrowserType;

/// How long a freshly spawned driver gets to answer `/status`
const STARTUP_ATTEMPTS: u32 = 100;
const STARTUP_POLL: Duration = Duration::from_millis(100);

/// Starts geckodriver / chromedriver on demand and stops what it started
#[derive(Default)]
pub struct WebDriverManager {
    processes: Mutex<Vec<WebDriverProcess>>,
}

struct WebDriverProcess {
    browser_type: BrowserType,
    child: Child,
    port: u16,
    url: String,
    #[cfg(unix)]
    process_group_id: Option<i32>,
}

impl WebDriverManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn processes(&self) -> MutexGuard<'_, Vec<WebDriverProcess>> {
        self.processes.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// URL of a working driver for `browser_type`: one we already started, one on the
    /// standard port, or a newly spawned one
    pub async fn ensure_driver(&self, browser_type: &BrowserType) -> Result<String> {
        let managed_urls: Vec<String> = self
            .processes()
            .iter()
            .filter(|p| p.browser_type == *browser_type)
            .map(|p| p.url.clone())
            .collect();

        for url in managed_urls {
            if Self::verify_driver_working(&url).await {
                debug!("Using existing managed WebDriver at {}", url);
                return Ok(url);
            }
        }

        let standard_url = browser_type.get_webdriver_url();
        if Self::verify_driver_working(&standard_url).await {
            debug!("Found external WebDriver at {}", standard_url);
            return Ok(standard_url);
        }

        info!("WebDriver not detected, attempting to start automatically...");
        self.start_driver(browser_type).await
    }

    async fn start_driver(&self, browser_type: &BrowserType) -> Result<String> {
        let command = browser_type.driver_name();
        let port = Self::find_free_port_for_browser(browser_type)?;
        let args = match browser_type {
            BrowserType::Firefox => vec!["--port".to_string(), port.to_string()],
            BrowserType::Chrome => vec![format!("--port={}", port)],
        };

        if !Self::command_exists(command) {
            anyhow::bail!(
                "{} not found in PATH. Install it or start it yourself:\n\
                  geckodriver --port 4444\n\
                  chromedriver --port=9515",
                command
            );
        }

        info!("Starting {} on port {}", command, port);
        let mut cmd = Command::new(command);
        cmd.args(&args).stdout(Stdio::null()).stderr(Stdio::null());

        // Own process group so the browser it launches goes down with it
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let child = cmd
            .spawn()
            .with_context(|| format!("Failed to start {}", command))?;

        #[cfg(unix)]
        let process_group_id = Some(child.id() as i32);

        let url = format!("http://localhost:{}", port);
        self.processes().push(WebDriverProcess {
            browser_type: *browser_type,
            child,
            port,
            url: url.clone(),
            #[cfg(unix)]
            process_group_id,
        });

        for _ in 0..STARTUP_ATTEMPTS {
            if Self::is_driver_running(&url).await {
                info!("WebDriver started successfully on port {}", port);
                return Ok(url);
            }
            sleep(STARTUP_POLL).await;
        }

        self.stop_where(|p| p.port == port);
        anyhow::bail!("{} WebDriver failed to start within timeout", command)
    }

    /// Check if a command exists in PATH
    pub fn command_exists(command: &str) -> bool {
        #[cfg(unix)]
        let probe = "which";
        #[cfg(windows)]
        let probe = "where";

        Command::new(probe)
            .arg(command)
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    /// Preferred port for the driver, else one the OS hands out
    pub fn find_free_port_for_browser(browser_type: &BrowserType) -> Result<u16> {
        let preferred_ports = match browser_type {
            BrowserType::Firefox => [4444, 4445, 4446],
            BrowserType::Chrome => [9515, 9516, 9517],
        };

        if let Some(port) = preferred_ports
            .into_iter()
            .find(|p| !Self::is_port_in_use(*p))
        {
            debug!("Found free port {} for {:?}", port, browser_type);
            return Ok(port);
        }

        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        drop(listener);
        Ok(port)
    }

    pub fn is_port_in_use(port: u16) -> bool {
        std::net::TcpListener::bind(("127.0.0.1", port)).is_err()
    }

    /// Whether anything answers `/status` at `url`
    pub async fn is_driver_running(url: &str) -> bool {
        let status_url = format!("{}/status", url);

        match reqwest::Client::new()
            .get(&status_url)
            .timeout(Duration::from_secs(1))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    /// Whether the driver at `url` reports `ready: true`
    async fn verify_driver_working(url: &str) -> bool {
        let status_url = format!("{}/status", url);

        match reqwest::Client::new()
            .get(&status_url)
            .timeout(Duration::from_secs(1))
            .send()
            .await
        {
            Ok(response) => match response.json::<serde_json::Value>().await {
                Ok(body) => status_ready(&body),
                Err(_) => false,
            },
            Err(_) => false,
        }
    }

    /// Stop the drivers we started for `browser_type`
    pub fn kill_driver(&self, browser_type: &BrowserType) {
        self.stop_where(|p| p.browser_type == *browser_type);
    }

    /// Stop all managed WebDriver processes
    pub fn stop_all(&self) {
        self.stop_where(|_| true);
    }

    fn stop_where(&self, matches: impl Fn(&WebDriverProcess) -> bool) {
        let mut processes = self.processes();
        let (stopping, keep): (Vec<_>, Vec<_>) = processes.drain(..).partition(|p| matches(p));
        *processes = keep;
        drop(processes);

        for mut process in stopping {
            debug!("Stopping WebDriver on port {}", process.port);
            #[cfg(unix)]
            if let Some(pgid) = process.process_group_id {
                Self::kill_process_group(pgid);
            }
            let _ = process.child.kill();
            let _ = process.child.wait();
        }
    }

    #[cfg(unix)]
    fn kill_process_group(pgid: i32) {
        if let Err(e) = Command::new("kill")
            .args(["-TERM", &format!("-{}", pgid)])
            .output()
        {
            debug!("Failed to send SIGTERM to process group {}: {}", pgid, e);
        }

        std::thread::sleep(Duration::from_millis(100));

        if let Err(e) = Command::new("kill")
            .args(["-KILL", &format!("-{}", pgid)])
            .output()
        {
            debug!("Failed to send SIGKILL to process group {}: {}", pgid, e);
        }
    }

    /// Number of driver processes currently managed
    pub fn managed_count(&self) -> usize {
        self.processes().len()
    }
}

/// `value.ready` of a WebDriver `/status` response
pub fn status_ready(body: &serde_json::Value) -> bool {
    body.get("value")
        .and_then(|v| v.get("ready"))
        .and_then(|r| r.as_bool())
        .unwrap_or(false)
}

impl Drop for WebDriverManager {
    fn drop(&mut self) {
        self.stop_all();
    }
}

// Global WebDriver manager instance
lazy_static::lazy_static! {
    pub static ref GLOBAL_WEBDRIVER_MANAGER: WebDriverManager = WebDriverManager::new();
}

#[cfg(test)]
#[path = "webdriver_manager_test.rs"]
mod webdriver_manager_test;
