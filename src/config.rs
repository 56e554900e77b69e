//! Run configuration, read once from the process environment.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::WatcherError;
use crate::filter::UiMode;
use crate::site::SiteProfile;
use crate::types::YearMonth;

pub const DEFAULT_REGION: &str = "九州・沖縄";
pub const DEFAULT_PREFECTURE: &str = "沖縄県";
pub const DEFAULT_START: &str = "2025-11";
pub const DEFAULT_TARGET_CENTERS: &str =
    "沖縄県庁前テストセンター,那覇テストセンター,OAC沖縄校テストセンター";
pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 465;

/// Credential that never shows up in Debug output or logs
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Secret(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Site login
#[derive(Clone, Debug)]
pub struct Credentials {
    pub user_id: Secret,
    pub password: Secret,
}

/// Mail account used both as sender and recipient
#[derive(Clone, Debug)]
pub struct EmailSettings {
    pub address: String,
    pub app_password: Secret,
    pub smtp_host: String,
    pub smtp_port: u16,
}

/// Bounds on every wait the run performs
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timeouts {
    /// One locate-and-act attempt of the selector resolver
    pub action: Duration,
    /// Dependent select controls filling in after a parent selection
    pub populate: Duration,
    /// Document ready after navigation
    pub page_load: Duration,
    /// Interval between readiness polls
    pub poll: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Timeouts {
            action: Duration::from_secs(5),
            populate: Duration::from_secs(15),
            page_load: Duration::from_secs(30),
            poll: Duration::from_millis(250),
        }
    }
}

/// Immutable run parameters
#[derive(Clone, Debug)]
pub struct Config {
    pub credentials: Credentials,
    pub region: String,
    pub prefecture: String,
    pub start: YearMonth,
    /// Display names searched for in result rows, in configured order
    pub target_centers: Vec<String>,
    /// Present only when notification is enabled
    pub email: Option<EmailSettings>,
    pub site: SiteProfile,
    pub ui_mode: UiMode,
    pub timeouts: Timeouts,
}

impl Config {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, WatcherError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, WatcherError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let need = |key: &str| {
            get(key).ok_or_else(|| {
                WatcherError::Config(format!("environment variable {} is not set", key))
            })
        };

        let credentials = Credentials {
            user_id: Secret::new(need("IPA_USER_ID")?),
            password: Secret::new(need("IPA_PASSWORD")?),
        };

        let start_raw = get("START_YM").unwrap_or_else(|| DEFAULT_START.to_string());
        let start = start_raw
            .parse::<YearMonth>()
            .map_err(|e| WatcherError::Config(format!("START_YM: {}", e)))?;

        let target_centers = parse_list(
            &get("TARGET_CENTERS").unwrap_or_else(|| DEFAULT_TARGET_CENTERS.to_string()),
        );
        if target_centers.is_empty() {
            return Err(WatcherError::Config(
                "TARGET_CENTERS does not name any center".to_string(),
            ));
        }

        let email = if get("SEND_EMAIL").is_some_and(|v| truthy(&v)) {
            let smtp_port = match get("SMTP_PORT") {
                Some(port) => port.trim().parse::<u16>().map_err(|_| {
                    WatcherError::Config(format!("SMTP_PORT: invalid port '{}'", port))
                })?,
                None => DEFAULT_SMTP_PORT,
            };
            Some(EmailSettings {
                address: need("GMAIL_ADDRESS")?,
                app_password: Secret::new(need("GMAIL_APP_PASSWORD")?),
                smtp_host: get("SMTP_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
                smtp_port,
            })
        } else {
            None
        };

        let mut site = SiteProfile::default();
        if let Some(url) = get("IPA_LOGIN_URL") {
            site.login_url = validate_url("IPA_LOGIN_URL", &url)?;
        }
        if let Some(url) = get("IPA_ENTRY_URL") {
            site.entry_url = validate_url("IPA_ENTRY_URL", &url)?;
        }

        let ui_mode = match get("WATCH_UI_MODE") {
            Some(mode) => UiMode::from_str(&mode)
                .map_err(|e| WatcherError::Config(format!("WATCH_UI_MODE: {}", e)))?,
            None => UiMode::Auto,
        };

        Ok(Config {
            credentials,
            region: get("REGION_NAME")
                .map(|v| v.trim().to_string())
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
            prefecture: get("PREF_NAME")
                .map(|v| v.trim().to_string())
                .unwrap_or_else(|| DEFAULT_PREFECTURE.to_string()),
            start,
            target_centers,
            email,
            site,
            ui_mode,
            timeouts: Timeouts::default(),
        })
    }

    pub fn notifications_enabled(&self) -> bool {
        self.email.is_some()
    }

    /// Human-readable dump with secrets redacted
    pub fn describe(&self) -> Vec<(&'static str, String)> {
        vec![
            ("IPA_USER_ID", "***".to_string()),
            ("IPA_LOGIN_URL", self.site.login_url.clone()),
            ("IPA_ENTRY_URL", self.site.entry_url.clone()),
            ("REGION_NAME", self.region.clone()),
            ("PREF_NAME", self.prefecture.clone()),
            ("START_YM", self.start.to_string()),
            ("TARGET_CENTERS", self.target_centers.join(",")),
            ("SEND_EMAIL", self.notifications_enabled().to_string()),
            (
                "GMAIL_ADDRESS",
                self.email
                    .as_ref()
                    .map(|e| e.address.clone())
                    .unwrap_or_default(),
            ),
            ("WATCH_UI_MODE", self.ui_mode.to_string()),
        ]
    }
}

/// `1`, `true`, `yes`, `on` in any case
pub fn truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Comma-separated list, entries trimmed, empties dropped
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn validate_url(key: &str, value: &str) -> Result<String, WatcherError> {
    url::Url::parse(value.trim())
        .map(|u| u.to_string())
        .map_err(|e| WatcherError::Config(format!("{}: invalid URL '{}': {}", key, value, e)))
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
