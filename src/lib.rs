//! # seatwatch
#![allow(clippy::uninlined_format_args)]
//!
//! Watches the IPA CBT application site for open exam seats at chosen test centers
//! and mails the operator when any appear.
//!
//! One run logs in, walks the application screens to the area/date selection page,
//! picks the configured region and prefecture, searches every eligible month and
//! day range, and collects the "○" markers shown for the target centers. It is meant
//! to run on a schedule in CI, so progress is reported as GitHub Actions workflow
//! commands.
//!
//! ## CLI Usage
//!
//! ```bash
//! # Credentials come from the environment
//! export IPA_USER_ID=... IPA_PASSWORD=...
//!
//! # One headless Firefox run with the defaults (九州・沖縄 / 沖縄県 from 2025-11)
//! seatwatch run
//!
//! # Chrome, visible window, plain log output, JSON report on stdout
//! seatwatch run --browser chrome --no-headless --plain --format json
//!
//! # Force the scripted widget paradigm for the filter controls
//! seatwatch run --ui-mode widget
//!
//! # Show the effective configuration (secrets redacted)
//! seatwatch config
//! ```
//!
//! ## Environment
//!
//! | Variable | Default |
//! |---|---|
//! | `IPA_USER_ID`, `IPA_PASSWORD` | required |
//! | `SEND_EMAIL` | off (`1`/`true`/`yes`/`on` enable) |
//! | `GMAIL_ADDRESS`, `GMAIL_APP_PASSWORD` | required when `SEND_EMAIL` is on |
//! | `REGION_NAME` | `九州・沖縄` |
//! | `PREF_NAME` | `沖縄県` |
//! | `START_YM` | `2025-11` |
//! | `TARGET_CENTERS` | the three Okinawa centers, comma separated |
//! | `IPA_LOGIN_URL`, `IPA_ENTRY_URL` | the live site |
//! | `SMTP_HOST`, `SMTP_PORT` | `smtp.gmail.com`, `465` |
//! | `WATCH_UI_MODE` | `auto` |
//!
//! ## Exit codes
//!
//! `0` finished (with or without slots), `1` other error, `2` configuration,
//! `3` login form missing, `4` login failed, `5` area/date page not reached,
//! `6` WebDriver unavailable.
//!
//! ## Library Usage
//!
//! ```no_run
//! use seatwatch::{Config, ConsoleReporter, Watcher, WebDriverPage, BrowserType};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! let page = WebDriverPage::connect(BrowserType::Firefox, true, config.timeouts).await?;
//! let reporter = ConsoleReporter::new(true);
//! let notifier = seatwatch::notifier::from_config(&config);
//!
//! let report = Watcher::new(&config, &reporter, notifier.as_ref())
//!     .run(&page)
//!     .await?;
//! println!("{} slot(s)", report.slots.len());
//! # Ok(())
//! # }
//! ```

/// Run configuration from the environment
pub mod config;

/// Page driver capability and locator strategies
pub mod driver;

/// Fatal error taxonomy and exit codes
pub mod errors;

/// Scripted driver and notifier for tests
pub mod fake;

/// Region / prefecture / month / day controls
pub mod filter;

/// Login and the path to the area/date page
pub mod navigation;

/// Mail notification
pub mod notifier;

/// PASS / WARN / FAIL / INFO reporting
pub mod reporter;

/// Ordered fallback over locator strategies
pub mod resolver;

/// Results-table scanning
pub mod scanner;

/// Month × day search loop
pub mod search;

/// Fixed markup of the target site
pub mod site;

/// End-of-run summary and notification
pub mod summary;

/// Shared data types
pub mod types;

/// Run orchestration
pub mod watcher;

/// WebDriver browser control
pub mod webdriver;

/// Automatic WebDriver process management
pub mod webdriver_manager;

pub use config::{Config, Timeouts};
pub use driver::{Action, Locator, PageDriver, TextMatch};
pub use errors::WatcherError;
pub use filter::UiMode;
pub use navigation::Checkpoint;
pub use reporter::{ConsoleReporter, Mark, MemoryReporter, Reporter};
pub use summary::{Outcome, RunReport};
pub use types::{OutputFormat, RunResult, SlotRecord, YearMonth};
pub use watcher::Watcher;
pub use webdriver::{BrowserType, WebDriverPage};
