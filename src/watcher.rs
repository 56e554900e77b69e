//! Top-level run: navigate, filter, search, summarize.

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tracing::{info, warn};

use crate::config::Config;
use crate::driver::PageDriver;
use crate::errors::WatcherError;
use crate::filter::FilterSelector;
use crate::navigation::NavigationEngine;
use crate::notifier::Notifier;
use crate::reporter::Reporter;
use crate::resolver::SelectorResolver;
use crate::scanner::SlotScanner;
use crate::search::SearchLoop;
use crate::summary::{RunReport, RunSummary};
use crate::types::RunResult;

const JOB_SUMMARY: &str = "Job Summary";

pub struct Watcher<'a> {
    config: &'a Config,
    reporter: &'a dyn Reporter,
    notifier: &'a dyn Notifier,
}

impl<'a> Watcher<'a> {
    pub fn new(config: &'a Config, reporter: &'a dyn Reporter, notifier: &'a dyn Notifier) -> Self {
        Watcher {
            config,
            reporter,
            notifier,
        }
    }

    /// One complete run on `driver`. The driver is closed before this returns or
    /// unwinds, whatever the outcome; nothing is notified after a fatal error.
    pub async fn run(&self, driver: &dyn PageDriver) -> Result<RunReport, WatcherError> {
        let outcome = AssertUnwindSafe(self.run_session(driver))
            .catch_unwind()
            .await;
        if let Err(e) = driver.close().await {
            warn!("Closing the browser session failed: {:#}", e);
        }
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(panic) => {
                self.reporter
                    .fail(JOB_SUMMARY, "aborted by a panic; browser session closed");
                std::panic::resume_unwind(panic);
            }
        };

        match outcome {
            Ok(result) => {
                let report = RunSummary::new(self.reporter, self.notifier, self.config)
                    .finish(result)
                    .await;
                self.reporter.pass(
                    JOB_SUMMARY,
                    "run completed (no open slots also counts as success)",
                );
                Ok(report)
            }
            Err(e) => {
                self.reporter
                    .fail(JOB_SUMMARY, &format!("aborted by a fatal error: {}", e));
                Err(e)
            }
        }
    }

    /// Everything that needs the browser session
    pub async fn run_session(&self, driver: &dyn PageDriver) -> Result<RunResult, WatcherError> {
        let reporter = self.reporter;
        let config = self.config;
        let mut result = RunResult::new();

        let mut navigation = NavigationEngine::new(driver, reporter, config);
        {
            let _group = reporter.group("Navigation");
            if !navigation.navigate().await? {
                let checkpoint = navigation
                    .last_checkpoint()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "none".to_string());
                return Err(WatcherError::AreaDateUnreachable { checkpoint });
            }
        }

        let filters = FilterSelector::new(driver, reporter, config.ui_mode, config.timeouts);
        {
            let _group = reporter.group("Area/date selection");
            filters.select_region(&config.region).await;
            filters.select_prefecture(&config.prefecture).await;
        }

        {
            let _group = reporter.group("Search loop");
            let resolver = SelectorResolver::new(driver, reporter, config.timeouts.action);
            let scanner = SlotScanner::new(driver, reporter);
            let search = SearchLoop::new(driver, reporter, &resolver, &filters, &scanner, &config.site);
            let searches = search
                .run(config.start, &config.target_centers, &mut result)
                .await;
            info!("{} search(es) run, {} slot(s) collected", searches, result.len());
        }

        {
            let _group = reporter.group("Logout");
            navigation.logout().await;
        }

        Ok(result)
    }
}

#[cfg(test)]
#[path = "watcher_test.rs"]
mod watcher_test;
