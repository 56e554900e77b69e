//! Ordered fallback over locator strategies for one logical field.

use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::driver::{Action, Locator, PageDriver};
use crate::reporter::Reporter;

/// Every candidate was absent or failed
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{step}: no strategy could {action} ({attempted} of {candidates} attempted)")]
pub struct Unresolved {
    pub step: String,
    pub action: String,
    pub candidates: usize,
    /// Candidates that matched an element and were acted on
    pub attempted: usize,
}

pub struct SelectorResolver<'a> {
    driver: &'a dyn PageDriver,
    reporter: &'a dyn Reporter,
    attempt_timeout: Duration,
}

impl<'a> SelectorResolver<'a> {
    pub fn new(
        driver: &'a dyn PageDriver,
        reporter: &'a dyn Reporter,
        attempt_timeout: Duration,
    ) -> Self {
        SelectorResolver {
            driver,
            reporter,
            attempt_timeout,
        }
    }

    /// Act on the first candidate that matches and accepts the action.
    ///
    /// Candidates with no match are skipped silently; an action error or timeout is a
    /// WARN and the next candidate is tried. Nothing after the first success is touched.
    pub async fn resolve<'c>(
        &self,
        step: &str,
        candidates: &'c [Locator],
        action: Action<'_>,
    ) -> Result<&'c Locator, Unresolved> {
        let mut attempted = 0;

        for candidate in candidates {
            match self.driver.count(candidate).await {
                Ok(n) if n > 0 => {}
                Ok(_) => {
                    debug!("{}: {} matches nothing", step, candidate);
                    continue;
                }
                Err(e) => {
                    debug!("{}: {} could not be queried: {:#}", step, candidate, e);
                    continue;
                }
            }

            attempted += 1;
            match tokio::time::timeout(
                self.attempt_timeout,
                self.driver.perform(candidate, action),
            )
            .await
            {
                Ok(Ok(())) => {
                    self.reporter
                        .pass(step, &format!("{} via {}", action, candidate));
                    return Ok(candidate);
                }
                Ok(Err(e)) => {
                    self.reporter.warn(
                        step,
                        &format!("{} via {} failed: {:#}", action, candidate, e),
                    );
                }
                Err(_) => {
                    self.reporter.warn(
                        step,
                        &format!(
                            "{} via {} timed out after {:?}",
                            action, candidate, self.attempt_timeout
                        ),
                    );
                }
            }
        }

        self.reporter.fail(
            step,
            &format!(
                "no strategy could {} ({} candidates, {} attempted)",
                action,
                candidates.len(),
                attempted
            ),
        );
        Err(Unresolved {
            step: step.to_string(),
            action: action.to_string(),
            candidates: candidates.len(),
            attempted,
        })
    }

    /// Single-locator form of [`SelectorResolver::resolve`]
    pub async fn resolve_one<'c>(
        &self,
        step: &str,
        locator: &'c Locator,
        action: Action<'_>,
    ) -> Result<&'c Locator, Unresolved> {
        self.resolve(step, std::slice::from_ref(locator), action)
            .await
    }

    /// Non-critical single attempt: PASS on success, WARN on error or timeout, and
    /// false without a report when nothing matches
    pub async fn attempt(&self, step: &str, locator: &Locator, action: Action<'_>) -> bool {
        if !self.driver.is_present(locator).await {
            debug!("{}: {} matches nothing", step, locator);
            return false;
        }
        match tokio::time::timeout(self.attempt_timeout, self.driver.perform(locator, action)).await
        {
            Ok(Ok(())) => {
                self.reporter
                    .pass(step, &format!("{} via {}", action, locator));
                true
            }
            Ok(Err(e)) => {
                self.reporter
                    .warn(step, &format!("{} via {} failed: {:#}", action, locator, e));
                false
            }
            Err(_) => {
                self.reporter.warn(
                    step,
                    &format!(
                        "{} via {} timed out after {:?}",
                        action, locator, self.attempt_timeout
                    ),
                );
                false
            }
        }
    }

    /// First candidate with at least one match, without acting on it
    pub async fn first_present<'c>(&self, candidates: &'c [Locator]) -> Option<&'c Locator> {
        for candidate in candidates {
            if self.driver.is_present(candidate).await {
                return Some(candidate);
            }
        }
        None
    }
}

#[cfg(test)]
#[path = "resolver_test.rs"]
mod resolver_test;
