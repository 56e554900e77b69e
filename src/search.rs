//! Month × day search over the area/date page.

use tracing::{debug, info};

use crate::driver::{Action, PageDriver};
use crate::filter::FilterSelector;
use crate::reporter::Reporter;
use crate::resolver::SelectorResolver;
use crate::scanner::SlotScanner;
use crate::site::SiteProfile;
use crate::types::{RunResult, YearMonth};

/// Label recorded when a filter has nothing to choose from
pub const PLACEHOLDER: &str = "(指定なし)";

pub struct SearchLoop<'a> {
    driver: &'a dyn PageDriver,
    reporter: &'a dyn Reporter,
    resolver: &'a SelectorResolver<'a>,
    filters: &'a FilterSelector<'a>,
    scanner: &'a SlotScanner<'a>,
    site: &'a SiteProfile,
}

impl<'a> SearchLoop<'a> {
    pub fn new(
        driver: &'a dyn PageDriver,
        reporter: &'a dyn Reporter,
        resolver: &'a SelectorResolver<'a>,
        filters: &'a FilterSelector<'a>,
        scanner: &'a SlotScanner<'a>,
        site: &'a SiteProfile,
    ) -> Self {
        SearchLoop {
            driver,
            reporter,
            resolver,
            filters,
            scanner,
            site,
        }
    }

    /// Search every eligible month and day in source order, appending matches to
    /// `result`. Returns the number of searches run.
    pub async fn run(&self, start: YearMonth, targets: &[String], result: &mut RunResult) -> usize {
        let months = self.filters.eligible_months(start).await;
        if months.is_empty() {
            self.reporter
                .warn("month", &format!("no month options from {}", start));
        } else {
            let labels: Vec<&str> = months.iter().map(|m| m.label.as_str()).collect();
            self.reporter
                .info(&format!("Eligible months: {}", labels.join(", ")));
        }
        let months: Vec<Option<_>> = if months.is_empty() {
            vec![None]
        } else {
            months.into_iter().map(Some).collect()
        };

        let mut searches = 0;
        for month in &months {
            let month_label = match month {
                Some(m) => {
                    if !self.filters.select_month(m).await {
                        self.reporter
                            .warn("month", &format!("skipping {}", m.label));
                        continue;
                    }
                    m.label.as_str()
                }
                None => PLACEHOLDER,
            };

            let days = self.filters.day_options().await;
            if days.is_empty() {
                self.reporter.warn("day", "no usable day ranges");
            }
            let days: Vec<Option<_>> = if days.is_empty() {
                vec![None]
            } else {
                days.into_iter().map(Some).collect()
            };

            for day in &days {
                let day_label = match day {
                    Some(d) => {
                        if !self.filters.select_day(d).await {
                            self.reporter
                                .warn("day", &format!("skipping {} {}", month_label, d.label));
                            continue;
                        }
                        d.label.as_str()
                    }
                    None => PLACEHOLDER,
                };

                if !self.search().await {
                    debug!("Skipping extraction for {} {}", month_label, day_label);
                    continue;
                }
                searches += 1;
                let records = self.scanner.scan(month_label, day_label, targets).await;
                info!(
                    "{} {}: {} slot(s)",
                    month_label,
                    day_label,
                    records.len()
                );
                result.extend(records);
            }
        }
        searches
    }

    /// Trigger the search and wait for the results. False when there is no trigger.
    async fn search(&self) -> bool {
        let trigger = self.site.search_button();
        if !self.driver.is_present(&trigger).await {
            self.reporter.warn("search", "search button not found");
            return false;
        }
        if self
            .resolver
            .resolve_one("search", &trigger, Action::Click)
            .await
            .is_err()
        {
            return false;
        }
        if let Err(e) = self.driver.wait_for_load().await {
            self.reporter
                .warn("search", &format!("results page did not settle: {:#}", e));
        }
        true
    }
}

#[cfg(test)]
#[path = "search_test.rs"]
mod search_test;
