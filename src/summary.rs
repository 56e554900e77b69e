//! End-of-run outcome: count, notification and the serializable report.

use serde::Serialize;

use crate::config::Config;
use crate::errors::WatcherError;
use crate::notifier::{Delivery, Notifier};
use crate::reporter::Reporter;
use crate::types::{RunResult, SlotRecord, YearMonth};

/// `【CBTS/IPA】基本情報 空き枠を検出しました（<prefecture>）`
pub fn subject(prefecture: &str) -> String {
    format!("【CBTS/IPA】基本情報 空き枠を検出しました（{}）", prefecture)
}

/// Header line, blank line, then one line per record
pub fn body(region: &str, prefecture: &str, start: YearMonth, slots: &[SlotRecord]) -> String {
    let mut lines = vec![
        format!(
            "対象: 地域={} / 都道府県={} / 開始月={}",
            region, prefecture, start
        ),
        String::new(),
    ];
    lines.extend(slots.iter().map(SlotRecord::line));
    lines.join("\n")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// At least one open slot
    Found,
    /// Completed without open slots
    NoneFound,
    /// Aborted by a fatal error
    Failed,
}

/// Serializable summary of a run
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub outcome: Outcome,
    pub slots: Vec<SlotRecord>,
    pub notified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub exit_code: i32,
}

impl RunReport {
    pub fn failed(err: &WatcherError) -> Self {
        RunReport {
            outcome: Outcome::Failed,
            slots: Vec::new(),
            notified: false,
            error: Some(err.to_string()),
            exit_code: err.exit_code(),
        }
    }
}

pub struct RunSummary<'a> {
    reporter: &'a dyn Reporter,
    notifier: &'a dyn Notifier,
    config: &'a Config,
}

impl<'a> RunSummary<'a> {
    pub fn new(reporter: &'a dyn Reporter, notifier: &'a dyn Notifier, config: &'a Config) -> Self {
        RunSummary {
            reporter,
            notifier,
            config,
        }
    }

    /// Report the count and notify when anything was found. Never fails the run.
    pub async fn finish(&self, result: RunResult) -> RunReport {
        let _group = self.reporter.group("Run summary");
        self.reporter
            .info(&format!("Open slots found: {}", result.len()));

        if result.is_empty() {
            self.reporter
                .warn("result", "no open slots at the target centers");
            return RunReport {
                outcome: Outcome::NoneFound,
                slots: Vec::new(),
                notified: false,
                error: None,
                exit_code: 0,
            };
        }

        self.reporter
            .pass("result", &format!("{} open slot(s) found", result.len()));
        for slot in result.slots() {
            self.reporter.info(&slot.line());
        }

        let subject = subject(&self.config.prefecture);
        let body = body(
            &self.config.region,
            &self.config.prefecture,
            self.config.start,
            result.slots(),
        );
        let notified = match self.notifier.send(&subject, &body).await {
            Ok(Delivery::Sent) => {
                self.reporter.pass("notify", "notification sent");
                true
            }
            Ok(Delivery::Skipped(reason)) => {
                self.reporter.warn("notify", &reason);
                false
            }
            Err(e) => {
                self.reporter
                    .fail("notify", &format!("notification failed: {:#}", e));
                false
            }
        };

        RunReport {
            outcome: Outcome::Found,
            slots: result.into_slots(),
            notified,
            error: None,
            exit_code: 0,
        }
    }
}

#[cfg(test)]
#[path = "summary_test.rs"]
mod summary_test;
