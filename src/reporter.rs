//! Step reporting: PASS / WARN / FAIL / INFO markers grouped into sections.

use std::fmt;
use std::io::Write;
use std::sync::Mutex;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::errors::WatcherError;
use crate::types::OutputFormat;

/// Kind of step marker
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mark {
    Pass,
    Warn,
    Fail,
    Info,
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Mark::Pass => "PASS",
            Mark::Warn => "WARN",
            Mark::Fail => "FAIL",
            Mark::Info => "INFO",
        };
        f.write_str(s)
    }
}

/// Sink for step markers
pub trait Reporter: Send + Sync {
    fn emit(&self, mark: Mark, step: &str, detail: &str);

    fn group_start(&self, title: &str);

    fn group_end(&self);

    fn pass(&self, step: &str, detail: &str) {
        self.emit(Mark::Pass, step, detail);
    }

    fn warn(&self, step: &str, detail: &str) {
        self.emit(Mark::Warn, step, detail);
    }

    fn fail(&self, step: &str, detail: &str) {
        self.emit(Mark::Fail, step, detail);
    }

    fn info(&self, detail: &str) {
        self.emit(Mark::Info, "", detail);
    }

    /// PASS with `ok` when `cond` holds, otherwise FAIL with `ng`
    fn check(&self, cond: bool, step: &str, ok: &str, ng: &str) -> bool {
        if cond {
            self.pass(step, ok);
        } else {
            self.fail(step, ng);
        }
        cond
    }

    /// Critical variant of [`Reporter::check`]: a failed condition aborts with `err`
    fn require(
        &self,
        cond: bool,
        step: &str,
        ok: &str,
        ng: &str,
        err: WatcherError,
    ) -> Result<(), WatcherError> {
        if self.check(cond, step, ok, ng) {
            Ok(())
        } else {
            Err(err)
        }
    }
}

impl dyn Reporter + '_ {
    /// Open a section that closes when the guard is dropped
    pub fn group(&self, title: &str) -> Group<'_> {
        self.group_start(title);
        Group { reporter: self }
    }
}

/// Open report section; ends the group on drop so early returns stay balanced
pub struct Group<'a> {
    reporter: &'a dyn Reporter,
}

impl Drop for Group<'_> {
    fn drop(&mut self) {
        self.reporter.group_end();
    }
}

/// Writes GitHub Actions workflow commands to stdout and mirrors every marker as a
/// tracing event
pub struct ConsoleReporter {
    annotations: bool,
}

impl ConsoleReporter {
    pub fn new(annotations: bool) -> Self {
        ConsoleReporter { annotations }
    }

    /// Workflow commands only go to stdout when it does not carry the JSON report
    pub fn for_output(plain: bool, format: OutputFormat) -> Self {
        ConsoleReporter::new(!plain && matches!(format, OutputFormat::Text))
    }

    pub fn annotations(&self) -> bool {
        self.annotations
    }

    fn write_line(&self, line: &str) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{}", line);
        let _ = out.flush();
    }
}

impl Reporter for ConsoleReporter {
    fn emit(&self, mark: Mark, step: &str, detail: &str) {
        match mark {
            Mark::Pass => info!("[PASS] {} - {}", step, detail),
            Mark::Warn => warn!("[WARN] {} - {}", step, detail),
            Mark::Fail => error!("[FAIL] {} - {}", step, detail),
            Mark::Info => info!("{}", detail),
        }
        if !self.annotations {
            return;
        }
        let line = match mark {
            Mark::Pass => format!(
                "::notice title={}::PASS {}",
                escape_property(step),
                escape_data(detail)
            ),
            Mark::Warn => format!(
                "::warning title={}::{}",
                escape_property(step),
                escape_data(detail)
            ),
            Mark::Fail => format!(
                "::error title={}::FAIL {}",
                escape_property(step),
                escape_data(detail)
            ),
            Mark::Info => format!(
                "[{}] {}",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%SZ"),
                detail
            ),
        };
        self.write_line(&line);
    }

    fn group_start(&self, title: &str) {
        info!("== {} ==", title);
        if self.annotations {
            self.write_line(&format!("::group::{}", escape_data(title)));
        }
    }

    fn group_end(&self) {
        if self.annotations {
            self.write_line("::endgroup::");
        }
    }
}

/// Escape a workflow command message
pub fn escape_data(s: &str) -> String {
    s.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Escape a workflow command property value
pub fn escape_property(s: &str) -> String {
    escape_data(s).replace(':', "%3A").replace(',', "%2C")
}

/// One recorded marker
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Report {
    pub mark: Mark,
    pub step: String,
    pub detail: String,
}

/// Keeps every marker in memory; used by tests and for post-run inspection
#[derive(Default)]
pub struct MemoryReporter {
    reports: Mutex<Vec<Report>>,
    groups: Mutex<Vec<String>>,
    depth: Mutex<usize>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<Report> {
        self.reports.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Titles of every group opened, in order
    pub fn groups(&self) -> Vec<String> {
        self.groups.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Groups currently open
    pub fn open_groups(&self) -> usize {
        *self.depth.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn count(&self, mark: Mark) -> usize {
        self.reports().iter().filter(|r| r.mark == mark).count()
    }

    /// Markers of one kind emitted for `step`
    pub fn by_step(&self, mark: Mark, step: &str) -> Vec<Report> {
        self.reports()
            .into_iter()
            .filter(|r| r.mark == mark && r.step == step)
            .collect()
    }

    pub fn has(&self, mark: Mark, step: &str) -> bool {
        !self.by_step(mark, step).is_empty()
    }

    pub fn last(&self) -> Option<Report> {
        self.reports().last().cloned()
    }
}

impl Reporter for MemoryReporter {
    fn emit(&self, mark: Mark, step: &str, detail: &str) {
        self.reports
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Report {
                mark,
                step: step.to_string(),
                detail: detail.to_string(),
            });
    }

    fn group_start(&self, title: &str) {
        self.groups
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(title.to_string());
        *self.depth.lock().unwrap_or_else(|e| e.into_inner()) += 1;
    }

    fn group_end(&self) {
        let mut depth = self.depth.lock().unwrap_or_else(|e| e.into_inner());
        *depth = depth.saturating_sub(1);
    }
}

#[cfg(test)]
#[path = "reporter_test.rs"]
mod reporter_test;
