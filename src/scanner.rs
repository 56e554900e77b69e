//! Results-table scan for target centers and availability markers.

use tracing::debug;

use crate::driver::PageDriver;
use crate::reporter::Reporter;
use crate::types::{RowElement, SlotRecord, TableRow};

/// Glyph the site uses for "seats available"
pub const AVAILABILITY_GLYPH: &str = "○";

const STEP: &str = "scan";

/// Name a row is matched by: its first link text, else its first cell text
pub fn display_name(row: &TableRow) -> Option<&str> {
    let link = row
        .cells
        .iter()
        .flat_map(|c| c.links.iter())
        .map(|l| l.text.trim())
        .find(|t| !t.is_empty());
    link.or_else(|| row.cells.first().map(|c| c.text.trim()))
        .filter(|t| !t.is_empty())
}

/// First target contained in `name` (case-sensitive substring)
pub fn matches_target<'t>(name: &str, targets: &'t [String]) -> Option<&'t str> {
    targets
        .iter()
        .map(String::as_str)
        .find(|t| !t.is_empty() && name.contains(t))
}

/// Availability markers of a row.
///
/// A link or button whose text is the glyph counts once; a cell whose own text is
/// the glyph counts only when it holds no such link or button.
pub fn markers(row: &TableRow) -> Vec<RowElement> {
    let mut found = Vec::new();
    for cell in &row.cells {
        let before = found.len();
        found.extend(
            cell.links
                .iter()
                .chain(cell.buttons.iter())
                .filter(|e| e.text.trim() == AVAILABILITY_GLYPH)
                .cloned(),
        );
        if found.len() == before && cell.text.trim() == AVAILABILITY_GLYPH {
            found.push(RowElement {
                text: AVAILABILITY_GLYPH.to_string(),
                href: None,
            });
        }
    }
    found
}

/// Records for every marker in rows naming a target center
pub fn extract_slots(
    rows: &[TableRow],
    month: &str,
    day: &str,
    targets: &[String],
    reporter: &dyn Reporter,
) -> Vec<SlotRecord> {
    let mut records = Vec::new();
    let mut matched_rows = 0;

    for row in rows {
        let Some(name) = display_name(row) else {
            continue;
        };
        let Some(target) = matches_target(name, targets) else {
            continue;
        };
        matched_rows += 1;
        reporter.pass(STEP, &format!("{} matches {} ({} {})", name, target, month, day));

        let marks = markers(row);
        if marks.is_empty() {
            reporter.warn(STEP, &format!("{}: no open slots ({} {})", name, month, day));
            continue;
        }
        records.extend(marks.into_iter().map(|m| SlotRecord {
            center: name.to_string(),
            month: month.to_string(),
            day: day.to_string(),
            time: m.text.trim().to_string(),
            link: m.href.unwrap_or_default(),
        }));
    }

    if matched_rows == 0 {
        reporter.warn(
            STEP,
            &format!("no target center rows ({} {})", month, day),
        );
    }
    records
}

pub struct SlotScanner<'a> {
    driver: &'a dyn PageDriver,
    reporter: &'a dyn Reporter,
}

impl<'a> SlotScanner<'a> {
    pub fn new(driver: &'a dyn PageDriver, reporter: &'a dyn Reporter) -> Self {
        SlotScanner { driver, reporter }
    }

    /// Scan the results table currently on the page
    pub async fn scan(&self, month: &str, day: &str, targets: &[String]) -> Vec<SlotRecord> {
        let rows = match self.driver.first_table_rows().await {
            Ok(Some(rows)) => rows,
            Ok(None) => {
                self.reporter
                    .warn(STEP, &format!("no results table ({} {})", month, day));
                return Vec::new();
            }
            Err(e) => {
                self.reporter
                    .warn(STEP, &format!("reading results failed: {:#}", e));
                return Vec::new();
            }
        };
        debug!("Results table has {} rows", rows.len());
        extract_slots(&rows, month, day, targets, self.reporter)
    }
}

#[cfg(test)]
#[path = "scanner_test.rs"]
mod scanner_test;
