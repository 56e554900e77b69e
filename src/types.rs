use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

lazy_static::lazy_static! {
    static ref MONTH_LABEL: Regex = Regex::new(r"(\d{4})年\s*(\d{1,2})月").unwrap();
}

/// Output format for the end-of-run summary
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Annotations and log lines only
    #[default]
    Text,
    /// Also print the run report as JSON on stdout
    Json,
}

/// A calendar month, ordered by year then month
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            anyhow::bail!("Invalid month {} (expected 1-12)", month);
        }
        Ok(YearMonth { year, month })
    }

    /// Parse a site label such as "2025年11月" (whitespace before the month is tolerated)
    pub fn from_label(label: &str) -> Option<Self> {
        let caps = MONTH_LABEL.captures(label)?;
        let year = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        YearMonth::new(year, month).ok()
    }
}

impl FromStr for YearMonth {
    type Err = anyhow::Error;

    /// Parse `YYYY-MM`
    fn from_str(s: &str) -> Result<Self> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| anyhow::anyhow!("Invalid year-month '{}'. Use YYYY-MM", s))?;
        let year = year
            .parse::<i32>()
            .map_err(|_| anyhow::anyhow!("Invalid year in '{}'", s))?;
        let month = month
            .parse::<u32>()
            .map_err(|_| anyhow::anyhow!("Invalid month in '{}'", s))?;
        YearMonth::new(year, month)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// One `<option>` of a select control, as read from the page
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    /// Position within the control (0-based)
    pub index: usize,
    pub value: String,
    /// Trimmed display text
    pub label: String,
}

/// A selectable month at or after the configured start month
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MonthOption {
    pub year_month: YearMonth,
    pub label: String,
}

/// A selectable day range; index and value are kept for re-selection
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DayOption {
    pub index: usize,
    pub value: String,
    pub label: String,
}

impl From<&DayOption> for SelectOption {
    fn from(day: &DayOption) -> Self {
        SelectOption {
            index: day.index,
            value: day.value.clone(),
            label: day.label.clone(),
        }
    }
}

/// An open slot found in the results table
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotRecord {
    pub center: String,
    pub month: String,
    pub day: String,
    pub time: String,
    /// Navigable reference of the marker, empty when it has none
    pub link: String,
}

impl SlotRecord {
    /// `<center> | <month> | <day> | <time>[ | <link>]`
    pub fn line(&self) -> String {
        let mut line = format!(
            "{} | {} | {} | {}",
            self.center, self.month, self.day, self.time
        );
        if !self.link.is_empty() {
            line.push_str(" | ");
            line.push_str(&self.link);
        }
        line
    }
}

/// Slots accumulated over one run, in discovery order
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunResult {
    slots: Vec<SlotRecord>,
}

impl RunResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = SlotRecord>) {
        self.slots.extend(records);
    }

    pub fn slots(&self) -> &[SlotRecord] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn into_slots(self) -> Vec<SlotRecord> {
        self.slots
    }
}

/// A link or button inside a results-table cell
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowElement {
    pub text: String,
    #[serde(default)]
    pub href: Option<String>,
}

/// One `th`/`td` cell of a results-table row
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowCell {
    pub text: String,
    #[serde(default)]
    pub links: Vec<RowElement>,
    #[serde(default)]
    pub buttons: Vec<RowElement>,
}

/// Snapshot of one results-table row in document order
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    pub cells: Vec<RowCell>,
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
