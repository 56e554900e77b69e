//! Region / prefecture / month / day filter controls.
//!
//! The site renders each filter either as a plain `<select>` in a labelled table row
//! or as a scripted widget wrapping a hidden select with a fixed id. Which one is
//! live is decided per control at the moment it is used.

use std::fmt;
use std::str::FromStr;

use tokio::time::{Instant, sleep};
use tracing::debug;

use crate::config::Timeouts;
use crate::driver::{Locator, PageDriver, TextMatch};
use crate::reporter::Reporter;
use crate::types::{DayOption, MonthOption, SelectOption, YearMonth};

/// Day labels containing this are prompts, not ranges
const DAY_PROMPT: &str = "選択";

/// Which paradigm the filter controls are driven through
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum UiMode {
    /// Detect per control
    #[default]
    Auto,
    /// Always the native `<select>`
    Native,
    /// Always the scripted widget
    Widget,
}

impl FromStr for UiMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(UiMode::Auto),
            "native" => Ok(UiMode::Native),
            "widget" => Ok(UiMode::Widget),
            other => anyhow::bail!(
                "Invalid UI mode '{}'. Must be 'auto', 'native' or 'widget'",
                other
            ),
        }
    }
}

impl fmt::Display for UiMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UiMode::Auto => "auto",
            UiMode::Native => "native",
            UiMode::Widget => "widget",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Paradigm {
    Native,
    Widget,
}

/// The four filter controls of the area/date page
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterField {
    Region,
    Prefecture,
    Month,
    Day,
}

impl FilterField {
    /// Header cell text of the row holding the native control
    pub fn row_label(self) -> &'static str {
        match self {
            FilterField::Region => "地域",
            FilterField::Prefecture => "都道府県",
            FilterField::Month => "月",
            FilterField::Day => "日",
        }
    }

    /// Element id of the select behind the widget
    pub fn widget_id(self) -> &'static str {
        match self {
            FilterField::Region => "select_area",
            FilterField::Prefecture => "select_pref",
            FilterField::Month => "select_ym",
            FilterField::Day => "select_dt",
        }
    }

    pub fn native_locator(self) -> Locator {
        Locator::in_headed_row(TextMatch::contains(self.row_label()), Locator::tag("select"))
    }

    pub fn widget_locator(self) -> Locator {
        Locator::css(format!("#{}", self.widget_id()))
    }

    /// Step name used in reports
    pub fn step(self) -> &'static str {
        match self {
            FilterField::Region => "region",
            FilterField::Prefecture => "prefecture",
            FilterField::Month => "month",
            FilterField::Day => "day",
        }
    }
}

/// A filter control bound to the paradigm it is driven through
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterControl {
    pub field: FilterField,
    pub paradigm: Paradigm,
    pub locator: Locator,
}

pub struct FilterSelector<'a> {
    driver: &'a dyn PageDriver,
    reporter: &'a dyn Reporter,
    mode: UiMode,
    timeouts: Timeouts,
}

impl<'a> FilterSelector<'a> {
    pub fn new(
        driver: &'a dyn PageDriver,
        reporter: &'a dyn Reporter,
        mode: UiMode,
        timeouts: Timeouts,
    ) -> Self {
        FilterSelector {
            driver,
            reporter,
            mode,
            timeouts,
        }
    }

    /// Bind a field to its live paradigm, `None` when neither form is on the page
    pub async fn control(&self, field: FilterField) -> Option<FilterControl> {
        let paradigm = match self.mode {
            UiMode::Native => Paradigm::Native,
            UiMode::Widget => Paradigm::Widget,
            UiMode::Auto => {
                if self
                    .driver
                    .is_displayed(&field.native_locator())
                    .await
                    .unwrap_or(false)
                {
                    Paradigm::Native
                } else if self.driver.is_present(&field.widget_locator()).await {
                    Paradigm::Widget
                } else {
                    return None;
                }
            }
        };
        let locator = match paradigm {
            Paradigm::Native => field.native_locator(),
            Paradigm::Widget => field.widget_locator(),
        };
        Some(FilterControl {
            field,
            paradigm,
            locator,
        })
    }

    /// Whether the field is on the page in either form
    pub async fn is_present(&self, field: FilterField) -> bool {
        self.driver.is_present(&field.native_locator()).await
            || self.driver.is_present(&field.widget_locator()).await
    }

    /// Current options of a field, empty when the control is missing
    pub async fn options(&self, field: FilterField) -> Vec<SelectOption> {
        let Some(control) = self.control(field).await else {
            return Vec::new();
        };
        match self.driver.select_options(&control.locator).await {
            Ok(options) => options,
            Err(e) => {
                debug!("Reading {} options failed: {:#}", field.step(), e);
                Vec::new()
            }
        }
    }

    /// Choose the option of `field` whose trimmed label equals `label`
    pub async fn select_label(&self, field: FilterField, label: &str) -> bool {
        let step = field.step();
        let Some(control) = self.control(field).await else {
            self.reporter
                .fail(step, &format!("{} control not found", step));
            return false;
        };
        let options = match self.driver.select_options(&control.locator).await {
            Ok(options) => options,
            Err(e) => {
                self.reporter
                    .fail(step, &format!("reading options failed: {:#}", e));
                return false;
            }
        };
        match options.iter().find(|o| o.label.trim() == label) {
            Some(option) => self.apply(&control, option).await,
            None => {
                self.reporter
                    .fail(step, &format!("option '{}' not found", label));
                false
            }
        }
    }

    async fn apply(&self, control: &FilterControl, option: &SelectOption) -> bool {
        let step = control.field.step();
        let result = match control.paradigm {
            Paradigm::Native => self.driver.select_option(&control.locator, option).await,
            Paradigm::Widget => {
                self.driver
                    .script_select(control.field.widget_id(), &option.label)
                    .await
            }
        };
        match result {
            Ok(()) => {
                self.reporter.pass(
                    step,
                    &format!("selected '{}' ({:?})", option.label, control.paradigm),
                );
                true
            }
            Err(e) => {
                self.reporter.fail(
                    step,
                    &format!("selecting '{}' failed: {:#}", option.label, e),
                );
                false
            }
        }
    }

    /// Poll until `field` offers more than its placeholder option. A timeout is a WARN.
    pub async fn wait_populated(&self, field: FilterField) -> bool {
        let deadline = Instant::now() + self.timeouts.populate;
        loop {
            let count = self.options(field).await.len();
            if count > 1 {
                debug!("{} populated with {} options", field.step(), count);
                return true;
            }
            if Instant::now() >= deadline {
                self.reporter.warn(
                    field.step(),
                    &format!(
                        "options not populated within {:?} ({} present)",
                        self.timeouts.populate, count
                    ),
                );
                return false;
            }
            sleep(self.timeouts.poll).await;
        }
    }

    /// Select the region, then wait for the prefecture list to follow
    pub async fn select_region(&self, name: &str) -> bool {
        if !self.select_label(FilterField::Region, name).await {
            return false;
        }
        self.wait_populated(FilterField::Prefecture).await;
        true
    }

    /// Select the prefecture, then wait for the month and day lists to follow
    pub async fn select_prefecture(&self, name: &str) -> bool {
        if !self.select_label(FilterField::Prefecture, name).await {
            return false;
        }
        self.wait_populated(FilterField::Month).await;
        self.wait_populated(FilterField::Day).await;
        true
    }

    pub async fn eligible_months(&self, start: YearMonth) -> Vec<MonthOption> {
        eligible_months_from(&self.options(FilterField::Month).await, start)
    }

    pub async fn day_options(&self) -> Vec<DayOption> {
        day_options_from(&self.options(FilterField::Day).await)
    }

    pub async fn select_month(&self, month: &MonthOption) -> bool {
        self.select_label(FilterField::Month, &month.label).await
    }

    pub async fn select_day(&self, day: &DayOption) -> bool {
        let step = FilterField::Day.step();
        let Some(control) = self.control(FilterField::Day).await else {
            self.reporter
                .fail(step, &format!("{} control not found", step));
            return false;
        };
        self.apply(&control, &SelectOption::from(day)).await
    }
}

/// Month options at or after `start`, in source order; unparseable labels dropped
pub fn eligible_months_from(options: &[SelectOption], start: YearMonth) -> Vec<MonthOption> {
    options
        .iter()
        .filter_map(|o| {
            let label = o.label.trim();
            YearMonth::from_label(label).map(|ym| MonthOption {
                year_month: ym,
                label: label.to_string(),
            })
        })
        .filter(|m| m.year_month >= start)
        .collect()
}

/// Day options without empty or prompt labels, in source order
pub fn day_options_from(options: &[SelectOption]) -> Vec<DayOption> {
    options
        .iter()
        .filter(|o| {
            let label = o.label.trim();
            !label.is_empty() && !label.contains(DAY_PROMPT)
        })
        .map(|o| DayOption {
            index: o.index,
            value: o.value.clone(),
            label: o.label.trim().to_string(),
        })
        .collect()
}

#[cfg(test)]
#[path = "filter_test.rs"]
mod filter_test;
