//! Page driver capability consumed by the navigation and scraping core.
//!
//! Locating strategies are plain data ([`Locator`]) so fallback chains can be
//! declared up front and replayed against any [`PageDriver`]: the fantoccini
//! WebDriver client in production, or the scripted [`crate::fake::FakePage`] in tests.

use anyhow::Result;
use async_trait::async_trait;
use std::fmt;

use crate::types::{SelectOption, TableRow};

/// How an element's text is compared against an expected name
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TextMatch {
    /// Whitespace-normalized text equals the value
    Exact(String),
    /// Whitespace-normalized text contains the value
    Contains(String),
    /// Text contains every one of the values
    ContainsAll(Vec<String>),
}

impl TextMatch {
    pub fn exact(s: impl Into<String>) -> Self {
        TextMatch::Exact(s.into())
    }

    pub fn contains(s: impl Into<String>) -> Self {
        TextMatch::Contains(s.into())
    }

    /// XPath predicate over the string value of `subject`
    fn predicate(&self, subject: &str) -> String {
        let normalized = format!("normalize-space({})", subject);
        match self {
            TextMatch::Exact(s) => format!("{}={}", normalized, xpath_literal(s)),
            TextMatch::Contains(s) => format!("contains({}, {})", normalized, xpath_literal(s)),
            TextMatch::ContainsAll(parts) => parts
                .iter()
                .map(|p| format!("contains({}, {})", normalized, xpath_literal(p)))
                .collect::<Vec<_>>()
                .join(" and "),
        }
    }
}

impl fmt::Display for TextMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextMatch::Exact(s) => write!(f, "\"{}\"", s),
            TextMatch::Contains(s) => write!(f, "*{}*", s),
            TextMatch::ContainsAll(parts) => write!(f, "*{}*", parts.join("*")),
        }
    }
}

/// Accessible roles the site uses for its controls
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Button,
    Link,
}

/// One strategy for locating an element
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Locator {
    /// Raw CSS selector
    Css(String),
    /// Button (incl. submit/button inputs) or link by accessible name
    Role { role: Role, name: TextMatch },
    /// Form control associated with a `<label>` of exactly this text
    Label(String),
    /// Element whose own text matches
    Text(TextMatch),
    /// Any element with this tag name
    Tag(String),
    /// `target` inside the first table row matching `row`; with `by_header` only the
    /// row's first cell is compared
    InRow {
        row: TextMatch,
        by_header: bool,
        target: Box<Locator>,
    },
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    pub fn button(name: TextMatch) -> Self {
        Locator::Role {
            role: Role::Button,
            name,
        }
    }

    pub fn link(name: TextMatch) -> Self {
        Locator::Role {
            role: Role::Link,
            name,
        }
    }

    pub fn label(text: impl Into<String>) -> Self {
        Locator::Label(text.into())
    }

    pub fn text(matcher: TextMatch) -> Self {
        Locator::Text(matcher)
    }

    pub fn tag(name: impl Into<String>) -> Self {
        Locator::Tag(name.into())
    }

    /// Target inside a row whose full text matches
    pub fn in_row(row: TextMatch, target: Locator) -> Self {
        Locator::InRow {
            row,
            by_header: false,
            target: Box::new(target),
        }
    }

    /// Target inside a row whose first (header) cell matches
    pub fn in_headed_row(header: TextMatch, target: Locator) -> Self {
        Locator::InRow {
            row: header,
            by_header: true,
            target: Box::new(target),
        }
    }

    /// CSS selector for [`Locator::Css`], `None` for strategies compiled to XPath
    pub fn as_css(&self) -> Option<&str> {
        match self {
            Locator::Css(s) => Some(s),
            _ => None,
        }
    }

    /// Absolute XPath for non-CSS strategies
    pub fn to_xpath(&self) -> Option<String> {
        match self {
            Locator::Css(_) => None,
            Locator::InRow {
                row,
                by_header,
                target,
            } => {
                let row_pred = if *by_header {
                    format!("*[1][self::th or self::td][{}]", row.predicate("."))
                } else {
                    row.predicate(".")
                };
                Some(format!("(//tr[{}])[1]//{}", row_pred, target.step()?))
            }
            other => Some(format!("//{}", other.step()?)),
        }
    }

    /// Relative XPath step (no leading axis)
    fn step(&self) -> Option<String> {
        match self {
            Locator::Css(_) | Locator::InRow { .. } => None,
            Locator::Role {
                role: Role::Button,
                name,
            } => Some(format!(
                "*[self::button or self::input[@type='submit' or @type='button'] or @role='button'][{} or {}]",
                name.predicate("."),
                name.predicate("@value")
            )),
            Locator::Role {
                role: Role::Link,
                name,
            } => Some(format!("a[{}]", name.predicate("."))),
            Locator::Label(text) => {
                let label = TextMatch::Exact(text.clone()).predicate(".");
                Some(format!(
                    "*[self::input or self::select or self::textarea][@id=//label[{label}]/@for or ancestor::label[{label}]]"
                ))
            }
            Locator::Text(matcher) => Some(format!("*[text()[{}]]", matcher.predicate("."))),
            Locator::Tag(name) => Some(name.clone()),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(s) => write!(f, "css={}", s),
            Locator::Role {
                role: Role::Button,
                name,
            } => write!(f, "button[{}]", name),
            Locator::Role {
                role: Role::Link,
                name,
            } => write!(f, "link[{}]", name),
            Locator::Label(s) => write!(f, "label={}", s),
            Locator::Text(m) => write!(f, "text={}", m),
            Locator::Tag(t) => write!(f, "tag={}", t),
            Locator::InRow {
                row,
                by_header,
                target,
            } => {
                let scope = if *by_header { "row-header" } else { "row" };
                write!(f, "{}[{}] >> {}", scope, row, target)
            }
        }
    }
}

/// Quote a string as an XPath 1.0 literal, falling back to `concat()` when it
/// contains both quote kinds
pub fn xpath_literal(s: &str) -> String {
    if !s.contains('\'') {
        format!("'{}'", s)
    } else if !s.contains('"') {
        format!("\"{}\"", s)
    } else {
        let parts: Vec<String> = s.split('\'').map(|p| format!("'{}'", p)).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

/// Interaction requested from a resolved element
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action<'v> {
    Fill(&'v str),
    Click,
    Check,
}

impl fmt::Display for Action<'_> {
    // Fill values are credentials more often than not; never print them
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Fill(_) => write!(f, "fill"),
            Action::Click => write!(f, "click"),
            Action::Check => write!(f, "check"),
        }
    }
}

/// Browser page capability. Every call acts on the single current page.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Load a URL and wait for the document to be ready
    async fn goto(&self, url: &str) -> Result<()>;

    /// Wait for the document to finish loading after a click or submit
    async fn wait_for_load(&self) -> Result<()>;

    async fn current_url(&self) -> Result<String>;

    /// Number of elements the locator currently matches
    async fn count(&self, locator: &Locator) -> Result<usize>;

    /// Whether the first match is rendered visibly
    async fn is_displayed(&self, locator: &Locator) -> Result<bool>;

    async fn fill(&self, locator: &Locator, value: &str) -> Result<()>;

    async fn click(&self, locator: &Locator) -> Result<()>;

    /// Tick a checkbox or radio; no-op when already selected
    async fn check(&self, locator: &Locator) -> Result<()>;

    /// Options of the first `<select>` the locator matches; empty when it matches nothing
    async fn select_options(&self, control: &Locator) -> Result<Vec<SelectOption>>;

    /// Choose an option through the native control
    async fn select_option(&self, control: &Locator, option: &SelectOption) -> Result<()>;

    /// Choose an option of the select with this id by label through script, raising the
    /// change event the way the site's widget plugin expects
    async fn script_select(&self, element_id: &str, label: &str) -> Result<()>;

    /// Rows of the first table on the page, `None` when there is no table
    async fn first_table_rows(&self) -> Result<Option<Vec<TableRow>>>;

    /// Release the browser session
    async fn close(&self) -> Result<()>;

    async fn is_present(&self, locator: &Locator) -> bool {
        matches!(self.count(locator).await, Ok(n) if n > 0)
    }

    async fn perform(&self, locator: &Locator, action: Action<'_>) -> Result<()> {
        match action {
            Action::Fill(value) => self.fill(locator, value).await,
            Action::Click => self.click(locator).await,
            Action::Check => self.check(locator).await,
        }
    }
}

#[cfg(test)]
#[path = "driver_test.rs"]
mod driver_test;
