//! Scripted in-memory page driver and notifier for exercising the watcher without
//! a browser.
//!
//! A [`FakePage`] is a set of [`Screen`]s keyed by URL. Elements are addressed by the
//! `Display` form of their [`Locator`], so a screen lists exactly the strategies that
//! should match on it. Clicks can move to another screen or produce a results table
//! chosen by the labels selected so far.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;

use crate::driver::{Locator, PageDriver};
use crate::notifier::{Delivery, Notifier};
use crate::types::{RowCell, RowElement, SelectOption, TableRow};

#[derive(Clone, Debug, Default)]
struct Element {
    count: usize,
    hidden: bool,
    failing: bool,
    leads_to: Option<String>,
    search: bool,
    options: Option<Vec<SelectOption>>,
}

/// One page of the scripted site
#[derive(Clone, Debug, Default)]
pub struct Screen {
    url: String,
    elements: HashMap<String, Element>,
    table: Option<Vec<TableRow>>,
}

impl Screen {
    pub fn new(url: impl Into<String>) -> Self {
        Screen {
            url: url.into(),
            ..Default::default()
        }
    }

    fn element(&mut self, locator: &Locator) -> &mut Element {
        let element = self.elements.entry(locator.to_string()).or_default();
        element.count = element.count.max(1);
        element
    }

    /// The locator matches one visible element
    pub fn with(mut self, locator: Locator) -> Self {
        self.element(&locator);
        self
    }

    /// The locator matches `count` elements
    pub fn with_count(mut self, locator: Locator, count: usize) -> Self {
        self.elements.entry(locator.to_string()).or_default().count = count;
        self
    }

    /// Present in the DOM but not rendered
    pub fn hidden(mut self, locator: Locator) -> Self {
        self.element(&locator).hidden = true;
        self
    }

    /// Present, but every action on it errors
    pub fn failing(mut self, locator: Locator) -> Self {
        self.element(&locator).failing = true;
        self
    }

    /// Clicking moves to the screen registered under `url`
    pub fn link(mut self, locator: Locator, url: impl Into<String>) -> Self {
        self.element(&locator).leads_to = Some(url.into());
        self
    }

    /// Clicking shows the results for the labels selected so far
    pub fn search(mut self, locator: Locator) -> Self {
        self.element(&locator).search = true;
        self
    }

    /// A select control offering these labels, values `v0`, `v1`, ...
    pub fn select(mut self, locator: Locator, labels: &[&str]) -> Self {
        let options = labels
            .iter()
            .enumerate()
            .map(|(index, label)| SelectOption {
                index,
                value: format!("v{}", index),
                label: label.to_string(),
            })
            .collect();
        self.element(&locator).options = Some(options);
        self
    }

    /// Table shown on this screen before any search
    pub fn table(mut self, rows: Vec<TableRow>) -> Self {
        self.table = Some(rows);
        self
    }
}

#[derive(Default)]
struct State {
    screens: HashMap<String, Screen>,
    current: Option<String>,
    /// control key -> chosen label
    selected: HashMap<String, String>,
    results: Vec<(Vec<String>, Vec<TableRow>)>,
    shown: Option<Vec<TableRow>>,
    calls: Vec<String>,
    filled: Vec<(String, String)>,
    closed: bool,
}

impl State {
    fn screen(&self) -> Result<&Screen> {
        let url = self
            .current
            .as_ref()
            .ok_or_else(|| anyhow!("no page loaded"))?;
        self.screens
            .get(url)
            .ok_or_else(|| anyhow!("no screen registered for {}", url))
    }

    fn element(&self, locator: &Locator) -> Result<Option<&Element>> {
        Ok(self
            .screen()?
            .elements
            .get(&locator.to_string())
            .filter(|e| e.count > 0))
    }

    fn actionable(&self, locator: &Locator) -> Result<&Element> {
        match self.element(locator)? {
            Some(e) if e.failing => bail!("element {} is not interactable", locator),
            Some(e) => Ok(e),
            None => bail!("no element matches {}", locator),
        }
    }

    fn enter(&mut self, url: &str) -> Result<()> {
        if !self.screens.contains_key(url) {
            bail!("no screen registered for {}", url);
        }
        self.current = Some(url.to_string());
        self.shown = None;
        Ok(())
    }
}

/// Scripted [`PageDriver`] recording every call it receives
#[derive(Default)]
pub struct FakePage {
    state: Mutex<State>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn screen(self, screen: Screen) -> Self {
        {
            let mut state = self.lock();
            state.screens.insert(screen.url.clone(), screen);
        }
        self
    }

    /// Results shown by a search while every one of `labels` is selected. The first
    /// matching entry wins; with none matching the search shows an empty table.
    pub fn results(self, labels: &[&str], rows: Vec<TableRow>) -> Self {
        {
            let mut state = self.lock();
            state
                .results
                .push((labels.iter().map(|l| l.to_string()).collect(), rows));
        }
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, call: String) -> std::sync::MutexGuard<'_, State> {
        let mut state = self.lock();
        state.calls.push(call);
        state
    }

    /// Every call in order, e.g. `click button["検索"]`
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Calls starting with `prefix`
    pub fn call_count(&self, prefix: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// Values written by `fill`, keyed by locator
    pub fn filled(&self) -> Vec<(String, String)> {
        self.lock().filled.clone()
    }

    /// Labels chosen so far, keyed by control
    pub fn selected(&self) -> HashMap<String, String> {
        self.lock().selected.clone()
    }

    pub fn current(&self) -> Option<String> {
        self.lock().current.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

#[async_trait]
impl PageDriver for FakePage {
    async fn goto(&self, url: &str) -> Result<()> {
        let mut state = self.record(format!("goto {}", url));
        state.enter(url)
    }

    async fn wait_for_load(&self) -> Result<()> {
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.lock().screen()?.url.clone())
    }

    async fn count(&self, locator: &Locator) -> Result<usize> {
        let state = self.lock();
        if state.closed {
            bail!("session closed");
        }
        Ok(state.element(locator)?.map(|e| e.count).unwrap_or(0))
    }

    async fn is_displayed(&self, locator: &Locator) -> Result<bool> {
        Ok(self
            .lock()
            .element(locator)?
            .is_some_and(|e| !e.hidden))
    }

    async fn fill(&self, locator: &Locator, value: &str) -> Result<()> {
        let mut state = self.record(format!("fill {}", locator));
        state.actionable(locator)?;
        state.filled.push((locator.to_string(), value.to_string()));
        Ok(())
    }

    async fn click(&self, locator: &Locator) -> Result<()> {
        let mut state = self.record(format!("click {}", locator));
        let element = state.actionable(locator)?.clone();
        if let Some(url) = element.leads_to {
            state.enter(&url)?;
        }
        if element.search {
            let selected: HashSet<&String> = state.selected.values().collect();
            let rows = state
                .results
                .iter()
                .find(|(labels, _)| labels.iter().all(|l| selected.contains(l)))
                .map(|(_, rows)| rows.clone())
                .unwrap_or_default();
            state.shown = Some(rows);
        }
        Ok(())
    }

    async fn check(&self, locator: &Locator) -> Result<()> {
        let state = self.record(format!("check {}", locator));
        state.actionable(locator)?;
        Ok(())
    }

    async fn select_options(&self, control: &Locator) -> Result<Vec<SelectOption>> {
        let state = self.lock();
        Ok(state
            .element(control)?
            .and_then(|e| e.options.clone())
            .unwrap_or_default())
    }

    async fn select_option(&self, control: &Locator, option: &SelectOption) -> Result<()> {
        let mut state = self.record(format!("select {} = {}", control, option.label));
        let element = state.actionable(control)?;
        let known = element
            .options
            .as_ref()
            .is_some_and(|opts| opts.iter().any(|o| o.index == option.index));
        if !known {
            bail!("{} has no option at index {}", control, option.index);
        }
        state
            .selected
            .insert(control.to_string(), option.label.clone());
        Ok(())
    }

    async fn script_select(&self, element_id: &str, label: &str) -> Result<()> {
        let control = Locator::css(format!("#{}", element_id));
        let mut state = self.record(format!("script {} = {}", control, label));
        let element = state.actionable(&control)?;
        let known = element
            .options
            .as_ref()
            .is_some_and(|opts| opts.iter().any(|o| o.label == label));
        if !known {
            bail!("#{} has no option '{}'", element_id, label);
        }
        state.selected.insert(control.to_string(), label.to_string());
        Ok(())
    }

    async fn first_table_rows(&self) -> Result<Option<Vec<TableRow>>> {
        let state = self.lock();
        if let Some(rows) = &state.shown {
            return Ok(Some(rows.clone()));
        }
        Ok(state.screen()?.table.clone())
    }

    async fn close(&self) -> Result<()> {
        let mut state = self.record("close".to_string());
        state.closed = true;
        Ok(())
    }
}

/// Plain text cell
pub fn cell(text: &str) -> RowCell {
    RowCell {
        text: text.to_string(),
        ..Default::default()
    }
}

/// Cell holding one link
pub fn link_cell(text: &str, href: &str) -> RowCell {
    RowCell {
        text: text.to_string(),
        links: vec![RowElement {
            text: text.to_string(),
            href: Some(href.to_string()),
        }],
        buttons: Vec::new(),
    }
}

/// Cell holding one button
pub fn button_cell(text: &str) -> RowCell {
    RowCell {
        text: text.to_string(),
        links: Vec::new(),
        buttons: vec![RowElement {
            text: text.to_string(),
            href: None,
        }],
    }
}

pub fn row(cells: Vec<RowCell>) -> TableRow {
    TableRow { cells }
}

/// Notifier that keeps every message instead of sending it
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every send errors
    pub fn failing() -> Self {
        RecordingNotifier {
            fail: true,
            ..Default::default()
        }
    }

    /// (subject, body) pairs in order
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, subject: &str, body: &str) -> Result<Delivery> {
        if self.fail {
            bail!("SMTP send failed: connection refused");
        }
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((subject.to_string(), body.to_string()));
        Ok(Delivery::Sent)
    }
}
