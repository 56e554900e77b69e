//! Login and the multi-screen path to the area/date selection page.

use std::fmt;

use serde::Serialize;
use tracing::info;

use crate::config::Config;
use crate::driver::{Action, Locator, PageDriver};
use crate::errors::WatcherError;
use crate::filter::FilterField;
use crate::reporter::Reporter;
use crate::resolver::SelectorResolver;

/// Named points along the path, each confirmed by a page predicate
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Checkpoint {
    LoginPage,
    LoggedIn,
    EntryPage,
    ResumeOffered,
    ExamTypeChosen,
    EligibilityDone,
    AreaDatePage,
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

pub struct NavigationEngine<'a> {
    driver: &'a dyn PageDriver,
    reporter: &'a dyn Reporter,
    config: &'a Config,
    trail: Vec<Checkpoint>,
}

impl<'a> NavigationEngine<'a> {
    pub fn new(driver: &'a dyn PageDriver, reporter: &'a dyn Reporter, config: &'a Config) -> Self {
        NavigationEngine {
            driver,
            reporter,
            config,
            trail: Vec::new(),
        }
    }

    fn resolver(&self) -> SelectorResolver<'a> {
        SelectorResolver::new(self.driver, self.reporter, self.config.timeouts.action)
    }

    /// Checkpoints reached so far, in order
    pub fn trail(&self) -> &[Checkpoint] {
        &self.trail
    }

    pub fn last_checkpoint(&self) -> Option<Checkpoint> {
        self.trail.last().copied()
    }

    async fn reach(&mut self, checkpoint: Checkpoint) {
        let url = self.driver.current_url().await.unwrap_or_default();
        info!("Checkpoint {} at {}", checkpoint, url);
        self.trail.push(checkpoint);
    }

    /// Click and wait for the next document. Failures are reported, not raised.
    async fn click_through(&self, step: &str, locator: &Locator) -> bool {
        if self
            .resolver()
            .resolve_one(step, locator, Action::Click)
            .await
            .is_err()
        {
            return false;
        }
        if let Err(e) = self.driver.wait_for_load().await {
            self.reporter
                .warn(step, &format!("page did not settle: {:#}", e));
        }
        true
    }

    /// Log in. Every failure here is fatal.
    pub async fn login(&mut self) -> Result<(), WatcherError> {
        let config = self.config;
        let site = &config.site;
        let step = "login";
        self.driver
            .goto(&site.login_url)
            .await
            .map_err(|e| WatcherError::Other(e.context("loading the login page")))?;

        let has_form = self.driver.is_present(&site.login_form()).await;
        self.reporter.require(
            has_form,
            "login form",
            &format!("form present at {}", site.login_url),
            &format!("no form at {}", site.login_url),
            WatcherError::LoginFormMissing {
                url: site.login_url.clone(),
            },
        )?;
        self.reach(Checkpoint::LoginPage).await;

        let creds = &config.credentials;
        let resolver = self.resolver();
        let identifiers = site.identifier_candidates();
        let identifier = resolver
            .resolve(
                "user id",
                &identifiers,
                Action::Fill(creds.user_id.expose()),
            )
            .await
            .map_err(|e| WatcherError::LoginFailed(e.to_string()))?
            .clone();
        resolver
            .resolve(
                "password",
                &site.password_candidates(),
                Action::Fill(creds.password.expose()),
            )
            .await
            .map_err(|e| WatcherError::LoginFailed(e.to_string()))?;
        resolver
            .resolve("login submit", &site.login_submit_candidates(), Action::Click)
            .await
            .map_err(|e| WatcherError::LoginFailed(e.to_string()))?;
        if let Err(e) = self.driver.wait_for_load().await {
            self.reporter
                .warn(step, &format!("page did not settle: {:#}", e));
        }

        // Whichever strategy reached the identifier field must no longer match
        let identifier_gone = !self.driver.is_present(&identifier).await;
        let logout_shown = resolver
            .first_present(&site.logout_candidates())
            .await
            .is_some();
        self.reporter.require(
            identifier_gone || logout_shown,
            step,
            "logged in",
            "still on the login page after submitting",
            WatcherError::LoginFailed("login was not confirmed".to_string()),
        )?;
        self.reach(Checkpoint::LoggedIn).await;
        Ok(())
    }

    /// Reach the application entry page through menu links, else by URL
    pub async fn open_entry(&mut self) -> Result<(), WatcherError> {
        let config = self.config;
        let site = &config.site;
        let step = "entry";
        let direct = site.direct_entry_link();
        let exam = site.exam_link();
        let apply = site.apply_link();

        let mut opened = false;
        if self.driver.is_present(&direct).await {
            opened = self.click_through(step, &direct).await;
        } else if self.driver.is_present(&exam).await && self.click_through(step, &exam).await {
            if self.driver.is_present(&apply).await {
                opened = self.click_through(step, &apply).await;
            } else {
                self.reporter
                    .warn(step, "exam menu has no application link");
            }
        }

        if !opened {
            self.reporter
                .info(&format!("Loading entry page {}", site.entry_url));
            self.driver
                .goto(&site.entry_url)
                .await
                .map_err(|e| WatcherError::Other(e.context("loading the entry page")))?;
        }
        self.reach(Checkpoint::EntryPage).await;
        Ok(())
    }

    /// Resume an application in progress when the site offers it
    pub async fn resume(&mut self) {
        let candidates = self.config.site.resume_candidates();
        let resolver = self.resolver();
        match resolver.first_present(&candidates).await {
            Some(locator) => {
                if self.click_through("resume", locator).await {
                    self.reach(Checkpoint::ResumeOffered).await;
                }
            }
            None => self.reporter.warn("resume", "no application to resume"),
        }
    }

    /// Pick the exam row and move past the exam-type screen
    pub async fn choose_exam_type(&mut self) {
        let config = self.config;
        let site = &config.site;
        let resolver = self.resolver();

        let start = site.start_input_candidates();
        if let Some(locator) = resolver.first_present(&start).await {
            self.click_through("start input", locator).await;
        }

        let next = site.exam_next_candidates();
        match resolver.first_present(&next).await {
            Some(locator) => {
                if self.click_through("exam type", locator).await {
                    self.reach(Checkpoint::ExamTypeChosen).await;
                }
            }
            None => self
                .reporter
                .warn("exam type", "no exam-type step, already past this step"),
        }
    }

    /// Tick eligibility and consent when shown, then continue. Every step here is
    /// optional, so failures are WARN only.
    pub async fn confirm_eligibility(&mut self) {
        let config = self.config;
        let site = &config.site;
        let resolver = self.resolver();

        let mut acted = false;
        for (step, locator) in [
            ("eligibility", site.eligibility()),
            ("consent", site.consent()),
        ] {
            if self.driver.is_present(&locator).await {
                acted |= resolver.attempt(step, &locator, Action::Check).await;
            } else {
                self.reporter
                    .warn(step, &format!("{} not shown", locator));
            }
        }

        let next = site.next_button();
        if self.driver.is_present(&next).await
            && resolver.attempt("eligibility next", &next, Action::Click).await
        {
            acted = true;
            if let Err(e) = self.driver.wait_for_load().await {
                self.reporter
                    .warn("eligibility next", &format!("page did not settle: {:#}", e));
            }
        }
        if acted {
            self.reach(Checkpoint::EligibilityDone).await;
        }
    }

    /// Whether the area/date selection page is showing
    pub async fn on_area_date(&self) -> bool {
        let config = self.config;
        let site = &config.site;
        if self.driver.is_present(&site.area_date_heading()).await {
            return true;
        }
        let filters_present = {
            let region = self.any_present(FilterField::Region).await;
            region && self.any_present(FilterField::Prefecture).await
        };
        filters_present && self.driver.is_present(&site.search_button()).await
    }

    async fn any_present(&self, field: FilterField) -> bool {
        self.driver.is_present(&field.native_locator()).await
            || self.driver.is_present(&field.widget_locator()).await
    }

    async fn arrived(&mut self) -> bool {
        if self.on_area_date().await {
            self.reporter
                .pass("area/date", "area/date selection page reached");
            self.reach(Checkpoint::AreaDatePage).await;
            true
        } else {
            false
        }
    }

    /// Full path from the login page. `Ok(false)` when every step ran but the
    /// area/date page never showed up.
    pub async fn navigate(&mut self) -> Result<bool, WatcherError> {
        self.login().await?;
        self.open_entry().await?;
        if self.arrived().await {
            return Ok(true);
        }
        self.resume().await;
        if self.arrived().await {
            return Ok(true);
        }
        self.choose_exam_type().await;
        self.confirm_eligibility().await;
        if self.arrived().await {
            return Ok(true);
        }
        self.reporter.warn(
            "area/date",
            &format!(
                "area/date selection page not reached (last checkpoint: {})",
                self.last_checkpoint()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "none".to_string())
            ),
        );
        Ok(false)
    }

    /// Log out if a control is offered; absence is a WARN
    pub async fn logout(&self) {
        let candidates = self.config.site.logout_candidates();
        let resolver = self.resolver();
        match resolver.first_present(&candidates).await {
            Some(locator) => {
                self.click_through("logout", locator).await;
            }
            None => self.reporter.warn("logout", "no logout control"),
        }
    }
}

#[cfg(test)]
#[path = "navigation_test.rs"]
mod navigation_test;
