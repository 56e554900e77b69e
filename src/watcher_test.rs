use super::*;
use crate::driver::{Locator, TextMatch};
use crate::fake::{FakePage, RecordingNotifier, Screen};
use crate::reporter::{Mark, MemoryReporter};

const LOGIN: &str = "https://site.test/login";
const MENU: &str = "https://site.test/menu";
const ENTRY: &str = "https://site.test/entry";

fn config() -> Config {
    Config::from_lookup(|key: &str| {
        let value = match key {
            "IPA_USER_ID" => "user",
            "IPA_PASSWORD" => "pw",
            "IPA_LOGIN_URL" => LOGIN,
            "IPA_ENTRY_URL" => ENTRY,
            _ => return None,
        };
        Some(value.to_string())
    })
    .unwrap()
}

/// Logs in fine but the application path dead-ends on the entry page
fn dead_end(config: &Config) -> FakePage {
    FakePage::new()
        .screen(
            Screen::new(LOGIN)
                .with(config.site.login_form())
                .with(Locator::label("利用者ID"))
                .with(Locator::label("パスワード"))
                .link(Locator::button(TextMatch::exact("ログイン")), MENU),
        )
        .screen(Screen::new(MENU).link(config.site.direct_entry_link(), ENTRY))
        .screen(Screen::new(ENTRY))
}

#[tokio::test]
async fn test_unreachable_area_date_aborts() {
    let config = config();
    let page = dead_end(&config);
    let reporter = MemoryReporter::new();
    let notifier = RecordingNotifier::new();

    let err = Watcher::new(&config, &reporter, &notifier)
        .run(&page)
        .await
        .unwrap_err();

    assert_eq!(err.exit_code(), 5);
    assert!(err.to_string().contains("EntryPage"));
    assert!(page.is_closed());
    assert!(notifier.sent().is_empty());
    assert_eq!(page.call_count("select"), 0);
    assert_eq!(reporter.groups(), vec!["Navigation"]);
    assert_eq!(reporter.open_groups(), 0);

    let last = reporter.last().unwrap();
    assert_eq!(last.mark, Mark::Fail);
    assert_eq!(last.step, "Job Summary");
}

#[tokio::test]
async fn test_session_errors_skip_summary() {
    let config = config();
    // Nothing registered at the login URL, so loading it errors
    let page = FakePage::new();
    let reporter = MemoryReporter::new();
    let notifier = RecordingNotifier::new();

    let err = Watcher::new(&config, &reporter, &notifier)
        .run(&page)
        .await
        .unwrap_err();

    assert_eq!(err.exit_code(), 1);
    assert!(page.is_closed());
    assert!(!reporter.groups().iter().any(|g| g == "Run summary"));
}

/// Driver whose first page load panics; records whether it was closed
#[derive(Default)]
struct PanickingPage {
    closed: std::sync::atomic::AtomicBool,
}

#[async_trait::async_trait]
impl PageDriver for PanickingPage {
    async fn goto(&self, url: &str) -> anyhow::Result<()> {
        panic!("renderer crashed loading {}", url);
    }

    async fn wait_for_load(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn current_url(&self) -> anyhow::Result<String> {
        Ok(String::new())
    }

    async fn count(&self, _locator: &Locator) -> anyhow::Result<usize> {
        Ok(0)
    }

    async fn is_displayed(&self, _locator: &Locator) -> anyhow::Result<bool> {
        Ok(false)
    }

    async fn fill(&self, _locator: &Locator, _value: &str) -> anyhow::Result<()> {
        Ok(())
    }

    async fn click(&self, _locator: &Locator) -> anyhow::Result<()> {
        Ok(())
    }

    async fn check(&self, _locator: &Locator) -> anyhow::Result<()> {
        Ok(())
    }

    async fn select_options(
        &self,
        _control: &Locator,
    ) -> anyhow::Result<Vec<crate::types::SelectOption>> {
        Ok(Vec::new())
    }

    async fn select_option(
        &self,
        _control: &Locator,
        _option: &crate::types::SelectOption,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    async fn script_select(&self, _element_id: &str, _label: &str) -> anyhow::Result<()> {
        Ok(())
    }

    async fn first_table_rows(&self) -> anyhow::Result<Option<Vec<crate::types::TableRow>>> {
        Ok(None)
    }

    async fn close(&self) -> anyhow::Result<()> {
        self.closed.store(true, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn test_panic_still_closes_the_session() {
    let config = config();
    let page = PanickingPage::default();
    let reporter = MemoryReporter::new();
    let notifier = RecordingNotifier::new();

    let watcher = Watcher::new(&config, &reporter, &notifier);
    let outcome = AssertUnwindSafe(watcher.run(&page)).catch_unwind().await;

    assert!(outcome.is_err());
    assert!(page.closed.load(std::sync::atomic::Ordering::SeqCst));
    assert!(reporter.has(Mark::Fail, "Job Summary"));
    assert!(notifier.sent().is_empty());
}
