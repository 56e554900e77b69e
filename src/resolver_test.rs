use super::*;
use crate::driver::TextMatch;
use crate::fake::{FakePage, Screen};
use crate::reporter::{Mark, MemoryReporter};

const URL: &str = "https://site.test/login";

fn candidates() -> Vec<Locator> {
    vec![
        Locator::label("利用者ID"),
        Locator::css("input[name='loginId']"),
        Locator::css("#loginId"),
    ]
}

#[tokio::test]
async fn test_first_success_short_circuits() {
    let page = FakePage::new().screen(
        Screen::new(URL)
            .with(Locator::label("利用者ID"))
            .with(Locator::css("#loginId")),
    );
    page.goto(URL).await.unwrap();
    let reporter = MemoryReporter::new();
    let resolver = SelectorResolver::new(&page, &reporter, Duration::from_secs(1));

    let list = candidates();
    let used = resolver
        .resolve("identifier", &list, Action::Fill("user"))
        .await
        .unwrap();

    assert_eq!(used, &Locator::label("利用者ID"));
    assert_eq!(page.call_count("fill"), 1);
    assert_eq!(reporter.count(Mark::Pass), 1);
    assert_eq!(reporter.count(Mark::Warn), 0);
}

#[tokio::test]
async fn test_absent_candidates_are_skipped_silently() {
    let page = FakePage::new().screen(Screen::new(URL).with(Locator::css("#loginId")));
    page.goto(URL).await.unwrap();
    let reporter = MemoryReporter::new();
    let resolver = SelectorResolver::new(&page, &reporter, Duration::from_secs(1));

    let list = candidates();
    let used = resolver
        .resolve("identifier", &list, Action::Fill("user"))
        .await
        .unwrap();

    assert_eq!(used, &Locator::css("#loginId"));
    assert_eq!(page.calls(), vec!["goto https://site.test/login", "fill css=#loginId"]);
    assert!(reporter.by_step(Mark::Warn, "identifier").is_empty());

    let pass = reporter.by_step(Mark::Pass, "identifier");
    assert_eq!(pass[0].detail, "fill via css=#loginId");
}

#[tokio::test]
async fn test_failing_candidate_warns_then_falls_through() {
    let page = FakePage::new().screen(
        Screen::new(URL)
            .failing(Locator::label("利用者ID"))
            .with(Locator::css("input[name='loginId']")),
    );
    page.goto(URL).await.unwrap();
    let reporter = MemoryReporter::new();
    let resolver = SelectorResolver::new(&page, &reporter, Duration::from_secs(1));

    let list = candidates();
    let used = resolver
        .resolve("identifier", &list, Action::Fill("user"))
        .await
        .unwrap();

    assert_eq!(used, &Locator::css("input[name='loginId']"));
    let warnings = reporter.by_step(Mark::Warn, "identifier");
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].detail.contains("label=利用者ID"));
    assert!(warnings[0].detail.contains("not interactable"));
    assert_eq!(page.filled().len(), 1);
}

#[tokio::test]
async fn test_exhaustion_fails_with_counts() {
    let page = FakePage::new().screen(Screen::new(URL).failing(Locator::css("#loginId")));
    page.goto(URL).await.unwrap();
    let reporter = MemoryReporter::new();
    let resolver = SelectorResolver::new(&page, &reporter, Duration::from_secs(1));

    let list = candidates();
    let err = resolver
        .resolve("identifier", &list, Action::Fill("user"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        Unresolved {
            step: "identifier".to_string(),
            action: "fill".to_string(),
            candidates: 3,
            attempted: 1,
        }
    );
    assert!(reporter.has(Mark::Fail, "identifier"));
    assert_eq!(reporter.last().unwrap().mark, Mark::Fail);
}

#[tokio::test]
async fn test_fill_value_never_reported() {
    let page = FakePage::new().screen(Screen::new(URL).with(Locator::css("#password")));
    page.goto(URL).await.unwrap();
    let reporter = MemoryReporter::new();
    let resolver = SelectorResolver::new(&page, &reporter, Duration::from_secs(1));

    resolver
        .resolve_one("password", &Locator::css("#password"), Action::Fill("hunter2"))
        .await
        .unwrap();

    assert!(reporter.reports().iter().all(|r| !r.detail.contains("hunter2")));
    assert_eq!(
        page.filled(),
        vec![("css=#password".to_string(), "hunter2".to_string())]
    );
}

#[tokio::test]
async fn test_first_present_does_not_act() {
    let logout = Locator::link(TextMatch::contains("ログアウト"));
    let page = FakePage::new().screen(Screen::new(URL).with(logout.clone()));
    page.goto(URL).await.unwrap();
    let reporter = MemoryReporter::new();
    let resolver = SelectorResolver::new(&page, &reporter, Duration::from_secs(1));

    let list = vec![Locator::css("#missing"), logout.clone()];
    assert_eq!(resolver.first_present(&list).await, Some(&logout));
    assert_eq!(page.call_count("click"), 0);
    assert!(reporter.reports().is_empty());

    let none = vec![Locator::css("#missing")];
    assert_eq!(resolver.first_present(&none).await, None);
}

#[tokio::test]
async fn test_attempt_reports_failure_as_warning() {
    let consent = Locator::css("#consent");
    let page = FakePage::new().screen(
        Screen::new(URL)
            .failing(Locator::css("#eligible"))
            .with(consent.clone()),
    );
    page.goto(URL).await.unwrap();
    let reporter = MemoryReporter::new();
    let resolver = SelectorResolver::new(&page, &reporter, Duration::from_secs(1));

    assert!(!resolver.attempt("eligibility", &Locator::css("#eligible"), Action::Check).await);
    assert!(resolver.attempt("consent", &consent, Action::Check).await);
    assert!(!resolver.attempt("next", &Locator::css("#next"), Action::Click).await);

    assert_eq!(reporter.count(Mark::Fail), 0);
    assert!(reporter.by_step(Mark::Warn, "eligibility")[0].detail.contains("failed"));
    assert_eq!(reporter.by_step(Mark::Pass, "consent")[0].detail, "check via css=#consent");
    // Absent controls leave no report at all
    assert!(reporter.by_step(Mark::Warn, "next").is_empty());
    assert_eq!(page.call_count("click"), 0);
}
