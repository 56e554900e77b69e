// Common test fixtures: configuration and a scripted copy of the booking site

#![allow(dead_code)]

use std::collections::HashMap;
use std::time::Duration;

use seatwatch::fake::{FakePage, Screen, cell, link_cell, row};
use seatwatch::filter::FilterField;
use seatwatch::types::TableRow;
use seatwatch::{Config, Locator, TextMatch, Timeouts};

pub const LOGIN: &str = "https://site.test/login";
pub const MENU: &str = "https://site.test/menu";
pub const ENTRY: &str = "https://site.test/entry";
pub const EXAM: &str = "https://site.test/exam";
pub const SURVEY: &str = "https://site.test/survey";
pub const AREA: &str = "https://site.test/area";

/// Get browser type from environment, defaulting to firefox
pub fn get_test_browser() -> &'static str {
    match std::env::var("TEST_BROWSER") {
        Ok(browser) if browser == "chrome" => "chrome",
        _ => "firefox",
    }
}

/// Short waits so population timeouts do not slow the suite down
pub fn fast_timeouts() -> Timeouts {
    Timeouts {
        action: Duration::from_secs(1),
        populate: Duration::from_millis(50),
        page_load: Duration::from_secs(1),
        poll: Duration::from_millis(10),
    }
}

/// Config pointed at the scripted site; `overrides` replace or add variables
pub fn config_with(overrides: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = [
        ("IPA_USER_ID", "demo"),
        ("IPA_PASSWORD", "demo-pass"),
        ("IPA_LOGIN_URL", LOGIN),
        ("IPA_ENTRY_URL", ENTRY),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (k, v) in overrides {
        vars.insert(k.to_string(), v.to_string());
    }
    let mut config = Config::from_lookup(|key: &str| vars.get(key).cloned())
        .expect("test config should load");
    config.timeouts = fast_timeouts();
    config
}

pub fn config() -> Config {
    config_with(&[])
}

fn logout() -> Locator {
    Locator::link(TextMatch::contains("ログアウト"))
}

/// Login screen; `form` false drops the form element
pub fn login_screen(config: &Config, form: bool) -> Screen {
    let screen = Screen::new(LOGIN)
        .with(Locator::label("利用者ID"))
        .with(Locator::label("パスワード"))
        .link(Locator::button(TextMatch::exact("ログイン")), MENU);
    if form {
        screen.with(config.site.login_form())
    } else {
        screen
    }
}

/// Area/date page: widget-only region, native prefecture/month/day selects
pub fn area_screen(config: &Config) -> Screen {
    Screen::new(AREA)
        .with(config.site.area_date_heading())
        .select(
            FilterField::Region.widget_locator(),
            &["選択してください", "関東", "九州・沖縄"],
        )
        .hidden(FilterField::Region.native_locator())
        .select(
            FilterField::Prefecture.native_locator(),
            &["選択してください", "福岡県", "沖縄県"],
        )
        .select(
            FilterField::Month.native_locator(),
            &["選択してください", "2025年10月", "2025年11月", "2025年12月"],
        )
        .select(
            FilterField::Day.native_locator(),
            &["日を選択", "1日〜15日", "16日〜末日"],
        )
        .search(config.site.search_button())
        .link(logout(), LOGIN)
}

/// Results table; Naha shows an open slot only when `open`
pub fn results(open: bool) -> Vec<TableRow> {
    let naha = if open {
        link_cell("○", "/slot/1")
    } else {
        cell("×")
    };
    vec![
        row(vec![cell("会場"), cell("空き状況")]),
        row(vec![
            link_cell("沖縄県庁前テストセンター", "/center/2"),
            cell("×"),
        ]),
        row(vec![link_cell("那覇テストセンター", "/center/1"), naha]),
        row(vec![cell("福岡テストセンター"), cell("○")]),
    ]
}

/// Every screen from login to the area/date page
pub fn booking_site(config: &Config) -> FakePage {
    let site = &config.site;
    FakePage::new()
        .screen(login_screen(config, true))
        .screen(
            Screen::new(MENU)
                .link(site.direct_entry_link(), ENTRY)
                .with(logout()),
        )
        .screen(
            Screen::new(ENTRY)
                .link(Locator::button(TextMatch::contains("申込再開")), EXAM)
                .with(logout()),
        )
        .screen(
            Screen::new(EXAM)
                .link(site.exam_next_candidates()[0].clone(), SURVEY)
                .with(logout()),
        )
        .screen(
            Screen::new(SURVEY)
                .with(site.eligibility())
                .with(site.consent())
                .link(site.next_button(), AREA),
        )
        .screen(area_screen(config))
}

/// Booking site where Naha has one open slot in the first half of November 2025
pub fn okinawa_site(config: &Config) -> FakePage {
    booking_site(config)
        .results(&["沖縄県", "2025年11月", "1日〜15日"], results(true))
        .results(&[], results(false))
}
