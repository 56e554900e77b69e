//! Fixed markup assumptions about the IPA CBT application site.

use crate::driver::{Locator, TextMatch};

pub const DEFAULT_LOGIN_URL: &str = "https://itee.ipa.go.jp/ipa/user/public/login/";
pub const DEFAULT_ENTRY_URL: &str = "https://itee.ipa.go.jp/ipa/user/public/cbt_entry/fc_fe/";

const EXAM_NAME: &str = "基本情報技術者試験(FE)";
const EXAM_SUBJECTS: [&str; 2] = ["科目A", "科目B"];
const APPLY_LINK: &str = "CBT試験申込";
const IDENTIFIER_LABEL: &str = "利用者ID";
const PASSWORD_LABEL: &str = "パスワード";
const LOGIN_BUTTON: &str = "ログイン";
const LOGOUT: &str = "ログアウト";
const RESUME: &str = "申込再開";
const START_INPUT: [&str; 2] = ["選択する", "入力はこちらから"];
const NEXT: &str = "次へ";
const ELIGIBILITY: &str = "学生";
const CONSENT: &str = "同意する";
const AREA_DATE_HEADING: &str = "エリア・日程選択";
const SEARCH: &str = "検索";

/// URLs and UI texts of the target site
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SiteProfile {
    pub login_url: String,
    pub entry_url: String,
    pub exam_name: String,
}

impl Default for SiteProfile {
    fn default() -> Self {
        SiteProfile {
            login_url: DEFAULT_LOGIN_URL.to_string(),
            entry_url: DEFAULT_ENTRY_URL.to_string(),
            exam_name: EXAM_NAME.to_string(),
        }
    }
}

impl SiteProfile {
    pub fn login_form(&self) -> Locator {
        Locator::tag("form")
    }

    pub fn identifier_candidates(&self) -> Vec<Locator> {
        vec![
            Locator::label(IDENTIFIER_LABEL),
            Locator::css("input[name='loginId']"),
            Locator::css("input[name='userId']"),
            Locator::css("#loginId"),
            Locator::css("#userId"),
            Locator::css("input[autocomplete='username']"),
            Locator::css("input[placeholder*='利用者ID']"),
            Locator::css("input[type='text']"),
        ]
    }

    pub fn password_candidates(&self) -> Vec<Locator> {
        vec![
            Locator::label(PASSWORD_LABEL),
            Locator::css("input[name='password']"),
            Locator::css("#password"),
            Locator::css("input[autocomplete='current-password']"),
            Locator::css("input[type='password']"),
        ]
    }

    pub fn login_submit_candidates(&self) -> Vec<Locator> {
        vec![
            Locator::button(TextMatch::exact(LOGIN_BUTTON)),
            Locator::css("input[type='submit']"),
        ]
    }

    pub fn logout_candidates(&self) -> Vec<Locator> {
        vec![
            Locator::link(TextMatch::contains(LOGOUT)),
            Locator::button(TextMatch::contains(LOGOUT)),
        ]
    }

    /// Single link naming both the exam and the application entry
    pub fn direct_entry_link(&self) -> Locator {
        Locator::link(TextMatch::ContainsAll(vec![
            self.exam_name.clone(),
            APPLY_LINK.to_string(),
        ]))
    }

    pub fn exam_link(&self) -> Locator {
        Locator::link(TextMatch::contains(self.exam_name.clone()))
    }

    pub fn apply_link(&self) -> Locator {
        Locator::link(TextMatch::contains(APPLY_LINK))
    }

    pub fn resume_candidates(&self) -> Vec<Locator> {
        vec![
            Locator::button(TextMatch::contains(RESUME)),
            Locator::link(TextMatch::contains(RESUME)),
        ]
    }

    pub fn start_input_candidates(&self) -> Vec<Locator> {
        let mut candidates: Vec<Locator> = START_INPUT
            .iter()
            .map(|t| Locator::button(TextMatch::contains(*t)))
            .collect();
        candidates.extend(
            START_INPUT
                .iter()
                .map(|t| Locator::link(TextMatch::contains(*t))),
        );
        candidates
    }

    /// "Next" inside the exam row first, then any "next" on the page
    pub fn exam_next_candidates(&self) -> Vec<Locator> {
        let mut row = vec![self.exam_name.clone()];
        row.extend(EXAM_SUBJECTS.iter().map(|s| s.to_string()));
        vec![
            Locator::in_row(TextMatch::ContainsAll(row), self.next_button()),
            self.next_button(),
        ]
    }

    pub fn next_button(&self) -> Locator {
        Locator::button(TextMatch::exact(NEXT))
    }

    pub fn eligibility(&self) -> Locator {
        Locator::label(ELIGIBILITY)
    }

    pub fn consent(&self) -> Locator {
        Locator::label(CONSENT)
    }

    pub fn area_date_heading(&self) -> Locator {
        Locator::text(TextMatch::contains(AREA_DATE_HEADING))
    }

    pub fn search_button(&self) -> Locator {
        Locator::button(TextMatch::exact(SEARCH))
    }
}
