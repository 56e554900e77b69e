// Unit tests for locator compilation

use super::*;

#[test]
fn test_xpath_literal_quoting() {
    assert_eq!(xpath_literal("検索"), "'検索'");
    assert_eq!(xpath_literal("it's"), "\"it's\"");
    assert_eq!(
        xpath_literal(r#"a'b"c"#),
        r#"concat('a', "'", 'b"c')"#
    );
}

#[test]
fn test_css_locator_has_no_xpath() {
    let loc = Locator::css("input[name='loginId']");
    assert_eq!(loc.as_css(), Some("input[name='loginId']"));
    assert_eq!(loc.to_xpath(), None);
    assert_eq!(loc.to_string(), "css=input[name='loginId']");
}

#[test]
fn test_link_xpath() {
    let loc = Locator::link(TextMatch::contains("申込再開"));
    assert_eq!(
        loc.to_xpath().unwrap(),
        "//a[contains(normalize-space(.), '申込再開')]"
    );
}

#[test]
fn test_button_xpath_covers_inputs() {
    let xpath = Locator::button(TextMatch::exact("検索")).to_xpath().unwrap();
    assert!(xpath.starts_with("//*[self::button or self::input"));
    assert!(xpath.contains("normalize-space(.)='検索'"));
    assert!(xpath.contains("normalize-space(@value)='検索'"));
}

#[test]
fn test_contains_all_joins_predicates() {
    let m = TextMatch::ContainsAll(vec!["科目A".to_string(), "科目B".to_string()]);
    let xpath = Locator::text(m).to_xpath().unwrap();
    assert_eq!(
        xpath,
        "//*[text()[contains(normalize-space(.), '科目A') and contains(normalize-space(.), '科目B')]]"
    );
}

#[test]
fn test_label_xpath_matches_for_and_wrapping_label() {
    let xpath = Locator::label("利用者ID").to_xpath().unwrap();
    assert!(xpath.contains("@id=//label[normalize-space(.)='利用者ID']/@for"));
    assert!(xpath.contains("ancestor::label[normalize-space(.)='利用者ID']"));
}

#[test]
fn test_row_scoped_xpath() {
    let loc = Locator::in_headed_row(TextMatch::contains("地域"), Locator::tag("select"));
    assert_eq!(
        loc.to_xpath().unwrap(),
        "(//tr[*[1][self::th or self::td][contains(normalize-space(.), '地域')]])[1]//select"
    );
    assert_eq!(loc.to_string(), "row-header[*地域*] >> tag=select");

    let loc = Locator::in_row(
        TextMatch::contains("基本情報"),
        Locator::button(TextMatch::exact("次へ")),
    );
    let xpath = loc.to_xpath().unwrap();
    assert!(xpath.starts_with("(//tr[contains(normalize-space(.), '基本情報')])[1]//*[self::button"));
}

#[test]
fn test_row_scope_rejects_css_target() {
    let loc = Locator::in_row(TextMatch::contains("x"), Locator::css("select"));
    assert_eq!(loc.to_xpath(), None);
}

#[test]
fn test_action_display_hides_fill_value() {
    assert_eq!(Action::Fill("secret").to_string(), "fill");
    assert_eq!(Action::Click.to_string(), "click");
    assert_eq!(Action::Check.to_string(), "check");
}
