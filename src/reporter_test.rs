// Unit tests for reporters

use super::*;

#[test]
fn test_escape_data() {
    assert_eq!(escape_data("100% done"), "100%25 done");
    assert_eq!(escape_data("a\nb\r\n"), "a%0Ab%0D%0A");
    assert_eq!(escape_data("plain"), "plain");
}

#[test]
fn test_escape_property() {
    assert_eq!(escape_property("step: one, two"), "step%3A one%2C two");
    assert_eq!(escape_property("会場一致"), "会場一致");
}

#[test]
fn test_memory_reporter_records_in_order() {
    let reporter = MemoryReporter::new();
    reporter.pass("login", "ok");
    reporter.warn("resume", "absent");
    reporter.fail("select", "missing");
    reporter.info("count: 0");

    let reports = reporter.reports();
    assert_eq!(reports.len(), 4);
    assert_eq!(reports[0].mark, Mark::Pass);
    assert_eq!(reports[1].step, "resume");
    assert_eq!(reports[3].mark, Mark::Info);
    assert_eq!(reporter.count(Mark::Warn), 1);
    assert!(reporter.has(Mark::Fail, "select"));
    assert!(!reporter.has(Mark::Fail, "login"));
}

#[test]
fn test_check_and_require() {
    let reporter = MemoryReporter::new();
    assert!(reporter.check(true, "a", "ok", "ng"));
    assert!(!reporter.check(false, "b", "ok", "ng"));
    assert!(reporter.has(Mark::Pass, "a"));
    assert!(reporter.has(Mark::Fail, "b"));

    let ok = reporter.require(true, "c", "ok", "ng", WatcherError::LoginFailed("x".into()));
    assert!(ok.is_ok());

    let err = reporter
        .require(false, "d", "ok", "ng", WatcherError::LoginFailed("x".into()))
        .unwrap_err();
    assert_eq!(err.exit_code(), 4);
    assert_eq!(reporter.last().unwrap().detail, "ng");
}

#[test]
fn test_group_guard_closes_on_drop() {
    let memory = MemoryReporter::new();
    let reporter: &dyn Reporter = &memory;
    {
        let _outer = reporter.group("outer");
        assert_eq!(memory.open_groups(), 1);
        {
            let _inner = reporter.group("inner");
            assert_eq!(memory.open_groups(), 2);
        }
        assert_eq!(memory.open_groups(), 1);
    }
    assert_eq!(memory.open_groups(), 0);
    assert_eq!(memory.groups(), vec!["outer".to_string(), "inner".to_string()]);
}

#[test]
fn test_mark_display() {
    assert_eq!(Mark::Pass.to_string(), "PASS");
    assert_eq!(Mark::Fail.to_string(), "FAIL");
}

#[test]
fn test_json_output_disables_annotations() {
    assert!(ConsoleReporter::for_output(false, OutputFormat::Text).annotations());
    assert!(!ConsoleReporter::for_output(false, OutputFormat::Json).annotations());
    assert!(!ConsoleReporter::for_output(true, OutputFormat::Text).annotations());
    assert!(!ConsoleReporter::for_output(true, OutputFormat::Json).annotations());
}
