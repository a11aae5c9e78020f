// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use camino_tempfile::tempdir;
use indoc::indoc;
use junit_recorder::{
    RunState, SuiteRunnerConfig, Test, TestError, TestSuite, check, errors::WriteReportError,
    reporter::Color, time::ManualClock,
};
use pretty_assertions::assert_eq;
use std::{fs, io::Write, time::Duration};
use test_case::test_case;

#[test]
fn passing_test() {
    let dir = tempdir().expect("created temp dir");
    let clock = ManualClock::new();
    let console = SharedBuffer::default();

    let body_clock = clock.clone();
    let mut suite = TestSuite::new("suite");
    suite.add_test(Test::new(identity("test_ok"), move |_| {
        body_clock.advance(Duration::from_millis(10));
        Ok(())
    }));

    let recorder = runner(quiet_config(dir.path()), &clock, &console)
        .run(&suite)
        .expect("run succeeds");

    assert_eq!(recorder.state(), RunState::Finalized);
    assert!(recorder.was_successful());
    assert_eq!(
        read_report(dir.path()),
        indoc! {r#"
            <?xml version="1.0" encoding="UTF-8"?>
            <testsuite name="Django Project Tests" tests="1" errors="0" failures="0" skips="0" time="0.010">
                <testcase classname="pkg.tests.MyCase" name="test_ok" time="0.010000"/>
            </testsuite>
        "#}
    );
    assert_eq!(
        console.contents(),
        indoc! {"
            ----------------------------------------------------------------------
            Ran 1 test in 0.010s

            OK
        "}
    );
}

#[test]
fn failing_test() {
    let dir = tempdir().expect("created temp dir");
    let clock = ManualClock::new();
    let console = SharedBuffer::default();

    let mut suite = TestSuite::new("suite");
    suite.add_test(Test::new(identity("test_fail"), |_| {
        let (left, right) = (1, 2);
        check!(left == right, "{left} != {right}");
        Ok(())
    }));

    let recorder = runner(quiet_config(dir.path()), &clock, &console)
        .run(&suite)
        .expect("run succeeds");

    assert!(!recorder.was_successful());
    let report = read_report(dir.path());
    assert!(
        report.contains(r#"tests="1" errors="0" failures="1" skips="0""#),
        "report: {report}"
    );
    assert!(
        report.contains(r#"<failure type="std::panic" message="1 != 2">std::panic: 1 != 2"#),
        "report: {report}"
    );

    let console = console.contents();
    assert!(
        console.contains("FAIL: test_fail (pkg.tests.MyCase)\n"),
        "console: {console}"
    );
    assert!(console.contains("FAILED (failures=1)\n"), "console: {console}");
}

#[test]
fn erroring_test() {
    let dir = tempdir().expect("created temp dir");
    let clock = ManualClock::new();
    let console = SharedBuffer::default();

    let mut suite = TestSuite::new("suite");
    suite.add_test(Test::new(identity("test_error"), |_| {
        fs::read("/this/path/does/not/exist")?;
        Ok(())
    }));

    let recorder = runner(quiet_config(dir.path()), &clock, &console)
        .run(&suite)
        .expect("run succeeds");

    assert_eq!(recorder.report().errors, 1);
    let report = read_report(dir.path());
    assert!(
        report.contains(r#"<error type="std::io::error::Error" message=""#),
        "report: {report}"
    );
    assert!(
        console.contents().contains("ERROR: test_error (pkg.tests.MyCase)\n"),
        "console: {}",
        console.contents()
    );
}

#[test]
fn skipped_test() {
    let dir = tempdir().expect("created temp dir");
    let clock = ManualClock::new();
    let console = SharedBuffer::default();

    let mut suite = TestSuite::new("suite");
    suite.add_test(Test::new(identity("test_skip"), |_| Ok(())).skip("flaky"));

    runner(quiet_config(dir.path()), &clock, &console)
        .run(&suite)
        .expect("run succeeds");

    assert_eq!(
        read_report(dir.path()),
        indoc! {r#"
            <?xml version="1.0" encoding="UTF-8"?>
            <testsuite name="Django Project Tests" tests="1" errors="0" failures="0" skips="1" time="0.000">
                <testcase classname="pkg.tests.MyCase" name="test_skip" time="0.000000">
                    <skipped message="Test Skipped: flaky"/>
                </testcase>
            </testsuite>
        "#}
    );
}

#[test]
fn buffered_output_is_recorded() {
    let dir = tempdir().expect("created temp dir");
    let clock = ManualClock::new();
    let console = SharedBuffer::default();

    let mut suite = TestSuite::new("suite");
    suite.add_tests([
        Test::new(identity("test_chatty"), |ctx| {
            writeln!(ctx.stdout(), "hello <world>")?;
            writeln!(ctx.stderr(), "careful & slow")?;
            Ok(())
        }),
        Test::new(identity("test_chatty_fail"), |ctx| {
            writeln!(ctx.stdout(), "about to fail")?;
            Err(TestError::fail("boom"))
        }),
    ]);

    runner(quiet_config(dir.path()), &clock, &console)
        .run(&suite)
        .expect("run succeeds");

    assert_eq!(
        read_report(dir.path()),
        indoc! {r#"
            <?xml version="1.0" encoding="UTF-8"?>
            <testsuite name="Django Project Tests" tests="2" errors="0" failures="1" skips="0" time="0.000">
                <testcase classname="pkg.tests.MyCase" name="test_chatty" time="0.000000">
                    <system-out>hello &lt;world&gt;
            </system-out>
                    <system-err>careful &amp; slow
            </system-err>
                </testcase>
                <testcase classname="pkg.tests.MyCase" name="test_chatty_fail" time="0.000000">
                    <failure type="std::panic" message="boom">std::panic: boom

            Stdout:
            about to fail
            </failure>
                    <system-out>about to fail
            </system-out>
                </testcase>
            </testsuite>
        "#}
    );
}

#[test]
fn debug_mode_records_no_output() {
    let dir = tempdir().expect("created temp dir");
    let clock = ManualClock::new();
    let console = SharedBuffer::default();

    let mut suite = TestSuite::new("suite");
    suite.add_test(Test::new(identity("test_chatty"), |ctx| {
        writeln!(ctx.stdout(), "debug output goes straight to the terminal")?;
        Err(TestError::fail("boom"))
    }));

    let mut config = quiet_config(dir.path());
    config.set_debug(true);
    runner(config, &clock, &console)
        .run(&suite)
        .expect("run succeeds");

    let report = read_report(dir.path());
    assert!(!report.contains("<system-out>"), "report: {report}");
    assert!(!report.contains("<system-err>"), "report: {report}");
    assert!(!report.contains("Stdout:"), "report: {report}");
    assert!(
        report.contains(r#"<failure type="std::panic" message="boom">std::panic: boom"#),
        "report: {report}"
    );
}

#[test]
fn nested_output_dir_is_created() {
    let dir = tempdir().expect("created temp dir");
    let output_dir = dir.path().join("target/reports/junit");
    let clock = ManualClock::new();
    let console = SharedBuffer::default();

    let mut suite = TestSuite::new("suite");
    suite.add_test(Test::new(identity("test_ok"), |_| Ok(())));

    let runner = runner(quiet_config(&output_dir), &clock, &console);
    let recorder = runner.run(&suite).expect("first run succeeds");
    let first = read_report(&output_dir);

    // Writing again, and running again into the existing directory, overwrites the file.
    let path = recorder
        .serialize(&output_dir)
        .expect("serializing again succeeds");
    assert_eq!(path, output_dir.join("junit.xml"));
    assert_eq!(read_report(&output_dir), first);

    runner.run(&suite).expect("second run succeeds");
    assert_eq!(read_report(&output_dir), first);
}

#[test]
fn empty_suite() {
    let dir = tempdir().expect("created temp dir");
    let clock = ManualClock::new();
    let console = SharedBuffer::default();

    let recorder = runner(quiet_config(dir.path()), &clock, &console)
        .run(&TestSuite::new("empty"))
        .expect("run succeeds");

    assert!(recorder.was_successful());
    assert_eq!(
        read_report(dir.path()),
        indoc! {r#"
            <?xml version="1.0" encoding="UTF-8"?>
            <testsuite name="Django Project Tests" tests="0" errors="0" failures="0" skips="0" time="0.000"/>
        "#}
    );
    assert!(
        console.contents().contains("Ran 0 tests in 0.000s\n"),
        "console: {}",
        console.contents()
    );
}

#[test]
fn expected_failures_and_unexpected_successes() {
    let dir = tempdir().expect("created temp dir");
    let clock = ManualClock::new();
    let console = SharedBuffer::default();

    let mut suite = TestSuite::new("suite");
    suite.add_tests([
        Test::new(identity("test_known_bug"), |_| Err(TestError::fail("still broken")))
            .expected_failure(),
        Test::new(identity("test_fixed_bug"), |_| Ok(())).expected_failure(),
    ]);

    let mut config = quiet_config(dir.path());
    config.set_report_name("bugs");
    let recorder = runner(config, &clock, &console)
        .run(&suite)
        .expect("run succeeds");

    assert!(!recorder.was_successful());
    assert_eq!(
        read_report(dir.path()),
        indoc! {r#"
            <?xml version="1.0" encoding="UTF-8"?>
            <testsuite name="bugs" tests="2" errors="0" failures="0" skips="2" time="0.000">
                <testcase classname="pkg.tests.MyCase" name="test_known_bug" time="0.000000">
                    <skipped type="std::panic" message="still broken">std::panic: still broken
            </skipped>
                </testcase>
                <testcase classname="pkg.tests.MyCase" name="test_fixed_bug" time="0.000000">
                    <skipped message="Test Skipped: Unexpected Success"/>
                </testcase>
            </testsuite>
        "#}
    );
    assert!(
        console
            .contents()
            .contains("FAILED (expected failures=1, unexpected successes=1)\n"),
        "console: {}",
        console.contents()
    );
}

#[test]
fn fail_fast_stops_after_first_failure() {
    let dir = tempdir().expect("created temp dir");
    let clock = ManualClock::new();
    let console = SharedBuffer::default();

    let mut suite = TestSuite::new("suite");
    suite.add_tests([
        Test::new(identity("test_a"), |_| Ok(())),
        Test::new(identity("test_b"), |_| Err(TestError::fail("boom"))),
        Test::new(identity("test_c"), |_| Ok(())),
    ]);

    let mut config = quiet_config(dir.path());
    config.set_fail_fast(true);
    let recorder = runner(config, &clock, &console)
        .run(&suite)
        .expect("run succeeds");

    assert_eq!(recorder.tests_run(), 2);
    assert_eq!(recorder.report().tests, 2);
    assert!(!read_report(dir.path()).contains("test_c"));
}

#[test]
fn verbose_progress() {
    let dir = tempdir().expect("created temp dir");
    let clock = ManualClock::new();
    let console = SharedBuffer::default();

    let mut suite = TestSuite::new("suite");
    suite.add_tests([
        Test::new(identity("test_ok"), |_| Ok(())),
        Test::new(identity("test_skip"), |_| Ok(())).skip("flaky"),
    ]);

    let mut config = quiet_config(dir.path());
    config.set_verbosity(2);
    runner(config, &clock, &console)
        .run(&suite)
        .expect("run succeeds");

    assert_eq!(
        console.contents(),
        indoc! {r#"
            test_ok (pkg.tests.MyCase) ... ok
            test_skip (pkg.tests.MyCase) ... skipped 'flaky'
            ----------------------------------------------------------------------
            Ran 2 tests in 0.000s

            OK (skipped=1)
        "#}
    );
}

#[test]
fn failing_fixture_is_reported_as_error() {
    let dir = tempdir().expect("created temp dir");
    let clock = ManualClock::new();
    let console = SharedBuffer::default();

    let mut suite = TestSuite::new("Suite");
    suite
        .add_test(Test::new(identity("test_ok"), |_| Ok(())))
        .set_before_all(|_| Err(TestError::fail("no database")));

    let recorder = runner(quiet_config(dir.path()), &clock, &console)
        .run(&suite)
        .expect("run succeeds");

    assert_eq!(recorder.tests_run(), 0);
    assert_eq!(
        read_report(dir.path()),
        indoc! {r#"
            <?xml version="1.0" encoding="UTF-8"?>
            <testsuite name="Django Project Tests" tests="0" errors="1" failures="0" skips="0" time="0.000">
                <testcase classname="Suite" name="before_all (Suite)" time="0.000000">
                    <error type="std::panic" message="no database">std::panic: no database
            </error>
                </testcase>
            </testsuite>
        "#}
    );
}

#[test]
fn failing_after_all_does_not_count_as_a_test() {
    let dir = tempdir().expect("created temp dir");
    let clock = ManualClock::new();
    let console = SharedBuffer::default();

    let mut suite = TestSuite::new("Suite");
    suite
        .add_test(Test::new(identity("test_ok"), |_| Ok(())))
        .set_after_all(|_| Err(TestError::fail("cleanup failed")));

    let recorder = runner(quiet_config(dir.path()), &clock, &console)
        .run(&suite)
        .expect("run succeeds");

    assert_eq!(recorder.tests_run(), 1);
    assert_eq!(recorder.report().tests, 1);
    assert_eq!(recorder.report().errors, 1);
    assert_eq!(recorder.report().test_cases.len(), 2);
    let report = read_report(dir.path());
    assert!(
        report.contains(r#"tests="1" errors="1" failures="0" skips="0""#),
        "report: {report}"
    );
    assert!(
        report.contains(r#"<testcase classname="Suite" name="after_all (Suite)""#),
        "report: {report}"
    );
    let console = console.contents();
    assert!(console.contains("Ran 1 test in "), "console: {console}");
    assert!(console.contains("FAILED (errors=1)\n"), "console: {console}");
}

#[test_case(Color::Auto, false; "auto")]
#[test_case(Color::Never, false; "never")]
#[test_case(Color::Always, true; "always")]
fn custom_stream_colorization(color: Color, colorized: bool) {
    let dir = tempdir().expect("created temp dir");
    let clock = ManualClock::new();
    let console = SharedBuffer::default();

    let mut suite = TestSuite::new("suite");
    suite.add_test(Test::new(identity("test_ok"), |_| Ok(())));

    let mut config = quiet_config(dir.path());
    config.set_verbosity(1).set_color(color);
    runner(config, &clock, &console)
        .run(&suite)
        .expect("run succeeds");

    let console = console.contents();
    assert_eq!(console.contains('\x1b'), colorized, "console: {console:?}");
}

#[test]
fn unwritable_output_dir() {
    let dir = tempdir().expect("created temp dir");
    let blocker = dir.path().join("file");
    fs::write(&blocker, "not a directory").expect("wrote file");
    let clock = ManualClock::new();
    let console = SharedBuffer::default();

    let error = runner(quiet_config(&blocker.join("reports")), &clock, &console)
        .run(&TestSuite::new("suite"))
        .expect_err("cannot create a directory under a file");
    assert!(
        matches!(error, WriteReportError::Fs { .. }),
        "unexpected error: {error:?}"
    );
}

#[test]
fn default_config() {
    let config = SuiteRunnerConfig::default();
    assert_eq!(config.output_dir(), "reports");
    assert!(!config.debug());
    assert_eq!(config.verbosity(), 1);

    let options = config.recorder_options();
    assert!(options.buffer);
    assert!(!options.fail_fast);
    assert_eq!(options.report_name, "Django Project Tests");
}
