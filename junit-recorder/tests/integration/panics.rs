// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use camino_tempfile::tempdir;
use junit_recorder::{
    Test, TestSuite,
    time::ManualClock,
    traceback::{InternalFrames, StackFrame},
};
use junit_report::TestCaseStatus;

#[inline(never)]
fn divide(numerator: u32, denominator: u32) -> u32 {
    assert!(denominator != 0, "attempted to divide {numerator} by zero");
    numerator / denominator
}

#[test]
fn panicking_test_is_a_failure_with_trace() {
    let dir = tempdir().expect("created temp dir");
    let clock = ManualClock::new();
    let console = SharedBuffer::default();

    let mut suite = TestSuite::new("suite");
    suite.add_test(Test::new(identity("test_divide"), |_| {
        divide(4, 0);
        Ok(())
    }));

    let recorder = runner(quiet_config(dir.path()), &clock, &console)
        .run(&suite)
        .expect("run succeeds");

    assert_eq!(recorder.report().failures, 1);
    let case = &recorder.report().test_cases[0];
    let TestCaseStatus::NonSuccess {
        ty,
        message,
        description,
        ..
    } = &case.status
    else {
        panic!("expected a failure, found {:?}", case.status);
    };
    assert_eq!(ty.as_deref(), Some("std::panic"));
    assert_eq!(message.as_deref(), Some("attempted to divide 4 by zero"));

    let description = description.as_deref().expect("failure has a trace");
    assert!(
        description.starts_with("std::panic: attempted to divide 4 by zero\n"),
        "trace: {description}"
    );
    // Symbols may not resolve everywhere, so only check the frames that are shown.
    let internal = InternalFrames::default();
    for line in description.lines() {
        let Some((index, function)) = line.trim_start().split_once(": ") else {
            continue;
        };
        if index.parse::<usize>().is_ok() {
            assert!(!function.contains("invoke_test_body"), "trace: {description}");
            assert!(
                !internal.is_internal(&StackFrame::new(function)),
                "internal frame {function} shown in trace: {description}"
            );
        }
    }

    assert!(
        console.contents().contains("FAIL: test_divide (pkg.tests.MyCase)\n"),
        "console: {}",
        console.contents()
    );
}

#[test]
fn panics_after_a_run_use_the_previous_hook() {
    let dir = tempdir().expect("created temp dir");
    let clock = ManualClock::new();
    let console = SharedBuffer::default();

    let mut suite = TestSuite::new("suite");
    suite.add_test(Test::new(identity("test_panic"), |_| panic!("inside")));
    runner(quiet_config(dir.path()), &clock, &console)
        .run(&suite)
        .expect("run succeeds");

    // A panic outside any test body still unwinds normally.
    let result = std::panic::catch_unwind(|| panic!("outside"));
    assert!(result.is_err());
    assert_eq!(
        recorder_message(&dir),
        Some("inside".to_owned()),
        "the in-test panic message was recorded"
    );
}

fn recorder_message(dir: &camino_tempfile::Utf8TempDir) -> Option<String> {
    let report = read_report(dir.path());
    report
        .split_once(r#"message=""#)
        .and_then(|(_, rest)| rest.split_once('"'))
        .map(|(message, _)| message.to_owned())
}
