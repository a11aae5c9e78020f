// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::Utf8Path;
use junit_recorder::{
    SuiteRunner, SuiteRunnerConfig, TestIdentity, reporter::Color, time::ManualClock,
};
use std::{
    cell::RefCell,
    fs,
    io::{self, Write},
    rc::Rc,
};

/// A console stream whose contents can be read back after a run.
#[derive(Clone, Debug, Default)]
pub(crate) struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub(crate) fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).expect("console output is UTF-8")
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub(crate) fn identity(method: &str) -> TestIdentity {
    TestIdentity::new("pkg::tests", "MyCase", method)
}

/// Returns a quiet, uncolored config writing into `output_dir`.
pub(crate) fn quiet_config(output_dir: &Utf8Path) -> SuiteRunnerConfig {
    let mut config = SuiteRunnerConfig::new();
    config
        .set_output_dir(output_dir)
        .set_verbosity(0)
        .set_color(Color::Never);
    config
}

/// Builds a runner whose clock is `clock` and whose console output goes to `console`.
pub(crate) fn runner(
    config: SuiteRunnerConfig,
    clock: &ManualClock,
    console: &SharedBuffer,
) -> SuiteRunner {
    let clock = clock.clone();
    let console = console.clone();
    SuiteRunner::new(config)
        .with_clock(move || clock.clone())
        .with_stream(move || console.clone())
}

pub(crate) fn read_report(output_dir: &Utf8Path) -> String {
    fs::read_to_string(output_dir.join("junit.xml")).expect("report was written")
}
