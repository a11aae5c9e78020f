// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serialize a `Report`.

use crate::{NonSuccessKind, Report, TestCase, TestCaseStatus, XmlString};
use quick_xml::{
    Writer,
    escape::escape,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event, attributes::Attribute},
    name::QName,
};
use std::{borrow::Cow, io, time::Duration};

static TESTSUITE_TAG: &str = "testsuite";
static TESTCASE_TAG: &str = "testcase";
static FAILURE_TAG: &str = "failure";
static ERROR_TAG: &str = "error";
static SKIPPED_TAG: &str = "skipped";
static SYSTEM_OUT_TAG: &str = "system-out";
static SYSTEM_ERR_TAG: &str = "system-err";

pub(crate) fn serialize_report(report: &Report, writer: impl io::Write) -> quick_xml::Result<()> {
    let mut writer = Writer::new_with_indent(writer, b' ', 4);

    let decl = BytesDecl::new("1.0", Some("UTF-8"), None);
    writer.write_event(Event::Decl(decl))?;

    serialize_report_impl(report, &mut writer)?;

    // Add a trailing newline.
    writer.write_indent()
}

fn serialize_report_impl(
    report: &Report,
    writer: &mut Writer<impl io::Write>,
) -> quick_xml::Result<()> {
    // Use the destructuring syntax to ensure that all fields are handled.
    let Report {
        name,
        tests,
        errors,
        failures,
        skips,
        time,
        test_cases,
    } = report;

    let mut testsuite_tag = BytesStart::new(TESTSUITE_TAG);
    testsuite_tag.push_attribute(escaped_attribute("name", name));
    testsuite_tag.extend_attributes([
        ("tests", tests.to_string().as_str()),
        ("errors", errors.to_string().as_str()),
        ("failures", failures.to_string().as_str()),
        ("skips", skips.to_string().as_str()),
    ]);
    if let Some(time) = time {
        testsuite_tag.push_attribute(("time", serialize_suite_time(time).as_str()));
    }

    if test_cases.is_empty() {
        return writer.write_event(Event::Empty(testsuite_tag));
    }

    writer.write_event(Event::Start(testsuite_tag))?;
    for test_case in test_cases {
        serialize_test_case(test_case, writer)?;
    }
    serialize_end_tag(TESTSUITE_TAG, writer)
}

fn serialize_test_case(
    test_case: &TestCase,
    writer: &mut Writer<impl io::Write>,
) -> quick_xml::Result<()> {
    let TestCase {
        name,
        classname,
        time,
        status,
        system_out,
        system_err,
    } = test_case;

    let mut testcase_tag = BytesStart::new(TESTCASE_TAG);
    testcase_tag.extend_attributes([
        escaped_attribute("classname", classname),
        escaped_attribute("name", name),
    ]);
    if let Some(time) = time {
        testcase_tag.push_attribute(("time", serialize_case_time(time).as_str()));
    }

    if !status.has_payload() && system_out.is_none() && system_err.is_none() {
        return writer.write_event(Event::Empty(testcase_tag));
    }

    writer.write_event(Event::Start(testcase_tag))?;

    match status {
        TestCaseStatus::Success => {}
        TestCaseStatus::NonSuccess {
            kind,
            ty,
            message,
            description,
        } => {
            let tag_name = match kind {
                NonSuccessKind::Failure => FAILURE_TAG,
                NonSuccessKind::Error => ERROR_TAG,
            };
            serialize_status(
                ty.as_ref(),
                message.as_ref(),
                description.as_ref(),
                tag_name,
                writer,
            )?;
        }
        TestCaseStatus::Skipped {
            ty,
            message,
            description,
        } => {
            serialize_status(
                ty.as_ref(),
                message.as_ref(),
                description.as_ref(),
                SKIPPED_TAG,
                writer,
            )?;
        }
    }

    if let Some(system_out) = system_out {
        serialize_output(system_out, SYSTEM_OUT_TAG, writer)?;
    }
    if let Some(system_err) = system_err {
        serialize_output(system_err, SYSTEM_ERR_TAG, writer)?;
    }

    serialize_end_tag(TESTCASE_TAG, writer)
}

fn serialize_status(
    ty: Option<&XmlString>,
    message: Option<&XmlString>,
    description: Option<&XmlString>,
    tag_name: &'static str,
    writer: &mut Writer<impl io::Write>,
) -> quick_xml::Result<()> {
    let mut tag = BytesStart::new(tag_name);
    if let Some(ty) = ty {
        tag.push_attribute(escaped_attribute("type", ty));
    }
    if let Some(message) = message {
        tag.push_attribute(escaped_attribute("message", message));
    }

    match description {
        Some(description) => {
            writer.write_event(Event::Start(tag))?;
            writer.write_event(Event::Text(BytesText::new(description)))?;
            serialize_end_tag(tag_name, writer)?;
        }
        None => {
            writer.write_event(Event::Empty(tag))?;
        }
    }

    Ok(())
}

fn serialize_output(
    output: &XmlString,
    tag_name: &'static str,
    writer: &mut Writer<impl io::Write>,
) -> quick_xml::Result<()> {
    writer.write_event(Event::Start(BytesStart::new(tag_name)))?;
    writer.write_event(Event::Text(BytesText::new(output)))?;
    serialize_end_tag(tag_name, writer)
}

// Attribute values are normalized by XML parsers, so whitespace other than spaces must go out as
// character references to survive a round trip.
fn escaped_attribute<'a>(key: &'a str, value: &XmlString) -> Attribute<'a> {
    let escaped = escape(value.as_str());
    let value = if escaped.contains(['\n', '\r', '\t']) {
        escaped
            .replace('\n', "&#10;")
            .replace('\r', "&#13;")
            .replace('\t', "&#9;")
    } else {
        escaped.into_owned()
    };
    Attribute {
        key: QName(key.as_bytes()),
        value: Cow::Owned(value.into_bytes()),
    }
}

fn serialize_end_tag(
    tag_name: &'static str,
    writer: &mut Writer<impl io::Write>,
) -> quick_xml::Result<()> {
    writer.write_event(Event::End(BytesEnd::new(tag_name)))
}

// Serialize the suite time as seconds with 3 decimal places.
fn serialize_suite_time(time: &Duration) -> String {
    format!("{:.3}", time.as_secs_f64())
}

// Serialize a test case time as seconds with 6 decimal places.
fn serialize_case_time(time: &Duration) -> String {
    format!("{:.6}", time.as_secs_f64())
}
