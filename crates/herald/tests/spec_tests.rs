//! Integration tests driven by the shared cases in tests/fixtures/cases.json

use herald::{Herald, HeraldError, Registry};
use pretty_assertions::assert_eq;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
struct TestSuite {
    description: String,
    tests: Vec<TestCase>,
}

#[derive(Debug, Deserialize)]
struct TestCase {
    name: String,
    #[serde(default)]
    partials: BTreeMap<String, String>,
    template: String,
    data: serde_json::Value,
    #[serde(default)]
    expected: Option<String>,
    #[serde(default)]
    parts: Option<BTreeMap<String, String>>,
    #[serde(default)]
    error: Option<String>,
}

fn load_test_suite() -> TestSuite {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("cases.json");
    let content = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {e}", path.display()));
    serde_json::from_str(&content).unwrap_or_else(|e| panic!("Failed to parse cases.json: {e}"))
}

fn error_kind(err: &HeraldError) -> &'static str {
    match err {
        HeraldError::Syntax(_) => "Syntax",
        HeraldError::UnresolvedPartial { .. } => "UnresolvedPartial",
        HeraldError::CyclicLayout { .. } => "CyclicLayout",
        HeraldError::CyclicInclude { .. } => "CyclicInclude",
        HeraldError::Helper(_) => "Helper",
        HeraldError::MissingHelper { .. } => "MissingHelper",
        HeraldError::MissingContext { .. } => "MissingContext",
        HeraldError::UndefinedVariable { .. } => "UndefinedVariable",
        HeraldError::TypeError { .. } => "TypeError",
        HeraldError::PartialLoad { .. } => "PartialLoad",
        HeraldError::IoError(_) => "IoError",
    }
}

#[test]
fn test_shared_cases() {
    let suite = load_test_suite();
    assert!(!suite.tests.is_empty(), "{} has no cases", suite.description);

    for case in suite.tests {
        let herald = Herald::new(Registry::builder().partials(case.partials).build());
        let result = herald.render(&case.template, case.data);

        match (&case.error, result) {
            (Some(expected), Err(err)) => {
                assert_eq!(error_kind(&err), expected.as_str(), "case '{}': {err}", case.name);
            }
            (Some(expected), Ok(output)) => {
                panic!("case '{}': expected {expected} error, got {:?}", case.name, output.full)
            }
            (None, Err(err)) => panic!("case '{}': unexpected error: {err}", case.name),
            (None, Ok(output)) => {
                if let Some(expected) = &case.expected {
                    assert_eq!(&output.full, expected, "case '{}'", case.name);
                }
                if let Some(parts) = &case.parts {
                    let actual: BTreeMap<String, String> = output.parts.into_iter().collect();
                    assert_eq!(&actual, parts, "case '{}'", case.name);
                }
            }
        }
    }
}
