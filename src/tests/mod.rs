mod utils;

use crate::{Problem, Report};
use serde::Deserialize;
use std::fs::{read_dir, read_to_string};
use std::path::Path;

/// The part of a test file after the `expected:` marker.
#[derive(Deserialize)]
struct Expected {
    expected: Report,
}

// Helper function to run a test from a test file
fn run_test_file(test_file: &Path) {
    println!("Running test for file: {:?}", test_file);

    let failure_message = format!("Failed to read test file: {}", test_file.display());
    let yaml_content = read_to_string(test_file).expect(&failure_message);

    // Split the file content at the "expected:" marker to separate input and expected output
    let parts: Vec<&str> = yaml_content.split("expected:").collect();

    let failure_message = format!("Failed to parse input YAML: {}", test_file.display());
    let input_yaml = parts.first().expect("No input found in test file").trim();
    let input: Problem = serde_yaml::from_str(input_yaml).expect(&failure_message);

    let failure_message = format!("Failed to parse expected YAML: {}", test_file.display());
    let expected_yaml = format!("expected:{}", parts.get(1).expect(&failure_message));
    let expected: Expected = serde_yaml::from_str(&expected_yaml).expect(&failure_message);
    let expected = expected.expected;

    let failure_message = format!("Failed to solve test file: {}", test_file.display());
    let received = input.solve().expect(&failure_message);

    println!("expected: {}", serde_yaml::to_string(&expected).unwrap());
    println!("received: {}", serde_yaml::to_string(&received).unwrap());

    assert_eq!(expected.status, received.status, "{}", test_file.display());
    match (expected.objective, received.objective) {
        (Some(want), Some(got)) => assert!(
            (want - got).abs() < 1e-6,
            "{}: objective {got}, expected {want}",
            test_file.display()
        ),
        (want, got) => assert_eq!(want, got, "{}", test_file.display()),
    }

    // Assignments are only listed for instances with a unique optimum
    if !expected.assignments.is_empty() {
        assert_eq!(
            expected.assignments,
            received.assignments,
            "{}",
            test_file.display()
        );
    }
    if expected.maintenance.is_some() {
        assert_eq!(
            expected.maintenance,
            received.maintenance,
            "{}",
            test_file.display()
        );
    }
    for diagnostic in &expected.diagnostics {
        assert!(
            received.diagnostics.contains(diagnostic),
            "{}: missing diagnostic {diagnostic:?}",
            test_file.display()
        );
    }
}

#[test]
fn run_all_test_files() {
    // Read all files from the test_data directory
    let test_data_dir = Path::new("test_data");
    let mut entries: Vec<_> = read_dir(test_data_dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| {
            path.is_file() && path.extension().map(|ext| ext == "yaml").unwrap_or(false)
        })
        .collect();

    // Sort paths lexically by filename
    entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    assert!(!entries.is_empty(), "no test files in {}", test_data_dir.display());
    for path in entries {
        run_test_file(&path);
    }
}
