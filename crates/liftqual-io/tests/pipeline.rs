//! End-to-end integration tests: CSV -> Table -> subset -> JSON -> deserialize.

use std::fs;
use std::path::Path;

use liftqual_io::{AnswerWriter, ColumnKind, ExperimentName, IoError, ReportWriter, TableReader};
use tempfile::TempDir;

/// Path to the test fixture directory.
fn fixture_path(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn sensor_fixture_loads_with_expected_types() {
    let table = TableReader::new(&fixture_path("sensor_sample.csv"))
        .read()
        .expect("fixture should parse");

    assert_eq!(table.n_rows(), 10);
    assert_eq!(table.n_columns(), 10);
    assert_eq!(table.column_at(0).unwrap().name(), "X");

    let kinds: Vec<(&str, ColumnKind)> = table
        .columns()
        .iter()
        .map(|c| (c.name(), c.kind()))
        .collect();
    assert!(kinds.contains(&("user_name", ColumnKind::Text)));
    assert!(kinds.contains(&("new_window", ColumnKind::Text)));
    assert!(kinds.contains(&("num_window", ColumnKind::Numeric)));
    assert!(kinds.contains(&("roll_belt", ColumnKind::Numeric)));
    assert!(kinds.contains(&("kurtosis_roll_belt", ColumnKind::Numeric)));
    assert!(kinds.contains(&("classe", ColumnKind::Text)));

    // Summary-row columns are blank or #DIV/0! except on window boundaries.
    let kurtosis = table.require("kurtosis_roll_belt").unwrap();
    assert_eq!(kurtosis.n_missing(), 9);
    assert_eq!(table.require("skewness_yaw_belt").unwrap().n_missing(), 10);
    assert_eq!(table.require("roll_belt").unwrap().n_missing(), 0);
}

#[test]
fn subset_then_report_round_trip() {
    let table = TableReader::new(&fixture_path("sensor_sample.csv"))
        .read()
        .unwrap();
    let subset = table
        .select(&["roll_belt", "classe"])
        .unwrap()
        .take_rows(&[0, 4, 9])
        .unwrap();
    assert_eq!(subset.n_rows(), 3);

    let labels: Vec<String> = (0..subset.n_rows())
        .map(|row| subset.require("classe").unwrap().render(row).unwrap())
        .collect();

    let dir = TempDir::new().unwrap();
    let writer = ReportWriter::new(dir.path(), ExperimentName::new("subset_rt").unwrap()).unwrap();
    let path = writer.write_report(&labels).unwrap();

    let content: Vec<String> = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(content, labels);
    assert_eq!(content, vec!["A", "B", "E"]);
}

#[test]
fn answers_written_per_row() {
    let table = TableReader::new(&fixture_path("sensor_sample.csv"))
        .read()
        .unwrap();
    let classe = table.require("classe").unwrap();
    let labels: Vec<String> = (0..table.n_rows())
        .filter_map(|row| classe.render(row))
        .collect();

    let dir = TempDir::new().unwrap();
    let paths = AnswerWriter::new(dir.path()).unwrap().write(&labels).unwrap();

    assert_eq!(paths.len(), 10);
    assert_eq!(
        fs::read_to_string(dir.path().join("problem_id_10.txt")).unwrap(),
        "E\n"
    );
}

#[test]
fn missing_fixture_reports_path() {
    let path = fixture_path("does_not_exist.csv");
    match TableReader::new(&path).read() {
        Err(IoError::FileNotFound { path: p, .. }) => assert_eq!(p, path),
        other => panic!("expected FileNotFound, got {other:?}"),
    }
}
