//! End-to-end runs against report directories on disk.

use std::fs;
use std::path::Path;

use tempfile::TempDir;
use top_ips::{build_view, AggregateOptions, DirStore, ReportDate};

fn write_report(dir: &Path, name: &str, body: &str) {
    fs::write(dir.join(name), body).expect("write fixture report");
}

fn row(ip: &str, count: u64, country: &str, netname: &str, description: &str) -> String {
    format!(
        r#"{{"ip":"{}","count":{},"country":"{}","netname":"{}","description":"{}"}}"#,
        ip, count, country, netname, description
    )
}

fn date(raw: &str) -> ReportDate {
    ReportDate::parse(raw).unwrap()
}

fn three_day_fixture() -> TempDir {
    let dir = tempfile::tempdir().expect("create temp dir");
    write_report(
        dir.path(),
        "2024-01-01.json",
        &format!(r#"{{"10.0.0.0/8": [{}]}}"#, row("1.1.1.1", 2, "US", "N1", "D1")),
    );
    write_report(
        dir.path(),
        "2024-01-02.json",
        &format!(
            r#"{{"10.0.0.0/8": [{}, {}]}}"#,
            row("1.1.1.1", 5, "XX", "N2", "D2"),
            row("2.2.2.2", 9, "FR", "N3", "D3")
        ),
    );
    write_report(
        dir.path(),
        "2024-01-03.json",
        &format!(r#"{{"10.0.0.0/8": [{}]}}"#, row("3.3.3.3", 100, "DE", "N4", "D4")),
    );
    dir
}

#[test]
fn merges_the_selected_range() {
    let dir = three_day_fixture();
    let store = DirStore::new(dir.path());

    let view = build_view(
        &store,
        Some("2024-01-01"),
        Some("2024-01-02"),
        &AggregateOptions::default(),
    );

    assert_eq!(
        view.dates,
        vec![date("2024-01-01"), date("2024-01-02"), date("2024-01-03")]
    );
    assert_eq!(view.start_date, Some(date("2024-01-01")));
    assert_eq!(view.end_date, Some(date("2024-01-02")));

    let results = view.results.expect("range resolved");
    assert_eq!(results.len(), 1);
    let entries = results.get("10.0.0.0/8").unwrap();
    assert_eq!(entries.len(), 2);

    assert_eq!(entries[0].ip, "2.2.2.2");
    assert_eq!(entries[0].count, 9);
    assert_eq!(entries[0].description, "D3");

    assert_eq!(entries[1].ip, "1.1.1.1");
    assert_eq!(entries[1].count, 7);
    assert_eq!(entries[1].country, "US");
    assert_eq!(entries[1].netname, "N1");
    assert_eq!(entries[1].description, "D1");
}

#[test]
fn boundaries_are_inclusive() {
    let dir = three_day_fixture();
    let store = DirStore::new(dir.path());

    let view = build_view(
        &store,
        Some("2024-01-02"),
        Some("2024-01-02"),
        &AggregateOptions::default(),
    );
    let results = view.results.unwrap();
    let entries = results.get("10.0.0.0/8").unwrap();
    let ips: Vec<&str> = entries.iter().map(|e| e.ip.as_str()).collect();

    // 2024-01-01 and 2024-01-03 sit one day outside
    assert_eq!(ips, vec!["2.2.2.2", "1.1.1.1"]);
    assert_eq!(entries[1].count, 5);
    assert_eq!(entries[1].country, "XX");
}

#[test]
fn inverted_input_is_swapped() {
    let dir = three_day_fixture();
    let store = DirStore::new(dir.path());

    let view = build_view(
        &store,
        Some("2024-01-03"),
        Some("2024-01-02"),
        &AggregateOptions::default(),
    );
    assert_eq!(view.start_date, Some(date("2024-01-02")));
    assert_eq!(view.end_date, Some(date("2024-01-03")));

    let results = view.results.unwrap();
    assert_eq!(results.get("10.0.0.0/8").unwrap()[0].ip, "3.3.3.3");
}

#[test]
fn defaults_cover_the_whole_catalog() {
    let dir = three_day_fixture();
    let store = DirStore::new(dir.path());

    let view = build_view(&store, None, Some("not-a-date"), &AggregateOptions::default());
    assert_eq!(view.start_date, Some(date("2024-01-01")));
    assert_eq!(view.end_date, Some(date("2024-01-03")));

    let results = view.results.unwrap();
    let counts: Vec<u64> = results
        .get("10.0.0.0/8")
        .unwrap()
        .iter()
        .map(|e| e.count)
        .collect();
    assert_eq!(counts, vec![100, 9, 7]);
}

#[test]
fn malformed_day_does_not_poison_the_range() {
    let dir = three_day_fixture();
    write_report(dir.path(), "2024-01-02.json", r#"{"10.0.0.0/8": [{"ip": "2.2.2.2"}]}"#);
    let store = DirStore::new(dir.path());

    let view = build_view(&store, None, None, &AggregateOptions::default());
    let results = view.results.unwrap();
    let entries = results.get("10.0.0.0/8").unwrap();
    let ips: Vec<(&str, u64)> = entries.iter().map(|e| (e.ip.as_str(), e.count)).collect();

    assert_eq!(ips, vec![("3.3.3.3", 100), ("1.1.1.1", 2)]);
}

#[test]
fn unreadable_day_does_not_poison_the_range() {
    let dir = three_day_fixture();
    fs::remove_file(dir.path().join("2024-01-02.json")).unwrap();
    fs::create_dir(dir.path().join("2024-01-02.json")).unwrap();
    let store = DirStore::new(dir.path());

    let view = build_view(&store, None, None, &AggregateOptions::default());
    assert_eq!(view.dates.len(), 3);

    let results = view.results.unwrap();
    let entries = results.get("10.0.0.0/8").unwrap();
    let ips: Vec<(&str, u64)> = entries.iter().map(|e| (e.ip.as_str(), e.count)).collect();

    assert_eq!(ips, vec![("3.3.3.3", 100), ("1.1.1.1", 2)]);
    assert_eq!(entries[1].country, "US");
}

#[test]
fn unrelated_files_are_ignored() {
    let dir = three_day_fixture();
    write_report(dir.path(), "README.txt", "hello");
    write_report(dir.path(), "2024-01-04.json.tmp", "{}");
    fs::create_dir(dir.path().join("archive")).unwrap();
    let store = DirStore::new(dir.path());

    let view = build_view(&store, None, None, &AggregateOptions::default());
    assert_eq!(view.dates.len(), 3);
    assert_eq!(view.end_date, Some(date("2024-01-03")));
}

#[test]
fn range_outside_catalog_yields_empty_result() {
    let dir = three_day_fixture();
    let store = DirStore::new(dir.path());

    let view = build_view(
        &store,
        Some("2023-01-01"),
        Some("2023-12-31"),
        &AggregateOptions::default(),
    );
    let results = view.results.expect("range is valid even without data");
    assert!(results.is_empty());
}

#[test]
fn empty_directory_has_no_result() {
    let dir = tempfile::tempdir().unwrap();
    let store = DirStore::new(dir.path());

    let view = build_view(&store, None, Some("garbage"), &AggregateOptions::default());
    assert!(view.dates.is_empty());
    assert_eq!(view.start_date, None);
    assert_eq!(view.end_date, None);
    assert!(view.results.is_none());
}

#[test]
fn view_serializes_for_front_ends() {
    let dir = three_day_fixture();
    let store = DirStore::new(dir.path());

    let view = build_view(
        &store,
        Some("2024-01-01"),
        Some("2024-01-01"),
        &AggregateOptions::default(),
    );
    let json: serde_json::Value = serde_json::to_value(&view).unwrap();

    assert_eq!(json["dates"][0], "2024-01-01");
    assert_eq!(json["start_date"], "2024-01-01");
    assert_eq!(json["end_date"], "2024-01-01");
    assert_eq!(json["results"]["10.0.0.0/8"][0]["ip"], "1.1.1.1");
    assert_eq!(json["results"]["10.0.0.0/8"][0]["count"], 2);
}
