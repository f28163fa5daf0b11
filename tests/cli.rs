use assert_cmd::Command;
use predicates::prelude::*;

const STATEMENT: &str = "\
STATE BANK OF INDIA
Date Particulars Withdrawals Deposits Balance
02/07/2025  MPAYUPITRTR509218316187GOVIND RAMSBINXXX94  0  15000.00  30790.41
03/07/2025  TRANSFER-12345JOHN DOESBINXXX12  0  2500.00  33290.41
";

fn passbook(home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("passbook").unwrap();
    cmd.env("HOME", home).env_remove("RUST_LOG");
    cmd
}

#[test]
fn name_extracts_depositor() {
    let home = tempfile::tempdir().unwrap();
    passbook(home.path())
        .args(["name", "MPAYUPITRTR509218316187GOVIND RAMSBINXXX94"])
        .assert()
        .success()
        .stdout("GOVIND RAM\n");
}

#[test]
fn date_normalizes_day_first() {
    let home = tempfile::tempdir().unwrap();
    passbook(home.path())
        .args(["date", "02/07/2025"])
        .assert()
        .success()
        .stdout("2025-07-02\n");
}

#[test]
fn date_flags_unreadable_input() {
    let home = tempfile::tempdir().unwrap();
    passbook(home.path())
        .args(["date", "05-1-25"])
        .assert()
        .success()
        .stdout(predicate::str::contains("defaulted to today"));
}

#[test]
fn import_prints_table() {
    let home = tempfile::tempdir().unwrap();
    let file = home.path().join("statement.txt");
    std::fs::write(&file, STATEMENT).unwrap();
    passbook(home.path())
        .arg("import")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("GOVIND RAM"))
        .stdout(predicate::str::contains("JOHN DOE"))
        .stdout(predicate::str::contains("₹15,000.00"))
        .stdout(predicate::str::contains("2 records"));
}

#[test]
fn import_writes_csv() {
    let home = tempfile::tempdir().unwrap();
    let file = home.path().join("statement.txt");
    let out = home.path().join("out.csv");
    std::fs::write(&file, STATEMENT).unwrap();
    passbook(home.path())
        .arg("import")
        .arg(&file)
        .args(["--format", "csv", "--output"])
        .arg(&out)
        .assert()
        .success();
    let csv = std::fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("id,date,particulars,depositor"));
    assert!(lines[1].starts_with("1,2025-07-02,"));
    assert!(lines[2].contains("JOHN DOE"));
}

#[test]
fn import_json_to_stdout() {
    let home = tempfile::tempdir().unwrap();
    let file = home.path().join("statement.txt");
    std::fs::write(&file, STATEMENT).unwrap();
    let output = passbook(home.path())
        .arg("import")
        .arg(&file)
        .args(["--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value.as_array().unwrap().len(), 2);
    assert_eq!(value[1]["depositor"], "JOHN DOE");
    assert_eq!(value[1]["type"], "TRANSFER");
}

#[test]
fn import_unrecognized_text_warns_about_samples() {
    let home = tempfile::tempdir().unwrap();
    let file = home.path().join("empty.txt");
    std::fs::write(&file, "nothing to read here").unwrap();
    passbook(home.path())
        .arg("import")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Sample Customer"))
        .stdout(predicate::str::contains("SAMPLE rows"));
}

#[test]
fn import_no_sample_prints_empty_table() {
    let home = tempfile::tempdir().unwrap();
    let file = home.path().join("empty.txt");
    std::fs::write(&file, "nothing to read here").unwrap();
    passbook(home.path())
        .arg("import")
        .arg(&file)
        .arg("--no-sample")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 records"))
        .stdout(predicate::str::contains("Sample Customer").not());
}

#[test]
fn import_missing_file_fails() {
    let home = tempfile::tempdir().unwrap();
    passbook(home.path())
        .args(["import", "/no/such/statement.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("Error: Could not read statement"));
}

#[test]
fn import_unknown_importer_fails() {
    let home = tempfile::tempdir().unwrap();
    let file = home.path().join("statement.txt");
    std::fs::write(&file, STATEMENT).unwrap();
    passbook(home.path())
        .arg("import")
        .arg(&file)
        .args(["--importer", "ofx"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown format: ofx"));
}

#[test]
fn detect_reports_exact_header() {
    let home = tempfile::tempdir().unwrap();
    let file = home.path().join("statement.txt");
    std::fs::write(&file, STATEMENT).unwrap();
    passbook(home.path())
        .arg("detect")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Structure: ExactHeader"))
        .stdout(predicate::str::contains("Header line: 2"))
        .stdout(predicate::str::contains("Withdrawals"));
}

#[test]
fn config_init_writes_defaults() {
    let home = tempfile::tempdir().unwrap();
    passbook(home.path())
        .args(["config", "--init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"max_scan_bytes\": 500000"));
    assert!(home
        .path()
        .join(".config")
        .join("passbook")
        .join("settings.json")
        .exists());
}
