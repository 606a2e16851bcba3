use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// `recon` with its config directory pointed into `home`.
fn recon(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("recon").unwrap();
    cmd.env("HOME", home).env("XDG_CONFIG_HOME", home.join(".config"));
    cmd
}

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_extract_plain_text() {
    let dir = TempDir::new().unwrap();
    let input = write(
        dir.path(),
        "invoices.txt",
        "Invoice: INV:001\nVendor: ACME\nAmount: 120.50\n\nInvoice: INV-2\nVendor: ACME\n",
    );

    recon(dir.path())
        .args(["extract", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""invoice_number": "001""#))
        .stdout(predicate::str::contains("INV-2").not());
}

#[test]
fn test_extract_csv_output() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "one.txt", "Invoice: A1\nVendor: Globex\nAmount: 7");

    recon(dir.path())
        .args(["extract", input.to_str().unwrap(), "-f", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("invoice_number,vendor,amount"))
        .stdout(predicate::str::contains("A1,Globex,7"));
}

#[test]
fn test_extract_bad_amount_fails() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "bad.txt", "Invoice: A1\nVendor: ACME\nAmount: twelve");

    recon(dir.path())
        .args(["extract", input.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse amount"));
}

#[test]
fn test_extract_rejects_unknown_extension() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "scan.png", "not really an image");

    recon(dir.path())
        .args(["extract", input.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported document type"));
}

#[test]
fn test_reconcile_and_update() {
    let dir = TempDir::new().unwrap();
    let invoices = write(
        dir.path(),
        "invoices.json",
        r#"[{"id": 1, "vendor": "ACME", "amount": "500.0"},
            {"id": 2, "vendor": "Globex", "amount": "80"}]"#,
    );
    let payments = write(
        dir.path(),
        "payments.json",
        r#"[{"id": 9, "vendor": "ACME", "paid_amount": "499.5"}]"#,
    );

    recon(dir.path())
        .args([
            "reconcile",
            "--invoices",
            invoices.to_str().unwrap(),
            "--payments",
            payments.to_str().unwrap(),
            "-f",
            "csv",
            "--update",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("1,9,MATCHED"))
        .stdout(predicate::str::contains("2,,UNMATCHED"));

    let updated: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&invoices).unwrap()).unwrap();
    assert_eq!(updated[0]["status"], "MATCHED");
    assert_eq!(updated[1]["status"], "UNMATCHED");
}

#[test]
fn test_reconcile_tolerance_override() {
    let dir = TempDir::new().unwrap();
    let invoices = write(
        dir.path(),
        "invoices.json",
        r#"[{"id": 1, "vendor": "ACME", "amount": "100"}]"#,
    );
    let payments = write(
        dir.path(),
        "payments.json",
        r#"[{"id": 3, "vendor": "ACME", "paid_amount": "102"}]"#,
    );

    recon(dir.path())
        .args([
            "reconcile",
            "-i",
            invoices.to_str().unwrap(),
            "-p",
            payments.to_str().unwrap(),
            "-f",
            "text",
            "--tolerance",
            "2",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Invoice 1: MATCHED (payment 3)"));

    // Without --update the invoices file is untouched
    assert!(!fs::read_to_string(&invoices).unwrap().contains("MATCHED"));
}

#[test]
fn test_batch_with_payments() {
    let dir = TempDir::new().unwrap();
    let input_dir = dir.path().join("in");
    let output_dir = dir.path().join("out");
    fs::create_dir_all(&input_dir).unwrap();

    write(&input_dir, "a.txt", "Invoice: A1\nVendor: ACME\nAmount: 10");
    write(&input_dir, "b.txt", "Invoice: B1\nVendor: Globex\nAmount: 20");
    write(&input_dir, "c.txt", "Invoice: C1\nVendor: ACME\nAmount: oops");
    let payments = write(
        dir.path(),
        "payments.json",
        r#"[{"id": 5, "vendor": "Globex", "paid_amount": "20.5"}]"#,
    );

    let pattern = input_dir.join("*.txt");
    recon(dir.path())
        .args([
            "batch",
            pattern.to_str().unwrap(),
            "-o",
            output_dir.to_str().unwrap(),
            "--summary",
            "--continue-on-error",
            "--payments",
            payments.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("2 successful, 1 failed"));

    assert!(output_dir.join("a.txt.json").exists());
    assert!(!output_dir.join("c.txt.json").exists());

    let summary = fs::read_to_string(output_dir.join("summary.csv")).unwrap();
    assert!(summary.contains("c.txt,error"));

    let results: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(output_dir.join("reconciliation.json")).unwrap())
            .unwrap();
    assert_eq!(results[0]["status"], "UNMATCHED");
    assert_eq!(results[1]["status"], "MATCHED");
    assert_eq!(results[1]["payment_id"], 5);
}

#[test]
fn test_batch_outputs_keep_source_names() {
    let dir = TempDir::new().unwrap();
    let input_dir = dir.path().join("in");
    let output_dir = dir.path().join("out");
    fs::create_dir_all(&input_dir).unwrap();

    write(&input_dir, "invoices.txt", "Invoice: I1\nVendor: ACME\nAmount: 10");
    write(&input_dir, "summary.txt", "Invoice: S1\nVendor: Globex\nAmount: 20");
    let payments = write(dir.path(), "payments.json", "[]");

    let pattern = input_dir.join("*.txt");
    recon(dir.path())
        .args([
            "batch",
            pattern.to_str().unwrap(),
            "-o",
            output_dir.to_str().unwrap(),
            "-f",
            "csv",
            "--summary",
            "--payments",
            payments.to_str().unwrap(),
        ])
        .assert()
        .success();

    let per_file = fs::read_to_string(output_dir.join("invoices.txt.csv")).unwrap();
    assert!(per_file.contains("I1,ACME,10"));
    let per_file = fs::read_to_string(output_dir.join("summary.txt.csv")).unwrap();
    assert!(per_file.contains("S1,Globex,20"));

    let summary = fs::read_to_string(output_dir.join("summary.csv")).unwrap();
    assert!(summary.starts_with("filename,status"));

    let invoices: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(output_dir.join("invoices.json")).unwrap())
            .unwrap();
    assert_eq!(invoices.as_array().unwrap().len(), 2);
}

#[test]
fn test_batch_rejects_duplicate_file_names() {
    let dir = TempDir::new().unwrap();
    for sub in ["x", "y"] {
        let sub_dir = dir.path().join(sub);
        fs::create_dir_all(&sub_dir).unwrap();
        write(&sub_dir, "a.txt", "Invoice: A1\nVendor: ACME\nAmount: 10");
    }

    let pattern = dir.path().join("*").join("a.txt");
    let output_dir = dir.path().join("out");
    recon(dir.path())
        .args([
            "batch",
            pattern.to_str().unwrap(),
            "-o",
            output_dir.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("would write the same output file"));

    assert!(!output_dir.exists());
}

#[test]
fn test_batch_stops_on_first_error() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "bad.txt", "Invoice: X\nVendor: Y\nAmount: ?");

    let pattern = dir.path().join("*.txt");
    recon(dir.path())
        .args(["batch", pattern.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Processing failed"));
}

#[test]
fn test_config_set_and_get() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("recon.json");
    let config = config.to_str().unwrap();

    recon(dir.path())
        .args(["-c", config, "config", "get", "models.recognition_model"])
        .assert()
        .success()
        .stdout(predicate::str::contains("latin_rec.onnx"));

    recon(dir.path())
        .args(["-c", config, "config", "set", "extraction.vendor_assignment", "scoped"])
        .assert()
        .success();

    recon(dir.path())
        .args(["-c", config, "config", "get", "extraction.vendor_assignment"])
        .assert()
        .success()
        .stdout(predicate::str::contains("scoped"));

    recon(dir.path())
        .args(["-c", config, "config", "set", "extraction.vendor_assignment", "nearest"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid value"));
}

#[test]
fn test_config_init_refuses_overwrite() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("conf").join("config.json");
    let path = path.to_str().unwrap();

    recon(dir.path())
        .args(["config", "init", "-o", path])
        .assert()
        .success();

    recon(dir.path())
        .args(["config", "init", "-o", path])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}
