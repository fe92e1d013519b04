//! CLI command tests
//!
//! These exercise the command functions against fixture files on disk.

use std::io::Write;
use std::path::PathBuf;

use tempfile::TempDir;

use crate::commands::{self, truncate};

fn write_fixture(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

#[test]
fn test_cmd_scan_happy_path() {
    let dir = TempDir::new().unwrap();
    let csv = write_fixture(
        &dir,
        "transactions.csv",
        "Date,Description,Amount\n\
         2024-01-01,NETFLIX.COM,-15.99\n\
         2024-01-31,NETFLIX.COM,-15.99\n\
         2024-03-01,NETFLIX.COM,-15.99\n",
    );

    let result = commands::cmd_scan(&csv, None, false, None);
    assert!(result.is_ok());

    // JSON output path
    let result = commands::cmd_scan(&csv, None, true, None);
    assert!(result.is_ok());
}

#[test]
fn test_cmd_scan_missing_file() {
    let result = commands::cmd_scan(&PathBuf::from("/nonexistent/tx.csv"), None, false, None);
    assert!(result.is_err());
}

#[test]
fn test_cmd_scan_malformed_csv() {
    let dir = TempDir::new().unwrap();
    let csv = write_fixture(
        &dir,
        "broken.csv",
        "Date,Description,Amount\n2024-01-01,NETFLIX.COM,not-a-number\n",
    );

    let result = commands::cmd_scan(&csv, None, false, None);
    assert!(result.is_err());
}

#[test]
fn test_cmd_scan_with_registry_override() {
    let dir = TempDir::new().unwrap();
    let registry = write_fixture(
        &dir,
        "registry.toml",
        r#"
recurring_merchants = ["ACME BOX"]
subscription_keywords = ["acme"]

[email]
default_currency = "USD"
renewal_keywords = ["renewal"]
receipt_keywords = ["receipt"]
amount_patterns = ['\$(\d+\.\d{2})']
merchants = []
"#,
    );
    let csv = write_fixture(
        &dir,
        "transactions.csv",
        "Date,Description,Amount\n\
         2024-01-01,ACME BOX,-5.00\n\
         2024-01-31,ACME BOX,-5.00\n",
    );

    let result = commands::cmd_scan(&csv, Some(&registry), false, None);
    assert!(result.is_ok());
}

#[test]
fn test_cmd_emails_happy_path() {
    let dir = TempDir::new().unwrap();
    let mailbox = write_fixture(
        &dir,
        "mailbox.json",
        r#"[
            {
                "fromAddress": "billing@spotify.com",
                "subject": "Your receipt",
                "bodyText": "Your $9.99 payment was processed",
                "date": "Mon, 15 Jan 2024 10:30:00 +0000"
            }
        ]"#,
    );

    assert!(commands::cmd_emails(&mailbox, None, false).is_ok());
    assert!(commands::cmd_emails(&mailbox, None, true).is_ok());
}

#[test]
fn test_cmd_emails_bad_json() {
    let dir = TempDir::new().unwrap();
    let mailbox = write_fixture(&dir, "mailbox.json", "{ not json ]");

    assert!(commands::cmd_emails(&mailbox, None, false).is_err());
}

#[test]
fn test_cmd_registry() {
    assert!(commands::cmd_registry(None).is_ok());
}

#[test]
fn test_cmd_registry_missing_override() {
    let result = commands::cmd_registry(Some(&PathBuf::from("/nonexistent/registry.toml")));
    assert!(result.is_err());
}

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("a merchant with a long name", 10), "a merch...");
    assert_eq!(truncate("exactlyten", 10), "exactlyten");
}
