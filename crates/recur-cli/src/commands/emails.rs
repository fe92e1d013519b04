//! Mailbox scan command

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use recur_core::import::parse_mailbox_json;
use recur_core::EmailScanner;

use super::{load_registry, truncate};

pub fn cmd_emails(file: &Path, registry_path: Option<&Path>, json: bool) -> Result<()> {
    let registry = load_registry(registry_path)?;

    let reader = File::open(file)
        .with_context(|| format!("Failed to open mailbox file: {}", file.display()))?;
    let messages = parse_mailbox_json(reader).context("Failed to parse mailbox JSON")?;

    let scanner = EmailScanner::new(&registry);
    let observations = scanner.scan_messages(&messages);

    if json {
        println!("{}", serde_json::to_string_pretty(&observations)?);
        return Ok(());
    }

    if observations.is_empty() {
        println!(
            "No subscription receipts found across {} messages.",
            messages.len()
        );
        return Ok(());
    }

    println!();
    println!(
        "📨 Subscription Receipts ({} messages scanned)",
        messages.len()
    );
    println!("   ─────────────────────────────────────────────────────────────");

    for obs in &observations {
        println!(
            "   {:16} │ {:>8} {} │ {:>3.0}% │ {} │ from {}",
            truncate(&obs.merchant_name, 16),
            format!("{:.2}", obs.amount),
            obs.currency,
            obs.confidence * 100.0,
            obs.billing_date.date_naive(),
            truncate(&obs.email, 30)
        );
    }

    Ok(())
}
