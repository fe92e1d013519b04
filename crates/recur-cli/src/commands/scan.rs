//! Transaction scan command

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use recur_core::import::parse_transactions_csv;
use recur_core::{DetectionConfig, SubscriptionDetector};
use tracing::debug;

use super::{load_registry, truncate};

pub fn cmd_scan(
    file: &Path,
    registry_path: Option<&Path>,
    json: bool,
    min_confidence: Option<f64>,
) -> Result<()> {
    let registry = load_registry(registry_path)?;

    let reader = File::open(file)
        .with_context(|| format!("Failed to open transactions file: {}", file.display()))?;
    let transactions =
        parse_transactions_csv(reader).context("Failed to parse transactions CSV")?;

    if let Some(mc) = min_confidence {
        debug!("Overriding minimum confidence: {:.2}", mc);
    }
    let config = DetectionConfig {
        min_confidence: min_confidence.unwrap_or(DetectionConfig::default().min_confidence),
        ..DetectionConfig::default()
    };
    let detector = SubscriptionDetector::with_config(&registry, config);
    let detected = detector.detect_from_transactions(&transactions);

    if json {
        println!("{}", serde_json::to_string_pretty(&detected)?);
        return Ok(());
    }

    if detected.is_empty() {
        println!(
            "No subscriptions found across {} transactions.",
            transactions.len()
        );
        return Ok(());
    }

    println!();
    println!(
        "📋 Detected Subscriptions ({} transactions scanned)",
        transactions.len()
    );
    println!("   ─────────────────────────────────────────────────────────────");

    for sub in &detected {
        println!(
            "   {:24} │ {:>8}/{:<7} │ {:13} │ {:>3.0}% │ {} charges, last {}",
            truncate(&sub.merchant_name, 24),
            format!("${:.2}", sub.amount),
            sub.frequency.as_str(),
            sub.category.label(),
            sub.confidence * 100.0,
            sub.transaction_count,
            sub.last_seen
        );
    }

    let monthly: f64 = detected.iter().map(|s| s.monthly_amount()).sum();
    println!();
    println!("   Estimated monthly spend: ${:.2}", monthly);

    Ok(())
}
