//! File loaders for transaction and mailbox exports
//!
//! Detection itself never touches the filesystem; these loaders turn
//! exported files into the typed batches the detector consumes. Shape
//! problems (missing date or amount) fail loudly here so bad data never
//! reaches analysis looking like "no pattern found".

use std::collections::HashSet;
use std::io::Read;

use chrono::NaiveDate;
use csv::ReaderBuilder;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{EmailMessage, Transaction};

/// Parse a generic transactions CSV.
///
/// Columns are addressed by header name, case-insensitively: `Date`,
/// `Description`, and `Amount` are required; `Merchant` and `Currency` are
/// optional. Rows that repeat an identical (date, description, amount)
/// triple are dropped as re-exported duplicates.
pub fn parse_transactions_csv<R: Read>(reader: R) -> Result<Vec<Transaction>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    };

    let date_col = column("date").ok_or_else(|| Error::Import("Missing Date column".into()))?;
    let desc_col = column("description")
        .ok_or_else(|| Error::Import("Missing Description column".into()))?;
    let amount_col =
        column("amount").ok_or_else(|| Error::Import("Missing Amount column".into()))?;
    let merchant_col = column("merchant");
    let currency_col = column("currency");

    let mut seen: HashSet<String> = HashSet::new();
    let mut transactions = Vec::new();

    for result in rdr.records() {
        let record = result?;

        let date_str = record
            .get(date_col)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::Import("Row is missing a date".into()))?;
        let date = parse_date(date_str)?;

        let description = record
            .get(desc_col)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::Import("Row is missing a description".into()))?
            .to_string();

        let amount_str = record
            .get(amount_col)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::Import("Row is missing an amount".into()))?;
        let amount = parse_amount(amount_str)?;

        let merchant_name = merchant_col
            .and_then(|i| record.get(i))
            .filter(|s| !s.is_empty())
            .map(String::from);

        let currency = currency_col
            .and_then(|i| record.get(i))
            .filter(|s| !s.is_empty())
            .unwrap_or("USD")
            .to_uppercase();

        let hash = row_hash(&date, &description, amount);
        if !seen.insert(hash) {
            debug!("Skipping duplicate row: {} {} {}", date, description, amount);
            continue;
        }

        transactions.push(Transaction {
            date,
            description,
            merchant_name,
            amount,
            currency,
        });
    }

    Ok(transactions)
}

/// Parse a JSON mailbox export: an array of messages with `fromAddress`,
/// `subject`, `bodyText`, and `date` fields.
pub fn parse_mailbox_json<R: Read>(reader: R) -> Result<Vec<EmailMessage>> {
    Ok(serde_json::from_reader(reader)?)
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();

    // Try common date formats
    let formats = [
        "%Y-%m-%d", // 2024-01-15
        "%m/%d/%Y", // 01/15/2024
        "%m/%d/%y", // 01/15/24
        "%m-%d-%Y", // 01-15-2024
    ];

    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }

    Err(Error::Import(format!("Unable to parse date: {}", s)))
}

/// Parse an amount string, handling currency symbols, commas, and
/// parenthesized negatives
fn parse_amount(s: &str) -> Result<f64> {
    let cleaned: String = s
        .trim()
        .replace(['$', '€', '£', ',', ' '], "")
        .replace('(', "-")
        .replace(')', "");

    cleaned
        .parse::<f64>()
        .map_err(|_| Error::Import(format!("Unable to parse amount: {}", s)))
}

/// Content hash for duplicate-row detection
fn row_hash(date: &NaiveDate, description: &str, amount: f64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(date.to_string().as_bytes());
    hasher.update(description.as_bytes());
    hasher.update(amount.to_be_bytes());
    hex::encode(hasher.finalize())
}
