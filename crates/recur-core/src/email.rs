//! Email receipt scanning
//!
//! Extracts subscription observations from exported email messages: the
//! sender/subject/body are flattened into one lowercase corpus, the
//! registry attributes the message to a known merchant and pulls out a
//! monetary amount, and keyword hits raise the confidence score.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;

use crate::models::{amount_cents, Currency, EmailMessage, EmailObservation};
use crate::registry::Registry;

/// Observations under this confidence never leave the scanner
const MIN_OBSERVATION_CONFIDENCE: f64 = 0.6;

/// Email receipt scanner
pub struct EmailScanner<'a> {
    registry: &'a Registry,
}

impl<'a> EmailScanner<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// Scan a batch of messages and return deduplicated, ranked
    /// observations.
    pub fn scan_messages(&self, messages: &[EmailMessage]) -> Vec<EmailObservation> {
        let observations: Vec<EmailObservation> = messages
            .iter()
            .filter_map(|m| self.parse_message(m))
            .collect();

        debug!(
            "Email scan: {} messages, {} observations before dedup",
            messages.len(),
            observations.len()
        );

        deduplicate_observations(observations)
    }

    /// Extract a subscription observation from a single message.
    ///
    /// Returns `None` whenever the message cannot be attributed to a known
    /// merchant, carries no recognizable amount, or has an unparseable
    /// date header. Skipped messages are not errors.
    pub fn parse_message(&self, message: &EmailMessage) -> Option<EmailObservation> {
        let corpus = format!(
            "{} {} {}",
            message.from_address, message.subject, message.body_text
        )
        .to_lowercase();

        let merchant = self
            .registry
            .identify_merchant(&message.from_address, &corpus)?;

        let amount = self.registry.extract_amount(&corpus)?;

        let currency =
            detect_currency(&corpus).unwrap_or_else(|| self.registry.default_currency());

        let billing_date = match parse_date_header(&message.date) {
            Some(d) => d,
            None => {
                debug!(
                    "Skipping message from {}: unparseable date header {:?}",
                    message.from_address, message.date
                );
                return None;
            }
        };

        let mut confidence: f64 = 0.5;

        // Known merchant
        confidence += 0.3;

        if self.registry.has_renewal_keyword(&corpus) {
            confidence += 0.2;
        }

        if self.registry.has_receipt_keyword(&corpus) {
            confidence += 0.2;
        }

        Some(EmailObservation {
            merchant_name: merchant.to_string(),
            amount,
            currency,
            billing_date,
            email: message.from_address.clone(),
            confidence: confidence.min(1.0),
        })
    }
}

/// Deduplicate observations by (merchant, amount), keeping the
/// higher-confidence instance, dropping anything under the acceptance
/// threshold, and ranking by confidence descending.
pub fn deduplicate_observations(observations: Vec<EmailObservation>) -> Vec<EmailObservation> {
    let mut best: HashMap<(String, i64), EmailObservation> = HashMap::new();

    for observation in observations {
        let key = (
            observation.merchant_name.clone(),
            amount_cents(observation.amount),
        );
        match best.get(&key) {
            Some(existing) if existing.confidence >= observation.confidence => {}
            _ => {
                best.insert(key, observation);
            }
        }
    }

    let mut result: Vec<EmailObservation> = best
        .into_values()
        .filter(|o| o.confidence >= MIN_OBSERVATION_CONFIDENCE)
        .collect();
    result.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    result
}

/// Infer a currency from symbols or currency words in the corpus
fn detect_currency(corpus: &str) -> Option<Currency> {
    if corpus.contains('$') || corpus.contains("usd") || corpus.contains("dollar") {
        return Some(Currency::Usd);
    }
    if corpus.contains('€') || corpus.contains("eur") || corpus.contains("euro") {
        return Some(Currency::Eur);
    }
    if corpus.contains('£') || corpus.contains("gbp") || corpus.contains("pound") {
        return Some(Currency::Gbp);
    }
    None
}

/// Parse a raw `Date:` header. Mailbox exports mostly carry RFC 2822, but
/// some tools re-emit RFC 3339 or a bare date.
fn parse_date_header(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(date) = DateTime::parse_from_rfc2822(raw) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }

    None
}
