//! Recurring-charge detection over bank transactions
//!
//! Groups transactions by normalized merchant key, checks each group for a
//! recurring billing pattern (stable amount, regular cadence), scores
//! confidence, and emits ranked subscription candidates. Pure over its
//! inputs: no I/O, no shared state, safe to run for many users in parallel.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::models::{amount_cents, DetectedSubscription, Frequency, Transaction};
use crate::normalize::normalize_merchant;
use crate::registry::Registry;

/// Inclusive day-interval bands for cadence classification
const YEARLY_BAND: (f64, f64) = (350.0, 380.0);
const MONTHLY_BAND: (f64, f64) = (28.0, 32.0);
const WEEKLY_BAND: (f64, f64) = (6.0, 8.0);

/// Detection thresholds
#[derive(Debug, Clone)]
pub struct DetectionConfig {
    /// Minimum confidence for a result to be emitted
    pub min_confidence: f64,
    /// Amount spread (max-min) under this fraction of the mean counts as
    /// tight amount consistency
    pub amount_variance: f64,
    /// Interval spread (max-min days) at or under this counts as tight
    /// cadence consistency
    pub interval_tolerance_days: i64,
    /// Reject groups with more distinct charge amounts than this
    /// (allows one fee or price change)
    pub max_distinct_amounts: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.6,
            amount_variance: 0.10,       // 10% of mean
            interval_tolerance_days: 3,
            max_distinct_amounts: 2,
        }
    }
}

/// Recurring-charge detector
///
/// Holds no state beyond the injected tables and thresholds; every scan is
/// a pure function of the transactions handed in.
pub struct SubscriptionDetector<'a> {
    registry: &'a Registry,
    config: DetectionConfig,
}

impl<'a> SubscriptionDetector<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self {
            registry,
            config: DetectionConfig::default(),
        }
    }

    pub fn with_config(registry: &'a Registry, config: DetectionConfig) -> Self {
        Self { registry, config }
    }

    /// Detect subscriptions across a transaction batch.
    ///
    /// Results are sorted by confidence descending; ties keep the order in
    /// which merchant groups were first encountered in the input.
    pub fn detect_from_transactions(
        &self,
        transactions: &[Transaction],
    ) -> Vec<DetectedSubscription> {
        let groups = group_by_merchant(transactions);

        let mut detected = Vec::new();
        for (merchant, txs) in &groups {
            if let Some(subscription) = self.analyze_merchant_group(merchant, txs) {
                detected.push(subscription);
            }
        }

        // Stable sort: equal confidence keeps group encounter order
        detected.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        debug!(
            "Detection pass: {} transactions, {} merchant groups, {} subscriptions",
            transactions.len(),
            groups.len(),
            detected.len()
        );

        detected
    }

    /// Analyze one merchant group for a recurring pattern.
    ///
    /// Returns `None` for all "no detection" outcomes: fewer than 2
    /// transactions, unstable amounts, unclassifiable cadence, or a
    /// confidence score under the acceptance threshold.
    pub fn analyze_merchant_group(
        &self,
        merchant: &str,
        transactions: &[&Transaction],
    ) -> Option<DetectedSubscription> {
        if transactions.len() < 2 {
            return None;
        }

        // Input order is not assumed stable
        let mut sorted = transactions.to_vec();
        sorted.sort_by_key(|t| t.date);

        let amounts: Vec<f64> = sorted.iter().map(|t| t.amount.abs()).collect();

        // Amount must be materially stable; two distinct values allow for
        // one fee or price change
        let distinct: HashSet<i64> = amounts.iter().map(|a| amount_cents(*a)).collect();
        if distinct.len() > self.config.max_distinct_amounts {
            debug!(
                "Skipping {}: {} distinct amounts",
                merchant,
                distinct.len()
            );
            return None;
        }

        let mean_amount = mean(&amounts);

        let intervals: Vec<i64> = sorted
            .windows(2)
            .map(|w| (w[1].date - w[0].date).num_days())
            .collect();
        let mean_interval = intervals.iter().sum::<i64>() as f64 / intervals.len() as f64;

        let frequency = match classify_cadence(mean_interval) {
            Some(f) => f,
            None => {
                debug!(
                    "Skipping {}: mean interval {:.1} days fits no cadence band",
                    merchant, mean_interval
                );
                return None;
            }
        };

        let mut confidence: f64 = 0.5;

        if self.registry.is_known_recurring(merchant) {
            confidence += 0.3;
        }

        if self.registry.has_subscription_keyword(merchant) {
            confidence += 0.2;
        }

        let amount_spread = max_f64(&amounts) - min_f64(&amounts);
        if amount_spread < mean_amount * self.config.amount_variance {
            confidence += 0.2;
        }

        let interval_spread = intervals.iter().max()? - intervals.iter().min()?;
        if interval_spread <= self.config.interval_tolerance_days {
            confidence += 0.2;
        }

        let confidence = confidence.min(1.0);
        if confidence < self.config.min_confidence {
            debug!("Skipping {}: confidence {:.2} below threshold", merchant, confidence);
            return None;
        }

        Some(DetectedSubscription {
            merchant_name: merchant.to_string(),
            amount: mean_amount,
            frequency,
            last_seen: sorted.last()?.date,
            transaction_count: sorted.len(),
            confidence,
            category: self.registry.categorize(merchant),
        })
    }
}

/// Partition transactions into merchant groups keyed by the normalized
/// merchant name (falling back to the description), preserving the order in
/// which each key is first seen.
fn group_by_merchant(transactions: &[Transaction]) -> Vec<(String, Vec<&Transaction>)> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<&Transaction>)> = Vec::new();

    for tx in transactions {
        let key = normalize_merchant(tx.merchant_name.as_deref().unwrap_or(&tx.description));
        match index.get(&key) {
            Some(&i) => groups[i].1.push(tx),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, vec![tx]));
            }
        }
    }

    groups
}

/// Match a mean day interval against the fixed cadence bands
fn classify_cadence(mean_interval_days: f64) -> Option<Frequency> {
    let within = |band: (f64, f64)| mean_interval_days >= band.0 && mean_interval_days <= band.1;

    if within(YEARLY_BAND) {
        Some(Frequency::Yearly)
    } else if within(MONTHLY_BAND) {
        Some(Frequency::Monthly)
    } else if within(WEEKLY_BAND) {
        Some(Frequency::Weekly)
    } else {
        None
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn max_f64(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

fn min_f64(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use chrono::NaiveDate;

    fn registry() -> Registry {
        Registry::load(None).unwrap()
    }

    fn tx(date: &str, merchant: Option<&str>, description: &str, amount: f64) -> Transaction {
        Transaction {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            description: description.to_string(),
            merchant_name: merchant.map(String::from),
            amount,
            currency: "USD".to_string(),
        }
    }

    /// Monthly charges from a known merchant: every bonus fires, capped at 1.0
    #[test]
    fn test_known_merchant_monthly_pattern() {
        let registry = registry();
        let detector = SubscriptionDetector::new(&registry);

        let transactions = vec![
            tx("2024-01-01", None, "NETFLIX.COM", -9.99),
            tx("2024-01-31", None, "NETFLIX.COM", -9.99),
            tx("2024-03-01", None, "NETFLIX.COM", -9.99),
            tx("2024-03-31", None, "NETFLIX.COM", -9.99),
        ];
        let refs: Vec<&Transaction> = transactions.iter().collect();

        let sub = detector
            .analyze_merchant_group("NETFLIX", &refs)
            .expect("regular monthly charges should be detected");

        assert_eq!(sub.frequency, Frequency::Monthly);
        assert_eq!(sub.transaction_count, 4);
        assert_eq!(sub.confidence, 1.0);
        assert!((sub.amount - 9.99).abs() < 1e-9);
        assert_eq!(sub.category, Category::Streaming);
        assert_eq!(sub.last_seen, NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());
    }

    #[test]
    fn test_single_transaction_is_not_a_pattern() {
        let registry = registry();
        let detector = SubscriptionDetector::new(&registry);

        let transactions = vec![tx("2024-01-01", None, "NETFLIX.COM", -9.99)];
        let refs: Vec<&Transaction> = transactions.iter().collect();

        assert!(detector.analyze_merchant_group("NETFLIX", &refs).is_none());
    }

    #[test]
    fn test_three_distinct_amounts_rejected() {
        let registry = registry();
        let detector = SubscriptionDetector::new(&registry);

        // Perfectly regular intervals, but three different amounts
        let transactions = vec![
            tx("2024-01-01", None, "NETFLIX.COM", -9.99),
            tx("2024-01-31", None, "NETFLIX.COM", -12.99),
            tx("2024-03-01", None, "NETFLIX.COM", -15.99),
        ];
        let refs: Vec<&Transaction> = transactions.iter().collect();

        assert!(detector.analyze_merchant_group("NETFLIX", &refs).is_none());
    }

    #[test]
    fn test_one_price_change_allowed() {
        let registry = registry();
        let detector = SubscriptionDetector::new(&registry);

        let transactions = vec![
            tx("2024-01-01", None, "NETFLIX.COM", -9.99),
            tx("2024-01-31", None, "NETFLIX.COM", -9.99),
            tx("2024-03-01", None, "NETFLIX.COM", -11.99),
        ];
        let refs: Vec<&Transaction> = transactions.iter().collect();

        let sub = detector
            .analyze_merchant_group("NETFLIX", &refs)
            .expect("two distinct amounts should still detect");
        assert_eq!(sub.frequency, Frequency::Monthly);
    }

    #[test]
    fn test_interval_outside_all_bands_rejected() {
        let registry = registry();
        let detector = SubscriptionDetector::new(&registry);

        // 45-day cadence: too irregular to classify
        let transactions = vec![
            tx("2024-01-01", None, "NETFLIX.COM", -9.99),
            tx("2024-02-15", None, "NETFLIX.COM", -9.99),
            tx("2024-03-31", None, "NETFLIX.COM", -9.99),
        ];
        let refs: Vec<&Transaction> = transactions.iter().collect();

        assert!(detector.analyze_merchant_group("NETFLIX", &refs).is_none());
    }

    #[test]
    fn test_weekly_and_yearly_bands() {
        let registry = registry();
        let detector = SubscriptionDetector::new(&registry);

        let weekly = vec![
            tx("2024-01-01", None, "CITY GYM", -5.00),
            tx("2024-01-08", None, "CITY GYM", -5.00),
            tx("2024-01-15", None, "CITY GYM", -5.00),
        ];
        let refs: Vec<&Transaction> = weekly.iter().collect();
        let sub = detector.analyze_merchant_group("CITY GYM", &refs).unwrap();
        assert_eq!(sub.frequency, Frequency::Weekly);
        assert_eq!(sub.category, Category::Fitness);

        let yearly = vec![
            tx("2022-03-10", None, "ADOBE", -239.88),
            tx("2023-03-10", None, "ADOBE", -239.88),
            tx("2024-03-10", None, "ADOBE", -239.88),
        ];
        let refs: Vec<&Transaction> = yearly.iter().collect();
        let sub = detector.analyze_merchant_group("ADOBE", &refs).unwrap();
        assert_eq!(sub.frequency, Frequency::Yearly);
        assert_eq!(sub.category, Category::Software);
    }

    /// Unknown merchant with loose intervals only earns the amount bonus
    /// and stays under the threshold
    #[test]
    fn test_low_confidence_rejected() {
        let registry = registry();
        let detector = SubscriptionDetector::new(&registry);

        // Monthly-band mean (29.5 days), but interval spread is 9 days and
        // the amounts differ by 15% of the mean, so no bonus fires and the
        // score stays at the 0.5 base
        let transactions = vec![
            tx("2024-01-01", None, "CORNER BAKERY", -10.00),
            tx("2024-01-26", None, "CORNER BAKERY", -11.60),
            tx("2024-02-29", None, "CORNER BAKERY", -10.00),
        ];
        let refs: Vec<&Transaction> = transactions.iter().collect();

        assert!(detector
            .analyze_merchant_group("CORNER BAKERY", &refs)
            .is_none());
    }

    #[test]
    fn test_detect_groups_merchant_variants() {
        let registry = registry();
        let detector = SubscriptionDetector::new(&registry);

        let transactions = vec![
            tx("2024-01-01", Some("Netflix"), "NETFLIX.COM 111", -15.99),
            tx("2024-02-01", Some("NETFLIX INC"), "NETFLIX.COM 222", -15.99),
            tx("2024-03-03", Some("Netflix.com"), "NETFLIX.COM 333", -15.99),
        ];

        let detected = detector.detect_from_transactions(&transactions);
        assert_eq!(detected.len(), 1);
        assert_eq!(detected[0].merchant_name, "NETFLIX");
        assert_eq!(detected[0].frequency, Frequency::Monthly);
        assert_eq!(detected[0].transaction_count, 3);
    }

    #[test]
    fn test_results_ranked_by_confidence() {
        let registry = registry();
        let detector = SubscriptionDetector::new(&registry);

        // ACME LOCKER: unknown merchant, tight pattern -> 0.9;
        // Netflix: everything fires -> 1.0. Netflix must rank first even
        // though its group is encountered second.
        let transactions = vec![
            tx("2024-01-05", None, "ACME LOCKER", -3.00),
            tx("2024-01-01", None, "NETFLIX.COM", -15.99),
            tx("2024-02-05", None, "ACME LOCKER", -3.00),
            tx("2024-01-31", None, "NETFLIX.COM", -15.99),
            tx("2024-03-06", None, "ACME LOCKER", -3.00),
            tx("2024-03-01", None, "NETFLIX.COM", -15.99),
        ];

        let detected = detector.detect_from_transactions(&transactions);
        assert_eq!(detected.len(), 2);
        assert_eq!(detected[0].merchant_name, "NETFLIX");
        assert_eq!(detected[1].merchant_name, "ACME LOCKER");
        assert!(detected[0].confidence > detected[1].confidence);
    }

    #[test]
    fn test_equal_confidence_keeps_encounter_order() {
        let registry = registry();
        let detector = SubscriptionDetector::new(&registry);

        // Two unknown merchants with identical tight patterns
        let transactions = vec![
            tx("2024-01-01", None, "ACME LOCKER", -3.00),
            tx("2024-01-02", None, "ZEBRA PARKING", -4.00),
            tx("2024-01-31", None, "ACME LOCKER", -3.00),
            tx("2024-02-01", None, "ZEBRA PARKING", -4.00),
            tx("2024-03-01", None, "ACME LOCKER", -3.00),
            tx("2024-03-02", None, "ZEBRA PARKING", -4.00),
        ];

        let detected = detector.detect_from_transactions(&transactions);
        assert_eq!(detected.len(), 2);
        assert_eq!(detected[0].confidence, detected[1].confidence);
        assert_eq!(detected[0].merchant_name, "ACME LOCKER");
        assert_eq!(detected[1].merchant_name, "ZEBRA PARKING");
    }

    #[test]
    fn test_unsorted_input_is_sorted_before_analysis() {
        let registry = registry();
        let detector = SubscriptionDetector::new(&registry);

        let transactions = vec![
            tx("2024-03-01", None, "NETFLIX.COM", -9.99),
            tx("2024-01-01", None, "NETFLIX.COM", -9.99),
            tx("2024-01-31", None, "NETFLIX.COM", -9.99),
        ];
        let refs: Vec<&Transaction> = transactions.iter().collect();

        let sub = detector.analyze_merchant_group("NETFLIX", &refs).unwrap();
        assert_eq!(sub.frequency, Frequency::Monthly);
        assert_eq!(sub.last_seen, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn test_classify_cadence_band_edges() {
        assert_eq!(classify_cadence(6.0), Some(Frequency::Weekly));
        assert_eq!(classify_cadence(8.0), Some(Frequency::Weekly));
        assert_eq!(classify_cadence(28.0), Some(Frequency::Monthly));
        assert_eq!(classify_cadence(32.0), Some(Frequency::Monthly));
        assert_eq!(classify_cadence(350.0), Some(Frequency::Yearly));
        assert_eq!(classify_cadence(380.0), Some(Frequency::Yearly));
        assert_eq!(classify_cadence(5.9), None);
        assert_eq!(classify_cadence(33.0), None);
        assert_eq!(classify_cadence(45.0), None);
        assert_eq!(classify_cadence(381.0), None);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[1.0, 2.0, 3.0]), 2.0);
        assert_eq!(mean(&[15.99, 15.99]), 15.99);
        assert_eq!(mean(&[]), 0.0);
    }
}
