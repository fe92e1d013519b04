//! Domain models for recur
//!
//! Serialized field names follow the integration contract (camelCase:
//! `merchantName`, `lastSeen`, `billingDate`, ...) so JSON handed to or
//! received from the surrounding services round-trips unchanged.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A dated monetary transaction from a bank feed export.
///
/// Supplied by the caller per scan; never mutated by detection. Sign is not
/// interpreted - the analyzer works on absolute amounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub date: NaiveDate,
    pub description: String,
    /// Merchant name when the feed provides one; grouping falls back to
    /// the description otherwise
    #[serde(default)]
    pub merchant_name: Option<String>,
    pub amount: f64,
    /// Currency code, pass-through only
    #[serde(default = "default_currency_code")]
    pub currency: String,
}

fn default_currency_code() -> String {
    "USD".to_string()
}

/// A single email message from a mailbox export.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailMessage {
    pub from_address: String,
    pub subject: String,
    /// Decoded plain-text body
    pub body_text: String,
    /// Raw `Date:` header as exported from the mailbox. Kept unparsed so the
    /// scanner owns the parse-or-reject decision.
    pub date: String,
}

/// Subscription billing frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

impl std::str::FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" | "annual" => Ok(Self::Yearly),
            _ => Err(format!("Unknown frequency: {}", s)),
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Service category for a detected subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Streaming,
    Music,
    Software,
    Fitness,
    CloudStorage,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Streaming => "streaming",
            Self::Music => "music",
            Self::Software => "software",
            Self::Fitness => "fitness",
            Self::CloudStorage => "cloud_storage",
            Self::Other => "other",
        }
    }

    /// Human-readable label for display
    pub fn label(&self) -> &'static str {
        match self {
            Self::Streaming => "Streaming",
            Self::Music => "Music",
            Self::Software => "Software",
            Self::Fitness => "Fitness",
            Self::CloudStorage => "Cloud Storage",
            Self::Other => "Other",
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace(' ', "_").as_str() {
            "streaming" => Ok(Self::Streaming),
            "music" => Ok(Self::Music),
            "software" => Ok(Self::Software),
            "fitness" => Ok(Self::Fitness),
            "cloud_storage" => Ok(Self::CloudStorage),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Currency detected in an email receipt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Gbp,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
        }
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "USD" => Ok(Self::Usd),
            "EUR" => Ok(Self::Eur),
            "GBP" => Ok(Self::Gbp),
            _ => Err(format!("Unknown currency: {}", s)),
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recurring charge detected from bank transactions.
///
/// Produced fresh on every run; reconciling against previously stored
/// subscriptions is the caller's job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedSubscription {
    /// Normalized merchant key the group was built from
    pub merchant_name: String,
    /// Mean charge amount across the group
    pub amount: f64,
    pub frequency: Frequency,
    /// Date of the most recent charge
    pub last_seen: NaiveDate,
    pub transaction_count: usize,
    /// Heuristic score in [0, 1]; results below 0.6 are never emitted
    pub confidence: f64,
    pub category: Category,
}

impl DetectedSubscription {
    /// Charge amount normalized to a monthly rate, for spend estimates
    pub fn monthly_amount(&self) -> f64 {
        match self.frequency {
            Frequency::Weekly => self.amount * 52.0 / 12.0,
            Frequency::Monthly => self.amount,
            Frequency::Yearly => self.amount / 12.0,
        }
    }
}

/// A subscription signal extracted from a single email receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailObservation {
    /// Display name from the known-merchant table
    pub merchant_name: String,
    pub amount: f64,
    pub currency: Currency,
    pub billing_date: DateTime<Utc>,
    /// Sender address the receipt came from
    pub email: String,
    /// Heuristic score in [0, 1]; results below 0.6 are never emitted
    pub confidence: f64,
}

/// Amount at cent precision, for grouping and dedup keys where bitwise
/// f64 equality would be too strict
pub(crate) fn amount_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}
