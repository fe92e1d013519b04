//! Lookup-table registry for detection and email parsing
//!
//! All merchant/keyword knowledge used by the detector and the email
//! scanner lives here as data, not code: the allow-list of recurring
//! merchants, subscription keywords, category rules, the known-merchant
//! table for receipts, and the monetary-amount matchers.
//!
//! ## Configuration Resolution
//!
//! Tables are loaded with a two-layer resolution:
//! 1. An override TOML file passed by the caller (e.g. `--registry`)
//! 2. Fall back to embedded defaults (compiled into the binary)

use std::fs;
use std::path::Path;

use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::error::Result;
use crate::models::{Category, Currency};
use crate::normalize::normalize_merchant;

/// Embedded default tables (compiled into binary)
const DEFAULT_TABLES: &str = include_str!("../../../config/registry.toml");

/// A category rule: the first rule whose keyword matches the merchant key
/// assigns its category.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryRule {
    pub category: Category,
    pub keywords: Vec<String>,
}

/// A merchant recognized in email receipts
#[derive(Debug, Clone, Deserialize)]
pub struct KnownMerchant {
    /// Display name used in observations
    pub name: String,
    /// Sender domains attributed to this merchant
    pub domains: Vec<String>,
    /// Corpus keywords attributed to this merchant
    pub keywords: Vec<String>,
}

/// Email-specific tables
#[derive(Debug, Clone, Deserialize)]
pub struct EmailTables {
    pub default_currency: Currency,
    pub renewal_keywords: Vec<String>,
    pub receipt_keywords: Vec<String>,
    /// Ordered regexes; the first capture group is the amount
    pub amount_patterns: Vec<String>,
    pub merchants: Vec<KnownMerchant>,
}

/// Raw registry file shape
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub recurring_merchants: Vec<String>,
    #[serde(default)]
    pub subscription_keywords: Vec<String>,
    #[serde(default)]
    pub categories: Vec<CategoryRule>,
    pub email: EmailTables,
}

/// Compiled lookup tables
///
/// Keyword lists are lowercased and the recurring-merchant allow-list is
/// run through the normalizer at build time, so lookups are plain substring
/// checks at detection time.
pub struct Registry {
    recurring_merchants: Vec<String>,
    subscription_keywords: Vec<String>,
    categories: Vec<CategoryRule>,
    merchants: Vec<KnownMerchant>,
    amount_patterns: Vec<Regex>,
    renewal_keywords: Vec<String>,
    receipt_keywords: Vec<String>,
    default_currency: Currency,
}

impl Registry {
    /// Load tables, preferring an override file when one is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => {
                debug!("Loading registry override from {}", p.display());
                let raw = fs::read_to_string(p)?;
                Self::from_toml_str(&raw)
            }
            None => Self::from_toml_str(DEFAULT_TABLES),
        }
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: RegistryConfig = toml::from_str(raw)?;
        Self::from_config(config)
    }

    pub fn from_config(config: RegistryConfig) -> Result<Self> {
        let recurring_merchants: Vec<String> = config
            .recurring_merchants
            .iter()
            .map(|m| normalize_merchant(m))
            .filter(|m| !m.is_empty())
            .collect();

        let subscription_keywords = lowercase_all(&config.subscription_keywords);

        let categories: Vec<CategoryRule> = config
            .categories
            .into_iter()
            .map(|rule| CategoryRule {
                category: rule.category,
                keywords: lowercase_all(&rule.keywords),
            })
            .collect();

        let merchants: Vec<KnownMerchant> = config
            .email
            .merchants
            .into_iter()
            .map(|m| KnownMerchant {
                name: m.name,
                domains: lowercase_all(&m.domains),
                keywords: lowercase_all(&m.keywords),
            })
            .collect();

        let amount_patterns = config
            .email
            .amount_patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            recurring_merchants,
            subscription_keywords,
            categories,
            merchants,
            amount_patterns,
            renewal_keywords: lowercase_all(&config.email.renewal_keywords),
            receipt_keywords: lowercase_all(&config.email.receipt_keywords),
            default_currency: config.email.default_currency,
        })
    }

    /// True if the normalized merchant key hits the recurring allow-list
    pub fn is_known_recurring(&self, merchant_key: &str) -> bool {
        self.recurring_merchants
            .iter()
            .any(|m| merchant_key.contains(m.as_str()))
    }

    /// True if the merchant key contains any subscription keyword
    pub fn has_subscription_keyword(&self, merchant_key: &str) -> bool {
        let key = merchant_key.to_lowercase();
        self.subscription_keywords
            .iter()
            .any(|kw| key.contains(kw.as_str()))
    }

    /// Classify a merchant key; first matching rule wins
    pub fn categorize(&self, merchant_key: &str) -> Category {
        let key = merchant_key.to_lowercase();
        for rule in &self.categories {
            if rule.keywords.iter().any(|kw| key.contains(kw.as_str())) {
                return rule.category;
            }
        }
        Category::Other
    }

    /// Attribute an email to a known merchant by sender domain, then by
    /// corpus keyword. First table entry to match wins.
    pub fn identify_merchant(&self, from_address: &str, corpus: &str) -> Option<&str> {
        let from = from_address.to_lowercase();
        for merchant in &self.merchants {
            if merchant.domains.iter().any(|d| from.contains(d.as_str())) {
                return Some(&merchant.name);
            }
            if merchant.keywords.iter().any(|kw| corpus.contains(kw.as_str())) {
                return Some(&merchant.name);
            }
        }
        None
    }

    /// Extract a monetary amount from a lowercased corpus using the ordered
    /// pattern list; thousands separators are stripped before parsing.
    pub fn extract_amount(&self, corpus: &str) -> Option<f64> {
        for pattern in &self.amount_patterns {
            if let Some(captures) = pattern.captures(corpus) {
                if let Some(group) = captures.get(1) {
                    if let Ok(amount) = group.as_str().replace(',', "").parse::<f64>() {
                        return Some(amount);
                    }
                }
            }
        }
        None
    }

    pub fn has_renewal_keyword(&self, corpus: &str) -> bool {
        self.renewal_keywords.iter().any(|kw| corpus.contains(kw.as_str()))
    }

    pub fn has_receipt_keyword(&self, corpus: &str) -> bool {
        self.receipt_keywords.iter().any(|kw| corpus.contains(kw.as_str()))
    }

    pub fn default_currency(&self) -> Currency {
        self.default_currency
    }

    pub fn recurring_merchants(&self) -> &[String] {
        &self.recurring_merchants
    }

    pub fn subscription_keywords(&self) -> &[String] {
        &self.subscription_keywords
    }

    pub fn categories(&self) -> &[CategoryRule] {
        &self.categories
    }

    pub fn known_merchants(&self) -> &[KnownMerchant] {
        &self.merchants
    }
}

fn lowercase_all(values: &[String]) -> Vec<String> {
    values.iter().map(|v| v.to_lowercase()).collect()
}
