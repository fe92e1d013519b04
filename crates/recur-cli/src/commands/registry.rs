//! Registry display command

use std::path::Path;

use anyhow::Result;

use super::load_registry;

pub fn cmd_registry(registry_path: Option<&Path>) -> Result<()> {
    let registry = load_registry(registry_path)?;

    let source = match registry_path {
        Some(p) => format!("override: {}", p.display()),
        None => "built-in defaults".to_string(),
    };

    println!();
    println!("🗂  Lookup Tables ({})", source);
    println!("   ─────────────────────────────────────────────────────────────");

    println!(
        "   Recurring merchants ({}):",
        registry.recurring_merchants().len()
    );
    for merchant in registry.recurring_merchants() {
        println!("     - {}", merchant);
    }

    println!(
        "   Subscription keywords ({}):",
        registry.subscription_keywords().len()
    );
    for keyword in registry.subscription_keywords() {
        println!("     - {}", keyword);
    }

    println!("   Category rules ({}):", registry.categories().len());
    for rule in registry.categories() {
        println!("     - {}: {}", rule.category, rule.keywords.join(", "));
    }

    println!("   Email merchants ({}):", registry.known_merchants().len());
    for merchant in registry.known_merchants() {
        println!(
            "     - {} (domains: {})",
            merchant.name,
            merchant.domains.join(", ")
        );
    }

    println!("   Default currency: {}", registry.default_currency());

    Ok(())
}
