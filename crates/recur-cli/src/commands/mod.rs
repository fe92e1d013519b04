//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `scan` - recurring-charge detection over a transactions CSV
//! - `emails` - receipt scanning over a mailbox export
//! - `registry` - lookup-table display

pub mod emails;
pub mod registry;
pub mod scan;

// Re-export command functions for main.rs
pub use emails::*;
pub use registry::*;
pub use scan::*;

use std::path::Path;

use anyhow::{Context, Result};
use recur_core::Registry;

/// Load the lookup tables, preferring an override file when one is given
pub fn load_registry(path: Option<&Path>) -> Result<Registry> {
    Registry::load(path).context("Failed to load registry tables")
}

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        format!("{}...", &s[..max.saturating_sub(3)])
    }
}
