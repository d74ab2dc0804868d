//! Editor Configuration
//!
//! Loaded from TOML. Every field has a default, so an empty file is a valid
//! configuration:
//!
//! ```toml
//! borrowing_rate_slippage = "0.005"
//! fee_decay_tolerance_minutes = 60
//!
//! [debug]
//! introspection = true
//! history_depth = 256
//! ```

use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use nau_common::{
    constants::fees,
    guards::require_config,
    Decimal, NauError, NauResult,
};

/// Default number of events kept for the debug report
pub const DEFAULT_HISTORY_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    /// Added to the quoted borrowing rate to form the submitted maximum
    pub borrowing_rate_slippage: Decimal,
    /// How long a quoted fee stays acceptable while it decays
    pub fee_decay_tolerance_minutes: u64,
    pub debug: DebugConfig,
}

/// Debug introspection; off unless enabled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DebugConfig {
    pub introspection: bool,
    /// Events kept for the report
    pub history_depth: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            borrowing_rate_slippage: fees::BORROWING_RATE_SLIPPAGE,
            fee_decay_tolerance_minutes: fees::FEE_DECAY_TOLERANCE_MINUTES,
            debug: DebugConfig::default(),
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            introspection: false,
            history_depth: DEFAULT_HISTORY_DEPTH,
        }
    }
}

impl EditorConfig {
    /// Read and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> NauResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| NauError::Config {
            reason: format!("{}: {e}", path.display()),
        })?;
        debug!("loaded config from {}", path.display());
        Self::from_toml_str(&text)
    }

    /// Parse and validate TOML text
    pub fn from_toml_str(text: &str) -> NauResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| NauError::Config {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> NauResult<()> {
        require_config(
            self.borrowing_rate_slippage <= fees::MAXIMUM_BORROWING_RATE,
            "borrowing_rate_slippage cannot exceed the maximum borrowing rate",
        )?;
        require_config(
            self.fee_decay_tolerance_minutes > 0,
            "fee_decay_tolerance_minutes must be positive",
        )?;
        require_config(
            !self.debug.introspection || self.debug.history_depth > 0,
            "debug.history_depth must be positive when introspection is enabled",
        )?;
        Ok(())
    }

    /// Maximum borrowing rate to submit for a quoted rate
    pub fn max_borrowing_rate(&self, quoted: Decimal) -> NauResult<Decimal> {
        quoted.checked_add(self.borrowing_rate_slippage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_empty_is_default() {
        let config = EditorConfig::from_toml_str("").unwrap();
        assert_eq!(config, EditorConfig::default());
        assert!(!config.debug.introspection);
        assert_eq!(config.fee_decay_tolerance_minutes, 60);
    }

    #[test]
    fn test_parse() {
        let config = EditorConfig::from_toml_str(
            r#"
            borrowing_rate_slippage = "0.01"

            [debug]
            introspection = true
            history_depth = 8
            "#,
        )
        .unwrap();
        assert_eq!(config.borrowing_rate_slippage, d("0.01"));
        assert!(config.debug.introspection);
        assert_eq!(config.debug.history_depth, 8);
        assert_eq!(config.max_borrowing_rate(d("0.005")).unwrap(), d("0.015"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            EditorConfig::from_toml_str("borrowing_rate_slippage = \"0.5\""),
            Err(NauError::Config { .. })
        ));
        assert!(EditorConfig::from_toml_str("fee_decay_tolerance_minutes = 0").is_err());
        assert!(EditorConfig::from_toml_str("[debug]\nintrospection = true\nhistory_depth = 0").is_err());
        assert!(EditorConfig::from_toml_str("unknown = 1").is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            EditorConfig::load("/nonexistent/nau-editor.toml"),
            Err(NauError::Config { .. })
        ));
    }
}
