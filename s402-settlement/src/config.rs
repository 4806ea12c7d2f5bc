//! Settlement engine configuration.
//!
//! Loads configuration from a TOML file with support for environment variable
//! expansion in string values. Variables use `$VAR` or `${VAR}` syntax.
//!
//! # Example Configuration
//!
//! ```toml
//! intent_ttl_secs = 600
//! reaper_interval_secs = 5
//!
//! [fee]
//! basis_points = 50
//! minimum = "0.01"
//!
//! [payout_retry]
//! max_attempts = 5
//! base_delay_ms = 200
//! max_delay_ms = 5000
//!
//! [chains."eip155:8453"]
//! pay_to = "$SETTLEMENT_ADDRESS_BASE"
//! explorer_url = "https://basescan.org/tx/"
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` — Path to configuration file (default: `config.toml`)
//! - Chain-specific addresses referenced by `$VAR` in the config file

use std::collections::HashMap;
use std::path::Path;

use rust_decimal::Decimal;
use s402::amount::FeeSchedule;
use serde::{Deserialize, Serialize};

/// Errors loading or parsing the configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Can not read config file: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid TOML for this schema.
    #[error("Can not parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level settlement engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementConfig {
    /// How long an intent accepts proofs, in seconds (default: 600).
    #[serde(default = "default_intent_ttl_secs")]
    pub intent_ttl_secs: u64,

    /// Expiry sweep interval, in seconds (default: 5).
    #[serde(default = "default_reaper_interval_secs")]
    pub reaper_interval_secs: u64,

    /// Fee schedule frozen into intents at creation.
    #[serde(default)]
    pub fee: FeeConfig,

    /// Payout retry policy.
    #[serde(default)]
    pub payout_retry: RetryConfig,

    /// Per-chain settlement addresses keyed by CAIP-2 network identifier.
    #[serde(default)]
    pub chains: HashMap<String, ChainConfig>,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            intent_ttl_secs: default_intent_ttl_secs(),
            reaper_interval_secs: default_reaper_interval_secs(),
            fee: FeeConfig::default(),
            payout_retry: RetryConfig::default(),
            chains: HashMap::new(),
        }
    }
}

/// Fee configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeeConfig {
    /// Fee in basis points of the sending amount (default: 50 = 0.50%).
    #[serde(default = "default_fee_basis_points")]
    pub basis_points: u32,

    /// Minimum fee in the payment currency (default: 0).
    #[serde(default)]
    pub minimum: Decimal,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            basis_points: default_fee_basis_points(),
            minimum: Decimal::ZERO,
        }
    }
}

impl From<FeeConfig> for FeeSchedule {
    fn from(config: FeeConfig) -> Self {
        Self {
            basis_points: config.basis_points,
            minimum: config.minimum,
        }
    }
}

/// Bounded exponential backoff policy for the payout leg.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum transfer attempts before flagging the intent (default: 5).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry, in milliseconds (default: 200).
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Ceiling for the backoff delay, in milliseconds (default: 5000).
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

/// Per-chain settlement configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Settlement address payments on this chain are authorized to.
    /// Supports `$VAR` / `${VAR}` for environment variable expansion.
    pub pay_to: String,

    /// Asset contract or mint address; defaults to the network registry's
    /// USDC deployment when absent.
    #[serde(default)]
    pub asset: Option<String>,

    /// Explorer URL prefix for transaction links.
    #[serde(default)]
    pub explorer_url: Option<String>,
}

fn default_intent_ttl_secs() -> u64 {
    600
}

fn default_reaper_interval_secs() -> u64 {
    5
}

fn default_fee_basis_points() -> u32 {
    50
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_delay_ms() -> u64 {
    200
}

fn default_max_delay_ms() -> u64 {
    5_000
}

impl SettlementConfig {
    /// Loads configuration from the path given by the `CONFIG` environment
    /// variable, falling back to `config.toml` in the current directory.
    ///
    /// After loading, all string values with `$VAR` / `${VAR}` references
    /// are expanded from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("CONFIG").unwrap_or_else(|_| "config.toml".to_owned());
        Self::load_from(&path)
    }

    /// Loads configuration from a specific file path.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let content = if Path::new(path).exists() {
            std::fs::read_to_string(path)?
        } else {
            String::new()
        };

        let expanded = expand_env_vars(&content);
        let config: Self = toml::from_str(&expanded)?;
        Ok(config)
    }
}

/// Expands `$VAR` and `${VAR}` patterns in a string from environment variables.
///
/// Unresolved variables are left as-is.
fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' {
            let braced = chars.peek() == Some(&'{');
            if braced {
                chars.next(); // consume '{'
            }

            let mut var_name = String::new();
            while let Some(&c) = chars.peek() {
                if braced {
                    if c == '}' {
                        chars.next();
                        break;
                    }
                } else if !c.is_ascii_alphanumeric() && c != '_' {
                    break;
                }
                var_name.push(c);
                chars.next();
            }

            if var_name.is_empty() {
                result.push('$');
                if braced {
                    result.push('{');
                }
            } else if let Ok(val) = std::env::var(&var_name) {
                result.push_str(&val);
            } else {
                // Leave unresolved variable as-is
                result.push('$');
                if braced {
                    result.push('{');
                }
                result.push_str(&var_name);
                if braced {
                    result.push('}');
                }
            }
        } else {
            result.push(ch);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config: SettlementConfig = toml::from_str("").unwrap();
        assert_eq!(config.intent_ttl_secs, 600);
        assert_eq!(config.reaper_interval_secs, 5);
        assert_eq!(config.fee.basis_points, 50);
        assert_eq!(config.payout_retry.max_attempts, 5);
        assert!(config.chains.is_empty());
    }

    #[test]
    fn parses_chain_tables() {
        let toml = r#"
            intent_ttl_secs = 300

            [fee]
            basis_points = 100

            [chains."eip155:8453"]
            pay_to = "0x2222222222222222222222222222222222222222"
            explorer_url = "https://basescan.org/tx/"
        "#;
        let config: SettlementConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.intent_ttl_secs, 300);
        assert_eq!(config.fee.basis_points, 100);
        let chain = config.chains.get("eip155:8453").unwrap();
        assert_eq!(chain.pay_to, "0x2222222222222222222222222222222222222222");
        assert!(chain.asset.is_none());
    }

    #[test]
    fn expands_simple_and_braced_vars() {
        // Safety: test-only env mutation, no concurrent readers of this var.
        unsafe {
            std::env::set_var("S402_TEST_PAY_TO", "0xabc");
        }
        assert_eq!(expand_env_vars("$S402_TEST_PAY_TO"), "0xabc");
        assert_eq!(expand_env_vars("${S402_TEST_PAY_TO}/tx"), "0xabc/tx");
        assert_eq!(expand_env_vars("$S402_UNSET_VAR"), "$S402_UNSET_VAR");
        assert_eq!(expand_env_vars("plain text"), "plain text");
    }
}
