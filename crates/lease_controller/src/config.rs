//! `leasectl.toml`

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigError;
use crate::policy::RentWindow;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub lease: LeaseTerms,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
}

/// Terms the local agreement is deployed with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseTerms {
    #[serde(default = "default_monthly_rent")]
    pub monthly_rent: u64,

    #[serde(default = "default_security_deposit")]
    pub security_deposit: u64,

    /// Months
    #[serde(default = "default_rental_period")]
    pub rental_period: u32,

    /// Ledger time at deployment, seconds since the epoch
    #[serde(default = "default_genesis_timestamp")]
    pub genesis_timestamp: u64,

    /// Balance minted to the tenant account
    #[serde(default = "default_tenant_funds")]
    pub tenant_funds: u64,
}

impl Default for LeaseTerms {
    fn default() -> Self {
        Self {
            monthly_rent: default_monthly_rent(),
            security_deposit: default_security_deposit(),
            rental_period: default_rental_period(),
            genesis_timestamp: default_genesis_timestamp(),
            tenant_funds: default_tenant_funds(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Seconds of ledger time each confirmed submission takes
    #[serde(default = "default_ledger_close")]
    pub ledger_close_secs: u64,

    /// How long a submission may wait for its confirmation
    #[serde(default = "default_confirmation_timeout")]
    pub confirmation_timeout_secs: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            ledger_close_secs: default_ledger_close(),
            confirmation_timeout_secs: default_confirmation_timeout(),
        }
    }
}

impl LedgerConfig {
    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default)]
    pub rent_window: RentWindow,
}

// Defaults
fn default_monthly_rent() -> u64 { 1_000_000 }
fn default_security_deposit() -> u64 { 2_000_000 }
fn default_rental_period() -> u32 { 12 }
fn default_genesis_timestamp() -> u64 { 1_704_067_200 } // 2024-01-01T00:00:00Z
fn default_tenant_funds() -> u64 { 100_000_000 }
fn default_ledger_close() -> u64 { 5 }
fn default_confirmation_timeout() -> u64 { 120 }

impl Config {
    /// Reads `path` if it exists, otherwise falls back to defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.display().to_string(),
                source,
            })?;
            toml::from_str(&content)?
        } else {
            info!(path = %path.display(), "config file not found, using defaults");
            Config::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lease.rental_period == 0 {
            return Err(ConfigError::Invalid("lease.rental_period must be at least 1".into()));
        }
        if self.lease.tenant_funds < self.lease.security_deposit {
            return Err(ConfigError::Invalid(
                "lease.tenant_funds does not cover the security deposit".into(),
            ));
        }
        if self.ledger.confirmation_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "ledger.confirmation_timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
