//! Client configuration.
//!
//! Loaded from JSON or built in code. Keys are written as base58 strings.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use solana_program::pubkey::Pubkey;

use crate::error::{ClientError, Result};

/// Configuration for [`VaultClient`](crate::client::VaultClient)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Address of the deployed vault program
    #[serde(with = "base58")]
    pub program_id: Pubkey,

    /// Maximum number of retries after a transient transport failure
    pub max_retries: usize,

    /// Initial retry delay (in milliseconds)
    pub retry_initial_delay_ms: u64,

    /// Maximum retry delay (in milliseconds)
    pub retry_max_delay_ms: u64,

    /// Retry backoff multiplier
    pub retry_multiplier: f64,
}

impl ClientConfig {
    pub fn new(program_id: Pubkey) -> Self {
        Self {
            program_id,
            max_retries: 3,
            retry_initial_delay_ms: 100,
            retry_max_delay_ms: 5000,
            retry_multiplier: 2.0,
        }
    }

    /// Settings for an in-process ledger: same retry budget, millisecond delays.
    pub fn local() -> Self {
        Self::new(multisig_vault::ID).with_retry_config(1, 10, 2.0)
    }

    pub fn with_program_id(mut self, program_id: Pubkey) -> Self {
        self.program_id = program_id;
        self
    }

    /// Set maximum retries
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set retry delays
    pub fn with_retry_config(
        mut self,
        initial_delay_ms: u64,
        max_delay_ms: u64,
        multiplier: f64,
    ) -> Self {
        self.retry_initial_delay_ms = initial_delay_ms;
        self.retry_max_delay_ms = max_delay_ms;
        self.retry_multiplier = multiplier;
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.retry_initial_delay_ms == 0 {
            return Err(ClientError::Config(
                "Retry initial delay must be greater than 0".to_string(),
            ));
        }
        if self.retry_max_delay_ms < self.retry_initial_delay_ms {
            return Err(ClientError::Config(
                "Retry max delay cannot be below the initial delay".to_string(),
            ));
        }
        if self.retry_multiplier.is_nan() || self.retry_multiplier < 1.0 {
            return Err(ClientError::Config(
                "Retry multiplier must be at least 1.0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(multisig_vault::ID)
    }
}

mod base58 {
    use super::*;
    use serde::{de::Error, Deserializer, Serializer};

    pub fn serialize<S>(key: &Pubkey, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&key.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<Pubkey, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        Pubkey::from_str(&text)
            .map_err(|e| D::Error::custom(format!("invalid key {text}: {e}")))
    }
}
