//! Attestation configuration from environment variables.

use crate::domain::{FinalityTier, Pubkey, ValidationError};
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default ledger RPC endpoint.
pub const DEFAULT_RPC_URL: &str = "https://api.mainnet-beta.solana.com";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No verification program configured.
    #[error("program id is not set (BTC_ATTEST_PROGRAM_ID)")]
    MissingProgramId,

    /// Program id is not a valid key.
    #[error("invalid program id: {0}")]
    InvalidProgramId(#[from] ValidationError),

    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration for the attestation service and its ledger client.
#[derive(Debug, Clone)]
pub struct AttestationConfig {
    /// Ledger JSON-RPC endpoint.
    pub rpc_url: String,

    /// Base58 id of the deployed verification program.
    pub program_id: Option<String>,

    /// Finality tier to wait for before reading results.
    pub commitment: FinalityTier,

    /// Deadline for reaching `commitment`.
    pub confirm_timeout: Duration,

    /// Status poll period.
    pub poll_interval: Duration,

    /// Per-request HTTP timeout.
    pub rpc_timeout: Duration,

    /// Log level filter (trace, debug, info, warn, error)
    pub log_level: String,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,
}

impl Default for AttestationConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            program_id: None,
            commitment: FinalityTier::Confirmed,
            confirm_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_millis(500),
            rpc_timeout: Duration::from_secs(10),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl AttestationConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `BTC_ATTEST_RPC_URL`: Ledger RPC endpoint (default: Solana mainnet-beta)
    /// - `BTC_ATTEST_PROGRAM_ID`: Verification program id (no default)
    /// - `BTC_ATTEST_COMMITMENT`: processed | confirmed | finalized (default: confirmed)
    /// - `BTC_ATTEST_CONFIRM_TIMEOUT_SECS`: Finality deadline (default: 60)
    /// - `BTC_ATTEST_POLL_INTERVAL_MS`: Status poll period (default: 500)
    /// - `BTC_ATTEST_RPC_TIMEOUT_SECS`: HTTP request timeout (default: 10)
    /// - `BTC_ATTEST_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `BTC_ATTEST_JSON_LOGS`: Enable JSON logs (default: false)
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            rpc_url: env::var("BTC_ATTEST_RPC_URL").unwrap_or(defaults.rpc_url),

            program_id: env::var("BTC_ATTEST_PROGRAM_ID")
                .ok()
                .filter(|v| !v.trim().is_empty()),

            commitment: env::var("BTC_ATTEST_COMMITMENT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.commitment),

            confirm_timeout: env::var("BTC_ATTEST_CONFIRM_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.confirm_timeout),

            poll_interval: env::var("BTC_ATTEST_POLL_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_interval),

            rpc_timeout: env::var("BTC_ATTEST_RPC_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.rpc_timeout),

            log_level: env::var("BTC_ATTEST_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or(defaults.log_level),

            json_logs: env::var("BTC_ATTEST_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(defaults.json_logs),
        }
    }

    /// Set the program id.
    pub fn with_program_id(mut self, program_id: impl Into<String>) -> Self {
        self.program_id = Some(program_id.into());
        self
    }

    /// Parsed program id.
    pub fn program(&self) -> Result<Pubkey, ConfigError> {
        let raw = self
            .program_id
            .as_deref()
            .ok_or(ConfigError::MissingProgramId)?;
        Ok(raw.trim().parse()?)
    }

    /// Check values that would make the pipeline misbehave.
    ///
    /// The program id is checked separately by [`Self::program`], since
    /// read-only commands do not need it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rpc_url.trim().is_empty() {
            return Err(ConfigError::Invalid("rpc_url is empty".into()));
        }
        if self.confirm_timeout.is_zero() {
            return Err(ConfigError::Invalid("confirm_timeout must be > 0".into()));
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::Invalid("poll_interval must be > 0".into()));
        }
        if self.poll_interval > self.confirm_timeout {
            return Err(ConfigError::Invalid(format!(
                "poll_interval ({:?}) exceeds confirm_timeout ({:?})",
                self.poll_interval, self.confirm_timeout
            )));
        }
        if self.rpc_timeout.is_zero() {
            return Err(ConfigError::Invalid("rpc_timeout must be > 0".into()));
        }
        Ok(())
    }
}
