//! # Attestation Service
//!
//! Composes the four pipeline stages behind the `AttestationApi` port:
//!
//! ```text
//! encode ──→ submit ──→ await_finality ──→ extract_result
//! (pure)    (signer)     (ledger polls)     (ledger fetch)
//! ```
//!
//! Stages run strictly in order for one attempt. Attempts share nothing but
//! the statistics counters, so one service can serve concurrent callers.
//! Dropping an in-flight `verify` future cancels the attempt: at most the
//! already-broadcast transaction executes, nothing local needs undoing.

use crate::algorithms::{self, codec};
use crate::config::{AttestationConfig, ConfigError};
use crate::domain::{
    AccountMeta, AttestationError, FinalityTier, Finalized, InstructionPayload, Pubkey,
    SubmissionHandle, VerificationOutcome, VerificationRequest,
};
use crate::ports::{AttestationApi, ExternalSigner, LedgerQuery};

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Pipeline settings.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Deployed verification program.
    pub program_id: Pubkey,
    /// Tier awaited before reading the result.
    pub commitment: FinalityTier,
    /// Finality deadline.
    pub confirm_timeout: Duration,
    /// Status poll period.
    pub poll_interval: Duration,
}

impl ServiceConfig {
    /// Settings with default timing for `program_id`.
    pub fn new(program_id: Pubkey) -> Self {
        let defaults = AttestationConfig::default();
        Self {
            program_id,
            commitment: defaults.commitment,
            confirm_timeout: defaults.confirm_timeout,
            poll_interval: defaults.poll_interval,
        }
    }
}

impl ServiceConfig {
    /// Settings for the read-only stages (`check`), which never touch the
    /// program id. A configured id is still parsed so a bad value is caught.
    pub fn for_reading(config: &AttestationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let program_id = match config.program() {
            Ok(program_id) => program_id,
            Err(ConfigError::MissingProgramId) => Pubkey::default(),
            Err(e) => return Err(e),
        };
        Ok(Self {
            program_id,
            commitment: config.commitment,
            confirm_timeout: config.confirm_timeout,
            poll_interval: config.poll_interval,
        })
    }
}

impl TryFrom<&AttestationConfig> for ServiceConfig {
    type Error = ConfigError;

    fn try_from(config: &AttestationConfig) -> Result<Self, Self::Error> {
        config.validate()?;
        Ok(Self {
            program_id: config.program()?,
            commitment: config.commitment,
            confirm_timeout: config.confirm_timeout,
            poll_interval: config.poll_interval,
        })
    }
}

/// Counters over all attempts served by one service.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ServiceStats {
    /// Attempts started.
    pub attempts: u64,
    /// Attempts ending in `Verified`.
    pub verified: u64,
    /// Attempts ending in `NotVerified`.
    pub not_verified: u64,
    /// Attempts ending in an error other than a timeout.
    pub failed: u64,
    /// Attempts ending in a finality timeout.
    pub timeouts: u64,
}

impl ServiceStats {
    fn record(&mut self, result: &Result<VerificationOutcome, AttestationError>) {
        match result {
            Ok(VerificationOutcome::Verified) => self.verified += 1,
            Ok(VerificationOutcome::NotVerified) => self.not_verified += 1,
            Err(AttestationError::Timeout { .. }) => self.timeouts += 1,
            Err(_) => self.failed += 1,
        }
    }
}

/// The attestation service.
pub struct AttestationService<L: LedgerQuery> {
    /// Pipeline settings.
    config: ServiceConfig,
    /// Ledger query adapter.
    ledger: Arc<L>,
    /// Signer supplied by the host, if any.
    signer: Option<Arc<dyn ExternalSigner>>,
    /// Service statistics.
    stats: Arc<RwLock<ServiceStats>>,
}

impl<L: LedgerQuery> AttestationService<L> {
    /// Create a service without a signer; `verify` fails with
    /// `SignerUnavailable` until one is attached.
    pub fn new(ledger: Arc<L>, config: ServiceConfig) -> Self {
        Self {
            config,
            ledger,
            signer: None,
            stats: Arc::new(RwLock::new(ServiceStats::default())),
        }
    }

    /// Attach the host's signer.
    pub fn with_signer(mut self, signer: Arc<dyn ExternalSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Pipeline settings.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Snapshot of the statistics.
    pub fn stats(&self) -> ServiceStats {
        self.stats.read().clone()
    }

    /// Stage 1: validate and encode.
    pub fn build_payload(
        &self,
        address: &str,
        message: &str,
        signature_hex: &str,
    ) -> Result<InstructionPayload, AttestationError> {
        let request = VerificationRequest::new(address, message, signature_hex)?;
        Ok(codec::encode(&request))
    }

    /// Stage 2: submit to the configured program with no account references.
    pub async fn submit(
        &self,
        payload: &InstructionPayload,
    ) -> Result<SubmissionHandle, AttestationError> {
        self.submit_with_accounts(payload, Vec::new()).await
    }

    /// Stage 2 with explicit account references.
    pub async fn submit_with_accounts(
        &self,
        payload: &InstructionPayload,
        accounts: Vec<AccountMeta>,
    ) -> Result<SubmissionHandle, AttestationError> {
        algorithms::submit_with_accounts(
            payload,
            &self.config.program_id,
            accounts,
            self.signer.as_deref(),
        )
        .await
    }

    /// Stage 3: wait for the configured tier.
    pub async fn await_finality(
        &self,
        handle: &SubmissionHandle,
    ) -> Result<Finalized, AttestationError> {
        algorithms::await_finality(
            self.ledger.as_ref(),
            handle,
            self.config.commitment,
            self.config.confirm_timeout,
            self.config.poll_interval,
        )
        .await
    }

    /// Stage 4: read the outcome.
    pub async fn extract_result(
        &self,
        handle: &SubmissionHandle,
    ) -> Result<VerificationOutcome, AttestationError> {
        algorithms::extract_result(self.ledger.as_ref(), handle, self.config.commitment).await
    }

    /// Stages 3 and 4 for a transaction broadcast elsewhere.
    #[instrument(skip(self, handle), fields(handle = %handle))]
    pub async fn check(
        &self,
        handle: &SubmissionHandle,
    ) -> Result<VerificationOutcome, AttestationError> {
        self.await_finality(handle).await?;
        self.extract_result(handle).await
    }

    #[instrument(
        skip(self, message, signature_hex),
        fields(attempt_id = %Uuid::new_v4(), program = %self.config.program_id)
    )]
    async fn run_attempt(
        &self,
        address: &str,
        message: &str,
        signature_hex: &str,
    ) -> Result<VerificationOutcome, AttestationError> {
        let payload = self.build_payload(address, message, signature_hex)?;
        let handle = self.submit(&payload).await?;
        self.await_finality(&handle).await?;
        self.extract_result(&handle).await
    }
}

#[async_trait]
impl<L: LedgerQuery + 'static> AttestationApi for AttestationService<L> {
    async fn verify(
        &self,
        address: &str,
        message: &str,
        signature_hex: &str,
    ) -> Result<VerificationOutcome, AttestationError> {
        self.stats.write().attempts += 1;

        let result = self.run_attempt(address, message, signature_hex).await;
        self.stats.write().record(&result);

        match &result {
            Ok(outcome) => info!(address, outcome = %outcome, "Attestation complete"),
            Err(e) => warn!(address, error = %e, retryable = e.is_retryable(), "Attestation failed"),
        }
        result
    }
}
