//! # Inbound Ports
//!
//! API the presentation layer calls.

use crate::domain::{AttestationError, VerificationOutcome};
use async_trait::async_trait;

/// Attestation API - inbound port.
#[async_trait]
pub trait AttestationApi: Send + Sync {
    /// Prove on-chain that `address` signed `message`.
    ///
    /// `Ok(NotVerified)` means the program ran and did not accept the
    /// signature. Any `Err` means the result could not be determined.
    async fn verify(
        &self,
        address: &str,
        message: &str,
        signature_hex: &str,
    ) -> Result<VerificationOutcome, AttestationError>;
}
