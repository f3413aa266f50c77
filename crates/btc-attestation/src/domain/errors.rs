//! # Domain Errors
//!
//! Error taxonomy for the attestation pipeline.
//!
//! `AttestationError` is what callers of `verify` see. `LedgerError` is what
//! the outbound ports report; the pipeline stages translate it into the
//! attestation taxonomy depending on which stage observed it.

use super::value_objects::FinalityTier;
use thiserror::Error;

/// Input validation failures raised while building a verification request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Address is empty.
    #[error("address must not be empty")]
    EmptyAddress,

    /// Address does not fit in the one-byte length prefix.
    #[error("address too long: {len} > {max} bytes")]
    AddressTooLong {
        /// Encoded length in bytes.
        len: usize,
        /// Maximum allowed length.
        max: usize,
    },

    /// Message does not fit in the four-byte length prefix.
    #[error("message too long: {len} > {max} bytes")]
    MessageTooLong {
        /// Encoded length in bytes.
        len: u64,
        /// Maximum allowed length.
        max: u64,
    },

    /// Signature does not fit in the one-byte length prefix.
    #[error("signature too long: {len} > {max} bytes")]
    SignatureTooLong {
        /// Decoded length in bytes.
        len: usize,
        /// Maximum allowed length.
        max: usize,
    },

    /// Signature is not a valid hex string.
    #[error("invalid signature hex: {0}")]
    InvalidSignatureHex(String),

    /// Program or account key is not a valid 32-byte base58 key.
    #[error("invalid public key: {0}")]
    InvalidPubkey(String),
}

/// Failures of the mirror decoder for instruction payloads.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Leading discriminant is not a known operation.
    #[error("unknown instruction tag: {0}")]
    UnknownTag(u8),

    /// Payload ended before a field was complete.
    #[error("truncated payload: needed {needed} bytes for {field}, {remaining} remaining")]
    Truncated {
        /// Field being read.
        field: &'static str,
        /// Bytes required.
        needed: usize,
        /// Bytes left in the payload.
        remaining: usize,
    },

    /// Bytes remain after the last field.
    #[error("{0} trailing bytes after signature")]
    TrailingBytes(usize),

    /// Address or message is not UTF-8.
    #[error("{0} is not valid UTF-8")]
    InvalidUtf8(&'static str),
}

/// Errors reported by the ledger-facing ports (signer, ledger query).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Network or HTTP failure talking to the ledger node.
    #[error("transport error: {0}")]
    Transport(String),

    /// The node answered with a JSON-RPC error object.
    #[error("rpc error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code.
        code: i64,
        /// Error message from the node.
        message: String,
    },

    /// The node answered with something we could not interpret.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The ledger refused the transaction (bad envelope, fee, simulation failure).
    #[error("transaction rejected: {0}")]
    Rejected(String),
}

/// Attestation pipeline errors.
///
/// Every variant means "could not determine verification"; a failed
/// verification is `Ok(VerificationOutcome::NotVerified)`, never an error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AttestationError {
    /// Malformed input. Caller's fault, never retried.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// No signer is configured in the host environment.
    #[error("no signer available to sign the transaction")]
    SignerUnavailable,

    /// The ledger rejected the broadcast outright.
    #[error("broadcast failed: {0}")]
    Broadcast(String),

    /// The transaction landed but failed, or was dropped.
    #[error("ledger rejected transaction: {0}")]
    LedgerRejected(String),

    /// The requested finality tier was not reached before the deadline.
    #[error("transaction not {tier} after {waited_ms}ms")]
    Timeout {
        /// Tier that was awaited.
        tier: FinalityTier,
        /// Time spent waiting.
        waited_ms: u64,
    },

    /// The execution record could not be fetched.
    #[error("cannot determine result: {0}")]
    RecordUnavailable(String),
}

impl AttestationError {
    /// Returns true if a fresh attempt (new request, new handle) may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_converts() {
        let err: AttestationError = ValidationError::EmptyAddress.into();
        assert!(matches!(err, AttestationError::Validation(_)));
        assert!(err.to_string().contains("address must not be empty"));
    }

    #[test]
    fn test_address_too_long_error() {
        let err = ValidationError::AddressTooLong { len: 256, max: 255 };
        assert!(err.to_string().contains("256 > 255"));
    }

    #[test]
    fn test_timeout_error_display() {
        let err = AttestationError::Timeout {
            tier: FinalityTier::Confirmed,
            waited_ms: 1500,
        };
        assert_eq!(err.to_string(), "transaction not confirmed after 1500ms");
    }

    #[test]
    fn test_only_timeout_is_retryable() {
        assert!(AttestationError::Timeout {
            tier: FinalityTier::Finalized,
            waited_ms: 0
        }
        .is_retryable());
        assert!(!AttestationError::SignerUnavailable.is_retryable());
        assert!(!AttestationError::LedgerRejected("dropped".into()).is_retryable());
        assert!(!AttestationError::RecordUnavailable("pruned".into()).is_retryable());
    }

    #[test]
    fn test_rpc_error_display() {
        let err = LedgerError::Rpc {
            code: -32602,
            message: "Invalid params".to_string(),
        };
        assert!(err.to_string().contains("-32602"));
    }
}
