//! # BTC Signature Attestation
//!
//! Proves that a Bitcoin address signed a message by having a verification
//! program on a Solana-compatible ledger check the signature.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Pipeline
//!
//! | Stage | Operation | Failure |
//! |-------|-----------|---------|
//! | Request builder | `encode` | `Validation` |
//! | Transaction submitter | `submit` | `SignerUnavailable`, `Broadcast` |
//! | Confirmation waiter | `await_finality` | `LedgerRejected`, `Timeout` |
//! | Result extractor | `extract_result` | `RecordUnavailable` |
//!
//! The program reports its verdict only through log output, so a
//! `NotVerified` result is an answer, not an error.
//!
//! ## Module Structure
//!
//! ```text
//! btc-attestation/
//! ├── domain/          # Request, payload, ledger records, errors
//! ├── algorithms/      # Codec, submission, confirmation, extraction
//! ├── ports/           # AttestationApi, ExternalSigner, LedgerQuery
//! ├── adapters/        # RpcLedgerClient, InMemoryLedger
//! ├── config.rs        # Environment configuration
//! └── service.rs       # AttestationService
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::{InMemoryLedger, LedgerBehavior, RpcLedgerClient};
pub use algorithms::{
    await_finality, build_transaction, decode, encode, encoded_len, extract_result,
    outcome_from_record, scan_logs, submit, submit_with_accounts, DecodedInstruction,
    SUCCESS_MARKER, VERIFY_SIGNATURE_TAG,
};
pub use config::{AttestationConfig, ConfigError};
pub use domain::{
    AccountMeta, AttestationError, DecodeError, ExecutionRecord, FinalityTier, Finalized,
    Instruction, InstructionPayload, LedgerError, Pubkey, SubmissionHandle, Transaction,
    TransactionStatus, ValidationError, VerificationOutcome, VerificationRequest,
    MAX_ADDRESS_LEN, MAX_MESSAGE_LEN, MAX_SIGNATURE_LEN,
};
pub use ports::{AttestationApi, ExternalSigner, LedgerQuery, MockSigner};
pub use service::{AttestationService, ServiceConfig, ServiceStats};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
