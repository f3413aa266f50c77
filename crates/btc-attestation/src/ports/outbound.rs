//! # Outbound Ports
//!
//! Collaborators supplied by the host environment: the wallet that signs and
//! broadcasts, and the ledger node that answers status and record queries.

use crate::domain::{
    ExecutionRecord, FinalityTier, LedgerError, SubmissionHandle, Transaction, TransactionStatus,
};
use async_trait::async_trait;

/// Signs and broadcasts transactions (e.g. a connected wallet).
#[async_trait]
pub trait ExternalSigner: Send + Sync {
    /// Sign `transaction`, broadcast it, and return the ledger's identifier.
    async fn sign_and_broadcast(
        &self,
        transaction: &Transaction,
    ) -> Result<SubmissionHandle, LedgerError>;
}

/// Read access to the ledger.
#[async_trait]
pub trait LedgerQuery: Send + Sync {
    /// Current status of a submitted transaction.
    async fn transaction_status(
        &self,
        handle: &SubmissionHandle,
    ) -> Result<TransactionStatus, LedgerError>;

    /// Execution record of a landed transaction, read at `tier`.
    ///
    /// `Ok(None)` if the ledger does not know the transaction (never landed
    /// or pruned).
    async fn execution_record(
        &self,
        handle: &SubmissionHandle,
        tier: FinalityTier,
    ) -> Result<Option<ExecutionRecord>, LedgerError>;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Mock signer returning a fixed handle.
#[derive(Clone, Debug)]
pub struct MockSigner {
    /// Handle returned on success.
    pub handle: SubmissionHandle,
    /// Rejection returned instead, if set.
    pub reject_with: Option<LedgerError>,
}

impl Default for MockSigner {
    fn default() -> Self {
        Self {
            handle: SubmissionHandle::new("mock-signature"),
            reject_with: None,
        }
    }
}

#[async_trait]
impl ExternalSigner for MockSigner {
    async fn sign_and_broadcast(
        &self,
        _transaction: &Transaction,
    ) -> Result<SubmissionHandle, LedgerError> {
        match &self.reject_with {
            Some(err) => Err(err.clone()),
            None => Ok(self.handle.clone()),
        }
    }
}
