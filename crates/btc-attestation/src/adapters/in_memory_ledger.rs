//! In-Memory Ledger Adapter
//!
//! Implements both `ExternalSigner` and `LedgerQuery` over an in-process
//! simulation of the ledger and the deployed verification program.
//!
//! The simulated program decodes the instruction with the mirror decoder
//! and logs the way the deployed program does. Status advances one tier per
//! `polls_per_tier` status queries: processed, confirmed, finalized.

use crate::algorithms::codec::{decode, DecodedInstruction};
use crate::algorithms::extraction::SUCCESS_MARKER;
use crate::domain::{
    ExecutionRecord, FinalityTier, LedgerError, Pubkey, SubmissionHandle, Transaction,
    TransactionStatus,
};
use crate::ports::{ExternalSigner, LedgerQuery};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

/// First slot handed out by the simulation.
const GENESIS_SLOT: u64 = 1_000;

/// Failure modes the simulation can be switched into.
#[derive(Clone, Debug)]
pub struct LedgerBehavior {
    /// Reject every broadcast with this detail.
    pub reject_broadcast: Option<String>,
    /// Accepted transactions never land.
    pub stall: bool,
    /// Report transactions as dropped after this many status polls.
    pub drop_after_polls: Option<u32>,
    /// Landed transactions fail with this error.
    pub fail_execution: Option<String>,
    /// Execution records are not retained.
    pub prune_records: bool,
    /// Status polls needed per tier step.
    pub polls_per_tier: u32,
}

impl Default for LedgerBehavior {
    fn default() -> Self {
        Self {
            reject_broadcast: None,
            stall: false,
            drop_after_polls: None,
            fail_execution: None,
            prune_records: false,
            polls_per_tier: 1,
        }
    }
}

type Verifier = Box<dyn Fn(&DecodedInstruction) -> bool + Send + Sync>;

/// Stored transaction.
#[derive(Clone, Debug)]
struct LedgerEntry {
    transaction: Transaction,
    slot: u64,
    polls: u32,
    error: Option<String>,
    logs: Vec<String>,
}

/// In-memory ledger for tests and local runs.
pub struct InMemoryLedger {
    /// Program the simulation treats as deployed.
    program_id: Pubkey,
    /// Accepted transactions by handle.
    entries: RwLock<HashMap<SubmissionHandle, LedgerEntry>>,
    /// Active failure modes.
    behavior: RwLock<LedgerBehavior>,
    /// Decides whether the simulated program accepts a signature.
    verifier: Verifier,
    /// Broadcast attempts, accepted or not.
    broadcasts: AtomicU64,
}

impl InMemoryLedger {
    /// Create a ledger whose program accepts every well-formed instruction.
    pub fn new(program_id: Pubkey) -> Self {
        Self {
            program_id,
            entries: RwLock::new(HashMap::new()),
            behavior: RwLock::new(LedgerBehavior::default()),
            verifier: Box::new(|_| true),
            broadcasts: AtomicU64::new(0),
        }
    }

    /// Replace the program's signature check.
    pub fn with_verifier<F>(mut self, verifier: F) -> Self
    where
        F: Fn(&DecodedInstruction) -> bool + Send + Sync + 'static,
    {
        self.verifier = Box::new(verifier);
        self
    }

    /// Set failure modes.
    pub fn with_behavior(self, behavior: LedgerBehavior) -> Self {
        *self.behavior.write() = behavior;
        self
    }

    /// Change failure modes at runtime.
    pub fn set_behavior(&self, behavior: LedgerBehavior) {
        *self.behavior.write() = behavior;
    }

    /// Number of `sign_and_broadcast` calls received.
    pub fn broadcast_count(&self) -> u64 {
        self.broadcasts.load(Ordering::SeqCst)
    }

    /// Transaction stored under `handle`.
    pub fn transaction(&self, handle: &SubmissionHandle) -> Option<Transaction> {
        self.entries
            .read()
            .get(handle)
            .map(|entry| entry.transaction.clone())
    }

    /// Status polls received for `handle`.
    pub fn polls(&self, handle: &SubmissionHandle) -> u32 {
        self.entries.read().get(handle).map_or(0, |e| e.polls)
    }

    /// Run the simulated program over every instruction.
    fn execute(&self, transaction: &Transaction) -> (Option<String>, Vec<String>) {
        let program = self.program_id.to_string();
        let mut logs = Vec::new();

        for (index, ix) in transaction.instructions.iter().enumerate() {
            logs.push(format!("Program {program} invoke [1]"));

            let decoded = match decode(ix.data.as_bytes()) {
                Ok(decoded) => decoded,
                Err(e) => {
                    debug!(error = %e, "Simulated program rejected instruction data");
                    logs.push("Program log: Failed to deserialize instruction".to_string());
                    logs.push(format!("Program {program} failed: invalid instruction data"));
                    return (
                        Some(format!("InstructionError({index}, InvalidInstructionData)")),
                        logs,
                    );
                }
            };

            logs.push(
                "Program log: Verifying BTC signature using solana-secp256k1-ecdsa...".to_string(),
            );
            if (self.verifier)(&decoded) {
                logs.push(format!("Program log: {SUCCESS_MARKER}"));
            } else {
                logs.push("Program log: Signature Mismatch".to_string());
            }
            logs.push(format!("Program {program} success"));
        }

        (None, logs)
    }

    fn tier_after(polls: u32, polls_per_tier: u32) -> FinalityTier {
        match polls.saturating_sub(1) / polls_per_tier.max(1) {
            0 => FinalityTier::Processed,
            1 => FinalityTier::Confirmed,
            _ => FinalityTier::Finalized,
        }
    }
}

fn make_handle(sequence: u64, program_id: &Pubkey) -> SubmissionHandle {
    let mut signature = [0u8; 64];
    signature[..8].copy_from_slice(&sequence.to_le_bytes());
    signature[32..].copy_from_slice(program_id.as_bytes());
    SubmissionHandle::new(bitcoin::base58::encode(&signature))
}

#[async_trait]
impl ExternalSigner for InMemoryLedger {
    async fn sign_and_broadcast(
        &self,
        transaction: &Transaction,
    ) -> Result<SubmissionHandle, LedgerError> {
        let sequence = self.broadcasts.fetch_add(1, Ordering::SeqCst);
        let behavior = self.behavior.read().clone();

        if let Some(reason) = behavior.reject_broadcast {
            return Err(LedgerError::Rejected(reason));
        }
        if transaction.instructions.is_empty() {
            return Err(LedgerError::Rejected("transaction has no instructions".into()));
        }
        if let Some(ix) = transaction
            .instructions
            .iter()
            .find(|ix| ix.program_id != self.program_id)
        {
            return Err(LedgerError::Rejected(format!(
                "Attempt to load a program that does not exist: {}",
                ix.program_id
            )));
        }

        let (mut error, logs) = self.execute(transaction);
        if let Some(forced) = behavior.fail_execution {
            error = Some(forced);
        }

        let handle = make_handle(sequence, &self.program_id);
        let entry = LedgerEntry {
            transaction: transaction.clone(),
            slot: GENESIS_SLOT + sequence,
            polls: 0,
            error,
            logs,
        };

        info!(handle = %handle, slot = entry.slot, "Simulated ledger accepted transaction");
        self.entries.write().insert(handle.clone(), entry);
        Ok(handle)
    }
}

#[async_trait]
impl LedgerQuery for InMemoryLedger {
    async fn transaction_status(
        &self,
        handle: &SubmissionHandle,
    ) -> Result<TransactionStatus, LedgerError> {
        let behavior = self.behavior.read().clone();
        let mut entries = self.entries.write();
        let Some(entry) = entries.get_mut(handle) else {
            return Ok(TransactionStatus::Pending);
        };
        entry.polls += 1;

        if let Some(limit) = behavior.drop_after_polls {
            if entry.polls > limit {
                return Ok(TransactionStatus::Dropped {
                    reason: "blockhash expired".to_string(),
                });
            }
        }
        if behavior.stall || behavior.drop_after_polls.is_some() {
            return Ok(TransactionStatus::Pending);
        }
        if let Some(reason) = &entry.error {
            return Ok(TransactionStatus::Failed {
                slot: entry.slot,
                reason: reason.clone(),
            });
        }

        Ok(TransactionStatus::Landed {
            slot: entry.slot,
            tier: Self::tier_after(entry.polls, behavior.polls_per_tier),
        })
    }

    async fn execution_record(
        &self,
        handle: &SubmissionHandle,
        tier: FinalityTier,
    ) -> Result<Option<ExecutionRecord>, LedgerError> {
        let behavior = self.behavior.read().clone();
        if behavior.prune_records || behavior.stall || behavior.drop_after_polls.is_some() {
            return Ok(None);
        }

        let entries = self.entries.read();
        let Some(entry) = entries.get(handle) else {
            return Ok(None);
        };
        if entry.polls == 0 || !Self::tier_after(entry.polls, behavior.polls_per_tier).satisfies(tier)
        {
            return Ok(None);
        }

        Ok(Some(ExecutionRecord {
            slot: entry.slot,
            error: entry.error.clone(),
            log_messages: Some(entry.logs.clone()),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::codec::encode;
    use crate::algorithms::submission::build_transaction;
    use crate::domain::{InstructionPayload, VerificationRequest};

    fn program() -> Pubkey {
        Pubkey::new([3u8; 32])
    }

    fn payload() -> InstructionPayload {
        encode(&VerificationRequest::new("bc1qtest", "msg", "abcd").unwrap())
    }

    async fn broadcast(ledger: &InMemoryLedger) -> SubmissionHandle {
        let tx = build_transaction(&payload(), &program(), vec![]);
        ledger.sign_and_broadcast(&tx).await.unwrap()
    }

    #[tokio::test]
    async fn test_status_progresses_per_poll() {
        let ledger = InMemoryLedger::new(program());
        let handle = broadcast(&ledger).await;

        let tiers: Vec<_> = [
            ledger.transaction_status(&handle).await.unwrap(),
            ledger.transaction_status(&handle).await.unwrap(),
            ledger.transaction_status(&handle).await.unwrap(),
            ledger.transaction_status(&handle).await.unwrap(),
        ]
        .into_iter()
        .map(|s| match s {
            TransactionStatus::Landed { tier, .. } => tier,
            other => panic!("unexpected status {other:?}"),
        })
        .collect();

        assert_eq!(
            tiers,
            vec![
                FinalityTier::Processed,
                FinalityTier::Confirmed,
                FinalityTier::Finalized,
                FinalityTier::Finalized,
            ]
        );
    }

    #[tokio::test]
    async fn test_unknown_handle_is_pending() {
        let ledger = InMemoryLedger::new(program());
        let status = ledger
            .transaction_status(&SubmissionHandle::new("unknown"))
            .await
            .unwrap();
        assert_eq!(status, TransactionStatus::Pending);
    }

    #[tokio::test]
    async fn test_record_contains_marker() {
        let ledger = InMemoryLedger::new(program());
        let handle = broadcast(&ledger).await;
        ledger.transaction_status(&handle).await.unwrap();

        let record = ledger
            .execution_record(&handle, FinalityTier::Processed)
            .await
            .unwrap()
            .unwrap();
        assert!(record.logs().iter().any(|l| l.contains(SUCCESS_MARKER)));
        assert!(record.error.is_none());
    }

    #[tokio::test]
    async fn test_record_not_available_before_tier() {
        let ledger = InMemoryLedger::new(program());
        let handle = broadcast(&ledger).await;
        ledger.transaction_status(&handle).await.unwrap();

        let record = ledger
            .execution_record(&handle, FinalityTier::Finalized)
            .await
            .unwrap();
        assert!(record.is_none());
    }

    #[tokio::test]
    async fn test_verifier_rejection_omits_marker() {
        let ledger = InMemoryLedger::new(program()).with_verifier(|ix| ix.signature.len() == 65);
        let handle = broadcast(&ledger).await;
        ledger.transaction_status(&handle).await.unwrap();

        let record = ledger
            .execution_record(&handle, FinalityTier::Processed)
            .await
            .unwrap()
            .unwrap();
        assert!(!record.logs().iter().any(|l| l.contains(SUCCESS_MARKER)));
    }

    #[tokio::test]
    async fn test_wrong_program_rejected_at_broadcast() {
        let ledger = InMemoryLedger::new(program());
        let tx = build_transaction(&payload(), &Pubkey::new([4u8; 32]), vec![]);
        let result = ledger.sign_and_broadcast(&tx).await;
        assert!(matches!(result, Err(LedgerError::Rejected(_))));
        assert_eq!(ledger.broadcast_count(), 1);
    }

    #[tokio::test]
    async fn test_garbage_instruction_fails_on_chain() {
        let ledger = InMemoryLedger::new(program());
        let mut tx = build_transaction(&payload(), &program(), vec![]);
        tx.instructions[0].data = InstructionPayload::from_vec(vec![7, 1, 2]);
        let handle = ledger.sign_and_broadcast(&tx).await.unwrap();

        let status = ledger.transaction_status(&handle).await.unwrap();
        match status {
            TransactionStatus::Failed { reason, .. } => {
                assert!(reason.contains("InvalidInstructionData"))
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_drop_after_polls() {
        let ledger = InMemoryLedger::new(program()).with_behavior(LedgerBehavior {
            drop_after_polls: Some(2),
            ..Default::default()
        });
        let handle = broadcast(&ledger).await;

        assert_eq!(
            ledger.transaction_status(&handle).await.unwrap(),
            TransactionStatus::Pending
        );
        assert_eq!(
            ledger.transaction_status(&handle).await.unwrap(),
            TransactionStatus::Pending
        );
        assert!(matches!(
            ledger.transaction_status(&handle).await.unwrap(),
            TransactionStatus::Dropped { .. }
        ));
    }

    #[tokio::test]
    async fn test_handles_are_unique() {
        let ledger = InMemoryLedger::new(program());
        let a = broadcast(&ledger).await;
        let b = broadcast(&ledger).await;
        assert_ne!(a, b);
        assert!(ledger.transaction(&a).is_some());
    }
}
