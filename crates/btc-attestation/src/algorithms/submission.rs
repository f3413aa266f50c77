//! # Transaction Submission
//!
//! Wraps instruction data in a single-instruction transaction and hands it
//! to the external signer for signing and broadcast.

use crate::domain::{
    AccountMeta, AttestationError, Instruction, InstructionPayload, Pubkey, SubmissionHandle,
    Transaction,
};
use crate::ports::ExternalSigner;
use tracing::{debug, info, warn};

/// Build the transaction carrying `payload` to `program_id`.
pub fn build_transaction(
    payload: &InstructionPayload,
    program_id: &Pubkey,
    accounts: Vec<AccountMeta>,
) -> Transaction {
    Transaction::single(Instruction {
        program_id: *program_id,
        accounts,
        data: payload.clone(),
    })
}

/// Submit `payload` to `program_id` with no account references.
pub async fn submit(
    payload: &InstructionPayload,
    program_id: &Pubkey,
    signer: Option<&dyn ExternalSigner>,
) -> Result<SubmissionHandle, AttestationError> {
    submit_with_accounts(payload, program_id, Vec::new(), signer).await
}

/// Submit `payload` to `program_id` with explicit account references.
pub async fn submit_with_accounts(
    payload: &InstructionPayload,
    program_id: &Pubkey,
    accounts: Vec<AccountMeta>,
    signer: Option<&dyn ExternalSigner>,
) -> Result<SubmissionHandle, AttestationError> {
    let signer = signer.ok_or(AttestationError::SignerUnavailable)?;
    let transaction = build_transaction(payload, program_id, accounts);

    debug!(
        program = %program_id,
        data_len = payload.len(),
        accounts = transaction.instructions[0].accounts.len(),
        "Handing transaction to signer"
    );

    match signer.sign_and_broadcast(&transaction).await {
        Ok(handle) => {
            info!(program = %program_id, handle = %handle, "Transaction broadcast");
            Ok(handle)
        }
        Err(e) => {
            warn!(program = %program_id, error = %e, "Broadcast rejected");
            Err(AttestationError::Broadcast(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::codec::encode;
    use crate::domain::{LedgerError, VerificationRequest};
    use crate::ports::MockSigner;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingSigner {
        seen: Mutex<Vec<Transaction>>,
    }

    #[async_trait]
    impl ExternalSigner for RecordingSigner {
        async fn sign_and_broadcast(
            &self,
            transaction: &Transaction,
        ) -> Result<SubmissionHandle, LedgerError> {
            self.seen.lock().push(transaction.clone());
            Ok(SubmissionHandle::new("recorded"))
        }
    }

    fn payload() -> InstructionPayload {
        encode(&VerificationRequest::new("bc1qexample", "hello", "00ff").unwrap())
    }

    #[tokio::test]
    async fn test_submit_builds_single_instruction() {
        let signer = RecordingSigner::default();
        let program = Pubkey::new([9u8; 32]);

        let handle = submit(&payload(), &program, Some(&signer)).await.unwrap();
        assert_eq!(handle.as_str(), "recorded");

        let seen = signer.seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].instructions.len(), 1);
        let ix = &seen[0].instructions[0];
        assert_eq!(ix.program_id, program);
        assert!(ix.accounts.is_empty());
        assert_eq!(ix.data, payload());
    }

    #[tokio::test]
    async fn test_submit_with_accounts_passes_accounts() {
        let signer = RecordingSigner::default();
        let account = AccountMeta {
            pubkey: Pubkey::new([1u8; 32]),
            is_signer: false,
            is_writable: true,
        };

        submit_with_accounts(
            &payload(),
            &Pubkey::new([9u8; 32]),
            vec![account.clone()],
            Some(&signer),
        )
        .await
        .unwrap();

        assert_eq!(signer.seen.lock()[0].instructions[0].accounts, vec![account]);
    }

    #[tokio::test]
    async fn test_submit_without_signer() {
        let result = submit(&payload(), &Pubkey::new([9u8; 32]), None).await;
        assert_eq!(result, Err(AttestationError::SignerUnavailable));
    }

    #[tokio::test]
    async fn test_submit_broadcast_rejected() {
        let signer = MockSigner {
            reject_with: Some(LedgerError::Rejected("blockhash not found".into())),
            ..Default::default()
        };
        let result = submit(&payload(), &Pubkey::new([9u8; 32]), Some(&signer)).await;
        match result {
            Err(AttestationError::Broadcast(detail)) => assert!(detail.contains("blockhash")),
            other => panic!("expected broadcast error, got {other:?}"),
        }
    }
}
