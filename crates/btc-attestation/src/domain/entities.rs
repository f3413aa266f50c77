//! # Domain Entities
//!
//! Request, payload and ledger records flowing through the pipeline.

use super::errors::ValidationError;
use super::invariants::{
    invariant_address_length, invariant_message_length, invariant_signature_length,
};
use super::value_objects::{FinalityTier, Pubkey, SubmissionHandle};
use serde::{Deserialize, Serialize};

/// A validated request to prove `address` signed `message`.
///
/// Fields are private so a constructed request always satisfies the
/// layout bounds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationRequest {
    address: String,
    message: String,
    signature: Vec<u8>,
}

impl VerificationRequest {
    /// Build a request, decoding `signature_hex` and checking every bound.
    pub fn new(
        address: impl Into<String>,
        message: impl Into<String>,
        signature_hex: &str,
    ) -> Result<Self, ValidationError> {
        let signature = hex::decode(signature_hex)
            .map_err(|e| ValidationError::InvalidSignatureHex(e.to_string()))?;
        Self::from_parts(address.into(), message.into(), signature)
    }

    /// Build a request from an already decoded signature.
    pub fn from_parts(
        address: String,
        message: String,
        signature: Vec<u8>,
    ) -> Result<Self, ValidationError> {
        invariant_address_length(address.len())?;
        invariant_message_length(message.len())?;
        invariant_signature_length(signature.len())?;
        Ok(Self {
            address,
            message,
            signature,
        })
    }

    /// Bitcoin address claimed to have signed the message.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Signed message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Raw signature bytes.
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }
}

/// Serialized instruction data for the verification program.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstructionPayload(Vec<u8>);

impl InstructionPayload {
    pub(crate) fn from_vec(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Payload bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl std::fmt::Debug for InstructionPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "InstructionPayload({} bytes: {})", self.0.len(), self.to_hex())
    }
}

/// Account reference carried by an instruction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMeta {
    /// Account key.
    pub pubkey: Pubkey,
    /// Must sign the transaction.
    pub is_signer: bool,
    /// Program may write to it.
    pub is_writable: bool,
}

/// A single program invocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    /// Program to invoke.
    pub program_id: Pubkey,
    /// Accounts the program may touch.
    pub accounts: Vec<AccountMeta>,
    /// Opaque instruction data.
    pub data: InstructionPayload,
}

/// Unsigned transaction handed to the external signer.
///
/// Fee payer, recent blockhash and signatures are filled in by the signer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Instructions in execution order.
    pub instructions: Vec<Instruction>,
}

impl Transaction {
    /// Create a transaction with one instruction.
    pub fn single(instruction: Instruction) -> Self {
        Self {
            instructions: vec![instruction],
        }
    }
}

/// Ledger-reported state of a submitted transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Not yet visible to the ledger.
    Pending,
    /// Executed successfully and landed at `tier`.
    Landed {
        /// Slot the transaction landed in.
        slot: u64,
        /// Current confirmation depth.
        tier: FinalityTier,
    },
    /// Executed and failed.
    Failed {
        /// Slot the transaction landed in.
        slot: u64,
        /// Ledger-provided error detail.
        reason: String,
    },
    /// Will never land (e.g. its blockhash expired).
    Dropped {
        /// Ledger-provided detail.
        reason: String,
    },
}

/// Execution metadata for a landed transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// Slot the transaction landed in.
    pub slot: u64,
    /// Execution error, if the transaction failed.
    pub error: Option<String>,
    /// Program log lines in emission order. `None` if the ledger omitted them.
    pub log_messages: Option<Vec<String>>,
}

impl ExecutionRecord {
    /// Log lines, empty when absent.
    pub fn logs(&self) -> &[String] {
        self.log_messages.as_deref().unwrap_or(&[])
    }
}

/// A transaction that reached the requested finality tier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Finalized {
    /// Handle that was awaited.
    pub handle: SubmissionHandle,
    /// Slot the transaction landed in.
    pub slot: u64,
    /// Tier observed on the last poll (at least the requested tier).
    pub tier: FinalityTier,
}
