//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements the outbound ports: a JSON-RPC ledger client for real nodes
//! and an in-memory ledger that simulates the verification program.

mod in_memory_ledger;
mod rpc_ledger;
mod rpc_types;

pub use in_memory_ledger::{InMemoryLedger, LedgerBehavior};
pub use rpc_ledger::RpcLedgerClient;
pub use rpc_types::{SignatureStatus, TransactionMeta, TransactionResult};
