//! # Algorithms Module
//!
//! The four pipeline stages: encode, submit, await finality, extract.

pub mod codec;
pub mod confirmation;
pub mod extraction;
pub mod submission;

pub use codec::{decode, encode, encoded_len, DecodedInstruction, VERIFY_SIGNATURE_TAG};
pub use confirmation::await_finality;
pub use extraction::{extract_result, outcome_from_record, scan_logs, SUCCESS_MARKER};
pub use submission::{build_transaction, submit, submit_with_accounts};
