//! # Domain Invariants
//!
//! Field bounds imposed by the instruction layout's length prefixes.

use super::errors::ValidationError;

/// Maximum address length (one-byte length prefix).
pub const MAX_ADDRESS_LEN: usize = u8::MAX as usize;

/// Maximum message length (four-byte length prefix).
pub const MAX_MESSAGE_LEN: u64 = u32::MAX as u64;

/// Maximum decoded signature length (one-byte length prefix).
pub const MAX_SIGNATURE_LEN: usize = u8::MAX as usize;

/// Invariant: address is non-empty and fits its length prefix.
pub fn invariant_address_length(len: usize) -> Result<(), ValidationError> {
    if len == 0 {
        return Err(ValidationError::EmptyAddress);
    }
    if len > MAX_ADDRESS_LEN {
        return Err(ValidationError::AddressTooLong {
            len,
            max: MAX_ADDRESS_LEN,
        });
    }
    Ok(())
}

/// Invariant: message fits its length prefix.
pub fn invariant_message_length(len: usize) -> Result<(), ValidationError> {
    let len = len as u64;
    if len > MAX_MESSAGE_LEN {
        return Err(ValidationError::MessageTooLong {
            len,
            max: MAX_MESSAGE_LEN,
        });
    }
    Ok(())
}

/// Invariant: decoded signature fits its length prefix.
pub fn invariant_signature_length(len: usize) -> Result<(), ValidationError> {
    if len > MAX_SIGNATURE_LEN {
        return Err(ValidationError::SignatureTooLong {
            len,
            max: MAX_SIGNATURE_LEN,
        });
    }
    Ok(())
}
