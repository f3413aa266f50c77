//! # Instruction Codec
//!
//! Binary layout of the `VerifySignature` instruction. All integers are
//! little-endian, no padding:
//!
//! ```text
//! tag:u8=0 | address_len:u8 | address | message_len:u32 | message | signature_len:u8 | signature
//! ```
//!
//! The layout must match the deployed program's decoder byte for byte; a
//! mismatch is not detected here, the program simply rejects or misreads
//! the instruction.

use crate::domain::{DecodeError, InstructionPayload, VerificationRequest};

/// Discriminant of the `VerifySignature` operation.
pub const VERIFY_SIGNATURE_TAG: u8 = 0;

/// Encode a validated request into instruction data.
pub fn encode(request: &VerificationRequest) -> InstructionPayload {
    let address = request.address().as_bytes();
    let message = request.message().as_bytes();
    let signature = request.signature();

    let mut out = Vec::with_capacity(encoded_len(request));
    out.push(VERIFY_SIGNATURE_TAG);
    // Bounds were enforced when the request was built.
    out.push(address.len() as u8);
    out.extend_from_slice(address);
    out.extend_from_slice(&(message.len() as u32).to_le_bytes());
    out.extend_from_slice(message);
    out.push(signature.len() as u8);
    out.extend_from_slice(signature);

    InstructionPayload::from_vec(out)
}

/// Exact size of the encoded request.
pub fn encoded_len(request: &VerificationRequest) -> usize {
    1 + 1 + request.address().len() + 4 + request.message().len() + 1 + request.signature().len()
}

/// Decoded `VerifySignature` instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedInstruction {
    /// Bitcoin address.
    pub address: String,
    /// Signed message.
    pub message: String,
    /// Raw signature bytes.
    pub signature: Vec<u8>,
}

impl DecodedInstruction {
    /// Hex rendering of the signature.
    pub fn signature_hex(&self) -> String {
        hex::encode(&self.signature)
    }
}

/// Decode instruction data laid out by [`encode`].
///
/// This mirrors the client layout only. The deployed program reads a Borsh
/// layout (u32 length prefixes, message as a byte vector), so a payload
/// accepted here is not guaranteed to decode on-chain.
pub fn decode(data: &[u8]) -> Result<DecodedInstruction, DecodeError> {
    let mut reader = Reader { data, pos: 0 };

    let tag = reader.take("tag", 1)?[0];
    if tag != VERIFY_SIGNATURE_TAG {
        return Err(DecodeError::UnknownTag(tag));
    }

    let address_len = reader.take("address length", 1)?[0] as usize;
    let address = reader.take("address", address_len)?;
    let address = std::str::from_utf8(address).map_err(|_| DecodeError::InvalidUtf8("address"))?;

    let message_len = reader.take("message length", 4)?;
    let message_len =
        u32::from_le_bytes([message_len[0], message_len[1], message_len[2], message_len[3]])
            as usize;
    let message = reader.take("message", message_len)?;
    let message = std::str::from_utf8(message).map_err(|_| DecodeError::InvalidUtf8("message"))?;

    let signature_len = reader.take("signature length", 1)?[0] as usize;
    let signature = reader.take("signature", signature_len)?;

    let remaining = reader.remaining();
    if remaining > 0 {
        return Err(DecodeError::TrailingBytes(remaining));
    }

    Ok(DecodedInstruction {
        address: address.to_string(),
        message: message.to_string(),
        signature: signature.to_vec(),
    })
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, field: &'static str, n: usize) -> Result<&'a [u8], DecodeError> {
        let remaining = self.remaining();
        if n > remaining {
            return Err(DecodeError::Truncated {
                field,
                needed: n,
                remaining,
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_address() -> impl Strategy<Value = String> {
        "[a-km-zA-HJ-NP-Z1-9]{1,90}"
    }

    fn arb_signature() -> impl Strategy<Value = Vec<u8>> {
        prop::collection::vec(any::<u8>(), 0..=255)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Decoding an encoded request reproduces the request fields
        #[test]
        fn prop_round_trip(address in arb_address(), message in ".{0,200}", signature in arb_signature()) {
            let req = VerificationRequest::from_parts(address.clone(), message.clone(), signature.clone())
                .expect("within bounds");
            let decoded = decode(encode(&req).as_bytes()).expect("decodes");
            prop_assert_eq!(decoded.address, address);
            prop_assert_eq!(decoded.message, message);
            prop_assert_eq!(decoded.signature, signature);
        }

        /// Same input always yields the same bytes
        #[test]
        fn prop_deterministic(address in arb_address(), message in ".{0,64}", signature in arb_signature()) {
            let a = VerificationRequest::from_parts(address.clone(), message.clone(), signature.clone())
                .expect("within bounds");
            let b = VerificationRequest::from_parts(address, message, signature)
                .expect("within bounds");
            prop_assert_eq!(encode(&a), encode(&b));
        }

        /// Any strict prefix of a valid payload is rejected as truncated
        #[test]
        fn prop_prefix_rejected(address in arb_address(), signature in arb_signature(), cut in 0usize..1000) {
            let req = VerificationRequest::from_parts(address, "msg".to_string(), signature)
                .expect("within bounds");
            let bytes = encode(&req);
            let cut = cut % bytes.len();
            let is_truncated = matches!(
                decode(&bytes.as_bytes()[..cut]),
                Err(DecodeError::Truncated { .. })
            );
            prop_assert!(is_truncated);
        }
    }
}
