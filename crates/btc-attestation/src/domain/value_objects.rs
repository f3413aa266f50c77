//! # Domain Value Objects
//!
//! Immutable value types shared by the pipeline stages.

use super::errors::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Confirmation depth exposed by the ledger for transaction status.
///
/// Ordered from weakest to strongest, so `landed >= requested` means the
/// requested tier has been reached.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum FinalityTier {
    /// Executed by the leader, may still be rolled back.
    Processed,
    /// Voted on by a supermajority.
    #[default]
    Confirmed,
    /// Rooted; cannot be rolled back.
    Finalized,
}

impl FinalityTier {
    /// Name used on the wire (`commitment` / `confirmationStatus`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processed => "processed",
            Self::Confirmed => "confirmed",
            Self::Finalized => "finalized",
        }
    }

    /// Check whether a transaction landed at `self` satisfies `required`.
    pub fn satisfies(&self, required: FinalityTier) -> bool {
        *self >= required
    }
}

impl fmt::Display for FinalityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FinalityTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "processed" => Ok(Self::Processed),
            "confirmed" => Ok(Self::Confirmed),
            "finalized" => Ok(Self::Finalized),
            other => Err(format!("unknown finality tier: {other}")),
        }
    }
}

/// 32-byte ledger key identifying a program or an account. The default is
/// the all-zero key (the system program).
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pubkey([u8; 32]);

impl Pubkey {
    /// Key length in bytes.
    pub const LEN: usize = 32;

    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl FromStr for Pubkey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bitcoin::base58::decode(s)
            .map_err(|e| ValidationError::InvalidPubkey(format!("{s}: {e}")))?;
        let key: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            ValidationError::InvalidPubkey(format!(
                "{s}: expected {} bytes, got {}",
                Self::LEN,
                bytes.len()
            ))
        })?;
        Ok(Self(key))
    }
}

impl fmt::Display for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bitcoin::base58::encode(&self.0))
    }
}

impl fmt::Debug for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pubkey({self})")
    }
}

/// Opaque transaction identifier returned by the ledger after broadcast.
///
/// Not reusable across attempts: a retry submits a new transaction and gets
/// a new handle.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubmissionHandle(String);

impl SubmissionHandle {
    /// Wrap a ledger transaction identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubmissionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of an attestation that reached finality.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationOutcome {
    /// The program logged the success marker.
    Verified,
    /// The program ran but did not log the success marker.
    NotVerified,
}

impl VerificationOutcome {
    /// Check if verified.
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified)
    }
}

impl From<bool> for VerificationOutcome {
    fn from(verified: bool) -> Self {
        if verified {
            Self::Verified
        } else {
            Self::NotVerified
        }
    }
}

impl fmt::Display for VerificationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Verified => f.write_str("Verified"),
            Self::NotVerified => f.write_str("Not verified"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_ordering() {
        assert!(FinalityTier::Processed < FinalityTier::Confirmed);
        assert!(FinalityTier::Confirmed < FinalityTier::Finalized);
    }

    #[test]
    fn test_tier_satisfies() {
        assert!(FinalityTier::Finalized.satisfies(FinalityTier::Confirmed));
        assert!(FinalityTier::Confirmed.satisfies(FinalityTier::Confirmed));
        assert!(!FinalityTier::Processed.satisfies(FinalityTier::Confirmed));
    }

    #[test]
    fn test_tier_parse() {
        assert_eq!("Finalized".parse::<FinalityTier>(), Ok(FinalityTier::Finalized));
        assert_eq!(" processed ".parse::<FinalityTier>(), Ok(FinalityTier::Processed));
        assert!("rooted".parse::<FinalityTier>().is_err());
    }

    #[test]
    fn test_tier_serde_lowercase() {
        let json = serde_json::to_string(&FinalityTier::Confirmed).unwrap();
        assert_eq!(json, "\"confirmed\"");
    }

    #[test]
    fn test_pubkey_system_program() {
        let key: Pubkey = "11111111111111111111111111111111".parse().unwrap();
        assert_eq!(key, Pubkey::new([0u8; 32]));
        assert_eq!(key.to_string(), "11111111111111111111111111111111");
    }

    #[test]
    fn test_pubkey_round_trip() {
        let key = Pubkey::new([7u8; 32]);
        let parsed: Pubkey = key.to_string().parse().unwrap();
        assert_eq!(parsed, key);
    }

    #[test]
    fn test_pubkey_wrong_length() {
        let result = "1111".parse::<Pubkey>();
        assert!(matches!(result, Err(ValidationError::InvalidPubkey(_))));
    }

    #[test]
    fn test_pubkey_invalid_alphabet() {
        // '0' and 'O' are not in the base58 alphabet
        assert!("0OIl".parse::<Pubkey>().is_err());
    }

    #[test]
    fn test_outcome_from_bool() {
        assert_eq!(VerificationOutcome::from(true), VerificationOutcome::Verified);
        assert_eq!(VerificationOutcome::from(false), VerificationOutcome::NotVerified);
        assert!(!VerificationOutcome::NotVerified.is_verified());
    }
}
