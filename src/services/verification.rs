//! Verified-record signature checks
//!
//! One record family carries a detached signature: the verified Twitter
//! username. The signature covers `domain|owner|recordKey|value` and must
//! recover to the fixed verifier address, otherwise the value is withheld.

use crate::namehash::HashFamily;
use crate::shared::error::{ResolutionError, Result};
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, Secp256k1};

/// Address whose signatures attest Twitter usernames.
pub const TWITTER_VERIFIER_ADDRESS: &str = "0x12cfb13522f13a78b650fdbe6c165c0f9bd4f6f8";

/// Record key holding the verified username.
pub const TWITTER_USERNAME_KEY: &str = "social.twitter.username";

/// Record key holding the detached signature for the username.
pub const TWITTER_VALIDATION_KEY: &str = "validation.social.twitter.username";

/// Keccak-256 digest of an Ethereum signed message.
fn signed_message_digest(message: &str) -> [u8; 32] {
    let envelope = format!("\x19Ethereum Signed Message:\n{}{}", message.len(), message);
    HashFamily::Keccak256.digest(envelope.as_bytes())
}

/// Recover the signer address of a detached 65-byte signature.
fn recover_signer(message: &str, signature: &str) -> Option<String> {
    let bytes = hex::decode(signature.strip_prefix("0x").unwrap_or(signature)).ok()?;
    if bytes.len() != 65 {
        return None;
    }

    // Accept both raw (0/1) and Ethereum-style (27/28) recovery ids.
    let v = bytes[64] as i32;
    let recovery_id = RecoveryId::from_i32(if v >= 27 { v - 27 } else { v }).ok()?;
    let signature = RecoverableSignature::from_compact(&bytes[..64], recovery_id).ok()?;
    let message = Message::from_slice(&signed_message_digest(message)).ok()?;

    let public_key = Secp256k1::new().recover_ecdsa(&message, &signature).ok()?;
    let serialized = public_key.serialize_uncompressed();
    let digest = HashFamily::Keccak256.digest(&serialized[1..]);
    Some(format!("0x{}", hex::encode(&digest[12..])))
}

/// Check a Twitter username record against its validation signature.
///
/// Succeeds only when the signature over `domain|owner|key|value` recovers
/// to [`TWITTER_VERIFIER_ADDRESS`].
pub fn verify_twitter_record(
    domain: &str,
    owner: &str,
    key: &str,
    value: &str,
    signature: &str,
) -> Result<()> {
    let message = format!("{}|{}|{}|{}", domain, owner, key, value);
    let recovered = recover_signer(&message, signature);
    match recovered {
        Some(address) if address.eq_ignore_ascii_case(TWITTER_VERIFIER_ADDRESS) => Ok(()),
        _ => Err(ResolutionError::InvalidTwitterVerification {
            domain: domain.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_signature_fails_verification() {
        for bad in ["", "0x", "0xdead", &format!("0x{}", "00".repeat(64))] {
            let err = verify_twitter_record(
                "brad.crypto",
                "0x1111111111111111111111111111111111111111",
                TWITTER_USERNAME_KEY,
                "brad",
                bad,
            )
            .unwrap_err();
            assert!(matches!(
                err,
                ResolutionError::InvalidTwitterVerification { .. }
            ));
        }
    }

    #[test]
    fn test_signed_message_digest_uses_eth_prefix() {
        // Digest must differ from the bare keccak of the message.
        let bare = HashFamily::Keccak256.digest(b"abc");
        assert_ne!(signed_message_digest("abc"), bare);
    }

    #[test]
    fn test_valid_signature_from_wrong_signer_is_rejected() {
        // A structurally valid signature (recoverable to *some* address)
        // that was not produced by the verifier must still fail.
        let signature = format!("0x{}{}{}", "11".repeat(32), "22".repeat(32), "1b");
        let result = verify_twitter_record(
            "brad.crypto",
            "0x1111111111111111111111111111111111111111",
            TWITTER_USERNAME_KEY,
            "brad",
            &signature,
        );
        assert!(result.is_err());
    }
}
