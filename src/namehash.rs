//! Namehash engine
//!
//! Pure, deterministic hashing of a domain name into the 32-byte lookup key
//! used by on-chain registries. All backends share the same recursive fold;
//! they differ only in the underlying digest function (Keccak-256 for the
//! EVM-based registries, SHA-256 for Zilliqa).

use sha2::{Digest as Sha2Digest, Sha256};
use sha3::Keccak256;

/// 32-byte namehash digest.
pub type NamehashDigest = [u8; 32];

/// Digest of the empty domain, the base of every hash chain.
pub const ZERO_DIGEST: NamehashDigest = [0u8; 32];

/// Underlying digest function of a naming-service backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashFamily {
    /// Keccak-256, used by ENS, CNS and RNS.
    Keccak256,
    /// SHA-256, used by ZNS.
    Sha256,
}

impl HashFamily {
    /// Hash arbitrary bytes with this family's digest function.
    pub fn digest(&self, data: &[u8]) -> NamehashDigest {
        match self {
            HashFamily::Keccak256 => {
                let mut hasher = Keccak256::new();
                hasher.update(data);
                hasher.finalize().into()
            }
            HashFamily::Sha256 => {
                let mut hasher = Sha256::new();
                hasher.update(data);
                hasher.finalize().into()
            }
        }
    }
}

/// Recursive namehash of a normalized domain.
///
/// Splits at the first dot into `label` and `remainder` and returns
/// `digest(namehash(remainder) ++ digest(label))`; the empty domain hashes
/// to [`ZERO_DIGEST`]. Case handling happens upstream in domain
/// normalization, never here.
pub fn namehash(domain: &str, family: HashFamily) -> NamehashDigest {
    if domain.is_empty() {
        return ZERO_DIGEST;
    }
    match domain.split_once('.') {
        Some((label, remainder)) => childhash(&namehash(remainder, family), label, family),
        None => childhash(&ZERO_DIGEST, domain, family),
    }
}

/// Single fold step: combine a parent digest with one child label.
///
/// `namehash(label.parent) == childhash(namehash(parent), label)`, which
/// lets callers verify sub-domain relationships without recomputing the
/// whole chain.
pub fn childhash(parent: &NamehashDigest, label: &str, family: HashFamily) -> NamehashDigest {
    let label_digest = family.digest(label.as_bytes());
    let mut combined = [0u8; 64];
    combined[..32].copy_from_slice(parent);
    combined[32..].copy_from_slice(&label_digest);
    family.digest(&combined)
}

/// Encode a digest as a hex string, optionally `0x`-prefixed.
pub fn to_hex(digest: &NamehashDigest, prefix: bool) -> String {
    let body = hex::encode(digest);
    if prefix {
        format!("0x{}", body)
    } else {
        body
    }
}

/// Encode a digest as the unsigned decimal string of its 256-bit value.
pub fn to_decimal(digest: &NamehashDigest) -> String {
    // Base-10 digits, least significant first.
    let mut digits: Vec<u8> = vec![0];
    for &byte in digest.iter() {
        let mut carry = byte as u32;
        for d in digits.iter_mut() {
            let v = (*d as u32) * 256 + carry;
            *d = (v % 10) as u8;
            carry = v / 10;
        }
        while carry > 0 {
            digits.push((carry % 10) as u8);
            carry /= 10;
        }
    }
    digits.iter().rev().map(|d| (b'0' + d) as char).collect()
}

/// Decode a hex digest string (with or without `0x` prefix).
pub fn from_hex(input: &str) -> Option<NamehashDigest> {
    let body = input.strip_prefix("0x").unwrap_or(input);
    let bytes = hex::decode(body).ok()?;
    let digest: NamehashDigest = bytes.try_into().ok()?;
    Some(digest)
}
