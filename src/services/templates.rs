//! Registry/resolver call templates
//!
//! The RPC boundary of each backend family. EVM registries are read through
//! `eth_call` with minimal ABI coding (4-byte selector plus 32-byte words);
//! Zilliqa registries through `GetSmartContractSubState` queries against the
//! contract state maps.

use crate::namehash::{HashFamily, NamehashDigest};
use crate::provider::NormalizedProvider;
use crate::shared::error::{ResolutionError, Result};
use futures::try_join;
use serde_json::{json, Value};

/// Registry fields to read for one namehash. Skipped fields cost no RPC
/// round trip on EVM backends.
#[derive(Debug, Clone, Copy)]
pub struct RegistryRequest {
    /// Read the owner field
    pub owner: bool,
    /// Read the resolver field
    pub resolver: bool,
    /// Read the ttl field
    pub ttl: bool,
}

/// Registry fields for one namehash.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryRecords {
    /// Owner address; `None` for unregistered names
    pub owner: Option<String>,
    /// Resolver contract address
    pub resolver: Option<String>,
    /// Registry TTL
    pub ttl: Option<u64>,
}

/// Resolver read shape of an EVM backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordCall {
    /// `addr(bytes32)` for the primary address, `text(bytes32,string)` for
    /// everything else (ENS, RNS)
    Text,
    /// `get(string,uint256)` keyed by dotted path (CNS)
    Get,
}

/// Request template binding a backend to its contract read protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallTemplate {
    /// `eth_call` against an EVM registry/resolver pair
    Evm {
        /// Resolver record read shape
        record_call: RecordCall,
    },
    /// Zilliqa substate queries
    Zilliqa,
}

impl CallTemplate {
    /// Read the requested registry fields for a namehash. The reads are
    /// independent and issued concurrently; unrequested fields read as
    /// absent without touching the wire.
    pub async fn registry_records(
        &self,
        provider: &NormalizedProvider,
        registry: &str,
        node: &NamehashDigest,
        request: RegistryRequest,
    ) -> Result<RegistryRecords> {
        match self {
            CallTemplate::Evm { .. } => {
                let field_call = |wanted: bool, signature: &str| {
                    wanted.then(|| encode_call(signature, &[AbiValue::Bytes32(*node)]))
                };
                let (owner_ret, resolver_ret, ttl_ret) = try_join!(
                    optional_eth_call(provider, registry, field_call(request.owner, "owner(bytes32)")),
                    optional_eth_call(provider, registry, field_call(request.resolver, "resolver(bytes32)")),
                    optional_eth_call(provider, registry, field_call(request.ttl, "ttl(bytes32)")),
                )?;
                Ok(RegistryRecords {
                    owner: owner_ret.as_deref().and_then(decode_address),
                    resolver: resolver_ret.as_deref().and_then(decode_address),
                    ttl: ttl_ret.as_deref().and_then(decode_u64),
                })
            }
            CallTemplate::Zilliqa => {
                let node_hex = crate::namehash::to_hex(node, true);
                let result = provider
                    .request(
                        "GetSmartContractSubState",
                        json!([strip_hex_prefix(registry), "records", [node_hex.clone()]]),
                    )
                    .await?;
                let arguments = &result["records"][&node_hex]["arguments"];
                Ok(RegistryRecords {
                    owner: non_empty_address(arguments.get(0)),
                    resolver: non_empty_address(arguments.get(1)),
                    ttl: None,
                })
            }
        }
    }

    /// Read one resolver record; `Ok(None)` when the key is absent.
    pub async fn read_record(
        &self,
        provider: &NormalizedProvider,
        resolver: &str,
        node: &NamehashDigest,
        key: &str,
    ) -> Result<Option<String>> {
        match self {
            CallTemplate::Evm { record_call } => {
                let (data, as_address) = match record_call {
                    RecordCall::Text if key == "crypto.ETH.address" => {
                        (encode_call("addr(bytes32)", &[AbiValue::Bytes32(*node)]), true)
                    }
                    RecordCall::Text => (
                        encode_call(
                            "text(bytes32,string)",
                            &[AbiValue::Bytes32(*node), AbiValue::Str(key.to_string())],
                        ),
                        false,
                    ),
                    RecordCall::Get => (
                        encode_call(
                            "get(string,uint256)",
                            &[AbiValue::Str(key.to_string()), AbiValue::Bytes32(*node)],
                        ),
                        false,
                    ),
                };
                let ret = eth_call(provider, resolver, data).await?;
                if as_address {
                    Ok(decode_address(&ret))
                } else {
                    Ok(decode_string(&ret))
                }
            }
            CallTemplate::Zilliqa => {
                let result = provider
                    .request(
                        "GetSmartContractSubState",
                        json!([strip_hex_prefix(resolver), "records", [key]]),
                    )
                    .await?;
                Ok(result["records"][key]
                    .as_str()
                    .filter(|v| !v.is_empty())
                    .map(|v| v.to_string()))
            }
        }
    }
}

/// One ABI-encodable call argument.
pub(crate) enum AbiValue {
    Bytes32(NamehashDigest),
    Str(String),
}

/// 4-byte function selector: `keccak256(signature)[..4]`.
pub(crate) fn selector(signature: &str) -> [u8; 4] {
    let digest = HashFamily::Keccak256.digest(signature.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

fn word_from_u64(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Encode a contract call: selector, then head words (static values or
/// offsets), then the dynamic tail.
pub(crate) fn encode_call(signature: &str, args: &[AbiValue]) -> String {
    let head_len = args.len() * 32;
    let mut head: Vec<u8> = Vec::with_capacity(head_len);
    let mut tail: Vec<u8> = Vec::new();

    for arg in args {
        match arg {
            AbiValue::Bytes32(word) => head.extend_from_slice(word),
            AbiValue::Str(s) => {
                head.extend_from_slice(&word_from_u64((head_len + tail.len()) as u64));
                tail.extend_from_slice(&word_from_u64(s.len() as u64));
                tail.extend_from_slice(s.as_bytes());
                let padding = (32 - s.len() % 32) % 32;
                tail.extend(std::iter::repeat(0u8).take(padding));
            }
        }
    }

    let mut data = selector(signature).to_vec();
    data.extend(head);
    data.extend(tail);
    format!("0x{}", hex::encode(data))
}

async fn optional_eth_call(
    provider: &NormalizedProvider,
    to: &str,
    data: Option<String>,
) -> Result<Option<String>> {
    match data {
        Some(data) => eth_call(provider, to, data).await.map(Some),
        None => Ok(None),
    }
}

async fn eth_call(provider: &NormalizedProvider, to: &str, data: String) -> Result<String> {
    let result = provider
        .request("eth_call", json!([{"to": to, "data": data}, "latest"]))
        .await?;
    result
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| ResolutionError::provider("eth_call returned a non-string result"))
}

fn return_words(ret: &str) -> Option<Vec<u8>> {
    let body = ret.strip_prefix("0x").unwrap_or(ret);
    hex::decode(body).ok().filter(|bytes| !bytes.is_empty())
}

/// Decode an address word; the zero address reads as absent.
pub(crate) fn decode_address(ret: &str) -> Option<String> {
    let words = return_words(ret)?;
    let word = words.get(..32)?;
    let address = &word[12..32];
    if address.iter().all(|&b| b == 0) {
        return None;
    }
    Some(format!("0x{}", hex::encode(address)))
}

/// Decode a uint word into its low 64 bits.
pub(crate) fn decode_u64(ret: &str) -> Option<u64> {
    let words = return_words(ret)?;
    let word = words.get(..32)?;
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&word[24..32]);
    Some(u64::from_be_bytes(bytes))
}

/// Decode a dynamic string return; empty reads as absent. Offsets and
/// lengths come off the wire, so all range arithmetic is checked.
pub(crate) fn decode_string(ret: &str) -> Option<String> {
    let words = return_words(ret)?;
    let offset = usize::try_from(decode_u64(ret)?).ok()?;
    let data_start = offset.checked_add(32)?;
    let len_word = words.get(offset..data_start)?;
    let mut len_bytes = [0u8; 8];
    len_bytes.copy_from_slice(&len_word[24..32]);
    let len = usize::try_from(u64::from_be_bytes(len_bytes)).ok()?;
    if len == 0 {
        return None;
    }
    let data = words.get(data_start..data_start.checked_add(len)?)?;
    String::from_utf8(data.to_vec()).ok()
}

fn strip_hex_prefix(address: &str) -> &str {
    address.strip_prefix("0x").unwrap_or(address)
}

fn non_empty_address(value: Option<&Value>) -> Option<String> {
    let address = value?.as_str()?;
    let body = strip_hex_prefix(address);
    if body.is_empty() || body.chars().all(|c| c == '0') {
        return None;
    }
    Some(address.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_is_keccak_prefix() {
        // Canonical ERC-137 selector for owner(bytes32).
        assert_eq!(hex::encode(selector("owner(bytes32)")), "02571be3");
        assert_eq!(hex::encode(selector("resolver(bytes32)")), "0178b8bf");
    }

    #[test]
    fn test_encode_static_call() {
        let node = [0xabu8; 32];
        let data = encode_call("owner(bytes32)", &[AbiValue::Bytes32(node)]);
        assert_eq!(data.len(), 2 + 8 + 64);
        assert!(data.starts_with("0x02571be3"));
        assert!(data.ends_with(&"ab".repeat(32)));
    }

    #[test]
    fn test_encode_dynamic_string_arg() {
        let node = [0u8; 32];
        let data = encode_call(
            "text(bytes32,string)",
            &[AbiValue::Bytes32(node), AbiValue::Str("abc".to_string())],
        );
        let bytes = hex::decode(data.strip_prefix("0x").unwrap()).unwrap();
        // selector + node word + offset word + length word + padded data
        assert_eq!(bytes.len(), 4 + 32 + 32 + 32 + 32);
        // Offset points past the two head words.
        assert_eq!(bytes[4 + 32 + 31], 64);
        // Length word then "abc" padded.
        assert_eq!(bytes[4 + 64 + 31], 3);
        assert_eq!(&bytes[4 + 96..4 + 99], b"abc");
    }

    #[test]
    fn test_decode_address_zero_is_absent() {
        let zero = format!("0x{}", "00".repeat(32));
        assert_eq!(decode_address(&zero), None);

        let ret = format!("0x{}{}", "00".repeat(12), "11".repeat(20));
        assert_eq!(decode_address(&ret), Some(format!("0x{}", "11".repeat(20))));
    }

    #[test]
    fn test_decode_string_round_trip() {
        // offset 32, length 5, "hello" padded
        let mut words = vec![0u8; 96];
        words[31] = 32;
        words[63] = 5;
        words[64..69].copy_from_slice(b"hello");
        let ret = format!("0x{}", hex::encode(&words));
        assert_eq!(decode_string(&ret), Some("hello".to_string()));
    }

    #[test]
    fn test_decode_string_tolerates_hostile_offsets() {
        // Offset word of all-ones would wrap the range arithmetic.
        let ret = format!("0x{}", "ff".repeat(32));
        assert_eq!(decode_string(&ret), None);

        // In-range offset, length word runs past the buffer.
        let mut words = vec![0u8; 64];
        words[31] = 32;
        words[63] = 0xff;
        let ret = format!("0x{}", hex::encode(&words));
        assert_eq!(decode_string(&ret), None);
    }

    #[test]
    fn test_decode_empty_returns_absent() {
        assert_eq!(decode_string("0x"), None);
        assert_eq!(decode_address("0x"), None);

        // offset 32, length 0
        let mut words = vec![0u8; 64];
        words[31] = 32;
        let ret = format!("0x{}", hex::encode(&words));
        assert_eq!(decode_string(&ret), None);
    }
}
