//! Naming-service adapters
//!
//! One parameterized adapter covers every backend; the backends differ only
//! in configuration: hash family, owned suffixes, network table and call
//! template. Backend "variants" are therefore presets, not subclasses.

pub mod templates;
pub mod verification;

use crate::models::{RecordField, RecordMap, ResolutionContext};
use crate::namehash::{self, HashFamily, NamehashDigest};
use crate::provider::{NormalizedProvider, ProviderSource};
use crate::shared::error::{ConfigurationError, ResolutionError, Result};
use futures::future::try_join_all;
use templates::{CallTemplate, RecordCall};
use tracing::debug;
use verification::{verify_twitter_record, TWITTER_USERNAME_KEY, TWITTER_VALIDATION_KEY};

/// Supported naming-service backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceName {
    /// Ethereum Name Service (`.eth` and friends)
    Ens,
    /// Crypto Name Service (`.crypto`)
    Cns,
    /// Zilliqa Name Service (`.zil`)
    Zns,
    /// RSK Name Service (`.rsk`)
    Rns,
}

impl ServiceName {
    /// Lowercase service identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceName::Ens => "ens",
            ServiceName::Cns => "cns",
            ServiceName::Zns => "zns",
            ServiceName::Rns => "rns",
        }
    }

    /// Parse a service identifier.
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "ens" => Ok(ServiceName::Ens),
            "cns" => Ok(ServiceName::Cns),
            "zns" => Ok(ServiceName::Zns),
            "rns" => Ok(ServiceName::Rns),
            other => Err(ResolutionError::UnsupportedService {
                service: other.to_string(),
            }),
        }
    }

    /// Hash family of this backend's namehash.
    pub fn hash_family(&self) -> HashFamily {
        match self {
            ServiceName::Zns => HashFamily::Sha256,
            _ => HashFamily::Keccak256,
        }
    }
}

impl std::fmt::Display for ServiceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-service construction parameters.
pub struct ServiceConfig {
    /// Transport capability set
    pub source: ProviderSource,
    /// Network name, keyed into the preset's registry table
    pub network: String,
    /// Registry address override
    pub registry: Option<String>,
}

impl ServiceConfig {
    /// Config for mainnet with no registry override.
    pub fn new(source: ProviderSource) -> Self {
        Self {
            source,
            network: "mainnet".to_string(),
            registry: None,
        }
    }

    /// Select a network.
    pub fn network<N: Into<String>>(mut self, network: N) -> Self {
        self.network = network.into();
        self
    }

    /// Override the registry address.
    pub fn registry<R: Into<String>>(mut self, registry: R) -> Self {
        self.registry = Some(registry.into());
        self
    }
}

struct ServicePreset {
    name: ServiceName,
    suffixes: &'static [&'static str],
    networks: &'static [(&'static str, &'static str)],
    template: CallTemplate,
    legacy_resolvers: &'static [&'static str],
}

const ENS_PRESET: ServicePreset = ServicePreset {
    name: ServiceName::Ens,
    suffixes: &["eth", "luxe", "kred", "xn--qxa6a"],
    networks: &[
        ("mainnet", "0x00000000000c2e074ec69a0dfb2997ba6c7d2e1e"),
        ("ropsten", "0x00000000000c2e074ec69a0dfb2997ba6c7d2e1e"),
        ("rinkeby", "0x00000000000c2e074ec69a0dfb2997ba6c7d2e1e"),
        ("goerli", "0x00000000000c2e074ec69a0dfb2997ba6c7d2e1e"),
    ],
    template: CallTemplate::Evm {
        record_call: RecordCall::Text,
    },
    legacy_resolvers: &[],
};

const CNS_PRESET: ServicePreset = ServicePreset {
    name: ServiceName::Cns,
    suffixes: &["crypto"],
    networks: &[("mainnet", "0xd1e5b0ff1287aa9f9a268759062e4ab08b9dacbe")],
    template: CallTemplate::Evm {
        record_call: RecordCall::Get,
    },
    legacy_resolvers: &[
        "0xa1cac442be6673c49f8e74ffc7c4fd746f3cbd0d",
        "0x878bc2f3f717766ab69c0a5f9a6144931e61aed3",
    ],
};

const ZNS_PRESET: ServicePreset = ServicePreset {
    name: ServiceName::Zns,
    suffixes: &["zil"],
    networks: &[("mainnet", "0x9611c53be6d1b32058b2747bdba2c17bff1cc2db")],
    template: CallTemplate::Zilliqa,
    legacy_resolvers: &[],
};

const RNS_PRESET: ServicePreset = ServicePreset {
    name: ServiceName::Rns,
    suffixes: &["rsk"],
    networks: &[("mainnet", "0xcb868aeabd31e2b66f74e9a55cf064abb31a4ad5")],
    template: CallTemplate::Evm {
        record_call: RecordCall::Text,
    },
    legacy_resolvers: &[],
};

/// One naming-service backend: a preset bound to a normalized provider and
/// a registry address. Immutable after construction.
pub struct NamingServiceAdapter {
    name: ServiceName,
    family: HashFamily,
    suffixes: Vec<String>,
    provider: NormalizedProvider,
    registry: String,
    network: String,
    template: CallTemplate,
    legacy_resolvers: &'static [&'static str],
}

impl std::fmt::Debug for NamingServiceAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamingServiceAdapter")
            .field("name", &self.name)
            .field("network", &self.network)
            .field("registry", &self.registry)
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}

impl NamingServiceAdapter {
    /// ENS-family adapter (`.eth`, `.luxe`, `.kred`, `.xn--qxa6a`).
    pub fn ens(config: ServiceConfig) -> std::result::Result<Self, ConfigurationError> {
        Self::from_preset(&ENS_PRESET, config)
    }

    /// CNS adapter (`.crypto`).
    pub fn cns(config: ServiceConfig) -> std::result::Result<Self, ConfigurationError> {
        Self::from_preset(&CNS_PRESET, config)
    }

    /// ZNS adapter (`.zil`).
    pub fn zns(config: ServiceConfig) -> std::result::Result<Self, ConfigurationError> {
        Self::from_preset(&ZNS_PRESET, config)
    }

    /// RNS adapter (`.rsk`).
    pub fn rns(config: ServiceConfig) -> std::result::Result<Self, ConfigurationError> {
        Self::from_preset(&RNS_PRESET, config)
    }

    fn from_preset(
        preset: &ServicePreset,
        config: ServiceConfig,
    ) -> std::result::Result<Self, ConfigurationError> {
        let registry = match config.registry {
            Some(address) => address.to_lowercase(),
            None => preset
                .networks
                .iter()
                .find(|(network, _)| *network == config.network)
                .map(|(_, address)| address.to_string())
                .ok_or_else(|| ConfigurationError::UnsupportedNetwork {
                    service: preset.name.to_string(),
                    network: config.network.clone(),
                })?,
        };
        let provider = NormalizedProvider::new(config.source)?;

        Ok(Self {
            name: preset.name,
            family: preset.name.hash_family(),
            suffixes: preset.suffixes.iter().map(|s| s.to_string()).collect(),
            provider,
            registry,
            network: config.network,
            template: preset.template,
            legacy_resolvers: preset.legacy_resolvers,
        })
    }

    /// Which backend this adapter speaks for.
    pub fn service_name(&self) -> ServiceName {
        self.name
    }

    /// Configured network.
    pub fn network(&self) -> &str {
        &self.network
    }

    /// Registry contract address in use.
    pub fn registry(&self) -> &str {
        &self.registry
    }

    /// Suffix match against the backend's owned top-level domains.
    pub fn is_supported_domain(&self, domain: &str) -> bool {
        self.suffixes
            .iter()
            .any(|suffix| domain == suffix || domain.ends_with(&format!(".{}", suffix)))
    }

    /// Namehash of a domain under this backend's hash family.
    pub fn namehash(&self, domain: &str) -> NamehashDigest {
        namehash::namehash(domain, self.family)
    }

    /// Resolve the context's requested fields against registry and resolver.
    pub async fn resolve(&self, ctx: &ResolutionContext) -> Result<RecordMap> {
        // Zilliqa registries carry no TTL field.
        if self.template == CallTemplate::Zilliqa && ctx.fields.contains(&RecordField::Ttl) {
            return Err(ResolutionError::UnsupportedMethod {
                method: "ttl".to_string(),
                domain: ctx.domain.clone(),
            });
        }

        let node = self.namehash(&ctx.domain);
        debug!(
            domain = %ctx.domain,
            service = %self.name,
            node = %namehash::to_hex(&node, true),
            "Resolving domain"
        );

        // Owner is always read: it backs the registration check and record
        // signature verification. The other registry fields are read only
        // when the context asks for them.
        let request = templates::RegistryRequest {
            owner: true,
            resolver: ctx.needs_resolver(),
            ttl: ctx.fields.contains(&RecordField::Ttl),
        };
        let registry = self
            .template
            .registry_records(&self.provider, &self.registry, &node, request)
            .await?;

        let owner = registry
            .owner
            .clone()
            .ok_or_else(|| ResolutionError::UnregisteredDomain {
                domain: ctx.domain.clone(),
            })?;

        let mut result = RecordMap {
            owner: Some(owner.clone()),
            resolver: registry.resolver.clone(),
            ttl: registry.ttl,
            ..Default::default()
        };

        if !ctx.needs_resolver() {
            return Ok(result);
        }

        let resolver =
            registry
                .resolver
                .ok_or_else(|| ResolutionError::UnspecifiedResolver {
                    domain: ctx.domain.clone(),
                })?;

        let keys = ctx.record_keys();
        self.check_resolver_interface(&ctx.domain, &resolver, &keys)?;

        let reads = keys
            .iter()
            .map(|key| self.read_record(ctx, &node, &resolver, &owner, key));
        for (key, value) in try_join_all(reads).await? {
            result.records.insert(key, value);
        }

        Ok(result)
    }

    /// Legacy resolvers only answer the single primary-address call.
    fn check_resolver_interface(&self, domain: &str, resolver: &str, keys: &[&str]) -> Result<()> {
        if !self
            .legacy_resolvers
            .iter()
            .any(|legacy| legacy.eq_ignore_ascii_case(resolver))
        {
            return Ok(());
        }
        if let Some(key) = keys.iter().find(|key| **key != "crypto.ETH.address") {
            return Err(ResolutionError::IncorrectResolverInterface {
                domain: domain.to_string(),
                method: key.to_string(),
            });
        }
        Ok(())
    }

    async fn read_record(
        &self,
        ctx: &ResolutionContext,
        node: &NamehashDigest,
        resolver: &str,
        owner: &str,
        key: &str,
    ) -> Result<(String, String)> {
        let value = self
            .template
            .read_record(&self.provider, resolver, node, key)
            .await?
            .ok_or_else(|| ResolutionError::RecordNotFound {
                domain: ctx.domain.clone(),
                key: key.to_string(),
            })?;

        if key == TWITTER_USERNAME_KEY {
            let signature = self
                .template
                .read_record(&self.provider, resolver, node, TWITTER_VALIDATION_KEY)
                .await?
                .ok_or_else(|| ResolutionError::InvalidTwitterVerification {
                    domain: ctx.domain.clone(),
                })?;
            verify_twitter_record(&ctx.domain, owner, key, &value, &signature)?;
        }

        Ok((key.to_string(), value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::transports::HttpTransport;
    use std::sync::Arc;

    fn http_source() -> ProviderSource {
        ProviderSource::from_middleware(Arc::new(
            HttpTransport::new("https://mainnet.example/rpc").unwrap(),
        ))
    }

    #[test]
    fn test_suffix_ownership() {
        let cns = NamingServiceAdapter::cns(ServiceConfig::new(http_source())).unwrap();
        assert!(cns.is_supported_domain("brad.crypto"));
        assert!(cns.is_supported_domain("crypto"));
        assert!(cns.is_supported_domain("a.b.crypto"));
        assert!(!cns.is_supported_domain("brad.zil"));
        assert!(!cns.is_supported_domain("bradcrypto"));
    }

    #[test]
    fn test_ens_owns_multiple_suffixes() {
        let ens = NamingServiceAdapter::ens(ServiceConfig::new(http_source())).unwrap();
        for domain in ["vitalik.eth", "brand.luxe", "name.kred", "name.xn--qxa6a"] {
            assert!(ens.is_supported_domain(domain), "{domain}");
        }
    }

    #[test]
    fn test_unknown_network_is_rejected_at_construction() {
        let err =
            NamingServiceAdapter::cns(ServiceConfig::new(http_source()).network("moonnet"))
                .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::UnsupportedNetwork {
                service: "cns".to_string(),
                network: "moonnet".to_string(),
            }
        );
    }

    #[test]
    fn test_registry_override_skips_network_table() {
        let adapter = NamingServiceAdapter::cns(
            ServiceConfig::new(http_source())
                .network("moonnet")
                .registry("0xABCDEF0000000000000000000000000000000001"),
        )
        .unwrap();
        assert_eq!(
            adapter.registry(),
            "0xabcdef0000000000000000000000000000000001"
        );
    }

    #[test]
    fn test_zns_uses_sha256_family() {
        let zns = NamingServiceAdapter::zns(ServiceConfig::new(http_source())).unwrap();
        assert_eq!(
            zns.namehash("brad.zil"),
            namehash::namehash("brad.zil", HashFamily::Sha256)
        );
    }

    #[test]
    fn test_debug_identifies_backend_and_network() {
        let cns = NamingServiceAdapter::cns(ServiceConfig::new(http_source())).unwrap();
        let rendered = format!("{cns:?}");
        assert!(rendered.contains("Cns"));
        assert!(rendered.contains("mainnet"));
    }

    #[test]
    fn test_empty_source_fails_with_incorrect_provider() {
        let err = NamingServiceAdapter::cns(ServiceConfig::new(ProviderSource::default()))
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::IncorrectProvider { .. }));
    }
}
