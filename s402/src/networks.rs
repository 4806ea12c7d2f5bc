//! Registry of well-known networks and their stablecoin deployments.
//!
//! The settlement engine needs two pieces of static data per network: the
//! CAIP-2 chain identifier and the USDC deployment on that network (contract
//! or mint address, decimals, and the EIP-712 domain metadata EVM tokens
//! sign under). Applications assemble a [`NetworkRegistry`] from
//! [`KNOWN_NETWORKS`] at startup, or extend it with their own entries.

use std::collections::HashMap;

use crate::chain::{ChainId, PayerChain};

/// A known network definition with its chain ID and token deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkInfo {
    /// Human-readable network name (e.g., "base", "solana-devnet").
    pub name: &'static str,
    /// CAIP-2 namespace (e.g., "eip155", "solana").
    pub namespace: &'static str,
    /// Chain reference (e.g., "8453" for Base).
    pub reference: &'static str,
    /// The chain family this network belongs to.
    pub payer_chain: PayerChain,
    /// USDC deployment on this network.
    pub usdc: TokenDeployment,
}

/// A stablecoin deployment on a specific network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenDeployment {
    /// Contract address (EVM, 0x-hex) or mint address (Solana, base58).
    pub address: &'static str,
    /// Token decimals (USDC uses 6 everywhere we settle).
    pub decimals: u32,
    /// EIP-712 domain name for EVM deployments; empty for Solana.
    pub eip712_name: &'static str,
    /// EIP-712 domain version for EVM deployments; empty for Solana.
    pub eip712_version: &'static str,
}

impl NetworkInfo {
    /// Creates a [`ChainId`] from this network info.
    #[must_use]
    pub fn chain_id(&self) -> ChainId {
        ChainId::new(self.namespace, self.reference)
    }
}

/// Networks the settlement core knows out of the box.
pub const KNOWN_NETWORKS: &[NetworkInfo] = &[
    NetworkInfo {
        name: "base",
        namespace: "eip155",
        reference: "8453",
        payer_chain: PayerChain::Base,
        usdc: TokenDeployment {
            address: "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913",
            decimals: 6,
            eip712_name: "USD Coin",
            eip712_version: "2",
        },
    },
    NetworkInfo {
        name: "base-sepolia",
        namespace: "eip155",
        reference: "84532",
        payer_chain: PayerChain::Base,
        usdc: TokenDeployment {
            address: "0x036CbD53842c5426634e7929541eC2318f3dCF7e",
            decimals: 6,
            eip712_name: "USDC",
            eip712_version: "2",
        },
    },
    NetworkInfo {
        name: "solana",
        namespace: "solana",
        reference: "5eykt4UsFv8P8NJdTREpY1vzqKqZKvdp",
        payer_chain: PayerChain::Solana,
        usdc: TokenDeployment {
            address: "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
            decimals: 6,
            eip712_name: "",
            eip712_version: "",
        },
    },
    NetworkInfo {
        name: "solana-devnet",
        namespace: "solana",
        reference: "EtWTRABZaYq6iMfeYKouRu166VU2xqa1",
        payer_chain: PayerChain::Solana,
        usdc: TokenDeployment {
            address: "4zMMC9srt5Ri5X14GAgXhaHii3GnPAEERYPJgZJDncDU",
            decimals: 6,
            eip712_name: "",
            eip712_version: "",
        },
    },
];

/// Registry that maps network names to [`NetworkInfo`] and chain IDs back to
/// network entries.
///
/// Built from one or more `&[NetworkInfo]` slices. This is the single source
/// of truth for name/CAIP-2 lookups inside the settlement engine.
#[derive(Debug, Clone)]
pub struct NetworkRegistry {
    by_name: HashMap<&'static str, NetworkInfo>,
    by_chain_id: HashMap<ChainId, NetworkInfo>,
}

impl NetworkRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            by_name: HashMap::new(),
            by_chain_id: HashMap::new(),
        }
    }

    /// Creates a registry pre-populated from a network info slice.
    #[must_use]
    pub fn from_networks(networks: &[NetworkInfo]) -> Self {
        let mut registry = Self::new();
        registry.register(networks);
        registry
    }

    /// Registers additional networks into this registry.
    pub fn register(&mut self, networks: &[NetworkInfo]) {
        for info in networks {
            self.by_name.insert(info.name, *info);
            self.by_chain_id.insert(info.chain_id(), *info);
        }
    }

    /// Builder-style method: registers additional networks and returns `self`.
    #[must_use]
    pub fn with_networks(mut self, networks: &[NetworkInfo]) -> Self {
        self.register(networks);
        self
    }

    /// Looks up a network by its human-readable name.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&NetworkInfo> {
        self.by_name.get(name)
    }

    /// Looks up a network by its CAIP-2 chain ID.
    #[must_use]
    pub fn by_chain_id(&self, chain_id: &ChainId) -> Option<&NetworkInfo> {
        self.by_chain_id.get(chain_id)
    }

    /// Returns the first registered network belonging to the given chain family.
    ///
    /// Useful when the engine is configured with exactly one network per
    /// family (the common deployment).
    #[must_use]
    pub fn by_payer_chain(&self, payer_chain: PayerChain) -> Option<&NetworkInfo> {
        self.by_chain_id
            .values()
            .find(|info| info.payer_chain == payer_chain)
    }

    /// Returns the number of registered networks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Returns `true` if no networks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl Default for NetworkRegistry {
    fn default() -> Self {
        Self::from_networks(KNOWN_NETWORKS)
    }
}
