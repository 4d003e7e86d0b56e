//! Per-invocation compilation inputs
//!
//! [`CompilationData`] carries everything a single compilation may read:
//! key material, the transaction context signatures commit to, and the
//! current block height / time. All fields are optional; compiler
//! operations declare which ones they require and the dispatcher reports
//! the missing ones by name.

use std::collections::HashMap;

use crate::serialization::OperationData;

/// Plain key material, keyed by variable id.
#[derive(Debug, Clone, Default)]
pub struct Keys {
    /// 32-byte private keys.
    pub private_keys: HashMap<String, [u8; 32]>,
    /// Pre-computed public keys, returned verbatim.
    pub public_keys: HashMap<String, Vec<u8>>,
    /// Pre-computed signatures, keyed by the full identifier
    /// (e.g. `owner.signature.all_outputs`).
    pub signatures: HashMap<String, Vec<u8>>,
}

/// Hierarchical key material.
///
/// Serialized HD keys are keyed by the *entity* that owns them; derived
/// public keys and signatures are keyed by variable id / full identifier.
#[derive(Debug, Clone, Default)]
pub struct HdKeys {
    /// Address index substituted for `i` in derivation paths.
    pub address_index: Option<u32>,
    /// Serialized HD private keys (`xprv…`), by entity id.
    pub hd_private_keys: HashMap<String, String>,
    /// Serialized HD public keys (`xpub…`), by entity id.
    pub hd_public_keys: HashMap<String, String>,
    /// Pre-derived public keys, by variable id.
    pub derived_public_keys: HashMap<String, Vec<u8>>,
    /// Pre-computed signatures, keyed by the full identifier.
    pub signatures: HashMap<String, Vec<u8>>,
}

/// The inputs a single compilation may read.
#[derive(Debug, Clone, Default)]
pub struct CompilationData {
    pub keys: Option<Keys>,
    pub hd_keys: Option<HdKeys>,
    /// Per-invocation bytes for `AddressData` variables, by variable id.
    pub address_data: Option<HashMap<String, Vec<u8>>>,
    /// Cross-invocation bytes for `WalletData` variables, by variable id.
    pub wallet_data: Option<HashMap<String, Vec<u8>>>,
    /// Transaction context required by signing operations.
    pub operation_data: Option<OperationData>,
    pub current_block_height: Option<u32>,
    /// Unix seconds; must land in the time-based locktime range.
    pub current_block_time: Option<u64>,
}

impl CompilationData {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn keys(mut self, keys: Keys) -> Self {
        self.keys = Some(keys);
        self
    }

    pub fn hd_keys(mut self, hd_keys: HdKeys) -> Self {
        self.hd_keys = Some(hd_keys);
        self
    }

    pub fn address_data(mut self, address_data: HashMap<String, Vec<u8>>) -> Self {
        self.address_data = Some(address_data);
        self
    }

    pub fn wallet_data(mut self, wallet_data: HashMap<String, Vec<u8>>) -> Self {
        self.wallet_data = Some(wallet_data);
        self
    }

    pub fn operation_data(mut self, operation_data: OperationData) -> Self {
        self.operation_data = Some(operation_data);
        self
    }

    pub fn current_block_height(mut self, height: u32) -> Self {
        self.current_block_height = Some(height);
        self
    }

    pub fn current_block_time(mut self, time: u64) -> Self {
        self.current_block_time = Some(time);
        self
    }
}
