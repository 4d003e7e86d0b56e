//! Concrete compiler operations and their dispatch table
//!
//! The environment selects operations through an [`OperationsTable`]: one
//! chain per identifier category, and per operation name for `Key` /
//! `HdKey` variables. Tables are plain `static` data — selection is
//! deterministic and involves no allocation.

pub mod common;
pub mod signing;

use crate::operation::Requires;

/// A chain of gated operations, tried in order by
/// [`crate::operation::attempt_chain`].
pub type OperationChain = &'static [Requires];

pub struct OperationsTable {
    pub address_data: OperationChain,
    pub wallet_data: OperationChain,
    pub current_block_height: OperationChain,
    pub current_block_time: OperationChain,
    pub signing_serialization: OperationChain,
    pub key: VariableOperations,
    pub hd_key: VariableOperations,
}

/// The operations available on `Key` and `HdKey` variables, by the
/// identifier's second segment.
pub struct VariableOperations {
    pub public_key: OperationChain,
    pub signature: OperationChain,
    pub schnorr_signature: OperationChain,
    pub data_signature: OperationChain,
    pub schnorr_data_signature: OperationChain,
}

impl VariableOperations {
    pub fn get(&self, operation: &str) -> Option<OperationChain> {
        match operation {
            "public_key" => Some(self.public_key),
            "signature" => Some(self.signature),
            "schnorr_signature" => Some(self.schnorr_signature),
            "data_signature" => Some(self.data_signature),
            "schnorr_data_signature" => Some(self.schnorr_data_signature),
            _ => None,
        }
    }
}
