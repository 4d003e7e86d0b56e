//! The BCH operation set
//!
//! One static table wires every identifier category to its operation
//! chain. Chains pair a skippable pre-computed lookup with an
//! authoritative derivation fallback, so callers can supply either raw
//! key material or finished bytes for the same identifier.

use std::sync::Arc;

use tessera_crypto::capability::{NativeRipemd160, NativeSha1, NativeSha256, NativeSha512};
use tessera_crypto::key::secp256k1::NativeSecp256k1;
use tessera_template::AuthenticationTemplate;

use crate::environment::CompilationEnvironment;
use crate::operation::{DataProperty, EnvironmentProperty, Requires};
use crate::operations::{common, signing, OperationsTable, VariableOperations};

use DataProperty::{
    AddressData, CurrentBlockHeight, CurrentBlockTime, HdKeys, HdKeysAddressIndex, Keys,
    OperationData, WalletData,
};
use EnvironmentProperty::{Ripemd160, ScriptCompiler, Secp256k1, Sha256, Sha512};

pub static BCH_OPERATIONS: OperationsTable = OperationsTable {
    address_data: &[Requires {
        can_be_skipped: false,
        data_properties: &[AddressData],
        environment_properties: &[],
        operation: common::address_data,
    }],
    wallet_data: &[Requires {
        can_be_skipped: false,
        data_properties: &[WalletData],
        environment_properties: &[],
        operation: common::wallet_data,
    }],
    current_block_height: &[Requires {
        can_be_skipped: false,
        data_properties: &[CurrentBlockHeight],
        environment_properties: &[],
        operation: common::current_block_height,
    }],
    current_block_time: &[Requires {
        can_be_skipped: false,
        data_properties: &[CurrentBlockTime],
        environment_properties: &[],
        operation: common::current_block_time,
    }],
    signing_serialization: &[Requires {
        can_be_skipped: false,
        data_properties: &[OperationData],
        environment_properties: &[Sha256],
        operation: common::signing_serialization_component,
    }],
    key: VariableOperations {
        public_key: &[
            Requires {
                can_be_skipped: true,
                data_properties: &[Keys],
                environment_properties: &[],
                operation: common::key_precomputed_public_key,
            },
            Requires {
                can_be_skipped: false,
                data_properties: &[Keys],
                environment_properties: &[Secp256k1],
                operation: common::key_derived_public_key,
            },
        ],
        signature: &[
            Requires {
                can_be_skipped: true,
                data_properties: &[Keys],
                environment_properties: &[],
                operation: signing::key_precomputed_signature,
            },
            Requires {
                can_be_skipped: false,
                data_properties: &[Keys, OperationData],
                environment_properties: &[Secp256k1, Sha256],
                operation: signing::key_signature,
            },
        ],
        schnorr_signature: &[
            Requires {
                can_be_skipped: true,
                data_properties: &[Keys],
                environment_properties: &[],
                operation: signing::key_precomputed_signature,
            },
            Requires {
                can_be_skipped: false,
                data_properties: &[Keys, OperationData],
                environment_properties: &[Secp256k1, Sha256],
                operation: signing::key_schnorr_signature,
            },
        ],
        data_signature: &[
            Requires {
                can_be_skipped: true,
                data_properties: &[Keys],
                environment_properties: &[],
                operation: signing::key_precomputed_signature,
            },
            Requires {
                can_be_skipped: false,
                data_properties: &[Keys],
                environment_properties: &[Secp256k1, Sha256, ScriptCompiler],
                operation: signing::key_data_signature,
            },
        ],
        schnorr_data_signature: &[
            Requires {
                can_be_skipped: true,
                data_properties: &[Keys],
                environment_properties: &[],
                operation: signing::key_precomputed_signature,
            },
            Requires {
                can_be_skipped: false,
                data_properties: &[Keys],
                environment_properties: &[Secp256k1, Sha256, ScriptCompiler],
                operation: signing::key_schnorr_data_signature,
            },
        ],
    },
    hd_key: VariableOperations {
        public_key: &[
            Requires {
                can_be_skipped: true,
                data_properties: &[HdKeys],
                environment_properties: &[],
                operation: common::hd_key_precomputed_public_key,
            },
            Requires {
                can_be_skipped: false,
                data_properties: &[HdKeys, HdKeysAddressIndex],
                environment_properties: &[Secp256k1, Sha256, Sha512, Ripemd160],
                operation: common::hd_key_derived_public_key,
            },
        ],
        signature: &[
            Requires {
                can_be_skipped: true,
                data_properties: &[HdKeys],
                environment_properties: &[],
                operation: signing::hd_key_precomputed_signature,
            },
            Requires {
                can_be_skipped: false,
                data_properties: &[HdKeys, HdKeysAddressIndex, OperationData],
                environment_properties: &[Secp256k1, Sha256, Sha512, Ripemd160],
                operation: signing::hd_key_signature,
            },
        ],
        schnorr_signature: &[
            Requires {
                can_be_skipped: true,
                data_properties: &[HdKeys],
                environment_properties: &[],
                operation: signing::hd_key_precomputed_signature,
            },
            Requires {
                can_be_skipped: false,
                data_properties: &[HdKeys, HdKeysAddressIndex, OperationData],
                environment_properties: &[Secp256k1, Sha256, Sha512, Ripemd160],
                operation: signing::hd_key_schnorr_signature,
            },
        ],
        data_signature: &[
            Requires {
                can_be_skipped: true,
                data_properties: &[HdKeys],
                environment_properties: &[],
                operation: signing::hd_key_precomputed_signature,
            },
            Requires {
                can_be_skipped: false,
                data_properties: &[HdKeys, HdKeysAddressIndex],
                environment_properties: &[Secp256k1, Sha256, Sha512, Ripemd160, ScriptCompiler],
                operation: signing::hd_key_data_signature,
            },
        ],
        schnorr_data_signature: &[
            Requires {
                can_be_skipped: true,
                data_properties: &[HdKeys],
                environment_properties: &[],
                operation: signing::hd_key_precomputed_signature,
            },
            Requires {
                can_be_skipped: false,
                data_properties: &[HdKeys, HdKeysAddressIndex],
                environment_properties: &[Secp256k1, Sha256, Sha512, Ripemd160, ScriptCompiler],
                operation: signing::hd_key_schnorr_data_signature,
            },
        ],
    },
};

/// Build an environment for `template` with the BCH operation set and
/// every native capability installed.
///
/// This is the cold path: it constructs the secp256k1 context. Build
/// the environment once and compile against it repeatedly.
pub fn environment_for_template(template: &AuthenticationTemplate) -> CompilationEnvironment {
    CompilationEnvironment::from_template(template, &BCH_OPERATIONS)
        .sha1(Arc::new(NativeSha1))
        .sha256(Arc::new(NativeSha256))
        .sha512(Arc::new(NativeSha512))
        .ripemd160(Arc::new(NativeRipemd160))
        .secp256k1(Arc::new(NativeSecp256k1::new()))
}
