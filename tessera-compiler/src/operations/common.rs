//! Common compiler operations: data variables, block height and time,
//! signing-serialization components, and public keys (direct and HD).

use std::fmt;

use tessera_crypto::hash::hash256;
use tessera_hd::{decode_hd_private_key, decode_hd_public_key, DerivationPath, HdCrypto};
use tessera_template::Variable;

use crate::data::{CompilationData, HdKeys};
use crate::encoding::{encode_script_number, encode_var_int};
use crate::environment::CompilationEnvironment;
use crate::operation::{
    missing_data_property, missing_environment_property, DataProperty, EnvironmentProperty,
    OperationResult,
};
use crate::resolver::Identifier;
use crate::serialization::{generate_signing_serialization, SigningSerializationAlgorithm};

// time-based locktime window of the virtual machine
const MINIMUM_BLOCK_TIME: u64 = 500_000_000;
const MAXIMUM_BLOCK_TIME: u64 = u32::MAX as u64;

pub(crate) fn unknown_component(identifier: &Identifier, component: &str) -> OperationResult {
    OperationResult::fatal(format!(
        "Unknown component in \"{identifier}\" - the fragment \"{component}\" is not recognized."
    ))
}

pub(crate) fn external_failure(identifier: &Identifier, error: &dyn fmt::Display) -> OperationResult {
    OperationResult::fatal(format!("Cannot resolve \"{identifier}\" - {error}."))
}

pub fn address_data(
    identifier: &Identifier,
    data: &CompilationData,
    _environment: &CompilationEnvironment,
) -> OperationResult {
    let Some(address_data) = data.address_data.as_ref() else {
        return missing_data_property(identifier, DataProperty::AddressData);
    };
    match address_data.get(identifier.variable()) {
        Some(bytes) => OperationResult::Success(bytes.clone()),
        None => OperationResult::fatal(format!(
            "Identifier \"{identifier}\" refers to an AddressData, but no AddressData value for \"{}\" was provided in the compilation data.",
            identifier.variable()
        )),
    }
}

pub fn wallet_data(
    identifier: &Identifier,
    data: &CompilationData,
    _environment: &CompilationEnvironment,
) -> OperationResult {
    let Some(wallet_data) = data.wallet_data.as_ref() else {
        return missing_data_property(identifier, DataProperty::WalletData);
    };
    match wallet_data.get(identifier.variable()) {
        Some(bytes) => OperationResult::Success(bytes.clone()),
        None => OperationResult::fatal(format!(
            "Identifier \"{identifier}\" refers to a WalletData, but no WalletData value for \"{}\" was provided in the compilation data.",
            identifier.variable()
        )),
    }
}

pub fn current_block_height(
    identifier: &Identifier,
    data: &CompilationData,
    _environment: &CompilationEnvironment,
) -> OperationResult {
    let Some(height) = data.current_block_height else {
        return missing_data_property(identifier, DataProperty::CurrentBlockHeight);
    };
    OperationResult::Success(encode_script_number(i64::from(height)))
}

pub fn current_block_time(
    identifier: &Identifier,
    data: &CompilationData,
    _environment: &CompilationEnvironment,
) -> OperationResult {
    let Some(time) = data.current_block_time else {
        return missing_data_property(identifier, DataProperty::CurrentBlockTime);
    };
    if !(MINIMUM_BLOCK_TIME..=MAXIMUM_BLOCK_TIME).contains(&time) {
        return OperationResult::fatal(format!(
            "Invalid block time: block times must be between {MINIMUM_BLOCK_TIME} and {MAXIMUM_BLOCK_TIME} (seconds since epoch); received: {time}."
        ));
    }
    OperationResult::Success((time as u32).to_le_bytes().to_vec())
}

/// Resolve `signing_serialization.<component>` identifiers, including the
/// `full_<algorithm>` family that exposes the raw preimage.
pub fn signing_serialization_component(
    identifier: &Identifier,
    data: &CompilationData,
    environment: &CompilationEnvironment,
) -> OperationResult {
    let Some(operation_data) = data.operation_data.as_ref() else {
        return missing_data_property(identifier, DataProperty::OperationData);
    };
    let Some(sha256) = environment.sha256.as_deref() else {
        return missing_environment_property(identifier, EnvironmentProperty::Sha256);
    };
    let Some(component) = identifier.operation() else {
        return OperationResult::fatal(
            "Invalid signing serialization operation. Signing serializations must be of the form: \"signing_serialization.[component]\".",
        );
    };
    if let Some(extra) = identifier.parameter() {
        return unknown_component(identifier, extra);
    }

    if let Some(algorithm) = component
        .strip_prefix("full_")
        .and_then(SigningSerializationAlgorithm::from_identifier)
    {
        return OperationResult::Success(generate_signing_serialization(
            sha256,
            algorithm,
            operation_data,
        ));
    }

    let bytes = match component {
        "version" => operation_data.version.to_le_bytes().to_vec(),
        "transaction_outpoints" => operation_data.transaction_outpoints.clone(),
        "transaction_outpoints_hash" => {
            hash256(sha256, &operation_data.transaction_outpoints).to_vec()
        }
        "transaction_sequence_numbers" => operation_data.transaction_sequence_numbers.clone(),
        "transaction_sequence_numbers_hash" => {
            hash256(sha256, &operation_data.transaction_sequence_numbers).to_vec()
        }
        "outpoint_transaction_hash" => operation_data.outpoint_transaction_hash.to_vec(),
        "outpoint_index" => operation_data.outpoint_index.to_le_bytes().to_vec(),
        "covered_bytecode_length" => {
            encode_var_int(operation_data.covered_bytecode.len() as u64)
        }
        "covered_bytecode" => operation_data.covered_bytecode.clone(),
        "output_value" => operation_data.output_value.to_le_bytes().to_vec(),
        "sequence_number" => operation_data.sequence_number.to_le_bytes().to_vec(),
        "corresponding_output" => operation_data
            .corresponding_output
            .clone()
            .unwrap_or_default(),
        "corresponding_output_hash" => operation_data
            .corresponding_output
            .as_deref()
            .map(|output| hash256(sha256, output).to_vec())
            .unwrap_or_default(),
        "transaction_outputs" => operation_data.transaction_outputs.clone(),
        "transaction_outputs_hash" => hash256(sha256, &operation_data.transaction_outputs).to_vec(),
        "locktime" => operation_data.locktime.to_le_bytes().to_vec(),
        unknown => {
            return OperationResult::fatal(format!(
                "Identifier \"{identifier}\" refers to an unknown signing serialization operation, \"{unknown}\"."
            ))
        }
    };
    OperationResult::Success(bytes)
}

pub fn key_precomputed_public_key(
    identifier: &Identifier,
    data: &CompilationData,
    _environment: &CompilationEnvironment,
) -> OperationResult {
    if let Some(extra) = identifier.parameter() {
        return unknown_component(identifier, extra);
    }
    let Some(keys) = data.keys.as_ref() else {
        return OperationResult::Skip;
    };
    match keys.public_keys.get(identifier.variable()) {
        Some(bytes) => OperationResult::Success(bytes.clone()),
        None => OperationResult::Skip,
    }
}

pub fn key_derived_public_key(
    identifier: &Identifier,
    data: &CompilationData,
    environment: &CompilationEnvironment,
) -> OperationResult {
    if let Some(extra) = identifier.parameter() {
        return unknown_component(identifier, extra);
    }
    let Some(keys) = data.keys.as_ref() else {
        return missing_data_property(identifier, DataProperty::Keys);
    };
    let Some(secp256k1) = environment.secp256k1.as_deref() else {
        return missing_environment_property(identifier, EnvironmentProperty::Secp256k1);
    };
    let Some(private_key) = keys.private_keys.get(identifier.variable()) else {
        return OperationResult::recoverable(format!(
            "Identifier \"{identifier}\" refers to a public key, but no public or private keys for \"{}\" were provided in the compilation data.",
            identifier.variable()
        ));
    };
    match secp256k1.derive_public_key_compressed(private_key) {
        Ok(public_key) => OperationResult::Success(public_key.to_vec()),
        Err(error) => external_failure(identifier, &error),
    }
}

/// The capability bundle HD derivation reads from the environment.
pub(crate) fn hd_crypto<'a>(
    identifier: &Identifier,
    environment: &'a CompilationEnvironment,
) -> Result<HdCrypto<'a>, OperationResult> {
    let Some(sha256) = environment.sha256.as_deref() else {
        return Err(missing_environment_property(identifier, EnvironmentProperty::Sha256));
    };
    let Some(sha512) = environment.sha512.as_deref() else {
        return Err(missing_environment_property(identifier, EnvironmentProperty::Sha512));
    };
    let Some(ripemd160) = environment.ripemd160.as_deref() else {
        return Err(missing_environment_property(identifier, EnvironmentProperty::Ripemd160));
    };
    let Some(secp256k1) = environment.secp256k1.as_deref() else {
        return Err(missing_environment_property(identifier, EnvironmentProperty::Secp256k1));
    };
    Ok(HdCrypto {
        sha256,
        sha512,
        ripemd160,
        secp256k1,
    })
}

pub(crate) struct HdVariable<'a> {
    pub entity_id: &'a str,
    pub variable: &'a Variable,
    /// The path instance index: `address_index + address_offset`.
    pub instance_index: u32,
}

pub(crate) fn hd_variable<'a>(
    identifier: &Identifier,
    data: &'a CompilationData,
    environment: &'a CompilationEnvironment,
) -> Result<(&'a HdKeys, HdVariable<'a>), OperationResult> {
    let Some(hd_keys) = data.hd_keys.as_ref() else {
        return Err(missing_data_property(identifier, DataProperty::HdKeys));
    };
    let Some(address_index) = hd_keys.address_index else {
        return Err(missing_data_property(identifier, DataProperty::HdKeysAddressIndex));
    };
    let Some(entity_id) = environment.entity_ownership.get(identifier.variable()) else {
        return Err(OperationResult::fatal(format!(
            "Identifier \"{identifier}\" refers to an HdKey, but the entity owning \"{}\" is not known to the compilation environment.",
            identifier.variable()
        )));
    };
    let Some(variable) = environment.variables.get(identifier.variable()) else {
        return Err(OperationResult::fatal(format!(
            "Identifier \"{identifier}\" refers to an HdKey, but no variable \"{}\" exists in the compilation environment.",
            identifier.variable()
        )));
    };
    let Some(instance_index) = address_index.checked_add(variable.address_offset()) else {
        return Err(OperationResult::fatal(format!(
            "Cannot resolve \"{identifier}\" - adding the address offset to the address index overflows."
        )));
    };
    Ok((
        hd_keys,
        HdVariable {
            entity_id,
            variable,
            instance_index,
        },
    ))
}

/// Derive the instance private key of an HD variable from its entity's
/// serialized HD private key.
pub(crate) fn hd_instance_private_key(
    identifier: &Identifier,
    data: &CompilationData,
    environment: &CompilationEnvironment,
    crypto: &HdCrypto,
) -> Result<[u8; 32], OperationResult> {
    let (hd_keys, hd) = hd_variable(identifier, data, environment)?;
    let Some(encoded) = hd_keys.hd_private_keys.get(hd.entity_id) else {
        return Err(OperationResult::recoverable(format!(
            "Identifier \"{identifier}\" refers to an HdKey, but no HD private key for entity \"{}\" was provided in the compilation data.",
            hd.entity_id
        )));
    };
    let (node, _network) = decode_hd_private_key(crypto.sha256, encoded)
        .map_err(|error| external_failure(identifier, &error))?;
    let Some(path) = hd.variable.private_derivation_path() else {
        return Err(OperationResult::fatal(format!(
            "Identifier \"{identifier}\" refers to an HdKey, but the variable \"{}\" is not an HdKey.",
            identifier.variable()
        )));
    };
    let path: DerivationPath = path
        .parse()
        .map_err(|error| external_failure(identifier, &error))?;
    let node = node
        .derive_path(crypto, &path, hd.instance_index)
        .map_err(|error| external_failure(identifier, &error))?;
    Ok(*node.private_key())
}

pub fn hd_key_precomputed_public_key(
    identifier: &Identifier,
    data: &CompilationData,
    _environment: &CompilationEnvironment,
) -> OperationResult {
    if let Some(extra) = identifier.parameter() {
        return unknown_component(identifier, extra);
    }
    let Some(hd_keys) = data.hd_keys.as_ref() else {
        return OperationResult::Skip;
    };
    match hd_keys.derived_public_keys.get(identifier.variable()) {
        Some(bytes) => OperationResult::Success(bytes.clone()),
        None => OperationResult::Skip,
    }
}

pub fn hd_key_derived_public_key(
    identifier: &Identifier,
    data: &CompilationData,
    environment: &CompilationEnvironment,
) -> OperationResult {
    if let Some(extra) = identifier.parameter() {
        return unknown_component(identifier, extra);
    }
    let crypto = match hd_crypto(identifier, environment) {
        Ok(crypto) => crypto,
        Err(result) => return result,
    };
    match hd_instance_private_key(identifier, data, environment, &crypto) {
        Ok(private_key) => match crypto.secp256k1.derive_public_key_compressed(&private_key) {
            Ok(public_key) => OperationResult::Success(public_key.to_vec()),
            Err(error) => external_failure(identifier, &error),
        },
        // no private key for the entity: fall back to public derivation
        Err(OperationResult::Error(error)) if error.recoverable => {
            hd_public_key_from_public_node(identifier, data, environment, &crypto)
        }
        Err(result) => result,
    }
}

fn hd_public_key_from_public_node(
    identifier: &Identifier,
    data: &CompilationData,
    environment: &CompilationEnvironment,
    crypto: &HdCrypto,
) -> OperationResult {
    let (hd_keys, hd) = match hd_variable(identifier, data, environment) {
        Ok(parts) => parts,
        Err(result) => return result,
    };
    let Some(encoded) = hd_keys.hd_public_keys.get(hd.entity_id) else {
        return OperationResult::recoverable(format!(
            "Identifier \"{identifier}\" refers to an HdKey, but no HD private or public keys for entity \"{}\" were provided in the compilation data.",
            hd.entity_id
        ));
    };
    let (node, _network) = match decode_hd_public_key(crypto.sha256, encoded) {
        Ok(decoded) => decoded,
        Err(error) => return external_failure(identifier, &error),
    };
    let Some(path_string) = hd.variable.public_derivation_path() else {
        return OperationResult::fatal(format!(
            "Identifier \"{identifier}\" refers to an HdKey, but the variable \"{}\" is not an HdKey.",
            identifier.variable()
        ));
    };
    let path: DerivationPath = match path_string.parse() {
        Ok(path) => path,
        Err(error) => return external_failure(identifier, &error),
    };
    match node.derive_path(crypto, &path, hd.instance_index) {
        Ok(node) => OperationResult::Success(node.public_key().to_vec()),
        Err(error) => external_failure(identifier, &error),
    }
}
