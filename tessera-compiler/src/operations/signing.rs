//! BCH signing operations: transaction signatures (ECDSA and Schnorr),
//! data signatures, and their HD-key counterparts.
//!
//! Transaction signatures commit to the double-SHA-256 of the signing
//! serialization selected by the identifier's algorithm segment and
//! carry the SIGHASH byte as a one-byte suffix. Data signatures commit
//! to the single SHA-256 of the target script's compiled bytecode and
//! carry no suffix.

use tessera_crypto::capability::{Secp256k1, Sha256};
use tessera_crypto::hash::{hash256, Hash};

use crate::compiler::CompilationResult;
use crate::data::CompilationData;
use crate::environment::CompilationEnvironment;
use crate::operation::{
    missing_data_property, missing_environment_property, DataProperty, EnvironmentProperty,
    OperationResult,
};
use crate::operations::common::{
    external_failure, hd_crypto, hd_instance_private_key, unknown_component,
};
use crate::resolver::Identifier;
use crate::serialization::{
    generate_signing_serialization, OperationData, SigningSerializationAlgorithm,
};

#[derive(Debug, Clone, Copy)]
enum SignatureVariant {
    Ecdsa,
    Schnorr,
}

fn signature_algorithm(
    identifier: &Identifier,
) -> Result<SigningSerializationAlgorithm, OperationResult> {
    if let Some(extra) = identifier.remainder() {
        return Err(unknown_component(identifier, extra));
    }
    let operation = identifier.operation().unwrap_or("signature");
    let Some(parameter) = identifier.parameter() else {
        return Err(OperationResult::fatal(format!(
            "Signatures must be of the form: \"[variable_id].{operation}.[signing_serialization_type]\"."
        )));
    };
    SigningSerializationAlgorithm::from_identifier(parameter).ok_or_else(|| {
        OperationResult::fatal(format!(
            "Unknown signing serialization algorithm, \"{parameter}\"."
        ))
    })
}

fn sign_digest(
    identifier: &Identifier,
    secp256k1: &dyn Secp256k1,
    variant: SignatureVariant,
    private_key: &[u8; 32],
    digest: &[u8; 32],
) -> Result<Vec<u8>, OperationResult> {
    match variant {
        SignatureVariant::Ecdsa => secp256k1
            .sign_message_hash_der(private_key, digest)
            .map_err(|error| external_failure(identifier, &error)),
        SignatureVariant::Schnorr => secp256k1
            .sign_message_hash_schnorr(private_key, digest)
            .map(|signature| signature.to_vec())
            .map_err(|error| external_failure(identifier, &error)),
    }
}

fn transaction_signature(
    identifier: &Identifier,
    sha256: &dyn Sha256,
    secp256k1: &dyn Secp256k1,
    private_key: &[u8; 32],
    algorithm: SigningSerializationAlgorithm,
    operation_data: &OperationData,
    variant: SignatureVariant,
) -> OperationResult {
    let serialization = generate_signing_serialization(sha256, algorithm, operation_data);
    let digest = hash256(sha256, &serialization);
    match sign_digest(identifier, secp256k1, variant, private_key, &digest) {
        Ok(mut signature) => {
            signature.push(algorithm.sighash_byte());
            OperationResult::Success(signature)
        }
        Err(result) => result,
    }
}

/// Return a pre-computed signature stored under the full identifier.
pub fn key_precomputed_signature(
    identifier: &Identifier,
    data: &CompilationData,
    _environment: &CompilationEnvironment,
) -> OperationResult {
    let Some(keys) = data.keys.as_ref() else {
        return OperationResult::Skip;
    };
    match keys.signatures.get(identifier.full()) {
        Some(bytes) => OperationResult::Success(bytes.clone()),
        None => OperationResult::Skip,
    }
}

pub fn hd_key_precomputed_signature(
    identifier: &Identifier,
    data: &CompilationData,
    _environment: &CompilationEnvironment,
) -> OperationResult {
    let Some(hd_keys) = data.hd_keys.as_ref() else {
        return OperationResult::Skip;
    };
    match hd_keys.signatures.get(identifier.full()) {
        Some(bytes) => OperationResult::Success(bytes.clone()),
        None => OperationResult::Skip,
    }
}

fn key_transaction_signature(
    identifier: &Identifier,
    data: &CompilationData,
    environment: &CompilationEnvironment,
    variant: SignatureVariant,
) -> OperationResult {
    let algorithm = match signature_algorithm(identifier) {
        Ok(algorithm) => algorithm,
        Err(result) => return result,
    };
    let Some(keys) = data.keys.as_ref() else {
        return missing_data_property(identifier, DataProperty::Keys);
    };
    let Some(operation_data) = data.operation_data.as_ref() else {
        return missing_data_property(identifier, DataProperty::OperationData);
    };
    let Some(secp256k1) = environment.secp256k1.as_deref() else {
        return missing_environment_property(identifier, EnvironmentProperty::Secp256k1);
    };
    let Some(sha256) = environment.sha256.as_deref() else {
        return missing_environment_property(identifier, EnvironmentProperty::Sha256);
    };
    let Some(private_key) = keys.private_keys.get(identifier.variable()) else {
        return OperationResult::recoverable(format!(
            "Identifier \"{identifier}\" refers to a signature, but no private key for \"{}\" was provided in the compilation data.",
            identifier.variable()
        ));
    };
    transaction_signature(
        identifier,
        sha256,
        secp256k1,
        private_key,
        algorithm,
        operation_data,
        variant,
    )
}

pub fn key_signature(
    identifier: &Identifier,
    data: &CompilationData,
    environment: &CompilationEnvironment,
) -> OperationResult {
    key_transaction_signature(identifier, data, environment, SignatureVariant::Ecdsa)
}

pub fn key_schnorr_signature(
    identifier: &Identifier,
    data: &CompilationData,
    environment: &CompilationEnvironment,
) -> OperationResult {
    key_transaction_signature(identifier, data, environment, SignatureVariant::Schnorr)
}

fn hd_key_transaction_signature(
    identifier: &Identifier,
    data: &CompilationData,
    environment: &CompilationEnvironment,
    variant: SignatureVariant,
) -> OperationResult {
    let algorithm = match signature_algorithm(identifier) {
        Ok(algorithm) => algorithm,
        Err(result) => return result,
    };
    let Some(operation_data) = data.operation_data.as_ref() else {
        return missing_data_property(identifier, DataProperty::OperationData);
    };
    let crypto = match hd_crypto(identifier, environment) {
        Ok(crypto) => crypto,
        Err(result) => return result,
    };
    let private_key = match hd_instance_private_key(identifier, data, environment, &crypto) {
        Ok(private_key) => private_key,
        Err(result) => return result,
    };
    transaction_signature(
        identifier,
        crypto.sha256,
        crypto.secp256k1,
        &private_key,
        algorithm,
        operation_data,
        variant,
    )
}

pub fn hd_key_signature(
    identifier: &Identifier,
    data: &CompilationData,
    environment: &CompilationEnvironment,
) -> OperationResult {
    hd_key_transaction_signature(identifier, data, environment, SignatureVariant::Ecdsa)
}

pub fn hd_key_schnorr_signature(
    identifier: &Identifier,
    data: &CompilationData,
    environment: &CompilationEnvironment,
) -> OperationResult {
    hd_key_transaction_signature(identifier, data, environment, SignatureVariant::Schnorr)
}

/// Compile the target script of a data signature and produce the digest
/// to sign: a single SHA-256 of the compiled bytecode.
fn data_signature_digest(
    identifier: &Identifier,
    data: &CompilationData,
    environment: &CompilationEnvironment,
    sha256: &dyn Sha256,
) -> Result<Hash<32>, OperationResult> {
    if let Some(extra) = identifier.remainder() {
        return Err(unknown_component(identifier, extra));
    }
    let operation = identifier.operation().unwrap_or("data_signature");
    let Some(target) = identifier.parameter() else {
        return Err(OperationResult::fatal(format!(
            "Data signatures must be of the form: \"[variable_id].{operation}.[target_script_id]\"."
        )));
    };
    if !environment.scripts.contains_key(target) {
        return Err(OperationResult::fatal(format!(
            "Data signature tried to sign an unknown target script, \"{target}\"."
        )));
    }
    let Some(frontend) = environment.script_compiler.as_ref() else {
        return Err(missing_environment_property(
            identifier,
            EnvironmentProperty::ScriptCompiler,
        ));
    };
    match frontend
        .compile_script(target, data, environment, false)
        .result
    {
        CompilationResult::Success { bytecode } => Ok(sha256.hash(&bytecode)),
        CompilationResult::Failure { errors, .. } => Err(OperationResult::fatal(format!(
            "Data signature could not compile the target script \"{target}\": {}.",
            errors
                .into_iter()
                .map(|error| error.error)
                .collect::<Vec<_>>()
                .join("; ")
        ))),
    }
}

fn key_data_signature_variant(
    identifier: &Identifier,
    data: &CompilationData,
    environment: &CompilationEnvironment,
    variant: SignatureVariant,
) -> OperationResult {
    let Some(keys) = data.keys.as_ref() else {
        return missing_data_property(identifier, DataProperty::Keys);
    };
    let Some(secp256k1) = environment.secp256k1.as_deref() else {
        return missing_environment_property(identifier, EnvironmentProperty::Secp256k1);
    };
    let Some(sha256) = environment.sha256.as_deref() else {
        return missing_environment_property(identifier, EnvironmentProperty::Sha256);
    };
    let digest = match data_signature_digest(identifier, data, environment, sha256) {
        Ok(digest) => digest,
        Err(result) => return result,
    };
    let Some(private_key) = keys.private_keys.get(identifier.variable()) else {
        return OperationResult::recoverable(format!(
            "Identifier \"{identifier}\" refers to a data signature, but no private key for \"{}\" was provided in the compilation data.",
            identifier.variable()
        ));
    };
    match sign_digest(identifier, secp256k1, variant, private_key, &digest) {
        Ok(signature) => OperationResult::Success(signature),
        Err(result) => result,
    }
}

pub fn key_data_signature(
    identifier: &Identifier,
    data: &CompilationData,
    environment: &CompilationEnvironment,
) -> OperationResult {
    key_data_signature_variant(identifier, data, environment, SignatureVariant::Ecdsa)
}

pub fn key_schnorr_data_signature(
    identifier: &Identifier,
    data: &CompilationData,
    environment: &CompilationEnvironment,
) -> OperationResult {
    key_data_signature_variant(identifier, data, environment, SignatureVariant::Schnorr)
}

fn hd_key_data_signature_variant(
    identifier: &Identifier,
    data: &CompilationData,
    environment: &CompilationEnvironment,
    variant: SignatureVariant,
) -> OperationResult {
    let crypto = match hd_crypto(identifier, environment) {
        Ok(crypto) => crypto,
        Err(result) => return result,
    };
    let digest = match data_signature_digest(identifier, data, environment, crypto.sha256) {
        Ok(digest) => digest,
        Err(result) => return result,
    };
    let private_key = match hd_instance_private_key(identifier, data, environment, &crypto) {
        Ok(private_key) => private_key,
        Err(result) => return result,
    };
    match sign_digest(identifier, crypto.secp256k1, variant, &private_key, &digest) {
        Ok(signature) => OperationResult::Success(signature),
        Err(result) => result,
    }
}

pub fn hd_key_data_signature(
    identifier: &Identifier,
    data: &CompilationData,
    environment: &CompilationEnvironment,
) -> OperationResult {
    hd_key_data_signature_variant(identifier, data, environment, SignatureVariant::Ecdsa)
}

pub fn hd_key_schnorr_data_signature(
    identifier: &Identifier,
    data: &CompilationData,
    environment: &CompilationEnvironment,
) -> OperationResult {
    hd_key_data_signature_variant(identifier, data, environment, SignatureVariant::Schnorr)
}
