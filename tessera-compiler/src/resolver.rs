//! Dotted-identifier parsing and resolution
//!
//! Identifiers are dot-separated: the first segment names a variable,
//! script or built-in, the second an operation, the third an operation
//! parameter (a SIGHASH algorithm or a target script id). The resolver
//! splits once into a typed view, selects the operation chain for the
//! identifier's category and runs it.

use std::fmt;

use thiserror::Error;
use tracing::trace;

use tessera_template::Variable;

use crate::compiler::CompilationResult;
use crate::data::CompilationData;
use crate::environment::CompilationEnvironment;
use crate::operation::{attempt_chain, OperationResult};
use crate::operations::OperationChain;

const CURRENT_BLOCK_HEIGHT: &str = "current_block_height";
const CURRENT_BLOCK_TIME: &str = "current_block_time";
const SIGNING_SERIALIZATION: &str = "signing_serialization";

/// A parsed view of one dotted identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identifier<'a> {
    full: &'a str,
    variable: &'a str,
    operation: Option<&'a str>,
    parameter: Option<&'a str>,
    remainder: Option<&'a str>,
}

impl<'a> Identifier<'a> {
    pub fn parse(full: &'a str) -> Self {
        let mut segments = full.splitn(4, '.');
        let variable = segments.next().unwrap_or("");
        Self {
            full,
            variable,
            operation: segments.next(),
            parameter: segments.next(),
            remainder: segments.next(),
        }
    }

    /// The complete identifier as written in the script.
    pub fn full(&self) -> &'a str {
        self.full
    }

    /// Segment 0: the variable, script or built-in name.
    pub fn variable(&self) -> &'a str {
        self.variable
    }

    /// Segment 1: the operation name, when present.
    pub fn operation(&self) -> Option<&'a str> {
        self.operation
    }

    /// Segment 2: the operation parameter, when present.
    pub fn parameter(&self) -> Option<&'a str> {
        self.parameter
    }

    /// Everything past segment 2. Always unexpected.
    pub fn remainder(&self) -> Option<&'a str> {
        self.remainder
    }
}

impl fmt::Display for Identifier<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.full)
    }
}

#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("Unknown identifier \"{0}\".")]
    UnknownIdentifier(String),

    #[error("Identifier \"{identifier}\" refers to a {variable_type}, but does not specify an operation, e.g. \"{identifier}.public_key\".")]
    MissingVariableOperation {
        identifier: String,
        variable_type: &'static str,
    },

    #[error("Identifier \"{identifier}\" refers to a {variable_type}, but the operation \"{operation}\" is not available to {variable_type} variables.")]
    InvalidVariableOperation {
        identifier: String,
        variable_type: &'static str,
        operation: String,
    },

    /// A compiler operation reported an error; the message quotes the
    /// identifier and names the missing or unknown piece.
    #[error("{message}")]
    Operation { identifier: String, message: String },

    #[error("Compiling \"{script}\" failed: {message}")]
    Script { script: String, message: String },
}

fn variable_type_name(variable: &Variable) -> &'static str {
    match variable {
        Variable::Key { .. } => "Key",
        Variable::HdKey { .. } => "HdKey",
        Variable::AddressData { .. } => "AddressData",
        Variable::WalletData { .. } => "WalletData",
    }
}

/// Resolve one identifier to bytecode.
///
/// Built-in identifiers take precedence over template-defined names,
/// variables over scripts. Script identifiers are resolved by compiling
/// the referenced script through the environment's script compiler.
pub fn resolve_identifier(
    identifier: &str,
    data: &CompilationData,
    environment: &CompilationEnvironment,
) -> Result<Vec<u8>, ResolutionError> {
    let parsed = Identifier::parse(identifier);
    trace!(identifier, "resolving identifier");

    let builtin: Option<OperationChain> = match parsed.variable() {
        CURRENT_BLOCK_HEIGHT => Some(environment.operations.current_block_height),
        CURRENT_BLOCK_TIME => Some(environment.operations.current_block_time),
        SIGNING_SERIALIZATION => Some(environment.operations.signing_serialization),
        _ => None,
    };
    if let Some(chain) = builtin {
        return finish(attempt_chain(chain, &parsed, data, environment), &parsed);
    }

    if let Some(variable) = environment.variables.get(parsed.variable()) {
        let variable_type = variable_type_name(variable);
        let chain = match variable {
            Variable::AddressData { .. } | Variable::WalletData { .. } => {
                if let Some(operation) = parsed.operation() {
                    return Err(ResolutionError::InvalidVariableOperation {
                        identifier: identifier.to_string(),
                        variable_type,
                        operation: operation.to_string(),
                    });
                }
                match variable {
                    Variable::AddressData { .. } => environment.operations.address_data,
                    _ => environment.operations.wallet_data,
                }
            }
            Variable::Key { .. } | Variable::HdKey { .. } => {
                let Some(operation) = parsed.operation() else {
                    return Err(ResolutionError::MissingVariableOperation {
                        identifier: identifier.to_string(),
                        variable_type,
                    });
                };
                let table = match variable {
                    Variable::Key { .. } => &environment.operations.key,
                    _ => &environment.operations.hd_key,
                };
                let Some(chain) = table.get(operation) else {
                    return Err(ResolutionError::InvalidVariableOperation {
                        identifier: identifier.to_string(),
                        variable_type,
                        operation: operation.to_string(),
                    });
                };
                chain
            }
        };
        return finish(attempt_chain(chain, &parsed, data, environment), &parsed);
    }

    if parsed.operation().is_none() && environment.scripts.contains_key(parsed.variable()) {
        return compile_inline_script(parsed.variable(), data, environment);
    }

    Err(ResolutionError::UnknownIdentifier(identifier.to_string()))
}

fn finish(result: OperationResult, identifier: &Identifier) -> Result<Vec<u8>, ResolutionError> {
    match result {
        OperationResult::Success(bytecode) => Ok(bytecode),
        OperationResult::Error(error) => Err(ResolutionError::Operation {
            identifier: identifier.full().to_string(),
            message: error.message,
        }),
        OperationResult::Skip => Err(ResolutionError::Operation {
            identifier: identifier.full().to_string(),
            message: format!(
                "Cannot resolve \"{identifier}\" - no operation was able to produce a result."
            ),
        }),
    }
}

fn compile_inline_script(
    script: &str,
    data: &CompilationData,
    environment: &CompilationEnvironment,
) -> Result<Vec<u8>, ResolutionError> {
    let Some(frontend) = environment.script_compiler.as_ref() else {
        return Err(ResolutionError::Script {
            script: script.to_string(),
            message: "the \"scriptCompiler\" property was not provided in the compilation environment"
                .to_string(),
        });
    };
    match frontend.compile_script(script, data, environment, false).result {
        CompilationResult::Success { bytecode } => Ok(bytecode),
        CompilationResult::Failure { errors, .. } => Err(ResolutionError::Script {
            script: script.to_string(),
            message: errors
                .into_iter()
                .map(|error| error.error)
                .collect::<Vec<_>>()
                .join("; "),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bch::BCH_OPERATIONS;
    use std::collections::HashMap;

    fn key_variable() -> Variable {
        Variable::Key {
            name: None,
            description: None,
        }
    }

    fn environment_with(variables: Vec<(&str, Variable)>) -> CompilationEnvironment {
        let mut environment = CompilationEnvironment::new(&BCH_OPERATIONS);
        for (id, variable) in variables {
            environment.variables.insert(id.to_string(), variable);
        }
        environment
    }

    #[test]
    fn parses_segment_positions() {
        let identifier = Identifier::parse("owner.signature.all_outputs.extra.more");
        assert_eq!(identifier.variable(), "owner");
        assert_eq!(identifier.operation(), Some("signature"));
        assert_eq!(identifier.parameter(), Some("all_outputs"));
        assert_eq!(identifier.remainder(), Some("extra.more"));
    }

    #[test]
    fn unknown_identifiers_are_reported() {
        let environment = environment_with(vec![]);
        let data = CompilationData::new();
        let error = resolve_identifier("nobody", &data, &environment).unwrap_err();
        assert_eq!(error.to_string(), "Unknown identifier \"nobody\".");
    }

    #[test]
    fn key_without_operation_is_rejected() {
        let environment = environment_with(vec![("owner", key_variable())]);
        let data = CompilationData::new();
        let error = resolve_identifier("owner", &data, &environment).unwrap_err();
        assert!(error
            .to_string()
            .contains("does not specify an operation"));
    }

    #[test]
    fn key_with_unknown_operation_is_rejected() {
        let environment = environment_with(vec![("owner", key_variable())]);
        let data = CompilationData::new();
        let error = resolve_identifier("owner.sign", &data, &environment).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Identifier \"owner.sign\" refers to a Key, but the operation \"sign\" is not available to Key variables."
        );
    }

    #[test]
    fn address_data_resolves_to_the_provided_bytes() {
        let environment = environment_with(vec![(
            "nonce",
            Variable::AddressData {
                name: None,
                description: None,
            },
        )]);
        let data = CompilationData::new()
            .address_data(HashMap::from([("nonce".to_string(), vec![0x01, 0x02])]));
        assert_eq!(
            resolve_identifier("nonce", &data, &environment).unwrap(),
            vec![0x01, 0x02]
        );
    }

    #[test]
    fn address_data_with_an_operation_is_rejected() {
        let environment = environment_with(vec![(
            "nonce",
            Variable::AddressData {
                name: None,
                description: None,
            },
        )]);
        let data = CompilationData::new();
        let error = resolve_identifier("nonce.public_key", &data, &environment).unwrap_err();
        assert!(matches!(
            error,
            ResolutionError::InvalidVariableOperation { .. }
        ));
    }

    #[test]
    fn missing_address_data_value_names_the_variable() {
        let environment = environment_with(vec![(
            "nonce",
            Variable::AddressData {
                name: None,
                description: None,
            },
        )]);
        let data = CompilationData::new().address_data(HashMap::new());
        let error = resolve_identifier("nonce", &data, &environment).unwrap_err();
        assert!(error.to_string().contains("no AddressData value for \"nonce\""));
    }

    #[test]
    fn wallet_data_resolves_to_the_provided_bytes() {
        let environment = environment_with(vec![(
            "seed",
            Variable::WalletData {
                name: None,
                description: None,
            },
        )]);
        let data = CompilationData::new()
            .wallet_data(HashMap::from([("seed".to_string(), vec![0xaa])]));
        assert_eq!(
            resolve_identifier("seed", &data, &environment).unwrap(),
            vec![0xaa]
        );
    }

    #[test]
    fn current_block_height_encodes_as_a_script_number() {
        let environment = environment_with(vec![]);
        let data = CompilationData::new().current_block_height(600_000);
        assert_eq!(
            resolve_identifier("current_block_height", &data, &environment).unwrap(),
            vec![0xc0, 0x27, 0x09]
        );
    }

    #[test]
    fn current_block_time_is_range_checked() {
        let environment = environment_with(vec![]);
        let data = CompilationData::new().current_block_time(1_600_000_000);
        assert_eq!(
            resolve_identifier("current_block_time", &data, &environment).unwrap(),
            1_600_000_000u32.to_le_bytes().to_vec()
        );

        let too_small = CompilationData::new().current_block_time(100);
        let error = resolve_identifier("current_block_time", &too_small, &environment).unwrap_err();
        assert!(error.to_string().contains("block time"));
    }

    #[test]
    fn script_identifiers_require_a_frontend() {
        let mut environment = environment_with(vec![]);
        environment
            .scripts
            .insert("lock".to_string(), "OP_1".to_string());
        let data = CompilationData::new();
        let error = resolve_identifier("lock", &data, &environment).unwrap_err();
        assert!(error.to_string().contains("scriptCompiler"));
    }
}
