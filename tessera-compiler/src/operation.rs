//! The compiler-operation protocol
//!
//! A compiler operation turns one identifier into bytecode, given the
//! per-invocation data and the environment. Two combinators build every
//! concrete operation: [`Requires`], which gates an operation on named
//! data/environment properties, and [`attempt_chain`], which runs a list
//! of operations until one produces a decisive result.
//!
//! Results are values rather than `Err` returns: a chain needs to see a
//! failed step's recoverability inline to decide whether the next step
//! may run.

use std::fmt;

use crate::data::CompilationData;
use crate::environment::CompilationEnvironment;
use crate::resolver::Identifier;

/// Outcome of one compiler operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    /// The operation resolved the identifier to these bytes.
    Success(Vec<u8>),
    /// A skippable operation was missing a prerequisite; the next
    /// operation in the chain may try.
    Skip,
    /// The operation failed; `recoverable` decides whether a chain
    /// continues past it.
    Error(OperationError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationError {
    pub message: String,
    pub recoverable: bool,
}

impl OperationResult {
    /// A non-recoverable error: aborts any containing chain.
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::Error(OperationError {
            message: message.into(),
            recoverable: false,
        })
    }

    /// A recoverable error: a later chain step may still succeed.
    pub fn recoverable(message: impl Into<String>) -> Self {
        Self::Error(OperationError {
            message: message.into(),
            recoverable: true,
        })
    }
}

/// Properties of [`CompilationData`] an operation can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataProperty {
    AddressData,
    CurrentBlockHeight,
    CurrentBlockTime,
    HdKeys,
    HdKeysAddressIndex,
    Keys,
    OperationData,
    WalletData,
}

impl DataProperty {
    pub fn is_satisfied_by(self, data: &CompilationData) -> bool {
        match self {
            Self::AddressData => data.address_data.is_some(),
            Self::CurrentBlockHeight => data.current_block_height.is_some(),
            Self::CurrentBlockTime => data.current_block_time.is_some(),
            Self::HdKeys => data.hd_keys.is_some(),
            Self::HdKeysAddressIndex => data
                .hd_keys
                .as_ref()
                .is_some_and(|hd_keys| hd_keys.address_index.is_some()),
            Self::Keys => data.keys.is_some(),
            Self::OperationData => data.operation_data.is_some(),
            Self::WalletData => data.wallet_data.is_some(),
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::AddressData => "addressData",
            Self::CurrentBlockHeight => "currentBlockHeight",
            Self::CurrentBlockTime => "currentBlockTime",
            Self::HdKeys => "hdKeys",
            Self::HdKeysAddressIndex => "hdKeys.addressIndex",
            Self::Keys => "keys",
            Self::OperationData => "operationData",
            Self::WalletData => "walletData",
        }
    }
}

impl fmt::Display for DataProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capabilities of [`CompilationEnvironment`] an operation can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentProperty {
    Sha1,
    Sha256,
    Sha512,
    Ripemd160,
    Secp256k1,
    Vm,
    CreateState,
    ScriptCompiler,
}

impl EnvironmentProperty {
    pub fn is_satisfied_by(self, environment: &CompilationEnvironment) -> bool {
        match self {
            Self::Sha1 => environment.sha1.is_some(),
            Self::Sha256 => environment.sha256.is_some(),
            Self::Sha512 => environment.sha512.is_some(),
            Self::Ripemd160 => environment.ripemd160.is_some(),
            Self::Secp256k1 => environment.secp256k1.is_some(),
            Self::Vm => environment.vm.is_some(),
            Self::CreateState => environment.create_state.is_some(),
            Self::ScriptCompiler => environment.script_compiler.is_some(),
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
            Self::Ripemd160 => "ripemd160",
            Self::Secp256k1 => "secp256k1",
            Self::Vm => "vm",
            Self::CreateState => "createState",
            Self::ScriptCompiler => "scriptCompiler",
        }
    }
}

impl fmt::Display for EnvironmentProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(crate) fn missing_data_property(identifier: &Identifier, property: DataProperty) -> OperationResult {
    OperationResult::fatal(format!(
        "Cannot resolve \"{identifier}\" - the \"{property}\" property was not provided in the compilation data."
    ))
}

pub(crate) fn missing_environment_property(
    identifier: &Identifier,
    property: EnvironmentProperty,
) -> OperationResult {
    OperationResult::fatal(format!(
        "Cannot resolve \"{identifier}\" - the \"{property}\" property was not provided in the compilation environment."
    ))
}

/// The function type of a concrete compiler operation.
pub type OperationFn = fn(&Identifier, &CompilationData, &CompilationEnvironment) -> OperationResult;

/// An operation gated on declared prerequisites.
///
/// Before the inner operation runs, every listed property is checked on
/// the provided data and environment. A missing property produces
/// [`OperationResult::Skip`] when `can_be_skipped` is set, and a fatal
/// error naming the property otherwise.
pub struct Requires {
    pub can_be_skipped: bool,
    pub data_properties: &'static [DataProperty],
    pub environment_properties: &'static [EnvironmentProperty],
    pub operation: OperationFn,
}

impl Requires {
    pub fn attempt(
        &self,
        identifier: &Identifier,
        data: &CompilationData,
        environment: &CompilationEnvironment,
    ) -> OperationResult {
        for property in self.data_properties {
            if !property.is_satisfied_by(data) {
                return if self.can_be_skipped {
                    OperationResult::Skip
                } else {
                    missing_data_property(identifier, *property)
                };
            }
        }
        for property in self.environment_properties {
            if !property.is_satisfied_by(environment) {
                return if self.can_be_skipped {
                    OperationResult::Skip
                } else {
                    missing_environment_property(identifier, *property)
                };
            }
        }
        (self.operation)(identifier, data, environment)
    }
}

/// Run `operations` in order until one is decisive.
///
/// `Skip` and recoverable errors advance to the next operation; a
/// success or a fatal error is returned immediately. When the chain is
/// exhausted the most recent recoverable error is returned, or a
/// synthesized error if every operation skipped.
pub fn attempt_chain(
    operations: &[Requires],
    identifier: &Identifier,
    data: &CompilationData,
    environment: &CompilationEnvironment,
) -> OperationResult {
    let mut last_error = None;
    for operation in operations {
        match operation.attempt(identifier, data, environment) {
            OperationResult::Success(bytecode) => return OperationResult::Success(bytecode),
            OperationResult::Skip => continue,
            OperationResult::Error(error) if error.recoverable => last_error = Some(error),
            fatal => return fatal,
        }
    }
    match last_error {
        Some(error) => OperationResult::Error(error),
        None => OperationResult::fatal(format!(
            "Cannot resolve \"{identifier}\" - no operation was able to produce a result."
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bch::BCH_OPERATIONS;

    fn success(_: &Identifier, _: &CompilationData, _: &CompilationEnvironment) -> OperationResult {
        OperationResult::Success(vec![0xab])
    }

    fn skip(_: &Identifier, _: &CompilationData, _: &CompilationEnvironment) -> OperationResult {
        OperationResult::Skip
    }

    fn recoverable(
        _: &Identifier,
        _: &CompilationData,
        _: &CompilationEnvironment,
    ) -> OperationResult {
        OperationResult::recoverable("first failed")
    }

    fn fatal(_: &Identifier, _: &CompilationData, _: &CompilationEnvironment) -> OperationResult {
        OperationResult::fatal("first exploded")
    }

    fn tail(_: &Identifier, _: &CompilationData, _: &CompilationEnvironment) -> OperationResult {
        OperationResult::Success(vec![0xcd])
    }

    const fn ungated(operation: OperationFn) -> Requires {
        Requires {
            can_be_skipped: false,
            data_properties: &[],
            environment_properties: &[],
            operation,
        }
    }

    fn run(operations: &[Requires]) -> OperationResult {
        let identifier = Identifier::parse("x.y");
        let data = CompilationData::new();
        let environment = CompilationEnvironment::new(&BCH_OPERATIONS);
        attempt_chain(operations, &identifier, &data, &environment)
    }

    #[test]
    fn chain_returns_the_first_success() {
        assert_eq!(
            run(&[ungated(success), ungated(tail)]),
            OperationResult::Success(vec![0xab])
        );
    }

    #[test]
    fn chain_advances_past_skips() {
        assert_eq!(
            run(&[ungated(skip), ungated(tail)]),
            OperationResult::Success(vec![0xcd])
        );
    }

    #[test]
    fn chain_advances_past_recoverable_errors() {
        assert_eq!(
            run(&[ungated(recoverable), ungated(tail)]),
            OperationResult::Success(vec![0xcd])
        );
    }

    #[test]
    fn chain_aborts_on_fatal_errors() {
        assert_eq!(
            run(&[ungated(fatal), ungated(tail)]),
            OperationResult::fatal("first exploded")
        );
    }

    #[test]
    fn exhausted_chain_returns_the_last_recoverable_error() {
        assert_eq!(
            run(&[ungated(recoverable), ungated(skip)]),
            OperationResult::recoverable("first failed")
        );
    }

    #[test]
    fn fully_skipped_chain_synthesizes_an_error() {
        assert_eq!(
            run(&[ungated(skip), ungated(skip)]),
            OperationResult::fatal(
                "Cannot resolve \"x.y\" - no operation was able to produce a result."
            )
        );
    }

    #[test]
    fn missing_data_property_is_fatal_before_the_operation_runs() {
        let gated = Requires {
            can_be_skipped: false,
            data_properties: &[DataProperty::Keys],
            environment_properties: &[],
            operation: success,
        };
        assert_eq!(
            run(&[gated]),
            OperationResult::fatal(
                "Cannot resolve \"x.y\" - the \"keys\" property was not provided in the compilation data."
            )
        );
    }

    #[test]
    fn missing_environment_property_is_fatal_before_the_operation_runs() {
        let gated = Requires {
            can_be_skipped: false,
            data_properties: &[],
            environment_properties: &[EnvironmentProperty::Secp256k1],
            operation: success,
        };
        assert_eq!(
            run(&[gated]),
            OperationResult::fatal(
                "Cannot resolve \"x.y\" - the \"secp256k1\" property was not provided in the compilation environment."
            )
        );
    }

    #[test]
    fn missing_property_becomes_a_skip_when_skippable() {
        let gated = Requires {
            can_be_skipped: true,
            data_properties: &[DataProperty::Keys],
            environment_properties: &[],
            operation: fatal,
        };
        assert_eq!(
            run(&[gated, ungated(tail)]),
            OperationResult::Success(vec![0xcd])
        );
    }

    #[test]
    fn satisfied_properties_let_the_operation_run() {
        let gated = Requires {
            can_be_skipped: false,
            data_properties: &[DataProperty::CurrentBlockHeight],
            environment_properties: &[],
            operation: success,
        };
        let identifier = Identifier::parse("x.y");
        let data = CompilationData::new().current_block_height(100);
        let environment = CompilationEnvironment::new(&BCH_OPERATIONS);
        assert_eq!(
            attempt_chain(&[gated], &identifier, &data, &environment),
            OperationResult::Success(vec![0xab])
        );
    }
}
