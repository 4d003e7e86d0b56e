//! Compile authentication-template scripts into bytecode.
//!
//! An authentication template names entities, typed variables and script
//! fragments; scripts reference variables through dotted identifiers
//! (`owner.signature.all_outputs`, `signing_serialization.locktime`).
//! This crate is the machinery between a template and executable
//! bytecode: the compilation environment and per-invocation data, the
//! pluggable compiler-operation protocol with typed prerequisites, the
//! identifier resolver, the BCH signing serializations, and the compiler
//! façade.
//!
//! The script-language frontend (tokenizer, parser, bytecode emitter)
//! and the virtual machine are external collaborators, consumed through
//! the [`compiler::ScriptCompiler`] trait and an opaque handle
//! respectively. Cryptography is consumed through the capability traits
//! of [`tessera_crypto`]; the [`bch`] module wires the native back-ends
//! into a ready-to-use environment.

pub mod bch;
pub mod compiler;
pub mod data;
pub mod encoding;
pub mod environment;
pub mod operation;
pub mod operations;
pub mod resolver;
pub mod serialization;

pub use compiler::{
    CompilationError, CompilationErrorType, CompilationResult, Compiler, ScriptCompilation,
    ScriptCompiler, SourceRange,
};
pub use data::{CompilationData, HdKeys, Keys};
pub use environment::CompilationEnvironment;
pub use operation::{
    attempt_chain, DataProperty, EnvironmentProperty, OperationError, OperationResult, Requires,
};
pub use resolver::{resolve_identifier, Identifier, ResolutionError};
pub use serialization::{OperationData, SigningSerializationAlgorithm};
