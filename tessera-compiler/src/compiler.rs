//! Compiler façade and the external script-compiler interface
//!
//! Tokenizing, parsing and bytecode emission live outside this crate;
//! the [`ScriptCompiler`] trait is the single entry point through which
//! they are consumed. The frontend calls back into
//! [`crate::resolver::resolve_identifier`] for every identifier token it
//! encounters, and the [`Compiler`] value wires the frontend into the
//! environment so nested compilations (script inlining, data signatures)
//! reach the same implementation.

use std::sync::Arc;

use tracing::debug;

use crate::data::CompilationData;
use crate::environment::CompilationEnvironment;

/// Position of a token in a script source, for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRange {
    pub start_line_number: u32,
    pub start_column: u32,
    pub end_line_number: u32,
    pub end_column: u32,
}

impl SourceRange {
    pub const ZERO: SourceRange = SourceRange {
        start_line_number: 0,
        start_column: 0,
        end_line_number: 0,
        end_column: 0,
    };
}

/// One compilation error with its source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationError {
    pub error: String,
    pub range: SourceRange,
}

/// The stage a failed compilation reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompilationErrorType {
    Parse,
    Resolve,
    Reduce,
}

/// Outcome of compiling one script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompilationResult {
    Success {
        bytecode: Vec<u8>,
    },
    Failure {
        error_type: CompilationErrorType,
        errors: Vec<CompilationError>,
    },
}

/// A frontend's full output: the result plus, when requested, its trace.
///
/// The trace structure belongs to the frontend; it is carried opaquely
/// as JSON so debugging tools can consume it without this crate
/// modelling it.
#[derive(Debug, Clone)]
pub struct ScriptCompilation {
    pub result: CompilationResult,
    pub trace: Option<serde_json::Value>,
}

/// The external tokenizer / parser / bytecode emitter.
///
/// Implementations look up `script_id` in the environment's scripts,
/// resolve identifier tokens through
/// [`crate::resolver::resolve_identifier`], assemble the emitted bytes,
/// and report errors with source ranges. When `debug` is set the full
/// trace is included alongside the result.
pub trait ScriptCompiler: Send + Sync {
    fn compile_script(
        &self,
        script_id: &str,
        data: &CompilationData,
        environment: &CompilationEnvironment,
        debug: bool,
    ) -> ScriptCompilation;
}

/// A ready-to-use compiler: an environment plus a frontend.
pub struct Compiler {
    environment: CompilationEnvironment,
}

impl Compiler {
    /// Wire `frontend` into `environment` and produce a compiler.
    pub fn new(mut environment: CompilationEnvironment, frontend: Arc<dyn ScriptCompiler>) -> Self {
        environment.script_compiler = Some(frontend);
        Self { environment }
    }

    pub fn environment(&self) -> &CompilationEnvironment {
        &self.environment
    }

    /// Compile the named script against `data`.
    ///
    /// In debug mode the frontend's trace is carried through on the
    /// returned [`ScriptCompilation`].
    pub fn generate_bytecode(
        &self,
        script_id: &str,
        data: &CompilationData,
        debug: bool,
    ) -> ScriptCompilation {
        let Some(frontend) = self.environment.script_compiler.as_ref() else {
            // unreachable through `Compiler::new`, but environments are
            // caller-visible values
            return ScriptCompilation {
                result: CompilationResult::Failure {
                    error_type: CompilationErrorType::Resolve,
                    errors: vec![CompilationError {
                        error: "No script compiler was provided in the compilation environment."
                            .to_string(),
                        range: SourceRange::ZERO,
                    }],
                },
                trace: None,
            };
        };
        let debug_mode = debug;
        debug!(script_id = script_id, debug_mode, "generating bytecode");
        let compilation = frontend.compile_script(script_id, data, &self.environment, debug);
        if let CompilationResult::Failure { errors, .. } = &compilation.result {
            debug!(script_id, count = errors.len(), "compilation failed");
        }
        compilation
    }
}
