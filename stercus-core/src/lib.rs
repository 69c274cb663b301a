//! Core utilities for the Stercus language toolchain.
//!
//! The pipeline is roughly:
//!
//!   source .sc
//!     -> preprocessor (comments removed, words)
//!     -> lexer        (tagged tokens)
//!     -> brackets     (nesting validated)
//!     -> parser       (function table + entry point)
//!     -> eval         (shared bracket evaluator)
//!          -> interpreter (memory effects, byte I/O)
//!          -> codegen_c   (C source)
//!
//! Higher-level tools (CLI, etc.) should depend on this crate rather than
//! reimplementing the pipeline.

// ---------------------------------------------------------------------
// Error handling and configuration
// ---------------------------------------------------------------------

pub mod config;
pub mod error;

// ---------------------------------------------------------------------
// Front-end: preprocessing, lexing, validation, extraction
// ---------------------------------------------------------------------

pub mod brackets;
pub mod builtins;
pub mod lexer;
pub mod parser;
pub mod preprocessor;
pub mod table;

// ---------------------------------------------------------------------
// Evaluation and backends
// ---------------------------------------------------------------------

pub mod codegen_c;
pub mod eval;
pub mod interpreter;

// ---------------------------------------------------------------------
// Orchestration and tools
// ---------------------------------------------------------------------

pub mod compiler;
pub mod text;

// ---------------------------------------------------------------------
// Public API re-exports
// ---------------------------------------------------------------------

pub use compiler::{CompilationArtifact, compile_c, emit_c, interpret, interpret_table};
pub use config::Config;
pub use error::CoreError;
pub use parser::parse;
pub use table::FunctionTable;
