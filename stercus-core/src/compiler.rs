use std::io::{Read, Write};

use crate::codegen_c::generate_c;
use crate::config::Config;
use crate::error::CoreError;
use crate::interpreter::{Interpreter, Memory};
use crate::parser::parse;
use crate::table::FunctionTable;

/// Everything produced by translating one program to C.
#[derive(Debug, PartialEq, Eq)]
pub struct CompilationArtifact {
    pub table: FunctionTable,
    pub c_source: String,
}

/// Parse `source` and translate it to a C program.
pub fn compile_c(source: &str, config: &Config) -> Result<CompilationArtifact, CoreError> {
    let table = parse(source)?;
    let c_source = generate_c(&table, config)?;
    Ok(CompilationArtifact { table, c_source })
}

/// Translate an already extracted function table to C.
pub fn emit_c(table: &FunctionTable, config: &Config) -> Result<String, CoreError> {
    generate_c(table, config)
}

/// Parse and run `source`, returning the final memory.
pub fn interpret<R: Read, W: Write>(
    source: &str,
    input: R,
    output: W,
    config: &Config,
) -> Result<Memory, CoreError> {
    let table = parse(source)?;
    interpret_table(&table, input, output, config)
}

/// Run the entry point of an already extracted function table.
pub fn interpret_table<R: Read, W: Write>(
    table: &FunctionTable,
    input: R,
    output: W,
    config: &Config,
) -> Result<Memory, CoreError> {
    let mut interpreter = Interpreter::new(*config, input, output);
    interpreter.run(table)?;
    Ok(interpreter.into_memory())
}
