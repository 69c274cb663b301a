//! C backend for Stercus.
//!
//! Runs the shared evaluator over every function-table entry, turning each
//! resolved bracket into C statements instead of memory effects. Every
//! application becomes `void a_name(unsigned int s0)`; the prefix keeps
//! routine names clear of C keywords and libc. The entry point becomes
//! `main`, which owns the memory array.

use core::fmt;

use tracing::debug;

use crate::builtins::Builtin;
use crate::config::Config;
use crate::error::CoreError;
use crate::eval::{Backend, LoopEntry, LoopExit, evaluate};
use crate::lexer::{PARAMETER, Token};
use crate::table::{ENTRY_POINT, FunctionTable};

/// Name of the generated memory pointer.
pub const MEMORY: &str = "d0";
/// Helper the generated code reads input through.
const READ_BYTE: &str = "read_byte";
/// Prepended to every application name in the generated C.
pub const ROUTINE_PREFIX: &str = "a_";

/// A C expression produced while translating a body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CExpr {
    Literal(i64),
    /// The enclosing routine's argument.
    Parameter,
    /// `d0[index]`
    Cell(Box<CExpr>),
}

impl fmt::Display for CExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CExpr::Literal(value) => write!(f, "{value}"),
            CExpr::Parameter => f.write_str(PARAMETER),
            CExpr::Cell(index) => write!(f, "{MEMORY}[{index}]"),
        }
    }
}

/// Collects the statements of one routine body.
pub struct CGenerator<'c> {
    config: &'c Config,
    in_application: bool,
    depth: usize,
    lines: Vec<String>,
}

impl<'c> CGenerator<'c> {
    pub fn new(config: &'c Config, in_application: bool) -> Self {
        Self {
            config,
            in_application,
            depth: 1,
            lines: Vec::new(),
        }
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    fn emit(&mut self, statement: impl Into<String>) {
        let indent = "    ".repeat(self.depth);
        self.lines.push(format!("{indent}{}", statement.into()));
    }
}

impl Backend for CGenerator<'_> {
    type Value = CExpr;
    type Address = CExpr;

    fn literal(&mut self, value: i64) -> CExpr {
        CExpr::Literal(value)
    }

    fn parameter(&mut self) -> Result<CExpr, CoreError> {
        if self.in_application {
            Ok(CExpr::Parameter)
        } else {
            Err(CoreError::ParameterOutsideApplication)
        }
    }

    fn resolve_accessor(&mut self, value: CExpr) -> Result<CExpr, CoreError> {
        // Only constant addresses can be checked before the program runs.
        if let CExpr::Literal(address) = &value {
            self.config.check_address(*address)?;
        }
        Ok(value)
    }

    fn apply_builtin(&mut self, accessor: &CExpr, op: Builtin) -> Result<(), CoreError> {
        let cell = CExpr::Cell(Box::new(accessor.clone()));
        match op {
            Builtin::Increment => self.emit(format!("{cell}++;")),
            Builtin::Decrement => self.emit(format!("{cell}--;")),
            Builtin::Output => self.emit(format!("putchar({cell});")),
            Builtin::Input => self.emit(format!("{cell} = {READ_BYTE}();")),
            Builtin::Nop => {}
        }
        Ok(())
    }

    fn assign(&mut self, accessor: &CExpr, value: CExpr) -> Result<(), CoreError> {
        let cell = CExpr::Cell(Box::new(accessor.clone()));
        self.emit(format!("{cell} = {value};"));
        Ok(())
    }

    fn call(
        &mut self,
        _table: &FunctionTable,
        name: &str,
        accessor: &CExpr,
    ) -> Result<(), CoreError> {
        self.emit(format!("{}({accessor});", routine_name(name)));
        Ok(())
    }

    fn resolve(&mut self, accessor: &CExpr) -> Result<CExpr, CoreError> {
        Ok(CExpr::Cell(Box::new(accessor.clone())))
    }

    fn enter_loop(&mut self) -> Result<(), CoreError> {
        self.emit("while (1) {");
        self.depth += 1;
        Ok(())
    }

    fn test_loop(&mut self, accessor: &CExpr) -> Result<LoopEntry, CoreError> {
        let cell = CExpr::Cell(Box::new(accessor.clone()));
        self.emit(format!("if (!{cell}) {{ break; }}"));
        Ok(LoopEntry::Run)
    }

    fn exit_loop(&mut self, _accessor: &CExpr) -> Result<LoopExit, CoreError> {
        self.depth = self.depth.saturating_sub(1);
        self.emit("}");
        Ok(LoopExit::Done)
    }
}

/// C identifier of application `name`.
pub fn routine_name(name: &str) -> String {
    format!("{ROUTINE_PREFIX}{name}")
}

fn signature(name: &str) -> String {
    format!("void {}(unsigned int {PARAMETER})", routine_name(name))
}

fn translate_body(
    table: &FunctionTable,
    tokens: &[Token],
    config: &Config,
    in_application: bool,
) -> Result<Vec<String>, CoreError> {
    let mut generator = CGenerator::new(config, in_application);
    evaluate(tokens, table, &mut generator)?;
    Ok(generator.into_lines())
}

/// Translate a whole function table to a C program.
///
/// Declarations come first so applications can call each other in any
/// order; `main` comes last.
pub fn generate_c(table: &FunctionTable, config: &Config) -> Result<String, CoreError> {
    let mut out = String::new();
    out.push_str("#include <stdio.h>\n#include <stdlib.h>\n\n");
    out.push_str(&format!("unsigned char *{MEMORY};\n\n"));
    out.push_str(&format!("static unsigned char {READ_BYTE}(void) {{\n"));
    out.push_str("    int c = getchar();\n");
    out.push_str("    return c == EOF ? 0 : (unsigned char)c;\n}\n\n");

    for (name, _) in table.applications() {
        out.push_str(&signature(name));
        out.push_str(";\n");
    }
    if !table.is_empty() {
        out.push('\n');
    }

    for (name, body) in table.applications() {
        let lines = translate_body(table, body, config, true)?;
        out.push_str(&signature(name));
        out.push_str(" {\n");
        for line in lines {
            out.push_str(&line);
            out.push('\n');
        }
        out.push_str("}\n\n");
    }

    let lines = translate_body(table, table.entry(), config, false)?;
    out.push_str(&format!("int {ENTRY_POINT}(void) {{\n"));
    out.push_str(&format!(
        "    {MEMORY} = (unsigned char *)calloc({}, 1);\n",
        config.data_size
    ));
    out.push_str(&format!("    if (!{MEMORY}) {{ return 1; }}\n"));
    for line in lines {
        out.push_str(&line);
        out.push('\n');
    }
    out.push_str(&format!("    free({MEMORY});\n    return 0;\n}}\n"));

    debug!(routines = table.len() + 1, bytes = out.len(), "generated C source");
    Ok(out)
}
