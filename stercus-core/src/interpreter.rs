//! Interpreter backend: runs a program against real memory and I/O.

use std::io::{self, Read, Write};

use tracing::{debug, trace};

use crate::builtins::Builtin;
use crate::config::Config;
use crate::error::CoreError;
use crate::eval::{Backend, LoopEntry, LoopExit, evaluate};
use crate::table::FunctionTable;

/// The program's byte cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Memory {
    cells: Vec<u8>,
}

impl Memory {
    /// Zeroed memory with `size` cells.
    pub fn new(size: usize) -> Self {
        Self {
            cells: vec![0; size],
        }
    }

    pub fn get(&self, address: usize) -> Option<u8> {
        self.cells.get(address).copied()
    }

    pub fn set(&mut self, address: usize, value: u8) -> Option<()> {
        self.cells.get_mut(address).map(|cell| *cell = value)
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    fn cell_mut(&mut self, address: usize) -> Result<&mut u8, CoreError> {
        self.cells
            .get_mut(address)
            .ok_or(CoreError::AddressOutOfRange(address as i64))
    }
}

/// Evaluates bodies by mutating [`Memory`] and performing byte I/O.
pub struct Interpreter<R, W> {
    memory: Memory,
    input: R,
    output: W,
    config: Config,
    /// Argument of every active application call, innermost last.
    frames: Vec<usize>,
}

impl<R: Read, W: Write> Interpreter<R, W> {
    pub fn new(config: Config, input: R, output: W) -> Self {
        Self {
            memory: Memory::new(config.data_size),
            input,
            output,
            config,
            frames: Vec::new(),
        }
    }

    /// Start from existing memory instead of zeroed cells.
    pub fn with_memory(mut self, memory: Memory) -> Self {
        self.memory = memory;
        self
    }

    /// Run the entry point of `table`.
    pub fn run(&mut self, table: &FunctionTable) -> Result<(), CoreError> {
        debug!(
            applications = table.len(),
            data_size = self.config.data_size,
            "interpreting program"
        );
        let result = evaluate(table.entry(), table, self);
        self.output.flush()?;
        result
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn into_memory(self) -> Memory {
        self.memory
    }

    fn cell(&self, address: usize) -> Result<u8, CoreError> {
        self.memory
            .get(address)
            .ok_or(CoreError::AddressOutOfRange(address as i64))
    }

    fn read_byte(&mut self) -> Result<u8, CoreError> {
        // Anything printed so far should be visible before blocking on input.
        self.output.flush()?;
        let mut byte = [0u8; 1];
        match self.input.read_exact(&mut byte) {
            Ok(()) => Ok(byte[0]),
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => Ok(0),
            Err(err) => Err(err.into()),
        }
    }
}

impl<R: Read, W: Write> Backend for Interpreter<R, W> {
    type Value = i64;
    type Address = usize;

    fn literal(&mut self, value: i64) -> i64 {
        value
    }

    fn parameter(&mut self) -> Result<i64, CoreError> {
        self.frames
            .last()
            .map(|&address| address as i64)
            .ok_or(CoreError::ParameterOutsideApplication)
    }

    fn resolve_accessor(&mut self, value: i64) -> Result<usize, CoreError> {
        self.config.check_address(value)
    }

    fn apply_builtin(&mut self, accessor: &usize, op: Builtin) -> Result<(), CoreError> {
        match op {
            Builtin::Increment => {
                let cell = self.memory.cell_mut(*accessor)?;
                *cell = cell.wrapping_add(1);
            }
            Builtin::Decrement => {
                let cell = self.memory.cell_mut(*accessor)?;
                *cell = cell.wrapping_sub(1);
            }
            Builtin::Output => {
                let value = self.cell(*accessor)?;
                self.output.write_all(&[value])?;
            }
            Builtin::Input => {
                let value = self.read_byte()?;
                *self.memory.cell_mut(*accessor)? = value;
            }
            Builtin::Nop => {}
        }
        Ok(())
    }

    fn assign(&mut self, accessor: &usize, value: i64) -> Result<(), CoreError> {
        // Cells are bytes; wider values keep their low eight bits.
        *self.memory.cell_mut(*accessor)? = value as u8;
        Ok(())
    }

    fn call(
        &mut self,
        table: &FunctionTable,
        name: &str,
        accessor: &usize,
    ) -> Result<(), CoreError> {
        if self.frames.len() >= self.config.max_call_depth {
            return Err(CoreError::CallDepthExceeded(self.config.max_call_depth));
        }
        let body = table
            .body(name)
            .ok_or_else(|| CoreError::UnknownToken(name.to_string()))?;
        trace!(application = name, argument = *accessor, "call");
        self.frames.push(*accessor);
        let result = evaluate(body, table, self);
        self.frames.pop();
        result
    }

    fn resolve(&mut self, accessor: &usize) -> Result<i64, CoreError> {
        self.cell(*accessor).map(i64::from)
    }

    fn enter_loop(&mut self) -> Result<(), CoreError> {
        Ok(())
    }

    fn test_loop(&mut self, accessor: &usize) -> Result<LoopEntry, CoreError> {
        let value = self.cell(*accessor)?;
        trace!(accessor = *accessor, value, "loop test");
        Ok(if value == 0 {
            LoopEntry::Skip
        } else {
            LoopEntry::Run
        })
    }

    fn exit_loop(&mut self, _accessor: &usize) -> Result<LoopExit, CoreError> {
        // The accessor may be indirect, so it is re-read and tested at the
        // top of the next iteration; a zero there skips past the `)`.
        Ok(LoopExit::Repeat)
    }
}
