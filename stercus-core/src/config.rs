//! Run-wide settings shared by the interpreter and the C backend.

/// Number of addressable memory cells.
pub const DATA_SIZE: usize = 10000;

/// Upper bound on nested application calls in the interpreter.
///
/// Each call recurses on the host stack; this limit is reached well before
/// a 2 MiB thread stack runs out.
pub const MAX_CALL_DEPTH: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Cells a program may address (`0..data_size`).
    pub data_size: usize,
    /// How many application calls may be active at once while interpreting.
    pub max_call_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_size: DATA_SIZE,
            max_call_depth: MAX_CALL_DEPTH,
        }
    }
}

impl Config {
    pub fn with_data_size(mut self, data_size: usize) -> Self {
        self.data_size = data_size;
        self
    }

    pub fn with_max_call_depth(mut self, max_call_depth: usize) -> Self {
        self.max_call_depth = max_call_depth;
        self
    }

    /// Check that `address` names a cell a program may touch.
    pub fn check_address(&self, address: i64) -> Result<usize, crate::CoreError> {
        usize::try_from(address)
            .ok()
            .filter(|&index| index < self.data_size)
            .ok_or(crate::CoreError::AddressOutOfRange(address))
    }
}
