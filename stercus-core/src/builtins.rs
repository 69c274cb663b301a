//! Built-in operations of the Stercus language.
//!
//! These are the only operations a program can apply to a cell besides
//! assignment and calls to its own applications. Backends decide how each
//! one is carried out (mutating memory, emitting a C statement, ...).

/// A built-in operation applied to the accessor's cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Increment,
    Decrement,
    Output,
    Input,
    Nop,
}

/// Metadata about a single builtin symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinDescriptor {
    /// Source spelling of the builtin.
    pub symbol: &'static str,
    pub kind: Builtin,
}

/// The complete list of builtins known to the core.
pub const BUILTINS: &[BuiltinDescriptor] = &[
    BuiltinDescriptor {
        symbol: "+",
        kind: Builtin::Increment,
    },
    BuiltinDescriptor {
        symbol: "-",
        kind: Builtin::Decrement,
    },
    BuiltinDescriptor {
        symbol: ".",
        kind: Builtin::Output,
    },
    BuiltinDescriptor {
        symbol: ",",
        kind: Builtin::Input,
    },
    BuiltinDescriptor {
        symbol: "_",
        kind: Builtin::Nop,
    },
];

/// Look up a builtin by its source spelling.
///
/// The search is linear over `BUILTINS` because the table is small.
pub fn find_builtin(symbol: &str) -> Option<Builtin> {
    BUILTINS
        .iter()
        .find(|descriptor| descriptor.symbol == symbol)
        .map(|descriptor| descriptor.kind)
}

impl Builtin {
    pub fn symbol(self) -> &'static str {
        BUILTINS
            .iter()
            .find(|descriptor| descriptor.kind == self)
            .map(|descriptor| descriptor.symbol)
            .unwrap_or("_")
    }
}
