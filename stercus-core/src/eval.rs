//! Bracket evaluator shared by every backend.
//!
//! One left-to-right pass over a body's tokens recovers the nesting of
//! applicators and conditionals with an explicit stack. What a resolved
//! bracket *does* is left to a [`Backend`]: the interpreter mutates memory,
//! the C generator emits statements.
//!
//! Conditionals rewind to their accessor token on every iteration, so the
//! accessor is re-read and re-checked each time the loop is tested. A zero
//! test at that point skips to the matching `)` and leaves the loop.

use core::fmt;

use tracing::debug;

use crate::builtins::Builtin;
use crate::error::CoreError;
use crate::lexer::{Bracket, Token};
use crate::table::FunctionTable;

/// Outcome of testing a conditional's accessor when the loop is entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEntry {
    Run,
    /// Jump past the matching `)` without running the body.
    Skip,
}

/// Outcome of reaching a conditional's `)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// Rewind to the accessor and test again.
    Repeat,
    Done,
}

/// What the evaluator needs from a backend.
pub trait Backend {
    /// A value an applicator can resolve to, or a literal operand.
    type Value: Clone + fmt::Debug;
    /// A checked memory address.
    type Address: Clone + fmt::Debug;

    fn literal(&mut self, value: i64) -> Self::Value;

    /// The argument of the application currently being evaluated.
    fn parameter(&mut self) -> Result<Self::Value, CoreError>;

    /// Turn a value into an address, rejecting anything out of range.
    fn resolve_accessor(&mut self, value: Self::Value) -> Result<Self::Address, CoreError>;

    fn apply_builtin(&mut self, accessor: &Self::Address, op: Builtin) -> Result<(), CoreError>;

    fn assign(&mut self, accessor: &Self::Address, value: Self::Value) -> Result<(), CoreError>;

    /// Invoke application `name` with `accessor` as its argument.
    fn call(
        &mut self,
        table: &FunctionTable,
        name: &str,
        accessor: &Self::Address,
    ) -> Result<(), CoreError>;

    /// The value an applicator on `accessor` resolves to.
    fn resolve(&mut self, accessor: &Self::Address) -> Result<Self::Value, CoreError>;

    /// Called once when a `(` is first reached.
    fn enter_loop(&mut self) -> Result<(), CoreError>;

    /// Called each time a conditional's accessor has been resolved.
    fn test_loop(&mut self, accessor: &Self::Address) -> Result<LoopEntry, CoreError>;

    /// Called each time a conditional's `)` is reached.
    fn exit_loop(&mut self, accessor: &Self::Address) -> Result<LoopExit, CoreError>;
}

enum Entry<B: Backend> {
    Applicator,
    Conditional { accessor: Option<B::Address> },
    Pending(Token),
    Resolved(B::Value),
    /// Result of a conditional; it names no cell.
    Void,
}

impl<B: Backend> Entry<B> {
    fn is_marker(&self) -> bool {
        matches!(self, Entry::Applicator | Entry::Conditional { .. })
    }

    fn describe(&self) -> String {
        match self {
            Entry::Applicator => "[".to_string(),
            Entry::Conditional { .. } => "(".to_string(),
            Entry::Pending(token) => token.to_string(),
            Entry::Resolved(value) => format!("{value:?}"),
            Entry::Void => "( ... )".to_string(),
        }
    }
}

/// Where a delivered entry lands.
enum Target<A> {
    TopLevel,
    Applicator,
    /// A conditional still waiting for its accessor.
    Unbound,
    Loop(A),
}

/// Evaluate one body with `backend`.
pub fn evaluate<B: Backend>(
    tokens: &[Token],
    table: &FunctionTable,
    backend: &mut B,
) -> Result<(), CoreError> {
    debug!(tokens = tokens.len(), "evaluating body");
    Pass {
        tokens,
        table,
        backend,
        stack: Vec::new(),
        loops: Vec::new(),
        cursor: 0,
    }
    .run()
}

struct Pass<'a, B: Backend> {
    tokens: &'a [Token],
    table: &'a FunctionTable,
    backend: &'a mut B,
    stack: Vec<Entry<B>>,
    /// Index just past each open `(`.
    loops: Vec<usize>,
    cursor: usize,
}

impl<'a, B: Backend> Pass<'a, B> {
    fn run(mut self) -> Result<(), CoreError> {
        let tokens = self.tokens;
        while let Some(token) = tokens.get(self.cursor) {
            self.cursor += 1;
            match token {
                Token::Open(Bracket::Applicator) => self.stack.push(Entry::Applicator),
                Token::Open(Bracket::Conditional) => {
                    self.backend.enter_loop()?;
                    self.stack.push(Entry::Conditional { accessor: None });
                    self.loops.push(self.cursor);
                }
                Token::Close(Bracket::Applicator) => self.close_applicator()?,
                Token::Close(Bracket::Conditional) => self.close_conditional()?,
                Token::Open(Bracket::Definition) | Token::Close(Bracket::Definition) => {
                    return Err(CoreError::Structure(
                        "application definition inside a body".to_string(),
                    ));
                }
                other => self.deliver(Entry::Pending(other.clone()))?,
            }
        }

        if !self.stack.is_empty() || !self.loops.is_empty() {
            let pending: Vec<_> = self.stack.iter().map(Entry::describe).collect();
            return Err(CoreError::Structure(format!(
                "evaluation ended with unresolved entries: {}",
                pending.join(" ")
            )));
        }
        Ok(())
    }

    /// Hand a token or resolved value to the innermost open bracket.
    fn deliver(&mut self, entry: Entry<B>) -> Result<(), CoreError> {
        let innermost = self.stack.iter().rev().find(|candidate| candidate.is_marker());
        let target = match innermost {
            None => Target::TopLevel,
            Some(Entry::Applicator) => Target::Applicator,
            Some(Entry::Conditional { accessor: None }) => Target::Unbound,
            Some(Entry::Conditional {
                accessor: Some(accessor),
            }) => Target::Loop(accessor.clone()),
            Some(_) => {
                return Err(CoreError::Structure(
                    "stack marker lookup returned a value entry".to_string(),
                ));
            }
        };

        match (target, entry) {
            (Target::TopLevel, Entry::Pending(token)) => Err(CoreError::Structure(format!(
                "'{token}' appears outside any bracket"
            ))),
            (Target::Applicator, entry) => {
                self.stack.push(entry);
                Ok(())
            }
            (Target::Unbound, entry) => self.bind_accessor(entry),
            // Bare operands in a loop body act on the loop's own cell.
            (Target::Loop(accessor), Entry::Pending(token)) => self.apply(&accessor, token),
            // Values of brackets nobody consumes are dropped.
            _ => Ok(()),
        }
    }

    fn accessor(&mut self, entry: Entry<B>) -> Result<B::Address, CoreError> {
        let value = match entry {
            Entry::Pending(Token::Literal(value)) => self.backend.literal(value),
            Entry::Pending(Token::Parameter) => self.backend.parameter()?,
            Entry::Resolved(value) => value,
            other => return Err(CoreError::InvalidAccessor(other.describe())),
        };
        self.backend.resolve_accessor(value)
    }

    fn apply(&mut self, accessor: &B::Address, token: Token) -> Result<(), CoreError> {
        match token {
            Token::Builtin(op) => self.backend.apply_builtin(accessor, op),
            Token::Literal(value) => {
                let value = self.backend.literal(value);
                self.backend.assign(accessor, value)
            }
            Token::Parameter => {
                let value = self.backend.parameter()?;
                self.backend.assign(accessor, value)
            }
            Token::Identifier(name) if self.table.is_application(&name) => {
                self.backend.call(self.table, &name, accessor)
            }
            other => Err(CoreError::UnknownToken(other.to_string())),
        }
    }

    fn bind_accessor(&mut self, entry: Entry<B>) -> Result<(), CoreError> {
        let address = self.accessor(entry)?;
        match self.backend.test_loop(&address)? {
            LoopEntry::Run => {
                if let Some(Entry::Conditional { accessor }) = self.stack.last_mut() {
                    *accessor = Some(address);
                    Ok(())
                } else {
                    Err(CoreError::Structure(
                        "conditional accessor without an open conditional".to_string(),
                    ))
                }
            }
            LoopEntry::Skip => {
                self.skip_body()?;
                match self.stack.pop() {
                    Some(Entry::Conditional { .. }) => self.leave_conditional(),
                    _ => Err(CoreError::Structure(
                        "skipped a conditional that was not open".to_string(),
                    )),
                }
            }
        }
    }

    /// Move the cursor past the `)` matching the innermost open conditional.
    fn skip_body(&mut self) -> Result<(), CoreError> {
        let mut depth = 0usize;
        while let Some(token) = self.tokens.get(self.cursor) {
            self.cursor += 1;
            match token {
                Token::Open(Bracket::Conditional) => depth += 1,
                Token::Close(Bracket::Conditional) if depth == 0 => return Ok(()),
                Token::Close(Bracket::Conditional) => depth -= 1,
                _ => {}
            }
        }
        Err(CoreError::Structure("unterminated conditional".to_string()))
    }

    fn close_applicator(&mut self) -> Result<(), CoreError> {
        let mut items = Vec::new();
        loop {
            match self.stack.pop() {
                Some(Entry::Applicator) => break,
                Some(Entry::Conditional { .. }) | None => {
                    return Err(CoreError::Structure("']' without a matching '['".to_string()));
                }
                Some(entry) => items.push(entry),
            }
        }
        items.reverse();

        let mut items = items.into_iter();
        let first = items
            .next()
            .ok_or_else(|| CoreError::Structure("applicator has no accessor".to_string()))?;
        let address = self.accessor(first)?;
        for item in items {
            match item {
                Entry::Pending(token) => self.apply(&address, token)?,
                Entry::Resolved(value) => self.backend.assign(&address, value)?,
                Entry::Void => {}
                marker => {
                    return Err(CoreError::Structure(format!(
                        "unexpected '{}' inside applicator",
                        marker.describe()
                    )));
                }
            }
        }

        let value = self.backend.resolve(&address)?;
        self.deliver(Entry::Resolved(value))
    }

    fn close_conditional(&mut self) -> Result<(), CoreError> {
        let accessor = loop {
            match self.stack.pop() {
                Some(Entry::Conditional { accessor }) => break accessor,
                Some(Entry::Applicator) | None => {
                    return Err(CoreError::Structure("')' without a matching '('".to_string()));
                }
                Some(_) => {}
            }
        };
        let accessor = accessor
            .ok_or_else(|| CoreError::Structure("conditional has no accessor".to_string()))?;

        match self.backend.exit_loop(&accessor)? {
            LoopExit::Repeat => {
                let start = *self.loops.last().ok_or_else(|| {
                    CoreError::Structure("loop re-entry index missing".to_string())
                })?;
                self.stack.push(Entry::Conditional { accessor: None });
                self.cursor = start;
                Ok(())
            }
            LoopExit::Done => self.leave_conditional(),
        }
    }

    /// Finish a conditional whose marker has already been popped.
    fn leave_conditional(&mut self) -> Result<(), CoreError> {
        self.loops
            .pop()
            .ok_or_else(|| CoreError::Structure("loop re-entry index missing".to_string()))?;
        self.deliver(Entry::Void)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    /// Records every backend call as text.
    #[derive(Default)]
    struct Recorder {
        log: Vec<String>,
    }

    impl Backend for Recorder {
        type Value = String;
        type Address = String;

        fn literal(&mut self, value: i64) -> String {
            value.to_string()
        }

        fn parameter(&mut self) -> Result<String, CoreError> {
            Ok("arg".to_string())
        }

        fn resolve_accessor(&mut self, value: String) -> Result<String, CoreError> {
            Ok(value)
        }

        fn apply_builtin(&mut self, accessor: &String, op: Builtin) -> Result<(), CoreError> {
            self.log.push(format!("{}@{accessor}", op.symbol()));
            Ok(())
        }

        fn assign(&mut self, accessor: &String, value: String) -> Result<(), CoreError> {
            self.log.push(format!("{accessor}={value}"));
            Ok(())
        }

        fn call(
            &mut self,
            _: &FunctionTable,
            name: &str,
            accessor: &String,
        ) -> Result<(), CoreError> {
            self.log.push(format!("{name}({accessor})"));
            Ok(())
        }

        fn resolve(&mut self, accessor: &String) -> Result<String, CoreError> {
            Ok(format!("*{accessor}"))
        }

        fn enter_loop(&mut self) -> Result<(), CoreError> {
            self.log.push("loop".to_string());
            Ok(())
        }

        fn test_loop(&mut self, accessor: &String) -> Result<LoopEntry, CoreError> {
            self.log.push(format!("test {accessor}"));
            Ok(LoopEntry::Run)
        }

        fn exit_loop(&mut self, _: &String) -> Result<LoopExit, CoreError> {
            self.log.push("end".to_string());
            Ok(LoopExit::Done)
        }
    }

    fn record(source: &str) -> Result<Vec<String>, CoreError> {
        let table = parse(source)?;
        let mut recorder = Recorder::default();
        evaluate(table.entry(), &table, &mut recorder)?;
        Ok(recorder.log)
    }

    #[test]
    fn applies_operations_in_source_order() {
        assert_eq!(record("[3 + 7 .]").unwrap(), ["+@3", "3=7", ".@3"]);
    }

    #[test]
    fn nested_applicator_value_is_an_operand() {
        assert_eq!(record("[0 [1]]").unwrap(), ["0=*1"]);
    }

    #[test]
    fn nested_applicator_value_is_an_accessor() {
        assert_eq!(record("[[1] +]").unwrap(), ["+@*1"]);
    }

    #[test]
    fn conditional_tests_its_accessor_before_the_body() {
        assert_eq!(
            record("(0 [1 .] -)").unwrap(),
            ["loop", "test 0", ".@1", "-@0", "end"]
        );
    }

    #[test]
    fn conditional_accessor_may_be_an_applicator() {
        assert_eq!(
            record("([2 +] [1 .])").unwrap(),
            ["loop", "+@2", "test *2", ".@1", "end"]
        );
    }

    #[test]
    fn calls_known_applications() {
        assert_eq!(record("{inc [$ +]} [0 inc]").unwrap(), ["inc(0)"]);
    }

    #[test]
    fn conditional_inside_applicator_is_a_no_op_operand() {
        assert_eq!(
            record("[0 (1 -) +]").unwrap(),
            ["loop", "test 1", "-@1", "end", "+@0"]
        );
    }

    #[test]
    fn rejects_unknown_identifier() {
        let err = record("[0 foo]").unwrap_err();
        assert!(matches!(err, CoreError::UnknownToken(name) if name == "foo"));
    }

    #[test]
    fn entry_point_is_not_callable() {
        let err = record("[0 main]").unwrap_err();
        assert!(matches!(err, CoreError::UnknownToken(_)));
    }

    #[test]
    fn rejects_builtin_as_accessor() {
        let err = record("[+ 1]").unwrap_err();
        assert!(matches!(err, CoreError::InvalidAccessor(token) if token == "+"));
    }

    #[test]
    fn rejects_conditional_as_accessor() {
        let err = record("((0 -) [1 .])").unwrap_err();
        assert!(matches!(err, CoreError::InvalidAccessor(_)));
    }

    #[test]
    fn rejects_token_outside_brackets() {
        let err = record("[0 +] 5").unwrap_err();
        assert!(matches!(err, CoreError::Structure(_)));
    }

    #[test]
    fn rejects_empty_brackets() {
        assert!(matches!(record("[]"), Err(CoreError::Structure(_))));
        assert!(matches!(record("()"), Err(CoreError::Structure(_))));
    }

    #[test]
    fn unbalanced_body_is_reported_not_ignored() {
        let table = FunctionTable::new(Vec::new());
        let tokens = crate::lexer::lex("[0 +").expect("lex");
        let err = evaluate(&tokens, &table, &mut Recorder::default()).unwrap_err();
        assert!(matches!(err, CoreError::Structure(_)));
    }
}
