//! Bracket validation.
//!
//! Runs before any structural parsing so that later stages may assume a
//! well-nested token stream.

use crate::error::{BracketFault, CoreError};
use crate::lexer::{Bracket, Token};

#[derive(Debug, Default)]
struct Counts {
    applicator: usize,
    conditional: usize,
    definition: usize,
}

impl Counts {
    fn get_mut(&mut self, kind: Bracket) -> &mut usize {
        match kind {
            Bracket::Applicator => &mut self.applicator,
            Bracket::Conditional => &mut self.conditional,
            Bracket::Definition => &mut self.definition,
        }
    }

    fn get(&self, kind: Bracket) -> usize {
        match kind {
            Bracket::Applicator => self.applicator,
            Bracket::Conditional => self.conditional,
            Bracket::Definition => self.definition,
        }
    }

    fn any_open(&self) -> bool {
        self.applicator + self.conditional + self.definition > 0
    }
}

/// Check that every bracket in `tokens` is properly nested.
pub fn check_brackets(tokens: &[Token]) -> Result<(), CoreError> {
    check(tokens).map_err(CoreError::UnbalancedBrackets)
}

fn check(tokens: &[Token]) -> Result<(), BracketFault> {
    let mut counts = Counts::default();
    let mut openings: Vec<Bracket> = Vec::new();

    for token in tokens {
        match token {
            Token::Open(kind) => {
                if *kind == Bracket::Definition && counts.any_open() {
                    return Err(BracketFault::NestedDefinition);
                }
                *counts.get_mut(*kind) += 1;
                openings.push(*kind);
            }
            Token::Close(kind) => {
                let open = openings
                    .pop()
                    .ok_or(BracketFault::TooManyClosers(*kind))?;
                if open != *kind {
                    return Err(BracketFault::Mismatched { open, close: *kind });
                }
                let count = counts.get_mut(*kind);
                *count = count
                    .checked_sub(1)
                    .ok_or(BracketFault::TooManyClosers(*kind))?;
            }
            _ => {}
        }
    }

    match Bracket::ALL.into_iter().find(|kind| counts.get(*kind) != 0) {
        Some(kind) => Err(BracketFault::Unterminated(kind)),
        None => Ok(()),
    }
}
