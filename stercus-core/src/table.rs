//! The function table: every application body by name, plus the entry point.
//!
//! Serialized as a JSON object mapping each name to an array of token
//! strings, which lets extraction and code generation run as separate
//! stages.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::brackets::check_brackets;
use crate::builtins::find_builtin;
use crate::error::{BracketFault, CoreError};
use crate::lexer::{Bracket, Token};

/// Reserved name of the top-level body.
pub const ENTRY_POINT: &str = "main";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FunctionTable {
    entries: IndexMap<String, Vec<Token>>,
}

/// Check that `name` may be used for an application.
pub fn check_application_name(name: &str) -> Result<(), CoreError> {
    if name.is_empty() || !name.chars().all(|ch| ch.is_ascii_alphabetic() || ch == '_') {
        return Err(CoreError::InvalidName(name.to_string()));
    }
    if name == ENTRY_POINT || find_builtin(name).is_some() {
        return Err(CoreError::ReservedName(name.to_string()));
    }
    Ok(())
}

impl FunctionTable {
    /// A table with only an entry point.
    pub fn new(entry: Vec<Token>) -> Self {
        let mut entries = IndexMap::new();
        entries.insert(ENTRY_POINT.to_string(), entry);
        Self { entries }
    }

    /// Add an application, keeping definition order.
    pub fn insert(&mut self, name: &str, body: Vec<Token>) -> Result<(), CoreError> {
        check_application_name(name)?;
        if self.entries.contains_key(name) {
            return Err(CoreError::DuplicateName(name.to_string()));
        }
        self.entries.insert(name.to_string(), body);
        Ok(())
    }

    pub fn set_entry(&mut self, entry: Vec<Token>) {
        self.entries.insert(ENTRY_POINT.to_string(), entry);
    }

    pub fn entry(&self) -> &[Token] {
        self.entries
            .get(ENTRY_POINT)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn body(&self, name: &str) -> Option<&[Token]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    /// True for user applications; the entry point is not callable.
    pub fn is_application(&self, name: &str) -> bool {
        name != ENTRY_POINT && self.entries.contains_key(name)
    }

    /// User applications in definition order.
    pub fn applications(&self) -> impl Iterator<Item = (&str, &[Token])> {
        self.entries
            .iter()
            .filter(|(name, _)| name.as_str() != ENTRY_POINT)
            .map(|(name, body)| (name.as_str(), body.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.applications().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_json(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a table produced by [`FunctionTable::to_json`] or another tool.
    ///
    /// Names and bodies are re-checked, since the file may not come from
    /// this crate's extractor.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let mut table: FunctionTable = serde_json::from_str(json)?;
        if !table.entries.contains_key(ENTRY_POINT) {
            return Err(CoreError::Structure(format!(
                "function table has no '{ENTRY_POINT}' entry"
            )));
        }
        for (name, body) in table.entries.iter_mut() {
            let is_entry = name == ENTRY_POINT;
            if !is_entry {
                check_application_name(name)?;
            }
            check_brackets(body)?;
            if body.iter().any(|token| token.is_open(Bracket::Definition)) {
                return Err(CoreError::UnbalancedBrackets(BracketFault::NestedDefinition));
            }
            for token in body.iter_mut() {
                if matches!(token, Token::Placeholder | Token::Parameter) {
                    if is_entry {
                        return Err(CoreError::ParameterOutsideApplication);
                    }
                    *token = Token::Parameter;
                }
            }
        }
        Ok(table)
    }
}
