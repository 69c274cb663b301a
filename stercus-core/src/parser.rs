use tracing::debug;

use crate::brackets::check_brackets;
use crate::error::CoreError;
use crate::lexer::{Bracket, Token, lex};
use crate::table::FunctionTable;

/// Lex, validate, and split a program into its function table.
pub fn parse(source: &str) -> Result<FunctionTable, CoreError> {
    let tokens = lex(source)?;
    check_brackets(&tokens)?;
    extract_applications(tokens)
}

/// Move every `{name body}` out of the token stream into a function table.
///
/// Expects a stream that already passed [`check_brackets`]. Whatever is left
/// at the top level becomes the entry point.
pub fn extract_applications(mut tokens: Vec<Token>) -> Result<FunctionTable, CoreError> {
    let mut table = FunctionTable::new(Vec::new());
    let mut open_index = None;
    let mut index = 0;

    while index < tokens.len() {
        if tokens[index].is_open(Bracket::Definition) {
            open_index = Some(index);
        } else if tokens[index].is_close(Bracket::Definition) {
            let open = open_index.take().ok_or_else(|| {
                CoreError::Structure("definition closed before it was opened".to_string())
            })?;
            let name = match tokens.get(open + 1) {
                Some(Token::Identifier(name)) => name.clone(),
                Some(Token::Close(Bracket::Definition)) | None => {
                    return Err(CoreError::InvalidName(String::new()));
                }
                Some(other) => return Err(CoreError::InvalidName(other.to_string())),
            };
            let body: Vec<Token> = tokens
                .drain(open..=index)
                .skip(2)
                .take(index - open - 2)
                .map(|token| match token {
                    Token::Placeholder => Token::Parameter,
                    other => other,
                })
                .collect();
            debug!(application = %name, tokens = body.len(), "extracted application");
            table.insert(&name, body)?;
            index = open;
            continue;
        }
        index += 1;
    }

    if tokens
        .iter()
        .any(|token| matches!(token, Token::Placeholder | Token::Parameter))
    {
        return Err(CoreError::ParameterOutsideApplication);
    }
    table.set_entry(tokens);
    Ok(table)
}
