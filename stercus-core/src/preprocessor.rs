//! Comment removal and word splitting.
//!
//! The preprocessor does no validation. It turns raw source text into the
//! flat list of words the lexer classifies.

/// Starts a comment that runs to the end of the line.
pub const LINE_COMMENT: &str = "#";
/// Opens and closes a comment that may span several lines.
pub const BLOCK_COMMENT: &str = "##";

const BRACKET_CHARS: [char; 6] = ['[', ']', '(', ')', '{', '}'];

/// Remove block comments, then line comments.
///
/// Block comments match the shortest span between two delimiters. An
/// unclosed `##` is left for the line-comment pass.
pub fn remove_comments(source: &str) -> String {
    let without_blocks = remove_block_comments(source);
    let mut out = String::with_capacity(without_blocks.len());
    for (index, line) in without_blocks.split('\n').enumerate() {
        if index > 0 {
            out.push('\n');
        }
        match line.find(LINE_COMMENT) {
            Some(start) => out.push_str(&line[..start]),
            None => out.push_str(line),
        }
    }
    out
}

fn remove_block_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;
    while let Some(start) = rest.find(BLOCK_COMMENT) {
        let after_open = &rest[start + BLOCK_COMMENT.len()..];
        let Some(length) = after_open.find(BLOCK_COMMENT) else {
            break;
        };
        out.push_str(&rest[..start]);
        rest = &after_open[length + BLOCK_COMMENT.len()..];
    }
    out.push_str(rest);
    out
}

/// Split comment-free text into words.
///
/// Every bracket character is a word of its own; everything else is split
/// on whitespace.
pub fn split_words(text: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut start = None;
    for (index, ch) in text.char_indices() {
        if ch.is_whitespace() || BRACKET_CHARS.contains(&ch) {
            if let Some(begin) = start.take() {
                words.push(&text[begin..index]);
            }
            if !ch.is_whitespace() {
                words.push(&text[index..index + ch.len_utf8()]);
            }
        } else if start.is_none() {
            start = Some(index);
        }
    }
    if let Some(begin) = start {
        words.push(&text[begin..]);
    }
    words
}

/// Remove comments and split the remaining source into owned words.
pub fn preprocess(source: &str) -> Vec<String> {
    let text = remove_comments(source);
    split_words(&text).into_iter().map(str::to_owned).collect()
}
