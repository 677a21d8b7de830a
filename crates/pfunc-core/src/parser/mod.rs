//! S-expression reader — tokenizer, tree type, and stack-based parser
//!
//! Converts source text into a forest of generic [`SExpr`] trees.
//! Grammar: `form := atom | '(' form* ')'`
//!
//! Open nodes live on an explicit stack rather than the call stack, so input
//! depth never turns into native recursion. Nesting beyond [`MAX_DEPTH`] is a
//! `ParseError`.

pub mod ast;
pub mod tokenizer;

use crate::{Error, Result};
use ast::SExpr;
use tokenizer::{Span, SpannedToken, Token, Tokenizer};

/// Deepest nesting of `(` the reader accepts
pub const MAX_DEPTH: usize = 128;

/// Parse source text into its top-level forms
///
/// # Errors
/// Returns `ParseError` with line:column for a `)` without a matching `(`,
/// for a `(` that is still open at end of input, and for nesting deeper
/// than [`MAX_DEPTH`].
///
/// # Example
/// ```
/// let forest = pfunc_core::parser::parse("(+ 1 2) x").unwrap();
/// assert_eq!(forest.len(), 2);
/// assert_eq!(forest[0].label(), "+");
/// ```
pub fn parse(input: &str) -> Result<Vec<SExpr>> {
    let tokens = Tokenizer::new(input).tokenize();
    parse_tokens(tokens)
}

/// Parse an already tokenized input
pub fn parse_tokens(tokens: Vec<SpannedToken>) -> Result<Vec<SExpr>> {
    let mut forest = Vec::new();
    // Unclosed nodes, innermost last, with the span of their `(`
    let mut open: Vec<(Span, Vec<SExpr>)> = Vec::new();

    for SpannedToken { token, span } in tokens {
        let form = match token {
            Token::OpenParen => {
                if open.len() >= MAX_DEPTH {
                    return Err(Error::ParseError(format!(
                        "nesting deeper than {} levels at {}",
                        MAX_DEPTH, span
                    )));
                }
                open.push((span, Vec::new()));
                continue;
            }
            Token::CloseParen => match open.pop() {
                Some((_, children)) => SExpr::Node(children),
                None => {
                    return Err(Error::ParseError(format!("mismatched ) at {}", span)));
                }
            },
            Token::Identifier(text) => SExpr::Atom(text),
        };

        match open.last_mut() {
            Some((_, children)) => children.push(form),
            None => forest.push(form),
        }
    }

    if let Some((span, _)) = open.last() {
        return Err(Error::ParseError(format!(
            "mismatched ( at {}, unterminated at end of input",
            span
        )));
    }

    tracing::debug!(forms = forest.len(), "parsed top-level forms");
    Ok(forest)
}
