//! The boundary where a failed [`ParseOutcome`](super::ParseOutcome) becomes an error.

use thiserror::Error;
use tracing::debug;

use crate::lexer::{LexError, Tokenizer};

use super::state::{FailureKind, ParseFailure, Parser, TokenCursor};

/// A parse failure raised by [`run`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at {line}:{column}")]
pub struct ParseError {
    pub kind: FailureKind,
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub absolute_position: usize,
}

impl From<ParseFailure> for ParseError {
    fn from(failure: ParseFailure) -> Self {
        Self {
            kind: failure.kind,
            message: failure.to_string(),
            line: failure.at.line,
            column: failure.at.column,
            absolute_position: failure.at.position,
        }
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Run `parser` once against `cursor`, raising its failure as a [`ParseError`].
pub fn run<T, P: Parser<T>>(parser: &P, cursor: &mut TokenCursor) -> Result<T, ParseError> {
    let depth = cursor.backtrack_depth();
    let outcome = parser.parse(cursor);
    debug_assert_eq!(
        cursor.backtrack_depth(),
        depth,
        "parser left the backtrack stack unbalanced"
    );

    match outcome {
        Ok(value) => {
            debug!(consumed = cursor.position(), "parse succeeded");
            Ok(value)
        }
        Err(failure) => {
            debug!(at = %failure.at, kind = ?failure.kind, "parse failed");
            Err(failure.into())
        }
    }
}

/// Tokenize `input` and run `parser` over the result.
pub fn run_on_string<T, P: Parser<T>>(
    parser: &P,
    input: &str,
    tokenizer: &Tokenizer,
) -> Result<T, RunError> {
    let tokens = tokenizer.tokenize(input)?;
    let mut cursor = TokenCursor::new(tokens);
    Ok(run(parser, &mut cursor)?)
}
