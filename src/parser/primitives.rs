//! Single-token matchers: the leaves every grammar is built from.

use std::rc::Rc;

use crate::lexer::{Token, TokenType};

use super::combinators::BoxedParser;
use super::state::{FailureKind, ParseFailure, TokenCursor};

fn collect_types<I, K>(types: I) -> Rc<[TokenType]>
where
    I: IntoIterator<Item = K>,
    K: Into<TokenType>,
{
    types.into_iter().map(Into::into).collect()
}

fn describe_set(types: &[TokenType]) -> String {
    match types {
        [single] => single.to_string(),
        _ => {
            let names: Vec<&str> = types.iter().map(TokenType::as_str).collect();
            format!("one of [{}]", names.join(", "))
        }
    }
}

/// Mismatch failure at the cursor, describing whatever is actually there.
fn mismatch(cursor: &TokenCursor, expected: &str) -> ParseFailure {
    let at = cursor.position_for_error();
    let failure = match cursor.peek() {
        Some(token) => ParseFailure::new(FailureKind::TokenMismatch, "unexpected token", at)
            .found(token.describe()),
        None => ParseFailure::new(FailureKind::TokenMismatch, "unexpected end of input", at)
            .found("end of input"),
    };
    failure.expected(expected)
}

/// Consume one token whose type is in `types`.
pub fn any_of<I, K>(types: I) -> BoxedParser<Token>
where
    I: IntoIterator<Item = K>,
    K: Into<TokenType>,
{
    let types = collect_types(types);
    let expected = describe_set(&types);

    BoxedParser::new(move |cursor: &mut TokenCursor| match cursor.consume_if(&types) {
        Some(token) => Ok(token),
        None => Err(mismatch(cursor, &expected)),
    })
}

/// Consume one token whose type is *not* in `types`. Fails at end of input.
pub fn any_except<I, K>(types: I) -> BoxedParser<Token>
where
    I: IntoIterator<Item = K>,
    K: Into<TokenType>,
{
    let excluded = collect_types(types);
    let expected = format!("anything except {}", describe_set(&excluded));

    BoxedParser::new(move |cursor: &mut TokenCursor| {
        let accepted = cursor
            .peek()
            .is_some_and(|token| !excluded.contains(token.kind()));

        match accepted.then(|| cursor.consume()).flatten() {
            Some(token) => Ok(token),
            None => Err(mismatch(cursor, &expected)),
        }
    })
}

/// Succeed at the end of input.
///
/// A truly exhausted cursor counts as the end, and so does a token tagged
/// [`TokenType::END_OF_INPUT`], which is consumed. Any other token is trailing input
/// and is left in place.
pub fn end_of_input() -> BoxedParser<()> {
    BoxedParser::new(|cursor: &mut TokenCursor| {
        if cursor.is_at_end() || cursor.consume_if(&[TokenType::END_OF_INPUT]).is_some() {
            return Ok(());
        }

        let at = cursor.position_for_error();
        let found = cursor.peek().map(Token::describe).unwrap_or_default();
        Err(ParseFailure::new(
            FailureKind::UnexpectedTrailingInput,
            "unexpected trailing input",
            at,
        )
        .expected("end of input")
        .found(found))
    })
}
