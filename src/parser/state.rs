use std::fmt;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use tracing::trace;

use crate::lexer::{SourcePosition, Token, TokenType};

/// Source position of a failure plus the absolute token index it happened at.
///
/// The index is what `or` compares to decide which alternative got furthest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorPosition {
    pub line: usize,
    pub column: usize,
    pub position: usize,
}

impl ErrorPosition {
    pub fn new(source: SourcePosition, position: usize) -> Self {
        Self {
            line: source.line,
            column: source.column,
            position,
        }
    }
}

impl fmt::Display for ErrorPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// A primitive matcher saw the wrong token type, or no token at all.
    TokenMismatch,
    /// `end_of_input` found tokens left over.
    UnexpectedTrailingInput,
    /// A failure re-described by `label`.
    Labeled,
    /// `many` stopped before a single progressing match.
    NoProgress,
    /// Reported by a hand-written parser.
    Custom,
}

/// The failure half of a [`ParseOutcome`]. Failures are plain data until the runner
/// turns them into a [`crate::parser::ParseError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub kind: FailureKind,
    pub message: String,
    pub expected: Vec<String>,
    pub found: Option<String>,
    pub at: ErrorPosition,
}

impl ParseFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>, at: ErrorPosition) -> Self {
        Self {
            kind,
            message: message.into(),
            expected: Vec::new(),
            found: None,
            at,
        }
    }

    pub fn custom(message: impl Into<String>, at: ErrorPosition) -> Self {
        Self::new(FailureKind::Custom, message, at)
    }

    pub fn expected(mut self, what: impl Into<String>) -> Self {
        self.expected.push(what.into());
        self
    }

    pub fn found(mut self, what: impl Into<String>) -> Self {
        self.found = Some(what.into());
        self
    }

    /// Absolute token index the failure happened at.
    pub fn position(&self) -> usize {
        self.at.position
    }

    pub(crate) fn labeled(mut self, label: &str) -> Self {
        self.message = format!("{label}: {}", self.message);
        self.kind = FailureKind::Labeled;
        self
    }

    /// Fold another failure's expectations into this one, keeping message and position.
    pub(crate) fn absorb_expected(&mut self, other: &ParseFailure) {
        for what in &other.expected {
            if !self.expected.contains(what) {
                self.expected.push(what.clone());
            }
        }
    }
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if !self.expected.is_empty() {
            write!(f, ", expected {}", self.expected.join(" or "))?;
        }
        if let Some(found) = &self.found {
            write!(f, ", found {found}")?;
        }
        Ok(())
    }
}

/// Result of running a parser: `Ok` is success, `Err` is a failure with position.
pub type ParseOutcome<T> = Result<T, ParseFailure>;

/// Forward-only cursor over a token sequence with an explicit LIFO backtrack stack.
///
/// Every `store_position` must be matched by exactly one `clear_position` or
/// `restore_position`. Combinators use [`TokenCursor::speculate`], which enforces this
/// on every exit path.
#[derive(Debug, Clone)]
pub struct TokenCursor {
    tokens: Rc<[Token]>,
    cursor: usize,
    backtrack: Vec<usize>,
}

impl TokenCursor {
    pub fn new(tokens: impl Into<Rc<[Token]>>) -> Self {
        Self {
            tokens: tokens.into(),
            cursor: 0,
            backtrack: Vec::new(),
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor)
    }

    /// Return the current token and advance. Running out of tokens is not an error.
    pub fn consume(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.cursor)?.clone();
        trace!(
            pos = self.cursor,
            kind = %token.kind(),
            value = token.value(),
            "consume"
        );
        self.cursor += 1;
        Some(token)
    }

    /// Consume the current token only if its type is one of `types`.
    pub fn consume_if(&mut self, types: &[TokenType]) -> Option<Token> {
        let accepted = self
            .peek()
            .is_some_and(|token| types.contains(token.kind()));
        if accepted { self.consume() } else { None }
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn is_at_end(&self) -> bool {
        self.cursor >= self.tokens.len()
    }

    pub fn backtrack_depth(&self) -> usize {
        self.backtrack.len()
    }

    pub fn store_position(&mut self) {
        trace!(pos = self.cursor, depth = self.backtrack.len(), "store position");
        self.backtrack.push(self.cursor);
    }

    /// Discard the most recently stored position, keeping the cursor where it is.
    pub fn clear_position(&mut self) {
        debug_assert!(!self.backtrack.is_empty(), "clear_position on empty stack");
        if let Some(saved) = self.backtrack.pop() {
            trace!(saved, pos = self.cursor, "clear position");
        }
    }

    /// Pop the most recently stored position and move the cursor back to it.
    pub fn restore_position(&mut self) {
        debug_assert!(!self.backtrack.is_empty(), "restore_position on empty stack");
        if let Some(saved) = self.backtrack.pop() {
            trace!(from = self.cursor, to = saved, "restore position");
            self.cursor = saved;
        }
    }

    /// Position of the token under the cursor, or of the last token once the cursor
    /// is exhausted. The absolute index is always the cursor itself.
    pub fn position_for_error(&self) -> ErrorPosition {
        let source = self
            .tokens
            .get(self.cursor)
            .or_else(|| self.tokens.last())
            .map(Token::pos)
            .unwrap_or_default();
        ErrorPosition::new(source, self.cursor)
    }

    /// Store the current position and hand out a guard owning that stack slot.
    pub fn speculate(&mut self) -> Speculation<'_> {
        self.store_position();
        let start = self.cursor;
        let depth = self.backtrack.len();
        Speculation {
            cursor: self,
            start,
            depth,
            settled: false,
        }
    }
}

/// Scoped ownership of one backtrack stack slot.
///
/// `commit` discards the slot and keeps the cursor; `rewind` pops it and resets the
/// cursor. Dropping an unsettled guard rewinds.
pub struct Speculation<'a> {
    cursor: &'a mut TokenCursor,
    start: usize,
    depth: usize,
    settled: bool,
}

impl Speculation<'_> {
    /// Cursor index at the time the position was stored.
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn advanced(&self) -> bool {
        self.cursor.position() > self.start
    }

    pub fn commit(mut self) {
        self.settle(false);
    }

    pub fn rewind(mut self) {
        self.settle(true);
    }

    fn settle(&mut self, rewind: bool) {
        if !std::thread::panicking() {
            debug_assert_eq!(
                self.cursor.backtrack_depth(),
                self.depth,
                "backtrack stack unbalanced by an inner parser"
            );
        }
        if rewind {
            self.cursor.restore_position();
        } else {
            self.cursor.clear_position();
        }
        self.settled = true;
    }
}

impl Deref for Speculation<'_> {
    type Target = TokenCursor;

    fn deref(&self) -> &TokenCursor {
        &*self.cursor
    }
}

impl DerefMut for Speculation<'_> {
    fn deref_mut(&mut self) -> &mut TokenCursor {
        &mut *self.cursor
    }
}

impl Drop for Speculation<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.settle(true);
        }
    }
}

pub trait Parser<T>: Sized {
    fn parse(&self, cursor: &mut TokenCursor) -> ParseOutcome<T>;
}

// Allow closures to be parsers
impl<T, F: Fn(&mut TokenCursor) -> ParseOutcome<T>> Parser<T> for F {
    fn parse(&self, cursor: &mut TokenCursor) -> ParseOutcome<T> {
        self(cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(kinds: &[&'static str]) -> Vec<Token> {
        kinds
            .iter()
            .enumerate()
            .map(|(i, kind)| Token::new(*kind, kind.to_string(), SourcePosition::new(1, i + 1)))
            .collect()
    }

    #[test]
    fn test_peek_does_not_advance() {
        let cursor = TokenCursor::new(tokens(&["a", "b"]));
        assert_eq!(cursor.peek().map(|t| t.value()), Some("a"));
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_consume_until_end() {
        let mut cursor = TokenCursor::new(tokens(&["a"]));
        assert!(cursor.consume().is_some());
        assert!(cursor.is_at_end());
        assert!(cursor.consume().is_none());
        assert_eq!(cursor.position(), 1);
    }

    #[test]
    fn test_consume_if_mismatch_keeps_cursor() {
        let mut cursor = TokenCursor::new(tokens(&["a", "b"]));
        assert!(cursor.consume_if(&[TokenType::from("b")]).is_none());
        assert_eq!(cursor.position(), 0);
        assert!(cursor.consume_if(&[TokenType::from("b"), TokenType::from("a")]).is_some());
        assert_eq!(cursor.position(), 1);
    }

    #[test]
    fn test_nested_store_restore() {
        let mut cursor = TokenCursor::new(tokens(&["a", "b", "c"]));
        cursor.store_position();
        cursor.consume();
        cursor.store_position();
        cursor.consume();
        assert_eq!(cursor.backtrack_depth(), 2);

        cursor.restore_position();
        assert_eq!(cursor.position(), 1);
        cursor.clear_position();
        assert_eq!(cursor.position(), 1);
        assert_eq!(cursor.backtrack_depth(), 0);
    }

    #[test]
    fn test_position_for_error_falls_back_to_last_token() {
        let mut cursor = TokenCursor::new(tokens(&["a", "b"]));
        cursor.consume();
        cursor.consume();
        let at = cursor.position_for_error();
        assert_eq!((at.line, at.column, at.position), (1, 2, 2));
    }

    #[test]
    fn test_position_for_error_on_empty_input() {
        let cursor = TokenCursor::new(Vec::new());
        assert_eq!(cursor.position_for_error(), ErrorPosition::new(SourcePosition::start(), 0));
    }

    #[test]
    fn test_speculation_drop_rewinds() {
        let mut cursor = TokenCursor::new(tokens(&["a", "b"]));
        {
            let mut speculation = cursor.speculate();
            speculation.consume();
            assert!(speculation.advanced());
        }
        assert_eq!(cursor.position(), 0);
        assert_eq!(cursor.backtrack_depth(), 0);
    }

    #[test]
    fn test_speculation_commit_keeps_progress() {
        let mut cursor = TokenCursor::new(tokens(&["a", "b"]));
        let mut speculation = cursor.speculate();
        speculation.consume();
        speculation.commit();
        assert_eq!(cursor.position(), 1);
        assert_eq!(cursor.backtrack_depth(), 0);
    }

    #[test]
    fn test_failure_display() {
        let at = ErrorPosition::new(SourcePosition::start(), 0);
        let failure = ParseFailure::new(FailureKind::TokenMismatch, "unexpected token", at)
            .expected("x")
            .expected("y")
            .found("z 'z'");
        assert_eq!(
            failure.to_string(),
            "unexpected token, expected x or y, found z 'z'"
        );
    }
}
