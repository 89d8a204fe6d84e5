use std::cell::OnceCell;
use std::ops::{Add, BitOr, Mul, Shr, Sub};
use std::rc::Rc;

use tracing::trace;

use super::state::{FailureKind, ParseFailure, ParseOutcome, Parser, TokenCursor};

type ParserFn<T> = Rc<dyn Fn(&mut TokenCursor) -> ParseOutcome<T>>;

/// A parser behind a shared pointer, so grammars can hold and clone parsers of
/// different concrete types.
pub struct BoxedParser<T> {
    parser: ParserFn<T>,
}

impl<T> Clone for BoxedParser<T> {
    fn clone(&self) -> Self {
        Self {
            parser: Rc::clone(&self.parser),
        }
    }
}

impl<T: 'static> BoxedParser<T> {
    pub fn new<P: Parser<T> + 'static>(parser: P) -> Self {
        Self {
            parser: Rc::new(move |cursor: &mut TokenCursor| parser.parse(cursor)),
        }
    }
}

impl<T> Parser<T> for BoxedParser<T> {
    fn parse(&self, cursor: &mut TokenCursor) -> ParseOutcome<T> {
        (self.parser)(cursor)
    }
}

/// Run every parser in order and collect their values.
///
/// The first failure is returned as is. Tokens consumed by earlier parsers stay
/// consumed; wrap the sequence in [`attempt`] to undo them.
pub fn and<T: 'static>(parsers: Vec<BoxedParser<T>>) -> BoxedParser<Vec<T>> {
    BoxedParser::new(move |cursor: &mut TokenCursor| {
        let mut values = Vec::with_capacity(parsers.len());
        for parser in &parsers {
            values.push(parser.parse(cursor)?);
        }
        Ok(values)
    })
}

/// Ordered choice. Each alternative runs inside [`attempt`], so a failed alternative
/// never leaves tokens consumed. The first success wins.
///
/// When every alternative fails, the failure that got furthest into the input is
/// returned. Among failures at the same depth the earliest alternative keeps its
/// message and position, and the others only contribute what they expected. A
/// labeled winner keeps its own expectations, so its label never names tokens it
/// did not ask for.
pub fn or<T: 'static>(parsers: Vec<BoxedParser<T>>) -> BoxedParser<T> {
    let alternatives: Vec<BoxedParser<T>> = parsers.into_iter().map(attempt).collect();

    BoxedParser::new(move |cursor: &mut TokenCursor| {
        let mut deepest: Option<ParseFailure> = None;

        for alternative in &alternatives {
            let failure = match alternative.parse(cursor) {
                Ok(value) => return Ok(value),
                Err(failure) => failure,
            };

            deepest = Some(match deepest.take() {
                Some(best) if failure.position() > best.position() => failure,
                Some(mut best) => {
                    if failure.position() == best.position()
                        && best.kind != FailureKind::Labeled
                    {
                        best.absorb_expected(&failure);
                    }
                    best
                }
                None => failure,
            });
        }

        trace!(alternatives = alternatives.len(), "all alternatives failed");
        Err(deepest.unwrap_or_else(|| {
            ParseFailure::new(
                FailureKind::TokenMismatch,
                "no alternatives to try",
                cursor.position_for_error(),
            )
        }))
    })
}

/// One or more progressing matches.
///
/// A match that consumes nothing ends the loop without being kept, so zero-width
/// parsers cannot spin forever. If nothing was kept, the last failure is returned
/// instead of an empty list. Use `optional(many(p))` for zero or more.
pub fn many<T: 'static>(parser: BoxedParser<T>) -> BoxedParser<Vec<T>> {
    BoxedParser::new(move |cursor: &mut TokenCursor| {
        let mut values = Vec::new();

        let last_failure = loop {
            let mut speculation = cursor.speculate();
            match parser.parse(&mut speculation) {
                Ok(value) if speculation.advanced() => {
                    speculation.commit();
                    values.push(value);
                }
                Ok(_) => {
                    trace!(pos = speculation.start(), "repetition made no progress");
                    speculation.rewind();
                    break None;
                }
                Err(failure) => {
                    speculation.rewind();
                    break Some(failure);
                }
            }
        };

        if values.is_empty() {
            return Err(last_failure.unwrap_or_else(|| {
                ParseFailure::new(
                    FailureKind::NoProgress,
                    "repetition matched without consuming input",
                    cursor.position_for_error(),
                )
            }));
        }

        Ok(values)
    })
}

/// Zero or one match. Never fails; a failed attempt is undone and yields `None`.
pub fn optional<T: 'static>(parser: BoxedParser<T>) -> BoxedParser<Option<T>> {
    optional_no_backtrack(attempt(parser))
}

/// Like [`optional`], but a failing parser may leave whatever it consumed behind.
pub fn optional_no_backtrack<T: 'static>(parser: BoxedParser<T>) -> BoxedParser<Option<T>> {
    BoxedParser::new(move |cursor: &mut TokenCursor| Ok(parser.parse(cursor).ok()))
}

/// Rewind the cursor if `parser` fails. The outcome itself is passed through.
pub fn attempt<T: 'static>(parser: BoxedParser<T>) -> BoxedParser<T> {
    BoxedParser::new(move |cursor: &mut TokenCursor| {
        let mut speculation = cursor.speculate();
        let outcome = parser.parse(&mut speculation);
        match outcome {
            Ok(_) => speculation.commit(),
            Err(_) => speculation.rewind(),
        }
        outcome
    })
}

/// Prefix failure messages with `"<text>: "`. Position and success are untouched.
pub fn label<T: 'static>(text: impl Into<String>, parser: BoxedParser<T>) -> BoxedParser<T> {
    let text: Rc<str> = Rc::from(text.into());
    BoxedParser::new(move |cursor: &mut TokenCursor| {
        parser
            .parse(cursor)
            .map_err(|failure| failure.labeled(&text))
    })
}

pub fn map<T: 'static, U: 'static, F: Fn(T) -> U + 'static>(
    parser: BoxedParser<T>,
    f: F,
) -> BoxedParser<U> {
    BoxedParser::new(move |cursor: &mut TokenCursor| parser.parse(cursor).map(&f))
}

/// Defer building a parser until it is first run, for recursive grammars.
pub fn lazy<T: 'static, F: Fn() -> BoxedParser<T> + 'static>(build: F) -> BoxedParser<T> {
    let parser: OnceCell<BoxedParser<T>> = OnceCell::new();
    BoxedParser::new(move |cursor: &mut TokenCursor| parser.get_or_init(&build).parse(cursor))
}

impl<T: 'static> BoxedParser<T> {
    /// `self` then `other`, keeping both values.
    pub fn seq<U: 'static>(self, other: BoxedParser<U>) -> BoxedParser<(T, U)> {
        BoxedParser::new(move |cursor: &mut TokenCursor| {
            let left = self.parse(cursor)?;
            let right = other.parse(cursor)?;
            Ok((left, right))
        })
    }

    /// `self` then `other`, keeping only the value of `self`.
    pub fn skip<U: 'static>(self, other: BoxedParser<U>) -> BoxedParser<T> {
        BoxedParser::new(move |cursor: &mut TokenCursor| {
            let kept = self.parse(cursor)?;
            other.parse(cursor)?;
            Ok(kept)
        })
    }

    /// `self` then `other`, keeping only the value of `other`.
    pub fn skip_left<U: 'static>(self, other: BoxedParser<U>) -> BoxedParser<U> {
        BoxedParser::new(move |cursor: &mut TokenCursor| {
            self.parse(cursor)?;
            other.parse(cursor)
        })
    }

    pub fn map<U: 'static, F: Fn(T) -> U + 'static>(self, f: F) -> BoxedParser<U> {
        map(self, f)
    }

    pub fn or(self, other: BoxedParser<T>) -> BoxedParser<T> {
        or(vec![self, other])
    }

    pub fn attempt(self) -> BoxedParser<T> {
        attempt(self)
    }

    pub fn many(self) -> BoxedParser<Vec<T>> {
        many(self)
    }

    pub fn optional(self) -> BoxedParser<Option<T>> {
        optional(self)
    }

    pub fn label(self, text: impl Into<String>) -> BoxedParser<T> {
        label(text, self)
    }
}

/// `a + b` is [`BoxedParser::seq`].
impl<T: 'static, U: 'static> Add<BoxedParser<U>> for BoxedParser<T> {
    type Output = BoxedParser<(T, U)>;

    fn add(self, rhs: BoxedParser<U>) -> Self::Output {
        self.seq(rhs)
    }
}

/// `a - b` is [`BoxedParser::skip`].
impl<T: 'static, U: 'static> Sub<BoxedParser<U>> for BoxedParser<T> {
    type Output = BoxedParser<T>;

    fn sub(self, rhs: BoxedParser<U>) -> Self::Output {
        self.skip(rhs)
    }
}

/// `a * b` is [`BoxedParser::skip_left`].
impl<T: 'static, U: 'static> Mul<BoxedParser<U>> for BoxedParser<T> {
    type Output = BoxedParser<U>;

    fn mul(self, rhs: BoxedParser<U>) -> Self::Output {
        self.skip_left(rhs)
    }
}

/// `a | b` is `or(vec![a, b])`.
impl<T: 'static> BitOr<BoxedParser<T>> for BoxedParser<T> {
    type Output = BoxedParser<T>;

    fn bitor(self, rhs: BoxedParser<T>) -> Self::Output {
        self.or(rhs)
    }
}

/// `p >> f` is [`map`].
impl<T: 'static, U: 'static, F: Fn(T) -> U + 'static> Shr<F> for BoxedParser<T> {
    type Output = BoxedParser<U>;

    fn shr(self, f: F) -> Self::Output {
        self.map(f)
    }
}
