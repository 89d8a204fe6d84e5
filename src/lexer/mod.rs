//! # Tokenizer
//!
//! Turns a character sequence into typed, positioned [`Token`]s.
//!
//! The tokenizer is configured with an ordered list of rules. Each rule pairs a
//! single-character [`Matcher`] with the [`TokenType`] it produces. Input is walked one
//! character at a time and every character becomes exactly one token, tagged by the
//! **first** rule that matches it. Rule order is therefore significant: overlapping rules
//! such as "letter" and "hex digit" are resolved purely by registration order.
//!
//! A character that no rule matches aborts tokenization with
//! [`LexError::UnmatchedCharacter`]; no partial token sequence is returned.
//!
//! ## Positions
//!
//! Positions are 1-based. The column advances with every character. The line advances
//! only after a character tagged with the designated newline type (see
//! [`TokenizerConfig::newline`]), after which the column starts over at 1.
//!
//! ## Example
//!
//! ```text
//! letter = /[a-zA-Z]/, digit = /[0-9]/
//! "ab12" → (letter,'a',1:1) (letter,'b',1:2) (digit,'1',1:3) (digit,'2',1:4)
//! ```

use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

use regex::Regex;
use thiserror::Error;
use tracing::{debug, trace};

/// Open, string-like tag naming the kind of a token.
///
/// Token types are not a closed enum: grammars introduce whatever tags they need.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenType(Cow<'static, str>);

impl TokenType {
    /// Reserved tag for an explicit end-of-input marker.
    ///
    /// The tokenizer never produces it on its own; a configuration may register a rule
    /// that does (for example for a sentinel character), and [`crate::parser::end_of_input`]
    /// accepts such a token as the end of input.
    pub const END_OF_INPUT: TokenType = TokenType(Cow::Borrowed("<eof>"));

    pub const fn from_static(name: &'static str) -> Self {
        TokenType(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> Self {
        TokenType(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_end_of_input(&self) -> bool {
        *self == Self::END_OF_INPUT
    }
}

impl From<&'static str> for TokenType {
    fn from(name: &'static str) -> Self {
        TokenType::from_static(name)
    }
}

impl From<String> for TokenType {
    fn from(name: String) -> Self {
        TokenType::new(name)
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 1-based line/column position in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourcePosition {
    pub line: usize,
    pub column: usize,
}

impl SourcePosition {
    pub fn new(line: usize, column: usize) -> Self {
        debug_assert!(line >= 1 && column >= 1, "positions are 1-based");
        Self { line, column }
    }

    /// Position of the first character of any input.
    pub fn start() -> Self {
        Self { line: 1, column: 1 }
    }
}

impl Default for SourcePosition {
    fn default() -> Self {
        Self::start()
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A typed, positioned lexeme. Tokens are immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    kind: TokenType,
    value: String,
    position: SourcePosition,
}

impl Token {
    pub fn new(kind: impl Into<TokenType>, value: impl Into<String>, position: SourcePosition) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
            position,
        }
    }

    pub fn kind(&self) -> &TokenType {
        &self.kind
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn pos(&self) -> SourcePosition {
        self.position
    }

    /// Returns a human-readable description of the token
    pub fn describe(&self) -> String {
        format!("{} '{}'", self.kind, self.value.escape_debug())
    }
}

/// Single-character test used by a tokenizer rule.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Matches exactly this character.
    Literal(char),
    /// Matches when the regex finds a match in the one-character string.
    Pattern(Regex),
    /// Matches when the predicate returns true.
    Class(fn(char) -> bool),
}

impl Matcher {
    pub fn matches(&self, ch: char) -> bool {
        match self {
            Matcher::Literal(expected) => *expected == ch,
            Matcher::Pattern(regex) => {
                let mut buf = [0u8; 4];
                regex.is_match(ch.encode_utf8(&mut buf))
            }
            Matcher::Class(predicate) => predicate(ch),
        }
    }
}

#[derive(Debug, Clone)]
struct Rule {
    matcher: Matcher,
    kind: TokenType,
}

#[derive(Debug, Error)]
pub enum LexError {
    /// A pattern rule could not be compiled. Raised at configuration time.
    #[error("invalid pattern for token type '{kind}': {source}")]
    InvalidPattern {
        kind: TokenType,
        #[source]
        source: regex::Error,
    },

    /// No registered rule accepts this character.
    #[error("no rule matches character {character:?} at {position}")]
    UnmatchedCharacter {
        character: char,
        position: SourcePosition,
    },
}

/// Builder for a [`Tokenizer`].
///
/// Rules are kept in registration order; `build` freezes them.
#[derive(Debug, Clone, Default)]
pub struct TokenizerConfig {
    rules: Vec<Rule>,
    newline: Option<TokenType>,
}

impl TokenizerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(mut self, matcher: Matcher, kind: impl Into<TokenType>) -> Self {
        self.rules.push(Rule {
            matcher,
            kind: kind.into(),
        });
        self
    }

    pub fn literal(self, ch: char, kind: impl Into<TokenType>) -> Self {
        self.rule(Matcher::Literal(ch), kind)
    }

    /// Register a regex rule. The regex is tested against each single character.
    pub fn pattern(self, pattern: &str, kind: impl Into<TokenType>) -> Result<Self, LexError> {
        let kind = kind.into();
        match Regex::new(pattern) {
            Ok(regex) => Ok(self.rule(Matcher::Pattern(regex), kind)),
            Err(source) => Err(LexError::InvalidPattern { kind, source }),
        }
    }

    pub fn class(self, predicate: fn(char) -> bool, kind: impl Into<TokenType>) -> Self {
        self.rule(Matcher::Class(predicate), kind)
    }

    /// Designate the token type whose characters end a line.
    pub fn newline(mut self, kind: impl Into<TokenType>) -> Self {
        self.newline = Some(kind.into());
        self
    }

    pub fn build(self) -> Tokenizer {
        Tokenizer {
            rules: self.rules.into(),
            newline: self.newline,
        }
    }
}

/// Immutable, first-match-wins character tokenizer.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    rules: Rc<[Rule]>,
    newline: Option<TokenType>,
}

impl Tokenizer {
    pub fn builder() -> TokenizerConfig {
        TokenizerConfig::new()
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn newline_type(&self) -> Option<&TokenType> {
        self.newline.as_ref()
    }

    /// Classify a single character, returning the type of the first matching rule.
    pub fn classify(&self, ch: char) -> Option<&TokenType> {
        self.rules
            .iter()
            .find(|rule| rule.matcher.matches(ch))
            .map(|rule| &rule.kind)
    }

    pub fn tokenize(&self, input: &str) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::with_capacity(input.len());
        let mut position = SourcePosition::start();

        for ch in input.chars() {
            let Some(kind) = self.classify(ch) else {
                debug!(character = ?ch, %position, "tokenization aborted");
                return Err(LexError::UnmatchedCharacter {
                    character: ch,
                    position,
                });
            };
            trace!(kind = %kind, character = ?ch, %position, "token");

            let is_newline = self.newline.as_ref() == Some(kind);
            tokens.push(Token::new(kind.clone(), ch.to_string(), position));

            if is_newline {
                position.line += 1;
                position.column = 1;
            } else {
                position.column += 1;
            }
        }

        debug!(tokens = tokens.len(), "tokenized input");
        Ok(tokens)
    }
}
