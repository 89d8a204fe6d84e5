//! # tokcomb - Backtracking Parser Combinators over Tokens
//!
//! tokcomb builds recursive-descent parsers out of small composable functions. Input
//! text is first split into typed tokens; grammars are then assembled from single-token
//! matchers using sequencing, alternation, repetition, optionality and backtracking.
//!
//! ## Pipeline Flow
//!
//! ```text
//! Source Code (String)
//!     ↓
//! [Tokenizer] → Vec<Token>
//!     ↓
//! [TokenCursor] → forward-only cursor with a backtrack stack
//!     ↓
//! [Parser<T>] → ParseOutcome<T>  (Ok(value) | Err(ParseFailure))
//!     ↓
//! [Runner] → Result<T, ParseError>
//! ```
//!
//! ## Key Design Decisions
//!
//! ### Failure is data
//! Parsers return [`parser::ParseOutcome`], a plain `Result`. Combinators inspect and
//! merge failures without ever raising. Only the runner ([`parser::run`],
//! [`parser::run_on_string`]) converts a failure into an error for the caller.
//!
//! ### Explicit backtracking
//! The cursor never rewinds on its own. `attempt`, `or`, `many` and `optional` save the
//! position on the cursor's stack through a [`parser::Speculation`] guard, which either
//! commits or rewinds on every exit path, so the stack stays balanced.
//!
//! ### Deepest error wins
//! When all alternatives of `or` fail, the failure that consumed the most tokens is
//! reported. Ties keep the earliest alternative, which is what users usually meant.
//!
//! ### Recursion depth
//! Combinators call each other directly, so the call stack grows with grammar nesting
//! depth. Very deeply nested inputs for recursive grammars are bounded by the thread's
//! stack size.
//!
//! ## Module Structure
//!
//! - [`lexer`] - Rule-based character tokenizer
//! - [`parser`] - Token cursor, combinators, primitive matchers and runner
//!
//! ## Example
//!
//! ```text
//! letter = /[a-zA-Z]/, digit = /[0-9]/
//! and([many(any_of(["letter"])), many(any_of(["digit"]))]) on "ab12"
//!     → [[a, b], [1, 2]]
//! ```

pub mod lexer;
pub mod parser;
