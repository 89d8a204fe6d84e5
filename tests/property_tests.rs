//! Property-based tests for the combinators.
//!
//! Token sequences are drawn from a small alphabet so that matches, mismatches and
//! partial matches all show up often.

use proptest::prelude::*;
use tokcomb::lexer::{SourcePosition, Token};
use tokcomb::parser::{BoxedParser, Parser, TokenCursor, and, any_of, attempt, label, many, or};

const KINDS: [&str; 3] = ["a", "b", "c"];

fn cursor_of(kinds: &[&'static str]) -> TokenCursor {
    let tokens: Vec<Token> = kinds
        .iter()
        .enumerate()
        .map(|(i, kind)| Token::new(*kind, *kind, SourcePosition::new(1, i + 1)))
        .collect();
    TokenCursor::new(tokens)
}

fn kinds_strategy() -> impl Strategy<Value = Vec<&'static str>> {
    prop::collection::vec(prop::sample::select(KINDS.to_vec()), 0..16)
}

fn tagged(kind: &'static str, tag: u8) -> BoxedParser<u8> {
    any_of([kind]) >> move |_: Token| tag
}

proptest! {
    #[test]
    fn any_of_advances_by_exactly_one(kinds in kinds_strategy(), wanted in prop::sample::select(KINDS.to_vec())) {
        let mut cursor = cursor_of(&kinds);
        let outcome = any_of([wanted]).parse(&mut cursor);
        match kinds.first() {
            Some(first) if *first == wanted => {
                prop_assert!(outcome.is_ok());
                prop_assert_eq!(cursor.position(), 1);
            }
            _ => {
                prop_assert!(outcome.is_err());
                prop_assert_eq!(cursor.position(), 0);
            }
        }
    }

    #[test]
    fn attempt_restores_on_failure(kinds in kinds_strategy(), skip in 0usize..3) {
        let mut cursor = cursor_of(&kinds);
        for _ in 0..skip.min(kinds.len()) {
            cursor.consume();
        }
        let before = cursor.position();

        let parser = attempt(and(vec![any_of(["a"]), any_of(["b"]), any_of(["a", "c"])]));
        match parser.parse(&mut cursor) {
            Ok(_) => prop_assert_eq!(cursor.position(), before + 3),
            Err(_) => prop_assert_eq!(cursor.position(), before),
        }
        prop_assert_eq!(cursor.backtrack_depth(), 0);
    }

    #[test]
    fn or_prefers_first_success(kinds in kinds_strategy()) {
        let mut cursor = cursor_of(&kinds);
        let parser = or(vec![tagged("a", 1), tagged("a", 2), tagged("b", 3)]);
        let expected = match kinds.first() {
            Some(&"a") => Some(1),
            Some(&"b") => Some(3),
            _ => None,
        };
        prop_assert_eq!(parser.parse(&mut cursor).ok(), expected);
    }

    #[test]
    fn many_counts_leading_run(kinds in kinds_strategy()) {
        let run_length = kinds.iter().take_while(|kind| **kind == "a").count();
        let mut cursor = cursor_of(&kinds);
        let outcome = many(any_of(["a"])).parse(&mut cursor);

        if run_length == 0 {
            prop_assert!(outcome.is_err());
        } else {
            prop_assert_eq!(outcome.map(|values| values.len()).ok(), Some(run_length));
        }
        prop_assert_eq!(cursor.position(), run_length);
        prop_assert_eq!(cursor.backtrack_depth(), 0);
    }

    #[test]
    fn label_prefixes_and_keeps_position(kinds in kinds_strategy(), text in "[a-z]{1,8}") {
        let inner = and(vec![any_of(["a"]), any_of(["b"])]);
        let plain = inner.parse(&mut cursor_of(&kinds));
        let labeled = label(text.clone(), inner).parse(&mut cursor_of(&kinds));

        match (plain, labeled) {
            (Err(plain), Err(labeled)) => {
                let prefix = format!("{text}: ");
                prop_assert!(labeled.message.starts_with(&prefix));
                prop_assert_eq!(labeled.at, plain.at);
            }
            (Ok(_), Ok(_)) => {}
            _ => prop_assert!(false, "label changed success into failure or back"),
        }
    }

    #[test]
    fn or_failure_is_deepest(kinds in kinds_strategy()) {
        let alternatives = vec![
            and(vec![any_of(["a"]), any_of(["a"]), any_of(["a"]), any_of(["a"])]),
            and(vec![any_of(["b"]), any_of(["b"]), any_of(["b"]), any_of(["b"])]),
        ];
        let depths: Vec<Option<usize>> = alternatives
            .iter()
            .map(|parser| parser.parse(&mut cursor_of(&kinds)).err().map(|f| f.position()))
            .collect();

        let mut cursor = cursor_of(&kinds);
        if let Err(failure) = or(alternatives).parse(&mut cursor) {
            let deepest = depths.iter().flatten().max().copied();
            prop_assert_eq!(Some(failure.position()), deepest);
            prop_assert_eq!(cursor.position(), 0);
        }
    }
}
