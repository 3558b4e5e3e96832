// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Property-based tests for the lexer and the UTF-8 validator.

use proptest::prelude::*;

use crate::arena::Arena;
use crate::lex::{Lexer, LexerOptions, TokenKind};
use crate::source::{validate_utf8, SourceManager};

fn lex_tokens(source: &str) -> Option<Vec<(TokenKind, u32, u32, u32)>> {
    let arena = Arena::new();
    let sources = SourceManager::with_defaults();
    let mut lexer = Lexer::new(&sources, &arena, LexerOptions::default());
    let stream = lexer.tokenize_source(source, "prop.gl").ok()?;
    Some(
        stream
            .tokens()
            .iter()
            .map(|t| {
                (
                    t.kind,
                    t.location.line(),
                    t.location.column(),
                    t.location.offset(),
                )
            })
            .collect(),
    )
}

proptest! {
    /// Tokenization either fails cleanly or terminates with EOF; it
    /// never panics.
    #[test]
    fn lexer_never_panics(source in "\\PC{0,200}") {
        if let Some(tokens) = lex_tokens(&source) {
            prop_assert_eq!(tokens.last().map(|t| t.0), Some(TokenKind::Eof));
        }
    }

    /// Token locations are non-decreasing by (line, column, offset).
    #[test]
    fn token_locations_are_monotonic(source in "[a-z0-9+*()\\n ={};.<>]{0,200}") {
        if let Some(tokens) = lex_tokens(&source) {
            for pair in tokens.windows(2) {
                let a = (pair[0].1, pair[0].2, pair[0].3);
                let b = (pair[1].1, pair[1].2, pair[1].3);
                prop_assert!(a <= b, "locations went backwards: {:?} > {:?}", a, b);
            }
        }
    }

    /// Integer literals round-trip through the lexer payload.
    #[test]
    fn integer_payloads_round_trip(value in 0i64..=i64::MAX) {
        let source = value.to_string();
        let arena = Arena::new();
        let sources = SourceManager::with_defaults();
        let mut lexer = Lexer::new(&sources, &arena, LexerOptions::default());
        let stream = lexer.tokenize_source(&source, "int.gl").unwrap();
        prop_assert_eq!(stream.tokens()[0].value.as_int(), Some(value));
    }

    /// The streaming validator agrees with `std::str::from_utf8` on
    /// arbitrary byte soup.
    #[test]
    fn utf8_validator_matches_std(bytes in proptest::collection::vec(any::<u8>(), 0..128)) {
        prop_assert_eq!(validate_utf8(&bytes), std::str::from_utf8(&bytes).is_ok());
    }

    /// Valid UTF-8 always passes the validator.
    #[test]
    fn utf8_validator_accepts_valid_strings(s in "\\PC{0,64}") {
        prop_assert!(validate_utf8(s.as_bytes()));
    }
}
