// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Lexical analysis for Glint source code.
//!
//! The lexer is a table-driven scanner: a 256-entry character-class
//! table maps each byte to a class, and the main loop dispatches to a
//! small per-class routine. Multi-character operators are resolved by
//! ordered lookahead (longest match first, e.g. `<<=` before `<<`
//! before `<=` before `<`).
//!
//! # Design Principles
//!
//! - **Precise locations**: every token carries the location of its
//!   first byte; `\r\n` advances exactly one line
//! - **Arena-interned payloads**: decoded string/char contents live in
//!   the arena and outlive the token stream
//! - **First error wins**: the lexer does not recover; the first
//!   malformed construct aborts tokenization (in non-strict mode,
//!   unknown characters are skipped and counted instead)
//!
//! # Example
//!
//! ```
//! use glint_core::arena::Arena;
//! use glint_core::lex::{Lexer, LexerOptions, TokenKind};
//! use glint_core::source::SourceManager;
//!
//! let arena = Arena::new();
//! let sources = SourceManager::with_defaults();
//! let mut lexer = Lexer::new(&sources, &arena, LexerOptions::default());
//! let tokens = lexer.tokenize_source("let x = 42", "demo.gl").unwrap();
//! assert_eq!(tokens.len(), 5); // let, x, =, 42, EOF
//! ```

use crate::arena::Arena;
use crate::diagnostics::SourceLocation;
use crate::source::{FileId, SourceManager};

use super::token::{
    keyword_kind, LexicalError, LexicalErrorKind, Token, TokenKind, TokenStream, TokenValue,
};

/// Lexer configuration.
#[derive(Debug, Clone, Copy)]
pub struct LexerOptions {
    /// Emit [`TokenKind::Newline`] tokens instead of skipping newlines.
    pub preserve_whitespace: bool,
    /// Emit [`TokenKind::Comment`] tokens instead of skipping comments.
    pub preserve_comments: bool,
    /// Fail on unknown characters instead of skipping them.
    pub strict_mode: bool,
}

impl Default for LexerOptions {
    fn default() -> Self {
        Self {
            preserve_whitespace: false,
            preserve_comments: false,
            strict_mode: true,
        }
    }
}

/// Counters accumulated across tokenization runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LexerStatistics {
    /// Tokens produced (including the EOF terminator).
    pub tokens_produced: usize,
    /// Source bytes consumed.
    pub bytes_processed: usize,
    /// Lines seen.
    pub lines_processed: usize,
    /// Unknown characters skipped in non-strict mode.
    pub errors_recovered: usize,
    /// Arena bytes allocated (cumulative, for interned payloads).
    pub memory_used: usize,
}

/// The Glint lexer.
///
/// Construct once per session with the source manager and arena, then
/// tokenize any number of files. The outer type is a thin handle; the
/// scanning state lives in a private per-run scanner.
pub struct Lexer<'a> {
    source_manager: &'a SourceManager,
    arena: &'a Arena,
    options: LexerOptions,
    stats: LexerStatistics,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer.
    #[must_use]
    pub fn new(source_manager: &'a SourceManager, arena: &'a Arena, options: LexerOptions) -> Self {
        Self {
            source_manager,
            arena,
            options,
            stats: LexerStatistics::default(),
        }
    }

    /// Tokenizes a loaded file.
    ///
    /// # Errors
    ///
    /// The first [`LexicalError`] encountered; no token stream is
    /// produced on error.
    pub fn tokenize(&mut self, file_id: FileId) -> Result<TokenStream<'a>, LexicalError<'a>> {
        let Some(file) = self.source_manager.get_file(file_id) else {
            return Err(LexicalError::new(
                LexicalErrorKind::InvalidCharacter('\0'),
                SourceLocation::default(),
            ));
        };
        self.run(file.content(), file.filename().as_str())
    }

    /// Tokenizes a string directly under a virtual name.
    ///
    /// # Errors
    ///
    /// As for [`Lexer::tokenize`].
    pub fn tokenize_source(
        &mut self,
        text: &'a str,
        name: &'a str,
    ) -> Result<TokenStream<'a>, LexicalError<'a>> {
        self.run(text, name)
    }

    /// Tokenizes a file and feeds each token to `callback`; stops
    /// early when the callback returns `false`.
    ///
    /// # Errors
    ///
    /// As for [`Lexer::tokenize`].
    pub fn tokenize_streaming(
        &mut self,
        file_id: FileId,
        mut callback: impl FnMut(&Token<'a>) -> bool,
    ) -> Result<(), LexicalError<'a>> {
        let stream = self.tokenize(file_id)?;
        for token in stream.iter() {
            if !callback(token) {
                break;
            }
        }
        Ok(())
    }

    /// Returns the accumulated statistics.
    #[must_use]
    pub fn statistics(&self) -> &LexerStatistics {
        &self.stats
    }

    /// Resets the accumulated statistics.
    pub fn reset_statistics(&mut self) {
        self.stats = LexerStatistics::default();
    }

    fn run(&mut self, input: &'a str, filename: &'a str) -> Result<TokenStream<'a>, LexicalError<'a>> {
        let mut scanner = Scanner::new(input, filename, self.arena, self.options);
        let tokens = scanner.scan_all()?;

        self.stats.tokens_produced += tokens.len();
        self.stats.bytes_processed += input.len();
        self.stats.lines_processed += scanner.line as usize;
        self.stats.errors_recovered += scanner.errors_recovered;
        self.stats.memory_used = self.arena.total_allocated();

        Ok(TokenStream::new(tokens))
    }
}

/// Character classes for the dispatch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Whitespace,
    Newline,
    Letter,
    Digit,
    Quote,
    SingleQuote,
    Slash,
    Star,
    Plus,
    Minus,
    Equal,
    Less,
    Greater,
    Ampersand,
    Pipe,
    Exclamation,
    Dot,
    Colon,
    Semicolon,
    Comma,
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Hash,
    At,
    Dollar,
    Percent,
    Caret,
    Tilde,
    Question,
    Invalid,
}

/// 256-entry classification table, one slot per input byte.
static CHAR_CLASS_TABLE: [CharClass; 256] = build_char_class_table();

const fn build_char_class_table() -> [CharClass; 256] {
    let mut table = [CharClass::Invalid; 256];

    table[b' ' as usize] = CharClass::Whitespace;
    table[b'\t' as usize] = CharClass::Whitespace;
    table[b'\r' as usize] = CharClass::Whitespace;
    table[0x0B] = CharClass::Whitespace; // vertical tab
    table[0x0C] = CharClass::Whitespace; // form feed
    table[b'\n' as usize] = CharClass::Newline;

    let mut c = b'a';
    while c <= b'z' {
        table[c as usize] = CharClass::Letter;
        c += 1;
    }
    let mut c = b'A';
    while c <= b'Z' {
        table[c as usize] = CharClass::Letter;
        c += 1;
    }
    table[b'_' as usize] = CharClass::Letter;

    let mut c = b'0';
    while c <= b'9' {
        table[c as usize] = CharClass::Digit;
        c += 1;
    }

    table[b'"' as usize] = CharClass::Quote;
    table[b'\'' as usize] = CharClass::SingleQuote;
    table[b'/' as usize] = CharClass::Slash;
    table[b'*' as usize] = CharClass::Star;
    table[b'+' as usize] = CharClass::Plus;
    table[b'-' as usize] = CharClass::Minus;
    table[b'=' as usize] = CharClass::Equal;
    table[b'<' as usize] = CharClass::Less;
    table[b'>' as usize] = CharClass::Greater;
    table[b'&' as usize] = CharClass::Ampersand;
    table[b'|' as usize] = CharClass::Pipe;
    table[b'!' as usize] = CharClass::Exclamation;
    table[b'.' as usize] = CharClass::Dot;
    table[b':' as usize] = CharClass::Colon;
    table[b';' as usize] = CharClass::Semicolon;
    table[b',' as usize] = CharClass::Comma;
    table[b'(' as usize] = CharClass::LeftParen;
    table[b')' as usize] = CharClass::RightParen;
    table[b'{' as usize] = CharClass::LeftBrace;
    table[b'}' as usize] = CharClass::RightBrace;
    table[b'[' as usize] = CharClass::LeftBracket;
    table[b']' as usize] = CharClass::RightBracket;
    table[b'#' as usize] = CharClass::Hash;
    table[b'@' as usize] = CharClass::At;
    table[b'$' as usize] = CharClass::Dollar;
    table[b'%' as usize] = CharClass::Percent;
    table[b'^' as usize] = CharClass::Caret;
    table[b'~' as usize] = CharClass::Tilde;
    table[b'?' as usize] = CharClass::Question;

    table
}

/// Per-run scanning state.
struct Scanner<'a> {
    input: &'a str,
    bytes: &'a [u8],
    filename: &'a str,
    arena: &'a Arena,
    options: LexerOptions,
    position: usize,
    line: u32,
    column: u32,
    errors_recovered: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str, filename: &'a str, arena: &'a Arena, options: LexerOptions) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            filename,
            arena,
            options,
            position: 0,
            line: 1,
            column: 1,
            errors_recovered: 0,
        }
    }

    fn scan_all(&mut self) -> Result<Vec<Token<'a>>, LexicalError<'a>> {
        // Rough estimate: one token per eight bytes.
        let mut tokens = Vec::with_capacity(self.input.len() / 8 + 1);
        loop {
            let token = self.next_token()?;
            let is_eof = token.kind.is_eof();
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Token<'a>, LexicalError<'a>> {
        loop {
            self.skip_inline_whitespace();

            if self.at_end() {
                return Ok(Token::new(TokenKind::Eof, self.location()));
            }

            let start = self.location();
            let byte = self.peek();

            match CHAR_CLASS_TABLE[byte as usize] {
                CharClass::Whitespace => continue,
                CharClass::Newline => {
                    self.advance();
                    if self.options.preserve_whitespace {
                        return Ok(Token::new(TokenKind::Newline, start));
                    }
                }
                CharClass::Letter => return Ok(self.lex_identifier_or_keyword(start)),
                CharClass::Digit => return self.lex_number(start),
                CharClass::Quote => return self.lex_string(start),
                CharClass::SingleQuote => return self.lex_char(start),
                CharClass::Slash => {
                    if let Some(token) = self.lex_slash_or_comment(start)? {
                        return Ok(token);
                    }
                }
                CharClass::Star => return Ok(self.lex_star(start)),
                CharClass::Plus => return Ok(self.lex_single_or_assign(start, TokenKind::Plus, TokenKind::PlusAssign)),
                CharClass::Minus => return Ok(self.lex_minus(start)),
                CharClass::Equal => return Ok(self.lex_equal(start)),
                CharClass::Less => return Ok(self.lex_less(start)),
                CharClass::Greater => return Ok(self.lex_greater(start)),
                CharClass::Ampersand => return Ok(self.lex_double_or_assign(
                    start,
                    b'&',
                    TokenKind::Ampersand,
                    TokenKind::And,
                    TokenKind::AndAssign,
                )),
                CharClass::Pipe => return Ok(self.lex_double_or_assign(
                    start,
                    b'|',
                    TokenKind::Pipe,
                    TokenKind::Or,
                    TokenKind::OrAssign,
                )),
                CharClass::Exclamation => {
                    return Ok(self.lex_single_or_assign(start, TokenKind::Not, TokenKind::NotEqual))
                }
                CharClass::Dot => return Ok(self.lex_dot(start)),
                CharClass::Colon => return Ok(self.lex_colon(start)),
                CharClass::Percent => {
                    return Ok(self.lex_single_or_assign(
                        start,
                        TokenKind::Percent,
                        TokenKind::PercentAssign,
                    ))
                }
                CharClass::Caret => {
                    return Ok(self.lex_single_or_assign(start, TokenKind::Caret, TokenKind::XorAssign))
                }
                CharClass::Semicolon => return Ok(self.lex_single(start, TokenKind::Semicolon)),
                CharClass::Comma => return Ok(self.lex_single(start, TokenKind::Comma)),
                CharClass::LeftParen => return Ok(self.lex_single(start, TokenKind::LeftParen)),
                CharClass::RightParen => return Ok(self.lex_single(start, TokenKind::RightParen)),
                CharClass::LeftBrace => return Ok(self.lex_single(start, TokenKind::LeftBrace)),
                CharClass::RightBrace => return Ok(self.lex_single(start, TokenKind::RightBrace)),
                CharClass::LeftBracket => return Ok(self.lex_single(start, TokenKind::LeftBracket)),
                CharClass::RightBracket => {
                    return Ok(self.lex_single(start, TokenKind::RightBracket))
                }
                CharClass::Hash => return Ok(self.lex_single(start, TokenKind::Hash)),
                CharClass::At => return Ok(self.lex_single(start, TokenKind::At)),
                CharClass::Dollar => return Ok(self.lex_single(start, TokenKind::Dollar)),
                CharClass::Tilde => return Ok(self.lex_single(start, TokenKind::Tilde)),
                CharClass::Question => return Ok(self.lex_single(start, TokenKind::Question)),
                CharClass::Invalid => {
                    let c = self.current_char();
                    if self.options.strict_mode {
                        return Err(LexicalError::new(
                            LexicalErrorKind::InvalidCharacter(c),
                            start,
                        ));
                    }
                    self.errors_recovered += 1;
                    self.advance_char();
                }
            }
        }
    }

    // === Identifiers and keywords ===

    fn lex_identifier_or_keyword(&mut self, start: SourceLocation<'a>) -> Token<'a> {
        let start_pos = self.position;
        while !self.at_end() && is_identifier_byte(self.peek()) {
            self.advance();
        }
        let text = &self.input[start_pos..self.position];

        match keyword_kind(text) {
            Some(TokenKind::BoolLiteral) => Token::with_value(
                TokenKind::BoolLiteral,
                TokenValue::Bool(text == "true"),
                start,
            ),
            Some(kind) => Token::new(kind, start),
            None => Token::with_value(TokenKind::Identifier, TokenValue::Str(text), start),
        }
    }

    // === Numbers ===

    fn lex_number(&mut self, start: SourceLocation<'a>) -> Result<Token<'a>, LexicalError<'a>> {
        if self.peek() == b'0' {
            match self.peek_at(1) {
                Some(b'x' | b'X') => return self.lex_radix_number(start, 16),
                Some(b'b' | b'B') => return self.lex_radix_number(start, 2),
                Some(b'o' | b'O') => return self.lex_radix_number(start, 8),
                _ => {}
            }
        }

        let start_pos = self.position;
        while !self.at_end() && self.peek().is_ascii_digit() {
            self.advance();
        }

        // A decimal point followed by a digit switches to float.
        if self.peek() == b'.' && self.peek_at(1).is_some_and(|b| b.is_ascii_digit()) {
            self.advance();
            while !self.at_end() && self.peek().is_ascii_digit() {
                self.advance();
            }

            if matches!(self.peek(), b'e' | b'E') {
                self.advance();
                if matches!(self.peek(), b'+' | b'-') {
                    self.advance();
                }
                while !self.at_end() && self.peek().is_ascii_digit() {
                    self.advance();
                }
            }

            let text = &self.input[start_pos..self.position];
            let value = parse_float(text).map_err(|kind| LexicalError::new(kind, start))?;
            return Ok(Token::with_value(
                TokenKind::FloatLiteral,
                TokenValue::Float(value),
                start,
            ));
        }

        let text = &self.input[start_pos..self.position];
        let value = parse_integer(text, 10).map_err(|kind| LexicalError::new(kind, start))?;
        Ok(Token::with_value(
            TokenKind::IntegerLiteral,
            TokenValue::Int(value),
            start,
        ))
    }

    fn lex_radix_number(
        &mut self,
        start: SourceLocation<'a>,
        radix: u32,
    ) -> Result<Token<'a>, LexicalError<'a>> {
        self.advance(); // 0
        self.advance(); // x / b / o

        let digits_start = self.position;
        let in_radix = |b: u8| match radix {
            16 => b.is_ascii_hexdigit(),
            8 => (b'0'..=b'7').contains(&b),
            _ => b == b'0' || b == b'1',
        };
        while !self.at_end() && in_radix(self.peek()) {
            self.advance();
        }

        let text = &self.input[digits_start..self.position];
        if text.is_empty() {
            return Err(LexicalError::new(LexicalErrorKind::InvalidNumber, start));
        }

        let value = parse_integer(text, radix).map_err(|kind| LexicalError::new(kind, start))?;
        Ok(Token::with_value(
            TokenKind::IntegerLiteral,
            TokenValue::Int(value),
            start,
        ))
    }

    // === Strings and characters ===

    fn lex_string(&mut self, start: SourceLocation<'a>) -> Result<Token<'a>, LexicalError<'a>> {
        self.advance(); // opening quote

        let mut content = String::new();
        loop {
            if self.at_end() {
                return Err(LexicalError::new(
                    LexicalErrorKind::UnterminatedString,
                    start,
                ));
            }
            match self.peek() {
                b'"' => break,
                b'\\' => {
                    self.advance();
                    content.push(self.decode_escape()?);
                }
                _ => {
                    let c = self.current_char();
                    self.advance_char();
                    content.push(c);
                }
            }
        }
        self.advance(); // closing quote

        let interned = self
            .arena
            .alloc_str(&content)
            .map_err(|_| LexicalError::new(LexicalErrorKind::OutOfMemory, start))?;
        Ok(Token::with_value(
            TokenKind::StringLiteral,
            TokenValue::Str(interned),
            start,
        ))
    }

    fn lex_char(&mut self, start: SourceLocation<'a>) -> Result<Token<'a>, LexicalError<'a>> {
        self.advance(); // opening quote

        if self.at_end() {
            return Err(LexicalError::new(LexicalErrorKind::UnterminatedChar, start));
        }

        let c = if self.peek() == b'\\' {
            self.advance();
            self.decode_escape()?
        } else {
            let c = self.current_char();
            self.advance_char();
            c
        };

        if self.at_end() || self.peek() != b'\'' {
            return Err(LexicalError::new(LexicalErrorKind::UnterminatedChar, start));
        }
        self.advance(); // closing quote

        let mut buffer = [0u8; 4];
        let interned = self
            .arena
            .alloc_str(c.encode_utf8(&mut buffer))
            .map_err(|_| LexicalError::new(LexicalErrorKind::OutOfMemory, start))?;
        Ok(Token::with_value(
            TokenKind::CharLiteral,
            TokenValue::Str(interned),
            start,
        ))
    }

    fn decode_escape(&mut self) -> Result<char, LexicalError<'a>> {
        let location = self.location();
        if self.at_end() {
            return Err(LexicalError::new(LexicalErrorKind::UnexpectedEof, location));
        }
        let c = self.current_char();
        self.advance_char();
        match c {
            'n' => Ok('\n'),
            't' => Ok('\t'),
            'r' => Ok('\r'),
            '0' => Ok('\0'),
            '\\' => Ok('\\'),
            '\'' => Ok('\''),
            '"' => Ok('"'),
            other => Err(LexicalError::new(
                LexicalErrorKind::InvalidEscape(other),
                location,
            )),
        }
    }

    // === Comments and slash operators ===

    fn lex_slash_or_comment(
        &mut self,
        start: SourceLocation<'a>,
    ) -> Result<Option<Token<'a>>, LexicalError<'a>> {
        let start_pos = self.position;
        self.advance(); // /

        match self.peek() {
            b'/' => {
                while !self.at_end() && self.peek() != b'\n' {
                    self.advance();
                }
                Ok(self.comment_token(start, start_pos))
            }
            b'*' => {
                self.advance(); // *
                loop {
                    if self.at_end() {
                        // Unterminated block comments share the string
                        // error path.
                        return Err(LexicalError::new(
                            LexicalErrorKind::UnterminatedString,
                            start,
                        ));
                    }
                    if self.peek() == b'*' && self.peek_at(1) == Some(b'/') {
                        self.advance();
                        self.advance();
                        break;
                    }
                    self.advance();
                }
                Ok(self.comment_token(start, start_pos))
            }
            b'=' => {
                self.advance();
                Ok(Some(Token::new(TokenKind::SlashAssign, start)))
            }
            _ => Ok(Some(Token::new(TokenKind::Slash, start))),
        }
    }

    fn comment_token(&self, start: SourceLocation<'a>, start_pos: usize) -> Option<Token<'a>> {
        self.options.preserve_comments.then(|| {
            Token::with_value(
                TokenKind::Comment,
                TokenValue::Str(&self.input[start_pos..self.position]),
                start,
            )
        })
    }

    // === Operators ===

    fn lex_single(&mut self, start: SourceLocation<'a>, kind: TokenKind) -> Token<'a> {
        self.advance();
        Token::new(kind, start)
    }

    /// Single-character operator, or the `=`-suffixed compound.
    fn lex_single_or_assign(
        &mut self,
        start: SourceLocation<'a>,
        single: TokenKind,
        with_assign: TokenKind,
    ) -> Token<'a> {
        self.advance();
        if self.peek() == b'=' {
            self.advance();
            Token::new(with_assign, start)
        } else {
            Token::new(single, start)
        }
    }

    /// `c`, `cc`, or `c=` (for `&` and `|`).
    fn lex_double_or_assign(
        &mut self,
        start: SourceLocation<'a>,
        byte: u8,
        single: TokenKind,
        doubled: TokenKind,
        with_assign: TokenKind,
    ) -> Token<'a> {
        self.advance();
        if self.peek() == byte {
            self.advance();
            Token::new(doubled, start)
        } else if self.peek() == b'=' {
            self.advance();
            Token::new(with_assign, start)
        } else {
            Token::new(single, start)
        }
    }

    fn lex_star(&mut self, start: SourceLocation<'a>) -> Token<'a> {
        self.advance();
        match self.peek() {
            b'=' => {
                self.advance();
                Token::new(TokenKind::StarAssign, start)
            }
            b'*' => {
                self.advance();
                Token::new(TokenKind::StarStar, start)
            }
            _ => Token::new(TokenKind::Star, start),
        }
    }

    fn lex_minus(&mut self, start: SourceLocation<'a>) -> Token<'a> {
        self.advance();
        match self.peek() {
            b'=' => {
                self.advance();
                Token::new(TokenKind::MinusAssign, start)
            }
            b'>' => {
                self.advance();
                Token::new(TokenKind::Arrow, start)
            }
            _ => Token::new(TokenKind::Minus, start),
        }
    }

    fn lex_equal(&mut self, start: SourceLocation<'a>) -> Token<'a> {
        self.advance();
        match self.peek() {
            b'=' => {
                self.advance();
                Token::new(TokenKind::Equal, start)
            }
            b'>' => {
                self.advance();
                Token::new(TokenKind::FatArrow, start)
            }
            _ => Token::new(TokenKind::Assign, start),
        }
    }

    fn lex_less(&mut self, start: SourceLocation<'a>) -> Token<'a> {
        self.advance();
        match self.peek() {
            b'=' => {
                self.advance();
                if self.peek() == b'>' {
                    self.advance();
                    Token::new(TokenKind::Spaceship, start)
                } else {
                    Token::new(TokenKind::LessEqual, start)
                }
            }
            b'<' => {
                self.advance();
                if self.peek() == b'=' {
                    self.advance();
                    Token::new(TokenKind::LeftShiftAssign, start)
                } else {
                    Token::new(TokenKind::LeftShift, start)
                }
            }
            _ => Token::new(TokenKind::Less, start),
        }
    }

    fn lex_greater(&mut self, start: SourceLocation<'a>) -> Token<'a> {
        self.advance();
        match self.peek() {
            b'=' => {
                self.advance();
                Token::new(TokenKind::GreaterEqual, start)
            }
            b'>' => {
                self.advance();
                if self.peek() == b'=' {
                    self.advance();
                    Token::new(TokenKind::RightShiftAssign, start)
                } else {
                    Token::new(TokenKind::RightShift, start)
                }
            }
            _ => Token::new(TokenKind::Greater, start),
        }
    }

    fn lex_dot(&mut self, start: SourceLocation<'a>) -> Token<'a> {
        self.advance();
        if self.peek() == b'.' {
            self.advance();
            match self.peek() {
                b'.' => {
                    self.advance();
                    Token::new(TokenKind::DotDotDot, start)
                }
                b'=' => {
                    self.advance();
                    Token::new(TokenKind::DotDotEqual, start)
                }
                _ => Token::new(TokenKind::DotDot, start),
            }
        } else {
            Token::new(TokenKind::Dot, start)
        }
    }

    fn lex_colon(&mut self, start: SourceLocation<'a>) -> Token<'a> {
        self.advance();
        if self.peek() == b':' {
            self.advance();
            Token::new(TokenKind::ColonColon, start)
        } else {
            Token::new(TokenKind::Colon, start)
        }
    }

    // === Cursor primitives ===

    fn at_end(&self) -> bool {
        self.position >= self.bytes.len()
    }

    /// Returns the byte at the cursor, or 0 at end of input.
    fn peek(&self) -> u8 {
        self.bytes.get(self.position).copied().unwrap_or(0)
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.position + offset).copied()
    }

    /// Decodes the character at the cursor (input is valid UTF-8).
    fn current_char(&self) -> char {
        self.input[self.position..].chars().next().unwrap_or('\0')
    }

    /// Advances one byte, maintaining line and column. `\n` starts a
    /// new line; in `\r\n` only the `\n` does.
    fn advance(&mut self) {
        if self.position < self.bytes.len() {
            if self.bytes[self.position] == b'\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            self.position += 1;
        }
    }

    /// Advances over one full character.
    fn advance_char(&mut self) {
        for _ in 0..self.current_char().len_utf8() {
            self.advance();
        }
    }

    fn skip_inline_whitespace(&mut self) {
        while !self.at_end() {
            match self.peek() {
                b' ' | b'\t' | b'\r' | 0x0B | 0x0C => self.advance(),
                b'\n' if !self.options.preserve_whitespace => self.advance(),
                _ => break,
            }
        }
    }

    fn location(&self) -> SourceLocation<'a> {
        SourceLocation::new(self.filename, self.line, self.column, self.position as u32)
    }
}

const fn is_identifier_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

fn parse_integer(text: &str, radix: u32) -> Result<i64, LexicalErrorKind> {
    if text.is_empty() {
        return Err(LexicalErrorKind::InvalidNumber);
    }
    i64::from_str_radix(text, radix).map_err(|error| match error.kind() {
        std::num::IntErrorKind::PosOverflow | std::num::IntErrorKind::NegOverflow => {
            LexicalErrorKind::NumberTooLarge
        }
        _ => LexicalErrorKind::InvalidNumber,
    })
}

fn parse_float(text: &str) -> Result<f64, LexicalErrorKind> {
    let value: f64 = text.parse().map_err(|_| LexicalErrorKind::InvalidFloat)?;
    if value.is_infinite() {
        return Err(LexicalErrorKind::NumberTooLarge);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lex::token::KEYWORD_TABLE;

    fn lex_kinds(source: &str) -> Vec<TokenKind> {
        let arena = Arena::new();
        let sources = SourceManager::with_defaults();
        let mut lexer = Lexer::new(&sources, &arena, LexerOptions::default());
        lexer
            .tokenize_source(source, "test.gl")
            .unwrap()
            .tokens()
            .iter()
            .map(|t| t.kind)
            .collect()
    }

    fn lex_error(source: &str) -> LexicalErrorKind {
        let arena = Arena::new();
        let sources = SourceManager::with_defaults();
        let mut lexer = Lexer::new(&sources, &arena, LexerOptions::default());
        lexer.tokenize_source(source, "test.gl").unwrap_err().kind
    }

    #[test]
    fn lex_empty() {
        assert_eq!(lex_kinds(""), vec![TokenKind::Eof]);
        assert_eq!(lex_kinds("   \n\t  "), vec![TokenKind::Eof]);
        assert_eq!(lex_kinds("// just a comment"), vec![TokenKind::Eof]);
    }

    /// Scenario S1: keyword + identifier token sequence.
    #[test]
    fn lex_function_declaration() {
        assert_eq!(
            lex_kinds("fn add(a: i32, b: i32) -> i32 { a + b }"),
            vec![
                TokenKind::KwFn,
                TokenKind::Identifier,
                TokenKind::LeftParen,
                TokenKind::Identifier,
                TokenKind::Colon,
                TokenKind::KwI32,
                TokenKind::Comma,
                TokenKind::Identifier,
                TokenKind::Colon,
                TokenKind::KwI32,
                TokenKind::RightParen,
                TokenKind::Arrow,
                TokenKind::KwI32,
                TokenKind::LeftBrace,
                TokenKind::Identifier,
                TokenKind::Plus,
                TokenKind::Identifier,
                TokenKind::RightBrace,
                TokenKind::Eof,
            ]
        );
    }

    /// Every keyword in isolation produces its keyword token;
    /// `true`/`false` produce `BoolLiteral` with the matching payload.
    #[test]
    fn lex_keyword_coverage() {
        let arena = Arena::new();
        let sources = SourceManager::with_defaults();
        let mut lexer = Lexer::new(&sources, &arena, LexerOptions::default());

        for &(keyword, expected) in &KEYWORD_TABLE {
            let stream = lexer.tokenize_source(keyword, "kw.gl").unwrap();
            let token = stream.tokens()[0];
            assert_eq!(token.kind, expected, "keyword {keyword}");
            if expected == TokenKind::BoolLiteral {
                assert_eq!(token.value.as_bool(), Some(keyword == "true"));
            }
        }
    }

    /// Scenario S5: numeric bases and floats.
    #[test]
    fn lex_numeric_bases() {
        let arena = Arena::new();
        let sources = SourceManager::with_defaults();
        let mut lexer = Lexer::new(&sources, &arena, LexerOptions::default());

        let stream = lexer
            .tokenize_source("0xFF 0b1010 0o755 3.14 1.0e10", "num.gl")
            .unwrap();
        let tokens = stream.tokens();

        assert_eq!(tokens[0].value.as_int(), Some(255));
        assert_eq!(tokens[1].value.as_int(), Some(10));
        assert_eq!(tokens[2].value.as_int(), Some(493));
        assert_eq!(tokens[3].value.as_float(), Some(3.14));
        assert_eq!(tokens[4].value.as_float(), Some(1.0e10));
    }

    #[test]
    fn lex_numeric_errors() {
        assert_eq!(lex_error("0x"), LexicalErrorKind::InvalidNumber);
        assert_eq!(lex_error("0b"), LexicalErrorKind::InvalidNumber);
        assert_eq!(lex_error("0o"), LexicalErrorKind::InvalidNumber);
        assert_eq!(
            lex_error("99999999999999999999999999"),
            LexicalErrorKind::NumberTooLarge
        );
    }

    #[test]
    fn lex_uppercase_radix_prefixes() {
        let arena = Arena::new();
        let sources = SourceManager::with_defaults();
        let mut lexer = Lexer::new(&sources, &arena, LexerOptions::default());
        let stream = lexer.tokenize_source("0XFF 0B11 0O17", "num.gl").unwrap();
        let values: Vec<_> = stream
            .tokens()
            .iter()
            .filter_map(|t| t.value.as_int())
            .collect();
        assert_eq!(values, vec![255, 3, 15]);
    }

    #[test]
    fn lex_strings_with_escapes() {
        let arena = Arena::new();
        let sources = SourceManager::with_defaults();
        let mut lexer = Lexer::new(&sources, &arena, LexerOptions::default());

        let stream = lexer
            .tokenize_source(r#""hello" "a\nb\t\"q\"" "\\\0""#, "str.gl")
            .unwrap();
        let tokens = stream.tokens();

        assert_eq!(tokens[0].value.as_str(), Some("hello"));
        assert_eq!(tokens[1].value.as_str(), Some("a\nb\t\"q\""));
        assert_eq!(tokens[2].value.as_str(), Some("\\\0"));

        // Payloads are interned in the arena, not the source buffer.
        assert!(arena.owns(tokens[0].value.as_str().unwrap().as_ptr()));
    }

    /// Scenario S4: unterminated string aborts tokenization.
    #[test]
    fn lex_unterminated_string() {
        assert_eq!(lex_error("\"unterminated"), LexicalErrorKind::UnterminatedString);
    }

    #[test]
    fn lex_invalid_escape() {
        assert!(matches!(
            lex_error(r#""bad \q escape""#),
            LexicalErrorKind::InvalidEscape('q')
        ));
    }

    #[test]
    fn lex_char_literals() {
        let arena = Arena::new();
        let sources = SourceManager::with_defaults();
        let mut lexer = Lexer::new(&sources, &arena, LexerOptions::default());

        let stream = lexer.tokenize_source(r"'a' '\n' '\''", "ch.gl").unwrap();
        let tokens = stream.tokens();
        assert_eq!(tokens[0].kind, TokenKind::CharLiteral);
        assert_eq!(tokens[0].value.as_str(), Some("a"));
        assert_eq!(tokens[1].value.as_str(), Some("\n"));
        assert_eq!(tokens[2].value.as_str(), Some("'"));

        assert_eq!(lex_error("'a"), LexicalErrorKind::UnterminatedChar);
        assert_eq!(lex_error("'ab'"), LexicalErrorKind::UnterminatedChar);
    }

    #[test]
    fn lex_compound_operators_longest_match() {
        assert_eq!(
            lex_kinds("<<= << <= < <=> >= >> >>= ..= ... .. . :: :"),
            vec![
                TokenKind::LeftShiftAssign,
                TokenKind::LeftShift,
                TokenKind::LessEqual,
                TokenKind::Less,
                TokenKind::Spaceship,
                TokenKind::GreaterEqual,
                TokenKind::RightShift,
                TokenKind::RightShiftAssign,
                TokenKind::DotDotEqual,
                TokenKind::DotDotDot,
                TokenKind::DotDot,
                TokenKind::Dot,
                TokenKind::ColonColon,
                TokenKind::Colon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_operator_families() {
        assert_eq!(
            lex_kinds("+ += - -= -> * *= ** / /= % %= ^ ^= ! != & && &= | || |= = == => ~ ?"),
            vec![
                TokenKind::Plus,
                TokenKind::PlusAssign,
                TokenKind::Minus,
                TokenKind::MinusAssign,
                TokenKind::Arrow,
                TokenKind::Star,
                TokenKind::StarAssign,
                TokenKind::StarStar,
                TokenKind::Slash,
                TokenKind::SlashAssign,
                TokenKind::Percent,
                TokenKind::PercentAssign,
                TokenKind::Caret,
                TokenKind::XorAssign,
                TokenKind::Not,
                TokenKind::NotEqual,
                TokenKind::Ampersand,
                TokenKind::And,
                TokenKind::AndAssign,
                TokenKind::Pipe,
                TokenKind::Or,
                TokenKind::OrAssign,
                TokenKind::Assign,
                TokenKind::Equal,
                TokenKind::FatArrow,
                TokenKind::Tilde,
                TokenKind::Question,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_comments_are_skipped() {
        assert_eq!(
            lex_kinds("a // line comment\nb /* block\ncomment */ c"),
            vec![
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_unterminated_block_comment() {
        // Shares the unterminated-string error path.
        assert_eq!(lex_error("/* never ends"), LexicalErrorKind::UnterminatedString);
    }

    #[test]
    fn lex_preserve_comments() {
        let arena = Arena::new();
        let sources = SourceManager::with_defaults();
        let options = LexerOptions {
            preserve_comments: true,
            ..LexerOptions::default()
        };
        let mut lexer = Lexer::new(&sources, &arena, options);

        let stream = lexer.tokenize_source("x // note\ny", "c.gl").unwrap();
        let kinds: Vec<_> = stream.tokens().iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Identifier,
                TokenKind::Comment,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
        assert_eq!(stream.tokens()[1].value.as_str(), Some("// note"));
    }

    #[test]
    fn lex_preserve_whitespace_emits_newlines() {
        let arena = Arena::new();
        let sources = SourceManager::with_defaults();
        let options = LexerOptions {
            preserve_whitespace: true,
            ..LexerOptions::default()
        };
        let mut lexer = Lexer::new(&sources, &arena, options);

        let stream = lexer.tokenize_source("a\nb\n", "nl.gl").unwrap();
        let kinds: Vec<_> = stream.tokens().iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Identifier,
                TokenKind::Newline,
                TokenKind::Identifier,
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_locations_track_lines_and_columns() {
        let arena = Arena::new();
        let sources = SourceManager::with_defaults();
        let mut lexer = Lexer::new(&sources, &arena, LexerOptions::default());

        let stream = lexer.tokenize_source("ab cd\r\n  ef", "loc.gl").unwrap();
        let tokens = stream.tokens();

        assert_eq!((tokens[0].location.line(), tokens[0].location.column()), (1, 1));
        assert_eq!((tokens[1].location.line(), tokens[1].location.column()), (1, 4));
        assert_eq!((tokens[2].location.line(), tokens[2].location.column()), (2, 3));
        assert_eq!(tokens[2].location.offset(), 9);
    }

    #[test]
    fn lex_token_locations_are_monotonic() {
        let arena = Arena::new();
        let sources = SourceManager::with_defaults();
        let mut lexer = Lexer::new(&sources, &arena, LexerOptions::default());

        let source = "fn main() {\n    let x = 1 + 2;\n    print(x)\n}\n";
        let stream = lexer.tokenize_source(source, "mono.gl").unwrap();
        let locations: Vec<_> = stream
            .tokens()
            .iter()
            .map(|t| (t.location.line(), t.location.column(), t.location.offset()))
            .collect();
        assert!(locations.windows(2).all(|w| w[0] <= w[1]), "{locations:?}");
    }

    #[test]
    fn lex_invalid_character_strict_and_relaxed() {
        assert!(matches!(
            lex_error("x § y"),
            LexicalErrorKind::InvalidCharacter('§')
        ));

        let arena = Arena::new();
        let sources = SourceManager::with_defaults();
        let options = LexerOptions {
            strict_mode: false,
            ..LexerOptions::default()
        };
        let mut lexer = Lexer::new(&sources, &arena, options);
        let stream = lexer.tokenize_source("x § y", "r.gl").unwrap();
        let kinds: Vec<_> = stream.tokens().iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![TokenKind::Identifier, TokenKind::Identifier, TokenKind::Eof]
        );
        assert_eq!(lexer.statistics().errors_recovered, 1);
    }

    #[test]
    fn lex_statistics_accumulate() {
        let arena = Arena::new();
        let sources = SourceManager::with_defaults();
        let mut lexer = Lexer::new(&sources, &arena, LexerOptions::default());

        lexer.tokenize_source("let a = 1\n", "one.gl").unwrap();
        lexer.tokenize_source("let b = 2\n", "two.gl").unwrap();

        let stats = lexer.statistics();
        assert_eq!(stats.tokens_produced, 10); // 4 tokens + EOF, twice
        assert_eq!(stats.bytes_processed, 20);

        lexer.reset_statistics();
        assert_eq!(lexer.statistics().tokens_produced, 0);
    }

    #[test]
    fn lex_streaming_stops_on_false() {
        let arena = Arena::new();
        let mut sources = SourceManager::with_defaults();
        let id = sources
            .load_from_string("stream.gl", "a b c d e".into())
            .unwrap();

        let mut lexer = Lexer::new(&sources, &arena, LexerOptions::default());
        let mut seen = Vec::new();
        lexer
            .tokenize_streaming(id, |token| {
                seen.push(token.kind);
                seen.len() < 3
            })
            .unwrap();
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn lex_missing_file_is_an_error() {
        let arena = Arena::new();
        let sources = SourceManager::with_defaults();
        let mut lexer = Lexer::new(&sources, &arena, LexerOptions::default());
        assert!(lexer.tokenize(FileId::INVALID).is_err());
    }
}
