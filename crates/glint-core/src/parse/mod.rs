// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Parsing: recursive descent for declarations and statements, Pratt
//! climbing for expressions.
//!
//! # Design Philosophy
//!
//! - **Recovery by default** - with `enable_error_recovery` the parser
//!   records the error, skips to a synchronization point, and keeps
//!   going; every error is available afterwards via [`Parser::errors`]
//! - **Precise spans** - every node's range covers its first child
//!   through its last significant token
//! - **Diagnostics are optional** - wire a [`DiagnosticEngine`] with
//!   [`Parser::with_diagnostics`] to get located, coded diagnostics in
//!   addition to the raw error list
//!
//! # Expression precedence
//!
//! Binding strength, loosest to tightest:
//!
//! | Level | Operators | Assoc |
//! |-------|-----------|-------|
//! | 10  | `=` `+=` `-=` `*=` `/=` `%=` `&=` `\|=` `^=` `<<=` `>>=` | right |
//! | 20  | `..` `..=` | left |
//! | 30  | `\|\|` | left |
//! | 40  | `&&` | left |
//! | 50  | `==` `!=` `<=>` | left |
//! | 60  | `<` `>` `<=` `>=` | left |
//! | 70  | `\|` | left |
//! | 80  | `^` | left |
//! | 90  | `&` | left |
//! | 100 | `<<` `>>` | left |
//! | 110 | `+` `-` | left |
//! | 120 | `*` `/` `%` | left |
//! | 130 | `**` | right |
//! | 140 | prefix `+` `-` `!` `~` `&` `*` | — |
//! | 150 | call `(…)` | — |
//!
//! When an operator at precedence `p` is consumed, its right-hand side
//! parses with minimum precedence `p + 1` for left-associative
//! operators and `p` for right-associative ones.

mod error;


pub use error::{ParseError, ParserOptions, RecoveryStrategy};

use crate::ast::{
    BinaryOp, Block, Decl, Expr, FunctionDecl, Parameter, Program, Stmt, UnaryOp, VarDecl,
};
use crate::diagnostics::{DiagnosticEngine, SourceRange};
use crate::lex::{Token, TokenKind, TokenStream};

/// Operator precedence levels for Pratt parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(i32)]
pub enum Precedence {
    None = 0,
    Assignment = 10,
    Range = 20,
    LogicalOr = 30,
    LogicalAnd = 40,
    Equality = 50,
    Comparison = 60,
    BitwiseOr = 70,
    BitwiseXor = 80,
    BitwiseAnd = 90,
    Shift = 100,
    Addition = 110,
    Multiplication = 120,
    Power = 130,
    Unary = 140,
    Postfix = 150,
    Primary = 160,
}

impl Precedence {
    /// Returns the numeric level.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }
}

/// Returns the binary precedence of a token kind, or
/// [`Precedence::None`] for tokens that are not binary operators.
#[must_use]
pub const fn binary_precedence(kind: TokenKind) -> Precedence {
    match kind {
        TokenKind::Assign
        | TokenKind::PlusAssign
        | TokenKind::MinusAssign
        | TokenKind::StarAssign
        | TokenKind::SlashAssign
        | TokenKind::PercentAssign
        | TokenKind::AndAssign
        | TokenKind::OrAssign
        | TokenKind::XorAssign
        | TokenKind::LeftShiftAssign
        | TokenKind::RightShiftAssign => Precedence::Assignment,
        TokenKind::DotDot | TokenKind::DotDotEqual => Precedence::Range,
        TokenKind::Or => Precedence::LogicalOr,
        TokenKind::And => Precedence::LogicalAnd,
        TokenKind::Equal | TokenKind::NotEqual | TokenKind::Spaceship => Precedence::Equality,
        TokenKind::Less | TokenKind::Greater | TokenKind::LessEqual | TokenKind::GreaterEqual => {
            Precedence::Comparison
        }
        TokenKind::Pipe => Precedence::BitwiseOr,
        TokenKind::Caret => Precedence::BitwiseXor,
        TokenKind::Ampersand => Precedence::BitwiseAnd,
        TokenKind::LeftShift | TokenKind::RightShift => Precedence::Shift,
        TokenKind::Plus | TokenKind::Minus => Precedence::Addition,
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Precedence::Multiplication,
        TokenKind::StarStar => Precedence::Power,
        _ => Precedence::None,
    }
}

/// Returns `true` for right-associative operators (assignment, power).
#[must_use]
pub const fn is_right_associative(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Assign
            | TokenKind::PlusAssign
            | TokenKind::MinusAssign
            | TokenKind::StarAssign
            | TokenKind::SlashAssign
            | TokenKind::PercentAssign
            | TokenKind::AndAssign
            | TokenKind::OrAssign
            | TokenKind::XorAssign
            | TokenKind::LeftShiftAssign
            | TokenKind::RightShiftAssign
            | TokenKind::StarStar
    )
}

/// Maps an operator token onto its binary AST operator.
///
/// # Errors
///
/// [`ParseError::ExpectedOperator`] for non-operator kinds.
pub const fn token_to_binary_op(kind: TokenKind) -> Result<BinaryOp, ParseError> {
    let op = match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Mod,
        TokenKind::StarStar => BinaryOp::Pow,
        TokenKind::Equal => BinaryOp::Equal,
        TokenKind::NotEqual => BinaryOp::NotEqual,
        TokenKind::Less => BinaryOp::Less,
        TokenKind::Greater => BinaryOp::Greater,
        TokenKind::LessEqual => BinaryOp::LessEqual,
        TokenKind::GreaterEqual => BinaryOp::GreaterEqual,
        TokenKind::Spaceship => BinaryOp::Spaceship,
        TokenKind::And => BinaryOp::LogicalAnd,
        TokenKind::Or => BinaryOp::LogicalOr,
        TokenKind::Ampersand => BinaryOp::BitwiseAnd,
        TokenKind::Pipe => BinaryOp::BitwiseOr,
        TokenKind::Caret => BinaryOp::BitwiseXor,
        TokenKind::LeftShift => BinaryOp::LeftShift,
        TokenKind::RightShift => BinaryOp::RightShift,
        TokenKind::Assign => BinaryOp::Assign,
        TokenKind::PlusAssign => BinaryOp::AddAssign,
        TokenKind::MinusAssign => BinaryOp::SubAssign,
        TokenKind::StarAssign => BinaryOp::MulAssign,
        TokenKind::SlashAssign => BinaryOp::DivAssign,
        TokenKind::PercentAssign => BinaryOp::ModAssign,
        TokenKind::AndAssign => BinaryOp::AndAssign,
        TokenKind::OrAssign => BinaryOp::OrAssign,
        TokenKind::XorAssign => BinaryOp::XorAssign,
        TokenKind::LeftShiftAssign => BinaryOp::ShlAssign,
        TokenKind::RightShiftAssign => BinaryOp::ShrAssign,
        TokenKind::DotDot => BinaryOp::Range,
        TokenKind::DotDotEqual => BinaryOp::RangeInclusive,
        _ => return Err(ParseError::ExpectedOperator),
    };
    Ok(op)
}

/// Maps an operator token onto its prefix unary AST operator.
///
/// # Errors
///
/// [`ParseError::ExpectedOperator`] for non-prefix kinds.
pub const fn token_to_unary_op(kind: TokenKind) -> Result<UnaryOp, ParseError> {
    let op = match kind {
        TokenKind::Plus => UnaryOp::Plus,
        TokenKind::Minus => UnaryOp::Minus,
        TokenKind::Not => UnaryOp::Not,
        TokenKind::Tilde => UnaryOp::BitwiseNot,
        TokenKind::Star => UnaryOp::Dereference,
        TokenKind::Ampersand => UnaryOp::AddressOf,
        _ => return Err(ParseError::ExpectedOperator),
    };
    Ok(op)
}

/// The Glint parser.
///
/// Owns its token stream; optionally wired to a [`DiagnosticEngine`]
/// for located diagnostics.
pub struct Parser<'a, 'e> {
    tokens: TokenStream<'a>,
    options: ParserOptions,
    recursion_depth: usize,
    errors: Vec<ParseError>,
    diagnostics: Option<&'e mut DiagnosticEngine<'a>>,
}

impl<'a, 'e> Parser<'a, 'e> {
    /// Creates a parser over a token stream.
    #[must_use]
    pub fn new(tokens: TokenStream<'a>, options: ParserOptions) -> Self {
        Self {
            tokens,
            options,
            recursion_depth: 0,
            errors: Vec::new(),
            diagnostics: None,
        }
    }

    /// Wires a diagnostic engine; every parse error is also reported
    /// there with the offending token's location.
    #[must_use]
    pub fn with_diagnostics(mut self, engine: &'e mut DiagnosticEngine<'a>) -> Self {
        self.diagnostics = Some(engine);
        self
    }

    /// Returns all parse errors recorded so far.
    #[must_use]
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// Returns `true` if any errors were recorded.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Clears the recorded errors (for parser reuse).
    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    // ========================================================================
    // Entry points
    // ========================================================================

    /// Parses a complete program: declarations until EOF.
    ///
    /// With recovery enabled, a failed declaration synchronizes and the
    /// loop continues; the first error is still returned if nothing
    /// could be parsed at all.
    ///
    /// # Errors
    ///
    /// The first [`ParseError`] when recovery is disabled or fails.
    pub fn parse_program(&mut self) -> Result<Program<'a>, ParseError> {
        let start = self.tokens.current().location;
        let declarations = self.parse_declarations()?;
        let range = SourceRange::new(start, self.tokens.current().location);
        Ok(Program::new(declarations, range))
    }

    /// Parses a single expression (REPL / test entry point).
    ///
    /// # Errors
    ///
    /// The first [`ParseError`] encountered.
    pub fn parse_expression(&mut self) -> Result<Expr<'a>, ParseError> {
        self.parse_expr(Precedence::None.as_i32())
    }

    /// Parses a single statement: block, `let` declaration, or
    /// expression statement (with optional trailing semicolon).
    ///
    /// # Errors
    ///
    /// The first [`ParseError`] encountered.
    pub fn parse_statement(&mut self) -> Result<Stmt<'a>, ParseError> {
        match self.tokens.current().kind {
            TokenKind::Eof => {
                self.report_error(ParseError::ExpectedStatement);
                Err(ParseError::ExpectedStatement)
            }
            TokenKind::LeftBrace => Ok(Stmt::Block(self.parse_block()?)),
            TokenKind::KwLet => Ok(Stmt::VarDecl(self.parse_var_decl()?)),
            _ => {
                let start = self.tokens.current().location;
                let expr = self.parse_expression()?;
                self.match_token(TokenKind::Semicolon);
                let range = SourceRange::new(start, self.tokens.current().location);
                Ok(Stmt::Expr { expr, range })
            }
        }
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    fn parse_declarations(&mut self) -> Result<Vec<Decl<'a>>, ParseError> {
        let mut declarations = Vec::new();

        while !self.tokens.is_eof() && self.tokens.current().kind != TokenKind::RightBrace {
            let before = self.tokens.position();
            match self.parse_declaration() {
                Ok(decl) => declarations.push(decl),
                Err(error) => {
                    if self.options.enable_error_recovery {
                        self.recover(RecoveryStrategy::Synchronize);
                        self.ensure_progress(before);
                        continue;
                    }
                    return Err(error);
                }
            }
        }

        Ok(declarations)
    }

    fn parse_declaration(&mut self) -> Result<Decl<'a>, ParseError> {
        match self.tokens.current().kind {
            TokenKind::KwFn => Ok(Decl::Function(self.parse_function_decl()?)),
            _ => {
                self.report_error(ParseError::ExpectedDeclaration);
                Err(ParseError::ExpectedDeclaration)
            }
        }
    }

    fn parse_function_decl(&mut self) -> Result<FunctionDecl<'a>, ParseError> {
        let start = self.tokens.current().location;

        self.consume(TokenKind::KwFn)?;
        let name = self.parse_identifier_name()?;
        let parameters = self.parse_function_parameters()?;

        let return_type = if self.match_token(TokenKind::Arrow) {
            if self.tokens.current().kind != TokenKind::Identifier {
                self.report_error(ParseError::InvalidReturnType);
                return Err(ParseError::InvalidReturnType);
            }
            Some(self.parse_type()?)
        } else {
            None
        };

        if self.tokens.current().kind != TokenKind::LeftBrace {
            self.report_error(ParseError::MissingFunctionBody);
            return Err(ParseError::MissingFunctionBody);
        }
        let body = self.parse_block()?;

        let range = SourceRange::new(start, self.tokens.current().location);
        Ok(FunctionDecl {
            name,
            parameters,
            return_type,
            body,
            range,
        })
    }

    fn parse_function_parameters(&mut self) -> Result<Vec<Parameter<'a>>, ParseError> {
        self.consume(TokenKind::LeftParen)?;

        let mut parameters: Vec<Parameter<'a>> = Vec::new();
        while self.tokens.current().kind != TokenKind::RightParen && !self.tokens.is_eof() {
            let parameter = self.parse_parameter()?;
            if parameters.iter().any(|p| p.name == parameter.name) {
                // Recorded but not fatal: the declaration still parses.
                self.report_error(ParseError::DuplicateParameter);
            }
            parameters.push(parameter);

            if self.match_token(TokenKind::Comma) {
                if self.tokens.current().kind == TokenKind::RightParen {
                    // Trailing commas are rejected.
                    self.report_error(ParseError::ExpectedIdentifier);
                    return Err(ParseError::ExpectedIdentifier);
                }
            } else if self.tokens.current().kind != TokenKind::RightParen {
                self.report_error(ParseError::MissingDelimiter);
                return Err(ParseError::MissingDelimiter);
            }
        }

        self.consume_closing(TokenKind::RightParen)?;
        Ok(parameters)
    }

    fn parse_parameter(&mut self) -> Result<Parameter<'a>, ParseError> {
        let start = self.tokens.current().location;
        let name = self.parse_identifier_name()?;
        self.consume(TokenKind::Colon)?;
        let ty = self.parse_type()?;
        let range = SourceRange::new(start, self.tokens.current().location);
        Ok(Parameter { name, ty, range })
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn parse_block(&mut self) -> Result<Block<'a>, ParseError> {
        let start = self.tokens.current().location;
        self.consume(TokenKind::LeftBrace)?;
        let statements = self.parse_statement_list()?;
        self.consume_closing(TokenKind::RightBrace)?;
        let range = SourceRange::new(start, self.tokens.current().location);
        Ok(Block::new(statements, range))
    }

    fn parse_statement_list(&mut self) -> Result<Vec<Stmt<'a>>, ParseError> {
        let mut statements = Vec::new();

        while self.tokens.current().kind != TokenKind::RightBrace && !self.tokens.is_eof() {
            match self.tokens.current().kind {
                // Stray separators inside a block are skipped.
                TokenKind::Newline | TokenKind::Semicolon => {
                    self.tokens.advance();
                }
                TokenKind::LeftBrace => {
                    let before = self.tokens.position();
                    match self.parse_block() {
                        Ok(block) => statements.push(Stmt::Block(block)),
                        Err(error) => {
                            if self.options.enable_error_recovery {
                                self.recover(RecoveryStrategy::Synchronize);
                                self.ensure_progress(before);
                                continue;
                            }
                            return Err(error);
                        }
                    }
                }
                TokenKind::KwLet => {
                    let before = self.tokens.position();
                    match self.parse_var_decl() {
                        Ok(decl) => statements.push(Stmt::VarDecl(decl)),
                        Err(error) => {
                            if self.options.enable_error_recovery {
                                self.recover(RecoveryStrategy::Synchronize);
                                self.ensure_progress(before);
                                continue;
                            }
                            return Err(error);
                        }
                    }
                }
                _ => {
                    let start = self.tokens.current().location;
                    let before = self.tokens.position();
                    match self.parse_expr(Precedence::None.as_i32()) {
                        Ok(expr) => {
                            self.match_token(TokenKind::Semicolon);
                            let range = SourceRange::new(start, self.tokens.current().location);
                            statements.push(Stmt::Expr { expr, range });
                        }
                        Err(error) => {
                            if self.options.enable_error_recovery {
                                self.recover(RecoveryStrategy::Synchronize);
                                self.ensure_progress(before);
                                continue;
                            }
                            return Err(error);
                        }
                    }
                }
            }
        }

        Ok(statements)
    }

    fn parse_var_decl(&mut self) -> Result<VarDecl<'a>, ParseError> {
        let start = self.tokens.current().location;
        self.consume(TokenKind::KwLet)?;

        let is_mutable = self.match_token(TokenKind::KwMut);
        let name = self.parse_identifier_name()?;

        let ty = if self.match_token(TokenKind::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };

        let init = if self.match_token(TokenKind::Assign) {
            Some(self.parse_expr(Precedence::None.as_i32())?)
        } else {
            None
        };

        let range = SourceRange::new(start, self.tokens.current().location);
        Ok(VarDecl {
            name,
            ty,
            init,
            is_mutable,
            range,
        })
    }

    // ========================================================================
    // Expressions (Pratt)
    // ========================================================================

    fn parse_expr(&mut self, min_precedence: i32) -> Result<Expr<'a>, ParseError> {
        self.enter_recursion()?;
        let result = self.parse_expr_inner(min_precedence);
        self.exit_recursion();
        result
    }

    fn parse_expr_inner(&mut self, min_precedence: i32) -> Result<Expr<'a>, ParseError> {
        let mut left = self.parse_prefix()?;
        left = self.parse_postfix(left)?;

        while !self.tokens.is_eof() {
            let precedence = binary_precedence(self.tokens.current().kind).as_i32();
            if precedence == Precedence::None.as_i32() || precedence < min_precedence {
                break;
            }

            let op_token = *self.tokens.current();
            self.tokens.advance();

            // Left-associative operators raise the bar for their
            // right-hand side; right-associative ones do not.
            let next_min = if is_right_associative(op_token.kind) {
                precedence
            } else {
                precedence + 1
            };
            let right = self.parse_expr(next_min)?;

            let op = match token_to_binary_op(op_token.kind) {
                Ok(op) => op,
                Err(error) => {
                    self.report_error(error);
                    return Err(error);
                }
            };

            if matches!(
                op,
                BinaryOp::Assign
                    | BinaryOp::AddAssign
                    | BinaryOp::SubAssign
                    | BinaryOp::MulAssign
                    | BinaryOp::DivAssign
                    | BinaryOp::ModAssign
                    | BinaryOp::AndAssign
                    | BinaryOp::OrAssign
                    | BinaryOp::XorAssign
                    | BinaryOp::ShlAssign
                    | BinaryOp::ShrAssign
            ) && !is_assignable(&left)
            {
                self.report_error(ParseError::InvalidAssignment);
                return Err(ParseError::InvalidAssignment);
            }

            let range = left.source_range().merge(&right.source_range());
            left = Expr::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
                range,
            };
        }

        Ok(left)
    }

    fn parse_prefix(&mut self) -> Result<Expr<'a>, ParseError> {
        match self.tokens.current().kind {
            TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Not
            | TokenKind::Tilde
            | TokenKind::Ampersand
            | TokenKind::Star => {
                let op_token = *self.tokens.current();
                self.tokens.advance();

                let op = match token_to_unary_op(op_token.kind) {
                    Ok(op) => op,
                    Err(error) => {
                        self.report_error(error);
                        return Err(error);
                    }
                };
                let operand = self.parse_expr(Precedence::Unary.as_i32())?;
                let range = SourceRange::new(op_token.location, operand.source_range().end());
                Ok(Expr::Unary {
                    op,
                    operand: Box::new(operand),
                    range,
                })
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr<'a>, ParseError> {
        match self.tokens.current().kind {
            TokenKind::IntegerLiteral
            | TokenKind::FloatLiteral
            | TokenKind::StringLiteral
            | TokenKind::BoolLiteral => self.parse_literal(),

            TokenKind::Identifier => {
                let token = *self.tokens.current();
                self.tokens.advance();
                Ok(Expr::Identifier {
                    name: token.text(),
                    range: SourceRange::point(token.location),
                })
            }

            TokenKind::LeftParen => {
                self.tokens.advance();
                let expr = self.parse_expr(Precedence::None.as_i32())?;
                if !self.match_token(TokenKind::RightParen) {
                    self.report_error(ParseError::MissingDelimiter);
                    return Err(ParseError::MissingDelimiter);
                }
                Ok(expr)
            }

            TokenKind::Eof => {
                self.report_error(ParseError::UnexpectedEof);
                Err(ParseError::UnexpectedEof)
            }

            _ => {
                self.report_error(ParseError::ExpectedExpression);
                Err(ParseError::ExpectedExpression)
            }
        }
    }

    fn parse_postfix(&mut self, mut left: Expr<'a>) -> Result<Expr<'a>, ParseError> {
        while self.tokens.current().kind == TokenKind::LeftParen {
            left = self.parse_call(left)?;
        }
        Ok(left)
    }

    fn parse_call(&mut self, callee: Expr<'a>) -> Result<Expr<'a>, ParseError> {
        self.consume(TokenKind::LeftParen)?;

        let mut args = Vec::new();
        while self.tokens.current().kind != TokenKind::RightParen && !self.tokens.is_eof() {
            args.push(self.parse_expr(Precedence::None.as_i32())?);

            if self.match_token(TokenKind::Comma) {
                if self.tokens.current().kind == TokenKind::RightParen {
                    // Trailing commas are rejected.
                    self.report_error(ParseError::ExpectedExpression);
                    return Err(ParseError::ExpectedExpression);
                }
            } else if self.tokens.current().kind != TokenKind::RightParen {
                self.report_error(ParseError::MissingDelimiter);
                return Err(ParseError::MissingDelimiter);
            }
        }

        self.consume_closing(TokenKind::RightParen)?;

        let range = SourceRange::new(
            callee.source_range().start(),
            self.tokens.current().location,
        );
        Ok(Expr::Call {
            callee: Box::new(callee),
            args,
            range,
        })
    }

    fn parse_literal(&mut self) -> Result<Expr<'a>, ParseError> {
        let token = *self.tokens.current();
        let range = SourceRange::point(token.location);
        self.tokens.advance();

        let expr = match token.kind {
            TokenKind::IntegerLiteral => token.value.as_int().map(|value| Expr::Integer { value, range }),
            TokenKind::FloatLiteral => token.value.as_float().map(|value| Expr::Float { value, range }),
            TokenKind::StringLiteral => token.value.as_str().map(|value| Expr::Str { value, range }),
            TokenKind::BoolLiteral => token.value.as_bool().map(|value| Expr::Bool { value, range }),
            _ => None,
        };

        expr.ok_or_else(|| {
            self.report_error(ParseError::InvalidLiteral);
            ParseError::InvalidLiteral
        })
    }

    /// Types are parsed as identifiers; a richer type grammar is out of
    /// scope for this stage.
    fn parse_type(&mut self) -> Result<Expr<'a>, ParseError> {
        if self.tokens.current().kind != TokenKind::Identifier {
            self.report_error(ParseError::ExpectedType);
            return Err(ParseError::ExpectedType);
        }
        let token = *self.tokens.current();
        self.tokens.advance();
        Ok(Expr::Identifier {
            name: token.text(),
            range: SourceRange::point(token.location),
        })
    }

    // ========================================================================
    // Token management
    // ========================================================================

    fn parse_identifier_name(&mut self) -> Result<&'a str, ParseError> {
        if self.tokens.current().kind != TokenKind::Identifier {
            self.report_error(ParseError::ExpectedIdentifier);
            return Err(ParseError::ExpectedIdentifier);
        }
        let token = *self.tokens.current();
        self.tokens.advance();
        Ok(token.text())
    }

    fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.tokens.current().kind == kind {
            self.tokens.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, expected: TokenKind) -> Result<Token<'a>, ParseError> {
        if self.tokens.current().kind != expected {
            self.report_error(ParseError::UnexpectedToken);
            return Err(ParseError::UnexpectedToken);
        }
        let token = *self.tokens.current();
        self.tokens.advance();
        Ok(token)
    }

    /// Consumes a closing delimiter, distinguishing "ran out of input"
    /// from "found something else".
    fn consume_closing(&mut self, expected: TokenKind) -> Result<Token<'a>, ParseError> {
        if self.tokens.is_eof() && self.tokens.current().kind != expected {
            self.report_error(ParseError::UnexpectedEof);
            return Err(ParseError::UnexpectedEof);
        }
        self.consume(expected)
    }

    // ========================================================================
    // Error handling & recovery
    // ========================================================================

    fn report_error(&mut self, error: ParseError) {
        self.errors.push(error);
        let location = self.tokens.current().location;
        if let Some(engine) = self.diagnostics.as_deref_mut() {
            engine.error(error.diagnostic_code(), error.to_string(), location);
        }
    }

    fn recover(&mut self, strategy: RecoveryStrategy) {
        match strategy {
            RecoveryStrategy::Skip => {
                if !self.tokens.is_eof() {
                    self.tokens.advance();
                }
            }
            RecoveryStrategy::Synchronize => self.synchronize(),
            RecoveryStrategy::Insert | RecoveryStrategy::Abort => {}
        }
    }

    /// Skips forward to the next synchronization point (without
    /// consuming it). Callers that loop must pair this with
    /// [`Parser::ensure_progress`], since the parser may fail while
    /// already positioned at a synchronization point.
    fn synchronize(&mut self) {
        while !self.tokens.is_eof() && !self.is_synchronization_point() {
            self.tokens.advance();
        }
    }

    /// Forces the cursor forward when a recovery pass consumed nothing,
    /// so repeated failures at one token cannot loop.
    fn ensure_progress(&mut self, before: usize) {
        if self.tokens.position() == before && !self.tokens.is_eof() {
            self.tokens.advance();
        }
    }

    fn is_synchronization_point(&self) -> bool {
        matches!(
            self.tokens.current().kind,
            TokenKind::KwFn
                | TokenKind::KwStruct
                | TokenKind::KwEnum
                | TokenKind::KwTrait
                | TokenKind::KwImpl
                | TokenKind::KwLet
                | TokenKind::KwConst
                | TokenKind::LeftBrace
                | TokenKind::RightBrace
                | TokenKind::Semicolon
        )
    }

    fn enter_recursion(&mut self) -> Result<(), ParseError> {
        if self.recursion_depth >= self.options.max_recursion_depth {
            self.report_error(ParseError::NestedTooDeep);
            return Err(ParseError::NestedTooDeep);
        }
        self.recursion_depth += 1;
        Ok(())
    }

    fn exit_recursion(&mut self) {
        self.recursion_depth = self.recursion_depth.saturating_sub(1);
    }
}

/// Returns `true` for expressions that can appear on the left of an
/// assignment: names and dereferences.
fn is_assignable(expr: &Expr<'_>) -> bool {
    matches!(
        expr,
        Expr::Identifier { .. }
            | Expr::Unary {
                op: UnaryOp::Dereference,
                ..
            }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use crate::ast::NodeKind;
    use crate::diagnostics::DiagnosticCategory;
    use crate::lex::{Lexer, LexerOptions};
    use crate::source::SourceManager;

    fn parse_expr_text(source: &str) -> Result<String, ParseError> {
        let arena = Arena::new();
        let sources = SourceManager::with_defaults();
        let mut lexer = Lexer::new(&sources, &arena, LexerOptions::default());
        let tokens = lexer.tokenize_source(source, "expr.gl").unwrap();
        let mut parser = Parser::new(tokens, ParserOptions::default());
        parser.parse_expression().map(|expr| expr.to_string())
    }

    fn parse_program_text(source: &str) -> (Result<String, ParseError>, Vec<ParseError>) {
        let arena = Arena::new();
        let sources = SourceManager::with_defaults();
        let mut lexer = Lexer::new(&sources, &arena, LexerOptions::default());
        let tokens = lexer.tokenize_source(source, "prog.gl").unwrap();
        let mut parser = Parser::new(tokens, ParserOptions::default());
        let result = parser.parse_program().map(|program| program.to_string());
        (result, parser.errors().to_vec())
    }

    /// Scenario S1: function declaration shape.
    #[test]
    fn parse_function_declaration() {
        let arena = Arena::new();
        let sources = SourceManager::with_defaults();
        let mut lexer = Lexer::new(&sources, &arena, LexerOptions::default());
        let tokens = lexer
            .tokenize_source("fn add(a: i32, b: i32) -> i32 { a + b }", "s1.gl")
            .unwrap();
        let mut parser = Parser::new(tokens, ParserOptions::default());
        let program = parser.parse_program().unwrap();

        assert!(!parser.has_errors());
        assert_eq!(program.declarations.len(), 1);
        assert_eq!(program.kind(), NodeKind::Program);

        let Decl::Function(function) = &program.declarations[0];
        assert_eq!(function.name, "add");
        assert_eq!(function.kind(), NodeKind::FunctionDecl);
        assert_eq!(function.parameters.len(), 2);
        assert_eq!(function.parameters[0].name, "a");
        assert_eq!(function.parameters[0].ty.as_identifier(), Some("i32"));
        assert_eq!(function.parameters[1].name, "b");
        assert_eq!(
            function.return_type.as_ref().and_then(Expr::as_identifier),
            Some("i32")
        );
        assert_eq!(function.body.statements.len(), 1);
        assert_eq!(function.body.statements[0].to_string(), "(a + b)");
    }

    /// Scenario S2: multiplication binds tighter than addition.
    #[test]
    fn parse_precedence_mul_over_add() {
        assert_eq!(parse_expr_text("1 + 2 * 3 + 4").unwrap(), "((1 + (2 * 3)) + 4)");
    }

    /// Scenario S3: power is right-associative.
    #[test]
    fn parse_power_right_associative() {
        assert_eq!(parse_expr_text("2 ** 3 ** 2").unwrap(), "(2 ** (3 ** 2))");
    }

    #[test]
    fn parse_left_associativity() {
        assert_eq!(parse_expr_text("1 - 2 - 3").unwrap(), "((1 - 2) - 3)");
        assert_eq!(parse_expr_text("8 / 4 / 2").unwrap(), "((8 / 4) / 2)");
    }

    #[test]
    fn parse_assignment_right_associative() {
        assert_eq!(parse_expr_text("a = b = c").unwrap(), "(a = (b = c))");
        assert_eq!(parse_expr_text("a += b + 1").unwrap(), "(a += (b + 1))");
        assert_eq!(parse_expr_text("a <<= 2").unwrap(), "(a <<= 2)");
    }

    #[test]
    fn parse_invalid_assignment_target() {
        let err = parse_expr_text("1 = 2").unwrap_err();
        assert_eq!(err, ParseError::InvalidAssignment);
    }

    #[test]
    fn parse_precedence_ladder() {
        // Comparison over logical, shift over addition, bitwise levels.
        assert_eq!(
            parse_expr_text("a < b && c > d").unwrap(),
            "((a < b) && (c > d))"
        );
        assert_eq!(parse_expr_text("1 << 2 + 3").unwrap(), "(1 << (2 + 3))");
        assert_eq!(
            parse_expr_text("a | b ^ c & d").unwrap(),
            "(a | (b ^ (c & d)))"
        );
        assert_eq!(parse_expr_text("1 .. n + 1").unwrap(), "(1 .. (n + 1))");
        assert_eq!(parse_expr_text("0 ..= max").unwrap(), "(0 ..= max)");
        assert_eq!(parse_expr_text("a <=> b == c").unwrap(), "((a <=> b) == c)");
    }

    /// Parenthesization: `(e)` produces the same tree as `e`.
    #[test]
    fn parse_parens_are_transparent() {
        assert_eq!(parse_expr_text("(1 + 2)").unwrap(), parse_expr_text("1 + 2").unwrap());
        assert_eq!(parse_expr_text("((x))").unwrap(), "x");
        // Explicit grouping overrides precedence.
        assert_eq!(parse_expr_text("(1 + 2) * 3").unwrap(), "((1 + 2) * 3)");
    }

    #[test]
    fn parse_unary_operators() {
        assert_eq!(parse_expr_text("-x").unwrap(), "(-x)");
        assert_eq!(parse_expr_text("!done").unwrap(), "(!done)");
        assert_eq!(parse_expr_text("~bits").unwrap(), "(~bits)");
        assert_eq!(parse_expr_text("&value").unwrap(), "(&value)");
        assert_eq!(parse_expr_text("*ptr").unwrap(), "(*ptr)");
        assert_eq!(parse_expr_text("--x").unwrap(), "(-(-x))");
        // Unary binds tighter than binary.
        assert_eq!(parse_expr_text("-a + b").unwrap(), "((-a) + b)");
        assert_eq!(parse_expr_text("-a ** b").unwrap(), "((-a) ** b)");
    }

    #[test]
    fn parse_calls() {
        assert_eq!(parse_expr_text("f()").unwrap(), "f()");
        assert_eq!(parse_expr_text("max(1, 2 + 3)").unwrap(), "max(1, (2 + 3))");
        assert_eq!(parse_expr_text("f(x)(y)").unwrap(), "f(x)(y)");
        assert_eq!(parse_expr_text("f(x) + 1").unwrap(), "(f(x) + 1)");
        assert_eq!(parse_expr_text("-f(x)").unwrap(), "(-f(x))");
    }

    #[test]
    fn parse_call_argument_errors() {
        assert_eq!(
            parse_expr_text("f(1,)").unwrap_err(),
            ParseError::ExpectedExpression
        );
        assert_eq!(
            parse_expr_text("f(1 2)").unwrap_err(),
            ParseError::MissingDelimiter
        );
        assert_eq!(
            parse_expr_text("(1 + 2").unwrap_err(),
            ParseError::MissingDelimiter
        );
    }

    #[test]
    fn parse_literals() {
        assert_eq!(parse_expr_text("42").unwrap(), "42");
        assert_eq!(parse_expr_text("3.14").unwrap(), "3.14");
        assert_eq!(parse_expr_text("\"hi\"").unwrap(), "\"hi\"");
        assert_eq!(parse_expr_text("true").unwrap(), "true");
        assert_eq!(parse_expr_text("false").unwrap(), "false");
    }

    #[test]
    fn parse_var_decl_forms() {
        let arena = Arena::new();
        let sources = SourceManager::with_defaults();
        let mut lexer = Lexer::new(&sources, &arena, LexerOptions::default());
        let tokens = lexer
            .tokenize_source(
                "fn f() { let a\nlet mut b: i64\nlet c = 1\nlet mut d: f64 = 2.5 }",
                "let.gl",
            )
            .unwrap();
        let mut parser = Parser::new(tokens, ParserOptions::default());
        let program = parser.parse_program().unwrap();
        assert!(!parser.has_errors());

        let Decl::Function(function) = &program.declarations[0];
        let rendered: Vec<String> = function
            .body
            .statements
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            rendered,
            vec![
                "let a",
                "let mut b: i64",
                "let c = 1",
                "let mut d: f64 = 2.5",
            ]
        );
    }

    #[test]
    fn parse_statement_dispatch() {
        let arena = Arena::new();
        let sources = SourceManager::with_defaults();
        let mut lexer = Lexer::new(&sources, &arena, LexerOptions::default());

        let tokens = lexer.tokenize_source("{ let x = 1; x + 1 }", "st.gl").unwrap();
        let mut parser = Parser::new(tokens, ParserOptions::default());
        let stmt = parser.parse_statement().unwrap();
        assert_eq!(stmt.kind(), NodeKind::Block);

        let tokens = lexer.tokenize_source("let y = 2", "st2.gl").unwrap();
        let mut parser = Parser::new(tokens, ParserOptions::default());
        let stmt = parser.parse_statement().unwrap();
        assert_eq!(stmt.kind(), NodeKind::VarDecl);

        let tokens = lexer.tokenize_source("y + 1;", "st3.gl").unwrap();
        let mut parser = Parser::new(tokens, ParserOptions::default());
        let stmt = parser.parse_statement().unwrap();
        assert_eq!(stmt.kind(), NodeKind::ExprStmt);
        assert!(parser.tokens.is_eof(), "trailing semicolon is consumed");
    }

    #[test]
    fn parse_program_with_multiple_declarations() {
        let (result, errors) = parse_program_text(
            "fn one() -> i32 { 1 }\n\nfn two(x: i32) { let y = x * 2\n print(y) }",
        );
        assert!(errors.is_empty());
        assert_eq!(
            result.unwrap(),
            "fn one() -> i32 {\n  1;\n}\n\nfn two(x: i32) {\n  let y = (x * 2);\n  print(y);\n}"
        );
    }

    #[test]
    fn parse_declaration_errors() {
        let (_, errors) = parse_program_text("let x = 1");
        assert_eq!(errors[0], ParseError::ExpectedDeclaration);

        let (_, errors) = parse_program_text("fn 42() {}");
        assert_eq!(errors[0], ParseError::ExpectedIdentifier);

        let (_, errors) = parse_program_text("fn f() -> 42 {}");
        assert_eq!(errors[0], ParseError::InvalidReturnType);

        let (_, errors) = parse_program_text("fn f()");
        assert_eq!(errors[0], ParseError::MissingFunctionBody);

        let (_, errors) = parse_program_text("fn f(a: i32,) {}");
        assert!(errors.contains(&ParseError::ExpectedIdentifier));

        let (_, errors) = parse_program_text("fn f(a: i32, a: i32) {}");
        assert!(errors.contains(&ParseError::DuplicateParameter));
    }

    #[test]
    fn parse_recovery_continues_after_bad_declaration() {
        let (result, errors) = parse_program_text("fn broken( fn ok() { 1 }");
        // The first declaration fails, the parser synchronizes at the
        // next `fn` and parses it.
        assert!(!errors.is_empty());
        let rendered = result.unwrap();
        assert!(rendered.contains("fn ok()"), "{rendered}");
    }

    #[test]
    fn parse_without_recovery_stops_at_first_error() {
        let arena = Arena::new();
        let sources = SourceManager::with_defaults();
        let mut lexer = Lexer::new(&sources, &arena, LexerOptions::default());
        let tokens = lexer.tokenize_source("fn broken( fn ok() { 1 }", "nr.gl").unwrap();
        let options = ParserOptions {
            enable_error_recovery: false,
            ..ParserOptions::default()
        };
        let mut parser = Parser::new(tokens, options);
        assert!(parser.parse_program().is_err());
        assert_eq!(parser.errors().len(), 1);
    }

    #[test]
    fn parse_recursion_depth_guard() {
        let arena = Arena::new();
        let sources = SourceManager::with_defaults();
        let mut lexer = Lexer::new(&sources, &arena, LexerOptions::default());

        let deep = format!("{}1{}", "(".repeat(64), ")".repeat(64));
        let tokens = lexer.tokenize_source(&deep, "deep.gl").unwrap();
        let options = ParserOptions {
            max_recursion_depth: 16,
            ..ParserOptions::default()
        };
        let mut parser = Parser::new(tokens, options);
        assert_eq!(parser.parse_expression().unwrap_err(), ParseError::NestedTooDeep);

        // The default depth is plenty for the same input.
        let tokens = lexer.tokenize_source(&deep, "deep2.gl").unwrap();
        let mut parser = Parser::new(tokens, ParserOptions::default());
        assert!(parser.parse_expression().is_ok());
    }

    #[test]
    fn parse_errors_accumulate_and_clear() {
        let arena = Arena::new();
        let sources = SourceManager::with_defaults();
        let mut lexer = Lexer::new(&sources, &arena, LexerOptions::default());
        let tokens = lexer.tokenize_source("} }", "err.gl").unwrap();
        let mut parser = Parser::new(tokens, ParserOptions::default());

        // `}` at top level ends the declaration loop immediately.
        let program = parser.parse_program().unwrap();
        assert!(program.declarations.is_empty());

        parser.tokens.reset();
        assert!(parser.parse_expression().is_err());
        assert!(parser.has_errors());

        parser.clear_errors();
        assert!(!parser.has_errors());
    }

    #[test]
    fn parse_reports_into_diagnostic_engine() {
        let arena = Arena::new();
        let sources = SourceManager::with_defaults();
        let mut lexer = Lexer::new(&sources, &arena, LexerOptions::default());
        let tokens = lexer.tokenize_source("fn f( {", "diag.gl").unwrap();

        let mut engine = DiagnosticEngine::new(&arena, 0);
        let mut parser = Parser::new(tokens, ParserOptions::default()).with_diagnostics(&mut engine);
        let _ = parser.parse_program();

        assert!(parser.has_errors());
        assert!(engine.has_errors());
        let diag = &engine.diagnostics()[0];
        assert_eq!(diag.code().category(), DiagnosticCategory::Syntax);
        assert_eq!(diag.primary().location().filename(), "diag.gl");
        assert!(diag.primary().location().is_valid());
    }

    #[test]
    fn parse_expression_statements_are_kept() {
        let (result, errors) = parse_program_text("fn f() { 1 + 2; g() }");
        assert!(errors.is_empty());
        assert_eq!(result.unwrap(), "fn f() {\n  (1 + 2);\n  g();\n}");
    }

    #[test]
    fn parse_nested_blocks() {
        let (result, errors) = parse_program_text("fn f() { { let x = 1 } }");
        assert!(errors.is_empty());
        assert_eq!(result.unwrap(), "fn f() {\n  {\n    let x = 1;\n  }\n}");
    }

    #[test]
    fn parse_spans_cover_constructs() {
        let arena = Arena::new();
        let sources = SourceManager::with_defaults();
        let mut lexer = Lexer::new(&sources, &arena, LexerOptions::default());
        let tokens = lexer.tokenize_source("1 + 23", "span.gl").unwrap();
        let mut parser = Parser::new(tokens, ParserOptions::default());
        let expr = parser.parse_expression().unwrap();

        let range = expr.source_range();
        assert_eq!(range.start().offset(), 0);
        assert_eq!(range.start().column(), 1);
        // The range reaches the last operand's location.
        assert_eq!(range.end().column(), 5);
        assert_eq!(expr.kind(), NodeKind::BinaryExpr);
    }
}
