// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Parser error kinds, recovery strategies, and configuration.

use thiserror::Error;

use crate::diagnostics::DiagnosticCode;

/// Errors reported by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ParseError {
    #[error("unexpected token")]
    UnexpectedToken,
    #[error("unexpected end of file")]
    UnexpectedEof,
    #[error("expected an expression")]
    ExpectedExpression,
    #[error("expected a statement")]
    ExpectedStatement,
    #[error("expected a declaration")]
    ExpectedDeclaration,
    #[error("expected an identifier")]
    ExpectedIdentifier,
    #[error("expected a type")]
    ExpectedType,
    #[error("expected an operator")]
    ExpectedOperator,
    #[error("invalid syntax")]
    InvalidSyntax,
    #[error("missing delimiter")]
    MissingDelimiter,
    #[error("invalid literal")]
    InvalidLiteral,
    #[error("expression nested too deeply")]
    NestedTooDeep,
    #[error("invalid assignment target")]
    InvalidAssignment,
    #[error("duplicate parameter name")]
    DuplicateParameter,
    #[error("invalid return type")]
    InvalidReturnType,
    #[error("missing function body")]
    MissingFunctionBody,
}

impl ParseError {
    /// Maps the parse error onto its syntax-category diagnostic code.
    #[must_use]
    pub const fn diagnostic_code(self) -> DiagnosticCode {
        match self {
            Self::UnexpectedToken | Self::UnexpectedEof => DiagnosticCode::SyntaxUnexpectedToken,
            Self::MissingDelimiter | Self::MissingFunctionBody => DiagnosticCode::SyntaxMissingToken,
            Self::ExpectedExpression
            | Self::ExpectedOperator
            | Self::InvalidLiteral
            | Self::InvalidAssignment
            | Self::NestedTooDeep
            | Self::InvalidSyntax => DiagnosticCode::SyntaxInvalidExpression,
            Self::ExpectedStatement
            | Self::ExpectedDeclaration
            | Self::ExpectedIdentifier
            | Self::ExpectedType
            | Self::DuplicateParameter
            | Self::InvalidReturnType => DiagnosticCode::SyntaxInvalidDeclaration,
        }
    }
}

/// How the parser recovers after an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStrategy {
    /// Skip the offending token.
    Skip,
    /// Skip forward to the next synchronization point.
    Synchronize,
    /// Insert the expected token (reserved; currently a no-op).
    Insert,
    /// Stop parsing.
    Abort,
}

/// Parser configuration.
#[derive(Debug, Clone, Copy)]
pub struct ParserOptions {
    /// Maximum expression nesting before `NestedTooDeep`.
    pub max_recursion_depth: usize,
    /// Record errors and continue at synchronization points.
    pub enable_error_recovery: bool,
    /// Attach comment tokens to nodes (reserved).
    pub track_comments: bool,
    /// Reject recoverable constructs outright.
    pub strict_mode: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            max_recursion_depth: 1000,
            enable_error_recovery: true,
            track_comments: false,
            strict_mode: false,
        }
    }
}
