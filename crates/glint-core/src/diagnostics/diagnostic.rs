// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Diagnostic records: severity levels, stable codes, and messages.
//!
//! A [`Diagnostic`] is one primary [`DiagnosticMessage`] plus any number
//! of attached notes. Codes are stable numeric identifiers grouped by
//! category so tooling can filter on ranges without tracking variant
//! names.

use ecow::EcoString;

use super::SourceLocation;

/// Severity of a diagnostic message.
///
/// Ordered from least to most severe, so `Ord` can be used directly for
/// severity comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticLevel {
    /// Informational note.
    Note = 0,
    /// A problem that does not prevent compilation.
    Warning = 1,
    /// An error that prevents successful compilation.
    Error = 2,
    /// An error that stops compilation immediately.
    Fatal = 3,
}

impl std::fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Note => "note",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Fatal => "fatal error",
        };
        f.write_str(text)
    }
}

/// Category of a diagnostic code, derived from its numeric range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCategory {
    /// Code 0: notes without a code.
    None,
    /// 1000–1999.
    Lexical,
    /// 2000–2999.
    Syntax,
    /// 3000–3999.
    Semantic,
    /// 4000–4999.
    TypeSystem,
    /// 5000–5999.
    Ownership,
    /// 9000–9999.
    Internal,
}

/// Stable numeric diagnostic codes.
///
/// Codes are grouped by category: lexical 1000–1999, syntax 2000–2999,
/// semantic 3000–3999, type-system 4000–4999, ownership 5000–5999,
/// internal 9000–9999. The numeric values are part of the tool-facing
/// contract and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum DiagnosticCode {
    /// Notes carry no code.
    None = 0,

    // Lexical errors (1000-1999)
    LexInvalidCharacter = 1001,
    LexUnterminatedString = 1002,
    LexInvalidNumber = 1003,
    LexInvalidIdentifier = 1004,
    LexInvalidEscape = 1005,
    LexUnterminatedChar = 1006,
    LexNumberTooLarge = 1007,
    LexInvalidFloat = 1008,
    LexInvalidRadix = 1009,
    LexUnexpectedEof = 1010,

    // Syntax errors (2000-2999)
    SyntaxUnexpectedToken = 2001,
    SyntaxMissingToken = 2002,
    SyntaxInvalidExpression = 2003,
    SyntaxInvalidDeclaration = 2004,

    // Semantic errors (3000-3999)
    SemanticUndeclaredIdentifier = 3001,
    SemanticTypeMismatch = 3002,
    SemanticInvalidOperation = 3003,
    SemanticDuplicateDeclaration = 3004,

    // Type system errors (4000-4999)
    TypeInferenceFailure = 4001,
    TypeCircularDependency = 4002,
    TypeInvalidConstraint = 4003,
    TypeAmbiguousReference = 4004,

    // Ownership errors (5000-5999)
    OwnershipMoveAfterBorrow = 5001,
    OwnershipDoubleBorrow = 5002,
    OwnershipLifetimeViolation = 5003,
    OwnershipDanglingReference = 5004,

    // Internal compiler errors (9000-9999)
    InternalCompilerError = 9001,
    InternalMemoryExhaustion = 9002,
    InternalAssertionFailure = 9003,
}

impl DiagnosticCode {
    /// Returns the numeric code value.
    #[must_use]
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Returns the category this code belongs to.
    #[must_use]
    pub const fn category(self) -> DiagnosticCategory {
        match self.code() {
            0 => DiagnosticCategory::None,
            1000..=1999 => DiagnosticCategory::Lexical,
            2000..=2999 => DiagnosticCategory::Syntax,
            3000..=3999 => DiagnosticCategory::Semantic,
            4000..=4999 => DiagnosticCategory::TypeSystem,
            5000..=5999 => DiagnosticCategory::Ownership,
            _ => DiagnosticCategory::Internal,
        }
    }
}

/// A single diagnostic message with location and severity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticMessage<'a> {
    level: DiagnosticLevel,
    code: DiagnosticCode,
    message: EcoString,
    location: SourceLocation<'a>,
}

impl<'a> DiagnosticMessage<'a> {
    /// Creates a diagnostic message.
    #[must_use]
    pub fn new(
        level: DiagnosticLevel,
        code: DiagnosticCode,
        message: impl Into<EcoString>,
        location: SourceLocation<'a>,
    ) -> Self {
        Self {
            level,
            code,
            message: message.into(),
            location,
        }
    }

    /// Returns the severity level.
    #[must_use]
    pub const fn level(&self) -> DiagnosticLevel {
        self.level
    }

    /// Returns the diagnostic code.
    #[must_use]
    pub const fn code(&self) -> DiagnosticCode {
        self.code
    }

    /// Returns the numeric code value.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        self.code.code()
    }

    /// Returns the message text.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the source location.
    #[must_use]
    pub const fn location(&self) -> SourceLocation<'a> {
        self.location
    }

    /// Returns `true` if this is an error or fatal message.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.level >= DiagnosticLevel::Error
    }

    /// Returns `true` if this is a fatal message.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.level == DiagnosticLevel::Fatal
    }
}

/// A complete diagnostic: a primary message plus attached notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic<'a> {
    primary: DiagnosticMessage<'a>,
    notes: Vec<DiagnosticMessage<'a>>,
}

impl<'a> Diagnostic<'a> {
    /// Creates a diagnostic from its primary message.
    #[must_use]
    pub fn new(primary: DiagnosticMessage<'a>) -> Self {
        Self {
            primary,
            notes: Vec::new(),
        }
    }

    /// Creates an error diagnostic.
    #[must_use]
    pub fn error(
        code: DiagnosticCode,
        message: impl Into<EcoString>,
        location: SourceLocation<'a>,
    ) -> Self {
        Self::new(DiagnosticMessage::new(
            DiagnosticLevel::Error,
            code,
            message,
            location,
        ))
    }

    /// Creates a warning diagnostic.
    #[must_use]
    pub fn warning(
        code: DiagnosticCode,
        message: impl Into<EcoString>,
        location: SourceLocation<'a>,
    ) -> Self {
        Self::new(DiagnosticMessage::new(
            DiagnosticLevel::Warning,
            code,
            message,
            location,
        ))
    }

    /// Returns the primary message.
    #[must_use]
    pub const fn primary(&self) -> &DiagnosticMessage<'a> {
        &self.primary
    }

    /// Returns the attached notes in insertion order.
    #[must_use]
    pub fn notes(&self) -> &[DiagnosticMessage<'a>] {
        &self.notes
    }

    /// Attaches a note with a location.
    pub fn add_note(
        &mut self,
        message: impl Into<EcoString>,
        location: SourceLocation<'a>,
    ) -> &mut Self {
        self.notes.push(DiagnosticMessage::new(
            DiagnosticLevel::Note,
            DiagnosticCode::None,
            message,
            location,
        ));
        self
    }

    /// Attaches a prebuilt note message.
    pub fn add_note_message(&mut self, note: DiagnosticMessage<'a>) -> &mut Self {
        self.notes.push(note);
        self
    }

    /// Returns the severity of the primary message.
    #[must_use]
    pub const fn level(&self) -> DiagnosticLevel {
        self.primary.level()
    }

    /// Returns the code of the primary message.
    #[must_use]
    pub const fn code(&self) -> DiagnosticCode {
        self.primary.code()
    }

    /// Returns `true` if the primary message is error level or above.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.primary.is_error()
    }

    /// Returns `true` if the primary message is fatal.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.primary.is_fatal()
    }

    /// Total message count (primary + notes).
    #[must_use]
    pub fn message_count(&self) -> usize {
        1 + self.notes.len()
    }
}
