// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Central diagnostic collection engine.
//!
//! [`DiagnosticEngine`] accumulates diagnostics during compilation,
//! tracks severity counters, and enforces the error limit / fatal stop
//! conditions. [`DiagnosticBuilder`] provides fluent construction of
//! diagnostics with notes.
//!
//! # Concurrency
//!
//! The counters (`errors`, `warnings`, `notes`, fatal flag) are relaxed
//! atomics so observers can poll progress through a shared reference.
//! The diagnostic vector itself is only reachable through `&mut self`
//! mutators: concurrent mutation is rejected by the borrow checker
//! rather than documented away.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use ecow::EcoString;

use crate::arena::Arena;

use super::{Diagnostic, DiagnosticCode, DiagnosticLevel, DiagnosticMessage, SourceLocation};

/// Central engine for collecting and managing compiler diagnostics.
///
/// # Report contract
///
/// [`DiagnosticEngine::report`] rejects the diagnostic (returns
/// `false`) when compilation should already have stopped: a fatal
/// diagnostic was seen, or the error limit is reached. Otherwise the
/// diagnostic is counted and appended in insertion order, and the call
/// returns `true` iff compilation may continue afterwards.
pub struct DiagnosticEngine<'a> {
    arena: &'a Arena,
    diagnostics: Vec<Diagnostic<'a>>,
    max_errors: usize,
    error_count: AtomicUsize,
    warning_count: AtomicUsize,
    note_count: AtomicUsize,
    fatal_encountered: AtomicBool,
}

impl<'a> DiagnosticEngine<'a> {
    /// Creates an engine. `max_errors` of 0 means unlimited.
    #[must_use]
    pub fn new(arena: &'a Arena, max_errors: usize) -> Self {
        Self {
            arena,
            diagnostics: Vec::new(),
            max_errors,
            error_count: AtomicUsize::new(0),
            warning_count: AtomicUsize::new(0),
            note_count: AtomicUsize::new(0),
            fatal_encountered: AtomicBool::new(false),
        }
    }

    /// Reports a diagnostic.
    ///
    /// Returns `false` if the diagnostic was rejected because
    /// compilation should stop, or if accepting it triggers the stop
    /// condition.
    pub fn report(&mut self, diagnostic: Diagnostic<'a>) -> bool {
        if self.should_stop_compilation() {
            return false;
        }

        self.update_counters(&diagnostic);
        self.diagnostics.push(diagnostic);

        !self.should_stop_compilation()
    }

    /// Creates and reports a diagnostic from its parts.
    pub fn report_message(
        &mut self,
        level: DiagnosticLevel,
        code: DiagnosticCode,
        message: impl Into<EcoString>,
        location: SourceLocation<'a>,
    ) -> bool {
        self.report(Diagnostic::new(DiagnosticMessage::new(
            level, code, message, location,
        )))
    }

    /// Reports an error diagnostic.
    pub fn error(
        &mut self,
        code: DiagnosticCode,
        message: impl Into<EcoString>,
        location: SourceLocation<'a>,
    ) -> bool {
        self.report_message(DiagnosticLevel::Error, code, message, location)
    }

    /// Reports a warning diagnostic.
    pub fn warning(
        &mut self,
        code: DiagnosticCode,
        message: impl Into<EcoString>,
        location: SourceLocation<'a>,
    ) -> bool {
        self.report_message(DiagnosticLevel::Warning, code, message, location)
    }

    /// Reports a note diagnostic.
    pub fn note(&mut self, message: impl Into<EcoString>, location: SourceLocation<'a>) -> bool {
        self.report_message(DiagnosticLevel::Note, DiagnosticCode::None, message, location)
    }

    /// Reports a fatal error. Always returns `false`: compilation must
    /// stop.
    pub fn fatal(
        &mut self,
        code: DiagnosticCode,
        message: impl Into<EcoString>,
        location: SourceLocation<'a>,
    ) -> bool {
        self.report_message(DiagnosticLevel::Fatal, code, message, location);
        false
    }

    /// Starts a fluent error diagnostic.
    pub fn make_error(
        &mut self,
        code: DiagnosticCode,
        message: impl Into<EcoString>,
        location: SourceLocation<'a>,
    ) -> DiagnosticBuilder<'_, 'a> {
        DiagnosticBuilder::new(self, DiagnosticLevel::Error, code, message, location)
    }

    /// Starts a fluent warning diagnostic.
    pub fn make_warning(
        &mut self,
        code: DiagnosticCode,
        message: impl Into<EcoString>,
        location: SourceLocation<'a>,
    ) -> DiagnosticBuilder<'_, 'a> {
        DiagnosticBuilder::new(self, DiagnosticLevel::Warning, code, message, location)
    }

    /// Starts a fluent fatal diagnostic.
    pub fn make_fatal(
        &mut self,
        code: DiagnosticCode,
        message: impl Into<EcoString>,
        location: SourceLocation<'a>,
    ) -> DiagnosticBuilder<'_, 'a> {
        DiagnosticBuilder::new(self, DiagnosticLevel::Fatal, code, message, location)
    }

    /// Total number of stored diagnostics.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.diagnostics.len()
    }

    /// Number of error-level diagnostics (errors + fatals).
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.error_count.load(Ordering::Relaxed)
    }

    /// Number of warning diagnostics.
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.warning_count.load(Ordering::Relaxed)
    }

    /// Number of note diagnostics.
    #[must_use]
    pub fn note_count(&self) -> usize {
        self.note_count.load(Ordering::Relaxed)
    }

    /// Returns `true` if any errors were reported.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Returns `true` if a fatal diagnostic was reported.
    #[must_use]
    pub fn has_fatal_error(&self) -> bool {
        self.fatal_encountered.load(Ordering::Relaxed)
    }

    /// Returns `true` if the error limit is configured and reached.
    #[must_use]
    pub fn error_limit_reached(&self) -> bool {
        self.max_errors > 0 && self.error_count() >= self.max_errors
    }

    /// Returns `true` if compilation should stop.
    #[must_use]
    pub fn should_stop_compilation(&self) -> bool {
        self.has_fatal_error() || self.error_limit_reached()
    }

    /// Returns all diagnostics in insertion (or last-sorted) order.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic<'a>] {
        &self.diagnostics
    }

    /// Returns an independent snapshot of diagnostics matching the
    /// predicate.
    #[must_use]
    pub fn filtered_diagnostics(
        &self,
        filter: impl Fn(&Diagnostic<'a>) -> bool,
    ) -> Vec<Diagnostic<'a>> {
        self.diagnostics
            .iter()
            .filter(|diag| filter(diag))
            .cloned()
            .collect()
    }

    /// Returns diagnostics at the given severity level.
    #[must_use]
    pub fn diagnostics_by_level(&self, level: DiagnosticLevel) -> Vec<Diagnostic<'a>> {
        self.filtered_diagnostics(|diag| diag.level() == level)
    }

    /// Returns diagnostics with the given code.
    #[must_use]
    pub fn diagnostics_by_code(&self, code: DiagnosticCode) -> Vec<Diagnostic<'a>> {
        self.filtered_diagnostics(|diag| diag.code() == code)
    }

    /// Sorts diagnostics by (filename, line, column) of the primary
    /// location.
    pub fn sort_by_location(&mut self) {
        self.diagnostics.sort_by(|a, b| {
            let la = a.primary().location();
            let lb = b.primary().location();
            (la.filename(), la.line(), la.column()).cmp(&(lb.filename(), lb.line(), lb.column()))
        });
    }

    /// Sorts diagnostics by severity, most severe first. Stable: the
    /// relative order within each severity is preserved.
    pub fn sort_by_severity(&mut self) {
        self.diagnostics
            .sort_by_key(|diag| std::cmp::Reverse(diag.level()));
    }

    /// Drops all diagnostics and resets the counters.
    ///
    /// The shared arena is left untouched; its owner decides when to
    /// reset it.
    pub fn clear(&mut self) {
        self.diagnostics.clear();
        self.error_count.store(0, Ordering::Relaxed);
        self.warning_count.store(0, Ordering::Relaxed);
        self.note_count.store(0, Ordering::Relaxed);
        self.fatal_encountered.store(false, Ordering::Relaxed);
    }

    /// Sets the error limit (0 = unlimited).
    pub fn set_max_errors(&mut self, max_errors: usize) {
        self.max_errors = max_errors;
    }

    /// Returns the configured error limit (0 = unlimited).
    #[must_use]
    pub fn max_errors(&self) -> usize {
        self.max_errors
    }

    /// Bytes used by the backing arena.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        self.arena.bytes_used()
    }

    fn update_counters(&self, diagnostic: &Diagnostic<'a>) {
        match diagnostic.level() {
            DiagnosticLevel::Fatal => {
                self.fatal_encountered.store(true, Ordering::Relaxed);
                self.error_count.fetch_add(1, Ordering::Relaxed);
            }
            DiagnosticLevel::Error => {
                self.error_count.fetch_add(1, Ordering::Relaxed);
            }
            DiagnosticLevel::Warning => {
                self.warning_count.fetch_add(1, Ordering::Relaxed);
            }
            DiagnosticLevel::Note => {
                self.note_count.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

impl std::fmt::Debug for DiagnosticEngine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagnosticEngine")
            .field("total", &self.total_count())
            .field("errors", &self.error_count())
            .field("warnings", &self.warning_count())
            .field("notes", &self.note_count())
            .field("fatal", &self.has_fatal_error())
            .finish()
    }
}

/// Fluent builder for diagnostics with notes.
///
/// Dropping an un-emitted builder emits the diagnostic exactly once,
/// so a builder can be used fire-and-forget:
///
/// ```
/// use glint_core::arena::Arena;
/// use glint_core::diagnostics::{DiagnosticCode, DiagnosticEngine, SourceLocation};
///
/// let arena = Arena::new();
/// let mut engine = DiagnosticEngine::new(&arena, 0);
/// let _ = engine
///     .make_error(
///         DiagnosticCode::SyntaxUnexpectedToken,
///         "expected `)`",
///         SourceLocation::at("demo.gl", 1, 9),
///     )
///     .help("close the argument list");
/// assert_eq!(engine.error_count(), 1);
/// ```
pub struct DiagnosticBuilder<'e, 'a> {
    engine: &'e mut DiagnosticEngine<'a>,
    diagnostic: Option<Diagnostic<'a>>,
}

impl<'e, 'a> DiagnosticBuilder<'e, 'a> {
    fn new(
        engine: &'e mut DiagnosticEngine<'a>,
        level: DiagnosticLevel,
        code: DiagnosticCode,
        message: impl Into<EcoString>,
        location: SourceLocation<'a>,
    ) -> Self {
        Self {
            engine,
            diagnostic: Some(Diagnostic::new(DiagnosticMessage::new(
                level, code, message, location,
            ))),
        }
    }

    /// Adds a note with a location.
    #[must_use]
    pub fn note(mut self, message: impl Into<EcoString>, location: SourceLocation<'a>) -> Self {
        if let Some(diag) = self.diagnostic.as_mut() {
            diag.add_note(message, location);
        }
        self
    }

    /// Adds a "suggestion: " note.
    #[must_use]
    pub fn suggest(self, suggestion: impl Into<EcoString>, location: SourceLocation<'a>) -> Self {
        let message = format!("suggestion: {}", suggestion.into());
        self.note(message, location)
    }

    /// Adds a "help: " note with no location.
    #[must_use]
    pub fn help(self, help_text: impl Into<EcoString>) -> Self {
        let message = format!("help: {}", help_text.into());
        self.note(message, SourceLocation::default())
    }

    /// Finalizes and reports the diagnostic.
    pub fn emit(mut self) -> bool {
        match self.diagnostic.take() {
            Some(diag) => self.engine.report(diag),
            None => false,
        }
    }
}

impl Drop for DiagnosticBuilder<'_, '_> {
    fn drop(&mut self) {
        if let Some(diag) = self.diagnostic.take() {
            self.engine.report(diag);
        }
    }
}
