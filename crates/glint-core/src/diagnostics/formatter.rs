// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Human-oriented rendering of diagnostics.
//!
//! [`DiagnosticFormatter`] renders diagnostics in three styles: full
//! (with source snippets and column markers), compact (one line per
//! message), and either of those with ANSI color when the terminal
//! supports it.
//!
//! Color support is process-wide state: [`supports_color`] consults an
//! explicit override first ([`set_color_enabled`]), then falls back to
//! terminal detection. Tests call [`clear_color_override`] /
//! [`set_color_enabled`] for deterministic output.

use std::io::IsTerminal;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::source::SourceManager;

use super::{Diagnostic, DiagnosticLevel, DiagnosticMessage, SourceLocation};

// Process-wide color override: 0 = auto-detect, 1 = forced on,
// 2 = forced off.
static COLOR_OVERRIDE: AtomicU8 = AtomicU8::new(0);

/// Forces color output on or off, overriding terminal detection.
pub fn set_color_enabled(enabled: bool) {
    COLOR_OVERRIDE.store(if enabled { 1 } else { 2 }, Ordering::Relaxed);
}

/// Restores automatic color detection. Intended for tests.
pub fn clear_color_override() {
    COLOR_OVERRIDE.store(0, Ordering::Relaxed);
}

/// Returns `true` if colored output should be produced, honoring the
/// process-wide override before falling back to detection.
#[must_use]
pub fn supports_color() -> bool {
    match COLOR_OVERRIDE.load(Ordering::Relaxed) {
        1 => true,
        2 => false,
        _ => detect_supports_color(),
    }
}

/// Detects whether the environment supports ANSI color: stdout is a
/// terminal, `TERM` is set and not "dumb", and either `COLORTERM` is
/// set or `TERM` names a color-capable terminal.
#[must_use]
pub fn detect_supports_color() -> bool {
    if !std::io::stdout().is_terminal() {
        return false;
    }

    let Ok(term) = std::env::var("TERM") else {
        return false;
    };
    if term == "dumb" {
        return false;
    }

    if std::env::var_os("COLORTERM").is_some() {
        return true;
    }

    term.contains("color") || term.contains("xterm") || term.contains("screen") || term == "ansi"
}

/// ANSI color codes used by the formatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorCode {
    Reset,
    Bold,
    Dim,
    Red,
    Green,
    Yellow,
    Blue,
    Cyan,
    BrightRed,
    BrightYellow,
    BrightBlue,
}

impl ColorCode {
    /// Returns the escape sequence for this code.
    #[must_use]
    pub const fn escape_sequence(self) -> &'static str {
        match self {
            Self::Reset => "\x1b[0m",
            Self::Bold => "\x1b[1m",
            Self::Dim => "\x1b[2m",
            Self::Red => "\x1b[31m",
            Self::Green => "\x1b[32m",
            Self::Yellow => "\x1b[33m",
            Self::Blue => "\x1b[34m",
            Self::Cyan => "\x1b[36m",
            Self::BrightRed => "\x1b[91m",
            Self::BrightYellow => "\x1b[93m",
            Self::BrightBlue => "\x1b[94m",
        }
    }
}

/// Wraps `text` in the given color when `enabled`, otherwise returns it
/// unchanged.
fn paint(text: &str, color: ColorCode, enabled: bool) -> String {
    if enabled {
        format!(
            "{}{text}{}",
            color.escape_sequence(),
            ColorCode::Reset.escape_sequence()
        )
    } else {
        text.to_owned()
    }
}

/// Formatter configuration.
#[derive(Debug, Clone)]
pub struct FormatterOptions {
    /// Request colored output (still gated on [`supports_color`]).
    pub show_colors: bool,
    /// Render source snippets below each message.
    pub show_source_context: bool,
    /// Lines of context above and below the error line.
    pub context_lines: u32,
    /// Render line numbers in snippets.
    pub show_line_numbers: bool,
    /// Render the `^` column marker.
    pub show_column_markers: bool,
    /// One-line-per-message output.
    pub compact_mode: bool,
    /// Truncate source lines longer than this.
    pub max_line_length: usize,
}

impl Default for FormatterOptions {
    fn default() -> Self {
        Self {
            show_colors: true,
            show_source_context: true,
            context_lines: 2,
            show_line_numbers: true,
            show_column_markers: true,
            compact_mode: false,
            max_line_length: 120,
        }
    }
}

/// Renders diagnostics as human-readable text.
///
/// Source snippets are resolved through an optional
/// [`SourceManager`]: attach one with
/// [`DiagnosticFormatter::with_source_manager`] to get context lines
/// for both disk-loaded and virtual files. Without one, only the
/// message headers are rendered.
pub struct DiagnosticFormatter<'s> {
    options: FormatterOptions,
    source_manager: Option<&'s SourceManager>,
}

impl<'s> DiagnosticFormatter<'s> {
    /// Creates a formatter with the given options.
    #[must_use]
    pub fn new(options: FormatterOptions) -> Self {
        Self {
            options,
            source_manager: None,
        }
    }

    /// Attaches a source manager for snippet rendering.
    #[must_use]
    pub fn with_source_manager(mut self, source_manager: &'s SourceManager) -> Self {
        self.source_manager = Some(source_manager);
        self
    }

    /// Returns the formatter options.
    #[must_use]
    pub fn options(&self) -> &FormatterOptions {
        &self.options
    }

    /// Formats a single diagnostic, including its notes.
    #[must_use]
    pub fn format(&self, diagnostic: &Diagnostic<'_>) -> String {
        let mut output = self.format_header(diagnostic.primary());

        if self.options.show_source_context && !self.options.compact_mode {
            if let Some(context) = self.format_source_context(diagnostic.primary().location()) {
                output.push('\n');
                output.push_str(&context);
            }
        }

        for note in diagnostic.notes() {
            output.push('\n');
            output.push_str(&self.format_header(note));

            if self.options.show_source_context
                && !self.options.compact_mode
                && note.location().is_valid()
            {
                if let Some(context) = self.format_source_context(note.location()) {
                    output.push('\n');
                    output.push_str(&context);
                }
            }
        }

        output
    }

    /// Formats a sequence of diagnostics separated by blank lines.
    #[must_use]
    pub fn format_all(&self, diagnostics: &[Diagnostic<'_>]) -> String {
        diagnostics
            .iter()
            .map(|diag| self.format(diag))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Formats the end-of-run summary line.
    #[must_use]
    pub fn format_summary(&self, errors: usize, warnings: usize, notes: usize) -> String {
        let color = self.use_color();

        if errors == 0 && warnings == 0 {
            let mut output = paint("compilation completed successfully", ColorCode::Green, color);
            if notes > 0 {
                output.push_str(&format!(" ({notes} note{})", plural(notes)));
            }
            return output;
        }

        let mut parts = Vec::new();
        if errors > 0 {
            parts.push(paint(
                &format!("{errors} error{}", plural(errors)),
                ColorCode::Red,
                color,
            ));
        }
        if warnings > 0 {
            parts.push(paint(
                &format!("{warnings} warning{}", plural(warnings)),
                ColorCode::Yellow,
                color,
            ));
        }
        if notes > 0 {
            parts.push(paint(
                &format!("{notes} note{}", plural(notes)),
                ColorCode::Blue,
                color,
            ));
        }

        format!("{} generated", parts.join(", "))
    }

    fn use_color(&self) -> bool {
        self.options.show_colors && supports_color()
    }

    fn format_header(&self, message: &DiagnosticMessage<'_>) -> String {
        let color = self.use_color();
        let level_color = level_color(message.level());

        if self.options.compact_mode {
            let level = paint(&message.level().to_string(), level_color, color);
            return format!("{}: {level}: {}", message.location(), message.message());
        }

        let mut level = paint(&message.level().to_string(), level_color, color);
        if color {
            level = paint(&level, ColorCode::Bold, true);
        }

        let mut output = format!("{level}: {}", message.message());

        if message.location().is_valid() {
            output.push('\n');
            let location_line = format!("  --> {}", message.location());
            output.push_str(&paint(&location_line, ColorCode::Cyan, color));
        }

        if message.error_code() != 0 {
            let code = format!(" [E{}]", message.error_code());
            output.push_str(&paint(&code, ColorCode::Dim, color));
        }

        output
    }

    fn format_source_context(&self, location: SourceLocation<'_>) -> Option<String> {
        if !location.is_valid() {
            return None;
        }
        let file = self.source_manager?.get_file_by_name(location.filename())?;

        let start_line = location.line().saturating_sub(self.options.context_lines).max(1);
        let end_line = (location.line() + self.options.context_lines)
            .min(file.statistics().line_count as u32);
        let width = end_line.to_string().len();

        let color = self.use_color();
        let mut output = String::new();

        for line_number in start_line..=end_line {
            let Ok(content) = file.get_line_content(line_number) else {
                continue;
            };

            if self.options.show_line_numbers {
                let number = format!("{line_number:>width$}");
                output.push(' ');
                output.push_str(&paint(&number, ColorCode::Dim, color));
                output.push_str(" | ");
            }
            output.push_str(&self.truncate_line(content));
            output.push('\n');

            if line_number == location.line() && self.options.show_column_markers {
                if self.options.show_line_numbers {
                    output.push(' ');
                    output.push_str(&" ".repeat(width));
                    output.push_str(" | ");
                }
                output.push_str(&self.format_column_marker(location.column(), 1, color));
                output.push('\n');
            }
        }

        (!output.is_empty()).then_some(output)
    }

    fn format_column_marker(&self, column: u32, length: usize, color: bool) -> String {
        if column == 0 {
            return String::new();
        }
        let mut output = " ".repeat(column as usize - 1);
        let marker = if length <= 1 {
            "^".to_owned()
        } else {
            "~".repeat(length)
        };
        output.push_str(&paint(&marker, ColorCode::BrightRed, color));
        output
    }

    fn truncate_line(&self, line: &str) -> String {
        if line.chars().count() <= self.options.max_line_length {
            return line.to_owned();
        }
        let kept: String = line
            .chars()
            .take(self.options.max_line_length.saturating_sub(3))
            .collect();
        format!("{kept}...")
    }
}

impl Default for DiagnosticFormatter<'_> {
    fn default() -> Self {
        Self::new(FormatterOptions::default())
    }
}

const fn level_color(level: DiagnosticLevel) -> ColorCode {
    match level {
        DiagnosticLevel::Fatal | DiagnosticLevel::Error => ColorCode::BrightRed,
        DiagnosticLevel::Warning => ColorCode::BrightYellow,
        DiagnosticLevel::Note => ColorCode::BrightBlue,
    }
}

const fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}
