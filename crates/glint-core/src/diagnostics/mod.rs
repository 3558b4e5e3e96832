// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Diagnostics: locations, records, collection, and rendering.
//!
//! The diagnostics subsystem is the out-of-band channel for everything
//! the compiler wants to tell the user:
//!
//! - [`SourceLocation`] / [`SourceRange`] pin messages to source text.
//! - [`Diagnostic`] is a primary [`DiagnosticMessage`] plus notes, with
//!   a stable numeric [`DiagnosticCode`] grouped by category.
//! - [`DiagnosticEngine`] collects diagnostics, maintains atomic
//!   severity counters, and enforces the fatal / error-limit stop
//!   conditions.
//! - [`DiagnosticBuilder`] offers fluent construction and emits on drop.
//! - [`DiagnosticFormatter`] renders plain, compact, or colored text
//!   with source snippets.

mod diagnostic;
mod engine;
mod formatter;
mod location;

pub use diagnostic::{
    Diagnostic, DiagnosticCategory, DiagnosticCode, DiagnosticLevel, DiagnosticMessage,
};
pub use engine::{DiagnosticBuilder, DiagnosticEngine};
pub use formatter::{
    clear_color_override, detect_supports_color, set_color_enabled, supports_color, ColorCode,
    DiagnosticFormatter, FormatterOptions,
};
pub use location::{SourceLocation, SourceRange};
