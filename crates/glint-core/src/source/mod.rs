// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Source file management.
//!
//! [`SourceManager`] loads files (from disk or from strings), assigns
//! [`FileId`]s, and owns every [`SourceFile`] for the duration of a
//! compilation session. Locations handed out by the manager borrow the
//! filename from the owning file, so they cannot outlive it.
//!
//! # Loading
//!
//! Disk loads go through a [`SourceResolver`]: relative paths probe the
//! explicit current directory, then configured include paths, then the
//! process working directory. Loading the same resolved path twice
//! returns the existing id and registers the new spelling as an alias.
//!
//! Files at or above the 64 KiB threshold take the large-file load
//! path; the buffer is always an owned heap snapshot so pointers into
//! the content stay stable for the manager's lifetime.

mod file;
mod resolver;

use camino::{Utf8Path, Utf8PathBuf};
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::diagnostics::SourceLocation;

pub use file::{detect_encoding, validate_utf8, Encoding, FileStatistics, SourceFile};
pub use resolver::{FilesystemResolver, SourceResolver};

/// Files at or above this size take the large-file load path.
pub const MEMORY_MAP_THRESHOLD: usize = 64 * 1024;

/// Errors reported by source management operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SourceError {
    /// The file could not be located.
    #[error("file not found")]
    FileNotFound,
    /// The file exists but could not be read.
    #[error("access denied")]
    AccessDenied,
    /// An offset, line, or column is outside the file.
    #[error("invalid position or encoding")]
    InvalidEncoding,
    /// The file (or total load) exceeds the configured size limits.
    #[error("file too large")]
    FileTooLarge,
    /// The large-file load path failed.
    #[error("memory map failed")]
    MemoryMapFailed,
    /// The file content is not valid UTF-8.
    #[error("invalid UTF-8")]
    InvalidUtf8,
    /// A file transitively includes itself.
    #[error("circular include")]
    CircularInclude,
    /// The configured file-count limit was reached.
    #[error("too many files")]
    TooManyFiles,
}

/// Opaque identifier for a loaded source file.
///
/// Id 0 is reserved as invalid; the manager assigns ids from 1,
/// monotonically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(u32);

impl FileId {
    /// The reserved invalid id.
    pub const INVALID: FileId = FileId(0);

    pub(crate) const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns `true` for ids actually assigned by a manager.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }

    /// Returns the raw id value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "file#{}", self.0)
    }
}

/// Configuration for a [`SourceManager`].
#[derive(Debug, Clone)]
pub struct SourceManagerOptions {
    /// Maximum size of a single file (default 64 MiB).
    pub max_file_size: usize,
    /// Maximum total bytes loaded (default 1 GiB).
    pub max_total_size: usize,
    /// Maximum number of files (default 10 000).
    pub max_files: usize,
    /// Use the large-file load path for files over the threshold.
    pub enable_memory_mapping: bool,
    /// Validate UTF-8 on load; when off, content converts lossily.
    pub validate_utf8: bool,
    /// Build line-start tables at load time.
    pub cache_line_offsets: bool,
}

impl Default for SourceManagerOptions {
    fn default() -> Self {
        Self {
            max_file_size: 64 * 1024 * 1024,
            max_total_size: 1024 * 1024 * 1024,
            max_files: 10_000,
            enable_memory_mapping: true,
            validate_utf8: true,
            cache_line_offsets: true,
        }
    }
}

/// Aggregate statistics over all loaded files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceManagerStatistics {
    /// Files loaded (including virtual files).
    pub total_files: usize,
    /// Total bytes loaded.
    pub total_bytes: usize,
    /// Files that took the large-file load path.
    pub memory_mapped_files: usize,
    /// Bytes in those files.
    pub memory_mapped_bytes: usize,
    /// Files currently held in memory.
    pub cached_files: usize,
}

/// Owns all source files for a compilation session.
pub struct SourceManager {
    resolver: Box<dyn SourceResolver>,
    files: Vec<SourceFile>,
    ids_by_name: FxHashMap<String, FileId>,
    total_bytes_loaded: usize,
    options: SourceManagerOptions,
}

impl SourceManager {
    /// Creates a manager with a custom resolver and options.
    #[must_use]
    pub fn new(resolver: Box<dyn SourceResolver>, options: SourceManagerOptions) -> Self {
        Self {
            resolver,
            files: Vec::new(),
            ids_by_name: FxHashMap::default(),
            total_bytes_loaded: 0,
            options,
        }
    }

    /// Creates a filesystem-backed manager with default options.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(
            Box::new(FilesystemResolver::new()),
            SourceManagerOptions::default(),
        )
    }

    /// Creates a filesystem-backed manager with include paths.
    #[must_use]
    pub fn with_include_paths(include_paths: Vec<Utf8PathBuf>) -> Self {
        Self::new(
            Box::new(FilesystemResolver::with_include_paths(include_paths)),
            SourceManagerOptions::default(),
        )
    }

    /// Returns the active options.
    #[must_use]
    pub fn options(&self) -> &SourceManagerOptions {
        &self.options
    }

    /// Loads a file from disk, or returns the existing id if the path
    /// (or its resolution) was already loaded.
    ///
    /// # Errors
    ///
    /// Resolution, I/O, size-limit, and encoding errors per
    /// [`SourceError`].
    pub fn load_file(&mut self, path: &str) -> Result<FileId, SourceError> {
        if let Some(&id) = self.ids_by_name.get(path) {
            return Ok(id);
        }

        let resolved = self.resolver.resolve_path(Utf8Path::new(path), None)?;
        if let Some(&id) = self.ids_by_name.get(resolved.as_str()) {
            // New spelling of an already-loaded file: register the alias.
            self.ids_by_name.insert(path.to_owned(), id);
            return Ok(id);
        }

        let size = self.resolver.file_size(&resolved)?;
        self.check_limits(size)?;

        let use_large_path =
            self.options.enable_memory_mapping && size >= MEMORY_MAP_THRESHOLD;
        let (bytes, memory_mapped) = if use_large_path {
            match self.resolver.load_large_file(&resolved) {
                Ok(bytes) => (bytes, true),
                // Fall back to the regular load path.
                Err(_) => (self.resolver.load_file(&resolved)?, false),
            }
        } else {
            (self.resolver.load_file(&resolved)?, false)
        };

        let content = self.decode(bytes)?;
        let id = self.register(resolved.clone(), content, memory_mapped);
        self.ids_by_name.insert(path.to_owned(), id);
        self.ids_by_name.insert(resolved.into_string(), id);
        Ok(id)
    }

    /// Registers a virtual file under `name`.
    ///
    /// # Errors
    ///
    /// [`SourceError::FileTooLarge`] / [`SourceError::TooManyFiles`]
    /// when limits are exceeded.
    pub fn load_from_string(&mut self, name: &str, content: String) -> Result<FileId, SourceError> {
        if let Some(&id) = self.ids_by_name.get(name) {
            return Ok(id);
        }
        self.check_limits(content.len())?;

        let id = self.register(Utf8PathBuf::from(name), content, false);
        self.ids_by_name.insert(name.to_owned(), id);
        Ok(id)
    }

    /// Returns the file with the given id.
    #[must_use]
    pub fn get_file(&self, file_id: FileId) -> Option<&SourceFile> {
        if !file_id.is_valid() {
            return None;
        }
        self.files.get(file_id.as_u32() as usize - 1)
    }

    /// Returns the file registered under `name` (original spelling or
    /// resolved path).
    #[must_use]
    pub fn get_file_by_name(&self, name: &str) -> Option<&SourceFile> {
        self.get_file(self.get_file_id(name))
    }

    /// Returns the id registered for `name`, or [`FileId::INVALID`].
    #[must_use]
    pub fn get_file_id(&self, name: &str) -> FileId {
        self.ids_by_name.get(name).copied().unwrap_or(FileId::INVALID)
    }

    /// Builds a location from a file id and byte offset.
    ///
    /// # Errors
    ///
    /// [`SourceError::FileNotFound`] for an unknown id;
    /// [`SourceError::InvalidEncoding`] for an out-of-range offset.
    pub fn create_location(
        &self,
        file_id: FileId,
        offset: usize,
    ) -> Result<SourceLocation<'_>, SourceError> {
        let file = self.get_file(file_id).ok_or(SourceError::FileNotFound)?;
        let (line, column) = file.offset_to_line_column(offset)?;
        Ok(SourceLocation::new(
            file.filename().as_str(),
            line,
            column,
            offset as u32,
        ))
    }

    /// Builds a location from a registered name and 1-based position.
    ///
    /// # Errors
    ///
    /// [`SourceError::FileNotFound`] for an unknown name;
    /// [`SourceError::InvalidEncoding`] for an out-of-range position.
    pub fn create_location_at(
        &self,
        name: &str,
        line: u32,
        column: u32,
    ) -> Result<SourceLocation<'_>, SourceError> {
        let file = self.get_file_by_name(name).ok_or(SourceError::FileNotFound)?;
        let offset = file.line_column_to_offset(line, column)?;
        Ok(SourceLocation::new(
            file.filename().as_str(),
            line,
            column,
            offset as u32,
        ))
    }

    /// Re-derives (line, column) for a location from its byte offset.
    ///
    /// # Errors
    ///
    /// [`SourceError::FileNotFound`] if the location's file is unknown.
    pub fn resolve_location(&self, location: SourceLocation<'_>) -> Result<(u32, u32), SourceError> {
        let file = self
            .get_file_by_name(location.filename())
            .ok_or(SourceError::FileNotFound)?;
        file.offset_to_line_column(location.offset() as usize)
    }

    /// Returns up to `length` bytes of content at the location,
    /// clamped to the end of the file.
    ///
    /// # Errors
    ///
    /// [`SourceError::FileNotFound`] for an unknown file;
    /// [`SourceError::InvalidEncoding`] if the slice would split a
    /// UTF-8 sequence.
    pub fn get_content_at(
        &self,
        location: SourceLocation<'_>,
        length: usize,
    ) -> Result<&str, SourceError> {
        let file = self
            .get_file_by_name(location.filename())
            .ok_or(SourceError::FileNotFound)?;
        let start = location.offset() as usize;
        if start > file.content().len() {
            return Err(SourceError::InvalidEncoding);
        }
        let end = (start + length).min(file.content().len());
        file.content()
            .get(start..end)
            .ok_or(SourceError::InvalidEncoding)
    }

    /// Returns the full line of content containing the location.
    ///
    /// # Errors
    ///
    /// [`SourceError::FileNotFound`] for an unknown file;
    /// [`SourceError::InvalidEncoding`] for an out-of-range line.
    pub fn get_line_content(&self, location: SourceLocation<'_>) -> Result<&str, SourceError> {
        let file = self
            .get_file_by_name(location.filename())
            .ok_or(SourceError::FileNotFound)?;
        file.get_line_content(location.line())
    }

    /// Returns every registered name, including aliases.
    #[must_use]
    pub fn loaded_files(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.ids_by_name.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns aggregate statistics.
    #[must_use]
    pub fn get_statistics(&self) -> SourceManagerStatistics {
        let mut stats = SourceManagerStatistics {
            total_files: self.files.len(),
            total_bytes: self.total_bytes_loaded,
            cached_files: self.files.len(),
            ..SourceManagerStatistics::default()
        };
        for file in &self.files {
            if file.is_memory_mapped() {
                stats.memory_mapped_files += 1;
                stats.memory_mapped_bytes += file.statistics().byte_count;
            }
        }
        stats
    }

    /// Drops all files and resets id allocation.
    pub fn clear(&mut self) {
        self.files.clear();
        self.ids_by_name.clear();
        self.total_bytes_loaded = 0;
    }

    fn check_limits(&self, size: usize) -> Result<(), SourceError> {
        if self.files.len() >= self.options.max_files {
            return Err(SourceError::TooManyFiles);
        }
        if size > self.options.max_file_size
            || self.total_bytes_loaded + size > self.options.max_total_size
        {
            return Err(SourceError::FileTooLarge);
        }
        Ok(())
    }

    fn decode(&self, bytes: Vec<u8>) -> Result<String, SourceError> {
        if self.options.validate_utf8 {
            if !validate_utf8(&bytes) {
                return Err(SourceError::InvalidUtf8);
            }
            String::from_utf8(bytes).map_err(|_| SourceError::InvalidUtf8)
        } else {
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
    }

    fn register(&mut self, filename: Utf8PathBuf, content: String, memory_mapped: bool) -> FileId {
        let id = FileId::new(self.files.len() as u32 + 1);
        let file = SourceFile::new(id, filename, content, memory_mapped);
        self.total_bytes_loaded += file.statistics().byte_count;
        self.files.push(file);
        id
    }
}

impl std::fmt::Debug for SourceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceManager")
            .field("files", &self.files.len())
            .field("total_bytes", &self.total_bytes_loaded)
            .finish()
    }
}
