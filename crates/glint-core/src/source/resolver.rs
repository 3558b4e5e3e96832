// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! File resolution: mapping requested paths to loadable files.
//!
//! [`SourceResolver`] abstracts how source files are located and read,
//! so compilation can run against the real filesystem, a test fixture,
//! or any virtual layout. [`FilesystemResolver`] is the standard
//! implementation with an include-path probe.

use camino::{Utf8Path, Utf8PathBuf};

use super::SourceError;

/// Resolves and loads source files.
pub trait SourceResolver {
    /// Resolves a possibly-relative path to the path it should load
    /// from.
    ///
    /// # Errors
    ///
    /// [`SourceError::FileNotFound`] if no candidate exists.
    fn resolve_path(
        &self,
        path: &Utf8Path,
        current_directory: Option<&Utf8Path>,
    ) -> Result<Utf8PathBuf, SourceError>;

    /// Returns `true` if the path names a readable regular file.
    fn file_exists(&self, path: &Utf8Path) -> bool;

    /// Returns the file size in bytes.
    ///
    /// # Errors
    ///
    /// [`SourceError::FileNotFound`] or [`SourceError::AccessDenied`].
    fn file_size(&self, path: &Utf8Path) -> Result<usize, SourceError>;

    /// Loads the file contents.
    ///
    /// # Errors
    ///
    /// [`SourceError::FileNotFound`] or [`SourceError::AccessDenied`].
    fn load_file(&self, path: &Utf8Path) -> Result<Vec<u8>, SourceError>;

    /// Loads a large file through the bulk path. The returned buffer is
    /// always an owned heap snapshot; no mapping outlives the call.
    ///
    /// # Errors
    ///
    /// [`SourceError::MemoryMapFailed`] if the bulk load fails.
    fn load_large_file(&self, path: &Utf8Path) -> Result<Vec<u8>, SourceError>;
}

/// Filesystem-backed resolver with include paths.
///
/// Resolution order for relative paths: the explicit current directory
/// (when given), then each include path in order, then the process
/// working directory. Absolute paths pass through untouched.
#[derive(Debug, Default)]
pub struct FilesystemResolver {
    include_paths: Vec<Utf8PathBuf>,
}

impl FilesystemResolver {
    /// Creates a resolver with no include paths.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a resolver with the given include paths.
    #[must_use]
    pub fn with_include_paths(include_paths: Vec<Utf8PathBuf>) -> Self {
        Self { include_paths }
    }

    /// Appends an include path to the search list.
    pub fn add_include_path(&mut self, path: Utf8PathBuf) {
        self.include_paths.push(path);
    }

    fn search_include_paths(&self, path: &Utf8Path) -> Option<Utf8PathBuf> {
        self.include_paths
            .iter()
            .map(|include| include.join(path))
            .find(|candidate| self.file_exists(candidate))
    }
}

impl SourceResolver for FilesystemResolver {
    fn resolve_path(
        &self,
        path: &Utf8Path,
        current_directory: Option<&Utf8Path>,
    ) -> Result<Utf8PathBuf, SourceError> {
        if path.as_str().is_empty() {
            return Err(SourceError::FileNotFound);
        }
        if path.is_absolute() {
            return Ok(path.to_owned());
        }

        if let Some(dir) = current_directory {
            let candidate = dir.join(path);
            if self.file_exists(&candidate) {
                return Ok(candidate);
            }
        }

        if let Some(found) = self.search_include_paths(path) {
            return Ok(found);
        }

        let cwd = std::env::current_dir()
            .ok()
            .and_then(|dir| Utf8PathBuf::from_path_buf(dir).ok());
        if let Some(cwd) = cwd {
            let candidate = cwd.join(path);
            if self.file_exists(&candidate) {
                return Ok(candidate);
            }
        }

        Err(SourceError::FileNotFound)
    }

    fn file_exists(&self, path: &Utf8Path) -> bool {
        path.is_file()
    }

    fn file_size(&self, path: &Utf8Path) -> Result<usize, SourceError> {
        let metadata = std::fs::metadata(path).map_err(io_error_to_source_error)?;
        if !metadata.is_file() {
            return Err(SourceError::FileNotFound);
        }
        Ok(metadata.len() as usize)
    }

    fn load_file(&self, path: &Utf8Path) -> Result<Vec<u8>, SourceError> {
        std::fs::read(path).map_err(io_error_to_source_error)
    }

    fn load_large_file(&self, path: &Utf8Path) -> Result<Vec<u8>, SourceError> {
        std::fs::read(path).map_err(|_| SourceError::MemoryMapFailed)
    }
}

fn io_error_to_source_error(error: std::io::Error) -> SourceError {
    match error.kind() {
        std::io::ErrorKind::NotFound => SourceError::FileNotFound,
        _ => SourceError::AccessDenied,
    }
}
