// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! A single loaded source file: content, line index, statistics.

use camino::{Utf8Path, Utf8PathBuf};

use super::{FileId, SourceError};

/// File encodings recognized by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// UTF-8 (the default).
    #[default]
    Utf8,
    /// UTF-8 with a leading byte order mark.
    Utf8WithBom,
    /// Pure ASCII (a subset of UTF-8).
    Ascii,
}

/// Statistics computed for a source file at load time.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileStatistics {
    /// Total bytes in the file.
    pub byte_count: usize,
    /// Total Unicode characters (CRLF counts as one).
    pub character_count: usize,
    /// Total lines (an empty file has one empty line).
    pub line_count: usize,
    /// Longest line, in characters.
    pub max_line_length: usize,
    /// Detected encoding.
    pub encoding: Encoding,
}

/// A loaded source file with its line-start index.
///
/// The line index maps between byte offsets and 1-based (line, column)
/// positions. `line_starts[0]` is always 0, the entries are strictly
/// increasing, and every entry is at most the content length. CRLF is
/// one line terminator; a bare CR also terminates a line.
#[derive(Debug)]
pub struct SourceFile {
    file_id: FileId,
    filename: Utf8PathBuf,
    content: String,
    line_starts: Vec<u32>,
    stats: FileStatistics,
    memory_mapped: bool,
}

impl SourceFile {
    /// Creates a source file, building the line index and statistics.
    #[must_use]
    pub(super) fn new(
        file_id: FileId,
        filename: Utf8PathBuf,
        content: String,
        memory_mapped: bool,
    ) -> Self {
        let line_starts = build_line_starts(&content);
        let stats = compute_statistics(&content, line_starts.len());
        Self {
            file_id,
            filename,
            content,
            line_starts,
            stats,
            memory_mapped,
        }
    }

    /// Returns the file's identifier.
    #[must_use]
    pub fn file_id(&self) -> FileId {
        self.file_id
    }

    /// Returns the filename the file was registered under.
    #[must_use]
    pub fn filename(&self) -> &Utf8Path {
        &self.filename
    }

    /// Returns the complete file content.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the load-time statistics.
    #[must_use]
    pub fn statistics(&self) -> &FileStatistics {
        &self.stats
    }

    /// Returns `true` if the file was loaded through the large-file
    /// path.
    #[must_use]
    pub fn is_memory_mapped(&self) -> bool {
        self.memory_mapped
    }

    /// Returns the line-start offsets. Exposed for the lexer's
    /// line-aware scanning and for tests.
    #[must_use]
    pub fn line_starts(&self) -> &[u32] {
        &self.line_starts
    }

    /// Converts a byte offset to 1-based (line, column).
    ///
    /// An offset equal to the content length maps to one past the end
    /// of the last line.
    ///
    /// # Errors
    ///
    /// [`SourceError::InvalidEncoding`] if the offset is past the end.
    pub fn offset_to_line_column(&self, offset: usize) -> Result<(u32, u32), SourceError> {
        if offset > self.content.len() {
            return Err(SourceError::InvalidEncoding);
        }

        let index = self
            .line_starts
            .partition_point(|&start| start as usize <= offset);
        // partition_point >= 1 because line_starts[0] == 0.
        let line = index as u32;
        let column = (offset - self.line_starts[index - 1] as usize) as u32 + 1;
        Ok((line, column))
    }

    /// Converts a 1-based (line, column) to a byte offset.
    ///
    /// Column `line_length + 1` (one past the end of the line) is
    /// accepted, which makes the offset round-trip total.
    ///
    /// # Errors
    ///
    /// [`SourceError::InvalidEncoding`] for out-of-range positions.
    pub fn line_column_to_offset(&self, line: u32, column: u32) -> Result<usize, SourceError> {
        if line == 0 || line as usize > self.line_starts.len() {
            return Err(SourceError::InvalidEncoding);
        }

        let line_start = self.line_starts[line as usize - 1] as usize;
        let line_end = if (line as usize) < self.line_starts.len() {
            self.line_starts[line as usize] as usize - 1
        } else {
            self.content.len()
        };

        let line_length = line_end - line_start;
        if column == 0 || column as usize > line_length + 1 {
            return Err(SourceError::InvalidEncoding);
        }

        Ok(line_start + column as usize - 1)
    }

    /// Returns the content of a line without its terminator.
    ///
    /// # Errors
    ///
    /// [`SourceError::InvalidEncoding`] for an out-of-range line.
    pub fn get_line_content(&self, line: u32) -> Result<&str, SourceError> {
        if line == 0 || line as usize > self.line_starts.len() {
            return Err(SourceError::InvalidEncoding);
        }

        let start = self.line_starts[line as usize - 1] as usize;
        let mut end = if (line as usize) < self.line_starts.len() {
            self.line_starts[line as usize] as usize
        } else {
            self.content.len()
        };
        while end > start && matches!(self.content.as_bytes()[end - 1], b'\n' | b'\r') {
            end -= 1;
        }

        Ok(&self.content[start..end])
    }

    /// Returns the content of an inclusive line range.
    ///
    /// # Errors
    ///
    /// [`SourceError::InvalidEncoding`] for an invalid range.
    pub fn get_line_range(&self, start_line: u32, end_line: u32) -> Result<Vec<&str>, SourceError> {
        if start_line == 0
            || end_line == 0
            || start_line > end_line
            || end_line as usize > self.line_starts.len()
        {
            return Err(SourceError::InvalidEncoding);
        }

        (start_line..=end_line)
            .map(|line| self.get_line_content(line))
            .collect()
    }
}

/// Streaming UTF-8 validation.
///
/// Accepts exactly the byte sequences standard UTF-8 permits: no
/// overlong encodings, no surrogate code points, nothing above
/// U+10FFFF, no stray continuation bytes, no truncated tails.
#[must_use]
pub fn validate_utf8(bytes: &[u8]) -> bool {
    let mut i = 0;
    let len = bytes.len();

    while i < len {
        let byte = bytes[i];
        let tail: &[std::ops::RangeInclusive<u8>] = match byte {
            0x00..=0x7F => {
                i += 1;
                continue;
            }
            0xC2..=0xDF => &[0x80..=0xBF],
            0xE0 => &[0xA0..=0xBF, 0x80..=0xBF],
            0xE1..=0xEC | 0xEE..=0xEF => &[0x80..=0xBF, 0x80..=0xBF],
            0xED => &[0x80..=0x9F, 0x80..=0xBF],
            0xF0 => &[0x90..=0xBF, 0x80..=0xBF, 0x80..=0xBF],
            0xF1..=0xF3 => &[0x80..=0xBF, 0x80..=0xBF, 0x80..=0xBF],
            0xF4 => &[0x80..=0x8F, 0x80..=0xBF, 0x80..=0xBF],
            // 0x80..=0xC1 (stray continuation / overlong lead) and
            // 0xF5..=0xFF are never valid.
            _ => return false,
        };

        if i + tail.len() >= len {
            return false;
        }
        for (k, range) in tail.iter().enumerate() {
            if !range.contains(&bytes[i + 1 + k]) {
                return false;
            }
        }
        i += 1 + tail.len();
    }

    true
}

/// Detects the encoding of raw file bytes.
#[must_use]
pub fn detect_encoding(bytes: &[u8]) -> Encoding {
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        return Encoding::Utf8WithBom;
    }
    if bytes.iter().all(|&b| b < 0x80) {
        return Encoding::Ascii;
    }
    Encoding::Utf8
}

fn build_line_starts(content: &str) -> Vec<u32> {
    let bytes = content.as_bytes();
    let mut starts = vec![0u32];

    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                starts.push((i + 1) as u32);
                i += 1;
            }
            b'\r' => {
                if bytes.get(i + 1) == Some(&b'\n') {
                    starts.push((i + 2) as u32);
                    i += 2;
                } else {
                    starts.push((i + 1) as u32);
                    i += 1;
                }
            }
            _ => i += 1,
        }
    }

    starts
}

fn compute_statistics(content: &str, line_count: usize) -> FileStatistics {
    let mut stats = FileStatistics {
        byte_count: content.len(),
        line_count,
        encoding: detect_encoding(content.as_bytes()),
        ..FileStatistics::default()
    };

    let mut chars = content.chars().peekable();
    let mut current_line_length = 0usize;
    while let Some(c) = chars.next() {
        match c {
            '\n' => {
                stats.max_line_length = stats.max_line_length.max(current_line_length);
                current_line_length = 0;
            }
            '\r' => {
                stats.max_line_length = stats.max_line_length.max(current_line_length);
                current_line_length = 0;
                // CRLF counts as a single character.
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            _ => current_line_length += 1,
        }
        stats.character_count += 1;
    }
    stats.max_line_length = stats.max_line_length.max(current_line_length);

    stats
}
