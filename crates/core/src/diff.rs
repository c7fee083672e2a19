//! Diff Model
//!
//! Structured representation of the change under review: changed files and
//! their hunks with old/new line ranges. The diff is produced externally
//! (by the host's git plumbing) and consumed read-only here, primarily to
//! test whether a given new-side line number falls inside an added or
//! context region.

use serde::{Deserialize, Serialize};

/// Change status of a file in the diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeStatus {
    /// File was created by the change
    Added,
    /// File content was modified
    Modified,
    /// File was moved; `previous_path` holds the old location
    Renamed,
    /// File was deleted; no new-side lines exist
    Deleted,
}

/// A contiguous run of changed lines within one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffHunk {
    /// First line of the hunk on the old side
    pub old_start: u32,
    /// Number of old-side lines covered
    pub old_lines: u32,
    /// First line of the hunk on the new side
    pub new_start: u32,
    /// Number of new-side lines covered
    pub new_lines: u32,
}

impl DiffHunk {
    /// Last new-side line covered by this hunk.
    pub fn new_end(&self) -> u32 {
        if self.new_lines == 0 {
            self.new_start
        } else {
            self.new_start + self.new_lines - 1
        }
    }

    /// Whether a new-side line number falls inside this hunk.
    pub fn contains_new_line(&self, line: u32) -> bool {
        self.new_lines > 0 && line >= self.new_start && line <= self.new_end()
    }

    /// Distance from a new-side line to the nearest boundary of this hunk,
    /// together with the boundary line itself. Zero when the line is inside.
    pub fn distance_to_new_line(&self, line: u32) -> (u32, u32) {
        if self.contains_new_line(line) {
            (0, line)
        } else if line < self.new_start {
            (self.new_start - line, self.new_start)
        } else {
            (line - self.new_end(), self.new_end())
        }
    }
}

/// One changed file with its hunks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffFile {
    /// Current path of the file
    pub path: String,
    /// Old path for renamed files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_path: Option<String>,
    /// What happened to the file
    pub status: ChangeStatus,
    /// Changed regions
    #[serde(default)]
    pub hunks: Vec<DiffHunk>,
    /// Unified patch text for this file, when the producer supplies it.
    /// Agents scan it for content; line resolution only uses the hunks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
}

impl DiffFile {
    /// Whether a new-side line is inside any added/context region.
    pub fn contains_new_line(&self, line: u32) -> bool {
        self.status != ChangeStatus::Deleted
            && self.hunks.iter().any(|h| h.contains_new_line(line))
    }

    /// The nearest valid new-side line for an out-of-range anchor, with the
    /// shift required to reach it. `None` for deleted files or files with
    /// no hunks.
    pub fn nearest_new_line(&self, line: u32) -> Option<(u32, u32)> {
        if self.status == ChangeStatus::Deleted || self.hunks.is_empty() {
            return None;
        }
        self.hunks
            .iter()
            .map(|h| {
                let (dist, snapped) = h.distance_to_new_line(line);
                (snapped, dist)
            })
            .min_by_key(|(_, dist)| *dist)
    }

    /// Total new-side lines covered by this file's hunks.
    pub fn new_line_count(&self) -> u32 {
        self.hunks.iter().map(|h| h.new_lines).sum()
    }
}

/// Look up a diff file by its current path.
pub fn find_file<'a>(files: &'a [DiffFile], path: &str) -> Option<&'a DiffFile> {
    files.iter().find(|f| f.path == path)
}

/// Whether a path matches the pre-rename location of any renamed file.
/// A finding addressed to an old path has no unambiguous new-side target.
pub fn is_stale_rename_path(files: &[DiffFile], path: &str) -> bool {
    files.iter().any(|f| {
        f.status == ChangeStatus::Renamed && f.previous_path.as_deref() == Some(path)
    })
}
