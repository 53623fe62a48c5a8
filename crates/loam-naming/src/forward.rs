//! Forward naming table: path → symbols defined there.

use std::collections::HashMap;

use loam_core::SourcePath;

use crate::file_info::FileInfo;
use crate::saved_state::NamingIndex;

/// Reflects disk only. Mutated exclusively by the change-backlog processor.
#[derive(Debug, Default)]
pub struct ForwardNamingTable {
    files: HashMap<SourcePath, FileInfo>,
}

impl ForwardNamingTable {
    pub fn from_index(index: &NamingIndex) -> Self {
        Self {
            files: index
                .files()
                .map(|(path, info)| (path.clone(), info.clone()))
                .collect(),
        }
    }

    pub fn file_info(&self, path: &SourcePath) -> Option<&FileInfo> {
        self.files.get(path)
    }

    /// Replace a file's info, returning the previous one. An empty info
    /// removes the file from the table.
    pub fn update(&mut self, path: &SourcePath, info: FileInfo) -> Option<FileInfo> {
        if info.is_empty() {
            self.files.remove(path)
        } else {
            self.files.insert(path.clone(), info)
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
