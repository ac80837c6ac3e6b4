use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::trie::Trie;

/// Raw bytes of a path. Unix paths are arbitrary byte sequences, so no
/// UTF-8 round-trip happens there.
pub(crate) fn path_bytes(path: &Path) -> Vec<u8> {
    #[cfg(unix)]
    {
        use std::os::unix::ffi::OsStrExt;
        path.as_os_str().as_bytes().to_vec()
    }
    #[cfg(not(unix))]
    {
        path.to_string_lossy().into_owned().into_bytes()
    }
}

pub(crate) fn bytes_to_path(bytes: &[u8]) -> PathBuf {
    #[cfg(unix)]
    {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;
        PathBuf::from(OsStr::from_bytes(bytes))
    }
    #[cfg(not(unix))]
    {
        PathBuf::from(String::from_utf8_lossy(bytes).into_owned())
    }
}

/// Path index fed by directory scans: a byte trie plus the list of
/// directories scanned into it so far.
pub struct PathIndex {
    trie: Trie,
    scanned: Vec<PathBuf>,
}

impl PathIndex {
    pub fn new() -> Self {
        Self {
            trie: Trie::new(),
            scanned: Vec::new(),
        }
    }

    pub fn insert(&mut self, path: &[u8]) -> bool {
        self.trie.insert(path)
    }

    pub fn complete(&self, partial: &[u8]) -> Vec<Vec<u8>> {
        self.trie.prefix_search(partial)
    }

    /// Inserts the full path of every immediate entry of `dir` and records
    /// `dir` as scanned. Subdirectories are indexed as entries but not
    /// descended into. Returns the number of newly inserted paths.
    pub fn scan_dir(&mut self, dir: &Path) -> anyhow::Result<usize> {
        let entries =
            fs::read_dir(dir).with_context(|| format!("Read directory {}", dir.display()))?;

        let mut inserted = 0;
        for entry in entries {
            // read_dir never yields `.` or `..`
            let entry = entry.with_context(|| format!("Read entry in {}", dir.display()))?;
            if self.trie.insert(&path_bytes(&entry.path())) {
                inserted += 1;
            }
        }

        self.scanned.push(dir.to_path_buf());
        Ok(inserted)
    }

    pub fn scanned_dirs(&self) -> &[PathBuf] {
        &self.scanned
    }

    pub fn len(&self) -> usize {
        self.trie.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trie.is_empty()
    }
}

impl Default for PathIndex {
    fn default() -> Self {
        Self::new()
    }
}
