//! In-memory directory tree.

use std::collections::BTreeMap;

use crate::block::DirectoryRecord;
use crate::types::EntryKind;

/// Directory tree entry.
///
/// Built once at mount time and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Name without the `;version` suffix. Empty for the root.
    pub name: String,
    /// Entry type.
    pub kind: EntryKind,
    /// First sector of the extent.
    pub start_block: u32,
    /// Extent length in bytes.
    pub length: u64,
    /// Best-effort seconds since 1970, -1 if unknown.
    pub timestamp: i64,
    pub(crate) children: BTreeMap<String, DirEntry>,
}

impl DirEntry {
    /// Create from a directory record, without children.
    pub(crate) fn from_record(record: &DirectoryRecord) -> Self {
        Self {
            name: record.display_name(),
            kind: record.kind(),
            start_block: record.extent_lba,
            length: record.data_length as u64,
            timestamp: record.recorded.to_unix_timestamp(),
            children: BTreeMap::new(),
        }
    }

    /// Empty root directory.
    pub fn empty_root() -> Self {
        Self {
            name: String::new(),
            kind: EntryKind::Directory,
            start_block: 0,
            length: 0,
            timestamp: -1,
            children: BTreeMap::new(),
        }
    }

    /// Check if this is a directory.
    #[inline]
    pub const fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    /// Check if this is a file.
    #[inline]
    pub const fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    /// Immediate children, ordered by name. Always empty for files.
    #[inline]
    pub fn children(&self) -> impl Iterator<Item = &DirEntry> {
        self.children.values()
    }

    /// Number of immediate children.
    #[inline]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Find an immediate child by exact name.
    #[inline]
    pub fn child(&self, name: &str) -> Option<&DirEntry> {
        self.children.get(name)
    }

    /// Find an entry by path relative to this one.
    ///
    /// Path components are separated by '/'. Empty components are skipped,
    /// so `""` and `"/"` both name this entry.
    pub fn find_path(&self, path: &str) -> Option<&DirEntry> {
        path.split('/')
            .filter(|component| !component.is_empty())
            .try_fold(self, |current, component| current.child(component))
    }

    pub(crate) fn insert(&mut self, child: DirEntry) {
        self.children.insert(child.name.clone(), child);
    }

    /// Total number of entries below this one.
    pub fn descendant_count(&self) -> usize {
        self.children
            .values()
            .map(|child| 1 + child.descendant_count())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, length: u64) -> DirEntry {
        DirEntry {
            name: name.to_string(),
            kind: EntryKind::File,
            start_block: 30,
            length,
            timestamp: 0,
            children: BTreeMap::new(),
        }
    }

    fn tree() -> DirEntry {
        let mut sub = DirEntry::empty_root();
        sub.name = "SUB".into();
        sub.insert(file("INNER.BIN", 10));

        let mut root = DirEntry::empty_root();
        root.insert(file("A.DAT", 1234));
        root.insert(sub);
        root
    }

    #[test]
    fn test_find_path() {
        let root = tree();
        assert_eq!(root.find_path("").map(|e| e.is_dir()), Some(true));
        assert_eq!(root.find_path("/").map(|e| e.name.as_str()), Some(""));
        assert_eq!(root.find_path("A.DAT").map(|e| e.length), Some(1234));
        assert_eq!(
            root.find_path("SUB/INNER.BIN").map(|e| e.length),
            Some(10)
        );
        assert_eq!(
            root.find_path("/SUB//INNER.BIN").map(|e| e.length),
            Some(10)
        );
        assert!(root.find_path("SUB/MISSING").is_none());
        assert!(root.find_path("A.DAT/X").is_none());
    }

    #[test]
    fn test_children_sorted() {
        let root = tree();
        let names: Vec<_> = root.children().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["A.DAT", "SUB"]);
        assert_eq!(root.descendant_count(), 3);
    }
}
