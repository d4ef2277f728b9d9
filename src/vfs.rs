//! Virtual filesystem plugin contract.
//!
//! A host owns an [`ArchiverRegistry`], registers one [`Archiver`] per
//! archive format and mounts paths through it. Mounted archives hand out
//! [`VfsStream`]s for individual files. Closing an archive or destroying a
//! stream is dropping it.

use std::path::Path;

use log::info;

use crate::error::{CueError, Result};
use crate::stream::SectorStream;

/// Error classes reported across the plugin boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Operating system or file I/O failure.
    Io,
    /// The archive contents are malformed.
    Corrupt,
    /// Valid input this implementation does not handle.
    Unsupported,
    /// No such entry or file.
    NotFound,
    /// Position or length outside the stream.
    OutOfBounds,
    /// A directory was used where a file was required.
    NotAFile,
    /// The archive cannot be modified.
    ReadOnly,
    /// Something with the same key already exists.
    Duplicate,
}

/// Kind of a stat'ed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// Regular file.
    Regular,
    /// Directory.
    Directory,
}

/// Metadata for a single archive entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
    /// Entry kind.
    pub file_type: FileType,
    /// Size in bytes, 0 for directories.
    pub size: u64,
    /// Last access time, seconds since 1970 or -1.
    pub access_time: i64,
    /// Creation time, seconds since 1970 or -1.
    pub create_time: i64,
    /// Modification time, seconds since 1970 or -1.
    pub mod_time: i64,
    /// Entry cannot be written.
    pub readonly: bool,
}

/// Static description of an archive format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiverInfo {
    /// File extension handled, without the dot.
    pub extension: &'static str,
    /// Human readable format name.
    pub description: &'static str,
    /// Implementation author.
    pub author: &'static str,
    /// Project URL.
    pub url: &'static str,
    /// Whether the format can contain symbolic links.
    pub supports_symlinks: bool,
}

/// Return value of an enumeration callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enumerate {
    /// Keep going.
    Continue,
    /// Stop without error.
    Stop,
}

/// An open file inside an archive.
pub trait VfsStream: Send {
    /// Read up to `buf.len()` bytes, returning 0 at the end.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Write `buf`, returning the number of bytes written.
    fn write(&mut self, buf: &[u8]) -> Result<usize>;

    /// Move to absolute `offset`.
    fn seek(&mut self, offset: u64) -> Result<()>;

    /// Current position.
    fn tell(&self) -> u64;

    /// Total length.
    fn length(&self) -> u64;

    /// Independent stream over the same data at the same position.
    fn duplicate(&self) -> Result<Box<dyn VfsStream>>;

    /// Flush pending writes.
    fn flush(&mut self) -> Result<()>;
}

/// A mounted archive.
pub trait Archive: Send {
    /// Call `callback` with the name of each immediate child of `dir`.
    fn enumerate(&self, dir: &str, callback: &mut dyn FnMut(&str) -> Enumerate) -> Result<()>;

    /// Open a file for reading.
    fn open_read(&self, path: &str) -> Result<Box<dyn VfsStream>>;

    /// Open a file for writing, truncating it.
    fn open_write(&mut self, path: &str) -> Result<Box<dyn VfsStream>>;

    /// Open a file for appending.
    fn open_append(&mut self, path: &str) -> Result<Box<dyn VfsStream>>;

    /// Delete a file or empty directory.
    fn remove(&mut self, path: &str) -> Result<()>;

    /// Create a directory.
    fn mkdir(&mut self, path: &str) -> Result<()>;

    /// Entry metadata.
    fn stat(&self, path: &str) -> Result<Stat>;
}

/// Factory for one archive format.
pub trait Archiver: Send + Sync {
    /// Format description.
    fn info(&self) -> &ArchiverInfo;

    /// Mount the archive at `path`.
    fn open_archive(&self, path: &Path, for_writing: bool) -> Result<Box<dyn Archive>>;
}

/// Host-owned table of archivers keyed by extension.
#[derive(Default)]
pub struct ArchiverRegistry {
    archivers: Vec<Box<dyn Archiver>>,
}

impl ArchiverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an archiver. Fails if its extension is already taken.
    pub fn register(&mut self, archiver: Box<dyn Archiver>) -> Result<()> {
        let ext = archiver.info().extension;
        if self.find(ext).is_some() {
            return Err(CueError::DuplicateArchiver(ext.to_string()));
        }
        info!("Registered archiver {ext}: {}", archiver.info().description);
        self.archivers.push(archiver);
        Ok(())
    }

    /// Archiver for `extension` (case-insensitive, no dot).
    pub fn find(&self, extension: &str) -> Option<&dyn Archiver> {
        self.archivers
            .iter()
            .find(|a| a.info().extension.eq_ignore_ascii_case(extension))
            .map(|a| a.as_ref())
    }

    /// Registered archivers in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ArchiverInfo> {
        self.archivers.iter().map(|a| a.info())
    }

    /// Mount `path` with the archiver matching its extension.
    pub fn mount(&self, path: &Path, for_writing: bool) -> Result<Box<dyn Archive>> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let archiver = self
            .find(ext)
            .ok_or_else(|| CueError::UnsupportedArchive(path.display().to_string()))?;
        archiver.open_archive(path, for_writing)
    }
}

impl VfsStream for SectorStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        SectorStream::read(self, buf)
    }

    fn write(&mut self, _buf: &[u8]) -> Result<usize> {
        Err(CueError::ReadOnly)
    }

    fn seek(&mut self, offset: u64) -> Result<()> {
        SectorStream::seek(self, offset)
    }

    fn tell(&self) -> u64 {
        SectorStream::tell(self)
    }

    fn length(&self) -> u64 {
        self.len()
    }

    fn duplicate(&self) -> Result<Box<dyn VfsStream>> {
        Ok(Box::new(SectorStream::duplicate(self)?))
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::TrackMode;
    use std::io::Write;

    struct NullArchiver(ArchiverInfo);

    impl Archiver for NullArchiver {
        fn info(&self) -> &ArchiverInfo {
            &self.0
        }

        fn open_archive(&self, path: &Path, _for_writing: bool) -> Result<Box<dyn Archive>> {
            Err(CueError::NotFound(path.display().to_string()))
        }
    }

    fn null(ext: &'static str) -> Box<dyn Archiver> {
        Box::new(NullArchiver(ArchiverInfo {
            extension: ext,
            description: "test",
            author: "",
            url: "",
            supports_symlinks: false,
        }))
    }

    #[test]
    fn test_registry_find_case_insensitive() {
        let mut registry = ArchiverRegistry::new();
        registry.register(null("CUE")).unwrap();
        assert!(registry.find("cue").is_some());
        assert!(registry.find("Cue").is_some());
        assert!(registry.find("iso").is_none());
        assert_eq!(registry.iter().count(), 1);
    }

    #[test]
    fn test_registry_rejects_duplicates() {
        let mut registry = ArchiverRegistry::new();
        registry.register(null("CUE")).unwrap();
        let err = registry.register(null("cue")).err();
        assert!(matches!(err, Some(CueError::DuplicateArchiver(ref e)) if e == "cue"));
        assert_eq!(err.map(|e| e.code()), Some(ErrorCode::Duplicate));
    }

    #[test]
    fn test_registry_mount_dispatch() {
        let mut registry = ArchiverRegistry::new();
        registry.register(null("CUE")).unwrap();
        assert!(matches!(
            registry.mount(Path::new("disc.zip"), false).err(),
            Some(CueError::UnsupportedArchive(_))
        ));
        assert!(matches!(
            registry.mount(Path::new("noext"), false).err(),
            Some(CueError::UnsupportedArchive(_))
        ));
        // Reaches the archiver itself.
        assert!(matches!(
            registry.mount(Path::new("disc.cue"), false).err(),
            Some(CueError::NotFound(_))
        ));
    }

    #[test]
    fn test_sector_stream_is_read_only() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[7u8; 4096]).unwrap();
        file.flush().unwrap();

        let stream = SectorStream::open(file.path(), 0, 4096, TrackMode::Mode1_2048).unwrap();
        let mut stream: Box<dyn VfsStream> = Box::new(stream);
        assert_eq!(stream.length(), 4096);
        assert!(matches!(stream.write(b"x"), Err(CueError::ReadOnly)));
        assert!(stream.flush().is_ok());

        stream.seek(4000).unwrap();
        let dup = stream.duplicate().unwrap();
        assert_eq!(dup.tell(), 4000);

        let mut buf = [0u8; 200];
        assert_eq!(stream.read(&mut buf).unwrap(), 96);
        assert_eq!(dup.tell(), 4000);
    }
}
