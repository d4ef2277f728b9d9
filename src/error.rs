//! Error types for CUE archive operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::vfs::ErrorCode;

/// Error type for CUE archive operations.
#[derive(Debug, Error)]
pub enum CueError {
    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The cue sheet itself could not be opened or read.
    #[error("error opening CUE file '{}': {}", .path.display(), .source)]
    CueOpen {
        /// Path of the cue sheet.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// FILE command arguments did not match `"name" TYPE`.
    #[error("malformed arguments for FILE command: \"{0}\"")]
    MalformedFile(String),
    /// FILE command named a type other than BINARY.
    #[error("unsupported file type: \"{0}\"")]
    UnsupportedFileType(String),
    /// TRACK command arguments did not match `nn MODEx/yyyy`.
    #[error("malformed arguments for TRACK command: \"{0}\"")]
    MalformedTrack(String),
    /// TRACK command named an unknown or unimplemented mode.
    #[error("unknown/unimplemented track mode: \"{0}\"")]
    UnsupportedTrackMode(String),
    /// Input ended before a FILE, TRACK and INDEX sequence was seen.
    #[error("cue sheet ended before a complete FILE/TRACK/INDEX sequence")]
    IncompleteCueSheet,
    /// The data file named by the cue sheet does not exist.
    #[error("binary file does not exist: \"{}\"", .0.display())]
    MissingDataFile(PathBuf),
    /// The data file exists but could not be opened.
    #[error("error opening image file '{}': {}", .path.display(), .source)]
    ImageOpen {
        /// Path of the image.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// The descriptor at LBA 16 does not carry the `CD001` identifier.
    #[error("bad CD magic: {0:?}")]
    BadMagic([u8; 5]),
    /// The image ended inside a structure the reader needed.
    #[error("image truncated")]
    TruncatedImage,
    /// A directory record's declared length cannot hold its own fields.
    #[error("malformed directory record")]
    MalformedRecord,
    /// Directory nesting exceeded the configured limit.
    #[error("directory nesting deeper than {0} levels")]
    DirectoryTooDeep(usize),
    /// The directory tree holds more entries than the configured limit.
    #[error("directory tree larger than {0} entries")]
    TooManyEntries(usize),
    /// The stream cursor lies beyond the logical end of the stream.
    #[error("trying to read past end of stream")]
    ReadPastEnd,
    /// An extent whose last sector number does not fit in 32 bits.
    #[error("extent of {length} bytes at LBA {lba} exceeds the addressable range")]
    ExtentOutOfRange {
        /// First sector of the extent.
        lba: u32,
        /// Extent length in bytes.
        length: u64,
    },
    /// Seek target beyond the logical end of the stream.
    #[error("seek to {offset} beyond stream length {length}")]
    SeekOutOfRange {
        /// Requested logical offset.
        offset: u64,
        /// Logical length of the stream.
        length: u64,
    },
    /// No entry at the given path.
    #[error("entry not found: \"{0}\"")]
    NotFound(String),
    /// The path names a directory where a file was required.
    #[error("not a file: \"{0}\"")]
    NotAFile(String),
    /// Any attempt to modify the archive.
    #[error("archive is read-only")]
    ReadOnly,
    /// No registered archiver handles the given archive.
    #[error("unsupported archive: \"{0}\"")]
    UnsupportedArchive(String),
    /// An archiver for this extension is already registered.
    #[error("archiver for extension \"{0}\" already registered")]
    DuplicateArchiver(String),
}

impl CueError {
    /// The plugin contract error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Io(_) | Self::CueOpen { .. } | Self::ImageOpen { .. } => ErrorCode::Io,
            Self::MalformedFile(_)
            | Self::MalformedTrack(_)
            | Self::IncompleteCueSheet
            | Self::BadMagic(_)
            | Self::TruncatedImage
            | Self::MalformedRecord
            | Self::DirectoryTooDeep(_)
            | Self::TooManyEntries(_) => ErrorCode::Corrupt,
            Self::UnsupportedFileType(_)
            | Self::UnsupportedTrackMode(_)
            | Self::UnsupportedArchive(_) => ErrorCode::Unsupported,
            Self::MissingDataFile(_) | Self::NotFound(_) => ErrorCode::NotFound,
            Self::ReadPastEnd | Self::ExtentOutOfRange { .. } | Self::SeekOutOfRange { .. } => {
                ErrorCode::OutOfBounds
            }
            Self::NotAFile(_) => ErrorCode::NotAFile,
            Self::ReadOnly => ErrorCode::ReadOnly,
            Self::DuplicateArchiver(_) => ErrorCode::Duplicate,
        }
    }
}

impl From<CueError> for io::Error {
    fn from(err: CueError) -> Self {
        let kind = match err.code() {
            ErrorCode::NotFound => io::ErrorKind::NotFound,
            ErrorCode::ReadOnly => io::ErrorKind::PermissionDenied,
            ErrorCode::OutOfBounds => io::ErrorKind::InvalidInput,
            ErrorCode::Corrupt => io::ErrorKind::InvalidData,
            ErrorCode::Unsupported => io::ErrorKind::Unsupported,
            _ => io::ErrorKind::Other,
        };
        match err {
            CueError::Io(inner) => inner,
            other => io::Error::new(kind, other),
        }
    }
}

/// Result type for CUE archive operations.
pub type Result<T> = core::result::Result<T, CueError>;
