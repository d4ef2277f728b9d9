//! Core types shared across the crate.

use core::fmt;

/// Data file type named by a CUE `FILE` command.
///
/// Only [`CueFileType::Binary`] can be mounted; the others are recognised so
/// that errors can name them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueFileType {
    /// Raw little-endian binary image.
    Binary,
    /// Big-endian binary image.
    Motorola,
    /// AIFF audio.
    Aiff,
    /// RIFF WAVE audio.
    Wave,
    /// MPEG layer 3 audio.
    Mp3,
}

impl CueFileType {
    /// Parse a CUE file type keyword (case-insensitive).
    pub fn from_cue_str(s: &str) -> Option<Self> {
        const TYPES: [CueFileType; 5] = [
            CueFileType::Binary,
            CueFileType::Motorola,
            CueFileType::Aiff,
            CueFileType::Wave,
            CueFileType::Mp3,
        ];
        TYPES
            .into_iter()
            .find(|ty| ty.as_cue_str().eq_ignore_ascii_case(s))
    }

    /// The CUE keyword for this type.
    pub const fn as_cue_str(self) -> &'static str {
        match self {
            Self::Binary => "BINARY",
            Self::Motorola => "MOTOROLA",
            Self::Aiff => "AIFF",
            Self::Wave => "WAVE",
            Self::Mp3 => "MP3",
        }
    }
}

impl fmt::Display for CueFileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_cue_str())
    }
}

/// Entry type in the directory tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
}

impl EntryKind {
    /// Returns true if this is a directory.
    #[inline]
    pub const fn is_dir(self) -> bool {
        matches!(self, Self::Directory)
    }

    /// Returns true if this is a file.
    #[inline]
    pub const fn is_file(self) -> bool {
        matches!(self, Self::File)
    }
}
