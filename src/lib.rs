//! # cue-read
//!
//! Read-only access to the ISO-9660 data track of CUE/BIN CD images.
//!
//! A `.cue` sheet names a binary image and the sector layout of its first
//! track. This crate parses the sheet, maps logical user-data offsets onto
//! the raw sector layout and decodes the ISO-9660 directory tree, exposing
//! the result through a small virtual filesystem plugin contract.
//!
//! ## Features
//!
//! - All six common data track layouts (`MODE1/2048` through `MODE2/2352`)
//! - Sync, header and subheader bytes skipped transparently
//! - Directory tree decoded once at mount time, lookups never touch the image
//! - Independent, duplicable streams per open file
//! - `std::io::Read` + `std::io::Seek` on every stream
//!
//! ## Example
//!
//! ```ignore
//! use cue_read::{Archive, ArchiverRegistry, CueArchiver, Enumerate};
//!
//! let mut registry = ArchiverRegistry::new();
//! registry.register(Box::new(CueArchiver::new()))?;
//!
//! let archive = registry.mount(Path::new("game.cue"), false)?;
//! archive.enumerate("/", &mut |name| {
//!     println!("{name}");
//!     Enumerate::Continue
//! })?;
//!
//! let mut stream = archive.open_read("SYSTEM.CNF")?;
//! let mut buf = vec![0u8; stream.length() as usize];
//! stream.read(&mut buf)?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod archive;
mod block;
mod constants;
mod cue;
mod date;
mod dir;
mod error;
mod reader;
mod stream;
mod track;
mod types;
mod utf8;
mod vfs;

pub use archive::{CUE_ARCHIVER_INFO, CueArchive, CueArchiver, ImageHandle};
pub use block::*;
pub use constants::*;
pub use cue::{CueSheet, Msf};
pub use date::{IsoDate, IsoDecDate};
pub use dir::DirEntry;
pub use error::{CueError, Result};
pub use reader::{IsoReader, MountOptions, VolumeInfo};
pub use stream::SectorStream;
pub use track::{BlockGeometry, TrackMode};
pub use types::*;
pub use utf8::decode_name;
pub use vfs::{
    Archive, Archiver, ArchiverInfo, ArchiverRegistry, Enumerate, ErrorCode, FileType, Stat,
    VfsStream,
};
