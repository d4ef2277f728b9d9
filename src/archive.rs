//! CUE/BIN archiver.

use std::fs;
use std::path::{Path, PathBuf};

use log::{error, info};

use crate::cue::CueSheet;
use crate::dir::DirEntry;
use crate::error::{CueError, Result};
use crate::reader::{IsoReader, MountOptions, VolumeInfo};
use crate::stream::SectorStream;
use crate::track::TrackMode;
use crate::vfs::{Archive, Archiver, ArchiverInfo, Enumerate, FileType, Stat, VfsStream};

/// Format description of the CUE archiver.
pub const CUE_ARCHIVER_INFO: ArchiverInfo = ArchiverInfo {
    extension: "CUE",
    description: "Cuesheet-Backed Image File",
    author: "cue-read contributors",
    url: "https://crates.io/crates/cue-read",
    supports_symlinks: false,
};

/// The data file named by a cue sheet, with an open stream over all of its user data.
#[derive(Debug)]
pub struct ImageHandle {
    path: PathBuf,
    track_mode: TrackMode,
    size: u64,
    stream: SectorStream,
}

impl ImageHandle {
    /// Open the image file at `path`.
    pub fn open(path: impl Into<PathBuf>, track_mode: TrackMode) -> Result<Self> {
        let path = path.into();
        let size = fs::metadata(&path)
            .map_err(|source| CueError::ImageOpen {
                path: path.clone(),
                source,
            })?
            .len();
        info!("Opening image {}, size {size} bytes", path.display());
        let stream = SectorStream::open(&path, 0, track_mode.logical_length(size), track_mode)?;
        Ok(Self {
            path,
            track_mode,
            size,
            stream,
        })
    }

    /// Image file path.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Track mode of the data track.
    #[inline]
    pub const fn track_mode(&self) -> TrackMode {
        self.track_mode
    }

    /// Image file size in bytes.
    #[inline]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// User data bytes the image holds.
    #[inline]
    pub const fn logical_length(&self) -> u64 {
        self.track_mode.logical_length(self.size)
    }

    /// Stream over the user data of the whole image.
    #[inline]
    pub fn stream(&self) -> &SectorStream {
        &self.stream
    }

    /// Mutable access to the whole-image stream.
    #[inline]
    pub fn stream_mut(&mut self) -> &mut SectorStream {
        &mut self.stream
    }

    /// Stream over one extent.
    pub fn open_extent(&self, start_block: u32, length: u64) -> Result<SectorStream> {
        SectorStream::open(&self.path, start_block, length, self.track_mode)
    }
}

/// Mounts `.cue` sheets describing single-track ISO-9660 images.
#[derive(Debug, Clone, Copy, Default)]
pub struct CueArchiver {
    options: MountOptions,
}

impl CueArchiver {
    /// Archiver with default mount options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Archiver with explicit mount options.
    pub const fn with_options(options: MountOptions) -> Self {
        Self { options }
    }

    /// Mount options in use.
    pub const fn options(&self) -> &MountOptions {
        &self.options
    }
}

impl Archiver for CueArchiver {
    fn info(&self) -> &ArchiverInfo {
        &CUE_ARCHIVER_INFO
    }

    fn open_archive(&self, path: &Path, for_writing: bool) -> Result<Box<dyn Archive>> {
        if for_writing {
            error!("CUE archives are read-only: {}", path.display());
            return Err(CueError::ReadOnly);
        }
        Ok(Box::new(CueArchive::open(path, self.options)?))
    }
}

/// A mounted CUE/BIN image.
#[derive(Debug)]
pub struct CueArchive {
    sheet: CueSheet,
    image: ImageHandle,
    volume: VolumeInfo,
    root: DirEntry,
}

impl CueArchive {
    /// Parse the cue sheet at `path`, locate its data file and read the tree.
    pub fn open(path: &Path, options: MountOptions) -> Result<Self> {
        let sheet = CueSheet::from_path(path)?;

        let bin_path = path
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(&sheet.data_file_name);
        if !bin_path.exists() {
            error!("Binary file does not exist: {}", bin_path.display());
            return Err(CueError::MissingDataFile(bin_path));
        }

        let mut image = ImageHandle::open(bin_path, sheet.track_mode)?;
        let (volume, root) = IsoReader::new(options).build_tree(image.stream_mut())?;

        Ok(Self {
            sheet,
            image,
            volume,
            root,
        })
    }

    /// Parsed cue sheet.
    #[inline]
    pub fn cue_sheet(&self) -> &CueSheet {
        &self.sheet
    }

    /// Volume descriptor information.
    #[inline]
    pub fn volume(&self) -> &VolumeInfo {
        &self.volume
    }

    /// Root of the directory tree.
    #[inline]
    pub fn root(&self) -> &DirEntry {
        &self.root
    }

    /// The mounted data file.
    #[inline]
    pub fn image(&self) -> &ImageHandle {
        &self.image
    }

    /// Path of the data file.
    #[inline]
    pub fn image_path(&self) -> &Path {
        self.image.path()
    }

    /// Track mode of the data file.
    #[inline]
    pub const fn track_mode(&self) -> TrackMode {
        self.image.track_mode()
    }

    /// Look up an entry by '/' separated path.
    pub fn entry(&self, path: &str) -> Result<&DirEntry> {
        self.root
            .find_path(path)
            .ok_or_else(|| CueError::NotFound(path.to_string()))
    }

    /// Open a file by path, returning the concrete stream type.
    pub fn open_file(&self, path: &str) -> Result<SectorStream> {
        let entry = self.entry(path)?;
        if entry.is_dir() {
            return Err(CueError::NotAFile(path.to_string()));
        }
        self.image.open_extent(entry.start_block, entry.length)
    }
}

impl Archive for CueArchive {
    fn enumerate(&self, dir: &str, callback: &mut dyn FnMut(&str) -> Enumerate) -> Result<()> {
        let entry = self.entry(dir)?;
        for child in entry.children() {
            if callback(&child.name) == Enumerate::Stop {
                break;
            }
        }
        Ok(())
    }

    fn open_read(&self, path: &str) -> Result<Box<dyn VfsStream>> {
        Ok(Box::new(self.open_file(path)?))
    }

    fn open_write(&mut self, _path: &str) -> Result<Box<dyn VfsStream>> {
        Err(CueError::ReadOnly)
    }

    fn open_append(&mut self, _path: &str) -> Result<Box<dyn VfsStream>> {
        Err(CueError::ReadOnly)
    }

    fn remove(&mut self, _path: &str) -> Result<()> {
        Err(CueError::ReadOnly)
    }

    fn mkdir(&mut self, _path: &str) -> Result<()> {
        Err(CueError::ReadOnly)
    }

    fn stat(&self, path: &str) -> Result<Stat> {
        let entry = self.entry(path)?;
        let (file_type, size) = if entry.is_dir() {
            (FileType::Directory, 0)
        } else {
            (FileType::Regular, entry.length)
        };
        Ok(Stat {
            file_type,
            size,
            access_time: entry.timestamp,
            create_time: entry.timestamp,
            mod_time: entry.timestamp,
            readonly: true,
        })
    }
}
