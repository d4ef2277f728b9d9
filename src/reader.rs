//! ISO-9660 directory tree reader.

use log::{error, info, trace, warn};

use crate::block::{DirectoryRecord, VolumeDescriptor};
use crate::constants::*;
use crate::dir::DirEntry;
use crate::error::{CueError, Result};
use crate::stream::SectorStream;
use crate::types::EntryKind;

/// Options controlling how an image is mounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MountOptions {
    /// Reject volumes whose descriptor at LBA 16 lacks the `CD001` identifier.
    pub strict_volume_check: bool,
    /// Maximum directory nesting below the root.
    pub max_directory_depth: usize,
    /// Maximum number of entries in the whole tree.
    pub max_entries: usize,
}

impl Default for MountOptions {
    fn default() -> Self {
        Self {
            strict_volume_check: true,
            max_directory_depth: DEFAULT_MAX_DIRECTORY_DEPTH,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

impl MountOptions {
    /// Set whether a bad volume identifier aborts the mount.
    #[must_use]
    pub const fn with_strict_volume_check(mut self, strict: bool) -> Self {
        self.strict_volume_check = strict;
        self
    }

    /// Set the maximum directory nesting.
    #[must_use]
    pub const fn with_max_directory_depth(mut self, depth: usize) -> Self {
        self.max_directory_depth = depth;
        self
    }

    /// Set the maximum number of entries in the tree.
    #[must_use]
    pub const fn with_max_entries(mut self, entries: usize) -> Self {
        self.max_entries = entries;
        self
    }
}

/// Volume level information from the primary volume descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeInfo {
    /// Descriptor type byte.
    pub descriptor_type: u8,
    /// Volume identifier, trailing padding removed.
    pub volume_id: String,
    /// System identifier, trailing padding removed.
    pub system_id: String,
    /// Volume size in logical blocks.
    pub volume_space_size: u32,
    /// Logical block size.
    pub logical_block_size: u16,
    /// Volume creation time, -1 if unset.
    pub created: i64,
    /// Volume modification time, -1 if unset.
    pub modified: i64,
}

impl VolumeInfo {
    fn from_descriptor(vd: &VolumeDescriptor) -> Self {
        Self {
            descriptor_type: vd.descriptor_type,
            volume_id: vd.volume_id.clone(),
            system_id: vd.system_id.clone(),
            volume_space_size: vd.volume_space_size,
            logical_block_size: vd.logical_block_size,
            created: vd.created.to_unix_timestamp(),
            modified: vd.modified.to_unix_timestamp(),
        }
    }
}

/// Builds the directory tree of an ISO-9660 volume.
///
/// The whole tree is decoded once; afterwards lookups never touch the image.
///
/// # Example
///
/// ```ignore
/// let mut stream = SectorStream::open("game.bin", 0, len, TrackMode::Mode2_2352)?;
/// let (volume, root) = IsoReader::new(MountOptions::default()).build_tree(&mut stream)?;
/// println!("{}: {} entries", volume.volume_id, root.descendant_count());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct IsoReader {
    options: MountOptions,
}

impl IsoReader {
    /// Create a reader with the given options.
    pub const fn new(options: MountOptions) -> Self {
        Self { options }
    }

    /// Read and parse the volume descriptor at LBA 16.
    pub fn read_volume_descriptor(&self, stream: &mut SectorStream) -> Result<VolumeDescriptor> {
        let block_size = stream.track_mode().user_data_size() as u64;
        seek_to(stream, SYSTEM_AREA_BLOCKS as u64 * block_size)?;

        let mut buf = [0u8; VOLUME_DESCRIPTOR_SIZE];
        read_exact(stream, &mut buf)?;
        let vd = VolumeDescriptor::parse(&buf)?;

        if !vd.has_valid_magic() {
            error!(
                "Bad CD magic: {:?}, image is likely malformed",
                String::from_utf8_lossy(&vd.identifier)
            );
            if self.options.strict_volume_check {
                return Err(CueError::BadMagic(vd.identifier));
            }
        }
        if !vd.is_primary() {
            warn!(
                "Volume descriptor at LBA {} has type {}, expected primary",
                SYSTEM_AREA_BLOCKS, vd.descriptor_type
            );
        }
        Ok(vd)
    }

    /// Decode the volume descriptor and the full directory tree.
    pub fn build_tree(&self, stream: &mut SectorStream) -> Result<(VolumeInfo, DirEntry)> {
        let vd = self.read_volume_descriptor(stream)?;
        info!("Volume ID: {}", vd.volume_id);
        info!("Root directory record length: {}", vd.root.data_length);

        let mut root = DirEntry::from_record(&vd.root);
        root.name.clear();
        root.kind = EntryKind::Directory;
        let mut entries = 0;
        self.read_dir(stream, &vd.root, &mut root, 0, &mut entries)?;
        Ok((VolumeInfo::from_descriptor(&vd), root))
    }

    fn read_dir(
        &self,
        stream: &mut SectorStream,
        record: &DirectoryRecord,
        parent: &mut DirEntry,
        depth: usize,
        entries: &mut usize,
    ) -> Result<()> {
        if depth > self.options.max_directory_depth {
            return Err(CueError::DirectoryTooDeep(self.options.max_directory_depth));
        }

        let block_size = stream.track_mode().user_data_size() as u64;
        let base = record.extent_lba as u64 * block_size;
        let end = record.data_length as u64;
        let mut pos = 0u64;

        while pos + DIR_RECORD_HEADER_SIZE as u64 <= end {
            // Each child recursion moves the cursor, so always seek first.
            seek_to(stream, base + pos)?;
            let mut header = [0u8; DIR_RECORD_HEADER_SIZE];
            read_exact(stream, &mut header)?;

            let mut child_record = DirectoryRecord::parse_header(&header);
            if child_record.length == 0 {
                // Records never straddle a block; the rest of this one is padding.
                pos = (pos / block_size + 1) * block_size;
                continue;
            }

            let name_len = DirectoryRecord::name_len(&header);
            child_record.validate(name_len)?;
            let mut name = [0u8; MAX_DIR_RECORD_SIZE];
            read_exact(stream, &mut name[..name_len])?;
            child_record.set_name(&name[..name_len]);
            pos += child_record.length as u64;

            if child_record.is_special() {
                continue;
            }
            *entries += 1;
            if *entries > self.options.max_entries {
                return Err(CueError::TooManyEntries(self.options.max_entries));
            }

            let mut child = DirEntry::from_record(&child_record);
            trace!(
                "Entry {:?} ({:?}) at LBA {}, {} bytes",
                child.name, child.kind, child.start_block, child.length
            );
            if child_record.is_multi_extent() {
                warn!(
                    "{:?} spans several extents, only the first is mapped",
                    child.name
                );
            }
            if child_record.is_dir() {
                self.read_dir(stream, &child_record, &mut child, depth + 1, entries)?;
            }
            parent.insert(child);
        }
        Ok(())
    }
}

fn seek_to(stream: &mut SectorStream, offset: u64) -> Result<()> {
    stream.seek(offset).map_err(|e| match e {
        CueError::SeekOutOfRange { .. } => CueError::TruncatedImage,
        other => other,
    })
}

fn read_exact(stream: &mut SectorStream, buf: &mut [u8]) -> Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        match stream.read(&mut buf[filled..])? {
            0 => return Err(CueError::TruncatedImage),
            n => filled += n,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::TrackMode;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BS: usize = 2048;

    fn write_record(buf: &mut [u8], at: usize, name: &[u8], lba: u32, len: u32, flags: u8) -> usize {
        let rec_len = DIR_RECORD_HEADER_SIZE + name.len();
        let rec_len = rec_len + rec_len % 2;
        let rec = &mut buf[at..at + rec_len];
        rec[0] = rec_len as u8;
        rec[2..6].copy_from_slice(&lba.to_le_bytes());
        rec[6..10].copy_from_slice(&lba.to_be_bytes());
        rec[10..14].copy_from_slice(&len.to_le_bytes());
        rec[14..18].copy_from_slice(&len.to_be_bytes());
        rec[18..25].copy_from_slice(&[100, 1, 1, 0, 0, 0, 48]);
        rec[25] = flags;
        rec[32] = name.len() as u8;
        rec[33..33 + name.len()].copy_from_slice(name);
        rec_len
    }

    /// Cooked image: root at 18 containing NESTED/ (19) which contains itself.
    fn cyclic_image() -> Vec<u8> {
        let mut img = vec![0u8; 20 * BS];
        let pvd = &mut img[16 * BS..17 * BS];
        pvd[0] = VD_PRIMARY;
        pvd[1..6].copy_from_slice(ISO_STANDARD_ID);
        write_record(pvd, ROOT_RECORD_OFFSET, &[0], 18, BS as u32, FLAG_DIRECTORY);

        let root = &mut img[18 * BS..19 * BS];
        let mut at = write_record(root, 0, &[0], 18, BS as u32, FLAG_DIRECTORY);
        at += write_record(root, at, &[1], 18, BS as u32, FLAG_DIRECTORY);
        write_record(root, at, b"NESTED", 19, BS as u32, FLAG_DIRECTORY);

        let nested = &mut img[19 * BS..20 * BS];
        write_record(nested, 0, b"NESTED", 19, BS as u32, FLAG_DIRECTORY);
        img
    }

    /// Cooked image where sibling directories share extents:
    /// `/{A,B}/{C,D}/FILE`, ten entries from three extents.
    fn shared_extent_image(root_flags: u8) -> Vec<u8> {
        let mut img = vec![0u8; 21 * BS];
        let pvd = &mut img[16 * BS..17 * BS];
        pvd[0] = VD_PRIMARY;
        pvd[1..6].copy_from_slice(ISO_STANDARD_ID);
        write_record(pvd, ROOT_RECORD_OFFSET, &[0], 18, BS as u32, root_flags);

        let root = &mut img[18 * BS..19 * BS];
        let at = write_record(root, 0, b"A", 19, BS as u32, FLAG_DIRECTORY);
        write_record(root, at, b"B", 19, BS as u32, FLAG_DIRECTORY);

        let level1 = &mut img[19 * BS..20 * BS];
        let at = write_record(level1, 0, b"C", 20, BS as u32, FLAG_DIRECTORY);
        write_record(level1, at, b"D", 20, BS as u32, FLAG_DIRECTORY);

        let level2 = &mut img[20 * BS..21 * BS];
        write_record(level2, 0, b"FILE;1", 30, 10, 0);
        img
    }

    fn stream_for(img: &[u8]) -> (NamedTempFile, SectorStream) {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(img).unwrap();
        file.flush().unwrap();
        let stream =
            SectorStream::open(file.path(), 0, img.len() as u64, TrackMode::Mode1_2048).unwrap();
        (file, stream)
    }

    #[test]
    fn test_mount_options_builder() {
        let opts = MountOptions::default();
        assert!(opts.strict_volume_check);
        assert_eq!(opts.max_directory_depth, DEFAULT_MAX_DIRECTORY_DEPTH);

        assert_eq!(opts.max_entries, DEFAULT_MAX_ENTRIES);

        let opts = opts
            .with_strict_volume_check(false)
            .with_max_directory_depth(4)
            .with_max_entries(100);
        assert!(!opts.strict_volume_check);
        assert_eq!(opts.max_directory_depth, 4);
        assert_eq!(opts.max_entries, 100);
    }

    #[test]
    fn test_shared_extents_within_entry_limit() {
        let img = shared_extent_image(FLAG_DIRECTORY);
        let (_file, mut stream) = stream_for(&img);
        let reader = IsoReader::new(MountOptions::default().with_max_entries(10));
        let (_, root) = reader.build_tree(&mut stream).unwrap();
        assert_eq!(root.descendant_count(), 10);
        assert!(root.find_path("B/D/FILE").is_some_and(DirEntry::is_file));
    }

    #[test]
    fn test_entry_limit_exceeded() {
        let img = shared_extent_image(FLAG_DIRECTORY);
        let (_file, mut stream) = stream_for(&img);
        let reader = IsoReader::new(MountOptions::default().with_max_entries(9));
        assert!(matches!(
            reader.build_tree(&mut stream),
            Err(CueError::TooManyEntries(9))
        ));
    }

    #[test]
    fn test_root_is_directory_regardless_of_flags() {
        let mut img = shared_extent_image(0);
        img[16 * BS + 1..16 * BS + 6].copy_from_slice(b"\xFF\xFF\xFF\xFF\xFF");

        let (_file, mut stream) = stream_for(&img);
        let lenient = IsoReader::new(MountOptions::default().with_strict_volume_check(false));
        let (_, root) = lenient.build_tree(&mut stream).unwrap();
        assert!(root.is_dir());
        assert_eq!(root.name, "");
        assert_eq!(root.child_count(), 2);
    }

    #[test]
    fn test_cyclic_directory_rejected() {
        let img = cyclic_image();
        let (_file, mut stream) = stream_for(&img);
        let reader = IsoReader::new(MountOptions::default().with_max_directory_depth(3));
        assert!(matches!(
            reader.build_tree(&mut stream),
            Err(CueError::DirectoryTooDeep(3))
        ));
    }

    #[test]
    fn test_truncated_before_descriptor() {
        let img = vec![0u8; 10 * BS];
        let (_file, mut stream) = stream_for(&img);
        let result = IsoReader::default().build_tree(&mut stream);
        assert!(matches!(result, Err(CueError::TruncatedImage)));
    }

    #[test]
    fn test_bad_magic_strict_and_lenient() {
        let mut img = cyclic_image();
        img[16 * BS + 1..16 * BS + 6].copy_from_slice(b"XXXXX");
        // Break the cycle so the lenient mount can finish.
        img[19 * BS..20 * BS].fill(0);

        let (_file, mut stream) = stream_for(&img);
        assert!(matches!(
            IsoReader::default().build_tree(&mut stream),
            Err(CueError::BadMagic(m)) if &m == b"XXXXX"
        ));

        let lenient = IsoReader::new(MountOptions::default().with_strict_volume_check(false));
        let (_, root) = lenient.build_tree(&mut stream).unwrap();
        assert!(root.child("NESTED").is_some_and(DirEntry::is_dir));
        assert_eq!(root.find_path("NESTED").map(DirEntry::child_count), Some(0));
    }
}
