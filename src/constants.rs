//! Constants for CD sectors and ISO-9660 structures.

/// Cooked sector payload size, and the logical block size of every ISO-9660 volume we read.
pub const COOKED_SECTOR_SIZE: u32 = 2048;

/// Full raw sector size (sync + header + user data + EDC/ECC).
pub const RAW_SECTOR_SIZE: u32 = 2352;

/// Mode 2 sector without the sync and header fields.
pub const MODE2_SECTOR_SIZE: u32 = 2336;

/// Mode 2 Form 2 payload size.
pub const MODE2_FORM2_SIZE: u32 = 2324;

/// Sync pattern length at the start of a raw sector.
pub const SYNC_SIZE: u32 = 12;

/// Sector header length (minute, second, frame, mode).
pub const HEADER_SIZE: u32 = 4;

/// Mode 2 XA subheader length.
pub const SUBHEADER_SIZE: u32 = 8;

/// CD frames per second, as used by `mm:ss:ff` timecodes.
pub const FRAMES_PER_SECOND: u32 = 75;

/// Number of blocks in the ISO-9660 system area preceding the first volume descriptor.
pub const SYSTEM_AREA_BLOCKS: u32 = 16;

/// Size of a volume descriptor.
pub const VOLUME_DESCRIPTOR_SIZE: usize = 2048;

/// Standard identifier carried by every volume descriptor.
pub const ISO_STANDARD_ID: &[u8; 5] = b"CD001";

// Volume descriptor types
/// Primary volume descriptor.
pub const VD_PRIMARY: u8 = 1;
/// Volume descriptor set terminator.
pub const VD_TERMINATOR: u8 = 255;

/// Offset of the root directory record inside the primary volume descriptor.
pub const ROOT_RECORD_OFFSET: usize = 156;

/// Size of the root directory record embedded in the primary volume descriptor.
pub const ROOT_RECORD_SIZE: usize = 34;

/// Fixed part of a directory record, up to and including the name length byte.
pub const DIR_RECORD_HEADER_SIZE: usize = 33;

/// Largest possible directory record (its length is a single byte).
pub const MAX_DIR_RECORD_SIZE: usize = 255;

/// Separator between a file identifier and its version number.
pub const VERSION_SEPARATOR: u8 = b';';

// Directory record flags
/// The record describes a directory.
pub const FLAG_DIRECTORY: u8 = 0x02;
/// The file has further extents.
pub const FLAG_MULTI_EXTENT: u8 = 0x80;

/// Default limit on directory nesting during tree construction.
pub const DEFAULT_MAX_DIRECTORY_DEPTH: usize = 32;

/// Default limit on the number of entries in a directory tree.
pub const DEFAULT_MAX_ENTRIES: usize = 1 << 20;
