//! ISO-9660 structure parsing.
//!
//! Both-endian fields are decoded from their little-endian half at explicit
//! offsets; nothing relies on in-memory struct layout.

use crate::constants::*;
use crate::date::{IsoDate, IsoDecDate};
use crate::error::{CueError, Result};
use crate::types::EntryKind;
use crate::utf8;

/// Read a little-endian u16 at `offset`.
#[inline]
pub fn read_u16_le(buf: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([buf[offset], buf[offset + 1]])
}

/// Read a little-endian u32 at `offset`.
#[inline]
pub fn read_u32_le(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ])
}

/// Decode a space-padded a-/d-character field.
fn read_padded_str(buf: &[u8]) -> String {
    let end = buf
        .iter()
        .rposition(|&b| b != b' ' && b != 0)
        .map_or(0, |i| i + 1);
    utf8::decode_name(&buf[..end])
}

/// Parsed directory record.
#[derive(Debug, Clone)]
pub struct DirectoryRecord {
    /// Total record length, including the name and system use area.
    pub length: u8,
    /// Extended attribute record length.
    pub xattr_length: u8,
    /// First sector of the extent.
    pub extent_lba: u32,
    /// Extent length in bytes.
    pub data_length: u32,
    /// Recording date and time.
    pub recorded: IsoDate,
    /// File flags.
    pub flags: u8,
    /// File unit size (interleaved files).
    pub unit_size: u8,
    /// Interleave gap size.
    pub gap_size: u8,
    /// Volume sequence number.
    pub volume_sequence: u16,
    /// Raw file identifier. Empty until [`DirectoryRecord::set_name`] is called.
    pub name: Vec<u8>,
}

impl DirectoryRecord {
    /// Parse the fixed 33-byte part of a record.
    ///
    /// The name length is available as [`DirectoryRecord::name_len`] from
    /// the raw header; the name itself is read separately.
    pub fn parse_header(buf: &[u8; DIR_RECORD_HEADER_SIZE]) -> Self {
        let mut time = [0u8; 7];
        time.copy_from_slice(&buf[18..25]);
        Self {
            length: buf[0],
            xattr_length: buf[1],
            extent_lba: read_u32_le(buf, 2),
            data_length: read_u32_le(buf, 10),
            recorded: IsoDate::from_bytes(&time),
            flags: buf[25],
            unit_size: buf[26],
            gap_size: buf[27],
            volume_sequence: read_u16_le(buf, 28),
            name: Vec::new(),
        }
    }

    /// Name length byte of a raw header.
    #[inline]
    pub const fn name_len(buf: &[u8; DIR_RECORD_HEADER_SIZE]) -> usize {
        buf[32] as usize
    }

    /// Parse a complete record: header followed by the name.
    pub fn parse(buf: &[u8]) -> Result<Self> {
        let header: &[u8; DIR_RECORD_HEADER_SIZE] = buf
            .get(..DIR_RECORD_HEADER_SIZE)
            .and_then(|h| h.try_into().ok())
            .ok_or(CueError::MalformedRecord)?;
        let mut record = Self::parse_header(header);
        let name_end = DIR_RECORD_HEADER_SIZE + Self::name_len(header);
        let name = buf
            .get(DIR_RECORD_HEADER_SIZE..name_end)
            .ok_or(CueError::MalformedRecord)?;
        record.validate(name.len())?;
        record.set_name(name);
        Ok(record)
    }

    /// Check that the declared record length can hold a name of `name_len` bytes.
    pub fn validate(&self, name_len: usize) -> Result<()> {
        if (self.length as usize) < DIR_RECORD_HEADER_SIZE + name_len {
            return Err(CueError::MalformedRecord);
        }
        Ok(())
    }

    /// Attach the raw file identifier.
    pub fn set_name(&mut self, name: &[u8]) {
        self.name.clear();
        self.name.extend_from_slice(name);
    }

    /// Returns true if the record describes a directory.
    #[inline]
    pub const fn is_dir(&self) -> bool {
        self.flags & FLAG_DIRECTORY != 0
    }

    /// Returns true if the file continues in a further record.
    #[inline]
    pub const fn is_multi_extent(&self) -> bool {
        self.flags & FLAG_MULTI_EXTENT != 0
    }

    /// Entry kind derived from the flags.
    #[inline]
    pub const fn kind(&self) -> EntryKind {
        if self.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        }
    }

    /// Returns true for the `\0` (self) and `\1` (parent) identifiers, and
    /// anything else whose first byte is not alphanumeric.
    #[inline]
    pub fn is_special(&self) -> bool {
        !self.name.first().is_some_and(u8::is_ascii_alphanumeric)
    }

    /// File identifier with the `;version` suffix removed.
    pub fn display_name(&self) -> String {
        let end = memchr::memchr(VERSION_SEPARATOR, &self.name).unwrap_or(self.name.len());
        utf8::decode_name(&self.name[..end])
    }
}

/// Parsed volume descriptor (primary layout).
#[derive(Debug, Clone)]
pub struct VolumeDescriptor {
    /// Descriptor type.
    pub descriptor_type: u8,
    /// Standard identifier, `CD001` on a valid volume.
    pub identifier: [u8; 5],
    /// Descriptor version.
    pub version: u8,
    /// System identifier.
    pub system_id: String,
    /// Volume identifier.
    pub volume_id: String,
    /// Volume space size in logical blocks.
    pub volume_space_size: u32,
    /// Logical block size.
    pub logical_block_size: u16,
    /// Root directory record.
    pub root: DirectoryRecord,
    /// Volume creation time.
    pub created: IsoDecDate,
    /// Volume modification time.
    pub modified: IsoDecDate,
}

impl VolumeDescriptor {
    /// Parse a 2048-byte volume descriptor.
    ///
    /// The identifier is not checked here; see [`VolumeDescriptor::has_valid_magic`].
    pub fn parse(buf: &[u8]) -> Result<Self> {
        if buf.len() < VOLUME_DESCRIPTOR_SIZE {
            return Err(CueError::TruncatedImage);
        }
        let mut identifier = [0u8; 5];
        identifier.copy_from_slice(&buf[1..6]);

        let root = DirectoryRecord::parse(
            &buf[ROOT_RECORD_OFFSET..ROOT_RECORD_OFFSET + ROOT_RECORD_SIZE],
        )?;

        let mut created = [0u8; 17];
        created.copy_from_slice(&buf[813..830]);
        let mut modified = [0u8; 17];
        modified.copy_from_slice(&buf[830..847]);

        Ok(Self {
            descriptor_type: buf[0],
            identifier,
            version: buf[6],
            system_id: read_padded_str(&buf[8..40]),
            volume_id: read_padded_str(&buf[40..72]),
            volume_space_size: read_u32_le(buf, 80),
            logical_block_size: read_u16_le(buf, 128),
            root,
            created: IsoDecDate::from_bytes(&created),
            modified: IsoDecDate::from_bytes(&modified),
        })
    }

    /// Returns true if the identifier is `CD001`.
    #[inline]
    pub fn has_valid_magic(&self) -> bool {
        &self.identifier == ISO_STANDARD_ID
    }

    /// Returns true if this is a primary volume descriptor.
    #[inline]
    pub const fn is_primary(&self) -> bool {
        self.descriptor_type == VD_PRIMARY
    }
}
