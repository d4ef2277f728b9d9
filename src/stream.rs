//! Seekable stream over the user data of a range of sectors.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use log::{debug, error, warn};

use crate::error::{CueError, Result};
use crate::track::TrackMode;

/// Seekable, readable stream over an extent of a CD image.
///
/// Logical positions count user data bytes only; sync, header and subheader
/// bytes of raw sectors are skipped transparently. Every stream owns its own
/// file handle, so independent streams over the same image never disturb
/// each other's position.
///
/// # Example
///
/// ```ignore
/// let mut stream = SectorStream::open("game.bin", 16, 2048, TrackMode::Mode2_2352)?;
/// let mut pvd = [0u8; 2048];
/// let n = stream.read(&mut pvd)?;
/// assert_eq!(n, 2048);
/// ```
#[derive(Debug)]
pub struct SectorStream {
    /// Kept for duplication.
    image_path: PathBuf,
    file: BufReader<File>,
    mode: TrackMode,
    lba_start: u32,
    lba_current: u32,
    pos_in_block: u32,
    length: u64,
}

impl SectorStream {
    /// Open a stream over `length` bytes of user data starting at sector `lba_start`.
    pub fn open(path: impl AsRef<Path>, lba_start: u32, length: u64, mode: TrackMode) -> Result<Self> {
        let blocks = length.div_ceil(mode.user_data_size() as u64);
        if lba_start as u64 + blocks > u32::MAX as u64 {
            error!("Extent at LBA {lba_start} with {length} bytes is not addressable");
            return Err(CueError::ExtentOutOfRange {
                lba: lba_start,
                length,
            });
        }
        let image_path = path.as_ref().to_path_buf();
        let file = open_image(&image_path)?;
        let mut stream = Self {
            image_path,
            file,
            mode,
            lba_start,
            lba_current: lba_start,
            pos_in_block: 0,
            length,
        };
        stream.reposition()?;
        Ok(stream)
    }

    /// Track mode used for addressing.
    #[inline]
    pub const fn track_mode(&self) -> TrackMode {
        self.mode
    }

    /// First sector of the stream.
    #[inline]
    pub const fn start_lba(&self) -> u32 {
        self.lba_start
    }

    /// Path of the image file backing this stream.
    #[inline]
    pub fn image_path(&self) -> &Path {
        &self.image_path
    }

    /// Logical length in bytes.
    #[inline]
    pub const fn len(&self) -> u64 {
        self.length
    }

    /// Returns true if the stream holds no data.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Current logical position.
    #[inline]
    pub const fn tell(&self) -> u64 {
        (self.lba_current - self.lba_start) as u64 * self.mode.user_data_size() as u64
            + self.pos_in_block as u64
    }

    /// Bytes left before the logical end, or an error if the cursor lies past it.
    pub fn remaining(&self) -> Result<u64> {
        self.length.checked_sub(self.tell()).ok_or(CueError::ReadPastEnd)
    }

    /// Read up to `buf.len()` bytes.
    ///
    /// Requests larger than what is left are clamped. Returns 0 at the
    /// logical end. A short count before the logical end means the image
    /// file itself ended early.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let remaining = self.remaining().inspect_err(|e| error!("{e}"))?;
        let want = if buf.len() as u64 > remaining {
            debug!(
                "Requested read of size {} is bigger than remaining {remaining} bytes",
                buf.len()
            );
            remaining as usize
        } else {
            buf.len()
        };
        if want == 0 {
            return Ok(0);
        }

        if self.mode.is_cooked() {
            self.read_cooked(&mut buf[..want])
        } else {
            self.read_blocks(&mut buf[..want])
        }
    }

    /// Cooked images are plain sequential data: one contiguous read.
    fn read_cooked(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = read_full(&mut self.file, buf)?;
        if n < buf.len() {
            warn!("Read buffer underrun! Wanted {} bytes, got {n}", buf.len());
        }
        let block_size = self.mode.user_data_size() as u64;
        let pos = self.pos_in_block as u64 + n as u64;
        self.lba_current = self.block_at(pos / block_size + self.lba_block_index())?;
        self.pos_in_block = (pos % block_size) as u32;
        Ok(n)
    }

    fn read_blocks(&mut self, buf: &mut [u8]) -> Result<usize> {
        let block_size = self.mode.user_data_size();
        let mut total = 0;
        while total < buf.len() {
            let in_block = (block_size - self.pos_in_block) as usize;
            let chunk = (buf.len() - total).min(in_block);
            let n = read_full(&mut self.file, &mut buf[total..total + chunk])?;
            total += n;
            self.pos_in_block += n as u32;
            if n < chunk {
                warn!("Read buffer underrun! Wanted {chunk} bytes, got {n}");
                return Ok(total);
            }
            if self.pos_in_block >= block_size {
                // Sectors are not contiguous in user data space.
                self.pos_in_block = 0;
                self.lba_current = self.block_at(self.lba_block_index() + 1)?;
                self.reposition()?;
            }
        }
        Ok(total)
    }

    /// Move to logical `offset`. Fails without moving if `offset` is past the end.
    pub fn seek(&mut self, offset: u64) -> Result<()> {
        if offset > self.length {
            return Err(CueError::SeekOutOfRange {
                offset,
                length: self.length,
            });
        }
        let block_size = self.mode.user_data_size() as u64;
        self.lba_current = self.block_at(offset / block_size)?;
        self.pos_in_block = (offset % block_size) as u32;
        self.reposition()
    }

    /// Open an independent stream at the same logical position.
    pub fn duplicate(&self) -> Result<Self> {
        let mut dup = Self {
            image_path: self.image_path.clone(),
            file: open_image(&self.image_path)?,
            mode: self.mode,
            lba_start: self.lba_start,
            lba_current: self.lba_current,
            pos_in_block: self.pos_in_block,
            length: self.length,
        };
        dup.reposition()?;
        Ok(dup)
    }

    /// Sector number `index` blocks past the start of the extent.
    fn block_at(&self, index: u64) -> Result<u32> {
        u32::try_from(index)
            .ok()
            .and_then(|index| self.lba_start.checked_add(index))
            .ok_or(CueError::ExtentOutOfRange {
                lba: self.lba_start,
                length: self.length,
            })
    }

    #[inline]
    const fn lba_block_index(&self) -> u64 {
        (self.lba_current - self.lba_start) as u64
    }

    /// Byte offset in the image file of the current logical position.
    #[inline]
    fn physical_position(&self) -> u64 {
        self.mode.byte_offset(self.lba_current) + self.pos_in_block as u64
    }

    /// Point the file cursor at the current logical position.
    fn reposition(&mut self) -> Result<()> {
        let target = self.physical_position();
        let current = self.file.stream_position()?;
        if target != current {
            // seek_relative keeps the buffer when the target lies inside it.
            self.file.seek_relative(target as i64 - current as i64)?;
        }
        Ok(())
    }
}

fn open_image(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| CueError::ImageOpen {
            path: path.to_path_buf(),
            source,
        })
}

/// Read until `buf` is full or the file ends.
fn read_full(file: &mut BufReader<File>, buf: &mut [u8]) -> io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match file.read(&mut buf[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(total)
}

impl Read for SectorStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        SectorStream::read(self, buf).map_err(io::Error::from)
    }
}

impl Seek for SectorStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::End(delta) => self.length.checked_add_signed(delta),
            SeekFrom::Current(delta) => self.tell().checked_add_signed(delta),
        };
        let target = target.ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "seek to a negative position")
        })?;
        SectorStream::seek(self, target)?;
        Ok(target)
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        Ok(self.tell())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// Raw image where every user data byte is `(lba * 7 + index) as u8`
    /// and every non-user byte is 0xEE.
    fn write_image(mode: TrackMode, blocks: u32) -> tempfile::NamedTempFile {
        let g = mode.geometry();
        let mut image = Vec::new();
        for lba in 0..blocks {
            let mut sector = vec![0xEEu8; g.physical_stride as usize];
            let start = g.user_data_offset as usize;
            for i in 0..g.user_data_size as usize {
                sector[start + i] = (lba as usize * 7 + i) as u8;
            }
            image.extend_from_slice(&sector);
        }
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&image).unwrap();
        file.flush().unwrap();
        file
    }

    fn expected(lba: u32, range: core::ops::Range<usize>) -> Vec<u8> {
        range.map(|i| (lba as usize * 7 + i) as u8).collect()
    }

    #[test]
    fn test_block_read_skips_headers() {
        for mode in TrackMode::ALL {
            let size = mode.user_data_size() as usize;
            let image = write_image(mode, 4);
            let length = mode.logical_length(4 * mode.physical_stride() as u64);
            let mut stream = SectorStream::open(image.path(), 0, length, mode).unwrap();
            stream.seek(size as u64 * 2).unwrap();
            let mut buf = vec![0u8; size];
            assert_eq!(stream.read(&mut buf).unwrap(), size, "{mode}");
            assert_eq!(buf, expected(2, 0..size), "{mode}");
        }
    }

    #[test]
    fn test_read_across_block_boundary() {
        for mode in TrackMode::ALL {
            let size = mode.user_data_size() as usize;
            let image = write_image(mode, 3);
            let mut stream = SectorStream::open(image.path(), 1, size as u64 * 2, mode).unwrap();
            stream.seek(size as u64 - 10).unwrap();
            let mut buf = [0u8; 20];
            assert_eq!(stream.read(&mut buf).unwrap(), 20);
            assert_eq!(&buf[..10], &expected(1, size - 10..size)[..], "{mode}");
            assert_eq!(&buf[10..], &expected(2, 0..10)[..], "{mode}");
            assert_eq!(stream.tell(), size as u64 + 10);
        }
    }

    #[test]
    fn test_read_clamped_to_length() {
        let mode = TrackMode::Mode1_2352;
        let image = write_image(mode, 2);
        let mut stream = SectorStream::open(image.path(), 0, 100, mode).unwrap();
        let mut buf = [0u8; 4096];
        assert_eq!(stream.read(&mut buf).unwrap(), 100);
        assert_eq!(stream.read(&mut buf).unwrap(), 0);
        assert_eq!(stream.tell(), 100);
    }

    #[test]
    fn test_cooked_read_tracks_position() {
        let mode = TrackMode::Mode1_2048;
        let image = write_image(mode, 3);
        let mut stream = SectorStream::open(image.path(), 0, 3 * 2048, mode).unwrap();
        let mut buf = [0u8; 3000];
        assert_eq!(stream.read(&mut buf).unwrap(), 3000);
        assert_eq!(stream.tell(), 3000);
        assert_eq!(stream.read(&mut buf).unwrap(), 3 * 2048 - 3000);
        assert_eq!(stream.tell(), 3 * 2048);
    }

    #[test]
    fn test_seek_tell_round_trip() {
        let mode = TrackMode::Mode2_2336;
        let image = write_image(mode, 2);
        let length = 2 * 2048;
        let mut stream = SectorStream::open(image.path(), 0, length, mode).unwrap();
        for offset in [0, 1, 2047, 2048, 2049, length - 1, length] {
            stream.seek(offset).unwrap();
            assert_eq!(stream.tell(), offset);
        }
        stream.seek(17).unwrap();
        assert!(matches!(
            stream.seek(length + 1),
            Err(CueError::SeekOutOfRange { .. })
        ));
        assert_eq!(stream.tell(), 17);
    }

    #[test]
    fn test_short_image_is_partial_read() {
        let mode = TrackMode::Mode2_2352;
        let image = write_image(mode, 1);
        // Claims two sectors but the file only holds one.
        let mut stream = SectorStream::open(image.path(), 0, 4096, mode).unwrap();
        let mut buf = [0u8; 4096];
        assert_eq!(stream.read(&mut buf).unwrap(), 2048);
        assert_eq!(stream.tell(), 2048);
    }

    #[test]
    fn test_duplicate_is_independent() {
        let mode = TrackMode::Mode1_2352;
        let image = write_image(mode, 3);
        let mut original = SectorStream::open(image.path(), 0, 3 * 2048, mode).unwrap();
        original.seek(2040).unwrap();
        let mut dup = original.duplicate().unwrap();

        let mut a = [0u8; 64];
        let mut b = [0u8; 64];
        original.read(&mut a).unwrap();
        dup.read(&mut b).unwrap();
        assert_eq!(a, b);

        original.read(&mut a).unwrap();
        assert_eq!(dup.tell(), 2040 + 64);
        assert_eq!(original.tell(), 2040 + 128);
    }

    #[test]
    fn test_extent_past_last_lba_rejected() {
        let mode = TrackMode::Mode1_2352;
        let image = write_image(mode, 1);
        let result = SectorStream::open(image.path(), u32::MAX - 1, 8192, mode);
        assert!(matches!(
            result,
            Err(CueError::ExtentOutOfRange { lba, length: 8192 }) if lba == u32::MAX - 1
        ));
    }

    #[test]
    fn test_extent_ending_at_last_lba() {
        let mode = TrackMode::Mode1_2352;
        let image = write_image(mode, 1);
        let mut stream = SectorStream::open(image.path(), u32::MAX - 4, 8192, mode).unwrap();
        stream.seek(6000).unwrap();
        assert_eq!(stream.tell(), 6000);
        // Far past the end of the file: a short read, not a wrapped address.
        let mut buf = [0u8; 16];
        assert_eq!(stream.read(&mut buf).unwrap(), 0);
        assert_eq!(stream.tell(), 6000);
        stream.seek(8192).unwrap();
        assert_eq!(stream.tell(), 8192);
    }

    #[test]
    fn test_io_traits() {
        let mode = TrackMode::Mode2_2352;
        let image = write_image(mode, 2);
        let mut stream = SectorStream::open(image.path(), 0, 2 * 2048, mode).unwrap();
        let pos = Seek::seek(&mut stream, SeekFrom::End(-16)).unwrap();
        assert_eq!(pos, 2 * 2048 - 16);
        let mut tail = Vec::new();
        stream.read_to_end(&mut tail).unwrap();
        assert_eq!(tail, expected(1, 2032..2048));
        assert!(Seek::seek(&mut stream, SeekFrom::Current(-5000)).is_err());
    }
}
