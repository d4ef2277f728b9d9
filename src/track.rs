//! Track modes and the sector addressing arithmetic they imply.

use core::fmt;

use crate::constants::*;

/// Data track sector layout, as declared by a CUE `TRACK` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackMode {
    /// Cooked Mode 1: 2048 bytes of user data per sector, nothing else.
    Mode1_2048,
    /// Raw Mode 1: sync, header, 2048 bytes of user data, EDC/ECC.
    Mode1_2352,
    /// Cooked Mode 2: 2048 bytes of user data per sector.
    Mode2_2048,
    /// Mode 2 Form 2 payload only.
    Mode2_2324,
    /// Mode 2 without sync and header: subheader, user data, EDC/ECC.
    Mode2_2336,
    /// Raw Mode 2: sync, header, subheader, user data, EDC/ECC.
    Mode2_2352,
}

/// Per-mode sector geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockGeometry {
    /// Bytes per sector in the image file.
    pub physical_stride: u32,
    /// Usable bytes per sector.
    pub user_data_size: u32,
    /// Bytes to skip from the start of a sector to reach its user data.
    pub user_data_offset: u32,
}

impl TrackMode {
    /// Every supported mode.
    pub const ALL: [TrackMode; 6] = [
        Self::Mode1_2048,
        Self::Mode1_2352,
        Self::Mode2_2048,
        Self::Mode2_2324,
        Self::Mode2_2336,
        Self::Mode2_2352,
    ];

    /// Bytes per sector in the image file.
    #[inline]
    pub const fn physical_stride(self) -> u32 {
        match self {
            Self::Mode1_2048 | Self::Mode2_2048 => COOKED_SECTOR_SIZE,
            Self::Mode1_2352 | Self::Mode2_2352 => RAW_SECTOR_SIZE,
            Self::Mode2_2336 => MODE2_SECTOR_SIZE,
            Self::Mode2_2324 => MODE2_FORM2_SIZE,
        }
    }

    /// Usable bytes per sector.
    #[inline]
    pub const fn user_data_size(self) -> u32 {
        match self {
            Self::Mode2_2324 => MODE2_FORM2_SIZE,
            _ => COOKED_SECTOR_SIZE,
        }
    }

    /// Offset of the user data within a sector.
    #[inline]
    pub const fn user_data_offset(self) -> u32 {
        match self {
            Self::Mode1_2048 | Self::Mode2_2048 | Self::Mode2_2324 => 0,
            Self::Mode1_2352 => SYNC_SIZE + HEADER_SIZE,
            Self::Mode2_2352 => SYNC_SIZE + HEADER_SIZE + SUBHEADER_SIZE,
            Self::Mode2_2336 => SUBHEADER_SIZE,
        }
    }

    /// Returns true for the 2048-byte modes, whose images are plain sequential user data.
    #[inline]
    pub const fn is_cooked(self) -> bool {
        matches!(self, Self::Mode1_2048 | Self::Mode2_2048)
    }

    /// All three geometry values at once.
    #[inline]
    pub const fn geometry(self) -> BlockGeometry {
        BlockGeometry {
            physical_stride: self.physical_stride(),
            user_data_size: self.user_data_size(),
            user_data_offset: self.user_data_offset(),
        }
    }

    /// Byte offset in the image file of the first user data byte of `lba`.
    #[inline]
    pub const fn byte_offset(self, lba: u32) -> u64 {
        lba as u64 * self.physical_stride() as u64 + self.user_data_offset() as u64
    }

    /// Number of user data bytes held by an image file of `image_size` bytes.
    ///
    /// A trailing partial sector in a raw image is not counted.
    #[inline]
    pub const fn logical_length(self, image_size: u64) -> u64 {
        if self.is_cooked() {
            image_size
        } else {
            (image_size / self.physical_stride() as u64) * self.user_data_size() as u64
        }
    }

    /// Parse a CUE mode string such as `MODE2/2352` (case-insensitive).
    pub fn from_cue_str(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_cue_str().eq_ignore_ascii_case(s))
    }

    /// The CUE spelling of this mode.
    pub const fn as_cue_str(self) -> &'static str {
        match self {
            Self::Mode1_2048 => "MODE1/2048",
            Self::Mode1_2352 => "MODE1/2352",
            Self::Mode2_2048 => "MODE2/2048",
            Self::Mode2_2324 => "MODE2/2324",
            Self::Mode2_2336 => "MODE2/2336",
            Self::Mode2_2352 => "MODE2/2352",
        }
    }
}

impl fmt::Display for TrackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_cue_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_table() {
        let expected = [
            (TrackMode::Mode1_2048, 2048, 2048, 0),
            (TrackMode::Mode2_2048, 2048, 2048, 0),
            (TrackMode::Mode1_2352, 2352, 2048, 16),
            (TrackMode::Mode2_2352, 2352, 2048, 24),
            (TrackMode::Mode2_2336, 2336, 2048, 8),
            (TrackMode::Mode2_2324, 2324, 2324, 0),
        ];
        for (mode, stride, size, offset) in expected {
            let g = mode.geometry();
            assert_eq!(g.physical_stride, stride, "{mode}");
            assert_eq!(g.user_data_size, size, "{mode}");
            assert_eq!(g.user_data_offset, offset, "{mode}");
            assert!(g.user_data_size + g.user_data_offset <= g.physical_stride);
        }
    }

    #[test]
    fn test_consecutive_offsets_differ_by_stride() {
        for mode in TrackMode::ALL {
            for lba in [0u32, 1, 15, 16, 17, 1000, 333_000] {
                let delta = mode.byte_offset(lba + 1) - mode.byte_offset(lba);
                assert_eq!(delta, mode.physical_stride() as u64, "{mode} at {lba}");
            }
        }
    }

    #[test]
    fn test_byte_offset_includes_header() {
        assert_eq!(TrackMode::Mode1_2352.byte_offset(16), 16 * 2352 + 16);
        assert_eq!(TrackMode::Mode2_2352.byte_offset(16), 16 * 2352 + 24);
        assert_eq!(TrackMode::Mode2_2336.byte_offset(2), 2 * 2336 + 8);
        assert_eq!(TrackMode::Mode1_2048.byte_offset(16), 16 * 2048);
    }

    #[test]
    fn test_from_cue_str() {
        assert_eq!(
            TrackMode::from_cue_str("MODE2/2352"),
            Some(TrackMode::Mode2_2352)
        );
        assert_eq!(
            TrackMode::from_cue_str("mode1/2048"),
            Some(TrackMode::Mode1_2048)
        );
        assert_eq!(TrackMode::from_cue_str("AUDIO"), None);
        assert_eq!(TrackMode::from_cue_str("MODE1/2336"), None);
    }

    #[test]
    fn test_logical_length() {
        assert_eq!(TrackMode::Mode1_2048.logical_length(5000), 5000);
        assert_eq!(TrackMode::Mode1_2352.logical_length(2352 * 3 + 100), 2048 * 3);
        assert_eq!(TrackMode::Mode2_2324.logical_length(2324 * 2), 2324 * 2);
    }
}
