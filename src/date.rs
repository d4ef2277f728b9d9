//! Date/time handling for ISO-9660 records.
//!
//! Conversions are deliberately approximate: every month has 30 days, a leap
//! day is added every fourth year since 1970 and leap seconds do not exist.
//! The resulting values are only meaningful for comparing timestamps taken
//! from the same disc.

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 60 * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: i64 = 24 * SECONDS_PER_HOUR;
const SECONDS_PER_YEAR: i64 = 365 * SECONDS_PER_DAY;
const SECONDS_PER_MONTH: i64 = 30 * SECONDS_PER_DAY;

/// Shared approximate calendar. Returns -1 for pre-epoch results.
const fn approx_unix_time(
    years_since_epoch: i64,
    month: i64,
    day: i64,
    hour: i64,
    minute: i64,
    second: i64,
    gmt_offset: u8,
) -> i64 {
    // Offset is counted in 15 minute units.
    let gmt_correction = 15 * (gmt_offset as i64 - 48);
    let seconds = years_since_epoch * SECONDS_PER_YEAR
        + (years_since_epoch / 4) * SECONDS_PER_DAY
        + (month - 1) * SECONDS_PER_MONTH
        + (day - 1) * SECONDS_PER_DAY
        + hour * SECONDS_PER_HOUR
        + (minute + gmt_correction) * SECONDS_PER_MINUTE
        + second;
    if seconds < 0 { -1 } else { seconds }
}

/// Seven-byte recording date of a directory record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IsoDate {
    /// Years since 1900.
    pub year: u8,
    /// Month (1-12).
    pub month: u8,
    /// Day of month (1-31).
    pub day: u8,
    /// Hour (0-23).
    pub hour: u8,
    /// Minute (0-59).
    pub minute: u8,
    /// Second (0-59).
    pub second: u8,
    /// GMT offset in 15 minute intervals.
    pub gmt_offset: u8,
}

impl IsoDate {
    /// Decode from the raw record bytes.
    #[inline]
    pub const fn from_bytes(b: &[u8; 7]) -> Self {
        Self {
            year: b[0],
            month: b[1],
            day: b[2],
            hour: b[3],
            minute: b[4],
            second: b[5],
            gmt_offset: b[6],
        }
    }

    /// Best-effort seconds since 1970, or -1 if the result would be negative.
    #[inline]
    pub const fn to_unix_timestamp(self) -> i64 {
        approx_unix_time(
            self.year as i64 - 70,
            self.month as i64,
            self.day as i64,
            self.hour as i64,
            self.minute as i64,
            self.second as i64,
            self.gmt_offset,
        )
    }
}

/// Seventeen-byte ASCII date of a volume descriptor (`YYYYMMDDHHMMSSss` + offset).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IsoDecDate {
    /// Raw digits.
    pub digits: [u8; 16],
    /// GMT offset in 15 minute intervals.
    pub gmt_offset: u8,
}

impl IsoDecDate {
    /// Decode from the raw descriptor bytes.
    #[inline]
    pub fn from_bytes(b: &[u8; 17]) -> Self {
        let mut digits = [0u8; 16];
        digits.copy_from_slice(&b[..16]);
        Self {
            digits,
            gmt_offset: b[16],
        }
    }

    /// Returns true if every digit position is `'0'` or unset, the ISO-9660
    /// encoding of "not specified".
    pub fn is_unset(&self) -> bool {
        self.digits.iter().all(|&d| d == b'0' || d == 0 || d == b' ')
    }

    fn field(&self, start: usize, len: usize) -> Option<i64> {
        self.digits[start..start + len]
            .iter()
            .try_fold(0i64, |acc, &d| {
                d.is_ascii_digit().then(|| acc * 10 + (d - b'0') as i64)
            })
    }

    /// Best-effort seconds since 1970, or -1 if unset, malformed or pre-epoch.
    pub fn to_unix_timestamp(self) -> i64 {
        if self.is_unset() {
            return -1;
        }
        let parts = (
            self.field(0, 4),
            self.field(4, 2),
            self.field(6, 2),
            self.field(8, 2),
            self.field(10, 2),
            self.field(12, 2),
        );
        let (Some(year), Some(month), Some(day), Some(hour), Some(minute), Some(second)) = parts
        else {
            return -1;
        };
        approx_unix_time(
            (year - 1970).max(0),
            month,
            day,
            hour,
            minute,
            second,
            self.gmt_offset,
        )
    }
}
