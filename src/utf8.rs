//! Name decoding.

use std::borrow::Cow;

/// Validate and convert bytes to a UTF-8 string.
///
/// Uses simdutf8 for fast validation when available.
#[inline]
pub fn from_utf8(bytes: &[u8]) -> Option<&str> {
    #[cfg(not(miri))]
    {
        simdutf8::basic::from_utf8(bytes).ok()
    }

    #[cfg(miri)]
    {
        core::str::from_utf8(bytes).ok()
    }
}

/// Decode a file identifier, replacing invalid sequences.
///
/// ISO-9660 d-characters are plain ASCII, so the lossy path only triggers on
/// non-conforming discs.
pub fn decode_name(bytes: &[u8]) -> String {
    match from_utf8(bytes) {
        Some(s) => s.to_owned(),
        None => match String::from_utf8_lossy(bytes) {
            Cow::Borrowed(s) => s.to_owned(),
            Cow::Owned(s) => s,
        },
    }
}
