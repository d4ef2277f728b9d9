//! CUE sheet parsing.
//!
//! Only the first `FILE`/`TRACK`/`INDEX` sequence of a sheet is consumed: a
//! multi-track sheet is mounted with the first track's mode applied to the
//! whole data file.

use std::fs;
use std::path::Path;

use log::{error, info, warn};

use crate::constants::FRAMES_PER_SECOND;
use crate::error::{CueError, Result};
use crate::track::TrackMode;
use crate::types::CueFileType;

/// Timecode in `mm:ss:ff` form (75 frames per second).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Msf {
    /// Minutes.
    pub minutes: u8,
    /// Seconds (0-59).
    pub seconds: u8,
    /// Frames (0-74).
    pub frames: u8,
}

impl Msf {
    /// Create a timecode from its parts.
    #[inline]
    pub const fn new(minutes: u8, seconds: u8, frames: u8) -> Self {
        Self {
            minutes,
            seconds,
            frames,
        }
    }

    /// Sector number this timecode refers to, relative to the start of the file.
    #[inline]
    pub const fn to_lba(self) -> u32 {
        (self.minutes as u32 * 60 + self.seconds as u32) * FRAMES_PER_SECOND + self.frames as u32
    }
}

/// A parsed cue sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CueSheet {
    /// Data file name as written in the sheet, relative to the sheet's directory.
    pub data_file_name: String,
    /// Data file type. Always [`CueFileType::Binary`] for a successfully parsed sheet.
    pub file_type: CueFileType,
    /// Mode of the first track.
    pub track_mode: TrackMode,
    /// Number of the first track.
    pub track_number: u8,
    /// First index of the first track. Informational only.
    pub index: Option<Msf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParserState {
    Start,
    File,
    Track,
    Finish,
    Error,
}

/// Line-driven state machine accumulating the pieces of a [`CueSheet`].
struct CueParser {
    state: ParserState,
    error: Option<CueError>,
    data_file_name: String,
    file_type: Option<CueFileType>,
    track_mode: Option<TrackMode>,
    track_number: u8,
    index: Option<Msf>,
}

impl CueSheet {
    /// Parse a cue sheet from its text.
    pub fn parse(text: &str) -> Result<Self> {
        let mut parser = CueParser::new();
        for line in text.lines() {
            let Some((command, arg)) = split_command(line) else {
                continue;
            };
            parser.feed(command, arg);
            if matches!(parser.state, ParserState::Finish | ParserState::Error) {
                break;
            }
        }
        parser.finish()
    }

    /// Read and parse the cue sheet at `path`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|source| CueError::CueOpen {
            path: path.to_path_buf(),
            source,
        })?;
        let text = match simdutf8::basic::from_utf8(&bytes) {
            Ok(text) => std::borrow::Cow::Borrowed(text),
            Err(_) => {
                info!("CUE file is not valid UTF-8, using lossy conversion");
                String::from_utf8_lossy(&bytes)
            }
        };
        Self::parse(&text)
    }
}

impl CueParser {
    fn new() -> Self {
        Self {
            state: ParserState::Start,
            error: None,
            data_file_name: String::new(),
            file_type: None,
            track_mode: None,
            track_number: 0,
            index: None,
        }
    }

    fn feed(&mut self, command: &str, arg: &str) {
        let result = match self.state {
            ParserState::Start => self.parse_start(command, arg),
            ParserState::File => self.parse_file(command, arg),
            ParserState::Track => self.parse_track(command, arg),
            ParserState::Finish | ParserState::Error => {
                error!("CUE parser fed in terminal state {:?}", self.state);
                return;
            }
        };
        match result {
            Ok(true) => {
                self.state = match self.state {
                    ParserState::Start => ParserState::File,
                    ParserState::File => ParserState::Track,
                    _ => ParserState::Finish,
                };
            }
            Ok(false) => {}
            Err(e) => {
                error!("{e}");
                self.state = ParserState::Error;
                self.error = Some(e);
            }
        }
    }

    /// Waiting for `FILE "name" TYPE`.
    fn parse_start(&mut self, command: &str, arg: &str) -> Result<bool> {
        if !command.eq_ignore_ascii_case("FILE") {
            info!("Encountered unexpected command: \"{command}\", ignoring");
            return Ok(false);
        }
        let (name, type_str) =
            split_file_arg(arg).ok_or_else(|| CueError::MalformedFile(arg.to_string()))?;
        match CueFileType::from_cue_str(type_str) {
            Some(CueFileType::Binary) => {}
            _ => return Err(CueError::UnsupportedFileType(type_str.to_string())),
        }
        self.data_file_name = name.to_string();
        self.file_type = Some(CueFileType::Binary);
        Ok(true)
    }

    /// Waiting for `TRACK nn MODE`.
    fn parse_file(&mut self, command: &str, arg: &str) -> Result<bool> {
        if !command.eq_ignore_ascii_case("TRACK") {
            warn!("Encountered unexpected command: \"{command}\" (expected TRACK), ignoring");
            return Ok(false);
        }
        let (number, mode_str) =
            split_track_arg(arg).ok_or_else(|| CueError::MalformedTrack(arg.to_string()))?;
        if number != 1 {
            warn!("First track is not numbered 1 (actual number is {number})");
        }
        let mode = TrackMode::from_cue_str(mode_str)
            .ok_or_else(|| CueError::UnsupportedTrackMode(mode_str.to_string()))?;
        self.track_number = number;
        self.track_mode = Some(mode);
        Ok(true)
    }

    /// Waiting for `INDEX nn mm:ss:ff`. Anything else is ignored, including a
    /// malformed INDEX.
    fn parse_track(&mut self, command: &str, arg: &str) -> Result<bool> {
        if !command.eq_ignore_ascii_case("INDEX") {
            info!("Encountered unexpected/unknown command: \"{command}\", ignoring");
            return Ok(false);
        }
        match split_index_arg(arg) {
            Some((_, msf)) => {
                self.index = Some(msf);
                Ok(true)
            }
            None => {
                error!("Malformed arguments for INDEX command: \"{arg}\"");
                Ok(false)
            }
        }
    }

    fn finish(self) -> Result<CueSheet> {
        if let Some(e) = self.error {
            return Err(e);
        }
        match (self.state, self.file_type, self.track_mode) {
            (ParserState::Finish, Some(file_type), Some(track_mode)) => Ok(CueSheet {
                data_file_name: self.data_file_name,
                file_type,
                track_mode,
                track_number: self.track_number,
                index: self.index,
            }),
            _ => Err(CueError::IncompleteCueSheet),
        }
    }
}

#[inline]
fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Split a line into a command word and the rest of the line.
///
/// The command word must be followed by whitespace. Lines without that shape
/// (blank lines, bare words, lines starting with punctuation) yield `None`.
fn split_command(line: &str) -> Option<(&str, &str)> {
    let line = line.trim_start();
    let end = line.bytes().position(|b| !is_word_byte(b))?;
    if end == 0 || !line.as_bytes()[end].is_ascii_whitespace() {
        return None;
    }
    Some((&line[..end], line[end..].trim()))
}

/// `"name with spaces" BINARY` or `name.bin BINARY`.
fn split_file_arg(arg: &str) -> Option<(&str, &str)> {
    let split = arg.rfind(|c: char| c.is_ascii_whitespace())?;
    let type_str = &arg[split + 1..];
    if type_str.is_empty() || !type_str.bytes().all(is_word_byte) {
        return None;
    }
    let name = arg[..split].trim_end();
    let name = match name.strip_prefix('"') {
        Some(quoted) => quoted.strip_suffix('"')?,
        None => name,
    };
    if name.is_empty() {
        return None;
    }
    Some((name, type_str))
}

/// `01 MODE2/2352`.
fn split_track_arg(arg: &str) -> Option<(u8, &str)> {
    let mut parts = arg.split_ascii_whitespace();
    let number = parse_digits(parts.next()?, 1..=2)?;
    let mode = parts.next()?;
    if !mode.bytes().all(|b| is_word_byte(b) || b == b'/') {
        return None;
    }
    Some((number, mode))
}

/// `01 00:02:00`.
fn split_index_arg(arg: &str) -> Option<(u8, Msf)> {
    let mut parts = arg.split_ascii_whitespace();
    let number = parse_digits(parts.next()?, 1..=2)?;
    let mut time = parts.next()?.split(':');
    let minutes = parse_digits(time.next()?, 2..=2)?;
    let seconds = parse_digits(time.next()?, 2..=2)?;
    let frames = parse_digits(time.next()?, 2..=2)?;
    if time.next().is_some() {
        return None;
    }
    Some((number, Msf::new(minutes, seconds, frames)))
}

fn parse_digits(s: &str, len: core::ops::RangeInclusive<usize>) -> Option<u8> {
    if !len.contains(&s.len()) || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
