#![no_main]

use cue_read::{CueFileType, CueSheet};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    if let Ok(sheet) = CueSheet::parse(&text) {
        // A parsed sheet always names a binary file and round-trips its mode.
        assert_eq!(sheet.file_type, CueFileType::Binary);
        assert!(!sheet.data_file_name.is_empty());
        let _ = sheet.track_mode.to_string();
        let _ = sheet.index.map(|msf| msf.to_lba());
    }
});
