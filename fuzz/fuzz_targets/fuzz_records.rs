#![no_main]

use cue_read::{DirectoryRecord, VolumeDescriptor, VOLUME_DESCRIPTOR_SIZE};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() >= VOLUME_DESCRIPTOR_SIZE {
        if let Ok(vd) = VolumeDescriptor::parse(data) {
            let _ = vd.has_valid_magic();
            let _ = vd.created.to_unix_timestamp();
            let _ = vd.modified.to_unix_timestamp();
            let _ = vd.root.display_name();
        }
    }

    // Walk the input as a packed directory extent.
    let mut pos = 0;
    while pos < data.len() {
        let Ok(record) = DirectoryRecord::parse(&data[pos..]) else {
            break;
        };
        let _ = record.display_name();
        let _ = record.is_special();
        let _ = record.recorded.to_unix_timestamp();
        pos += record.length as usize;
    }
});
