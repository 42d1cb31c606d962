#![no_main]

use std::collections::VecDeque;

use libfuzzer_sys::fuzz_target;
use thrift_rpc::*;

fuzz_target!(|data: &[u8]| {
    let mut input = NonContiguousBuffer::from(data);
    let before = input.byte_size();

    let mut out = VecDeque::new();
    let verdict = check_frames(&mut input, &mut out);

    match verdict {
        PacketVerdict::Full => {
            // Every emitted frame is whole: prefix plus declared body, and
            // the bytes removed from the input all landed in the queue.
            let emitted: usize = out.iter().map(|f| f.byte_size()).sum();
            assert_eq!(emitted + input.byte_size(), before);
            for frame in &out {
                let raw = frame.to_vec();
                let declared =
                    i32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize;
                assert_eq!(raw.len(), declared + 4);
            }
        }
        PacketVerdict::Less => {
            assert!(out.is_empty());
            assert_eq!(input.byte_size(), before);
        }
        PacketVerdict::Err => {}
    }
});
