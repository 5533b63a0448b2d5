//! Fuzz target: `LineDecoder::push` + `parse_reply`
//!
//! Drives arbitrary byte sequences into the streaming line decoder and
//! parses every complete line as a host reply.  The decoder must never
//! panic, never yield an empty or over-long line, and must accept a clean
//! reply again after a reset.
//!
//! cargo fuzz run fuzz_line_decoder

#![no_main]

use ecorvm::link::HostReply;
use ecorvm::link::codec::{LineDecoder, MAX_LINE_LEN, parse_reply};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut decoder = LineDecoder::new();

    for &b in data {
        if let Some(Ok(line)) = decoder.push(b) {
            assert!(!line.is_empty(), "decoder must not yield empty lines");
            assert!(line.len() <= MAX_LINE_LEN, "line exceeds MAX_LINE_LEN");
            let _ = parse_reply(line);
        }
    }

    decoder.reset();
    let mut last = None;
    for &b in b"READY\n" {
        if let Some(r) = decoder.push(b) {
            last = Some(r.map(parse_reply));
        }
    }
    assert_eq!(last, Some(Ok(Ok(HostReply::UserFound { name: None }))));
});
