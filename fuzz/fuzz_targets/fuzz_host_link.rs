//! Fuzz target: `HostLink::poll_reply`
//!
//! Feeds arbitrary host traffic through the in-memory transport in small
//! reads and polls until the input is exhausted.  Each poll must return
//! within one read and the link must drain everything it was given.
//!
//! cargo fuzz run fuzz_host_link

#![no_main]

use ecorvm::link::host::HostLink;
use ecorvm::link::transport::MemoryTransport;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let chunk = data.first().map_or(1, |&b| usize::from(b % 16) + 1);
    let mut link = HostLink::new(MemoryTransport::new().with_read_chunk(chunk));
    link.transport_mut().inject(data);

    // Every poll consumes at least one byte or reports an empty transport.
    for _ in 0..=data.len() {
        let _ = link.poll_reply();
    }
    assert_eq!(link.transport_mut().pending_rx(), 0);
});
