//! Fuzz target: `Packet::decode`
//!
//! Any input must either be rejected or decode to a packet that encodes
//! back into exactly `encoded_size()` bytes and decodes to itself.
//!
//! cargo fuzz run fuzz_packet_decode

#![no_main]

use hdlcrpc::rpc::Packet;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(packet) = Packet::decode(data) else {
        return;
    };
    assert!(packet.payload.len() <= data.len());

    let mut buf = vec![0u8; packet.encoded_size()];
    let n = packet.encode(&mut buf).expect("encoded_size must be exact");
    assert_eq!(n, buf.len());
    assert_eq!(Packet::decode(&buf[..n]), Ok(packet));
});
