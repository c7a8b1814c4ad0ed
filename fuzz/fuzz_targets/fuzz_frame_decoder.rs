//! Fuzz target: `FrameDecoder::feed` against `frame::decode`
//!
//! Drives arbitrary bytes through the streaming decoder and asserts that
//! it never panics, never yields a payload larger than its buffer, and that
//! every frame it accepts re-encodes to bytes the one-shot decoder accepts
//! with the same contents.
//!
//! cargo fuzz run fuzz_frame_decoder

#![no_main]

use hdlcrpc::hdlc::decoder::FrameDecoder;
use hdlcrpc::hdlc::frame;
use libfuzzer_sys::fuzz_target;

const BUFFER: usize = 256;

fuzz_target!(|data: &[u8]| {
    let mut decoder = FrameDecoder::<BUFFER>::new();

    for &byte in data {
        let Some(Ok(decoded)) = decoder.feed(byte) else {
            continue;
        };
        assert!(decoded.payload.len() + 6 <= BUFFER, "payload exceeds decode buffer");

        let mut encoded = [0u8; frame::max_encoded_len(BUFFER)];
        let n = frame::encode(decoded.address, decoded.control, decoded.payload, &mut encoded)
            .expect("worst-case buffer always fits");
        let mut out = [0u8; BUFFER];
        let again = frame::decode(&encoded[..n], &mut out).expect("re-encoded frame must decode");
        assert_eq!(again, decoded);
    }

    // After a reset the decoder must accept bytes cleanly again.
    decoder.reset();
    for &byte in data {
        let _ = decoder.feed(byte);
    }
});
