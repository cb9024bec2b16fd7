//! Frame encoder (§4.2): fills in fixed fields, computes the checksum,
//! and produces one contiguous buffer. No partial writes are ever
//! visible to the Port layer — the whole `Vec<u8>` is handed to
//! `Port::write` in one call.

use super::{checksum, Frame, FrameVariant};

/// Maximum payload length representable in the single-byte length field.
pub const MAX_PAYLOAD_LEN: usize = 255;

/// Encode `frame` into its wire representation.
///
/// # Panics
/// Panics if `frame.payload.len()` exceeds [`MAX_PAYLOAD_LEN`] — that is
/// a programmer error at a call site, not a recoverable runtime
/// condition (intent handlers validate payload shape before this point).
pub fn encode(frame: &Frame) -> Vec<u8> {
    assert!(
        frame.payload.len() <= MAX_PAYLOAD_LEN,
        "payload of {} bytes exceeds the single-byte length field",
        frame.payload.len()
    );

    let mut header_through_payload = Vec::with_capacity(6 + frame.payload.len());
    header_through_payload.push(0xA5);
    match frame.variant {
        FrameVariant::Pentair16 => header_through_payload.push(frame.preamble_flag),
        FrameVariant::Pentair2 => header_through_payload.push(0x00),
    }
    header_through_payload.push(frame.dest);
    header_through_payload.push(frame.src);
    header_through_payload.push(frame.action);
    header_through_payload.push(frame.payload.len() as u8);
    header_through_payload.extend_from_slice(&frame.payload);

    let cksum = checksum::compute(&header_through_payload);
    let [hi, lo] = checksum::to_bytes(cksum);

    let mut out = Vec::with_capacity(3 + header_through_payload.len() + 2);
    if frame.variant == FrameVariant::Pentair16 {
        out.extend_from_slice(&[0xFF, 0x00, 0xFF]);
    }
    out.extend_from_slice(&header_through_payload);
    out.push(hi);
    out.push(lo);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_circuit_on_pentair16() {
        // §8 scenario 1: setCircuitState(6, true) against a Pentair-16 board.
        let frame = Frame::new(FrameVariant::Pentair16, 0x10, 0x00, 0x86, vec![0x06, 0x01]);
        let wire = encode(&frame);
        assert_eq!(&wire[0..8], &[0xFF, 0x00, 0xFF, 0xA5, 0x00, 0x10, 0x00, 0x86]);
        assert_eq!(&wire[8..11], &[0x02, 0x06, 0x01]);
        assert_eq!(wire.len(), 13);
    }

    #[test]
    fn encodes_pentair2_without_preamble() {
        let frame = Frame::new(FrameVariant::Pentair2, 0x10, 0x20, 0x01, vec![0x01]);
        let wire = encode(&frame);
        assert_eq!(&wire[0..6], &[0xA5, 0x00, 0x10, 0x20, 0x01, 0x01]);
        assert_eq!(wire.len(), 9);
    }

    #[test]
    #[should_panic]
    fn rejects_oversized_payload() {
        let frame = Frame::new(FrameVariant::Pentair2, 0, 0, 0, vec![0u8; 256]);
        let _ = encode(&frame);
    }
}
