//! Frame Codec (§4.2): Pentair-16 and Pentair-2 wire framing, a resumable
//! decoder state machine, and an encoder. The decoder is pure and
//! allocation-light — it holds no I/O handle, it is fed bytes one at a
//! time by the Port layer.

pub mod checksum;
pub mod decoder;
pub mod encoder;

use std::fmt;

/// Which framing a port speaks, selected per-port from the bound
/// [`crate::controller_type::ControllerType`] (§4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameVariant {
    /// `FF 00 FF A5 <flag> dest src action length payload... cksum-hi cksum-lo`
    Pentair16,
    /// `A5 00 dest src action length payload... cksum-hi cksum-lo`
    Pentair2,
}

impl fmt::Display for FrameVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pentair16 => "pentair-16",
            Self::Pentair2 => "pentair-2",
        })
    }
}

/// A decoded (or about-to-be-encoded) logical frame, variant-agnostic
/// above the wire layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub variant: FrameVariant,
    /// Second preamble byte on Pentair-16 (carries controller-address
    /// flags); meaningless on Pentair-2, always `0x00` there.
    pub preamble_flag: u8,
    pub dest: u8,
    pub src: u8,
    pub action: u8,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn new(variant: FrameVariant, dest: u8, src: u8, action: u8, payload: Vec<u8>) -> Self {
        Self {
            variant,
            preamble_flag: 0x00,
            dest,
            src,
            action,
            payload,
        }
    }

    /// `(peer, action)` half of the response-matcher correlation key
    /// (§4.4); the matcher adds the correlating-id on top of this.
    pub fn peer_action(&self) -> (u8, u8) {
        (self.src, self.action)
    }
}

/// Outcome of feeding one more byte to [`decoder::FrameDecoder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeEvent {
    /// A complete, checksum-valid frame.
    Frame(Frame),
    /// Checksum mismatch; the decoder already resynchronized by
    /// discarding the leading byte and resuming the hunt.
    ChecksumMismatch,
    /// Inter-byte silence exceeded the abort window mid-frame.
    FramingTimeout,
}

/// Running counters a port exposes for its decoder (§7 propagation
/// policy: "protocol errors below a 10/min threshold are logged and
/// ignored; above, the engine enters degraded").
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    pub checksum_errors: u64,
    pub framing_timeouts: u64,
    pub frames_emitted: u64,
}
