//! Resumable frame decoder (§4.2): `Hunt -> Header -> Length -> Body ->
//! Checksum -> Emit|Reject`. Pure state machine, no I/O — the Port layer
//! feeds it bytes one at a time as they arrive and reacts to whatever
//! [`DecodeEvent`] comes back.

use std::time::{Duration, Instant};

use super::{checksum, DecodeEvent, DecoderStats, Frame, FrameVariant};

/// Frame is aborted if this long passes between two bytes of the same
/// in-progress frame (§4.2).
pub const INTER_BYTE_TIMEOUT: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Looking for the start of a frame. For Pentair-16 this means the
    /// 3-byte preamble; for Pentair-2 the header byte is the start.
    Hunt,
    /// Collecting the fixed fields before the length byte is known.
    Header,
    /// Collecting `length` payload bytes.
    Body,
    /// Collecting the two checksum bytes.
    Checksum,
}

/// A resumable, single-frame-at-a-time decoder bound to one
/// [`FrameVariant`]. One instance lives per port for the lifetime of
/// the connection; `reset` is called on reconnect.
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    variant: FrameVariant,
    phase: Phase,
    /// Bytes from the header byte (`0xA5`) onward, accumulated for the
    /// eventual checksum comparison and frame construction.
    frame: Vec<u8>,
    /// How many preamble bytes have matched so far (Pentair-16 only).
    preamble_progress: usize,
    payload_len: usize,
    last_byte_at: Option<Instant>,
    pub stats: DecoderStats,
}

const PENTAIR16_PREAMBLE: [u8; 3] = [0xFF, 0x00, 0xFF];
/// Header byte + preamble-flag/second-header-byte + dest + src + action + length.
const PENTAIR16_FIXED_FIELDS: usize = 6;
/// Header byte + second header byte + dest + src + action + length.
const PENTAIR2_FIXED_FIELDS: usize = 6;

impl FrameDecoder {
    pub fn new(variant: FrameVariant) -> Self {
        Self {
            variant,
            phase: Phase::Hunt,
            frame: Vec::new(),
            preamble_progress: 0,
            payload_len: 0,
            last_byte_at: None,
            stats: DecoderStats::default(),
        }
    }

    /// Discard any in-progress frame and resume hunting. Used on
    /// reconnect and after a framing timeout.
    pub fn reset(&mut self) {
        self.phase = Phase::Hunt;
        self.frame.clear();
        self.preamble_progress = 0;
        self.payload_len = 0;
        self.last_byte_at = None;
    }

    /// Feed one more byte, observed at `now`. Returns an event whenever
    /// the byte completes or aborts a frame; `None` means "still
    /// accumulating, keep feeding".
    pub fn push(&mut self, byte: u8, now: Instant) -> Option<DecodeEvent> {
        if self.phase != Phase::Hunt {
            if let Some(last) = self.last_byte_at {
                if now.saturating_duration_since(last) > INTER_BYTE_TIMEOUT {
                    self.reset();
                    self.stats.framing_timeouts += 1;
                    return Some(DecodeEvent::FramingTimeout);
                }
            }
        }
        self.last_byte_at = Some(now);

        match self.phase {
            Phase::Hunt => self.push_hunt(byte),
            Phase::Header => self.push_header(byte),
            Phase::Body => self.push_body(byte),
            Phase::Checksum => self.push_checksum(byte),
        }
    }

    fn push_hunt(&mut self, byte: u8) -> Option<DecodeEvent> {
        match self.variant {
            FrameVariant::Pentair16 => {
                if byte == PENTAIR16_PREAMBLE[self.preamble_progress] {
                    self.preamble_progress += 1;
                    if self.preamble_progress == PENTAIR16_PREAMBLE.len() {
                        self.preamble_progress = 0;
                        self.phase = Phase::Header;
                        self.frame.clear();
                    }
                } else {
                    // Re-anchor: a 0xFF after a partial match may itself
                    // be the start of a fresh preamble.
                    self.preamble_progress = usize::from(byte == PENTAIR16_PREAMBLE[0]);
                }
                None
            }
            FrameVariant::Pentair2 => {
                if byte == 0xA5 {
                    self.phase = Phase::Header;
                    self.frame.clear();
                    self.frame.push(byte);
                }
                None
            }
        }
    }

    fn push_header(&mut self, byte: u8) -> Option<DecodeEvent> {
        self.frame.push(byte);

        let fixed_fields = match self.variant {
            FrameVariant::Pentair16 => PENTAIR16_FIXED_FIELDS,
            FrameVariant::Pentair2 => PENTAIR2_FIXED_FIELDS,
        };
        if self.frame.len() == fixed_fields {
            self.payload_len = *self.frame.last().unwrap() as usize;
            self.phase = if self.payload_len == 0 {
                Phase::Checksum
            } else {
                Phase::Body
            };
        }
        None
    }

    fn push_body(&mut self, byte: u8) -> Option<DecodeEvent> {
        self.frame.push(byte);
        let fixed_fields = match self.variant {
            FrameVariant::Pentair16 => PENTAIR16_FIXED_FIELDS,
            FrameVariant::Pentair2 => PENTAIR2_FIXED_FIELDS,
        };
        if self.frame.len() == fixed_fields + self.payload_len {
            self.phase = Phase::Checksum;
        }
        None
    }

    fn push_checksum(&mut self, byte: u8) -> Option<DecodeEvent> {
        self.frame.push(byte);
        let fixed_fields = match self.variant {
            FrameVariant::Pentair16 => PENTAIR16_FIXED_FIELDS,
            FrameVariant::Pentair2 => PENTAIR2_FIXED_FIELDS,
        };
        let total = fixed_fields + self.payload_len + 2;
        if self.frame.len() < total {
            return None;
        }

        let body_end = self.frame.len() - 2;
        let expected = checksum::compute(&self.frame[..body_end]);
        let actual = checksum::from_bytes(self.frame[body_end], self.frame[body_end + 1]);

        let event = if expected == actual {
            let (preamble_flag_idx, dest_idx, src_idx, action_idx) = (1, 2, 3, 4);
            let frame = Frame {
                variant: self.variant,
                preamble_flag: self.frame[preamble_flag_idx],
                dest: self.frame[dest_idx],
                src: self.frame[src_idx],
                action: self.frame[action_idx],
                payload: self.frame[fixed_fields..body_end].to_vec(),
            };
            self.stats.frames_emitted += 1;
            DecodeEvent::Frame(frame)
        } else {
            self.stats.checksum_errors += 1;
            DecodeEvent::ChecksumMismatch
        };

        // Single-byte resync: drop only the leading byte of this attempt
        // and resume hunting from the remainder (§4.2).
        let remainder: Vec<u8> = self.frame[1..].to_vec();
        self.reset();
        for b in remainder {
            // Re-feed without timeout bookkeeping; these bytes already
            // arrived within the original window.
            let now = self.last_byte_at.unwrap_or_else(Instant::now);
            let _ = self.push(b, now);
        }
        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(decoder: &mut FrameDecoder, bytes: &[u8]) -> Vec<DecodeEvent> {
        let now = Instant::now();
        bytes.iter().filter_map(|&b| decoder.push(b, now)).collect()
    }

    #[test]
    fn decodes_well_formed_pentair16_frame() {
        let wire = crate::codec::encoder::encode(&Frame::new(
            FrameVariant::Pentair16,
            0x10,
            0x00,
            0x86,
            vec![0x06, 0x01],
        ));
        let mut decoder = FrameDecoder::new(FrameVariant::Pentair16);
        let events = feed(&mut decoder, &wire);
        assert_eq!(events.len(), 1);
        match &events[0] {
            DecodeEvent::Frame(frame) => {
                assert_eq!(frame.dest, 0x10);
                assert_eq!(frame.action, 0x86);
                assert_eq!(frame.payload, vec![0x06, 0x01]);
            }
            other => panic!("expected a frame, got {other:?}"),
        }
        assert_eq!(decoder.stats.frames_emitted, 1);
        assert_eq!(decoder.stats.checksum_errors, 0);
    }

    #[test]
    fn decodes_well_formed_pentair2_frame() {
        let wire = crate::codec::encoder::encode(&Frame::new(
            FrameVariant::Pentair2,
            0x10,
            0x20,
            0x01,
            vec![0x01],
        ));
        let mut decoder = FrameDecoder::new(FrameVariant::Pentair2);
        let events = feed(&mut decoder, &wire);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], DecodeEvent::Frame(_)));
    }

    #[test]
    fn checksum_mismatch_resyncs_onto_following_frame() {
        // §8 scenario 2: a corrupted frame immediately followed by a
        // valid one must reject the first and still decode the second.
        let mut bad = crate::codec::encoder::encode(&Frame::new(
            FrameVariant::Pentair16,
            0x10,
            0x00,
            0x86,
            vec![0x06, 0x01],
        ));
        let last = bad.len() - 1;
        bad[last] ^= 0xFF;

        let good = crate::codec::encoder::encode(&Frame::new(
            FrameVariant::Pentair16,
            0x10,
            0x00,
            0x86,
            vec![0x07, 0x00],
        ));

        let mut wire = bad;
        wire.extend_from_slice(&good);

        let mut decoder = FrameDecoder::new(FrameVariant::Pentair16);
        let events = feed(&mut decoder, &wire);

        assert!(events
            .iter()
            .any(|e| matches!(e, DecodeEvent::ChecksumMismatch)));
        assert!(events.iter().any(|e| matches!(
            e,
            DecodeEvent::Frame(f) if f.payload == vec![0x07, 0x00]
        )));
        assert_eq!(decoder.stats.checksum_errors, 1);
    }

    #[test]
    fn inter_byte_timeout_aborts_and_resumes_hunting() {
        let wire = crate::codec::encoder::encode(&Frame::new(
            FrameVariant::Pentair2,
            0x10,
            0x20,
            0x01,
            vec![0x01],
        ));
        let mut decoder = FrameDecoder::new(FrameVariant::Pentair2);
        let start = Instant::now();
        for (i, &b) in wire.iter().enumerate() {
            let at = if i == 2 {
                start + Duration::from_millis(300)
            } else {
                start
            };
            let event = decoder.push(b, at);
            if i == 2 {
                assert_eq!(event, Some(DecodeEvent::FramingTimeout));
            }
        }
        assert_eq!(decoder.stats.framing_timeouts, 1);
    }
}
