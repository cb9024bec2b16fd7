//! In-memory loopback transport (§4.1): used by the offline simulator
//! and by tests that want a real `AsyncRead + AsyncWrite` pair without
//! touching actual hardware.

use tokio::io::DuplexStream;

/// Buffer size for each direction of the duplex pipe. Generous relative
/// to any single frame (max 255-byte payload plus framing overhead).
const BUFFER_SIZE: usize = 4096;

/// Create a connected pair: the first half is wrapped into a [`super::Port`]
/// by the caller, the second is kept by a simulator or test driver to
/// inject bytes and observe writes.
pub fn pair() -> (DuplexStream, DuplexStream) {
    tokio::io::duplex(BUFFER_SIZE)
}
