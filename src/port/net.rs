//! Network-bridged serial transport (§4.1): a TCP connection to a
//! serial-to-Ethernet bridge, either raw bytes or a length-framed
//! wrapper around them.

use tokio::net::TcpStream;

use crate::error::PortError;

use super::PortId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetFraming {
    /// Bytes pass through untouched; the Frame Codec handles delimiting.
    Raw,
    /// Each write is preceded by a big-endian `u16` length prefix, and
    /// reads are de-prefixed the same way, for bridges that multiplex
    /// several logical streams over one TCP connection.
    LengthPrefixed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetParams {
    pub host: String,
    pub port: u16,
    pub framing: NetFraming,
}

pub(super) async fn open(port_id: PortId, params: &NetParams) -> Result<TcpStream, PortError> {
    TcpStream::connect((params.host.as_str(), params.port))
        .await
        .map_err(|e| PortError::Unavailable {
            port_id,
            cause: e.to_string(),
        })
}
