//! Port Layer (§4.1): a named, numbered transport endpoint — local
//! serial, network-bridged serial, or in-memory loopback — behind one
//! `open`/`close`/`write`/read-byte-stream surface, with reconnect
//! backoff and connection counters.

pub mod loopback;
pub mod net;
pub mod reconnect;
pub mod serial;

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use arc_swap::ArcSwapOption;
use log::{info, warn};
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::sync::Mutex as AsyncMutex;
use tokio_serial::SerialStream;

use crate::error::PortError;

use net::{NetFraming, NetParams};
use reconnect::ReconnectBackoff;
use serial::SerialParams;

/// Primary port is always id 0; auxiliary ports are 1..N (§4.1).
pub type PortId = u8;
pub const PRIMARY_PORT: PortId = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortKind {
    Serial,
    Net,
    Loopback,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PortConfig {
    Serial(SerialParams),
    Net(NetParams),
    /// Loopback ports are constructed already-open via
    /// [`Port::new_loopback`]; this variant only exists so `kind()` and
    /// diagnostics can describe one uniformly.
    Loopback,
}

impl PortConfig {
    pub fn kind(&self) -> PortKind {
        match self {
            Self::Serial(_) => PortKind::Serial,
            Self::Net(_) => PortKind::Net,
            Self::Loopback => PortKind::Loopback,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortStatus {
    Open,
    Reconnecting,
    Closed,
}

/// Connection statistics exposed per port (§4.1).
#[derive(Debug, Default)]
pub struct PortCounters {
    pub bytes_in: AtomicU64,
    pub bytes_out: AtomicU64,
    pub reconnects: AtomicU64,
}

enum Transport {
    Serial(SerialStream),
    Net(tokio::net::TcpStream),
    Loopback(DuplexStream),
}

impl Transport {
    async fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        match self {
            Self::Serial(s) => s.write_all(buf).await,
            Self::Net(s) => s.write_all(buf).await,
            Self::Loopback(s) => s.write_all(buf).await,
        }
    }

    async fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Self::Serial(s) => s.read(buf).await,
            Self::Net(s) => s.read(buf).await,
            Self::Loopback(s) => s.read(buf).await,
        }
    }
}

/// A named, numbered endpoint. Owns exactly one transport at a time;
/// reconnect tears it down and rebuilds a fresh one rather than trying
/// to resurrect a half-open socket.
pub struct Port {
    pub id: PortId,
    config: PortConfig,
    transport: AsyncMutex<Option<Transport>>,
    status: AsyncMutex<PortStatus>,
    pub counters: PortCounters,
    last_error: ArcSwapOption<String>,
    last_byte_at: AsyncMutex<Option<Instant>>,
    backoff: AsyncMutex<ReconnectBackoff>,
}

impl Port {
    pub fn new(id: PortId, config: PortConfig) -> Self {
        Self {
            id,
            config,
            transport: AsyncMutex::new(None),
            status: AsyncMutex::new(PortStatus::Closed),
            counters: PortCounters::default(),
            last_error: ArcSwapOption::empty(),
            last_byte_at: AsyncMutex::new(None),
            backoff: AsyncMutex::new(ReconnectBackoff::new()),
        }
    }

    /// Wrap an already-connected loopback half (the simulator or a test
    /// holds the other end). The port starts `Open`.
    pub fn new_loopback(id: PortId, stream: DuplexStream) -> Self {
        let port = Self::new(id, PortConfig::Loopback);
        *port.transport.try_lock().expect("fresh port") = Some(Transport::Loopback(stream));
        *port.status.try_lock().expect("fresh port") = PortStatus::Open;
        port
    }

    pub fn kind(&self) -> PortKind {
        self.config.kind()
    }

    pub async fn status(&self) -> PortStatus {
        *self.status.lock().await
    }

    /// Open the underlying transport. No-op (returns `Ok`) if already open.
    pub async fn open(&self) -> Result<(), PortError> {
        if matches!(*self.status.lock().await, PortStatus::Open) {
            return Ok(());
        }
        let transport = match &self.config {
            PortConfig::Serial(params) => serial::open(self.id, params).await.map(Transport::Serial),
            PortConfig::Net(params) => net::open(self.id, params).await.map(Transport::Net),
            PortConfig::Loopback => {
                return Err(PortError::Unavailable {
                    port_id: self.id,
                    cause: "loopback ports cannot be (re)opened; construct a fresh one".into(),
                })
            }
        };
        match transport {
            Ok(transport) => {
                *self.transport.lock().await = Some(transport);
                *self.status.lock().await = PortStatus::Open;
                self.backoff.lock().await.reset();
                self.last_error.store(None);
                info!("port {}: open", self.id);
                Ok(())
            }
            Err(e) => {
                *self.status.lock().await = PortStatus::Reconnecting;
                self.last_error.store(Some(std::sync::Arc::new(e.to_string())));
                Err(e)
            }
        }
    }

    pub async fn close(&self) {
        *self.transport.lock().await = None;
        *self.status.lock().await = PortStatus::Closed;
        info!("port {}: closed", self.id);
    }

    /// Write a complete, already-encoded frame. Never produces a
    /// partial write visible above this layer (§4.2): either the whole
    /// buffer goes out, or the port transitions to `Reconnecting` and
    /// an error is returned.
    pub async fn write(&self, bytes: &[u8]) -> Result<(), PortError> {
        let framed = self.apply_write_framing(bytes);
        let mut guard = self.transport.lock().await;
        let Some(transport) = guard.as_mut() else {
            return Err(PortError::Closed { port_id: self.id });
        };
        match transport.write_all(&framed).await {
            Ok(()) => {
                self.counters
                    .bytes_out
                    .fetch_add(bytes.len() as u64, Ordering::Relaxed);
                Ok(())
            }
            Err(e) => {
                drop(guard);
                self.enter_reconnecting(e.to_string()).await;
                Err(PortError::Closed { port_id: self.id })
            }
        }
    }

    /// Read the next chunk of inbound bytes. Returns an empty `Vec` on a
    /// clean EOF-without-error (treated as `PortClosed` by the caller's
    /// retry loop); updates the idle clock on every non-empty read.
    pub async fn read_chunk(&self) -> Result<Vec<u8>, PortError> {
        let mut buf = [0u8; 512];
        let n = {
            let mut guard = self.transport.lock().await;
            let Some(transport) = guard.as_mut() else {
                return Err(PortError::Closed { port_id: self.id });
            };
            match transport.read(&mut buf).await {
                Ok(n) => n,
                Err(e) => {
                    drop(guard);
                    self.enter_reconnecting(e.to_string()).await;
                    return Err(PortError::Closed { port_id: self.id });
                }
            }
        };
        if n == 0 {
            self.enter_reconnecting("eof".into()).await;
            return Err(PortError::Closed { port_id: self.id });
        }
        self.counters
            .bytes_in
            .fetch_add(n as u64, Ordering::Relaxed);
        *self.last_byte_at.lock().await = Some(Instant::now());
        Ok(buf[..n].to_vec())
    }

    /// Whether the bus has been quiet for at least `idle_before_tx`
    /// (§4.4's pacer precondition for transmitting).
    pub async fn is_idle(&self, idle_before_tx: Duration) -> bool {
        match *self.last_byte_at.lock().await {
            None => true,
            Some(last) => last.elapsed() >= idle_before_tx,
        }
    }

    /// The delay to wait before the next reconnect attempt, advancing
    /// the backoff for next time (§4.1: 1s doubling to a 30s ceiling).
    pub async fn next_reconnect_delay(&self) -> Duration {
        self.counters.reconnects.fetch_add(1, Ordering::Relaxed);
        self.backoff.lock().await.next_delay()
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.load().as_ref().map(ToString::to_string)
    }

    async fn enter_reconnecting(&self, cause: String) {
        warn!("port {}: {cause}, entering reconnecting", self.id);
        *self.transport.lock().await = None;
        *self.status.lock().await = PortStatus::Reconnecting;
        self.last_error.store(Some(std::sync::Arc::new(cause)));
    }

    fn apply_write_framing(&self, bytes: &[u8]) -> Vec<u8> {
        if let PortConfig::Net(NetParams {
            framing: NetFraming::LengthPrefixed,
            ..
        }) = &self.config
        {
            let mut framed = Vec::with_capacity(bytes.len() + 2);
            framed.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
            framed.extend_from_slice(bytes);
            framed
        } else {
            bytes.to_vec()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn loopback_write_reaches_peer() {
        let (mine, mut theirs) = loopback::pair();
        let port = Port::new_loopback(PRIMARY_PORT, mine);
        port.write(b"\xA5\x00").await.unwrap();

        let mut buf = [0u8; 2];
        theirs.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"\xA5\x00");
        assert_eq!(port.counters.bytes_out.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn loopback_read_updates_idle_clock() {
        let (mine, mut theirs) = loopback::pair();
        let port = Port::new_loopback(PRIMARY_PORT, mine);
        assert!(port.is_idle(Duration::from_millis(40)).await);

        theirs.write_all(b"\x01").await.unwrap();
        let chunk = port.read_chunk().await.unwrap();
        assert_eq!(chunk, vec![0x01]);
        assert_eq!(port.counters.bytes_in.load(Ordering::Relaxed), 1);
    }
}
