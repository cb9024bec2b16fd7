//! Application context (§5, §9 "Shared singletons"): every long-lived
//! handle is owned here, constructed once at startup and torn down in
//! reverse order. Nothing in the core reaches for a process-global; a
//! test builds its own `Context` against a loopback port instead.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::info;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::board::Board;
use crate::change::persistence::load_or_recover;
use crate::change::ChangeEngine;
use crate::config::AppConfig;
use crate::controller_type::ControllerType;
use crate::delay::{DelayManager, InterlockRule};
use crate::model::graph::{PoolConfig, PoolState};
use crate::model::EquipmentModel;
use crate::port::net::{NetFraming, NetParams};
use crate::port::serial::SerialParams;
use crate::port::{Port, PortConfig, PRIMARY_PORT};
use crate::scheduler::Scheduler;
use crate::sun::NoaaApproxCalculator;
use crate::transaction::{PacerConfig, RetryPolicy, TransactionEngine};

/// The interlock rule table (§4.7): spa heat excludes pool heat while a
/// shared heater is in play, matching the example carried in the design
/// notes. Controllers that have no shared heater simply never assert
/// the `spa-heat` flag, so the rule is inert for them.
fn interlock_rules() -> Vec<InterlockRule> {
    vec![InterlockRule {
        active: "spa-heat",
        excludes: "pool-heat",
    }]
}

pub struct Context {
    pub config: AppConfig,
    pub port: Arc<Port>,
    pub txn: Arc<TransactionEngine>,
    pub board: Arc<Board>,
    pub change: Arc<ChangeEngine>,
    pub delay: Arc<DelayManager>,
    pub scheduler: Arc<Scheduler>,
    spontaneous_rx: Option<mpsc::Receiver<crate::codec::Frame>>,
    tasks: Vec<JoinHandle<()>>,
}

impl Context {
    /// Build every layer from a loaded `AppConfig` and a state
    /// directory holding `config.json`/`state.json` (plus their
    /// `.tmp`/`.corrupt-*` siblings). Controller type is fixed at
    /// construction; reconfiguring it means restarting the process.
    pub async fn build(config: AppConfig, controller_type: ControllerType, state_dir: &Path) -> Self {
        let config_path = state_dir.join("config.json");
        let state_path = state_dir.join("state.json");

        let (pool_config, config_was_corrupt) = load_or_recover::<PoolConfig>(&config_path).await;
        let (pool_state, state_was_corrupt) = load_or_recover::<PoolState>(&state_path).await;
        if config_was_corrupt {
            log::warn!("context: {} was corrupt, starting from defaults", config_path.display());
        }
        if state_was_corrupt {
            log::warn!("context: {} was corrupt, starting from defaults", state_path.display());
        }

        let mut model = EquipmentModel::new(pool_config, pool_state);
        let pruned = model.prune_orphan_state();
        if pruned > 0 {
            info!("context: pruned {pruned} orphaned state entries on load");
        }

        let change = ChangeEngine::new(model, config_path.clone(), state_path.clone());
        if config_was_corrupt {
            change.events().publish(crate::change::events::Event::configuration_corrupt(&config_path));
        }
        if state_was_corrupt {
            change.events().publish(crate::change::events::Event::configuration_corrupt(&state_path));
        }

        let port_config = if config.controller.comms.net_connect {
            PortConfig::Net(NetParams {
                host: config.controller.comms.net_host.clone(),
                port: config.controller.comms.net_port,
                framing: NetFraming::Raw,
            })
        } else {
            PortConfig::Serial(SerialParams {
                device_path: config.controller.comms.rs485_port.clone(),
                ..SerialParams::default()
            })
        };
        let port = Arc::new(Port::new(PRIMARY_PORT, port_config));
        if let Err(e) = port.open().await {
            log::warn!("context: primary port failed to open on startup: {e}; will reconnect");
        }

        let (spontaneous_tx, spontaneous_rx) = mpsc::channel(64);
        let txn = Arc::new(TransactionEngine::new(
            PRIMARY_PORT,
            Arc::clone(&port),
            PacerConfig::default(),
            RetryPolicy::default(),
            spontaneous_tx,
        ));

        let board = Arc::new(Board::new(controller_type, 0x10, 0x00));
        let delay = Arc::new(DelayManager::new(interlock_rules()));
        let sun = Box::new(NoaaApproxCalculator::new(
            config.location.latitude,
            config.location.longitude,
            local_utc_offset_hours(),
        ));
        let scheduler = Arc::new(Scheduler::new(sun));

        Self {
            config,
            port,
            txn,
            board,
            change,
            delay,
            scheduler,
            spontaneous_rx: Some(spontaneous_rx),
            tasks: Vec::new(),
        }
    }

    /// Spawn the background tasks that keep the bridge alive: the
    /// transaction engine's queue drain, the read pump that feeds
    /// decoded bytes to it, the spontaneous-frame router that commits
    /// unsolicited updates through the Change Engine, and the
    /// once-a-second scheduler tick.
    pub fn spawn_tasks(&mut self) {
        let txn = Arc::clone(&self.txn);
        self.tasks.push(tokio::spawn(async move { txn.run().await }));

        let port = Arc::clone(&self.port);
        let txn_for_reads = Arc::clone(&self.txn);
        let variant = self
            .board
            .controller_type()
            .frame_variant()
            .unwrap_or(crate::codec::FrameVariant::Pentair2);
        self.tasks.push(tokio::spawn(async move {
            read_pump(port, txn_for_reads, variant).await;
        }));

        if let Some(spontaneous_rx) = self.spontaneous_rx.take() {
            let board = Arc::clone(&self.board);
            let change = Arc::clone(&self.change);
            self.tasks.push(tokio::spawn(async move {
                spontaneous_router(spontaneous_rx, board, change).await;
            }));
        }

        let scheduler = Arc::clone(&self.scheduler);
        let change = Arc::clone(&self.change);
        let board = Arc::clone(&self.board);
        let txn_for_scheduler = Arc::clone(&self.txn);
        let delay = Arc::clone(&self.delay);
        self.tasks.push(tokio::spawn(async move {
            scheduler.run(change, board, txn_for_scheduler, delay).await;
        }));
    }

    /// The upward-facing facade (§0.1): a caller that wants to dispatch
    /// an intent and see it committed, without reaching into `board`,
    /// `txn`, `change`, and `delay` individually, builds one of these
    /// from the same handles the daemon itself runs on.
    pub fn bridge(&self) -> crate::PoolBridge {
        crate::PoolBridge::new(
            Arc::clone(&self.board),
            Arc::clone(&self.txn),
            Arc::clone(&self.change),
            Arc::clone(&self.delay),
        )
    }

    /// Reverse-order teardown (§5): stop accepting new scheduler work
    /// first, then let in-flight transactions drain against a deadline,
    /// then close the port, then force a final persistence flush.
    pub async fn shutdown(self, drain_deadline: std::time::Duration) {
        for task in &self.tasks {
            task.abort();
        }
        for task in self.tasks {
            let _ = tokio::time::timeout(drain_deadline, task).await;
        }
        self.port.close().await;
        self.change.flush_now().await;
        info!("context: shutdown complete");
    }
}

async fn read_pump(port: Arc<Port>, txn: Arc<TransactionEngine>, variant: crate::codec::FrameVariant) {
    use crate::codec::decoder::FrameDecoder;

    let mut decoder = FrameDecoder::new(variant);
    loop {
        let Ok(chunk) = port.read_chunk().await else {
            tokio::time::sleep(port.next_reconnect_delay().await).await;
            if port.open().await.is_ok() {
                decoder.reset();
            }
            continue;
        };
        let now = std::time::Instant::now();
        for byte in chunk {
            if let Some(event) = decoder.push(byte, now) {
                txn.on_decode_event(event).await;
            }
        }
    }
}

async fn spontaneous_router(
    mut rx: mpsc::Receiver<crate::codec::Frame>,
    board: Arc<Board>,
    change: Arc<ChangeEngine>,
) {
    while let Some(frame) = rx.recv().await {
        for update in board.decode(&crate::codec::DecodeEvent::Frame(frame)) {
            change.apply_decoded_update(update).await;
        }
    }
}

/// `chrono::Local`'s fixed offset, in hours, for the NOAA sun
/// calculation. Re-derived at startup rather than cached, since the
/// process does not run across a DST boundary within one construction.
fn local_utc_offset_hours() -> f64 {
    use chrono::Offset;
    chrono::Local::now().offset().fix().local_minus_utc() as f64 / 3600.0
}

/// Default state directory (`$XDG_STATE_HOME/pool-bridge` or
/// `~/.local/state/pool-bridge`), created on first use.
pub fn default_state_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(xdg).join("pool-bridge");
    }
    std::env::var("HOME")
        .map(|home| PathBuf::from(home).join(".local/state/pool-bridge"))
        .unwrap_or_else(|_| PathBuf::from("."))
}
