//! Per-port transaction engine (§4.4): the literal outbound state
//! machine `Queued -> Waiting-for-idle -> Transmitting ->
//! Awaiting-response -> {Succeeded|Retrying->Transmitting|Failed}`,
//! with `Cancelled` honored at every state except `Transmitting`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use tokio::sync::{mpsc, oneshot, Mutex, Notify};

use crate::codec::{encoder, DecodeEvent, Frame};
use crate::error::PoolError;
use crate::port::Port;

use super::matcher::{ResponseKey, ResponseMatcher, RetryPolicy};
use super::pacer::{Pacer, PacerConfig};
use super::queue::{Priority, TransactionQueue};

/// The explicit outbound transaction states from the design, kept as
/// a field on the in-flight transaction for logging and tests rather
/// than as free-floating control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    Queued,
    WaitingForIdle,
    Transmitting,
    AwaitingResponse,
    Succeeded,
    Retrying,
    Failed,
    Cancelled,
}

/// A caller-supplied outbound request: the encoded-ready frame, the key
/// that would identify its response (if any is expected), a
/// human-readable descriptor for error messages, and whether it should
/// fail fast instead of waiting in queue.
pub struct Transaction {
    pub frame: Frame,
    pub expected: Option<ResponseKey>,
    pub descriptor: String,
    pub priority: Priority,
}

#[derive(Debug)]
pub enum TransactionOutcome {
    Succeeded(Option<Frame>),
    Failed(PoolError),
    Cancelled,
}

struct QueuedTx {
    frame: Frame,
    expected: Option<ResponseKey>,
    descriptor: String,
    completion: oneshot::Sender<TransactionOutcome>,
    cancelled: Arc<AtomicBool>,
}

/// A handle callers use to cancel a transaction they've already
/// enqueued. Checked at every state except `Transmitting`.
#[derive(Clone)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

pub struct TransactionEngine {
    port_id: u8,
    port: Arc<Port>,
    queue: Mutex<TransactionQueue<QueuedTx>>,
    pacer: Mutex<Pacer>,
    matcher: Mutex<ResponseMatcher<oneshot::Sender<Frame>>>,
    retry_policy: RetryPolicy,
    notify: Notify,
    /// Inbound frames that didn't match any pending transaction — these
    /// are spontaneous status reports routed up to Board Dispatch.
    spontaneous: mpsc::Sender<Frame>,
}

impl TransactionEngine {
    pub fn new(
        port_id: u8,
        port: Arc<Port>,
        pacer_config: PacerConfig,
        retry_policy: RetryPolicy,
        spontaneous: mpsc::Sender<Frame>,
    ) -> Self {
        Self {
            port_id,
            port,
            queue: Mutex::new(TransactionQueue::new()),
            pacer: Mutex::new(Pacer::new(pacer_config)),
            matcher: Mutex::new(ResponseMatcher::new()),
            retry_policy,
            notify: Notify::new(),
            spontaneous,
        }
    }

    /// Enqueue a transaction, returning a receiver for its eventual
    /// outcome and a handle to cancel it early.
    pub async fn enqueue(
        &self,
        tx: Transaction,
    ) -> (oneshot::Receiver<TransactionOutcome>, CancelHandle) {
        let (completion, rx) = oneshot::channel();
        let cancelled = Arc::new(AtomicBool::new(false));
        let queued = QueuedTx {
            frame: tx.frame,
            expected: tx.expected,
            descriptor: tx.descriptor,
            completion,
            cancelled: cancelled.clone(),
        };
        self.queue.lock().await.push(tx.priority, queued);
        self.notify.notify_one();
        (rx, CancelHandle(cancelled))
    }

    /// Feed one inbound decode event. Matching frames complete a
    /// pending transaction; unmatched frames are forwarded as
    /// spontaneous status.
    pub async fn on_decode_event(&self, event: DecodeEvent) {
        let DecodeEvent::Frame(frame) = event else {
            return;
        };
        let key = ResponseKey {
            peer: frame.src,
            action: frame.action,
            correlating_id: correlating_id(&frame),
        };
        let waiter = self.matcher.lock().await.complete(key);
        match waiter {
            Some(sender) => {
                let _ = sender.send(frame);
            }
            None => {
                if self.spontaneous.send(frame).await.is_err() {
                    debug!("port {}: spontaneous frame dropped, no receiver", self.port_id);
                }
            }
        }
    }

    /// Drive the queue forever. Spawned as its own task per port.
    pub async fn run(self: Arc<Self>) {
        loop {
            let Some(mut qtx) = self.queue.lock().await.pop() else {
                self.notify.notified().await;
                continue;
            };

            let mut state = TxState::Queued;
            if qtx.cancelled.load(Ordering::Relaxed) {
                state = TxState::Cancelled;
                debug!("port {}: {} -> {state:?}", self.port_id, qtx.descriptor);
                let _ = qtx.completion.send(TransactionOutcome::Cancelled);
                continue;
            }

            state = TxState::WaitingForIdle;
            debug!("port {}: {} -> {state:?}", self.port_id, qtx.descriptor);
            let idle_before_tx = self.pacer.lock().await.config().idle_before_tx;
            let mut cancelled_while_waiting = false;
            while !self.port.is_idle(idle_before_tx).await {
                if qtx.cancelled.load(Ordering::Relaxed) {
                    cancelled_while_waiting = true;
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            if cancelled_while_waiting {
                state = TxState::Cancelled;
                debug!("port {}: {} -> {state:?}", self.port_id, qtx.descriptor);
                let _ = qtx.completion.send(TransactionOutcome::Cancelled);
                continue;
            }
            self.pacer.lock().await.wait_inter_frame().await;

            let (outcome, final_state) = self.transmit_with_retries(&mut qtx).await;
            state = final_state;
            debug!("port {}: {} -> {state:?}", self.port_id, qtx.descriptor);
            let _ = qtx.completion.send(outcome);
        }
    }

    async fn transmit_with_retries(&self, qtx: &mut QueuedTx) -> (TransactionOutcome, TxState) {
        let mut attempt = 1u32;
        loop {
            let wire = encoder::encode(&qtx.frame);
            if let Err(e) = self.port.write(&wire).await {
                return (TransactionOutcome::Failed(e.into()), TxState::Failed);
            }
            self.pacer.lock().await.mark_transmitted();

            let Some(key) = qtx.expected else {
                return (TransactionOutcome::Succeeded(None), TxState::Succeeded);
            };

            let (tx, rx) = oneshot::channel();
            self.matcher.lock().await.register(key, tx);

            match tokio::time::timeout(self.retry_policy.timeout, rx).await {
                Ok(Ok(frame)) => {
                    return (TransactionOutcome::Succeeded(Some(frame)), TxState::Succeeded)
                }
                _ => {
                    self.matcher.lock().await.abandon(&key);
                    if qtx.cancelled.load(Ordering::Relaxed) {
                        return (TransactionOutcome::Cancelled, TxState::Cancelled);
                    }
                    if attempt > self.retry_policy.max_retries {
                        warn!(
                            "port {}: {} exhausted {} retries",
                            self.port_id, qtx.descriptor, self.retry_policy.max_retries
                        );
                        return (
                            TransactionOutcome::Failed(PoolError::NoResponse {
                                port_id: self.port_id,
                                descriptor: qtx.descriptor.clone(),
                            }),
                            TxState::Failed,
                        );
                    }
                    debug!(
                        "port {}: {} -> {:?} (attempt {attempt})",
                        self.port_id,
                        qtx.descriptor,
                        TxState::Retrying
                    );
                    tokio::time::sleep(self.retry_policy.backoff_for(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Extract the correlating-id for the response matcher. Most Pentair-
/// style acks echo the first payload byte (the entity id the command
/// addressed); variant decoders that need a richer key can widen this
/// later without changing the matcher's contract.
fn correlating_id(frame: &Frame) -> u32 {
    frame.payload.first().copied().unwrap_or(0) as u32
}
