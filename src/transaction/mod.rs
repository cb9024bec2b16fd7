//! Transaction Engine (§4.4): one instance per port, owning the
//! outbound priority queue, the pacer, the response matcher, and the
//! inbound dispatcher. Concurrency inside an engine is cooperative
//! single-writer; engines across ports run independently.

pub mod engine;
pub mod matcher;
pub mod pacer;
pub mod queue;

pub use engine::{CancelHandle, Transaction, TransactionEngine, TransactionOutcome, TxState};
pub use matcher::{ResponseKey, RetryPolicy};
pub use pacer::PacerConfig;
pub use queue::Priority;
