//! # Execution Engines
//!
//! The orchestration layer: a blocking task queue, the single-worker
//! active object built on it, and the two interchangeable strategies that
//! turn submitted request payloads into asynchronously delivered
//! responses: an N-worker leader-follower pool and a four-stage
//! active-object pipeline.

pub mod active_object;
pub mod leader_follower;
pub mod pipeline;
pub mod task_queue;

pub use active_object::ActiveObject;
pub use leader_follower::LeaderFollowerPool;
pub use pipeline::Pipeline;
pub use task_queue::TaskQueue;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

/// Monotonic request identifier, unique per engine.
pub type RequestId = u64;

/// Where a request's response goes. The server hands in a socket-backed
/// sink; tests and embedders hand in channel-backed ones. Delivery must
/// not panic; I/O failures are the sink's to report.
pub trait OutputSink: Send + Sync {
    fn deliver(&self, response: &str);
}

/// Sink backed by a crossbeam channel; the receiving side observes
/// responses as plain strings. Dropped receivers make delivery a no-op.
pub struct ChannelSink {
    tx: crossbeam_channel::Sender<String>,
}

impl ChannelSink {
    pub fn new() -> (Arc<Self>, crossbeam_channel::Receiver<String>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Arc::new(Self { tx }), rx)
    }
}

impl OutputSink for ChannelSink {
    fn deliver(&self, response: &str) {
        let _ = self.tx.send(response.to_string());
    }
}

/// One unit of inbound work. Immutable once created; ownership moves
/// queue-to-worker and stage-to-stage, never copied.
pub struct Request {
    pub id: RequestId,
    pub payload: String,
    pub sink: Arc<dyn OutputSink>,
    pub created_at: Instant,
}

impl Request {
    pub fn new(id: RequestId, payload: String, sink: Arc<dyn OutputSink>) -> Self {
        Self { id, payload, sink, created_at: Instant::now() }
    }
}

/// Allocates request ids for one engine instance.
#[derive(Debug, Default)]
pub(crate) struct RequestIdSource {
    next: AtomicU64,
}

impl RequestIdSource {
    pub(crate) fn next(&self) -> RequestId {
        self.next.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// An execution strategy behind a uniform face: fire-and-forget submit,
/// non-blocking stats snapshot, cooperative idempotent stop.
pub trait Engine: Send + Sync {
    /// Queue a payload for asynchronous processing; the response reaches
    /// `sink` later. Returns false once the engine is stopping; the
    /// payload is rejected, not queued.
    fn submit(&self, payload: String, sink: Arc<dyn OutputSink>) -> bool;

    /// Eventually-consistent counters; never blocks on the hot path.
    fn stats(&self) -> StatsSnapshot;

    /// Flip the running flag, wake everyone, join all workers. In-flight
    /// work completes; queued-but-unstarted work is dropped.
    fn stop(&self);
}

/// Point-in-time engine counters. Worker entries are populated by the
/// leader-follower pool, stage entries by the pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub engine: &'static str,
    pub submitted: u64,
    pub completed: u64,
    pub errors: u64,
    pub queued: usize,
    pub leader_promotions: u64,
    pub workers: Vec<WorkerSnapshot>,
    pub stages: Vec<StageSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkerSnapshot {
    pub worker: usize,
    pub processed: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StageSnapshot {
    pub stage: &'static str,
    pub processed: u64,
    pub queued: usize,
}
