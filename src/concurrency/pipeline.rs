//! The four-stage active-object pipeline.
//!
//! Receive → Prepare → Compute → Deliver, one actor per stage. A stage's
//! task builds the next stage's payload and enqueues it directly at the
//! end of its own body; there is no separate scheduler. Requests at
//! different stages progress concurrently while each stage stays strictly
//! sequential.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};

use crate::algorithms::{AlgorithmSuite, ComputeReport};
use crate::concurrency::{ActiveObject, OutputSink, Request, RequestId, StageSnapshot};
use crate::graph::Graph;
use crate::protocol;

const STAGE_NAMES: [&str; 4] = ["receive", "prepare", "compute", "deliver"];

/// Everything a request has accumulated so far on its way through the
/// stages. Single-owner: the carry moves stage to stage, never aliased.
struct StageCarry {
    request_id: RequestId,
    sink: Arc<dyn OutputSink>,
    accepted_at: Instant,
    graph: Graph,
    report: Option<ComputeReport>,
}

struct PipelineInner {
    stages: Vec<Arc<ActiveObject>>,
    suite: AlgorithmSuite,
    completed: AtomicU64,
    errors: AtomicU64,
}

/// Four-stage request processor with one dedicated worker per stage,
/// regardless of load.
pub struct Pipeline {
    inner: Arc<PipelineInner>,
    stopped: AtomicBool,
}

impl Pipeline {
    pub fn new(suite: AlgorithmSuite) -> Self {
        let stages = STAGE_NAMES
            .iter()
            .enumerate()
            .map(|(i, name)| Arc::new(ActiveObject::new(format!("stage-{}-{}", i + 1, name))))
            .collect();

        Self {
            inner: Arc::new(PipelineInner {
                stages,
                suite,
                completed: AtomicU64::new(0),
                errors: AtomicU64::new(0),
            }),
            stopped: AtomicBool::new(false),
        }
    }

    /// Start every stage worker. Idempotent.
    pub fn start(&self) {
        for stage in &self.inner.stages {
            stage.start();
        }
    }

    /// Feed a request into stage 1. Returns false once stopping.
    pub fn submit(&self, request: Request) -> bool {
        let inner = Arc::clone(&self.inner);
        let accepted = self.inner.stages[0].enqueue(Box::new(move || {
            stage_receive(inner, request);
        }));
        if !accepted {
            warn!("pipeline rejected a request: stage 1 is shut down");
        }
        accepted
    }

    /// Stop the stages front to back so no stopped stage is handed new
    /// work by a live predecessor. Queued-but-unstarted tasks are
    /// discarded per stage. Idempotent.
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        for stage in &self.inner.stages {
            let discarded = stage.stop();
            if discarded > 0 {
                info!("[{}] discarded {} queued task(s)", stage.name(), discarded);
            }
        }
    }

    pub fn completed(&self) -> u64 {
        self.inner.completed.load(Ordering::Relaxed)
    }

    pub fn errors(&self) -> u64 {
        self.inner.errors.load(Ordering::Relaxed)
    }

    /// Tasks currently queued across all stages.
    pub fn queued(&self) -> usize {
        self.inner.stages.iter().map(|s| s.queue_len()).sum()
    }

    pub fn stage_snapshots(&self) -> Vec<StageSnapshot> {
        self.inner
            .stages
            .iter()
            .zip(STAGE_NAMES)
            .map(|(stage, name)| StageSnapshot {
                stage: name,
                processed: stage.processed_count(),
                queued: stage.queue_len(),
            })
            .collect()
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        self.stop();
    }
}

// Stage 1: tokenize the raw payload. Syntax errors end the journey here.
fn stage_receive(inner: Arc<PipelineInner>, request: Request) {
    let Request { id, payload, sink, created_at } = request;
    debug!("request {} entering stage 1", id);

    let spec = match protocol::parse_spec(&payload) {
        Ok(spec) => spec,
        Err(error) => {
            short_circuit(&inner, id, &sink, &error.to_string());
            return;
        }
    };

    let next = Arc::clone(&inner);
    hand_off(&inner, 1, Box::new(move || stage_prepare(next, id, sink, created_at, spec)));
}

// Stage 2: range-check and build the graph.
fn stage_prepare(
    inner: Arc<PipelineInner>,
    id: RequestId,
    sink: Arc<dyn OutputSink>,
    accepted_at: Instant,
    spec: protocol::GraphSpec,
) {
    debug!("request {} entering stage 2", id);

    let graph = match protocol::build_graph(&spec) {
        Ok(graph) => graph,
        Err(error) => {
            short_circuit(&inner, id, &sink, &error.to_string());
            return;
        }
    };

    let carry = StageCarry { request_id: id, sink, accepted_at, graph, report: None };
    let next = Arc::clone(&inner);
    hand_off(&inner, 2, Box::new(move || stage_compute(next, carry)));
}

// Stage 3: run the whole algorithm suite.
fn stage_compute(inner: Arc<PipelineInner>, mut carry: StageCarry) {
    debug!("request {} entering stage 3", carry.request_id);

    carry.report = Some(inner.suite.compute(&carry.graph));

    let next = Arc::clone(&inner);
    hand_off(&inner, 3, Box::new(move || stage_deliver(next, carry)));
}

// Stage 4: render and deliver.
fn stage_deliver(inner: Arc<PipelineInner>, carry: StageCarry) {
    debug!("request {} entering stage 4", carry.request_id);

    let response = match &carry.report {
        Some(report) => protocol::format_report(&carry.graph, report),
        // Stage 3 always attaches a report; an absent one is a fault.
        None => protocol::format_error(carry.request_id, "internal fault: missing report"),
    };
    carry.sink.deliver(&response);
    inner.completed.fetch_add(1, Ordering::Relaxed);
    info!(
        "request {} completed the pipeline in {}us",
        carry.request_id,
        carry.accepted_at.elapsed().as_micros()
    );
}

fn hand_off(inner: &PipelineInner, next_index: usize, task: crate::concurrency::active_object::Task) {
    if !inner.stages[next_index].enqueue(task) {
        warn!("[{}] rejected hand-off: stage is shut down", inner.stages[next_index].name());
    }
}

fn short_circuit(inner: &PipelineInner, id: RequestId, sink: &Arc<dyn OutputSink>, message: &str) {
    inner.errors.fetch_add(1, Ordering::Relaxed);
    warn!("request {} failed: {}", id, message);
    sink.deliver(&protocol::format_error(id, message));
}
