//! # Engine Facades
//!
//! Bind each execution strategy to the algorithm suite and the wire
//! protocol, behind the uniform [`Engine`] face the server and embedders
//! consume.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::{info, warn};

use crate::algorithms::AlgorithmSuite;
use crate::concurrency::{
    Engine, LeaderFollowerPool, OutputSink, Pipeline, Request, RequestIdSource, StatsSnapshot,
    WorkerSnapshot,
};
use crate::config::EngineKind;
use crate::error::Result;
use crate::protocol;

/// Construct the configured strategy, already started.
pub fn build_engine(kind: EngineKind, workers: usize) -> Result<Arc<dyn Engine>> {
    match kind {
        EngineKind::LeaderFollower => Ok(Arc::new(LeaderFollowerEngine::new(workers)?)),
        EngineKind::Pipeline => Ok(Arc::new(PipelineEngine::new())),
    }
}

struct LfCore {
    suite: AlgorithmSuite,
    completed: AtomicU64,
    errors: AtomicU64,
}

impl LfCore {
    // One claimed request, start to finish: parse, compute, render,
    // deliver. Runs on whichever pool worker claimed the request.
    fn handle(&self, request: Request) {
        let Request { id, payload, sink, created_at } = request;
        match protocol::parse_request(&payload) {
            Ok(graph) => {
                let report = self.suite.compute(&graph);
                sink.deliver(&protocol::format_report(&graph, &report));
                self.completed.fetch_add(1, Ordering::Relaxed);
                info!("request {} completed in {}us", id, created_at.elapsed().as_micros());
            }
            Err(error) => {
                self.errors.fetch_add(1, Ordering::Relaxed);
                warn!("request {} failed: {}", id, error);
                sink.deliver(&protocol::format_error(id, &error.to_string()));
            }
        }
    }
}

/// The leader-follower strategy: every request is parsed, computed and
/// delivered in one step by whichever worker claimed it.
pub struct LeaderFollowerEngine {
    core: Arc<LfCore>,
    pool: LeaderFollowerPool,
    ids: RequestIdSource,
    submitted: AtomicU64,
}

impl LeaderFollowerEngine {
    pub fn new(workers: usize) -> Result<Self> {
        let core = Arc::new(LfCore {
            suite: AlgorithmSuite::standard(),
            completed: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        });
        let handler_core = Arc::clone(&core);
        let pool = LeaderFollowerPool::new(workers, move |request| handler_core.handle(request))?;
        pool.start();

        Ok(Self { core, pool, ids: RequestIdSource::default(), submitted: AtomicU64::new(0) })
    }
}

impl Engine for LeaderFollowerEngine {
    fn submit(&self, payload: String, sink: Arc<dyn OutputSink>) -> bool {
        let request = Request::new(self.ids.next(), payload, sink);
        let accepted = self.pool.submit(request);
        if accepted {
            self.submitted.fetch_add(1, Ordering::Relaxed);
        }
        accepted
    }

    fn stats(&self) -> StatsSnapshot {
        StatsSnapshot {
            engine: "leader-follower",
            submitted: self.submitted.load(Ordering::Relaxed),
            completed: self.core.completed.load(Ordering::Relaxed),
            errors: self.core.errors.load(Ordering::Relaxed) + self.pool.faults(),
            queued: self.pool.queue_len(),
            leader_promotions: self.pool.promotions(),
            workers: self
                .pool
                .worker_processed()
                .into_iter()
                .enumerate()
                .map(|(worker, processed)| WorkerSnapshot { worker, processed })
                .collect(),
            stages: Vec::new(),
        }
    }

    fn stop(&self) {
        self.pool.stop();
    }
}

/// The pipeline strategy: requests flow through the four stage actors.
pub struct PipelineEngine {
    pipeline: Pipeline,
    ids: RequestIdSource,
    submitted: AtomicU64,
}

impl PipelineEngine {
    pub fn new() -> Self {
        let pipeline = Pipeline::new(AlgorithmSuite::standard());
        pipeline.start();
        Self { pipeline, ids: RequestIdSource::default(), submitted: AtomicU64::new(0) }
    }
}

impl Default for PipelineEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for PipelineEngine {
    fn submit(&self, payload: String, sink: Arc<dyn OutputSink>) -> bool {
        let request = Request::new(self.ids.next(), payload, sink);
        let accepted = self.pipeline.submit(request);
        if accepted {
            self.submitted.fetch_add(1, Ordering::Relaxed);
        }
        accepted
    }

    fn stats(&self) -> StatsSnapshot {
        StatsSnapshot {
            engine: "pipeline",
            submitted: self.submitted.load(Ordering::Relaxed),
            completed: self.pipeline.completed(),
            errors: self.pipeline.errors(),
            queued: self.pipeline.queued(),
            leader_promotions: 0,
            workers: Vec::new(),
            stages: self.pipeline.stage_snapshots(),
        }
    }

    fn stop(&self) {
        self.pipeline.stop();
    }
}
