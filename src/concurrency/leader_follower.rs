//! The leader-follower worker pool.
//!
//! N long-lived workers share one queue and one leadership slot, both
//! guarded by a single lock. At any instant at most one worker, the
//! leader, may claim the next queued request. On claiming, the leader
//! hands leadership to the next worker (round-robin by index, or vacates
//! it when the queue drained) *before* executing the payload outside the
//! lock, so deciding "what's next" is always single-threaded while
//! execution itself fans out.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{debug, error, warn};
use parking_lot::{Condvar, Mutex};

use crate::concurrency::Request;
use crate::error::ServerError;

/// Executes one claimed request; expected failures are the handler's to
/// deliver. Panics are caught at the pool boundary.
pub type RequestHandler = dyn Fn(Request) + Send + Sync + 'static;

struct PoolState {
    queue: VecDeque<Request>,
    leader: Option<usize>,
    stopping: bool,
}

struct PoolShared {
    state: Mutex<PoolState>,
    work_ready: Condvar,
    workers: usize,
    handler: Box<RequestHandler>,
    // Counters live off the queue/leadership lock so introspection never
    // contends with the hot path.
    promotions: AtomicU64,
    processed: Vec<AtomicU64>,
    faults: AtomicU64,
    deciders: AtomicUsize,
    claims_peak: AtomicUsize,
}

/// Bounded-parallelism request pool with leader-follower hand-off.
pub struct LeaderFollowerPool {
    shared: Arc<PoolShared>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    started: AtomicBool,
    stopped: AtomicBool,
}

impl LeaderFollowerPool {
    pub fn new<H>(workers: usize, handler: H) -> Result<Self, ServerError>
    where
        H: Fn(Request) + Send + Sync + 'static,
    {
        if workers == 0 {
            return Err(ServerError::Config("worker count must be at least 1".to_string()));
        }

        Ok(Self {
            shared: Arc::new(PoolShared {
                state: Mutex::new(PoolState {
                    queue: VecDeque::new(),
                    leader: None,
                    stopping: false,
                }),
                work_ready: Condvar::new(),
                workers,
                handler: Box::new(handler),
                promotions: AtomicU64::new(0),
                processed: (0..workers).map(|_| AtomicU64::new(0)).collect(),
                faults: AtomicU64::new(0),
                deciders: AtomicUsize::new(0),
                claims_peak: AtomicUsize::new(0),
            }),
            handles: Mutex::new(Vec::new()),
            started: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
        })
    }

    /// Spawn the worker loops. Idempotent.
    pub fn start(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }

        let mut handles = self.handles.lock();
        for id in 0..self.shared.workers {
            let shared = Arc::clone(&self.shared);
            let handle = thread::Builder::new()
                .name(format!("lf-worker-{}", id))
                .spawn(move || worker_loop(&shared, id))
                .unwrap_or_else(|e| panic!("failed to spawn lf-worker-{}: {}", id, e));
            handles.push(handle);
        }
    }

    /// Append a request and wake one parked worker. Returns false once
    /// the pool is stopping; the request is rejected, not queued.
    pub fn submit(&self, request: Request) -> bool {
        let mut state = self.shared.state.lock();
        if state.stopping {
            return false;
        }
        state.queue.push_back(request);
        drop(state);
        // One wake suffices: a vacant slot lets any woken worker claim
        // leadership, and an assigned designate re-checks on its next
        // pass, so the wake cannot be lost.
        self.shared.work_ready.notify_one();
        true
    }

    /// Flip the stopping flag, wake everyone, join all workers. In-flight
    /// payloads finish; unclaimed requests are abandoned. Idempotent:
    /// later calls return immediately.
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }

        {
            let mut state = self.shared.state.lock();
            state.stopping = true;
            let abandoned = state.queue.len();
            if abandoned > 0 {
                warn!("abandoning {} unclaimed request(s) at pool stop", abandoned);
            }
        }
        self.shared.work_ready.notify_all();

        for handle in self.handles.lock().drain(..) {
            if handle.join().is_err() {
                error!("pool worker terminated abnormally");
            }
        }
    }

    pub fn workers(&self) -> usize {
        self.shared.workers
    }

    pub fn queue_len(&self) -> usize {
        self.shared.state.lock().queue.len()
    }

    /// Leadership transfers so far (initial claims plus hand-offs).
    pub fn promotions(&self) -> u64 {
        self.shared.promotions.load(Ordering::Relaxed)
    }

    /// Requests completed per worker, indexed by worker id.
    pub fn worker_processed(&self) -> Vec<u64> {
        self.shared.processed.iter().map(|c| c.load(Ordering::Relaxed)).collect()
    }

    /// Payload panics caught at the execution boundary.
    pub fn faults(&self) -> u64 {
        self.shared.faults.load(Ordering::Relaxed)
    }

    /// Most workers ever observed inside the claim/hand-off section at
    /// once. The protocol keeps this at 1; anything higher means the
    /// single-decider invariant broke.
    pub fn claims_peak(&self) -> usize {
        self.shared.claims_peak.load(Ordering::SeqCst)
    }
}

impl Drop for LeaderFollowerPool {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop(shared: &PoolShared, id: usize) {
    debug!("lf-worker-{} up", id);
    loop {
        let mut state = shared.state.lock();

        // Park until stopping, or until this worker may claim: either the
        // slot is vacant or this worker is the designated leader, and
        // there is work to claim.
        loop {
            if state.stopping {
                debug!("lf-worker-{} down", id);
                return;
            }
            let eligible = state.leader.is_none() || state.leader == Some(id);
            if eligible && !state.queue.is_empty() {
                break;
            }
            shared.work_ready.wait(&mut state);
        }

        if state.leader.is_none() {
            state.leader = Some(id);
            shared.promotions.fetch_add(1, Ordering::Relaxed);
            debug!("lf-worker-{} took vacant leadership", id);
        }

        let deciding = shared.deciders.fetch_add(1, Ordering::SeqCst) + 1;
        shared.claims_peak.fetch_max(deciding, Ordering::SeqCst);

        let request = match state.queue.pop_front() {
            Some(request) => request,
            None => {
                shared.deciders.fetch_sub(1, Ordering::SeqCst);
                continue;
            }
        };

        // Hand off before touching the payload: the next decider is
        // chosen while this thread still holds the lock.
        if state.queue.is_empty() {
            state.leader = None;
        } else {
            let next = (id + 1) % shared.workers;
            state.leader = Some(next);
            shared.promotions.fetch_add(1, Ordering::Relaxed);
            debug!("lf-worker-{} handed leadership to {}", id, next);
        }
        shared.deciders.fetch_sub(1, Ordering::SeqCst);
        shared.work_ready.notify_all();
        drop(state);

        execute(shared, id, request);
    }
}

// Execution happens outside the lock; a panicking handler costs this
// request an error response, never the worker.
fn execute(shared: &PoolShared, id: usize, request: Request) {
    let sink = Arc::clone(&request.sink);
    let request_id = request.id;

    match panic::catch_unwind(AssertUnwindSafe(|| (shared.handler)(request))) {
        Ok(()) => {
            shared.processed[id].fetch_add(1, Ordering::Relaxed);
        }
        Err(_) => {
            shared.faults.fetch_add(1, Ordering::Relaxed);
            error!("lf-worker-{} caught a fault processing request {}", id, request_id);
            sink.deliver(&format!("request {} failed: internal fault", request_id));
        }
    }
}
