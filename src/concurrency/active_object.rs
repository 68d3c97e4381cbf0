//! The actor primitive: one private queue, one dedicated worker.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{debug, error, warn};
use parking_lot::Mutex;

use crate::concurrency::TaskQueue;

/// A queued unit of work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// An actor: enqueued tasks execute strictly in submission order on one
/// dedicated worker thread, never concurrently with each other. A
/// panicking task is caught and logged; the worker keeps going.
///
/// Lifecycle is one-shot: `start` then `stop`, both idempotent. Tasks
/// still queued when `stop` is called are discarded, not executed;
/// `stop` reports how many. A stopped object stays stopped.
pub struct ActiveObject {
    name: String,
    queue: Arc<TaskQueue<Task>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    running: AtomicBool,
    processed: Arc<AtomicU64>,
}

impl ActiveObject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            queue: Arc::new(TaskQueue::new()),
            worker: Mutex::new(None),
            running: AtomicBool::new(false),
            processed: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Spawn the worker. Calling `start` on a running object is a no-op.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let name = self.name.clone();
        let queue = Arc::clone(&self.queue);
        let processed = Arc::clone(&self.processed);

        let worker_name = name.clone();
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || worker_loop(&worker_name, &queue, &processed))
            .unwrap_or_else(|e| panic!("failed to spawn worker {}: {}", name, e));

        *self.worker.lock() = Some(handle);
    }

    /// Append a task; the caller never blocks. Returns false once the
    /// object has been stopped; the task is rejected, not queued.
    pub fn enqueue(&self, task: Task) -> bool {
        self.queue.push(task)
    }

    /// Wake the worker, join it, and discard whatever was still queued.
    /// Returns the number of discarded tasks; repeated calls return 0.
    /// Works on a never-started object too: the queue closes and later
    /// enqueues are rejected.
    pub fn stop(&self) -> usize {
        let was_running = self.running.swap(false, Ordering::SeqCst);

        let discarded = self.queue.shutdown().len();
        if discarded > 0 {
            warn!("[{}] dropping {} queued task(s) at stop", self.name, discarded);
        }

        if was_running {
            if let Some(handle) = self.worker.lock().take() {
                if handle.join().is_err() {
                    error!("[{}] worker terminated abnormally", self.name);
                }
            }
        }
        discarded
    }

    /// Non-blocking queue depth.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Tasks that ran to completion (panicked tasks excluded).
    pub fn processed_count(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }
}

impl Drop for ActiveObject {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop(name: &str, queue: &TaskQueue<Task>, processed: &AtomicU64) {
    debug!("[{}] worker up", name);
    while let Some(task) = queue.pop_blocking() {
        match panic::catch_unwind(AssertUnwindSafe(task)) {
            Ok(()) => {
                processed.fetch_add(1, Ordering::Relaxed);
            }
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!("[{}] task panicked: {}", name, message);
            }
        }
    }
    debug!("[{}] worker down", name);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn wait_for<F: Fn() -> bool>(cond: F) {
        for _ in 0..500 {
            if cond() {
                return;
            }
            thread::sleep(Duration::from_millis(2));
        }
        panic!("condition not reached within deadline");
    }

    #[test]
    fn executes_tasks_in_submission_order() {
        let actor = ActiveObject::new("order-test");
        actor.start();

        let seen = Arc::new(Mutex::new(Vec::new()));
        for i in 0..50 {
            let seen = Arc::clone(&seen);
            assert!(actor.enqueue(Box::new(move || seen.lock().push(i))));
        }

        wait_for(|| actor.processed_count() == 50);
        assert_eq!(*seen.lock(), (0..50).collect::<Vec<_>>());
        actor.stop();
    }

    #[test]
    fn earlier_task_side_effects_complete_before_later_task_starts() {
        let actor = ActiveObject::new("happens-before");
        actor.start();

        let marker = Arc::new(AtomicUsize::new(0));
        let observed = Arc::new(AtomicUsize::new(usize::MAX));

        {
            let marker = Arc::clone(&marker);
            actor.enqueue(Box::new(move || {
                thread::sleep(Duration::from_millis(20));
                marker.store(7, Ordering::SeqCst);
            }));
        }
        {
            let marker = Arc::clone(&marker);
            let observed = Arc::clone(&observed);
            actor.enqueue(Box::new(move || {
                observed.store(marker.load(Ordering::SeqCst), Ordering::SeqCst);
            }));
        }

        wait_for(|| actor.processed_count() == 2);
        assert_eq!(observed.load(Ordering::SeqCst), 7);
        actor.stop();
    }

    #[test]
    fn stop_discards_queued_tasks_and_reports_count() {
        let actor = ActiveObject::new("discard-test");
        actor.start();

        let executed = Arc::new(AtomicUsize::new(0));

        // First task holds the worker busy so the rest stay queued.
        actor.enqueue(Box::new(|| thread::sleep(Duration::from_millis(100))));
        for _ in 0..10 {
            let executed = Arc::clone(&executed);
            actor.enqueue(Box::new(move || {
                executed.fetch_add(1, Ordering::SeqCst);
            }));
        }

        // The worker has claimed the blocking task once only the ten
        // followers remain queued.
        wait_for(|| actor.queue_len() == 10);
        let discarded = actor.stop();

        assert_eq!(discarded, 10);
        assert_eq!(executed.load(Ordering::SeqCst), 0);
        assert_eq!(actor.processed_count(), 1);
    }

    #[test]
    fn stop_is_idempotent_and_rejects_later_enqueues() {
        let actor = ActiveObject::new("stop-twice");
        actor.start();
        assert_eq!(actor.stop(), 0);
        assert_eq!(actor.stop(), 0);
        assert!(!actor.enqueue(Box::new(|| {})));
    }

    #[test]
    fn start_is_idempotent() {
        let actor = ActiveObject::new("start-twice");
        actor.start();
        actor.start();

        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        actor.enqueue(Box::new(move || {
            h.fetch_add(1, Ordering::SeqCst);
        }));

        wait_for(|| hits.load(Ordering::SeqCst) == 1);
        actor.stop();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn panicking_task_does_not_kill_the_worker() {
        let actor = ActiveObject::new("panic-test");
        actor.start();

        let after = Arc::new(AtomicUsize::new(0));
        actor.enqueue(Box::new(|| panic!("deliberate")));
        {
            let after = Arc::clone(&after);
            actor.enqueue(Box::new(move || {
                after.fetch_add(1, Ordering::SeqCst);
            }));
        }

        wait_for(|| after.load(Ordering::SeqCst) == 1);
        // The panicked task never counts as processed.
        assert_eq!(actor.processed_count(), 1);
        actor.stop();
    }
}
