//! Blocking FIFO shared between producers and one or more workers.

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

/// Unbounded FIFO with condvar hand-off. `push` wakes exactly one waiter;
/// `shutdown` wakes them all and turns every subsequent pop into the stop
/// sentinel (`None`). Pushes after shutdown are rejected, never queued.
pub struct TaskQueue<T> {
    inner: Mutex<Inner<T>>,
    ready: Condvar,
}

struct Inner<T> {
    items: VecDeque<T>,
    shutdown: bool,
}

impl<T> TaskQueue<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner { items: VecDeque::new(), shutdown: false }),
            ready: Condvar::new(),
        }
    }

    /// Append an item and wake one waiter. Returns false (rejecting the
    /// item) once the queue is shut down.
    pub fn push(&self, item: T) -> bool {
        let mut inner = self.inner.lock();
        if inner.shutdown {
            return false;
        }
        inner.items.push_back(item);
        drop(inner);
        self.ready.notify_one();
        true
    }

    /// Block until an item is available, then return the oldest one.
    /// Returns `None` (the stop sentinel) once the queue is shut down.
    pub fn pop_blocking(&self) -> Option<T> {
        let mut inner = self.inner.lock();
        loop {
            if inner.shutdown {
                return None;
            }
            if let Some(item) = inner.items.pop_front() {
                return Some(item);
            }
            self.ready.wait(&mut inner);
        }
    }

    /// Non-blocking size snapshot.
    pub fn len(&self) -> usize {
        self.inner.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Close the queue: wake all waiters with the stop sentinel and drain
    /// whatever was still pending back to the caller. Idempotent; the
    /// second call returns an empty drain.
    pub fn shutdown(&self) -> Vec<T> {
        let mut inner = self.inner.lock();
        inner.shutdown = true;
        let drained: Vec<T> = inner.items.drain(..).collect();
        drop(inner);
        self.ready.notify_all();
        drained
    }
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn pops_in_fifo_order() {
        let queue = TaskQueue::new();
        for i in 0..5 {
            assert!(queue.push(i));
        }
        for i in 0..5 {
            assert_eq!(queue.pop_blocking(), Some(i));
        }
    }

    #[test]
    fn pop_blocks_until_push() {
        let queue = Arc::new(TaskQueue::new());
        let popper = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.pop_blocking())
        };

        thread::sleep(Duration::from_millis(20));
        assert!(queue.push(42u32));
        assert_eq!(popper.join().unwrap(), Some(42));
    }

    #[test]
    fn shutdown_wakes_waiters_with_sentinel() {
        let queue: Arc<TaskQueue<u32>> = Arc::new(TaskQueue::new());
        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || queue.pop_blocking())
            })
            .collect();

        thread::sleep(Duration::from_millis(20));
        queue.shutdown();
        for waiter in waiters {
            assert_eq!(waiter.join().unwrap(), None);
        }
    }

    #[test]
    fn push_after_shutdown_is_rejected() {
        let queue = TaskQueue::new();
        assert!(queue.push(1));
        queue.shutdown();
        assert!(!queue.push(2));
        assert_eq!(queue.pop_blocking(), None);
    }

    #[test]
    fn shutdown_drains_pending_items() {
        let queue = TaskQueue::new();
        for i in 0..4 {
            queue.push(i);
        }
        assert_eq!(queue.shutdown(), vec![0, 1, 2, 3]);
        assert_eq!(queue.shutdown(), Vec::<i32>::new());
        assert!(queue.is_empty());
    }
}
