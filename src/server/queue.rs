//! Bounded hand-off between the acceptor and the worker pool.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, SendTimeoutError, Sender, TrySendError};
use parking_lot::{Condvar, Mutex};

/// How often a blocked `put` rechecks whether the queue was closed.
const PUT_RECHECK: Duration = Duration::from_millis(100);

/// Returned by [`ConnectionQueue::put`] once the queue is closed, carrying
/// the item that was not queued.
#[derive(Debug)]
pub struct QueueClosed<T>(pub T);

impl<T> fmt::Display for QueueClosed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("connection queue is closed")
    }
}

impl<T: fmt::Debug> std::error::Error for QueueClosed<T> {}

/// Fixed-capacity FIFO.
///
/// `put` blocks while the queue is full, which is what throttles the
/// acceptor. `get` waits at most `timeout` so consumers can notice they
/// were asked to stop. Every item taken with `get` must be acknowledged
/// with [`ConnectionQueue::task_done`].
#[derive(Debug)]
pub struct ConnectionQueue<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
    capacity: usize,
    /// Items put but not yet acknowledged.
    unfinished: Mutex<usize>,
    idle: Condvar,
    closed: AtomicBool,
}

impl<T> ConnectionQueue<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        Self {
            tx,
            rx,
            capacity,
            unfinished: Mutex::new(0),
            idle: Condvar::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Queues `item`, blocking while the queue is full.
    pub fn put(&self, mut item: T) -> Result<(), QueueClosed<T>> {
        loop {
            if self.is_closed() {
                return Err(QueueClosed(item));
            }
            self.begin();
            match self.tx.send_timeout(item, PUT_RECHECK) {
                Ok(()) => return Ok(()),
                Err(SendTimeoutError::Timeout(back)) => {
                    self.task_done();
                    item = back;
                }
                Err(SendTimeoutError::Disconnected(back)) => {
                    self.task_done();
                    return Err(QueueClosed(back));
                }
            }
        }
    }

    /// Queues `item` only if there is room right now.
    pub fn try_put(&self, item: T) -> Result<(), TrySendError<T>> {
        if self.is_closed() {
            return Err(TrySendError::Disconnected(item));
        }
        self.begin();
        self.tx.try_send(item).inspect_err(|_| self.task_done())
    }

    /// Takes the oldest item, waiting up to `timeout` for one to arrive.
    pub fn get(&self, timeout: Duration) -> Option<T> {
        match self.rx.recv_timeout(timeout) {
            Ok(item) => Some(item),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Acknowledges one item taken with `get`.
    pub fn task_done(&self) {
        let mut unfinished = self.unfinished.lock();
        *unfinished = unfinished.saturating_sub(1);
        if *unfinished == 0 {
            self.idle.notify_all();
        }
    }

    /// Items queued or in progress.
    pub fn unfinished(&self) -> usize {
        *self.unfinished.lock()
    }

    /// Waits until every queued item has been acknowledged.
    ///
    /// Returns `false` if `timeout` elapsed first.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut unfinished = self.unfinished.lock();
        while *unfinished > 0 {
            if self.idle.wait_until(&mut unfinished, deadline).timed_out() {
                return *unfinished == 0;
            }
        }
        true
    }

    /// Rejects further `put`s. A producer blocked on a full queue is not
    /// woken; it sees the flag on its next recheck, up to `PUT_RECHECK`
    /// later. Items already queued stay available to `get`.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn begin(&self) {
        *self.unfinished.lock() += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_times_out_when_empty() {
        let queue: ConnectionQueue<u32> = ConnectionQueue::new(2);
        assert_eq!(queue.get(Duration::from_millis(10)), None);
    }

    #[test]
    fn fifo_and_acknowledgement() {
        let queue = ConnectionQueue::new(4);
        queue.put(1).unwrap();
        queue.put(2).unwrap();
        assert_eq!(queue.unfinished(), 2);

        assert_eq!(queue.get(Duration::from_millis(10)), Some(1));
        queue.task_done();
        assert_eq!(queue.get(Duration::from_millis(10)), Some(2));
        assert!(!queue.wait_idle(Duration::from_millis(10)));
        queue.task_done();
        assert!(queue.wait_idle(Duration::from_millis(10)));
    }

    #[test]
    fn closed_queue_returns_item() {
        let queue = ConnectionQueue::new(1);
        queue.close();
        let QueueClosed(item) = queue.put(7).unwrap_err();
        assert_eq!(item, 7);
    }
}
