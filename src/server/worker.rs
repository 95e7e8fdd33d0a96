//! Fixed pool of worker threads draining the connection queue.

use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, error, warn};

use crate::server::queue::ConnectionQueue;

/// Processes one dequeued job.
pub type Handler<T> = Arc<dyn Fn(T) -> anyhow::Result<()> + Send + Sync>;

/// How often a joining caller checks whether the thread has exited.
const JOIN_POLL: Duration = Duration::from_millis(10);

/// A long-lived thread pulling jobs off a shared queue.
///
/// The running flag is only checked between jobs and after each `get`
/// timeout, so stopping a worker never interrupts a job in progress.
pub struct Worker {
    id: usize,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Spawns the worker thread and starts polling `queue`.
    pub fn start<T: Send + 'static>(
        id: usize,
        queue: Arc<ConnectionQueue<T>>,
        handler: Handler<T>,
        poll_interval: Duration,
    ) -> io::Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);

        let handle = thread::Builder::new()
            .name(format!("wicket-worker-{id}"))
            .spawn(move || run(id, &flag, &queue, &handler, poll_interval))?;

        Ok(Self {
            id,
            running,
            handle: Some(handle),
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Asks the worker to exit after its current job, if any.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Whether the thread has exited (or was already joined).
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(|h| h.is_finished())
    }

    /// Waits up to `timeout` for the thread to exit.
    ///
    /// Returns `false` if it is still running; the thread is then left
    /// detached, never killed.
    pub fn join(&mut self, timeout: Duration) -> bool {
        let Some(handle) = self.handle.take() else {
            return true;
        };

        let deadline = Instant::now() + timeout;
        while !handle.is_finished() {
            if Instant::now() >= deadline {
                warn!(worker = self.id, "worker did not exit in time, abandoning it");
                return false;
            }
            thread::sleep(JOIN_POLL);
        }

        if handle.join().is_err() {
            error!(worker = self.id, "worker thread panicked");
        }
        true
    }
}

fn run<T>(
    id: usize,
    running: &AtomicBool,
    queue: &ConnectionQueue<T>,
    handler: &Handler<T>,
    poll_interval: Duration,
) {
    debug!(worker = id, "worker started");

    while running.load(Ordering::Acquire) {
        let Some(job) = queue.get(poll_interval) else {
            continue;
        };

        // Stopped while waiting in `get`: the job is dropped unhandled.
        if !running.load(Ordering::Acquire) {
            debug!(worker = id, "dropping job taken after stop");
            drop(job);
            queue.task_done();
            break;
        }

        match panic::catch_unwind(AssertUnwindSafe(|| (**handler)(job))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(worker = id, error = %e, "unhandled error"),
            Err(payload) => error!(worker = id, panic = panic_message(&*payload), "job panicked"),
        }

        queue.task_done();
    }

    debug!(worker = id, "worker stopped");
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

/// The fixed set of workers sharing one queue.
pub struct WorkerPool<T> {
    workers: Vec<Worker>,
    queue: Arc<ConnectionQueue<T>>,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Starts `count` workers, each running `handler` on the jobs it takes.
    pub fn start(
        count: usize,
        queue: Arc<ConnectionQueue<T>>,
        handler: Handler<T>,
        poll_interval: Duration,
    ) -> io::Result<Self> {
        let mut workers: Vec<Worker> = Vec::with_capacity(count);
        for id in 0..count {
            let worker = match Worker::start(id, Arc::clone(&queue), Arc::clone(&handler), poll_interval) {
                Ok(worker) => worker,
                Err(e) => {
                    for worker in &workers {
                        worker.stop();
                    }
                    return Err(e);
                }
            };
            workers.push(worker);
        }
        Ok(Self { workers, queue })
    }
}

impl<T> WorkerPool<T> {
    pub fn queue(&self) -> &Arc<ConnectionQueue<T>> {
        &self.queue
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    pub fn stop(&self) {
        for worker in &self.workers {
            worker.stop();
        }
    }

    /// Joins every worker, giving each up to `timeout`.
    ///
    /// Returns how many workers were abandoned.
    pub fn join(&mut self, timeout: Duration) -> usize {
        self.workers
            .iter_mut()
            .map(|worker| worker.join(timeout))
            .filter(|joined| !joined)
            .count()
    }

    /// Stops all workers, then joins them.
    pub fn shutdown(&mut self, timeout: Duration) -> usize {
        self.stop();
        let abandoned = self.join(timeout);
        if abandoned > 0 {
            warn!(abandoned, "shutdown finished with workers still busy");
        }
        abandoned
    }
}
