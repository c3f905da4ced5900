//! Hands work from the IO thread to the thread that owns application state.
//!
//! The owning thread keeps a [`TaskQueue`] and drains it from its own loop.
//! The IO thread holds a [`Bridge`], which wraps each unit of work in a task,
//! pushes it onto the queue and blocks on a single-slot channel until the
//! owning thread has run it. Tasks run strictly in submission order, so two
//! commands never touch the state at the same time.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
    mpsc,
};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::debug;

const BRIDGE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::bridge");

/// How often a blocked caller re-checks the shutdown flag.
const BRIDGE_POLL: Duration = Duration::from_millis(50);

/// Unit of work executed against the owned state.
pub type Task<A> = Box<dyn FnOnce(&mut A) + Send + 'static>;

/// Errors raised when work cannot be completed on the owning thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// The owning thread no longer accepts tasks.
    #[error("client is not accepting tasks")]
    Closed,
    /// Shutdown began before the owning thread ran the task.
    #[error("server is shutting down")]
    Abandoned,
    /// The task was discarded without producing a result.
    #[error("task was dropped before completion")]
    Dropped,
}

/// Creates a connected sender/queue pair for state owned by type `A`.
#[must_use]
pub fn task_queue<A>() -> (TaskSender<A>, TaskQueue<A>) {
    let (sender, receiver) = mpsc::channel();
    (TaskSender { sender }, TaskQueue { receiver })
}

/// Submission side of the owning thread's task queue.
pub struct TaskSender<A> {
    sender: mpsc::Sender<Task<A>>,
}

impl<A> Clone for TaskSender<A> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<A> TaskSender<A> {
    /// Enqueues `task` without waiting for it to run.
    pub fn submit(&self, task: Task<A>) -> Result<(), BridgeError> {
        self.sender.send(task).map_err(|_| BridgeError::Closed)
    }
}

/// Receiving side of the task queue, drained by the owning thread.
pub struct TaskQueue<A> {
    receiver: mpsc::Receiver<Task<A>>,
}

impl<A> TaskQueue<A> {
    /// Runs every task already queued and returns how many ran.
    ///
    /// Suited to a frame or tick loop that must never block.
    pub fn run_pending(&self, state: &mut A) -> usize {
        let mut executed = 0;
        while let Ok(task) = self.receiver.try_recv() {
            task(state);
            executed += 1;
        }
        executed
    }

    /// Runs tasks as they arrive until `timeout` elapses.
    pub fn run_for(&self, state: &mut A, timeout: Duration) -> usize {
        let deadline = Instant::now() + timeout;
        let mut executed = 0;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.receiver.recv_timeout(remaining) {
                Ok(task) => {
                    task(state);
                    executed += 1;
                }
                Err(mpsc::RecvTimeoutError::Timeout | mpsc::RecvTimeoutError::Disconnected) => {
                    return executed;
                }
            }
        }
    }

    /// Runs tasks until every sender has been dropped.
    pub fn run_until_closed(&self, state: &mut A) -> usize {
        let mut executed = 0;
        while let Ok(task) = self.receiver.recv() {
            task(state);
            executed += 1;
        }
        executed
    }
}

/// Blocking call path from the IO thread into the owning thread.
pub struct Bridge<A> {
    sender: TaskSender<A>,
    shutdown: Arc<AtomicBool>,
}

impl<A> Clone for Bridge<A> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            shutdown: Arc::clone(&self.shutdown),
        }
    }
}

impl<A> Bridge<A> {
    /// Builds a bridge that gives up waiting once `shutdown` is raised.
    #[must_use]
    pub const fn new(sender: TaskSender<A>, shutdown: Arc<AtomicBool>) -> Self {
        Self { sender, shutdown }
    }

    /// Runs `work` on the owning thread and returns its result.
    ///
    /// Blocks the caller until the owning thread has executed the task. If
    /// shutdown starts first the wait is abandoned; the task may still run
    /// later but its result is discarded.
    pub fn call<R, F>(&self, work: F) -> Result<R, BridgeError>
    where
        F: FnOnce(&mut A) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (result_tx, result_rx) = mpsc::sync_channel(1);
        self.sender.submit(Box::new(move |state: &mut A| {
            if result_tx.send(work(state)).is_err() {
                debug!(target: BRIDGE_TARGET, "caller stopped waiting, result discarded");
            }
        }))?;

        loop {
            match result_rx.recv_timeout(BRIDGE_POLL) {
                Ok(result) => return Ok(result),
                Err(mpsc::RecvTimeoutError::Disconnected) => return Err(BridgeError::Dropped),
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    if self.shutdown.load(Ordering::SeqCst) {
                        debug!(target: BRIDGE_TARGET, "abandoning task wait for shutdown");
                        return Err(BridgeError::Abandoned);
                    }
                }
            }
        }
    }
}
