//! Main-loop hand-off.
//!
//! Listeners must run on the application's main thread. The dispatch router
//! posts a task to a [`MainLoop`] and returns immediately; the owner of the
//! main loop runs the task later. Two adapters are provided:
//!
//! - [`ChannelMainLoop`]: crossbeam channel drained by a [`MainLoopDriver`]
//!   that stays on the thread that created it.
//! - [`TokioMainLoop`]: tokio mpsc drained by a [`TokioMainLoopRunner`] task.

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::marker::PhantomData;
use std::rc::Rc;
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

/// Unit of work scheduled onto the main loop.
pub type MainLoopTask = Box<dyn FnOnce() + Send + 'static>;

/// The main loop is gone and can no longer accept tasks.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("main loop is closed")]
pub struct MainLoopClosed;

/// Something that runs tasks on the application's main thread.
pub trait MainLoop: Send + Sync {
    /// Schedule `task`. Fire-and-forget: does not wait for the task to run.
    fn post(&self, task: MainLoopTask) -> Result<(), MainLoopClosed>;
}

// ---------------------------------------------------------------------------
// Channel-backed main loop
// ---------------------------------------------------------------------------

/// Posting half of a crossbeam-backed main loop. Cheap to clone.
#[derive(Clone)]
pub struct ChannelMainLoop {
    tx: Sender<MainLoopTask>,
}

/// Draining half. Not `Send`: it runs tasks on the thread that created it.
pub struct MainLoopDriver {
    rx: Receiver<MainLoopTask>,
    owner: ThreadId,
    _not_send: PhantomData<Rc<()>>,
}

impl ChannelMainLoop {
    /// Create a main loop owned by the calling thread.
    pub fn new() -> (Self, MainLoopDriver) {
        let (tx, rx) = channel::unbounded();
        let driver = MainLoopDriver {
            rx,
            owner: thread::current().id(),
            _not_send: PhantomData,
        };
        (Self { tx }, driver)
    }
}

impl MainLoop for ChannelMainLoop {
    fn post(&self, task: MainLoopTask) -> Result<(), MainLoopClosed> {
        self.tx.send(task).map_err(|_| MainLoopClosed)
    }
}

impl MainLoopDriver {
    /// Id of the thread tasks run on.
    pub fn owner(&self) -> ThreadId {
        self.owner
    }

    /// Whether the caller is on the main-loop thread.
    pub fn is_main_thread(&self) -> bool {
        thread::current().id() == self.owner
    }

    /// Number of tasks waiting to run.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Run every task queued right now. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            match self.rx.try_recv() {
                Ok(task) => {
                    self.run_task(task);
                    ran += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        ran
    }

    /// Run tasks as they arrive until `timeout` passes with nothing to do.
    pub fn run_until_idle(&self, timeout: Duration) -> usize {
        let mut ran = 0;
        loop {
            match self.rx.recv_timeout(timeout) {
                Ok(task) => {
                    self.run_task(task);
                    ran += 1;
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        ran
    }

    /// Run tasks until `deadline` or until `done` returns true.
    pub fn run_until(&self, deadline: Instant, mut done: impl FnMut() -> bool) -> usize {
        let mut ran = 0;
        while !done() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            match self.rx.recv_timeout(deadline - now) {
                Ok(task) => {
                    self.run_task(task);
                    ran += 1;
                }
                Err(_) => break,
            }
        }
        ran
    }

    /// Run until every [`ChannelMainLoop`] handle has been dropped.
    pub fn run(self) -> usize {
        let mut ran = 0;
        for task in self.rx.iter() {
            self.run_task(task);
            ran += 1;
        }
        debug!(tasks = ran, "Main loop finished");
        ran
    }

    fn run_task(&self, task: MainLoopTask) {
        debug_assert!(
            self.is_main_thread(),
            "main loop task run off its owner thread"
        );
        task();
    }
}

// ---------------------------------------------------------------------------
// Tokio-backed main loop
// ---------------------------------------------------------------------------

/// Posting half of a tokio-backed main loop.
#[derive(Clone)]
pub struct TokioMainLoop {
    tx: mpsc::UnboundedSender<MainLoopTask>,
}

/// Draining half, meant to be driven by the task that owns the main loop.
pub struct TokioMainLoopRunner {
    rx: mpsc::UnboundedReceiver<MainLoopTask>,
}

impl TokioMainLoop {
    pub fn new() -> (Self, TokioMainLoopRunner) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, TokioMainLoopRunner { rx })
    }
}

impl MainLoop for TokioMainLoop {
    fn post(&self, task: MainLoopTask) -> Result<(), MainLoopClosed> {
        self.tx.send(task).map_err(|_| MainLoopClosed)
    }
}

impl TokioMainLoopRunner {
    /// Run every task queued right now.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.rx.try_recv() {
            task();
            ran += 1;
        }
        ran
    }

    /// Wait for the next task and run it. Returns false once all senders are gone.
    pub async fn run_one(&mut self) -> bool {
        match self.rx.recv().await {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Run until every [`TokioMainLoop`] handle has been dropped.
    pub async fn run(mut self) -> usize {
        let mut ran = 0;
        while let Some(task) = self.rx.recv().await {
            task();
            ran += 1;
        }
        debug!(tasks = ran, "Main loop finished");
        ran
    }
}
