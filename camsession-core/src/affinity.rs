//! Single designated thread for hardware lifecycle calls
//!
//! Camera and rendering-context APIs are only safe to touch from one thread.
//! [`AffinityThread`] owns that thread and executes submitted work on it in
//! submission order. [`AffinityThread::run`] blocks the caller until the work
//! has finished, so a transition is never observed as complete while its
//! hardware work is still pending.

use crate::error::{CoreError, CoreResult};
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle, ThreadId};
use tracing::{debug, info, warn};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Dedicated control-plane thread
pub struct AffinityThread {
    name: String,
    sender: Option<flume::Sender<Job>>,
    thread_id: ThreadId,
    handle: Option<JoinHandle<()>>,
}

impl AffinityThread {
    /// Spawn a named affinity thread
    pub fn spawn(name: impl Into<String>) -> CoreResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(CoreError::MissingConfiguration {
                field: "affinity_thread_name".to_string(),
            });
        }

        let (sender, receiver) = flume::unbounded::<Job>();
        let thread_name = name.clone();
        let handle = thread::Builder::new().name(name.clone()).spawn(move || {
            debug!("Affinity thread '{}' started", thread_name);
            while let Ok(job) = receiver.recv() {
                job();
            }
            debug!("Affinity thread '{}' drained and exiting", thread_name);
        })
        .map_err(|e| CoreError::Initialization {
            reason: format!("Failed to spawn affinity thread '{}': {}", name, e),
        })?;

        let thread_id = handle.thread().id();
        info!("Spawned affinity thread '{}'", name);

        Ok(Self {
            name,
            sender: Some(sender),
            thread_id,
            handle: Some(handle),
        })
    }

    /// Name of the affinity thread
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the calling thread is the affinity thread
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    /// Run `work` on the affinity thread and block until it completes.
    ///
    /// Called from the affinity thread itself, the work runs inline. A panic
    /// raised by `work` is resumed on the calling thread; the affinity thread
    /// keeps serving later work.
    pub fn run<F, R>(&self, work: F) -> CoreResult<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        if self.is_current() {
            return Ok(work());
        }

        let (done_tx, done_rx) = flume::bounded(1);
        self.submit(work, done_tx)?;

        match done_rx.recv() {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(payload)) => panic::resume_unwind(payload),
            Err(_) => Err(self.stopped()),
        }
    }

    /// Async variant of [`run`](Self::run) that awaits instead of blocking
    pub async fn run_async<F, R>(&self, work: F) -> CoreResult<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        if self.is_current() {
            return Ok(work());
        }

        let (done_tx, done_rx) = flume::bounded(1);
        self.submit(work, done_tx)?;

        match done_rx.recv_async().await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(payload)) => panic::resume_unwind(payload),
            Err(_) => Err(self.stopped()),
        }
    }

    fn submit<F, R>(&self, work: F, done: flume::Sender<thread::Result<R>>) -> CoreResult<()>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let job: Job = Box::new(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(work));
            // Caller may have gone away; nothing to report to.
            let _ = done.send(outcome);
        });

        self.sender
            .as_ref()
            .ok_or_else(|| self.stopped())?
            .send(job)
            .map_err(|_| self.stopped())
    }

    fn stopped(&self) -> CoreError {
        CoreError::AffinityThreadStopped {
            thread: self.name.clone(),
        }
    }
}

impl std::fmt::Debug for AffinityThread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AffinityThread")
            .field("name", &self.name)
            .field("thread_id", &self.thread_id)
            .field("running", &self.sender.is_some())
            .finish()
    }
}

impl Drop for AffinityThread {
    fn drop(&mut self) {
        // Closing the channel lets the thread drain queued work and exit.
        self.sender.take();

        if let Some(handle) = self.handle.take() {
            if self.is_current() {
                warn!(
                    "Affinity thread '{}' dropped from itself; detaching",
                    self.name
                );
                return;
            }
            if handle.join().is_err() {
                warn!("Affinity thread '{}' terminated by panic", self.name);
            }
        }
    }
}
