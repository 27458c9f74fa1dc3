// SPDX-License-Identifier: GPL-3.0-only
//! Serial background execution for camera callbacks
//!
//! Every hardware callback of an open session is turned into a message and
//! handled, one at a time and in arrival order, on a single dedicated thread.
//! The handler owns its state outright; nothing else touches it until the
//! thread is joined and the state handed back.
//!
//! Frame-ready notifications are coalesced through [`FrameReadyGate`] so at
//! most one is ever queued: a burst of frames costs one conversion, performed
//! on whatever frame is newest when the handler gets to it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// What the executor does after handling a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    /// Keep handling messages
    Continue,
    /// Exit the thread, returning the state to whoever joins it
    Stop,
}

/// A single serial worker thread fed by an unbounded queue
///
/// # Example
///
/// ```ignore
/// let executor = BackgroundExecutor::spawn("camera-worker", 0u32, |count, msg: u32| {
///     *count += msg;
///     LoopAction::Continue
/// })?;
/// executor.post(5);
/// let total = executor.shutdown(0);
/// ```
pub struct BackgroundExecutor<M, S> {
    sender: mpsc::UnboundedSender<M>,
    thread_handle: Option<JoinHandle<S>>,
    name: String,
}

impl<M, S> BackgroundExecutor<M, S>
where
    M: Send + 'static,
    S: Send + 'static,
{
    /// Start the worker thread
    ///
    /// `handler` runs once per message with exclusive access to `state`. The
    /// thread exits when the handler returns [`LoopAction::Stop`] or every
    /// sender has been dropped.
    pub fn spawn<F>(name: &str, state: S, handler: F) -> std::io::Result<Self>
    where
        F: FnMut(&mut S, M) -> LoopAction + Send + 'static,
    {
        Self::spawn_with_init(name, |_| state, handler)
    }

    /// Start the worker thread, building its state around the queue's sender
    ///
    /// `init` runs on the calling thread before the worker starts, so the
    /// state can hold senders that post back into its own queue.
    pub fn spawn_with_init<I, F>(name: &str, init: I, mut handler: F) -> std::io::Result<Self>
    where
        I: FnOnce(mpsc::UnboundedSender<M>) -> S,
        F: FnMut(&mut S, M) -> LoopAction + Send + 'static,
    {
        let (sender, mut receiver) = mpsc::unbounded_channel::<M>();
        let state = init(sender.clone());
        let thread_name = name.to_string();

        info!(name = %name, "Starting background executor");

        let thread_handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let mut state = state;
                debug!(name = %thread_name, "Executor thread started");

                while let Some(message) = receiver.blocking_recv() {
                    if handler(&mut state, message) == LoopAction::Stop {
                        debug!(name = %thread_name, "Handler requested stop");
                        break;
                    }
                }

                info!(name = %thread_name, "Executor thread exiting");
                state
            })?;

        Ok(Self {
            sender,
            thread_handle: Some(thread_handle),
            name: name.to_string(),
        })
    }

    /// Queue a message; returns false once the worker has exited
    pub fn post(&self, message: M) -> bool {
        self.sender.send(message).is_ok()
    }

    /// A handle other threads can use to post messages
    pub fn sender(&self) -> mpsc::UnboundedSender<M> {
        self.sender.clone()
    }

    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Wait for the worker to exit and take back its state
    ///
    /// The caller is expected to have posted whatever message makes the
    /// handler stop. Returns `None` if the worker panicked.
    pub fn join(mut self) -> Option<S> {
        let handle = self.thread_handle.take()?;
        debug!(name = %self.name, "Waiting for executor thread to finish");
        match handle.join() {
            Ok(state) => Some(state),
            Err(e) => {
                warn!(name = %self.name, "Executor thread panicked: {:?}", e);
                None
            }
        }
    }

    /// Post a final message and join
    pub fn shutdown(self, last: M) -> Option<S> {
        if !self.post(last) {
            debug!(name = %self.name, "Executor already stopped");
        }
        self.join()
    }
}

impl<M, S> Drop for BackgroundExecutor<M, S> {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            // Dropping the handle detaches the thread; it exits once every
            // sender is gone.
            debug!(name = %self.name, "BackgroundExecutor dropped without join");
        }
    }
}

/// Coalesces frame-ready notifications
///
/// [`FrameReadyGate::arm`] returns true only for the first notification after
/// the handler last called [`FrameReadyGate::take`], so the queue never holds
/// more than one pending frame message.
#[derive(Debug, Clone, Default)]
pub struct FrameReadyGate {
    pending: Arc<AtomicBool>,
}

impl FrameReadyGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a frame as ready; true if a message needs to be queued
    pub fn arm(&self) -> bool {
        !self.pending.swap(true, Ordering::AcqRel)
    }

    /// Clear the pending mark before acquiring the newest frame
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}
