//! Execution lanes: the FIFO sequences that run transitions, renders and effects.

use core::sync::atomic::{AtomicBool, Ordering};
use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use flume::{Receiver, Sender};
use spin::{Lazy, Mutex};
use tracing::{debug, error, warn};

use crate::LaneError;

/// A unit of work scheduled on a [`Lane`].
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// A strictly ordered execution sequence.
///
/// Implementations must run jobs one at a time, in the order they were
/// scheduled. Whether they run on a dedicated thread, on a shared executor or
/// inline from a test is up to the implementation.
///
/// A job may schedule further jobs on the same lane (a renderer dispatching
/// from inside `render` does exactly that). Those must not start before the
/// current job returns. A bare `|job: Job| job()` breaks this rule as soon as
/// jobs nest; use [`InlineLane`] to run work on the calling thread.
///
/// Closures automatically implement this trait via the blanket
/// implementation, which makes it easy to plug in a foreign executor.
pub trait Lane: Send + Sync {
    /// Queue a job behind every job scheduled before it.
    fn schedule(&self, job: Job);
}

impl<F> Lane for F
where
    F: Fn(Job) + Send + Sync,
{
    fn schedule(&self, job: Job) {
        self(job)
    }
}

/// A lane backed by a dedicated, named worker thread.
///
/// Jobs are queued through an unbounded channel and run in order. A job that
/// panics is logged and discarded; the worker moves on to the next one. The
/// worker exits once every clone of the lane has been dropped.
#[derive(Clone)]
pub struct ThreadLane {
    label: Arc<str>,
    sender: Sender<Job>,
}

impl ThreadLane {
    /// Spawn a worker thread named `label`.
    pub fn spawn(label: impl Into<String>) -> Result<Self, LaneError> {
        let label: Arc<str> = Arc::from(label.into());
        let (sender, receiver) = flume::unbounded::<Job>();

        let worker_label = label.clone();
        thread::Builder::new()
            .name(label.to_string())
            .spawn(move || run_worker(&worker_label, receiver))
            .map_err(|source| LaneError::Spawn {
                label: label.to_string(),
                source,
            })?;

        Ok(Self { label, sender })
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Lane for ThreadLane {
    fn schedule(&self, job: Job) {
        if self.sender.send(job).is_err() {
            warn!(lane = %self.label, "lane worker is gone, dropping job");
        }
    }
}

fn run_worker(label: &str, receiver: Receiver<Job>) {
    debug!(lane = label, "lane worker started");
    while let Ok(job) = receiver.recv() {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
            error!(
                lane = label,
                panic = panic_message(payload.as_ref()),
                "lane job panicked"
            );
        }
    }
    debug!(lane = label, "lane worker stopped");
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}

/// A lane that runs jobs on the thread that schedules them.
///
/// The first caller drains the queue to completion. Jobs scheduled while it
/// drains, from a nested job or from another thread, join the queue and run
/// after the current one, so nesting never re-enters a running job.
///
/// Clones share the same queue.
#[derive(Clone, Default)]
pub struct InlineLane {
    queue: Arc<Mutex<VecDeque<Job>>>,
    draining: Arc<AtomicBool>,
}

impl InlineLane {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Lane for InlineLane {
    fn schedule(&self, job: Job) {
        self.queue.lock().push_back(job);

        while self
            .draining
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            {
                let _reset = DrainReset(&self.draining);
                loop {
                    let job = self.queue.lock().pop_front();
                    match job {
                        Some(job) => job(),
                        None => break,
                    }
                }
            }
            // a job pushed after the last pop but before the reset is ours to run
            if self.queue.lock().is_empty() {
                break;
            }
        }
    }
}

/// Releases the drain flag even if a job panics.
struct DrainReset<'a>(&'a AtomicBool);

impl Drop for DrainReset<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// The three lanes a runtime schedules onto.
///
/// * `transition` runs `init` continuations and every `update`
/// * `render` runs every `render` call
/// * `effect` runs every effect body
///
/// Each lane is FIFO on its own; the three may run in parallel with each
/// other.
pub struct Lanes {
    pub(crate) transition: Box<dyn Lane>,
    pub(crate) render: Box<dyn Lane>,
    pub(crate) effect: Box<dyn Lane>,
}

struct SharedLanes {
    transition: ThreadLane,
    render: ThreadLane,
    effect: ThreadLane,
}

impl SharedLanes {
    fn spawn() -> Self {
        match Self::try_spawn() {
            Ok(lanes) => lanes,
            Err(err) => panic!("cannot start the shared runtime lanes: {err}"),
        }
    }

    fn try_spawn() -> Result<Self, LaneError> {
        Ok(Self {
            transition: ThreadLane::spawn("leaf-transition")?,
            render: ThreadLane::spawn("leaf-render")?,
            effect: ThreadLane::spawn("leaf-effect")?,
        })
    }
}

static SHARED_LANES: Lazy<SharedLanes> = Lazy::new(SharedLanes::spawn);

impl Lanes {
    pub fn new(
        transition: impl Lane + 'static,
        render: impl Lane + 'static,
        effect: impl Lane + 'static,
    ) -> Self {
        Self {
            transition: Box::new(transition),
            render: Box::new(render),
            effect: Box::new(effect),
        }
    }

    /// The process-wide lanes shared by every runtime that does not bring
    /// its own.
    ///
    /// The worker threads are started on first use.
    ///
    /// # Panics
    ///
    /// Panics if the OS refuses to start the worker threads.
    pub fn shared() -> Self {
        let shared = &*SHARED_LANES;
        Self::new(
            shared.transition.clone(),
            shared.render.clone(),
            shared.effect.clone(),
        )
    }

    /// Three independent [`InlineLane`]s: everything runs on the thread
    /// that constructs the runtime or dispatches to it.
    pub fn inline() -> Self {
        Self::new(InlineLane::new(), InlineLane::new(), InlineLane::new())
    }

    /// Three fresh worker threads named `{prefix}-transition`,
    /// `{prefix}-render` and `{prefix}-effect`.
    ///
    /// The threads stop once the runtime using them is dropped and the last
    /// queued job has run.
    pub fn dedicated(prefix: &str) -> Result<Self, LaneError> {
        Ok(Self::new(
            ThreadLane::spawn(format!("{prefix}-transition"))?,
            ThreadLane::spawn(format!("{prefix}-render"))?,
            ThreadLane::spawn(format!("{prefix}-effect"))?,
        ))
    }
}

impl Default for Lanes {
    fn default() -> Self {
        Self::shared()
    }
}

#[cfg(any(test, feature = "testing"))]
/// A lane that only queues jobs; the test decides when they run.
///
/// Only available with the `testing` feature.
///
/// Clones share the same queue.
#[derive(Clone, Default)]
pub struct ManualLane {
    queue: Arc<Mutex<VecDeque<Job>>>,
}

#[cfg(any(test, feature = "testing"))]
impl Lane for ManualLane {
    fn schedule(&self, job: Job) {
        self.queue.lock().push_back(job);
    }
}

#[cfg(any(test, feature = "testing"))]
impl ManualLane {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued jobs.
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Run the oldest queued job. Returns `false` if the queue was empty.
    pub fn run_next(&self) -> bool {
        // the queue lock must be released before the job schedules more work
        let job = self.queue.lock().pop_front();
        match job {
            Some(job) => {
                job();
                true
            }
            None => false,
        }
    }

    /// Run jobs until the queue is empty, including jobs scheduled while
    /// draining. Returns how many ran.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while self.run_next() {
            ran += 1;
        }
        ran
    }
}

#[cfg(any(test, feature = "testing"))]
/// Three [`ManualLane`]s forming a deterministic, single-threaded scheduler.
///
/// Only available with the `testing` feature.
///
/// Each lane can be drained on its own to observe intermediate states, or
/// all of them together with [`process_events`](Self::process_events).
#[derive(Clone, Default)]
pub struct TestLanes {
    pub transition: ManualLane,
    pub render: ManualLane,
    pub effect: ManualLane,
}

#[cfg(any(test, feature = "testing"))]
impl TestLanes {
    pub fn new() -> Self {
        Self::default()
    }

    /// [`Lanes`] backed by these queues, to hand to a runtime.
    pub fn lanes(&self) -> Lanes {
        Lanes::new(
            self.transition.clone(),
            self.render.clone(),
            self.effect.clone(),
        )
    }

    /// Drain transitions, then renders, then effects, until all three are
    /// empty. Returns the number of jobs run.
    pub fn process_events(&self) -> usize {
        let mut total = 0;
        loop {
            let ran = self.transition.run_until_idle()
                + self.render.run_until_idle()
                + self.effect.run_until_idle();
            if ran == 0 {
                return total;
            }
            total += ran;
        }
    }

    /// Total number of queued jobs across the three lanes.
    pub fn pending(&self) -> usize {
        self.transition.pending() + self.render.pending() + self.effect.pending()
    }
}
