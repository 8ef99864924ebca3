//! Live execution contexts
//!
//! Each [`TestContext`] is one node of the running test tree. A child created
//! with [`TestContext::run`] gets its own thread and runs until it returns or
//! calls [`TestContext::parallel`]. A marked child is paused until its parent
//! closes the current phase, at which point every paused child of that phase
//! is released together and the parent waits for all of them.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use super::slots::Slots;
use crate::models::{TestResult, TestStatus};
use crate::utils::Timer;

/// What a child reports back to the `run` call that created it
enum Signal {
    Paused,
    Finished,
}

/// A child that marked itself parallel and waits for release
struct Parked {
    release: oneshot::Sender<()>,
    done: oneshot::Receiver<()>,
}

/// Mutable state of a context while its test is running
struct RunState {
    is_parallel: bool,
    signal: Option<oneshot::Sender<Signal>>,
    done: Option<oneshot::Sender<()>>,
    pending: Vec<Parked>,
    sub_names: HashMap<String, u32>,
    output: Vec<String>,
}

impl RunState {
    fn new(signal: Option<oneshot::Sender<Signal>>) -> Self {
        Self {
            is_parallel: false,
            signal,
            done: None,
            pending: Vec::new(),
            sub_names: HashMap::new(),
            output: Vec::new(),
        }
    }
}

/// State shared by every context of one run
pub(crate) struct Shared {
    pub(crate) slots: Slots,
    results: Mutex<Vec<TestResult>>,
}

impl Shared {
    pub(crate) fn new(max_parallel: usize) -> Arc<Self> {
        Arc::new(Self {
            slots: Slots::new(max_parallel),
            results: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn take_results(&self) -> Vec<TestResult> {
        std::mem::take(&mut *self.results.lock())
    }
}

struct Inner {
    name: String,
    parent: Option<Arc<Inner>>,
    shared: Arc<Shared>,
    failed: AtomicBool,
    /// `None` once the test has completed
    state: Mutex<Option<RunState>>,
}

/// Handle to a running test
#[derive(Clone)]
pub struct TestContext {
    inner: Arc<Inner>,
}

impl TestContext {
    pub(crate) fn root(shared: Arc<Shared>) -> Self {
        Self::new(String::new(), None, shared, None)
    }

    fn new(
        name: String,
        parent: Option<Arc<Inner>>,
        shared: Arc<Shared>,
        signal: Option<oneshot::Sender<Signal>>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                name,
                parent,
                shared,
                failed: AtomicBool::new(false),
                state: Mutex::new(Some(RunState::new(signal))),
            }),
        }
    }

    /// Full slash-separated name of this test
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Record a line of output for this test
    pub fn log(&self, message: impl Into<String>) {
        let message = message.into();
        debug!(test = %self.inner.name, "{}", message);
        if let Some(state) = self.inner.state.lock().as_mut() {
            state.output.push(message);
        }
    }

    /// Log a message and mark the test failed
    pub fn error(&self, message: impl Into<String>) {
        self.log(message);
        self.fail();
    }

    /// Mark this test and all of its ancestors failed
    pub fn fail(&self) {
        let mut current = Some(&self.inner);
        while let Some(inner) = current {
            inner.failed.store(true, Ordering::SeqCst);
            current = inner.parent.as_ref();
        }
    }

    pub fn failed(&self) -> bool {
        self.inner.failed.load(Ordering::SeqCst)
    }

    /// Run `body` as a named subtest.
    ///
    /// Blocks until the subtest returns or marks itself parallel. Returns
    /// `false` only when the subtest already finished and failed.
    ///
    /// # Panics
    ///
    /// Panics when called on a context whose test has already completed.
    pub fn run<F>(&self, name: &str, body: F) -> bool
    where
        F: FnOnce(&TestContext) + Send + 'static,
    {
        let (signal_tx, signal_rx) = oneshot::channel();

        let full_name = {
            let mut guard = self.inner.state.lock();
            let Some(state) = guard.as_mut() else {
                panic!("partest: run called on {} after it completed", self.inner.name);
            };
            let unique = unique_name(&mut state.sub_names, name);
            if self.inner.name.is_empty() {
                unique
            } else {
                format!("{}/{}", self.inner.name, unique)
            }
        };

        let child = TestContext::new(
            full_name,
            Some(self.inner.clone()),
            self.inner.shared.clone(),
            Some(signal_tx),
        );
        debug!(test = %child.name(), "=== RUN");

        let runner = child.clone();
        let spawned = thread::Builder::new()
            .name(child.name().to_string())
            .spawn(move || runner.execute(body));

        if let Err(err) = spawned {
            self.error(format!("could not start {}: {err}", child.name()));
            return false;
        }

        match signal_rx.blocking_recv() {
            Ok(Signal::Paused) => true,
            Ok(Signal::Finished) => !child.failed(),
            Err(_) => false,
        }
    }

    /// Mark this test to run in parallel with its marked siblings.
    ///
    /// Returns once the parent has released its paused children and a
    /// concurrency slot is free.
    ///
    /// # Panics
    ///
    /// Panics when called twice on the same context, or on the root context.
    pub fn parallel(&self) {
        let Some(parent) = self.inner.parent.clone() else {
            panic!("partest: parallel called on the root context");
        };

        let (release_tx, release_rx) = oneshot::channel();
        let (done_tx, done_rx) = oneshot::channel();

        let signal = {
            let mut guard = self.inner.state.lock();
            let Some(state) = guard.as_mut() else {
                panic!("partest: parallel called on {} after it completed", self.inner.name);
            };
            if state.is_parallel {
                panic!("partest: parallel called multiple times on {}", self.inner.name);
            }
            state.is_parallel = true;
            state.done = Some(done_tx);
            state.signal.take()
        };

        let parked = match parent.state.lock().as_mut() {
            Some(parent_state) => {
                parent_state.pending.push(Parked {
                    release: release_tx,
                    done: done_rx,
                });
                true
            }
            None => false,
        };

        debug!(test = %self.inner.name, "=== PAUSE");
        if let Some(signal) = signal {
            let _ = signal.send(Signal::Paused);
        }

        if parked {
            // An error means the parent dropped us without releasing; carry on.
            let _ = release_rx.blocking_recv();
        } else {
            warn!(test = %self.inner.name, "parent already completed, running unpaused");
        }

        self.inner.shared.slots.acquire();
        debug!(test = %self.inner.name, "=== CONT");
    }

    /// Run `issue`, then release and wait for every child it marked parallel.
    ///
    /// Children marked before the phase started stay pending until the
    /// enclosing body returns. A panic in `issue` is re-raised only after
    /// the phase's children have been joined and the earlier ones restored.
    pub fn phase<F: FnOnce()>(&self, issue: F) {
        let earlier = self.swap_pending(Vec::new());
        let issued = panic::catch_unwind(AssertUnwindSafe(issue));
        let marked = self.swap_pending(earlier);
        self.release_marked(marked, true);

        if let Err(payload) = issued {
            panic::resume_unwind(payload);
        }
    }

    /// Raw view of the private parallel marker, `None` once the test has
    /// completed and its run state is gone.
    pub(crate) fn parallel_flag(&self) -> Option<bool> {
        self.inner.state.lock().as_ref().map(|state| state.is_parallel)
    }

    /// Run `body` on the current thread and complete the test
    pub(crate) fn execute<F: FnOnce(&TestContext)>(self, body: F) {
        let started_at = Utc::now();
        let timer = Timer::start(self.inner.name.clone());

        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| body(&self))) {
            self.error(format!("panic: {}", panic_message(payload.as_ref())));
        }

        self.complete(started_at, timer);
    }

    fn complete(&self, started_at: DateTime<Utc>, timer: Timer) {
        let is_parallel = self.parallel_flag().unwrap_or(false);

        // The end of the body closes the implicit phase.
        let marked = self.swap_pending(Vec::new());
        if !marked.is_empty() {
            self.release_marked(marked, !is_parallel);
        } else if is_parallel {
            self.inner.shared.slots.release();
        }

        let elapsed = timer.stop();
        let Some(state) = self.inner.state.lock().take() else {
            return;
        };

        if self.inner.parent.is_some() {
            let status = if self.failed() {
                warn!(test = %self.inner.name, "--- FAIL");
                TestStatus::Fail
            } else {
                debug!(test = %self.inner.name, "--- PASS");
                TestStatus::Pass
            };

            self.inner.shared.results.lock().push(TestResult {
                name: self.inner.name.clone(),
                status,
                parallel: state.is_parallel,
                started_at,
                duration_ms: elapsed.as_millis() as u64,
                output: state.output,
            });
        }

        if state.is_parallel {
            if let Some(done) = state.done {
                let _ = done.send(());
            }
        } else if let Some(signal) = state.signal {
            let _ = signal.send(Signal::Finished);
        }
    }

    fn swap_pending(&self, with: Vec<Parked>) -> Vec<Parked> {
        match self.inner.state.lock().as_mut() {
            Some(state) => std::mem::replace(&mut state.pending, with),
            None => Vec::new(),
        }
    }

    fn release_marked(&self, marked: Vec<Parked>, reacquire: bool) {
        if marked.is_empty() {
            return;
        }

        let slots = &self.inner.shared.slots;
        slots.release();

        let done: Vec<_> = marked
            .into_iter()
            .map(|parked| {
                let _ = parked.release.send(());
                parked.done
            })
            .collect();
        for finished in done {
            let _ = finished.blocking_recv();
        }

        if reacquire {
            slots.acquire();
        }
    }
}

/// Make `name` unique among siblings: `name`, `name#01`, `name#02`, ...
fn unique_name(seen: &mut HashMap<String, u32>, name: &str) -> String {
    let count = seen.entry(name.to_string()).or_insert(0);
    let unique = if *count == 0 && !name.is_empty() {
        name.to_string()
    } else {
        format!("{name}#{:02}", *count)
    };
    *count += 1;
    unique
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
