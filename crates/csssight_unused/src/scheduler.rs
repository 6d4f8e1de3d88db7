//! Coalescing scheduler for analysis passes.
//!
//! At most one pass runs at a time, on a dedicated worker thread. A request
//! that arrives while a pass is running cancels that pass and leaves exactly
//! one follow-up pending, however many requests arrive in the meantime.

use log::{debug, trace, warn};
use parking_lot::{Condvar, Mutex};
use std::{
    panic::{self, AssertUnwindSafe},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    thread::{self, JoinHandle},
};

/// Handed to each pass; flips once a newer pass has been requested.
#[derive(Debug, Clone)]
pub struct CancelToken {
    generation: u64,
    current: Option<Arc<AtomicU64>>,
}

impl CancelToken {
    /// A token that is never cancelled, for one-shot runs.
    pub fn never() -> Self {
        Self { generation: 0, current: None }
    }

    #[cfg(test)]
    pub(crate) fn cancelled() -> Self {
        Self { generation: 0, current: Some(Arc::new(AtomicU64::new(1))) }
    }

    pub fn is_cancelled(&self) -> bool {
        match &self.current {
            Some(current) => current.load(Ordering::SeqCst) != self.generation,
            None => false,
        }
    }
}

#[derive(Default)]
struct State {
    pending: bool,
    running: bool,
    shutdown: bool,
    passes: u64,
}

struct Shared {
    state: Mutex<State>,
    wake: Condvar,
    generation: Arc<AtomicU64>,
}

pub struct PassScheduler {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl PassScheduler {
    /// Starts the worker thread. `pass` runs once per coalesced request and
    /// should check its token between units of work.
    pub fn new<F>(mut pass: F) -> Self
    where
        F: FnMut(&CancelToken) + Send + 'static,
    {
        let shared = Arc::new(Shared {
            state: Mutex::new(State::default()),
            wake: Condvar::new(),
            generation: Arc::new(AtomicU64::new(0)),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = thread::spawn(move || {
            loop {
                let token = {
                    let mut state = worker_shared.state.lock();
                    while !state.pending && !state.shutdown {
                        worker_shared.wake.wait(&mut state);
                    }
                    if state.shutdown {
                        trace!("Pass worker shutting down");
                        return;
                    }
                    state.pending = false;
                    state.running = true;
                    state.passes += 1;
                    CancelToken {
                        generation: worker_shared.generation.load(Ordering::SeqCst),
                        current: Some(Arc::clone(&worker_shared.generation)),
                    }
                };

                debug!("Starting pass (generation {})", token.generation);
                // A panicking pass must not leave `running` set or kill the worker.
                if panic::catch_unwind(AssertUnwindSafe(|| pass(&token))).is_err() {
                    warn!("Pass {} panicked", token.generation);
                } else if token.is_cancelled() {
                    debug!("Pass {} was superseded", token.generation);
                }

                let mut state = worker_shared.state.lock();
                state.running = false;
                worker_shared.wake.notify_all();
            }
        });

        Self { shared, worker: Some(worker) }
    }

    /// Asks for a new pass, cancelling the one in flight.
    pub fn request(&self) {
        let mut state = self.shared.state.lock();
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        trace!("Pass requested (generation {}, running: {})", generation, state.running);
        state.pending = true;
        self.shared.wake.notify_all();
    }

    /// Blocks until no pass is running or pending.
    pub fn wait_idle(&self) {
        let mut state = self.shared.state.lock();
        while state.pending || state.running {
            self.shared.wake.wait(&mut state);
        }
    }

    /// Number of passes started so far.
    pub fn passes_started(&self) -> u64 {
        self.shared.state.lock().passes
    }

    /// Cancels the pass in flight, drops any pending one and joins the worker.
    pub fn shutdown(&mut self) {
        {
            let mut state = self.shared.state.lock();
            state.shutdown = true;
            state.pending = false;
            self.shared.generation.fetch_add(1, Ordering::SeqCst);
            self.shared.wake.notify_all();
        }
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            debug!("Pass worker panicked");
        }
    }
}

impl Drop for PassScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
