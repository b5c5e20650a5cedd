//! Fixed worker pool running world-updater ticks off the frame thread.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};

/// Work unit handed to the pool. Panics are contained per job.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Pool size for a given updater count: one thread per updater, capped so a
/// pathological pipeline does not oversubscribe the machine.
pub fn pool_size_for(updater_count: usize) -> usize {
    updater_count.clamp(1, 4)
}

struct BatchState {
    remaining: Mutex<usize>,
    done: Condvar,
}

/// Completion handle for one submitted batch of jobs.
#[derive(Clone)]
pub struct BatchHandle {
    state: Arc<BatchState>,
}

impl BatchHandle {
    fn new(job_count: usize) -> Self {
        Self {
            state: Arc::new(BatchState {
                remaining: Mutex::new(job_count),
                done: Condvar::new(),
            }),
        }
    }

    fn job_finished(&self) {
        let mut remaining = self.state.remaining.lock().unwrap();
        *remaining -= 1;
        if *remaining == 0 {
            self.state.done.notify_all();
        }
    }

    pub fn is_done(&self) -> bool {
        *self.state.remaining.lock().unwrap() == 0
    }

    /// Blocks until every job of the batch has finished.
    pub fn wait(&self) {
        let mut remaining = self.state.remaining.lock().unwrap();
        while *remaining > 0 {
            remaining = self.state.done.wait(remaining).unwrap();
        }
    }
}

/// Long-lived thread pool feeding updater jobs through a channel.
pub struct UpdaterPool {
    jobs: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl UpdaterPool {
    pub fn new(size: usize) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded::<Job>();
        let workers = (0..size)
            .map(|i| {
                let rx: Receiver<Job> = rx.clone();
                thread::Builder::new()
                    .name(format!("world-updater-{i}"))
                    .spawn(move || {
                        // Exits when the sender side is dropped.
                        for job in rx.iter() {
                            job();
                        }
                    })
                    .unwrap_or_else(|e| panic!("failed to spawn updater thread: {e}"))
            })
            .collect();
        log::debug!("updater pool started with {size} thread(s)");
        Self {
            jobs: Some(tx),
            workers,
        }
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Submits one batch of jobs and returns its completion handle. A
    /// panicking job is logged and counted as finished, so the batch always
    /// completes.
    pub fn submit(&self, jobs: Vec<Job>) -> BatchHandle {
        let handle = BatchHandle::new(jobs.len());
        let sender = self
            .jobs
            .as_ref()
            .unwrap_or_else(|| panic!("updater pool already shut down"));
        for job in jobs {
            let handle = handle.clone();
            let wrapped: Job = Box::new(move || {
                if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                    log::error!("world updater job panicked; continuing with remaining jobs");
                }
                handle.job_finished();
            });
            // Receivers outlive the sender, so this cannot fail while the
            // pool is alive.
            let _ = sender.send(wrapped);
        }
        handle
    }

    /// Stops accepting jobs and waits up to `grace` for workers to drain.
    /// Workers still busy after the deadline are detached and logged.
    pub fn shutdown(&mut self, grace: Duration) {
        self.jobs = None;

        let deadline = Instant::now() + grace;
        while Instant::now() < deadline && self.workers.iter().any(|w| !w.is_finished()) {
            thread::sleep(Duration::from_millis(10));
        }

        let mut detached = 0;
        for worker in self.workers.drain(..) {
            if worker.is_finished() {
                let _ = worker.join();
            } else {
                detached += 1;
            }
        }
        if detached > 0 {
            log::warn!("{detached} updater thread(s) still busy after shutdown grace, detaching");
        }
    }
}

impl Drop for UpdaterPool {
    fn drop(&mut self) {
        if !self.workers.is_empty() {
            self.shutdown(Duration::from_secs(10));
        }
    }
}
