// Scheduler
// Fixed pool of fatigue-weighted workers with submit, fork-join batches and drain-on-shutdown

use crate::error::{EngineError, EngineResult};
use crate::scheduling::report::{SchedulerReport, WorkerReport};
use crate::scheduling::selection::{IdleSelector, LeastFatigued, SelectionPolicy};
use crate::scheduling::worker::{Assignment, Worker};

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct InFlightState {
    count: usize,
    failures: Vec<EngineError>,
}

/// Count of submitted-but-unfinished tasks plus the failures they reported
#[derive(Debug, Default)]
struct InFlight {
    state: Mutex<InFlightState>,
    drained: Condvar,
}

impl InFlight {
    fn begin(&self) {
        self.state.lock().count += 1;
    }

    fn finish(&self, result: EngineResult<()>) {
        let mut state = self.state.lock();
        if let Err(err) = result {
            state.failures.push(err);
        }
        state.count -= 1;
        if state.count == 0 {
            self.drained.notify_all();
        }
    }

    fn count(&self) -> usize {
        self.state.lock().count
    }

    /// Block until nothing is in flight, then hand back collected failures
    fn wait_drained(&self) -> Vec<EngineError> {
        let mut state = self.state.lock();
        while state.count > 0 {
            self.drained.wait(&mut state);
        }
        std::mem::take(&mut state.failures)
    }
}

/// Fixed pool of workers fed through a fatigue-ordered idle selector.
///
/// At most one thread should issue batches at a time, and `shutdown` must
/// only be called once nothing else is submitting.
#[derive(Debug)]
pub struct Scheduler {
    workers: Vec<Arc<Worker>>,
    idle: Arc<IdleSelector>,
    in_flight: Arc<InFlight>,
    shut_down: AtomicBool,
}

impl Scheduler {
    /// Pool of `thread_count` workers, all with fatigue factor 1.0
    pub fn new(thread_count: usize) -> EngineResult<Self> {
        Self::with_factors(&vec![1.0; thread_count])
    }

    /// One worker per factor
    pub fn with_factors(factors: &[f64]) -> EngineResult<Self> {
        Self::with_policy(factors, Box::new(LeastFatigued))
    }

    pub fn with_policy(factors: &[f64], policy: Box<dyn SelectionPolicy>) -> EngineResult<Self> {
        if factors.is_empty() {
            return Err(EngineError::validation(
                "scheduler needs at least one worker",
            ));
        }

        let idle = Arc::new(IdleSelector::new(policy));
        let mut workers = Vec::with_capacity(factors.len());

        for (id, &factor) in factors.iter().enumerate() {
            match Worker::spawn(id, factor) {
                Ok(worker) => {
                    let worker = Arc::new(worker);
                    idle.release(Arc::clone(&worker));
                    workers.push(worker);
                }
                Err(err) => {
                    idle.close();
                    for worker in &workers {
                        worker.terminate();
                        let _ = worker.join();
                    }
                    return Err(err);
                }
            }
        }

        debug!(workers = workers.len(), "scheduler started");

        Ok(Self {
            workers,
            idle,
            in_flight: Arc::new(InFlight::default()),
            shut_down: AtomicBool::new(false),
        })
    }

    pub fn thread_count(&self) -> usize {
        self.workers.len()
    }

    /// Tasks submitted but not yet finished
    pub fn in_flight(&self) -> usize {
        self.in_flight.count()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    /// Hand `task` to the least-fatigued idle worker.
    ///
    /// Blocks while every worker is busy, which bounds outstanding work to
    /// the pool size. Whatever the task's outcome, its worker goes back to
    /// the idle set and the in-flight count drops; a failure is kept for the
    /// next [`wait`](Self::wait).
    pub fn submit<F>(&self, task: F) -> EngineResult<()>
    where
        F: FnOnce() -> EngineResult<()> + Send + 'static,
    {
        if self.is_shut_down() {
            return Err(EngineError::interrupted("scheduler is shut down"));
        }

        let worker = self.idle.acquire()?;
        self.in_flight.begin();

        let idle = Arc::clone(&self.idle);
        let in_flight = Arc::clone(&self.in_flight);
        let returning = Arc::clone(&worker);
        let assignment = Assignment::new(task).on_complete(move |result| {
            idle.release(returning);
            in_flight.finish(result);
        });

        if let Err(err) = worker.deliver(assignment) {
            // The worker never took the assignment, so the hook will not run
            self.in_flight.finish(Ok(()));
            return Err(err);
        }
        Ok(())
    }

    /// Submit every task in order, then wait until nothing is in flight.
    ///
    /// Returns the first failure reported by any finished task. If a
    /// submission itself fails, the tasks already submitted are still
    /// waited for before the error is returned.
    pub fn submit_batch_and_wait<I, F>(&self, tasks: I) -> EngineResult<()>
    where
        I: IntoIterator<Item = F>,
        F: FnOnce() -> EngineResult<()> + Send + 'static,
    {
        let mut submitted = 0usize;
        let mut submit_error = None;

        for task in tasks {
            if let Err(err) = self.submit(task) {
                submit_error = Some(err);
                break;
            }
            submitted += 1;
        }

        let waited = self.wait();
        debug!(tasks = submitted, "batch finished");

        match submit_error {
            Some(err) => Err(err),
            None => waited,
        }
    }

    /// Fork-join barrier: block until the in-flight count returns to zero
    pub fn wait(&self) -> EngineResult<()> {
        let mut failures = self.in_flight.wait_drained().into_iter();
        match failures.next() {
            Some(first) => {
                for other in failures {
                    warn!(error = %other, "additional task failure in batch");
                }
                Err(first)
            }
            None => Ok(()),
        }
    }

    /// Terminate every worker and wait for their threads to exit.
    ///
    /// Running and already delivered tasks finish first. Submitters blocked
    /// waiting for an idle worker are released with `Interrupted`. Calling
    /// this more than once is harmless.
    pub fn shutdown(&self) -> EngineResult<()> {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        self.idle.close();
        for worker in &self.workers {
            worker.terminate();
        }

        let mut result = Ok(());
        for worker in &self.workers {
            if let Err(err) = worker.join() {
                warn!(worker = worker.id(), error = %err, "worker did not exit cleanly");
                if result.is_ok() {
                    result = Err(err);
                }
            }
        }

        info!(workers = self.workers.len(), "scheduler shut down");
        result
    }

    /// Snapshot of per-worker statistics
    pub fn report(&self) -> SchedulerReport {
        SchedulerReport::new(
            self.workers
                .iter()
                .map(|worker| WorkerReport::capture(worker))
                .collect(),
        )
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}
