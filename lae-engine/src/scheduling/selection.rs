// Idle Worker Selection
// Comparator-driven idle set the scheduler draws workers from

use crate::error::{EngineError, EngineResult};
use crate::scheduling::worker::Worker;

use parking_lot::{Condvar, Mutex};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Ordering used to pick the next idle worker; the smallest worker wins
pub trait SelectionPolicy: Send + Sync + fmt::Debug {
    fn compare(&self, a: &Worker, b: &Worker) -> Ordering;
}

/// Ascending fatigue score, ties broken by ascending worker id
#[derive(Debug, Default, Clone, Copy)]
pub struct LeastFatigued;

impl SelectionPolicy for LeastFatigued {
    fn compare(&self, a: &Worker, b: &Worker) -> Ordering {
        a.fatigue()
            .total_cmp(&b.fatigue())
            .then_with(|| a.id().cmp(&b.id()))
    }
}

/// Idle workers are scanned with the policy on every acquire. Fatigue keys
/// change while a worker is out of the set, so a heap would go stale.
#[derive(Debug, Default)]
struct IdleState {
    workers: Vec<Arc<Worker>>,
    closed: bool,
}

/// Set of idle workers. `acquire` blocks while the set is empty.
#[derive(Debug)]
pub struct IdleSelector {
    policy: Box<dyn SelectionPolicy>,
    state: Mutex<IdleState>,
    available: Condvar,
}

impl IdleSelector {
    pub fn new(policy: Box<dyn SelectionPolicy>) -> Self {
        Self {
            policy,
            state: Mutex::new(IdleState::default()),
            available: Condvar::new(),
        }
    }

    /// Return a worker to the idle set and wake one waiting submitter
    pub fn release(&self, worker: Arc<Worker>) {
        self.state.lock().workers.push(worker);
        self.available.notify_one();
    }

    /// Remove the preferred idle worker, blocking until one is available.
    ///
    /// Fails with `Interrupted` once the selector is closed, including for
    /// callers already blocked here.
    pub fn acquire(&self) -> EngineResult<Arc<Worker>> {
        let mut state = self.state.lock();
        loop {
            if state.closed {
                return Err(EngineError::interrupted("scheduler is shut down"));
            }
            if let Some(index) = self.preferred(&state.workers) {
                return Ok(state.workers.swap_remove(index));
            }
            self.available.wait(&mut state);
        }
    }

    /// Refuse further acquisitions and wake every blocked caller
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.available.notify_all();
    }

    pub fn idle_count(&self) -> usize {
        self.state.lock().workers.len()
    }

    fn preferred(&self, workers: &[Arc<Worker>]) -> Option<usize> {
        workers
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| self.policy.compare(a, b))
            .map(|(index, _)| index)
    }
}
