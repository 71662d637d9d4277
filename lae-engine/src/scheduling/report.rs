// Worker Report
// Per-worker busy/idle/fatigue statistics for diagnostics

use crate::scheduling::worker::{Worker, WorkerState};

use std::fmt;
use std::time::Duration;

/// Statistics snapshot of one worker
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerReport {
    pub id: usize,
    pub factor: f64,
    pub busy: Duration,
    pub idle: Duration,
    pub fatigue: f64,
    pub tasks_completed: u64,
    pub state: WorkerState,
}

impl WorkerReport {
    pub fn capture(worker: &Worker) -> Self {
        Self {
            id: worker.id(),
            factor: worker.factor(),
            busy: worker.busy_time(),
            idle: worker.idle_time(),
            fatigue: worker.fatigue(),
            tasks_completed: worker.tasks_completed(),
            state: worker.state(),
        }
    }
}

/// Statistics snapshot of a whole scheduler. Observability only.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerReport {
    pub workers: Vec<WorkerReport>,
    /// Population variance of the workers' fatigue scores
    pub fatigue_variance: f64,
}

impl SchedulerReport {
    pub fn new(workers: Vec<WorkerReport>) -> Self {
        let fatigue_variance = variance(workers.iter().map(|w| w.fatigue));
        Self {
            workers,
            fatigue_variance,
        }
    }

    pub fn total_tasks(&self) -> u64 {
        self.workers.iter().map(|w| w.tasks_completed).sum()
    }
}

impl fmt::Display for SchedulerReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for worker in &self.workers {
            writeln!(
                f,
                "Worker {}: Time Used = {} ns, Time Idle = {} ns, Fatigue = {:.2}, Factor = {:.2}, Tasks = {}",
                worker.id,
                worker.busy.as_nanos(),
                worker.idle.as_nanos(),
                worker.fatigue,
                worker.factor,
                worker.tasks_completed
            )?;
        }
        write!(f, "Fatigue variance = {:.2}", self.fatigue_variance)
    }
}

fn variance(values: impl Iterator<Item = f64> + Clone) -> f64 {
    let count = values.clone().count();
    if count == 0 {
        return 0.0;
    }
    let mean = values.clone().sum::<f64>() / count as f64;
    values.map(|v| (v - mean) * (v - mean)).sum::<f64>() / count as f64
}
