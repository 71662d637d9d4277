// Scheduling Module
// Worker threads, fatigue-ordered idle selection, the fork-join scheduler and its report

pub mod report;
pub mod scheduler;
pub mod selection;
pub mod worker;

// Re-export key types
pub use report::{SchedulerReport, WorkerReport};
pub use scheduler::Scheduler;
pub use selection::{IdleSelector, LeastFatigued, SelectionPolicy};
pub use worker::{Assignment, Worker, WorkerState};
