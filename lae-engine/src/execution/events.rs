// Execution Events
// Progress reporting for tree resolution runs

use crate::tree::OperatorKind;

use crossbeam_channel::{Receiver, Sender};
use std::time::Duration;

/// Sender for engine progress events
pub type ProgressSender = Sender<EngineEvent>;

/// Receiver for engine progress events
pub type ProgressReceiver = Receiver<EngineEvent>;

/// Create a new progress channel
pub fn progress_channel() -> (ProgressSender, ProgressReceiver) {
    crossbeam_channel::unbounded()
}

/// Events emitted while an engine resolves a tree
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Run started
    RunStarted {
        /// Operator nodes in the tree before flattening
        operators: usize,
    },

    /// A resolution step was submitted to the scheduler
    StepStarted {
        step: usize,
        kind: OperatorKind,
        tasks: usize,
    },

    /// A resolution step finished and its node became a leaf
    StepCompleted {
        step: usize,
        kind: OperatorKind,
        rows: usize,
        columns: usize,
        duration: Duration,
    },

    /// Run finished, successfully or not
    RunCompleted {
        success: bool,
        steps: usize,
        duration: Duration,
    },
}

impl EngineEvent {
    pub fn run_started(operators: usize) -> Self {
        Self::RunStarted { operators }
    }

    pub fn step_started(step: usize, kind: OperatorKind, tasks: usize) -> Self {
        Self::StepStarted { step, kind, tasks }
    }

    pub fn step_completed(
        step: usize,
        kind: OperatorKind,
        (rows, columns): (usize, usize),
        duration: Duration,
    ) -> Self {
        Self::StepCompleted {
            step,
            kind,
            rows,
            columns,
            duration,
        }
    }

    pub fn run_completed(success: bool, steps: usize, duration: Duration) -> Self {
        Self::RunCompleted {
            success,
            steps,
            duration,
        }
    }
}

/// Helper trait for sending events, ignoring errors (fire-and-forget)
pub trait EventSender {
    fn send_event(&self, event: EngineEvent);
}

impl EventSender for ProgressSender {
    fn send_event(&self, event: EngineEvent) {
        let _ = self.send(event);
    }
}

impl EventSender for Option<ProgressSender> {
    fn send_event(&self, event: EngineEvent) {
        if let Some(sender) = self {
            let _ = sender.send(event);
        }
    }
}
