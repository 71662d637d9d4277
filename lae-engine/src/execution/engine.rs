// Linear Algebra Engine
// Resolves an operation tree step by step through the scheduler and the shared scratch matrices

use crate::error::{EngineError, EngineResult};
use crate::execution::config::EngineConfig;
use crate::execution::events::{EngineEvent, EventSender, ProgressSender};
use crate::execution::tasks::TaskBatch;
use crate::memory::LockedMatrix;
use crate::scheduling::{Scheduler, SchedulerReport};
use crate::tree::{Matrix, OperationNode, OperatorKind};

use std::time::Instant;
use tracing::{debug, info, trace, warn};

/// Tree resolution engine backed by a fixed worker pool.
///
/// The pool is shut down at the end of [`run`](Self::run), so an engine
/// resolves one tree. [`report`](Self::report) stays available afterwards.
#[derive(Debug)]
pub struct LinearAlgebraEngine {
    config: EngineConfig,
    scheduler: Scheduler,
    event_tx: Option<ProgressSender>,
}

impl LinearAlgebraEngine {
    /// Engine with `thread_count` workers of equal fatigue factor
    pub fn new(thread_count: usize) -> EngineResult<Self> {
        Self::with_config(EngineConfig::default().with_threads(thread_count))
    }

    pub fn with_config(config: EngineConfig) -> EngineResult<Self> {
        let factors = config.worker_factors()?;
        let scheduler = Scheduler::with_factors(&factors)?;
        debug!(threads = factors.len(), ?factors, "engine created");

        Ok(Self {
            config,
            scheduler,
            event_tx: None,
        })
    }

    /// Send progress events to `tx`
    pub fn with_progress(mut self, tx: ProgressSender) -> Self {
        self.event_tx = Some(tx);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolve `root` until it is a single leaf and return it.
    ///
    /// A leaf is returned unchanged. The worker pool is shut down before
    /// this returns, whether or not resolution succeeded.
    pub fn run(&self, mut root: OperationNode) -> EngineResult<OperationNode> {
        let started = Instant::now();
        let operators = root.count_operators();
        info!(operators, "resolving operation tree");
        self.event_tx.send_event(EngineEvent::run_started(operators));

        let mut steps = 0;
        let resolved = self.resolve_tree(&mut root, &mut steps);
        let outcome = resolved.and(self.scheduler.shutdown());

        let duration = started.elapsed();
        self.event_tx
            .send_event(EngineEvent::run_completed(outcome.is_ok(), steps, duration));

        match outcome {
            Ok(()) => {
                info!(steps, ?duration, "operation tree resolved");
                Ok(root)
            }
            Err(err) => {
                warn!(steps, error = %err, "operation tree resolution failed");
                Err(err)
            }
        }
    }

    /// Per-worker statistics
    pub fn report(&self) -> SchedulerReport {
        self.scheduler.report()
    }

    /// Stop the worker pool without running anything
    pub fn shutdown(&self) -> EngineResult<()> {
        self.scheduler.shutdown()
    }

    fn resolve_tree(&self, root: &mut OperationNode, steps: &mut usize) -> EngineResult<()> {
        // Scratch buffers live for one run and are reused by every step
        let left = LockedMatrix::new();
        let right = LockedMatrix::new();

        while !root.is_leaf() {
            let node = root.find_resolvable().ok_or_else(|| {
                EngineError::tree("no operator has only matrix operands; the tree cannot make progress")
            })?;

            if node.associative_flatten() {
                trace!("nested an associative operator");
                continue;
            }
            node.check_arity()?;

            *steps += 1;
            self.compute_step(*steps, node, &left, &right)?;
        }
        Ok(())
    }

    fn compute_step(
        &self,
        step: usize,
        node: &mut OperationNode,
        left: &LockedMatrix,
        right: &LockedMatrix,
    ) -> EngineResult<()> {
        let kind = node
            .kind()
            .ok_or_else(|| EngineError::tree("a leaf has nothing to compute"))?;
        let started = Instant::now();

        let inner = load_operands(kind, node.children(), left, right)?;
        let TaskBatch {
            tasks,
            transpose_output,
            ..
        } = TaskBatch::build(kind, left, right, inner)?;

        debug!(step, %kind, tasks = tasks.len(), "submitting step");
        self.event_tx
            .send_event(EngineEvent::step_started(step, kind, tasks.len()));

        self.scheduler
            .submit_batch_and_wait(tasks.into_iter().map(|task| {
                move || {
                    trace!(row = task.index(), "row task");
                    task.run()
                }
            }))?;

        // Every task has finished, so nothing holds a lock on `left`
        if let Some(output) = transpose_output {
            left.load_row_major(&output.rows()?)?;
        }

        let result = Matrix::from_rows(left.read_row_major());
        let shape = (result.row_count(), result.column_count());
        node.resolve(result);

        let duration = started.elapsed();
        debug!(step, %kind, rows = shape.0, columns = shape.1, ?duration, "step resolved");
        self.event_tx
            .send_event(EngineEvent::step_completed(step, kind, shape, duration));
        Ok(())
    }
}

/// Load operand 0 row-major into `left` and operand 1, if any, into
/// `right` (column-major for multiply). Returns operand 1's row count.
///
/// Both operands are validated before either buffer is touched.
fn load_operands(
    kind: OperatorKind,
    operands: &[OperationNode],
    left: &LockedMatrix,
    right: &LockedMatrix,
) -> EngineResult<usize> {
    let matrices = operands
        .iter()
        .map(|operand| {
            operand
                .matrix()
                .ok_or_else(|| EngineError::tree(format!("{} operand is not a matrix", kind)))
        })
        .collect::<EngineResult<Vec<&Matrix>>>()?;

    for matrix in &matrices {
        matrix.shape()?;
    }

    let Some((first, rest)) = matrices.split_first() else {
        return Err(EngineError::tree(format!("{} has no operands", kind)));
    };
    left.load_row_major(first.rows())?;

    match rest.first() {
        None => Ok(0),
        Some(second) => {
            if kind == OperatorKind::Multiply {
                right.load_column_major(second.rows())?;
            } else {
                right.load_row_major(second.rows())?;
            }
            Ok(second.row_count())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::execution::events::progress_channel;

    fn leaf(rows: Vec<Vec<f64>>) -> OperationNode {
        OperationNode::leaf(rows)
    }

    fn resolved(tree: OperationNode) -> Vec<Vec<f64>> {
        let engine = LinearAlgebraEngine::new(2).unwrap();
        engine
            .run(tree)
            .unwrap()
            .into_matrix()
            .unwrap()
            .into_rows()
    }

    #[test]
    fn test_leaf_is_returned_unchanged() {
        let tree = leaf(vec![vec![1.0, 2.0]]);
        let engine = LinearAlgebraEngine::new(1).unwrap();
        assert_eq!(engine.run(tree.clone()).unwrap(), tree);
        assert_eq!(engine.report().total_tasks(), 0);
    }

    #[test]
    fn test_add() {
        let tree = OperationNode::add(vec![
            leaf(vec![vec![1.0, 2.0], vec![3.0, 4.0]]),
            leaf(vec![vec![5.0, 6.0], vec![7.0, 8.0]]),
        ]);
        assert_eq!(resolved(tree), vec![vec![6.0, 8.0], vec![10.0, 12.0]]);
    }

    #[test]
    fn test_transpose() {
        let tree = OperationNode::transpose(leaf(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]));
        assert_eq!(
            resolved(tree),
            vec![vec![1.0, 4.0], vec![2.0, 5.0], vec![3.0, 6.0]]
        );
    }

    #[test]
    fn test_stuck_tree_is_tree_resolution_error() {
        let engine = LinearAlgebraEngine::new(2).unwrap();
        let tree = OperationNode::add(vec![OperationNode::multiply(Vec::new()), leaf(vec![vec![1.0]])]);

        let err = engine.run(tree).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TreeResolution);
    }

    #[test]
    fn test_ragged_operand_is_validation_error() {
        let engine = LinearAlgebraEngine::new(2).unwrap();
        let tree = OperationNode::negate(leaf(vec![vec![1.0, 2.0], vec![3.0]]));

        let err = engine.run(tree).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_events_describe_each_step() {
        let (tx, rx) = progress_channel();
        let engine = LinearAlgebraEngine::new(2).unwrap().with_progress(tx);

        let tree = OperationNode::negate(OperationNode::transpose(leaf(vec![vec![1.0, 2.0]])));
        engine.run(tree).unwrap();
        drop(engine);

        let events: Vec<EngineEvent> = rx.iter().collect();
        assert_eq!(events.first(), Some(&EngineEvent::RunStarted { operators: 2 }));
        assert!(matches!(
            events[1],
            EngineEvent::StepStarted {
                step: 1,
                kind: OperatorKind::Transpose,
                tasks: 2
            }
        ));
        assert!(matches!(
            events[2],
            EngineEvent::StepCompleted {
                step: 1,
                rows: 2,
                columns: 1,
                ..
            }
        ));
        assert!(matches!(
            events.last(),
            Some(EngineEvent::RunCompleted {
                success: true,
                steps: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_second_run_is_interrupted() {
        let engine = LinearAlgebraEngine::new(1).unwrap();
        let tree = OperationNode::negate(leaf(vec![vec![1.0]]));
        engine.run(tree.clone()).unwrap();

        let err = engine.run(tree).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Interrupted);
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(LinearAlgebraEngine::new(0).unwrap_err().is_validation());
    }

    #[test]
    fn test_config_is_kept() {
        let engine =
            LinearAlgebraEngine::with_config(EngineConfig::default().with_threads(3)).unwrap();
        assert_eq!(engine.config().thread_count, 3);
        assert_eq!(engine.report().workers.len(), 3);
    }
}
