// Execution Module
// Engine configuration, row tasks, progress events and the tree-resolving orchestrator

pub mod config;
pub mod engine;
pub mod events;
pub mod tasks;

// Re-export key types
pub use config::{EngineConfig, FatiguePolicy};
pub use engine::LinearAlgebraEngine;
pub use events::{progress_channel, EngineEvent, EventSender, ProgressReceiver, ProgressSender};
pub use tasks::{RowTask, TaskBatch, TransposeBuffer};
