// Linear Algebra Engine Library
// Concurrent resolution of matrix operation trees over per-row locked storage

pub mod error;
pub mod execution;
pub mod memory;
pub mod output;
pub mod parser;
pub mod scheduling;
pub mod tree;

// Re-export commonly used types
pub use error::{EngineError, EngineResult, ErrorKind};

// Re-export tree types
pub use tree::{Matrix, OperationNode, OperatorKind, Shape};

// Re-export execution types
pub use execution::{
    progress_channel, EngineConfig, EngineEvent, FatiguePolicy, LinearAlgebraEngine,
    ProgressReceiver, ProgressSender,
};

// Re-export scheduling types
pub use scheduling::{Scheduler, SchedulerReport, WorkerReport};

// Re-export parser and output types
pub use output::ResultDocument;
pub use parser::{InputFormat, ParseError, ParseErrorKind, TreeParser};
