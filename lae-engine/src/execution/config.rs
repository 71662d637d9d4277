// Engine Configuration
// Worker pool size and the deterministic fatigue-factor policy

use crate::error::{EngineError, EngineResult};

/// How fatigue factors are assigned to workers
#[derive(Debug, Clone, PartialEq)]
pub enum FatiguePolicy {
    /// Every worker gets the same factor
    Uniform(f64),
    /// One factor per worker, in worker id order
    Explicit(Vec<f64>),
    /// Factors evenly spaced from `min` (worker 0) to `max` (last worker)
    Linear { min: f64, max: f64 },
}

impl Default for FatiguePolicy {
    fn default() -> Self {
        FatiguePolicy::Uniform(1.0)
    }
}

impl FatiguePolicy {
    /// Factors for a pool of `thread_count` workers
    pub fn factors(&self, thread_count: usize) -> EngineResult<Vec<f64>> {
        let factors = match self {
            FatiguePolicy::Uniform(factor) => vec![*factor; thread_count],
            FatiguePolicy::Explicit(factors) => {
                if factors.len() != thread_count {
                    return Err(EngineError::validation(format!(
                        "expected {} fatigue factors, got {}",
                        thread_count,
                        factors.len()
                    )));
                }
                factors.clone()
            }
            FatiguePolicy::Linear { min, max } => {
                if thread_count <= 1 {
                    vec![*min; thread_count]
                } else {
                    let step = (max - min) / (thread_count - 1) as f64;
                    (0..thread_count).map(|i| min + step * i as f64).collect()
                }
            }
        };

        for (id, factor) in factors.iter().enumerate() {
            if !factor.is_finite() || *factor <= 0.0 {
                return Err(EngineError::validation(format!(
                    "fatigue factor of worker {} must be positive and finite, got {}",
                    id, factor
                )));
            }
        }
        Ok(factors)
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Number of worker threads
    pub thread_count: usize,
    /// Fatigue factor assignment
    pub fatigue: FatiguePolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            thread_count: 4,
            fatigue: FatiguePolicy::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_threads(mut self, thread_count: usize) -> Self {
        self.thread_count = thread_count;
        self
    }

    pub fn with_fatigue(mut self, fatigue: FatiguePolicy) -> Self {
        self.fatigue = fatigue;
        self
    }

    /// Validate and expand into one factor per worker
    pub fn worker_factors(&self) -> EngineResult<Vec<f64>> {
        if self.thread_count == 0 {
            return Err(EngineError::validation("thread count must be at least 1"));
        }
        self.fatigue.factors(self.thread_count)
    }
}
