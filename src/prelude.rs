//! Convenience re-exports for common usage.
//!
//! # Usage
//!
//! ```
//! use enjambre::prelude::*;
//! ```

pub use crate::bounds::SearchBounds;
pub use crate::budget::EvalBudget;
pub use crate::error::{EnjambreError, Result};
pub use crate::niche_pso::{NichePso, NichePsoConfig};
pub use crate::nmmso::{Nmmso, NmmsoConfig};
pub use crate::oracle::{EvalContext, FitnessOracle};
pub use crate::traits::{Mode, MultimodalOptimizer, MultimodalResult, OptimizerKind, StepOutcome};
