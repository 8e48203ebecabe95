pub mod context;
pub mod propagation;

pub use context::Context;
pub use propagation::*;
