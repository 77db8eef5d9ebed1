//! QueryService: compiles and executes statements, rehydrates writes.

mod crud;
mod rehydrate;
pub use crud::{QueryService, WriteOutcome};
pub use rehydrate::rehydrate;
