pub mod result_row;
pub mod query;
pub mod outcome;

// Re-exports for convenience
pub use result_row::*;
pub use query::*;
pub use outcome::*;
