pub mod errors;
pub mod stats;
pub mod todo;

pub use errors::*;
pub use stats::*;
pub use todo::*;
