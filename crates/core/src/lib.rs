// crates/core/src/lib.rs
pub mod error;
pub mod execution;
pub mod job;
pub mod params;

pub use error::*;
pub use execution::*;
pub use job::*;
pub use params::*;
