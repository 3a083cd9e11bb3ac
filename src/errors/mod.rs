pub mod types;

pub use types::{AppError, ProbeFailure, SourceError};
