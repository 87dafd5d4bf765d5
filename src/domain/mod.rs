//! Core domain layer. No external I/O dependencies.
//!
//! Error taxonomy and the small value types passed across ports.

pub mod entities;
pub mod errors;

pub use entities::{LoginCredentials, LoginState, Operation, Percent, UnknownOperation};
pub use errors::{EngineStatus, TaskError};
