//! Cross-cutting helpers: configuration, paths and the two primitives shared
//! between a background task and the driving loop.

pub mod cancel_gate;
pub mod config;
pub mod paths;
pub mod progress_value;

pub use cancel_gate::CancelGate;
pub use progress_value::ProgressValue;
