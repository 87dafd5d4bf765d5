//! Infrastructure adapters. Implement the ports.
//!
//! Engine, terminal UI, process signals.

pub mod app_state;
pub mod engine;
pub mod ui;

pub use app_state::CliAppState;
