//! Engine adapters. Implement SessionPort, TransferPort and ReleasePort.
//!
//! Only the simulated engine ships here; a native engine binds the same ports.

pub mod simulated;

pub use simulated::{MANIFEST_FILE, SimulatedAccount, SimulatedEngine, TransferPlan};
