//! et-export: account backup / restore CLI with cancellable background tasks.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod shared;
pub mod usecases;
