//! Port traits. API boundaries for the hexagon.
//!
//! - Inbound: prompts the use cases ask the UI to answer
//! - Outbound: the account engine, called from background tasks
//! - App state: quit / connectivity flags polled by the runner

pub mod app_state;
pub mod inbound;
pub mod outbound;

pub use app_state::AppStatePort;
pub use inbound::{INPUT_RETRIES, InputPort};
pub use outbound::{NetworkObserver, ProgressSink, ReleasePort, SessionPort, TransferPort};
