//! Pipeline entry points for poller operations.
//!
//! - `run_login` / `run_acquire`: authenticate and pull the stream
//! - `Dispatcher`: route classified alerts to their side effects

pub mod acquire;
pub mod dispatch;

pub use acquire::{run_acquire, run_login};
pub use dispatch::{DispatchOutcome, Dispatcher};
