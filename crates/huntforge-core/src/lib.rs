//! Orchestration core for huntforge.
//!
//! Turns a rectangle of map positions into a deduplicated hint atlas by
//! driving a pool of page sessions:
//!
//! - [`WorkQueue`]: pending positions, resume-filtered against a loaded atlas
//! - [`Dispatcher`] / [`Worker`]: hand items to idle sessions, retries first
//! - [`Collector`]: the single consumer of observed responses, and the only
//!   writer to the atlas
//! - [`Session`]: run lifecycle, interrupt handling, drain and save-on-exit
//!
//! Workers only perform UI actions and never touch shared state; everything
//! the run learns flows through the collector's response channel.

pub mod collector;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod ledger;
pub mod queue;
pub mod session;

pub use collector::Collector;
pub use config::{Backend, Config, HuntArgs};
pub use dispatch::{DispatchOutcome, Dispatcher, Worker, WorkerEvent};
pub use error::{ConfigError, HuntError};
pub use ledger::ProbeLedger;
pub use queue::{WorkItem, WorkQueue};
pub use session::{RunReport, Session, Shutdown};
