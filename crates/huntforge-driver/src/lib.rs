//! Page driver seam for huntforge.
//!
//! The orchestration core drives the hunt page exclusively through the
//! [`HuntBrowser`] / [`HuntPage`] traits defined here: locate the position
//! fields and direction buttons, type into fields, click and wait for the
//! network to settle, and observe every response the hint endpoint returns.
//!
//! A production binding (a CDP or WebDriver session) plugs in behind the same
//! traits. This crate ships the [`sim`] backend: a scripted in-memory page
//! used by the test suites and the CLI's rehearsal mode.

mod api;
pub mod sim;

pub use api::{
    pick_user_agent, ControlId, DriverError, HuntBrowser, HuntPage, LaunchOptions, PageControls,
    RawResponse, USER_AGENTS,
};
pub use sim::{ScriptedBatch, ScriptedOutcome, ScriptedPoi, SimBrowser, SimWorld};
