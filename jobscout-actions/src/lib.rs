//! Job-search actions for a browser-driving agent.
//!
//! - [`job_store`]: append-only CSV of discovered postings
//! - [`resume`]: résumé PDF to plain text
//! - [`upload`]: attach a file to the upload control behind an element index
//! - [`discover`]: scroll until a selector matches, bounded
//! - [`wait`]: what happens between scrolls
//! - [`controller`]: the registry the agent dispatches into
//! - [`actions`]: the registered actions themselves
//!
//! Browser access comes from an injected [`jobscout_drivers::BrowserSession`];
//! nothing here holds global state.

pub mod actions;
pub mod controller;
pub mod discover;
pub mod job_store;
pub mod resume;
pub mod upload;
pub mod wait;

pub use actions::JobActionDeps;
pub use controller::{Action, ActionContext, ActionSpec, Controller, NoParams};
pub use job_store::{JobRecord, JobStore};
