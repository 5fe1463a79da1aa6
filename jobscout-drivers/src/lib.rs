//! Driver layer for browser automation.
//!
//! Actions never talk to WebDriver directly; they go through the
//! [`browser::session::BrowserSession`] trait so tests can script a page.
//!
//! - [`browser::session::BrowserSession`]: the capability actions depend on
//! - [`browser::dom::DomNode`]: snapshot of an indexed interactive element
//! - [`browser::driver::JobscoutDriver`]: connects to a WebDriver service
//! - [`browser::page::FantocciniSession`]: `fantoccini`‑backed session
//! - [`browser::behavioral::BehavioralEngine`]: pauses between clicks and keystrokes
pub mod browser;

pub use browser::dom::{DomNode, ElementRef, ElementSummary};
pub use browser::driver::{JobscoutDriver, LaunchOptions};
pub use browser::page::FantocciniSession;
pub use browser::session::BrowserSession;
