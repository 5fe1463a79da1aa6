//! Scroll-and-discover: find elements on pages that render as you scroll.
//!
//! End of page is detected by the scroll offset not moving. That is a
//! heuristic: sticky or virtualized layouts can stop the offset early, and a
//! page that keeps growing never stalls, which is why the loop is also bounded
//! by `max_scrolls`.

use crate::wait::WaitStrategy;
use jobscout_common::ActionResult;
use jobscout_drivers::{BrowserSession, ElementSummary};
use tracing::{debug, info};

pub const DEFAULT_SCROLL_AMOUNT: i64 = 300;
pub const DEFAULT_MAX_SCROLLS: u32 = 10;

/// How many matches are echoed back to the agent.
const MAX_LISTED: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollOutcome {
    Moved { from: f64, to: f64 },
    /// Offset did not change; treated as the bottom of the page.
    AtEnd { offset: f64 },
}

impl ScrollOutcome {
    pub fn into_result(self) -> ActionResult {
        match self {
            ScrollOutcome::Moved { .. } => ActionResult::content("Scrolled successfully"),
            ScrollOutcome::AtEnd { .. } => ActionResult::error("Reached end of page"),
        }
    }
}

/// Scroll down by `amount` pixels and report whether the page moved.
pub async fn scroll_page(
    session: &dyn BrowserSession,
    amount: i64,
) -> anyhow::Result<ScrollOutcome> {
    let from = session.scroll_offset().await?;
    session.scroll_by(amount).await?;
    let to = session.scroll_offset().await?;

    let outcome = if to == from {
        ScrollOutcome::AtEnd { offset: to }
    } else {
        ScrollOutcome::Moved { from, to }
    };
    debug!(target: "jobscout.discover", amount, from, to, ?outcome, "scrolled");
    Ok(outcome)
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiscoverySettings {
    pub max_scrolls: u32,
    pub scroll_amount: i64,
    pub wait: WaitStrategy,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            max_scrolls: DEFAULT_MAX_SCROLLS,
            scroll_amount: DEFAULT_SCROLL_AMOUNT,
            wait: WaitStrategy::default(),
        }
    }
}

impl From<&jobscout_config::ScrollConfig> for DiscoverySettings {
    fn from(cfg: &jobscout_config::ScrollConfig) -> Self {
        Self {
            max_scrolls: cfg.max_scrolls,
            scroll_amount: cfg.amount,
            wait: WaitStrategy::from(&cfg.wait),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StopReason {
    /// Every allowed attempt ran without a match.
    Exhausted,
    /// The page stopped scrolling.
    EndOfPage,
    ScrollFailed(String),
    QueryFailed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Discovery {
    Found {
        elements: Vec<ElementSummary>,
        /// Scrolls performed before the match showed up.
        scrolls: u32,
    },
    NotFound { scrolls: u32, reason: StopReason },
}

impl Discovery {
    pub fn into_result(self, selector: &str) -> ActionResult {
        match self {
            Discovery::Found { elements, .. } => {
                let mut text = format!("Found {} elements", elements.len());
                for el in elements.iter().take(MAX_LISTED) {
                    text.push_str(&format!("\n<{}> {}", el.tag, el.text));
                }
                ActionResult::content(text)
            }
            Discovery::NotFound {
                reason: StopReason::QueryFailed(cause),
                ..
            } => ActionResult::error(format!("Element query for '{selector}' failed: {cause}")),
            Discovery::NotFound {
                reason: StopReason::ScrollFailed(cause),
                ..
            } => ActionResult::error(format!(
                "No elements found after scrolling (scroll failed: {cause})"
            )),
            Discovery::NotFound { .. } => ActionResult::error("No elements found after scrolling"),
        }
    }
}

/// Look for `selector`; scroll and retry while nothing matches.
///
/// Performs at most `max_scrolls` scrolls and stops early when the page no
/// longer moves. Never errors: failures are part of the [`Discovery`].
pub async fn find_elements_with_scroll(
    session: &dyn BrowserSession,
    selector: &str,
    settings: &DiscoverySettings,
) -> Discovery {
    let mut scrolls = 0;
    let mut reason = StopReason::Exhausted;

    for attempt in 1..=settings.max_scrolls {
        match session.find_elements(selector).await {
            Ok(elements) if !elements.is_empty() => {
                info!(target: "jobscout.discover", %selector, count = elements.len(), scrolls, "found elements");
                return Discovery::Found { elements, scrolls };
            }
            Ok(_) => {}
            Err(e) => {
                reason = StopReason::QueryFailed(format!("{e:#}"));
                break;
            }
        }

        match scroll_page(session, settings.scroll_amount).await {
            Ok(ScrollOutcome::Moved { .. }) => scrolls += 1,
            Ok(ScrollOutcome::AtEnd { .. }) => {
                scrolls += 1;
                reason = StopReason::EndOfPage;
                break;
            }
            Err(e) => {
                reason = StopReason::ScrollFailed(format!("{e:#}"));
                break;
            }
        }

        settings.wait.wait(session, attempt).await;
    }

    info!(target: "jobscout.discover", %selector, scrolls, ?reason, "no elements found");
    Discovery::NotFound { scrolls, reason }
}
