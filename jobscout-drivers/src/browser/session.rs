use crate::browser::dom::{DomNode, ElementRef, ElementSummary};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::Path;

/// Browser capability the agent actions are written against.
///
/// Every method is one round-trip to the page and therefore a suspension
/// point. Implementations are shared between concurrently running agents
/// (`Arc<dyn BrowserSession>`); none of them lock.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Navigate the current tab.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Return the current page URL.
    async fn current_url(&self) -> Result<String>;

    /// Run a script in the page. Scripts must `return` their value.
    async fn evaluate(&self, script: &str, args: Vec<Value>) -> Result<Value>;

    /// Elements currently matching a CSS selector, in document order.
    async fn find_elements(&self, selector: &str) -> Result<Vec<ElementSummary>>;

    /// Shallow snapshots of every indexed interactive element.
    async fn interactive_elements(&self) -> Result<Vec<DomNode>>;

    /// Snapshot (with subtree) of the interactive element at `index`.
    async fn dom_element_by_index(&self, index: usize) -> Result<Option<DomNode>>;

    /// Resolve a snapshot back to a live element, if it is still attached.
    async fn locate_element(&self, node: &DomNode) -> Result<Option<ElementRef>>;

    /// Attach a local file to a file input.
    async fn set_input_files(&self, element: &ElementRef, path: &Path) -> Result<()>;

    async fn click(&self, element: &ElementRef) -> Result<()>;

    async fn type_text(&self, element: &ElementRef, text: &str) -> Result<()>;

    /// Vertical scroll offset in CSS pixels.
    async fn scroll_offset(&self) -> Result<f64> {
        let v = self
            .evaluate("return window.pageYOffset;", vec![])
            .await?;
        v.as_f64()
            .ok_or_else(|| anyhow!("pageYOffset was not a number: {v}"))
    }

    /// Ask the page to scroll down by `amount` pixels (negative scrolls up).
    async fn scroll_by(&self, amount: i64) -> Result<()> {
        self.evaluate("window.scrollBy(0, arguments[0]); return null;", vec![json!(amount)])
            .await?;
        Ok(())
    }

    /// `document.readyState` of the current page.
    async fn ready_state(&self) -> Result<String> {
        let v = self.evaluate("return document.readyState;", vec![]).await?;
        Ok(v.as_str().unwrap_or_default().to_string())
    }
}
