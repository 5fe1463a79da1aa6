use crate::browser::{
    behavioral::BehavioralEngine,
    dom::{
        element_by_index_script, list_interactive_script, DomNode, ElementRef, ElementSummary,
        FIND_ELEMENTS_SCRIPT,
    },
    session::BrowserSession,
};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use fantoccini::{elements::Element, Client, Locator};
use serde_json::{json, Value};
use std::path::Path;
use tracing::debug;

/// [`BrowserSession`] backed by a `fantoccini` WebDriver client.
///
/// `Client` is a cheap handle onto one WebDriver session; clones share the
/// same tab and commands are applied in the order they reach the driver.
#[derive(Clone)]
pub struct FantocciniSession {
    pub(crate) client: Client,
    pub(crate) behavioral_engine: BehavioralEngine,
}

impl FantocciniSession {
    pub fn new(client: Client, behavioral_engine: BehavioralEngine) -> Self {
        Self {
            client,
            behavioral_engine,
        }
    }

    /// Close the underlying browser session.
    pub async fn close(self) -> Result<()> {
        self.client.close().await?;
        Ok(())
    }

    async fn live(&self, element: &ElementRef) -> Result<Element> {
        self.client
            .find(Locator::XPath(&element.xpath))
            .await
            .with_context(|| format!("element {} is no longer attached", element.xpath))
    }
}

#[async_trait]
impl BrowserSession for FantocciniSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.behavioral_engine.before_navigation().await;
        self.client.goto(url).await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.client.current_url().await?.to_string())
    }

    async fn evaluate(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        Ok(self.client.execute(script, args).await?)
    }

    async fn find_elements(&self, selector: &str) -> Result<Vec<ElementSummary>> {
        let raw = self
            .evaluate(FIND_ELEMENTS_SCRIPT, vec![json!(selector)])
            .await?;
        serde_json::from_value(raw).context("unexpected selector query result")
    }

    async fn interactive_elements(&self) -> Result<Vec<DomNode>> {
        let raw = self.evaluate(&list_interactive_script(), vec![]).await?;
        serde_json::from_value(raw).context("unexpected element list")
    }

    async fn dom_element_by_index(&self, index: usize) -> Result<Option<DomNode>> {
        let raw = self
            .evaluate(&element_by_index_script(), vec![json!(index)])
            .await?;
        serde_json::from_value(raw).context("unexpected element snapshot")
    }

    async fn locate_element(&self, node: &DomNode) -> Result<Option<ElementRef>> {
        let found = self.client.find_all(Locator::XPath(&node.xpath)).await?;
        debug!(target: "browser.locate", xpath = %node.xpath, matches = found.len());
        Ok(found.first().map(|_| ElementRef {
            xpath: node.xpath.clone(),
        }))
    }

    async fn set_input_files(&self, element: &ElementRef, path: &Path) -> Result<()> {
        let path = path
            .to_str()
            .ok_or_else(|| anyhow!("upload path is not valid UTF-8: {}", path.display()))?;
        // WebDriver attaches files to <input type=file> through SendKeys.
        self.live(element).await?.send_keys(path).await?;
        Ok(())
    }

    async fn click(&self, element: &ElementRef) -> Result<()> {
        self.behavioral_engine.before_click().await;
        self.live(element).await?.click().await?;
        Ok(())
    }

    async fn type_text(&self, element: &ElementRef, text: &str) -> Result<()> {
        let el = self.live(element).await?;
        self.behavioral_engine.type_into(&el, text).await
    }
}
