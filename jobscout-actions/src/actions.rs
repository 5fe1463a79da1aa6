//! The actions the job agent can call.

use crate::controller::{Action, ActionContext, Controller, NoParams};
use crate::discover::{self, DiscoverySettings};
use crate::job_store::{AppendOutcome, JobRecord, JobStore, StoreError};
use crate::resume;
use crate::upload;
use async_trait::async_trait;
use jobscout_common::ActionResult;
use jobscout_drivers::{BrowserSession, ElementRef};
use schemars::JsonSchema;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

fn no_browser(name: &str) -> ActionResult {
    ActionResult::error(format!("Action {name} requires a browser session"))
}

pub struct SaveJobs {
    pub store: Arc<JobStore>,
}

#[async_trait]
impl Action for SaveJobs {
    type Params = JobRecord;
    const NAME: &'static str = "save_jobs";
    const DESCRIPTION: &'static str =
        "Save jobs to file - with a score how well it fits to my profile";

    async fn run(&self, job: JobRecord, _ctx: &ActionContext) -> ActionResult {
        match self.store.append(&job).await {
            Ok(AppendOutcome::Written) => ActionResult::content("Saved job to file"),
            Ok(AppendOutcome::SkippedDuplicate) => {
                ActionResult::content(format!("Job already saved: {}", job.link))
            }
            Err(e) => ActionResult::error(format!("Failed to save job: {e}")),
        }
    }
}

pub struct ReadJobs {
    pub store: Arc<JobStore>,
}

#[async_trait]
impl Action for ReadJobs {
    type Params = NoParams;
    const NAME: &'static str = "read_jobs";
    const DESCRIPTION: &'static str = "Read jobs from file";

    async fn run(&self, _params: NoParams, _ctx: &ActionContext) -> ActionResult {
        match self.store.read_all().await {
            Ok(text) => ActionResult::content(text),
            Err(e @ StoreError::NotFound(_)) => ActionResult::error(e.to_string()),
            Err(e) => ActionResult::error(format!("Failed to read jobs: {e}")),
        }
    }
}

pub struct ReadCv {
    pub path: PathBuf,
}

#[async_trait]
impl Action for ReadCv {
    type Params = NoParams;
    const NAME: &'static str = "read_cv";
    const DESCRIPTION: &'static str = "Read my cv for context to fill forms";

    async fn run(&self, _params: NoParams, _ctx: &ActionContext) -> ActionResult {
        match resume::read_document_async(self.path.clone()).await {
            Ok(doc) => ActionResult::content(doc.text).remember(),
            Err(e) => ActionResult::error(format!("Failed to read cv: {e:#}")),
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct IndexParams {
    /// Index of the element as shown by `list_elements`.
    pub index: usize,
}

pub struct UploadCv {
    pub path: PathBuf,
}

#[async_trait]
impl Action for UploadCv {
    type Params = IndexParams;
    const NAME: &'static str = "upload_cv";
    const DESCRIPTION: &'static str = "Upload cv to element - call this function to upload if element is not found, try with different index of the same upload element";
    const REQUIRES_BROWSER: bool = true;

    async fn run(&self, params: IndexParams, ctx: &ActionContext) -> ActionResult {
        let Some(browser) = ctx.browser() else {
            return no_browser(Self::NAME);
        };
        upload::upload_file(browser, params.index, &self.path)
            .await
            .into_result(params.index, &self.path)
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ScrollParams {
    /// Pixels to scroll down.
    #[serde(default)]
    pub scroll_amount: Option<i64>,
}

pub struct ScrollPage {
    pub default_amount: i64,
}

impl Default for ScrollPage {
    fn default() -> Self {
        Self {
            default_amount: discover::DEFAULT_SCROLL_AMOUNT,
        }
    }
}

#[async_trait]
impl Action for ScrollPage {
    type Params = ScrollParams;
    const NAME: &'static str = "scroll_page";
    const DESCRIPTION: &'static str = "Scroll page to find elements";
    const REQUIRES_BROWSER: bool = true;

    async fn run(&self, params: ScrollParams, ctx: &ActionContext) -> ActionResult {
        let Some(browser) = ctx.browser() else {
            return no_browser(Self::NAME);
        };
        let amount = params.scroll_amount.unwrap_or(self.default_amount);
        match discover::scroll_page(browser, amount).await {
            Ok(outcome) => outcome.into_result(),
            Err(e) => ActionResult::error(format!("Error scrolling page: {e:#}")),
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct FindParams {
    /// CSS selector to look for.
    pub selector: String,
    #[serde(default)]
    pub max_scrolls: Option<u32>,
}

#[derive(Default)]
pub struct FindElementsWithScroll {
    pub settings: DiscoverySettings,
}

#[async_trait]
impl Action for FindElementsWithScroll {
    type Params = FindParams;
    const NAME: &'static str = "find_elements_with_scroll";
    const DESCRIPTION: &'static str = "Find elements with scrolling";
    const REQUIRES_BROWSER: bool = true;

    async fn run(&self, params: FindParams, ctx: &ActionContext) -> ActionResult {
        let Some(browser) = ctx.browser() else {
            return no_browser(Self::NAME);
        };
        let mut settings = self.settings.clone();
        if let Some(max) = params.max_scrolls {
            settings.max_scrolls = max;
        }
        discover::find_elements_with_scroll(browser, &params.selector, &settings)
            .await
            .into_result(&params.selector)
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UrlParams {
    pub url: String,
}

pub struct GoToUrl;

#[async_trait]
impl Action for GoToUrl {
    type Params = UrlParams;
    const NAME: &'static str = "go_to_url";
    const DESCRIPTION: &'static str = "Navigate the current tab to a URL";
    const REQUIRES_BROWSER: bool = true;

    async fn run(&self, params: UrlParams, ctx: &ActionContext) -> ActionResult {
        let Some(browser) = ctx.browser() else {
            return no_browser(Self::NAME);
        };
        match browser.navigate(&params.url).await {
            Ok(()) => ActionResult::content(format!("Navigated to {}", params.url)),
            Err(e) => ActionResult::error(format!("Failed to navigate to {}: {e:#}", params.url)),
        }
    }
}

pub struct ListElements;

#[async_trait]
impl Action for ListElements {
    type Params = NoParams;
    const NAME: &'static str = "list_elements";
    const DESCRIPTION: &'static str =
        "List the interactive elements of the current page with their indexes";
    const REQUIRES_BROWSER: bool = true;

    async fn run(&self, _params: NoParams, ctx: &ActionContext) -> ActionResult {
        let Some(browser) = ctx.browser() else {
            return no_browser(Self::NAME);
        };
        let url = browser.current_url().await.unwrap_or_default();
        match browser.interactive_elements().await {
            Ok(nodes) if nodes.is_empty() => {
                ActionResult::content(format!("{url}\n(no interactive elements)"))
            }
            Ok(nodes) => {
                let lines: Vec<String> = nodes.iter().map(|n| n.describe()).collect();
                ActionResult::content(format!("{url}\n{}", lines.join("\n")))
            }
            Err(e) => ActionResult::error(format!("Failed to list elements: {e:#}")),
        }
    }
}

/// Index → live element, or the error result to return.
async fn live_element(
    browser: &dyn BrowserSession,
    index: usize,
) -> Result<ElementRef, ActionResult> {
    let node = match browser.dom_element_by_index(index).await {
        Ok(Some(node)) => node,
        Ok(None) => return Err(ActionResult::error(format!("No element found at index {index}"))),
        Err(e) => {
            return Err(ActionResult::error(format!(
                "Failed to look up element {index}: {e:#}"
            )))
        }
    };
    match browser.locate_element(&node).await {
        Ok(Some(el)) => Ok(el),
        Ok(None) => Err(ActionResult::error(format!(
            "Element at index {index} is no longer on the page"
        ))),
        Err(e) => Err(ActionResult::error(format!(
            "Failed to locate element {index}: {e:#}"
        ))),
    }
}

pub struct ClickElement;

#[async_trait]
impl Action for ClickElement {
    type Params = IndexParams;
    const NAME: &'static str = "click_element";
    const DESCRIPTION: &'static str = "Click the element with the given index";
    const REQUIRES_BROWSER: bool = true;

    async fn run(&self, params: IndexParams, ctx: &ActionContext) -> ActionResult {
        let Some(browser) = ctx.browser() else {
            return no_browser(Self::NAME);
        };
        let el = match live_element(browser, params.index).await {
            Ok(el) => el,
            Err(result) => return result,
        };
        match browser.click(&el).await {
            Ok(()) => ActionResult::content(format!("Clicked element {}", params.index)),
            Err(e) => ActionResult::error(format!("Failed to click element {}: {e:#}", params.index)),
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct InputParams {
    pub index: usize,
    pub text: String,
}

pub struct InputText;

#[async_trait]
impl Action for InputText {
    type Params = InputParams;
    const NAME: &'static str = "input_text";
    const DESCRIPTION: &'static str = "Type text into the input element with the given index";
    const REQUIRES_BROWSER: bool = true;

    async fn run(&self, params: InputParams, ctx: &ActionContext) -> ActionResult {
        let Some(browser) = ctx.browser() else {
            return no_browser(Self::NAME);
        };
        let el = match live_element(browser, params.index).await {
            Ok(el) => el,
            Err(result) => return result,
        };
        match browser.type_text(&el, &params.text).await {
            Ok(()) => ActionResult::content(format!("Typed into element {}", params.index)),
            Err(e) => ActionResult::error(format!(
                "Failed to type into element {}: {e:#}",
                params.index
            )),
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DoneParams {
    /// Final report for the user.
    pub text: String,
}

pub struct Done;

#[async_trait]
impl Action for Done {
    type Params = DoneParams;
    const NAME: &'static str = "done";
    const DESCRIPTION: &'static str = "Finish the task and report the result";

    async fn run(&self, params: DoneParams, _ctx: &ActionContext) -> ActionResult {
        info!(target: "jobscout.agent", "task reported done");
        ActionResult::done(params.text)
    }
}

/// Everything the job actions need from the outside.
#[derive(Debug, Clone)]
pub struct JobActionDeps {
    pub store: Arc<JobStore>,
    /// Résumé document, read by `read_cv` and attached by `upload_cv`.
    pub resume_path: PathBuf,
    pub discovery: DiscoverySettings,
}

impl Controller {
    /// The browser defaults plus the six job actions.
    pub fn with_job_actions(deps: JobActionDeps) -> Self {
        let mut c = Self::new();
        c.register(GoToUrl)
            .register(ListElements)
            .register(ClickElement)
            .register(InputText)
            .register(Done)
            .register(SaveJobs {
                store: deps.store.clone(),
            })
            .register(ReadJobs { store: deps.store })
            .register(ReadCv {
                path: deps.resume_path.clone(),
            })
            .register(UploadCv {
                path: deps.resume_path,
            })
            .register(ScrollPage {
                default_amount: deps.discovery.scroll_amount,
            })
            .register(FindElementsWithScroll {
                settings: deps.discovery,
            });
        c
    }
}
