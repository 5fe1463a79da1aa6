//! Action registry the agent driver dispatches into.
//!
//! Actions are typed ([`Action::Params`]) and registered once; the driver only
//! ever sees names, descriptions and JSON schemas. Whatever goes wrong inside
//! [`Controller::execute`] comes back as an error [`ActionResult`], never as a
//! Rust error or a panic.

use async_trait::async_trait;
use jobscout_common::{ActionResult, JobscoutError};
use jobscout_drivers::BrowserSession;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What an action gets from the caller besides its parameters.
#[derive(Clone, Default)]
pub struct ActionContext {
    browser: Option<Arc<dyn BrowserSession>>,
}

impl ActionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_browser(browser: Arc<dyn BrowserSession>) -> Self {
        Self {
            browser: Some(browser),
        }
    }

    pub fn browser(&self) -> Option<&dyn BrowserSession> {
        self.browser.as_deref()
    }
}

impl std::fmt::Debug for ActionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionContext")
            .field("browser", &self.browser.is_some())
            .finish()
    }
}

/// Parameters of actions that take none.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct NoParams {}

#[async_trait]
pub trait Action: Send + Sync + 'static {
    type Params: DeserializeOwned + JsonSchema + Send;

    const NAME: &'static str;
    /// Shown to the model verbatim.
    const DESCRIPTION: &'static str;
    const REQUIRES_BROWSER: bool = false;

    async fn run(&self, params: Self::Params, ctx: &ActionContext) -> ActionResult;
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionSpec {
    pub name: String,
    pub description: String,
    /// JSON schema of the parameter object.
    pub parameters: Value,
    pub requires_browser: bool,
}

#[async_trait]
trait DynAction: Send + Sync {
    fn spec(&self) -> ActionSpec;
    async fn call(&self, params: Value, ctx: &ActionContext) -> ActionResult;
}

#[async_trait]
impl<A: Action> DynAction for A {
    fn spec(&self) -> ActionSpec {
        let schema = schemars::schema_for!(A::Params);
        ActionSpec {
            name: A::NAME.to_string(),
            description: A::DESCRIPTION.to_string(),
            parameters: serde_json::to_value(schema).unwrap_or(Value::Null),
            requires_browser: A::REQUIRES_BROWSER,
        }
    }

    async fn call(&self, params: Value, ctx: &ActionContext) -> ActionResult {
        if A::REQUIRES_BROWSER && ctx.browser().is_none() {
            return ActionResult::error(format!("Action {} requires a browser session", A::NAME));
        }
        let params = if params.is_null() {
            Value::Object(Default::default())
        } else {
            params
        };
        match serde_json::from_value::<A::Params>(params) {
            Ok(p) => self.run(p, ctx).await,
            Err(e) => ActionResult::error(format!("Invalid parameters for {}: {e}", A::NAME)),
        }
    }
}

#[derive(Default)]
pub struct Controller {
    actions: Vec<Box<dyn DynAction>>,
    by_name: HashMap<&'static str, usize>,
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an action. A second action with the same name replaces the first.
    pub fn register<A: Action>(&mut self, action: A) -> &mut Self {
        match self.by_name.get(A::NAME) {
            Some(&slot) => {
                warn!(target: "jobscout.controller", action = A::NAME, "replacing registered action");
                self.actions[slot] = Box::new(action);
            }
            None => {
                self.by_name.insert(A::NAME, self.actions.len());
                self.actions.push(Box::new(action));
            }
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<ActionSpec> {
        self.by_name.get(name).map(|&i| self.actions[i].spec())
    }

    /// Every registered action in registration order.
    pub fn catalog(&self) -> Vec<ActionSpec> {
        self.actions.iter().map(|a| a.spec()).collect()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub async fn execute(&self, name: &str, params: Value, ctx: &ActionContext) -> ActionResult {
        let Some(&slot) = self.by_name.get(name) else {
            warn!(target: "jobscout.controller", action = %name, "unknown action");
            return ActionResult::error(JobscoutError::UnknownAction(name.to_string()).to_string());
        };

        debug!(target: "jobscout.controller", action = %name, %params, "executing");
        let result = self.actions[slot].call(params, ctx).await;
        match &result.error {
            Some(err) => info!(target: "jobscout.controller", action = %name, error = %err, "action failed"),
            None => info!(target: "jobscout.controller", action = %name, done = result.is_done, "action succeeded"),
        }
        result
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.by_name.keys().collect();
        names.sort();
        f.debug_struct("Controller").field("actions", &names).finish()
    }
}
