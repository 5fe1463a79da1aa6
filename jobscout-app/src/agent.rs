//! Minimal step loop between the model and the action registry.

use anyhow::{Context, Result};
use async_trait::async_trait;
use jobscout_actions::{ActionContext, ActionSpec, Controller};
use jobscout_llm::traits::LlmClient;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::{Arc, LazyLock};
use tracing::{debug, info, warn};

/// History lines are cut to this many characters.
const MAX_HISTORY_ENTRY: usize = 2000;

static FENCED_JSON: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new("(?s)```(?:json)?\\s*(\\{.*?\\})\\s*```").ok());
static PLAIN_JSON: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new("(?s)(\\{.*\\})").ok());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCause {
    Done,
    MaxSteps,
    TooManyFailures,
}

#[derive(Debug, Clone)]
pub struct AgentRun {
    pub steps: u32,
    pub stop: StopCause,
    /// Text passed to `done`, if the agent got there.
    pub final_text: Option<String>,
    pub history: Vec<String>,
}

/// Something that can drive the controller to complete a task.
#[async_trait]
pub trait AgentDriver: Send + Sync {
    async fn run(&self, task: &str, controller: &Controller, ctx: &ActionContext)
        -> Result<AgentRun>;
}

/// The model's choice for one step.
#[derive(Debug, Deserialize, PartialEq)]
pub struct ActionCall {
    pub action: String,
    #[serde(default)]
    pub params: Value,
}

pub struct LlmAgent {
    llm: Arc<dyn LlmClient + Send + Sync>,
    max_steps: u32,
    max_failures: u32,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

impl LlmAgent {
    pub fn new(llm: Arc<dyn LlmClient + Send + Sync>) -> Self {
        Self {
            llm,
            max_steps: 100,
            max_failures: 3,
            max_tokens: Some(1024),
            temperature: Some(0.0),
        }
    }

    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_max_failures(mut self, max_failures: u32) -> Self {
        self.max_failures = max_failures.max(1);
        self
    }
}

#[async_trait]
impl AgentDriver for LlmAgent {
    async fn run(
        &self,
        task: &str,
        controller: &Controller,
        ctx: &ActionContext,
    ) -> Result<AgentRun> {
        let system = system_prompt(&controller.catalog())?;
        let mut history: Vec<String> = Vec::new();
        let mut memory: Vec<String> = Vec::new();
        let mut failures = 0;

        for step in 1..=self.max_steps {
            let prompt = step_prompt(task, &memory, &history);
            let reply = self
                .llm
                .generate(&prompt, Some(&system), self.max_tokens, self.temperature)
                .await;

            let call = match reply
                .map_err(anyhow::Error::from)
                .and_then(|r| parse_action(&r.text))
            {
                Ok(call) => call,
                Err(e) => {
                    failures += 1;
                    warn!(target: "jobscout.agent", step, failures, error = %format!("{e:#}"), "unusable model reply");
                    history.push(format!("step {step}: invalid reply ({e:#})"));
                    if failures >= self.max_failures {
                        return Ok(AgentRun {
                            steps: step,
                            stop: StopCause::TooManyFailures,
                            final_text: None,
                            history,
                        });
                    }
                    continue;
                }
            };
            failures = 0;

            debug!(target: "jobscout.agent", step, action = %call.action, "model chose action");
            let result = controller.execute(&call.action, call.params, ctx).await;
            history.push(format!(
                "step {step}: {} -> {}",
                call.action,
                clip(&result.summary(), MAX_HISTORY_ENTRY)
            ));
            if result.include_in_memory {
                if let Some(content) = &result.content {
                    memory.push(content.clone());
                }
            }
            if result.is_done {
                info!(target: "jobscout.agent", step, "task finished");
                return Ok(AgentRun {
                    steps: step,
                    stop: StopCause::Done,
                    final_text: result.content,
                    history,
                });
            }
        }

        info!(target: "jobscout.agent", max_steps = self.max_steps, "step budget exhausted");
        Ok(AgentRun {
            steps: self.max_steps,
            stop: StopCause::MaxSteps,
            final_text: None,
            history,
        })
    }
}

fn system_prompt(catalog: &[ActionSpec]) -> Result<String> {
    let actions = serde_json::to_string_pretty(catalog).context("serializing action catalog")?;
    Ok(format!(
        r#"You operate a web browser to complete the user's task, one action per reply.

Available actions (parameters are JSON schemas):
{actions}

Reply with a single JSON object and nothing else:
{{"action": "<action name>", "params": {{ ... }}}}

Call "list_elements" to see the indexed elements of the current page. Call "done" when the task is complete."#
    ))
}

fn step_prompt(task: &str, memory: &[String], history: &[String]) -> String {
    let mut prompt = format!("Task:\n{task}\n");
    if !memory.is_empty() {
        prompt.push_str("\nRemembered context:\n");
        for item in memory {
            prompt.push_str(item);
            prompt.push('\n');
        }
    }
    if !history.is_empty() {
        prompt.push_str("\nPrevious steps:\n");
        for line in history {
            prompt.push_str(line);
            prompt.push('\n');
        }
    }
    prompt.push_str("\nNext action:");
    prompt
}

/// Try a ```json fenced block first, then the outermost braces.
fn extract_json_block(text: &str) -> Option<String> {
    if let Some(caps) = FENCED_JSON.as_ref()?.captures(text) {
        return Some(caps.get(1)?.as_str().to_string());
    }
    PLAIN_JSON
        .as_ref()?
        .captures(text)
        .and_then(|c| c.get(1).map(|m| m.as_str().to_string()))
}

pub fn parse_action(reply: &str) -> Result<ActionCall> {
    let json = extract_json_block(reply).context("reply contains no JSON object")?;
    serde_json::from_str(&json).context("reply is not an action call")
}

fn clip(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((cut, _)) => format!("{}…", &s[..cut]),
        None => s.to_string(),
    }
}
