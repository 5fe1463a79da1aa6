//! Common types and utilities shared across jobscout crates.
//!
//! This crate defines the LLM provider configuration, the structured
//! [`ActionResult`] every registered action returns, observability helpers,
//! and shared error types. It stays lightweight so that every crate in the
//! workspace can depend on it.
//!
//! # Overview
//!
//! - [`LlmConfig`]: Provider‑agnostic LLM configuration
//! - [`ActionResult`]: Outcome of one agent action (content *or* error)
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`JobscoutError`] and [`Result`]: Shared error handling
//!
//! # Examples
//!
//! ```rust
//! use jobscout_common::ActionResult;
//!
//! let ok = ActionResult::content("Saved job to file");
//! assert!(ok.is_success());
//!
//! let failed = ActionResult::error("No element found at index 4");
//! assert_eq!(failed.content, None);
//! ```
use serde::{Deserialize, Serialize};

pub mod observability;

/// Environment variable holding the Azure OpenAI API key.
pub const AZURE_KEY_ENV: &str = "AZURE_OPENAI_KEY";
/// Environment variable holding the Azure OpenAI endpoint.
pub const AZURE_ENDPOINT_ENV: &str = "AZURE_OPENAI_ENDPOINT";

/// Configuration for the LLM provider that drives the agent.
///
/// See the `jobscout-llm` crate for concrete client implementations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum LlmConfig {
    /// `api_key` and `endpoint` fall back to `AZURE_OPENAI_KEY` and
    /// `AZURE_OPENAI_ENDPOINT` when the source omits them.
    Azure {
        #[serde(default = "azure_key_from_env")]
        api_key: String,
        #[serde(default = "azure_endpoint_from_env")]
        endpoint: String,
        #[serde(default = "default_azure_deployment")]
        deployment: String,
        #[serde(default = "default_azure_api_version")]
        api_version: String,
    },
    Openai {
        api_key: String,
        model: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        base_url: Option<String>,
    },
    None,
}

/// Placeholder printed instead of a configured API key.
pub const REDACTED: &str = "<redacted>";

fn azure_key_from_env() -> String {
    std::env::var(AZURE_KEY_ENV).unwrap_or_default()
}

fn azure_endpoint_from_env() -> String {
    std::env::var(AZURE_ENDPOINT_ENV).unwrap_or_default()
}

fn default_azure_deployment() -> String {
    "gpt-4o".to_string()
}

fn default_azure_api_version() -> String {
    "2024-10-21".to_string()
}

impl LlmConfig {
    /// Azure OpenAI settings read from `AZURE_OPENAI_KEY` / `AZURE_OPENAI_ENDPOINT`.
    ///
    /// Missing variables become empty strings; nothing is validated here, a bad
    /// credential only shows up later as an authentication error from the model.
    ///
    /// ```
    /// use jobscout_common::LlmConfig;
    ///
    /// match LlmConfig::azure_from_env() {
    ///     LlmConfig::Azure { deployment, api_version, .. } => {
    ///         assert_eq!(deployment, "gpt-4o");
    ///         assert_eq!(api_version, "2024-10-21");
    ///     }
    ///     other => panic!("unexpected provider: {other:?}"),
    /// }
    /// ```
    pub fn azure_from_env() -> Self {
        Self::Azure {
            api_key: azure_key_from_env(),
            endpoint: azure_endpoint_from_env(),
            deployment: default_azure_deployment(),
            api_version: default_azure_api_version(),
        }
    }

    /// Copy with a non-empty API key replaced by [`REDACTED`], for display.
    pub fn redacted(&self) -> Self {
        let mut out = self.clone();
        if let Self::Azure { api_key, .. } | Self::Openai { api_key, .. } = &mut out {
            if !api_key.is_empty() {
                *api_key = REDACTED.to_string();
            }
        }
        out
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self::azure_from_env()
    }
}

/// Structured outcome of a registered action.
///
/// Exactly one of `content` and `error` is populated; the constructors are the
/// only way this crate builds a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub content: Option<String>,
    pub error: Option<String>,
    /// Ask the driver to keep `content` in its long-lived memory.
    #[serde(default)]
    pub include_in_memory: bool,
    /// Set by the `done` action to end the agent loop.
    #[serde(default)]
    pub is_done: bool,
}

impl ActionResult {
    pub fn content(text: impl Into<String>) -> Self {
        Self {
            content: Some(text.into()),
            error: None,
            include_in_memory: false,
            is_done: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: None,
            error: Some(message.into()),
            include_in_memory: false,
            is_done: false,
        }
    }

    /// Final answer of an agent run.
    pub fn done(text: impl Into<String>) -> Self {
        Self {
            is_done: true,
            ..Self::content(text)
        }
    }

    pub fn remember(mut self) -> Self {
        self.include_in_memory = true;
        self
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Single line suitable for an agent's history.
    pub fn summary(&self) -> String {
        match (&self.content, &self.error) {
            (_, Some(err)) => format!("error: {err}"),
            (Some(text), None) => text.clone(),
            (None, None) => String::new(),
        }
    }
}

/// Error types used across the jobscout workspace.
#[derive(thiserror::Error, Debug)]
pub enum JobscoutError {
    /// An agent failed to complete a requested operation.
    #[error("Agent error: {0}")]
    Agent(String),

    /// A driver (browser, network, etc.) reported an error.
    #[error("Driver error: {0}")]
    Driver(#[from] anyhow::Error),

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The driver asked for an action nobody registered.
    #[error("Unknown action: {0}")]
    UnknownAction(String),
}

/// Convenient alias for results that use [`JobscoutError`].
pub type Result<T> = std::result::Result<T, JobscoutError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn exactly_one(r: &ActionResult) -> bool {
        r.content.is_some() != r.error.is_some()
    }

    #[test]
    fn constructors_populate_exactly_one_side() {
        for r in [
            ActionResult::content("ok"),
            ActionResult::error("nope"),
            ActionResult::done("finished"),
            ActionResult::content("cv text").remember(),
        ] {
            assert!(exactly_one(&r), "{r:?}");
        }
    }

    #[test]
    fn summary_prefers_error() {
        assert_eq!(ActionResult::error("boom").summary(), "error: boom");
        assert_eq!(ActionResult::content("fine").summary(), "fine");
    }

    #[test]
    fn redaction_hides_keys_but_keeps_the_rest() {
        let openai = LlmConfig::Openai {
            api_key: "sk-live".into(),
            model: "gpt-4o".into(),
            base_url: None,
        };
        assert_eq!(
            openai.redacted(),
            LlmConfig::Openai {
                api_key: REDACTED.into(),
                model: "gpt-4o".into(),
                base_url: None,
            }
        );

        let unset = LlmConfig::Azure {
            api_key: String::new(),
            endpoint: "https://example.openai.azure.com".into(),
            deployment: "gpt-4o".into(),
            api_version: "2024-10-21".into(),
        };
        assert_eq!(unset.redacted(), unset);
        assert_eq!(LlmConfig::None.redacted(), LlmConfig::None);
    }

    #[test]
    fn llm_config_parses_tagged_provider() {
        let cfg: LlmConfig = serde_json::from_value(serde_json::json!({
            "provider": "azure",
            "api_key": "k",
            "endpoint": "https://example.openai.azure.com"
        }))
        .unwrap();
        assert_eq!(
            cfg,
            LlmConfig::Azure {
                api_key: "k".into(),
                endpoint: "https://example.openai.azure.com".into(),
                deployment: "gpt-4o".into(),
                api_version: "2024-10-21".into(),
            }
        );
    }
}
