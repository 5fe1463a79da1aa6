//! Provider‑agnostic LLM integration for jobscout.
//!
//! This crate exposes a common [`traits::LlmClient`] interface with Azure
//! OpenAI and OpenAI implementations, plus [`ensure_llm_ready`] to build a
//! client from a [`jobscout_common::LlmConfig`].
//!
//! # Examples
//! ```no_run
//! use jobscout_common::{LlmConfig, Result};
//! use jobscout_llm::ensure_llm_ready;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<()> {
//! let client = ensure_llm_ready(&LlmConfig::azure_from_env())?;
//! assert_eq!(client.model_name(), "gpt-4o");
//! # Ok(())
//! # }
//! ```
pub mod azure;
pub mod openai;
pub mod traits;

use azure::AzureOpenAiClient;
use jobscout_common::{JobscoutError, LlmConfig};
use openai::OpenAiClient;
use std::sync::Arc;
use traits::LlmClient;

/// Build the client described by `config`.
pub fn ensure_llm_ready(
    config: &LlmConfig,
) -> jobscout_common::Result<Arc<dyn LlmClient + Send + Sync + 'static>> {
    match config {
        LlmConfig::Azure {
            api_key,
            endpoint,
            deployment,
            api_version,
        } => Ok(Arc::new(AzureOpenAiClient::new(
            api_key.clone(),
            endpoint.clone(),
            deployment.clone(),
            api_version.clone(),
        ))),
        LlmConfig::Openai {
            api_key,
            model,
            base_url,
        } => {
            let client = OpenAiClient::new(api_key.clone(), model.clone(), base_url.as_deref())?;
            Ok(Arc::new(client))
        }
        LlmConfig::None => Err(JobscoutError::Config("No LLM configured".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_provider_is_a_config_error() {
        let err = ensure_llm_ready(&LlmConfig::None).err().expect("should fail");
        assert!(matches!(err, JobscoutError::Config(_)));
    }

    #[test]
    fn openai_honors_base_url() {
        let cfg = LlmConfig::Openai {
            api_key: "k".into(),
            model: "gpt-4o-mini".into(),
            base_url: Some("http://localhost:8080/v1/".into()),
        };
        let client = ensure_llm_ready(&cfg).unwrap();
        assert_eq!(client.model_name(), "gpt-4o-mini");
    }
}
