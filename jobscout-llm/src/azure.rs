use crate::traits::{LlmClient, LlmResponse};
use async_trait::async_trait;
use jobscout_common::{JobscoutError, Result};
use jobscout_http::{Auth, HttpClient, HttpError, RequestOpts};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Chat-completions client for an Azure OpenAI deployment.
///
/// Construction never fails on a blank key or endpoint; those surface on the
/// first [`generate`](LlmClient::generate) call instead.
pub struct AzureOpenAiClient {
    client: Option<HttpClient>,
    endpoint: String,
    api_key: String,
    deployment: String,
    api_version: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: u32,
}

impl AzureOpenAiClient {
    pub fn new(api_key: String, endpoint: String, deployment: String, api_version: String) -> Self {
        let base = if endpoint.ends_with('/') {
            endpoint.clone()
        } else {
            format!("{endpoint}/")
        };
        let client = match HttpClient::new(&base) {
            Ok(c) => Some(c),
            Err(e) => {
                tracing::warn!(error = %e, "azure endpoint unusable; model calls will fail");
                None
            }
        };

        Self {
            client,
            endpoint,
            api_key,
            deployment,
            api_version,
        }
    }
}

#[async_trait]
impl LlmClient for AzureOpenAiClient {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse> {
        let client = self.client.as_ref().ok_or_else(|| {
            JobscoutError::Config(format!("invalid Azure OpenAI endpoint: {:?}", self.endpoint))
        })?;

        let mut messages = Vec::with_capacity(2);
        if let Some(sys) = system_prompt {
            messages.push(ChatMessage {
                role: "system",
                content: sys,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });
        let req = ChatRequest {
            messages,
            max_tokens,
            temperature,
        };

        let opts = RequestOpts {
            auth: Some(Auth::api_key_header("api-key", &self.api_key).map_err(http_to_jobscout)?),
            query: Some(vec![("api-version", Cow::Borrowed(self.api_version.as_str()))]),
            ..Default::default()
        };
        let path = format!("openai/deployments/{}/chat/completions", self.deployment);
        let resp: ChatResponse = client
            .post_json(&path, &req, opts)
            .await
            .map_err(http_to_jobscout)?;

        let text = resp
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .unwrap_or_default();

        Ok(LlmResponse {
            text,
            model: resp.model,
            tokens_used: resp.usage.map(|u| u.total_tokens),
        })
    }

    fn model_name(&self) -> &str {
        &self.deployment
    }
}

fn http_to_jobscout(e: HttpError) -> JobscoutError {
    JobscoutError::Agent(format!("azure openai: {e}"))
}
