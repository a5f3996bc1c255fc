//! A minimal [`AgentCapability`] implementation standing in for the LLM
//! reasoning loop and tool execution, which are external collaborators this
//! core never implements. When `agent.apiBase`/`agent.apiKey` are configured
//! it speaks an OpenAI-compatible chat completion endpoint; otherwise it
//! echoes the prompt so the router and session store can be exercised
//! offline.

use async_trait::async_trait;
use automate_agent::{AgentCapability, AgentError, Result};
use tracing::warn;

pub struct DemoAgentDriver {
    client: reqwest::Client,
    api_base: Option<String>,
    api_key: Option<String>,
    model: String,
}

impl DemoAgentDriver {
    pub fn new(api_base: Option<String>, api_key: Option<String>, model: String) -> Self {
        DemoAgentDriver { client: reqwest::Client::new(), api_base, api_key, model }
    }

    async fn chat_complete(&self, base: &str, key: &str, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", base.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .bearer_auth(key)
            .json(&serde_json::json!({
                "model": self.model,
                "messages": [{"role": "user", "content": prompt}],
            }))
            .send()
            .await
            .map_err(|e| AgentError::Validation(format!("chat completion request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Validation(format!("chat completion API error {status}: {body}")));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AgentError::Validation(format!("chat completion response was not JSON: {e}")))?;

        json["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| AgentError::Validation("chat completion response missing choices[0].message.content".into()))
    }
}

#[async_trait]
impl AgentCapability for DemoAgentDriver {
    async fn process_message(&self, _session_id: &str, prompt: &str) -> Result<String> {
        match (&self.api_base, &self.api_key) {
            (Some(base), Some(key)) => match self.chat_complete(base, key, prompt).await {
                Ok(reply) => Ok(reply),
                Err(e) => {
                    warn!(error = %e, "chat completion failed, falling back to echo");
                    Ok(format!("[no reply from model: {e}] echo: {prompt}"))
                }
            },
            _ => Ok(format!("echo: {prompt}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn echoes_when_unconfigured() {
        let driver = DemoAgentDriver::new(None, None, "test-model".into());
        let reply = driver.process_message("s1", "hello").await.unwrap();
        assert_eq!(reply, "echo: hello");
    }
}
