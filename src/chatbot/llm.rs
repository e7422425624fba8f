use std::time::Duration;

use anyhow::Context;
use serde_json::json;

use crate::config::ChatbotConfig;

const SYSTEM_PROMPT: &str = "You are the built-in assistant of a to-do list application. \
    Users manage personal tasks with optional due dates, organized into lists, with a \
    calendar view by due date. Completed tasks older than 30 days are cleaned up \
    automatically. Answer briefly and only about using the application.";

/// Client for the optional upstream text-generation service (OpenAI-style
/// chat completions). Failures are surfaced to the handler, never retried.
pub struct LlmClient {
    http: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
}

impl LlmClient {
    pub fn new(config: &ChatbotConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("build chatbot http client")?;
        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    pub async fn complete(&self, user_message: &str) -> anyhow::Result<String> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": user_message },
            ],
        });

        let mut request = self.http.post(&self.api_url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .context("chatbot upstream request failed")?
            .error_for_status()
            .context("chatbot upstream returned an error status")?;

        let payload: serde_json::Value = response
            .json()
            .await
            .context("chatbot upstream returned invalid json")?;
        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .context("chatbot upstream response had no completion text")
    }
}
