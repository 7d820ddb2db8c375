use anyhow::{Context, Result, bail};
use log::debug;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tally_core::Completer;

use crate::config::LlmSection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
    /// OpenAI chat-completions API or any compatible endpoint (Groq, ...)
    OpenAI,
}

impl Provider {
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "openai" | "openai-compatible" | "groq" => Ok(Provider::OpenAI),
            "anthropic" => Ok(Provider::Anthropic),
            other => bail!("unknown llm provider {other:?} (expected openai or anthropic)"),
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::Anthropic => "https://api.anthropic.com",
            Provider::OpenAI => "https://api.groq.com/openai/v1",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: Provider,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub api_key: String,
}

impl LlmConfig {
    /// Resolve credentials from the environment. `MODEL` overrides the
    /// configured model.
    pub fn from_section(section: &LlmSection) -> Result<Self> {
        Self::resolve(section, |k| std::env::var(k).ok())
    }

    fn resolve(section: &LlmSection, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let provider = Provider::parse(&section.provider)?;
        let api_key = env(section.api_key_env.as_str())
            .filter(|k| !k.trim().is_empty())
            .with_context(|| format!("missing API key: set {} (environment or .env)", section.api_key_env))?;
        let model = env("MODEL")
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| section.model.clone());

        Ok(Self {
            provider,
            model,
            base_url: section
                .base_url
                .as_deref()
                .unwrap_or(provider.default_base_url())
                .trim_end_matches('/')
                .to_string(),
            temperature: section.temperature,
            max_tokens: section.max_tokens,
            api_key,
        })
    }
}

/// Remote model behind the [`Completer`] capability: one blocking call per run.
pub struct LlmClient {
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Self {
        Self { config }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

impl Completer for LlmClient {
    fn complete(&self, prompt: &str) -> Result<String> {
        complete_blocking(&self.config, prompt)
    }
}

pub fn complete_blocking(config: &LlmConfig, prompt: &str) -> Result<String> {
    // Inside a runtime already: block_in_place + Handle::block_on.
    // Otherwise: private runtime.
    if let Ok(handle) = tokio::runtime::Handle::try_current() {
        tokio::task::block_in_place(|| handle.block_on(complete_async(config, prompt)))
    } else {
        let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
        rt.block_on(complete_async(config, prompt))
    }
}

async fn complete_async(config: &LlmConfig, prompt: &str) -> Result<String> {
    let messages = [Msg {
        role: "user",
        content: prompt,
    }];
    let body = CompletionRequest {
        model: &config.model,
        max_tokens: config.max_tokens,
        temperature: config.temperature,
        messages: &messages,
    };
    let text = match config.provider {
        Provider::Anthropic => {
            let resp: MessagesResponse = post_json(
                format!("{}/v1/messages", config.base_url),
                anthropic_headers(&config.api_key)?,
                &body,
            )
            .await?;
            resp.content
                .into_iter()
                .filter(|b| b.kind == "text")
                .filter_map(|b| b.text)
                .collect::<String>()
        }
        Provider::OpenAI => {
            let mut headers = HeaderMap::new();
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", config.api_key))?,
            );
            let resp: ChatResponse = post_json(
                format!("{}/chat/completions", config.base_url),
                headers,
                &body,
            )
            .await?;
            resp.choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .unwrap_or_default()
        }
    };
    Ok(text.trim().to_string())
}

fn anthropic_headers(api_key: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert("x-api-key", HeaderValue::from_str(api_key)?);
    headers.insert("anthropic-version", HeaderValue::from_static("2023-06-01"));
    Ok(headers)
}

/// One POST round trip: non-success statuses become errors carrying the body.
async fn post_json<B, R>(url: String, headers: HeaderMap, body: &B) -> Result<R>
where
    B: Serialize,
    R: DeserializeOwned,
{
    debug!("POST {url}");
    let resp = reqwest::Client::new()
        .post(&url)
        .headers(headers)
        .json(body)
        .send()
        .await
        .with_context(|| format!("request to {url}"))?;

    let status = resp.status();
    if !status.is_success() {
        let txt = resp.text().await.unwrap_or_default();
        bail!("completion error from {url}: {status} {txt}");
    }
    resp.json().await.with_context(|| format!("parse response from {url}"))
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

/// Same body shape for both providers
#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: &'a [Msg<'a>],
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn test_provider_parse() {
        assert_eq!(Provider::parse("Groq").unwrap(), Provider::OpenAI);
        assert_eq!(Provider::parse("anthropic").unwrap(), Provider::Anthropic);
        assert!(Provider::parse("mistral-local").is_err());
    }

    #[test]
    fn test_missing_key_is_an_error() {
        let err = LlmConfig::resolve(&LlmSection::default(), env(&[])).unwrap_err();
        assert!(err.to_string().contains("GROQ_API_KEY"));

        let blank = LlmConfig::resolve(&LlmSection::default(), env(&[("GROQ_API_KEY", "  ")]));
        assert!(blank.is_err());
    }

    #[test]
    fn test_model_override_and_base_url() {
        let mut section = LlmSection::default();
        section.base_url = Some("https://api.groq.com/openai/v1/".to_string());
        let cfg = LlmConfig::resolve(
            &section,
            env(&[("GROQ_API_KEY", "gsk_test"), ("MODEL", "llama-3.1-8b-instant")]),
        )
        .unwrap();
        assert_eq!(cfg.model, "llama-3.1-8b-instant");
        assert_eq!(cfg.base_url, "https://api.groq.com/openai/v1");
        assert_eq!(cfg.api_key, "gsk_test");
        assert_eq!(cfg.provider, Provider::OpenAI);
    }

    #[test]
    fn test_anthropic_base_url_default() {
        let mut section = LlmSection::default();
        section.provider = "anthropic".to_string();
        section.api_key_env = "ANTHROPIC_API_KEY".to_string();
        let cfg = LlmConfig::resolve(&section, env(&[("ANTHROPIC_API_KEY", "sk-ant-x")])).unwrap();
        assert_eq!(cfg.base_url, "https://api.anthropic.com");
    }

    #[test]
    fn test_request_bodies_serialize() {
        let messages = [Msg {
            role: "user",
            content: "bonjour",
        }];
        let body = CompletionRequest {
            model: "llama-3.3-70b-versatile",
            max_tokens: 8192,
            temperature: 0.1,
            messages: &messages,
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["model"], "llama-3.3-70b-versatile");
        assert_eq!(v["messages"][0]["role"], "user");
        assert_eq!(v["messages"][0]["content"], "bonjour");
        assert_eq!(v["max_tokens"], 8192);
    }

    #[test]
    fn test_response_bodies_deserialize() {
        let chat: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant","content":"ok"}}]}"#).unwrap();
        assert_eq!(chat.choices[0].message.content.as_deref(), Some("ok"));

        let msgs: MessagesResponse = serde_json::from_str(
            r#"{"content":[{"type":"text","text":"a"},{"type":"tool_use","id":"x"}]}"#,
        )
        .unwrap();
        assert_eq!(msgs.content.len(), 2);
        assert_eq!(msgs.content[1].kind, "tool_use");
        assert!(msgs.content[1].text.is_none());
    }

    #[test]
    fn test_anthropic_headers() {
        let h = anthropic_headers("sk-ant-x").unwrap();
        assert_eq!(h["x-api-key"], "sk-ant-x");
        assert_eq!(h["anthropic-version"], "2023-06-01");
    }

    #[test]
    fn test_default_model_when_no_override() {
        let cfg = LlmConfig::resolve(&LlmSection::default(), env(&[("GROQ_API_KEY", "k")])).unwrap();
        assert_eq!(cfg.model, "llama-3.3-70b-versatile");
        assert_eq!(cfg.temperature, 0.1);
    }
}
