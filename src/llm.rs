/*!
Client for an OpenAI-compatible chat-completions endpoint.

The formula is sent as DIMACS text next to a fixed instruction prompt. The
service is asked to reply with a JSON object matching a strict schema.
*/

use std::{env, time::Duration};

use reqwest::{blocking::Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::oracle::{Oracle, RawClaim};
use crate::prelude::*;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("{} is not set (pass {} or set the environment variable)", name, flag))]
    MissingConfig {
        name: &'static str,
        flag: &'static str,
    },
    #[snafu(display("Failed to build the HTTP client"))]
    BuildClient { source: reqwest::Error },
    #[snafu(display("Request to '{}' failed", url))]
    Request { url: String, source: reqwest::Error },
    #[snafu(display("Service answered with HTTP {}: {}", status, body))]
    HttpStatus { status: StatusCode, body: String },
    #[snafu(display("Failed to read the chat completion response"))]
    ResponseBody { source: reqwest::Error },
    #[snafu(display("Failed to decode the chat completion response"))]
    ResponseFormat { source: serde_json::Error },
    #[snafu(display("Chat completion response has no message content"))]
    EmptyResponse,
}

pub const DEFAULT_MODEL: &str = "deepseek/deepseek-v3.2";

const SYSTEM_PROMPT: &str = "\
The user will give a CNF in dimacs format. Determine if it's satisfiable or not WITHOUT USING ANY \
EXTERNAL TOOLS. Use your own reasoning by writing down the assignment steps while you are working. \
If you think formula is satisfiable, ensure that by checking every clause. After determining the \
result output a JSON with two fields:
- satisfiable: Boolean. True if the formula is satisfiable
- assignment: Array of booleans. If the formula is satisfiable provide an assignment for each \
variable from 1 to N. If the formula is not satisfiable this field is null.

EXAMPLE INPUT:
p cnf 10 10
-7 9 10 0
7 8 9 0
-7 -9 10 0
-2 3 5 0
-4 -6 -8 0
-1 3 -5 0
1 -3 -8 0
4 -5 -10 0
4 -7 -8 0
-2 -5 8 0

EXAMPLE JSON OUTPUT:
{
    \"satisfiable\": true,
    \"assignment\": [false, false, false, false, false, false, false, false, false, false]
}
";

/// Connection settings for the reasoning service.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
    /// Token budget for the service's hidden reasoning
    pub reasoning_max_tokens: u32,
}

impl LlmConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        LlmConfig {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_owned(),
            timeout_secs: 1800,
            reasoning_max_tokens: 100_000,
        }
    }

    /// Builds a config from explicit values, falling back to `API_BASE_URL`,
    /// `API_KEY` and `MODEL` from the environment.
    pub fn resolve(
        base_url: Option<String>,
        api_key: Option<String>,
        model: Option<String>,
    ) -> Result<Self, Error> {
        let base_url = base_url
            .or_else(|| env::var("API_BASE_URL").ok())
            .context(MissingConfig {
                name: "API_BASE_URL",
                flag: "--api-base-url",
            })?;
        let api_key = api_key
            .or_else(|| env::var("API_KEY").ok())
            .context(MissingConfig {
                name: "API_KEY",
                flag: "--api-key",
            })?;

        let mut config = LlmConfig::new(base_url, api_key);
        if let Some(model) = model.or_else(|| env::var("MODEL").ok()) {
            config.model = model;
        }

        Ok(config)
    }

    pub fn from_env() -> Result<Self, Error> {
        LlmConfig::resolve(None, None, None)
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: Value,
    reasoning: ReasoningOptions,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ReasoningOptions {
    enabled: bool,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    #[serde(default)]
    reasoning: Option<Value>,
    #[serde(default)]
    reasoning_content: Option<Value>,
}

fn response_schema() -> Value {
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": "sat_result",
            "strict": true,
            "schema": {
                "type": "object",
                "properties": {
                    "satisfiable": {
                        "type": "boolean",
                        "description": "Whether the formula is satisfiable or not"
                    },
                    "assignment": {
                        "type": ["array", "null"],
                        "items": { "type": "boolean" },
                        "description": "Assignment for each variable from 1 to N. Null if not satisfiable"
                    }
                },
                "required": ["satisfiable", "assignment"],
                "additionalProperties": false
            }
        }
    })
}

/// Renders the reasoning field, which some providers send as structured data.
fn reasoning_text(reasoning: Value) -> Option<String> {
    match reasoning {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}

/// Extracts the claim from a chat completion body.
///
/// Providers name the reasoning trace `reasoning` or `reasoning_content`, and
/// some send both; `reasoning` wins.
pub(crate) fn parse_response(body: &str) -> Result<RawClaim, Error> {
    let parsed: ChatResponse = serde_json::from_str(body).context(ResponseFormat)?;
    let message = parsed
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message)
        .context(EmptyResponse)?;
    let content = message.content.context(EmptyResponse)?;

    debug!("Service replied with {}", content);

    let reasoning_content = message.reasoning_content;
    let reasoning = message
        .reasoning
        .and_then(reasoning_text)
        .or_else(|| reasoning_content.and_then(reasoning_text));

    Ok(RawClaim { content, reasoning })
}

/// Blocking chat-completions client.
pub struct ChatClient {
    client: Client,
    config: LlmConfig,
}

impl ChatClient {
    pub fn new(config: LlmConfig) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context(BuildClient)?;

        Ok(ChatClient { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

impl Oracle for ChatClient {
    fn submit(&self, dimacs: &str) -> Result<RawClaim, Error> {
        let url = self.config.completions_url();
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: dimacs,
                },
            ],
            response_format: response_schema(),
            reasoning: ReasoningOptions {
                enabled: true,
                max_tokens: self.config.reasoning_max_tokens,
            },
        };

        info!("Submitting formula to {} ({})", url, self.config.model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .context(Request { url: url.as_str() })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return HttpStatus { status, body }.fail();
        }

        let body = response.text().context(ResponseBody)?;
        parse_response(&body)
    }
}
