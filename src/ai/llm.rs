use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::tarot::DrawnCard;

const READING_SYSTEM_PROMPT: &str = "You are an experienced tarot reader. \
    Interpret the spread below for the querent's question. Go through the cards \
    in the order they were drawn, explain how a reversed card changes its meaning, \
    and finish with a short summary. Answer in the language of the question.";

#[derive(Debug, Clone, Serialize)]
struct OpenAiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessageContent,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessageContent {
    content: String,
}

#[derive(Debug, Deserialize)]
pub struct OpenAiUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

pub struct LlmClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

/// A simple (role, content) pair for building the messages array.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

pub struct LlmResponse {
    pub text: String,
    pub usage: Option<OpenAiUsage>,
}

impl LlmClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: config.openai_api_key.clone(),
            model: config.openai_model.clone(),
            base_url: config.openai_base_url.clone(),
        }
    }

    /// Send a conversation to the chat completions endpoint and get the assistant's reply.
    pub async fn chat(&self, messages: &[ChatMessage]) -> anyhow::Result<LlmResponse> {
        let api_messages: Vec<OpenAiMessage<'_>> = messages
            .iter()
            .map(|m| OpenAiMessage {
                role: &m.role,
                content: &m.content,
            })
            .collect();

        let body = serde_json::json!({
            "model": self.model,
            "messages": api_messages,
            "temperature": 0.9,
        });

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let err_body = resp.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI API error ({}): {}", status, err_body);
        }

        let api_resp: OpenAiResponse = resp.json().await?;

        let text = api_resp
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| anyhow::anyhow!("OpenAI API returned no choices"))?;

        Ok(LlmResponse {
            text,
            usage: api_resp.usage,
        })
    }
}

/// Messages for a single reading of `cards` against the user's `question`.
pub fn reading_prompt(cards: &[DrawnCard], question: &str) -> Vec<ChatMessage> {
    let spread = cards
        .iter()
        .enumerate()
        .map(|(i, card)| format!("{}. {}", i + 1, card))
        .collect::<Vec<_>>()
        .join("\n");

    vec![
        ChatMessage::system(READING_SYSTEM_PROMPT),
        ChatMessage::user(format!("Spread:\n{}\n\nQuestion:\n{}", spread, question)),
    ]
}
