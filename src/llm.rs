use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{LlmConfig, LlmProvider};

/// Content of a chat message: a plain string, or typed parts for vision input.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// ```json
/// { "type": "text", "text": "..." }
/// { "type": "image_url", "image_url": { "url": "data:image/png;base64,..." } }
/// ```
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ImageUrl {
    pub url: String,
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn image(url: impl Into<String>) -> Self {
        Self::ImageUrl {
            image_url: ImageUrl { url: url.into() },
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: MessageContent,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct LlmClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn provider(&self) -> LlmProvider {
        self.config.provider
    }

    /// Send a single user message and return the model's text reply.
    pub async fn complete(&self, content: MessageContent) -> Result<String> {
        let provider = self.config.provider;
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content,
            }],
            max_tokens: self.config.max_tokens,
        };

        let url = format!("{}/chat/completions", self.config.effective_base_url());

        debug!("Sending request to {}: {}", provider, url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", provider))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("{} API error ({}): {}", provider, status, error_body);
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .with_context(|| format!("Failed to parse {} response", provider))?;

        // A choice without content is a blank reply, not a failure
        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.unwrap_or_default())
            .with_context(|| format!("No response from {}", provider))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn client_for(base_url: &str) -> LlmClient {
        LlmClient::new(LlmConfig {
            provider: LlmProvider::Gemini,
            model: "gemini-1.5-pro".to_string(),
            base_url: base_url.to_string(),
            api_key: "secret".to_string(),
            max_tokens: 256,
        })
    }

    #[test]
    fn test_parts_serialize_in_openai_shape() {
        let content = MessageContent::Parts(vec![
            ContentPart::text("prompt"),
            ContentPart::image("data:image/png;base64,AAAA"),
        ]);
        assert_eq!(
            serde_json::to_value(&content).unwrap(),
            json!([
                { "type": "text", "text": "prompt" },
                { "type": "image_url", "image_url": { "url": "data:image/png;base64,AAAA" } }
            ])
        );
        assert_eq!(
            serde_json::to_value(MessageContent::Text("hi".into())).unwrap(),
            json!("hi")
        );
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer secret")
            .match_body(Matcher::Json(json!({
                "model": "gemini-1.5-pro",
                "messages": [{ "role": "user", "content": "hello" }],
                "max_tokens": 256
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({ "choices": [{ "message": { "role": "assistant", "content": "world" } }] })
                    .to_string(),
            )
            .create_async()
            .await;

        let client = client_for(&server.url());
        let reply = client
            .complete(MessageContent::Text("hello".into()))
            .await
            .unwrap();

        assert_eq!(reply, "world");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_surfaces_api_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(403)
            .with_body("API key not valid")
            .create_async()
            .await;

        let client = client_for(&server.url());
        let err = client
            .complete(MessageContent::Text("hello".into()))
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("gemini API error (403"));
        assert!(message.contains("API key not valid"));
    }

    #[tokio::test]
    async fn test_complete_rejects_empty_choices() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "choices": [] }).to_string())
            .create_async()
            .await;

        let client = client_for(&server.url());
        let err = client
            .complete(MessageContent::Text("hello".into()))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No response from gemini");
    }

    #[tokio::test]
    async fn test_complete_returns_blank_content_as_empty() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "choices": [{ "message": { "content": null } }] }).to_string())
            .create_async()
            .await;

        let client = client_for(&server.url());
        let reply = client
            .complete(MessageContent::Text("hello".into()))
            .await
            .unwrap();
        assert_eq!(reply, "");
    }
}
