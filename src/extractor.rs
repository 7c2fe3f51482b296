use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::config::LlmConfig;
use crate::llm::{ContentPart, LlmClient, MessageContent};
use crate::media;

/// Returned when there is neither an image nor text to extract from.
pub const NO_INPUT_SENTINEL: &str = "No input provided.";

/// The two submission categories. They share all mechanics and differ only in
/// channels and prompt wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionKind {
    Scrim,
    Tournament,
}

impl SubmissionKind {
    pub fn label(&self) -> &'static str {
        match self {
            SubmissionKind::Scrim => "Scrim",
            SubmissionKind::Tournament => "Tournament",
        }
    }

    pub fn default_prompt(&self) -> String {
        format!(
            "You are an expert BGMI {} Room ID and Password extractor. \
             Only extract and return the Room ID and Password from the input. \
             Return exactly in this format:\n\nRoom ID: 1234567\nPassword: abc123\n\n\
             If no valid Room ID or Password is found, reply ONLY with: No IDP found.",
            self.label()
        )
    }
}

impl std::fmt::Display for SubmissionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionInput {
    Image { url: String },
    Text(String),
}

impl ExtractionInput {
    /// Word used in the acknowledgement sent before extraction.
    pub fn source(&self) -> &'static str {
        match self {
            ExtractionInput::Image { .. } => "image",
            ExtractionInput::Text(_) => "text",
        }
    }
}

/// Asks the AI service for the room ID and password in an image or text.
pub struct Extractor {
    llm: LlmClient,
    http: reqwest::Client,
}

impl Extractor {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            llm: LlmClient::new(config),
            http: reqwest::Client::new(),
        }
    }

    pub fn llm(&self) -> &LlmClient {
        &self.llm
    }

    /// Run one extraction and return the model's trimmed reply.
    ///
    /// Failures are not propagated: they come back as `"Error: ..."` and are
    /// shown to the submitter as-is.
    pub async fn extract(&self, prompt: &str, input: Option<&ExtractionInput>) -> String {
        let Some(input) = input else {
            return NO_INPUT_SENTINEL.to_string();
        };

        match self.try_extract(prompt, input).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Extraction from {} failed: {:#}", input.source(), e);
                format!("Error: {:#}", e)
            }
        }
    }

    async fn try_extract(&self, prompt: &str, input: &ExtractionInput) -> Result<String> {
        let content = match input {
            ExtractionInput::Image { url } => {
                let bytes = self.fetch_image(url).await?;
                let image = media::normalize(&bytes)?;
                debug!(
                    "Normalized attachment to {}x{} RGB ({} bytes)",
                    image.width,
                    image.height,
                    image.data.len()
                );
                MessageContent::Parts(vec![
                    ContentPart::text(prompt),
                    ContentPart::image(image.data_uri()),
                ])
            }
            ExtractionInput::Text(text) => {
                MessageContent::Text(format!("{}\n\nContent:\n{}", prompt, text))
            }
        };

        let reply = self.llm.complete(content).await?;
        Ok(reply.trim().to_string())
    }

    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>> {
        info!("Downloading attachment: {}", url);
        let response = self
            .http
            .get(url)
            .send()
            .await
            .context("Failed to download attachment")?
            .error_for_status()
            .context("Attachment download was rejected")?;

        let bytes = response
            .bytes()
            .await
            .context("Failed to read attachment body")?;
        Ok(bytes.to_vec())
    }
}
