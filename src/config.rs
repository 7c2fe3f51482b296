use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::extractor::SubmissionKind;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Gemini,
    Openrouter,
    Openai,
    Ollama,
}

impl LlmProvider {
    /// Name shown to submitters in the "Analyzing ..." acknowledgement.
    pub fn display_name(&self) -> &'static str {
        match self {
            LlmProvider::Gemini => "Gemini AI",
            LlmProvider::Openrouter => "OpenRouter",
            LlmProvider::Openai => "OpenAI",
            LlmProvider::Ollama => "Ollama",
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmProvider::Gemini => write!(f, "gemini"),
            LlmProvider::Openrouter => write!(f, "openrouter"),
            LlmProvider::Openai => write!(f, "openai"),
            LlmProvider::Ollama => write!(f, "ollama"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: LlmProvider,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl LlmConfig {
    /// Returns the effective base_url: if the stored value is empty,
    /// fall back to the OpenAI-compatible URL for the configured provider.
    pub fn effective_base_url(&self) -> &str {
        if !self.base_url.is_empty() {
            return self.base_url.trim_end_matches('/');
        }
        match self.provider {
            LlmProvider::Gemini => "https://generativelanguage.googleapis.com/v1beta/openai",
            LlmProvider::Openrouter => "https://openrouter.ai/api/v1",
            LlmProvider::Openai => "https://api.openai.com/v1",
            LlmProvider::Ollama => "http://localhost:11434/v1",
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DiscordConfig {
    pub bot_token: String,
    /// Role a member must hold to submit IDPs in either watch channel.
    pub authorized_role_id: u64,
}

/// One watch channel and the channel its results are announced in.
#[derive(Debug, Deserialize, Clone)]
pub struct RouteConfig {
    pub watch_channel_id: u64,
    pub post_channel_id: u64,
    /// Overrides the built-in extraction prompt for this route.
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub discord: DiscordConfig,
    pub scrim: RouteConfig,
    pub tournament: RouteConfig,
    pub llm: LlmConfig,
}

fn default_model() -> String {
    "gemini-1.5-pro".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.discord.bot_token.trim().is_empty() {
            anyhow::bail!("discord.bot_token must not be empty");
        }
        if self.discord.authorized_role_id == 0 {
            anyhow::bail!("discord.authorized_role_id must be set");
        }

        for (name, route) in [("scrim", &self.scrim), ("tournament", &self.tournament)] {
            if route.watch_channel_id == 0 || route.post_channel_id == 0 {
                anyhow::bail!("{name}: watch_channel_id and post_channel_id must be set");
            }
        }

        let watched = [self.scrim.watch_channel_id, self.tournament.watch_channel_id];
        if watched[0] == watched[1] {
            anyhow::bail!(
                "scrim and tournament must watch different channels (both are {})",
                watched[0]
            );
        }
        for post in [self.scrim.post_channel_id, self.tournament.post_channel_id] {
            if watched.contains(&post) {
                anyhow::bail!("post channel {post} is also a watch channel");
            }
        }

        Ok(())
    }

    /// The submission kind and route for a watch channel, if `channel_id` is one.
    pub fn route_for(&self, channel_id: u64) -> Option<(SubmissionKind, &RouteConfig)> {
        if channel_id == self.scrim.watch_channel_id {
            Some((SubmissionKind::Scrim, &self.scrim))
        } else if channel_id == self.tournament.watch_channel_id {
            Some((SubmissionKind::Tournament, &self.tournament))
        } else {
            None
        }
    }
}
