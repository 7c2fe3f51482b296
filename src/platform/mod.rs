pub mod discord;

use anyhow::Result;
use async_trait::async_trait;

/// A file attached to an incoming message.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub url: String,
    pub filename: String,
}

/// A message received from the chat platform
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub author_id: u64,
    /// Set for bots and webhooks; such messages are never processed.
    pub author_is_bot: bool,
    /// `None` for direct messages
    pub guild_id: Option<u64>,
    pub channel_id: u64,
    /// The message text
    pub content: String,
    /// Attachments in the order the platform delivered them
    pub attachments: Vec<Attachment>,
}

/// Operations the relay needs from the chat platform.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Role ids held by `user_id` in `guild_id`.
    async fn member_roles(&self, guild_id: Option<u64>, user_id: u64) -> Result<Vec<u64>>;

    /// Check that `channel_id` exists and is visible to the bot.
    async fn resolve_channel(&self, channel_id: u64) -> Result<()>;

    async fn send_message(&self, channel_id: u64, text: &str) -> Result<()>;
}

/// Split long messages for the platform's per-message character limit
pub fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.chars().count() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        // Byte offset just past `max_len` chars from `start`
        let end = text[start..]
            .char_indices()
            .nth(max_len)
            .map(|(i, _)| start + i)
            .unwrap_or(text.len());
        let actual_end = if end < text.len() {
            text[start..end]
                .rfind('\n')
                .or_else(|| text[start..end].rfind(' '))
                .map(|pos| start + pos + 1)
                .unwrap_or(end)
        } else {
            end
        };

        chunks.push(text[start..actual_end].to_string());
        start = actual_end;
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_message_is_untouched() {
        assert_eq!(split_message("Room ID: 1", 2000), vec!["Room ID: 1"]);
    }

    #[test]
    fn test_split_prefers_newlines() {
        let text = "aaaa\nbbbb\ncccc";
        let chunks = split_message(text, 10);
        assert_eq!(chunks, vec!["aaaa\nbbbb\n", "cccc"]);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_split_counts_chars_not_bytes() {
        let text = "é".repeat(15);
        let chunks = split_message(&text, 10);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chars().count(), 10);
        assert_eq!(chunks.concat(), text);
    }
}
