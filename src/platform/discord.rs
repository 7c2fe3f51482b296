use std::sync::Arc;

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use serenity::all::{
    ChannelId, Client, Context, EventHandler, GatewayIntents, GuildId, Message, Ready, UserId,
};
use tracing::{error, info, trace};

use crate::bot::Relay;
use crate::platform::{split_message, Attachment, ChatPlatform, IncomingMessage};

/// Discord rejects messages longer than this many characters.
const MAX_MESSAGE_LEN: usize = 2000;

/// [`ChatPlatform`] backed by the serenity context of the current event.
pub struct DiscordPlatform {
    ctx: Context,
}

impl DiscordPlatform {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ChatPlatform for DiscordPlatform {
    async fn member_roles(&self, guild_id: Option<u64>, user_id: u64) -> Result<Vec<u64>> {
        let guild_id = guild_id.context("Message was not sent in a guild")?;
        let member = GuildId::new(guild_id)
            .member(&self.ctx, UserId::new(user_id))
            .await
            .with_context(|| format!("Failed to resolve member {} in guild {}", user_id, guild_id))?;
        Ok(member.roles.iter().map(|role| role.get()).collect())
    }

    async fn resolve_channel(&self, channel_id: u64) -> Result<()> {
        ChannelId::new(channel_id)
            .to_channel(&self.ctx)
            .await
            .with_context(|| format!("Failed to resolve channel {}", channel_id))?;
        Ok(())
    }

    async fn send_message(&self, channel_id: u64, text: &str) -> Result<()> {
        let channel = ChannelId::new(channel_id);
        for chunk in split_message(text, MAX_MESSAGE_LEN) {
            channel
                .say(&self.ctx.http, chunk)
                .await
                .with_context(|| format!("Failed to send message to channel {}", channel_id))?;
        }
        Ok(())
    }
}

fn to_incoming(msg: &Message) -> IncomingMessage {
    IncomingMessage {
        author_id: msg.author.id.get(),
        author_is_bot: msg.author.bot,
        guild_id: msg.guild_id.map(|g| g.get()),
        channel_id: msg.channel_id.get(),
        content: msg.content.clone(),
        attachments: msg
            .attachments
            .iter()
            .map(|a| Attachment {
                url: a.url.clone(),
                filename: a.filename.clone(),
            })
            .collect(),
    }
}

struct Handler {
    relay: Arc<Relay>,
}

#[serenity::async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("Bot logged in as {}", ready.user.name);
    }

    async fn message(&self, ctx: Context, msg: Message) {
        // Skip bot messages before any conversion work
        if msg.author.bot {
            trace!("Ignoring bot message {}", msg.id);
            return;
        }

        let incoming = to_incoming(&msg);
        let platform = DiscordPlatform::new(ctx);
        if let Err(e) = self.relay.handle_message(&platform, &incoming).await {
            error!("Error handling message {}: {:#}", msg.id, e);
        }
    }
}

/// Required gateway intents for the bot.
pub fn intents() -> GatewayIntents {
    GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT
}

/// Connect to the Discord gateway and process events until the client stops.
pub async fn run(relay: Arc<Relay>) -> Result<()> {
    let token = relay.config().discord.bot_token.clone();

    info!("Starting Discord client...");

    let mut client = Client::builder(&token, intents())
        .event_handler(Handler { relay })
        .await
        .context("Failed to create Discord client")?;

    client.start().await.context("Discord client error")?;

    Ok(())
}
