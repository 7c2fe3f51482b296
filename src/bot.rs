use anyhow::Result;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::extractor::Extractor;
use crate::platform::{ChatPlatform, IncomingMessage};
use crate::router::{self, Delivery};

const ROLE_LOOKUP_FAILED: &str = "Error: Could not verify your roles.";
const ROLE_MISSING: &str = "Sorry, only members with the 'scrim_mod' role can submit IDPs.";
const OUTPUT_CHANNEL_MISSING: &str = "Error: Could not find the output channel.";

/// Watches the submission channels and relays extracted room details.
///
/// Holds only read-only state, so one instance is shared by every event task.
pub struct Relay {
    config: Config,
    extractor: Extractor,
}

impl Relay {
    pub fn new(config: Config) -> Self {
        let extractor = Extractor::new(config.llm.clone());
        Self { config, extractor }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Handle one inbound message from start to finish.
    ///
    /// Errors are only returned when the platform fails to deliver a message.
    pub async fn handle_message(
        &self,
        platform: &dyn ChatPlatform,
        msg: &IncomingMessage,
    ) -> Result<()> {
        if msg.author_is_bot {
            return Ok(());
        }

        let Some((kind, route)) = self.config.route_for(msg.channel_id) else {
            return Ok(());
        };

        info!(
            "{} submission from user {} in channel {}",
            kind, msg.author_id, msg.channel_id
        );

        let roles = match platform.member_roles(msg.guild_id, msg.author_id).await {
            Ok(roles) => roles,
            Err(e) => {
                warn!("Could not resolve roles for user {}: {:#}", msg.author_id, e);
                return platform
                    .send_message(msg.channel_id, ROLE_LOOKUP_FAILED)
                    .await;
            }
        };

        if !roles.contains(&self.config.discord.authorized_role_id) {
            info!("Rejected submission from unauthorized user {}", msg.author_id);
            return platform.send_message(msg.channel_id, ROLE_MISSING).await;
        }

        if let Err(e) = platform.resolve_channel(route.post_channel_id).await {
            warn!("Output channel {} unavailable: {:#}", route.post_channel_id, e);
            return platform
                .send_message(msg.channel_id, OUTPUT_CHANNEL_MISSING)
                .await;
        }

        let output = match router::select_input(msg) {
            Some(input) => {
                let ack = router::acknowledgement(
                    kind,
                    &input,
                    self.extractor.llm().provider().display_name(),
                );
                platform.send_message(msg.channel_id, &ack).await?;

                let prompt = route
                    .prompt
                    .clone()
                    .unwrap_or_else(|| kind.default_prompt());
                Some(self.extractor.extract(&prompt, Some(&input)).await)
            }
            None => None,
        };

        match router::route(kind, route.post_channel_id, output.as_deref()) {
            Delivery::Announce { channel_id, text } => {
                info!("Posting {} room details to channel {}", kind, channel_id);
                platform.send_message(channel_id, &text).await
            }
            Delivery::Reply { text } => {
                debug!("Replying to user {}: {}", msg.author_id, text);
                platform.send_message(msg.channel_id, &text).await
            }
        }
    }
}
