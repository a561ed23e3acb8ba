//! Chat front end: long-poll dispatch loop, command handlers and the step
//! wizard that assembles a generation request.

mod commands;
pub mod ui;
mod wizard;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::clients::telegram::{ChatTransport, Update};
use crate::services::{EntitlementService, GenerationService, SessionStore};

pub struct Bot {
    transport: Arc<dyn ChatTransport>,
    entitlements: Arc<dyn EntitlementService>,
    sessions: Arc<dyn SessionStore>,
    generator: Arc<GenerationService>,
    admin_user_id: String,
    maintenance: AtomicBool,
    poll_timeout_secs: u64,
}

impl Bot {
    #[must_use]
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        entitlements: Arc<dyn EntitlementService>,
        sessions: Arc<dyn SessionStore>,
        generator: Arc<GenerationService>,
        admin_user_id: String,
        poll_timeout_secs: u64,
    ) -> Self {
        Self {
            transport,
            entitlements,
            sessions,
            generator,
            admin_user_id,
            maintenance: AtomicBool::new(false),
            poll_timeout_secs,
        }
    }

    fn is_admin(&self, user_id: i64) -> bool {
        user_id.to_string() == self.admin_user_id
    }

    fn in_maintenance(&self) -> bool {
        self.maintenance.load(Ordering::Relaxed)
    }

    pub(crate) fn set_maintenance(&self, on: bool) {
        self.maintenance.store(on, Ordering::Relaxed);
    }

    /// Sends a plain message, logging delivery failures instead of surfacing
    /// them; chat replies are never worth crashing a handler over.
    pub(crate) async fn say(&self, chat_id: i64, text: &str) {
        if let Err(err) = self.transport.send_message(chat_id, text).await {
            warn!(chat_id, error = %err, "reply failed");
        }
    }

    pub(crate) async fn show_mode_menu(&self, chat_id: i64) {
        if let Err(err) = self
            .transport
            .send_message_with_keyboard(chat_id, ui::CHOOSE_MODE, &ui::mode_keyboard())
            .await
        {
            warn!(chat_id, error = %err, "mode menu failed");
        }
    }

    /// Long-poll loop. Each update is handled on its own task so a running
    /// generation never blocks the next user.
    pub async fn run(self: Arc<Self>) -> Result<()> {
        self.transport
            .set_commands(&ui::command_menu())
            .await
            .context("Failed to register the command menu")?;

        info!("bot started, polling for updates");

        let mut offset = 0i64;
        loop {
            let updates = match self
                .transport
                .get_updates(offset, self.poll_timeout_secs)
                .await
            {
                Ok(updates) => updates,
                Err(err) => {
                    error!(error = %err, "update poll failed, backing off");
                    tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                    continue;
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);
                let bot = Arc::clone(&self);
                tokio::spawn(async move {
                    bot.handle_update(update).await;
                });
            }
        }
    }

    /// Routes one inbound update to the right handler.
    pub async fn handle_update(&self, update: Update) {
        if let Some(callback) = update.callback_query {
            self.handle_callback(callback).await;
            return;
        }

        let Some(message) = update.message else {
            return;
        };
        let Some(user) = message.from.clone() else {
            return;
        };

        if self.in_maintenance() && !self.is_admin(user.id) {
            // Commands get the notice; anything else is dropped silently.
            if message.text.as_deref().is_some_and(|t| t.starts_with('/')) {
                self.say(message.chat.id, ui::MAINTENANCE).await;
            }
            return;
        }

        if let Some(text) = message.text {
            if text.starts_with('/') {
                self.handle_command(message.chat.id, &user, &text).await;
            } else {
                self.handle_text(message.chat.id, &user, &text).await;
            }
        } else if let Some(photos) = message.photo {
            self.handle_photo(message.chat.id, &user, &photos).await;
        }
    }
}
