//! Slash command handlers, user-facing and admin-facing.

use tracing::{info, warn};

use crate::bot::{Bot, ui};
use crate::clients::telegram::User;
use crate::constants::limits;
use crate::services::EntitlementError;

impl Bot {
    pub(super) async fn handle_command(&self, chat_id: i64, user: &User, text: &str) {
        let mut parts = text.split_whitespace();
        let Some(command) = parts.next() else {
            return;
        };
        // "/create@SomeBot" in group chats.
        let command = command.split('@').next().unwrap_or(command);
        let args: Vec<&str> = parts.collect();

        match command {
            "/start" => self.cmd_start(chat_id, user).await,
            "/create" => self.cmd_create(chat_id, user).await,
            "/cancel" => self.cmd_cancel(chat_id).await,
            "/topup" => self.say(chat_id, ui::TOPUP_PLACEHOLDER).await,
            "/prompts" => self.say(chat_id, ui::PROMPTS_PLACEHOLDER).await,
            "/license" if self.is_admin(user.id) => self.cmd_license(chat_id, &args).await,
            "/block" if self.is_admin(user.id) => self.cmd_block(chat_id, &args).await,
            "/remove" if self.is_admin(user.id) => self.cmd_remove(chat_id, &args).await,
            "/listusers" if self.is_admin(user.id) => self.cmd_list_users(chat_id).await,
            "/mt" if self.is_admin(user.id) => self.cmd_maintenance(chat_id, &args).await,
            _ => {}
        }
    }

    async fn cmd_start(&self, chat_id: i64, user: &User) {
        let user_id = user.id.to_string();
        let display_name = user.first_name.as_deref().unwrap_or("User");
        info!(user_id = %user_id, display_name, "received /start");

        self.sessions.remove(chat_id).await;

        match self.entitlements.register_trial(&user_id, display_name).await {
            Ok(true) => info!(user_id = %user_id, "new trial user registered"),
            Ok(false) => {}
            Err(err) => warn!(user_id = %user_id, error = %err, "trial registration failed"),
        }

        self.say(chat_id, ui::WELCOME).await;

        match self.entitlements.check_access(&user_id).await {
            Ok(verdict) => {
                self.say(chat_id, &format!("Account status:\n{}", verdict.message()))
                    .await;
                if verdict.allows() {
                    self.show_mode_menu(chat_id).await;
                }
            }
            Err(err) => self.report_error(chat_id, &err).await,
        }
    }

    async fn cmd_create(&self, chat_id: i64, user: &User) {
        match self.entitlements.check_access(&user.id.to_string()).await {
            Ok(verdict) if verdict.allows() => self.show_mode_menu(chat_id).await,
            Ok(verdict) => self.say(chat_id, &verdict.message()).await,
            Err(err) => self.report_error(chat_id, &err).await,
        }
    }

    async fn cmd_cancel(&self, chat_id: i64) {
        if self.sessions.remove(chat_id).await {
            self.say(chat_id, ui::CANCELLED).await;
        } else {
            self.say(chat_id, ui::NOTHING_TO_CANCEL).await;
        }
    }

    async fn cmd_license(&self, chat_id: i64, args: &[&str]) {
        let &[user_id, expiration] = args else {
            self.say(chat_id, "Usage: /license <user_id> <YYYY-MM-DD>").await;
            return;
        };

        let display_name = format!("user_{user_id}");
        match self
            .entitlements
            .grant_license(user_id, &display_name, expiration)
            .await
        {
            Ok(confirmation) => self.say(chat_id, &confirmation).await,
            Err(err) => self.report_error(chat_id, &err).await,
        }
    }

    async fn cmd_block(&self, chat_id: i64, args: &[&str]) {
        let &[user_id] = args else {
            self.say(chat_id, "Usage: /block <user_id>").await;
            return;
        };

        match self.entitlements.block(user_id).await {
            Ok(()) => self.say(chat_id, &format!("User {user_id} blocked.")).await,
            Err(err) => self.report_error(chat_id, &err).await,
        }
    }

    async fn cmd_remove(&self, chat_id: i64, args: &[&str]) {
        let &[user_id] = args else {
            self.say(chat_id, "Usage: /remove <user_id>").await;
            return;
        };

        match self.entitlements.delete(user_id).await {
            Ok(true) => self.say(chat_id, &format!("User {user_id} removed.")).await,
            Ok(false) => self.say(chat_id, &format!("User {user_id} not found.")).await,
            Err(err) => self.report_error(chat_id, &err).await,
        }
    }

    async fn cmd_list_users(&self, chat_id: i64) {
        match self.entitlements.list_active().await {
            Ok(users) if users.is_empty() => self.say(chat_id, "No active users.").await,
            Ok(users) => {
                let mut message = format!("Active users ({}):\n\n", users.len());
                for user in &users {
                    message.push_str(&format!(
                        "ID: {}\nExp: {}\nCredits: {}\n\n",
                        user.user_id,
                        user.expiration_date.as_deref().unwrap_or("-"),
                        user.credits
                    ));
                }
                self.say(chat_id, &ui::truncate_chars(&message, limits::MESSAGE_CHARS))
                    .await;
            }
            Err(err) => self.report_error(chat_id, &err).await,
        }
    }

    async fn cmd_maintenance(&self, chat_id: i64, args: &[&str]) {
        match args.first().map(|a| a.to_lowercase()).as_deref() {
            Some("on") => {
                self.set_maintenance(true);
                self.say(chat_id, "Maintenance mode ON").await;
            }
            Some("off") => {
                self.set_maintenance(false);
                self.say(chat_id, "Maintenance mode OFF").await;
            }
            _ => self.say(chat_id, "Usage: /mt <on|off>").await,
        }
    }

    async fn report_error(&self, chat_id: i64, err: &EntitlementError) {
        self.say(chat_id, &format!("Error: {err}")).await;
    }
}
