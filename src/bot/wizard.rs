//! Step wizard: prompt, aspect ratio, quality. Each inbound text, photo or
//! button press is interpreted against the chat's current session; anything
//! that does not fit the current step is dropped.

use tracing::debug;

use crate::bot::{Bot, ui};
use crate::clients::telegram::{CallbackQuery, InlineKeyboard, PhotoSize, User};
use crate::models::{GenerationMode, GenerationSettings, QuickRequest};
use crate::services::generation::GenerationRequest;
use crate::services::session::Session;

impl Bot {
    pub(super) async fn handle_text(&self, chat_id: i64, user: &User, text: &str) {
        let Some(session) = self.sessions.get(chat_id).await else {
            return;
        };

        match session {
            Session::AwaitingTextPrompt => {
                // Access can lapse between choosing the mode and sending the
                // prompt, so it is re-checked here.
                match self.entitlements.check_access(&user.id.to_string()).await {
                    Ok(verdict) if verdict.allows() => {}
                    Ok(verdict) => {
                        self.sessions.remove(chat_id).await;
                        self.say(chat_id, &verdict.message()).await;
                        return;
                    }
                    Err(err) => {
                        self.say(chat_id, &format!("Error: {err}")).await;
                        return;
                    }
                }

                if let Some(request) = QuickRequest::parse(text) {
                    self.say(chat_id, "JSON request accepted. Starting...").await;
                    self.start_generation(
                        chat_id,
                        user,
                        GenerationMode::TextToVideo,
                        request.into_settings(),
                        None,
                    )
                    .await;
                    return;
                }

                self.sessions
                    .set(
                        chat_id,
                        Session::AwaitingTextRatio {
                            prompt: text.to_string(),
                        },
                    )
                    .await;
                self.send_ratio_menu(chat_id, GenerationMode::TextToVideo).await;
            }
            Session::AwaitingImagePrompt { photo } => {
                if let Some(request) = QuickRequest::parse(text) {
                    self.say(chat_id, "JSON request accepted. Starting...").await;
                    self.start_generation(
                        chat_id,
                        user,
                        GenerationMode::ImageToVideo,
                        request.into_settings(),
                        Some(photo),
                    )
                    .await;
                    return;
                }

                self.sessions
                    .set(
                        chat_id,
                        Session::AwaitingImageRatio {
                            prompt: text.to_string(),
                            photo,
                        },
                    )
                    .await;
                self.send_ratio_menu(chat_id, GenerationMode::ImageToVideo).await;
            }
            // Ratio and quality are button steps; stray text there is noise.
            _ => {}
        }
    }

    pub(super) async fn handle_photo(&self, chat_id: i64, user: &User, photos: &[PhotoSize]) {
        match self.entitlements.check_access(&user.id.to_string()).await {
            Ok(verdict) if verdict.allows() => {}
            Ok(verdict) => {
                self.say(chat_id, &verdict.message()).await;
                return;
            }
            Err(err) => {
                self.say(chat_id, &format!("Error: {err}")).await;
                return;
            }
        }

        if self.sessions.get(chat_id).await != Some(Session::AwaitingPhoto) {
            return;
        }

        // The size ladder is ordered ascending; take the full resolution one.
        let Some(photo) = photos.last() else {
            return;
        };

        self.sessions
            .set(
                chat_id,
                Session::AwaitingImagePrompt {
                    photo: photo.file_id.clone(),
                },
            )
            .await;
        self.say(chat_id, &format!("Photo received.\n{}", ui::SEND_PROMPT))
            .await;
    }

    pub(super) async fn handle_callback(&self, query: CallbackQuery) {
        let Some(message) = query.message else {
            return;
        };
        let chat_id = message.chat.id;
        let message_id = message.message_id;
        let Some(data) = query.data else {
            return;
        };

        if self.in_maintenance() && !self.is_admin(query.from.id) {
            if let Err(err) = self
                .transport
                .answer_callback(&query.id, Some(ui::MAINTENANCE))
                .await
            {
                debug!(chat_id, error = %err, "maintenance callback ack failed");
            }
            return;
        }

        // Ack immediately so the client stops its spinner; the real response
        // follows as message edits.
        if let Err(err) = self.transport.answer_callback(&query.id, None).await {
            debug!(chat_id, error = %err, "callback ack failed");
        }

        match data.as_str() {
            "cancel_process" => {
                self.sessions.remove(chat_id).await;
                self.edit(chat_id, message_id, ui::CANCELLED).await;
                return;
            }
            "mode_t2v" => {
                if self.admit(chat_id, &query.from).await {
                    self.sessions.set(chat_id, Session::AwaitingTextPrompt).await;
                    self.edit(
                        chat_id,
                        message_id,
                        &format!("Mode: Text to Video\n{}", ui::SEND_PROMPT),
                    )
                    .await;
                }
                return;
            }
            "mode_i2v" => {
                if self.admit(chat_id, &query.from).await {
                    self.sessions.set(chat_id, Session::AwaitingPhoto).await;
                    self.edit(
                        chat_id,
                        message_id,
                        &format!("Mode: Image to Video\n{}", ui::SEND_PHOTO),
                    )
                    .await;
                }
                return;
            }
            _ => {}
        }

        let Some(session) = self.sessions.get(chat_id).await else {
            return;
        };

        match (session, data.as_str()) {
            (Session::AwaitingTextRatio { prompt }, data)
                if data.starts_with("ratio_t2v_") =>
            {
                let aspect_ratio = data["ratio_t2v_".len()..].to_string();
                self.advance_to_quality(
                    chat_id,
                    message_id,
                    GenerationMode::TextToVideo,
                    Session::AwaitingTextQuality {
                        prompt,
                        aspect_ratio: aspect_ratio.clone(),
                    },
                    &aspect_ratio,
                )
                .await;
            }
            (Session::AwaitingImageRatio { prompt, photo }, data)
                if data.starts_with("ratio_i2v_") =>
            {
                let aspect_ratio = data["ratio_i2v_".len()..].to_string();
                self.advance_to_quality(
                    chat_id,
                    message_id,
                    GenerationMode::ImageToVideo,
                    Session::AwaitingImageQuality {
                        prompt,
                        aspect_ratio: aspect_ratio.clone(),
                        photo,
                    },
                    &aspect_ratio,
                )
                .await;
            }
            (Session::AwaitingTextQuality { prompt, aspect_ratio }, data)
                if data.starts_with("quality_t2v_") =>
            {
                let quality = data["quality_t2v_".len()..].to_string();
                self.sessions.remove(chat_id).await;
                self.edit_with_keyboard(
                    chat_id,
                    message_id,
                    "Processing text-to-video request...",
                    &InlineKeyboard::none(),
                )
                .await;
                self.start_generation(
                    chat_id,
                    &query.from,
                    GenerationMode::TextToVideo,
                    GenerationSettings::from_wizard(prompt, aspect_ratio, quality),
                    None,
                )
                .await;
            }
            (
                Session::AwaitingImageQuality {
                    prompt,
                    aspect_ratio,
                    photo,
                },
                data,
            ) if data.starts_with("quality_i2v_") => {
                let quality = data["quality_i2v_".len()..].to_string();
                self.sessions.remove(chat_id).await;
                self.edit_with_keyboard(
                    chat_id,
                    message_id,
                    "Processing image-to-video request...",
                    &InlineKeyboard::none(),
                )
                .await;
                self.start_generation(
                    chat_id,
                    &query.from,
                    GenerationMode::ImageToVideo,
                    GenerationSettings::from_wizard(prompt, aspect_ratio, quality),
                    Some(photo),
                )
                .await;
            }
            // Stale button from an earlier step.
            _ => {}
        }
    }

    /// Access gate for mode selection; replies with the rejection reason.
    async fn admit(&self, chat_id: i64, user: &User) -> bool {
        match self.entitlements.check_access(&user.id.to_string()).await {
            Ok(verdict) if verdict.allows() => true,
            Ok(verdict) => {
                self.say(chat_id, &verdict.message()).await;
                false
            }
            Err(err) => {
                self.say(chat_id, &format!("Error: {err}")).await;
                false
            }
        }
    }

    async fn send_ratio_menu(&self, chat_id: i64, mode: GenerationMode) {
        if let Err(err) = self
            .transport
            .send_message_with_keyboard(
                chat_id,
                &format!("Prompt received. {}", ui::CHOOSE_RATIO),
                &ui::ratio_keyboard(mode),
            )
            .await
        {
            debug!(chat_id, error = %err, "ratio menu failed");
        }
    }

    async fn advance_to_quality(
        &self,
        chat_id: i64,
        message_id: i64,
        mode: GenerationMode,
        next: Session,
        aspect_ratio: &str,
    ) {
        self.sessions.set(chat_id, next).await;
        self.edit_with_keyboard(
            chat_id,
            message_id,
            &format!("Ratio {aspect_ratio}. {}", ui::CHOOSE_QUALITY),
            &ui::quality_keyboard(mode),
        )
        .await;
    }

    async fn start_generation(
        &self,
        chat_id: i64,
        user: &User,
        mode: GenerationMode,
        settings: GenerationSettings,
        photo_file_id: Option<String>,
    ) {
        self.sessions.remove(chat_id).await;
        self.generator
            .run(GenerationRequest {
                chat_id,
                user_id: user.id.to_string(),
                mode,
                settings,
                photo_file_id,
            })
            .await;
    }

    async fn edit(&self, chat_id: i64, message_id: i64, text: &str) {
        if let Err(err) = self.transport.edit_message(chat_id, message_id, text).await {
            debug!(chat_id, message_id, error = %err, "message edit failed");
        }
    }

    async fn edit_with_keyboard(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        keyboard: &InlineKeyboard,
    ) {
        if let Err(err) = self
            .transport
            .edit_message_with_keyboard(chat_id, message_id, text, keyboard)
            .await
        {
            debug!(chat_id, message_id, error = %err, "message edit failed");
        }
    }
}
