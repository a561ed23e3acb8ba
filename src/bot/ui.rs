//! Canned texts, inline keyboards and callback data for the chat surface.
//!
//! Callback data encodes the wizard step and the pipeline it belongs to, e.g.
//! `ratio_t2v_16:9`, so a stale button press from an earlier step can be told
//! apart from the current one and ignored.

use crate::clients::telegram::{BotCommand, InlineButton, InlineKeyboard};
use crate::constants::{limits, video};
use crate::models::GenerationMode;

pub const WELCOME: &str = "Welcome! I turn text prompts and photos into short AI videos.\n\n\
    Send /create to start a generation, or paste a JSON request with \
    \"prompt\" and \"aspectRatio\" to skip the wizard.";

pub const CHOOSE_MODE: &str = "What would you like to create?";
pub const SEND_PHOTO: &str = "Send the photo you want to animate.";
pub const SEND_PROMPT: &str = "Describe the video you want. Plain text starts the wizard; \
    a JSON payload with \"prompt\" and \"aspectRatio\" skips it.";
pub const CHOOSE_RATIO: &str = "Choose an aspect ratio:";
pub const CHOOSE_QUALITY: &str = "Choose the quality:";
pub const CANCELLED: &str = "Cancelled.";
pub const NOTHING_TO_CANCEL: &str = "Nothing to cancel.";
pub const MAINTENANCE: &str = "The bot is under maintenance. Please try again later.";
pub const TOPUP_PLACEHOLDER: &str =
    "Top-ups are handled manually for now. Contact the operator to extend your access.";
pub const PROMPTS_PLACEHOLDER: &str =
    "A curated prompt library is coming soon. Until then, describe the scene, the motion \
     and the camera style in one or two sentences.";

/// Short key used inside callback data.
#[must_use]
pub const fn mode_key(mode: GenerationMode) -> &'static str {
    match mode {
        GenerationMode::TextToVideo => "t2v",
        GenerationMode::ImageToVideo => "i2v",
    }
}

#[must_use]
pub fn mode_keyboard() -> InlineKeyboard {
    InlineKeyboard::new(vec![
        vec![InlineButton::new("Text to Video", "mode_t2v")],
        vec![InlineButton::new("Image to Video", "mode_i2v")],
    ])
}

#[must_use]
pub fn ratio_keyboard(mode: GenerationMode) -> InlineKeyboard {
    let key = mode_key(mode);
    let choices = video::RATIO_CHOICES
        .iter()
        .map(|ratio| InlineButton::new(ratio, &format!("ratio_{key}_{ratio}")))
        .collect();
    InlineKeyboard::new(vec![choices, vec![cancel_button()]])
}

#[must_use]
pub fn quality_keyboard(mode: GenerationMode) -> InlineKeyboard {
    let key = mode_key(mode);
    let choices = video::QUALITY_CHOICES
        .iter()
        .map(|quality| InlineButton::new(quality, &format!("quality_{key}_{quality}")))
        .collect();
    InlineKeyboard::new(vec![choices, vec![cancel_button()]])
}

fn cancel_button() -> InlineButton {
    InlineButton::new("Cancel", "cancel_process")
}

/// Commands advertised in the chat client's menu.
#[must_use]
pub fn command_menu() -> Vec<BotCommand> {
    [
        ("start", "Register and show your access status"),
        ("create", "Start a new video generation"),
        ("topup", "Extend your access"),
        ("prompts", "Prompt ideas"),
        ("cancel", "Abort the current generation setup"),
    ]
    .into_iter()
    .map(|(command, description)| BotCommand {
        command: command.to_string(),
        description: description.to_string(),
    })
    .collect()
}

/// Truncates on a character boundary, never mid code point.
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    text.chars().take(max_chars).collect()
}

/// Delivery caption; the prompt portion is capped so the caption stays inside
/// the platform limit.
#[must_use]
pub fn delivery_caption(mode: GenerationMode, quality: &str, prompt: &str) -> String {
    format!(
        "Done ({mode} - {quality})!\nPrompt: \"{}\"",
        truncate_chars(prompt, limits::CAPTION_PROMPT_CHARS)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_keyboard_encodes_mode_and_choice() {
        let keyboard = ratio_keyboard(GenerationMode::TextToVideo);
        let data: Vec<&str> = keyboard
            .inline_keyboard
            .iter()
            .flatten()
            .map(|b| b.callback_data.as_str())
            .collect();
        assert_eq!(data, vec!["ratio_t2v_16:9", "ratio_t2v_9:16", "cancel_process"]);
    }

    #[test]
    fn quality_keyboard_ends_with_cancel() {
        let keyboard = quality_keyboard(GenerationMode::ImageToVideo);
        let last = keyboard.inline_keyboard.last().unwrap();
        assert_eq!(last[0].callback_data, "cancel_process");
        assert_eq!(
            keyboard.inline_keyboard[0][1].callback_data,
            "quality_i2v_1080p"
        );
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 900), "short");
    }

    #[test]
    fn caption_caps_long_prompts() {
        let prompt = "x".repeat(1000);
        let caption = delivery_caption(GenerationMode::TextToVideo, "720p", &prompt);
        assert!(caption.starts_with("Done (T2V - 720p)!"));
        assert!(caption.chars().count() < 950);
    }
}
