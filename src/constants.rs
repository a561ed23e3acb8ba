pub mod limits {

    /// Delivery ceiling for finished artifacts, in megabytes.
    pub const MAX_VIDEO_MB: u64 = 50;

    /// Prompt text cap inside the delivery caption.
    pub const CAPTION_PROMPT_CHARS: usize = 900;

    /// Chat transport hard cap on outgoing message length.
    pub const MESSAGE_CHARS: usize = 4096;
}

pub mod trial {

    /// Free generations granted at first registration.
    pub const INITIAL_CREDITS: i32 = 5;
}

pub mod license {

    /// Expiry written by the admin block action; guaranteed to be in the past.
    pub const BLOCKED_SENTINEL: &str = "2000-01-01";

    /// Display name written by the admin block action.
    pub const BLOCKED_DISPLAY_NAME: &str = "blocked_user";
}

pub mod video {

    pub const DEFAULT_QUALITY: &str = "720p";

    pub const QUALITY_CHOICES: &[&str] = &["720p", "1080p"];

    pub const RATIO_CHOICES: &[&str] = &["16:9", "9:16"];
}
