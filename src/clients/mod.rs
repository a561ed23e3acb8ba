pub mod renderer;
pub mod telegram;

pub use renderer::{HttpRenderClient, RenderClient, RenderError};
pub use telegram::{ChatTransport, TelegramClient, TransportError};
