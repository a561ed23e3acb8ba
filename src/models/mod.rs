pub mod settings;

pub use settings::{GenerationMode, GenerationSettings, QuickRequest};
