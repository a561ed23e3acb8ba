pub mod events;

pub use events::{GenerationOutcome, ProgressEvent, ProgressSink};
