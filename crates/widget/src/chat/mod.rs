mod controller;
mod message;

pub use controller::{ChatController, ChatOptions, ChatPhase, SubmitPolicy};
pub use message::{ChatTranscript, Message, MessageId, Origin, RenderMode};
