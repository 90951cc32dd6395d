/// Runtime orchestrator module - Gateway

mod conversation;
mod io;
mod orchestrator;

pub use conversation::{reply_tokens, Conversation, TurnReply, TurnSettings};
pub use io::{
    Console, ConsoleInput, Emission, Heard, InputSource, OutputSink, VoiceInput, VoiceOutput,
};
pub use orchestrator::Orchestrator;
