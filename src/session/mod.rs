/// Session management module - Gateway

mod command;
mod history;

pub use command::{Command, Input};
pub use history::{merge, ConversationState};
