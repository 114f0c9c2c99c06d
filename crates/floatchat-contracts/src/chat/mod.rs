pub mod command_registry;
pub mod input_parser;

pub use command_registry::CHAT_HELP_COMMANDS;
pub use input_parser::{parse_input, ChatInput};
