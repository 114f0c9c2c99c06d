use std::collections::BTreeMap;

use serde_json::Value;

use super::command_registry::{CommandSpec, NO_ARG_COMMANDS, PATH_ARG_COMMANDS, RAW_ARG_COMMANDS};

/// One line typed into the interactive session.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatInput {
    pub action: String,
    pub raw: String,
    /// The question to send, set only for the `message` action.
    pub message: Option<String>,
    pub command_args: BTreeMap<String, Value>,
}

impl ChatInput {
    fn new(action: &str, raw: &str) -> Self {
        Self {
            action: action.to_string(),
            raw: raw.to_string(),
            message: None,
            command_args: BTreeMap::new(),
        }
    }

    pub fn arg(&self, key: &str) -> Option<&str> {
        self.command_args.get(key).and_then(Value::as_str)
    }
}

fn find_action(command: &str, specs: &[CommandSpec]) -> Option<&'static str> {
    specs
        .iter()
        .find(|spec| spec.command == command)
        .map(|spec| spec.action)
}

fn parse_path_arg(arg: &str) -> String {
    if arg.trim().is_empty() {
        return String::new();
    }
    match shell_words::split(arg) {
        Ok(parts) => parts
            .into_iter()
            .filter(|value| !value.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
        Err(_) => arg.trim().to_string(),
    }
}

pub fn parse_input(text: &str) -> ChatInput {
    let raw_trimmed = text.trim();
    if raw_trimmed.is_empty() {
        return ChatInput::new("noop", text);
    }

    if let Some(slash_tail) = raw_trimmed.strip_prefix('/') {
        let command_len = slash_tail
            .chars()
            .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
            .count();
        if command_len > 0 {
            let command = slash_tail[..command_len].to_ascii_lowercase();
            let arg = slash_tail[command_len..].trim();

            if let Some(action) = find_action(&command, RAW_ARG_COMMANDS) {
                let mut input = ChatInput::new(action, text);
                input
                    .command_args
                    .insert(command, Value::String(arg.to_string()));
                return input;
            }

            if let Some(action) = find_action(&command, PATH_ARG_COMMANDS) {
                let mut input = ChatInput::new(action, text);
                input
                    .command_args
                    .insert("path".to_string(), Value::String(parse_path_arg(arg)));
                return input;
            }

            if let Some(action) = find_action(&command, NO_ARG_COMMANDS) {
                return ChatInput::new(action, text);
            }

            let mut input = ChatInput::new("unknown", text);
            input
                .command_args
                .insert("command".to_string(), Value::String(command));
            input
                .command_args
                .insert("arg".to_string(), Value::String(arg.to_string()));
            return input;
        }
    }

    let mut input = ChatInput::new("message", text);
    input.message = Some(raw_trimmed.to_string());
    input
}
