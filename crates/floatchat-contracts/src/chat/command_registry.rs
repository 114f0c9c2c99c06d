#[derive(Clone, Copy, Debug)]
pub(crate) struct CommandSpec {
    pub command: &'static str,
    pub action: &'static str,
}

/// Commands whose argument is taken verbatim.
pub(crate) const RAW_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "model",
        action: "set_model",
    },
    CommandSpec {
        command: "format",
        action: "set_format",
    },
];

pub(crate) const PATH_ARG_COMMANDS: &[CommandSpec] = &[CommandSpec {
    command: "save",
    action: "set_output_dir",
}];

pub(crate) const NO_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "help",
        action: "help",
    },
    CommandSpec {
        command: "quit",
        action: "quit",
    },
    CommandSpec {
        command: "exit",
        action: "quit",
    },
];

pub const CHAT_HELP_COMMANDS: &[(&str, &str)] = &[
    ("/help", "show this list"),
    ("/model [NAME]", "switch the chat model, or list models"),
    ("/format png|svg", "choose the chart encoding"),
    ("/save DIR", "write each chart or map into DIR"),
    ("/quit", "leave the session"),
];
