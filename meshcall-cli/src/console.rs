/// One line typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Chat(String),
    Mute,
    Unmute,
    Video(bool),
    Peers,
    Leave,
    Help,
    Invalid(String),
    Empty,
}

pub const HELP: &str = "commands: /mute, /unmute, /video on|off, /peers, /leave, /help";

pub fn parse(line: &str) -> ConsoleCommand {
    let line = line.trim();
    if line.is_empty() {
        return ConsoleCommand::Empty;
    }
    let Some(command) = line.strip_prefix('/') else {
        return ConsoleCommand::Chat(line.to_owned());
    };

    let mut parts = command.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("mute"), None) => ConsoleCommand::Mute,
        (Some("unmute"), None) => ConsoleCommand::Unmute,
        (Some("video"), Some("on")) => ConsoleCommand::Video(true),
        (Some("video"), Some("off")) => ConsoleCommand::Video(false),
        (Some("peers"), None) => ConsoleCommand::Peers,
        (Some("leave" | "quit"), None) => ConsoleCommand::Leave,
        (Some("help"), None) => ConsoleCommand::Help,
        _ => ConsoleCommand::Invalid(line.to_owned()),
    }
}
