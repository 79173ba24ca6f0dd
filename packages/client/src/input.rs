//! Input-line parsing for the interactive prompt.
//!
//! Pure functions, no side effects. Plain text goes to the current chat
//! room; slash-commands drive room membership, presence, and typing.

use agora_server::protocol::PresenceStatus;

/// What a line of user input asks the session to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// Join a chat room (and make it the current room)
    Join(String),
    /// Leave a chat room
    Leave(String),
    /// Switch the current room without joining or leaving anything
    Room(String),
    /// Update own presence
    Status(PresenceStatus),
    /// Start or stop the typing indicator for the current room
    Typing { room: String, started: bool },
    /// Send a chat message to the current room
    Message { room: String, text: String },
    Help,
    /// The line could not be interpreted; contains a message for the user
    Invalid(String),
}

/// Parse one line of input against the current room, if any.
pub fn parse_input(line: &str, current_room: Option<&str>) -> Input {
    let line = line.trim();

    if let Some(rest) = line.strip_prefix('/') {
        let mut parts = rest.splitn(2, ' ');
        let command = parts.next().unwrap_or_default();
        let arg = parts.next().map(str::trim).unwrap_or_default();

        return match command {
            "join" if !arg.is_empty() => Input::Join(arg.to_string()),
            "join" => Input::Invalid("usage: /join <room>".to_string()),
            "leave" if !arg.is_empty() => Input::Leave(arg.to_string()),
            "leave" => Input::Invalid("usage: /leave <room>".to_string()),
            "room" if !arg.is_empty() => Input::Room(arg.to_string()),
            "room" => Input::Invalid("usage: /room <room>".to_string()),
            "status" => match parse_status(arg) {
                Some(status) => Input::Status(status),
                None => Input::Invalid("usage: /status <online|away|busy>".to_string()),
            },
            "typing" => match (arg, current_room) {
                (_, None) => Input::Invalid("no current room; /join a room first".to_string()),
                ("start", Some(room)) => Input::Typing {
                    room: room.to_string(),
                    started: true,
                },
                ("stop", Some(room)) => Input::Typing {
                    room: room.to_string(),
                    started: false,
                },
                _ => Input::Invalid("usage: /typing <start|stop>".to_string()),
            },
            "help" => Input::Help,
            other => Input::Invalid(format!("unknown command '/{}'; try /help", other)),
        };
    }

    match current_room {
        Some(room) => Input::Message {
            room: room.to_string(),
            text: line.to_string(),
        },
        None => Input::Invalid("no current room; /join a room first".to_string()),
    }
}

fn parse_status(arg: &str) -> Option<PresenceStatus> {
    match arg {
        "online" => Some(PresenceStatus::Online),
        "away" => Some(PresenceStatus::Away),
        "busy" => Some(PresenceStatus::Busy),
        _ => None,
    }
}

/// Help text printed for `/help` and on startup.
pub const HELP_TEXT: &str = "\
Commands:
  /join <room>            join a chat room and make it current
  /leave <room>           leave a chat room
  /room <room>            switch the current room
  /status <online|away|busy>  update your presence
  /typing <start|stop>    toggle the typing indicator for the current room
  /help                   show this help
Anything else is sent as a message to the current room.
";
