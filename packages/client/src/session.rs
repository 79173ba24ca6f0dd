//! WebSocket client session management.

use futures_util::{SinkExt, StreamExt};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite, tungstenite::protocol::Message};

use agora_server::protocol::{ClientEvent, SendMessage, ServerEvent};

use crate::error::ClientError;
use crate::formatter::MessageFormatter;
use crate::input::{HELP_TEXT, Input, parse_input};
use crate::ui::redisplay_prompt;

/// Run the WebSocket client session
pub async fn run_client_session(url: &str, token: &str) -> Result<(), Box<dyn std::error::Error>> {
    // Pass the bearer token with the handshake
    let url = format!("{}?token={}", url, token);

    let (ws_stream, _response) = match connect_async(&url).await {
        Ok(result) => result,
        Err(tungstenite::Error::Http(response))
            if response.status() == tungstenite::http::StatusCode::UNAUTHORIZED =>
        {
            return Err(Box::new(ClientError::AuthenticationRejected));
        }
        Err(e) => {
            return Err(Box::new(ClientError::ConnectionError(e.to_string())));
        }
    };

    tracing::info!("Connected to the Agora gateway!");
    println!("\nType /help for commands. Press Ctrl+C to exit.\n");

    let (mut write, mut read) = ws_stream.split();

    // Spawn a task to handle incoming events
    let mut read_task = tokio::spawn(async move {
        let mut connection_error = false;

        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    let formatted = match serde_json::from_str::<ServerEvent>(&text) {
                        Ok(event) => MessageFormatter::format_event(&event),
                        // Unknown frames are displayed raw rather than dropped
                        Err(_) => MessageFormatter::format_raw_message(&text),
                    };
                    print!("{}", formatted);
                    redisplay_prompt();
                }
                Ok(Message::Close(_)) => {
                    tracing::info!("Server closed the connection");
                    connection_error = true;
                    break;
                }
                Err(e) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    connection_error = true;
                    break;
                }
                _ => {}
            }
        }

        connection_error
    });

    // Create channel for rustyline input
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();

    // Spawn a blocking thread for rustyline (synchronous readline)
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline("agora> ") {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            // Channel closed, exit thread
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    // Spawn a task to turn input lines into protocol commands
    let mut write_task = tokio::spawn(async move {
        let mut write_error = false;
        let mut current_room: Option<String> = None;

        while let Some(line) = input_rx.recv().await {
            let event = match parse_input(&line, current_room.as_deref()) {
                Input::Join(room) => {
                    current_room = Some(room.clone());
                    ClientEvent::JoinChatRoom(room)
                }
                Input::Leave(room) => {
                    if current_room.as_deref() == Some(room.as_str()) {
                        current_room = None;
                    }
                    ClientEvent::LeaveChatRoom(room)
                }
                Input::Room(room) => {
                    println!("current room is now '{}'", room);
                    current_room = Some(room);
                    redisplay_prompt();
                    continue;
                }
                Input::Status(status) => ClientEvent::StatusUpdate(status),
                Input::Typing { room, started } => {
                    if started {
                        ClientEvent::TypingStart(room)
                    } else {
                        ClientEvent::TypingStop(room)
                    }
                }
                Input::Message { room, text } => ClientEvent::SendMessage(SendMessage {
                    chat_room_id: room,
                    message: text,
                    kind: "text".to_string(),
                }),
                Input::Help => {
                    print!("{}", HELP_TEXT);
                    redisplay_prompt();
                    continue;
                }
                Input::Invalid(reason) => {
                    println!("{}", reason);
                    redisplay_prompt();
                    continue;
                }
            };

            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("Failed to serialize command: {}", e);
                    continue;
                }
            };

            if let Err(e) = write.send(Message::Text(json.into())).await {
                tracing::warn!("Failed to send command: {}", e);
                write_error = true;
                break;
            }
        }

        write_error
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        read_result = &mut read_task => {
            write_task.abort();
            let connection_error = read_result.unwrap_or(false);
            if connection_error {
                return Err(Box::new(ClientError::ConnectionError(
                    "Connection lost".to_string(),
                )));
            }
        }
        write_result = &mut write_task => {
            read_task.abort();
            let write_error = write_result.unwrap_or(false);
            if write_error {
                return Err(Box::new(ClientError::ConnectionError(
                    "Connection lost".to_string(),
                )));
            }
        }
    }

    Ok(())
}
