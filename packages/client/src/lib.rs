//! CLI chat client for the Agora realtime gateway.
//!
//! Connects with a bearer token, joins chat rooms with slash-commands, and
//! renders incoming messages, typing indicators, presence changes, and
//! notifications.

pub mod error;
pub mod formatter;
pub mod input;
pub mod runner;
pub mod session;
pub mod ui;
