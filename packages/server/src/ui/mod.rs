//! Transport surface: the WebSocket endpoint and the HTTP API.

pub mod handler;
mod server;
mod signal;
pub mod state;

pub use server::{Server, app};
