//! Realtime presence and chat gateway for the Agora learning platform.
//!
//! Authenticated WebSocket connections are auto-subscribed to their identity
//! and cohort rooms, then issue join/leave, message, typing, and status
//! commands. The in-memory core lives in [`hub::Hub`]; the transport surface
//! (WebSocket endpoint plus a small HTTP API) lives in [`ui`].

pub mod auth;
pub mod hub;
pub mod notify;
pub mod protocol;
pub mod registry;
pub mod rooms;
pub mod ui;
