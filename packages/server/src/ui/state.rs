//! Shared application state.

use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::hub::Hub;
use crate::notify::Notifier;

/// State handed to every handler. The hub is the single owner of all
/// connection and room tables; the notifier is the hub again, behind the
/// trait other subsystems depend on.
pub struct AppState {
    pub hub: Arc<Hub>,
    pub verifier: TokenVerifier,
    pub notifier: Arc<dyn Notifier>,
}
