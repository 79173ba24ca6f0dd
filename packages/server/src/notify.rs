//! Push interface other platform subsystems use to reach connected clients.
//!
//! Course, cohort, and admin services depend on this trait rather than on
//! the gateway internals; [`crate::hub::Hub`] is the live implementation.

use async_trait::async_trait;
use serde_json::Value;

/// Out-of-band notification push into the realtime layer.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Push a `notification` event to the user's private room.
    async fn notify_user(&self, user_id: &str, payload: Value);

    /// Push a `notification` event to every member of the cohort room.
    async fn notify_cohort(&self, cohort_id: &str, payload: Value);
}
