//! Desktop notifications for matching bulletins.

use notify_rust::{Notification, Timeout};

use crate::bulletin::Bulletin;

/// How long the notification stays on screen.
const TIMEOUT_MS: u32 = 10_000;

/// Raise a desktop notification for one bulletin.
///
/// # Errors
///
/// Returns the platform error if the notification server refuses the
/// request. The relay logs it and keeps going.
pub fn show(bulletin: &Bulletin) -> Result<(), notify_rust::error::Error> {
    Notification::new()
        .summary("New message from NWWS-OI")
        .body(&bulletin.text)
        .timeout(Timeout::Milliseconds(TIMEOUT_MS))
        .show()
        .map(|_| ())
}
