// Navigation back to the login flow after an unrecoverable auth failure

use std::sync::atomic::{AtomicUsize, Ordering};

/// Receives the instruction to send the user back to login.
///
/// Called once per failed refresh, after both tokens have been purged.
pub trait NavigationSink: Send + Sync {
    fn redirect_to_login(&self);
}

/// Terminal implementation: tells the user how to sign in again
pub struct LoginHint {
    command: String,
}

impl LoginHint {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Default for LoginHint {
    fn default() -> Self {
        Self::new("unibro login")
    }
}

impl NavigationSink for LoginHint {
    fn redirect_to_login(&self) {
        tracing::warn!("Session expired, credentials cleared");
        eprintln!("Your session has expired. Run `{}` to sign in again.", self.command);
    }
}

/// Counts redirects instead of acting on them
#[derive(Default)]
pub struct RecordingNavigation {
    redirects: AtomicUsize,
}

impl RecordingNavigation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn redirects(&self) -> usize {
        self.redirects.load(Ordering::SeqCst)
    }
}

impl NavigationSink for RecordingNavigation {
    fn redirect_to_login(&self) {
        self.redirects.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_navigation_counts() {
        let nav = RecordingNavigation::new();
        assert_eq!(nav.redirects(), 0);
        nav.redirect_to_login();
        nav.redirect_to_login();
        assert_eq!(nav.redirects(), 2);
    }
}
