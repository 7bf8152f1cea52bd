//! User-facing side effects triggered by failure handling.

use std::sync::Mutex;

/// Displays a message to the user.
pub trait Notifier: Send + Sync {
    fn error(&self, message: &str);
}

/// Sends the user to the unauthenticated entry point.
pub trait Navigator: Send + Sync {
    fn redirect_to_login(&self);
}

/// Default notifier: records messages as `tracing` warnings.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn error(&self, message: &str) {
        tracing::warn!(target: "gaiarouter_admin::notify", "{}", message);
    }
}

/// Navigator for headless use, where there is no login screen to show.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn redirect_to_login(&self) {
        tracing::debug!("login redirect requested");
    }
}

/// Notifier and navigator that remember what they were asked to do.
#[derive(Debug, Default)]
pub struct Recorder {
    messages: Mutex<Vec<String>>,
    redirects: Mutex<usize>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages shown so far, oldest first.
    pub fn messages(&self) -> Vec<String> {
        match self.messages.lock() {
            Ok(m) => m.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Number of login redirects requested.
    pub fn redirects(&self) -> usize {
        match self.redirects.lock() {
            Ok(r) => *r,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

impl Notifier for Recorder {
    fn error(&self, message: &str) {
        match self.messages.lock() {
            Ok(mut m) => m.push(message.to_string()),
            Err(poisoned) => poisoned.into_inner().push(message.to_string()),
        }
    }
}

impl Navigator for Recorder {
    fn redirect_to_login(&self) {
        match self.redirects.lock() {
            Ok(mut r) => *r += 1,
            Err(poisoned) => *poisoned.into_inner() += 1,
        }
    }
}
