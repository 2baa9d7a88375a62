//! Progress notification seam.
//!
//! Long stages (backoff waits, the final summary) report progress through an
//! explicitly injected notifier. There is no implicit default bound to any
//! instance; call sites that want silence pass [`NullNotifier`].

/// Receives human-readable progress messages during a turn.
pub trait ProgressNotifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// A notifier that discards every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl ProgressNotifier for NullNotifier {
    fn notify(&self, _message: &str) {}
}

impl<F> ProgressNotifier for F
where
    F: Fn(&str) + Send + Sync,
{
    fn notify(&self, message: &str) {
        self(message)
    }
}
