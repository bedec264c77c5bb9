//! Uniform rendering of command outcomes.
//!
//! Failures become `"<description>: <error>"` and are logged at `error`;
//! successes become `"<message>."`.

use std::fmt::Display;
use std::future::Future;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// A message shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub text: String,
}

impl Notification {
    pub fn success(message: &str) -> Self {
        let text = if message.ends_with('.') {
            message.to_string()
        } else {
            format!("{}.", message)
        };
        Self {
            level: NotificationLevel::Success,
            text,
        }
    }

    pub fn error(description: &str, error: impl Display) -> Self {
        Self {
            level: NotificationLevel::Error,
            text: format!("{}: {:#}", description, error),
        }
    }
}

/// Where notifications go
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Successes to stdout, failures to stderr
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Success => println!("{}", notification.text),
            NotificationLevel::Error => eprintln!("{}", notification.text),
        }
    }
}

/// Keeps every notification, for front ends that render them later
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(
            &mut *self
                .notifications
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notification: Notification) {
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
    }
}

/// Messages of one notified operation
#[derive(Debug, Clone, Copy)]
pub struct NotificationOptions<'a> {
    pub on_error: &'a str,
    pub on_success: Option<&'a str>,
}

impl<'a> NotificationOptions<'a> {
    pub fn on_error(on_error: &'a str) -> Self {
        Self {
            on_error,
            on_success: None,
        }
    }

    pub fn with_success(mut self, on_success: &'a str) -> Self {
        self.on_success = Some(on_success);
        self
    }
}

/// Await `operation` and report its outcome through `notifier`.
///
/// The result is passed through unchanged so callers can still act on it.
pub async fn with_notification<T, E, Fut>(
    notifier: &dyn Notifier,
    options: NotificationOptions<'_>,
    operation: Fut,
) -> Result<T, E>
where
    E: Display,
    Fut: Future<Output = Result<T, E>>,
{
    let result = operation.await;

    match &result {
        Ok(_) => {
            if let Some(message) = options.on_success {
                tracing::info!("{}", message);
                notifier.notify(Notification::success(message));
            }
        }
        Err(e) => {
            let notification = Notification::error(options.on_error, e);
            tracing::error!("{}", notification.text);
            notifier.notify(notification);
        }
    }

    result
}
