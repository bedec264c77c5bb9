// UI module - the boundary between user commands and the stores
//
// This module contains:
// - Notifier / with_notification: uniform rendering of command outcomes
// - CommandController: maps CLI commands onto WorkspaceStore and FilesStore

pub mod controller;
pub mod notifications;

pub use controller::{Command, CommandController, FilesCommand, FormatCommand};
pub use notifications::{
    ConsoleNotifier, MemoryNotifier, Notification, NotificationLevel, NotificationOptions, Notifier,
    with_notification,
};
