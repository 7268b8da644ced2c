//! Notifications domain - rendering and delivering event messages

pub mod dispatcher;
pub mod formatter;

pub use dispatcher::{BroadcastDispatcher, DeliveryReport, NotificationDispatcher};
pub use formatter::{display_title, format_event_message};
