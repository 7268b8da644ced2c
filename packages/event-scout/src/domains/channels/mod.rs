//! Channels domain - where posts come from

pub mod loader;
pub mod models;
pub mod reader;

pub use loader::load_channels;
pub use models::{source_link, ChannelPost};
pub use reader::{ChannelReader, TelegramWebReader};
