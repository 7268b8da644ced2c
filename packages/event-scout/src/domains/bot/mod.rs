//! Bot domain - the interactive side of the Telegram bot

pub mod handlers;
pub mod service;

pub use handlers::BotHandler;
pub use service::BotService;
