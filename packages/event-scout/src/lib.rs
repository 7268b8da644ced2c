// Event Scout - Core
//
// Watches public Telegram channels, picks out posts that announce events,
// and broadcasts each event once to the bot's subscribers.
//
// Architecture follows the domain/kernel split: domains hold the business
// rules, kernel holds infrastructure traits and adapters, pipeline drives
// the per-post state machine.

pub mod config;
pub mod domains;
pub mod kernel;
pub mod pipeline;
pub mod stores;

pub use config::*;
