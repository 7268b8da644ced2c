//! Kernel module - infrastructure traits, adapters and dependencies.

pub mod ai;
pub mod deps;
pub mod service_host;
pub mod telegram;
pub mod test_dependencies;
pub mod traits;

pub use ai::{OpenAIAdapter, UnconfiguredAI};
pub use deps::PipelineDeps;
pub use service_host::{Service, ServiceHost};
pub use telegram::{NoopChatBot, TelegramAdapter};
pub use traits::*;
