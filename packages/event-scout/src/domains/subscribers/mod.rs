//! Subscribers domain - who receives broadcasts

pub mod models;
pub mod store;

pub use models::Subscriber;
pub use store::SubscriberStore;
