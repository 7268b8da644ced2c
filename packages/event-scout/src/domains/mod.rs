pub mod bot;
pub mod channels;
pub mod detection;
pub mod notifications;
pub mod posts;
pub mod subscribers;
