//! Posts domain - the processed-post ledger

pub mod models;
pub mod store;

pub use models::{ExtractedFields, PostRecord, ProcessedPost, RecordOutcome};
pub use store::PostStore;
