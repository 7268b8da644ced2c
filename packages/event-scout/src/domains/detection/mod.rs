//! Detection domain - deciding whether a post announces an event
//!
//! Two stages: a cheap lexical filter, then the model-backed classifier.
//! The staleness guard runs before both.

pub mod classifier;
pub mod lexical;
pub mod prompts;
pub mod response;
pub mod staleness;

pub use classifier::{Classification, ClassificationError, EventClassifier, LlmEventClassifier};
pub use lexical::quick_check;
pub use response::parse_classifier_response;
pub use staleness::{check_staleness, is_stale, Staleness};
