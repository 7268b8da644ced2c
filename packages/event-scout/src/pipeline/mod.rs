//! Classification pipeline - the per-post state machine and its polling loop

pub mod orchestrator;
pub mod worker;

pub use orchestrator::{
    process_channel, process_post, run_cycle, CycleStats, PipelineSettings, PostOutcome,
};
pub use worker::PollingWorker;
