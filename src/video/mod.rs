//! Image-to-video jobs.

mod cancel;
mod client;
mod provider;
pub mod providers;
mod types;

pub use cancel::CancellationToken;
pub use client::{ProgressObserver, VideoJobClient, VideoJobClientBuilder, DEFAULT_POLL_INTERVAL};
pub use provider::VideoOperations;
pub use types::{
    AspectRatio, FilterReport, GenerationRequest, JobHandle, JobState, OutputConfig, Resolution,
    VeoModel, VideoReference,
};
