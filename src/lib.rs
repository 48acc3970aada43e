#![warn(missing_docs)]
//! FlowViz - identity flow explainer and Veo image-to-video animator.
//!
//! The crate has two halves:
//!
//! - [`flow`]: the three token-propagation flows (direct, agent, on-behalf-of)
//!   as data, with a plain-text rendering.
//! - [`video`]: a client that turns a diagram image and a prompt into a Veo
//!   video by submitting a long-running operation and polling it until done.
//!
//! # Quick Start
//!
//! ```no_run
//! use flowviz::{CredentialProvider, ImagePayload, VideoJobClient};
//!
//! #[tokio::main]
//! async fn main() -> flowviz::Result<()> {
//!     let client = VideoJobClient::builder()
//!         .credentials(CredentialProvider::environment("GEMINI_API_KEY"))
//!         .build();
//!     let image = ImagePayload::from_path("architecture.png").await?;
//!     let video = client
//!         .submit_and_await(image, "Glowing packets travel between the servers")
//!         .await?;
//!     println!("watch at {}", video.uri());
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `cli` (default): the `flowviz` command-line binary.

mod credential;
mod error;
pub mod flow;
pub mod image;
pub mod studio;
pub mod video;

pub use credential::{Credential, CredentialProvider, KeySelector, DEFAULT_API_KEY_ENV};
pub use error::{FlowVizError, Result, ServiceError};
pub use flow::FlowType;
pub use image::{ImageFormat, ImagePayload};
pub use studio::{Studio, StudioState};
pub use video::providers::VeoBackend;
pub use video::{
    CancellationToken, GenerationRequest, JobHandle, JobState, VeoModel, VideoJobClient,
    VideoOperations, VideoReference,
};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::credential::{CredentialProvider, KeySelector};
    pub use crate::error::{FlowVizError, Result};
    pub use crate::flow::FlowType;
    pub use crate::image::ImagePayload;
    pub use crate::video::{CancellationToken, VideoJobClient, VideoOperations, VideoReference};
}
