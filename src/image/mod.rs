//! Image input handling.

mod types;

pub use types::{ImageFormat, ImagePayload};
