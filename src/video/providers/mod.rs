//! Video service backends.

mod veo;

pub use veo::{VeoBackend, BASE_URL_ENV, DEFAULT_BASE_URL};
