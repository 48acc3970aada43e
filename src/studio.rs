//! Presentation state for the image-to-video studio.

use crate::error::{FlowVizError, Result};
use crate::image::ImagePayload;
use crate::video::{
    JobState, VideoJobClient, VideoJobClientBuilder, VideoOperations, VideoReference,
};
use std::sync::{Arc, Mutex, MutexGuard};

/// Prompt used until the user writes their own.
pub const DEFAULT_PROMPT: &str = "Cinematic, futuristic visualization of data packets flowing \
through a secure network, glowing lines connecting server nodes, 4k quality, highly detailed.";

/// What a front end shows for the current generation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudioState {
    /// A job is in flight; the trigger should be disabled.
    pub is_generating: bool,
    /// Latest progress text.
    pub progress_message: String,
    /// Playable reference of the last successful job.
    pub video_uri: Option<String>,
    /// Message of the last failure.
    pub error: Option<String>,
}

#[derive(Debug)]
struct Inputs {
    image: Option<ImagePayload>,
    prompt: String,
}

/// Holds the selected image, the prompt and the visible state, and runs at
/// most one job at a time.
pub struct Studio<O> {
    client: VideoJobClient<O>,
    state: Arc<Mutex<StudioState>>,
    inputs: Mutex<Inputs>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Releases the in-flight flag when a generation is dropped before it ends.
struct InFlight<'a> {
    state: &'a Mutex<StudioState>,
    finished: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.finished {
            let mut state = lock(self.state);
            state.is_generating = false;
            state.progress_message.clear();
        }
    }
}

impl<O: VideoOperations> Studio<O> {
    /// Wraps a client builder, routing its progress reports into the state.
    /// Callbacks already registered on `builder` keep receiving reports.
    pub fn new(builder: VideoJobClientBuilder<O>) -> Self {
        let state = Arc::new(Mutex::new(StudioState::default()));
        let sink = Arc::clone(&state);
        let client = builder
            .on_progress(move |job: &JobState| {
                if !job.is_terminal() {
                    lock(&sink).progress_message = job.description();
                }
            })
            .build();
        Self {
            client,
            state,
            inputs: Mutex::new(Inputs {
                image: None,
                prompt: DEFAULT_PROMPT.to_string(),
            }),
        }
    }

    /// Snapshot of the visible state.
    pub fn state(&self) -> StudioState {
        lock(&self.state).clone()
    }

    /// Current prompt.
    pub fn prompt(&self) -> String {
        lock(&self.inputs).prompt.clone()
    }

    /// Replaces the prompt.
    pub fn set_prompt(&self, prompt: impl Into<String>) {
        lock(&self.inputs).prompt = prompt.into();
    }

    /// Selects a new image and clears the previous result and error.
    pub fn select_image(&self, image: ImagePayload) {
        lock(&self.inputs).image = Some(image);
        let mut state = lock(&self.state);
        state.video_uri = None;
        state.error = None;
    }

    /// Runs one generation with the selected image and prompt.
    ///
    /// Fails with [`FlowVizError::Busy`] while another generation is running,
    /// leaving that generation's state untouched. Dropping the returned future
    /// abandons the generation and frees the studio for the next one.
    pub async fn generate(&self) -> Result<VideoReference> {
        let (image, prompt) = {
            let inputs = lock(&self.inputs);
            (inputs.image.clone(), inputs.prompt.clone())
        };

        let image = {
            let mut state = lock(&self.state);
            if state.is_generating {
                return Err(FlowVizError::Busy);
            }
            let Some(image) = image else {
                state.error = Some("Please upload an image first.".to_string());
                return Err(FlowVizError::Input("no image selected".into()));
            };
            *state = StudioState {
                is_generating: true,
                progress_message: "Initializing Veo model...".to_string(),
                video_uri: None,
                error: None,
            };
            image
        };
        let mut in_flight = InFlight {
            state: &self.state,
            finished: false,
        };

        let outcome = self.client.submit_and_await(image, prompt).await;

        in_flight.finished = true;
        let mut state = lock(&self.state);
        *state = match &outcome {
            Ok(video) => StudioState {
                is_generating: false,
                progress_message: "Done!".to_string(),
                video_uri: Some(video.uri().to_string()),
                error: None,
            },
            Err(e) => StudioState {
                is_generating: false,
                progress_message: String::new(),
                video_uri: None,
                error: Some(e.to_string()),
            },
        };
        outcome
    }
}
