//! Submit, poll and resolve image-to-video jobs.

use crate::credential::{Credential, CredentialProvider};
use crate::error::{FlowVizError, Result, ServiceError};
use crate::image::ImagePayload;
use crate::video::cancel::CancellationToken;
use crate::video::provider::VideoOperations;
use crate::video::providers::VeoBackend;
use crate::video::types::{GenerationRequest, JobHandle, JobState, VeoModel, VideoReference};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Default wait between status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Callback receiving every job state change.
pub type ProgressObserver = Arc<dyn Fn(&JobState) + Send + Sync>;

/// Builder for [`VideoJobClient`].
pub struct VideoJobClientBuilder<O> {
    operations: O,
    credentials: CredentialProvider,
    model: VeoModel,
    poll_interval: Duration,
    cancellation: Option<CancellationToken>,
    observer: Option<ProgressObserver>,
}

impl<O: VideoOperations> VideoJobClientBuilder<O> {
    fn new(operations: O) -> Self {
        Self {
            operations,
            credentials: CredentialProvider::default(),
            model: VeoModel::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            cancellation: None,
            observer: None,
        }
    }

    /// Sets where the API key comes from. Defaults to the `API_KEY` env var.
    pub fn credentials(mut self, credentials: CredentialProvider) -> Self {
        self.credentials = credentials;
        self
    }

    /// Sets the Veo model variant.
    pub fn model(mut self, model: VeoModel) -> Self {
        self.model = model;
        self
    }

    /// Sets the wait between status checks.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Attaches a token that abandons the job when cancelled.
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Registers a callback for state changes. Callbacks added earlier keep
    /// running and are called first.
    pub fn on_progress<F>(mut self, observer: F) -> Self
    where
        F: Fn(&JobState) + Send + Sync + 'static,
    {
        let combined: ProgressObserver = match self.observer.take() {
            Some(previous) => Arc::new(move |state: &JobState| {
                previous(state);
                observer(state);
            }),
            None => Arc::new(observer),
        };
        self.observer = Some(combined);
        self
    }

    /// Builds the client. Credentials are resolved per job, not here.
    pub fn build(self) -> VideoJobClient<O> {
        VideoJobClient {
            operations: self.operations,
            credentials: self.credentials,
            model: self.model,
            poll_interval: self.poll_interval,
            cancellation: self.cancellation,
            observer: self.observer,
        }
    }
}

/// Runs one image-to-video job per call: resolve the key, submit, poll at a
/// fixed interval until the operation finishes, and return the video URI.
///
/// There is no timeout and no retry. Any failure ends the job; call again to
/// start over.
///
/// # Example
/// ```no_run
/// use flowviz::{ImagePayload, VideoJobClient};
///
/// # async fn example() -> flowviz::Result<()> {
/// let client = VideoJobClient::builder().build();
/// let image = ImagePayload::from_path("diagram.png").await?;
/// let video = client.submit_and_await(image, "Data packets flowing between servers").await?;
/// println!("{}", video.uri());
/// # Ok(())
/// # }
/// ```
pub struct VideoJobClient<O = VeoBackend> {
    operations: O,
    credentials: CredentialProvider,
    model: VeoModel,
    poll_interval: Duration,
    cancellation: Option<CancellationToken>,
    observer: Option<ProgressObserver>,
}

impl VideoJobClient<VeoBackend> {
    /// Builder using the Veo HTTP backend (`FLOWVIZ_BASE_URL` honoured).
    pub fn builder() -> VideoJobClientBuilder<VeoBackend> {
        VideoJobClientBuilder::new(VeoBackend::from_env())
    }
}

impl<O: VideoOperations> VideoJobClient<O> {
    /// Builder using a custom operations backend.
    pub fn with_operations(operations: O) -> VideoJobClientBuilder<O> {
        VideoJobClientBuilder::new(operations)
    }

    /// Returns the configured poll interval.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Returns the configured model.
    pub fn model(&self) -> VeoModel {
        self.model
    }

    /// Reads `path` and runs a job with it. The credential is resolved first,
    /// so a missing key is reported before the file is touched.
    pub async fn submit_path(
        &self,
        path: impl AsRef<Path>,
        prompt: impl Into<String>,
    ) -> Result<VideoReference> {
        let prompt = prompt.into();
        let outcome: Result<VideoReference> = async {
            let credential = self.resolve_credential().await?;
            let image = ImagePayload::from_path(path).await?;
            self.run(&credential, image, prompt).await
        }
        .await;
        self.finish(outcome)
    }

    /// Submits `image` with `prompt` and waits for the finished video.
    pub async fn submit_and_await(
        &self,
        image: ImagePayload,
        prompt: impl Into<String>,
    ) -> Result<VideoReference> {
        let prompt = prompt.into();
        let outcome: Result<VideoReference> = async {
            let credential = self.resolve_credential().await?;
            self.run(&credential, image, prompt).await
        }
        .await;
        self.finish(outcome)
    }

    async fn resolve_credential(&self) -> Result<Credential> {
        let credential = self.credentials.resolve().await?;
        self.report(JobState::CredentialResolved);
        Ok(credential)
    }

    async fn run(
        &self,
        credential: &Credential,
        image: ImagePayload,
        prompt: String,
    ) -> Result<VideoReference> {
        if self.is_cancelled() {
            return Err(FlowVizError::Cancelled { polls: 0 });
        }

        let request = GenerationRequest::new(self.model, prompt, image);
        let start = Instant::now();

        let mut handle = self
            .cancellable(0, self.operations.submit(credential, &request))
            .await?
            .map_err(FlowVizError::Submission)?;
        if let Some(message) = running_error(&mut handle) {
            return Err(FlowVizError::Submission(ServiceError::Operation(message)));
        }
        let mut status_calls: u32 = 1;
        tracing::info!(
            operation = %handle.name,
            model = %self.model,
            image_bytes = request.image.size(),
            "submitted video generation request"
        );
        self.report(JobState::Submitted {
            operation: handle.name.clone(),
        });

        while !handle.done {
            self.wait(status_calls - 1).await?;

            handle = self
                .cancellable(
                    status_calls - 1,
                    self.operations.get_operation(credential, &handle),
                )
                .await?
                .map_err(|source| FlowVizError::Poll {
                    operation: handle.name.clone(),
                    source,
                })?;
            status_calls += 1;
            if let Some(message) = running_error(&mut handle) {
                return Err(FlowVizError::Poll {
                    operation: handle.name,
                    source: ServiceError::Operation(message),
                });
            }

            tracing::debug!(
                operation = %handle.name,
                attempt = status_calls - 1,
                done = handle.done,
                elapsed_secs = start.elapsed().as_secs(),
                "polling Veo video generation"
            );
            self.report(JobState::Polling {
                operation: handle.name.clone(),
                attempt: status_calls - 1,
            });
        }

        let uri = extract_video_uri(&handle)?.to_string();
        Ok(VideoReference::new(
            &uri,
            credential,
            handle.name,
            self.model,
            status_calls,
            start.elapsed(),
        ))
    }

    /// Sleeps one poll interval, returning early if the job is cancelled.
    async fn wait(&self, polls: u32) -> Result<()> {
        self.cancellable(polls, tokio::time::sleep(self.poll_interval)).await
    }

    /// Drives `step` to completion unless the job is cancelled first.
    /// `polls` is the number of finished status checks at that point.
    async fn cancellable<F: Future>(&self, polls: u32, step: F) -> Result<F::Output> {
        match &self.cancellation {
            Some(token) => {
                tokio::select! {
                    _ = token.cancelled() => Err(FlowVizError::Cancelled { polls }),
                    output = step => Ok(output),
                }
            }
            None => Ok(step.await),
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    fn finish(&self, outcome: Result<VideoReference>) -> Result<VideoReference> {
        match &outcome {
            Ok(video) => {
                tracing::info!(
                    operation = %video.operation,
                    status_calls = video.status_calls,
                    elapsed_secs = video.elapsed.as_secs(),
                    "video generation complete"
                );
                self.report(JobState::Completed);
            }
            Err(FlowVizError::Cancelled { polls }) => {
                tracing::info!(polls, "video generation cancelled");
                self.report(JobState::Cancelled);
            }
            Err(e) => {
                tracing::warn!(kind = e.kind(), "video generation failed: {e}");
                self.report(JobState::Failed { kind: e.kind() });
            }
        }
        outcome
    }

    fn report(&self, state: JobState) {
        if let Some(observer) = &self.observer {
            observer(&state);
        }
    }
}

/// Takes the error of an operation that reports one while still running.
fn running_error(handle: &mut JobHandle) -> Option<String> {
    if handle.done {
        None
    } else {
        handle.error.take()
    }
}

/// Picks the first video URI of a finished operation.
fn extract_video_uri(handle: &JobHandle) -> Result<&str> {
    if let Some(uri) = handle.first_video_uri() {
        return Ok(uri);
    }
    if let Some(message) = &handle.error {
        return Err(FlowVizError::NoVideo(message.clone()));
    }
    if let Some(filtered) = &handle.filtered {
        let reasons = if filtered.reasons.is_empty() {
            "no reason given".to_string()
        } else {
            filtered.reasons.join("; ")
        };
        return Err(FlowVizError::NoVideo(format!(
            "{} video(s) removed by safety filters: {}",
            filtered.count, reasons
        )));
    }
    Err(FlowVizError::NoVideo(
        "operation finished without a video URI".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::types::FilterReport;

    #[test]
    fn test_extract_video_uri() {
        let handle = JobHandle::completed("op", ["https://example/video/1"]);
        assert_eq!(extract_video_uri(&handle).unwrap(), "https://example/video/1");
    }

    #[test]
    fn test_extract_prefers_operation_error() {
        let handle = JobHandle::failed("op", "Internal error while generating");
        let err = extract_video_uri(&handle).unwrap_err();
        assert_eq!(
            err.to_string(),
            "no video reference returned: Internal error while generating"
        );
    }

    #[test]
    fn test_extract_reports_filtering() {
        let mut handle = JobHandle::completed("op", Vec::<String>::new());
        handle.filtered = Some(FilterReport {
            count: 1,
            reasons: vec!["unsafe content".into()],
        });
        let err = extract_video_uri(&handle).unwrap_err();
        assert!(err.to_string().contains("removed by safety filters: unsafe content"));
    }

    #[test]
    fn test_extract_empty_list() {
        let handle = JobHandle::completed("op", Vec::<String>::new());
        assert!(matches!(
            extract_video_uri(&handle),
            Err(FlowVizError::NoVideo(_))
        ));
    }

    #[test]
    fn test_builder_defaults() {
        let client = VideoJobClient::builder().build();
        assert_eq!(client.poll_interval(), Duration::from_secs(5));
        assert_eq!(client.model(), VeoModel::Veo31FastPreview);

        let client = VideoJobClient::builder()
            .poll_interval(Duration::from_millis(250))
            .model(VeoModel::Veo31Preview)
            .build();
        assert_eq!(client.poll_interval(), Duration::from_millis(250));
        assert_eq!(client.model(), VeoModel::Veo31Preview);
    }
}
