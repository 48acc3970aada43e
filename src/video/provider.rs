//! Remote operations trait.

use crate::credential::Credential;
use crate::error::ServiceError;
use crate::video::types::{GenerationRequest, JobHandle};
use async_trait::async_trait;
use std::sync::Arc;

/// The two calls a long-running video service must support.
#[async_trait]
pub trait VideoOperations: Send + Sync {
    /// Starts a generation and returns the first operation snapshot.
    async fn submit(
        &self,
        credential: &Credential,
        request: &GenerationRequest,
    ) -> Result<JobHandle, ServiceError>;

    /// Fetches the current state of the operation behind `handle`.
    async fn get_operation(
        &self,
        credential: &Credential,
        handle: &JobHandle,
    ) -> Result<JobHandle, ServiceError>;
}

#[async_trait]
impl<T: VideoOperations + ?Sized> VideoOperations for Arc<T> {
    async fn submit(
        &self,
        credential: &Credential,
        request: &GenerationRequest,
    ) -> Result<JobHandle, ServiceError> {
        (**self).submit(credential, request).await
    }

    async fn get_operation(
        &self,
        credential: &Credential,
        handle: &JobHandle,
    ) -> Result<JobHandle, ServiceError> {
        (**self).get_operation(credential, handle).await
    }
}
