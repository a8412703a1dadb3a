//! Build-server client trait.

use async_trait::async_trait;
use thiserror::Error;

/// Errors from the remote build server.
///
/// `Connector` is a transport-level failure (the server could not be
/// reached); `Response` is a well-formed HTTP error answer. Callers retry
/// both, but they are logged at different severities.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connector error: {0}")]
    Connector(String),

    #[error("response error ({status}): {message}")]
    Response { status: u16, message: String },

    #[error("parse error: {0}")]
    Parse(String),
}

impl ClientError {
    pub fn is_connector(&self) -> bool {
        matches!(self, ClientError::Connector(_))
    }
}

/// Client for the remote build server.
#[async_trait]
pub trait BuildClient: Send + Sync {
    /// Check whether a job exists for a branch.
    ///
    /// `Ok(false)` is the well-formed "not provisioned yet" answer, as
    /// opposed to an error reaching the server at all.
    async fn job_exists(
        &self,
        base_path: &str,
        job_name: &str,
        branch: &str,
    ) -> Result<bool, ClientError>;

    /// Trigger a build of a job for a branch.
    async fn trigger_build(
        &self,
        base_path: &str,
        job_name: &str,
        branch: &str,
    ) -> Result<(), ClientError>;
}
