//! Jenkins API client for job existence probes and build triggers.

use async_trait::async_trait;
use tracing::debug;

use relay_core::{BuildClient, ClientError};

/// Jenkins connection configuration.
#[derive(Debug, Clone)]
pub struct JenkinsConfig {
    pub base_url: String,
    pub user: String,
    pub api_token: String,
}

impl JenkinsConfig {
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("JENKINS_URL").ok()?;
        let user = std::env::var("JENKINS_USER").ok()?;
        let api_token = std::env::var("JENKINS_API_TOKEN").ok()?;

        Some(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            user,
            api_token,
        })
    }
}

/// Jenkins client over a multibranch folder layout: jobs live under
/// `{base}/job/{folder}/job/{name}/job/{branch}`.
pub struct JenkinsClient {
    client: reqwest::Client,
    config: JenkinsConfig,
}

impl JenkinsClient {
    pub fn new(config: JenkinsConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Branch names may contain `/`, so every path segment is
    /// percent-encoded.
    fn job_url(&self, base_path: &str, job_name: &str, branch: &str) -> String {
        format!(
            "{}/job/{}/job/{}/job/{}",
            self.config.base_url,
            urlencoding::encode(base_path),
            urlencoding::encode(job_name),
            urlencoding::encode(branch),
        )
    }
}

#[async_trait]
impl BuildClient for JenkinsClient {
    async fn job_exists(
        &self,
        base_path: &str,
        job_name: &str,
        branch: &str,
    ) -> Result<bool, ClientError> {
        let url = format!("{}/api/json", self.job_url(base_path, job_name, branch));
        debug!(url = %url, "Probing job existence");

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.config.user, Some(&self.config.api_token))
            .send()
            .await
            .map_err(|e| ClientError::Connector(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(true);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }

        let message = response.text().await.unwrap_or_default();
        Err(ClientError::Response {
            status: status.as_u16(),
            message,
        })
    }

    async fn trigger_build(
        &self,
        base_path: &str,
        job_name: &str,
        branch: &str,
    ) -> Result<(), ClientError> {
        let url = format!("{}/build", self.job_url(base_path, job_name, branch));
        debug!(url = %url, "Triggering build");

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.user, Some(&self.config.api_token))
            .send()
            .await
            .map_err(|e| ClientError::Connector(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let message = response.text().await.unwrap_or_default();
        Err(ClientError::Response {
            status: status.as_u16(),
            message,
        })
    }
}
