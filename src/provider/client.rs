use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::error::ProviderError;
use super::types::{JobDocument, JobScope};

const DEFAULT_API_VERSION: &str = "v1";

/// Reads the current state of a provider job.
///
/// Implementations must be safe to share between concurrent waiters; every call
/// is an independent read with no state carried between calls.
pub trait JobClient: Send + Sync {
    fn fetch_job(
        &self,
        scope: &JobScope,
        job_id: &str,
    ) -> impl Future<Output = Result<JobDocument, ProviderError>> + Send;
}

/// `JobClient` over the provider's REST jobs endpoint.
pub struct HttpJobClient {
    client: Client,
    token: String,
    project_id: String,
    endpoint_domain: String,
    api_version: String,
    base_url: Option<String>,
}

impl HttpJobClient {
    /// Create a client that derives its host from the job scope:
    /// `https://{service}.{region}.{endpoint_domain}`.
    pub fn new(
        token: String,
        project_id: String,
        endpoint_domain: String,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            token,
            project_id,
            endpoint_domain,
            api_version: DEFAULT_API_VERSION.to_string(),
            base_url: None,
        })
    }

    /// Point every request at a fixed base URL regardless of scope (useful for testing).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url.trim_end_matches('/').to_string());
        self
    }

    pub fn with_api_version(mut self, api_version: String) -> Self {
        self.api_version = api_version;
        self
    }

    fn job_url(&self, scope: &JobScope, job_id: &str) -> String {
        let base = match &self.base_url {
            Some(base) => base.clone(),
            None => format!(
                "https://{}.{}.{}",
                scope.service, scope.region, self.endpoint_domain
            ),
        };
        format!(
            "{base}/{}/{}/jobs/{job_id}",
            self.api_version, self.project_id
        )
    }
}

impl JobClient for HttpJobClient {
    async fn fetch_job(&self, scope: &JobScope, job_id: &str) -> Result<JobDocument, ProviderError> {
        let url = self.job_url(scope, job_id);
        debug!(%url, job_id, "fetching job");

        let response = self
            .client
            .get(&url)
            .header("X-Auth-Token", &self.token)
            .header("accept", "application/json")
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|secs| secs.saturating_mul(1000))
                .unwrap_or(1000);
            return Err(ProviderError::RateLimited {
                retry_after_ms: retry_after,
            });
        }

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        let value: Value =
            serde_json::from_str(&body).map_err(|e| ProviderError::Decode(e.to_string()))?;
        JobDocument::from_value(value)
    }
}
