use tracing::debug;

use super::payload::{PayloadError, PayloadShape, ResultPayload};
use crate::error::TrackError;
use crate::provider::{JobClient, JobScope};

/// Extracts produced entity ids from a job already known to have succeeded.
///
/// Every call re-fetches the job document once; nothing is cached from the wait.
pub struct EntityTreeResolver<'a, C> {
    client: &'a C,
    scope: &'a JobScope,
}

impl<'a, C: JobClient> EntityTreeResolver<'a, C> {
    pub fn new(client: &'a C, scope: &'a JobScope) -> Self {
        Self { client, scope }
    }

    /// Read `entities.<field>` from a single-result job.
    pub async fn resolve_leaf_field_value(
        &self,
        job_id: &str,
        field: &str,
    ) -> Result<String, TrackError> {
        let values = self.resolve(job_id, PayloadShape::Leaf, field).await?;
        values
            .into_iter()
            .next()
            .ok_or_else(|| TrackError::FieldNotFound {
                job_id: job_id.to_string(),
                path: format!("entities.{field}"),
            })
    }

    /// Read `entities.<field>` from every sub-job under `entities.sub_jobs`, in order.
    pub async fn resolve_all_sub_job_field_values(
        &self,
        job_id: &str,
        field: &str,
    ) -> Result<Vec<String>, TrackError> {
        self.resolve(job_id, PayloadShape::Tree, field).await
    }

    async fn resolve(
        &self,
        job_id: &str,
        shape: PayloadShape,
        field: &str,
    ) -> Result<Vec<String>, TrackError> {
        let doc = self.client.fetch_job(self.scope, job_id).await?;
        let values = ResultPayload::parse(&doc, shape)
            .and_then(|payload| payload.field_values(field))
            .map_err(|err| payload_error(job_id, err))?;
        debug!(job_id, field, ?shape, count = values.len(), "resolved entity ids");
        Ok(values)
    }
}

fn payload_error(job_id: &str, err: PayloadError) -> TrackError {
    let job_id = job_id.to_string();
    match err {
        PayloadError::MissingNode { path } => TrackError::FieldNotFound { job_id, path },
        PayloadError::UnexpectedType { path, expected } => TrackError::UnexpectedType {
            job_id,
            path,
            expected,
        },
    }
}
