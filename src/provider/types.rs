//! Tipos de dados para as respostas do endpoint de jobs do provedor.
//!
//! O documento de um job é semi-estruturado: apenas `status` é obrigatório.
//! O restante (`entities`, `sub_jobs`, `fail_reason`) é lido por caminho
//! através de [`JobDocument::get`] e variantes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::ProviderError;

/// Where a job lives on the provider side: the service that owns it and its region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobScope {
    /// Service scope, e.g. "ecs" or "evs".
    pub service: String,
    /// Region id, e.g. "cn-north-4".
    pub region: String,
}

impl JobScope {
    pub fn new(service: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            region: region.into(),
        }
    }
}

/// Walks `path` through nested JSON objects starting at `root`.
pub fn value_at<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(root, |node, key| node.get(*key))
}

/// Read-only projection of a provider job, as fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct JobDocument {
    status: String,
    raw: Value,
}

impl JobDocument {
    /// Wrap a decoded response body. The body must carry a string `status`.
    pub fn from_value(raw: Value) -> Result<Self, ProviderError> {
        let status = raw
            .get("status")
            .and_then(Value::as_str)
            .ok_or_else(|| ProviderError::Decode("missing string field `status`".into()))?
            .to_string();
        Ok(Self { status, raw })
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn job_id(&self) -> Option<&str> {
        self.get_str(&["job_id"])
    }

    /// Provider-supplied explanation for a failed job, when present.
    pub fn fail_reason(&self) -> Option<&str> {
        self.get_str(&["fail_reason"])
    }

    pub fn get(&self, path: &[&str]) -> Option<&Value> {
        value_at(&self.raw, path)
    }

    pub fn get_str(&self, path: &[&str]) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    pub fn get_array(&self, path: &[&str]) -> Option<&Vec<Value>> {
        self.get(path).and_then(Value::as_array)
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }
}
