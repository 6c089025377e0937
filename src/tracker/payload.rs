//! Result payload of a finished job.
//!
//! The provider reports the resources a job produced under `entities`. A plain
//! job carries a flat mapping there (`Leaf`); a batch job lists its children
//! under `entities.sub_jobs`, each child with its own flat mapping (`Tree`).
//! Callers state which shape they expect; nothing is auto-detected.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::provider::JobDocument;
use crate::provider::types::value_at;

const ENTITIES: &str = "entities";
const SUB_JOBS: &str = "sub_jobs";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    Leaf,
    Tree,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("missing `{path}`")]
    MissingNode { path: String },

    #[error("expected {expected} at `{path}`")]
    UnexpectedType { path: String, expected: &'static str },
}

/// Flat field mapping of one job or sub-job, remembering where it was found.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafFields {
    path: String,
    fields: Map<String, Value>,
}

impl LeafFields {
    fn from_node(node: Option<&Value>, path: String) -> Result<Self, PayloadError> {
        match node {
            None => Err(PayloadError::MissingNode { path }),
            Some(Value::Object(fields)) => Ok(Self {
                path,
                fields: fields.clone(),
            }),
            Some(_) => Err(PayloadError::UnexpectedType {
                path,
                expected: "object",
            }),
        }
    }

    /// Value of `field` as a string. Numbers are rendered; anything else is an error.
    pub fn value(&self, field: &str) -> Result<String, PayloadError> {
        let path = format!("{}.{field}", self.path);
        match self.fields.get(field) {
            None | Some(Value::Null) => Err(PayloadError::MissingNode { path }),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(_) => Err(PayloadError::UnexpectedType {
                path,
                expected: "string",
            }),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResultPayload {
    Leaf(LeafFields),
    Tree(Vec<LeafFields>),
}

impl ResultPayload {
    pub fn parse(doc: &JobDocument, shape: PayloadShape) -> Result<Self, PayloadError> {
        match shape {
            PayloadShape::Leaf => {
                LeafFields::from_node(doc.get(&[ENTITIES]), ENTITIES.to_string())
                    .map(ResultPayload::Leaf)
            }
            PayloadShape::Tree => {
                let list_path = format!("{ENTITIES}.{SUB_JOBS}");
                let subs = match doc.get(&[ENTITIES, SUB_JOBS]) {
                    None => return Err(PayloadError::MissingNode { path: list_path }),
                    Some(Value::Array(subs)) => subs,
                    Some(_) => {
                        return Err(PayloadError::UnexpectedType {
                            path: list_path,
                            expected: "array",
                        });
                    }
                };
                subs.iter()
                    .enumerate()
                    .map(|(i, sub)| {
                        LeafFields::from_node(
                            value_at(sub, &[ENTITIES]),
                            format!("{list_path}[{i}].{ENTITIES}"),
                        )
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(ResultPayload::Tree)
            }
        }
    }

    /// Values of `field` in provider order. Fails on the first leaf that lacks it.
    pub fn field_values(&self, field: &str) -> Result<Vec<String>, PayloadError> {
        match self {
            ResultPayload::Leaf(leaf) => Ok(vec![leaf.value(field)?]),
            ResultPayload::Tree(subs) => subs.iter().map(|leaf| leaf.value(field)).collect(),
        }
    }
}
