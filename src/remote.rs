//! Contracts for the hosted data service.
//!
//! The site's content lives in named collections (`projects`, `partners`) and
//! uploaded images live in an object bucket. Everything in this crate talks to
//! them through the two traits below; [`crate::store::LocalStore`] is the
//! in-process implementation used by the CLI and the tests.
//!
//! Records are untyped JSON objects. Turning them into domain types is the job
//! of [`crate::schema`], so column-name drift is handled in exactly one place.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use thiserror::Error;

/// Collection holding portfolio projects.
pub const PROJECTS: &str = "projects";

/// Collection holding partner logos.
pub const PARTNERS: &str = "partners";

/// A row as returned by or sent to the data service.
pub type Record = Map<String, Value>;

/// Failures reported by the data service. All of them are recoverable by the
/// caller; none should take the process down.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RemoteError {
    #[error("query on '{collection}' failed: {message}")]
    Query { collection: String, message: String },
    #[error("write to '{collection}' failed: {message}")]
    Mutation { collection: String, message: String },
    #[error("upload of '{key}' to bucket '{bucket}' failed: {message}")]
    Upload {
        bucket: String,
        key: String,
        message: String,
    },
    #[error("no record '{id}' in '{collection}'")]
    NotFound { collection: String, id: String },
}

impl RemoteError {
    pub fn query(collection: &str, message: impl Into<String>) -> Self {
        RemoteError::Query {
            collection: collection.to_string(),
            message: message.into(),
        }
    }

    pub fn mutation(collection: &str, message: impl Into<String>) -> Self {
        RemoteError::Mutation {
            collection: collection.to_string(),
            message: message.into(),
        }
    }

    pub fn upload(bucket: &str, key: &str, message: impl Into<String>) -> Self {
        RemoteError::Upload {
            bucket: bucket.to_string(),
            key: key.to_string(),
            message: message.into(),
        }
    }
}

/// Column and direction for ordering a [`Query`].
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub column: String,
    pub ascending: bool,
}

/// Equality filters plus an optional ordering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<(String, Value)>,
    pub order: Option<OrderBy>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only rows whose `column` equals `value`.
    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push((column.to_string(), value.into()));
        self
    }

    pub fn order_by(mut self, column: &str, ascending: bool) -> Self {
        self.order = Some(OrderBy {
            column: column.to_string(),
            ascending,
        });
        self
    }

    /// Whether `record` passes every filter. Absent columns never match.
    pub fn matches(&self, record: &Record) -> bool {
        self.filters
            .iter()
            .all(|(column, value)| record.get(column) == Some(value))
    }
}

/// Total order over JSON scalars used when sorting query results.
///
/// Nulls and absent values sort first, numbers compare numerically, strings
/// lexically (ISO-8601 timestamps therefore sort chronologically). Values of
/// different kinds compare by kind.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(_) => 4,
        }
    }
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Table access on the hosted data service.
#[async_trait]
pub trait RemoteCollection: Send + Sync {
    /// Rows of `collection` matching `query`, in the requested order.
    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Record>, RemoteError>;

    async fn get_by_id(&self, collection: &str, id: &str) -> Result<Record, RemoteError>;

    /// Insert a row and return it as stored, including any server-assigned
    /// `id` and `created_at`.
    async fn insert(&self, collection: &str, record: Record) -> Result<Record, RemoteError>;

    /// Merge `patch` into the row with the given id.
    async fn update(&self, collection: &str, id: &str, patch: Record) -> Result<(), RemoteError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<(), RemoteError>;
}

/// Blob storage for uploaded images.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload_object(&self, bucket: &str, key: &str, bytes: &[u8])
    -> Result<(), RemoteError>;

    /// Public URL under which an uploaded object is served.
    fn public_url(&self, bucket: &str, key: &str) -> String;
}
