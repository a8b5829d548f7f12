//! Column-name adapter between stored records and domain types.
//!
//! The `projects` table has gone through two naming conventions for the grid
//! layout class: rows written by the admin editor carry `class_name`, older
//! imports carry `className`, and the domain type calls it `layout_hint`. This
//! module is the only place that knows about that drift:
//!
//! - **Reading**: the first of `class_name`, `className`, `layout_hint` that
//!   holds a non-empty string becomes `layout_hint`; the others are dropped.
//! - **Writing**: `layout_hint` is written back as `class_name`.
//!
//! Rows are also scrubbed of `null` values before deserialization so that
//! nullable columns fall back to the serde defaults on [`Project`]
//! (`is_published: null` reads as published).

use crate::remote::Record;
use crate::types::{Partner, Project};
use serde_json::Value;
use thiserror::Error;

/// Column names the layout hint may arrive under, in priority order.
pub const LAYOUT_COLUMNS: [&str; 3] = ["class_name", "className", "layout_hint"];

/// Column the layout hint is written to.
pub const LAYOUT_WRITE_COLUMN: &str = "class_name";

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("malformed {kind} record '{id}': {source}")]
    Malformed {
        kind: &'static str,
        id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0} did not serialize to an object")]
    NotAnObject(&'static str),
}

/// Rewrite a raw `projects` row into the canonical column set.
pub fn normalize_project(mut record: Record) -> Record {
    record.retain(|_, v| !v.is_null());

    let mut layout = None;
    for column in LAYOUT_COLUMNS {
        if let Some(value) = record.remove(column)
            && layout.is_none()
            && value.as_str().is_some_and(|s| !s.is_empty())
        {
            layout = Some(value);
        }
    }
    if let Some(value) = layout {
        record.insert("layout_hint".into(), value);
    }

    if let Some(Value::Number(n)) = record.get("year") {
        let year = n.to_string();
        record.insert("year".into(), Value::String(year));
    }
    record
}

/// Decode a `projects` row.
pub fn project_from_record(record: Record) -> Result<Project, SchemaError> {
    let id = record_id(&record);
    serde_json::from_value(Value::Object(normalize_project(record))).map_err(|source| {
        SchemaError::Malformed {
            kind: "project",
            id,
            source,
        }
    })
}

/// Encode a project for writing. Blank optional text columns are omitted
/// so the store keeps its own defaults for them.
pub fn project_to_record(project: &Project) -> Result<Record, SchemaError> {
    let Ok(Value::Object(mut record)) = serde_json::to_value(project) else {
        return Err(SchemaError::NotAnObject("project"));
    };
    if let Some(layout) = record.remove("layout_hint") {
        record.insert(LAYOUT_WRITE_COLUMN.into(), layout);
    }
    for column in ["role", "client", LAYOUT_WRITE_COLUMN] {
        if record
            .get(column)
            .and_then(Value::as_str)
            .is_some_and(|s| s.trim().is_empty())
        {
            record.remove(column);
        }
    }
    Ok(record)
}

/// Encode a project as an update patch for an existing row.
///
/// Unlike [`project_to_record`], cleared columns are sent explicitly: blank
/// role, client and layout as `null`, an empty gallery as `[]`. Legacy layout
/// columns are nulled so they cannot resurface over a cleared hint.
pub fn project_to_patch(project: &Project) -> Result<Record, SchemaError> {
    let mut patch = project_to_record(project)?;
    patch.remove("id");
    for column in ["role", "client", LAYOUT_WRITE_COLUMN] {
        patch.entry(column).or_insert(Value::Null);
    }
    for column in LAYOUT_COLUMNS {
        if column != LAYOUT_WRITE_COLUMN {
            patch.insert(column.into(), Value::Null);
        }
    }
    patch
        .entry("images")
        .or_insert_with(|| Value::Array(Vec::new()));
    Ok(patch)
}

/// Decode a `partners` row.
pub fn partner_from_record(mut record: Record) -> Result<Partner, SchemaError> {
    record.retain(|_, v| !v.is_null());
    let id = record_id(&record);
    serde_json::from_value(Value::Object(record)).map_err(|source| SchemaError::Malformed {
        kind: "partner",
        id,
        source,
    })
}

fn record_id(record: &Record) -> String {
    match record.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "<no id>".to_string(),
    }
}
