//! The bundled static catalog.
//!
//! `catalog/catalog.toml` is compiled into the binary and provides the
//! default projects and partners. A deployment can point `[catalog] path` in
//! `folio.toml` at its own file instead; the format is the same.
//!
//! Project entries are read as rows and decoded the way remote rows are (see
//! [`crate::schema`]), so the legacy `class_name` and `className` layout keys
//! work here too.
//!
//! The catalog is pure data. It is never written back and its entries cannot
//! be deleted, only shadowed by remote rows with the same `id` (see
//! [`crate::merge`]).

use crate::remote::Record;
use crate::schema::{self, SchemaError};
use crate::types::{Partner, Project};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

const BUNDLED: &str = include_str!("../catalog/catalog.toml");

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("duplicate {kind} id '{id}' in catalog")]
    DuplicateId { kind: &'static str, id: String },
    #[error("partner '{0}' has an empty name")]
    EmptyName(String),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Default content shipped with the site.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub projects: Vec<Project>,
    pub partners: Vec<Partner>,
}

/// The file as written, before project rows are decoded.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    #[serde(default)]
    projects: Vec<Record>,
    #[serde(default)]
    partners: Vec<Partner>,
}

impl Catalog {
    /// The catalog compiled into the binary.
    pub fn bundled() -> Result<Self, CatalogError> {
        Self::parse(BUNDLED)
    }

    /// Load a catalog file from disk.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Load `path` when given, the bundled catalog otherwise.
    pub fn resolve(path: Option<&Path>) -> Result<Self, CatalogError> {
        match path {
            Some(p) => Self::load(p),
            None => Self::bundled(),
        }
    }

    pub fn parse(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(content)?;
        let projects = file
            .projects
            .into_iter()
            .map(schema::project_from_record)
            .collect::<Result<_, _>>()?;
        let catalog = Catalog {
            projects,
            partners: file.partners,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Catalog project with the given id.
    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let mut seen = HashSet::new();
        for p in &self.projects {
            if !seen.insert(p.id.as_str()) {
                return Err(CatalogError::DuplicateId {
                    kind: "project",
                    id: p.id.clone(),
                });
            }
        }
        seen.clear();
        for p in &self.partners {
            if !seen.insert(p.id.as_str()) {
                return Err(CatalogError::DuplicateId {
                    kind: "partner",
                    id: p.id.clone(),
                });
            }
            if p.name.trim().is_empty() {
                return Err(CatalogError::EmptyName(p.id.clone()));
            }
        }
        Ok(())
    }
}
