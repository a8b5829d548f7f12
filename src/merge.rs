//! Combining remote projects with the static catalog.
//!
//! The merged list is what every page renders from:
//!
//! ```text
//! remote rows (newest first)  ++  catalog entries whose id is not remote
//! ```
//!
//! A remote row with the same `id` as a catalog entry replaces it; that is how
//! bundled content gets edited without a rebuild. No two entries of the
//! result share an `id`.
//!
//! Fetching never fails. If the query errors, the catalog alone is returned
//! and the failure is logged; rows that cannot be decoded are skipped
//! individually.

use crate::catalog::Catalog;
use crate::remote::{self, Query, RemoteCollection};
use crate::schema;
use crate::types::Project;
use std::collections::HashSet;

/// Result of fetching and merging projects.
#[derive(Debug, Clone, Default)]
pub struct Merged {
    pub projects: Vec<Project>,
    /// Ids that exist in the remote collection, as of the fetch.
    pub remote_ids: HashSet<String>,
    /// True when the remote query failed and only catalog content is shown.
    pub degraded: bool,
}

/// Merge remote entries over catalog entries.
///
/// Remote entries keep their order; catalog entries not shadowed by a remote
/// id follow in catalog order. Should the remote side itself repeat an id,
/// the first occurrence wins.
pub fn merge(remote: Vec<Project>, fallback: &[Project]) -> Vec<Project> {
    let mut seen = HashSet::with_capacity(remote.len() + fallback.len());
    let mut merged = Vec::with_capacity(remote.len() + fallback.len());
    for project in remote {
        if seen.insert(project.id.clone()) {
            merged.push(project);
        }
    }
    for project in fallback {
        if seen.insert(project.id.clone()) {
            merged.push(project.clone());
        }
    }
    merged
}

/// Query the `projects` collection newest-first and merge it over `catalog`.
pub async fn fetch_projects<C>(client: &C, catalog: &Catalog) -> Merged
where
    C: RemoteCollection + ?Sized,
{
    let query = Query::new().order_by("created_at", false);
    let rows = match client.query(remote::PROJECTS, &query).await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::warn!(error = %e, "project query failed, serving catalog content");
            return Merged {
                projects: merge(Vec::new(), &catalog.projects),
                remote_ids: HashSet::new(),
                degraded: true,
            };
        }
    };

    let remote: Vec<Project> = rows
        .into_iter()
        .filter_map(|row| match schema::project_from_record(row) {
            Ok(p) => Some(p),
            Err(e) => {
                tracing::warn!(error = %e, "skipping undecodable project row");
                None
            }
        })
        .collect();
    let remote_ids = remote.iter().map(|p| p.id.clone()).collect();
    tracing::debug!(
        remote = remote.len(),
        catalog = catalog.projects.len(),
        "merged projects"
    );

    Merged {
        projects: merge(remote, &catalog.projects),
        remote_ids,
        degraded: false,
    }
}
