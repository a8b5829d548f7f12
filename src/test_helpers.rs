//! Shared test utilities for the folio test suite.
//!
//! Provides entity builders, store seeding, id extractors and ordering
//! assertions for the merger, classifier and boards.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let store = LocalStore::in_memory("https://cdn.test");
//! insert_project(&store, &project("A", Some(ProjectType::CaseStudy))).await;
//!
//! let merged = fetch_projects(&store, &catalog(vec![project("B", None)])).await;
//! assert_eq!(ids(&merged.projects), ["A", "B"]);
//! assert_unique_ids(&merged.projects);
//! ```

use std::collections::HashSet;

use serde_json::{Value, json};

use crate::catalog::Catalog;
use crate::remote::{self, RemoteCollection};
use crate::schema;
use crate::store::LocalStore;
use crate::types::{Partner, Project, ProjectType};

// =========================================================================
// Builders
// =========================================================================

/// A published project with predictable field values.
///
/// Title is `Project {id}`, category `Web`, year `2024`.
pub fn project(id: &str, project_type: Option<ProjectType>) -> Project {
    Project {
        id: id.to_string(),
        title: format!("Project {id}"),
        category: "Web".to_string(),
        year: "2024".to_string(),
        image: format!("/img/{id}.jpg"),
        description: String::new(),
        role: None,
        client: None,
        images: Vec::new(),
        project_type,
        layout_hint: None,
        is_published: true,
    }
}

/// A partner named `Partner {id}`.
pub fn partner(id: &str, sort_order: i64) -> Partner {
    Partner {
        id: id.to_string(),
        name: format!("Partner {id}"),
        logo_url: format!("/logos/{id}.svg"),
        sort_order,
        created_at: None,
    }
}

pub fn catalog(projects: Vec<Project>) -> Catalog {
    Catalog {
        projects,
        partners: Vec::new(),
    }
}

// =========================================================================
// Store seeding
// =========================================================================

/// Insert a project row as the admin editor would write it.
pub async fn insert_project(store: &LocalStore, project: &Project) {
    let record = schema::project_to_record(project).unwrap();
    store
        .insert(remote::PROJECTS, record)
        .await
        .unwrap_or_else(|e| panic!("seeding project '{}' failed: {e}", project.id));
}

pub async fn insert_partner(store: &LocalStore, id: &str, sort_order: i64) {
    let Value::Object(record) = json!({
        "id": id,
        "name": format!("Partner {id}"),
        "logo_url": format!("/logos/{id}.svg"),
        "sort_order": sort_order,
    }) else {
        unreachable!()
    };
    store
        .insert(remote::PARTNERS, record)
        .await
        .unwrap_or_else(|e| panic!("seeding partner '{id}' failed: {e}"));
}

// =========================================================================
// Extractors
// =========================================================================

pub fn ids(projects: &[Project]) -> Vec<&str> {
    projects.iter().map(|p| p.id.as_str()).collect()
}

pub fn ref_ids<'a>(projects: &[&'a Project]) -> Vec<&'a str> {
    projects.iter().map(|p| p.id.as_str()).collect()
}

pub fn partner_ids(partners: &[Partner]) -> Vec<&str> {
    partners.iter().map(|p| p.id.as_str()).collect()
}

// =========================================================================
// Assertions
// =========================================================================

/// Assert no two projects share an id.
pub fn assert_unique_ids(projects: &[Project]) {
    let mut seen = HashSet::new();
    for p in projects {
        assert!(seen.insert(p.id.as_str()), "duplicate project id '{}'", p.id);
    }
}

/// Assert partners are in non-decreasing `sort_order`.
pub fn assert_sort_order_ascending(partners: &[Partner]) {
    for pair in partners.windows(2) {
        assert!(
            pair[0].sort_order <= pair[1].sort_order,
            "'{}' (sort {}) listed before '{}' (sort {})",
            pair[0].id,
            pair[0].sort_order,
            pair[1].id,
            pair[1].sort_order
        );
    }
}
