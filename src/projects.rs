//! Project administration: the merged list plus create/edit/delete/publish.
//!
//! [`ProjectBoard`] holds the merged project list for one session and keeps
//! track of which ids exist remotely. Catalog entries are read-only: editing
//! or unpublishing one writes a remote row with the same id, which then
//! shadows the catalog copy; deleting one is refused.
//!
//! After every accepted mutation the local list is rebuilt the same way a
//! fresh fetch would build it (remote rows newest-first, then unshadowed
//! catalog entries), so the admin view never drifts from what a reload shows.

use crate::catalog::Catalog;
use crate::filters::Classifier;
use crate::merge::{self, Merged};
use crate::naming::{self, UploadKind};
use crate::remote::{self, ObjectStorage, Record, RemoteCollection, RemoteError};
use crate::schema;
use crate::types::{Project, ProjectType};
use chrono::Datelike;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProjectError {
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Schema(#[from] schema::SchemaError),
    #[error("no project '{0}'")]
    NotFound(String),
    #[error("project '{0}' is bundled content and cannot be deleted")]
    StaticEntry(String),
    #[error("project {0} must not be empty")]
    MissingField(&'static str),
}

/// Editable form of a project, with the editor's defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectDraft {
    /// `None` creates a new project; the store assigns the id.
    pub id: Option<String>,
    pub title: String,
    pub category: String,
    pub year: String,
    pub image: String,
    pub description: String,
    pub role: String,
    pub client: String,
    pub layout_hint: String,
    pub images: Vec<String>,
    pub project_type: ProjectType,
    pub is_published: bool,
}

impl Default for ProjectDraft {
    fn default() -> Self {
        Self {
            id: None,
            title: String::new(),
            category: String::new(),
            year: chrono::Utc::now().year().to_string(),
            image: String::new(),
            description: String::new(),
            role: String::new(),
            client: String::new(),
            layout_hint: String::new(),
            images: Vec::new(),
            project_type: ProjectType::SelectedWork,
            is_published: true,
        }
    }
}

impl From<&Project> for ProjectDraft {
    fn from(p: &Project) -> Self {
        Self {
            id: Some(p.id.clone()),
            title: p.title.clone(),
            category: p.category.clone(),
            year: p.year.clone(),
            image: p.image.clone(),
            description: p.description.clone(),
            role: p.role.clone().unwrap_or_default(),
            client: p.client.clone().unwrap_or_default(),
            layout_hint: p.layout_hint.clone().unwrap_or_default(),
            images: p.images.clone(),
            project_type: p.project_type.unwrap_or(ProjectType::SelectedWork),
            is_published: p.is_published,
        }
    }
}

impl ProjectDraft {
    fn validate(&self) -> Result<(), ProjectError> {
        for (field, value) in [
            ("title", &self.title),
            ("category", &self.category),
            ("year", &self.year),
        ] {
            if value.trim().is_empty() {
                return Err(ProjectError::MissingField(field));
            }
        }
        Ok(())
    }

    /// The project this draft describes, stored under `id`.
    pub fn into_project(self, id: String) -> Project {
        fn optional(s: String) -> Option<String> {
            if s.trim().is_empty() { None } else { Some(s) }
        }
        Project {
            id,
            title: self.title,
            category: self.category,
            year: self.year,
            image: self.image,
            description: self.description,
            role: optional(self.role),
            client: optional(self.client),
            images: self.images,
            project_type: Some(self.project_type),
            layout_hint: optional(self.layout_hint),
            is_published: self.is_published,
        }
    }
}

/// Session-local merged project list backed by the store.
pub struct ProjectBoard<S> {
    store: Arc<S>,
    catalog: Catalog,
    bucket: String,
    classifier: Classifier,
    projects: Vec<Project>,
    remote_ids: HashSet<String>,
}

impl<S> ProjectBoard<S>
where
    S: RemoteCollection + ObjectStorage,
{
    pub fn new(store: Arc<S>, catalog: Catalog, bucket: impl Into<String>) -> Self {
        let projects = catalog.projects.clone();
        Self {
            store,
            catalog,
            bucket: bucket.into(),
            classifier: Classifier::default(),
            projects,
            remote_ids: HashSet::new(),
        }
    }

    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Fetch and merge. Returns `false` when only catalog content could be
    /// shown.
    pub async fn load(&mut self) -> bool {
        let Merged {
            projects,
            remote_ids,
            degraded,
        } = merge::fetch_projects(self.store.as_ref(), &self.catalog).await;
        self.projects = projects;
        self.remote_ids = remote_ids;
        !degraded
    }

    /// The merged list, remote entries first.
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn get(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    /// Whether `id` is backed by a remote row (as opposed to catalog only).
    pub fn is_remote(&self, id: &str) -> bool {
        self.remote_ids.contains(id)
    }

    pub fn case_studies(&self) -> Vec<&Project> {
        self.classifier.case_studies(&self.projects)
    }

    pub fn selected_works(&self) -> Vec<&Project> {
        self.classifier.selected_works(&self.projects)
    }

    /// Draft for editing `id`: the merged list first, then the catalog,
    /// then a direct lookup in the store.
    pub async fn load_for_edit(&self, id: &str) -> Result<ProjectDraft, ProjectError> {
        if let Some(p) = self.get(id).or_else(|| self.catalog.project(id)) {
            return Ok(ProjectDraft::from(p));
        }
        match self.store.get_by_id(remote::PROJECTS, id).await {
            Ok(row) => Ok(ProjectDraft::from(&schema::project_from_record(row)?)),
            Err(RemoteError::NotFound { .. }) => Err(ProjectError::NotFound(id.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// Create or edit a project.
    ///
    /// - no id: insert, the store assigns the id
    /// - id already stored remotely: update in place
    /// - id only in the catalog: insert under that id, shadowing the catalog copy
    pub async fn save(&mut self, draft: ProjectDraft) -> Result<Project, ProjectError> {
        draft.validate()?;
        match draft.id.clone() {
            Some(id) if self.remote_ids.contains(&id) => {
                let project = draft.into_project(id.clone());
                let patch = schema::project_to_patch(&project)?;
                self.store
                    .update(remote::PROJECTS, &id, patch)
                    .await
                    .inspect_err(|e| tracing::warn!(error = %e, id = %id, "project update failed"))?;
                if let Some(slot) = self.projects.iter_mut().find(|p| p.id == id) {
                    *slot = project.clone();
                }
                tracing::info!(id = %id, "updated project");
                Ok(project)
            }
            Some(id) => {
                let project = draft.into_project(id);
                let record = schema::project_to_record(&project)?;
                self.insert(record).await
            }
            None => {
                let mut record = schema::project_to_record(&draft.into_project(String::new()))?;
                record.remove("id");
                self.insert(record).await
            }
        }
    }

    /// Delete a remote project. Catalog-only projects are refused.
    pub async fn delete(&mut self, id: &str) -> Result<(), ProjectError> {
        if !self.remote_ids.contains(id) {
            return Err(if self.catalog.project(id).is_some() {
                ProjectError::StaticEntry(id.to_string())
            } else {
                ProjectError::NotFound(id.to_string())
            });
        }
        self.store
            .delete(remote::PROJECTS, id)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, id, "project delete failed"))?;
        self.remote_ids.remove(id);
        self.projects.retain(|p| p.id != id);
        self.remerge();
        tracing::info!(id, "deleted project");
        Ok(())
    }

    /// Flip `is_published`. Returns the new state.
    pub async fn toggle_publish(&mut self, id: &str) -> Result<bool, ProjectError> {
        let current = self
            .get(id)
            .cloned()
            .ok_or_else(|| ProjectError::NotFound(id.to_string()))?;
        let next = !current.is_published;

        if self.remote_ids.contains(id) {
            let mut patch = Record::new();
            patch.insert("is_published".into(), Value::Bool(next));
            self.store
                .update(remote::PROJECTS, id, patch)
                .await
                .inspect_err(|e| tracing::warn!(error = %e, id, "publish toggle failed"))?;
            if let Some(p) = self.projects.iter_mut().find(|p| p.id == id) {
                p.is_published = next;
            }
        } else {
            let shadow = Project {
                is_published: next,
                ..current
            };
            self.insert(schema::project_to_record(&shadow)?).await?;
        }
        tracing::info!(id, published = next, "toggled publish state");
        Ok(next)
    }

    /// Upload a cover image and return its public URL.
    pub async fn upload_cover(&self, filename: &str, bytes: &[u8]) -> Result<String, ProjectError> {
        let key = naming::object_key(UploadKind::Cover, filename, bytes);
        self.store
            .upload_object(&self.bucket, &key, bytes)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, filename, "cover upload failed"))?;
        Ok(self.store.public_url(&self.bucket, &key))
    }

    async fn insert(&mut self, record: Record) -> Result<Project, ProjectError> {
        let stored = self
            .store
            .insert(remote::PROJECTS, record)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "project insert failed"))?;
        let project = schema::project_from_record(stored)?;
        // Newest row: front of the remote block, replacing any catalog copy.
        self.projects.retain(|p| p.id != project.id);
        self.projects.insert(0, project.clone());
        self.remote_ids.insert(project.id.clone());
        self.remerge();
        tracing::info!(id = %project.id, "stored project");
        Ok(project)
    }

    fn remerge(&mut self) {
        let remote: Vec<Project> = self
            .projects
            .iter()
            .filter(|p| self.remote_ids.contains(&p.id))
            .cloned()
            .collect();
        self.projects = merge::merge(remote, &self.catalog.projects);
    }
}
