//! Domain types shared by the catalog, the merger, the boards and the CLI.
//!
//! These are the shapes after column-name normalization (see [`crate::schema`]).
//! Remote rows and catalog entries both deserialize into them, so every field
//! that a legacy row may lack carries a serde default.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Shown in place of an absent or empty `client`.
pub const CLIENT_FALLBACK: &str = "Confidential";

/// Shown in place of an absent or empty `role`.
pub const ROLE_FALLBACK: &str = "Design & Development";

/// Explicit classification of a project.
///
/// Projects written before the type column existed have no value here and
/// are classified by position instead (see [`crate::filters`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectType {
    CaseStudy,
    SelectedWork,
}

impl ProjectType {
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectType::CaseStudy => "case_study",
            ProjectType::SelectedWork => "selected_work",
        }
    }

    /// Human label used in admin listings.
    pub fn label(self) -> &'static str {
        match self {
            ProjectType::CaseStudy => "Case Study",
            ProjectType::SelectedWork => "Selected Work",
        }
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProjectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "case_study" | "case-study" => Ok(ProjectType::CaseStudy),
            "selected_work" | "selected-work" => Ok(ProjectType::SelectedWork),
            other => Err(format!(
                "unknown project type '{other}' (expected case_study or selected_work)"
            )),
        }
    }
}

/// A portfolio project, either bundled in the catalog or stored remotely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Primary key; unique across the merged list.
    pub id: String,
    pub title: String,
    pub category: String,
    pub year: String,
    /// Cover image URI.
    pub image: String,
    /// Rich-text body, stored as opaque markup.
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    /// Additional gallery images, in display order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_type: Option<ProjectType>,
    /// Grid-span style class. Only the presentation layer reads it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_hint: Option<String>,
    #[serde(default = "default_published")]
    pub is_published: bool,
}

fn default_published() -> bool {
    true
}

impl Project {
    /// Client name for display, falling back to [`CLIENT_FALLBACK`].
    pub fn client_label(&self) -> &str {
        self.client_or(CLIENT_FALLBACK)
    }

    /// Role for display, falling back to [`ROLE_FALLBACK`].
    pub fn role_label(&self) -> &str {
        self.role_or(ROLE_FALLBACK)
    }

    pub fn client_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        non_empty(self.client.as_deref()).unwrap_or(fallback)
    }

    pub fn role_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        non_empty(self.role.as_deref()).unwrap_or(fallback)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// A partner logo shown in the marquee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partner {
    /// Assigned by the store on insert.
    pub id: String,
    pub name: String,
    pub logo_url: String,
    /// Ascending display key. Not necessarily contiguous.
    pub sort_order: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Direction for a single-step partner reorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            other => Err(format!("unknown direction '{other}' (expected up or down)")),
        }
    }
}
