//! CLI output formatting for project and partner listings.
//!
//! # Information-First Display
//!
//! Every entity leads with its positional index and title; ids, sources and
//! other bookkeeping follow as indented context lines. This keeps listings
//! readable as a content inventory while still giving the admin the id to
//! pass to the next command.
//!
//! # Output Format
//!
//! ## Projects
//!
//! ```text
//! Projects (6, 1 remote)
//! 001 Harbor Identity [Case Study]
//!     Id: 6f1c… (remote)
//!     Branding, 2024
//! 002 Lumen Packaging [untyped] (unpublished)
//!     Id: lumen-packaging (catalog)
//!     Packaging, 2022
//! ```
//!
//! ## Sections
//!
//! ```text
//! Case Studies
//! 001 Northwind Rebrand
//!     Brand Identity, 2024
//!
//! Selected Works
//! 001 Lumen Packaging
//!     Packaging, 2022 · md:col-span-2
//! ```
//!
//! ## Partners
//!
//! ```text
//! Partners
//! 001 Northwind
//!     Id: northwind · sort 1
//!     Logo: /images/partners/northwind.svg
//! ```
//!
//! # Architecture
//!
//! Each listing has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects. Notices about the session itself, such
//! as falling back to the catalog, go to stderr instead.

use crate::config::DisplayConfig;
use crate::types::{Partner, Project};

// ============================================================================
// Shared entity display helpers
// ============================================================================

const INDENT: &str = "    ";

/// `001`-style list number for the entry at 0-based `i`.
fn ordinal(i: usize) -> String {
    format!("{:03}", i + 1)
}

/// Text content of an HTML fragment. An unclosed tag hides the rest.
fn strip_tags(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(open) = rest.find('<') {
        text.push_str(&rest[..open]);
        rest = rest[open..].find('>').map_or("", |close| &rest[open + close + 1..]);
    }
    text.push_str(rest);
    text
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// One-line plain-text preview of a rich-text description.
fn description_preview(description: &str, max: usize) -> Option<String> {
    let plain = strip_tags(description);
    let collapsed = plain.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then(|| truncate_desc(&collapsed, max))
}

/// `Category, Year` with the layout hint appended when present.
fn category_line(project: &Project) -> String {
    match project.layout_hint.as_deref().filter(|h| !h.is_empty()) {
        Some(hint) => format!("{}, {} · {}", project.category, project.year, hint),
        None => format!("{}, {}", project.category, project.year),
    }
}

fn type_label(project: &Project) -> &'static str {
    project.project_type.map(|t| t.label()).unwrap_or("untyped")
}

/// Notice for a load that fell back to the catalog; `what` names the list.
pub fn format_store_fallback(what: &str) -> String {
    format!("Store unavailable, showing catalog {what} only")
}

/// Printed to stderr, never mixed into a listing.
pub fn print_store_fallback(what: &str) {
    eprintln!("{}", format_store_fallback(what));
}

// ============================================================================
// Projects
// ============================================================================

/// Admin listing of the merged project list.
///
/// `is_remote` tells stored rows apart from catalog-only entries.
pub fn format_project_list(projects: &[Project], is_remote: impl Fn(&str) -> bool) -> Vec<String> {
    let remote_count = projects.iter().filter(|p| is_remote(&p.id)).count();
    let mut lines = vec![format!(
        "Projects ({}, {} remote)",
        projects.len(),
        remote_count
    )];
    for (i, p) in projects.iter().enumerate() {
        let unpublished = if p.is_published { "" } else { " (unpublished)" };
        lines.push(format!(
            "{} {} [{}]{}",
            ordinal(i),
            p.title,
            type_label(p),
            unpublished
        ));
        let origin = if is_remote(&p.id) { "remote" } else { "catalog" };
        lines.push(format!("{}Id: {} ({})", INDENT, p.id, origin));
        lines.push(format!("{}{}", INDENT, category_line(p)));
    }
    lines
}

/// One homepage section: heading, then each project with its category line.
pub fn format_section(heading: &str, projects: &[&Project]) -> Vec<String> {
    let mut lines = vec![heading.to_string()];
    if projects.is_empty() {
        lines.push(format!("{}(none)", INDENT));
    }
    for (i, p) in projects.iter().enumerate() {
        lines.push(format!("{} {}", ordinal(i), p.title));
        lines.push(format!("{}{}", INDENT, category_line(p)));
    }
    lines
}

/// Full detail of a single project, with display fallbacks applied.
pub fn format_project_detail(project: &Project, display: &DisplayConfig) -> Vec<String> {
    let pad = INDENT;
    let mut lines = vec![
        project.title.clone(),
        format!("{pad}Id: {}", project.id),
        format!("{pad}Category: {}", project.category),
        format!("{pad}Year: {}", project.year),
        format!("{pad}Client: {}", project.client_or(&display.client_fallback)),
        format!("{pad}Role: {}", project.role_or(&display.role_fallback)),
        format!("{pad}Type: {}", type_label(project)),
        format!(
            "{pad}Published: {}",
            if project.is_published { "yes" } else { "no" }
        ),
    ];
    if let Some(hint) = project.layout_hint.as_deref() {
        lines.push(format!("{pad}Layout: {hint}"));
    }
    if !project.image.is_empty() {
        lines.push(format!("{pad}Cover: {}", project.image));
    }
    for (i, image) in project.images.iter().enumerate() {
        lines.push(format!("{pad}{} {}", ordinal(i), image));
    }
    if let Some(preview) = description_preview(&project.description, 200) {
        lines.push(format!("{pad}{preview}"));
    }
    lines
}

pub fn print_project_list(projects: &[Project], is_remote: impl Fn(&str) -> bool) {
    for line in format_project_list(projects, is_remote) {
        println!("{}", line);
    }
}

pub fn print_section(heading: &str, projects: &[&Project]) {
    for line in format_section(heading, projects) {
        println!("{}", line);
    }
}

pub fn print_project_detail(project: &Project, display: &DisplayConfig) {
    for line in format_project_detail(project, display) {
        println!("{}", line);
    }
}

// ============================================================================
// Partners
// ============================================================================

/// Partners in display order.
pub fn format_partner_list(partners: &[Partner]) -> Vec<String> {
    let mut lines = vec!["Partners".to_string()];
    if partners.is_empty() {
        lines.push(format!("{}(none)", INDENT));
    }
    for (i, p) in partners.iter().enumerate() {
        lines.push(format!("{} {}", ordinal(i), p.name));
        lines.push(format!("{}Id: {} · sort {}", INDENT, p.id, p.sort_order));
        lines.push(format!("{}Logo: {}", INDENT, p.logo_url));
    }
    lines
}

pub fn print_partner_list(partners: &[Partner]) {
    for line in format_partner_list(partners) {
        println!("{}", line);
    }
}
