//! Splitting the merged project list into the two homepage sections.
//!
//! Unpublished projects appear in neither section. Every published project
//! lands in exactly one:
//!
//! | `project_type`   | Section                                     |
//! |------------------|---------------------------------------------|
//! | `case_study`     | case studies                                |
//! | `selected_work`  | selected works                              |
//! | absent           | by position among published projects: the   |
//! |                  | first `case_study_slots` (default 3) are    |
//! |                  | case studies, the rest selected works       |
//!
//! The positional rule exists for rows written before the type column did.
//! Because it depends on position only, adding, removing or unpublishing an
//! untyped project can move *other* untyped projects between sections. Set
//! `project_type` on every row (the admin editor always does) to avoid that;
//! `case_study_slots = 0` turns the fallback off so untyped rows all go to
//! selected works.

use crate::types::{Project, ProjectType};

/// Untyped projects at these leading published positions are case studies.
pub const LEGACY_CASE_STUDY_SLOTS: usize = 3;

/// Which homepage section a project is shown in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    CaseStudies,
    SelectedWorks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classifier {
    pub case_study_slots: usize,
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            case_study_slots: LEGACY_CASE_STUDY_SLOTS,
        }
    }
}

impl Classifier {
    pub fn new(case_study_slots: usize) -> Self {
        Self { case_study_slots }
    }

    /// Section for a published project at `position` among published projects.
    pub fn section(&self, project: &Project, position: usize) -> Section {
        match project.project_type {
            Some(ProjectType::CaseStudy) => Section::CaseStudies,
            Some(ProjectType::SelectedWork) => Section::SelectedWorks,
            None if position < self.case_study_slots => Section::CaseStudies,
            None => Section::SelectedWorks,
        }
    }

    /// Published projects paired with their section, in list order.
    pub fn classify<'a>(&self, list: &'a [Project]) -> Vec<(Section, &'a Project)> {
        list.iter()
            .filter(|p| p.is_published)
            .enumerate()
            .map(|(position, p)| (self.section(p, position), p))
            .collect()
    }

    pub fn case_studies<'a>(&self, list: &'a [Project]) -> Vec<&'a Project> {
        self.only(list, Section::CaseStudies)
    }

    pub fn selected_works<'a>(&self, list: &'a [Project]) -> Vec<&'a Project> {
        self.only(list, Section::SelectedWorks)
    }

    fn only<'a>(&self, list: &'a [Project], wanted: Section) -> Vec<&'a Project> {
        self.classify(list)
            .into_iter()
            .filter_map(|(section, p)| (section == wanted).then_some(p))
            .collect()
    }
}

/// Case studies under the default three-slot fallback.
pub fn case_studies(list: &[Project]) -> Vec<&Project> {
    Classifier::default().case_studies(list)
}

/// Selected works under the default three-slot fallback.
pub fn selected_works(list: &[Project]) -> Vec<&Project> {
    Classifier::default().selected_works(list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    fn untyped(names: &[&str]) -> Vec<Project> {
        names.iter().map(|n| project(n, None)).collect()
    }

    #[test]
    fn five_untyped_split_three_and_two() {
        let list = untyped(&["A", "B", "C", "D", "E"]);
        assert_eq!(ref_ids(&case_studies(&list)), ["A", "B", "C"]);
        assert_eq!(ref_ids(&selected_works(&list)), ["D", "E"]);
    }

    #[test]
    fn explicit_selected_work_at_front_is_not_a_case_study() {
        let mut list = untyped(&["B", "C"]);
        list.insert(0, project("A", Some(ProjectType::SelectedWork)));
        assert!(!ref_ids(&case_studies(&list)).contains(&"A"));
        assert_eq!(ref_ids(&selected_works(&list)), ["A"]);
    }

    #[test]
    fn explicit_case_study_past_the_slots_stays_a_case_study() {
        let mut list = untyped(&["A", "B", "C", "D"]);
        list.push(project("E", Some(ProjectType::CaseStudy)));
        assert_eq!(ref_ids(&case_studies(&list)), ["A", "B", "C", "E"]);
        assert_eq!(ref_ids(&selected_works(&list)), ["D"]);
    }

    #[test]
    fn unpublished_never_shown() {
        let mut list = vec![
            project("A", Some(ProjectType::CaseStudy)),
            project("B", Some(ProjectType::SelectedWork)),
            project("C", None),
        ];
        for p in &mut list {
            p.is_published = false;
        }
        assert!(case_studies(&list).is_empty());
        assert!(selected_works(&list).is_empty());
    }

    #[test]
    fn positions_count_published_entries_only() {
        let mut list = untyped(&["A", "B", "C", "D"]);
        list[1].is_published = false;
        assert_eq!(ref_ids(&case_studies(&list)), ["A", "C", "D"]);
        assert!(selected_works(&list).is_empty());
    }

    #[test]
    fn typed_entries_consume_positions() {
        let list = vec![
            project("A", Some(ProjectType::SelectedWork)),
            project("B", Some(ProjectType::SelectedWork)),
            project("C", None),
            project("D", None),
        ];
        assert_eq!(ref_ids(&case_studies(&list)), ["C"]);
        assert_eq!(ref_ids(&selected_works(&list)), ["A", "B", "D"]);
    }

    #[test]
    fn every_published_project_in_exactly_one_section() {
        let mut list = untyped(&["A", "B", "C", "D", "E", "F"]);
        list[2].project_type = Some(ProjectType::SelectedWork);
        list[4].is_published = false;
        let cs = ref_ids(&case_studies(&list));
        let sw = ref_ids(&selected_works(&list));
        assert_eq!(cs.len() + sw.len(), 5);
        assert!(cs.iter().all(|id| !sw.contains(id)));
    }

    #[test]
    fn zero_slots_disables_positional_fallback() {
        let list = untyped(&["A", "B"]);
        let classifier = Classifier::new(0);
        assert!(classifier.case_studies(&list).is_empty());
        assert_eq!(ref_ids(&classifier.selected_works(&list)), ["A", "B"]);
    }
}
