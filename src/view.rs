use crate::error::{GradebookError, Result};
use crate::model::{GradeDraft, Role};
use crate::query::{QueryParams, SortOrder};
use crate::session::{require_teacher, role_allows_view};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum View {
    #[default]
    Overview,
    Students,
    Subjects,
    Grades,
    AddGrade,
}

impl View {
    pub fn parse(s: &str) -> Option<View> {
        match s {
            "overview" => Some(View::Overview),
            "students" => Some(View::Students),
            "subjects" => Some(View::Subjects),
            "grades" => Some(View::Grades),
            "add-grade" => Some(View::AddGrade),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            View::Overview => "overview",
            View::Students => "students",
            View::Subjects => "subjects",
            View::Grades => "grades",
            View::AddGrade => "add-grade",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dialog {
    AddStudent,
    AddSubject,
}

impl Dialog {
    pub fn parse(s: &str) -> Option<Dialog> {
        match s {
            "add-student" => Some(Dialog::AddStudent),
            "add-subject" => Some(Dialog::AddSubject),
            _ => None,
        }
    }
}

/// Partial update of a view's query parameters. Absent fields keep their value;
/// filter entries are merged key by key.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryPatch {
    pub search_term: Option<String>,
    pub filters: Option<BTreeMap<String, String>>,
    pub sort_key: Option<String>,
    pub sort_order: Option<SortOrder>,
}

impl QueryPatch {
    fn apply(self, params: &mut QueryParams) {
        if let Some(term) = self.search_term {
            params.search_term = term;
        }
        if let Some(filters) = self.filters {
            params.filters.extend(filters);
        }
        if let Some(key) = self.sort_key {
            params.sort_key = key;
        }
        if let Some(order) = self.sort_order {
            params.sort_order = order;
        }
    }
}

/// Transient UI state of one logged-in session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSession {
    pub active_view: View,
    pub students: QueryParams,
    pub subjects: QueryParams,
    pub grades: QueryParams,
    pub dialog: Option<Dialog>,
    pub grade_draft: Option<GradeDraft>,
}

impl ViewSession {
    fn params_mut(&mut self, view: View) -> Option<&mut QueryParams> {
        match view {
            View::Students => Some(&mut self.students),
            View::Subjects => Some(&mut self.subjects),
            View::Grades => Some(&mut self.grades),
            View::Overview | View::AddGrade => None,
        }
    }

    /// Switch views. Any open dialog closes; the add-grade draft only lives
    /// while add-grade is the active view.
    pub fn navigate(&mut self, role: Role, view: View, today: NaiveDate) -> Result<()> {
        if !role_allows_view(role, view) {
            return Err(GradebookError::RoleDenied {
                role: role.to_string(),
                action: format!("open the {} view", view.as_str()),
            });
        }
        self.dialog = None;
        if view == View::AddGrade {
            if self.active_view != View::AddGrade || self.grade_draft.is_none() {
                self.grade_draft = Some(GradeDraft::blank(today));
            }
        } else {
            self.grade_draft = None;
        }
        self.active_view = view;
        Ok(())
    }

    pub fn set_query(&mut self, role: Role, view: View, patch: QueryPatch) -> Result<&QueryParams> {
        if !role_allows_view(role, view) {
            return Err(GradebookError::RoleDenied {
                role: role.to_string(),
                action: format!("query the {} view", view.as_str()),
            });
        }
        let Some(params) = self.params_mut(view) else {
            return Err(GradebookError::validation(
                "view",
                format!("{} has no query parameters", view.as_str()),
            ));
        };
        patch.apply(params);
        Ok(&*params)
    }

    pub fn open_dialog(&mut self, role: Role, dialog: Dialog) -> Result<()> {
        let action = match dialog {
            Dialog::AddStudent => "add students",
            Dialog::AddSubject => "add subjects",
        };
        require_teacher(role, action)?;
        self.dialog = Some(dialog);
        Ok(())
    }

    pub fn close_dialog(&mut self) {
        self.dialog = None;
    }

    /// Close `dialog` if it is the one currently open.
    pub fn complete_dialog(&mut self, dialog: Dialog) {
        if self.dialog == Some(dialog) {
            self.dialog = None;
        }
    }

    /// Called after a successful add-grade submission.
    pub fn finish_grade_entry(&mut self) {
        self.grade_draft = None;
        self.active_view = View::Grades;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 6).expect("date")
    }

    #[test]
    fn starts_on_overview() {
        let s = ViewSession::default();
        assert_eq!(s.active_view, View::Overview);
        assert_eq!(s.dialog, None);
        assert_eq!(s.grade_draft, None);
        assert_eq!(s.grades, QueryParams::default());
    }

    #[test]
    fn add_grade_draft_lives_with_the_view() {
        let mut s = ViewSession::default();
        s.navigate(Role::Teacher, View::AddGrade, today()).expect("nav");
        let draft = s.grade_draft.as_ref().expect("draft");
        assert_eq!(draft.date.as_deref(), Some("2024-05-06"));

        s.grade_draft.as_mut().expect("draft").student_id = "1".into();
        // Re-selecting the same view keeps what was typed.
        s.navigate(Role::Teacher, View::AddGrade, today()).expect("nav");
        assert_eq!(s.grade_draft.as_ref().map(|d| d.student_id.as_str()), Some("1"));

        s.navigate(Role::Teacher, View::Subjects, today()).expect("nav");
        assert_eq!(s.grade_draft, None);
    }

    #[test]
    fn student_cannot_reach_teacher_views() {
        let mut s = ViewSession::default();
        let before = s.clone();
        for view in [View::Students, View::AddGrade] {
            let e = s.navigate(Role::Student, view, today()).expect_err("denied");
            assert_eq!(e.code(), "role_denied");
        }
        assert!(s.open_dialog(Role::Student, Dialog::AddSubject).is_err());
        assert_eq!(s, before);

        s.navigate(Role::Student, View::Grades, today()).expect("grades");
        assert_eq!(s.active_view, View::Grades);
    }

    #[test]
    fn navigation_closes_dialogs() {
        let mut s = ViewSession::default();
        s.navigate(Role::Teacher, View::Students, today()).expect("nav");
        s.open_dialog(Role::Teacher, Dialog::AddStudent).expect("open");
        assert_eq!(s.dialog, Some(Dialog::AddStudent));
        s.navigate(Role::Teacher, View::Overview, today()).expect("nav");
        assert_eq!(s.dialog, None);
    }

    #[test]
    fn query_patch_merges() {
        let mut s = ViewSession::default();
        let mut filters = BTreeMap::new();
        filters.insert("subjectName".to_string(), "Physics".to_string());
        s.set_query(
            Role::Teacher,
            View::Grades,
            QueryPatch {
                search_term: Some("bob".into()),
                filters: Some(filters),
                ..QueryPatch::default()
            },
        )
        .expect("patch");
        s.set_query(
            Role::Teacher,
            View::Grades,
            QueryPatch {
                sort_key: Some("grade".into()),
                sort_order: Some(SortOrder::Desc),
                ..QueryPatch::default()
            },
        )
        .expect("patch");
        assert_eq!(s.grades.search_term, "bob");
        assert_eq!(s.grades.filters.get("subjectName").map(String::as_str), Some("Physics"));
        assert_eq!(s.grades.sort_order, SortOrder::Desc);

        let e = s
            .set_query(Role::Teacher, View::Overview, QueryPatch::default())
            .expect_err("overview");
        assert_eq!(e.code(), "validation_failed");
    }
}
