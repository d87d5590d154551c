use crate::error::{GradebookError, Result};
use crate::model::{Grade, GradeDraft, Role, Student, StudentDraft, Subject, SubjectDraft, User};
use crate::query::{distinct, query, QueryParams};
use crate::session::{require_teacher, SessionSettings};
use crate::store::EntityStore;
use crate::view::{Dialog, QueryPatch, View, ViewSession};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

/// Dashboard figures, computed from the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_students: Option<usize>,
    pub active_subjects: usize,
    pub total_grades: usize,
    pub average_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeFilterOptions {
    pub subjects: Vec<String>,
    pub students: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Choice {
    pub id: String,
    pub name: String,
}

/// One logged-in principal with its store and view state. Every user action
/// is one method call that runs to completion.
#[derive(Debug)]
pub struct Gradebook {
    user: User,
    view: ViewSession,
    store: EntityStore,
    settings: SessionSettings,
}

impl Gradebook {
    pub fn new(user: User, store: EntityStore, settings: SessionSettings) -> Self {
        Self {
            user,
            view: ViewSession::default(),
            store,
            settings,
        }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn into_user(self) -> User {
        self.user
    }

    pub fn role(&self) -> Role {
        self.user.role
    }

    pub fn view(&self) -> &ViewSession {
        &self.view
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn today(&self) -> NaiveDate {
        self.settings.today()
    }

    pub fn navigate(&mut self, view: View) -> Result<&ViewSession> {
        let today = self.today();
        self.view.navigate(self.user.role, view, today)?;
        debug!(view = view.as_str(), "navigate");
        Ok(&self.view)
    }

    pub fn set_query(&mut self, view: View, patch: QueryPatch) -> Result<&QueryParams> {
        self.view.set_query(self.user.role, view, patch)
    }

    pub fn open_dialog(&mut self, dialog: Dialog) -> Result<()> {
        self.view.open_dialog(self.user.role, dialog)
    }

    pub fn close_dialog(&mut self) {
        self.view.close_dialog();
    }

    /// A grade is the student's own when its student name matches the login name.
    fn owns(&self, grade: &Grade) -> bool {
        grade.student_name.trim().to_lowercase() == self.user.name.trim().to_lowercase()
    }

    pub fn list_students(&self) -> Result<Vec<&Student>> {
        require_teacher(self.user.role, "manage students")?;
        Ok(query(&self.store.students, &self.view.students))
    }

    pub fn list_subjects(&self) -> Vec<&Subject> {
        query(&self.store.subjects, &self.view.subjects)
    }

    /// Grades under the current grades-view parameters. Students only see
    /// their own rows, and the student filter does not apply to them.
    pub fn list_grades(&self) -> Vec<&Grade> {
        match self.user.role {
            Role::Teacher => query(&self.store.grades, &self.view.grades),
            Role::Student => {
                let mut params = self.view.grades.clone();
                params.filters.remove("studentName");
                params.filters.remove("studentId");
                let mut rows = query(&self.store.grades, &params);
                rows.retain(|g| self.owns(g));
                rows
            }
        }
    }

    pub fn grade_filter_options(&self) -> GradeFilterOptions {
        match self.user.role {
            Role::Teacher => GradeFilterOptions {
                subjects: distinct(&self.store.grades, "subjectName"),
                students: distinct(&self.store.grades, "studentName"),
            },
            Role::Student => GradeFilterOptions {
                subjects: distinct(self.store.grades.iter().filter(|g| self.owns(g)), "subjectName"),
                students: Vec::new(),
            },
        }
    }

    pub fn overview(&self) -> OverviewStats {
        let grades: Vec<&Grade> = match self.user.role {
            Role::Teacher => self.store.grades.iter().collect(),
            Role::Student => self.store.grades.iter().filter(|g| self.owns(g)).collect(),
        };
        let average_score = if grades.is_empty() {
            0.0
        } else {
            grades.iter().map(|g| g.grade).sum::<f64>() / grades.len() as f64
        };
        OverviewStats {
            total_students: match self.user.role {
                Role::Teacher => Some(self.store.students.len()),
                Role::Student => None,
            },
            active_subjects: self.store.subjects.len(),
            total_grades: grades.len(),
            average_score,
        }
    }

    pub fn add_student(&mut self, draft: StudentDraft) -> Result<Student> {
        require_teacher(self.user.role, "add students")?;
        let today = self.today();
        let student = self.store.add_student(draft, today)?;
        self.view.complete_dialog(Dialog::AddStudent);
        info!(student_id = %student.id, "student added");
        Ok(student)
    }

    pub fn update_student(&mut self, student: Student) -> Result<bool> {
        require_teacher(self.user.role, "edit students")?;
        let id = student.id.clone();
        let found = self.store.replace_student(student)?;
        info!(student_id = %id, found, "student replaced");
        Ok(found)
    }

    pub fn remove_student(&mut self, id: &str) -> Result<bool> {
        require_teacher(self.user.role, "delete students")?;
        let removed = self.store.remove_student(id);
        info!(student_id = id, removed, "student removed");
        Ok(removed)
    }

    pub fn add_subject(&mut self, draft: SubjectDraft) -> Result<Subject> {
        require_teacher(self.user.role, "add subjects")?;
        let today = self.today();
        let subject = self.store.add_subject(draft, today)?;
        self.view.complete_dialog(Dialog::AddSubject);
        info!(subject_id = %subject.id, "subject added");
        Ok(subject)
    }

    pub fn update_subject(&mut self, subject: Subject) -> Result<bool> {
        require_teacher(self.user.role, "edit subjects")?;
        let id = subject.id.clone();
        let found = self.store.replace_subject(subject)?;
        info!(subject_id = %id, found, "subject replaced");
        Ok(found)
    }

    pub fn remove_subject(&mut self, id: &str) -> Result<bool> {
        require_teacher(self.user.role, "delete subjects")?;
        let removed = self.store.remove_subject(id);
        info!(subject_id = id, removed, "subject removed");
        Ok(removed)
    }

    pub fn update_grade(&mut self, grade: Grade) -> Result<bool> {
        require_teacher(self.user.role, "edit grades")?;
        let id = grade.id.clone();
        let found = self.store.replace_grade(grade)?;
        info!(grade_id = %id, found, "grade replaced");
        Ok(found)
    }

    pub fn remove_grade(&mut self, id: &str) -> Result<bool> {
        require_teacher(self.user.role, "delete grades")?;
        let removed = self.store.remove_grade(id);
        info!(grade_id = id, removed, "grade removed");
        Ok(removed)
    }

    /// Students and subjects offered by the add-grade form.
    pub fn grade_entry_choices(&self) -> Result<(Vec<Choice>, Vec<Choice>)> {
        require_teacher(self.user.role, "add grades")?;
        let students = self
            .store
            .students
            .iter()
            .map(|s| Choice {
                id: s.id.clone(),
                name: s.full_name(),
            })
            .collect();
        let subjects = self
            .store
            .subjects
            .iter()
            .map(|s| Choice {
                id: s.id.clone(),
                name: s.name.clone(),
            })
            .collect();
        Ok((students, subjects))
    }

    fn grade_draft_mut(&mut self) -> Result<&mut GradeDraft> {
        require_teacher(self.user.role, "add grades")?;
        if self.view.active_view != View::AddGrade {
            return Err(GradebookError::validation(
                "view",
                "open the add-grade view first",
            ));
        }
        let today = self.today();
        Ok(self
            .view
            .grade_draft
            .get_or_insert_with(|| GradeDraft::blank(today)))
    }

    pub fn update_grade_draft(&mut self, patch: GradeDraft) -> Result<&GradeDraft> {
        let draft = self.grade_draft_mut()?;
        draft.merge(patch);
        Ok(&*draft)
    }

    /// Submit the add-grade form. On success the draft is discarded and the
    /// session returns to the grades view. On failure the view is unchanged and
    /// the draft keeps `patch` merged in.
    pub fn submit_grade(&mut self, patch: Option<GradeDraft>) -> Result<Grade> {
        let draft = self.grade_draft_mut()?;
        if let Some(patch) = patch {
            draft.merge(patch);
        }
        let draft = draft.clone();
        let today = self.today();
        let grade = self.store.add_grade(draft, today)?;
        self.view.finish_grade_entry();
        info!(grade_id = %grade.id, student_id = %grade.student_id, "grade added");
        Ok(grade)
    }
}
