use crate::error::{GradebookError, Result};
use crate::model::{
    validate_grade, Grade, GradeDraft, Student, StudentDraft, StudentStatus, Subject, SubjectDraft,
};
use crate::mutation;
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// All records of one login session. Collections are replaced wholesale on
/// every mutation; derived fields are recomputed whenever grades change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityStore {
    pub students: Vec<Student>,
    pub subjects: Vec<Subject>,
    pub grades: Vec<Grade>,
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn seed_student(id: &str, first: &str, last: &str, enrolled: NaiveDate, subjects: &[&str]) -> Student {
    Student {
        id: id.to_string(),
        first_name: first.to_string(),
        last_name: last.to_string(),
        email: format!("{}.{}@email.com", first.to_lowercase(), last.to_lowercase()),
        enrollment_date: enrolled,
        grade_count: 0,
        average_grade: 0.0,
        status: StudentStatus::Active,
        subjects: subjects.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
    }
}

fn seed_subject(id: &str, name: &str, description: &str, teacher: &str) -> Subject {
    Subject {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        teacher_name: teacher.to_string(),
        student_count: 0,
        average_grade: 0.0,
    }
}

fn require_filled(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(GradebookError::missing(field));
    }
    Ok(())
}

impl EntityStore {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Demo data set every new session starts from.
    pub fn seeded() -> Self {
        let students = vec![
            seed_student("1", "Alice", "Johnson", date(2024, 1, 15), &["Mathematics", "English Literature"]),
            seed_student("2", "Bob", "Smith", date(2024, 1, 20), &["Mathematics", "Physics"]),
            seed_student("3", "Charlie", "Brown", date(2024, 2, 1), &["Mathematics"]),
        ];
        let subjects = vec![
            seed_subject("1", "Mathematics", "Advanced algebra and calculus concepts", "Dr. Smith"),
            seed_subject("2", "English Literature", "Classic and modern literature analysis", "Ms. Johnson"),
            seed_subject("3", "Physics", "Mechanics, thermodynamics, and electromagnetism", "Prof. Wilson"),
            seed_subject("4", "Chemistry", "Organic and inorganic chemistry fundamentals", "Dr. Brown"),
        ];

        let mut store = Self {
            students,
            subjects,
            grades: Vec::new(),
        };
        let seed_grades = [
            ("1", "1", "1", 92.0, date(2024, 1, 15)),
            ("2", "1", "2", 88.0, date(2024, 1, 18)),
            ("3", "2", "1", 78.0, date(2024, 1, 15)),
            ("4", "2", "3", 85.0, date(2024, 1, 20)),
            ("5", "3", "1", 95.0, date(2024, 1, 15)),
        ];
        for (id, student_id, subject_id, grade, on) in seed_grades {
            let student_name = store.find_student(student_id).map(Student::full_name);
            let (subject_name, teacher_name) = store
                .find_subject(subject_id)
                .map(|s| (s.name.clone(), s.teacher_name.clone()))
                .unwrap_or_default();
            store.grades.push(Grade {
                id: id.to_string(),
                student_id: student_id.to_string(),
                student_name: student_name.unwrap_or_default(),
                subject_id: subject_id.to_string(),
                subject_name,
                grade,
                date: on,
                teacher_name,
            });
        }
        store.recompute();
        store
    }

    pub fn find_student(&self, id: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.id == id)
    }

    pub fn find_subject(&self, id: &str) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.id == id)
    }

    fn recompute(&mut self) {
        let (students, subjects) =
            mutation::recompute_aggregates(&self.students, &self.subjects, &self.grades);
        self.students = students;
        self.subjects = subjects;
    }

    /// Fill the denormalized names on a grade draft from the referenced records.
    pub fn resolve_grade_draft(&self, mut draft: GradeDraft) -> GradeDraft {
        let student_id = draft.student_id.trim();
        let subject_id = draft.subject_id.trim();
        draft.student_name = self.find_student(student_id).map(Student::full_name);
        if let Some(subject) = self.find_subject(subject_id) {
            draft.subject_name = Some(subject.name.clone());
            draft.teacher_name = Some(subject.teacher_name.clone());
        } else {
            draft.subject_name = None;
            draft.teacher_name = None;
        }
        draft
    }

    pub fn add_student(&mut self, draft: StudentDraft, today: NaiveDate) -> Result<Student> {
        let (next, student) = mutation::add(&self.students, draft, today)?;
        self.students = next;
        self.recompute();
        Ok(student)
    }

    /// Rebuild the grade collection with `stamp` applied to every row that
    /// `select` picks.
    fn restamp_grades(&mut self, select: impl Fn(&Grade) -> bool, stamp: impl Fn(&mut Grade)) {
        self.grades = self
            .grades
            .iter()
            .cloned()
            .map(|mut g| {
                if select(&g) {
                    stamp(&mut g);
                }
                g
            })
            .collect();
    }

    /// Whole-record replacement. Derived fields are always recomputed, so
    /// caller-supplied counts and averages never stick. A rename is carried
    /// onto the student's grades.
    pub fn replace_student(&mut self, student: Student) -> Result<bool> {
        require_filled("firstName", &student.first_name)?;
        require_filled("lastName", &student.last_name)?;
        require_filled("email", &student.email)?;
        if self.find_student(&student.id).is_none() {
            return Ok(false);
        }
        let id = student.id.clone();
        let name = student.full_name();
        self.students = mutation::replace(&self.students, student);
        self.restamp_grades(|g| g.student_id == id, |g| g.student_name = name.clone());
        self.recompute();
        Ok(true)
    }

    /// Whole-record replacement; grades of the subject pick up its new name
    /// and teacher.
    pub fn replace_subject(&mut self, subject: Subject) -> Result<bool> {
        require_filled("name", &subject.name)?;
        require_filled("description", &subject.description)?;
        require_filled("teacherName", &subject.teacher_name)?;
        if self.find_subject(&subject.id).is_none() {
            return Ok(false);
        }
        let id = subject.id.clone();
        let (name, teacher) = (subject.name.clone(), subject.teacher_name.clone());
        self.subjects = mutation::replace(&self.subjects, subject);
        self.restamp_grades(
            |g| g.subject_id == id,
            |g| {
                g.subject_name = name.clone();
                g.teacher_name = teacher.clone();
            },
        );
        self.recompute();
        Ok(true)
    }

    /// Whole-record replacement of a grade. The value is range checked and the
    /// denormalized names are taken from the referenced student and subject.
    pub fn replace_grade(&mut self, mut grade: Grade) -> Result<bool> {
        grade.grade = validate_grade(grade.grade)?;
        let Some(student) = self.find_student(&grade.student_id) else {
            return Err(GradebookError::validation(
                "studentId",
                format!("unknown student: {}", grade.student_id),
            ));
        };
        grade.student_name = student.full_name();
        let Some(subject) = self.find_subject(&grade.subject_id) else {
            return Err(GradebookError::validation(
                "subjectId",
                format!("unknown subject: {}", grade.subject_id),
            ));
        };
        grade.subject_name = subject.name.clone();
        grade.teacher_name = subject.teacher_name.clone();
        if !self.grades.iter().any(|g| g.id == grade.id) {
            return Ok(false);
        }
        self.grades = mutation::replace(&self.grades, grade);
        self.recompute();
        Ok(true)
    }

    pub fn remove_student(&mut self, id: &str) -> bool {
        let before = self.students.len();
        self.students = mutation::remove(&self.students, id);
        self.students.len() != before
    }

    pub fn add_subject(&mut self, draft: SubjectDraft, today: NaiveDate) -> Result<Subject> {
        let (next, subject) = mutation::add(&self.subjects, draft, today)?;
        self.subjects = next;
        self.recompute();
        Ok(subject)
    }

    pub fn remove_subject(&mut self, id: &str) -> bool {
        let before = self.subjects.len();
        self.subjects = mutation::remove(&self.subjects, id);
        self.subjects.len() != before
    }

    pub fn add_grade(&mut self, draft: GradeDraft, today: NaiveDate) -> Result<Grade> {
        let draft = self.resolve_grade_draft(draft);
        let (next, grade) = mutation::add(&self.grades, draft, today)?;
        self.grades = next;
        self.recompute();
        Ok(grade)
    }

    pub fn remove_grade(&mut self, id: &str) -> bool {
        let before = self.grades.len();
        self.grades = mutation::remove(&self.grades, id);
        self.recompute();
        self.grades.len() != before
    }
}
