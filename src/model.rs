use crate::error::{GradebookError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

pub const GRADE_MIN: f64 = 0.0;
pub const GRADE_MAX: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Teacher,
    Student,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Teacher => "teacher",
            Role::Student => "student",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudentStatus {
    #[default]
    Active,
    Inactive,
}

impl StudentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StudentStatus::Active => "active",
            StudentStatus::Inactive => "inactive",
        }
    }
}

/// Session principal. Self-asserted at login, never verified.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub enrollment_date: NaiveDate,
    pub grade_count: u32,
    pub average_grade: f64,
    pub status: StudentStatus,
    pub subjects: BTreeSet<String>,
}

impl Student {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    pub name: String,
    pub description: String,
    pub teacher_name: String,
    pub student_count: u32,
    pub average_grade: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
    pub id: String,
    pub student_id: String,
    pub student_name: String,
    pub subject_id: String,
    pub subject_name: String,
    pub grade: f64,
    pub date: NaiveDate,
    pub teacher_name: String,
}

/// Record with a stable opaque id, owned by the entity store.
pub trait Entity: Clone {
    fn id(&self) -> &str;
}

impl Entity for Student {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for Subject {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for Grade {
    fn id(&self) -> &str {
        &self.id
    }
}

/// User-entered form state that becomes a record once validated.
pub trait Draft {
    type Record: Entity;

    fn into_record(self, id: String, today: NaiveDate) -> Result<Self::Record>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudentDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub status: Option<StudentStatus>,
    pub enrollment_date: Option<String>,
    pub subjects: Vec<String>,
}

impl Draft for StudentDraft {
    type Record = Student;

    fn into_record(self, id: String, today: NaiveDate) -> Result<Student> {
        let first_name = required("firstName", &self.first_name)?;
        let last_name = required("lastName", &self.last_name)?;
        let email = required("email", &self.email)?;
        let enrollment_date = parse_date_or("enrollmentDate", self.enrollment_date.as_deref(), today)?;
        let subjects = self
            .subjects
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Student {
            id,
            first_name,
            last_name,
            email,
            enrollment_date,
            grade_count: 0,
            average_grade: 0.0,
            status: self.status.unwrap_or_default(),
            subjects,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubjectDraft {
    pub name: String,
    pub description: String,
    pub teacher_name: String,
}

impl Draft for SubjectDraft {
    type Record = Subject;

    fn into_record(self, id: String, _today: NaiveDate) -> Result<Subject> {
        Ok(Subject {
            id,
            name: required("name", &self.name)?,
            description: required("description", &self.description)?,
            teacher_name: required("teacherName", &self.teacher_name)?,
            student_count: 0,
            average_grade: 0.0,
        })
    }
}

/// Raw grade as typed into the form: a JSON number, free text, or any other
/// JSON value, which is kept so that it fails validation instead of decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GradeInput {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl GradeInput {
    fn is_blank(&self) -> bool {
        matches!(self, GradeInput::Text(s) if s.trim().is_empty())
    }

    pub fn parse(&self) -> Result<f64> {
        let value = match self {
            GradeInput::Number(v) => *v,
            GradeInput::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| invalid_grade())?,
            GradeInput::Other(_) => return Err(invalid_grade()),
        };
        validate_grade(value)
    }
}

fn invalid_grade() -> GradebookError {
    GradebookError::validation(
        "grade",
        format!("grade must be a number between {GRADE_MIN} and {GRADE_MAX}"),
    )
}

pub fn validate_grade(value: f64) -> Result<f64> {
    if !value.is_finite() || !(GRADE_MIN..=GRADE_MAX).contains(&value) {
        return Err(invalid_grade());
    }
    Ok(value)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GradeDraft {
    pub student_id: String,
    pub subject_id: String,
    pub grade: Option<GradeInput>,
    pub date: Option<String>,
    /// Denormalized copies filled in from the store before the draft is added.
    #[serde(skip)]
    pub student_name: Option<String>,
    #[serde(skip)]
    pub subject_name: Option<String>,
    #[serde(skip)]
    pub teacher_name: Option<String>,
}

impl GradeDraft {
    pub fn blank(today: NaiveDate) -> Self {
        Self {
            date: Some(today.format("%Y-%m-%d").to_string()),
            ..Self::default()
        }
    }

    /// Overlay the fields present in `other` onto this draft.
    pub fn merge(&mut self, other: GradeDraft) {
        if !other.student_id.is_empty() {
            self.student_id = other.student_id;
        }
        if !other.subject_id.is_empty() {
            self.subject_id = other.subject_id;
        }
        if other.grade.is_some() {
            self.grade = other.grade;
        }
        if other.date.is_some() {
            self.date = other.date;
        }
    }
}

impl Draft for GradeDraft {
    type Record = Grade;

    fn into_record(self, id: String, today: NaiveDate) -> Result<Grade> {
        let student_id = required("studentId", &self.student_id)?;
        let subject_id = required("subjectId", &self.subject_id)?;
        let grade = match &self.grade {
            Some(g) if !g.is_blank() => g.parse()?,
            _ => return Err(GradebookError::missing("grade")),
        };
        let date = parse_date_or("date", self.date.as_deref(), today)?;
        let Some(student_name) = self.student_name else {
            return Err(GradebookError::validation(
                "studentId",
                format!("unknown student: {student_id}"),
            ));
        };
        let Some(subject_name) = self.subject_name else {
            return Err(GradebookError::validation(
                "subjectId",
                format!("unknown subject: {subject_id}"),
            ));
        };

        Ok(Grade {
            id,
            student_id,
            student_name,
            subject_id,
            subject_name,
            grade,
            date,
            teacher_name: self.teacher_name.unwrap_or_default(),
        })
    }
}

fn required(field: &str, value: &str) -> Result<String> {
    let v = value.trim();
    if v.is_empty() {
        return Err(GradebookError::missing(field));
    }
    Ok(v.to_string())
}

fn parse_date_or(field: &str, raw: Option<&str>, fallback: NaiveDate) -> Result<NaiveDate> {
    match raw.map(str::trim) {
        None | Some("") => Ok(fallback),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
            GradebookError::validation(field, format!("{field} must be a YYYY-MM-DD date"))
        }),
    }
}

/// Letter on the A–F scale shown beside every grade.
pub fn letter_grade(grade: f64) -> char {
    if grade >= 90.0 {
        'A'
    } else if grade >= 80.0 {
        'B'
    } else if grade >= 70.0 {
        'C'
    } else if grade >= 60.0 {
        'D'
    } else {
        'F'
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).expect("date")
    }

    fn grade_draft(grade: GradeInput) -> GradeDraft {
        GradeDraft {
            student_id: "1".into(),
            subject_id: "1".into(),
            grade: Some(grade),
            student_name: Some("Alice Johnson".into()),
            subject_name: Some("Mathematics".into()),
            teacher_name: Some("Dr. Smith".into()),
            ..GradeDraft::default()
        }
    }

    #[test]
    fn grade_bounds_and_text() {
        for bad in [
            GradeInput::Number(-1.0),
            GradeInput::Number(100.1),
            GradeInput::Text("abc".into()),
            GradeInput::Text("NaN".into()),
        ] {
            let e = grade_draft(bad.clone())
                .into_record("g".into(), today())
                .expect_err("should reject");
            assert_eq!(e.code(), "validation_failed", "{bad:?}");
        }
        for (good, want) in [
            (GradeInput::Number(0.0), 0.0),
            (GradeInput::Number(100.0), 100.0),
            (GradeInput::Text(" 87.5 ".into()), 87.5),
        ] {
            let g = grade_draft(good).into_record("g".into(), today()).expect("accept");
            assert_eq!(g.grade, want);
            assert_eq!(g.date, today());
        }
    }

    #[test]
    fn non_numeric_json_grade_decodes_then_fails_validation() {
        for raw in [
            serde_json::json!(true),
            serde_json::json!([90]),
            serde_json::json!({ "value": 90 }),
        ] {
            let mut draft: GradeDraft = serde_json::from_value(serde_json::json!({
                "studentId": "2",
                "subjectId": "1",
                "grade": raw,
            }))
            .expect("decode draft");
            assert_eq!(draft.student_id, "2");
            draft.student_name = Some("Bob Smith".into());
            draft.subject_name = Some("Mathematics".into());
            let e = draft.into_record("g".into(), today()).expect_err("reject");
            assert!(matches!(e, GradebookError::Validation { ref field, .. } if field == "grade"), "{e:?}");
        }
    }

    #[test]
    fn blank_grade_is_a_missing_field() {
        let e = grade_draft(GradeInput::Text("  ".into()))
            .into_record("g".into(), today())
            .expect_err("blank");
        assert_eq!(
            e,
            GradebookError::Validation {
                field: "grade".into(),
                message: "grade is required".into()
            }
        );
    }

    #[test]
    fn student_draft_defaults() {
        let draft = StudentDraft {
            first_name: "Ann".into(),
            last_name: " Lee ".into(),
            email: "a@x.com".into(),
            ..StudentDraft::default()
        };
        let s = draft.into_record("s1".into(), today()).expect("student");
        assert_eq!(s.last_name, "Lee");
        assert_eq!(s.status, StudentStatus::Active);
        assert_eq!(s.enrollment_date, today());
        assert_eq!(s.grade_count, 0);
        assert_eq!(s.average_grade, 0.0);

        let missing = StudentDraft {
            first_name: "Ann".into(),
            ..StudentDraft::default()
        };
        let e = missing.into_record("s2".into(), today()).expect_err("missing");
        assert!(matches!(e, GradebookError::Validation { field, .. } if field == "lastName"));
    }

    #[test]
    fn letters_follow_ten_point_bands() {
        assert_eq!(letter_grade(95.0), 'A');
        assert_eq!(letter_grade(90.0), 'A');
        assert_eq!(letter_grade(89.9), 'B');
        assert_eq!(letter_grade(70.0), 'C');
        assert_eq!(letter_grade(60.0), 'D');
        assert_eq!(letter_grade(59.99), 'F');
    }
}
