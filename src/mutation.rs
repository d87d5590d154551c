use crate::error::Result;
use crate::model::{Draft, Entity, Grade, Student, Subject};
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

fn fresh_id<T: Entity>(collection: &[T]) -> String {
    loop {
        let id = Uuid::new_v4().to_string();
        if collection.iter().all(|r| r.id() != id) {
            return id;
        }
    }
}

/// Validate `draft` and append it to a copy of `collection`.
///
/// The input collection is never modified; on a validation error nothing is
/// created. Returns the extended collection and the new record.
pub fn add<D: Draft>(
    collection: &[D::Record],
    draft: D,
    today: NaiveDate,
) -> Result<(Vec<D::Record>, D::Record)> {
    let record = draft.into_record(fresh_id(collection), today)?;
    let mut next = Vec::with_capacity(collection.len() + 1);
    next.extend_from_slice(collection);
    next.push(record.clone());
    Ok((next, record))
}

/// Copy of `collection` without the record with `id`. Absent ids are a no-op.
pub fn remove<T: Entity>(collection: &[T], id: &str) -> Vec<T> {
    collection.iter().filter(|r| r.id() != id).cloned().collect()
}

/// Whole-record replacement by id, keeping position. Absent ids are a no-op.
pub fn replace<T: Entity>(collection: &[T], record: T) -> Vec<T> {
    collection
        .iter()
        .map(|r| {
            if r.id() == record.id() {
                record.clone()
            } else {
                r.clone()
            }
        })
        .collect()
}

#[derive(Default)]
struct Tally {
    sum: f64,
    count: u32,
    students: HashSet<String>,
}

impl Tally {
    fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / f64::from(self.count)
        }
    }
}

/// Recompute every derived field from `grades`.
///
/// Students get `gradeCount`/`averageGrade` over grades with their id; subjects
/// get `studentCount` (distinct students) and `averageGrade` over grades with
/// their id. Records with no grades drop back to zero.
pub fn recompute_aggregates(
    students: &[Student],
    subjects: &[Subject],
    grades: &[Grade],
) -> (Vec<Student>, Vec<Subject>) {
    let mut by_student: HashMap<&str, Tally> = HashMap::new();
    let mut by_subject: HashMap<&str, Tally> = HashMap::new();
    for g in grades {
        let t = by_student.entry(g.student_id.as_str()).or_default();
        t.sum += g.grade;
        t.count += 1;

        let t = by_subject.entry(g.subject_id.as_str()).or_default();
        t.sum += g.grade;
        t.count += 1;
        t.students.insert(g.student_id.clone());
    }

    let students = students
        .iter()
        .map(|s| {
            let mut s = s.clone();
            let t = by_student.get(s.id.as_str());
            s.grade_count = t.map(|t| t.count).unwrap_or(0);
            s.average_grade = t.map(Tally::mean).unwrap_or(0.0);
            s
        })
        .collect();

    let subjects = subjects
        .iter()
        .map(|s| {
            let mut s = s.clone();
            let t = by_subject.get(s.id.as_str());
            s.student_count = t.map(|t| t.students.len() as u32).unwrap_or(0);
            s.average_grade = t.map(Tally::mean).unwrap_or(0.0);
            s
        })
        .collect();

    (students, subjects)
}
