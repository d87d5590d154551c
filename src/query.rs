use crate::model::{Grade, Student, Subject};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

/// Filter value that disables a field filter.
pub const FILTER_ALL: &str = "all";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryParams {
    pub search_term: String,
    pub filters: BTreeMap<String, String>,
    pub sort_key: String,
    pub sort_order: SortOrder,
}

impl QueryParams {
    pub fn active_filters(&self) -> impl Iterator<Item = (&str, &str)> {
        self.filters
            .iter()
            .filter(|(_, v)| v.as_str() != FILTER_ALL)
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<'a> {
    Text(Cow<'a, str>),
    Number(f64),
    Date(NaiveDate),
}

impl FieldValue<'_> {
    fn matches(&self, wanted: &str) -> bool {
        match self {
            FieldValue::Text(s) => s.as_ref() == wanted,
            FieldValue::Number(n) => wanted.trim().parse::<f64>().map(|w| w == *n).unwrap_or(false),
            FieldValue::Date(d) => NaiveDate::parse_from_str(wanted.trim(), "%Y-%m-%d")
                .map(|w| w == *d)
                .unwrap_or(false),
        }
    }

    fn render(&self) -> String {
        match self {
            FieldValue::Text(s) => s.to_string(),
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Field access used by search, filtering and sorting.
pub trait Queryable {
    /// Values the free-text search looks at.
    fn search_fields(&self) -> Vec<Cow<'_, str>>;

    /// Named field in its wire (camelCase) spelling; `None` for unknown names.
    fn field(&self, name: &str) -> Option<FieldValue<'_>>;
}

fn text(s: &str) -> Option<FieldValue<'_>> {
    Some(FieldValue::Text(Cow::Borrowed(s)))
}

impl Queryable for Student {
    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![Cow::Owned(self.full_name()), Cow::Borrowed(&self.email)]
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "id" => text(&self.id),
            "firstName" => text(&self.first_name),
            "lastName" => text(&self.last_name),
            "name" => Some(FieldValue::Text(Cow::Owned(self.full_name()))),
            "email" => text(&self.email),
            "enrollmentDate" => Some(FieldValue::Date(self.enrollment_date)),
            "gradeCount" => Some(FieldValue::Number(f64::from(self.grade_count))),
            "averageGrade" => Some(FieldValue::Number(self.average_grade)),
            "status" => text(self.status.as_str()),
            _ => None,
        }
    }
}

impl Queryable for Subject {
    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![Cow::Borrowed(&self.name), Cow::Borrowed(&self.teacher_name)]
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "id" => text(&self.id),
            "name" => text(&self.name),
            "description" => text(&self.description),
            "teacherName" => text(&self.teacher_name),
            "studentCount" => Some(FieldValue::Number(f64::from(self.student_count))),
            "averageGrade" => Some(FieldValue::Number(self.average_grade)),
            _ => None,
        }
    }
}

impl Queryable for Grade {
    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::Borrowed(&self.student_name),
            Cow::Borrowed(&self.subject_name),
            Cow::Borrowed(&self.teacher_name),
        ]
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "id" => text(&self.id),
            "studentId" => text(&self.student_id),
            "studentName" => text(&self.student_name),
            "subjectId" => text(&self.subject_id),
            "subjectName" => text(&self.subject_name),
            "grade" => Some(FieldValue::Number(self.grade)),
            "date" => Some(FieldValue::Date(self.date)),
            "teacherName" => text(&self.teacher_name),
            _ => None,
        }
    }
}

/// Case-folded comparison first, exact comparison to order case variants.
fn collate(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn compare_field<T: Queryable>(a: &T, b: &T, key: &str) -> Ordering {
    match (a.field(key), b.field(key)) {
        (Some(FieldValue::Text(x)), Some(FieldValue::Text(y))) => collate(&x, &y),
        (Some(FieldValue::Number(x)), Some(FieldValue::Number(y))) => {
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(FieldValue::Date(x)), Some(FieldValue::Date(y))) => x.cmp(&y),
        // Unknown key: neutral comparator keeps input order.
        _ => Ordering::Equal,
    }
}

fn matches_search<T: Queryable>(row: &T, needle: &str) -> bool {
    needle.is_empty()
        || row
            .search_fields()
            .iter()
            .any(|f| f.to_lowercase().contains(needle))
}

fn matches_filters<T: Queryable>(row: &T, params: &QueryParams) -> bool {
    params.active_filters().all(|(name, wanted)| match row.field(name) {
        Some(v) => v.matches(wanted),
        None => true,
    })
}

/// Search, filter, then stable-sort `collection`. Never mutates its input.
pub fn query<'a, T: Queryable>(collection: &'a [T], params: &QueryParams) -> Vec<&'a T> {
    let needle = params.search_term.to_lowercase();
    let mut rows: Vec<&T> = collection
        .iter()
        .filter(|row| matches_search(*row, &needle) && matches_filters(*row, params))
        .collect();

    if !params.sort_key.is_empty() {
        // `sort_by` is stable, so equal keys keep input order in both directions.
        rows.sort_by(|a, b| {
            let ord = compare_field(*a, *b, &params.sort_key);
            match params.sort_order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });
    }
    rows
}

/// Distinct renderings of `field`, first-seen order. Rows without the field are skipped.
pub fn distinct<'a, T: Queryable + 'a>(rows: impl IntoIterator<Item = &'a T>, field: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for row in rows {
        let Some(v) = row.field(field) else {
            continue;
        };
        let rendered = v.render();
        if seen.insert(rendered.clone()) {
            out.push(rendered);
        }
    }
    out
}
