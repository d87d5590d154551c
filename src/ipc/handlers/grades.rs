use crate::ipc::error::{fail, ok};
use crate::ipc::helpers::{decode_params, decode_record, not_logged_in, require_str};
use crate::ipc::types::{AppState, Request};
use crate::model::{letter_grade, Grade, GradeDraft};
use serde::Serialize;
use serde_json::json;

/// A grade as the table shows it, with its letter.
#[derive(Serialize)]
struct GradeRow<'a> {
    #[serde(flatten)]
    grade: &'a Grade,
    letter: char,
}

impl<'a> From<&'a Grade> for GradeRow<'a> {
    fn from(grade: &'a Grade) -> Self {
        Self {
            grade,
            letter: letter_grade(grade.grade),
        }
    }
}

fn handle_grades_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Ok(book) = state.gate.current() else {
        return not_logged_in(req);
    };
    let rows: Vec<GradeRow> = book.list_grades().into_iter().map(GradeRow::from).collect();
    ok(
        &req.id,
        json!({
            "count": rows.len(),
            "grades": rows,
            "params": &book.view().grades,
        }),
    )
}

fn handle_grades_filter_options(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Ok(book) = state.gate.current() else {
        return not_logged_in(req);
    };
    ok(&req.id, json!(book.grade_filter_options()))
}

fn handle_grades_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let grade: Grade = match decode_record(req, "grade") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Ok(book) = state.gate.current_mut() else {
        return not_logged_in(req);
    };
    let id = grade.id.clone();
    match book.update_grade(grade) {
        Ok(found) => {
            let row = book
                .store()
                .grades
                .iter()
                .find(|g| g.id == id)
                .map(GradeRow::from);
            ok(&req.id, json!({ "updated": found, "grade": row }))
        }
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_grades_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let grade_id = match require_str(req, "gradeId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Ok(book) = state.gate.current_mut() else {
        return not_logged_in(req);
    };
    match book.remove_grade(&grade_id) {
        Ok(removed) => ok(&req.id, json!({ "removed": removed })),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_add_grade_options(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Ok(book) = state.gate.current() else {
        return not_logged_in(req);
    };
    match book.grade_entry_choices() {
        Ok((students, subjects)) => ok(
            &req.id,
            json!({ "students": students, "subjects": subjects }),
        ),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_add_grade_set_draft(state: &mut AppState, req: &Request) -> serde_json::Value {
    let patch: GradeDraft = match decode_params(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Ok(book) = state.gate.current_mut() else {
        return not_logged_in(req);
    };
    match book.update_grade_draft(patch) {
        Ok(draft) => {
            let letter = draft
                .grade
                .as_ref()
                .and_then(|g| g.parse().ok())
                .map(letter_grade);
            ok(&req.id, json!({ "draft": draft, "letter": letter }))
        }
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_add_grade_submit(state: &mut AppState, req: &Request) -> serde_json::Value {
    let patch: GradeDraft = match decode_params(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Ok(book) = state.gate.current_mut() else {
        return not_logged_in(req);
    };
    match book.submit_grade(Some(patch)) {
        Ok(grade) => ok(
            &req.id,
            json!({
                "gradeId": grade.id,
                "grade": GradeRow::from(&grade),
                "activeView": book.view().active_view,
            }),
        ),
        Err(e) => fail(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grades.list" => Some(handle_grades_list(state, req)),
        "grades.filterOptions" => Some(handle_grades_filter_options(state, req)),
        "grades.update" => Some(handle_grades_update(state, req)),
        "grades.delete" => Some(handle_grades_delete(state, req)),
        "addGrade.options" => Some(handle_add_grade_options(state, req)),
        "addGrade.setDraft" => Some(handle_add_grade_set_draft(state, req)),
        "addGrade.submit" => Some(handle_add_grade_submit(state, req)),
        _ => None,
    }
}
