use crate::ipc::error::{fail, ok};
use crate::ipc::helpers::{decode_params, decode_record, not_logged_in, require_str};
use crate::ipc::types::{AppState, Request};
use crate::model::{Student, StudentDraft};
use serde_json::json;

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Ok(book) = state.gate.current() else {
        return not_logged_in(req);
    };
    match book.list_students() {
        Ok(students) => ok(
            &req.id,
            json!({
                "students": students,
                "total": book.store().students.len(),
                "params": &book.view().students,
            }),
        ),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_students_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let draft: StudentDraft = match decode_params(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Ok(book) = state.gate.current_mut() else {
        return not_logged_in(req);
    };
    match book.add_student(draft) {
        Ok(student) => ok(&req.id, json!({ "studentId": student.id, "student": student })),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_students_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student: Student = match decode_record(req, "student") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Ok(book) = state.gate.current_mut() else {
        return not_logged_in(req);
    };
    let id = student.id.clone();
    match book.update_student(student) {
        Ok(found) => ok(
            &req.id,
            json!({
                "updated": found,
                "student": book.store().find_student(&id),
            }),
        ),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_students_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student_id = match require_str(req, "studentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Ok(book) = state.gate.current_mut() else {
        return not_logged_in(req);
    };
    match book.remove_student(&student_id) {
        Ok(removed) => ok(&req.id, json!({ "removed": removed })),
        Err(e) => fail(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_students_list(state, req)),
        "students.create" => Some(handle_students_create(state, req)),
        "students.update" => Some(handle_students_update(state, req)),
        "students.delete" => Some(handle_students_delete(state, req)),
        _ => None,
    }
}
