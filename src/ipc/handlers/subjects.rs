use crate::ipc::error::{fail, ok};
use crate::ipc::helpers::{decode_params, decode_record, not_logged_in, require_str};
use crate::ipc::types::{AppState, Request};
use crate::model::{Subject, SubjectDraft};
use serde_json::json;

fn handle_subjects_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Ok(book) = state.gate.current() else {
        return not_logged_in(req);
    };
    ok(
        &req.id,
        json!({
            "subjects": book.list_subjects(),
            "total": book.store().subjects.len(),
            "params": &book.view().subjects,
        }),
    )
}

fn handle_subjects_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let draft: SubjectDraft = match decode_params(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Ok(book) = state.gate.current_mut() else {
        return not_logged_in(req);
    };
    match book.add_subject(draft) {
        Ok(subject) => ok(&req.id, json!({ "subjectId": subject.id, "subject": subject })),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_subjects_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let subject: Subject = match decode_record(req, "subject") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Ok(book) = state.gate.current_mut() else {
        return not_logged_in(req);
    };
    let id = subject.id.clone();
    match book.update_subject(subject) {
        Ok(found) => ok(
            &req.id,
            json!({
                "updated": found,
                "subject": book.store().find_subject(&id),
            }),
        ),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_subjects_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let subject_id = match require_str(req, "subjectId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Ok(book) = state.gate.current_mut() else {
        return not_logged_in(req);
    };
    match book.remove_subject(&subject_id) {
        Ok(removed) => ok(&req.id, json!({ "removed": removed })),
        Err(e) => fail(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "subjects.list" => Some(handle_subjects_list(state, req)),
        "subjects.create" => Some(handle_subjects_create(state, req)),
        "subjects.update" => Some(handle_subjects_update(state, req)),
        "subjects.delete" => Some(handle_subjects_delete(state, req)),
        _ => None,
    }
}
