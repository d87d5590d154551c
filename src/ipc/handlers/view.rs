use crate::ipc::error::{err, fail, ok};
use crate::ipc::helpers::{decode_params, not_logged_in, require_str, require_view};
use crate::ipc::types::{AppState, Request};
use crate::view::{Dialog, QueryPatch};
use serde_json::json;

fn handle_view_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Ok(book) = state.gate.current() else {
        return not_logged_in(req);
    };
    ok(&req.id, json!({ "session": book.view() }))
}

fn handle_view_navigate(state: &mut AppState, req: &Request) -> serde_json::Value {
    let view = match require_view(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Ok(book) = state.gate.current_mut() else {
        return not_logged_in(req);
    };
    match book.navigate(view) {
        Ok(session) => ok(&req.id, json!({ "session": session })),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_view_set_query(state: &mut AppState, req: &Request) -> serde_json::Value {
    let view = match require_view(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let patch: QueryPatch = match decode_params(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Ok(book) = state.gate.current_mut() else {
        return not_logged_in(req);
    };
    match book.set_query(view, patch) {
        Ok(params) => ok(&req.id, json!({ "view": view, "params": params })),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_view_open_dialog(state: &mut AppState, req: &Request) -> serde_json::Value {
    let raw = match require_str(req, "dialog") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(dialog) = Dialog::parse(&raw) else {
        return err(
            &req.id,
            "bad_params",
            format!("unknown dialog: {raw}"),
            Some(json!({ "allowed": ["add-student", "add-subject"] })),
        );
    };
    let Ok(book) = state.gate.current_mut() else {
        return not_logged_in(req);
    };
    match book.open_dialog(dialog) {
        Ok(()) => ok(&req.id, json!({ "dialog": dialog })),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_view_close_dialog(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Ok(book) = state.gate.current_mut() else {
        return not_logged_in(req);
    };
    book.close_dialog();
    ok(&req.id, json!({ "dialog": null }))
}

fn handle_overview_stats(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Ok(book) = state.gate.current() else {
        return not_logged_in(req);
    };
    ok(
        &req.id,
        json!({ "role": book.role(), "stats": book.overview() }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "view.get" => Some(handle_view_get(state, req)),
        "view.navigate" => Some(handle_view_navigate(state, req)),
        "view.setQuery" => Some(handle_view_set_query(state, req)),
        "view.openDialog" => Some(handle_view_open_dialog(state, req)),
        "view.closeDialog" => Some(handle_view_close_dialog(state, req)),
        "overview.stats" => Some(handle_overview_stats(state, req)),
        _ => None,
    }
}
