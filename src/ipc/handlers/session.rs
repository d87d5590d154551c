use crate::ipc::error::{err, fail, ok};
use crate::ipc::helpers::{param_str, require_str};
use crate::ipc::types::{AppState, Request};
use crate::model::Role;
use serde_json::json;

fn handle_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    let name = match require_str(req, "name") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let role = match param_str(req, "role") {
        Some("teacher") => Role::Teacher,
        Some("student") => Role::Student,
        Some(other) => {
            return err(
                &req.id,
                "bad_params",
                format!("unknown role: {other}"),
                Some(json!({ "allowed": ["teacher", "student"] })),
            )
        }
        None => return err(&req.id, "bad_params", "missing role", None),
    };

    match state.gate.login(&name, role) {
        Ok(user) => ok(&req.id, json!({ "user": user })),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_logout(state: &mut AppState, req: &Request) -> serde_json::Value {
    let user = state.gate.logout();
    ok(&req.id, json!({ "loggedOut": user.is_some() }))
}

fn handle_whoami(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, json!({ "user": state.gate.user() }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "session.login" => Some(handle_login(state, req)),
        "session.logout" => Some(handle_logout(state, req)),
        "session.whoami" => Some(handle_whoami(state, req)),
        _ => None,
    }
}
