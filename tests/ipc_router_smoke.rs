use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar(extra_args: &[&str]) -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_gradebookd");
    let mut child = Command::new(exe)
        .args(["--today", "2024-09-02"])
        .args(extra_args)
        .env_remove("GRADEBOOKD_EMPTY")
        .env_remove("GRADEBOOKD_TODAY")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn gradebookd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn error_code(value: &serde_json::Value) -> Option<&str> {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
}

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&[]);

    let health = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(health.get("loggedIn").and_then(|v| v.as_bool()), Some(false));

    let denied = request(&mut stdin, &mut reader, "2", "grades.list", json!({}));
    assert_eq!(error_code(&denied), Some("not_logged_in"));

    let login = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "session.login",
        json!({ "name": "Dr. Smith", "role": "teacher" }),
    );
    let user_id = login
        .get("user")
        .and_then(|u| u.get("id"))
        .and_then(|v| v.as_str())
        .expect("user id")
        .to_string();
    assert!(!user_id.is_empty());

    let methods: Vec<(&str, serde_json::Value)> = vec![
        ("session.whoami", json!({})),
        ("view.get", json!({})),
        ("view.navigate", json!({ "view": "students" })),
        ("view.setQuery", json!({ "view": "students", "searchTerm": "a" })),
        ("view.openDialog", json!({ "dialog": "add-student" })),
        ("view.closeDialog", json!({})),
        ("overview.stats", json!({})),
        ("students.list", json!({})),
        ("subjects.list", json!({})),
        ("grades.list", json!({})),
        ("grades.filterOptions", json!({})),
        ("addGrade.options", json!({})),
    ];
    for (i, (method, params)) in methods.into_iter().enumerate() {
        let id = format!("m{i}");
        let _ = request_ok(&mut stdin, &mut reader, &id, method, params);
    }

    let unknown = request(&mut stdin, &mut reader, "4", "grades.explode", json!({}));
    assert_eq!(error_code(&unknown), Some("not_implemented"));

    let _ = request_ok(&mut stdin, &mut reader, "5", "session.logout", json!({}));
    let whoami = request_ok(&mut stdin, &mut reader, "6", "session.whoami", json!({}));
    assert!(whoami.get("user").map(|v| v.is_null()).unwrap_or(false));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn bad_json_line_gets_an_error_and_the_loop_continues() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&[]);

    writeln!(stdin, "{{not json").expect("write garbage");
    stdin.flush().expect("flush");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response");
    assert_eq!(value.get("ok").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(error_code(&value), Some("bad_json"));

    let _ = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn login_requires_a_name_and_a_known_role() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&[]);

    let blank = request(
        &mut stdin,
        &mut reader,
        "1",
        "session.login",
        json!({ "name": "   ", "role": "student" }),
    );
    assert_eq!(error_code(&blank), Some("validation_failed"));

    let role = request(
        &mut stdin,
        &mut reader,
        "2",
        "session.login",
        json!({ "name": "Ann", "role": "admin" }),
    );
    assert_eq!(error_code(&role), Some("bad_params"));

    let first = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "session.login",
        json!({ "name": "Ann", "role": "student" }),
    );
    let second = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "session.login",
        json!({ "name": "Ann", "role": "student" }),
    );
    assert_ne!(first["user"]["id"], second["user"]["id"]);
    assert_eq!(second["user"]["role"], "student");

    drop(stdin);
    let _ = child.wait();
}
