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

fn login(stdin: &mut ChildStdin, reader: &mut BufReader<ChildStdout>, name: &str, role: &str) {
    let _ = request_ok(
        stdin,
        reader,
        "login",
        "session.login",
        json!({ "name": name, "role": role }),
    );
}

#[test]
fn student_cannot_mutate_anything() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&[]);
    login(&mut stdin, &mut reader, "Alice Johnson", "student");

    let attempts: Vec<(&str, serde_json::Value)> = vec![
        ("students.delete", json!({ "studentId": "1" })),
        ("students.create", json!({ "firstName": "Eve", "lastName": "X", "email": "e@x" })),
        ("students.list", json!({})),
        ("subjects.create", json!({ "name": "Art", "description": "d", "teacherName": "t" })),
        ("subjects.delete", json!({ "subjectId": "1" })),
        ("grades.delete", json!({ "gradeId": "1" })),
        ("addGrade.options", json!({})),
        ("view.navigate", json!({ "view": "students" })),
        ("view.navigate", json!({ "view": "add-grade" })),
        ("view.openDialog", json!({ "dialog": "add-subject" })),
    ];
    for (i, (method, params)) in attempts.into_iter().enumerate() {
        let resp = request(&mut stdin, &mut reader, &format!("a{i}"), method, params);
        assert_eq!(error_code(&resp), Some("role_denied"), "{method}");
    }

    let view = request_ok(&mut stdin, &mut reader, "v", "view.get", json!({}));
    assert_eq!(view["session"]["activeView"], "overview");
    assert!(view["session"]["dialog"].is_null());

    // Data is untouched after the rejected calls.
    let subjects = request_ok(&mut stdin, &mut reader, "s", "subjects.list", json!({}));
    assert_eq!(subjects["subjects"].as_array().map(|a| a.len()), Some(4));
    let grades = request_ok(&mut stdin, &mut reader, "g", "grades.list", json!({}));
    assert_eq!(grades["count"], 2);
    let stats = request_ok(&mut stdin, &mut reader, "o", "overview.stats", json!({}));
    assert_eq!(stats["stats"]["activeSubjects"], 4);
    assert!(stats["stats"].get("totalStudents").is_none());

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn student_grades_are_limited_to_their_name() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&[]);
    login(&mut stdin, &mut reader, "alice johnson", "student");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "view.navigate",
        json!({ "view": "grades" }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "view.setQuery",
        json!({ "view": "grades", "filters": { "studentName": "Bob Smith" }, "sortKey": "grade", "sortOrder": "asc" }),
    );
    let grades = request_ok(&mut stdin, &mut reader, "3", "grades.list", json!({}));
    let rows = grades["grades"].as_array().expect("grades");
    let values: Vec<f64> = rows.iter().filter_map(|g| g["grade"].as_f64()).collect();
    assert_eq!(values, vec![88.0, 92.0]);
    assert!(rows.iter().all(|g| g["studentName"] == "Alice Johnson"));
    assert_eq!(rows[1]["letter"], "A");

    let options = request_ok(&mut stdin, &mut reader, "4", "grades.filterOptions", json!({}));
    assert_eq!(options["students"].as_array().map(|a| a.len()), Some(0));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn unknown_student_sees_no_grades() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&[]);
    login(&mut stdin, &mut reader, "Zed", "student");

    let grades = request_ok(&mut stdin, &mut reader, "1", "grades.list", json!({}));
    assert_eq!(grades["count"], 0);
    let stats = request_ok(&mut stdin, &mut reader, "2", "overview.stats", json!({}));
    assert_eq!(stats["stats"]["totalGrades"], 0);
    assert_eq!(stats["stats"]["averageScore"], 0.0);

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn teacher_sees_every_grade_and_filter_option() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&[]);
    login(&mut stdin, &mut reader, "Dr. Smith", "teacher");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "view.setQuery",
        json!({ "view": "grades", "filters": { "subjectName": "Mathematics", "studentName": "all" } }),
    );
    let grades = request_ok(&mut stdin, &mut reader, "2", "grades.list", json!({}));
    assert_eq!(grades["count"], 3);

    let options = request_ok(&mut stdin, &mut reader, "3", "grades.filterOptions", json!({}));
    assert_eq!(
        options["subjects"],
        json!(["Mathematics", "English Literature", "Physics"])
    );
    assert_eq!(
        options["students"],
        json!(["Alice Johnson", "Bob Smith", "Charlie Brown"])
    );

    let stats = request_ok(&mut stdin, &mut reader, "4", "overview.stats", json!({}));
    assert_eq!(stats["stats"]["totalStudents"], 3);
    assert_eq!(stats["stats"]["totalGrades"], 5);

    drop(stdin);
    let _ = child.wait();
}
