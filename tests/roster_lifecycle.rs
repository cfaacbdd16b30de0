use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

const TUTOR_CODE: &str = "tutor-secret";

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar(db_path: &Path) -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_attendanced");
    let workdir = db_path.parent().expect("db dir");
    let mut child = Command::new(exe)
        .current_dir(workdir)
        .env("ATTENDANCE_GATEWAY_URL", format!("sqlite:{}", db_path.to_string_lossy()))
        .env("ATTENDANCE_GATEWAY_KEY", "local")
        .env("ATTENDANCE_TUTOR_CODE", TUTOR_CODE)
        .env_remove("ATTENDANCE_TUTOR_CODE_SHA256")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn attendanced");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request_ok(
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
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown error")
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
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

fn error_code(resp: &serde_json::Value) -> Option<&str> {
    resp.get("error").and_then(|e| e.get("code")).and_then(|v| v.as_str())
}

fn error_message(resp: &serde_json::Value) -> Option<&str> {
    resp.get("error").and_then(|e| e.get("message")).and_then(|v| v.as_str())
}

fn names(roster: &serde_json::Value) -> Vec<String> {
    roster
        .get("students")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .filter_map(|s| s.get("name").and_then(|v| v.as_str()).map(|s| s.to_string()))
        .collect()
}

fn student_id(roster: &serde_json::Value, name: &str) -> String {
    roster["students"]
        .as_array()
        .expect("students")
        .iter()
        .find(|s| s["name"] == name)
        .and_then(|s| s["id"].as_str())
        .expect("student id")
        .to_string()
}

#[test]
fn roster_is_loaded_at_startup_and_ordered_by_name() {
    let workspace = temp_dir("attendanced-roster-order");
    let db_path = workspace.join("a.sqlite3");
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&db_path);
    let empty = request_ok(&mut stdin, &mut reader, "1", "roster.list", json!({}));
    assert_eq!(empty["loaded"], true);
    assert!(names(&empty).is_empty());

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "session.loginTutor",
        json!({ "code": TUTOR_CODE }),
    );
    for (i, n) in ["Ravi", "Asha", "Meera"].iter().enumerate() {
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            &format!("a{i}"),
            "roster.add",
            json!({ "name": n }),
        );
    }
    drop(stdin);
    let _ = child.wait();

    let (_child, mut stdin, mut reader) = spawn_sidecar(&db_path);
    let state = request_ok(&mut stdin, &mut reader, "3", "app.state", json!({}));
    assert_eq!(state["studentsLoaded"], true);
    let roster = request_ok(&mut stdin, &mut reader, "4", "roster.list", json!({}));
    assert_eq!(names(&roster), vec!["Asha", "Meera", "Ravi"]);
    let created = roster["students"][0]["createdAt"].as_str().unwrap_or("");
    assert!(!created.is_empty());
}

#[test]
fn blank_names_are_rejected_inline() {
    let workspace = temp_dir("attendanced-roster-blank");
    let (_child, mut stdin, mut reader) = spawn_sidecar(&workspace.join("a.sqlite3"));
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "session.loginTutor",
        json!({ "code": TUTOR_CODE }),
    );

    for (i, n) in ["", "   ", "\t"].iter().enumerate() {
        let resp = request(
            &mut stdin,
            &mut reader,
            &format!("b{i}"),
            "roster.add",
            json!({ "name": n }),
        );
        assert_eq!(error_code(&resp), Some("validation"));
        assert_eq!(error_message(&resp), Some("Please enter a student name"));
    }
    let missing = request(&mut stdin, &mut reader, "2", "roster.add", json!({}));
    assert_eq!(error_code(&missing), Some("bad_params"));

    let roster = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "roster.add",
        json!({ "name": "  Asha  " }),
    );
    assert_eq!(names(&roster), vec!["Asha"]);
}

#[test]
fn delete_needs_confirmation_and_cascades_attendance() {
    let workspace = temp_dir("attendanced-roster-delete");
    let (_child, mut stdin, mut reader) = spawn_sidecar(&workspace.join("a.sqlite3"));
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "session.loginTutor",
        json!({ "code": TUTOR_CODE }),
    );
    let _ = request_ok(&mut stdin, &mut reader, "2", "roster.add", json!({ "name": "Asha" }));
    let roster = request_ok(&mut stdin, &mut reader, "3", "roster.add", json!({ "name": "Ravi" }));
    let ravi = student_id(&roster, "Ravi");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "calendar.setMonth",
        json!({ "month": "2024-03" }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "calendar.selectStudent",
        json!({ "studentId": ravi }),
    );
    let _ = request_ok(&mut stdin, &mut reader, "6", "attendance.open", json!({ "day": 5 }));
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "attendance.update",
        json!({ "status": "holiday" }),
    );
    let _ = request_ok(&mut stdin, &mut reader, "8", "attendance.save", json!({}));

    let nothing = request(&mut stdin, &mut reader, "9", "roster.confirmDelete", json!({}));
    assert_eq!(error_code(&nothing), Some("bad_params"));
    let unknown = request(
        &mut stdin,
        &mut reader,
        "10",
        "roster.requestDelete",
        json!({ "studentId": "nobody" }),
    );
    assert_eq!(error_code(&unknown), Some("not_found"));

    let confirm = request_ok(
        &mut stdin,
        &mut reader,
        "11",
        "roster.requestDelete",
        json!({ "studentId": ravi }),
    );
    assert_eq!(confirm["confirm"]["name"], "Ravi");
    let cancelled = request_ok(&mut stdin, &mut reader, "12", "roster.cancelDelete", json!({}));
    assert_eq!(names(&cancelled), vec!["Asha", "Ravi"]);
    assert!(cancelled["pendingDelete"].is_null());

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "13",
        "roster.requestDelete",
        json!({ "studentId": ravi }),
    );
    let state = request_ok(&mut stdin, &mut reader, "14", "app.state", json!({}));
    assert_eq!(state["pendingDelete"], ravi.as_str());
    let after = request_ok(&mut stdin, &mut reader, "15", "roster.confirmDelete", json!({}));
    assert_eq!(names(&after), vec!["Asha"]);

    // The selection pointed at Ravi and is gone with him.
    let state = request_ok(&mut stdin, &mut reader, "16", "app.state", json!({}));
    assert!(state["selectedStudentId"].is_null());

    // Re-adding the same name yields a new identity with no attendance.
    let roster = request_ok(&mut stdin, &mut reader, "17", "roster.add", json!({ "name": "Ravi" }));
    let new_ravi = student_id(&roster, "Ravi");
    assert_ne!(new_ravi, ravi);
    let gone = request(
        &mut stdin,
        &mut reader,
        "18",
        "calendar.selectStudent",
        json!({ "studentId": ravi }),
    );
    assert_eq!(error_code(&gone), Some("not_found"));
    let view = request_ok(
        &mut stdin,
        &mut reader,
        "19",
        "calendar.selectStudent",
        json!({ "studentId": new_ravi }),
    );
    assert!(view["cells"]
        .as_array()
        .expect("cells")
        .iter()
        .all(|c| c.get("status").is_none()));
}
