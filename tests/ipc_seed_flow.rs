use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_colegiod");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn colegiod");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn read_line(reader: &mut BufReader<ChildStdout>) -> serde_json::Value {
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response");
    serde_json::from_str(line.trim()).expect("parse response json")
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
    let value = read_line(reader);
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
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(true),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_default()
}

fn error_code(value: &serde_json::Value) -> Option<&str> {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
}

fn cheap_hash() -> serde_json::Value {
    json!({ "passwordHash": { "memoryKib": 64, "iterations": 1, "parallelism": 1 } })
}

#[test]
fn protocol_errors_do_not_stop_the_loop() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    writeln!(stdin, "this is not json").expect("write garbage");
    stdin.flush().expect("flush");
    let bad = read_line(&mut reader);
    assert_eq!(bad.get("ok").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(error_code(&bad), Some("bad_json"));

    let unknown = request(&mut stdin, &mut reader, "1", "grades.explode", json!({}));
    assert_eq!(error_code(&unknown), Some("not_implemented"));

    let early = request(&mut stdin, &mut reader, "2", "seed.counts", json!({}));
    assert_eq!(error_code(&early), Some("no_workspace"));

    let missing = request(&mut stdin, &mut reader, "3", "workspace.select", json!({}));
    assert_eq!(error_code(&missing), Some("bad_params"));

    let health = request_ok(&mut stdin, &mut reader, "4", "health", json!({}));
    assert_eq!(health.get("dbOpen").and_then(|v| v.as_bool()), Some(false));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn seed_run_populates_and_replaces_the_store() {
    let workspace = tempfile::tempdir().expect("temp workspace");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.path().to_string_lossy() }),
    );
    let empty = request_ok(&mut stdin, &mut reader, "2", "seed.counts", json!({}));
    assert_eq!(empty["counts"]["students"].as_i64(), Some(0));

    let params = json!({ "seed": 42, "referenceDate": "2024-06-14", "config": cheap_hash() });
    let first = request_ok(&mut stdin, &mut reader, "3", "seed.run", params.clone());
    let counts = &first["counts"];
    assert_eq!(first["rngSeed"].as_u64(), Some(42));
    assert_eq!(counts["schools"].as_i64(), Some(1));
    assert_eq!(counts["academic_years"].as_i64(), Some(1));
    assert_eq!(counts["periods"].as_i64(), Some(4));
    assert_eq!(counts["levels"].as_i64(), Some(3));
    assert_eq!(counts["grade_levels"].as_i64(), Some(14));
    assert_eq!(counts["classrooms"].as_i64(), Some(28));
    assert_eq!(counts["subjects"].as_i64(), Some(113));
    assert_eq!(counts["teachers"].as_i64(), Some(12));
    assert_eq!(counts["students"].as_i64(), Some(60));
    assert_eq!(counts["parents"].as_i64(), Some(120));
    // admin + teachers + students + parents
    assert_eq!(counts["users"].as_i64(), Some(1 + 12 + 60 + 120));
    assert_eq!(counts["workshops"].as_i64(), Some(8));
    assert_eq!(counts["payments"].as_i64(), Some(60 * 11));
    assert_eq!(first["curriculum"]["generated"].as_u64(), Some(113));

    let second = request_ok(&mut stdin, &mut reader, "4", "seed.run", params);
    assert_eq!(second["counts"], first["counts"]);

    let after = request_ok(&mut stdin, &mut reader, "5", "seed.counts", json!({}));
    assert_eq!(after["counts"], first["counts"]);

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn curriculum_generate_is_idempotent() {
    let workspace = tempfile::tempdir().expect("temp workspace");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.path().to_string_lossy() }),
    );

    let before = request(&mut stdin, &mut reader, "2", "curriculum.generate", json!({}));
    assert_eq!(error_code(&before), Some("not_found"));

    request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "seed.run",
        json!({ "seed": 3, "referenceDate": "2024-06-14", "config": cheap_hash() }),
    );
    let counts = request_ok(&mut stdin, &mut reader, "4", "seed.counts", json!({}));
    let units = counts["counts"]["curriculum_units"].as_i64();

    let again = request_ok(&mut stdin, &mut reader, "5", "curriculum.generate", json!({}));
    assert_eq!(again["generated"].as_u64(), Some(0));
    assert_eq!(again["skipped"].as_u64(), Some(113));

    let counts = request_ok(&mut stdin, &mut reader, "6", "seed.counts", json!({}));
    assert_eq!(counts["counts"]["curriculum_units"].as_i64(), units);

    let unknown = request(
        &mut stdin,
        &mut reader,
        "7",
        "curriculum.generate",
        json!({ "subjectId": "no-such-subject" }),
    );
    assert_eq!(error_code(&unknown), Some("not_found"));

    let report = request_ok(&mut stdin, &mut reader, "8", "integrity.check", json!({}));
    let issues = report["issues"].as_array().expect("issues");
    assert!(issues
        .iter()
        .all(|i| i["kind"].as_str() == Some("scheduleConflict")));

    drop(stdin);
    let _ = child.wait();
}
