use std::process::Command;

fn colegiod() -> Command {
    Command::new(env!("CARGO_BIN_EXE_colegiod"))
}

#[test]
fn seed_then_counts_from_the_command_line() {
    let workspace = tempfile::tempdir().expect("temp workspace");
    let config = workspace.path().join("seed.json");
    std::fs::write(
        &config,
        r#"{ "passwordHash": { "memoryKib": 64, "iterations": 1, "parallelism": 1 },
             "school": { "name": "Colegio de Prueba" } }"#,
    )
    .expect("write config");

    let out = colegiod()
        .args(["seed", "--workspace"])
        .arg(workspace.path())
        .arg("--config")
        .arg(&config)
        .args(["--seed", "5", "--reference-date", "2024-06-14"])
        .env("COLEGIOD_LOG", "warn")
        .output()
        .expect("run seed");
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let summary: serde_json::Value = serde_json::from_slice(&out.stdout).expect("summary json");
    assert_eq!(summary["rngSeed"].as_u64(), Some(5));
    assert_eq!(summary["referenceDate"].as_str(), Some("2024-06-14"));

    let out = colegiod()
        .args(["counts", "--workspace"])
        .arg(workspace.path())
        .output()
        .expect("run counts");
    assert!(out.status.success());
    let counts: serde_json::Value = serde_json::from_slice(&out.stdout).expect("counts json");
    assert_eq!(counts["students"].as_i64(), Some(60));
    assert_eq!(counts, summary["counts"]);

    let conn = rusqlite::Connection::open(workspace.path().join("colegio.sqlite3")).expect("db");
    let name: String = conn
        .query_row("SELECT name FROM schools", [], |r| r.get(0))
        .expect("school");
    assert_eq!(name, "Colegio de Prueba");
}

#[test]
fn failed_seed_exits_non_zero_and_keeps_nothing() {
    let workspace = tempfile::tempdir().expect("temp workspace");
    let config = workspace.path().join("crowded.json");
    // 40 students do not fit a 30-seat Primaria classroom.
    std::fs::write(
        &config,
        r#"{ "passwordHash": { "memoryKib": 64, "iterations": 1, "parallelism": 1 },
             "studentsPerClassroom": { "inicial": 8, "other": 40 } }"#,
    )
    .expect("write config");

    let out = colegiod()
        .args(["seed", "--workspace"])
        .arg(workspace.path())
        .arg("--config")
        .arg(&config)
        .args(["--seed", "1"])
        .output()
        .expect("run seed");
    assert!(!out.status.success());

    let out = colegiod()
        .args(["counts", "--workspace"])
        .arg(workspace.path())
        .output()
        .expect("run counts");
    let counts: serde_json::Value = serde_json::from_slice(&out.stdout).expect("counts json");
    assert_eq!(counts["schools"].as_i64(), Some(0));
    assert_eq!(counts["students"].as_i64(), Some(0));
}
