use crate::ipc::helpers::{
    get_optional_date, get_required_str, parse_date, require_row, with_db, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::stats::{derive_task_state, TaskEvent, TaskProgress, DEFAULT_PASS_RATIO};
use chrono::{Local, NaiveDate};
use rusqlite::{Connection, OptionalExtension};
use serde_json::json;
use tracing::info;

struct Submission {
    progress: TaskProgress,
    row_id: Option<String>,
}

/// Loads the task as `student_id` sees it. The student must be enrolled in the
/// classroom the task's course belongs to.
fn load_submission(
    conn: &Connection,
    task_id: &str,
    student_id: &str,
) -> Result<Submission, HandlerErr> {
    let task: Option<(String, f64, String)> = conn
        .query_row(
            "SELECT t.due_date, t.max_score, c.classroom_id
             FROM tasks t JOIN courses c ON c.id = t.course_id
             WHERE t.id = ?",
            [task_id],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .optional()?;
    let Some((due_date, max_score, classroom_id)) = task else {
        return Err(HandlerErr::not_found("task", task_id));
    };
    require_row(conn, "students", "student", student_id)?;

    let enrolled = conn
        .query_row(
            "SELECT 1 FROM enrollments WHERE student_id = ? AND classroom_id = ?",
            (student_id, &classroom_id),
            |r| r.get::<_, i64>(0),
        )
        .optional()?
        .is_some();
    if !enrolled {
        return Err(HandlerErr {
            code: "bad_params",
            message: "student is not enrolled in the task's classroom".to_string(),
            details: Some(json!({ "taskId": task_id, "studentId": student_id })),
        });
    }

    let existing: Option<(String, String, Option<f64>)> = conn
        .query_row(
            "SELECT id, submitted_at, score FROM task_submissions WHERE task_id = ? AND student_id = ?",
            (task_id, student_id),
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .optional()?;

    let (row_id, submitted_at, score) = match existing {
        Some((id, at, score)) => (Some(id), Some(parse_date(&at, "submitted_at")?), score),
        None => (None, None, None),
    };
    Ok(Submission {
        progress: TaskProgress {
            due_date: parse_date(&due_date, "due_date")?,
            max_score,
            submitted_at,
            score,
        },
        row_id,
    })
}

fn tasks_submit(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let task_id = get_required_str(params, "taskId")?;
    let student_id = get_required_str(params, "studentId")?;
    let submitted_at: NaiveDate =
        get_optional_date(params, "submittedAt")?.unwrap_or_else(|| Local::now().date_naive());

    let current = load_submission(conn, &task_id, &student_id)?;
    let from = derive_task_state(&current.progress, submitted_at)?;
    let to = from.apply(TaskEvent::Submit)?;

    let school_id: String =
        conn.query_row("SELECT school_id FROM tasks WHERE id = ?", [&task_id], |r| r.get(0))?;
    conn.execute(
        "INSERT INTO task_submissions(id, school_id, task_id, student_id, submitted_at, score)
         VALUES(?, ?, ?, ?, ?, NULL)",
        (
            uuid::Uuid::new_v4().to_string(),
            &school_id,
            &task_id,
            &student_id,
            submitted_at.to_string(),
        ),
    )?;
    info!(task = %task_id, student = %student_id, from = from.as_str(), "task submitted");

    Ok(json!({
        "taskId": task_id,
        "studentId": student_id,
        "previous": from,
        "state": to,
        "late": submitted_at > current.progress.due_date,
    }))
}

fn tasks_grade(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let task_id = get_required_str(params, "taskId")?;
    let student_id = get_required_str(params, "studentId")?;
    let Some(score) = params.get("score").and_then(|v| v.as_f64()) else {
        return Err(HandlerErr::bad_params("missing score"));
    };

    let current = load_submission(conn, &task_id, &student_id)?;
    let max_score = current.progress.max_score;
    if !(0.0..=max_score).contains(&score) {
        return Err(HandlerErr {
            code: "bad_params",
            message: format!("score must be between 0 and {}", max_score),
            details: None,
        });
    }
    let today = Local::now().date_naive();
    let from = derive_task_state(&current.progress, today)?;
    let to = from.apply(TaskEvent::Grade)?;

    let Some(row_id) = current.row_id else {
        return Err(HandlerErr::db("submission row missing for a submitted task"));
    };
    conn.execute(
        "UPDATE task_submissions SET score = ? WHERE id = ?",
        (score, &row_id),
    )?;
    info!(task = %task_id, student = %student_id, score, "task graded");

    Ok(json!({
        "taskId": task_id,
        "studentId": student_id,
        "previous": from,
        "state": to,
        "score": score,
        "passed": score >= max_score * DEFAULT_PASS_RATIO,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "tasks.submit" => Some(with_db(state, req, tasks_submit)),
        "tasks.grade" => Some(with_db(state, req, tasks_grade)),
        _ => None,
    }
}
