use crate::ipc::helpers::{
    get_optional_str, get_required_str, parse_date, require_row, today_param, with_db, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::model::{AttendanceStatus, PaymentStatus};
use crate::seed::academics::MAX_SCORE;
use crate::stats::{self, AttendanceDay, PaymentLine, TaskProgress, DEFAULT_PASS_RATIO};
use rusqlite::Connection;
use serde_json::json;

fn to_json<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, HandlerErr> {
    serde_json::to_value(value).map_err(|e| HandlerErr {
        code: "db_query_failed",
        message: e.to_string(),
        details: None,
    })
}

/// With a period, every student enrolled in the course's classroom is counted and a
/// missing grade row is pending. Without one, all grade rows of the course are used.
fn course_grades(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let course_id = get_required_str(params, "courseId")?;
    require_row(conn, "courses", "course", &course_id)?;
    let period_id = get_optional_str(params, "periodId");

    let scores: Vec<Option<f64>> = match period_id.as_deref() {
        Some(pid) => {
            require_row(conn, "periods", "period", pid)?;
            let mut stmt = conn.prepare(
                "SELECT g.score
                 FROM courses c
                 JOIN enrollments e ON e.classroom_id = c.classroom_id
                 LEFT JOIN grades g
                   ON g.student_id = e.student_id AND g.course_id = c.id AND g.period_id = ?2
                 WHERE c.id = ?1",
            )?;
            let rows = stmt
                .query_map((&course_id, pid), |r| r.get::<_, Option<f64>>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        }
        None => {
            let mut stmt = conn.prepare("SELECT score FROM grades WHERE course_id = ?")?;
            let rows = stmt
                .query_map([&course_id], |r| r.get::<_, Option<f64>>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        }
    };

    let result = stats::grade_stats(scores, MAX_SCORE, DEFAULT_PASS_RATIO)?;
    Ok(json!({
        "courseId": course_id,
        "periodId": period_id,
        "maxScore": MAX_SCORE,
        "stats": to_json(&result)?,
    }))
}

fn student_attendance(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    require_row(conn, "students", "student", &student_id)?;
    let today = today_param(params, "today")?;

    let mut stmt = conn.prepare("SELECT date, status FROM attendance WHERE student_id = ?")?;
    let rows = stmt
        .query_map([&student_id], |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    let mut records = Vec::with_capacity(rows.len());
    for (date, status) in rows {
        let Some(status) = AttendanceStatus::parse(&status) else {
            return Err(HandlerErr::db(format!("unknown attendance status {}", status)));
        };
        records.push(AttendanceDay {
            date: parse_date(&date, "attendance.date")?,
            status,
        });
    }

    let days = stats::collapse_by_day(records);
    let result = stats::attendance_stats(&days, today);
    Ok(json!({
        "studentId": student_id,
        "today": today.to_string(),
        "stats": to_json(&result)?,
    }))
}

fn student_tasks(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    require_row(conn, "students", "student", &student_id)?;
    let today = today_param(params, "today")?;

    let mut stmt = conn.prepare(
        "SELECT t.due_date, t.max_score, s.submitted_at, s.score
         FROM enrollments e
         JOIN courses c ON c.classroom_id = e.classroom_id
         JOIN tasks t ON t.course_id = c.id
         LEFT JOIN task_submissions s ON s.task_id = t.id AND s.student_id = e.student_id
         WHERE e.student_id = ?
         ORDER BY t.due_date, t.id",
    )?;
    let rows = stmt
        .query_map([&student_id], |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, f64>(1)?,
                r.get::<_, Option<String>>(2)?,
                r.get::<_, Option<f64>>(3)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    let mut tasks = Vec::with_capacity(rows.len());
    for (due, max_score, submitted_at, score) in rows {
        tasks.push(TaskProgress {
            due_date: parse_date(&due, "tasks.due_date")?,
            max_score,
            submitted_at: submitted_at
                .as_deref()
                .map(|s| parse_date(s, "task_submissions.submitted_at"))
                .transpose()?,
            score,
        });
    }

    let result = stats::task_stats(&tasks, today, DEFAULT_PASS_RATIO)?;
    Ok(json!({
        "studentId": student_id,
        "today": today.to_string(),
        "stats": to_json(&result)?,
    }))
}

fn student_payments(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    require_row(conn, "students", "student", &student_id)?;

    let mut stmt = conn.prepare("SELECT amount, status FROM payments WHERE student_id = ?")?;
    let rows = stmt
        .query_map([&student_id], |r| Ok((r.get::<_, f64>(0)?, r.get::<_, String>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    let mut lines = Vec::with_capacity(rows.len());
    for (amount, status) in rows {
        let Some(status) = PaymentStatus::parse(&status) else {
            return Err(HandlerErr::db(format!("unknown payment status {}", status)));
        };
        lines.push(PaymentLine { amount, status });
    }

    Ok(json!({
        "studentId": student_id,
        "summary": to_json(&stats::payment_summary(&lines))?,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "stats.courseGrades" => Some(with_db(state, req, course_grades)),
        "stats.studentAttendance" => Some(with_db(state, req, student_attendance)),
        "stats.studentTasks" => Some(with_db(state, req, student_tasks)),
        "stats.studentPayments" => Some(with_db(state, req, student_payments)),
        _ => None,
    }
}
