//! Read-only consistency checks over a seeded store.
//!
//! The generator does not prevent timetable overlaps and attendance/grade rows are
//! never validated on insert, so problems surface here instead of as write errors.

use anyhow::Context;
use rusqlite::Connection;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum IssueKind {
    CurrentYearCount,
    AttendanceNotEnrolled,
    GradeNotEnrolled,
    SchoolMismatch,
    ScheduleConflict,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityIssue {
    pub kind: IssueKind,
    pub table: &'static str,
    pub id: String,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityReport {
    pub ok: bool,
    pub by_kind: BTreeMap<IssueKind, usize>,
    pub issues: Vec<IntegrityIssue>,
}

impl IntegrityReport {
    pub fn count(&self, kind: IssueKind) -> usize {
        self.by_kind.get(&kind).copied().unwrap_or(0)
    }
}

/// (table, column naming the parent row, parent table)
const SCHOOL_LINKS: [(&str, &str, &str); 7] = [
    ("enrollments", "student_id", "students"),
    ("courses", "classroom_id", "classrooms"),
    ("tasks", "course_id", "courses"),
    ("grades", "course_id", "courses"),
    ("attendance", "course_id", "courses"),
    ("payments", "student_id", "students"),
    ("workshop_enrollments", "workshop_id", "workshops"),
];

pub fn check(conn: &Connection) -> anyhow::Result<IntegrityReport> {
    let mut issues = Vec::new();
    current_years(conn, &mut issues).context("current year check failed")?;
    not_enrolled(conn, "attendance", IssueKind::AttendanceNotEnrolled, &mut issues)
        .context("attendance enrollment check failed")?;
    not_enrolled(conn, "grades", IssueKind::GradeNotEnrolled, &mut issues)
        .context("grade enrollment check failed")?;
    for (table, column, parent) in SCHOOL_LINKS {
        school_mismatches(conn, table, column, parent, &mut issues)
            .with_context(|| format!("school check on {} failed", table))?;
    }
    schedule_conflicts(conn, &mut issues).context("schedule check failed")?;

    let mut by_kind = BTreeMap::new();
    for issue in &issues {
        *by_kind.entry(issue.kind).or_insert(0) += 1;
    }
    Ok(IntegrityReport {
        ok: issues.is_empty(),
        by_kind,
        issues,
    })
}

fn current_years(conn: &Connection, out: &mut Vec<IntegrityIssue>) -> anyhow::Result<()> {
    let mut stmt = conn.prepare(
        "SELECT s.id, COUNT(y.id) FROM schools s
         LEFT JOIN academic_years y ON y.school_id = s.id AND y.is_current = 1
         GROUP BY s.id",
    )?;
    let rows = stmt
        .query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    for (school_id, n) in rows {
        if n != 1 {
            out.push(IntegrityIssue {
                kind: IssueKind::CurrentYearCount,
                table: "academic_years",
                id: school_id,
                detail: format!("{} current academic years", n),
            });
        }
    }
    Ok(())
}

/// Rows in `table` (attendance or grades) whose student has no enrollment in the
/// course's classroom.
fn not_enrolled(
    conn: &Connection,
    table: &'static str,
    kind: IssueKind,
    out: &mut Vec<IntegrityIssue>,
) -> anyhow::Result<()> {
    let sql = format!(
        "SELECT r.id, r.student_id, r.course_id FROM {} r
         JOIN courses c ON c.id = r.course_id
         WHERE NOT EXISTS (
             SELECT 1 FROM enrollments e
             WHERE e.student_id = r.student_id AND e.classroom_id = c.classroom_id
         )
         ORDER BY r.id",
        table
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    for (id, student_id, course_id) in rows {
        out.push(IntegrityIssue {
            kind,
            table,
            id,
            detail: format!("student {} is not enrolled for course {}", student_id, course_id),
        });
    }
    Ok(())
}

fn school_mismatches(
    conn: &Connection,
    table: &'static str,
    column: &str,
    parent: &str,
    out: &mut Vec<IntegrityIssue>,
) -> anyhow::Result<()> {
    let sql = format!(
        "SELECT t.id, t.school_id, p.school_id FROM {table} t
         JOIN {parent} p ON p.id = t.{column}
         WHERE t.school_id <> p.school_id
         ORDER BY t.id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    for (id, own, theirs) in rows {
        out.push(IntegrityIssue {
            kind: IssueKind::SchoolMismatch,
            table,
            id,
            detail: format!("school {} differs from {} school {}", own, parent, theirs),
        });
    }
    Ok(())
}

/// Two courses of the same classroom meeting on the same weekday with overlapping
/// `[start, end)` ranges. Times are zero-padded `HH:MM`, so text comparison orders them.
fn schedule_conflicts(conn: &Connection, out: &mut Vec<IntegrityIssue>) -> anyhow::Result<()> {
    let mut stmt = conn.prepare(
        "SELECT a.id, b.id, ca.classroom_id, a.day_of_week, a.start_time, b.start_time
         FROM schedules a
         JOIN courses ca ON ca.id = a.course_id
         JOIN schedules b ON b.day_of_week = a.day_of_week AND b.id > a.id
         JOIN courses cb ON cb.id = b.course_id
         WHERE ca.classroom_id = cb.classroom_id
           AND a.course_id <> b.course_id
           AND a.start_time < b.end_time
           AND b.start_time < a.end_time
         ORDER BY ca.classroom_id, a.day_of_week, a.id",
    )?;
    let rows = stmt
        .query_map([], |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, i64>(3)?,
                r.get::<_, String>(4)?,
                r.get::<_, String>(5)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    for (a, b, classroom_id, day, start_a, start_b) in rows {
        out.push(IntegrityIssue {
            kind: IssueKind::ScheduleConflict,
            table: "schedules",
            id: a,
            detail: format!(
                "overlaps {} in classroom {} on day {} ({} / {})",
                b, classroom_id, day, start_a, start_b
            ),
        });
    }
    Ok(())
}
