use super::identity::random_element;
use super::SeedContext;
use crate::model::{AttendanceStatus, Course, Task, TaskType};
use anyhow::anyhow;
use chrono::Duration;
use rand::seq::IteratorRandom;
use rand::Rng;
use rusqlite::Connection;
use tracing::debug;

pub const TASK_COURSE_LIMIT: usize = 20;
pub const ATTENDANCE_COURSE_LIMIT: usize = 10;
pub const ATTENDANCE_DAYS: i64 = 5;
pub const SECOND_PERIOD_PROBABILITY: f64 = 0.7;
pub const MAX_SCORE: f64 = 20.0;

/// Maps a uniform draw in [0, 1) onto PRESENT 85%, LATE 7%, EXCUSED 5%, ABSENT 3%.
pub fn attendance_status(r: f64) -> AttendanceStatus {
    if r > 0.15 {
        AttendanceStatus::Present
    } else if r > 0.08 {
        AttendanceStatus::Late
    } else if r > 0.03 {
        AttendanceStatus::Excused
    } else {
        AttendanceStatus::Absent
    }
}

pub fn grade_observation(score: i64) -> Option<&'static str> {
    if score >= 18 {
        Some("Excelente desempeño")
    } else if score <= 13 {
        Some("Requiere reforzamiento")
    } else {
        None
    }
}

/// One course per (classroom, subject) for every classroom that has students.
/// Teachers are assigned round-robin by course index.
pub fn create_courses(conn: &Connection, ctx: &mut SeedContext) -> anyhow::Result<()> {
    let school_id = ctx.school_id()?;
    let year_id = ctx.academic_year()?.id.clone();
    if ctx.teachers.is_empty() {
        return Err(anyhow!("no teachers available for course assignment"));
    }
    let classrooms: Vec<_> = ctx
        .classrooms
        .iter()
        .filter(|c| ctx.students.iter().any(|s| s.classroom_id == c.id))
        .cloned()
        .collect();

    for classroom in &classrooms {
        let subjects: Vec<_> = ctx
            .subjects
            .iter()
            .filter(|s| s.grade_level_id == classroom.grade_level_id)
            .cloned()
            .collect();
        for subject in subjects {
            let teacher_id = ctx.teachers[ctx.courses.len() % ctx.teachers.len()].id.clone();
            let course = Course {
                id: ctx.new_id(),
                classroom_id: classroom.id.clone(),
                subject_id: subject.id.clone(),
                subject_name: subject.name.clone(),
                teacher_id,
            };
            conn.execute(
                "INSERT INTO courses(id, school_id, academic_year_id, subject_id, teacher_id, classroom_id)
                 VALUES(?, ?, ?, ?, ?, ?)",
                (
                    &course.id,
                    &school_id,
                    &year_id,
                    &course.subject_id,
                    &course.teacher_id,
                    &course.classroom_id,
                ),
            )?;
            create_schedule(conn, ctx, &school_id, &course.id)?;
            ctx.courses.push(course);
        }
    }
    debug!(courses = ctx.courses.len(), "courses built");
    Ok(())
}

/// Two or three weekdays at a single start hour in 8..=11, ninety minutes each.
/// Overlaps with other courses of the same classroom are not avoided here.
fn create_schedule(
    conn: &Connection,
    ctx: &mut SeedContext,
    school_id: &str,
    course_id: &str,
) -> anyhow::Result<()> {
    let day_count = ctx.rng.gen_range(2..=3);
    let mut days = (1..=5i64).choose_multiple(&mut ctx.rng, day_count);
    days.sort_unstable();
    let hour: u32 = ctx.rng.gen_range(8..=11);
    let start_time = format!("{:02}:00", hour);
    let end_time = format!("{:02}:30", hour + 1);
    for day in days {
        let id = ctx.new_id();
        conn.execute(
            "INSERT INTO schedules(id, school_id, course_id, day_of_week, start_time, end_time)
             VALUES(?, ?, ?, ?, ?, ?)",
            (&id, school_id, course_id, day, &start_time, &end_time),
        )?;
    }
    Ok(())
}

pub fn create_tasks(conn: &Connection, ctx: &mut SeedContext) -> anyhow::Result<()> {
    let school_id = ctx.school_id()?;
    let courses: Vec<Course> = ctx.courses.iter().take(TASK_COURSE_LIMIT).cloned().collect();
    for course in &courses {
        let n = ctx.rng.gen_range(2..=3);
        for i in 1..=n {
            let kind = *random_element(&mut ctx.rng, &TaskType::ALL)?;
            let due_date = ctx.today + Duration::days(ctx.rng.gen_range(7..=30));
            let task = Task {
                id: ctx.new_id(),
                course_id: course.id.clone(),
                title: format!("{} {}: {}", kind.label(), i, course.subject_name),
                kind,
                due_date,
            };
            conn.execute(
                "INSERT INTO tasks(id, school_id, course_id, title, description, task_type, due_date, max_score)
                 VALUES(?, ?, ?, ?, ?, ?, ?, ?)",
                (
                    &task.id,
                    &school_id,
                    &task.course_id,
                    &task.title,
                    format!("Actividad de {} para el curso", course.subject_name),
                    kind.as_str(),
                    task.due_date.to_string(),
                    MAX_SCORE,
                ),
            )?;
            ctx.tasks.push(task);
        }
    }
    Ok(())
}

/// First-period grade for every (student, course) pair; second period 70% of the time.
pub fn create_grades(conn: &Connection, ctx: &mut SeedContext) -> anyhow::Result<()> {
    let school_id = ctx.school_id()?;
    let (first, second) = match (ctx.periods.first(), ctx.periods.get(1)) {
        (Some(a), Some(b)) => (a.id.clone(), b.id.clone()),
        _ => return Err(anyhow!("grades need at least two periods")),
    };
    let courses = ctx.courses.clone();
    for course in &courses {
        for student in ctx.students_in(&course.classroom_id) {
            let mut periods = vec![first.as_str()];
            if ctx.rng.gen::<f64>() < SECOND_PERIOD_PROBABILITY {
                periods.push(second.as_str());
            }
            for period_id in periods {
                let score: i64 = ctx.rng.gen_range(12..=20);
                let id = ctx.new_id();
                conn.execute(
                    "INSERT INTO grades(id, school_id, student_id, course_id, period_id, score, observation)
                     VALUES(?, ?, ?, ?, ?, ?, ?)",
                    (
                        &id,
                        &school_id,
                        &student.id,
                        &course.id,
                        period_id,
                        score as f64,
                        grade_observation(score),
                    ),
                )?;
            }
        }
    }
    Ok(())
}

/// The last five calendar days for the first ten courses.
pub fn create_attendance(conn: &Connection, ctx: &mut SeedContext) -> anyhow::Result<()> {
    let school_id = ctx.school_id()?;
    let courses: Vec<Course> = ctx
        .courses
        .iter()
        .take(ATTENDANCE_COURSE_LIMIT)
        .cloned()
        .collect();
    for offset in 0..ATTENDANCE_DAYS {
        let date = ctx.today - Duration::days(offset);
        for course in &courses {
            for student in ctx.students_in(&course.classroom_id) {
                let status = attendance_status(ctx.rng.gen::<f64>());
                let id = ctx.new_id();
                conn.execute(
                    "INSERT INTO attendance(id, school_id, student_id, course_id, date, status)
                     VALUES(?, ?, ?, ?, ?, ?)",
                    (
                        &id,
                        &school_id,
                        &student.id,
                        &course.id,
                        date.to_string(),
                        status.as_str(),
                    ),
                )?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Entity;
    use crate::seed::run_seed;
    use crate::seed::test_support::{fast_config, memory_db};

    #[test]
    fn attendance_cutoffs_are_exact() {
        assert_eq!(attendance_status(0.999), AttendanceStatus::Present);
        assert_eq!(attendance_status(0.1501), AttendanceStatus::Present);
        assert_eq!(attendance_status(0.15), AttendanceStatus::Late);
        assert_eq!(attendance_status(0.0801), AttendanceStatus::Late);
        assert_eq!(attendance_status(0.08), AttendanceStatus::Excused);
        assert_eq!(attendance_status(0.0301), AttendanceStatus::Excused);
        assert_eq!(attendance_status(0.03), AttendanceStatus::Absent);
        assert_eq!(attendance_status(0.0), AttendanceStatus::Absent);
    }

    #[test]
    fn observations_follow_score_bands() {
        assert_eq!(grade_observation(20), Some("Excelente desempeño"));
        assert_eq!(grade_observation(15), None);
        assert_eq!(grade_observation(12), Some("Requiere reforzamiento"));
    }

    #[test]
    fn seeded_academic_records_respect_bounds() {
        let mut conn = memory_db();
        let summary = run_seed(&mut conn, &fast_config(77)).expect("seed");

        // 5 Inicial rooms * 5 subjects + 1 Primaria room * 8 + 1 Secundaria room * 10
        assert_eq!(summary.count(Entity::Course), 43);

        let (min_rows, max_rows): (i64, i64) = conn
            .query_row(
                "SELECT MIN(n), MAX(n) FROM (SELECT COUNT(*) AS n FROM schedules GROUP BY course_id)",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .expect("schedule spread");
        assert!(min_rows >= 2 && max_rows <= 3);

        let task_courses: i64 = conn
            .query_row("SELECT COUNT(DISTINCT course_id) FROM tasks", [], |r| r.get(0))
            .expect("task courses");
        assert_eq!(task_courses, TASK_COURSE_LIMIT as i64);

        let (lo, hi): (f64, f64) = conn
            .query_row("SELECT MIN(score), MAX(score) FROM grades", [], |r| {
                Ok((r.get(0)?, r.get(1)?))
            })
            .expect("score range");
        assert!(lo >= 12.0 && hi <= 20.0);

        // Every (student, course) pair has a first-period grade.
        let pairs: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM courses c JOIN enrollments e ON e.classroom_id = c.classroom_id",
                [],
                |r| r.get(0),
            )
            .expect("pairs");
        let first_period: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM grades g JOIN periods p ON p.id = g.period_id WHERE p.sort_order = 1",
                [],
                |r| r.get(0),
            )
            .expect("first period grades");
        assert_eq!(pairs, first_period);

        let days: i64 = conn
            .query_row("SELECT COUNT(DISTINCT date) FROM attendance", [], |r| r.get(0))
            .expect("attendance days");
        assert_eq!(days, ATTENDANCE_DAYS);
        let att_courses: i64 = conn
            .query_row("SELECT COUNT(DISTINCT course_id) FROM attendance", [], |r| r.get(0))
            .expect("attendance courses");
        assert_eq!(att_courses, ATTENDANCE_COURSE_LIMIT as i64);
    }
}
