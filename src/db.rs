use rusqlite::Connection;
use serde::Serialize;
use std::path::Path;

pub const DB_FILE_NAME: &str = "colegio.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE_NAME);
    let conn = Connection::open(db_path)?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS schools(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            address TEXT NOT NULL,
            phone TEXT NOT NULL,
            email TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS users(
            id TEXT PRIMARY KEY,
            school_id TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            FOREIGN KEY(school_id) REFERENCES schools(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_users_school ON users(school_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS academic_years(
            id TEXT PRIMARY KEY,
            school_id TEXT NOT NULL,
            name TEXT NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            is_current INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY(school_id) REFERENCES schools(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS periods(
            id TEXT PRIMARY KEY,
            school_id TEXT NOT NULL,
            academic_year_id TEXT NOT NULL,
            name TEXT NOT NULL,
            sort_order INTEGER NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            FOREIGN KEY(school_id) REFERENCES schools(id),
            FOREIGN KEY(academic_year_id) REFERENCES academic_years(id),
            UNIQUE(academic_year_id, sort_order)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS levels(
            id TEXT PRIMARY KEY,
            school_id TEXT NOT NULL,
            name TEXT NOT NULL,
            sort_order INTEGER NOT NULL,
            FOREIGN KEY(school_id) REFERENCES schools(id),
            UNIQUE(school_id, sort_order)
        )",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS grade_levels(
            id TEXT PRIMARY KEY,
            school_id TEXT NOT NULL,
            level_id TEXT NOT NULL,
            name TEXT NOT NULL,
            sort_order INTEGER NOT NULL,
            FOREIGN KEY(school_id) REFERENCES schools(id),
            FOREIGN KEY(level_id) REFERENCES levels(id),
            UNIQUE(level_id, sort_order)
        )",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS sections(
            id TEXT PRIMARY KEY,
            school_id TEXT NOT NULL,
            grade_level_id TEXT NOT NULL,
            name TEXT NOT NULL,
            capacity INTEGER NOT NULL,
            FOREIGN KEY(school_id) REFERENCES schools(id),
            FOREIGN KEY(grade_level_id) REFERENCES grade_levels(id),
            UNIQUE(grade_level_id, name)
        )",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS classrooms(
            id TEXT PRIMARY KEY,
            school_id TEXT NOT NULL,
            section_id TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            capacity INTEGER NOT NULL,
            location TEXT NOT NULL,
            FOREIGN KEY(school_id) REFERENCES schools(id),
            FOREIGN KEY(section_id) REFERENCES sections(id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS subjects(
            id TEXT PRIMARY KEY,
            school_id TEXT NOT NULL,
            grade_level_id TEXT NOT NULL,
            name TEXT NOT NULL,
            code TEXT NOT NULL,
            description TEXT NOT NULL,
            FOREIGN KEY(school_id) REFERENCES schools(id),
            FOREIGN KEY(grade_level_id) REFERENCES grade_levels(id),
            UNIQUE(school_id, code)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_subjects_grade_level ON subjects(grade_level_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS curriculum_units(
            id TEXT PRIMARY KEY,
            school_id TEXT NOT NULL,
            subject_id TEXT NOT NULL,
            title TEXT NOT NULL,
            sort_order INTEGER NOT NULL,
            month INTEGER NOT NULL,
            FOREIGN KEY(school_id) REFERENCES schools(id),
            FOREIGN KEY(subject_id) REFERENCES subjects(id),
            UNIQUE(subject_id, sort_order)
        )",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS curriculum_topics(
            id TEXT PRIMARY KEY,
            school_id TEXT NOT NULL,
            unit_id TEXT NOT NULL,
            title TEXT NOT NULL,
            sort_order INTEGER NOT NULL,
            FOREIGN KEY(school_id) REFERENCES schools(id),
            FOREIGN KEY(unit_id) REFERENCES curriculum_units(id),
            UNIQUE(unit_id, sort_order)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS teachers(
            id TEXT PRIMARY KEY,
            school_id TEXT NOT NULL,
            user_id TEXT NOT NULL UNIQUE,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            specialty TEXT NOT NULL,
            phone TEXT NOT NULL,
            hire_date TEXT NOT NULL,
            FOREIGN KEY(school_id) REFERENCES schools(id),
            FOREIGN KEY(user_id) REFERENCES users(id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id TEXT PRIMARY KEY,
            school_id TEXT NOT NULL,
            user_id TEXT NOT NULL UNIQUE,
            enrollment_code TEXT NOT NULL UNIQUE,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            gender TEXT NOT NULL,
            date_of_birth TEXT NOT NULL,
            address TEXT NOT NULL,
            FOREIGN KEY(school_id) REFERENCES schools(id),
            FOREIGN KEY(user_id) REFERENCES users(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS enrollments(
            id TEXT PRIMARY KEY,
            school_id TEXT NOT NULL,
            student_id TEXT NOT NULL,
            classroom_id TEXT NOT NULL,
            academic_year_id TEXT NOT NULL,
            status TEXT NOT NULL,
            enrolled_at TEXT NOT NULL,
            FOREIGN KEY(school_id) REFERENCES schools(id),
            FOREIGN KEY(student_id) REFERENCES students(id),
            FOREIGN KEY(classroom_id) REFERENCES classrooms(id),
            FOREIGN KEY(academic_year_id) REFERENCES academic_years(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_enrollments_classroom ON enrollments(classroom_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS parents(
            id TEXT PRIMARY KEY,
            school_id TEXT NOT NULL,
            user_id TEXT NOT NULL UNIQUE,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            phone TEXT NOT NULL,
            occupation TEXT NOT NULL,
            FOREIGN KEY(school_id) REFERENCES schools(id),
            FOREIGN KEY(user_id) REFERENCES users(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS student_parents(
            student_id TEXT NOT NULL,
            parent_id TEXT NOT NULL,
            relationship TEXT NOT NULL,
            is_primary INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY(student_id, parent_id),
            FOREIGN KEY(student_id) REFERENCES students(id),
            FOREIGN KEY(parent_id) REFERENCES parents(id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS courses(
            id TEXT PRIMARY KEY,
            school_id TEXT NOT NULL,
            academic_year_id TEXT NOT NULL,
            subject_id TEXT NOT NULL,
            teacher_id TEXT NOT NULL,
            classroom_id TEXT NOT NULL,
            FOREIGN KEY(school_id) REFERENCES schools(id),
            FOREIGN KEY(academic_year_id) REFERENCES academic_years(id),
            FOREIGN KEY(subject_id) REFERENCES subjects(id),
            FOREIGN KEY(teacher_id) REFERENCES teachers(id),
            FOREIGN KEY(classroom_id) REFERENCES classrooms(id),
            UNIQUE(academic_year_id, subject_id, classroom_id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schedules(
            id TEXT PRIMARY KEY,
            school_id TEXT NOT NULL,
            course_id TEXT NOT NULL,
            day_of_week INTEGER NOT NULL,
            start_time TEXT NOT NULL,
            end_time TEXT NOT NULL,
            FOREIGN KEY(school_id) REFERENCES schools(id),
            FOREIGN KEY(course_id) REFERENCES courses(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_schedules_course ON schedules(course_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS tasks(
            id TEXT PRIMARY KEY,
            school_id TEXT NOT NULL,
            course_id TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            task_type TEXT NOT NULL,
            due_date TEXT NOT NULL,
            max_score REAL NOT NULL,
            FOREIGN KEY(school_id) REFERENCES schools(id),
            FOREIGN KEY(course_id) REFERENCES courses(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS task_submissions(
            id TEXT PRIMARY KEY,
            school_id TEXT NOT NULL,
            task_id TEXT NOT NULL,
            student_id TEXT NOT NULL,
            submitted_at TEXT NOT NULL,
            score REAL,
            FOREIGN KEY(school_id) REFERENCES schools(id),
            FOREIGN KEY(task_id) REFERENCES tasks(id),
            FOREIGN KEY(student_id) REFERENCES students(id),
            UNIQUE(task_id, student_id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS grades(
            id TEXT PRIMARY KEY,
            school_id TEXT NOT NULL,
            student_id TEXT NOT NULL,
            course_id TEXT NOT NULL,
            period_id TEXT NOT NULL,
            score REAL,
            observation TEXT,
            FOREIGN KEY(school_id) REFERENCES schools(id),
            FOREIGN KEY(student_id) REFERENCES students(id),
            FOREIGN KEY(course_id) REFERENCES courses(id),
            FOREIGN KEY(period_id) REFERENCES periods(id),
            UNIQUE(student_id, course_id, period_id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_grades_course ON grades(course_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS attendance(
            id TEXT PRIMARY KEY,
            school_id TEXT NOT NULL,
            student_id TEXT NOT NULL,
            course_id TEXT NOT NULL,
            date TEXT NOT NULL,
            status TEXT NOT NULL,
            FOREIGN KEY(school_id) REFERENCES schools(id),
            FOREIGN KEY(student_id) REFERENCES students(id),
            FOREIGN KEY(course_id) REFERENCES courses(id),
            UNIQUE(student_id, course_id, date)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_attendance_student ON attendance(student_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS payments(
            id TEXT PRIMARY KEY,
            school_id TEXT NOT NULL,
            student_id TEXT NOT NULL,
            concept TEXT NOT NULL,
            amount REAL NOT NULL,
            due_date TEXT NOT NULL,
            paid_date TEXT,
            status TEXT NOT NULL,
            method TEXT,
            FOREIGN KEY(school_id) REFERENCES schools(id),
            FOREIGN KEY(student_id) REFERENCES students(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_payments_student ON payments(student_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS workshops(
            id TEXT PRIMARY KEY,
            school_id TEXT NOT NULL,
            teacher_id TEXT NOT NULL,
            name TEXT NOT NULL,
            description TEXT NOT NULL,
            schedule TEXT NOT NULL,
            capacity INTEGER NOT NULL,
            monthly_fee REAL NOT NULL,
            FOREIGN KEY(school_id) REFERENCES schools(id),
            FOREIGN KEY(teacher_id) REFERENCES teachers(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS workshop_enrollments(
            id TEXT PRIMARY KEY,
            school_id TEXT NOT NULL,
            workshop_id TEXT NOT NULL,
            student_id TEXT NOT NULL,
            enrolled_at TEXT NOT NULL,
            FOREIGN KEY(school_id) REFERENCES schools(id),
            FOREIGN KEY(workshop_id) REFERENCES workshops(id),
            FOREIGN KEY(student_id) REFERENCES students(id),
            UNIQUE(workshop_id, student_id)
        )",
        [],
    )?;

    Ok(())
}

/// Every persisted table, in foreign-key creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Entity {
    School,
    User,
    AcademicYear,
    Period,
    Level,
    GradeLevel,
    Section,
    Classroom,
    Subject,
    CurriculumUnit,
    CurriculumTopic,
    Teacher,
    Student,
    Enrollment,
    Parent,
    StudentParent,
    Course,
    Schedule,
    Task,
    TaskSubmission,
    Grade,
    Attendance,
    Payment,
    Workshop,
    WorkshopEnrollment,
}

impl Entity {
    pub const ALL: [Entity; 25] = [
        Entity::School,
        Entity::User,
        Entity::AcademicYear,
        Entity::Period,
        Entity::Level,
        Entity::GradeLevel,
        Entity::Section,
        Entity::Classroom,
        Entity::Subject,
        Entity::CurriculumUnit,
        Entity::CurriculumTopic,
        Entity::Teacher,
        Entity::Student,
        Entity::Enrollment,
        Entity::Parent,
        Entity::StudentParent,
        Entity::Course,
        Entity::Schedule,
        Entity::Task,
        Entity::TaskSubmission,
        Entity::Grade,
        Entity::Attendance,
        Entity::Payment,
        Entity::Workshop,
        Entity::WorkshopEnrollment,
    ];

    pub fn table(self) -> &'static str {
        match self {
            Entity::School => "schools",
            Entity::User => "users",
            Entity::AcademicYear => "academic_years",
            Entity::Period => "periods",
            Entity::Level => "levels",
            Entity::GradeLevel => "grade_levels",
            Entity::Section => "sections",
            Entity::Classroom => "classrooms",
            Entity::Subject => "subjects",
            Entity::CurriculumUnit => "curriculum_units",
            Entity::CurriculumTopic => "curriculum_topics",
            Entity::Teacher => "teachers",
            Entity::Student => "students",
            Entity::Enrollment => "enrollments",
            Entity::Parent => "parents",
            Entity::StudentParent => "student_parents",
            Entity::Course => "courses",
            Entity::Schedule => "schedules",
            Entity::Task => "tasks",
            Entity::TaskSubmission => "task_submissions",
            Entity::Grade => "grades",
            Entity::Attendance => "attendance",
            Entity::Payment => "payments",
            Entity::Workshop => "workshops",
            Entity::WorkshopEnrollment => "workshop_enrollments",
        }
    }
}

/// Deletes every row, children first.
pub fn clear_all(conn: &Connection) -> anyhow::Result<()> {
    for entity in Entity::ALL.iter().rev() {
        conn.execute(&format!("DELETE FROM {}", entity.table()), [])?;
    }
    Ok(())
}

pub fn table_count(conn: &Connection, entity: Entity) -> anyhow::Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM {}", entity.table());
    Ok(conn.query_row(&sql, [], |r| r.get(0))?)
}

pub fn entity_counts(conn: &Connection) -> anyhow::Result<Vec<(Entity, i64)>> {
    let mut out = Vec::with_capacity(Entity::ALL.len());
    for entity in Entity::ALL {
        out.push((entity, table_count(conn, entity)?));
    }
    Ok(out)
}

pub fn counts_json(counts: &[(Entity, i64)]) -> serde_json::Value {
    let mut obj = serde_json::Map::new();
    for (entity, n) in counts {
        obj.insert(entity.table().to_string(), serde_json::json!(n));
    }
    serde_json::Value::Object(obj)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_is_reentrant() {
        let conn = Connection::open_in_memory().expect("open");
        init_schema(&conn).expect("first");
        init_schema(&conn).expect("second");
        let counts = entity_counts(&conn).expect("counts");
        assert_eq!(counts.len(), Entity::ALL.len());
        assert!(counts.iter().all(|(_, n)| *n == 0));
    }

    #[test]
    fn subject_codes_are_unique_per_school() {
        let conn = Connection::open_in_memory().expect("open");
        init_schema(&conn).expect("schema");
        conn.execute(
            "INSERT INTO schools(id, name, address, phone, email) VALUES('s', 'n', 'a', 'p', 'e')",
            [],
        )
        .expect("school");
        conn.execute(
            "INSERT INTO levels(id, school_id, name, sort_order) VALUES('l', 's', 'Primaria', 2)",
            [],
        )
        .expect("level");
        conn.execute(
            "INSERT INTO grade_levels(id, school_id, level_id, name, sort_order) VALUES('g', 's', 'l', '1er Grado', 1)",
            [],
        )
        .expect("grade");
        let insert = "INSERT INTO subjects(id, school_id, grade_level_id, name, code, description)
                      VALUES(?, 's', 'g', 'Matemática', 'MAT-P1', '')";
        conn.execute(insert, ["a"]).expect("first subject");
        assert!(conn.execute(insert, ["b"]).is_err());
    }
}
