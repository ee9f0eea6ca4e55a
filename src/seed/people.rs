use super::identity::{
    generate_address, generate_date, generate_phone, random_element, FEMALE_NAMES, MALE_NAMES,
    OCCUPATIONS, SURNAMES,
};
use super::SeedContext;
use crate::auth;
use crate::model::{EnrollmentStatus, Gender, LevelKind, Role, Student, Teacher};
use anyhow::{anyhow, bail};
use rand::Rng;
use rusqlite::Connection;
use tracing::debug;

pub const TEACHER_SPECIALTIES: [&str; 12] = [
    "Matemática",
    "Comunicación",
    "Ciencia y Tecnología",
    "Personal Social",
    "Ciencias Sociales",
    "Inglés",
    "Educación Física",
    "Arte y Cultura",
    "Educación Religiosa",
    "Educación Inicial",
    "Educación Inicial",
    "Educación para el Trabajo",
];

/// Classrooms that receive students: (level, grade order, section).
/// Five Inicial rooms of 8 plus two rooms of 10 make 60 students.
pub const POPULATED_CLASSROOMS: [(LevelKind, i64, &str); 7] = [
    (LevelKind::Inicial, 1, "A"),
    (LevelKind::Inicial, 1, "B"),
    (LevelKind::Inicial, 2, "A"),
    (LevelKind::Inicial, 2, "B"),
    (LevelKind::Inicial, 3, "A"),
    (LevelKind::Primaria, 6, "A"),
    (LevelKind::Secundaria, 5, "A"),
];

/// Birth year for a grade: age 3 in the first Inicial grade, 6 in 1st Primaria, 12 in 1st Secundaria.
pub fn birth_year(level: LevelKind, grade_order: i64, academic_year: i32) -> i32 {
    let base = match level {
        LevelKind::Inicial => academic_year - 2,
        LevelKind::Primaria => academic_year - 5,
        LevelKind::Secundaria => academic_year - 11,
    };
    base - grade_order as i32
}

fn email_domain(ctx: &SeedContext) -> String {
    ctx.cfg
        .school
        .email
        .rsplit_once('@')
        .map(|(_, d)| d.to_string())
        .unwrap_or_else(|| "colegio.edu.pe".to_string())
}

fn insert_user(
    conn: &Connection,
    ctx: &mut SeedContext,
    email: &str,
    role: Role,
) -> anyhow::Result<String> {
    let id = ctx.new_id();
    let school_id = ctx.school_id()?;
    let hash = ctx.password_hash()?;
    conn.execute(
        "INSERT INTO users(id, school_id, email, password_hash, role, is_active)
         VALUES(?, ?, ?, ?, ?, 1)",
        (&id, &school_id, email, &hash, role.as_str()),
    )?;
    Ok(id)
}

/// Admin account plus the teaching staff. Hashes the shared demo password once.
pub fn create_staff(conn: &Connection, ctx: &mut SeedContext) -> anyhow::Result<()> {
    let password = ctx.cfg.default_password.clone();
    let hash_cfg = ctx.cfg.password_hash;
    ctx.password_hash = Some(auth::hash_password(&password, &hash_cfg, &mut ctx.rng)?);

    let domain = email_domain(ctx);
    insert_user(conn, ctx, &format!("admin@{}", domain), Role::Admin)?;

    let school_id = ctx.school_id()?;
    let last_hire_year = ctx.cfg.academic_year - 1;
    for (i, specialty) in TEACHER_SPECIALTIES.iter().enumerate() {
        let email = format!("docente{:02}@{}", i + 1, domain);
        let user_id = insert_user(conn, ctx, &email, Role::Teacher)?;
        let names = if ctx.rng.gen_bool(0.5) {
            MALE_NAMES
        } else {
            FEMALE_NAMES
        };
        let first_name = random_element(&mut ctx.rng, names)?.to_string();
        let last_name = format!(
            "{} {}",
            random_element(&mut ctx.rng, SURNAMES)?,
            random_element(&mut ctx.rng, SURNAMES)?
        );
        let teacher = Teacher {
            id: ctx.new_id(),
            user_id,
            first_name,
            last_name,
            specialty: specialty.to_string(),
        };
        let phone = generate_phone(&mut ctx.rng);
        let hire_date = generate_date(&mut ctx.rng, 2010, last_hire_year)?;
        conn.execute(
            "INSERT INTO teachers(id, school_id, user_id, first_name, last_name, specialty, phone, hire_date)
             VALUES(?, ?, ?, ?, ?, ?, ?, ?)",
            (
                &teacher.id,
                &school_id,
                &teacher.user_id,
                &teacher.first_name,
                &teacher.last_name,
                &teacher.specialty,
                phone,
                hire_date.to_string(),
            ),
        )?;
        ctx.teachers.push(teacher);
    }
    Ok(())
}

pub fn create_students(conn: &Connection, ctx: &mut SeedContext) -> anyhow::Result<()> {
    let school_id = ctx.school_id()?;
    let (year_id, enrolled_at) = {
        let y = ctx.academic_year()?;
        (y.id.clone(), y.start_date)
    };
    let domain = email_domain(ctx);
    let load = ctx.cfg.students_per_classroom;

    for (level, grade_order, section) in POPULATED_CLASSROOMS {
        let classroom = ctx
            .classrooms
            .iter()
            .find(|c| c.level == level && c.grade_order == grade_order && c.section_name == section)
            .cloned()
            .ok_or_else(|| anyhow!("classroom {:?} {}{} not built", level, grade_order, section))?;
        let quantity = match level {
            LevelKind::Inicial => load.inicial,
            _ => load.other,
        };
        if quantity as i64 > classroom.capacity {
            bail!(
                "{} students exceed capacity {} of {}",
                quantity,
                classroom.capacity,
                classroom.name
            );
        }

        let by = birth_year(level, grade_order, ctx.cfg.academic_year);
        for _ in 0..quantity {
            let gender = if ctx.rng.gen_bool(0.5) {
                Gender::Male
            } else {
                Gender::Female
            };
            let names = match gender {
                Gender::Male => MALE_NAMES,
                Gender::Female => FEMALE_NAMES,
            };
            let first_name = random_element(&mut ctx.rng, names)?.to_string();
            let paternal_surname = random_element(&mut ctx.rng, SURNAMES)?.to_string();
            let maternal_surname = random_element(&mut ctx.rng, SURNAMES)?.to_string();
            let date_of_birth = generate_date(&mut ctx.rng, by, by)?;
            let address = generate_address(&mut ctx.rng)?;
            let enrollment_code = ctx
                .codes
                .next()
                .ok_or_else(|| anyhow!("enrollment codes exhausted"))?;

            let email = format!("{}@{}", enrollment_code.to_ascii_lowercase(), domain);
            let user_id = insert_user(conn, ctx, &email, Role::Student)?;
            let student = Student {
                id: ctx.new_id(),
                user_id,
                classroom_id: classroom.id.clone(),
                enrollment_code,
                first_name,
                paternal_surname,
                maternal_surname,
                gender,
                date_of_birth,
                level,
            };
            conn.execute(
                "INSERT INTO students(id, school_id, user_id, enrollment_code, first_name, last_name, gender, date_of_birth, address)
                 VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?)",
                (
                    &student.id,
                    &school_id,
                    &student.user_id,
                    &student.enrollment_code,
                    &student.first_name,
                    format!("{} {}", student.paternal_surname, student.maternal_surname),
                    student.gender.as_str(),
                    student.date_of_birth.to_string(),
                    address,
                ),
            )?;

            let enrollment_id = ctx.new_id();
            conn.execute(
                "INSERT INTO enrollments(id, school_id, student_id, classroom_id, academic_year_id, status, enrolled_at)
                 VALUES(?, ?, ?, ?, ?, ?, ?)",
                (
                    &enrollment_id,
                    &school_id,
                    &student.id,
                    &classroom.id,
                    &year_id,
                    EnrollmentStatus::Active.as_str(),
                    enrolled_at.to_string(),
                ),
            )?;
            debug!(code = %student.enrollment_code, classroom = %classroom.name, "student enrolled");
            ctx.students.push(student);
        }
    }
    Ok(())
}

/// Father and mother for every student. Only the father is marked primary.
pub fn create_parents(conn: &Connection, ctx: &mut SeedContext) -> anyhow::Result<()> {
    let school_id = ctx.school_id()?;
    let domain = email_domain(ctx);
    let students = ctx.students.clone();

    for student in &students {
        let code = student.enrollment_code.to_ascii_lowercase();
        let guardians = [
            ("Padre", MALE_NAMES, &student.paternal_surname, "padre", true),
            ("Madre", FEMALE_NAMES, &student.maternal_surname, "madre", false),
        ];
        for (relationship, names, surname, prefix, is_primary) in guardians {
            let email = format!("{}.{}@{}", prefix, code, domain);
            let user_id = insert_user(conn, ctx, &email, Role::Parent)?;
            let parent_id = ctx.new_id();
            let first_name = random_element(&mut ctx.rng, names)?.to_string();
            let last_name = format!("{} {}", surname, random_element(&mut ctx.rng, SURNAMES)?);
            let phone = generate_phone(&mut ctx.rng);
            let occupation = random_element(&mut ctx.rng, OCCUPATIONS)?.to_string();
            conn.execute(
                "INSERT INTO parents(id, school_id, user_id, first_name, last_name, phone, occupation)
                 VALUES(?, ?, ?, ?, ?, ?, ?)",
                (
                    &parent_id,
                    &school_id,
                    &user_id,
                    first_name,
                    last_name,
                    phone,
                    occupation,
                ),
            )?;
            conn.execute(
                "INSERT INTO student_parents(student_id, parent_id, relationship, is_primary)
                 VALUES(?, ?, ?, ?)",
                (&student.id, &parent_id, relationship, is_primary as i64),
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::structure;
    use crate::seed::test_support::{fast_config, memory_db};
    use chrono::Datelike;

    fn populated() -> (Connection, SeedContext) {
        let conn = memory_db();
        let mut ctx = SeedContext::new(fast_config(21), 21);
        structure::create_school(&conn, &mut ctx).expect("school");
        create_staff(&conn, &mut ctx).expect("staff");
        structure::create_calendar(&conn, &mut ctx).expect("calendar");
        structure::create_structure(&conn, &mut ctx).expect("structure");
        create_students(&conn, &mut ctx).expect("students");
        create_parents(&conn, &mut ctx).expect("parents");
        (conn, ctx)
    }

    #[test]
    fn birth_years_track_grade() {
        assert_eq!(birth_year(LevelKind::Inicial, 1, 2024), 2021);
        assert_eq!(birth_year(LevelKind::Primaria, 1, 2024), 2018);
        assert_eq!(birth_year(LevelKind::Primaria, 6, 2024), 2013);
        assert_eq!(birth_year(LevelKind::Secundaria, 5, 2024), 2008);
    }

    #[test]
    fn enrollment_codes_unique_and_increasing() {
        let (_conn, ctx) = populated();
        assert_eq!(ctx.students.len(), 60);
        let codes: Vec<&str> = ctx
            .students
            .iter()
            .map(|s| s.enrollment_code.as_str())
            .collect();
        assert!(codes.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(codes[0], "EST-2024-001");
        assert_eq!(codes[59], "EST-2024-060");
    }

    #[test]
    fn students_are_born_in_their_grade_year() {
        let (_conn, ctx) = populated();
        for s in &ctx.students {
            let room = ctx.classroom(&s.classroom_id).expect("classroom");
            assert_eq!(
                s.date_of_birth.year(),
                birth_year(room.level, room.grade_order, 2024)
            );
        }
    }

    #[test]
    fn every_student_has_one_enrollment_and_two_parents() {
        let (conn, ctx) = populated();
        let n = ctx.students.len() as i64;
        let enrollments: i64 = conn
            .query_row("SELECT COUNT(*) FROM enrollments WHERE status = 'ACTIVE'", [], |r| r.get(0))
            .expect("enrollments");
        assert_eq!(enrollments, n);
        let links: i64 = conn
            .query_row("SELECT COUNT(*) FROM student_parents", [], |r| r.get(0))
            .expect("links");
        assert_eq!(links, 2 * n);
        let primaries: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM student_parents WHERE is_primary = 1 AND relationship = 'Padre'",
                [],
                |r| r.get(0),
            )
            .expect("primaries");
        assert_eq!(primaries, n);
        let parent_users: i64 = conn
            .query_row("SELECT COUNT(*) FROM users WHERE role = 'PARENT'", [], |r| r.get(0))
            .expect("parent users");
        assert_eq!(parent_users, 2 * n);
    }

    #[test]
    fn staff_share_a_verifiable_password_hash() {
        let (conn, ctx) = populated();
        assert_eq!(ctx.teachers.len(), TEACHER_SPECIALTIES.len());
        let hash: String = conn
            .query_row(
                "SELECT password_hash FROM users WHERE role = 'ADMIN'",
                [],
                |r| r.get(0),
            )
            .expect("admin hash");
        assert!(auth::verify_password("123456", &hash));
    }
}
