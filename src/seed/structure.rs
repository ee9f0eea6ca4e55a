use super::SeedContext;
use crate::error::SeedError;
use crate::model::{AcademicYear, Classroom, GradeLevel, Level, LevelKind, Period, School, Subject};
use chrono::NaiveDate;
use rusqlite::Connection;
use std::collections::HashSet;
use tracing::debug;

pub const SECTION_NAMES: [&str; 2] = ["A", "B"];

pub struct SubjectDef {
    pub name: &'static str,
    pub abbr: &'static str,
}

const fn def(name: &'static str, abbr: &'static str) -> SubjectDef {
    SubjectDef { name, abbr }
}

pub const INICIAL_SUBJECTS: [SubjectDef; 5] = [
    def("Comunicación", "COM"),
    def("Matemática", "MAT"),
    def("Personal Social", "PSO"),
    def("Ciencia y Tecnología", "CYT"),
    def("Psicomotricidad", "PSI"),
];

pub const PRIMARIA_SUBJECTS: [SubjectDef; 8] = [
    def("Matemática", "MAT"),
    def("Comunicación", "COM"),
    def("Personal Social", "PSO"),
    def("Ciencia y Tecnología", "CYT"),
    def("Arte y Cultura", "ART"),
    def("Educación Física", "EFI"),
    def("Educación Religiosa", "REL"),
    def("Inglés", "ING"),
];

pub const SECUNDARIA_SUBJECTS: [SubjectDef; 10] = [
    def("Matemática", "MAT"),
    def("Comunicación", "COM"),
    def("Ciencias Sociales", "CSO"),
    def("Ciencia y Tecnología", "CYT"),
    def("Desarrollo Personal, Ciudadanía y Cívica", "DPC"),
    def("Arte y Cultura", "ART"),
    def("Educación Física", "EFI"),
    def("Educación Religiosa", "REL"),
    def("Inglés", "ING"),
    def("Educación para el Trabajo", "EPT"),
];

pub fn subject_catalog(level: LevelKind) -> &'static [SubjectDef] {
    match level {
        LevelKind::Inicial => &INICIAL_SUBJECTS,
        LevelKind::Primaria => &PRIMARIA_SUBJECTS,
        LevelKind::Secundaria => &SECUNDARIA_SUBJECTS,
    }
}

/// Spanish abbreviated ordinal: 1er, 2do, 3er, 4to, ...
pub fn ordinal(n: i64) -> String {
    match n {
        1 => "1er".to_string(),
        2 => "2do".to_string(),
        3 => "3er".to_string(),
        4 => "4to".to_string(),
        5 => "5to".to_string(),
        6 => "6to".to_string(),
        7 => "7mo".to_string(),
        8 => "8vo".to_string(),
        9 => "9no".to_string(),
        10 => "10mo".to_string(),
        n => format!("{}°", n),
    }
}

pub fn grade_level_name(level: LevelKind, order: i64) -> String {
    match level {
        LevelKind::Inicial => format!("{} años", order + 2),
        LevelKind::Primaria => format!("{} Grado", ordinal(order)),
        LevelKind::Secundaria => format!("{} Año", ordinal(order)),
    }
}

pub fn subject_code(abbr: &str, level: LevelKind, grade_order: i64) -> String {
    format!("{}-{}{}", abbr, level.code_prefix(), grade_order)
}

/// Bimester boundaries as (month, day) pairs. Each ends before the next begins.
const PERIOD_BOUNDS: [((u32, u32), (u32, u32)); 4] = [
    ((3, 4), (5, 10)),
    ((5, 20), (7, 19)),
    ((8, 5), (10, 4)),
    ((10, 14), (12, 20)),
];

const PERIOD_NAMES: [&str; 4] = ["I Bimestre", "II Bimestre", "III Bimestre", "IV Bimestre"];

fn ymd(year: i32, month: u32, day: u32) -> anyhow::Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| anyhow::anyhow!("invalid date {}-{:02}-{:02}", year, month, day))
}

pub fn create_school(conn: &Connection, ctx: &mut SeedContext) -> anyhow::Result<()> {
    let info = ctx.cfg.school.clone();
    let school = School {
        id: ctx.new_id(),
        name: info.name,
        address: info.address,
        phone: info.phone,
        email: info.email,
    };
    conn.execute(
        "INSERT INTO schools(id, name, address, phone, email) VALUES(?, ?, ?, ?, ?)",
        (&school.id, &school.name, &school.address, &school.phone, &school.email),
    )?;
    ctx.school = Some(school);
    Ok(())
}

pub fn create_calendar(conn: &Connection, ctx: &mut SeedContext) -> anyhow::Result<()> {
    let school_id = ctx.school_id()?;
    let y = ctx.cfg.academic_year;
    let year = AcademicYear {
        id: ctx.new_id(),
        school_id: school_id.clone(),
        name: format!("Año Académico {}", y),
        start_date: ymd(y, 3, 1)?,
        end_date: ymd(y, 12, 20)?,
        is_current: true,
    };
    conn.execute(
        "INSERT INTO academic_years(id, school_id, name, start_date, end_date, is_current)
         VALUES(?, ?, ?, ?, ?, ?)",
        (
            &year.id,
            &school_id,
            &year.name,
            year.start_date.to_string(),
            year.end_date.to_string(),
            year.is_current as i64,
        ),
    )?;

    let mut periods = Vec::with_capacity(PERIOD_BOUNDS.len());
    for (i, ((sm, sd), (em, ed))) in PERIOD_BOUNDS.iter().enumerate() {
        let period = Period {
            id: ctx.new_id(),
            academic_year_id: year.id.clone(),
            name: PERIOD_NAMES[i].to_string(),
            sort_order: i as i64 + 1,
            start_date: ymd(y, *sm, *sd)?,
            end_date: ymd(y, *em, *ed)?,
        };
        conn.execute(
            "INSERT INTO periods(id, school_id, academic_year_id, name, sort_order, start_date, end_date)
             VALUES(?, ?, ?, ?, ?, ?, ?)",
            (
                &period.id,
                &school_id,
                &period.academic_year_id,
                &period.name,
                period.sort_order,
                period.start_date.to_string(),
                period.end_date.to_string(),
            ),
        )?;
        periods.push(period);
    }

    ctx.year = Some(year);
    ctx.periods = periods;
    Ok(())
}

/// Levels, grade levels, sections and their classrooms.
pub fn create_structure(conn: &Connection, ctx: &mut SeedContext) -> anyhow::Result<()> {
    let school_id = ctx.school_id()?;

    for kind in LevelKind::ALL {
        let level = Level {
            id: ctx.new_id(),
            kind,
        };
        conn.execute(
            "INSERT INTO levels(id, school_id, name, sort_order) VALUES(?, ?, ?, ?)",
            (&level.id, &school_id, kind.name(), kind.order()),
        )?;

        for order in 1..=kind.grade_count() {
            let grade = GradeLevel {
                id: ctx.new_id(),
                level_id: level.id.clone(),
                level: kind,
                sort_order: order,
                name: grade_level_name(kind, order),
            };
            conn.execute(
                "INSERT INTO grade_levels(id, school_id, level_id, name, sort_order)
                 VALUES(?, ?, ?, ?, ?)",
                (&grade.id, &school_id, &grade.level_id, &grade.name, order),
            )?;

            for section_name in SECTION_NAMES {
                let section_id = ctx.new_id();
                let capacity = kind.section_capacity();
                conn.execute(
                    "INSERT INTO sections(id, school_id, grade_level_id, name, capacity)
                     VALUES(?, ?, ?, ?, ?)",
                    (&section_id, &school_id, &grade.id, section_name, capacity),
                )?;

                let classroom = Classroom {
                    id: ctx.new_id(),
                    section_id: section_id.clone(),
                    grade_level_id: grade.id.clone(),
                    level: kind,
                    grade_order: order,
                    section_name: section_name.to_string(),
                    name: format!("{} {}", grade.name, section_name),
                    capacity,
                };
                conn.execute(
                    "INSERT INTO classrooms(id, school_id, section_id, name, capacity, location)
                     VALUES(?, ?, ?, ?, ?, ?)",
                    (
                        &classroom.id,
                        &school_id,
                        &section_id,
                        &classroom.name,
                        capacity,
                        kind.building(),
                    ),
                )?;
                ctx.classrooms.push(classroom);
            }
            ctx.grade_levels.push(grade);
        }
        ctx.levels.push(level);
    }
    debug!(
        levels = ctx.levels.len(),
        grades = ctx.grade_levels.len(),
        classrooms = ctx.classrooms.len(),
        "academic structure built"
    );
    Ok(())
}

pub fn create_subjects(conn: &Connection, ctx: &mut SeedContext) -> anyhow::Result<()> {
    let school_id = ctx.school_id()?;
    let grades = ctx.grade_levels.clone();
    let mut seen: HashSet<String> = HashSet::new();

    for grade in &grades {
        for d in subject_catalog(grade.level) {
            let code = subject_code(d.abbr, grade.level, grade.sort_order);
            if !seen.insert(code.clone()) {
                return Err(SeedError::DuplicateCode(code).into());
            }
            let subject = Subject {
                id: ctx.new_id(),
                grade_level_id: grade.id.clone(),
                name: d.name.to_string(),
                code,
            };
            let description = format!(
                "{} para {} de {}",
                d.name,
                grade.name,
                grade.level.name()
            );
            conn.execute(
                "INSERT INTO subjects(id, school_id, grade_level_id, name, code, description)
                 VALUES(?, ?, ?, ?, ?, ?)",
                (
                    &subject.id,
                    &school_id,
                    &subject.grade_level_id,
                    &subject.name,
                    &subject.code,
                    description,
                ),
            )?;
            ctx.subjects.push(subject);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::test_support::{fast_config, memory_db};

    fn built() -> (Connection, SeedContext) {
        let conn = memory_db();
        let mut ctx = SeedContext::new(fast_config(11), 11);
        create_school(&conn, &mut ctx).expect("school");
        create_calendar(&conn, &mut ctx).expect("calendar");
        create_structure(&conn, &mut ctx).expect("structure");
        create_subjects(&conn, &mut ctx).expect("subjects");
        (conn, ctx)
    }

    #[test]
    fn ordinal_suffixes_match_table() {
        let got: Vec<String> = (1..=6).map(ordinal).collect();
        assert_eq!(got, vec!["1er", "2do", "3er", "4to", "5to", "6to"]);
        assert_eq!(grade_level_name(LevelKind::Primaria, 6), "6to Grado");
        assert_eq!(grade_level_name(LevelKind::Secundaria, 3), "3er Año");
        assert_eq!(grade_level_name(LevelKind::Inicial, 1), "3 años");
    }

    #[test]
    fn periods_are_ordered_and_inside_the_year() {
        let (_conn, ctx) = built();
        let year = ctx.academic_year().expect("year");
        assert!(year.is_current);
        assert_eq!(ctx.periods.len(), 4);
        for p in &ctx.periods {
            assert!(p.start_date >= year.start_date && p.end_date <= year.end_date);
            assert!(p.start_date < p.end_date);
        }
        for w in ctx.periods.windows(2) {
            assert!(w[0].end_date < w[1].start_date);
        }
    }

    #[test]
    fn hierarchy_counts() {
        let (conn, ctx) = built();
        assert_eq!(ctx.levels.len(), 3);
        assert_eq!(ctx.grade_levels.len(), 14);
        assert_eq!(ctx.classrooms.len(), 28);
        // 3 * 5 + 6 * 8 + 5 * 10
        assert_eq!(ctx.subjects.len(), 113);

        let orders: Vec<i64> = ctx
            .grade_levels
            .iter()
            .filter(|g| g.level == LevelKind::Primaria)
            .map(|g| g.sort_order)
            .collect();
        assert_eq!(orders, vec![1, 2, 3, 4, 5, 6]);

        let inicial_caps: Vec<i64> = conn
            .prepare(
                "SELECT c.capacity FROM classrooms c WHERE c.location = 'Pabellón Inicial'",
            )
            .expect("prepare")
            .query_map([], |r| r.get(0))
            .expect("query")
            .collect::<Result<Vec<_>, _>>()
            .expect("rows");
        assert_eq!(inicial_caps.len(), 6);
        assert!(inicial_caps.iter().all(|c| *c == 25));
    }

    #[test]
    fn subject_codes_are_pairwise_unique() {
        let (_conn, ctx) = built();
        let codes: HashSet<&str> = ctx.subjects.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes.len(), ctx.subjects.len());
        assert!(codes.contains("MAT-P6"));
        assert!(codes.contains("COM-P6"));
        assert!(codes.contains("EPT-S5"));
    }
}
