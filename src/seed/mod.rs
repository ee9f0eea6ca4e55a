//! Demo-data generation for one school.
//!
//! A run validates the [`plan::SeedPlan`], wipes the store and executes every
//! step inside a single SQLite transaction. Nothing is kept if a step fails.

pub mod academics;
pub mod billing;
pub mod curriculum;
pub mod identity;
pub mod people;
pub mod plan;
pub mod structure;
pub mod workshops;

use crate::config::SeedConfig;
use crate::db::{self, Entity};
use crate::model::{
    AcademicYear, Classroom, Course, GradeLevel, Level, Period, School, Student, Subject, Task,
    Teacher,
};
use anyhow::{anyhow, Context};
use chrono::NaiveDate;
use plan::{SeedPlan, SeedStep};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info};

/// Working state threaded through every plan step.
pub struct SeedContext {
    pub cfg: SeedConfig,
    pub rng: StdRng,
    pub today: NaiveDate,
    pub codes: identity::EnrollmentCodes,
    pub password_hash: Option<String>,
    pub school: Option<School>,
    pub year: Option<AcademicYear>,
    pub periods: Vec<Period>,
    pub levels: Vec<Level>,
    pub grade_levels: Vec<GradeLevel>,
    pub classrooms: Vec<Classroom>,
    pub subjects: Vec<Subject>,
    pub teachers: Vec<Teacher>,
    pub students: Vec<Student>,
    pub courses: Vec<Course>,
    pub tasks: Vec<Task>,
    pub curriculum: curriculum::CurriculumOutcome,
}

impl SeedContext {
    pub fn new(cfg: SeedConfig, seed: u64) -> Self {
        let today = cfg.reference_date();
        let codes = identity::EnrollmentCodes::new(cfg.academic_year);
        Self {
            cfg,
            rng: StdRng::seed_from_u64(seed),
            today,
            codes,
            password_hash: None,
            school: None,
            year: None,
            periods: Vec::new(),
            levels: Vec::new(),
            grade_levels: Vec::new(),
            classrooms: Vec::new(),
            subjects: Vec::new(),
            teachers: Vec::new(),
            students: Vec::new(),
            courses: Vec::new(),
            tasks: Vec::new(),
            curriculum: curriculum::CurriculumOutcome::default(),
        }
    }

    pub fn new_id(&mut self) -> String {
        identity::new_id(&mut self.rng)
    }

    pub fn school_id(&self) -> anyhow::Result<String> {
        self.school
            .as_ref()
            .map(|s| s.id.clone())
            .ok_or_else(|| anyhow!("school has not been created"))
    }

    pub fn academic_year(&self) -> anyhow::Result<&AcademicYear> {
        self.year
            .as_ref()
            .ok_or_else(|| anyhow!("academic year has not been created"))
    }

    pub fn password_hash(&self) -> anyhow::Result<String> {
        self.password_hash
            .clone()
            .ok_or_else(|| anyhow!("password hash has not been computed"))
    }

    #[cfg(test)]
    pub fn classroom(&self, id: &str) -> anyhow::Result<&Classroom> {
        self.classrooms
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| anyhow!("unknown classroom {}", id))
    }

    pub fn students_in(&self, classroom_id: &str) -> Vec<Student> {
        self.students
            .iter()
            .filter(|s| s.classroom_id == classroom_id)
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedSummary {
    pub rng_seed: u64,
    pub reference_date: NaiveDate,
    pub steps: Vec<SeedStep>,
    pub curriculum: curriculum::CurriculumOutcome,
    pub counts: serde_json::Value,
}

impl SeedSummary {
    pub fn count(&self, entity: Entity) -> i64 {
        self.counts
            .get(entity.table())
            .and_then(|v| v.as_i64())
            .unwrap_or(0)
    }
}

pub fn run_seed(conn: &mut Connection, cfg: &SeedConfig) -> anyhow::Result<SeedSummary> {
    run_plan(conn, cfg, &SeedPlan::standard())
}

pub fn run_plan(
    conn: &mut Connection,
    cfg: &SeedConfig,
    plan: &SeedPlan,
) -> anyhow::Result<SeedSummary> {
    plan.validate()?;

    let seed = cfg.rng_seed.unwrap_or_else(rand::random);
    let mut ctx = SeedContext::new(cfg.clone(), seed);
    info!(seed, today = %ctx.today, "seed run started");

    let tx = conn.transaction().context("failed to open seed transaction")?;
    db::clear_all(&tx).context("failed to clear existing data")?;
    for step in plan.steps() {
        debug!(?step, "seed step started");
        run_step(&tx, &mut ctx, *step).with_context(|| format!("seed step {:?} failed", step))?;
        info!(?step, "seed step finished");
    }
    let counts = db::entity_counts(&tx)?;
    tx.commit().context("failed to commit seed transaction")?;

    for (entity, n) in &counts {
        info!(table = entity.table(), rows = n, "seeded");
    }

    Ok(SeedSummary {
        rng_seed: seed,
        reference_date: ctx.today,
        steps: plan.steps().to_vec(),
        curriculum: ctx.curriculum,
        counts: db::counts_json(&counts),
    })
}

fn run_step(conn: &Connection, ctx: &mut SeedContext, step: SeedStep) -> anyhow::Result<()> {
    match step {
        SeedStep::School => structure::create_school(conn, ctx),
        SeedStep::Staff => people::create_staff(conn, ctx),
        SeedStep::Calendar => structure::create_calendar(conn, ctx),
        SeedStep::Structure => structure::create_structure(conn, ctx),
        SeedStep::Subjects => structure::create_subjects(conn, ctx),
        SeedStep::Curriculum => {
            let targets: Vec<curriculum::SubjectRef> =
                ctx.subjects.iter().map(curriculum::SubjectRef::from).collect();
            let school_id = ctx.school_id()?;
            ctx.curriculum =
                curriculum::generate_curricula(conn, &mut ctx.rng, &school_id, &targets)?;
            Ok(())
        }
        SeedStep::Students => people::create_students(conn, ctx),
        SeedStep::Parents => people::create_parents(conn, ctx),
        SeedStep::Courses => academics::create_courses(conn, ctx),
        SeedStep::Tasks => academics::create_tasks(conn, ctx),
        SeedStep::Grades => academics::create_grades(conn, ctx),
        SeedStep::Attendance => academics::create_attendance(conn, ctx),
        SeedStep::Payments => billing::create_payments(conn, ctx),
        SeedStep::Workshops => workshops::create_workshops(conn, ctx),
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{fast_config, memory_db};
    use super::*;

    #[test]
    fn seeded_runs_are_reproducible() {
        let mut a = memory_db();
        let mut b = memory_db();
        let sa = run_seed(&mut a, &fast_config(42)).expect("seed a");
        let sb = run_seed(&mut b, &fast_config(42)).expect("seed b");
        assert_eq!(sa.counts, sb.counts);

        let codes = |conn: &Connection| -> Vec<(String, String)> {
            let mut stmt = conn
                .prepare("SELECT id, enrollment_code FROM students ORDER BY enrollment_code")
                .expect("prepare");
            stmt.query_map([], |r| Ok((r.get(0)?, r.get(1)?)))
                .expect("query")
                .collect::<Result<Vec<_>, _>>()
                .expect("rows")
        };
        assert_eq!(codes(&a), codes(&b));
    }

    #[test]
    fn default_run_enrolls_sixty_students_across_all_levels() {
        let mut conn = memory_db();
        let summary = run_seed(&mut conn, &fast_config(3)).expect("seed");
        assert_eq!(summary.count(Entity::Student), 60);
        assert_eq!(summary.count(Entity::Enrollment), 60);

        let levels: i64 = conn
            .query_row(
                "SELECT COUNT(DISTINCT l.id)
                 FROM enrollments e
                 JOIN classrooms c ON c.id = e.classroom_id
                 JOIN sections s ON s.id = c.section_id
                 JOIN grade_levels g ON g.id = s.grade_level_id
                 JOIN levels l ON l.id = g.level_id",
                [],
                |r| r.get(0),
            )
            .expect("levels");
        assert_eq!(levels, 3);
    }

    #[test]
    fn rerun_replaces_previous_data() {
        let mut conn = memory_db();
        let first = run_seed(&mut conn, &fast_config(1)).expect("first");
        let second = run_seed(&mut conn, &fast_config(2)).expect("second");
        assert_eq!(first.count(Entity::Student), second.count(Entity::Student));
        assert_eq!(second.count(Entity::School), 1);
    }

    #[test]
    fn failed_plan_leaves_store_untouched() {
        let mut conn = memory_db();
        run_seed(&mut conn, &fast_config(5)).expect("seed");
        let before = db::entity_counts(&conn).expect("counts");

        let broken = SeedPlan::from_steps(vec![SeedStep::School, SeedStep::Courses]);
        assert!(run_plan(&mut conn, &fast_config(6), &broken).is_err());
        assert_eq!(db::entity_counts(&conn).expect("counts"), before);
    }

    #[test]
    fn failing_step_rolls_back_the_whole_run() {
        let mut conn = memory_db();
        run_seed(&mut conn, &fast_config(8)).expect("seed");
        let before = db::entity_counts(&conn).expect("counts");

        // Over-capacity classrooms are rejected inside the Students step, after the clear.
        let mut bad_cfg = fast_config(9);
        bad_cfg.students_per_classroom.other = 40;
        assert!(run_seed(&mut conn, &bad_cfg).is_err());
        assert_eq!(db::entity_counts(&conn).expect("counts"), before);
    }
}
