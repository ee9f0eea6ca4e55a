use super::SeedContext;
use anyhow::anyhow;
use rand::seq::SliceRandom;
use rand::Rng;
use rusqlite::Connection;

pub struct WorkshopDef {
    pub name: &'static str,
    pub description: &'static str,
    pub schedule: &'static str,
    pub capacity: usize,
    pub monthly_fee: f64,
}

pub const WORKSHOPS: [WorkshopDef; 8] = [
    WorkshopDef {
        name: "Fútbol",
        description: "Entrenamiento de fundamentos y trabajo en equipo",
        schedule: "Lunes y Miércoles 15:30 - 17:00",
        capacity: 20,
        monthly_fee: 80.0,
    },
    WorkshopDef {
        name: "Ajedrez",
        description: "Estrategia, táctica y pensamiento lógico",
        schedule: "Martes 15:30 - 17:00",
        capacity: 12,
        monthly_fee: 60.0,
    },
    WorkshopDef {
        name: "Danza Folclórica",
        description: "Danzas tradicionales del Perú",
        schedule: "Jueves 15:30 - 17:00",
        capacity: 16,
        monthly_fee: 70.0,
    },
    WorkshopDef {
        name: "Robótica",
        description: "Construcción y programación de robots educativos",
        schedule: "Viernes 15:00 - 17:00",
        capacity: 10,
        monthly_fee: 120.0,
    },
    WorkshopDef {
        name: "Música",
        description: "Iniciación musical con instrumentos andinos y modernos",
        schedule: "Martes y Jueves 16:00 - 17:00",
        capacity: 15,
        monthly_fee: 90.0,
    },
    WorkshopDef {
        name: "Pintura",
        description: "Técnicas de dibujo y pintura",
        schedule: "Miércoles 15:30 - 17:00",
        capacity: 14,
        monthly_fee: 65.0,
    },
    WorkshopDef {
        name: "Teatro",
        description: "Expresión corporal y dramatización",
        schedule: "Lunes 15:30 - 17:00",
        capacity: 18,
        monthly_fee: 60.0,
    },
    WorkshopDef {
        name: "Natación",
        description: "Técnicas de nado y seguridad acuática",
        schedule: "Sábado 09:00 - 11:00",
        capacity: 12,
        monthly_fee: 150.0,
    },
];

pub const MIN_ROSTER: usize = 5;
pub const MAX_ROSTER: usize = 14;

pub fn create_workshops(conn: &Connection, ctx: &mut SeedContext) -> anyhow::Result<()> {
    let school_id = ctx.school_id()?;
    if ctx.teachers.is_empty() {
        return Err(anyhow!("no teachers available to lead workshops"));
    }
    let enrolled_at = ctx.today.to_string();
    let mut student_ids: Vec<String> = ctx.students.iter().map(|s| s.id.clone()).collect();

    for (i, def) in WORKSHOPS.iter().enumerate() {
        let workshop_id = ctx.new_id();
        let teacher_id = ctx.teachers[i % ctx.teachers.len()].id.clone();
        conn.execute(
            "INSERT INTO workshops(id, school_id, teacher_id, name, description, schedule, capacity, monthly_fee)
             VALUES(?, ?, ?, ?, ?, ?, ?, ?)",
            (
                &workshop_id,
                &school_id,
                &teacher_id,
                def.name,
                def.description,
                def.schedule,
                def.capacity as i64,
                def.monthly_fee,
            ),
        )?;

        student_ids.shuffle(&mut ctx.rng);
        let roster = ctx
            .rng
            .gen_range(MIN_ROSTER..=MAX_ROSTER)
            .min(def.capacity)
            .min(student_ids.len());
        for student_id in student_ids.iter().take(roster) {
            let id = ctx.new_id();
            conn.execute(
                "INSERT INTO workshop_enrollments(id, school_id, workshop_id, student_id, enrolled_at)
                 VALUES(?, ?, ?, ?, ?)",
                (&id, &school_id, &workshop_id, student_id, &enrolled_at),
            )?;
        }
    }
    Ok(())
}
