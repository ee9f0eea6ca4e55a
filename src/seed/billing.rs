use super::identity::random_element;
use super::SeedContext;
use crate::model::{LevelKind, PaymentStatus};
use anyhow::anyhow;
use chrono::{Duration, NaiveDate};
use rand::Rng;
use rusqlite::Connection;

pub const PAYMENT_METHODS: [&str; 3] = ["Transferencia", "Efectivo", "Tarjeta"];

/// Tuition rows run March..=December, indexed 0..10.
pub const TUITION_MONTHS: u32 = 10;
pub const FIRST_TUITION_MONTH: u32 = 3;
/// Indices below this are paid (March through November).
pub const PAID_BEFORE_INDEX: u32 = 9;
pub const DUE_DAY: u32 = 10;

const MONTH_NAMES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

pub fn monthly_fee(level: LevelKind) -> f64 {
    match level {
        LevelKind::Inicial => 350.0,
        LevelKind::Primaria => 400.0,
        LevelKind::Secundaria => 450.0,
    }
}

pub fn enrollment_fee(level: LevelKind) -> f64 {
    match level {
        LevelKind::Inicial => 250.0,
        LevelKind::Primaria => 300.0,
        LevelKind::Secundaria => 350.0,
    }
}

/// Status of tuition row `index` (0 = March). Index 9 (December) is the overdue month;
/// anything past the tenth row would be pending.
pub fn monthly_status(index: u32) -> PaymentStatus {
    if index < PAID_BEFORE_INDEX {
        PaymentStatus::Paid
    } else if index < TUITION_MONTHS {
        PaymentStatus::Overdue
    } else {
        PaymentStatus::Pending
    }
}

struct PaymentRow {
    concept: String,
    amount: f64,
    due_date: NaiveDate,
    status: PaymentStatus,
}

pub fn create_payments(conn: &Connection, ctx: &mut SeedContext) -> anyhow::Result<()> {
    let school_id = ctx.school_id()?;
    let year = ctx.cfg.academic_year;
    let students = ctx.students.clone();

    for student in &students {
        let mut rows = Vec::with_capacity(TUITION_MONTHS as usize + 1);
        rows.push(PaymentRow {
            concept: format!("Matrícula {}", year),
            amount: enrollment_fee(student.level),
            due_date: date(year, 2, 15)?,
            status: PaymentStatus::Paid,
        });
        for index in 0..TUITION_MONTHS {
            let month = FIRST_TUITION_MONTH + index;
            rows.push(PaymentRow {
                concept: format!("Pensión {}", MONTH_NAMES[(month - 1) as usize]),
                amount: monthly_fee(student.level),
                due_date: date(year, month, DUE_DAY)?,
                status: monthly_status(index),
            });
        }

        for row in rows {
            let (paid_date, method) = if row.status == PaymentStatus::Paid {
                let lag = ctx.rng.gen_range(3..=5);
                let method = random_element(&mut ctx.rng, &PAYMENT_METHODS)?;
                (
                    Some((row.due_date + Duration::days(lag)).to_string()),
                    Some(*method),
                )
            } else {
                (None, None)
            };
            let id = ctx.new_id();
            conn.execute(
                "INSERT INTO payments(id, school_id, student_id, concept, amount, due_date, paid_date, status, method)
                 VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?)",
                (
                    &id,
                    &school_id,
                    &student.id,
                    &row.concept,
                    row.amount,
                    row.due_date.to_string(),
                    paid_date,
                    row.status.as_str(),
                    method,
                ),
            )?;
        }
    }
    Ok(())
}

fn date(year: i32, month: u32, day: u32) -> anyhow::Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| anyhow!("invalid due date {}-{:02}-{:02}", year, month, day))
}
