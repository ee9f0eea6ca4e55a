//! Synthetic names, phones, dates and sequential codes.

use crate::error::SeedError;
use chrono::NaiveDate;
use rand::Rng;

pub const PHONE_PREFIX: &str = "+51";

pub const MALE_NAMES: &[&str] = &[
    "Santiago", "Mateo", "Sebastián", "Leonardo", "Matías", "Diego", "Nicolás", "Gabriel",
    "Alejandro", "Daniel", "Adrián", "Thiago", "Joaquín", "Lucas", "Samuel", "Benjamín",
    "Rodrigo", "Emiliano", "Fernando", "Carlos",
];

pub const FEMALE_NAMES: &[&str] = &[
    "Valentina", "Camila", "Sofía", "Isabella", "Luciana", "Mariana", "Valeria", "Gabriela",
    "Daniela", "Fernanda", "Ximena", "Renata", "Antonella", "Catalina", "Victoria", "Martina",
    "Alessandra", "Lucía", "Andrea", "Carla",
];

pub const SURNAMES: &[&str] = &[
    "García", "Rodríguez", "Quispe", "Flores", "Sánchez", "Ramírez", "Torres", "Mendoza",
    "Vásquez", "Castillo", "Rojas", "Chávez", "Huamán", "Gutiérrez", "Díaz", "Vargas",
    "Fernández", "Mamani", "Espinoza", "Paredes", "Salazar", "Cárdenas", "Ríos", "Herrera",
];

pub const OCCUPATIONS: &[&str] = &[
    "Ingeniero", "Contador", "Docente", "Médico", "Abogado", "Comerciante", "Enfermero",
    "Administrador", "Arquitecto", "Independiente",
];

pub const STREETS: &[&str] = &[
    "Av. Arequipa",
    "Jr. de la Unión",
    "Av. Brasil",
    "Calle Los Pinos",
    "Av. La Marina",
    "Jr. Huallaga",
    "Av. Javier Prado",
    "Calle Las Begonias",
];

/// Uniform pick. An empty list is an error rather than a panic.
pub fn random_element<'a, T, R: Rng + ?Sized>(
    rng: &mut R,
    list: &'a [T],
) -> Result<&'a T, SeedError> {
    if list.is_empty() {
        return Err(SeedError::InvalidArgument(
            "cannot pick from an empty list".to_string(),
        ));
    }
    Ok(&list[rng.gen_range(0..list.len())])
}

/// Country prefix followed by exactly nine zero-padded digits.
pub fn generate_phone<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("{}{:09}", PHONE_PREFIX, rng.gen_range(0..1_000_000_000u32))
}

/// Year in `[start_year, end_year]`, any month, day capped at 28 so every month is valid.
pub fn generate_date<R: Rng + ?Sized>(
    rng: &mut R,
    start_year: i32,
    end_year: i32,
) -> Result<NaiveDate, SeedError> {
    if start_year > end_year {
        return Err(SeedError::InvalidArgument(format!(
            "year range {}..={} is empty",
            start_year, end_year
        )));
    }
    let year = rng.gen_range(start_year..=end_year);
    let month0 = rng.gen_range(0..12u32);
    let day = rng.gen_range(1..=28u32);
    NaiveDate::from_ymd_opt(year, month0 + 1, day).ok_or_else(|| {
        SeedError::InvalidArgument(format!("year {} is out of calendar range", year))
    })
}

pub fn generate_address<R: Rng + ?Sized>(rng: &mut R) -> Result<String, SeedError> {
    let street = random_element(rng, STREETS)?;
    Ok(format!("{} {}", street, rng.gen_range(100..=2999)))
}

/// RNG-backed UUID so seeded runs reproduce ids too.
pub fn new_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    uuid::Builder::from_random_bytes(rng.gen())
        .into_uuid()
        .to_string()
}

/// Yields `EST-{year}-001`, `EST-{year}-002`, ... for one generation run.
#[derive(Debug, Clone)]
pub struct EnrollmentCodes {
    year: i32,
    next: u32,
}

impl EnrollmentCodes {
    pub fn new(year: i32) -> Self {
        Self { year, next: 1 }
    }
}

impl Iterator for EnrollmentCodes {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let code = format!("EST-{}-{:03}", self.year, self.next);
        self.next += 1;
        Some(code)
    }
}
