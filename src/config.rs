use anyhow::Context;
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchoolInfo {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
}

impl Default for SchoolInfo {
    fn default() -> Self {
        Self {
            name: "Colegio San Martín de Porres".to_string(),
            address: "Av. Los Próceres 1250, Lima".to_string(),
            phone: "+51014567890".to_string(),
            email: "contacto@sanmartin.edu.pe".to_string(),
        }
    }
}

/// Argon2id cost parameters. Defaults follow the argon2 crate defaults.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PasswordHashConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordHashConfig {
    fn default() -> Self {
        Self {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClassroomLoad {
    pub inicial: usize,
    pub other: usize,
}

impl Default for ClassroomLoad {
    fn default() -> Self {
        Self {
            inicial: 8,
            other: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeedConfig {
    pub rng_seed: Option<u64>,
    pub academic_year: i32,
    pub reference_date: Option<NaiveDate>,
    pub default_password: String,
    pub password_hash: PasswordHashConfig,
    pub school: SchoolInfo,
    pub students_per_classroom: ClassroomLoad,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            rng_seed: None,
            academic_year: 2024,
            reference_date: None,
            default_password: "123456".to_string(),
            password_hash: PasswordHashConfig::default(),
            school: SchoolInfo::default(),
            students_per_classroom: ClassroomLoad::default(),
        }
    }
}

impl SeedConfig {
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.to_string_lossy()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("config {} is invalid", path.to_string_lossy()))
    }

    /// Layers `patch` over `self`, descending into nested objects such as `school`.
    /// Keys absent from the patch keep their current value at every depth.
    pub fn merged_with(&self, patch: &serde_json::Value) -> anyhow::Result<Self> {
        if !patch.is_object() {
            anyhow::bail!("config must be an object");
        }
        let mut base = self.to_json();
        merge_json(&mut base, patch);
        serde_json::from_value(base).context("config is invalid")
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| Local::now().date_naive())
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "rngSeed": self.rng_seed,
            "academicYear": self.academic_year,
            "referenceDate": self.reference_date,
            "defaultPassword": self.default_password,
            "passwordHash": {
                "memoryKib": self.password_hash.memory_kib,
                "iterations": self.password_hash.iterations,
                "parallelism": self.password_hash.parallelism,
            },
            "school": {
                "name": self.school.name,
                "address": self.school.address,
                "phone": self.school.phone,
                "email": self.school.email,
            },
            "studentsPerClassroom": {
                "inicial": self.students_per_classroom.inicial,
                "other": self.students_per_classroom.other,
            },
        })
    }
}

fn merge_json(base: &mut serde_json::Value, patch: &serde_json::Value) {
    match (base, patch) {
        (serde_json::Value::Object(base), serde_json::Value::Object(patch)) => {
            for (k, v) in patch {
                match base.get_mut(k) {
                    Some(slot) => merge_json(slot, v),
                    None => {
                        base.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (base, patch) => *base = patch.clone(),
    }
}
