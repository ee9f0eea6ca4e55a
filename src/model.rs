use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Teacher,
    Student,
    Parent,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Teacher => "TEACHER",
            Role::Student => "STUDENT",
            Role::Parent => "PARENT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    Present,
    Late,
    Excused,
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "PRESENT",
            AttendanceStatus::Late => "LATE",
            AttendanceStatus::Excused => "EXCUSED",
            AttendanceStatus::Absent => "ABSENT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PRESENT" => Some(AttendanceStatus::Present),
            "LATE" => Some(AttendanceStatus::Late),
            "EXCUSED" => Some(AttendanceStatus::Excused),
            "ABSENT" => Some(AttendanceStatus::Absent),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    Homework,
    Exam,
    Project,
    Quiz,
}

impl TaskType {
    pub const ALL: [TaskType; 4] = [
        TaskType::Homework,
        TaskType::Exam,
        TaskType::Project,
        TaskType::Quiz,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskType::Homework => "HOMEWORK",
            TaskType::Exam => "EXAM",
            TaskType::Project => "PROJECT",
            TaskType::Quiz => "QUIZ",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskType::Homework => "Tarea",
            TaskType::Exam => "Examen",
            TaskType::Project => "Proyecto",
            TaskType::Quiz => "Práctica",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Paid,
    Pending,
    Overdue,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Overdue => "OVERDUE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PAID" => Some(PaymentStatus::Paid),
            "PENDING" => Some(PaymentStatus::Pending),
            "OVERDUE" => Some(PaymentStatus::Overdue),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrollmentStatus {
    Active,
    Withdrawn,
    Graduated,
}

impl EnrollmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EnrollmentStatus::Active => "ACTIVE",
            EnrollmentStatus::Withdrawn => "WITHDRAWN",
            EnrollmentStatus::Graduated => "GRADUATED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
        }
    }
}

/// Educational tier. The discriminant is the persisted `order`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LevelKind {
    Inicial = 1,
    Primaria = 2,
    Secundaria = 3,
}

impl LevelKind {
    pub const ALL: [LevelKind; 3] = [LevelKind::Inicial, LevelKind::Primaria, LevelKind::Secundaria];

    pub fn name(self) -> &'static str {
        match self {
            LevelKind::Inicial => "Inicial",
            LevelKind::Primaria => "Primaria",
            LevelKind::Secundaria => "Secundaria",
        }
    }

    pub fn order(self) -> i64 {
        self as i64
    }

    pub fn grade_count(self) -> i64 {
        match self {
            LevelKind::Inicial => 3,
            LevelKind::Primaria => 6,
            LevelKind::Secundaria => 5,
        }
    }

    pub fn section_capacity(self) -> i64 {
        match self {
            LevelKind::Inicial => 25,
            _ => 30,
        }
    }

    pub fn building(self) -> &'static str {
        match self {
            LevelKind::Inicial => "Pabellón Inicial",
            LevelKind::Primaria => "Pabellón Primaria",
            LevelKind::Secundaria => "Pabellón Secundaria",
        }
    }

    /// Letter used in subject codes, e.g. `MAT-P6`.
    pub fn code_prefix(self) -> char {
        match self {
            LevelKind::Inicial => 'I',
            LevelKind::Primaria => 'P',
            LevelKind::Secundaria => 'S',
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct School {
    pub id: String,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: String,
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub specialty: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcademicYear {
    pub id: String,
    pub school_id: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_current: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub id: String,
    pub academic_year_id: String,
    pub name: String,
    pub sort_order: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Level {
    pub id: String,
    pub kind: LevelKind,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeLevel {
    pub id: String,
    pub level_id: String,
    pub level: LevelKind,
    pub sort_order: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Classroom {
    pub id: String,
    pub section_id: String,
    pub grade_level_id: String,
    pub level: LevelKind,
    pub grade_order: i64,
    pub section_name: String,
    pub name: String,
    pub capacity: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    pub grade_level_id: String,
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub user_id: String,
    pub classroom_id: String,
    pub enrollment_code: String,
    pub first_name: String,
    pub paternal_surname: String,
    pub maternal_surname: String,
    pub gender: Gender,
    pub date_of_birth: NaiveDate,
    pub level: LevelKind,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub classroom_id: String,
    pub subject_id: String,
    pub subject_name: String,
    pub teacher_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub course_id: String,
    pub title: String,
    pub kind: TaskType,
    pub due_date: NaiveDate,
}
