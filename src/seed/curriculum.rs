//! Monthly curriculum units and topics per subject.
//!
//! Subjects that already have any unit are skipped, so generating twice is a no-op.

use super::identity::new_id;
use crate::model::Subject;
use rand::Rng;
use rusqlite::Connection;
use serde::Serialize;
use tracing::debug;

/// March..=October, one unit each.
pub const FIRST_MONTH: u32 = 3;
pub const UNIT_COUNT: u32 = 8;
pub const GENERIC_TOPICS_PER_UNIT: u32 = 4;

type UnitTemplate = (&'static str, u32, &'static [&'static str]);

const MATH_6: [UnitTemplate; 8] = [
    (
        "Números naturales y operaciones",
        3,
        &[
            "Sistema de numeración decimal",
            "Operaciones combinadas",
            "Múltiplos y divisores",
            "Números primos y compuestos",
        ],
    ),
    (
        "Fracciones",
        4,
        &[
            "Fracciones equivalentes",
            "Operaciones con fracciones",
            "Fracciones en situaciones cotidianas",
            "Problemas con fracciones",
        ],
    ),
    (
        "Números decimales",
        5,
        &[
            "Lectura y escritura de decimales",
            "Operaciones con decimales",
            "Conversión de fracciones a decimales",
            "Problemas con decimales",
        ],
    ),
    (
        "Proporcionalidad",
        6,
        &[
            "Razones y proporciones",
            "Regla de tres simple",
            "Porcentajes",
            "Magnitudes directamente proporcionales",
        ],
    ),
    (
        "Geometría plana",
        7,
        &[
            "Ángulos y su medida",
            "Triángulos y cuadriláteros",
            "Perímetro de figuras",
            "Área de figuras planas",
            "Circunferencia y círculo",
        ],
    ),
    (
        "Geometría del espacio",
        8,
        &[
            "Prismas y pirámides",
            "Cilindro, cono y esfera",
            "Volumen de prismas",
            "Desarrollo de sólidos",
        ],
    ),
    (
        "Medidas",
        9,
        &[
            "Unidades de longitud",
            "Unidades de masa y capacidad",
            "Unidades de tiempo",
            "Conversión de unidades",
        ],
    ),
    (
        "Estadística y probabilidad",
        10,
        &[
            "Tablas de frecuencia",
            "Gráficos de barras y circulares",
            "Media, moda y mediana",
            "Probabilidad de sucesos simples",
            "Proyecto estadístico",
        ],
    ),
];

const COMMUNICATION_6: [UnitTemplate; 8] = [
    (
        "Comprensión lectora",
        3,
        &[
            "Tipos de textos",
            "Idea principal e ideas secundarias",
            "Inferencias",
            "Propósito del autor",
        ],
    ),
    (
        "Producción de textos narrativos",
        4,
        &[
            "Estructura del cuento",
            "Personajes y ambientes",
            "Secuencia narrativa",
            "Revisión y edición",
        ],
    ),
    (
        "Gramática y ortografía",
        5,
        &[
            "El sustantivo y el adjetivo",
            "El verbo y sus accidentes",
            "Acentuación general",
            "Uso de b y v",
            "Signos de puntuación",
        ],
    ),
    (
        "Textos informativos",
        6,
        &[
            "La noticia",
            "La infografía",
            "El artículo de divulgación",
            "Organizadores gráficos",
        ],
    ),
    (
        "Expresión oral",
        7,
        &[
            "La exposición",
            "El debate",
            "Técnicas de oratoria",
            "Escucha activa",
        ],
    ),
    (
        "Textos argumentativos",
        8,
        &[
            "Tesis y argumentos",
            "Conectores lógicos",
            "El artículo de opinión",
            "Redacción de argumentos",
        ],
    ),
    (
        "Literatura peruana",
        9,
        &[
            "Mitos y leyendas del Perú",
            "Poesía peruana",
            "Cuentos de autores peruanos",
            "Análisis literario",
        ],
    ),
    (
        "Comunicación y medios",
        10,
        &[
            "Los medios de comunicación",
            "Publicidad y propaganda",
            "Lectura crítica de medios",
            "Proyecto comunicativo",
            "Presentación final",
        ],
    ),
];

#[derive(Debug, Clone)]
pub struct SubjectRef {
    pub id: String,
    pub name: String,
    pub code: String,
}

impl From<&Subject> for SubjectRef {
    fn from(s: &Subject) -> Self {
        Self {
            id: s.id.clone(),
            name: s.name.clone(),
            code: s.code.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurriculumOutcome {
    pub generated: usize,
    pub skipped: usize,
    pub units: usize,
    pub topics: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedUnit {
    pub title: String,
    pub month: u32,
    pub topics: Vec<String>,
}

fn detailed_template(code: &str) -> Option<&'static [UnitTemplate]> {
    match code {
        "MAT-P6" => Some(&MATH_6),
        "COM-P6" => Some(&COMMUNICATION_6),
        _ => None,
    }
}

/// The units a subject receives: hand-written for 6th-grade Math and Communication,
/// generic numbered units for everything else.
pub fn plan_units(subject: &SubjectRef) -> Vec<PlannedUnit> {
    if let Some(template) = detailed_template(&subject.code) {
        return template
            .iter()
            .map(|(title, month, topics)| PlannedUnit {
                title: title.to_string(),
                month: *month,
                topics: topics.iter().map(|t| t.to_string()).collect(),
            })
            .collect();
    }
    (1..=UNIT_COUNT)
        .map(|n| PlannedUnit {
            title: format!("Unidad {}: {}", n, subject.name),
            month: FIRST_MONTH + n - 1,
            topics: (1..=GENERIC_TOPICS_PER_UNIT)
                .map(|t| format!("Tema {} - Unidad {}", t, n))
                .collect(),
        })
        .collect()
}

pub fn unit_count(conn: &Connection, subject_id: &str) -> anyhow::Result<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM curriculum_units WHERE subject_id = ?",
        [subject_id],
        |r| r.get(0),
    )?)
}

pub fn generate_curricula<R: Rng + ?Sized>(
    conn: &Connection,
    rng: &mut R,
    school_id: &str,
    subjects: &[SubjectRef],
) -> anyhow::Result<CurriculumOutcome> {
    let mut out = CurriculumOutcome::default();
    for subject in subjects {
        if unit_count(conn, &subject.id)? > 0 {
            debug!(code = %subject.code, "curriculum already present, skipping");
            out.skipped += 1;
            continue;
        }
        for (i, unit) in plan_units(subject).into_iter().enumerate() {
            let unit_id = new_id(rng);
            conn.execute(
                "INSERT INTO curriculum_units(id, school_id, subject_id, title, sort_order, month)
                 VALUES(?, ?, ?, ?, ?, ?)",
                (
                    &unit_id,
                    school_id,
                    &subject.id,
                    &unit.title,
                    i as i64 + 1,
                    unit.month,
                ),
            )?;
            for (j, topic) in unit.topics.iter().enumerate() {
                conn.execute(
                    "INSERT INTO curriculum_topics(id, school_id, unit_id, title, sort_order)
                     VALUES(?, ?, ?, ?, ?)",
                    (new_id(rng), school_id, &unit_id, topic, j as i64 + 1),
                )?;
                out.topics += 1;
            }
            out.units += 1;
        }
        out.generated += 1;
    }
    Ok(out)
}

/// Loads subjects for one school, optionally narrowed to a single id.
pub fn load_subjects(
    conn: &Connection,
    school_id: &str,
    subject_id: Option<&str>,
) -> anyhow::Result<Vec<SubjectRef>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, code FROM subjects
         WHERE school_id = ?1 AND (?2 IS NULL OR id = ?2)
         ORDER BY code",
    )?;
    let rows = stmt
        .query_map((school_id, subject_id), |r| {
            Ok(SubjectRef {
                id: r.get(0)?,
                name: r.get(1)?,
                code: r.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::structure;
    use crate::seed::test_support::{fast_config, memory_db};
    use crate::seed::SeedContext;

    fn subject(name: &str, code: &str) -> SubjectRef {
        SubjectRef {
            id: "x".to_string(),
            name: name.to_string(),
            code: code.to_string(),
        }
    }

    #[test]
    fn generic_units_follow_naming_rule() {
        let units = plan_units(&subject("Inglés", "ING-P2"));
        assert_eq!(units.len(), 8);
        assert_eq!(units[0].title, "Unidad 1: Inglés");
        assert_eq!(units[0].month, 3);
        assert_eq!(units[7].month, 10);
        assert_eq!(
            units[2].topics,
            vec![
                "Tema 1 - Unidad 3",
                "Tema 2 - Unidad 3",
                "Tema 3 - Unidad 3",
                "Tema 4 - Unidad 3"
            ]
        );
    }

    #[test]
    fn sixth_grade_math_uses_detailed_template() {
        let units = plan_units(&subject("Matemática", "MAT-P6"));
        assert_eq!(units.len(), 8);
        assert_eq!(units[1].title, "Fracciones");
        let months: Vec<u32> = units.iter().map(|u| u.month).collect();
        assert_eq!(months, (3..=10).collect::<Vec<u32>>());
        assert!(units.iter().all(|u| (4..=5).contains(&u.topics.len())));

        let comm = plan_units(&subject("Comunicación", "COM-P6"));
        assert_eq!(comm[0].title, "Comprensión lectora");
        // Same subject name in another grade gets the generic plan.
        let other = plan_units(&subject("Matemática", "MAT-P5"));
        assert_eq!(other[0].title, "Unidad 1: Matemática");
    }

    #[test]
    fn second_generation_is_a_no_op() {
        let conn = memory_db();
        let mut ctx = SeedContext::new(fast_config(3), 3);
        structure::create_school(&conn, &mut ctx).expect("school");
        structure::create_structure(&conn, &mut ctx).expect("structure");
        structure::create_subjects(&conn, &mut ctx).expect("subjects");
        let school_id = ctx.school_id().expect("school id");
        let targets: Vec<SubjectRef> = ctx.subjects.iter().map(SubjectRef::from).collect();

        let first = generate_curricula(&conn, &mut ctx.rng, &school_id, &targets).expect("first");
        assert_eq!(first.generated, targets.len());
        assert_eq!(first.skipped, 0);
        let before: i64 = conn
            .query_row("SELECT COUNT(*) FROM curriculum_units", [], |r| r.get(0))
            .expect("count");
        assert_eq!(before, 8 * targets.len() as i64);

        let second =
            generate_curricula(&conn, &mut ctx.rng, &school_id, &targets).expect("second");
        assert_eq!(second.generated, 0);
        assert_eq!(second.skipped, targets.len());
        let after: i64 = conn
            .query_row("SELECT COUNT(*) FROM curriculum_units", [], |r| r.get(0))
            .expect("count");
        assert_eq!(before, after);
    }

    #[test]
    fn load_subjects_filters_by_id() {
        let conn = memory_db();
        let mut ctx = SeedContext::new(fast_config(4), 4);
        structure::create_school(&conn, &mut ctx).expect("school");
        structure::create_structure(&conn, &mut ctx).expect("structure");
        structure::create_subjects(&conn, &mut ctx).expect("subjects");
        let school_id = ctx.school_id().expect("school id");

        let all = load_subjects(&conn, &school_id, None).expect("all");
        assert_eq!(all.len(), ctx.subjects.len());
        let one = load_subjects(&conn, &school_id, Some(&ctx.subjects[0].id)).expect("one");
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].code, ctx.subjects[0].code);
    }
}
