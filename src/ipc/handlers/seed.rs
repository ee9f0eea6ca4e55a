use crate::config::SeedConfig;
use crate::db;
use crate::ipc::helpers::{get_optional_date, get_optional_str, with_db, with_db_mut, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::seed::{self, curriculum};
use rusqlite::{Connection, OptionalExtension};
use serde_json::json;
use tracing::{info, warn};

/// Defaults, then `params.config`, then the top-level `seed` / `referenceDate` overrides.
fn seed_config_from_params(params: &serde_json::Value) -> Result<SeedConfig, HandlerErr> {
    let mut cfg = match params.get("config") {
        None | Some(serde_json::Value::Null) => SeedConfig::default(),
        Some(patch) => SeedConfig::default()
            .merged_with(patch)
            .map_err(|e| HandlerErr::bad_params(format!("{e:#}")))?,
    };
    match params.get("seed") {
        None | Some(serde_json::Value::Null) => {}
        Some(v) => {
            let Some(n) = v.as_u64() else {
                return Err(HandlerErr::bad_params("seed must be a non-negative integer"));
            };
            cfg.rng_seed = Some(n);
        }
    }
    if let Some(date) = get_optional_date(params, "referenceDate")? {
        cfg.reference_date = Some(date);
    }
    Ok(cfg)
}

fn seed_run(conn: &mut Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let cfg = seed_config_from_params(params)?;
    match seed::run_seed(conn, &cfg) {
        Ok(summary) => serde_json::to_value(&summary).map_err(|e| HandlerErr {
            code: "seed_failed",
            message: e.to_string(),
            details: None,
        }),
        Err(e) => {
            warn!(error = %format!("{e:#}"), "seed run failed");
            Err(HandlerErr {
                code: "seed_failed",
                message: format!("{e:#}"),
                details: None,
            })
        }
    }
}

fn seed_counts(conn: &Connection, _params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let counts = db::entity_counts(conn).map_err(HandlerErr::db)?;
    Ok(json!({ "counts": db::counts_json(&counts) }))
}

fn curriculum_generate(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let subject_id = get_optional_str(params, "subjectId");
    let school_id: Option<String> = conn
        .query_row("SELECT id FROM schools ORDER BY id LIMIT 1", [], |r| r.get(0))
        .optional()?;
    let Some(school_id) = school_id else {
        return Err(HandlerErr {
            code: "not_found",
            message: "no school in workspace; run seed.run first".to_string(),
            details: None,
        });
    };

    let subjects = curriculum::load_subjects(conn, &school_id, subject_id.as_deref())
        .map_err(HandlerErr::db)?;
    if let Some(id) = subject_id.as_deref() {
        if subjects.is_empty() {
            return Err(HandlerErr::not_found("subject", id));
        }
    }

    let tx = conn.unchecked_transaction()?;
    let outcome = curriculum::generate_curricula(&tx, &mut rand::thread_rng(), &school_id, &subjects)
        .map_err(HandlerErr::db)?;
    tx.commit()?;
    info!(
        generated = outcome.generated,
        skipped = outcome.skipped,
        "curriculum generated"
    );
    Ok(json!({
        "generated": outcome.generated,
        "skipped": outcome.skipped,
        "units": outcome.units,
        "topics": outcome.topics,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "seed.run" => Some(with_db_mut(state, req, seed_run)),
        "seed.counts" => Some(with_db(state, req, seed_counts)),
        "curriculum.generate" => Some(with_db(state, req, curriculum_generate)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_level_params_override_config() {
        let cfg = seed_config_from_params(&json!({
            "seed": 7,
            "referenceDate": "2024-05-02",
            "config": { "rngSeed": 1, "academicYear": 2025 }
        }))
        .map_err(|e| e.message)
        .expect("config");
        assert_eq!(cfg.rng_seed, Some(7));
        assert_eq!(cfg.academic_year, 2025);
        assert_eq!(cfg.reference_date.map(|d| d.to_string()).as_deref(), Some("2024-05-02"));
    }

    #[test]
    fn rejects_negative_seed_and_bad_date() {
        let neg = seed_config_from_params(&json!({ "seed": -3 }));
        assert!(matches!(neg, Err(HandlerErr { code: "bad_params", .. })));
        let date = seed_config_from_params(&json!({ "referenceDate": "14/06/2024" }));
        assert!(matches!(date, Err(HandlerErr { code: "bad_params", .. })));
    }
}
