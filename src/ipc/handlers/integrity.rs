use crate::integrity::{self, IssueKind};
use crate::ipc::helpers::{with_db, HandlerErr};
use crate::ipc::types::{AppState, Request};
use rusqlite::Connection;
use tracing::warn;

fn integrity_check(conn: &Connection, _params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let report = integrity::check(conn).map_err(|e| HandlerErr::db(format!("{e:#}")))?;
    if !report.ok {
        warn!(
            issues = report.issues.len(),
            schedule_conflicts = report.count(IssueKind::ScheduleConflict),
            "integrity check found issues"
        );
    }
    serde_json::to_value(&report).map_err(HandlerErr::db)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "integrity.check" => Some(with_db(state, req, integrity_check)),
        _ => None,
    }
}
