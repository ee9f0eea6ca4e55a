//! Dashboard statistics over already-loaded records. Every function here is pure.

use crate::error::StatsError;
use crate::model::{AttendanceStatus, PaymentStatus};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

pub const DEFAULT_PASS_RATIO: f64 = 0.6;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeStats {
    pub count: usize,
    pub passed: usize,
    pub failed: usize,
    pub pending: usize,
    pub pass_threshold: f64,
    /// `None` when nothing has been graded yet.
    pub average: Option<f64>,
    pub median: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub pass_percentage: f64,
}

fn check_scale(max_score: f64, pass_ratio: f64) -> Result<f64, StatsError> {
    if !(max_score > 0.0) {
        return Err(StatsError::InvalidScale(max_score));
    }
    if !(pass_ratio > 0.0 && pass_ratio <= 1.0) {
        return Err(StatsError::InvalidScale(pass_ratio));
    }
    Ok(max_score * pass_ratio)
}

fn compute_median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let n = sorted.len();
    if n % 2 == 1 {
        Some(sorted[n / 2])
    } else {
        Some((sorted[(n / 2) - 1] + sorted[n / 2]) / 2.0)
    }
}

/// `passed / (passed + failed)` as a percentage, 0 when nothing is graded.
pub fn pass_percentage(passed: usize, failed: usize) -> f64 {
    let denom = (passed + failed).max(1);
    100.0 * passed as f64 / denom as f64
}

/// A score passes at `pass_ratio * max_score` or above. `None` scores count as pending.
pub fn grade_stats<I>(scores: I, max_score: f64, pass_ratio: f64) -> Result<GradeStats, StatsError>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let threshold = check_scale(max_score, pass_ratio)?;
    let mut graded: Vec<f64> = Vec::new();
    let mut pending = 0;
    let mut passed = 0;
    let mut failed = 0;
    for s in scores {
        match s {
            None => pending += 1,
            Some(v) => {
                if v >= threshold {
                    passed += 1;
                } else {
                    failed += 1;
                }
                graded.push(v);
            }
        }
    }

    let average = if graded.is_empty() {
        None
    } else {
        Some(graded.iter().sum::<f64>() / graded.len() as f64)
    };

    Ok(GradeStats {
        count: graded.len() + pending,
        passed,
        failed,
        pending,
        pass_threshold: threshold,
        average,
        median: compute_median(&graded),
        min: graded.iter().copied().reduce(f64::min),
        max: graded.iter().copied().reduce(f64::max),
        pass_percentage: pass_percentage(passed, failed),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttendanceDay {
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceStats {
    pub present: usize,
    pub late: usize,
    pub excused: usize,
    pub absent: usize,
    pub school_days: usize,
    pub rate: f64,
    pub current_streak: usize,
}

/// Weekdays up to and including `today`.
pub fn is_school_day(date: NaiveDate, today: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && date <= today
}

fn severity(status: AttendanceStatus) -> u8 {
    match status {
        AttendanceStatus::Present => 0,
        AttendanceStatus::Late => 1,
        AttendanceStatus::Excused => 2,
        AttendanceStatus::Absent => 3,
    }
}

/// Folds per-course records into one status per date, keeping the worst one.
pub fn collapse_by_day<I>(records: I) -> Vec<AttendanceDay>
where
    I: IntoIterator<Item = AttendanceDay>,
{
    let mut by_date: BTreeMap<NaiveDate, AttendanceStatus> = BTreeMap::new();
    for r in records {
        by_date
            .entry(r.date)
            .and_modify(|s| {
                if severity(r.status) > severity(*s) {
                    *s = r.status;
                }
            })
            .or_insert(r.status);
    }
    by_date
        .into_iter()
        .map(|(date, status)| AttendanceDay { date, status })
        .collect()
}

/// Counts and rate cover school days only. Only PRESENT counts towards the rate;
/// the streak walks back from the most recent school day until a non-present day.
pub fn attendance_stats(days: &[AttendanceDay], today: NaiveDate) -> AttendanceStats {
    let mut considered: Vec<AttendanceDay> = days
        .iter()
        .copied()
        .filter(|d| is_school_day(d.date, today))
        .collect();
    considered.sort_by(|a, b| b.date.cmp(&a.date));

    let count = |status: AttendanceStatus| considered.iter().filter(|d| d.status == status).count();
    let present = count(AttendanceStatus::Present);
    let school_days = considered.len();
    let rate = if school_days == 0 {
        0.0
    } else {
        100.0 * present as f64 / school_days as f64
    };
    let current_streak = considered
        .iter()
        .take_while(|d| d.status == AttendanceStatus::Present)
        .count();

    AttendanceStats {
        present,
        late: count(AttendanceStatus::Late),
        excused: count(AttendanceStatus::Excused),
        absent: count(AttendanceStatus::Absent),
        school_days,
        rate,
        current_streak,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Pending,
    Submitted,
    Graded,
    Overdue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskEvent {
    Submit,
    Grade,
    DeadlinePassed,
}

impl TaskState {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskState::Pending => "pending",
            TaskState::Submitted => "submitted",
            TaskState::Graded => "graded",
            TaskState::Overdue => "overdue",
        }
    }

    pub fn is_terminal(self) -> bool {
        self == TaskState::Graded
    }

    /// pending -> submitted -> graded, pending -> overdue -> submitted (late).
    pub fn apply(self, event: TaskEvent) -> Result<TaskState, StatsError> {
        use TaskEvent::*;
        use TaskState::*;
        let illegal = StatsError::IllegalTransition {
            from: self.as_str(),
            event: event.as_str(),
        };
        if self.is_terminal() {
            return Err(illegal);
        }
        match (self, event) {
            (Pending, Submit) | (Overdue, Submit) => Ok(Submitted),
            (Pending, DeadlinePassed) => Ok(Overdue),
            (Submitted, Grade) => Ok(Graded),
            _ => Err(illegal),
        }
    }
}

impl TaskEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskEvent::Submit => "submit",
            TaskEvent::Grade => "grade",
            TaskEvent::DeadlinePassed => "deadline_passed",
        }
    }
}

/// A task as one student sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskProgress {
    pub due_date: NaiveDate,
    pub max_score: f64,
    pub submitted_at: Option<NaiveDate>,
    pub score: Option<f64>,
}

/// Events that have happened to `task` by `today`, oldest first. A submission after
/// the due date is preceded by the deadline passing.
pub fn task_events(task: &TaskProgress, today: NaiveDate) -> Vec<TaskEvent> {
    let mut events = Vec::new();
    match task.submitted_at {
        Some(at) => {
            if at > task.due_date {
                events.push(TaskEvent::DeadlinePassed);
            }
            events.push(TaskEvent::Submit);
        }
        None if task.due_date < today => events.push(TaskEvent::DeadlinePassed),
        None => {}
    }
    if task.score.is_some() {
        events.push(TaskEvent::Grade);
    }
    events
}

/// Replays [`task_events`] from `Pending`. A score without a submission is rejected.
pub fn derive_task_state(task: &TaskProgress, today: NaiveDate) -> Result<TaskState, StatsError> {
    task_events(task, today)
        .into_iter()
        .try_fold(TaskState::Pending, TaskState::apply)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total: usize,
    pub pending: usize,
    pub submitted: usize,
    pub graded: usize,
    pub overdue: usize,
    pub passed: usize,
    pub failed: usize,
    pub pass_percentage: f64,
    pub average_percent: Option<f64>,
}

pub fn task_stats(
    tasks: &[TaskProgress],
    today: NaiveDate,
    pass_ratio: f64,
) -> Result<TaskStats, StatsError> {
    let mut out = TaskStats {
        total: tasks.len(),
        pending: 0,
        submitted: 0,
        graded: 0,
        overdue: 0,
        passed: 0,
        failed: 0,
        pass_percentage: 0.0,
        average_percent: None,
    };
    let mut percents: Vec<f64> = Vec::new();
    for t in tasks {
        match derive_task_state(t, today)? {
            TaskState::Pending => out.pending += 1,
            TaskState::Submitted => out.submitted += 1,
            TaskState::Overdue => out.overdue += 1,
            TaskState::Graded => {
                out.graded += 1;
                let threshold = check_scale(t.max_score, pass_ratio)?;
                let score = t.score.unwrap_or(0.0);
                if score >= threshold {
                    out.passed += 1;
                } else {
                    out.failed += 1;
                }
                percents.push(100.0 * score / t.max_score);
            }
        }
    }
    out.pass_percentage = pass_percentage(out.passed, out.failed);
    if !percents.is_empty() {
        out.average_percent = Some(percents.iter().sum::<f64>() / percents.len() as f64);
    }
    Ok(out)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaymentLine {
    pub amount: f64,
    pub status: PaymentStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSummary {
    pub paid: usize,
    pub pending: usize,
    pub overdue: usize,
    pub total_billed: f64,
    pub paid_amount: f64,
    pub outstanding: f64,
}

pub fn payment_summary(lines: &[PaymentLine]) -> PaymentSummary {
    let mut out = PaymentSummary {
        paid: 0,
        pending: 0,
        overdue: 0,
        total_billed: 0.0,
        paid_amount: 0.0,
        outstanding: 0.0,
    };
    for l in lines {
        out.total_billed += l.amount;
        match l.status {
            PaymentStatus::Paid => {
                out.paid += 1;
                out.paid_amount += l.amount;
            }
            PaymentStatus::Pending => out.pending += 1,
            PaymentStatus::Overdue => out.overdue += 1,
        }
    }
    out.outstanding = out.total_billed - out.paid_amount;
    out
}
