use crate::seed::plan::SeedStep;

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("duplicate subject code: {0}")]
    DuplicateCode(String),

    /// A plan step is scheduled before one of the steps it reads from.
    #[error("plan step {step:?} runs before its dependency {missing:?}")]
    PlanOrder { step: SeedStep, missing: SeedStep },

    #[error("password hashing failed: {0}")]
    PasswordHash(String),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StatsError {
    #[error("task cannot go from {from} on {event}")]
    IllegalTransition {
        from: &'static str,
        event: &'static str,
    },

    #[error("invalid grading scale: {0}")]
    InvalidScale(f64),
}

impl StatsError {
    pub fn code(&self) -> &'static str {
        match self {
            StatsError::IllegalTransition { .. } => "illegal_transition",
            StatsError::InvalidScale(_) => "bad_params",
        }
    }
}
