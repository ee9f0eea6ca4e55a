use crate::error::SeedError;
use serde::Serialize;

/// One entity-creation stage of a generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SeedStep {
    School,
    Staff,
    Calendar,
    Structure,
    Subjects,
    Curriculum,
    Students,
    Parents,
    Courses,
    Tasks,
    Grades,
    Attendance,
    Payments,
    Workshops,
}

impl SeedStep {
    /// Steps whose rows this step references.
    pub fn depends_on(self) -> &'static [SeedStep] {
        use SeedStep::*;
        match self {
            School => &[],
            Staff => &[School],
            Calendar => &[School],
            Structure => &[School],
            Subjects => &[Structure],
            Curriculum => &[Subjects],
            Students => &[Staff, Calendar, Structure],
            Parents => &[Students],
            Courses => &[Calendar, Subjects, Staff, Students],
            Tasks => &[Courses],
            Grades => &[Courses, Students, Calendar],
            Attendance => &[Courses, Students],
            Payments => &[Students],
            Workshops => &[Staff, Students],
        }
    }
}

#[derive(Debug, Clone)]
pub struct SeedPlan {
    steps: Vec<SeedStep>,
}

impl SeedPlan {
    pub fn standard() -> Self {
        use SeedStep::*;
        Self {
            steps: vec![
                School, Staff, Calendar, Structure, Subjects, Curriculum, Students, Parents,
                Courses, Tasks, Grades, Attendance, Payments, Workshops,
            ],
        }
    }

    #[cfg(test)]
    pub fn from_steps(steps: Vec<SeedStep>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[SeedStep] {
        &self.steps
    }

    /// Every dependency must appear strictly earlier in the plan.
    pub fn validate(&self) -> Result<(), SeedError> {
        for (i, step) in self.steps.iter().enumerate() {
            for dep in step.depends_on() {
                if !self.steps[..i].contains(dep) {
                    return Err(SeedError::PlanOrder {
                        step: *step,
                        missing: *dep,
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_plan_is_ordered() {
        SeedPlan::standard().validate().expect("standard plan");
    }

    #[test]
    fn swapped_steps_are_rejected() {
        let plan = SeedPlan::from_steps(vec![
            SeedStep::School,
            SeedStep::Subjects,
            SeedStep::Structure,
        ]);
        match plan.validate() {
            Err(SeedError::PlanOrder { step, missing }) => {
                assert_eq!(step, SeedStep::Subjects);
                assert_eq!(missing, SeedStep::Structure);
            }
            other => panic!("expected PlanOrder, got {:?}", other),
        }
    }

    #[test]
    fn missing_dependency_is_rejected() {
        let plan = SeedPlan::from_steps(vec![SeedStep::School, SeedStep::Parents]);
        assert!(plan.validate().is_err());
    }
}
