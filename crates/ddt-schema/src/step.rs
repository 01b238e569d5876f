//! Step vocabulary shared by the planner, the runner and the artifact store

use crate::constraint::ConstraintKind;
use crate::path::DataPath;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Dialogue step of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BaseStep {
    /// First ask
    Start,
    /// Input not understood
    NoMatch,
    /// No input received
    NoInput,
    /// Ask the user to confirm
    Confirmation,
    /// User rejected the confirmation
    NotConfirmed,
    /// Value collected
    Success,
}

impl BaseStep {
    /// Steps of a main-level field, in order
    #[must_use]
    pub fn main_steps(with_not_confirmed: bool) -> Vec<Self> {
        let mut steps = vec![Self::Start, Self::NoMatch, Self::NoInput, Self::Confirmation];
        if with_not_confirmed {
            steps.push(Self::NotConfirmed);
        }
        steps.push(Self::Success);
        steps
    }

    /// Steps of a sub-field, in order
    #[must_use]
    pub fn sub_steps() -> Vec<Self> {
        vec![Self::Start, Self::NoMatch, Self::NoInput]
    }

    /// Stable camelCase name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::NoMatch => "noMatch",
            Self::NoInput => "noInput",
            Self::Confirmation => "confirmation",
            Self::NotConfirmed => "notConfirmed",
            Self::Success => "success",
        }
    }
}

impl Display for BaseStep {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type of a generation step
///
/// Serialized as its flat camelCase name (`noMatch`, `validator`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepType {
    /// Recovery messages for one constraint
    ConstraintMessages,
    /// Validator source for one constraint
    Validator,
    /// Test cases for one constraint
    Testset,
    /// Prompt text for a dialogue step
    Base(BaseStep),
}

impl StepType {
    /// Constraint step types, in emission order
    pub const CONSTRAINT_STEPS: [Self; 3] =
        [Self::ConstraintMessages, Self::Validator, Self::Testset];

    /// Base step, if this is one
    #[inline]
    #[must_use]
    pub fn base(&self) -> Option<BaseStep> {
        match self {
            Self::Base(step) => Some(*step),
            _ => None,
        }
    }

    /// Stable camelCase name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Base(step) => step.as_str(),
            Self::ConstraintMessages => "constraintMessages",
            Self::Validator => "validator",
            Self::Testset => "testset",
        }
    }
}

impl Display for StepType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepType {
    type Err = StepTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let step = match s {
            "constraintMessages" => Self::ConstraintMessages,
            "validator" => Self::Validator,
            "testset" => Self::Testset,
            "start" => Self::Base(BaseStep::Start),
            "noMatch" => Self::Base(BaseStep::NoMatch),
            "noInput" => Self::Base(BaseStep::NoInput),
            "confirmation" => Self::Base(BaseStep::Confirmation),
            "notConfirmed" => Self::Base(BaseStep::NotConfirmed),
            "success" => Self::Base(BaseStep::Success),
            other => return Err(StepTypeError::Unknown(other.to_string())),
        };
        Ok(step)
    }
}

/// Errors related to step types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StepTypeError {
    /// Name is not a known step type
    #[error("unknown step type: {0}")]
    Unknown(String),
}

impl Serialize for StepType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for StepType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl From<BaseStep> for StepType {
    fn from(step: BaseStep) -> Self {
        Self::Base(step)
    }
}

/// One unit of generation work
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepPlanItem {
    /// Field addressed
    pub path: DataPath,
    /// What to generate
    #[serde(rename = "type")]
    pub step_type: StepType,
    /// Constraint the step belongs to (constraint steps only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint_kind: Option<ConstraintKind>,
}

impl StepPlanItem {
    /// Base step item
    #[inline]
    #[must_use]
    pub fn base(path: DataPath, step: BaseStep) -> Self {
        Self {
            path,
            step_type: StepType::Base(step),
            constraint_kind: None,
        }
    }

    /// Constraint step item
    #[inline]
    #[must_use]
    pub fn constraint(path: DataPath, step_type: StepType, kind: ConstraintKind) -> Self {
        Self {
            path,
            step_type,
            constraint_kind: Some(kind),
        }
    }
}

impl Display for StepPlanItem {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path, self.step_type)?;
        if let Some(kind) = self.constraint_kind {
            write!(f, "[{kind}]")?;
        }
        Ok(())
    }
}
