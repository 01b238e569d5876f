//! Results of executed generation steps

use ddt_schema::StepPlanItem;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload returned for one step
///
/// A failed step carries a synthetic `{"error": "..."}` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepPayload {
    /// The step failed
    Error {
        /// Failure description
        error: String,
    },
    /// Generated content
    Data(Value),
}

impl StepPayload {
    /// Check if this is an error payload
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Generated content, if any
    #[inline]
    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        match self {
            Self::Data(value) => Some(value),
            Self::Error { .. } => None,
        }
    }
}

/// One executed step and what it produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    /// Executed step
    pub step: StepPlanItem,
    /// Produced payload
    pub payload: StepPayload,
}

impl StepResult {
    /// Successful result
    #[inline]
    #[must_use]
    pub fn ok(step: StepPlanItem, payload: Value) -> Self {
        Self {
            step,
            payload: StepPayload::Data(payload),
        }
    }

    /// Failed result
    #[inline]
    #[must_use]
    pub fn error(step: StepPlanItem, error: impl Into<String>) -> Self {
        Self {
            step,
            payload: StepPayload::Error {
                error: error.into(),
            },
        }
    }

    /// Check if the step failed
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.payload.is_error()
    }
}
