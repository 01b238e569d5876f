//! Per-path artifact buckets

use ddt_schema::{BaseStep, ConstraintKind, StepType};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Generated artifacts for one constraint
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintArtifacts {
    /// Recovery messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Value>,

    /// Validator source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator: Option<Value>,

    /// Test cases
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub testset: Option<Value>,
}

impl ConstraintArtifacts {
    /// Slot for a constraint step type
    ///
    /// Returns `None` for base step types.
    #[must_use]
    pub fn slot_mut(&mut self, step_type: StepType) -> Option<&mut Option<Value>> {
        match step_type {
            StepType::ConstraintMessages => Some(&mut self.messages),
            StepType::Validator => Some(&mut self.validator),
            StepType::Testset => Some(&mut self.testset),
            StepType::Base(_) => None,
        }
    }

    /// Overwrite every entry present in `other`
    pub fn merge_from(&mut self, other: ConstraintArtifacts) {
        if other.messages.is_some() {
            self.messages = other.messages;
        }
        if other.validator.is_some() {
            self.validator = other.validator;
        }
        if other.testset.is_some() {
            self.testset = other.testset;
        }
    }

    /// Check if nothing was generated
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_none() && self.validator.is_none() && self.testset.is_none()
    }
}

/// Generated artifacts for one path
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathArtifacts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_match: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_input: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_confirmed: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<Value>,

    /// Per-constraint artifacts
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub constraints: BTreeMap<ConstraintKind, ConstraintArtifacts>,
}

impl PathArtifacts {
    /// Payload for a base step
    #[must_use]
    pub fn base(&self, step: BaseStep) -> Option<&Value> {
        match step {
            BaseStep::Start => self.start.as_ref(),
            BaseStep::NoMatch => self.no_match.as_ref(),
            BaseStep::NoInput => self.no_input.as_ref(),
            BaseStep::Confirmation => self.confirmation.as_ref(),
            BaseStep::NotConfirmed => self.not_confirmed.as_ref(),
            BaseStep::Success => self.success.as_ref(),
        }
    }

    /// Mutable slot for a base step
    pub fn base_slot_mut(&mut self, step: BaseStep) -> &mut Option<Value> {
        match step {
            BaseStep::Start => &mut self.start,
            BaseStep::NoMatch => &mut self.no_match,
            BaseStep::NoInput => &mut self.no_input,
            BaseStep::Confirmation => &mut self.confirmation,
            BaseStep::NotConfirmed => &mut self.not_confirmed,
            BaseStep::Success => &mut self.success,
        }
    }

    /// Artifacts for a constraint kind
    #[inline]
    #[must_use]
    pub fn constraint(&self, kind: ConstraintKind) -> Option<&ConstraintArtifacts> {
        self.constraints.get(&kind)
    }

    /// Overwrite every entry present in `other`, keep the rest
    pub fn merge_from(&mut self, other: PathArtifacts) {
        let PathArtifacts {
            start,
            no_match,
            no_input,
            confirmation,
            not_confirmed,
            success,
            constraints,
        } = other;

        for (step, value) in [
            (BaseStep::Start, start),
            (BaseStep::NoMatch, no_match),
            (BaseStep::NoInput, no_input),
            (BaseStep::Confirmation, confirmation),
            (BaseStep::NotConfirmed, not_confirmed),
            (BaseStep::Success, success),
        ] {
            if value.is_some() {
                *self.base_slot_mut(step) = value;
            }
        }

        for (kind, artifacts) in constraints {
            self.constraints.entry(kind).or_default().merge_from(artifacts);
        }
    }

    /// Check if the bucket holds nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start.is_none()
            && self.no_match.is_none()
            && self.no_input.is_none()
            && self.confirmation.is_none()
            && self.not_confirmed.is_none()
            && self.success.is_none()
            && self.constraints.values().all(ConstraintArtifacts::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_keeps_untouched_entries() {
        let mut base = PathArtifacts {
            start: Some(json!(["ask"])),
            no_match: Some(json!(["again"])),
            ..PathArtifacts::default()
        };
        base.constraints.insert(
            ConstraintKind::Range,
            ConstraintArtifacts {
                messages: Some(json!(["m1", "m2"])),
                validator: Some(json!("v1")),
                testset: None,
            },
        );

        let mut delta = PathArtifacts {
            no_match: Some(json!(["sorry?"])),
            ..PathArtifacts::default()
        };
        delta.constraints.insert(
            ConstraintKind::Range,
            ConstraintArtifacts {
                validator: Some(json!("v2")),
                ..ConstraintArtifacts::default()
            },
        );

        base.merge_from(delta);

        assert_eq!(base.start, Some(json!(["ask"])));
        assert_eq!(base.no_match, Some(json!(["sorry?"])));
        let range = base.constraint(ConstraintKind::Range).unwrap();
        assert_eq!(range.messages, Some(json!(["m1", "m2"])));
        assert_eq!(range.validator, Some(json!("v2")));
    }

    #[test]
    fn bucket_serializes_camel_case() {
        let bucket = PathArtifacts {
            not_confirmed: Some(json!("no?")),
            ..PathArtifacts::default()
        };
        let v = serde_json::to_value(&bucket).unwrap();
        assert_eq!(v, json!({ "notConfirmed": "no?" }));
    }

    #[test]
    fn empty_constraint_entries_count_as_empty() {
        let mut bucket = PathArtifacts::default();
        bucket.constraints.insert(ConstraintKind::Enum, ConstraintArtifacts::default());
        assert!(bucket.is_empty());
    }
}
