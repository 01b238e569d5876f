//! Constraint entries
//!
//! Recovery text comes from generated `constraintMessages` when present.
//! Otherwise a placeholder is synthesized so the author always has something
//! to edit; such constraints are listed for review in the draft info.

use super::AssemblyState;
use crate::ids::IdGenerator;
use crate::template::{AssembledConstraint, PendingReview, RecoveryMessage, RecoveryMessages};
use ddt_artifact::{payload, ConstraintArtifacts, PathArtifacts};
use ddt_schema::{Constraint, DataPath};
use tracing::debug;

/// Placeholder recovery text for a constraint (`level` is 1 or 2)
#[must_use]
pub fn placeholder_text(label: &str, constraint: &Constraint, level: usize) -> String {
    format!("{label} · {} · recovery {level}", constraint.display_name())
}

pub(super) fn build_constraints(
    label: &str,
    path: &DataPath,
    constraints: &[Constraint],
    bucket: Option<&PathArtifacts>,
    ids: &dyn IdGenerator,
    state: &mut AssemblyState,
) -> Vec<AssembledConstraint> {
    constraints
        .iter()
        .map(|constraint| {
            let id = ids.next_id();
            if !constraint.is_generated() {
                return AssembledConstraint {
                    id,
                    constraint: constraint.clone(),
                    recovery: None,
                    validator: None,
                    test_cases: Vec::new(),
                };
            }

            let artifacts = bucket.and_then(|b| b.constraint(constraint.kind()));
            let recovery = recovery_messages(label, constraint, artifacts, ids, state);
            if recovery.is_synthesized() {
                debug!(%path, kind = %constraint.kind(), "Synthesized recovery text");
                state.pending_review.push(PendingReview {
                    path: path.clone(),
                    constraint_kind: constraint.kind(),
                });
            }

            AssembledConstraint {
                id,
                constraint: constraint.clone(),
                recovery: Some(recovery),
                validator: artifacts
                    .and_then(|a| a.validator.as_ref())
                    .and_then(payload::validator_source),
                test_cases: artifacts
                    .and_then(|a| a.testset.as_ref())
                    .map(payload::test_cases)
                    .unwrap_or_default(),
            }
        })
        .collect()
}

fn recovery_messages(
    label: &str,
    constraint: &Constraint,
    artifacts: Option<&ConstraintArtifacts>,
    ids: &dyn IdGenerator,
    state: &mut AssemblyState,
) -> RecoveryMessages {
    let generated = artifacts
        .and_then(|a| a.messages.as_ref())
        .map(payload::prompt_texts)
        .unwrap_or_default();

    let mut level = |n: usize| {
        let (text, synthesized) = match generated.get(n - 1) {
            Some(text) => (text.clone(), false),
            None => (placeholder_text(label, constraint, n), true),
        };
        let text_key = ids.next_id();
        state.translations.insert(text_key.clone(), text);
        RecoveryMessage {
            text_key,
            synthesized,
        }
    };

    let r1 = level(1);
    let r2 = level(2);
    RecoveryMessages { r1, r2 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;
    use ddt_schema::{ConstraintKind, ConstraintRule};
    use serde_json::json;

    #[test]
    fn placeholder_uses_title_or_kind() {
        let plain = Constraint::new(ConstraintRule::PastDate);
        assert_eq!(placeholder_text("Birth", &plain, 1), "Birth · pastDate · recovery 1");
        let titled = plain.with_title("In the past");
        assert_eq!(placeholder_text("Birth", &titled, 2), "Birth · In the past · recovery 2");
    }

    #[test]
    fn generated_text_and_partial_fallback() {
        let ids = SequentialIds::new("k");
        let mut state = AssemblyState::default();
        let path = DataPath::root("Age");
        let mut bucket = PathArtifacts::default();
        bucket.constraints.insert(
            ConstraintKind::Range,
            ConstraintArtifacts {
                messages: Some(json!({ "ai": ["Too small or too big"] })),
                validator: Some(json!({ "validator": "v >= 0" })),
                testset: Some(json!([{ "input": "-1", "valid": false }])),
            },
        );
        let constraints = vec![
            Constraint::required(),
            Constraint::new(ConstraintRule::Range {
                min: Some(0.0),
                max: None,
            }),
        ];

        let built = build_constraints("Age", &path, &constraints, Some(&bucket), &ids, &mut state);

        assert!(built[0].recovery.is_none());
        let range = &built[1];
        let recovery = range.recovery.as_ref().unwrap();
        assert!(!recovery.r1.synthesized);
        assert!(recovery.r2.synthesized);
        assert_eq!(state.translations[&recovery.r1.text_key], "Too small or too big");
        assert_eq!(state.translations[&recovery.r2.text_key], "Age · range · recovery 2");
        assert_eq!(range.validator.as_deref(), Some("v >= 0"));
        assert_eq!(range.test_cases.len(), 1);
        assert_eq!(state.pending_review.len(), 1);
    }
}
