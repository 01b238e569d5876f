//! Step planning
//!
//! Turns a schema tree into the ordered list of generation steps. The order
//! is part of the contract: progress math and escalation counts downstream
//! rely on it being identical for identical input.

use crate::config::{ConfirmationPolicy, PlanConfig, WorkPlanWeights};
use ddt_schema::{walk, BaseStep, DataPath, SchemaNode, StepPlanItem, StepType};
use serde::{Deserialize, Serialize};

/// Step planner
#[derive(Debug, Clone, Copy, Default)]
pub struct StepPlanner {
    config: PlanConfig,
}

impl StepPlanner {
    /// Create planner
    #[inline]
    #[must_use]
    pub fn new(config: PlanConfig) -> Self {
        Self { config }
    }

    /// With confirmation policy
    #[inline]
    #[must_use]
    pub fn with_confirmation(mut self, confirmation: ConfirmationPolicy) -> Self {
        self.config.confirmation = confirmation;
        self
    }

    /// Ordered generation steps for a schema tree
    ///
    /// Per node, in pre-order:
    /// - main: `start, noMatch, noInput, confirmation, [notConfirmed], success`
    /// - sub: `start, noMatch, noInput`
    /// - then `constraintMessages, validator, testset` per non-`required` constraint
    #[must_use]
    pub fn plan(&self, mains: &[SchemaNode]) -> Vec<StepPlanItem> {
        let mut items = Vec::new();
        walk(mains, |path, node| self.plan_node(path, node, &mut items));
        items
    }

    fn plan_node(&self, path: &DataPath, node: &SchemaNode, items: &mut Vec<StepPlanItem>) {
        let steps = if path.depth() == 0 {
            BaseStep::main_steps(self.config.confirmation.has_not_confirmed())
        } else {
            BaseStep::sub_steps()
        };
        items.extend(
            steps
                .into_iter()
                .map(|step| StepPlanItem::base(path.clone(), step)),
        );

        for constraint in node.generated_constraints() {
            items.extend(
                StepType::CONSTRAINT_STEPS
                    .iter()
                    .map(|t| StepPlanItem::constraint(path.clone(), *t, constraint.kind())),
            );
        }
    }

    /// Work estimate for a schema tree
    #[must_use]
    pub fn work_plan(&self, mains: &[SchemaNode], weights: WorkPlanWeights) -> WorkPlan {
        let mut num_data = 0;
        let mut num_constraints = 0;
        walk(mains, |_, node| {
            num_data += 1;
            num_constraints += node.generated_constraints().count();
        });

        WorkPlan {
            num_data,
            num_constraints,
            total: weights.base_per_datum * num_data
                + weights.steps_per_constraint * num_constraints,
            items: self.plan(mains),
        }
    }
}

/// Progress estimate of a generation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkPlan {
    /// Every main and every sub-field
    pub num_data: usize,
    /// Non-`required` constraints
    pub num_constraints: usize,
    /// Weighted step count
    pub total: usize,
    /// Planned steps
    pub items: Vec<StepPlanItem>,
}

/// Step plan with the default policy
#[must_use]
pub fn build_step_plan(mains: &[SchemaNode]) -> Vec<StepPlanItem> {
    StepPlanner::default().plan(mains)
}

/// Work plan with the default policy
#[must_use]
pub fn compute_work_plan(mains: &[SchemaNode], weights: WorkPlanWeights) -> WorkPlan {
    StepPlanner::default().work_plan(mains, weights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ddt_schema::{Constraint, ConstraintKind, ConstraintRule};
    use pretty_assertions::assert_eq;

    fn labels(plan: &[StepPlanItem]) -> Vec<String> {
        plan.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn person_with_day() {
        let mains = vec![SchemaNode::new("Person").with_sub(SchemaNode::new("day"))];

        assert_eq!(
            labels(&build_step_plan(&mains)),
            vec![
                "Person:start",
                "Person:noMatch",
                "Person:noInput",
                "Person:confirmation",
                "Person:notConfirmed",
                "Person:success",
                "Person/day:start",
                "Person/day:noMatch",
                "Person/day:noInput",
            ]
        );

        let confirm_only = StepPlanner::default()
            .with_confirmation(ConfirmationPolicy::ConfirmOnly)
            .plan(&mains);
        assert_eq!(confirm_only.len(), 8);
        assert!(!labels(&confirm_only).contains(&"Person:notConfirmed".to_string()));
    }

    #[test]
    fn constraint_steps_follow_node_steps() {
        let mains = vec![SchemaNode::new("Age")
            .with_constraint(Constraint::required())
            .with_constraint(Constraint::new(ConstraintRule::Range {
                min: Some(0.0),
                max: Some(120.0),
            }))];

        let plan = StepPlanner::default()
            .with_confirmation(ConfirmationPolicy::ConfirmOnly)
            .plan(&mains);
        assert_eq!(
            labels(&plan[5..]),
            vec![
                "Age:constraintMessages[range]",
                "Age:validator[range]",
                "Age:testset[range]",
            ]
        );
        assert!(plan
            .iter()
            .all(|i| i.constraint_kind != Some(ConstraintKind::Required)));
    }

    #[test]
    fn work_plan_counts() {
        let mains = vec![
            SchemaNode::new("Date")
                .with_constraint(Constraint::new(ConstraintRule::PastDate))
                .with_constraint(Constraint::required())
                .with_sub(SchemaNode::new("day"))
                .with_sub(SchemaNode::new("month")),
            SchemaNode::new("Name"),
        ];

        let plan = compute_work_plan(
            &mains,
            WorkPlanWeights {
                base_per_datum: 6,
                steps_per_constraint: 3,
            },
        );
        assert_eq!(plan.num_data, 4);
        assert_eq!(plan.num_constraints, 1);
        assert_eq!(plan.total, 27);
        assert_eq!(plan.items, build_step_plan(&mains));
    }

    #[test]
    fn empty_tree() {
        assert!(build_step_plan(&[]).is_empty());
        assert_eq!(compute_work_plan(&[], WorkPlanWeights::default()).total, 0);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use ddt_schema::{Constraint, ConstraintKind, ConstraintRule};
    use proptest::prelude::*;

    fn arb_constraint() -> impl Strategy<Value = Constraint> {
        prop_oneof![
            Just(Constraint::required()),
            Just(Constraint::new(ConstraintRule::PastDate)),
            Just(Constraint::new(ConstraintRule::Regex {
                pattern: "^\\d+$".into()
            })),
            Just(Constraint::new(ConstraintRule::Length {
                min: Some(1),
                max: None
            })),
        ]
    }

    fn arb_leaf() -> impl Strategy<Value = SchemaNode> {
        ("[a-z]{1,6}", prop::collection::vec(arb_constraint(), 0..3)).prop_map(|(label, cs)| {
            cs.into_iter()
                .fold(SchemaNode::new(label), SchemaNode::with_constraint)
        })
    }

    fn arb_main() -> impl Strategy<Value = SchemaNode> {
        (arb_leaf(), prop::collection::vec(arb_leaf(), 0..4))
            .prop_map(|(main, subs)| subs.into_iter().fold(main, SchemaNode::with_sub))
    }

    proptest! {
        #[test]
        fn plan_is_deterministic(mains in prop::collection::vec(arb_main(), 0..4)) {
            prop_assert_eq!(build_step_plan(&mains), build_step_plan(&mains));
        }

        #[test]
        fn main_starts_and_subs_never_confirm(mains in prop::collection::vec(arb_main(), 1..4)) {
            let plan = build_step_plan(&mains);
            prop_assert_eq!(plan[0].step_type, StepType::Base(BaseStep::Start));

            for item in plan.iter().filter(|i| i.path.depth() > 0) {
                prop_assert!(!matches!(
                    item.step_type,
                    StepType::Base(BaseStep::Confirmation | BaseStep::NotConfirmed | BaseStep::Success)
                ));
            }
        }

        #[test]
        fn required_is_never_planned(mains in prop::collection::vec(arb_main(), 0..4)) {
            let work = compute_work_plan(&mains, WorkPlanWeights::default());
            let mut generated = 0;
            walk(&mains, |_, n| {
                generated += n.constraints.iter().filter(|c| c.kind() != ConstraintKind::Required).count();
            });
            prop_assert_eq!(work.num_constraints, generated);
            prop_assert!(work.items.iter().all(|i| i.constraint_kind != Some(ConstraintKind::Required)));
            prop_assert_eq!(
                work.items.iter().filter(|i| i.constraint_kind.is_some()).count(),
                3 * generated
            );
        }
    }
}
