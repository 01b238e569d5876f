//! Template shapes
//!
//! [`Template`] is the reusable definition looked up through
//! [`TemplateLookup`](crate::services::TemplateLookup). [`AssembledTemplate`]
//! is what an assembly pass produces.

use ddt_schema::{BaseStep, Constraint, ConstraintKind, DataPath, NlpContract};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Template id of the task that speaks an escalation's text
pub const SAY_MESSAGE_TEMPLATE: &str = "sayMessage";

/// Parameter id carrying the runtime text key
pub const TEXT_PARAMETER: &str = "text";

/// Draft format version of assembled templates
pub const DRAFT_VERSION: u32 = 2;

/// Reusable template
///
/// `data` lists the fields the template defines. A field template (e.g.
/// `date`) lists its sub-fields there; a composite template lists its mains.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nlp_contract: Option<NlpContract>,
    #[serde(default)]
    pub data: Vec<TemplateNode>,
    /// Template-level prompts: step → translation key per escalation
    #[serde(default)]
    pub steps: BTreeMap<BaseStep, Vec<String>>,
}

impl Template {
    /// Create template
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            ..Self::default()
        }
    }

    /// With field
    #[inline]
    #[must_use]
    pub fn with_node(mut self, node: TemplateNode) -> Self {
        self.data.push(node);
        self
    }

    /// With step prompt keys
    #[inline]
    #[must_use]
    pub fn with_step<I, S>(mut self, step: BaseStep, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.steps
            .insert(step, keys.into_iter().map(Into::into).collect());
        self
    }

    /// With contract
    #[inline]
    #[must_use]
    pub fn with_contract(mut self, contract: NlpContract) -> Self {
        self.nlp_contract = Some(contract);
        self
    }

    /// The template seen as a single field whose sub-fields are `data`
    #[must_use]
    pub fn as_node(&self) -> TemplateNode {
        TemplateNode {
            id: self.id.clone(),
            label: self.label.clone(),
            template_id: Some(self.id.clone()),
            sub_data: self.data.clone(),
            steps: self.steps.clone(),
            nlp_contract: self.nlp_contract.clone(),
        }
    }
}

/// Field defined by a template
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateNode {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(default)]
    pub sub_data: Vec<TemplateNode>,
    #[serde(default)]
    pub steps: BTreeMap<BaseStep, Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nlp_contract: Option<NlpContract>,
}

impl TemplateNode {
    /// Create node
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            ..Self::default()
        }
    }

    /// With sub-field
    #[inline]
    #[must_use]
    pub fn with_sub(mut self, sub: TemplateNode) -> Self {
        self.sub_data.push(sub);
        self
    }

    /// With step prompt keys
    #[inline]
    #[must_use]
    pub fn with_step<I, S>(mut self, step: BaseStep, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.steps
            .insert(step, keys.into_iter().map(Into::into).collect());
        self
    }

    /// With contract
    #[inline]
    #[must_use]
    pub fn with_contract(mut self, contract: NlpContract) -> Self {
        self.nlp_contract = Some(contract);
        self
    }

    /// Ids of the sub-fields, in order
    #[must_use]
    pub fn sub_ids(&self) -> Vec<String> {
        self.sub_data.iter().map(|s| s.id.clone()).collect()
    }
}

/// Step containers by node id, then by step key
pub type RootSteps = IndexMap<String, IndexMap<String, StepEntry>>;

/// Assembled, runtime-ready template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssembledTemplate {
    pub id: String,
    pub label: String,
    pub data: Vec<AssembledNode>,
    pub steps: RootSteps,
    pub v2_draft: DraftInfo,
}

impl AssembledTemplate {
    /// Visit every node in pre-order
    pub fn nodes(&self) -> impl Iterator<Item = &AssembledNode> {
        self.data
            .iter()
            .flat_map(|main| std::iter::once(main).chain(main.sub_tasks.iter()))
    }

    /// Node by id
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&AssembledNode> {
        self.nodes().find(|n| n.id == id)
    }

    /// Step entry of a node
    #[must_use]
    pub fn step(&self, node_id: &str, step: BaseStep) -> Option<&StepEntry> {
        self.steps.get(node_id)?.get(step.as_str())
    }
}

/// Draft bookkeeping
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftInfo {
    pub version: u32,
    /// Constraints whose recovery text was synthesized
    pub pending_review: Vec<PendingReview>,
}

/// Constraint awaiting human-written recovery text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingReview {
    pub path: DataPath,
    pub constraint_kind: ConstraintKind,
}

/// Assembled field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssembledNode {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub constraints: Vec<AssembledConstraint>,
    pub sub_tasks: Vec<AssembledNode>,
    /// Step key → text key of its first escalation
    pub messages: IndexMap<String, MessageRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nlp_contract: Option<NlpContract>,
}

/// Reference to a translation entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRef {
    pub text_key: String,
}

/// Assembled constraint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssembledConstraint {
    pub id: String,
    #[serde(flatten)]
    pub constraint: Constraint,
    /// Absent for `required`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery: Option<RecoveryMessages>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator: Option<String>,
    #[serde(default)]
    pub test_cases: Vec<Value>,
}

/// Two-level recovery prompts of a constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryMessages {
    pub r1: RecoveryMessage,
    pub r2: RecoveryMessage,
}

impl RecoveryMessages {
    /// Check if either level was synthesized
    #[inline]
    #[must_use]
    pub fn is_synthesized(&self) -> bool {
        self.r1.synthesized || self.r2.synthesized
    }
}

/// One recovery prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryMessage {
    pub text_key: String,
    /// Placeholder text, expected to be replaced by hand
    pub synthesized: bool,
}

/// Step container of one node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepEntry {
    #[serde(rename = "type")]
    pub step_type: BaseStep,
    pub escalations: Vec<Escalation>,
}

/// One retry level of a step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Escalation {
    pub escalation_id: String,
    pub tasks: Vec<EscalationTask>,
}

impl Escalation {
    /// Escalation with a single say-message task
    #[must_use]
    pub fn say(escalation_id: String, task_id: String) -> Self {
        Self {
            escalation_id,
            tasks: vec![EscalationTask {
                parameters: vec![TaskParameter {
                    parameter_id: TEXT_PARAMETER.to_string(),
                    value: task_id.clone(),
                }],
                id: task_id,
                template_id: SAY_MESSAGE_TEMPLATE.to_string(),
            }],
        }
    }

    /// Runtime text key (id of the first task)
    #[must_use]
    pub fn text_key(&self) -> Option<&str> {
        self.tasks.first().map(|t| t.id.as_str())
    }
}

/// Task of an escalation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationTask {
    pub id: String,
    pub template_id: String,
    pub parameters: Vec<TaskParameter>,
}

/// Task parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskParameter {
    pub parameter_id: String,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn template_as_node() {
        let tpl = Template::new("tpl-date", "Date")
            .with_node(TemplateNode::new("tpl-day", "Day"))
            .with_step(BaseStep::Start, ["tpl.date.ask"]);
        let node = tpl.as_node();
        assert_eq!(node.id, "tpl-date");
        assert_eq!(node.sub_ids(), vec!["tpl-day".to_string()]);
        assert_eq!(node.steps[&BaseStep::Start], vec!["tpl.date.ask".to_string()]);
    }

    #[test]
    fn template_deserializes_step_keys() {
        let tpl: Template = serde_json::from_value(json!({
            "id": "t1",
            "label": "Date",
            "steps": { "noMatch": ["k1", "k2", "k3"] }
        }))
        .unwrap();
        assert_eq!(tpl.steps[&BaseStep::NoMatch].len(), 3);
    }

    #[test]
    fn escalation_shape() {
        let esc = Escalation::say("e1".into(), "rt1".into());
        assert_eq!(
            serde_json::to_value(&esc).unwrap(),
            json!({
                "escalationId": "e1",
                "tasks": [{
                    "id": "rt1",
                    "templateId": "sayMessage",
                    "parameters": [{ "parameterId": "text", "value": "rt1" }]
                }]
            })
        );
        assert_eq!(esc.text_key(), Some("rt1"));
    }

    #[test]
    fn draft_field_name() {
        let tpl = AssembledTemplate {
            id: "x".into(),
            label: "X".into(),
            data: vec![],
            steps: RootSteps::new(),
            v2_draft: DraftInfo {
                version: DRAFT_VERSION,
                pending_review: vec![],
            },
        };
        let value = serde_json::to_value(&tpl).unwrap();
        assert_eq!(value["v2Draft"]["version"], json!(2));
    }
}
