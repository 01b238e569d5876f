//! Schema tree nodes

use crate::constraint::Constraint;
use crate::contract::NlpContract;
use crate::path::{escape_label, DataPath};
use serde::{Deserialize, Serialize};

/// One collectible field (main level) or one of its sub-fields
///
/// Nodes inside `sub_data` never carry further `sub_data`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaNode {
    /// Display label, also the path segment
    pub label: String,

    /// Field type (`date`, `number`, `text`, ...)
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,

    /// Icon name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    /// Validation constraints
    #[serde(default)]
    pub constraints: Vec<Constraint>,

    /// Sub-fields
    #[serde(default)]
    pub sub_data: Vec<SchemaNode>,

    /// Template this node derives from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,

    /// Instance id, preserved across edits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Recognition contract
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nlp_contract: Option<NlpContract>,
}

impl SchemaNode {
    /// Create node with label only
    #[inline]
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// With type
    #[inline]
    #[must_use]
    pub fn with_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }

    /// With icon
    #[inline]
    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Add a constraint
    #[inline]
    #[must_use]
    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Add a sub-field
    #[inline]
    #[must_use]
    pub fn with_sub(mut self, sub: SchemaNode) -> Self {
        self.sub_data.push(sub);
        self
    }

    /// With template id
    #[inline]
    #[must_use]
    pub fn with_template_id(mut self, template_id: impl Into<String>) -> Self {
        self.template_id = Some(template_id.into());
        self
    }

    /// With instance id
    #[inline]
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// With contract
    #[inline]
    #[must_use]
    pub fn with_contract(mut self, contract: NlpContract) -> Self {
        self.nlp_contract = Some(contract);
        self
    }

    /// Constraints that produce generation steps (everything but `required`)
    pub fn generated_constraints(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.iter().filter(|c| c.is_generated())
    }

    /// Type name, defaulting to `text`
    #[inline]
    #[must_use]
    pub fn type_name(&self) -> &str {
        self.data_type.as_deref().unwrap_or("text")
    }
}

/// Visit every node of a forest in pre-order with its path
pub fn walk<'a, F>(mains: &'a [SchemaNode], mut visit: F)
where
    F: FnMut(&DataPath, &'a SchemaNode),
{
    fn go<'a, F>(node: &'a SchemaNode, path: &DataPath, visit: &mut F)
    where
        F: FnMut(&DataPath, &'a SchemaNode),
    {
        visit(path, node);
        for sub in &node.sub_data {
            go(sub, &path.child(&sub.label), visit);
        }
    }

    for main in mains {
        go(main, &DataPath::root(&main.label), &mut visit);
    }
}

/// Find a node by path
#[must_use]
pub fn find<'a>(mains: &'a [SchemaNode], path: &DataPath) -> Option<&'a SchemaNode> {
    let mut segments = path.iter();
    let first = segments.next()?;
    let mut current = mains
        .iter()
        .find(|n| escape_label(&n.label) == first)?;
    for seg in segments {
        current = current
            .sub_data
            .iter()
            .find(|n| escape_label(&n.label) == seg)?;
    }
    Some(current)
}
