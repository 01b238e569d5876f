//! Identity and label resolution
//!
//! A node keeps its own id when it has one. Otherwise it is matched against
//! the template fields it may derive from, by template id first and by
//! position second. Both fallbacks indicate an upstream mapping defect and
//! are logged.

use crate::config::AssemblyOptions;
use crate::ids::IdGenerator;
use crate::template::TemplateNode;
use ddt_schema::{DataPath, SchemaNode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Which tier produced an id or label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Resolution {
    /// Carried by the node itself
    Existing,
    /// Template field whose id equals the node's `templateId`
    TemplateId,
    /// Template field at the node's position
    Position,
    /// Newly generated (standalone node)
    Fresh,
}

/// Template fields a node may derive from
#[derive(Debug, Clone, Default)]
pub struct Candidates {
    nodes: Vec<TemplateNode>,
    derived: bool,
}

impl Candidates {
    /// No candidates
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Fields of a template the parent derives from
    ///
    /// Positional matching applies to every node.
    #[inline]
    #[must_use]
    pub fn derived(nodes: Vec<TemplateNode>) -> Self {
        Self {
            nodes,
            derived: true,
        }
    }

    /// Fields found through the node's own `templateId`
    ///
    /// Positional matching applies only to nodes carrying a `templateId`.
    #[inline]
    #[must_use]
    pub fn referenced(nodes: Vec<TemplateNode>) -> Self {
        Self {
            nodes,
            derived: false,
        }
    }

    /// Check if there is nothing to match against
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Template field matched to a schema node
#[derive(Debug, Clone, Copy)]
pub struct TemplateMatch<'t> {
    pub node: &'t TemplateNode,
    /// `TemplateId` or `Position`
    pub resolution: Resolution,
}

/// Find the template field a node derives from
#[must_use]
pub fn match_template<'t>(
    node: &SchemaNode,
    position: usize,
    candidates: &'t Candidates,
) -> Option<TemplateMatch<'t>> {
    if let Some(template_id) = node.template_id.as_deref() {
        if let Some(found) = candidates.nodes.iter().find(|c| c.id == template_id) {
            return Some(TemplateMatch {
                node: found,
                resolution: Resolution::TemplateId,
            });
        }
    }

    if candidates.derived || node.template_id.is_some() {
        return candidates.nodes.get(position).map(|found| TemplateMatch {
            node: found,
            resolution: Resolution::Position,
        });
    }

    None
}

/// Resolve the id of a node
pub fn resolve_identity(
    node: &SchemaNode,
    path: &DataPath,
    matched: Option<&TemplateMatch<'_>>,
    ids: &dyn IdGenerator,
) -> (String, Resolution) {
    if let Some(id) = node.id.as_deref().filter(|id| !id.is_empty()) {
        return (id.to_string(), Resolution::Existing);
    }

    match matched {
        Some(m) if m.resolution == Resolution::TemplateId => {
            warn!(%path, template_id = %m.node.id, "Node lost its id, adopting template field id");
            (m.node.id.clone(), Resolution::TemplateId)
        }
        Some(m) => {
            warn!(
                %path,
                template_id = %m.node.id,
                "Node lost its id and template id match failed, adopting field id by position"
            );
            (m.node.id.clone(), Resolution::Position)
        }
        None => {
            let id = ids.next_id();
            debug!(%path, %id, "New standalone node");
            (id, Resolution::Fresh)
        }
    }
}

/// Resolve the display label of a node
///
/// Template labels are translated into the project locale when they are
/// translation keys.
pub fn resolve_label(
    node: &SchemaNode,
    path: &DataPath,
    matched: Option<&TemplateMatch<'_>>,
    options: &AssemblyOptions,
) -> (String, Resolution) {
    if node.id.as_deref().is_some_and(|id| !id.is_empty()) {
        return (node.label.clone(), Resolution::Existing);
    }

    let Some(m) = matched.filter(|m| !m.node.label.trim().is_empty()) else {
        return (node.label.clone(), Resolution::Fresh);
    };

    let label = options
        .template_text(&m.node.label)
        .map_or_else(|| m.node.label.clone(), str::to_string);
    if m.resolution == Resolution::Position {
        warn!(%path, %label, "Label taken from template field by position");
    } else {
        warn!(%path, %label, "Label taken from template field by template id");
    }
    (label, m.resolution)
}
