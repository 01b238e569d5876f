//! Template assembly
//!
//! Walks the schema tree together with the artifact store and produces a
//! runtime-ready [`AssembledTemplate`] plus a translation side table.
//!
//! Per node, in order:
//! 1. Resolve id and label
//! 2. Register the node's step container
//! 3. Fold base-step texts from the artifact bucket
//! 4. Build constraint entries
//! 5. Assemble sub-fields
//! 6. Clone the recognition contract, using the sub-field ids from step 5
//! 7. Build base steps and their escalations
//!
//! Any error aborts the whole pass. Translations reach the sink only once
//! every node has been assembled.

mod constraints;
mod identity;
mod steps;

pub use constraints::placeholder_text;
pub use identity::{
    match_template, resolve_identity, resolve_label, Candidates, Resolution, TemplateMatch,
};
pub use steps::{escalation_count, TemplateSteps};

use crate::config::{language_of, AssemblyOptions};
use crate::contract::{create_sub_id_mapping, ContractCloner, SubIdMapping};
use crate::error::AssemblyError;
use crate::ids::IdGenerator;
use crate::services::{MonthCatalog, TemplateLookup, TranslationSink, Translations};
use crate::template::{
    AssembledNode, AssembledTemplate, DraftInfo, PendingReview, RootSteps, Template, DRAFT_VERSION,
};
use ddt_artifact::ArtifactStore;
use ddt_schema::{BaseStep, DataPath, SchemaNode};
use futures::future::BoxFuture;
use indexmap::IndexMap;
use tracing::{debug, info};

/// Mutable state of one assembly pass
#[derive(Debug, Default)]
pub(crate) struct AssemblyState {
    pub(crate) translations: Translations,
    pub(crate) pending_review: Vec<PendingReview>,
    pub(crate) steps: RootSteps,
}

/// Read-only inputs of one assembly pass
struct Pass<'p> {
    store: &'p ArtifactStore,
    options: &'p AssemblyOptions,
    language: Option<String>,
}

/// Assembles schema trees into templates
pub struct TemplateAssembler<'a> {
    templates: &'a dyn TemplateLookup,
    months: &'a dyn MonthCatalog,
    ids: &'a dyn IdGenerator,
}

impl<'a> TemplateAssembler<'a> {
    /// Create assembler over its collaborators
    #[inline]
    #[must_use]
    pub fn new(
        templates: &'a dyn TemplateLookup,
        months: &'a dyn MonthCatalog,
        ids: &'a dyn IdGenerator,
    ) -> Self {
        Self {
            templates,
            months,
            ids,
        }
    }

    /// Assemble a schema tree
    ///
    /// # Arguments
    /// * `root_label` - Label of the assembled template
    /// * `mains` - Main-level fields
    /// * `store` - Generated artifacts, may be empty
    /// * `options` - Locale, escalation defaults and template context
    /// * `sink` - Receives every minted translation on success
    ///
    /// # Errors
    /// - `MissingLocale` if `options.project_locale` is unset
    /// - `NestingTooDeep` if a sub-field has sub-fields
    /// - `Contract` if a recognition contract cannot be cloned
    pub async fn assemble(
        &self,
        root_label: &str,
        mains: &[SchemaNode],
        store: &ArtifactStore,
        options: &AssemblyOptions,
        sink: Option<&dyn TranslationSink>,
    ) -> Result<AssembledTemplate, AssemblyError> {
        let locale = options
            .project_locale
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .ok_or(AssemblyError::MissingLocale)?;

        let pass = Pass {
            store,
            options,
            language: language_of(locale),
        };
        let source = options
            .source_template_id
            .as_deref()
            .and_then(|id| self.lookup(id));

        let mut state = AssemblyState::default();
        let mut data = Vec::with_capacity(mains.len());
        for (position, main) in mains.iter().enumerate() {
            let candidates = match &source {
                Some(template) => Candidates::derived(template.data.clone()),
                None => self.referenced(main),
            };
            let node = self
                .assemble_node(main, DataPath::root(&main.label), position, &candidates, &pass, &mut state)
                .await?;
            data.push(node);
        }

        let template = AssembledTemplate {
            id: options
                .template_id
                .clone()
                .unwrap_or_else(|| self.ids.next_id()),
            label: root_label.to_string(),
            data,
            steps: state.steps,
            v2_draft: DraftInfo {
                version: DRAFT_VERSION,
                pending_review: state.pending_review,
            },
        };

        info!(
            template = %template.id,
            nodes = template.nodes().count(),
            translations = state.translations.len(),
            pending_review = template.v2_draft.pending_review.len(),
            "Template assembled"
        );
        if let Some(sink) = sink {
            sink.push(&state.translations);
        }
        Ok(template)
    }

    fn assemble_node<'b>(
        &'b self,
        node: &'b SchemaNode,
        path: DataPath,
        position: usize,
        candidates: &'b Candidates,
        pass: &'b Pass<'b>,
        state: &'b mut AssemblyState,
    ) -> BoxFuture<'b, Result<AssembledNode, AssemblyError>> {
        Box::pin(async move {
            if path.depth() > 1 {
                return Err(AssemblyError::NestingTooDeep { path });
            }

            // (1) identity
            let matched = match_template(node, position, candidates);
            let (id, id_tier) = resolve_identity(node, &path, matched.as_ref(), self.ids);
            let (label, label_tier) = resolve_label(node, &path, matched.as_ref(), pass.options);
            debug!(%path, %id, ?id_tier, ?label_tier, "Resolved node");

            // (2) step container, so parents precede children
            state.steps.insert(id.clone(), IndexMap::new());

            // (3) base-step texts
            let base_steps = if path.depth() == 0 {
                BaseStep::main_steps(pass.options.confirmation.has_not_confirmed())
            } else {
                BaseStep::sub_steps()
            };
            let bucket = pass.store.get(&path);
            let texts = steps::fold_step_texts(bucket, &base_steps);

            // (4) constraints
            let constraints = constraints::build_constraints(
                &label,
                &path,
                &node.constraints,
                bucket,
                self.ids,
                state,
            );

            // (5) sub-fields
            let mut sub_tasks = Vec::with_capacity(node.sub_data.len());
            for (sub_position, sub) in node.sub_data.iter().enumerate() {
                let sub_candidates = match matched {
                    Some(m) => Candidates::derived(m.node.sub_data.clone()),
                    None => self.referenced(sub),
                };
                let assembled = self
                    .assemble_node(
                        sub,
                        path.child(&sub.label),
                        sub_position,
                        &sub_candidates,
                        pass,
                        &mut *state,
                    )
                    .await?;
                sub_tasks.push(assembled);
            }

            // (6) contract, once sub-field ids are final
            let source_contract = matched
                .and_then(|m| m.node.nlp_contract.as_ref())
                .or(node.nlp_contract.as_ref());
            let nlp_contract = match source_contract {
                Some(contract) => {
                    let instance_sub_ids: Vec<&str> =
                        sub_tasks.iter().map(|s| s.id.as_str()).collect();
                    let mut mapping: SubIdMapping = match matched {
                        Some(m) => create_sub_id_mapping(&m.node.sub_ids(), &instance_sub_ids),
                        // pair each sub-field with its own template reference
                        None => node
                            .sub_data
                            .iter()
                            .zip(&sub_tasks)
                            .filter_map(|(sub, assembled)| {
                                sub.template_id
                                    .clone()
                                    .map(|template_id| (template_id, assembled.id.clone()))
                            })
                            .collect(),
                    };
                    for instance_id in &instance_sub_ids {
                        mapping
                            .entry((*instance_id).to_string())
                            .or_insert_with(|| (*instance_id).to_string());
                    }

                    let source_template_id = matched
                        .map(|m| m.node.id.as_str())
                        .or(node.template_id.as_deref());
                    let cloned = ContractCloner::new(self.months)
                        .clone_and_adapt(
                            contract,
                            &id,
                            source_template_id,
                            &mapping,
                            pass.language.as_deref(),
                        )
                        .await
                        .map_err(|source| AssemblyError::Contract {
                            path: path.clone(),
                            source,
                        })?;
                    Some(cloned)
                }
                None => None,
            };

            // (7) base steps
            let built = steps::build_steps(
                &path,
                &base_steps,
                matched.map(|m| &m.node.steps),
                &texts,
                pass.options,
                self.ids,
                state,
            );
            if let Some(container) = state.steps.get_mut(&id) {
                container.extend(built.entries);
            }

            Ok(AssembledNode {
                id,
                label,
                data_type: node.type_name().to_string(),
                icon: node.icon.clone(),
                constraints,
                sub_tasks,
                messages: built.messages,
                nlp_contract,
            })
        })
    }

    /// Candidates found through a node's own template reference
    fn referenced(&self, node: &SchemaNode) -> Candidates {
        node.template_id
            .as_deref()
            .and_then(|id| self.lookup(id))
            .map_or_else(Candidates::none, |t| Candidates::referenced(vec![t.as_node()]))
    }

    fn lookup(&self, id: &str) -> Option<Template> {
        let found = self.templates.get_template(id);
        if found.is_none() {
            debug!(template_id = %id, "Template not found");
        }
        found
    }
}

impl std::fmt::Debug for TemplateAssembler<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateAssembler").finish_non_exhaustive()
    }
}
