//! Base-step escalations
//!
//! Every escalation gets a fresh runtime key. Text is copied into the
//! project table under that key, never referenced, so editing an instance
//! leaves the template untouched and vice versa.

use super::AssemblyState;
use crate::config::{AssemblyOptions, EscalationCounts};
use crate::ids::IdGenerator;
use crate::template::{Escalation, MessageRef, StepEntry};
use ddt_artifact::{payload, PathArtifacts};
use ddt_schema::{BaseStep, DataPath};
use indexmap::IndexMap;
use std::collections::BTreeMap;
use tracing::trace;

/// Step → translation keys per escalation, as defined by a template
pub type TemplateSteps = BTreeMap<BaseStep, Vec<String>>;

/// Generated prompt texts per step, folded from an artifact bucket
pub(super) type StepTexts = BTreeMap<BaseStep, Vec<String>>;

/// Number of escalations for a step
///
/// `notConfirmed` always gets two. Otherwise a template definition decides,
/// then the configured default.
#[must_use]
pub fn escalation_count(
    step: BaseStep,
    template_keys: Option<&[String]>,
    defaults: &EscalationCounts,
) -> usize {
    if step == BaseStep::NotConfirmed {
        return EscalationCounts::NOT_CONFIRMED;
    }
    match template_keys {
        Some(keys) if !keys.is_empty() => keys.len(),
        _ => defaults.for_step(step),
    }
}

pub(super) fn fold_step_texts(bucket: Option<&PathArtifacts>, steps: &[BaseStep]) -> StepTexts {
    let Some(bucket) = bucket else {
        return StepTexts::new();
    };
    steps
        .iter()
        .filter_map(|step| {
            bucket
                .base(*step)
                .map(|value| (*step, payload::prompt_texts(value)))
        })
        .filter(|(_, texts)| !texts.is_empty())
        .collect()
}

/// Step containers and message refs of one node
pub(super) struct BuiltSteps {
    pub(super) entries: IndexMap<String, StepEntry>,
    pub(super) messages: IndexMap<String, MessageRef>,
}

pub(super) fn build_steps(
    path: &DataPath,
    steps: &[BaseStep],
    template_steps: Option<&TemplateSteps>,
    texts: &StepTexts,
    options: &AssemblyOptions,
    ids: &dyn IdGenerator,
    state: &mut AssemblyState,
) -> BuiltSteps {
    let mut entries = IndexMap::with_capacity(steps.len());
    let mut messages = IndexMap::with_capacity(steps.len());

    for &step in steps {
        let template_keys = template_steps
            .and_then(|s| s.get(&step))
            .map(Vec::as_slice);
        let count = escalation_count(step, template_keys, &options.escalations);
        let generated = texts.get(&step);

        let escalations: Vec<Escalation> = (0..count)
            .map(|i| {
                let text_key = ids.next_id();
                let text = template_keys
                    .and_then(|keys| keys.get(i))
                    .and_then(|key| options.template_text(key))
                    .map(str::to_string)
                    .or_else(|| generated.and_then(|g| g.get(i)).cloned());
                match text {
                    Some(text) => {
                        trace!(%path, %step, escalation = i, %text_key, "Escalation text");
                        state.translations.insert(text_key.clone(), text);
                    }
                    None => trace!(%path, %step, escalation = i, "Escalation without text"),
                }
                Escalation::say(ids.next_id(), text_key)
            })
            .collect();

        if let Some(first) = escalations.first().and_then(Escalation::text_key) {
            messages.insert(
                step.as_str().to_string(),
                MessageRef {
                    text_key: first.to_string(),
                },
            );
        }
        entries.insert(
            step.as_str().to_string(),
            StepEntry {
                step_type: step,
                escalations,
            },
        );
    }

    BuiltSteps { entries, messages }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TemplateTranslations;
    use crate::ids::SequentialIds;
    use serde_json::json;

    #[test]
    fn counts() {
        let defaults = EscalationCounts::default();
        let keys = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(escalation_count(BaseStep::NoMatch, Some(keys.as_slice()), &defaults), 3);
        assert_eq!(escalation_count(BaseStep::NoMatch, None, &defaults), 2);
        assert_eq!(escalation_count(BaseStep::Start, Some(&[][..]), &defaults), 1);
        assert_eq!(escalation_count(BaseStep::NotConfirmed, Some(keys.as_slice()), &defaults), 2);
    }

    #[test]
    fn texts_from_bucket() {
        let bucket = PathArtifacts {
            start: Some(json!("When were you born?")),
            no_match: Some(json!({ "ai": ["Sorry?", "Once more?"] })),
            ..PathArtifacts::default()
        };
        let texts = fold_step_texts(Some(&bucket), &BaseStep::sub_steps());
        assert_eq!(texts[&BaseStep::NoMatch].len(), 2);
        assert!(!texts.contains_key(&BaseStep::NoInput));
        assert!(fold_step_texts(None, &BaseStep::sub_steps()).is_empty());
    }

    #[test]
    fn template_text_is_copied_under_fresh_key() {
        let ids = SequentialIds::new("rt");
        let mut state = AssemblyState::default();
        let mut translations = TemplateTranslations::new();
        translations.insert(
            "tpl.ask".into(),
            BTreeMap::from([("it-IT".to_string(), "Quando sei nato?".to_string())]),
        );
        let options = AssemblyOptions::new("it-IT").with_template_translations(translations);
        let template_steps = TemplateSteps::from([(BaseStep::Start, vec!["tpl.ask".to_string()])]);
        let texts = StepTexts::from([(BaseStep::NoMatch, vec!["Come?".to_string()])]);

        let built = build_steps(
            &DataPath::root("Birth"),
            &[BaseStep::Start, BaseStep::NoMatch],
            Some(&template_steps),
            &texts,
            &options,
            &ids,
            &mut state,
        );

        let start = &built.entries["start"];
        assert_eq!(start.escalations.len(), 1);
        let key = start.escalations[0].text_key().unwrap();
        assert_ne!(key, "tpl.ask");
        assert_eq!(state.translations[key], "Quando sei nato?");

        let no_match = &built.entries["noMatch"];
        assert_eq!(no_match.escalations.len(), 2);
        let first = no_match.escalations[0].text_key().unwrap();
        let second = no_match.escalations[1].text_key().unwrap();
        assert_eq!(state.translations[first], "Come?");
        assert!(!state.translations.contains_key(second));
        assert_eq!(built.messages["noMatch"].text_key, first);
    }
}
