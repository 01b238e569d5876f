//! NLP recognition contracts
//!
//! A contract describes how user input for one field is recognized. Only the
//! parts the assembly pipeline rewrites are typed; everything else (rule
//! engines, NER and LLM settings) is carried through untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Placeholder replaced by the month-name alternation of the project language
pub const MONTHS_PLACEHOLDER: &str = "${MONTHS_PLACEHOLDER}";

/// Recognition contract for a field
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NlpContract {
    /// Contract id (template id on templates, instance id on instances)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Contract family, e.g. `date`, `email`
    #[serde(default)]
    pub template_name: String,

    /// Template this instance was cloned from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_template_id: Option<String>,

    /// Sub-field id → recognition slot
    #[serde(default)]
    pub sub_data_mapping: BTreeMap<String, SubDataSlot>,

    /// Regex recognizer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<RegexRecognizer>,

    /// Untyped remainder of the contract
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NlpContract {
    /// Create contract for a family
    #[inline]
    #[must_use]
    pub fn new(template_name: impl Into<String>) -> Self {
        Self {
            template_name: template_name.into(),
            ..Self::default()
        }
    }

    /// With id
    #[inline]
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// With a sub-field slot
    #[inline]
    #[must_use]
    pub fn with_slot(mut self, sub_id: impl Into<String>, slot: SubDataSlot) -> Self {
        self.sub_data_mapping.insert(sub_id.into(), slot);
        self
    }

    /// With regex patterns
    #[inline]
    #[must_use]
    pub fn with_patterns(mut self, patterns: Vec<String>) -> Self {
        self.regex
            .get_or_insert_with(RegexRecognizer::default)
            .patterns = patterns;
        self
    }

    /// Whether this is a date contract
    #[inline]
    #[must_use]
    pub fn is_date(&self) -> bool {
        self.template_name.eq_ignore_ascii_case("date")
    }

    /// Whether any regex pattern still carries the months placeholder
    #[must_use]
    pub fn has_months_placeholder(&self) -> bool {
        self.regex
            .as_ref()
            .is_some_and(|r| r.patterns.iter().any(|p| p.contains(MONTHS_PLACEHOLDER)))
    }
}

/// Recognition slot for one sub-field
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubDataSlot {
    /// Canonical key used by the recognizer (`day`, `month`, ...)
    #[serde(default)]
    pub canonical_key: String,

    /// Display label
    #[serde(default)]
    pub label: String,

    /// Field type
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,

    /// Untyped remainder
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SubDataSlot {
    /// Create slot
    #[inline]
    #[must_use]
    pub fn new(canonical_key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            canonical_key: canonical_key.into(),
            label: label.into(),
            ..Self::default()
        }
    }
}

/// Regex-based recognizer
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegexRecognizer {
    /// Patterns tried in order
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Example inputs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,

    /// Untyped remainder
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn contract_keeps_unknown_fields() {
        let contract: NlpContract = serde_json::from_value(json!({
            "templateName": "date",
            "subDataMapping": { "t-day": { "canonicalKey": "day", "label": "Day", "type": "number" } },
            "regex": { "patterns": ["\\d+ ${MONTHS_PLACEHOLDER}"], "testCases": ["1 maggio"] },
            "llm": { "enabled": true }
        }))
        .unwrap();

        assert!(contract.is_date());
        assert!(contract.has_months_placeholder());
        assert_eq!(contract.sub_data_mapping["t-day"].canonical_key, "day");
        assert_eq!(contract.extra["llm"]["enabled"], true);

        let back = serde_json::to_value(&contract).unwrap();
        assert_eq!(back["regex"]["testCases"][0], "1 maggio");
        assert_eq!(back["subDataMapping"]["t-day"]["type"], "number");
    }

    #[test]
    fn contract_without_regex_has_no_placeholder() {
        let contract = NlpContract::new("email");
        assert!(!contract.is_date());
        assert!(!contract.has_months_placeholder());
    }
}
