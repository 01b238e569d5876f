//! Contract cloning
//!
//! Turns a template's recognition contract into an instance-scoped copy:
//! new id, sub-field slots keyed by instance ids, and month placeholders
//! compiled for the project language.

use crate::error::ContractError;
use crate::services::MonthCatalog;
use ddt_schema::{NlpContract, MONTHS_PLACEHOLDER};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Template sub-field id → instance sub-field id
pub type SubIdMapping = BTreeMap<String, String>;

/// Positional zip of template and instance sub-field ids
///
/// On a length mismatch the shorter list wins and a warning is logged.
#[must_use]
pub fn create_sub_id_mapping<T, I>(template_ids: &[T], instance_ids: &[I]) -> SubIdMapping
where
    T: AsRef<str>,
    I: AsRef<str>,
{
    if template_ids.len() != instance_ids.len() {
        warn!(
            template = template_ids.len(),
            instance = instance_ids.len(),
            "Sub-field count mismatch, mapping the shorter list"
        );
    }
    template_ids
        .iter()
        .zip(instance_ids)
        .map(|(t, i)| (t.as_ref().to_string(), i.as_ref().to_string()))
        .collect()
}

/// Alternation of month names, longest first
///
/// Names are trimmed, deduplicated, sorted by descending length (ties
/// alphabetically) and regex-escaped, so an abbreviation never shadows a
/// longer name sharing its prefix.
///
/// # Errors
/// Returns `ContractError::EmptyMonthList` if no usable name remains
pub fn months_alternation(language: &str, months: &[String]) -> Result<String, ContractError> {
    let unique: BTreeSet<&str> = months
        .iter()
        .map(|m| m.trim())
        .filter(|m| !m.is_empty())
        .collect();
    if unique.is_empty() {
        return Err(ContractError::EmptyMonthList {
            language: language.to_string(),
        });
    }

    let mut names: Vec<&str> = unique.into_iter().collect();
    names.sort_by(|a, b| {
        b.chars()
            .count()
            .cmp(&a.chars().count())
            .then_with(|| a.cmp(b))
    });

    let escaped: Vec<String> = names.into_iter().map(regex::escape).collect();
    Ok(format!("({})", escaped.join("|")))
}

/// Clones template contracts into instances
pub struct ContractCloner<'a> {
    months: &'a dyn MonthCatalog,
}

impl<'a> ContractCloner<'a> {
    /// Create cloner over a month catalog
    #[inline]
    #[must_use]
    pub fn new(months: &'a dyn MonthCatalog) -> Self {
        Self { months }
    }

    /// Clone a contract for an instance
    ///
    /// # Arguments
    /// * `source` - Template contract
    /// * `instance_id` - Id of the instance node
    /// * `source_template_id` - Template the contract came from
    /// * `mapping` - Template sub-field id → instance sub-field id
    /// * `project_language` - Language of the project (`IT`, `en`, ...)
    ///
    /// # Errors
    /// - `MissingLanguage` if no language is given
    /// - `EmptyMonthList` if a date contract needs months and none exist
    /// - `Months` if the month lookup fails
    /// - `InvalidPattern` if a compiled pattern is not a valid regex
    pub async fn clone_and_adapt(
        &self,
        source: &NlpContract,
        instance_id: &str,
        source_template_id: Option<&str>,
        mapping: &SubIdMapping,
        project_language: Option<&str>,
    ) -> Result<NlpContract, ContractError> {
        let language = project_language
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .ok_or(ContractError::MissingLanguage)?
            .to_ascii_uppercase();

        let mut contract = source.clone();
        contract.id = Some(instance_id.to_string());
        contract.source_template_id = source_template_id
            .map(str::to_string)
            .or_else(|| source.id.clone());
        contract.sub_data_mapping = remap_slots(&contract, mapping, instance_id);

        if contract.is_date() && contract.has_months_placeholder() {
            let months = self.months.months(&language).await?;
            let alternation = months_alternation(&language, &months)?;
            debug!(%language, %alternation, "Compiling month placeholder");
            compile_placeholders(&mut contract, &alternation)?;
        }

        Ok(contract)
    }
}

impl std::fmt::Debug for ContractCloner<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractCloner").finish_non_exhaustive()
    }
}

fn remap_slots(
    contract: &NlpContract,
    mapping: &SubIdMapping,
    instance_id: &str,
) -> BTreeMap<String, ddt_schema::SubDataSlot> {
    contract
        .sub_data_mapping
        .iter()
        .map(|(key, slot)| match mapping.get(key) {
            Some(mapped) => (mapped.clone(), slot.clone()),
            None => {
                warn!(
                    contract = %instance_id,
                    sub_id = %key,
                    "No instance id for contract sub-field, keeping template id"
                );
                (key.clone(), slot.clone())
            }
        })
        .collect()
}

fn compile_placeholders(contract: &mut NlpContract, alternation: &str) -> Result<(), ContractError> {
    let Some(regex) = contract.regex.as_mut() else {
        return Ok(());
    };
    for pattern in &mut regex.patterns {
        if !pattern.contains(MONTHS_PLACEHOLDER) {
            continue;
        }
        let compiled = pattern.replace(MONTHS_PLACEHOLDER, alternation);
        Regex::new(&compiled).map_err(|source| ContractError::InvalidPattern {
            pattern: compiled.clone(),
            source,
        })?;
        *pattern = compiled;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::StaticMonthCatalog;
    use ddt_schema::SubDataSlot;
    use pretty_assertions::assert_eq;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    fn date_contract() -> NlpContract {
        NlpContract::new("date")
            .with_id("tpl-date")
            .with_slot("tpl-day", SubDataSlot::new("day", "Day"))
            .with_slot("tpl-month", SubDataSlot::new("month", "Month"))
            .with_patterns(vec![format!(r"(\d{{1,2}})\s+{MONTHS_PLACEHOLDER}")])
    }

    #[test]
    fn alternation_longest_first() {
        let alt = months_alternation("IT", &strings(&["set", "settembre", " gen ", "gennaio", "set"]))
            .unwrap();
        assert_eq!(alt, "(settembre|gennaio|gen|set)");
    }

    #[test]
    fn alternation_escapes_and_rejects_empty() {
        let alt = months_alternation("EN", &strings(&["Sept.", "Sep"])).unwrap();
        assert_eq!(alt, r"(Sept\.|Sep)");
        assert!(matches!(
            months_alternation("EN", &strings(&["", "  "])),
            Err(ContractError::EmptyMonthList { .. })
        ));
    }

    #[test]
    fn sub_id_mapping_uses_shorter_list() {
        let mapping = create_sub_id_mapping(&["a", "b", "c"], &["x", "y"]);
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping["b"], "y");
    }

    #[tokio::test]
    async fn clone_remaps_and_compiles() {
        let months = StaticMonthCatalog::new().with_language("IT", ["set", "settembre"]);
        let cloner = ContractCloner::new(&months);
        let mapping = create_sub_id_mapping(&["tpl-day"], &["inst-day"]);

        let cloned = cloner
            .clone_and_adapt(&date_contract(), "inst-date", Some("tpl-date"), &mapping, Some("it"))
            .await
            .unwrap();

        assert_eq!(cloned.id.as_deref(), Some("inst-date"));
        assert_eq!(cloned.source_template_id.as_deref(), Some("tpl-date"));
        assert_eq!(
            cloned.sub_data_mapping.keys().cloned().collect::<Vec<_>>(),
            strings(&["inst-day", "tpl-month"])
        );
        let pattern = &cloned.regex.as_ref().unwrap().patterns[0];
        assert_eq!(pattern, r"(\d{1,2})\s+(settembre|set)");
        assert!(!cloned.has_months_placeholder());
    }

    #[tokio::test]
    async fn date_contract_requires_language_and_months() {
        let months = StaticMonthCatalog::new();
        let cloner = ContractCloner::new(&months);
        let mapping = SubIdMapping::new();

        let missing = cloner
            .clone_and_adapt(&date_contract(), "i", None, &mapping, None)
            .await;
        assert!(matches!(missing, Err(ContractError::MissingLanguage)));

        let empty = cloner
            .clone_and_adapt(&date_contract(), "i", None, &mapping, Some("xx"))
            .await;
        assert!(matches!(empty, Err(ContractError::EmptyMonthList { language }) if language == "XX"));
    }

    #[tokio::test]
    async fn non_date_contract_skips_months() {
        let months = StaticMonthCatalog::new();
        let cloner = ContractCloner::new(&months);
        let contract = NlpContract::new("email").with_patterns(vec![MONTHS_PLACEHOLDER.into()]);

        let cloned = cloner
            .clone_and_adapt(&contract, "i", None, &SubIdMapping::new(), Some("en"))
            .await
            .unwrap();
        assert!(cloned.has_months_placeholder());
    }
}
