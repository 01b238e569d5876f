//! Configuration types
//!
//! - Service endpoints (loadable from TOML)
//! - Planning policy
//! - Work-plan weights
//! - Assembly options

use crate::error::DdtError;
use crate::services::Endpoint;
use ddt_schema::BaseStep;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Template translation key → locale → text
pub type TemplateTranslations = HashMap<String, BTreeMap<String, String>>;

/// External service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL of the generation and constants services
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Endpoint paths
    pub endpoints: EndpointPaths,
}

impl ServiceConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With base URL
    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Parse from TOML
    ///
    /// # Errors
    /// Returns `DdtError::Config` on invalid TOML
    pub fn from_toml_str(raw: &str) -> Result<Self, DdtError> {
        toml::from_str(raw).map_err(|e| DdtError::Config(e.to_string()))
    }

    /// Request timeout
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Full URL of an endpoint
    #[must_use]
    pub fn url(&self, endpoint: Endpoint) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.endpoints.path(endpoint)
        )
    }

    /// Full URL of the month constants for a language
    #[must_use]
    pub fn months_url(&self, language: &str) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.endpoints
                .months
                .replace("{LANG}", &language.to_ascii_uppercase())
        )
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3100".to_string(),
            timeout_secs: 60,
            endpoints: EndpointPaths::default(),
        }
    }
}

/// Endpoint paths, relative to the base URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EndpointPaths {
    pub start: String,
    pub no_match: String,
    pub no_input: String,
    pub confirmation: String,
    pub not_confirmed: String,
    pub success: String,
    pub constraint_messages: String,
    pub validator: String,
    pub testset: String,
    /// Month constants, `{LANG}` is replaced by the upper-case language
    pub months: String,
}

impl EndpointPaths {
    /// Path for an endpoint
    #[must_use]
    pub fn path(&self, endpoint: Endpoint) -> &str {
        match endpoint {
            Endpoint::Step(BaseStep::Start) => &self.start,
            Endpoint::Step(BaseStep::NoMatch) => &self.no_match,
            Endpoint::Step(BaseStep::NoInput) => &self.no_input,
            Endpoint::Step(BaseStep::Confirmation) => &self.confirmation,
            Endpoint::Step(BaseStep::NotConfirmed) => &self.not_confirmed,
            Endpoint::Step(BaseStep::Success) => &self.success,
            Endpoint::ConstraintMessages => &self.constraint_messages,
            Endpoint::Validator => &self.validator,
            Endpoint::Testset => &self.testset,
        }
    }
}

impl Default for EndpointPaths {
    fn default() -> Self {
        Self {
            start: "/api/startPrompt".to_string(),
            no_match: "/api/stepNoMatch".to_string(),
            no_input: "/api/stepNoInput".to_string(),
            confirmation: "/api/stepConfirmation".to_string(),
            not_confirmed: "/api/stepNotConfirmed".to_string(),
            success: "/api/stepSuccess".to_string(),
            constraint_messages: "/api/constraintMessages".to_string(),
            validator: "/api/validator".to_string(),
            testset: "/api/testset".to_string(),
            months: "/constants/months/{LANG}".to_string(),
        }
    }
}

/// Whether a rejected confirmation gets its own retry step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConfirmationPolicy {
    /// `confirmation` only
    ConfirmOnly,
    /// `confirmation` followed by `notConfirmed`
    #[default]
    ConfirmWithRetry,
}

impl ConfirmationPolicy {
    /// Check if `notConfirmed` is emitted
    #[inline]
    #[must_use]
    pub fn has_not_confirmed(&self) -> bool {
        matches!(self, Self::ConfirmWithRetry)
    }
}

/// Planning configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanConfig {
    /// Confirmation retry policy
    pub confirmation: ConfirmationPolicy,
}

/// Weights for progress estimation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkPlanWeights {
    /// Steps counted per field
    pub base_per_datum: usize,
    /// Steps counted per non-`required` constraint
    pub steps_per_constraint: usize,
}

impl Default for WorkPlanWeights {
    fn default() -> Self {
        Self {
            base_per_datum: 6,
            steps_per_constraint: 3,
        }
    }
}

/// Escalations generated per base step when no template defines them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EscalationCounts {
    pub start: usize,
    pub no_match: usize,
    pub no_input: usize,
    pub confirmation: usize,
    pub success: usize,
}

impl EscalationCounts {
    /// Escalations of `notConfirmed`, fixed to bound user-facing retries
    pub const NOT_CONFIRMED: usize = 2;

    /// Count for a step
    #[must_use]
    pub fn for_step(&self, step: BaseStep) -> usize {
        match step {
            BaseStep::Start => self.start,
            BaseStep::NoMatch => self.no_match,
            BaseStep::NoInput => self.no_input,
            BaseStep::Confirmation => self.confirmation,
            BaseStep::NotConfirmed => Self::NOT_CONFIRMED,
            BaseStep::Success => self.success,
        }
    }
}

impl Default for EscalationCounts {
    fn default() -> Self {
        Self {
            start: 1,
            no_match: 2,
            no_input: 2,
            confirmation: 2,
            success: 1,
        }
    }
}

/// Options of one assembly pass
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AssemblyOptions {
    /// Project locale, e.g. `it-IT` (mandatory)
    pub project_locale: Option<String>,
    /// Default escalation counts
    pub escalations: EscalationCounts,
    /// Confirmation retry policy
    pub confirmation: ConfirmationPolicy,
    /// Translations of template-origin keys
    pub template_translations: TemplateTranslations,
    /// Template the whole schema was derived from
    pub source_template_id: Option<String>,
    /// Id for the assembled template (generated if absent)
    pub template_id: Option<String>,
}

impl AssemblyOptions {
    /// Options for a project locale
    #[inline]
    #[must_use]
    pub fn new(project_locale: impl Into<String>) -> Self {
        Self {
            project_locale: Some(project_locale.into()),
            ..Self::default()
        }
    }

    /// With escalation counts
    #[inline]
    #[must_use]
    pub fn with_escalations(mut self, escalations: EscalationCounts) -> Self {
        self.escalations = escalations;
        self
    }

    /// With confirmation policy
    #[inline]
    #[must_use]
    pub fn with_confirmation(mut self, confirmation: ConfirmationPolicy) -> Self {
        self.confirmation = confirmation;
        self
    }

    /// With template translations
    #[inline]
    #[must_use]
    pub fn with_template_translations(mut self, translations: TemplateTranslations) -> Self {
        self.template_translations = translations;
        self
    }

    /// With source template
    #[inline]
    #[must_use]
    pub fn with_source_template(mut self, template_id: impl Into<String>) -> Self {
        self.source_template_id = Some(template_id.into());
        self
    }

    /// With explicit template id
    #[inline]
    #[must_use]
    pub fn with_template_id(mut self, template_id: impl Into<String>) -> Self {
        self.template_id = Some(template_id.into());
        self
    }

    /// Translation of a template key in the project locale
    #[must_use]
    pub fn template_text(&self, key: &str) -> Option<&str> {
        let locale = self.project_locale.as_deref()?;
        self.template_translations
            .get(key)
            .and_then(|by_locale| by_locale.get(locale))
            .map(String::as_str)
    }
}

/// Language part of a locale, upper-cased (`it-IT` → `IT`)
#[must_use]
pub fn language_of(locale: &str) -> Option<String> {
    locale
        .split(['-', '_'])
        .next()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_ascii_uppercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_config_from_toml() {
        let config = ServiceConfig::from_toml_str(
            r#"
            base_url = "https://gen.example.com/"
            timeout_secs = 5

            [endpoints]
            validator = "/v2/validator"
            "#,
        )
        .unwrap();

        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(
            config.url(Endpoint::Validator),
            "https://gen.example.com/v2/validator"
        );
        assert_eq!(
            config.url(Endpoint::Step(BaseStep::Start)),
            "https://gen.example.com/api/startPrompt"
        );
        assert_eq!(
            config.months_url("it"),
            "https://gen.example.com/constants/months/IT"
        );
    }

    #[test]
    fn service_config_rejects_bad_toml() {
        assert!(ServiceConfig::from_toml_str("base_url = ").is_err());
    }

    #[test]
    fn not_confirmed_is_fixed() {
        let counts = EscalationCounts {
            confirmation: 5,
            ..EscalationCounts::default()
        };
        assert_eq!(counts.for_step(BaseStep::NotConfirmed), 2);
        assert_eq!(counts.for_step(BaseStep::Confirmation), 5);
        assert_eq!(counts.for_step(BaseStep::NoMatch), 2);
    }

    #[test]
    fn template_text_uses_exact_locale() {
        let mut translations = TemplateTranslations::new();
        translations.insert(
            "tpl.ask".into(),
            BTreeMap::from([("it-IT".to_string(), "Quando?".to_string())]),
        );
        let options = AssemblyOptions::new("it-IT").with_template_translations(translations.clone());
        assert_eq!(options.template_text("tpl.ask"), Some("Quando?"));

        let other = AssemblyOptions::new("en-US").with_template_translations(translations);
        assert_eq!(other.template_text("tpl.ask"), None);
    }

    #[test]
    fn language_from_locale() {
        assert_eq!(language_of("it-IT").as_deref(), Some("IT"));
        assert_eq!(language_of("pt_BR").as_deref(), Some("PT"));
        assert_eq!(language_of("").as_deref(), None);
    }
}
