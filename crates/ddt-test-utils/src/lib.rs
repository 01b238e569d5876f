//! Testing utilities for DDT workspace
//!
//! Shared fixtures and fakes for integration tests.

#![allow(missing_docs)]

use async_trait::async_trait;
use ddt_core::{
    Endpoint, GenerationService, ServiceError, Template, TemplateNode, TranslationSink,
    Translations,
};
use ddt_schema::{
    BaseStep, Constraint, ConstraintRule, NlpContract, SchemaNode, SubDataSlot,
    MONTHS_PLACEHOLDER,
};
use parking_lot::Mutex;
use serde_json::{json, Value};

pub const DATE_TEMPLATE_ID: &str = "tpl-date";
pub const DAY_TEMPLATE_ID: &str = "tpl-day";
pub const MONTH_TEMPLATE_ID: &str = "tpl-month";
pub const YEAR_TEMPLATE_ID: &str = "tpl-year";

/// `Person` with a single `day` sub-field
pub fn person_with_day() -> Vec<SchemaNode> {
    vec![SchemaNode::new("Person").with_sub(SchemaNode::new("day"))]
}

/// Standalone fields with a mix of constraints
pub fn booking_schema() -> Vec<SchemaNode> {
    vec![
        SchemaNode::new("Guest name")
            .with_constraint(Constraint::required())
            .with_constraint(Constraint::new(ConstraintRule::Length {
                min: Some(2),
                max: Some(60),
            })),
        SchemaNode::new("Guests")
            .with_type("number")
            .with_constraint(
                Constraint::new(ConstraintRule::Range {
                    min: Some(1.0),
                    max: Some(8.0),
                })
                .with_title("Party size"),
            ),
        SchemaNode::new("Arrival")
            .with_type("date")
            .with_constraint(Constraint::new(ConstraintRule::FutureDate))
            .with_sub(SchemaNode::new("day"))
            .with_sub(SchemaNode::new("month")),
    ]
}

/// Date contract with day/month/year slots and a month placeholder
pub fn date_contract() -> NlpContract {
    NlpContract::new("date")
        .with_id(DATE_TEMPLATE_ID)
        .with_slot(DAY_TEMPLATE_ID, SubDataSlot::new("day", "Day"))
        .with_slot(MONTH_TEMPLATE_ID, SubDataSlot::new("month", "Month"))
        .with_slot(YEAR_TEMPLATE_ID, SubDataSlot::new("year", "Year"))
        .with_patterns(vec![format!(
            r"(?i)(\d{{1,2}})\s+{MONTHS_PLACEHOLDER}\s+(\d{{4}})"
        )])
}

/// Reusable date template with translated prompts
pub fn date_template() -> Template {
    Template::new(DATE_TEMPLATE_ID, "tpl.date.label")
        .with_contract(date_contract())
        .with_step(BaseStep::Start, ["tpl.date.start"])
        .with_step(
            BaseStep::NoMatch,
            ["tpl.date.noMatch.1", "tpl.date.noMatch.2", "tpl.date.noMatch.3"],
        )
        .with_node(TemplateNode::new(DAY_TEMPLATE_ID, "Day"))
        .with_node(TemplateNode::new(MONTH_TEMPLATE_ID, "Month"))
        .with_node(TemplateNode::new(YEAR_TEMPLATE_ID, "Year"))
}

/// Schema node derived from [`date_template`]
pub fn date_schema() -> Vec<SchemaNode> {
    vec![SchemaNode::new("Date of birth")
        .with_type("date")
        .with_template_id(DATE_TEMPLATE_ID)
        .with_constraint(Constraint::new(ConstraintRule::PastDate))
        .with_sub(SchemaNode::new("Day").with_template_id(DAY_TEMPLATE_ID))
        .with_sub(SchemaNode::new("Month").with_template_id(MONTH_TEMPLATE_ID))
        .with_sub(SchemaNode::new("Year").with_template_id(YEAR_TEMPLATE_ID))]
}

pub fn italian_months() -> Vec<&'static str> {
    vec![
        "gennaio", "gen", "febbraio", "feb", "marzo", "mar", "aprile", "apr", "maggio", "mag",
        "giugno", "giu", "luglio", "lug", "agosto", "ago", "settembre", "set", "sett", "ottobre",
        "ott", "novembre", "nov", "dicembre", "dic",
    ]
}

/// Recorded generation call
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub endpoint: Endpoint,
    pub body: Value,
}

/// Generation service returning canned payloads
///
/// Base steps answer with two texts derived from `meaning`, constraint
/// steps with messages, validator source and test cases.
#[derive(Debug, Default)]
pub struct FakeGeneration {
    calls: Mutex<Vec<Call>>,
    fail_at: Option<usize>,
}

impl FakeGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the call with this zero-based index
    pub fn failing_at(index: usize) -> Self {
        Self {
            fail_at: Some(index),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl GenerationService for FakeGeneration {
    async fn call(&self, endpoint: Endpoint, body: Value) -> Result<Value, ServiceError> {
        let index = {
            let mut calls = self.calls.lock();
            calls.push(Call {
                endpoint,
                body: body.clone(),
            });
            calls.len() - 1
        };
        if self.fail_at == Some(index) {
            return Err(ServiceError::Failed(format!("generation failed at call {index}")));
        }

        let payload = match endpoint {
            Endpoint::Step(step) => {
                let meaning = body["meaning"].as_str().unwrap_or_default();
                json!({ "ai": [format!("{step} {meaning} 1"), format!("{step} {meaning} 2")] })
            }
            Endpoint::ConstraintMessages => json!({
                "ai": [
                    format!("{} r1", body["label"].as_str().unwrap_or_default()),
                    format!("{} r2", body["label"].as_str().unwrap_or_default()),
                ]
            }),
            Endpoint::Validator => json!({ "validator": "value => true" }),
            Endpoint::Testset => json!({ "testCases": [{ "input": "x", "valid": true }] }),
        };
        Ok(payload)
    }
}

/// Translation sink keeping every push
#[derive(Debug, Default)]
pub struct RecordingSink {
    pushes: Mutex<Vec<Translations>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_count(&self) -> usize {
        self.pushes.lock().len()
    }

    /// Union of every push
    pub fn merged(&self) -> Translations {
        self.pushes
            .lock()
            .iter()
            .flat_map(|t| t.iter().map(|(k, v)| (k.clone(), v.clone())))
            .collect()
    }
}

impl TranslationSink for RecordingSink {
    fn push(&self, translations: &Translations) {
        self.pushes.lock().push(translations.clone());
    }
}
