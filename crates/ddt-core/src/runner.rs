//! Plan execution
//!
//! Runs a step plan against a [`GenerationService`] strictly one step at a
//! time, in plan order. Dropping the returned future cancels the run.

use crate::error::{RunError, ServiceError};
use crate::services::{Endpoint, GenerationService};
use ddt_artifact::StepResult;
use ddt_schema::{find, SchemaNode, StepPlanItem, StepType};
use serde_json::{json, Value};
use tracing::{error, info};

/// Progress of a running plan
#[derive(Debug, Clone, Copy)]
pub struct RunProgress<'a> {
    /// Zero-based index of the step
    pub index: usize,
    /// Steps in the plan
    pub total: usize,
    /// Step about to run
    pub step: &'a StepPlanItem,
}

impl RunProgress<'_> {
    /// Completion before this step, in percent
    #[must_use]
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        u8::try_from(self.index * 100 / self.total).unwrap_or(100)
    }
}

type ProgressFn<'a> = Box<dyn Fn(&RunProgress<'_>) + Send + Sync + 'a>;

/// Sequential plan runner
pub struct PlanRunner<'a> {
    service: &'a dyn GenerationService,
    on_progress: Option<ProgressFn<'a>>,
}

impl<'a> PlanRunner<'a> {
    /// Create runner over a generation service
    #[inline]
    #[must_use]
    pub fn new(service: &'a dyn GenerationService) -> Self {
        Self {
            service,
            on_progress: None,
        }
    }

    /// With progress callback, invoked before each step
    #[must_use]
    pub fn with_progress<F>(mut self, f: F) -> Self
    where
        F: Fn(&RunProgress<'_>) + Send + Sync + 'a,
    {
        self.on_progress = Some(Box::new(f));
        self
    }

    /// Run every step, discarding payloads
    ///
    /// # Errors
    /// Stops at the first failing step and returns its error
    pub async fn run_dry(
        &self,
        mains: &[SchemaNode],
        plan: &[StepPlanItem],
    ) -> Result<(), RunError> {
        for (index, step) in plan.iter().enumerate() {
            self.report(index, plan.len(), step);
            if let Err(e) = self.run_step(mains, step).await {
                error!(%step, error = %e, "Dry run aborted");
                return Err(e);
            }
        }
        info!(steps = plan.len(), "Dry run finished");
        Ok(())
    }

    /// Run every step and collect the payloads
    ///
    /// Stops at the first failing step. The returned list then ends with a
    /// result carrying an error payload for that step.
    pub async fn run_collect(
        &self,
        mains: &[SchemaNode],
        plan: &[StepPlanItem],
    ) -> Vec<StepResult> {
        let mut results = Vec::with_capacity(plan.len());
        for (index, step) in plan.iter().enumerate() {
            self.report(index, plan.len(), step);
            match self.run_step(mains, step).await {
                Ok(payload) => results.push(StepResult::ok(step.clone(), payload)),
                Err(e) => {
                    error!(%step, error = %e, collected = results.len(), "Run aborted");
                    results.push(StepResult::error(step.clone(), error_text(&e)));
                    return results;
                }
            }
        }
        info!(steps = results.len(), "Run finished");
        results
    }

    async fn run_step(
        &self,
        mains: &[SchemaNode],
        step: &StepPlanItem,
    ) -> Result<Value, RunError> {
        let node = find(mains, &step.path).ok_or_else(|| RunError::UnknownPath(step.path.clone()))?;
        let (endpoint, body) = request_for(step, node);
        self.service
            .call(endpoint, body)
            .await
            .map_err(|source| RunError::Step {
                step: step.clone(),
                source,
            })
    }

    fn report(&self, index: usize, total: usize, step: &StepPlanItem) {
        let progress = RunProgress { index, total, step };
        info!(index, total, percent = progress.percent(), %step, "Running step");
        if let Some(f) = &self.on_progress {
            f(&progress);
        }
    }
}

impl std::fmt::Debug for PlanRunner<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanRunner")
            .field("on_progress", &self.on_progress.is_some())
            .finish_non_exhaustive()
    }
}

/// Endpoint and request body for a step
#[must_use]
pub fn request_for(step: &StepPlanItem, node: &SchemaNode) -> (Endpoint, Value) {
    match step.step_type {
        StepType::Base(base) => {
            let meaning = step.path.last().unwrap_or(node.label.as_str());
            (
                Endpoint::Step(base),
                json!({ "meaning": meaning, "desc": meaning }),
            )
        }
        StepType::ConstraintMessages => (Endpoint::ConstraintMessages, datum(step, node)),
        StepType::Validator => (Endpoint::Validator, datum(step, node)),
        StepType::Testset => (
            Endpoint::Testset,
            json!({ "datum": datum(step, node), "notes": [] }),
        ),
    }
}

fn datum(step: &StepPlanItem, node: &SchemaNode) -> Value {
    let constraints: Vec<_> = node.generated_constraints().collect();
    json!({
        "label": node.label,
        "type": node.type_name(),
        "kind": step.constraint_kind,
        "constraints": constraints,
    })
}

fn error_text(e: &RunError) -> String {
    match e {
        RunError::Step {
            source: ServiceError::Failed(msg),
            ..
        } => msg.clone(),
        other => other.to_string(),
    }
}
