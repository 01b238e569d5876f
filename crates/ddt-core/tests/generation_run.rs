//! Functional tests for planning, running and collecting generation steps.
//!
//! Core guarantees exercised here:
//! - The runner calls the service once per planned step, in plan order.
//! - A failing step stops the run; collected results end with an error payload.
//! - Collected results fold into the artifact store by path, step and kind.

use ddt_artifact::{ArtifactStore, StepPayload};
use ddt_core::{
    build_step_plan, compute_work_plan, Endpoint, PlanRunner, RunError, RunProgress,
    WorkPlanWeights,
};
use ddt_schema::{BaseStep, ConstraintKind, DataPath, StepPlanItem};
use ddt_test_utils::{booking_schema, person_with_day, FakeGeneration};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;

/// The runner follows the plan exactly, one call per step.
#[tokio::test]
async fn collect_calls_every_step_in_order() {
    let mains = person_with_day();
    let plan = build_step_plan(&mains);
    let service = FakeGeneration::new();

    let results = PlanRunner::new(&service).run_collect(&mains, &plan).await;

    assert_eq!(results.len(), plan.len());
    assert!(results.iter().all(|r| !r.is_error()));
    let endpoints: Vec<Endpoint> = service.calls().iter().map(|c| c.endpoint).collect();
    assert_eq!(
        endpoints,
        vec![
            Endpoint::Step(BaseStep::Start),
            Endpoint::Step(BaseStep::NoMatch),
            Endpoint::Step(BaseStep::NoInput),
            Endpoint::Step(BaseStep::Confirmation),
            Endpoint::Step(BaseStep::NotConfirmed),
            Endpoint::Step(BaseStep::Success),
            Endpoint::Step(BaseStep::Start),
            Endpoint::Step(BaseStep::NoMatch),
            Endpoint::Step(BaseStep::NoInput),
        ]
    );
    assert_eq!(service.calls()[6].body["meaning"], "day");
}

/// A failure short-circuits the collect run and is reported in-band.
#[tokio::test]
async fn collect_stops_at_first_failure() {
    let mains = booking_schema();
    let plan = build_step_plan(&mains);
    let service = FakeGeneration::failing_at(3);

    let results = PlanRunner::new(&service).run_collect(&mains, &plan).await;

    assert_eq!(results.len(), 4);
    assert_eq!(service.call_count(), 4);
    assert!(results[..3].iter().all(|r| !r.is_error()));
    match &results[3].payload {
        StepPayload::Error { error } => assert!(error.contains("call 3")),
        StepPayload::Data(_) => panic!("expected an error payload"),
    }
    assert_eq!(results[3].step, plan[3]);
}

/// A failure aborts the dry run with the failing step attached.
#[tokio::test]
async fn dry_run_aborts_on_failure() {
    let mains = person_with_day();
    let plan = build_step_plan(&mains);

    let ok = FakeGeneration::new();
    PlanRunner::new(&ok).run_dry(&mains, &plan).await.unwrap();
    assert_eq!(ok.call_count(), plan.len());

    let failing = FakeGeneration::failing_at(1);
    let err = PlanRunner::new(&failing)
        .run_dry(&mains, &plan)
        .await
        .unwrap_err();
    match err {
        RunError::Step { step, .. } => assert_eq!(step, plan[1]),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(failing.call_count(), 2);
}

/// Steps addressing fields outside the tree are rejected before any call.
#[tokio::test]
async fn unknown_path_is_rejected() {
    let mains = person_with_day();
    let plan = vec![StepPlanItem::base(DataPath::root("Ghost"), BaseStep::Start)];
    let service = FakeGeneration::new();

    let err = PlanRunner::new(&service)
        .run_dry(&mains, &plan)
        .await
        .unwrap_err();
    assert!(matches!(err, RunError::UnknownPath(path) if path == DataPath::root("Ghost")));
    assert_eq!(service.call_count(), 0);

    let results = PlanRunner::new(&service).run_collect(&mains, &plan).await;
    assert_eq!(results.len(), 1);
    assert!(results[0].is_error());
}

/// Progress is reported before every step with a monotonic percentage.
#[tokio::test]
async fn progress_is_reported() {
    let mains = person_with_day();
    let plan = build_step_plan(&mains);
    let service = FakeGeneration::new();
    let seen = Mutex::new(Vec::new());

    PlanRunner::new(&service)
        .with_progress(|p: &RunProgress<'_>| seen.lock().push((p.index, p.total, p.percent())))
        .run_dry(&mains, &plan)
        .await
        .unwrap();

    let seen = seen.into_inner();
    assert_eq!(seen.len(), plan.len());
    assert_eq!(seen[0], (0, 9, 0));
    assert!(seen.windows(2).all(|w| w[0].2 <= w[1].2));
}

/// Collected results fold into the store, including constraint artifacts.
#[tokio::test]
async fn results_fold_into_store() {
    let mains = booking_schema();
    let plan = build_step_plan(&mains);
    let service = FakeGeneration::new();

    let results = PlanRunner::new(&service).run_collect(&mains, &plan).await;
    let mut store = ArtifactStore::new();
    let summary = store.record_all(&results).unwrap();

    assert_eq!(summary.stored, plan.len());
    assert_eq!(summary.skipped, 0);

    let guests = DataPath::root("Guests");
    let range = store.constraint(&guests, ConstraintKind::Range).unwrap();
    assert!(range.messages.is_some());
    assert!(range.validator.is_some());
    assert!(range.testset.is_some());

    let arrival_day = DataPath::from_labels(["Arrival", "day"]);
    let bucket = store.get(&arrival_day).unwrap();
    assert!(bucket.start.is_some());
    assert!(bucket.confirmation.is_none());
}

/// Work plans weigh every field and every non-required constraint.
#[test]
fn work_plan_for_booking() {
    let mains = booking_schema();
    let work = compute_work_plan(&mains, WorkPlanWeights::default());
    assert_eq!(work.num_data, 5);
    assert_eq!(work.num_constraints, 3);
    assert_eq!(work.total, 6 * 5 + 3 * 3);
    assert_eq!(work.items.len(), build_step_plan(&mains).len());
    assert!(work
        .items
        .iter()
        .all(|i| i.constraint_kind != Some(ConstraintKind::Required)));
}
