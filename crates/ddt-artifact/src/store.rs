//! Path-keyed artifact store
//!
//! Grows monotonically during a generation session. Supports structural merge
//! of two stores and path migration for fields renamed while editing.

use crate::bucket::{ConstraintArtifacts, PathArtifacts};
use crate::result::{StepPayload, StepResult};
use ddt_schema::{ConstraintKind, DataPath, StepType};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Accumulated artifacts of a generation session
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactStore {
    by_path: BTreeMap<DataPath, PathArtifacts>,
}

/// What happened to a recorded result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Payload stored
    Stored,
    /// Error payload, nothing stored
    SkippedError,
}

/// Counts from [`ArtifactStore::record_all`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordSummary {
    /// Payloads stored
    pub stored: usize,
    /// Error payloads skipped
    pub skipped: usize,
}

impl ArtifactStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bucket for a path
    #[inline]
    #[must_use]
    pub fn get(&self, path: &DataPath) -> Option<&PathArtifacts> {
        self.by_path.get(path)
    }

    /// Bucket for a path, created if missing
    #[inline]
    pub fn entry(&mut self, path: DataPath) -> &mut PathArtifacts {
        self.by_path.entry(path).or_default()
    }

    /// Number of buckets
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    /// Check if store is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }

    /// Paths with a bucket, in order
    pub fn paths(&self) -> impl Iterator<Item = &DataPath> {
        self.by_path.keys()
    }

    /// Iterate over buckets
    pub fn iter(&self) -> impl Iterator<Item = (&DataPath, &PathArtifacts)> {
        self.by_path.iter()
    }

    /// Store a constraint artifact
    ///
    /// # Errors
    /// Returns error if `step_type` is a base step
    pub fn set_constraint(
        &mut self,
        path: DataPath,
        kind: ConstraintKind,
        step_type: StepType,
        value: Value,
    ) -> Result<(), ArtifactError> {
        if step_type.base().is_some() {
            return Err(ArtifactError::NotAConstraintStep { path, step_type });
        }
        let artifacts = self.entry(path).constraints.entry(kind).or_default();
        if let Some(slot) = artifacts.slot_mut(step_type) {
            *slot = Some(value);
        }
        Ok(())
    }

    /// Fold one executed step into the store
    ///
    /// # Errors
    /// Returns error if a constraint step carries no constraint kind
    pub fn record(&mut self, result: &StepResult) -> Result<RecordOutcome, ArtifactError> {
        let value = match &result.payload {
            StepPayload::Data(value) => value.clone(),
            StepPayload::Error { error } => {
                tracing::debug!(step = %result.step, error = %error, "skipping failed step");
                return Ok(RecordOutcome::SkippedError);
            }
        };

        let step = &result.step;
        match step.step_type.base() {
            Some(base) => {
                *self.entry(step.path.clone()).base_slot_mut(base) = Some(value);
            }
            None => {
                let kind = step
                    .constraint_kind
                    .ok_or_else(|| ArtifactError::MissingConstraintKind(step.path.clone()))?;
                self.set_constraint(step.path.clone(), kind, step.step_type, value)?;
            }
        }
        Ok(RecordOutcome::Stored)
    }

    /// Fold a collected result list into the store
    ///
    /// # Errors
    /// Stops at the first malformed result
    pub fn record_all<'a, I>(&mut self, results: I) -> Result<RecordSummary, ArtifactError>
    where
        I: IntoIterator<Item = &'a StepResult>,
    {
        let mut summary = RecordSummary::default();
        for result in results {
            match self.record(result)? {
                RecordOutcome::Stored => summary.stored += 1,
                RecordOutcome::SkippedError => summary.skipped += 1,
            }
        }
        Ok(summary)
    }

    /// Merge `delta` into this store
    ///
    /// Every path, step and constraint-kind entry explicitly present in
    /// `delta` overwrites the current one; everything else is kept.
    pub fn merge(&mut self, delta: ArtifactStore) {
        for (path, bucket) in delta.by_path {
            self.entry(path).merge_from(bucket);
        }
    }

    /// Move the bucket at `from` (and its descendants) to `to`
    ///
    /// Moved entries are merged into any bucket already at the destination,
    /// winning on conflicts. Returns the number of buckets moved.
    pub fn move_path(&mut self, from: &DataPath, to: &DataPath) -> usize {
        if from == to {
            return 0;
        }

        let moving: Vec<DataPath> = self
            .by_path
            .keys()
            .filter(|p| from.is_prefix_of(p))
            .cloned()
            .collect();

        let mut moved = 0;
        for old in moving {
            let Some(bucket) = self.by_path.remove(&old) else {
                continue;
            };
            let Some(new) = old.rebase(from, to) else {
                continue;
            };
            tracing::debug!(from = %old, to = %new, "moving artifacts");
            self.entry(new).merge_from(bucket);
            moved += 1;
        }
        moved
    }

    /// Remove the bucket at `path` and its descendants
    ///
    /// Returns the number of buckets removed.
    pub fn remove_path(&mut self, path: &DataPath) -> usize {
        let before = self.by_path.len();
        self.by_path.retain(|p, _| !path.is_prefix_of(p));
        before - self.by_path.len()
    }

    /// Constraint artifacts at a path
    #[must_use]
    pub fn constraint(&self, path: &DataPath, kind: ConstraintKind) -> Option<&ConstraintArtifacts> {
        self.get(path).and_then(|b| b.constraint(kind))
    }
}

/// Combine two stores without clobbering entries untouched by `delta`
#[must_use]
pub fn merge_artifact_stores(base: &ArtifactStore, delta: &ArtifactStore) -> ArtifactStore {
    let mut merged = base.clone();
    merged.merge(delta.clone());
    merged
}

/// Copy of `store` with the bucket at `from` moved to `to`
#[must_use]
pub fn move_artifacts_path(store: &ArtifactStore, from: &DataPath, to: &DataPath) -> ArtifactStore {
    let mut moved = store.clone();
    moved.move_path(from, to);
    moved
}

/// Errors related to artifact recording
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    /// Constraint step without a constraint kind
    #[error("constraint step at '{0}' has no constraint kind")]
    MissingConstraintKind(DataPath),

    /// Base step stored as a constraint artifact
    #[error("step '{step_type}' at '{path}' is not a constraint step")]
    NotAConstraintStep { path: DataPath, step_type: StepType },
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    const KINDS: [ConstraintKind; 4] = [
        ConstraintKind::Range,
        ConstraintKind::Length,
        ConstraintKind::Enum,
        ConstraintKind::Regex,
    ];

    fn arb_store() -> impl Strategy<Value = ArtifactStore> {
        prop::collection::vec((0usize..4, 0usize..4, 0usize..3, 0u32..100), 0..12).prop_map(
            |entries| {
                let mut store = ArtifactStore::new();
                for (p, k, s, v) in entries {
                    let path = DataPath::root(&format!("field{p}"));
                    store
                        .set_constraint(path, KINDS[k], StepType::CONSTRAINT_STEPS[s], json!(v))
                        .unwrap();
                }
                store
            },
        )
    }

    proptest! {
        #[test]
        fn merge_keeps_base_entries_absent_from_delta(base in arb_store(), delta in arb_store()) {
            let merged = merge_artifact_stores(&base, &delta);
            for (path, bucket) in base.iter() {
                for (kind, artifacts) in &bucket.constraints {
                    let got = merged.constraint(path, *kind).unwrap();
                    let overlay = delta.constraint(path, *kind);
                    for (step, want) in [
                        (StepType::ConstraintMessages, &artifacts.messages),
                        (StepType::Validator, &artifacts.validator),
                        (StepType::Testset, &artifacts.testset),
                    ] {
                        let overlay_value = overlay.and_then(|o| match step {
                            StepType::ConstraintMessages => o.messages.as_ref(),
                            StepType::Validator => o.validator.as_ref(),
                            _ => o.testset.as_ref(),
                        });
                        let got_value = match step {
                            StepType::ConstraintMessages => got.messages.as_ref(),
                            StepType::Validator => got.validator.as_ref(),
                            _ => got.testset.as_ref(),
                        };
                        match overlay_value {
                            Some(v) => prop_assert_eq!(got_value, Some(v)),
                            None => prop_assert_eq!(got_value, want.as_ref()),
                        }
                    }
                }
            }
        }
    }
}
