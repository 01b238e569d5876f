//! DDT Artifact Store
//!
//! Path-keyed accumulator of generated content (prompts, validators, test
//! sets) with structural merge and path migration.
//!
//! # Core Concepts
//!
//! - [`ArtifactStore`]: `DataPath` → [`PathArtifacts`] map, grows during a session
//! - [`PathArtifacts`]: Base-step payloads plus per-constraint [`ConstraintArtifacts`]
//! - [`StepResult`]: One executed generation step, folded in with [`ArtifactStore::record`]
//!
//! # Example
//!
//! ```rust
//! use ddt_artifact::{merge_artifact_stores, ArtifactStore};
//! use ddt_schema::{ConstraintKind, DataPath, StepType};
//! use serde_json::json;
//!
//! let mut base = ArtifactStore::new();
//! base.set_constraint(DataPath::root("Age"), ConstraintKind::Range, StepType::Validator, json!("v1"))
//!     .unwrap();
//!
//! let mut delta = ArtifactStore::new();
//! delta.set_constraint(DataPath::root("Age"), ConstraintKind::Range, StepType::Testset, json!([]))
//!     .unwrap();
//!
//! let merged = merge_artifact_stores(&base, &delta);
//! let range = merged.constraint(&DataPath::root("Age"), ConstraintKind::Range).unwrap();
//! assert!(range.validator.is_some() && range.testset.is_some());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod bucket;
pub mod payload;
mod result;
mod store;

pub use bucket::{ConstraintArtifacts, PathArtifacts};
pub use result::{StepPayload, StepResult};
pub use store::{
    merge_artifact_stores, move_artifacts_path, ArtifactError, ArtifactStore, RecordOutcome,
    RecordSummary,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
