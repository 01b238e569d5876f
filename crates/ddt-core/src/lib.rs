//! DDT Core - dialogue data template pipeline
//!
//! Turns a user-edited schema tree into a runtime-ready template:
//! - Plans generation steps over the tree ([`StepPlanner`])
//! - Runs them against a generation service ([`PlanRunner`])
//! - Clones recognition contracts into instances ([`ContractCloner`])
//! - Assembles the final template with stable identities ([`TemplateAssembler`])
//!
//! # Example
//!
//! ```rust,ignore
//! use ddt_core::prelude::*;
//!
//! # async fn example(mains: Vec<SchemaNode>, store: ArtifactStore) -> Result<(), DdtError> {
//! let templates = StaticTemplates::new();
//! let months = StaticMonthCatalog::new().with_language("EN", ["September", "Sep"]);
//! let ids = UuidIds;
//! let translations = SharedTranslations::new();
//!
//! let assembler = TemplateAssembler::new(&templates, &months, &ids);
//! let template = assembler
//!     .assemble("Booking", &mains, &store, &AssemblyOptions::new("en-US"), Some(&translations))
//!     .await?;
//!
//! println!("{} nodes, {} texts", template.nodes().count(), translations.len());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod assembler;
pub mod config;
pub mod contract;
pub mod error;
pub mod ids;
pub mod planner;
pub mod runner;
pub mod services;
pub mod template;

// Re-exports for convenience
pub use assembler::{Candidates, Resolution, TemplateAssembler, TemplateMatch};
pub use config::{
    language_of, AssemblyOptions, ConfirmationPolicy, EndpointPaths, EscalationCounts,
    PlanConfig, ServiceConfig, TemplateTranslations, WorkPlanWeights,
};
pub use contract::{create_sub_id_mapping, months_alternation, ContractCloner, SubIdMapping};
pub use error::{AssemblyError, ContractError, DdtError, RunError, ServiceError};
pub use ids::{IdGenerator, SequentialIds, UuidIds};
pub use planner::{build_step_plan, compute_work_plan, StepPlanner, WorkPlan};
pub use runner::{PlanRunner, RunProgress};
pub use services::{
    CachedMonthCatalog, Endpoint, GenerationService, HttpGenerationService, HttpMonthCatalog,
    MonthCatalog, SharedTranslations, StaticMonthCatalog, StaticTemplates, TemplateLookup,
    TranslationSink, Translations,
};
pub use template::{
    AssembledConstraint, AssembledNode, AssembledTemplate, DraftInfo, Escalation, PendingReview,
    RecoveryMessage, RecoveryMessages, RootSteps, StepEntry, Template, TemplateNode,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with DDT Core
    pub use crate::{
        AssembledTemplate, AssemblyOptions, DdtError, GenerationService, PlanRunner,
        SharedTranslations, StaticMonthCatalog, StaticTemplates, StepPlanner, TemplateAssembler,
        UuidIds,
    };
    pub use ddt_artifact::ArtifactStore;
    pub use ddt_schema::{Constraint, ConstraintRule, DataPath, SchemaNode};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
