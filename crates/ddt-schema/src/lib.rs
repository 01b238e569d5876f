//! DDT Schema
//!
//! Vocabulary shared by every stage of the dialogue data template pipeline.
//!
//! # Core Concepts
//!
//! - [`SchemaNode`]: One collectible field and its sub-fields
//! - [`Constraint`]: Validation rule attached to a field
//! - [`DataPath`]: Slash-joined address of a field, the join key between stages
//! - [`StepPlanItem`]: One unit of generation work
//! - [`NlpContract`]: Recognition contract for a field
//!
//! # Example
//!
//! ```rust
//! use ddt_schema::{Constraint, ConstraintRule, DataPath, SchemaNode};
//!
//! let dob = SchemaNode::new("Date of birth")
//!     .with_type("date")
//!     .with_constraint(Constraint::new(ConstraintRule::PastDate))
//!     .with_sub(SchemaNode::new("day"));
//!
//! let path = DataPath::root(&dob.label).child("day");
//! assert_eq!(path.to_string(), "Date of birth/day");
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod constraint;
mod contract;
mod node;
mod path;
mod step;

pub use constraint::{Constraint, ConstraintKind, ConstraintRule};
pub use contract::{NlpContract, RegexRecognizer, SubDataSlot, MONTHS_PLACEHOLDER};
pub use node::{find, walk, SchemaNode};
pub use path::{escape_label, DataPath, PathError, SEPARATOR};
pub use step::{BaseStep, StepPlanItem, StepType, StepTypeError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
