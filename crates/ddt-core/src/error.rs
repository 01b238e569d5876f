//! Error types for DDT Core
//!
//! Provides error handling for:
//! - External service calls (generation, month constants)
//! - Plan execution
//! - Contract cloning and pattern compilation
//! - Template assembly

use ddt_artifact::ArtifactError;
use ddt_schema::{DataPath, StepPlanItem};

/// Main DDT error type
#[derive(Debug, thiserror::Error)]
pub enum DdtError {
    /// External service failed
    #[error("service error: {0}")]
    Service(#[from] ServiceError),

    /// Plan execution failed
    #[error("run failed: {0}")]
    Run(#[from] RunError),

    /// Contract cloning failed
    #[error("contract error: {0}")]
    Contract(#[from] ContractError),

    /// Assembly pass failed
    #[error("assembly failed: {0}")]
    Assembly(#[from] AssemblyError),

    /// Artifact recording failed
    #[error("artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl DdtError {
    /// Check if error is a configuration problem (never defaulted, never retried)
    #[inline]
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        match self {
            Self::Config(_) => true,
            Self::Contract(e) => e.is_configuration(),
            Self::Assembly(e) => e.is_configuration(),
            _ => false,
        }
    }
}

/// External service errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Transport failure
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-success HTTP status
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// Body could not be decoded
    #[error("invalid response from {url}: {message}")]
    InvalidResponse { url: String, message: String },

    /// Service-side failure reported without HTTP
    #[error("{0}")]
    Failed(String),
}

/// Plan execution errors
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// Step addresses a path that is not in the schema
    #[error("no field at path '{0}'")]
    UnknownPath(DataPath),

    /// Step call failed
    #[error("step {step} failed: {source}")]
    Step {
        step: StepPlanItem,
        #[source]
        source: ServiceError,
    },
}

/// Contract cloning errors
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    /// No project language supplied
    #[error("project language is required to compile contract patterns")]
    MissingLanguage,

    /// Month list for the language is empty
    #[error("no month names for language '{language}'")]
    EmptyMonthList { language: String },

    /// Month constants lookup failed
    #[error("month constants lookup failed: {0}")]
    Months(#[from] ServiceError),

    /// Compiled pattern is not a valid regex
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

impl ContractError {
    /// Missing language or month constants
    #[inline]
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::MissingLanguage | Self::EmptyMonthList { .. })
    }
}

/// Template assembly errors
#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
    /// `project_locale` not set
    #[error("project locale is required for assembly")]
    MissingLocale,

    /// Node nested below a sub-field
    #[error("field '{path}' is nested deeper than one level")]
    NestingTooDeep { path: DataPath },

    /// Contract of a node could not be cloned
    #[error("contract of '{path}': {source}")]
    Contract {
        path: DataPath,
        #[source]
        source: ContractError,
    },
}

impl AssemblyError {
    /// Missing locale or missing month constants
    #[inline]
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        match self {
            Self::MissingLocale => true,
            Self::Contract { source, .. } => source.is_configuration(),
            Self::NestingTooDeep { .. } => false,
        }
    }
}
