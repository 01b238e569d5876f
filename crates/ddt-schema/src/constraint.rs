//! Validation constraints attached to schema fields

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Kind of a constraint, used as the key for per-constraint artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConstraintKind {
    /// Field must be provided (structural, never a generation target)
    Required,
    /// Numeric range
    Range,
    /// String length bounds
    Length,
    /// Regular expression match
    Regex,
    /// One of a fixed set of values
    Enum,
    /// Named format (email, phone, ...)
    Format,
    /// Date must be in the past
    PastDate,
    /// Date must be in the future
    FutureDate,
}

impl ConstraintKind {
    /// Stable camelCase name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Range => "range",
            Self::Length => "length",
            Self::Regex => "regex",
            Self::Enum => "enum",
            Self::Format => "format",
            Self::PastDate => "pastDate",
            Self::FutureDate => "futureDate",
        }
    }

    /// Whether this kind produces generation steps
    #[inline]
    #[must_use]
    pub fn is_generated(&self) -> bool {
        !matches!(self, Self::Required)
    }
}

impl Display for ConstraintKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific constraint parameters
///
/// Serialized with the `kind` tag inline, e.g.
/// `{"kind": "range", "min": 1, "max": 31}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ConstraintRule {
    /// Field must be provided
    Required,
    /// Numeric range, bounds inclusive
    Range {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    /// String length bounds
    Length {
        #[serde(default, rename = "minLength", skip_serializing_if = "Option::is_none")]
        min: Option<usize>,
        #[serde(default, rename = "maxLength", skip_serializing_if = "Option::is_none")]
        max: Option<usize>,
    },
    /// Regular expression
    Regex { pattern: String },
    /// Allowed values
    Enum { values: Vec<String> },
    /// Named format
    Format { format: String },
    /// Date in the past
    PastDate,
    /// Date in the future
    FutureDate,
}

impl ConstraintRule {
    /// Kind of this rule
    #[must_use]
    pub fn kind(&self) -> ConstraintKind {
        match self {
            Self::Required => ConstraintKind::Required,
            Self::Range { .. } => ConstraintKind::Range,
            Self::Length { .. } => ConstraintKind::Length,
            Self::Regex { .. } => ConstraintKind::Regex,
            Self::Enum { .. } => ConstraintKind::Enum,
            Self::Format { .. } => ConstraintKind::Format,
            Self::PastDate => ConstraintKind::PastDate,
            Self::FutureDate => ConstraintKind::FutureDate,
        }
    }
}

/// A validation constraint on a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    /// Short human title
    #[serde(default)]
    pub title: String,
    /// Explanation shown to the author
    #[serde(default)]
    pub payoff: String,
    /// Kind and parameters
    #[serde(flatten)]
    pub rule: ConstraintRule,
}

impl Constraint {
    /// Create constraint with empty title and payoff
    #[inline]
    #[must_use]
    pub fn new(rule: ConstraintRule) -> Self {
        Self {
            title: String::new(),
            payoff: String::new(),
            rule,
        }
    }

    /// Shorthand for a `required` constraint
    #[inline]
    #[must_use]
    pub fn required() -> Self {
        Self::new(ConstraintRule::Required)
    }

    /// With title
    #[inline]
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// With payoff
    #[inline]
    #[must_use]
    pub fn with_payoff(mut self, payoff: impl Into<String>) -> Self {
        self.payoff = payoff.into();
        self
    }

    /// Kind of this constraint
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ConstraintKind {
        self.rule.kind()
    }

    /// Whether this constraint produces generation steps
    #[inline]
    #[must_use]
    pub fn is_generated(&self) -> bool {
        self.kind().is_generated()
    }

    /// Title if set, otherwise the kind name
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.title.trim().is_empty() {
            self.kind().as_str()
        } else {
            &self.title
        }
    }
}
