//! Data paths for addressing fields within a schema tree
//!
//! Provides [`DataPath`], the join key between the schema tree, the step plan
//! and the artifact store.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Separator between path segments
pub const SEPARATOR: char = '/';

/// Address of a field within a schema tree
///
/// Each segment is a node label with any literal `/` escaped to `-`, so the
/// string form is always splittable back into the same segments.
///
/// # Examples
/// - `["Date of birth", "day"]` → `Date of birth/day`
/// - `["Start/End"]` → `Start-End`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DataPath(Vec<String>);

impl DataPath {
    /// Path of a main-level field
    #[inline]
    #[must_use]
    pub fn root(label: &str) -> Self {
        Self(vec![escape_label(label)])
    }

    /// Build a path from raw labels, escaping each one
    #[must_use]
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(labels.into_iter().map(|l| escape_label(l.as_ref())).collect())
    }

    /// Get path segments (already escaped)
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Get number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if path has no segments
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Nesting depth: 0 for a main field, 1 for a sub-field
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    /// Get parent path (if any)
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.0.len() <= 1 {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Get last segment
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Append a child label, returning new path
    #[inline]
    #[must_use]
    pub fn child(&self, label: &str) -> Self {
        let mut new = self.clone();
        new.0.push(escape_label(label));
        new
    }

    /// Check if this path is a prefix of another (or equal to it)
    #[inline]
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        if self.0.len() > other.0.len() {
            return false;
        }
        self.0 == other.0[..self.0.len()]
    }

    /// Replace the `from` prefix of this path with `to`
    ///
    /// Returns `None` when `from` is not a prefix of `self`.
    #[must_use]
    pub fn rebase(&self, from: &Self, to: &Self) -> Option<Self> {
        if !from.is_prefix_of(self) {
            return None;
        }
        let mut segments = to.0.clone();
        segments.extend_from_slice(&self.0[from.0.len()..]);
        Some(Self(segments))
    }

    /// Iterator over segments from main to leaf
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Escape a label for use as a path segment
#[inline]
#[must_use]
pub fn escape_label(label: &str) -> String {
    label.replace(SEPARATOR, "-")
}

impl Display for DataPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for seg in &self.0 {
            if !first {
                write!(f, "{SEPARATOR}")?;
            }
            write!(f, "{seg}")?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for DataPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(PathError::Empty);
        }

        let segments: Vec<String> = s
            .split(SEPARATOR)
            .map(|seg| {
                if seg.is_empty() {
                    Err(PathError::EmptySegment(s.to_string()))
                } else {
                    Ok(seg.to_string())
                }
            })
            .collect::<Result<_, _>>()?;

        Ok(Self(segments))
    }
}

impl Serialize for DataPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DataPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors related to data paths
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    /// Empty path string
    #[error("path is empty")]
    Empty,

    /// Empty segment in path
    #[error("path '{0}' contains an empty segment")]
    EmptySegment(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_root_and_child() {
        let path = DataPath::root("Date of birth").child("day");
        assert_eq!(path.segments(), &["Date of birth", "day"]);
        assert_eq!(path.to_string(), "Date of birth/day");
        assert_eq!(path.depth(), 1);
    }

    #[test]
    fn path_escapes_slash_in_label() {
        let path = DataPath::root("Start/End").child("a/b");
        assert_eq!(path.to_string(), "Start-End/a-b");
        assert_eq!(path.len(), 2);
    }

    #[test]
    fn path_parent_of_main_is_none() {
        let main = DataPath::root("Person");
        assert!(main.parent().is_none());
        assert_eq!(main.child("day").parent(), Some(main));
    }

    #[test]
    fn path_is_prefix_of() {
        let a = DataPath::root("a");
        let b = a.child("b");
        assert!(a.is_prefix_of(&b));
        assert!(a.is_prefix_of(&a));
        assert!(!b.is_prefix_of(&a));
        assert!(!DataPath::root("ab").is_prefix_of(&b));
    }

    #[test]
    fn path_rebase() {
        let from = DataPath::root("Birth");
        let to = DataPath::root("Date of birth");
        let sub = from.child("day");
        assert_eq!(sub.rebase(&from, &to), Some(to.child("day")));
        assert_eq!(DataPath::root("Other").rebase(&from, &to), None);
    }

    #[test]
    fn path_from_str_round_trip() {
        let path: DataPath = "Person/day".parse().unwrap();
        assert_eq!(path, DataPath::root("Person").child("day"));
    }

    #[test]
    fn path_from_str_rejects_empty_segment() {
        assert!(matches!(
            "a//b".parse::<DataPath>(),
            Err(PathError::EmptySegment(_))
        ));
        assert!(matches!("".parse::<DataPath>(), Err(PathError::Empty)));
    }

    #[test]
    fn path_serializes_as_string() {
        let path = DataPath::root("Person").child("day");
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "\"Person/day\"");
        let back: DataPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
    }
}
