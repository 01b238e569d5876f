//! Id generation
//!
//! Node ids, template ids and runtime translation keys are all minted
//! through [`IdGenerator`], so tests can swap random ids for a counter.

use std::sync::atomic::{AtomicU64, Ordering};

/// Source of fresh ids
pub trait IdGenerator: Send + Sync {
    /// Next id, never returned before by this generator
    fn next_id(&self) -> String;
}

/// Random v4 UUIDs
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Prefixed counter (`id-1`, `id-2`, ...)
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    counter: AtomicU64,
}

impl SequentialIds {
    /// Create counter with prefix
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU64::new(0),
        }
    }

    /// Number of ids handed out
    #[inline]
    #[must_use]
    pub fn issued(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new("id")
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}-{n}", self.prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn sequential_ids_count_up() {
        let ids = SequentialIds::new("rt");
        assert_eq!(ids.next_id(), "rt-1");
        assert_eq!(ids.next_id(), "rt-2");
        assert_eq!(ids.issued(), 2);
    }

    #[test]
    fn uuid_ids_are_unique() {
        let ids = UuidIds;
        let seen: HashSet<_> = (0..64).map(|_| ids.next_id()).collect();
        assert_eq!(seen.len(), 64);
    }
}
