use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Provider-side author identifier (a numeric string for X accounts).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorId(String);

impl AuthorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AuthorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AuthorId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Ordered set of authors still waiting for their first record.
///
/// Entries only ever leave the queue. An author counts as satisfied the first time
/// any record attributed to them is kept from a fetch, even when the provider
/// truncated the page before returning the rest of their posts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthorQueue {
    remaining: Vec<AuthorId>,
}

impl AuthorQueue {
    /// Builds the queue, keeping the first occurrence of every id and dropping blanks.
    pub fn new(ids: impl IntoIterator<Item = AuthorId>) -> Self {
        let mut seen = HashSet::new();
        let remaining = ids
            .into_iter()
            .filter(|id| !id.as_str().is_empty())
            .filter(|id| seen.insert(id.clone()))
            .collect();
        Self { remaining }
    }

    pub fn remaining(&self) -> &[AuthorId] {
        &self.remaining
    }

    /// The first `size` remaining authors, in queue order.
    pub fn batch(&self, size: usize) -> Vec<AuthorId> {
        self.remaining.iter().take(size).cloned().collect()
    }

    /// Removes every given author. Returns how many were actually pending.
    pub fn mark_satisfied(&mut self, ids: &HashSet<AuthorId>) -> usize {
        let before = self.remaining.len();
        self.remaining.retain(|id| !ids.contains(id));
        before - self.remaining.len()
    }

    pub fn len(&self) -> usize {
        self.remaining.len()
    }

    pub fn is_empty(&self) -> bool {
        self.remaining.is_empty()
    }
}
