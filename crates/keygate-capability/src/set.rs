//! Ordered sets of primitive capabilities.
//!
//! `CapabilitySet` plays two parts: it is what the resolver returns (the
//! primitives an identity must hold) and it is what a role grants (the
//! primitives an identity does hold).

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::capability::{CapabilityId, standard_ids};

/// A set of primitive capabilities.
///
/// # Example
///
/// ```
/// use keygate_capability::{CapabilitySet, standard_ids};
///
/// let required = CapabilitySet::single(standard_ids::SPECTATE);
/// let held: CapabilitySet = [standard_ids::SPECTATE, standard_ids::PARTICIPATE]
///     .into_iter()
///     .collect();
///
/// assert!(required.satisfied_by(&held));
/// ```
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilitySet {
    capabilities: BTreeSet<CapabilityId>,
}

impl CapabilitySet {
    /// Create an empty capability set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a set holding exactly one capability.
    pub fn single(id: CapabilityId) -> Self {
        let mut set = Self::new();
        set.insert(id);
        set
    }

    /// The universal-deny set, `{do_not_allow}`.
    pub fn deny() -> Self {
        Self::single(standard_ids::DO_NOT_ALLOW)
    }

    /// Add a capability. Returns `false` if it was already present.
    pub fn insert(&mut self, id: CapabilityId) -> bool {
        self.capabilities.insert(id)
    }

    /// Remove a capability. Returns `true` if it was present.
    pub fn remove(&mut self, id: &CapabilityId) -> bool {
        self.capabilities.remove(id)
    }

    /// Check if a capability is in the set.
    pub fn contains(&self, id: &CapabilityId) -> bool {
        self.capabilities.contains(id)
    }

    /// Whether this set contains the universal-deny primitive.
    pub fn is_deny(&self) -> bool {
        self.contains(&standard_ids::DO_NOT_ALLOW)
    }

    /// Get the number of capabilities in the set.
    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    /// Iterate over the capabilities in name order.
    pub fn iter(&self) -> impl Iterator<Item = &CapabilityId> + '_ {
        self.capabilities.iter()
    }

    /// Get all capability IDs in name order.
    pub fn ids(&self) -> Vec<CapabilityId> {
        self.capabilities.iter().cloned().collect()
    }

    /// Check whether `held` satisfies this requirement.
    ///
    /// A requirement is satisfied when the holder has any one of the
    /// required primitives. `do_not_allow` is never satisfiable, even if a
    /// holder set was built to contain it.
    pub fn satisfied_by(&self, held: &CapabilitySet) -> bool {
        if self.is_empty() || self.is_deny() {
            return false;
        }
        self.capabilities.iter().any(|cap| held.contains(cap))
    }

    /// Merge another set into this one.
    pub fn union_with(&mut self, other: &CapabilitySet) {
        self.capabilities.extend(other.capabilities.iter().cloned());
    }
}

impl fmt::Debug for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.capabilities.iter()).finish()
    }
}

impl fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, cap) in self.capabilities.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", cap)?;
        }
        f.write_str("}")
    }
}

impl FromIterator<CapabilityId> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = CapabilityId>>(iter: I) -> Self {
        Self {
            capabilities: iter.into_iter().collect(),
        }
    }
}

impl Extend<CapabilityId> for CapabilitySet {
    fn extend<I: IntoIterator<Item = CapabilityId>>(&mut self, iter: I) {
        self.capabilities.extend(iter);
    }
}

impl IntoIterator for CapabilitySet {
    type Item = CapabilityId;
    type IntoIter = std::collections::btree_set::IntoIter<CapabilityId>;

    fn into_iter(self) -> Self::IntoIter {
        self.capabilities.into_iter()
    }
}

impl<'a> IntoIterator for &'a CapabilitySet {
    type Item = &'a CapabilityId;
    type IntoIter = std::collections::btree_set::Iter<'a, CapabilityId>;

    fn into_iter(self) -> Self::IntoIter {
        self.capabilities.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn held(caps: &[CapabilityId]) -> CapabilitySet {
        caps.iter().cloned().collect()
    }

    #[test]
    fn test_empty_set() {
        let set = CapabilitySet::new();
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
        assert!(!set.satisfied_by(&held(&[standard_ids::SPECTATE])));
    }

    #[test]
    fn test_single_and_contains() {
        let set = CapabilitySet::single(standard_ids::MODERATE);
        assert!(set.contains(&standard_ids::MODERATE));
        assert!(!set.contains(&standard_ids::SPECTATE));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_insert_duplicate() {
        let mut set = CapabilitySet::new();
        assert!(set.insert(standard_ids::SPECTATE));
        assert!(!set.insert(standard_ids::SPECTATE));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_satisfied_by_any() {
        let required = held(&[standard_ids::MODERATE, standard_ids::KEEP_GATE]);
        assert!(required.satisfied_by(&held(&[standard_ids::KEEP_GATE])));
        assert!(!required.satisfied_by(&held(&[standard_ids::SPECTATE])));
    }

    #[test]
    fn test_deny_never_satisfied() {
        let deny = CapabilitySet::deny();
        assert!(deny.is_deny());
        assert!(!deny.satisfied_by(&held(&[standard_ids::DO_NOT_ALLOW])));
        assert!(!deny.satisfied_by(&held(&[standard_ids::KEEP_GATE])));
    }

    #[test]
    fn test_display_is_sorted() {
        let set = held(&[standard_ids::SPECTATE, standard_ids::MODERATE]);
        assert_eq!(set.to_string(), "{moderate, spectate}");
    }

    #[test]
    fn test_union_with() {
        let mut set = CapabilitySet::single(standard_ids::SPECTATE);
        set.union_with(&held(&[standard_ids::PARTICIPATE, standard_ids::SPECTATE]));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_serializes_as_list() {
        let set = held(&[standard_ids::SPECTATE, standard_ids::MODERATE]);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, "[\"moderate\",\"spectate\"]");
    }
}
