//! Set of enabled visual features.

use crate::types::Feature;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Duplicate-free, order-irrelevant set of [`Feature`]s.
///
/// The operations take the set by value and return the updated set, so a
/// configuration can be rebuilt without mutating the one it came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureSet(BTreeSet<Feature>);

impl FeatureSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Union with `feature`. Adding a present feature is a no-op.
    pub fn add(mut self, feature: Feature) -> Self {
        self.0.insert(feature);
        self
    }

    /// Difference with `feature`. Removing an absent feature is a no-op.
    pub fn remove(mut self, feature: Feature) -> Self {
        self.0.remove(&feature);
        self
    }

    /// Removes `feature` if present, otherwise adds it.
    pub fn toggle(self, feature: Feature) -> Self {
        if self.contains(feature) {
            self.remove(feature)
        } else {
            self.add(feature)
        }
    }

    /// Returns true if `feature` is enabled.
    pub fn contains(&self, feature: Feature) -> bool {
        self.0.contains(&feature)
    }

    /// Iterates the enabled features in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = Feature> + '_ {
        self.0.iter().copied()
    }

    /// Number of enabled features.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no feature is enabled.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Feature> for FeatureSet {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        FeatureSet(iter.into_iter().collect())
    }
}
