// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Rule structures shared by observed and expected poses.
//!
//! A [`RuleStructure`] always carries every key in [`Landmark::RULE_KEYS`],
//! empty sets included, so observed and expected structures compare
//! pointwise. Structures are frozen once built; use [`RuleStructureBuilder`]
//! to collect labels and [`RuleStructure::merge`] to union two structures.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{Result, RuleError};
use crate::label::{Category, Label};
use crate::landmark::Landmark;

static EMPTY: BTreeSet<Label> = BTreeSet::new();

/// Position and motion labels for one landmark.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionLabelSet {
    /// Per-frame position labels.
    #[serde(default)]
    pub position: BTreeSet<Label>,
    /// Cross-frame motion labels.
    #[serde(default)]
    pub motion: BTreeSet<Label>,
}

impl RegionLabelSet {
    /// Labels of one category.
    #[must_use]
    pub const fn get(&self, category: Category) -> &BTreeSet<Label> {
        match category {
            Category::Position => &self.position,
            Category::Motion => &self.motion,
        }
    }

    fn get_mut(&mut self, category: Category) -> &mut BTreeSet<Label> {
        match category {
            Category::Position => &mut self.position,
            Category::Motion => &mut self.motion,
        }
    }

    /// Whether both categories are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.position.is_empty() && self.motion.is_empty()
    }

    fn union_with(&mut self, other: &Self) {
        self.position.extend(other.position.iter().copied());
        self.motion.extend(other.motion.iter().copied());
    }
}

/// Frozen mapping from every rule landmark to its label sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<Landmark, RegionLabelSet>",
    into = "BTreeMap<Landmark, RegionLabelSet>"
)]
pub struct RuleStructure {
    regions: BTreeMap<Landmark, RegionLabelSet>,
}

impl Default for RuleStructure {
    fn default() -> Self {
        Self::empty()
    }
}

impl RuleStructure {
    /// A structure with every rule landmark present and empty.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            regions: Landmark::RULE_KEYS
                .into_iter()
                .map(|lm| (lm, RegionLabelSet::default()))
                .collect(),
        }
    }

    /// Label sets for a landmark. Landmarks without rules yield an empty set.
    #[must_use]
    pub fn get(&self, landmark: Landmark) -> Option<&RegionLabelSet> {
        self.regions.get(&landmark)
    }

    /// Labels of one landmark and category.
    #[must_use]
    pub fn labels(&self, landmark: Landmark, category: Category) -> &BTreeSet<Label> {
        self.regions
            .get(&landmark)
            .map_or(&EMPTY, |region| region.get(category))
    }

    /// Whether a landmark carries a label in a category.
    #[must_use]
    pub fn contains(&self, landmark: Landmark, category: Category, label: Label) -> bool {
        self.labels(landmark, category).contains(&label)
    }

    /// Iterate over all landmarks in key order.
    pub fn iter(&self) -> impl Iterator<Item = (Landmark, &RegionLabelSet)> {
        self.regions.iter().map(|(lm, region)| (*lm, region))
    }

    /// Whether no landmark carries any label.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.values().all(RegionLabelSet::is_empty)
    }

    /// Total number of labels across all landmarks and categories.
    #[must_use]
    pub fn label_count(&self) -> usize {
        self.regions
            .values()
            .map(|r| r.position.len() + r.motion.len())
            .sum()
    }

    /// Per-landmark union of two structures. Idempotent and commutative.
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        let mut regions = self.regions.clone();
        for (lm, region) in &other.regions {
            regions.entry(*lm).or_default().union_with(region);
        }
        Self { regions }
    }

    /// The same structure with left and right landmarks swapped.
    #[must_use]
    pub fn mirrored(&self) -> Self {
        Self {
            regions: self
                .regions
                .iter()
                .map(|(lm, region)| (lm.mirrored(), region.clone()))
                .collect(),
        }
    }

    /// Check every label against the vocabulary of its landmark.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::InvalidLabel`] for the first offending label.
    pub fn validate(&self) -> Result<()> {
        for (lm, region) in &self.regions {
            validate_region(*lm, region)?;
        }
        Ok(())
    }
}

fn validate_region(landmark: Landmark, region: &RegionLabelSet) -> Result<()> {
    let Some(part) = landmark.body_part() else {
        if region.is_empty() {
            return Ok(());
        }
        return Err(RuleError::InvalidLabel(format!(
            "landmark '{landmark}' carries no rules"
        )));
    };

    for category in Category::BOTH {
        if let Some(label) = region
            .get(category)
            .iter()
            .find(|label| !label.is_allowed(part, category))
        {
            return Err(RuleError::InvalidLabel(format!(
                "'{label}' is not a {category} label for '{landmark}'"
            )));
        }
    }
    Ok(())
}

impl TryFrom<BTreeMap<Landmark, RegionLabelSet>> for RuleStructure {
    type Error = RuleError;

    fn try_from(map: BTreeMap<Landmark, RegionLabelSet>) -> Result<Self> {
        let mut builder = RuleStructureBuilder::new();
        for (lm, region) in map {
            validate_region(lm, &region)?;
            if lm.body_part().is_some() {
                builder.extend_region(lm, &region);
            }
        }
        Ok(builder.build())
    }
}

impl From<RuleStructure> for BTreeMap<Landmark, RegionLabelSet> {
    fn from(rules: RuleStructure) -> Self {
        rules.regions
    }
}

/// Collects labels and freezes them into a [`RuleStructure`].
///
/// # Example
///
/// ```rust
/// use exercise_rules::{Category, Label, Landmark, RuleStructureBuilder};
///
/// let rules = RuleStructureBuilder::new()
///     .with(Landmark::LeftElbow, Category::Position, Label::Extended)
///     .build();
/// assert!(rules.contains(Landmark::LeftElbow, Category::Position, Label::Extended));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RuleStructureBuilder {
    regions: BTreeMap<Landmark, RegionLabelSet>,
}

impl RuleStructureBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one label. Landmarks without rules are ignored.
    pub fn insert(&mut self, landmark: Landmark, category: Category, label: Label) -> &mut Self {
        if landmark.body_part().is_some() {
            self.regions
                .entry(landmark)
                .or_default()
                .get_mut(category)
                .insert(label);
        }
        self
    }

    /// Builder-style [`Self::insert`].
    #[must_use]
    pub fn with(mut self, landmark: Landmark, category: Category, label: Label) -> Self {
        self.insert(landmark, category, label);
        self
    }

    /// Add several labels to one landmark and category.
    pub fn extend(
        &mut self,
        landmark: Landmark,
        category: Category,
        labels: impl IntoIterator<Item = Label>,
    ) -> &mut Self {
        for label in labels {
            self.insert(landmark, category, label);
        }
        self
    }

    fn extend_region(&mut self, landmark: Landmark, region: &RegionLabelSet) {
        self.regions.entry(landmark).or_default().union_with(region);
    }

    /// Union a whole structure into the builder.
    pub fn absorb(&mut self, rules: &RuleStructure) -> &mut Self {
        for (lm, region) in rules.iter() {
            self.extend_region(lm, region);
        }
        self
    }

    /// Freeze the collected labels, filling every missing rule landmark.
    #[must_use]
    pub fn build(self) -> RuleStructure {
        let mut rules = RuleStructure::empty();
        for (lm, region) in self.regions {
            rules.regions.entry(lm).or_default().union_with(&region);
        }
        rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RuleStructure {
        RuleStructureBuilder::new()
            .with(Landmark::LeftElbow, Category::Position, Label::Flexed)
            .with(Landmark::LeftElbow, Category::Motion, Label::Flexion)
            .with(Landmark::Torso, Category::Position, Label::Upright)
            .build()
    }

    #[test]
    fn test_empty_has_all_keys() {
        let rules = RuleStructure::empty();
        for lm in Landmark::RULE_KEYS {
            assert!(rules.get(lm).is_some());
        }
        assert!(rules.get(Landmark::LeftWrist).is_none());
        assert!(rules.is_empty());
    }

    #[test]
    fn test_builder_dedups() {
        let mut builder = RuleStructureBuilder::new();
        builder
            .insert(Landmark::LeftKnee, Category::Position, Label::Flexed)
            .insert(Landmark::LeftKnee, Category::Position, Label::Flexed)
            .insert(Landmark::LeftWrist, Category::Position, Label::Flexed);
        let rules = builder.build();
        assert_eq!(rules.labels(Landmark::LeftKnee, Category::Position).len(), 1);
        assert_eq!(rules.label_count(), 1);
    }

    #[test]
    fn test_merge_idempotent() {
        let a = sample();
        let b = RuleStructureBuilder::new()
            .with(Landmark::LeftElbow, Category::Position, Label::CloseToTorso)
            .build();
        let once = a.merge(&b);
        let twice = once.merge(&b).merge(&a);
        assert_eq!(once, twice);
        assert_eq!(a.merge(&b), b.merge(&a));
        assert_eq!(once.labels(Landmark::LeftElbow, Category::Position).len(), 2);
    }

    #[test]
    fn test_mirrored() {
        let rules = sample().mirrored();
        assert!(rules.contains(Landmark::RightElbow, Category::Position, Label::Flexed));
        assert!(rules.labels(Landmark::LeftElbow, Category::Position).is_empty());
        assert!(rules.contains(Landmark::Torso, Category::Position, Label::Upright));
        assert_eq!(rules.mirrored(), sample());
    }

    #[test]
    fn test_json_fills_missing_keys() {
        let json = r#"{"left_knee": {"position": ["bent at 90 degrees"]}}"#;
        let rules: RuleStructure = serde_json::from_str(json).unwrap();
        assert!(rules.contains(Landmark::LeftKnee, Category::Position, Label::BentAt90));
        assert!(rules.get(Landmark::RightFoot).is_some());
    }

    #[test]
    fn test_json_rejects_foreign_label() {
        let json = r#"{"left_hand": {"motion": ["flexion"]}}"#;
        let err = serde_json::from_str::<RuleStructure>(json).unwrap_err();
        assert!(err.to_string().contains("flexion"));
    }

    #[test]
    fn test_validate() {
        assert!(sample().validate().is_ok());
    }
}
