// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Closed label vocabulary.
//!
//! Labels are never free text. Each [`BodyPart`] and [`Category`] pair owns an
//! allowed subset of [`Label`]; [`Label::allowed`] is the single source of
//! truth used when validating expected rule structures.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::landmark::BodyPart;

/// Label category within a [`crate::RegionLabelSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Static per-frame position labels.
    Position,
    /// Cross-frame motion labels.
    Motion,
}

impl Category {
    /// Both categories, position first.
    pub const BOTH: [Self; 2] = [Self::Position, Self::Motion];

    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Position => "position",
            Self::Motion => "motion",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A position or motion label.
///
/// Serialized as its human phrase, e.g. `"bent at 90 degrees"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Label {
    /// Shoulders well above hips.
    Upright,
    /// Shoulders stacked over hips horizontally.
    NeutralSpine,
    /// Shoulders ahead of hips.
    LeaningForward,
    /// Shoulders behind hips.
    LeaningBackward,
    /// Hips folded with the thigh below horizontal.
    HipHinge,
    /// Hips level with knees.
    Seated,
    /// Above the reference joint, or moving up.
    VerticalUpward,
    /// Below the reference joint, or moving down.
    VerticalDownward,
    /// Far from the body midline horizontally, or moving away from it.
    HorizontalOutward,
    /// Near the body midline horizontally, or moving towards it.
    HorizontalInward,
    /// Hand above the shoulder line.
    OverHead,
    /// Hand in front of the chest.
    OverChest,
    /// Hand near a detected equipment item.
    HoldingEquipment,
    /// Joint angle below the flexion threshold.
    Flexed,
    /// Joint angle near 90 degrees.
    BentAt90,
    /// Joint angle past the 90-degree band (knee only).
    Bent,
    /// Limb straight.
    Extended,
    /// Elbow tucked against the torso.
    CloseToTorso,
    /// Feet detected.
    OnGround,
    /// Feet level with each other.
    Flat,
    /// Feet spaced about as wide as the shoulders.
    ShoulderWidthApart,
    /// Joint closing between frames.
    Flexion,
    /// Joint opening between frames.
    Extension,
    /// No movement.
    Stationary,
    /// Any movement over the whole clip.
    Moving,
}

use Label::*;

const TORSO_POSITION: &[Label] = &[Upright, NeutralSpine, LeaningForward, LeaningBackward];
const HIP_POSITION: &[Label] = &[HipHinge, Seated];
const HAND_POSITION: &[Label] = &[
    VerticalUpward,
    VerticalDownward,
    HorizontalOutward,
    HorizontalInward,
    OverHead,
    OverChest,
    HoldingEquipment,
];
const ELBOW_POSITION: &[Label] = &[Flexed, BentAt90, Extended, CloseToTorso];
const KNEE_POSITION: &[Label] = &[Flexed, BentAt90, Bent, Extended];
const FOOT_POSITION: &[Label] = &[OnGround, Flat, ShoulderWidthApart];

const JOINT_MOTION: &[Label] = &[Flexion, Extension, Stationary];
const HAND_MOTION: &[Label] = &[
    VerticalUpward,
    VerticalDownward,
    HorizontalOutward,
    HorizontalInward,
    Stationary,
];
const FOOT_MOTION: &[Label] = &[VerticalUpward, VerticalDownward, Stationary];
const BODY_MOTION: &[Label] = &[Stationary, Moving];

impl Label {
    /// Every label.
    pub const ALL: [Self; 25] = [
        Upright,
        NeutralSpine,
        LeaningForward,
        LeaningBackward,
        HipHinge,
        Seated,
        VerticalUpward,
        VerticalDownward,
        HorizontalOutward,
        HorizontalInward,
        OverHead,
        OverChest,
        HoldingEquipment,
        Flexed,
        BentAt90,
        Bent,
        Extended,
        CloseToTorso,
        OnGround,
        Flat,
        ShoulderWidthApart,
        Flexion,
        Extension,
        Stationary,
        Moving,
    ];

    /// Human phrase used in catalogs and reports.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Upright => "upright",
            NeutralSpine => "neutral spine",
            LeaningForward => "leaning forward",
            LeaningBackward => "leaning backward",
            HipHinge => "hip hinge",
            Seated => "seated",
            VerticalUpward => "vertical upward",
            VerticalDownward => "vertical downward",
            HorizontalOutward => "horizontal outward",
            HorizontalInward => "horizontal inward",
            OverHead => "over head",
            OverChest => "over chest",
            HoldingEquipment => "holding equipment",
            Flexed => "flexed",
            BentAt90 => "bent at 90 degrees",
            Bent => "bent",
            Extended => "extended",
            CloseToTorso => "close to torso",
            OnGround => "on ground",
            Flat => "flat",
            ShoulderWidthApart => "shoulder-width apart",
            Flexion => "flexion",
            Extension => "extension",
            Stationary => "stationary",
            Moving => "moving",
        }
    }

    /// Allowed labels for a body part in one category.
    ///
    /// Shoulders carry no position labels.
    #[must_use]
    pub const fn allowed(part: BodyPart, category: Category) -> &'static [Self] {
        match (part, category) {
            (BodyPart::Torso, Category::Position) => TORSO_POSITION,
            (BodyPart::Hip, Category::Position) => HIP_POSITION,
            (BodyPart::Shoulder, Category::Position) => &[],
            (BodyPart::Hand, Category::Position) => HAND_POSITION,
            (BodyPart::Elbow, Category::Position) => ELBOW_POSITION,
            (BodyPart::Knee, Category::Position) => KNEE_POSITION,
            (BodyPart::Foot, Category::Position) => FOOT_POSITION,
            (BodyPart::Elbow | BodyPart::Knee, Category::Motion) => JOINT_MOTION,
            (BodyPart::Hand, Category::Motion) => HAND_MOTION,
            (BodyPart::Foot, Category::Motion) => FOOT_MOTION,
            (BodyPart::Torso | BodyPart::Hip | BodyPart::Shoulder, Category::Motion) => {
                BODY_MOTION
            }
        }
    }

    /// Whether this label belongs to the vocabulary of `part` in `category`.
    #[must_use]
    pub fn is_allowed(self, part: BodyPart, category: Category) -> bool {
        Self::allowed(part, category).contains(&self)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn normalize(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

impl FromStr for Label {
    type Err = LabelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize(s);
        match key.as_str() {
            "bent at 90" | "bent at 90°" | "bent 90" => return Ok(BentAt90),
            "overhead" => return Ok(OverHead),
            _ => {}
        }
        Self::ALL
            .into_iter()
            .find(|label| normalize(label.as_str()) == key)
            .ok_or_else(|| LabelParseError(s.to_string()))
    }
}

impl Serialize for Label {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Label {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Error returned when parsing a phrase outside the vocabulary.
#[derive(Debug, Clone)]
pub struct LabelParseError(String);

impl fmt::Display for LabelParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown label '{}'", self.0)
    }
}

impl std::error::Error for LabelParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_from_str() {
        assert_eq!("bent at 90 degrees".parse::<Label>().unwrap(), BentAt90);
        assert_eq!("Hip_Hinge".parse::<Label>().unwrap(), HipHinge);
        assert_eq!("shoulder width apart".parse::<Label>().unwrap(), ShoulderWidthApart);
        assert_eq!("overhead".parse::<Label>().unwrap(), OverHead);
        assert!("wobbly".parse::<Label>().is_err());
    }

    #[test]
    fn test_label_phrases_roundtrip() {
        for label in Label::ALL {
            assert_eq!(label.as_str().parse::<Label>().unwrap(), label);
        }
    }

    #[test]
    fn test_label_json() {
        let json = serde_json::to_string(&BentAt90).unwrap();
        assert_eq!(json, "\"bent at 90 degrees\"");
        let label: Label = serde_json::from_str("\"close to torso\"").unwrap();
        assert_eq!(label, CloseToTorso);
    }

    #[test]
    fn test_vocabulary() {
        assert!(Extended.is_allowed(BodyPart::Elbow, Category::Position));
        assert!(Bent.is_allowed(BodyPart::Knee, Category::Position));
        assert!(!Bent.is_allowed(BodyPart::Elbow, Category::Position));
        assert!(!Flexion.is_allowed(BodyPart::Hand, Category::Motion));
        assert!(Moving.is_allowed(BodyPart::Torso, Category::Motion));
        assert!(Label::allowed(BodyPart::Shoulder, Category::Position).is_empty());
    }
}
