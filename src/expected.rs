// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Expected-rule builder.
//!
//! Expected rules come from one of three places:
//!
//! - a catalog entry, looked up by normalized activity name;
//! - a structured reference record in catalog JSON shape;
//! - a free-text description, scanned against [`PHRASES`].
//!
//! The text path is deliberately coarse and usually leaves most landmarks
//! empty, which the matcher treats as "no constraint".

use crate::catalog::{Catalog, ExerciseReference};
use crate::equipment::{EquipmentRecord, equipment_from_text};
use crate::error::{Result, RuleError};
use crate::label::{Category, Label};
use crate::landmark::{BodyPart, Landmark};
use crate::rules::{RuleStructure, RuleStructureBuilder};

/// One entry of the description keyword table.
#[derive(Debug, Clone, Copy)]
pub struct Phrase {
    /// Phrase to find, matched on word boundaries.
    pub text: &'static str,
    /// Another phrase that must also be present.
    pub requires: Option<&'static str>,
    /// Body parts receiving the label on both sides.
    pub parts: &'static [BodyPart],
    /// Label category.
    pub category: Category,
    /// Labels added.
    pub labels: &'static [Label],
}

const fn phrase(
    text: &'static str,
    parts: &'static [BodyPart],
    category: Category,
    labels: &'static [Label],
) -> Phrase {
    Phrase {
        text,
        requires: None,
        parts,
        category,
        labels,
    }
}

use BodyPart::{Elbow, Foot, Hand, Hip, Knee, Torso};
use Category::{Motion, Position};

/// Description keyword table.
pub const PHRASES: &[Phrase] = &[
    // Posture
    phrase("upright", &[Torso], Position, &[Label::Upright]),
    phrase("stand tall", &[Torso], Position, &[Label::Upright]),
    phrase("neutral spine", &[Torso], Position, &[Label::NeutralSpine]),
    phrase("flat back", &[Torso], Position, &[Label::NeutralSpine]),
    phrase("lean forward", &[Torso], Position, &[Label::LeaningForward]),
    phrase("bent over", &[Torso], Position, &[Label::LeaningForward]),
    phrase("lean back", &[Torso], Position, &[Label::LeaningBackward]),
    phrase("hinge at the hips", &[Hip], Position, &[Label::HipHinge]),
    phrase("hip hinge", &[Hip], Position, &[Label::HipHinge]),
    phrase("seated", &[Hip], Position, &[Label::Seated]),
    // Legs
    phrase("shoulder width apart", &[Foot], Position, &[Label::ShoulderWidthApart]),
    phrase("feet flat", &[Foot], Position, &[Label::OnGround, Label::Flat]),
    phrase("squat", &[Knee], Motion, &[Label::Flexion, Label::Extension]),
    phrase("squat", &[Hip], Motion, &[Label::Moving]),
    phrase("lunge", &[Knee], Motion, &[Label::Flexion, Label::Extension]),
    phrase("bend your knees", &[Knee], Motion, &[Label::Flexion, Label::Extension]),
    phrase("90 degrees", &[Knee], Position, &[Label::BentAt90]),
    phrase("leg extended", &[Knee], Position, &[Label::Extended]),
    phrase("legs straight", &[Knee], Position, &[Label::Extended]),
    phrase("calf raise", &[Foot], Motion, &[Label::VerticalUpward, Label::VerticalDownward]),
    // Arms
    phrase("arms extended", &[Elbow], Position, &[Label::Extended]),
    phrase("extend the arms", &[Elbow], Position, &[Label::Extended]),
    phrase("straight arms", &[Elbow], Position, &[Label::Extended]),
    phrase("arms bent", &[Elbow], Position, &[Label::Flexed]),
    phrase("bend in the elbow", &[Elbow], Position, &[Label::Flexed]),
    phrase("elbows close", &[Elbow], Position, &[Label::CloseToTorso]),
    phrase("elbows tucked", &[Elbow], Position, &[Label::CloseToTorso]),
    phrase("curl", &[Elbow], Motion, &[Label::Flexion, Label::Extension]),
    phrase("press", &[Elbow], Motion, &[Label::Flexion, Label::Extension]),
    phrase("press", &[Hand], Motion, &[Label::VerticalUpward, Label::VerticalDownward]),
    phrase("row", &[Elbow], Motion, &[Label::Flexion, Label::Extension]),
    phrase("arms overhead", &[Hand], Position, &[Label::OverHead]),
    phrase("overhead", &[Hand], Position, &[Label::OverHead]),
    phrase("front raise", &[Hand], Motion, &[Label::VerticalUpward, Label::VerticalDownward]),
    phrase(
        "lateral raise",
        &[Hand],
        Motion,
        &[Label::HorizontalOutward, Label::HorizontalInward],
    ),
    phrase("arms spread", &[Hand], Position, &[Label::HorizontalOutward]),
    phrase("spread the arms", &[Hand], Position, &[Label::HorizontalOutward]),
    phrase("hold", &[Hand], Position, &[Label::HoldingEquipment]),
    phrase("holding", &[Hand], Position, &[Label::HoldingEquipment]),
    Phrase {
        text: "close to the chest",
        requires: Some("kettlebell"),
        parts: &[Hand],
        category: Position,
        labels: &[Label::OverChest],
    },
    Phrase {
        text: "close to the chest",
        requires: Some("kettlebell"),
        parts: &[Elbow],
        category: Position,
        labels: &[Label::CloseToTorso],
    },
];

/// Expected rules parsed from a description.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedDescription {
    /// Expected landmark labels.
    pub rules: RuleStructure,
    /// Equipment mentioned in the text.
    pub equipment: EquipmentRecord,
    /// Table phrases that fired, in table order, without repeats.
    pub phrases: Vec<&'static str>,
}

impl ParsedDescription {
    /// Wrap the parsed rules as a named reference.
    #[must_use]
    pub fn into_reference(self, activity: impl Into<String>) -> ExerciseReference {
        ExerciseReference::new(activity, self.rules).with_equipment(self.equipment)
    }
}

/// Lower-case, hyphen-free, single-spaced text padded with spaces so that
/// `contains(" word ")` matches whole words only.
fn tokenize(text: &str) -> String {
    let words: Vec<String> = text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect();
    format!(" {} ", words.join(" "))
}

fn mentions(tokens: &str, phrase: &str) -> bool {
    // Also accept a trailing plural "s" on the last word ("curls", "squats").
    let needle = tokenize(phrase);
    tokens.contains(&needle) || tokens.contains(&format!("{}s ", needle.trim_end()))
}

/// Scan a free-text description for known phrases.
///
/// # Arguments
///
/// * `description` - Exercise description in any case.
///
/// # Returns
///
/// * The expected rules, the equipment mentioned, and the phrases that fired.
#[must_use]
pub fn parse_description(description: &str) -> ParsedDescription {
    let tokens = tokenize(description);
    let mut builder = RuleStructureBuilder::new();
    let mut fired: Vec<&'static str> = Vec::new();

    for entry in PHRASES {
        if !mentions(&tokens, entry.text) {
            continue;
        }
        if entry.requires.is_some_and(|req| !mentions(&tokens, req)) {
            continue;
        }
        for landmark in Landmark::RULE_KEYS {
            if landmark.body_part().is_some_and(|p| entry.parts.contains(&p)) {
                builder.extend(landmark, entry.category, entry.labels.iter().copied());
            }
        }
        if !fired.contains(&entry.text) {
            fired.push(entry.text);
        }
    }

    ParsedDescription {
        rules: builder.build(),
        equipment: equipment_from_text(description),
        phrases: fired,
    }
}

/// Expected reference for a catalog activity.
///
/// # Errors
///
/// Returns [`RuleError::UnknownActivity`] if the name is not in the catalog.
pub fn expected_for_activity(catalog: &Catalog, activity: &str) -> Result<ExerciseReference> {
    catalog.lookup(activity).cloned()
}

/// Expected reference from one structured record in catalog JSON shape.
/// Labels are trusted verbatim but must belong to the vocabulary.
///
/// # Errors
///
/// Returns [`RuleError::CatalogError`] for malformed records and
/// [`RuleError::EmptyActivityName`] for a blank activity.
pub fn expected_from_json(json: &str) -> Result<ExerciseReference> {
    let reference: ExerciseReference = serde_json::from_str(json)
        .map_err(|e| RuleError::CatalogError(format!("invalid reference record: {e}")))?;
    if reference.key().is_empty() {
        return Err(RuleError::EmptyActivityName);
    }
    Ok(reference)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has(parsed: &ParsedDescription, lm: Landmark, category: Category, label: Label) -> bool {
        parsed.rules.contains(lm, category, label)
    }

    #[test]
    fn test_kettlebell_close_to_chest() {
        let parsed = parse_description("Hold the kettlebell close to the chest and squat down.");
        for lm in [Landmark::LeftHand, Landmark::RightHand] {
            assert!(has(&parsed, lm, Position, Label::OverChest));
            assert!(has(&parsed, lm, Position, Label::HoldingEquipment));
        }
        assert!(has(&parsed, Landmark::LeftElbow, Position, Label::CloseToTorso));
        assert!(has(&parsed, Landmark::RightKnee, Motion, Label::Flexion));
        assert!(has(&parsed, Landmark::LeftHip, Motion, Label::Moving));
        assert!(parsed.equipment.contains("kettlebell"));
    }

    #[test]
    fn test_close_to_chest_requires_kettlebell() {
        let parsed = parse_description("Bring the bar close to the chest.");
        assert!(!has(&parsed, Landmark::LeftHand, Position, Label::OverChest));
    }

    #[test]
    fn test_word_boundaries() {
        let parsed = parse_description("Find a comfortable position, then arrow your gaze.");
        assert!(parsed.rules.is_empty());
        assert!(parsed.phrases.is_empty());
    }

    #[test]
    fn test_sparse_and_deduplicated() {
        let parsed = parse_description("Hinge at the hips. Keep a hip hinge with a flat back.");
        assert!(has(&parsed, Landmark::LeftHip, Position, Label::HipHinge));
        assert_eq!(parsed.rules.labels(Landmark::LeftHip, Position).len(), 1);
        assert!(has(&parsed, Landmark::Torso, Position, Label::NeutralSpine));
        assert!(parsed.rules.labels(Landmark::LeftKnee, Position).is_empty());
        assert_eq!(parsed.phrases, vec!["flat back", "hinge at the hips", "hip hinge"]);
    }

    #[test]
    fn test_plural_and_hyphen() {
        let parsed = parse_description("Dumbbell curls with feet shoulder-width apart");
        assert!(has(&parsed, Landmark::LeftElbow, Motion, Label::Extension));
        assert!(has(&parsed, Landmark::RightFoot, Position, Label::ShoulderWidthApart));
        assert!(parsed.rules.validate().is_ok());
    }

    #[test]
    fn test_phrase_table_labels_are_valid() {
        for entry in PHRASES {
            for part in entry.parts {
                for label in entry.labels {
                    assert!(label.is_allowed(*part, entry.category), "{}", entry.text);
                }
            }
        }
    }

    #[test]
    fn test_expected_for_activity() {
        let catalog = Catalog::builtin().unwrap();
        assert!(expected_for_activity(&catalog, "  dumbbell CURL ").is_ok());
        let err = expected_for_activity(&catalog, "Turkish get-up").unwrap_err();
        assert!(matches!(err, RuleError::UnknownActivity(_)));
    }

    #[test]
    fn test_expected_from_json() {
        let json = r#"{
            "activity": "Wall Sit",
            "body_landmarks": {"left_knee": {"position": ["bent at 90 degrees"]}},
            "equipment": {"type": []}
        }"#;
        let reference = expected_from_json(json).unwrap();
        assert!(reference.rules.contains(Landmark::LeftKnee, Position, Label::BentAt90));
        assert!(reference.equipment.is_empty());

        assert!(matches!(
            expected_from_json(r#"{"activity": " "}"#),
            Err(RuleError::EmptyActivityName)
        ));
        assert!(expected_from_json(r#"{"activity": "X", "body_landmarks": {"torso": {"position": ["on bench"]}}}"#).is_err());
    }

    #[test]
    fn test_into_reference() {
        let reference = parse_description("dumbbell front raise").into_reference("Front Raise");
        assert_eq!(reference.activity, "Front Raise");
        assert!(reference.equipment.contains("dumbbell"));
        assert!(!reference.mirrored);
    }
}
