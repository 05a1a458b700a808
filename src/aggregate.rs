// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Rule aggregation.
//!
//! Position labels of every frame and the motion labels of the whole
//! sequence are unioned into one observed [`RuleStructure`]. Frames are
//! classified in parallel; the motion pass runs after all of them.

use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::config::RuleConfig;
use crate::equipment::{EquipmentDetection, EquipmentRecord};
use crate::error::{Result, RuleError};
use crate::geometry::Point;
use crate::landmark::PoseSequence;
use crate::motion::classify_sequence;
use crate::position::{classify_frame, skipped_rules};
use crate::rules::{RuleStructure, RuleStructureBuilder};
use crate::source::Extraction;
use crate::verbose;

/// Everything observed in one video.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Observation {
    /// Observed position and motion labels.
    pub rules: RuleStructure,
    /// Majority-voted equipment.
    pub equipment: EquipmentRecord,
    /// Frames that contributed position labels.
    pub frames_used: usize,
    /// Frames dropped (no pose, or no torso baseline).
    pub frames_skipped: usize,
    /// Rule evaluations skipped in used frames (missing joints or
    /// coincident points).
    pub rules_skipped: usize,
}

/// Union of several rule fragments.
///
/// Order does not matter and merging a fragment twice changes nothing.
#[must_use]
pub fn merge<'a>(fragments: impl IntoIterator<Item = &'a RuleStructure>) -> RuleStructure {
    let mut builder = RuleStructureBuilder::new();
    for fragment in fragments {
        builder.absorb(fragment);
    }
    builder.build()
}

/// Confident equipment centroids of one frame.
fn centroids(detections: &[EquipmentDetection], min_confidence: f32) -> Vec<Point> {
    detections
        .iter()
        .filter(|d| d.confidence >= min_confidence)
        .filter_map(|d| d.center)
        .collect()
}

/// Derive the observed rules of a sequence.
///
/// # Arguments
///
/// * `sequence` - Frames with a detected pose, in order.
/// * `frame_equipment` - Equipment detections aligned with `sequence`; may
///   be shorter, missing entries count as no equipment.
/// * `equipment` - Video-level equipment record.
/// * `config` - Thresholds.
///
/// # Errors
///
/// Returns [`RuleError::CannotClassifyFrame`] when no frame has a torso
/// baseline. Individual unclassifiable frames are skipped and counted.
pub fn observe(
    sequence: &PoseSequence,
    frame_equipment: &[Vec<EquipmentDetection>],
    equipment: EquipmentRecord,
    config: &RuleConfig,
) -> Result<Observation> {
    let per_frame: Vec<Result<(RuleStructure, Vec<RuleError>)>> = sequence
        .frames()
        .par_iter()
        .enumerate()
        .map(|(i, frame)| {
            let points = frame_equipment
                .get(i)
                .map(|d| centroids(d, config.equipment_confidence))
                .unwrap_or_default();
            classify_frame(frame, &points, config).map(|rules| (rules, skipped_rules(frame)))
        })
        .collect();

    let mut builder = RuleStructureBuilder::new();
    let mut frames_used = 0;
    let mut frames_skipped = 0;
    let mut skipped: BTreeMap<String, usize> = BTreeMap::new();
    for (i, result) in per_frame.into_iter().enumerate() {
        match result {
            Ok((rules, diagnostics)) => {
                builder.absorb(&rules);
                frames_used += 1;
                for diagnostic in diagnostics {
                    *skipped.entry(diagnostic.to_string()).or_insert(0) += 1;
                }
            }
            Err(e) => {
                verbose!("Frame {i} skipped: {e}");
                frames_skipped += 1;
            }
        }
    }

    if frames_used == 0 {
        return Err(RuleError::CannotClassifyFrame(format!(
            "none of {} frames has a torso baseline",
            sequence.len()
        )));
    }

    for (diagnostic, frames) in &skipped {
        verbose!("{diagnostic} ({frames}/{frames_used} frames)");
    }

    builder.absorb(&classify_sequence(sequence, config));

    Ok(Observation {
        rules: builder.build(),
        equipment,
        frames_used,
        frames_skipped,
        rules_skipped: skipped.values().sum(),
    })
}

/// Derive the observed rules of an extraction.
///
/// Frames dropped during extraction are added to `frames_skipped`.
///
/// # Errors
///
/// See [`observe`].
pub fn observe_extraction(extraction: &Extraction, config: &RuleConfig) -> Result<Observation> {
    let mut observation = observe(
        &extraction.sequence,
        &extraction.frame_equipment,
        extraction.equipment.clone(),
        config,
    )?;
    observation.frames_skipped += extraction.frames_skipped;
    Ok(observation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::{Category, Label};
    use crate::landmark::{JointFrame, Landmark};

    fn standing(hand_y: f32) -> JointFrame {
        JointFrame::new()
            .with(Landmark::LeftShoulder, Point::new(0.4, 0.3))
            .with(Landmark::RightShoulder, Point::new(0.6, 0.3))
            .with(Landmark::LeftHip, Point::new(0.42, 0.6))
            .with(Landmark::RightHip, Point::new(0.58, 0.6))
            .with(Landmark::LeftElbow, Point::new(0.4, 0.45))
            .with(Landmark::LeftHand, Point::new(0.4, hand_y))
    }

    #[test]
    fn test_merge_idempotent() {
        let a = RuleStructureBuilder::new()
            .with(Landmark::Torso, Category::Position, Label::Upright)
            .build();
        let b = RuleStructureBuilder::new()
            .with(Landmark::LeftKnee, Category::Motion, Label::Flexion)
            .with(Landmark::Torso, Category::Position, Label::Upright)
            .build();
        let once = merge([&a, &b]);
        let twice = merge([&once, &a, &b]);
        assert_eq!(once, twice);
        assert_eq!(merge([&b, &a]), once);
        assert_eq!(once.label_count(), 2);
    }

    #[test]
    fn test_observe_unions_frames() {
        let seq = PoseSequence::new(vec![standing(0.6), standing(0.2)]);
        let obs = observe(&seq, &[], EquipmentRecord::default(), &RuleConfig::default()).unwrap();
        assert_eq!(obs.frames_used, 2);
        assert!(obs.rules.contains(Landmark::Torso, Category::Position, Label::Upright));
        assert!(obs.rules.contains(Landmark::LeftHand, Category::Position, Label::VerticalDownward));
        assert!(obs.rules.contains(Landmark::LeftHand, Category::Position, Label::VerticalUpward));
        assert!(obs.rules.contains(Landmark::LeftHand, Category::Motion, Label::VerticalUpward));
        assert!(obs.rules.contains(Landmark::Torso, Category::Motion, Label::Stationary));
    }

    #[test]
    fn test_observe_skips_frames_without_torso() {
        let headless = JointFrame::new().with(Landmark::LeftKnee, Point::new(0.4, 0.8));
        let seq = PoseSequence::new(vec![standing(0.6), headless]);
        let obs = observe(&seq, &[], EquipmentRecord::default(), &RuleConfig::default()).unwrap();
        assert_eq!(obs.frames_used, 1);
        assert_eq!(obs.frames_skipped, 1);

        let seq = PoseSequence::new(vec![JointFrame::new().with(Landmark::LeftKnee, Point::new(0.4, 0.8))]);
        let err = observe(&seq, &[], EquipmentRecord::default(), &RuleConfig::default()).unwrap_err();
        assert!(matches!(err, RuleError::CannotClassifyFrame(_)));
    }

    #[test]
    fn test_observe_counts_skipped_rules() {
        // Right arm and both legs are missing in every frame.
        let per_frame = skipped_rules(&standing(0.6)).len();
        assert_eq!(per_frame, 8);

        // Left hand on the elbow: the elbow angle is undefined.
        let folded = standing(0.45);
        assert!(
            skipped_rules(&folded)
                .iter()
                .any(|e| matches!(e, RuleError::DegenerateGeometry(_)))
        );

        let seq = PoseSequence::new(vec![standing(0.6), folded]);
        let obs = observe(&seq, &[], EquipmentRecord::default(), &RuleConfig::default()).unwrap();
        assert_eq!(obs.frames_used, 2);
        assert_eq!(obs.rules_skipped, per_frame * 2 + 1);
    }

    #[test]
    fn test_observe_holding_equipment() {
        let seq = PoseSequence::new(vec![standing(0.6)]);
        let detections = vec![vec![
            EquipmentDetection::new("dumbbell", 0.9).with_center(Point::new(0.41, 0.62)),
        ]];
        let obs = observe(&seq, &detections, EquipmentRecord::new(["dumbbell"]), &RuleConfig::default())
            .unwrap();
        assert!(obs.rules.contains(Landmark::LeftHand, Category::Position, Label::HoldingEquipment));
        assert!(obs.equipment.contains("dumbbell"));

        let weak = vec![vec![
            EquipmentDetection::new("dumbbell", 0.2).with_center(Point::new(0.41, 0.62)),
        ]];
        let obs = observe(&seq, &weak, EquipmentRecord::default(), &RuleConfig::default()).unwrap();
        assert!(!obs.rules.contains(Landmark::LeftHand, Category::Position, Label::HoldingEquipment));
    }
}
