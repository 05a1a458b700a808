// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Cross-frame motion classifier.
//!
//! Two tests, each authoritative for its own body parts:
//!
//! - Elbows, hands, knees and feet use a pairwise window over consecutive
//!   frames ([`classify_pair`]), aggregated over the whole sequence.
//! - Torso, hips and shoulders use a whole-sequence stationarity test
//!   ([`body_motion`]): "stationary" only if the point never moved.
//!
//! Image `y` grows downwards: a growing `y` means the joint moved down.

use crate::config::RuleConfig;
use crate::geometry::Point;
use crate::label::{Category, Label};
use crate::landmark::{BodyPart, JointFrame, JointKind, Landmark, PoseSequence};
use crate::rules::{RuleStructure, RuleStructureBuilder};

/// Direction of a scalar between two frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    /// Value grew by more than the tolerance.
    Increasing,
    /// Value shrank by more than the tolerance.
    Decreasing,
    /// Change within the tolerance.
    Steady,
}

impl Trend {
    /// Classify the change from `prev` to `cur`.
    #[must_use]
    pub fn between(prev: f32, cur: f32, tolerance: f32) -> Self {
        let delta = cur - prev;
        if delta > tolerance {
            Self::Increasing
        } else if delta < -tolerance {
            Self::Decreasing
        } else {
            Self::Steady
        }
    }
}

/// Pairwise motion rule for one landmark.
pub type MotionRule = fn(&JointFrame, &JointFrame, Landmark, &RuleConfig) -> Vec<Label>;

/// Pairwise rules per body part.
pub const MOTION_RULES: [(BodyPart, MotionRule); 4] = [
    (BodyPart::Elbow, joint_motion),
    (BodyPart::Knee, joint_motion),
    (BodyPart::Hand, hand_motion),
    (BodyPart::Foot, foot_motion),
];

/// Body parts judged by the whole-sequence test.
pub const WHOLE_SEQUENCE_PARTS: [BodyPart; 3] = [BodyPart::Torso, BodyPart::Hip, BodyPart::Shoulder];

fn pairwise_rule(part: BodyPart) -> Option<MotionRule> {
    MOTION_RULES
        .iter()
        .find(|(p, _)| *p == part)
        .map(|(_, rule)| *rule)
}

/// Motion labels between two consecutive frames.
///
/// Only landmarks with a pairwise rule are filled; torso, hips and shoulders
/// stay empty here.
#[must_use]
pub fn classify_pair(prev: &JointFrame, cur: &JointFrame, config: &RuleConfig) -> RuleStructure {
    let mut builder = RuleStructureBuilder::new();
    for landmark in Landmark::RULE_KEYS {
        if let Some(rule) = landmark.body_part().and_then(pairwise_rule) {
            builder.extend(landmark, Category::Motion, rule(prev, cur, landmark, config));
        }
    }
    builder.build()
}

/// Motion labels of a whole sequence.
///
/// The union of [`classify_pair`] over every consecutive pair, plus the
/// whole-sequence result for torso, hips and shoulders.
#[must_use]
pub fn classify_sequence(sequence: &PoseSequence, config: &RuleConfig) -> RuleStructure {
    let mut builder = RuleStructureBuilder::new();

    for (prev, cur) in sequence.windows() {
        builder.absorb(&classify_pair(prev, cur, config));
    }

    for landmark in Landmark::RULE_KEYS {
        if landmark
            .body_part()
            .is_some_and(|part| WHOLE_SEQUENCE_PARTS.contains(&part))
            && let Some(label) = body_motion(sequence, landmark, config)
        {
            builder.insert(landmark, Category::Motion, label);
        }
    }

    builder.build()
}

/// Whole-sequence stationarity of one landmark.
///
/// # Returns
///
/// * `None` when the landmark appears in fewer than two frames.
/// * `Some(Label::Stationary)` when every sample stays within the tolerance of
///   the first one, otherwise `Some(Label::Moving)`.
#[must_use]
pub fn body_motion(sequence: &PoseSequence, landmark: Landmark, config: &RuleConfig) -> Option<Label> {
    let mut samples = sequence.frames().iter().filter_map(|f| f.get(landmark));
    let first = samples.next()?;
    let tol = config.stationary_tolerance;

    let mut seen = 1usize;
    let mut moved = false;
    for point in samples {
        seen += 1;
        if (point.x - first.x).abs() > tol || (point.y - first.y).abs() > tol {
            moved = true;
        }
    }

    if seen < 2 {
        None
    } else if moved {
        Some(Label::Moving)
    } else {
        Some(Label::Stationary)
    }
}

fn both(prev: &JointFrame, cur: &JointFrame, pick: impl Fn(&JointFrame) -> Option<Point>) -> Option<(Point, Point)> {
    Some((pick(prev)?, pick(cur)?))
}

/// Elbow or knee: moving down opens the joint, moving up closes it.
pub fn joint_motion(prev: &JointFrame, cur: &JointFrame, landmark: Landmark, config: &RuleConfig) -> Vec<Label> {
    let Some((p, c)) = both(prev, cur, |f| f.get(landmark)) else {
        return Vec::new();
    };
    let label = match Trend::between(p.y, c.y, config.stationary_tolerance) {
        Trend::Increasing => Label::Extension,
        Trend::Decreasing => Label::Flexion,
        Trend::Steady => Label::Stationary,
    };
    vec![label]
}

fn vertical(p: Point, c: Point, tolerance: f32) -> Option<Label> {
    match Trend::between(p.y, c.y, tolerance) {
        Trend::Increasing => Some(Label::VerticalDownward),
        Trend::Decreasing => Some(Label::VerticalUpward),
        Trend::Steady => None,
    }
}

/// Hand: vertical travel plus horizontal reach relative to the shoulder.
pub fn hand_motion(prev: &JointFrame, cur: &JointFrame, landmark: Landmark, config: &RuleConfig) -> Vec<Label> {
    let Some(side) = landmark.side() else {
        return Vec::new();
    };
    let Some((p, c)) = both(prev, cur, |f| f.hand(side)) else {
        return Vec::new();
    };
    let tol = config.stationary_tolerance;

    let mut labels: Vec<Label> = vertical(p, c, tol).into_iter().collect();

    let reach = |frame: &JointFrame, hand: Point| {
        frame
            .joint(side, JointKind::Shoulder)
            .map(|shoulder| (hand.x - shoulder.x).abs())
    };
    if let (Some(before), Some(after)) = (reach(prev, p), reach(cur, c)) {
        match Trend::between(before, after, tol) {
            Trend::Increasing => labels.push(Label::HorizontalOutward),
            Trend::Decreasing => labels.push(Label::HorizontalInward),
            Trend::Steady => {}
        }
    }

    if labels.is_empty() {
        labels.push(Label::Stationary);
    }
    labels
}

/// Foot: vertical travel only.
pub fn foot_motion(prev: &JointFrame, cur: &JointFrame, landmark: Landmark, config: &RuleConfig) -> Vec<Label> {
    let Some(side) = landmark.side() else {
        return Vec::new();
    };
    let Some((p, c)) = both(prev, cur, |f| f.foot(side)) else {
        return Vec::new();
    };
    vec![vertical(p, c, config.stationary_tolerance).unwrap_or(Label::Stationary)]
}
