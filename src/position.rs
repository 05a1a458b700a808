// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Per-frame position classifier.
//!
//! [`classify_frame`] maps one [`JointFrame`] to position labels. The torso
//! baseline (both shoulders and both hips) is a hard precondition; every
//! other rule is skipped when its joints are missing.
//!
//! Image `y` grows downwards, so "above" means a smaller `y`.

use crate::config::RuleConfig;
use crate::error::{Result, RuleError};
use crate::geometry::{Point, distance, interior_angle};
use crate::label::{Category, Label};
use crate::landmark::{BodyPart, JointFrame, JointKind, Landmark, Side};
use crate::rules::{RuleStructure, RuleStructureBuilder};

/// Inputs shared by every body-part classifier for one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameContext<'a> {
    /// Frame being classified.
    pub frame: &'a JointFrame,
    /// Midpoint of both shoulders.
    pub shoulder_center: Point,
    /// Midpoint of both hips.
    pub hip_center: Point,
    /// Torso point (reported or synthetic).
    pub torso: Point,
    /// Equipment centroids detected in the same frame.
    pub equipment: &'a [Point],
    /// Thresholds.
    pub config: &'a RuleConfig,
}

impl<'a> FrameContext<'a> {
    /// Compute the torso baseline of a frame.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::CannotClassifyFrame`] when a shoulder or hip is
    /// missing.
    pub fn new(frame: &'a JointFrame, equipment: &'a [Point], config: &'a RuleConfig) -> Result<Self> {
        let required = [
            Landmark::LeftShoulder,
            Landmark::RightShoulder,
            Landmark::LeftHip,
            Landmark::RightHip,
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|lm| frame.get(**lm).is_none())
            .map(Landmark::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(RuleError::CannotClassifyFrame(format!(
                "torso baseline needs {}",
                missing.join(", ")
            )));
        }

        let (Some(shoulder_center), Some(hip_center), Some(torso)) = (
            frame.shoulder_center(),
            frame.hip_center(),
            frame.get(Landmark::Torso),
        ) else {
            return Err(RuleError::CannotClassifyFrame(
                "torso baseline unavailable".to_string(),
            ));
        };

        Ok(Self {
            frame,
            shoulder_center,
            hip_center,
            torso,
            equipment,
            config,
        })
    }
}

/// Position classifier for one rule landmark.
pub type PositionRule = fn(&FrameContext<'_>, Landmark) -> Vec<Label>;

/// Classifier per body part. Shoulders carry no position rules.
pub const POSITION_RULES: [(BodyPart, PositionRule); 6] = [
    (BodyPart::Torso, torso_position),
    (BodyPart::Hip, hip_position),
    (BodyPart::Hand, hand_position),
    (BodyPart::Elbow, elbow_position),
    (BodyPart::Knee, knee_position),
    (BodyPart::Foot, foot_position),
];

/// Look up the classifier of a body part.
#[must_use]
pub fn rule_for(part: BodyPart) -> Option<PositionRule> {
    POSITION_RULES
        .iter()
        .find(|(p, _)| *p == part)
        .map(|(_, rule)| *rule)
}

/// Classify the position of every rule landmark in one frame.
///
/// # Arguments
///
/// * `frame` - Joint coordinates of the frame.
/// * `equipment` - Equipment centroids detected in the same frame.
/// * `config` - Thresholds, calibrated for the frame's coordinate domain.
///
/// # Errors
///
/// Returns [`RuleError::CannotClassifyFrame`] if the torso baseline is missing.
pub fn classify_frame(
    frame: &JointFrame,
    equipment: &[Point],
    config: &RuleConfig,
) -> Result<RuleStructure> {
    let ctx = FrameContext::new(frame, equipment, config)?;
    let mut builder = RuleStructureBuilder::new();

    for landmark in Landmark::RULE_KEYS {
        let Some(rule) = landmark.body_part().and_then(rule_for) else {
            continue;
        };
        builder.extend(landmark, Category::Position, rule(&ctx, landmark));
    }

    Ok(builder.build())
}

/// Rules of one frame that could not run.
///
/// One [`RuleError::MissingJointData`] per rule landmark with absent joints,
/// and one [`RuleError::DegenerateGeometry`] per joint angle taken over
/// coincident points. An elbow without a hand still gets its tuck label but
/// is reported here for the skipped angle.
#[must_use]
pub fn skipped_rules(frame: &JointFrame) -> Vec<RuleError> {
    Landmark::RULE_KEYS
        .into_iter()
        .filter_map(|landmark| skipped_rule(frame, landmark))
        .collect()
}

fn skipped_rule(frame: &JointFrame, landmark: Landmark) -> Option<RuleError> {
    let side = landmark.side()?;
    let joint = |kind| frame.joint(side, kind);
    let (inputs, angled) = match landmark.body_part()? {
        BodyPart::Hip => (
            vec![
                ("shoulder", joint(JointKind::Shoulder)),
                ("hip", joint(JointKind::Hip)),
                ("knee", joint(JointKind::Knee)),
            ],
            true,
        ),
        BodyPart::Elbow => (
            vec![
                ("shoulder", joint(JointKind::Shoulder)),
                ("elbow", joint(JointKind::Elbow)),
                ("hand", frame.hand(side)),
            ],
            true,
        ),
        BodyPart::Knee => (
            vec![
                ("hip", joint(JointKind::Hip)),
                ("knee", joint(JointKind::Knee)),
                ("foot", frame.foot(side)),
            ],
            true,
        ),
        BodyPart::Hand => (
            vec![("hand", frame.hand(side)), ("shoulder", joint(JointKind::Shoulder))],
            false,
        ),
        BodyPart::Foot => (
            vec![
                ("left foot", frame.foot(Side::Left)),
                ("right foot", frame.foot(Side::Right)),
            ],
            false,
        ),
        BodyPart::Torso | BodyPart::Shoulder => return None,
    };

    let missing: Vec<&str> = inputs
        .iter()
        .filter(|(_, point)| point.is_none())
        .map(|(name, _)| *name)
        .collect();
    if !missing.is_empty() {
        return Some(RuleError::MissingJointData(format!(
            "{landmark} needs {}",
            missing.join(", ")
        )));
    }
    if angled
        && let [(_, Some(a)), (_, Some(b)), (_, Some(c))] = inputs.as_slice()
        && interior_angle(*a, *b, *c).is_none()
    {
        return Some(RuleError::DegenerateGeometry(format!(
            "{landmark} angle over coincident points"
        )));
    }
    None
}

/// Torso posture from the shoulder and hip centers.
pub fn torso_position(ctx: &FrameContext<'_>, _landmark: Landmark) -> Vec<Label> {
    let cfg = ctx.config;
    let (shoulder, hip) = (ctx.shoulder_center, ctx.hip_center);
    let mut labels = Vec::new();

    if (shoulder.y - hip.y).abs() > cfg.upright {
        labels.push(Label::Upright);
    }
    if (shoulder.x - hip.x).abs() < cfg.neutral_spine {
        labels.push(Label::NeutralSpine);
    }
    if shoulder.x > hip.x + cfg.lean {
        labels.push(Label::LeaningForward);
    }
    if shoulder.x < hip.x - cfg.lean {
        labels.push(Label::LeaningBackward);
    }
    labels
}

/// Hip hinge and seated posture for one side.
pub fn hip_position(ctx: &FrameContext<'_>, landmark: Landmark) -> Vec<Label> {
    let Some(side) = landmark.side() else {
        return Vec::new();
    };
    let frame = ctx.frame;
    let cfg = ctx.config;
    let (Some(shoulder), Some(hip), Some(knee)) = (
        frame.joint(side, JointKind::Shoulder),
        frame.joint(side, JointKind::Hip),
        frame.joint(side, JointKind::Knee),
    ) else {
        return Vec::new();
    };

    let mut labels = Vec::new();
    let thigh_horizontal = (hip.y - knee.y).abs() < cfg.close;

    if let Some(fold) = interior_angle(shoulder, hip, knee)
        && fold < 180.0 - cfg.hip_hinge_angle
        && !thigh_horizontal
    {
        labels.push(Label::HipHinge);
    }
    if thigh_horizontal && frame.foot(side).is_some_and(|foot| hip.y < foot.y) {
        labels.push(Label::Seated);
    }
    labels
}

/// Hand height, reach and grip for one side.
pub fn hand_position(ctx: &FrameContext<'_>, landmark: Landmark) -> Vec<Label> {
    let Some(side) = landmark.side() else {
        return Vec::new();
    };
    let cfg = ctx.config;
    let (Some(hand), Some(shoulder)) = (ctx.frame.hand(side), ctx.frame.joint(side, JointKind::Shoulder))
    else {
        return Vec::new();
    };

    let mut labels = Vec::new();

    if hand.y < shoulder.y {
        labels.push(Label::VerticalUpward);
    } else if hand.y > shoulder.y {
        labels.push(Label::VerticalDownward);
    }

    let reach = (hand.x - shoulder.x).abs();
    if reach > cfg.outward {
        labels.push(Label::HorizontalOutward);
    } else if reach < cfg.inward {
        labels.push(Label::HorizontalInward);
    }

    let shoulder_line = ctx.shoulder_center.y;
    if hand.y < shoulder_line - cfg.close {
        labels.push(Label::OverHead);
    } else if hand.y <= ctx.torso.y + cfg.close {
        labels.push(Label::OverChest);
    }

    if ctx
        .equipment
        .iter()
        .any(|item| distance(hand, *item) <= cfg.hold_distance)
    {
        labels.push(Label::HoldingEquipment);
    }
    labels
}

/// Three-way bucket of a joint angle: flexed, then the 90-degree band, else
/// `otherwise`.
fn bucket(angle: f32, cfg: &RuleConfig, otherwise: Label) -> Label {
    if angle < cfg.flexed_angle {
        Label::Flexed
    } else if (angle - cfg.flexed_angle).abs() < cfg.bent_range {
        Label::BentAt90
    } else {
        otherwise
    }
}

/// Elbow bend and tuck for one side.
pub fn elbow_position(ctx: &FrameContext<'_>, landmark: Landmark) -> Vec<Label> {
    let Some(side) = landmark.side() else {
        return Vec::new();
    };
    let frame = ctx.frame;
    let cfg = ctx.config;
    let Some(elbow) = frame.joint(side, JointKind::Elbow) else {
        return Vec::new();
    };

    let mut labels = Vec::new();
    if let (Some(shoulder), Some(hand)) = (frame.joint(side, JointKind::Shoulder), frame.hand(side))
        && let Some(angle) = interior_angle(shoulder, elbow, hand)
    {
        labels.push(bucket(angle, cfg, Label::Extended));
    }
    if (elbow.x - ctx.torso.x).abs() < cfg.close {
        labels.push(Label::CloseToTorso);
    }
    labels
}

/// Knee bend and leg extension for one side.
pub fn knee_position(ctx: &FrameContext<'_>, landmark: Landmark) -> Vec<Label> {
    let Some(side) = landmark.side() else {
        return Vec::new();
    };
    let frame = ctx.frame;
    let cfg = ctx.config;
    let (Some(hip), Some(knee), Some(foot)) = (
        frame.joint(side, JointKind::Hip),
        frame.joint(side, JointKind::Knee),
        frame.foot(side),
    ) else {
        return Vec::new();
    };
    let Some(angle) = interior_angle(hip, knee, foot) else {
        return Vec::new();
    };

    let mut labels = vec![bucket(angle, cfg, Label::Bent)];
    if (180.0 - angle).abs() < cfg.straight_angle {
        labels.push(Label::Extended);
    }
    labels
}

/// Stance labels. These need both feet, so both foot landmarks get the same
/// labels.
pub fn foot_position(ctx: &FrameContext<'_>, _landmark: Landmark) -> Vec<Label> {
    let frame = ctx.frame;
    let cfg = ctx.config;
    let (Some(left), Some(right)) = (frame.foot(Side::Left), frame.foot(Side::Right)) else {
        return Vec::new();
    };

    let mut labels = vec![Label::OnGround];
    if (left.y - right.y).abs() < cfg.flat {
        labels.push(Label::Flat);
    }

    if let (Some(ls), Some(rs)) = (
        frame.get(Landmark::LeftShoulder),
        frame.get(Landmark::RightShoulder),
    ) {
        let shoulders = (ls.x - rs.x).abs();
        if shoulders > 0.0 {
            let ratio = (left.x - right.x).abs() / shoulders;
            if (cfg.shoulder_width_min..=cfg.shoulder_width_max).contains(&ratio) {
                labels.push(Label::ShoulderWidthApart);
            }
        }
    }
    labels
}
