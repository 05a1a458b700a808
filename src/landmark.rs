// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Landmark schema.
//!
//! This module defines the fixed vocabulary of tracked body points, the
//! [`Side`]/[`JointKind`] lookup that replaces stringly-typed joint access,
//! and the per-frame [`JointFrame`] and per-video [`PoseSequence`] containers.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Body side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
    /// Subject's left.
    Left,
    /// Subject's right.
    Right,
}

impl Side {
    /// Both sides, left first.
    pub const BOTH: [Self; 2] = [Self::Left, Self::Right];

    /// The opposite side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// Kind of a sided joint, independent of the side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JointKind {
    /// Shoulder joint.
    Shoulder,
    /// Elbow joint.
    Elbow,
    /// Wrist joint.
    Wrist,
    /// Hand (index fingertip).
    Hand,
    /// Hip joint.
    Hip,
    /// Knee joint.
    Knee,
    /// Ankle joint.
    Ankle,
    /// Foot (heel).
    Foot,
}

/// Closed set of body parts that own classification rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BodyPart {
    /// Synthetic torso point.
    Torso,
    /// Shoulders.
    Shoulder,
    /// Hips.
    Hip,
    /// Elbows.
    Elbow,
    /// Hands.
    Hand,
    /// Knees.
    Knee,
    /// Feet.
    Foot,
}

/// Tracked body landmark.
///
/// `Torso` is synthetic: it is the mean of both shoulders and both hips
/// unless a source reports it directly.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[repr(usize)]
pub enum Landmark {
    /// Synthetic torso center.
    Torso = 0,
    /// Left shoulder.
    LeftShoulder = 1,
    /// Right shoulder.
    RightShoulder = 2,
    /// Left elbow.
    LeftElbow = 3,
    /// Right elbow.
    RightElbow = 4,
    /// Left wrist.
    LeftWrist = 5,
    /// Right wrist.
    RightWrist = 6,
    /// Left hand (index fingertip).
    LeftHand = 7,
    /// Right hand (index fingertip).
    RightHand = 8,
    /// Left hip.
    LeftHip = 9,
    /// Right hip.
    RightHip = 10,
    /// Left knee.
    LeftKnee = 11,
    /// Right knee.
    RightKnee = 12,
    /// Left ankle.
    LeftAnkle = 13,
    /// Right ankle.
    RightAnkle = 14,
    /// Left foot (heel).
    LeftFoot = 15,
    /// Right foot (heel).
    RightFoot = 16,
}

impl Landmark {
    /// Number of landmarks in the vocabulary.
    pub const COUNT: usize = 17;

    /// Every landmark in index order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Torso,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftHand,
        Self::RightHand,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
        Self::LeftFoot,
        Self::RightFoot,
    ];

    /// Landmarks that carry position/motion rules. Every rule structure is
    /// keyed by exactly this set.
    pub const RULE_KEYS: [Self; 13] = [
        Self::Torso,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftHand,
        Self::RightHand,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftFoot,
        Self::RightFoot,
    ];

    /// Look up a sided joint.
    #[must_use]
    pub const fn joint(side: Side, kind: JointKind) -> Self {
        match (side, kind) {
            (Side::Left, JointKind::Shoulder) => Self::LeftShoulder,
            (Side::Right, JointKind::Shoulder) => Self::RightShoulder,
            (Side::Left, JointKind::Elbow) => Self::LeftElbow,
            (Side::Right, JointKind::Elbow) => Self::RightElbow,
            (Side::Left, JointKind::Wrist) => Self::LeftWrist,
            (Side::Right, JointKind::Wrist) => Self::RightWrist,
            (Side::Left, JointKind::Hand) => Self::LeftHand,
            (Side::Right, JointKind::Hand) => Self::RightHand,
            (Side::Left, JointKind::Hip) => Self::LeftHip,
            (Side::Right, JointKind::Hip) => Self::RightHip,
            (Side::Left, JointKind::Knee) => Self::LeftKnee,
            (Side::Right, JointKind::Knee) => Self::RightKnee,
            (Side::Left, JointKind::Ankle) => Self::LeftAnkle,
            (Side::Right, JointKind::Ankle) => Self::RightAnkle,
            (Side::Left, JointKind::Foot) => Self::LeftFoot,
            (Side::Right, JointKind::Foot) => Self::RightFoot,
        }
    }

    /// Landmark index in [`Self::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Side of the landmark, `None` for the torso.
    #[must_use]
    pub const fn side(self) -> Option<Side> {
        match self {
            Self::Torso => None,
            Self::LeftShoulder
            | Self::LeftElbow
            | Self::LeftWrist
            | Self::LeftHand
            | Self::LeftHip
            | Self::LeftKnee
            | Self::LeftAnkle
            | Self::LeftFoot => Some(Side::Left),
            _ => Some(Side::Right),
        }
    }

    /// Body part whose rules apply to this landmark. Wrists and ankles are
    /// tracked but own no rules.
    #[must_use]
    pub const fn body_part(self) -> Option<BodyPart> {
        match self {
            Self::Torso => Some(BodyPart::Torso),
            Self::LeftShoulder | Self::RightShoulder => Some(BodyPart::Shoulder),
            Self::LeftHip | Self::RightHip => Some(BodyPart::Hip),
            Self::LeftElbow | Self::RightElbow => Some(BodyPart::Elbow),
            Self::LeftHand | Self::RightHand => Some(BodyPart::Hand),
            Self::LeftKnee | Self::RightKnee => Some(BodyPart::Knee),
            Self::LeftFoot | Self::RightFoot => Some(BodyPart::Foot),
            Self::LeftWrist | Self::RightWrist | Self::LeftAnkle | Self::RightAnkle => None,
        }
    }

    /// The same joint on the other side; the torso maps to itself.
    #[must_use]
    pub const fn mirrored(self) -> Self {
        match self {
            Self::Torso => Self::Torso,
            Self::LeftShoulder => Self::RightShoulder,
            Self::RightShoulder => Self::LeftShoulder,
            Self::LeftElbow => Self::RightElbow,
            Self::RightElbow => Self::LeftElbow,
            Self::LeftWrist => Self::RightWrist,
            Self::RightWrist => Self::LeftWrist,
            Self::LeftHand => Self::RightHand,
            Self::RightHand => Self::LeftHand,
            Self::LeftHip => Self::RightHip,
            Self::RightHip => Self::LeftHip,
            Self::LeftKnee => Self::RightKnee,
            Self::RightKnee => Self::LeftKnee,
            Self::LeftAnkle => Self::RightAnkle,
            Self::RightAnkle => Self::LeftAnkle,
            Self::LeftFoot => Self::RightFoot,
            Self::RightFoot => Self::LeftFoot,
        }
    }

    /// Snake-case name used in JSON and reports.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Torso => "torso",
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftElbow => "left_elbow",
            Self::RightElbow => "right_elbow",
            Self::LeftWrist => "left_wrist",
            Self::RightWrist => "right_wrist",
            Self::LeftHand => "left_hand",
            Self::RightHand => "right_hand",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
            Self::LeftAnkle => "left_ankle",
            Self::RightAnkle => "right_ankle",
            Self::LeftFoot => "left_foot",
            Self::RightFoot => "right_foot",
        }
    }
}

impl fmt::Display for Landmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Landmark {
    type Err = LandmarkParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace([' ', '-'], "_");
        Self::ALL
            .into_iter()
            .find(|lm| lm.as_str() == key)
            .ok_or_else(|| LandmarkParseError(s.to_string()))
    }
}

/// Error returned when parsing an unknown landmark name.
#[derive(Debug, Clone)]
pub struct LandmarkParseError(String);

impl fmt::Display for LandmarkParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown landmark '{}'", self.0)
    }
}

impl std::error::Error for LandmarkParseError {}

/// Joint coordinates for exactly one video frame.
///
/// Absent landmarks are `None`, never `(0, 0)`. Non-finite coordinates are
/// dropped on insertion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<Landmark, Point>", into = "BTreeMap<Landmark, Point>")]
pub struct JointFrame {
    points: [Option<Point>; Landmark::COUNT],
}

impl JointFrame {
    /// Create an empty frame.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion.
    #[must_use]
    pub fn with(mut self, landmark: Landmark, point: Point) -> Self {
        self.set(landmark, point);
        self
    }

    /// Set a landmark coordinate; non-finite points are treated as absent.
    pub fn set(&mut self, landmark: Landmark, point: Point) {
        self.points[landmark.index()] = point.is_finite().then_some(point);
    }

    /// Raw stored coordinate, without synthesizing the torso.
    #[must_use]
    pub fn raw(&self, landmark: Landmark) -> Option<Point> {
        self.points[landmark.index()]
    }

    /// Coordinate of a landmark. The torso falls back to the mean of both
    /// shoulders and both hips.
    #[must_use]
    pub fn get(&self, landmark: Landmark) -> Option<Point> {
        match landmark {
            Landmark::Torso => self.raw(Landmark::Torso).or_else(|| self.synthetic_torso()),
            _ => self.raw(landmark),
        }
    }

    /// Coordinate of a sided joint.
    #[must_use]
    pub fn joint(&self, side: Side, kind: JointKind) -> Option<Point> {
        self.get(Landmark::joint(side, kind))
    }

    /// Hand coordinate, falling back to the wrist.
    #[must_use]
    pub fn hand(&self, side: Side) -> Option<Point> {
        self.joint(side, JointKind::Hand)
            .or_else(|| self.joint(side, JointKind::Wrist))
    }

    /// Foot coordinate, falling back to the ankle.
    #[must_use]
    pub fn foot(&self, side: Side) -> Option<Point> {
        self.joint(side, JointKind::Foot)
            .or_else(|| self.joint(side, JointKind::Ankle))
    }

    /// Midpoint of both shoulders.
    #[must_use]
    pub fn shoulder_center(&self) -> Option<Point> {
        Some(self.get(Landmark::LeftShoulder)?.midpoint(&self.get(Landmark::RightShoulder)?))
    }

    /// Midpoint of both hips.
    #[must_use]
    pub fn hip_center(&self) -> Option<Point> {
        Some(self.get(Landmark::LeftHip)?.midpoint(&self.get(Landmark::RightHip)?))
    }

    fn synthetic_torso(&self) -> Option<Point> {
        Some(self.shoulder_center()?.midpoint(&self.hip_center()?))
    }

    /// Number of landmarks present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.iter().flatten().count()
    }

    /// Whether no landmark is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<BTreeMap<Landmark, Point>> for JointFrame {
    fn from(map: BTreeMap<Landmark, Point>) -> Self {
        map.into_iter()
            .fold(Self::new(), |frame, (lm, point)| frame.with(lm, point))
    }
}

impl From<JointFrame> for BTreeMap<Landmark, Point> {
    fn from(frame: JointFrame) -> Self {
        Landmark::ALL
            .into_iter()
            .filter_map(|lm| frame.raw(lm).map(|p| (lm, p)))
            .collect()
    }
}

/// Ordered joint frames of one video, frames without a detected pose already
/// removed. Immutable after construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoseSequence {
    frames: Vec<JointFrame>,
}

impl PoseSequence {
    /// Create a sequence from frames in time order.
    #[must_use]
    pub fn new(frames: Vec<JointFrame>) -> Self {
        Self { frames }
    }

    /// Frames in time order.
    #[must_use]
    pub fn frames(&self) -> &[JointFrame] {
        &self.frames
    }

    /// Number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether the sequence holds no frames.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Consecutive `(previous, current)` frame pairs.
    pub fn windows(&self) -> impl Iterator<Item = (&JointFrame, &JointFrame)> {
        self.frames.windows(2).map(|w| (&w[0], &w[1]))
    }
}

impl FromIterator<JointFrame> for PoseSequence {
    fn from_iter<I: IntoIterator<Item = JointFrame>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landmark_count() {
        assert_eq!(Landmark::ALL.len(), Landmark::COUNT);
        for (i, lm) in Landmark::ALL.iter().enumerate() {
            assert_eq!(lm.index(), i);
        }
    }

    #[test]
    fn test_landmark_from_str() {
        assert_eq!("left_elbow".parse::<Landmark>().unwrap(), Landmark::LeftElbow);
        assert_eq!("Right Hand".parse::<Landmark>().unwrap(), Landmark::RightHand);
        assert_eq!("torso".parse::<Landmark>().unwrap(), Landmark::Torso);
        assert!("nose".parse::<Landmark>().is_err());
    }

    #[test]
    fn test_joint_lookup() {
        assert_eq!(Landmark::joint(Side::Left, JointKind::Knee), Landmark::LeftKnee);
        assert_eq!(Landmark::joint(Side::Right, JointKind::Foot), Landmark::RightFoot);
        assert_eq!(Landmark::LeftKnee.side(), Some(Side::Left));
        assert_eq!(Landmark::Torso.side(), None);
    }

    #[test]
    fn test_mirrored_is_involution() {
        for lm in Landmark::ALL {
            assert_eq!(lm.mirrored().mirrored(), lm);
            assert_eq!(lm.mirrored().body_part(), lm.body_part());
        }
    }

    #[test]
    fn test_rule_keys_have_body_parts() {
        for lm in Landmark::RULE_KEYS {
            assert!(lm.body_part().is_some());
        }
        assert!(Landmark::LeftWrist.body_part().is_none());
    }

    #[test]
    fn test_synthetic_torso() {
        let frame = JointFrame::new()
            .with(Landmark::LeftShoulder, Point::new(0.4, 0.2))
            .with(Landmark::RightShoulder, Point::new(0.6, 0.2))
            .with(Landmark::LeftHip, Point::new(0.4, 0.6))
            .with(Landmark::RightHip, Point::new(0.6, 0.6));
        let torso = frame.get(Landmark::Torso).unwrap();
        assert!((torso.x - 0.5).abs() < 1e-6);
        assert!((torso.y - 0.4).abs() < 1e-6);
        assert!(frame.raw(Landmark::Torso).is_none());
    }

    #[test]
    fn test_missing_and_non_finite() {
        let frame = JointFrame::new().with(Landmark::LeftKnee, Point::new(f32::NAN, 0.3));
        assert!(frame.get(Landmark::LeftKnee).is_none());
        assert!(frame.get(Landmark::Torso).is_none());
        assert!(frame.is_empty());
    }

    #[test]
    fn test_hand_falls_back_to_wrist() {
        let frame = JointFrame::new().with(Landmark::LeftWrist, Point::new(0.1, 0.2));
        assert_eq!(frame.hand(Side::Left), Some(Point::new(0.1, 0.2)));
        assert_eq!(frame.hand(Side::Right), None);
    }

    #[test]
    fn test_frame_json() {
        let frame: JointFrame =
            serde_json::from_str(r#"{"left_knee": [0.3, 0.6], "right_foot": [0.5, 0.9, 0.1]}"#)
                .unwrap();
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.get(Landmark::RightFoot).unwrap().z, Some(0.1));
    }

    #[test]
    fn test_sequence_windows() {
        let seq: PoseSequence = (0..3).map(|_| JointFrame::new()).collect();
        assert_eq!(seq.windows().count(), 2);
        assert_eq!(PoseSequence::default().windows().count(), 0);
    }
}
