// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Pose and equipment sources.
//!
//! The core never decodes video itself. Pose and equipment estimates come
//! either from a detector implementing [`PoseDetector`] / [`EquipmentDetector`]
//! for some frame type, or from a recorded [`PoseTrack`] JSON file holding the
//! detector output of one video.
//!
//! # Track file format
//!
//! ```json
//! {
//!   "name": "curl_01",
//!   "activity": "Dumbbell Curl",
//!   "domain": "normalized",
//!   "frames": [
//!     {"landmarks": {"left_shoulder": [0.4, 0.3], "left_hip": [0.4, 0.6]},
//!      "equipment": [{"label": "dumbbell", "confidence": 0.9, "center": [0.5, 0.4]}]},
//!     {"landmarks": null},
//!     {"error": "pose model timed out"}
//!   ]
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::{CoordinateDomain, RuleConfig};
use crate::equipment::{EquipmentDetection, EquipmentRecord, EquipmentTally};
use crate::error::{Result, RuleError};
use crate::landmark::{JointFrame, PoseSequence};
use crate::{verbose, warn};

/// Per-frame pose estimator.
pub trait PoseDetector<F> {
    /// Estimate the joints of one frame.
    ///
    /// # Returns
    ///
    /// * `Ok(None)` when no usable pose was found.
    ///
    /// # Errors
    ///
    /// Returns an error if the detector failed on this frame.
    fn detect_pose(&mut self, frame: &F) -> Result<Option<JointFrame>>;
}

/// Per-frame equipment detector.
pub trait EquipmentDetector<F> {
    /// Detect equipment in one frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the detector failed on this frame.
    fn detect_equipment(&mut self, frame: &F) -> Result<Vec<EquipmentDetection>>;
}

/// Equipment detector that never sees anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEquipment;

impl<F> EquipmentDetector<F> for NoEquipment {
    fn detect_equipment(&mut self, _frame: &F) -> Result<Vec<EquipmentDetection>> {
        Ok(Vec::new())
    }
}

/// Detector output for one video.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Frames with a usable pose, in order.
    pub sequence: PoseSequence,
    /// Equipment detections aligned with `sequence`.
    pub frame_equipment: Vec<Vec<EquipmentDetection>>,
    /// Majority-voted equipment over every frame.
    pub equipment: EquipmentRecord,
    /// Number of frames read.
    pub frames_total: usize,
    /// Frames without a usable pose.
    pub frames_skipped: usize,
}

/// Run the detectors over the frames of one video.
///
/// Frames without a pose are left out of the sequence. A detector error is
/// logged and treated as no data for that frame; it never aborts the video.
/// Equipment votes are counted over every frame, posed or not.
pub fn extract<F, P, E>(
    frames: impl IntoIterator<Item = F>,
    pose: &mut P,
    equipment: &mut E,
    config: &RuleConfig,
) -> Extraction
where
    P: PoseDetector<F> + ?Sized,
    E: EquipmentDetector<F> + ?Sized,
{
    let mut tally = EquipmentTally::new(config.equipment_confidence);
    let mut joints = Vec::new();
    let mut frame_equipment = Vec::new();
    let mut frames_total = 0;

    for (idx, frame) in frames.into_iter().enumerate() {
        frames_total += 1;

        let detections = equipment.detect_equipment(&frame).unwrap_or_else(|e| {
            warn!("Frame {idx}: equipment detector failed: {e}");
            Vec::new()
        });
        tally.observe(&detections);

        match pose.detect_pose(&frame) {
            Ok(Some(j)) if !j.is_empty() => {
                joints.push(j);
                frame_equipment.push(detections);
            }
            Ok(_) => {}
            Err(e) => warn!("Frame {idx}: pose detector failed: {e}"),
        }
    }

    let sequence = PoseSequence::new(joints);
    let frames_skipped = frames_total - sequence.len();
    if frames_skipped > 0 {
        verbose!("{frames_skipped}/{frames_total} frames without a usable pose");
    }

    Extraction {
        sequence,
        frame_equipment,
        equipment: tally.finish(config.equipment_top_k),
        frames_total,
        frames_skipped,
    }
}

/// One recorded frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackFrame {
    /// Detected joints, `None` when no pose was found.
    #[serde(default)]
    pub landmarks: Option<JointFrame>,
    /// Equipment detections.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub equipment: Vec<EquipmentDetection>,
    /// Detector failure message for this frame.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TrackFrame {
    /// Frame with a detected pose.
    #[must_use]
    pub fn posed(landmarks: JointFrame) -> Self {
        Self {
            landmarks: Some(landmarks),
            ..Self::default()
        }
    }

    /// Frame whose detector call failed.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    /// Attach equipment detections.
    #[must_use]
    pub fn with_equipment(mut self, detections: Vec<EquipmentDetection>) -> Self {
        self.equipment = detections;
        self
    }
}

/// Recorded detector output of one video.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseTrack {
    /// Video identifier.
    #[serde(default)]
    pub name: String,
    /// Activity the attempt claims to be.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity: Option<String>,
    /// Coordinate domain of every point in the track.
    #[serde(default)]
    pub domain: CoordinateDomain,
    /// Frames in capture order.
    #[serde(default)]
    pub frames: Vec<TrackFrame>,
}

impl PoseTrack {
    /// Create an empty track.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the claimed activity.
    #[must_use]
    pub fn with_activity(mut self, activity: impl Into<String>) -> Self {
        self.activity = Some(activity.into());
        self
    }

    /// Set the coordinate domain.
    #[must_use]
    pub const fn with_domain(mut self, domain: CoordinateDomain) -> Self {
        self.domain = domain;
        self
    }

    /// Append a frame.
    pub fn push(&mut self, frame: TrackFrame) {
        self.frames.push(frame);
    }

    /// Parse a track from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::SourceError`] if the JSON is malformed.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| RuleError::SourceError(format!("invalid track: {e}")))
    }

    /// Load a track file. An empty `name` is replaced by the file stem.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            RuleError::SourceError(format!("failed to read {}: {e}", path.display()))
        })?;
        let mut track: Self = serde_json::from_str(&json).map_err(|e| {
            RuleError::SourceError(format!("invalid track {}: {e}", path.display()))
        })?;
        if track.name.is_empty() {
            track.name = path
                .file_stem()
                .map_or_else(|| path.display().to_string(), |s| s.to_string_lossy().into_owned());
        }
        Ok(track)
    }

    /// Save the track as pretty JSON, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether the track has no frames.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Replay the recorded detector output.
    #[must_use]
    pub fn extract(&self, config: &RuleConfig) -> Extraction {
        extract(&self.frames, &mut Recorded, &mut Recorded, config)
    }
}

/// Detector that replays [`TrackFrame`] contents.
#[derive(Debug, Clone, Copy, Default)]
pub struct Recorded;

impl PoseDetector<&TrackFrame> for Recorded {
    fn detect_pose(&mut self, frame: &&TrackFrame) -> Result<Option<JointFrame>> {
        match &frame.error {
            Some(msg) => Err(RuleError::DetectorError(msg.clone())),
            None => Ok(frame.landmarks.clone()),
        }
    }
}

impl EquipmentDetector<&TrackFrame> for Recorded {
    fn detect_equipment(&mut self, frame: &&TrackFrame) -> Result<Vec<EquipmentDetection>> {
        Ok(frame.equipment.clone())
    }
}

/// Where track files come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackSource {
    /// A single track file.
    File(PathBuf),
    /// Every `*.json` file in a directory (not recursive).
    Directory(PathBuf),
}

impl TrackSource {
    /// Track file paths, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    pub fn paths(&self) -> Result<Vec<PathBuf>> {
        match self {
            Self::File(path) => Ok(vec![path.clone()]),
            Self::Directory(dir) => {
                let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
                    .map_err(|e| {
                        RuleError::SourceError(format!("cannot read {}: {e}", dir.display()))
                    })?
                    .filter_map(std::result::Result::ok)
                    .map(|entry| entry.path())
                    .filter(|path| Self::is_track_file(path))
                    .collect();
                paths.sort();
                Ok(paths)
            }
        }
    }

    fn is_track_file(path: &Path) -> bool {
        path.is_file()
            && path
                .extension()
                .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("json"))
    }
}

impl From<&Path> for TrackSource {
    fn from(path: &Path) -> Self {
        if path.is_dir() {
            Self::Directory(path.to_path_buf())
        } else {
            Self::File(path.to_path_buf())
        }
    }
}

impl From<&str> for TrackSource {
    fn from(s: &str) -> Self {
        Self::from(Path::new(s))
    }
}
