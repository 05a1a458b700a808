// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Report types for scored attempts.
//!
//! The matcher produces a [`MatchReport`] per attempt; the batch layer wraps
//! it into a [`VideoReport`] so that every input video gets exactly one
//! entry, scored or not.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::equipment::EquipmentRecord;
use crate::label::{Category, Label};
use crate::landmark::Landmark;

/// Timing information for one video (in milliseconds).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Speed {
    /// Time spent reading the track and extracting poses.
    pub extract: Option<f64>,
    /// Time spent deriving observed rules.
    pub classify: Option<f64>,
    /// Time spent matching.
    pub score: Option<f64>,
}

impl Speed {
    /// Get total processing time.
    ///
    /// # Returns
    ///
    /// * Sum of extract, classify, and score times in milliseconds.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.extract.unwrap_or(0.0) + self.classify.unwrap_or(0.0) + self.score.unwrap_or(0.0)
    }
}

/// One failed landmark/category check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    /// Landmark checked.
    pub landmark: Landmark,
    /// Category checked.
    pub category: Category,
    /// Labels the reference requires.
    pub expected: BTreeSet<Label>,
    /// Labels observed in the video.
    pub observed: BTreeSet<Label>,
}

impl Mismatch {
    /// Required labels that were not observed.
    pub fn missing(&self) -> impl Iterator<Item = Label> + '_ {
        self.expected.difference(&self.observed).copied()
    }
}

fn join(labels: impl IntoIterator<Item = Label>) -> String {
    labels
        .into_iter()
        .map(|l| l.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: expected [{}], observed [{}]",
            self.landmark,
            self.category,
            join(self.expected.iter().copied()),
            join(self.observed.iter().copied())
        )
    }
}

/// Which side assignment produced the reported score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Sides as recorded.
    #[default]
    AsPerformed,
    /// Left and right swapped.
    Mirrored,
}

/// Outcome of the equipment check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquipmentCheck {
    /// Equipment the reference requires.
    pub expected: EquipmentRecord,
    /// Equipment observed in the video.
    pub observed: EquipmentRecord,
    /// Whether the observation covers the requirement.
    pub satisfied: bool,
}

/// Result of comparing one observation with one reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchReport {
    /// Reference activity name.
    pub activity: String,
    /// Fraction of checks satisfied, 1.0 when nothing was checked.
    pub score: f32,
    /// Threshold the score was compared against.
    pub threshold: f32,
    /// Number of checks (landmark/category pairs plus equipment).
    pub checked: usize,
    /// Number of satisfied checks.
    pub satisfied: usize,
    /// Whether `score >= threshold`.
    pub matched: bool,
    /// Side assignment used for this score.
    pub orientation: Orientation,
    /// One entry per failed landmark/category check.
    pub mismatches: Vec<Mismatch>,
    /// Equipment check, if the reference constrains equipment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equipment: Option<EquipmentCheck>,
}

impl MatchReport {
    /// One-line summary, e.g. `Dumbbell Curl 0.83 (10/12) ✓`.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} {:.2} ({}/{}){} {}",
            self.activity,
            self.score,
            self.satisfied,
            self.checked,
            if self.orientation == Orientation::Mirrored {
                " mirrored"
            } else {
                ""
            },
            if self.matched { "✓" } else { "✗" }
        )
    }

    /// Multi-line diagnostic listing every failed check.
    #[must_use]
    pub fn verbose(&self) -> String {
        let mut lines = vec![self.summary()];
        lines.extend(self.mismatches.iter().map(|m| format!("  {m}")));
        if let Some(eq) = self.equipment.as_ref().filter(|eq| !eq.satisfied) {
            lines.push(format!(
                "  equipment: expected [{}], observed [{}]",
                eq.expected.types.join(", "),
                eq.observed.types.join(", ")
            ));
        }
        lines.join("\n")
    }
}

/// Scoring outcome of one video.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The video was scored.
    Scored(MatchReport),
    /// The video could not be scored.
    Unscoreable {
        /// Why scoring failed.
        reason: String,
    },
}

/// Report entry for one input video.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoReport {
    /// Video or track identifier.
    pub video: String,
    /// Activity scored against, if known.
    pub activity: Option<String>,
    /// Frames with a usable pose.
    pub frames_used: usize,
    /// Frames dropped (no pose, detector failure, missing torso).
    pub frames_skipped: usize,
    /// Scored or unscoreable.
    pub outcome: Outcome,
    /// Processing time.
    pub speed: Speed,
}

impl VideoReport {
    /// Report for a video that failed before scoring.
    #[must_use]
    pub fn unscoreable(video: impl Into<String>, activity: Option<String>, reason: impl Into<String>) -> Self {
        Self {
            video: video.into(),
            activity,
            frames_used: 0,
            frames_skipped: 0,
            outcome: Outcome::Unscoreable {
                reason: reason.into(),
            },
            speed: Speed::default(),
        }
    }

    /// The match report, if scored.
    #[must_use]
    pub const fn report(&self) -> Option<&MatchReport> {
        match &self.outcome {
            Outcome::Scored(report) => Some(report),
            Outcome::Unscoreable { .. } => None,
        }
    }

    /// One-line summary for terminal output.
    #[must_use]
    pub fn summary(&self) -> String {
        match &self.outcome {
            Outcome::Scored(report) => format!("{}: {}", self.video, report.summary()),
            Outcome::Unscoreable { reason } => format!("{}: unscoreable ({reason})", self.video),
        }
    }
}

/// Totals over a batch of video reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Number of videos.
    pub total: usize,
    /// Videos scored.
    pub scored: usize,
    /// Videos whose score met the threshold.
    pub matched: usize,
    /// Videos that could not be scored.
    pub unscoreable: usize,
}

impl BatchSummary {
    /// Tally a batch.
    #[must_use]
    pub fn from_reports(reports: &[VideoReport]) -> Self {
        reports.iter().fold(Self::default(), |mut acc, r| {
            acc.total += 1;
            match r.report() {
                Some(report) => {
                    acc.scored += 1;
                    acc.matched += usize::from(report.matched);
                }
                None => acc.unscoreable += 1,
            }
            acc
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(matched: bool) -> MatchReport {
        MatchReport {
            activity: "Dumbbell Curl".to_string(),
            score: if matched { 1.0 } else { 0.5 },
            threshold: 0.8,
            checked: 2,
            satisfied: if matched { 2 } else { 1 },
            matched,
            orientation: Orientation::AsPerformed,
            mismatches: if matched {
                Vec::new()
            } else {
                vec![Mismatch {
                    landmark: Landmark::LeftElbow,
                    category: Category::Motion,
                    expected: [Label::Flexion, Label::Extension].into_iter().collect(),
                    observed: [Label::Flexion].into_iter().collect(),
                }]
            },
            equipment: None,
        }
    }

    #[test]
    fn test_speed_total() {
        let speed = Speed {
            extract: Some(1.0),
            classify: Some(2.0),
            score: None,
        };
        assert!((speed.total() - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_mismatch_display() {
        let r = report(false);
        let m = &r.mismatches[0];
        assert_eq!(
            m.to_string(),
            "left_elbow motion: expected [flexion, extension], observed [flexion]"
        );
        assert_eq!(m.missing().collect::<Vec<_>>(), vec![Label::Extension]);
        assert!(r.verbose().contains("left_elbow motion"));
    }

    #[test]
    fn test_summary() {
        assert_eq!(report(true).summary(), "Dumbbell Curl 1.00 (2/2) ✓");
        assert_eq!(report(false).summary(), "Dumbbell Curl 0.50 (1/2) ✗");
    }

    #[test]
    fn test_batch_summary() {
        let scored = VideoReport {
            video: "a.json".to_string(),
            activity: Some("Dumbbell Curl".to_string()),
            frames_used: 10,
            frames_skipped: 0,
            outcome: Outcome::Scored(report(true)),
            speed: Speed::default(),
        };
        let failed = VideoReport::unscoreable("b.json", None, "no activity");
        let summary = BatchSummary::from_reports(&[scored, failed.clone()]);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.matched, 1);
        assert_eq!(summary.unscoreable, 1);
        assert_eq!(failed.summary(), "b.json: unscoreable (no activity)");
    }

    #[test]
    fn test_outcome_json() {
        let failed = VideoReport::unscoreable("b.json", None, "bad");
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["outcome"]["status"], "unscoreable");
        assert_eq!(json["outcome"]["reason"], "bad");
    }
}
