// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Per-video pipeline.
//!
//! [`ExerciseAnalyzer`] ties the stages together for one recorded track:
//! extraction, observation, then scoring against one activity or ranking
//! against the whole catalog.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::aggregate::{Observation, observe_extraction};
use crate::catalog::{Catalog, ExerciseReference};
use crate::config::RuleConfig;
use crate::error::{Result, RuleError};
use crate::matcher::{rank, score_attempt};
use crate::results::{MatchReport, Outcome, VideoReport};
use crate::source::PoseTrack;

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Scores recorded attempts against a shared, frozen catalog.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use exercise_rules::{Catalog, ExerciseAnalyzer, PoseTrack};
///
/// let analyzer = ExerciseAnalyzer::new(Arc::new(Catalog::builtin()?));
/// let report = analyzer.score(&PoseTrack::new("empty"), Some("Dumbbell Curl"));
/// assert!(report.report().is_none());
/// # Ok::<(), exercise_rules::RuleError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ExerciseAnalyzer {
    catalog: Arc<Catalog>,
    config: RuleConfig,
}

impl ExerciseAnalyzer {
    /// Create an analyzer with the default configuration.
    #[must_use]
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            config: RuleConfig::default(),
        }
    }

    /// Create an analyzer with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::ConfigError`] if the configuration is invalid.
    pub fn with_config(catalog: Arc<Catalog>, config: RuleConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { catalog, config })
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &RuleConfig {
        &self.config
    }

    /// Get the catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn check_domain(&self, track: &PoseTrack) -> Result<()> {
        if track.domain == self.config.domain {
            Ok(())
        } else {
            Err(RuleError::ConfigError(format!(
                "track '{}' uses {} coordinates but thresholds are calibrated for {}",
                track.name, track.domain, self.config.domain
            )))
        }
    }

    /// Derive the observed rules and equipment of a track.
    ///
    /// # Errors
    ///
    /// Returns an error if the track's coordinate domain differs from the
    /// configured one, or if no frame can be classified.
    pub fn observe(&self, track: &PoseTrack) -> Result<Observation> {
        self.check_domain(track)?;
        observe_extraction(&track.extract(&self.config), &self.config)
    }

    /// Score an observation against one reference.
    #[must_use]
    pub fn score_observation(&self, observation: &Observation, reference: &ExerciseReference) -> MatchReport {
        score_attempt(
            &observation.rules,
            &observation.equipment,
            reference,
            self.config.match_threshold,
        )
    }

    /// Score a track against an activity.
    ///
    /// The activity defaults to the one recorded in the track. Failures are
    /// reported as an unscoreable entry, never dropped.
    #[must_use]
    pub fn score(&self, track: &PoseTrack, activity: Option<&str>) -> VideoReport {
        let activity = activity
            .or(track.activity.as_deref())
            .map(str::trim)
            .filter(|a| !a.is_empty());
        let Some(activity) = activity else {
            return VideoReport::unscoreable(&track.name, None, "no activity given");
        };

        let mut report = VideoReport::unscoreable(&track.name, Some(activity.to_string()), "");
        report.outcome = match self.try_score(track, activity, &mut report) {
            Ok(scored) => Outcome::Scored(scored),
            Err(e) => Outcome::Unscoreable {
                reason: e.to_string(),
            },
        };
        report
    }

    fn try_score(&self, track: &PoseTrack, activity: &str, report: &mut VideoReport) -> Result<MatchReport> {
        let reference = self.catalog.lookup(activity)?;
        report.activity = Some(reference.activity.clone());
        self.check_domain(track)?;

        let start = Instant::now();
        let extraction = track.extract(&self.config);
        report.speed.extract = Some(elapsed_ms(start));
        report.frames_skipped = extraction.frames_skipped;

        let start = Instant::now();
        let observation = observe_extraction(&extraction, &self.config)?;
        report.speed.classify = Some(elapsed_ms(start));
        report.frames_used = observation.frames_used;
        report.frames_skipped = observation.frames_skipped;

        let start = Instant::now();
        let scored = self.score_observation(&observation, reference);
        report.speed.score = Some(elapsed_ms(start));
        Ok(scored)
    }

    /// Load a track file and score it.
    ///
    /// Unreadable files become unscoreable entries named after the path.
    #[must_use]
    pub fn score_file(&self, path: &Path, activity: Option<&str>) -> VideoReport {
        match PoseTrack::from_json_file(path) {
            Ok(track) => self.score(&track, activity),
            Err(e) => VideoReport::unscoreable(
                path.display().to_string(),
                activity.map(str::to_string),
                e.to_string(),
            ),
        }
    }

    /// Rank every catalog activity against a track.
    ///
    /// # Errors
    ///
    /// Returns an error if the track cannot be observed.
    pub fn rank(&self, track: &PoseTrack, top_k: usize) -> Result<Vec<MatchReport>> {
        let observation = self.observe(track)?;
        Ok(rank(
            &observation.rules,
            &observation.equipment,
            self.catalog.iter(),
            self.config.match_threshold,
            top_k,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoordinateDomain;
    use crate::geometry::Point;
    use crate::label::{Category, Label};
    use crate::landmark::{JointFrame, Landmark};
    use crate::rules::RuleStructureBuilder;
    use crate::source::TrackFrame;

    fn upright() -> JointFrame {
        JointFrame::new()
            .with(Landmark::LeftShoulder, Point::new(0.4, 0.3))
            .with(Landmark::RightShoulder, Point::new(0.6, 0.3))
            .with(Landmark::LeftHip, Point::new(0.42, 0.6))
            .with(Landmark::RightHip, Point::new(0.58, 0.6))
    }

    fn analyzer() -> ExerciseAnalyzer {
        let (catalog, _) = Catalog::build([ExerciseReference::new(
            "Stand Tall",
            RuleStructureBuilder::new()
                .with(Landmark::Torso, Category::Position, Label::Upright)
                .with(Landmark::Torso, Category::Motion, Label::Stationary)
                .build(),
        )]);
        ExerciseAnalyzer::new(Arc::new(catalog))
    }

    fn track() -> PoseTrack {
        let mut track = PoseTrack::new("stand").with_activity("stand tall");
        track.push(TrackFrame::posed(upright()));
        track.push(TrackFrame::default());
        track.push(TrackFrame::posed(upright()));
        track
    }

    #[test]
    fn test_score_uses_track_activity() {
        let report = analyzer().score(&track(), None);
        assert_eq!(report.activity.as_deref(), Some("Stand Tall"));
        assert_eq!(report.frames_used, 2);
        assert_eq!(report.frames_skipped, 1);
        let scored = report.report().unwrap();
        assert!(scored.matched);
        assert_eq!(scored.checked, 2);
        assert!(report.speed.total() >= 0.0);
    }

    #[test]
    fn test_unknown_activity_is_unscoreable() {
        let report = analyzer().score(&track(), Some("Snatch"));
        match &report.outcome {
            Outcome::Unscoreable { reason } => assert!(reason.contains("Snatch")),
            Outcome::Scored(_) => panic!("expected unscoreable"),
        }
        let report = analyzer().score(&PoseTrack::new("anon"), None);
        assert!(report.report().is_none());
    }

    #[test]
    fn test_domain_mismatch_rejected() {
        let track = track().with_domain(CoordinateDomain::Pixel);
        assert!(matches!(analyzer().observe(&track), Err(RuleError::ConfigError(_))));
        assert!(analyzer().score(&track, None).report().is_none());
    }

    #[test]
    fn test_rank() {
        let ranked = analyzer().rank(&track(), 3).unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].activity, "Stand Tall");
    }

    #[test]
    fn test_score_file_missing() {
        let report = analyzer().score_file(Path::new("does/not/exist.json"), Some("Stand Tall"));
        assert_eq!(report.video, "does/not/exist.json");
        assert!(report.report().is_none());
    }
}
