// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Batch processing module.
//!
//! This module provides the [`BatchProcessor`] struct, which scores many
//! independent videos on a bounded worker pool. Every input yields exactly
//! one [`VideoReport`], in input order, scored or unscoreable.

use std::path::PathBuf;

use rayon::prelude::*;

use crate::analyzer::ExerciseAnalyzer;
use crate::error::{Result, RuleError};
use crate::results::VideoReport;
use crate::source::PoseTrack;

/// One unit of batch work.
#[derive(Debug, Clone)]
pub enum BatchItem {
    /// A track file to load.
    File(PathBuf),
    /// An already loaded track.
    Track(PoseTrack),
}

impl From<PathBuf> for BatchItem {
    fn from(path: PathBuf) -> Self {
        Self::File(path)
    }
}

impl From<PoseTrack> for BatchItem {
    fn from(track: PoseTrack) -> Self {
        Self::Track(track)
    }
}

/// A processor for scoring many videos in parallel.
///
/// The analyzer (and its catalog) is shared read-only by every worker.
///
/// # Example
///
/// ```no_run
/// use std::path::PathBuf;
/// use std::sync::Arc;
/// use exercise_rules::{Catalog, ExerciseAnalyzer, batch::BatchProcessor};
///
/// let analyzer = ExerciseAnalyzer::new(Arc::new(Catalog::builtin()?));
/// let processor = BatchProcessor::new(analyzer, 4)?;
/// let reports = processor.run(vec![PathBuf::from("tracks/curl.json")], Some("Dumbbell Curl"));
/// println!("Processed {} videos", reports.len());
/// # Ok::<(), exercise_rules::RuleError>(())
/// ```
pub struct BatchProcessor {
    analyzer: ExerciseAnalyzer,
    pool: rayon::ThreadPool,
    workers: usize,
}

impl BatchProcessor {
    /// Create a new `BatchProcessor`.
    ///
    /// # Arguments
    ///
    /// * `analyzer` - Analyzer shared by every worker.
    /// * `workers` - Number of worker threads; 0 uses one per CPU.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::ConfigError`] if the thread pool cannot be built.
    pub fn new(analyzer: ExerciseAnalyzer, workers: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("exercise-worker-{i}"))
            .build()
            .map_err(|e| RuleError::ConfigError(format!("failed to start {workers} workers: {e}")))?;
        let workers = pool.current_num_threads();
        Ok(Self {
            analyzer,
            pool,
            workers,
        })
    }

    /// Number of worker threads.
    #[must_use]
    pub const fn workers(&self) -> usize {
        self.workers
    }

    /// Get the shared analyzer.
    #[must_use]
    pub const fn analyzer(&self) -> &ExerciseAnalyzer {
        &self.analyzer
    }

    /// Score every item.
    ///
    /// # Arguments
    ///
    /// * `items` - Track files or loaded tracks.
    /// * `activity` - Activity override; `None` uses each track's own.
    ///
    /// # Returns
    ///
    /// * One report per item, in input order.
    pub fn run<I>(&self, items: Vec<I>, activity: Option<&str>) -> Vec<VideoReport>
    where
        I: Into<BatchItem> + Send,
    {
        let analyzer = &self.analyzer;
        self.pool.install(|| {
            items
                .into_par_iter()
                .map(|item| match item.into() {
                    BatchItem::File(path) => analyzer.score_file(&path, activity),
                    BatchItem::Track(track) => analyzer.score(&track, activity),
                })
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::catalog::{Catalog, ExerciseReference};
    use crate::geometry::Point;
    use crate::label::{Category, Label};
    use crate::landmark::{JointFrame, Landmark};
    use crate::results::BatchSummary;
    use crate::rules::RuleStructureBuilder;
    use crate::source::TrackFrame;

    fn processor(workers: usize) -> BatchProcessor {
        let (catalog, _) = Catalog::build([ExerciseReference::new(
            "Stand Tall",
            RuleStructureBuilder::new()
                .with(Landmark::Torso, Category::Position, Label::Upright)
                .build(),
        )]);
        BatchProcessor::new(ExerciseAnalyzer::new(Arc::new(catalog)), workers).unwrap()
    }

    fn track(name: &str, activity: &str, posed: bool) -> PoseTrack {
        let mut track = PoseTrack::new(name).with_activity(activity);
        if posed {
            track.push(TrackFrame::posed(
                JointFrame::new()
                    .with(Landmark::LeftShoulder, Point::new(0.4, 0.3))
                    .with(Landmark::RightShoulder, Point::new(0.6, 0.3))
                    .with(Landmark::LeftHip, Point::new(0.42, 0.6))
                    .with(Landmark::RightHip, Point::new(0.58, 0.6)),
            ));
        }
        track
    }

    #[test]
    fn test_every_input_reported_in_order() {
        let tracks = vec![
            track("a", "Stand Tall", true),
            track("b", "Unknown Lift", true),
            track("c", "Stand Tall", false),
            track("d", "stand tall", true),
        ];
        let reports = processor(2).run(tracks, None);
        let names: Vec<_> = reports.iter().map(|r| r.video.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);

        let summary = BatchSummary::from_reports(&reports);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.matched, 2);
        assert_eq!(summary.unscoreable, 2);
    }

    #[test]
    fn test_missing_files_reported() {
        let reports = processor(1).run(
            vec![PathBuf::from("missing/one.json"), PathBuf::from("missing/two.json")],
            Some("Stand Tall"),
        );
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| r.report().is_none()));
    }

    #[test]
    fn test_worker_count() {
        assert_eq!(processor(3).workers(), 3);
        assert!(processor(0).workers() >= 1);
    }
}
