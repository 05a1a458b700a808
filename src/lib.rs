// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

#![allow(clippy::multiple_crate_versions)]

//! # Exercise Rules
//!
//! Rule-based exercise form checking written in Rust. Pose estimates of a
//! recorded attempt are turned into per-landmark position and motion labels,
//! which are then compared with the expected labels of a named exercise.
//!
//! ## Features
//!
//! - **Interpretable** - Every score comes with the landmark checks that failed
//! - **Subset Matching** - Expected labels must be observed; extra observations are free
//! - **Scored Mode** - Fraction of satisfied checks against a configurable threshold
//! - **Mirrored Exercises** - Single-side exercises may be performed with either side
//! - **Equipment Voting** - Majority vote of per-frame equipment detections
//! - **Parallel Batches** - Independent videos scored on a bounded worker pool
//!
//! ## Quick Start (Library)
//!
//! ```no_run
//! use std::sync::Arc;
//! use exercise_rules::{Catalog, ExerciseAnalyzer, PoseTrack};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Built-in catalog, frozen and shared
//!     let analyzer = ExerciseAnalyzer::new(Arc::new(Catalog::builtin()?));
//!
//!     // Recorded pose and equipment detections of one video
//!     let track = PoseTrack::from_json_file("tracks/curl_01.json")?;
//!
//!     let report = analyzer.score(&track, Some("Dumbbell Curl"));
//!     if let Some(scored) = report.report() {
//!         println!("{}", scored.summary());
//!         for mismatch in &scored.mismatches {
//!             println!("  {mismatch}");
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## CLI Usage
//!
//! ```bash
//! # Score one track against an activity
//! exercise-rules score tracks/curl_01.json --activity "Dumbbell Curl"
//!
//! # Score a directory of tracks on 4 workers and save a JSON report
//! exercise-rules score tracks/ --workers 4 --save runs/report.json
//!
//! # Top 3 catalog activities for an unlabeled attempt
//! exercise-rules rank tracks/unknown.json
//!
//! # Observed rules of a track, or expected rules of a description
//! exercise-rules rules tracks/curl_01.json
//! exercise-rules parse "Hinge at the hips and swing the kettlebell"
//! ```
//!
//! **CLI Options:**
//!
//! | Option | Short | Description | Default |
//! |--------|-------|-------------|---------|
//! | `--activity` | `-a` | Activity to score against | track's own |
//! | `--workers` | `-w` | Parallel workers | one per CPU |
//! | `--save` | | Save JSON report | - |
//! | `--catalog` | | Exercise catalog JSON | built-in |
//! | `--config` | | Rule configuration JSON | built-in |
//! | `--threshold` | | Match threshold | `0.8` |
//! | `--top-k` | `-k` | Ranked activities | `3` |
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`geometry`] | [`Point`], [`angle`], [`distance`] |
//! | [`landmark`] | [`Landmark`] schema, [`JointFrame`], [`PoseSequence`] |
//! | [`label`] | Closed label vocabulary ([`Label`], [`Category`]) |
//! | [`rules`] | Frozen [`RuleStructure`] and its builder |
//! | [`config`] | [`RuleConfig`] thresholds per [`CoordinateDomain`] |
//! | [`position`] | Per-frame position classifier |
//! | [`motion`] | Cross-frame motion classifier |
//! | [`aggregate`] | Union of frame and sequence labels into an [`Observation`] |
//! | [`equipment`] | [`EquipmentRecord`] and majority voting |
//! | [`catalog`] | [`ExerciseReference`] and the frozen [`Catalog`] |
//! | [`expected`] | Expected rules from the catalog or a description |
//! | [`matcher`] | Subset matcher, scorer and ranking |
//! | [`source`] | Detector traits and recorded [`PoseTrack`] files |
//! | [`analyzer`] | Per-video pipeline ([`ExerciseAnalyzer`]) |
//! | [`batch`] | Parallel batch scoring |
//! | [`results`] | [`MatchReport`], [`Mismatch`], [`VideoReport`] |
//! | [`error`] | Error types ([`RuleError`], [`Result`]) |
//! | [`cli`] | Command-line interface and logging macros |
//!
//! ## License
//!
//! This project is licensed under [AGPL-3.0](https://ultralytics.com/license).

// Modules
pub mod aggregate;
pub mod analyzer;
pub mod batch;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod equipment;
pub mod error;
pub mod expected;
pub mod geometry;
pub mod label;
pub mod landmark;
pub mod matcher;
pub mod motion;
pub mod position;
pub mod results;
pub mod rules;
pub mod source;

// Re-export main types for convenience
pub use aggregate::Observation;
pub use analyzer::ExerciseAnalyzer;
pub use catalog::{Catalog, ExerciseReference};
pub use config::{CoordinateDomain, RuleConfig};
pub use equipment::{EquipmentDetection, EquipmentRecord};
pub use error::{Result, RuleError};
pub use geometry::{Point, angle, distance};
pub use label::{Category, Label};
pub use landmark::{BodyPart, JointFrame, Landmark, PoseSequence, Side};
pub use results::{MatchReport, Mismatch, Outcome, Speed, VideoReport};
pub use rules::{RegionLabelSet, RuleStructure, RuleStructureBuilder};
pub use source::{EquipmentDetector, PoseDetector, PoseTrack, TrackFrame};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        // Version should be semver format like "0.1.0"
        assert!(VERSION.contains('.'));
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "exercise-rules");
    }
}
