// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::batch::BatchProcessor;
use crate::cli::args::{CommonArgs, RankArgs, ScoreArgs};
use crate::error::Result;
use crate::results::{BatchSummary, Outcome, VideoReport};
use crate::source::{PoseTrack, TrackSource};
use crate::{Catalog, ExerciseAnalyzer, RuleConfig, VERSION};
use crate::{info, section, success, verbose, warn};

/// Build the analyzer described by the common options.
///
/// # Errors
///
/// Returns an error if the catalog or configuration file cannot be loaded,
/// or the resulting configuration is invalid.
pub fn load_analyzer(common: &CommonArgs) -> Result<ExerciseAnalyzer> {
    let catalog = match &common.catalog {
        Some(path) => Catalog::from_json_file(path)?,
        None => Catalog::builtin()?,
    };
    if catalog.is_empty() {
        warn!("Catalog is empty, every activity will be unknown");
    }

    let mut config = match &common.config {
        Some(path) => RuleConfig::from_json_file(path)?,
        None => RuleConfig::default(),
    };
    if let Some(threshold) = common.threshold {
        config = config.with_match_threshold(threshold);
    }

    ExerciseAnalyzer::with_config(Arc::new(catalog), config)
}

/// Report file layout.
#[derive(Serialize)]
struct SavedReport<'a> {
    version: &'static str,
    summary: BatchSummary,
    videos: &'a [VideoReport],
}

fn save_report(path: &Path, reports: &[VideoReport], summary: BatchSummary) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let saved = SavedReport {
        version: VERSION,
        summary,
        videos: reports,
    };
    std::fs::write(path, serde_json::to_string_pretty(&saved)?)?;
    Ok(())
}

/// Score one track file or a directory of track files.
///
/// # Errors
///
/// Returns an error if setup fails. Per-video failures are reported as
/// unscoreable entries instead.
#[allow(clippy::cast_precision_loss)]
pub fn run_score(args: &ScoreArgs) -> Result<BatchSummary> {
    let analyzer = load_analyzer(&args.common)?;
    let paths = TrackSource::from(args.source.as_path()).paths()?;
    if paths.is_empty() {
        warn!("No track files found in {}", args.source.display());
    }

    let processor = BatchProcessor::new(analyzer, args.workers)?;
    println!(
        "Exercise Rules {VERSION} 🚀 catalog v{} ({} exercises), {} workers",
        processor.analyzer().catalog().version(),
        processor.analyzer().catalog().len(),
        processor.workers()
    );

    let reports = processor.run(paths, args.activity.as_deref());

    section!("Results");
    for report in &reports {
        match &report.outcome {
            Outcome::Scored(scored) => {
                info!("{}: {}", report.video, scored.summary());
                for mismatch in &scored.mismatches {
                    verbose!("  {mismatch}");
                }
            }
            Outcome::Unscoreable { .. } => warn!("{}", report.summary()),
        }
    }

    let summary = BatchSummary::from_reports(&reports);
    let n = reports.len().max(1) as f64;
    let (extract, classify, score) = reports.iter().fold((0.0, 0.0, 0.0), |acc, r| {
        (
            acc.0 + r.speed.extract.unwrap_or(0.0),
            acc.1 + r.speed.classify.unwrap_or(0.0),
            acc.2 + r.speed.score.unwrap_or(0.0),
        )
    });
    verbose!(
        "Speed: {:.1}ms extract, {:.1}ms classify, {:.1}ms score per video",
        extract / n,
        classify / n,
        score / n
    );
    verbose!(
        "{} videos: {} matched, {} below threshold, {} unscoreable",
        summary.total,
        summary.matched,
        summary.scored - summary.matched,
        summary.unscoreable
    );

    if let Some(path) = &args.save {
        save_report(path, &reports, summary)?;
        success!("Report saved to {}", path.display());
    }
    Ok(summary)
}

/// Rank catalog activities against one track.
///
/// # Errors
///
/// Returns an error if setup fails or the track cannot be observed.
pub fn run_rank(args: &RankArgs) -> Result<()> {
    let analyzer = load_analyzer(&args.common)?;
    let track = PoseTrack::from_json_file(&args.source)?;
    let ranked = analyzer.rank(&track, args.top_k)?;

    section!("Top {} activities for {}", ranked.len(), track.name);
    for (i, report) in ranked.iter().enumerate() {
        info!("{}. {}", i + 1, report.summary());
    }
    if let Some(claimed) = &track.activity
        && let Some(best) = ranked.first()
    {
        verbose!(
            "Claimed activity '{claimed}' {} the best match",
            if crate::catalog::normalize_activity(claimed) == crate::catalog::normalize_activity(&best.activity) {
                "is"
            } else {
                "is not"
            }
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_load_analyzer_threshold_override() {
        let common = CommonArgs {
            threshold: Some(0.6),
            ..CommonArgs::default()
        };
        let analyzer = load_analyzer(&common).unwrap();
        assert!((analyzer.config().match_threshold - 0.6).abs() < f32::EPSILON);
        assert!(!analyzer.catalog().is_empty());

        let bad = CommonArgs {
            threshold: Some(1.5),
            ..CommonArgs::default()
        };
        assert!(load_analyzer(&bad).is_err());
    }

    #[test]
    fn test_run_score_saves_report() {
        let dir = tempfile::tempdir().unwrap();
        PoseTrack::new("empty")
            .with_activity("Dumbbell Curl")
            .to_json_file(dir.path().join("tracks").join("empty.json"))
            .unwrap();
        let save = dir.path().join("out").join("report.json");

        let args = ScoreArgs {
            source: dir.path().join("tracks"),
            activity: None,
            workers: 1,
            save: Some(save.clone()),
            common: CommonArgs::default(),
        };
        let summary = run_score(&args).unwrap();
        assert_eq!(summary.total, 1);
        assert_eq!(summary.unscoreable, 1);

        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(save).unwrap()).unwrap();
        assert_eq!(saved["summary"]["total"], 1);
        assert_eq!(saved["videos"][0]["video"], "empty");
    }

    #[test]
    fn test_run_rank_missing_file() {
        let args = RankArgs {
            source: PathBuf::from("missing.json"),
            top_k: 3,
            common: CommonArgs::default(),
        };
        assert!(run_rank(&args).is_err());
    }
}
