// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use serde::Serialize;

use crate::cli::args::{CommonArgs, ParseArgs, RulesArgs};
use crate::cli::score::load_analyzer;
use crate::equipment::EquipmentRecord;
use crate::error::Result;
use crate::expected::parse_description;
use crate::rules::RuleStructure;
use crate::source::PoseTrack;
use crate::{info, section, verbose, warn};

/// Observed rules as printed by the `rules` command.
#[derive(Serialize)]
struct ObservedRules<'a> {
    video: &'a str,
    frames_used: usize,
    frames_skipped: usize,
    rules_skipped: usize,
    equipment: &'a EquipmentRecord,
    body_landmarks: &'a RuleStructure,
}

/// Print the observed rules of one track as JSON.
///
/// # Errors
///
/// Returns an error if the track cannot be loaded or observed.
pub fn run_rules(args: &RulesArgs) -> Result<()> {
    let analyzer = load_analyzer(&args.common)?;
    let track = PoseTrack::from_json_file(&args.source)?;
    let observation = analyzer.observe(&track)?;

    verbose!(
        "{}: {} frames used, {} skipped, {} labels",
        track.name,
        observation.frames_used,
        observation.frames_skipped,
        observation.rules.label_count()
    );
    let printed = ObservedRules {
        video: &track.name,
        frames_used: observation.frames_used,
        frames_skipped: observation.frames_skipped,
        rules_skipped: observation.rules_skipped,
        equipment: &observation.equipment,
        body_landmarks: &observation.rules,
    };
    println!("{}", serde_json::to_string_pretty(&printed)?);
    Ok(())
}

/// Print the expected reference derived from a free-text description.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn run_parse(args: &ParseArgs) -> Result<()> {
    let parsed = parse_description(&args.description);
    if parsed.phrases.is_empty() {
        warn!("No known phrase found in the description");
    } else {
        verbose!("Matched phrases: {}", parsed.phrases.join(", "));
    }
    let reference = parsed.into_reference(args.activity.trim());
    println!("{}", serde_json::to_string_pretty(&reference)?);
    Ok(())
}

/// List the catalog activities.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded.
pub fn run_catalog(args: &CommonArgs) -> Result<()> {
    let analyzer = load_analyzer(args)?;
    let catalog = analyzer.catalog();
    section!("Catalog v{} ({} exercises)", catalog.version(), catalog.len());
    for reference in catalog.iter() {
        let equipment = if reference.equipment.is_empty() {
            "bodyweight".to_string()
        } else {
            reference.equipment.types.join(", ")
        };
        info!(
            "{:<36} {:<24} {} labels{}",
            reference.activity,
            equipment,
            reference.rules.label_count(),
            if reference.mirrored { ", mirrored" } else { "" }
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_run_parse() {
        let args = ParseArgs {
            description: "Hinge at the hips with a kettlebell".to_string(),
            activity: "Swing".to_string(),
            common: CommonArgs::default(),
        };
        assert!(run_parse(&args).is_ok());
    }

    #[test]
    fn test_run_catalog_builtin() {
        assert!(run_catalog(&CommonArgs::default()).is_ok());
        let missing = CommonArgs {
            catalog: Some(PathBuf::from("missing_catalog.json")),
            ..CommonArgs::default()
        };
        assert!(run_catalog(&missing).is_err());
    }

    #[test]
    fn test_run_rules_unclassifiable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");
        PoseTrack::new("empty").to_json_file(&path).unwrap();
        let args = RulesArgs {
            source: path,
            common: CommonArgs::default(),
        };
        assert!(run_rules(&args).is_err());
    }
}
