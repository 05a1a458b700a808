// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Integration tests for the exercise rules library

use std::path::PathBuf;
use std::sync::Arc;

use exercise_rules::batch::BatchProcessor;
use exercise_rules::matcher::compare;
use exercise_rules::motion::classify_sequence;
use exercise_rules::position::classify_frame;
use exercise_rules::results::{BatchSummary, Orientation};
use exercise_rules::{
    Catalog, Category, EquipmentDetection, ExerciseAnalyzer, ExerciseReference, JointFrame, Label,
    Landmark, Point, PoseSequence, PoseTrack, RuleConfig, RuleError, RuleStructureBuilder, TrackFrame,
    angle, distance,
};

const TEST_CATALOG: &str = r#"{
    "version": "test-1",
    "exercises": [
        {
            "activity": "Test Curl",
            "body_landmarks": {
                "torso": {"position": ["upright"]},
                "left_hand": {"motion": ["vertical upward", "vertical downward"]}
            },
            "equipment": {"type": ["dumbbell"]}
        },
        {
            "activity": "Single Arm Raise",
            "body_landmarks": {
                "right_hand": {"motion": ["vertical upward"]}
            },
            "mirrored": true
        },
        {
            "activity": "Test Curl ",
            "body_landmarks": {"torso": {"position": ["seated"]}}
        }
    ]
}"#;

fn body(hand_y: f32) -> JointFrame {
    JointFrame::new()
        .with(Landmark::LeftShoulder, Point::new(0.4, 0.3))
        .with(Landmark::RightShoulder, Point::new(0.6, 0.3))
        .with(Landmark::LeftHip, Point::new(0.42, 0.6))
        .with(Landmark::RightHip, Point::new(0.58, 0.6))
        .with(Landmark::LeftElbow, Point::new(0.4, 0.45))
        .with(Landmark::LeftHand, Point::new(0.4, hand_y))
}

fn curl_track(name: &str) -> PoseTrack {
    let mut track = PoseTrack::new(name).with_activity("Test Curl");
    for y in [0.6, 0.4, 0.2, 0.4, 0.6] {
        track.push(
            TrackFrame::posed(body(y))
                .with_equipment(vec![EquipmentDetection::new("dumbbell", 0.9)]),
        );
    }
    track
}

fn analyzer() -> ExerciseAnalyzer {
    ExerciseAnalyzer::new(Arc::new(Catalog::from_json_str(TEST_CATALOG).unwrap()))
}

#[test]
fn test_angle_conventions() {
    let a = Point::new(0.0, 0.0);
    let b = Point::new(1.0, 0.0);
    let c = Point::new(2.0, 0.0);
    assert!((angle(a, b, c).unwrap() - 180.0).abs() < 1e-4);
    assert!(angle(a, b, a).unwrap().abs() < 1e-4);

    let d = Point::new(1.0, 1.0);
    let forward = angle(a, b, d).unwrap();
    let backward = angle(d, b, a).unwrap();
    assert!((forward - backward).abs() > 1.0);
    assert!((forward + backward - 360.0).abs() < 1e-3);
}

#[test]
fn test_distance_symmetry() {
    let points = [
        Point::new(0.1, 0.9),
        Point::new(-3.5, 2.25),
        Point::new(640.0, 480.0),
    ];
    for a in points {
        for b in points {
            assert_eq!(distance(a, b).to_bits(), distance(b, a).to_bits());
        }
    }
}

#[test]
fn test_position_classifier_deterministic() {
    let frame = body(0.2);
    let config = RuleConfig::default();
    let first = classify_frame(&frame, &[], &config).unwrap();
    let second = classify_frame(&frame, &[], &config).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_zero_offset_torso_is_neutral_not_leaning() {
    let frame = JointFrame::new()
        .with(Landmark::LeftShoulder, Point::new(0.3, 0.2))
        .with(Landmark::RightShoulder, Point::new(0.3, 0.2))
        .with(Landmark::LeftHip, Point::new(0.3, 0.2))
        .with(Landmark::RightHip, Point::new(0.3, 0.2));
    let rules = classify_frame(&frame, &[], &RuleConfig::default()).unwrap();
    let torso = rules.labels(Landmark::Torso, Category::Position);
    assert!(torso.contains(&Label::NeutralSpine));
    assert!(!torso.contains(&Label::LeaningForward));
    assert!(!torso.contains(&Label::LeaningBackward));
}

#[test]
fn test_straight_elbow_is_extended() {
    let frame = body(0.6);
    let rules = classify_frame(&frame, &[], &RuleConfig::default()).unwrap();
    let elbow = rules.labels(Landmark::LeftElbow, Category::Position);
    assert!(elbow.contains(&Label::Extended));
    assert!(!elbow.contains(&Label::Flexed));
    assert!(!elbow.contains(&Label::BentAt90));
}

#[test]
fn test_knee_motion_scenarios() {
    let knee = |ys: &[f32]| -> PoseSequence {
        ys.iter()
            .map(|y| JointFrame::new().with(Landmark::LeftKnee, Point::new(0.4, *y)))
            .collect()
    };
    let config = RuleConfig::default();

    let still = classify_sequence(&knee(&[0.5; 5]), &config);
    assert!(still.contains(Landmark::LeftKnee, Category::Motion, Label::Stationary));

    let rising = classify_sequence(&knee(&[0.5, 0.55, 0.6, 0.65, 0.7]), &config);
    let motion = rising.labels(Landmark::LeftKnee, Category::Motion);
    assert!(motion.contains(&Label::Extension));
    assert!(!motion.contains(&Label::Stationary));
}

#[test]
fn test_subset_and_threshold() {
    use Category::{Motion, Position};

    let expected = RuleStructureBuilder::new()
        .with(Landmark::LeftElbow, Motion, Label::Flexion)
        .with(Landmark::LeftElbow, Motion, Label::Extension)
        .with(Landmark::LeftElbow, Position, Label::CloseToTorso)
        .with(Landmark::Torso, Position, Label::Upright)
        .with(Landmark::LeftFoot, Position, Label::OnGround)
        .build();
    let observed = RuleStructureBuilder::new()
        .with(Landmark::LeftElbow, Motion, Label::Flexion)
        .with(Landmark::LeftElbow, Motion, Label::Extension)
        .with(Landmark::LeftElbow, Motion, Label::Stationary)
        .with(Landmark::LeftElbow, Position, Label::CloseToTorso)
        .with(Landmark::Torso, Position, Label::Upright)
        .build();

    let report = compare(&observed, &expected, 0.7);
    assert_eq!(report.checked, 4);
    assert!((report.score - 0.75).abs() < f32::EPSILON);
    assert!(report.matched);
    assert_eq!(report.mismatches.len(), 1);
    assert_eq!(report.mismatches[0].landmark, Landmark::LeftFoot);
    assert!(!compare(&observed, &expected, 0.8).matched);
}

#[test]
fn test_duplicate_catalog_name() {
    let rules = RuleStructureBuilder::new()
        .with(Landmark::Torso, Category::Position, Label::Upright)
        .build();
    let (catalog, diagnostics) = Catalog::build([
        ExerciseReference::new("Kettlebell Row", rules.clone()),
        ExerciseReference::new("kettlebell row ", rules),
    ]);
    assert_eq!(catalog.len(), 1);
    assert_eq!(diagnostics.len(), 1);
    assert!(matches!(diagnostics[0], RuleError::DuplicateActivity(_)));

    let loaded = Catalog::from_json_str(TEST_CATALOG).unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded.version(), "test-1");
}

#[test]
fn test_end_to_end_curl() {
    let report = analyzer().score(&curl_track("curl"), None);
    assert_eq!(report.frames_used, 5);
    let scored = report.report().unwrap();
    assert_eq!(scored.activity, "Test Curl");
    assert_eq!(scored.checked, 3);
    assert!(scored.matched, "{}", scored.verbose());
    assert!(scored.equipment.as_ref().unwrap().satisfied);
}

#[test]
fn test_mirrored_reference_matches_other_side() {
    let report = analyzer().score(&curl_track("raise"), Some("single arm raise"));
    let scored = report.report().unwrap();
    assert!(scored.matched);
    assert_eq!(scored.orientation, Orientation::Mirrored);
}

#[test]
fn test_rank_prefers_curl() {
    let ranked = analyzer().rank(&curl_track("curl"), 3).unwrap();
    assert_eq!(ranked.len(), 2);
    assert!((ranked[0].score - 1.0).abs() < f32::EPSILON);
    assert_eq!(ranked[0].activity, "Single Arm Raise");
    assert_eq!(ranked[1].activity, "Test Curl");
}

#[test]
fn test_batch_reports_every_file() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good.json");
    curl_track("").to_json_file(&good).unwrap();
    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "{ not json").unwrap();
    let missing = dir.path().join("missing.json");

    let processor = BatchProcessor::new(analyzer(), 2).unwrap();
    let paths: Vec<PathBuf> = vec![good, broken, missing];
    let reports = processor.run(paths, None);

    assert_eq!(reports.len(), 3);
    assert_eq!(reports[0].video, "good");
    assert!(reports[0].report().is_some_and(|r| r.matched));
    assert!(reports[1].report().is_none());
    assert!(reports[2].report().is_none());

    let summary = BatchSummary::from_reports(&reports);
    assert_eq!(summary.total, 3);
    assert_eq!(summary.unscoreable, 2);
}
