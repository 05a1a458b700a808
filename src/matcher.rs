// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Matcher and scorer.
//!
//! Every landmark/category pair with a non-empty expected set is one check.
//! A check is satisfied when the expected labels are a subset of the
//! observed labels; extra observed labels are never penalized. The score is
//! the fraction of satisfied checks, 1.0 when nothing was checked.

use crate::catalog::ExerciseReference;
use crate::equipment::EquipmentRecord;
use crate::label::Category;
use crate::results::{EquipmentCheck, MatchReport, Mismatch, Orientation};
use crate::rules::RuleStructure;

#[allow(clippy::cast_precision_loss)]
fn ratio(satisfied: usize, checked: usize) -> f32 {
    if checked == 0 {
        1.0
    } else {
        satisfied as f32 / checked as f32
    }
}

/// Compare observed rules with expected rules.
///
/// # Arguments
///
/// * `observed` - Rules derived from the video.
/// * `expected` - Rules required by the reference.
/// * `threshold` - Minimum score for `matched`; 1.0 requires every check.
///
/// # Returns
///
/// * A [`MatchReport`] with one [`Mismatch`] per failed check. The activity
///   name is left empty.
#[must_use]
pub fn compare(observed: &RuleStructure, expected: &RuleStructure, threshold: f32) -> MatchReport {
    let mut checked = 0;
    let mut satisfied = 0;
    let mut mismatches = Vec::new();

    for (landmark, region) in expected.iter() {
        for category in Category::BOTH {
            let want = region.get(category);
            if want.is_empty() {
                continue;
            }
            checked += 1;
            let have = observed.labels(landmark, category);
            if want.is_subset(have) {
                satisfied += 1;
            } else {
                mismatches.push(Mismatch {
                    landmark,
                    category,
                    expected: want.clone(),
                    observed: have.clone(),
                });
            }
        }
    }

    let score = ratio(satisfied, checked);
    MatchReport {
        activity: String::new(),
        score,
        threshold,
        checked,
        satisfied,
        matched: score >= threshold,
        orientation: Orientation::AsPerformed,
        mismatches,
        equipment: None,
    }
}

/// Add the equipment check to a report when the reference constrains it.
fn with_equipment(
    mut report: MatchReport,
    observed: &EquipmentRecord,
    expected: &EquipmentRecord,
) -> MatchReport {
    if let Some(ok) = observed.satisfies(expected) {
        report.checked += 1;
        report.satisfied += usize::from(ok);
        report.score = ratio(report.satisfied, report.checked);
        report.matched = report.score >= report.threshold;
        report.equipment = Some(EquipmentCheck {
            expected: expected.clone(),
            observed: observed.clone(),
            satisfied: ok,
        });
    }
    report
}

/// Score an observed attempt against a reference.
///
/// Mirrored references are also evaluated with left and right swapped; the
/// better score wins, ties going to the recorded orientation.
#[must_use]
pub fn score_attempt(
    observed: &RuleStructure,
    equipment: &EquipmentRecord,
    reference: &ExerciseReference,
    threshold: f32,
) -> MatchReport {
    let score = |rules: &RuleStructure, orientation| {
        let mut report = with_equipment(
            compare(rules, &reference.rules, threshold),
            equipment,
            &reference.equipment,
        );
        report.activity.clone_from(&reference.activity);
        report.orientation = orientation;
        report
    };

    let direct = score(observed, Orientation::AsPerformed);
    if !reference.mirrored {
        return direct;
    }

    let swapped = score(&observed.mirrored(), Orientation::Mirrored);
    if swapped.score > direct.score {
        swapped
    } else {
        direct
    }
}

/// Score an attempt against many references and keep the best `top_k`.
///
/// Sorted by descending score, ties broken by activity name.
#[must_use]
pub fn rank<'a>(
    observed: &RuleStructure,
    equipment: &EquipmentRecord,
    references: impl IntoIterator<Item = &'a ExerciseReference>,
    threshold: f32,
    top_k: usize,
) -> Vec<MatchReport> {
    let mut reports: Vec<MatchReport> = references
        .into_iter()
        .map(|r| score_attempt(observed, equipment, r, threshold))
        .collect();
    reports.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.activity.cmp(&b.activity))
    });
    reports.truncate(top_k);
    reports
}
