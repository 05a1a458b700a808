// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Rule engine configuration.
//!
//! This module defines [`RuleConfig`], the single home of every classifier
//! threshold, and [`CoordinateDomain`], the coordinate space those thresholds
//! are calibrated for. Distance thresholds are NOT scale invariant: a config
//! must only be applied to joint frames in its own domain.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RuleError};

/// Coordinate space of joint frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateDomain {
    /// Image-relative coordinates in `[0, 1]`.
    #[default]
    Normalized,
    /// Absolute pixel coordinates.
    Pixel,
}

impl CoordinateDomain {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Normalized => "normalized",
            Self::Pixel => "pixel",
        }
    }
}

impl fmt::Display for CoordinateDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CoordinateDomain {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "normalized" | "norm" | "relative" => Ok(Self::Normalized),
            "pixel" | "pixels" | "px" => Ok(Self::Pixel),
            _ => Err(RuleError::ConfigError(format!(
                "invalid coordinate domain '{s}', expected one of: normalized, pixel"
            ))),
        }
    }
}

/// Thresholds and options for rule derivation and matching.
///
/// Distances are in units of [`Self::domain`]; angles are in degrees.
///
/// # Example
///
/// ```rust
/// use exercise_rules::{CoordinateDomain, RuleConfig};
///
/// let config = RuleConfig::for_domain(CoordinateDomain::Pixel)
///     .with_match_threshold(0.75)
///     .with_stationary_tolerance(2.0);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RuleConfigFile")]
pub struct RuleConfig {
    /// Coordinate domain the distance thresholds are calibrated for.
    pub domain: CoordinateDomain,
    /// Minimum vertical shoulder-to-hip offset for "upright".
    pub upright: f32,
    /// Maximum horizontal shoulder-to-hip offset for "neutral spine".
    pub neutral_spine: f32,
    /// Minimum horizontal shoulder-to-hip offset for leaning.
    pub lean: f32,
    /// Generic proximity threshold ("close to torso", "over head", "seated").
    pub close: f32,
    /// Minimum horizontal hand-to-shoulder offset for "horizontal outward".
    pub outward: f32,
    /// Maximum horizontal hand-to-shoulder offset for "horizontal inward".
    pub inward: f32,
    /// Maximum vertical foot-to-foot offset for "flat".
    pub flat: f32,
    /// Maximum hand-to-equipment distance for "holding equipment".
    pub hold_distance: f32,
    /// Lower bound of the feet-to-shoulders width ratio.
    pub shoulder_width_min: f32,
    /// Upper bound of the feet-to-shoulders width ratio.
    pub shoulder_width_max: f32,
    /// Joint angle below which a limb is "flexed"; also the center of the
    /// 90-degree band.
    pub flexed_angle: f32,
    /// Half-width of the "bent at 90 degrees" band.
    pub bent_range: f32,
    /// Maximum deviation from 180 degrees for "extended".
    pub straight_angle: f32,
    /// Minimum hip fold (degrees away from straight) for "hip hinge".
    pub hip_hinge_angle: f32,
    /// Deltas with an absolute value up to this are treated as no movement.
    pub stationary_tolerance: f32,
    /// Minimum detector confidence for an equipment presence vote.
    pub equipment_confidence: f32,
    /// Number of most-voted equipment labels kept per video.
    pub equipment_top_k: usize,
    /// Minimum score for a match (1.0 means every check must pass).
    pub match_threshold: f32,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self::for_domain(CoordinateDomain::Normalized)
    }
}

impl RuleConfig {
    /// Create a new configuration with normalized-domain defaults.
    ///
    /// # Returns
    ///
    /// * A new `RuleConfig` instance with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Default thresholds calibrated for a coordinate domain.
    ///
    /// # Arguments
    ///
    /// * `domain` - The coordinate space of the joint frames to classify.
    #[must_use]
    pub const fn for_domain(domain: CoordinateDomain) -> Self {
        let (upright, neutral_spine, lean, close, outward, inward, flat, hold_distance) =
            match domain {
                CoordinateDomain::Normalized => (0.1, 0.05, 0.05, 0.05, 0.15, 0.05, 0.02, 0.1),
                CoordinateDomain::Pixel => (15.0, 10.0, 10.0, 10.0, 50.0, 10.0, 5.0, 40.0),
            };

        Self {
            domain,
            upright,
            neutral_spine,
            lean,
            close,
            outward,
            inward,
            flat,
            hold_distance,
            shoulder_width_min: 0.9,
            shoulder_width_max: 1.5,
            flexed_angle: 90.0,
            bent_range: 15.0,
            straight_angle: 10.0,
            hip_hinge_angle: 30.0,
            stationary_tolerance: 0.0,
            equipment_confidence: 0.5,
            equipment_top_k: 3,
            match_threshold: 0.8,
        }
    }

    /// Set the minimum score for a match.
    ///
    /// # Arguments
    ///
    /// * `threshold` - Fraction of checks that must pass (0.0 to 1.0).
    ///
    /// # Returns
    ///
    /// * The modified `RuleConfig`.
    #[must_use]
    pub const fn with_match_threshold(mut self, threshold: f32) -> Self {
        self.match_threshold = threshold;
        self
    }

    /// Set the tolerance under which deltas count as no movement.
    #[must_use]
    pub const fn with_stationary_tolerance(mut self, tolerance: f32) -> Self {
        self.stationary_tolerance = tolerance;
        self
    }

    /// Set the generic proximity threshold.
    #[must_use]
    pub const fn with_close(mut self, close: f32) -> Self {
        self.close = close;
        self
    }

    /// Set the upright threshold.
    #[must_use]
    pub const fn with_upright(mut self, upright: f32) -> Self {
        self.upright = upright;
        self
    }

    /// Set the neutral spine threshold.
    #[must_use]
    pub const fn with_neutral_spine(mut self, neutral_spine: f32) -> Self {
        self.neutral_spine = neutral_spine;
        self
    }

    /// Set the leaning threshold.
    #[must_use]
    pub const fn with_lean(mut self, lean: f32) -> Self {
        self.lean = lean;
        self
    }

    /// Set the flexion angle and the half-width of the 90-degree band.
    ///
    /// # Arguments
    ///
    /// * `flexed` - Angle in degrees below which a joint is flexed.
    /// * `bent_range` - Half-width in degrees of the band around `flexed`.
    ///
    /// # Returns
    ///
    /// * The modified `RuleConfig`.
    #[must_use]
    pub const fn with_flexion(mut self, flexed: f32, bent_range: f32) -> Self {
        self.flexed_angle = flexed;
        self.bent_range = bent_range;
        self
    }

    /// Set the maximum deviation from a straight limb.
    #[must_use]
    pub const fn with_straight_angle(mut self, degrees: f32) -> Self {
        self.straight_angle = degrees;
        self
    }

    /// Set the distance under which a hand holds equipment.
    #[must_use]
    pub const fn with_hold_distance(mut self, distance: f32) -> Self {
        self.hold_distance = distance;
        self
    }

    /// Set equipment voting options.
    ///
    /// # Arguments
    ///
    /// * `confidence` - Minimum detection confidence for a vote.
    /// * `top_k` - Number of most-voted labels kept.
    ///
    /// # Returns
    ///
    /// * The modified `RuleConfig`.
    #[must_use]
    pub const fn with_equipment_voting(mut self, confidence: f32, top_k: usize) -> Self {
        self.equipment_confidence = confidence;
        self.equipment_top_k = top_k;
        self
    }

    /// Load a configuration from a JSON file. Missing fields take the
    /// defaults of the file's `domain` (normalized when absent).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is malformed, or fails
    /// [`Self::validate`].
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents).map_err(|e| {
            RuleError::ConfigError(format!("failed to parse {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write this configuration as pretty-printed JSON, creating parent
    /// directories if necessary.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Check that every threshold is usable.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::ConfigError`] naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        let distances = [
            ("upright", self.upright),
            ("neutral_spine", self.neutral_spine),
            ("lean", self.lean),
            ("close", self.close),
            ("outward", self.outward),
            ("inward", self.inward),
            ("flat", self.flat),
            ("hold_distance", self.hold_distance),
            ("stationary_tolerance", self.stationary_tolerance),
            ("bent_range", self.bent_range),
            ("straight_angle", self.straight_angle),
            ("hip_hinge_angle", self.hip_hinge_angle),
        ];
        if let Some((name, _)) = distances.iter().find(|(_, v)| !v.is_finite() || *v < 0.0) {
            return Err(invalid(name, "must be a non-negative number"));
        }

        if !(self.flexed_angle > 0.0 && self.flexed_angle < 180.0) {
            return Err(invalid("flexed_angle", "must be within (0, 180)"));
        }
        if self.straight_angle >= 180.0 || self.hip_hinge_angle >= 180.0 {
            return Err(invalid("straight_angle", "angles must be below 180"));
        }
        if !(self.shoulder_width_min > 0.0 && self.shoulder_width_min <= self.shoulder_width_max) {
            return Err(invalid(
                "shoulder_width_min",
                "must be positive and not above shoulder_width_max",
            ));
        }
        if !(0.0..=1.0).contains(&self.equipment_confidence) {
            return Err(invalid("equipment_confidence", "must be within [0, 1]"));
        }
        if self.equipment_top_k == 0 {
            return Err(invalid("equipment_top_k", "must be > 0"));
        }
        if !(0.0..=1.0).contains(&self.match_threshold) {
            return Err(invalid("match_threshold", "must be within [0, 1]"));
        }
        Ok(())
    }
}

/// On-disk configuration shape. Missing fields take the defaults of the
/// file's own `domain`, never those of another domain.
#[derive(Debug, Deserialize)]
struct RuleConfigFile {
    #[serde(default)]
    domain: CoordinateDomain,
    upright: Option<f32>,
    neutral_spine: Option<f32>,
    lean: Option<f32>,
    close: Option<f32>,
    outward: Option<f32>,
    inward: Option<f32>,
    flat: Option<f32>,
    hold_distance: Option<f32>,
    shoulder_width_min: Option<f32>,
    shoulder_width_max: Option<f32>,
    flexed_angle: Option<f32>,
    bent_range: Option<f32>,
    straight_angle: Option<f32>,
    hip_hinge_angle: Option<f32>,
    stationary_tolerance: Option<f32>,
    equipment_confidence: Option<f32>,
    equipment_top_k: Option<usize>,
    match_threshold: Option<f32>,
}

impl From<RuleConfigFile> for RuleConfig {
    fn from(file: RuleConfigFile) -> Self {
        let base = Self::for_domain(file.domain);
        Self {
            domain: file.domain,
            upright: file.upright.unwrap_or(base.upright),
            neutral_spine: file.neutral_spine.unwrap_or(base.neutral_spine),
            lean: file.lean.unwrap_or(base.lean),
            close: file.close.unwrap_or(base.close),
            outward: file.outward.unwrap_or(base.outward),
            inward: file.inward.unwrap_or(base.inward),
            flat: file.flat.unwrap_or(base.flat),
            hold_distance: file.hold_distance.unwrap_or(base.hold_distance),
            shoulder_width_min: file.shoulder_width_min.unwrap_or(base.shoulder_width_min),
            shoulder_width_max: file.shoulder_width_max.unwrap_or(base.shoulder_width_max),
            flexed_angle: file.flexed_angle.unwrap_or(base.flexed_angle),
            bent_range: file.bent_range.unwrap_or(base.bent_range),
            straight_angle: file.straight_angle.unwrap_or(base.straight_angle),
            hip_hinge_angle: file.hip_hinge_angle.unwrap_or(base.hip_hinge_angle),
            stationary_tolerance: file.stationary_tolerance.unwrap_or(base.stationary_tolerance),
            equipment_confidence: file.equipment_confidence.unwrap_or(base.equipment_confidence),
            equipment_top_k: file.equipment_top_k.unwrap_or(base.equipment_top_k),
            match_threshold: file.match_threshold.unwrap_or(base.match_threshold),
        }
    }
}

fn invalid(field: &str, reason: &str) -> RuleError {
    RuleError::ConfigError(format!("{field} {reason}"))
}
