// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Equipment records and per-video majority voting.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, de};

use crate::geometry::Point;

/// Maximum incline difference, in degrees, for two bench inclines to agree.
pub const INCLINE_TOLERANCE: f32 = 10.0;

/// One equipment detection in one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentDetection {
    /// Detector class label, e.g. "kettlebell".
    pub label: String,
    /// Detection confidence in `[0, 1]`.
    pub confidence: f32,
    /// Box center in the frame's coordinate domain, if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<Point>,
    /// Bench incline in degrees, if the detector estimates it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incline: Option<f32>,
}

impl EquipmentDetection {
    /// Create a detection without a location.
    #[must_use]
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
            center: None,
            incline: None,
        }
    }

    /// Attach a box center.
    #[must_use]
    pub const fn with_center(mut self, center: Point) -> Self {
        self.center = Some(center);
        self
    }

    /// Attach a bench incline.
    #[must_use]
    pub const fn with_incline(mut self, degrees: f32) -> Self {
        self.incline = Some(degrees);
        self
    }
}

/// Normalize an equipment label for comparison.
#[must_use]
pub fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}

/// Equipment observed in a video or expected by a reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EquipmentRecord {
    /// Equipment types, most relevant first.
    #[serde(rename = "type", default)]
    pub types: Vec<String>,
    /// Bench incline in degrees.
    ///
    /// Read from a number, a numeric string or a one-element list of either;
    /// `"none"` and an empty list mean no incline.
    #[serde(
        rename = "bench incline",
        default,
        deserialize_with = "deserialize_incline",
        skip_serializing_if = "Option::is_none"
    )]
    pub bench_incline: Option<f32>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum InclineField {
    Degrees(f32),
    Text(String),
    List(Vec<InclineField>),
}

impl InclineField {
    fn degrees(self) -> Result<Option<f32>, String> {
        match self {
            Self::Degrees(v) => Ok(Some(v)),
            Self::Text(text) => {
                let text = text.trim();
                if text.is_empty() || text.eq_ignore_ascii_case("none") {
                    return Ok(None);
                }
                text.parse::<f32>()
                    .map(Some)
                    .map_err(|_| format!("invalid bench incline '{text}'"))
            }
            Self::List(items) => {
                if items.len() > 1 {
                    return Err(format!("expected one bench incline, found {}", items.len()));
                }
                items.into_iter().next().map_or(Ok(None), Self::degrees)
            }
        }
    }
}

fn deserialize_incline<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f32>, D::Error> {
    Option::<InclineField>::deserialize(deserializer)?
        .map_or(Ok(None), InclineField::degrees)
        .map_err(de::Error::custom)
}

impl EquipmentRecord {
    /// Create a record from equipment types.
    #[must_use]
    pub fn new<S: AsRef<str>>(types: impl IntoIterator<Item = S>) -> Self {
        let mut record = Self::default();
        for t in types {
            record.push(t.as_ref());
        }
        record
    }

    /// Set the bench incline.
    #[must_use]
    pub const fn with_bench_incline(mut self, degrees: f32) -> Self {
        self.bench_incline = Some(degrees);
        self
    }

    /// Add a type if not already present.
    pub fn push(&mut self, label: &str) {
        let label = normalize_label(label);
        if !label.is_empty() && !self.types.contains(&label) {
            self.types.push(label);
        }
    }

    /// Whether a type is present.
    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        let label = normalize_label(label);
        self.types.iter().any(|t| *t == label)
    }

    /// Whether no equipment type is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Subset check of `expected` against this observed record.
    ///
    /// # Returns
    ///
    /// * `None` when `expected` lists no types (no constraint).
    /// * `Some(true)` when every expected type is observed and the bench
    ///   inclines agree, or at least one side has no incline.
    #[must_use]
    pub fn satisfies(&self, expected: &Self) -> Option<bool> {
        if expected.is_empty() {
            return None;
        }
        let types_ok = expected.types.iter().all(|t| self.contains(t));
        let incline_ok = match (self.bench_incline, expected.bench_incline) {
            (Some(observed), Some(wanted)) => (observed - wanted).abs() <= INCLINE_TOLERANCE,
            _ => true,
        };
        Some(types_ok && incline_ok)
    }

    /// Normalize labels and drop duplicates and empties.
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self::new(&self.types).with_incline_opt(self.bench_incline)
    }

    const fn with_incline_opt(mut self, incline: Option<f32>) -> Self {
        self.bench_incline = incline;
        self
    }
}

/// Majority vote of equipment detections across the frames of one video.
#[derive(Debug, Clone, Default)]
pub struct EquipmentTally {
    votes: BTreeMap<String, usize>,
    inclines: Vec<f32>,
    min_confidence: f32,
}

impl EquipmentTally {
    /// Create a tally counting detections at or above `min_confidence`.
    #[must_use]
    pub fn new(min_confidence: f32) -> Self {
        Self {
            min_confidence,
            ..Self::default()
        }
    }

    /// Count the detections of one frame.
    pub fn observe(&mut self, detections: &[EquipmentDetection]) {
        for det in detections {
            if det.confidence < self.min_confidence {
                continue;
            }
            let label = normalize_label(&det.label);
            if label.is_empty() {
                continue;
            }
            if let Some(incline) = det.incline.filter(|v| v.is_finite()) {
                self.inclines.push(incline);
            }
            *self.votes.entry(label).or_insert(0) += 1;
        }
    }

    /// Votes per label.
    #[must_use]
    pub fn votes(&self) -> &BTreeMap<String, usize> {
        &self.votes
    }

    /// Keep the `top_k` most voted labels, ties broken by name.
    ///
    /// The bench incline is the mean of all reported inclines.
    #[must_use]
    pub fn finish(&self, top_k: usize) -> EquipmentRecord {
        let mut ranked: Vec<(&String, &usize)> = self.votes.iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

        let mut record = EquipmentRecord::new(ranked.into_iter().take(top_k).map(|(label, _)| label));
        if !self.inclines.is_empty() {
            #[allow(clippy::cast_precision_loss)]
            let mean = self.inclines.iter().sum::<f32>() / self.inclines.len() as f32;
            record.bench_incline = Some(mean);
        }
        record
    }
}

/// Equipment keywords recognized in free-text descriptions.
pub const EQUIPMENT_KEYWORDS: [&str; 6] = ["kettlebell", "dumbbell", "barbell", "bench", "ball", "band"];

/// Equipment types mentioned in a lower-cased description, in keyword order.
#[must_use]
pub fn equipment_from_text(text: &str) -> EquipmentRecord {
    let text = text.to_lowercase();
    EquipmentRecord::new(
        EQUIPMENT_KEYWORDS
            .iter()
            .filter(|kw| text.split(|c: char| !c.is_alphanumeric()).any(|w| w.trim_end_matches('s') == **kw)),
    )
}
