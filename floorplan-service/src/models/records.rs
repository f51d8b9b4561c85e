use serde::{Deserialize, Serialize};

/// Which pipeline produced a record. Stored explicitly in every record file
/// and used as the file name prefix.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Analysis,
    Plan,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Analysis => "analysis",
            RecordKind::Plan => "plan",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    /// Width over height, rounded to two decimals.
    pub aspect_ratio: f64,
}

impl ImageInfo {
    /// Returns `None` for degenerate images with a zero height.
    pub fn from_dimensions(width: u32, height: u32) -> Option<Self> {
        if height == 0 {
            return None;
        }
        let ratio = f64::from(width) / f64::from(height);
        Some(Self {
            width,
            height,
            aspect_ratio: (ratio * 100.0).round() / 100.0,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub timestamp: String,
    /// Stored name of the uploaded image inside the upload directory.
    pub filename: String,
    pub image_info: ImageInfo,
    pub analysis: String,
    pub success: bool,
    pub kind: RecordKind,
}

impl AnalysisRecord {
    pub fn new(timestamp: String, filename: String, image_info: ImageInfo, analysis: String) -> Self {
        Self {
            timestamp,
            filename,
            image_info,
            analysis,
            success: true,
            kind: RecordKind::Analysis,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanRecord {
    pub timestamp: String,
    pub requirements: String,
    pub generated_plan: String,
    pub success: bool,
    pub kind: RecordKind,
}

impl PlanRecord {
    pub fn new(timestamp: String, requirements: String, generated_plan: String) -> Self {
        Self {
            timestamp,
            requirements,
            generated_plan,
            success: true,
            kind: RecordKind::Plan,
        }
    }
}

/// Projection of a record file, rebuilt from disk on every history listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryEntry {
    pub filename: String,
    pub timestamp: String,
    pub kind: RecordKind,
}

impl HistoryEntry {
    /// Project a parsed record file. Records written before `kind` was stored
    /// are classified by the presence of an analysis text field.
    pub fn from_record_json(filename: String, value: &serde_json::Value) -> Option<Self> {
        let object = value.as_object()?;

        let kind = object
            .get("kind")
            .and_then(|k| serde_json::from_value::<RecordKind>(k.clone()).ok())
            .unwrap_or_else(|| {
                if object.contains_key("analysis") || object.contains_key("analysisText") {
                    RecordKind::Analysis
                } else {
                    RecordKind::Plan
                }
            });

        let timestamp = object
            .get("timestamp")
            .and_then(|t| t.as_str())
            .unwrap_or_default()
            .to_string();

        Some(Self {
            filename,
            timestamp,
            kind,
        })
    }
}

/// Newest first; ties (same-second records) fall back to the file name.
pub fn sort_newest_first(entries: &mut [HistoryEntry]) {
    entries.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then_with(|| b.filename.cmp(&a.filename))
    });
}
