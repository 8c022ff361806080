//! Assignment task types for requests waiting behind the countdown gate.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::error::ValidationError;

/// Unique identifier for a submitted task, using ULID for chronological sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub Ulid);

impl TaskId {
    /// Create a new unique task ID.
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Parse a task ID from a string.
    pub fn parse(s: &str) -> Result<Self, ulid::DecodeError> {
        Ok(Self(Ulid::from_string(s)?))
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A depth along the hole, stored as hundredths of a metre.
///
/// Lengths carry exactly two decimal places, so arithmetic and duplicate
/// comparison never see binary floating point error.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Length(u32);

impl Length {
    pub const ZERO: Length = Length(0);

    /// Largest accepted value, 999999.99.
    pub const MAX: Length = Length(99_999_999);

    pub fn from_hundredths(hundredths: u32) -> Self {
        Self(hundredths)
    }

    pub fn hundredths(self) -> u32 {
        self.0
    }

    /// Difference `self - other`, or `None` when `other` is deeper.
    pub fn checked_sub(self, other: Length) -> Option<Length> {
        self.0.checked_sub(other.0).map(Length)
    }

    /// Parse decimal text such as `"1.5"`, `"12.25"` or `"3"`.
    pub fn parse(field: &'static str, text: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidLength {
            field,
            value: text.to_string(),
        };

        let trimmed = text.trim();
        let (whole, frac) = match trimmed.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (trimmed, ""),
        };

        if whole.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }
        if frac.len() > 2 {
            return Err(ValidationError::TooPrecise {
                field,
                value: text.to_string(),
            });
        }

        let whole: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let frac: u64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<u64>().map_err(|_| invalid())? * 10,
            _ => frac.parse().map_err(|_| invalid())?,
        };

        let hundredths = whole
            .checked_mul(100)
            .and_then(|w| w.checked_add(frac))
            .filter(|h| *h <= u64::from(Self::MAX.0))
            .ok_or(ValidationError::LengthOutOfRange {
                field,
                value: text.to_string(),
            })?;

        Ok(Self(hundredths as u32))
    }
}

impl FromStr for Length {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse("length", s)
    }
}

impl std::fmt::Display for Length {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// Cross-section of the photographed core.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoreSize {
    #[default]
    HalfCore,
    WholeCore,
}

impl CoreSize {
    /// Get the label shown in listings.
    pub fn as_str(&self) -> &'static str {
        match self {
            CoreSize::HalfCore => "Half Core",
            CoreSize::WholeCore => "Whole Core",
        }
    }
}

impl std::fmt::Display for CoreSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CoreSize {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['_', '-', ' '], "").as_str() {
            "half" | "halfcore" => Ok(CoreSize::HalfCore),
            "whole" | "wholecore" => Ok(CoreSize::WholeCore),
            _ => Err(ValidationError::InvalidCoreSize(s.to_string())),
        }
    }
}

/// Opaque reference to a photo held by the file renamer, relative to the photo root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoKey(String);

impl PhotoKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Final path segment of the key.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Extension of the file name without the dot, if any.
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name();
        match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext),
            _ => None,
        }
    }

    /// Key of a sibling file in the same directory.
    pub fn with_file_name(&self, file_name: &str) -> PhotoKey {
        match self.0.rsplit_once('/') {
            Some((dir, _)) => PhotoKey(format!("{dir}/{file_name}")),
            None => PhotoKey(file_name.to_string()),
        }
    }
}

impl std::fmt::Display for PhotoKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The tuple that must be unique across all committed records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DuplicateKey {
    pub hole_id: String,
    pub top_length: Length,
    pub bottom_length: Length,
    pub box_id: u32,
}

impl std::fmt::Display for DuplicateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}-{} box {}",
            self.hole_id, self.top_length, self.bottom_length, self.box_id
        )
    }
}

/// Raw operator input, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRequest {
    pub hole_id: String,
    pub top_length: String,
    pub bottom_length: String,
    pub box_id: String,
    pub core_size: CoreSize,
    pub source: Option<PhotoKey>,
}

/// A validated request to assign one photographed box to an interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentTask {
    /// Unique identifier for this task.
    pub id: TaskId,
    /// Drill hole the box came from.
    pub hole_id: String,
    /// Start of the interval.
    pub top_length: Length,
    /// End of the interval, always deeper than `top_length`.
    pub bottom_length: Length,
    /// Box number.
    pub box_id: u32,
    /// Half or whole core.
    pub core_size: CoreSize,
    /// Photo to rename on commit.
    pub source: PhotoKey,
    /// When the operator submitted the task.
    pub submitted_at: DateTime<Utc>,
}

impl AssignmentTask {
    /// Create a task, checking every field invariant.
    pub fn new(
        hole_id: impl Into<String>,
        top_length: Length,
        bottom_length: Length,
        box_id: u32,
        core_size: CoreSize,
        source: PhotoKey,
    ) -> Result<Self, ValidationError> {
        let hole_id = validate_hole_id(hole_id.into())?;
        validate_interval(top_length, bottom_length)?;
        if source.as_str().trim().is_empty() {
            return Err(ValidationError::MissingSourceFile(source.to_string()));
        }

        Ok(Self {
            id: TaskId::new(),
            hole_id,
            top_length,
            bottom_length,
            box_id,
            core_size,
            source,
            submitted_at: Utc::now(),
        })
    }

    /// Parse and validate raw operator input.
    pub fn from_request(request: &AssignmentRequest) -> Result<Self, ValidationError> {
        let top_length = Length::parse("top_length", &request.top_length)?;
        let bottom_length = Length::parse("bottom_length", &request.bottom_length)?;
        let box_id = parse_box_id(&request.box_id)?;
        let source = request
            .source
            .clone()
            .ok_or_else(|| ValidationError::MissingSourceFile(String::new()))?;

        Self::new(
            request.hole_id.clone(),
            top_length,
            bottom_length,
            box_id,
            request.core_size,
            source,
        )
    }

    /// Uniqueness tuple for duplicate detection.
    pub fn key(&self) -> DuplicateKey {
        DuplicateKey {
            hole_id: self.hole_id.clone(),
            top_length: self.top_length,
            bottom_length: self.bottom_length,
            box_id: self.box_id,
        }
    }

    /// Length of the interval.
    pub fn total_length(&self) -> Length {
        // bottom > top is checked on construction
        self.bottom_length
            .checked_sub(self.top_length)
            .unwrap_or(Length::ZERO)
    }

    /// File stem encoding the assignment, e.g. `H1_0.00-1.50`.
    pub fn canonical_stem(&self) -> String {
        format!(
            "{}_{}-{}",
            self.hole_id, self.top_length, self.bottom_length
        )
    }

    /// Target file name: canonical stem plus the source's extension.
    pub fn canonical_file_name(&self) -> String {
        match self.source.extension() {
            Some(ext) => format!("{}.{}", self.canonical_stem(), ext),
            None => self.canonical_stem(),
        }
    }
}

/// Characters no photo file name may contain on the supported filesystems.
const UNSTORABLE: [char; 9] = ['/', '\\', '<', '>', ':', '"', '|', '?', '*'];

pub(crate) fn validate_hole_id(hole_id: String) -> Result<String, ValidationError> {
    let trimmed = hole_id.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyHoleId);
    }
    if trimmed.contains(UNSTORABLE) || trimmed.chars().any(char::is_control) {
        return Err(ValidationError::InvalidHoleId(hole_id));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn validate_interval(top: Length, bottom: Length) -> Result<(), ValidationError> {
    if bottom <= top {
        return Err(ValidationError::EmptyInterval { top, bottom });
    }
    Ok(())
}

pub(crate) fn parse_box_id(text: &str) -> Result<u32, ValidationError> {
    text.trim()
        .parse()
        .map_err(|_| ValidationError::InvalidBoxId(text.to_string()))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::disallowed_methods)]

    use super::*;

    fn request(top: &str, bottom: &str) -> AssignmentRequest {
        AssignmentRequest {
            hole_id: "H1".into(),
            top_length: top.into(),
            bottom_length: bottom.into(),
            box_id: "3".into(),
            core_size: CoreSize::HalfCore,
            source: Some(PhotoKey::new("IMG_0001.JPG")),
        }
    }

    #[test]
    fn length_parses_up_to_two_decimals() {
        assert_eq!(Length::parse("top", "1.5").unwrap().hundredths(), 150);
        assert_eq!(Length::parse("top", "12.25").unwrap().hundredths(), 1225);
        assert_eq!(Length::parse("top", " 3 ").unwrap().hundredths(), 300);
        assert_eq!(Length::parse("top", ".75").unwrap().hundredths(), 75);
        assert_eq!(Length::parse("top", "0").unwrap(), Length::ZERO);
    }

    #[test]
    fn length_rejects_bad_text() {
        assert!(matches!(
            Length::parse("top", "1.234"),
            Err(ValidationError::TooPrecise { .. })
        ));
        assert!(matches!(
            Length::parse("top", "-1"),
            Err(ValidationError::InvalidLength { .. })
        ));
        assert!(matches!(
            Length::parse("top", ""),
            Err(ValidationError::InvalidLength { .. })
        ));
        assert!(matches!(
            Length::parse("top", "1e3"),
            Err(ValidationError::InvalidLength { .. })
        ));
        assert!(matches!(
            Length::parse("top", "1000000"),
            Err(ValidationError::LengthOutOfRange { .. })
        ));
    }

    #[test]
    fn length_displays_two_decimals() {
        assert_eq!(Length::from_hundredths(0).to_string(), "0.00");
        assert_eq!(Length::from_hundredths(150).to_string(), "1.50");
        assert_eq!(Length::from_hundredths(10_005).to_string(), "100.05");
    }

    #[test]
    fn task_rejects_inverted_or_empty_interval() {
        assert!(matches!(
            AssignmentTask::from_request(&request("1.50", "1.50")),
            Err(ValidationError::EmptyInterval { .. })
        ));
        assert!(matches!(
            AssignmentTask::from_request(&request("2", "1")),
            Err(ValidationError::EmptyInterval { .. })
        ));
    }

    #[test]
    fn task_requires_hole_and_source() {
        let mut req = request("0", "1");
        req.hole_id = "   ".into();
        assert_eq!(
            AssignmentTask::from_request(&req),
            Err(ValidationError::EmptyHoleId)
        );

        let mut req = request("0", "1");
        req.source = None;
        assert!(matches!(
            AssignmentTask::from_request(&req),
            Err(ValidationError::MissingSourceFile(_))
        ));
    }

    #[test]
    fn hole_id_must_fit_in_a_file_name() {
        for bad in ["H/1", "H\\1", "H:1", "H*1", "H?1", "H|1", "H<1>", "H\"1", "H\t1"] {
            let mut req = request("0", "1");
            req.hole_id = bad.into();
            assert!(
                matches!(
                    AssignmentTask::from_request(&req),
                    Err(ValidationError::InvalidHoleId(_))
                ),
                "{bad:?} accepted"
            );
        }

        let mut req = request("0", "1.5");
        req.hole_id = "DDH[1]#2".into();
        let task = AssignmentTask::from_request(&req).unwrap();
        assert_eq!(task.canonical_stem(), "DDH[1]#2_0.00-1.50");
    }

    #[test]
    fn canonical_name_keeps_extension() {
        let task = AssignmentTask::from_request(&request("0", "1.5")).unwrap();
        assert_eq!(task.canonical_stem(), "H1_0.00-1.50");
        assert_eq!(task.canonical_file_name(), "H1_0.00-1.50.JPG");
        assert_eq!(task.total_length().to_string(), "1.50");
    }

    #[test]
    fn photo_key_sibling_and_extension() {
        let key = PhotoKey::new("tray/IMG_0002.jpeg");
        assert_eq!(key.file_name(), "IMG_0002.jpeg");
        assert_eq!(key.extension(), Some("jpeg"));
        assert_eq!(key.with_file_name("H1.jpeg").as_str(), "tray/H1.jpeg");
        assert_eq!(PhotoKey::new(".hidden").extension(), None);
    }

    #[test]
    fn core_size_parses_labels() {
        assert_eq!("half".parse::<CoreSize>().unwrap(), CoreSize::HalfCore);
        assert_eq!("Whole Core".parse::<CoreSize>().unwrap(), CoreSize::WholeCore);
        assert!("quarter".parse::<CoreSize>().is_err());
    }
}
