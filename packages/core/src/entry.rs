//! Manually typed records, resolved by an explicit operator decision.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::record::NewRecord;
use crate::task::{CoreSize, Length, parse_box_id, validate_hole_id, validate_interval};

/// Operator answer when leaving edit mode with an unsaved row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManualEntryDecision {
    /// Validate and insert the row.
    Save,
    /// Drop the row.
    Discard,
    /// Keep the row and stay in edit mode.
    Cancel,
}

/// A row typed into the records table, cell by cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualEntry {
    pub hole_id: String,
    pub top_length: String,
    pub bottom_length: String,
    pub box_id: String,
    pub core_size: String,
}

impl ManualEntry {
    /// Parse the cells into record content.
    ///
    /// Manual rows have no photo, so only the field rules apply.
    pub fn to_record(&self) -> Result<NewRecord, ValidationError> {
        let hole_id = validate_hole_id(self.hole_id.clone())?;
        let top_length = Length::parse("top_length", &self.top_length)?;
        let bottom_length = Length::parse("bottom_length", &self.bottom_length)?;
        validate_interval(top_length, bottom_length)?;
        let box_id = parse_box_id(&self.box_id)?;
        let core_size: CoreSize = self.core_size.parse()?;

        Ok(NewRecord {
            hole_id,
            top_length,
            bottom_length,
            total_length: bottom_length
                .checked_sub(top_length)
                .unwrap_or(Length::ZERO),
            box_id,
            core_size,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::disallowed_methods)]

    use super::*;

    #[test]
    fn manual_entry_derives_total_length() {
        let entry = ManualEntry {
            hole_id: "DDH-7".into(),
            top_length: "10.2".into(),
            bottom_length: "13.05".into(),
            box_id: "4".into(),
            core_size: "Whole Core".into(),
        };
        let record = entry.to_record().unwrap();
        assert_eq!(record.total_length.to_string(), "2.85");
        assert_eq!(record.core_size, CoreSize::WholeCore);
    }

    #[test]
    fn manual_entry_rejects_bad_box() {
        let entry = ManualEntry {
            hole_id: "DDH-7".into(),
            top_length: "1".into(),
            bottom_length: "2".into(),
            box_id: "four".into(),
            core_size: "half".into(),
        };
        assert_eq!(
            entry.to_record(),
            Err(ValidationError::InvalidBoxId("four".into()))
        );
    }
}
