//! Security metadata group shared by the file header and every subheader.

use crate::field::{Field, FieldKind};
use crate::Version;

/// The classification field bundle (FSCLSY through FSCTLN and their
/// per-segment counterparts). Field widths differ between NITF 2.0 and 2.1;
/// 2.1 widths accommodate every 2.0 value, so resizing 2.0 → 2.1 is
/// lossless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSecurity {
    pub classification_system: Field,
    pub codewords: Field,
    pub control_and_handling: Field,
    pub releasing_instructions: Field,
    pub declassification_type: Field,
    pub declassification_date: Field,
    pub declassification_exemption: Field,
    pub downgrade: Field,
    pub downgrade_datetime: Field,
    pub classification_text: Field,
    pub classification_authority_type: Field,
    pub classification_authority: Field,
    pub classification_reason: Field,
    pub security_source_date: Field,
    pub security_control_number: Field,
}

/// 2.1 widths, in declaration order.
const WIDTHS_21: [usize; 15] = [2, 11, 2, 20, 2, 8, 4, 1, 8, 43, 1, 40, 1, 8, 15];

impl FileSecurity {
    /// Group with all fields blank, sized for `version`.
    pub fn new(version: Version) -> Self {
        let mut sec = Self {
            classification_system: Field::new(FieldKind::BcsA, WIDTHS_21[0]),
            codewords: Field::new(FieldKind::BcsA, WIDTHS_21[1]),
            control_and_handling: Field::new(FieldKind::BcsA, WIDTHS_21[2]),
            releasing_instructions: Field::new(FieldKind::BcsA, WIDTHS_21[3]),
            declassification_type: Field::new(FieldKind::BcsA, WIDTHS_21[4]),
            declassification_date: Field::new(FieldKind::BcsA, WIDTHS_21[5]),
            declassification_exemption: Field::new(FieldKind::BcsA, WIDTHS_21[6]),
            downgrade: Field::new(FieldKind::BcsA, WIDTHS_21[7]),
            downgrade_datetime: Field::new(FieldKind::BcsA, WIDTHS_21[8]),
            classification_text: Field::new(FieldKind::BcsA, WIDTHS_21[9]),
            classification_authority_type: Field::new(FieldKind::BcsA, WIDTHS_21[10]),
            classification_authority: Field::new(FieldKind::BcsA, WIDTHS_21[11]),
            classification_reason: Field::new(FieldKind::BcsA, WIDTHS_21[12]),
            security_source_date: Field::new(FieldKind::BcsA, WIDTHS_21[13]),
            security_control_number: Field::new(FieldKind::BcsA, WIDTHS_21[14]),
        };
        if version == Version::V20 {
            sec.resize_for_version(version);
        }
        sec
    }

    /// Adjust field widths to `version` in place, preserving content.
    ///
    /// Must run before any field of a freshly constructed 2.0 subheader is
    /// written, so values are justified against the correct widths.
    pub fn resize_for_version(&mut self, version: Version) {
        match version {
            Version::V20 => {
                // 2.0 widths where they differ from 2.1.
                self.codewords.resize(40);
                self.control_and_handling.resize(40);
                self.releasing_instructions.resize(40);
                self.classification_authority.resize(20);
                self.downgrade.resize(6);
                self.downgrade_datetime.resize(40);
                self.security_control_number.resize(20);
            }
            Version::V21 | Version::Unknown => {
                self.codewords.resize(WIDTHS_21[1]);
                self.control_and_handling.resize(WIDTHS_21[2]);
                self.releasing_instructions.resize(WIDTHS_21[3]);
                self.classification_authority.resize(WIDTHS_21[11]);
                self.downgrade.resize(WIDTHS_21[7]);
                self.downgrade_datetime.resize(WIDTHS_21[8]);
                self.security_control_number.resize(WIDTHS_21[14]);
            }
        }
    }
}

impl Default for FileSecurity {
    fn default() -> Self {
        Self::new(Version::V21)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn v20_widths_differ() {
        let v21 = FileSecurity::new(Version::V21);
        let v20 = FileSecurity::new(Version::V20);
        assert_eq!(v21.codewords.width(), 11);
        assert_eq!(v20.codewords.width(), 40);
        assert_eq!(v20.downgrade.width(), 6);
        assert_eq!(v21.classification_system.width(), v20.classification_system.width());
    }

    #[test]
    fn resize_roundtrip_preserves_common_content() {
        let mut sec = FileSecurity::new(Version::V20);
        sec.codewords.set_string("CW ALPHA").unwrap();
        sec.classification_authority.set_string("AUTH").unwrap();
        sec.resize_for_version(Version::V21);
        sec.resize_for_version(Version::V20);
        assert_eq!(sec.codewords.trimmed(), "CW ALPHA");
        assert_eq!(sec.classification_authority.trimmed(), "AUTH");
    }
}
