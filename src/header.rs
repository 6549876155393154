//! File header and the per-segment component-info arrays.

use crate::field::{Field, FieldKind};
use crate::security::FileSecurity;
use crate::tre::Extensions;
use crate::Version;

/// One entry of a file-header component-info array: the subheader-length and
/// data-length fields describing the matching segment. Field widths depend
/// on the segment kind:
///
/// ```text
/// Kind                 Subheader len   Data len
/// image      (LISH/LI)        6            10
/// graphic    (LSSH/LS)        4             6
/// label      (LLSH/LL)        4             3
/// text       (LTSH/LT)        4             5
/// DES        (LDSH/LD)        4             9
/// RES        (LRESH/LRE)      4             7
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentInfo {
    pub subheader_length: Field,
    pub data_length: Field,
}

impl ComponentInfo {
    pub fn new(subheader_width: usize, data_width: usize) -> Self {
        Self {
            subheader_length: Field::new(FieldKind::BcsN, subheader_width),
            data_length: Field::new(FieldKind::BcsN, data_width),
        }
    }

    pub fn image() -> Self {
        Self::new(6, 10)
    }

    pub fn graphic() -> Self {
        Self::new(4, 6)
    }

    pub fn label() -> Self {
        Self::new(4, 3)
    }

    pub fn text() -> Self {
        Self::new(4, 5)
    }

    pub fn data_extension() -> Self {
        Self::new(4, 9)
    }

    pub fn reserved_extension() -> Self {
        Self::new(4, 7)
    }
}

/// The NITF file header: identification and origination fields, the six
/// segment-count fields with their parallel component-info arrays, and two
/// TRE sections (UDHD and XHD) with their overflow back-references.
#[derive(Debug, Clone, PartialEq)]
pub struct FileHeader {
    pub fhdr: Field,
    pub fver: Field,
    pub clevel: Field,
    pub stype: Field,
    pub ostaid: Field,
    pub fdt: Field,
    pub ftitle: Field,
    pub classification: Field,
    pub security: FileSecurity,
    pub fscop: Field,
    pub fscpys: Field,
    pub encryp: Field,
    pub background_color: Field,
    pub oname: Field,
    pub ophone: Field,
    pub fl: Field,
    pub hl: Field,

    pub numi: Field,
    pub nums: Field,
    pub numx: Field,
    pub numt: Field,
    pub numdes: Field,
    pub numres: Field,
    pub image_info: Vec<ComponentInfo>,
    pub graphic_info: Vec<ComponentInfo>,
    pub label_info: Vec<ComponentInfo>,
    pub text_info: Vec<ComponentInfo>,
    pub data_extension_info: Vec<ComponentInfo>,
    pub reserved_extension_info: Vec<ComponentInfo>,

    pub udhdl: Field,
    pub udhofl: Field,
    pub user_defined_section: Extensions,
    pub xhdl: Field,
    pub xhdlofl: Field,
    pub extended_section: Extensions,
}

impl FileHeader {
    /// Default-populated header for `version`. The security group is resized
    /// before any field is written.
    pub fn new(version: Version) -> Self {
        let fver = match version {
            Version::V20 => "02.00",
            Version::V21 | Version::Unknown => "02.10",
        };
        Self {
            fhdr: Field::preset(FieldKind::BcsA, 4, "NITF"),
            fver: Field::preset(FieldKind::BcsA, 5, fver),
            clevel: Field::new(FieldKind::BcsN, 2),
            stype: Field::preset(FieldKind::BcsA, 4, "BF01"),
            ostaid: Field::new(FieldKind::BcsA, 10),
            fdt: Field::new(FieldKind::BcsA, 14),
            ftitle: Field::new(FieldKind::BcsA, 80),
            classification: Field::preset(FieldKind::BcsA, 1, "U"),
            security: FileSecurity::new(version),
            fscop: Field::new(FieldKind::BcsN, 5),
            fscpys: Field::new(FieldKind::BcsN, 5),
            encryp: Field::preset(FieldKind::BcsN, 1, "0"),
            background_color: Field::new(FieldKind::Binary, 3),
            oname: Field::new(FieldKind::BcsA, 24),
            ophone: Field::new(FieldKind::BcsA, 18),
            fl: Field::new(FieldKind::BcsN, 12),
            hl: Field::new(FieldKind::BcsN, 6),
            numi: Field::new(FieldKind::BcsN, 3),
            nums: Field::new(FieldKind::BcsN, 3),
            numx: Field::new(FieldKind::BcsN, 3),
            numt: Field::new(FieldKind::BcsN, 3),
            numdes: Field::new(FieldKind::BcsN, 3),
            numres: Field::new(FieldKind::BcsN, 3),
            image_info: Vec::new(),
            graphic_info: Vec::new(),
            label_info: Vec::new(),
            text_info: Vec::new(),
            data_extension_info: Vec::new(),
            reserved_extension_info: Vec::new(),
            udhdl: Field::new(FieldKind::BcsN, 5),
            udhofl: Field::new(FieldKind::BcsN, 3),
            user_defined_section: Extensions::new(),
            xhdl: Field::new(FieldKind::BcsN, 5),
            xhdlofl: Field::new(FieldKind::BcsN, 3),
            extended_section: Extensions::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_identify_the_version() {
        let h21 = FileHeader::new(Version::V21);
        assert_eq!(h21.fhdr.trimmed(), "NITF");
        assert_eq!(h21.fver.trimmed(), "02.10");
        assert_eq!(h21.classification.trimmed(), "U");

        let h20 = FileHeader::new(Version::V20);
        assert_eq!(h20.fver.trimmed(), "02.00");
        assert_eq!(h20.security.codewords.width(), 40);
    }

    #[test]
    fn counts_start_at_zero() {
        let header = FileHeader::new(Version::V21);
        assert_eq!(header.numi.as_u32().unwrap(), 0);
        assert_eq!(header.numdes.as_u32().unwrap(), 0);
        assert!(header.image_info.is_empty());
        assert_eq!(header.udhofl.as_u32().unwrap(), 0);
    }
}
