//! Data-extension segment and subheader.
//!
//! DES segments carry arbitrary payloads. Two subheader fields give them a
//! second role: a DESTAG of `TRE_OVERFLOW` marks a synthetic segment holding
//! TREs that did not fit a host subheader, with DESOFLW naming the host
//! section kind and DESITEM its 1-based segment index (0 for the file
//! header).

use crate::field::{Field, FieldKind};
use crate::security::FileSecurity;
use crate::tre::{Extensions, Tre};
use crate::Version;

/// Data-extension subheader.
#[derive(Debug, Clone, PartialEq)]
pub struct DeSubheader {
    pub de: Field,
    pub destag: Field,
    pub desver: Field,
    pub classification: Field,
    pub security: FileSecurity,
    pub desoflw: Field,
    pub desitem: Field,
    pub subheader_fields_length: Field,
    /// DES-specific subheader fields, interpreted by a TRE-style handler.
    pub subheader_fields: Option<Tre>,
    /// TREs carried by an overflow segment.
    pub user_defined_section: Extensions,
}

impl DeSubheader {
    pub fn new(version: Version) -> Self {
        Self {
            de: Field::preset(FieldKind::BcsA, 2, "DE"),
            destag: Field::new(FieldKind::BcsA, 25),
            desver: Field::new(FieldKind::BcsN, 2),
            classification: Field::preset(FieldKind::BcsA, 1, "U"),
            security: FileSecurity::new(version),
            desoflw: Field::new(FieldKind::BcsA, 6),
            desitem: Field::new(FieldKind::BcsN, 3),
            subheader_fields_length: Field::new(FieldKind::BcsN, 4),
            subheader_fields: None,
            user_defined_section: Extensions::new(),
        }
    }

    /// Whether this subheader marks a TRE overflow segment.
    pub fn is_overflow(&self) -> bool {
        self.destag.trimmed() == super::TRE_OVERFLOW_TAG
    }
}

/// One data-extension segment: subheader plus the data byte range the
/// external reader/writer maintains.
#[derive(Debug, Clone, PartialEq)]
pub struct DeSegment {
    pub subheader: DeSubheader,
    pub offset: u64,
    pub end: u64,
}

impl DeSegment {
    pub fn new(version: Version) -> Self {
        Self { subheader: DeSubheader::new(version), offset: 0, end: 0 }
    }
}
