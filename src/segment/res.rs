//! Reserved-extension segment and subheader. RES segments have no TRE
//! extension protocol; their subheader fields are an opaque block.

use crate::field::{Field, FieldKind};
use crate::security::FileSecurity;
use crate::Version;

/// Reserved-extension subheader.
#[derive(Debug, Clone, PartialEq)]
pub struct ReSubheader {
    pub re: Field,
    pub restag: Field,
    pub resver: Field,
    pub classification: Field,
    pub security: FileSecurity,
    pub subheader_fields_length: Field,
    pub subheader_fields: Vec<u8>,
}

impl ReSubheader {
    pub fn new(version: Version) -> Self {
        Self {
            re: Field::preset(FieldKind::BcsA, 2, "RE"),
            restag: Field::new(FieldKind::BcsA, 25),
            resver: Field::new(FieldKind::BcsN, 2),
            classification: Field::preset(FieldKind::BcsA, 1, "U"),
            security: FileSecurity::new(version),
            subheader_fields_length: Field::new(FieldKind::BcsN, 4),
            subheader_fields: Vec::new(),
        }
    }
}

/// One reserved-extension segment: subheader plus the data byte range the
/// external reader/writer maintains.
#[derive(Debug, Clone, PartialEq)]
pub struct ReSegment {
    pub subheader: ReSubheader,
    pub offset: u64,
    pub end: u64,
}

impl ReSegment {
    pub fn new(version: Version) -> Self {
        Self { subheader: ReSubheader::new(version), offset: 0, end: 0 }
    }
}
