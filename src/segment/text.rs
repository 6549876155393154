//! Text segment and subheader.

use crate::field::{Field, FieldKind};
use crate::security::FileSecurity;
use crate::tre::Extensions;
use crate::Version;

/// Text subheader. One TRE section (TXSHD) with back-reference TXSOFL.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSubheader {
    pub te: Field,
    pub textid: Field,
    pub txtalvl: Field,
    pub txtdt: Field,
    pub txtitl: Field,
    pub classification: Field,
    pub security: FileSecurity,
    pub encryp: Field,
    pub txtfmt: Field,

    pub txshdl: Field,
    pub txsofl: Field,
    pub extended_section: Extensions,
}

impl TextSubheader {
    pub fn new(version: Version) -> Self {
        Self {
            te: Field::preset(FieldKind::BcsA, 2, "TE"),
            textid: Field::new(FieldKind::BcsA, 7),
            txtalvl: Field::new(FieldKind::BcsN, 3),
            txtdt: Field::new(FieldKind::BcsA, 14),
            txtitl: Field::new(FieldKind::BcsA, 80),
            classification: Field::preset(FieldKind::BcsA, 1, "U"),
            security: FileSecurity::new(version),
            encryp: Field::preset(FieldKind::BcsN, 1, "0"),
            txtfmt: Field::new(FieldKind::BcsA, 3),
            txshdl: Field::new(FieldKind::BcsN, 5),
            txsofl: Field::new(FieldKind::BcsN, 3),
            extended_section: Extensions::new(),
        }
    }
}

/// One text segment: subheader plus the data byte range the external
/// reader/writer maintains.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSegment {
    pub subheader: TextSubheader,
    pub offset: u64,
    pub end: u64,
}

impl TextSegment {
    pub fn new(version: Version) -> Self {
        Self { subheader: TextSubheader::new(version), offset: 0, end: 0 }
    }
}
