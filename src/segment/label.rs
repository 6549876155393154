//! Label segment and subheader. Labels exist only in NITF 2.0; 2.1 replaced
//! them with graphic (CGM) text.

use crate::error::Result;
use crate::field::{Field, FieldKind};
use crate::security::FileSecurity;
use crate::tre::Extensions;
use crate::Version;

/// Label subheader. One TRE section (LXSHD) with back-reference LXSOFL.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelSubheader {
    pub la: Field,
    pub lid: Field,
    pub classification: Field,
    pub security: FileSecurity,
    pub encryp: Field,
    pub lfs: Field,
    pub lcw: Field,
    pub lch: Field,
    pub ldlvl: Field,
    pub lalvl: Field,
    pub llocr: Field,
    pub llocc: Field,
    pub ltc: Field,
    pub lbc: Field,

    pub lxshdl: Field,
    pub lxsofl: Field,
    pub extended_section: Extensions,
}

impl LabelSubheader {
    pub fn new(display_level: u32) -> Result<Self> {
        let mut subheader = Self {
            la: Field::preset(FieldKind::BcsA, 2, "LA"),
            lid: Field::new(FieldKind::BcsA, 10),
            classification: Field::preset(FieldKind::BcsA, 1, "U"),
            security: FileSecurity::new(Version::V20),
            encryp: Field::preset(FieldKind::BcsN, 1, "0"),
            lfs: Field::new(FieldKind::BcsA, 1),
            lcw: Field::new(FieldKind::BcsN, 2),
            lch: Field::new(FieldKind::BcsN, 2),
            ldlvl: Field::new(FieldKind::BcsN, 3),
            lalvl: Field::new(FieldKind::BcsN, 3),
            llocr: Field::new(FieldKind::BcsN, 5),
            llocc: Field::new(FieldKind::BcsN, 5),
            ltc: Field::new(FieldKind::Binary, 3),
            lbc: Field::new(FieldKind::Binary, 3),
            lxshdl: Field::new(FieldKind::BcsN, 5),
            lxsofl: Field::new(FieldKind::BcsN, 3),
            extended_section: Extensions::new(),
        };
        subheader.ldlvl.set_u32(display_level)?;
        Ok(subheader)
    }
}

/// One label segment: subheader plus the data byte range the external
/// reader/writer maintains.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelSegment {
    pub subheader: LabelSubheader,
    pub offset: u64,
    pub end: u64,
}

impl LabelSegment {
    pub fn new(display_level: u32) -> Result<Self> {
        Ok(Self {
            subheader: LabelSubheader::new(display_level)?,
            offset: 0,
            end: 0,
        })
    }
}
