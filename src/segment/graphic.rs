//! Graphic segment and subheader.

use crate::error::Result;
use crate::field::{Field, FieldKind};
use crate::security::FileSecurity;
use crate::tre::Extensions;
use crate::Version;

/// Graphic subheader. One TRE section (SXSHD) with back-reference SXSOFL.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicSubheader {
    pub sy: Field,
    pub sid: Field,
    pub sname: Field,
    pub classification: Field,
    pub security: FileSecurity,
    pub encryp: Field,
    pub sfmt: Field,
    pub sstruct: Field,
    pub sdlvl: Field,
    pub salvl: Field,
    pub sloc: Field,
    pub sbnd1: Field,
    pub scolor: Field,
    pub sbnd2: Field,
    pub sres2: Field,

    pub sxshdl: Field,
    pub sxsofl: Field,
    pub extended_section: Extensions,
}

impl GraphicSubheader {
    pub fn new(version: Version, display_level: u32) -> Result<Self> {
        let mut subheader = Self {
            sy: Field::preset(FieldKind::BcsA, 2, "SY"),
            sid: Field::new(FieldKind::BcsA, 10),
            sname: Field::new(FieldKind::BcsA, 20),
            classification: Field::preset(FieldKind::BcsA, 1, "U"),
            security: FileSecurity::new(version),
            encryp: Field::preset(FieldKind::BcsN, 1, "0"),
            sfmt: Field::new(FieldKind::BcsA, 1),
            sstruct: Field::new(FieldKind::BcsN, 13),
            sdlvl: Field::new(FieldKind::BcsN, 3),
            salvl: Field::new(FieldKind::BcsN, 3),
            sloc: Field::new(FieldKind::BcsN, 10),
            sbnd1: Field::new(FieldKind::BcsN, 10),
            scolor: Field::new(FieldKind::BcsA, 1),
            sbnd2: Field::new(FieldKind::BcsN, 10),
            sres2: Field::new(FieldKind::BcsN, 2),
            sxshdl: Field::new(FieldKind::BcsN, 5),
            sxsofl: Field::new(FieldKind::BcsN, 3),
            extended_section: Extensions::new(),
        };
        subheader.sdlvl.set_u32(display_level)?;
        Ok(subheader)
    }
}

/// One graphic segment: subheader plus the data byte range the external
/// reader/writer maintains.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicSegment {
    pub subheader: GraphicSubheader,
    pub offset: u64,
    pub end: u64,
}

impl GraphicSegment {
    pub fn new(version: Version, display_level: u32) -> Result<Self> {
        Ok(Self {
            subheader: GraphicSubheader::new(version, display_level)?,
            offset: 0,
            end: 0,
        })
    }
}
