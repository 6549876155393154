//! Image segment and subheader.

use crate::error::Result;
use crate::field::{Field, FieldKind};
use crate::security::FileSecurity;
use crate::tre::Extensions;
use crate::Version;

/// Per-band metadata (IREPBANDn through the band's lookup tables).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandInfo {
    pub representation: Field,
    pub subcategory: Field,
    pub image_filter_condition: Field,
    pub standard_image_filter_code: Field,
    pub num_luts: Field,
    pub band_entries_per_lut: Field,
    /// Lookup tables, `num_luts` of them, each `band_entries_per_lut` bytes.
    pub luts: Vec<Vec<u8>>,
}

impl BandInfo {
    pub fn new() -> Self {
        Self {
            representation: Field::new(FieldKind::BcsA, 2),
            subcategory: Field::new(FieldKind::BcsA, 6),
            image_filter_condition: Field::preset(FieldKind::BcsA, 1, "N"),
            standard_image_filter_code: Field::new(FieldKind::BcsA, 3),
            num_luts: Field::new(FieldKind::BcsN, 1),
            band_entries_per_lut: Field::new(FieldKind::BcsN, 5),
            luts: Vec::new(),
        }
    }
}

/// Image subheader. Carries two TRE sections (UDID and IXSHD) with their
/// overflow back-references UDOFL and IXSOFL.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSubheader {
    pub im: Field,
    pub iid1: Field,
    pub idatim: Field,
    pub tgtid: Field,
    pub iid2: Field,
    pub classification: Field,
    pub security: FileSecurity,
    pub encryp: Field,
    pub isorce: Field,
    pub nrows: Field,
    pub ncols: Field,
    pub pvtype: Field,
    pub irep: Field,
    pub icat: Field,
    pub abpp: Field,
    pub pjust: Field,
    pub icords: Field,
    pub igeolo: Field,
    pub nicom: Field,
    pub comments: Vec<Field>,
    pub ic: Field,
    pub comrat: Field,
    pub nbands: Field,
    pub xbands: Field,
    pub bands: Vec<BandInfo>,
    pub isync: Field,
    pub imode: Field,
    pub nbpr: Field,
    pub nbpc: Field,
    pub nppbh: Field,
    pub nppbv: Field,
    pub nbpp: Field,
    pub idlvl: Field,
    pub ialvl: Field,
    pub iloc: Field,
    pub imag: Field,

    pub udidl: Field,
    pub udofl: Field,
    pub user_defined_section: Extensions,
    pub ixshdl: Field,
    pub ixsofl: Field,
    pub extended_section: Extensions,
}

impl ImageSubheader {
    /// Default subheader with the display level set to the segment's 1-based
    /// position within its kind at creation time.
    pub fn new(version: Version, display_level: u32) -> Result<Self> {
        let mut subheader = Self {
            im: Field::preset(FieldKind::BcsA, 2, "IM"),
            iid1: Field::new(FieldKind::BcsA, 10),
            idatim: Field::new(FieldKind::BcsA, 14),
            tgtid: Field::new(FieldKind::BcsA, 17),
            iid2: Field::new(FieldKind::BcsA, 80),
            classification: Field::preset(FieldKind::BcsA, 1, "U"),
            security: FileSecurity::new(version),
            encryp: Field::preset(FieldKind::BcsN, 1, "0"),
            isorce: Field::new(FieldKind::BcsA, 42),
            nrows: Field::new(FieldKind::BcsN, 8),
            ncols: Field::new(FieldKind::BcsN, 8),
            pvtype: Field::new(FieldKind::BcsA, 3),
            irep: Field::new(FieldKind::BcsA, 8),
            icat: Field::new(FieldKind::BcsA, 8),
            abpp: Field::new(FieldKind::BcsN, 2),
            // Could be 'L', but that is unlikely in practice.
            pjust: Field::preset(FieldKind::BcsA, 1, "R"),
            icords: Field::new(FieldKind::BcsA, 1),
            igeolo: Field::new(FieldKind::BcsA, 60),
            nicom: Field::new(FieldKind::BcsN, 1),
            comments: Vec::new(),
            // No mask is known yet at construction time.
            ic: Field::preset(FieldKind::BcsA, 2, "NC"),
            comrat: Field::new(FieldKind::BcsA, 4),
            nbands: Field::new(FieldKind::BcsN, 1),
            xbands: Field::new(FieldKind::BcsN, 5),
            bands: Vec::new(),
            isync: Field::new(FieldKind::BcsN, 1),
            imode: Field::new(FieldKind::BcsA, 1),
            nbpr: Field::new(FieldKind::BcsN, 4),
            nbpc: Field::new(FieldKind::BcsN, 4),
            nppbh: Field::new(FieldKind::BcsN, 4),
            nppbv: Field::new(FieldKind::BcsN, 4),
            nbpp: Field::new(FieldKind::BcsN, 2),
            idlvl: Field::new(FieldKind::BcsN, 3),
            ialvl: Field::new(FieldKind::BcsN, 3),
            iloc: Field::new(FieldKind::BcsN, 10),
            imag: Field::preset(FieldKind::BcsA, 4, "1.0 "),
            udidl: Field::new(FieldKind::BcsN, 5),
            udofl: Field::new(FieldKind::BcsN, 3),
            user_defined_section: Extensions::new(),
            ixshdl: Field::new(FieldKind::BcsN, 5),
            ixsofl: Field::new(FieldKind::BcsN, 3),
            extended_section: Extensions::new(),
        };
        subheader.idlvl.set_u32(display_level)?;
        Ok(subheader)
    }

    /// Append an image comment (ICOMn), keeping NICOM in step.
    pub fn append_comment(&mut self, text: &str) -> Result<()> {
        let mut comment = Field::new(FieldKind::BcsA, 80);
        comment.set_string(text)?;
        self.nicom.set_u32(self.comments.len() as u32 + 1)?;
        self.comments.push(comment);
        Ok(())
    }

    /// Size the band-info list to `count`, updating NBANDS/XBANDS (counts
    /// above 9 go in XBANDS, with NBANDS zeroed).
    pub fn create_bands(&mut self, count: u32) -> Result<()> {
        if count > 9 {
            self.nbands.set_u32(0)?;
            self.xbands.set_u32(count)?;
        } else {
            self.nbands.set_u32(count)?;
            self.xbands.set_u32(0)?;
        }
        self.bands.resize_with(count as usize, BandInfo::new);
        Ok(())
    }
}

/// One image segment: subheader plus the data byte range the external
/// reader/writer maintains.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSegment {
    pub subheader: ImageSubheader,
    pub offset: u64,
    pub end: u64,
}

impl ImageSegment {
    pub fn new(version: Version, display_level: u32) -> Result<Self> {
        Ok(Self {
            subheader: ImageSubheader::new(version, display_level)?,
            offset: 0,
            end: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_standard() {
        let sub = ImageSubheader::new(Version::V21, 1).unwrap();
        assert_eq!(sub.im.trimmed(), "IM");
        assert_eq!(sub.ic.trimmed(), "NC");
        assert_eq!(sub.imag.as_str(), "1.0 ");
        assert_eq!(sub.idlvl.as_u32().unwrap(), 1);
    }

    #[test]
    fn comments_track_nicom() {
        let mut sub = ImageSubheader::new(Version::V21, 1).unwrap();
        sub.append_comment("first look").unwrap();
        sub.append_comment("cloud cover 20%").unwrap();
        assert_eq!(sub.nicom.as_u32().unwrap(), 2);
        assert_eq!(sub.comments[1].trimmed(), "cloud cover 20%");
    }

    #[test]
    fn band_counts_split_at_nine() {
        let mut sub = ImageSubheader::new(Version::V21, 1).unwrap();
        sub.create_bands(3).unwrap();
        assert_eq!(sub.nbands.as_u32().unwrap(), 3);
        sub.create_bands(64).unwrap();
        assert_eq!(sub.nbands.as_u32().unwrap(), 0);
        assert_eq!(sub.xbands.as_u32().unwrap(), 64);
        assert_eq!(sub.bands.len(), 64);
    }
}
