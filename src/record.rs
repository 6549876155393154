//! The record: the in-memory object graph of one NITF file.
//!
//! A `Record` owns the file header and the six segment lists. Mutation goes
//! through the factory/remove/move operations, which keep three things in
//! step at all times:
//!
//! - the segment list of each kind,
//! - the header's parallel component-info array for that kind,
//! - the header's NUM field for that kind.
//!
//! Every mutating operation either succeeds fully or leaves the record
//! untouched: fallible work happens before the first list write.

use crate::clevel::{self, Clevel};
use crate::error::{NitfError, Result};
use crate::header::{ComponentInfo, FileHeader};
use crate::segment::{
    DeSegment, GraphicSegment, ImageSegment, LabelSegment, ReSegment, TextSegment,
};
use crate::Version;

/// Most segments of one kind a file can hold (the NUM fields are three
/// digits wide).
pub const MAX_SEGMENTS: u32 = 999;

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub header: FileHeader,
    pub images: Vec<ImageSegment>,
    pub graphics: Vec<GraphicSegment>,
    pub labels: Vec<LabelSegment>,
    pub texts: Vec<TextSegment>,
    pub data_extensions: Vec<DeSegment>,
    pub reserved_extensions: Vec<ReSegment>,
}

impl Record {
    /// Empty record with a default-populated file header for `version`.
    pub fn new(version: Version) -> Self {
        Self {
            header: FileHeader::new(version),
            images: Vec::new(),
            graphics: Vec::new(),
            labels: Vec::new(),
            texts: Vec::new(),
            data_extensions: Vec::new(),
            reserved_extensions: Vec::new(),
        }
    }

    /// Version as identified by the FHDR/FVER fields. NSIF 1.0 reports as
    /// [`Version::V21`].
    pub fn version(&self) -> Version {
        let fhdr = self.header.fhdr.as_str();
        let fver = self.header.fver.as_str();
        if fhdr.starts_with("NSIF") || fver.starts_with("02.10") {
            Version::V21
        } else if fver.starts_with("02.00") {
            Version::V20
        } else {
            Version::Unknown
        }
    }

    /// Compute and store the complexity level if the CLEVEL field does not
    /// already hold a valid value.
    pub fn set_complexity_level_if_unset(&mut self) -> Result<()> {
        if clevel::get(self) == Clevel::Unknown {
            let level = clevel::measure(self)?;
            self.header.clevel.set_string(level.as_str())?;
        }
        Ok(())
    }

    // ── Count accessors ────────────────────────────────────────────

    /// NUMI as a number. Fails with `Parse` when the field holds junk.
    pub fn num_images(&self) -> Result<u32> {
        self.header.numi.as_u32()
    }

    pub fn num_graphics(&self) -> Result<u32> {
        self.header.nums.as_u32()
    }

    pub fn num_labels(&self) -> Result<u32> {
        self.header.numx.as_u32()
    }

    pub fn num_texts(&self) -> Result<u32> {
        self.header.numt.as_u32()
    }

    pub fn num_data_extensions(&self) -> Result<u32> {
        self.header.numdes.as_u32()
    }

    pub fn num_reserved_extensions(&self) -> Result<u32> {
        self.header.numres.as_u32()
    }

    // ── Factories ──────────────────────────────────────────────────

    /// Append a default image segment, its component info, and bump NUMI.
    /// The display level is set to the new segment's 1-based position.
    pub fn new_image_segment(&mut self) -> Result<&mut ImageSegment> {
        let num = next_count(&self.header.numi, "image")?;
        let segment = ImageSegment::new(self.version(), num + 1)?;
        self.header.numi.set_u32(num + 1)?;
        self.header.image_info.push(ComponentInfo::image());
        self.images.push(segment);
        Ok(self.images.last_mut().unwrap())
    }

    pub fn new_graphic_segment(&mut self) -> Result<&mut GraphicSegment> {
        let num = next_count(&self.header.nums, "graphic")?;
        let segment = GraphicSegment::new(self.version(), num + 1)?;
        self.header.nums.set_u32(num + 1)?;
        self.header.graphic_info.push(ComponentInfo::graphic());
        self.graphics.push(segment);
        Ok(self.graphics.last_mut().unwrap())
    }

    /// Labels exist only in NITF 2.0.
    pub fn new_label_segment(&mut self) -> Result<&mut LabelSegment> {
        if self.version() != Version::V20 {
            return Err(NitfError::InvalidObject(
                "label segments require a NITF 2.0 record".into(),
            ));
        }
        let num = next_count(&self.header.numx, "label")?;
        let segment = LabelSegment::new(num + 1)?;
        self.header.numx.set_u32(num + 1)?;
        self.header.label_info.push(ComponentInfo::label());
        self.labels.push(segment);
        Ok(self.labels.last_mut().unwrap())
    }

    pub fn new_text_segment(&mut self) -> Result<&mut TextSegment> {
        let num = next_count(&self.header.numt, "text")?;
        let segment = TextSegment::new(self.version());
        self.header.numt.set_u32(num + 1)?;
        self.header.text_info.push(ComponentInfo::text());
        self.texts.push(segment);
        Ok(self.texts.last_mut().unwrap())
    }

    pub fn new_data_extension_segment(&mut self) -> Result<&mut DeSegment> {
        let num = next_count(&self.header.numdes, "data extension")?;
        let segment = DeSegment::new(self.version());
        self.header.numdes.set_u32(num + 1)?;
        self.header.data_extension_info.push(ComponentInfo::data_extension());
        self.data_extensions.push(segment);
        Ok(self.data_extensions.last_mut().unwrap())
    }

    pub fn new_reserved_extension_segment(&mut self) -> Result<&mut ReSegment> {
        let num = next_count(&self.header.numres, "reserved extension")?;
        let segment = ReSegment::new(self.version());
        self.header.numres.set_u32(num + 1)?;
        self.header.reserved_extension_info.push(ComponentInfo::reserved_extension());
        self.reserved_extensions.push(segment);
        Ok(self.reserved_extensions.last_mut().unwrap())
    }

    // ── Removal ────────────────────────────────────────────────────

    /// Drop the image segment at `index` along with its component info,
    /// decrement NUMI, and renumber overflow segments that pointed past it.
    pub fn remove_image_segment(&mut self, index: usize) -> Result<()> {
        check_removable(index, self.images.len(), self.header.image_info.len(), "image")?;
        self.images.remove(index);
        self.header.image_info.remove(index);
        self.header.numi.set_u32(self.images.len() as u32)?;
        self.fix_overflow_indexes("UDID", index)?;
        self.fix_overflow_indexes("IXSHD", index)?;
        Ok(())
    }

    pub fn remove_graphic_segment(&mut self, index: usize) -> Result<()> {
        check_removable(index, self.graphics.len(), self.header.graphic_info.len(), "graphic")?;
        self.graphics.remove(index);
        self.header.graphic_info.remove(index);
        self.header.nums.set_u32(self.graphics.len() as u32)?;
        self.fix_overflow_indexes("SXSHD", index)?;
        Ok(())
    }

    pub fn remove_label_segment(&mut self, index: usize) -> Result<()> {
        check_removable(index, self.labels.len(), self.header.label_info.len(), "label")?;
        self.labels.remove(index);
        self.header.label_info.remove(index);
        self.header.numx.set_u32(self.labels.len() as u32)?;
        self.fix_overflow_indexes("LXSHD", index)?;
        Ok(())
    }

    pub fn remove_text_segment(&mut self, index: usize) -> Result<()> {
        check_removable(index, self.texts.len(), self.header.text_info.len(), "text")?;
        self.texts.remove(index);
        self.header.text_info.remove(index);
        self.header.numt.set_u32(self.texts.len() as u32)?;
        self.fix_overflow_indexes("TXSHD", index)?;
        Ok(())
    }

    /// Drop the DES at `index`; every stored overflow index greater than it
    /// shifts down by one.
    pub fn remove_data_extension_segment(&mut self, index: usize) -> Result<()> {
        check_removable(
            index,
            self.data_extensions.len(),
            self.header.data_extension_info.len(),
            "data extension",
        )?;
        self.data_extensions.remove(index);
        self.header.data_extension_info.remove(index);
        self.header.numdes.set_u32(self.data_extensions.len() as u32)?;
        self.fix_segment_indexes(index)?;
        Ok(())
    }

    pub fn remove_reserved_extension_segment(&mut self, index: usize) -> Result<()> {
        check_removable(
            index,
            self.reserved_extensions.len(),
            self.header.reserved_extension_info.len(),
            "reserved extension",
        )?;
        self.reserved_extensions.remove(index);
        self.header.reserved_extension_info.remove(index);
        self.header.numres.set_u32(self.reserved_extensions.len() as u32)?;
        Ok(())
    }

    // ── Reordering ─────────────────────────────────────────────────

    /// Swap two image segments and their component-info entries. Overflow
    /// indices stay valid: the set of existing 1-based indices is unchanged.
    pub fn move_image_segment(&mut self, from: usize, to: usize) -> Result<()> {
        check_movable(from, to, self.images.len(), "image")?;
        self.images.swap(from, to);
        self.header.image_info.swap(from, to);
        Ok(())
    }

    pub fn move_graphic_segment(&mut self, from: usize, to: usize) -> Result<()> {
        check_movable(from, to, self.graphics.len(), "graphic")?;
        self.graphics.swap(from, to);
        self.header.graphic_info.swap(from, to);
        Ok(())
    }

    pub fn move_label_segment(&mut self, from: usize, to: usize) -> Result<()> {
        check_movable(from, to, self.labels.len(), "label")?;
        self.labels.swap(from, to);
        self.header.label_info.swap(from, to);
        Ok(())
    }

    pub fn move_text_segment(&mut self, from: usize, to: usize) -> Result<()> {
        check_movable(from, to, self.texts.len(), "text")?;
        self.texts.swap(from, to);
        self.header.text_info.swap(from, to);
        Ok(())
    }

    pub fn move_data_extension_segment(&mut self, from: usize, to: usize) -> Result<()> {
        check_movable(from, to, self.data_extensions.len(), "data extension")?;
        self.data_extensions.swap(from, to);
        self.header.data_extension_info.swap(from, to);
        Ok(())
    }

    pub fn move_reserved_extension_segment(&mut self, from: usize, to: usize) -> Result<()> {
        check_movable(from, to, self.reserved_extensions.len(), "reserved extension")?;
        self.reserved_extensions.swap(from, to);
        self.header.reserved_extension_info.swap(from, to);
        Ok(())
    }
}

/// Read a NUM field and verify another segment fits.
fn next_count(field: &crate::field::Field, kind: &str) -> Result<u32> {
    let num = field.as_u32()?;
    if num >= MAX_SEGMENTS {
        return Err(NitfError::InvalidObject(format!(
            "cannot add another {kind} segment, already have {num}"
        )));
    }
    Ok(num)
}

fn check_removable(index: usize, segments: usize, infos: usize, kind: &str) -> Result<()> {
    if index >= segments || index >= infos {
        return Err(NitfError::InvalidObject(format!(
            "invalid {kind} segment number {index}"
        )));
    }
    Ok(())
}

fn check_movable(from: usize, to: usize, len: usize, kind: &str) -> Result<()> {
    if from >= len || to >= len {
        return Err(NitfError::InvalidObject(format!(
            "invalid {kind} segment move {from} -> {to} (have {len})"
        )));
    }
    Ok(())
}
