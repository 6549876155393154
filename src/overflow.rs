//! TRE overflow engine: spilling oversize extension sections into synthetic
//! `TRE_OVERFLOW` DES segments before write, collapsing them back after
//! read, and keeping every cross-reference index correct when segments are
//! removed.
//!
//! The relation is index-based in both directions, never owning: a host
//! subheader stores the 1-based index of its overflow DES in its offset
//! field (UDHOFL, IXSOFL, ...), and the DES stores the host kind string
//! (DESOFLW) and the host's 1-based segment index (DESITEM, 0 for the file
//! header).
//!
//! Section byte budgets:
//!
//! ```text
//! Host                Sections       Limit
//! file header         UDHD, XHD      99 999
//! image subheader     UDID, IXSHD    99 999
//! graphic subheader   SXSHD           9 741
//! label subheader     LXSHD           9 747
//! text subheader      TXSHD           9 717
//! ```

use crate::error::{NitfError, Result};
use crate::field::Field;
use crate::record::Record;
use crate::security::FileSecurity;
use crate::segment::{TRE_OVERFLOW_TAG, TRE_OVERFLOW_VERSION};
use crate::tre::{Extensions, Tre};

const FILE_HEADER_LIMIT: u64 = 99_999;
const IMAGE_LIMIT: u64 = 99_999;
const GRAPHIC_LIMIT: u64 = 9_741;
const LABEL_LIMIT: u64 = 9_747;
const TEXT_LIMIT: u64 = 9_717;

/// One extension section that can overflow, addressed within a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Host {
    HeaderUserDefined,
    HeaderExtended,
    ImageUserDefined(usize),
    ImageExtended(usize),
    Graphic(usize),
    Label(usize),
    Text(usize),
}

impl Host {
    /// Host kind string stored in DESOFLW.
    fn kind_str(self) -> &'static str {
        match self {
            Host::HeaderUserDefined => "UDHD",
            Host::HeaderExtended => "XHD",
            Host::ImageUserDefined(_) => "UDID",
            Host::ImageExtended(_) => "IXSHD",
            Host::Graphic(_) => "SXSHD",
            Host::Label(_) => "LXSHD",
            Host::Text(_) => "TXSHD",
        }
    }

    /// Host segment index stored in DESITEM: 1-based for segments, 0 for
    /// the file header.
    fn item(self) -> u32 {
        match self {
            Host::HeaderUserDefined | Host::HeaderExtended => 0,
            Host::ImageUserDefined(i)
            | Host::ImageExtended(i)
            | Host::Graphic(i)
            | Host::Label(i)
            | Host::Text(i) => i as u32 + 1,
        }
    }

    /// Section byte budget.
    fn limit(self) -> u64 {
        match self {
            Host::HeaderUserDefined | Host::HeaderExtended => FILE_HEADER_LIMIT,
            Host::ImageUserDefined(_) | Host::ImageExtended(_) => IMAGE_LIMIT,
            Host::Graphic(_) => GRAPHIC_LIMIT,
            Host::Label(_) => LABEL_LIMIT,
            Host::Text(_) => TEXT_LIMIT,
        }
    }
}

impl Record {
    /// Split every oversize extension section into its overflow DES segment
    /// (allocating one if the host has none yet) and refresh each visited
    /// host length field with the serialized length of the TREs it retains.
    ///
    /// Called by the write path before serialization; afterwards every
    /// section satisfies its byte budget.
    pub fn unmerge_tres(&mut self) -> Result<()> {
        for host in self.hosts() {
            let length = self.section(host).compute_length()?;
            let limit = host.limit();
            if length <= limit {
                self.length_field_mut(host).set_u64(length)?;
                continue;
            }

            let mut overflow_index = self.offset_field(host).as_u32()?;
            if overflow_index == 0 {
                overflow_index = self.add_overflow_segment(host)?;
                self.offset_field_mut(host).set_u32(overflow_index)?;
            } else if overflow_index as usize > self.data_extensions.len() {
                return Err(NitfError::InvalidObject(format!(
                    "{} overflow index {} names a missing data extension segment",
                    host.kind_str(),
                    overflow_index
                )));
            }

            let mut section = std::mem::take(self.section_mut(host));
            let moved = split_for_transfer(&mut section, limit)?;
            self.data_extensions[overflow_index as usize - 1]
                .subheader
                .user_defined_section
                .extend(moved);

            let retained = section.compute_length()?;
            *self.section_mut(host) = section;
            self.length_field_mut(host).set_u64(retained)?;
        }
        Ok(())
    }

    /// Collapse every `TRE_OVERFLOW` DES back into its host section,
    /// zeroing the host length and offset fields and removing the DES.
    ///
    /// Called by the read path after the record is populated. Removal shifts
    /// the remaining DES indices, so the walk restarts from the front after
    /// each merge.
    pub fn merge_tres(&mut self) -> Result<()> {
        let mut index = 0;
        while index < self.data_extensions.len() {
            if !self.data_extensions[index].subheader.is_overflow() {
                index += 1;
                continue;
            }

            let subheader = &self.data_extensions[index].subheader;
            let kind = subheader.desoflw.trimmed();
            let item = subheader.desitem.as_u32().map_err(|_| {
                NitfError::InvalidOverflow("DESITEM does not hold a segment index".into())
            })?;
            let host = self.resolve_host(&kind, item)?;

            let tres = self.data_extensions[index].subheader.user_defined_section.take_all();
            self.section_mut(host).extend(tres);
            self.length_field_mut(host).set_u32(0)?;
            self.offset_field_mut(host).set_u32(0)?;

            self.remove_data_extension_segment(index)?;
            index = 0;
        }
        Ok(())
    }

    // ── Index fixups ───────────────────────────────────────────────

    /// After removing the DES at `removed` (0-based), shift down every host
    /// offset field that pointed past it.
    pub(crate) fn fix_segment_indexes(&mut self, removed: usize) -> Result<()> {
        let threshold = removed as u32 + 1;
        decrement_if_past(&mut self.header.udhofl, threshold)?;
        decrement_if_past(&mut self.header.xhdlofl, threshold)?;
        for image in &mut self.images {
            decrement_if_past(&mut image.subheader.udofl, threshold)?;
            decrement_if_past(&mut image.subheader.ixsofl, threshold)?;
        }
        for graphic in &mut self.graphics {
            decrement_if_past(&mut graphic.subheader.sxsofl, threshold)?;
        }
        for label in &mut self.labels {
            decrement_if_past(&mut label.subheader.lxsofl, threshold)?;
        }
        for text in &mut self.texts {
            decrement_if_past(&mut text.subheader.txsofl, threshold)?;
        }
        Ok(())
    }

    /// After removing the host segment of kind `kind` at `removed`
    /// (0-based), shift down the DESITEM of every overflow DES that pointed
    /// past it. DES indices themselves are unaffected by host removal.
    pub(crate) fn fix_overflow_indexes(&mut self, kind: &str, removed: usize) -> Result<()> {
        let threshold = removed as u32 + 1;
        for des in &mut self.data_extensions {
            let subheader = &mut des.subheader;
            if subheader.desoflw.trimmed() != kind {
                continue;
            }
            let item = subheader.desitem.as_u32()?;
            if item > threshold {
                subheader.desitem.set_u32(item - 1)?;
            }
        }
        Ok(())
    }

    // ── Host plumbing ──────────────────────────────────────────────

    /// Every overflow-capable section, in file order.
    fn hosts(&self) -> Vec<Host> {
        let mut hosts = vec![Host::HeaderUserDefined, Host::HeaderExtended];
        for i in 0..self.images.len() {
            hosts.push(Host::ImageUserDefined(i));
            hosts.push(Host::ImageExtended(i));
        }
        for i in 0..self.graphics.len() {
            hosts.push(Host::Graphic(i));
        }
        for i in 0..self.labels.len() {
            hosts.push(Host::Label(i));
        }
        for i in 0..self.texts.len() {
            hosts.push(Host::Text(i));
        }
        hosts
    }

    /// Map a DESOFLW/DESITEM pair back to a host section.
    fn resolve_host(&self, kind: &str, item: u32) -> Result<Host> {
        let in_range = |len: usize| item >= 1 && item as usize <= len;
        match kind {
            "UDHD" => Ok(Host::HeaderUserDefined),
            "XHD" => Ok(Host::HeaderExtended),
            "UDID" if in_range(self.images.len()) => {
                Ok(Host::ImageUserDefined(item as usize - 1))
            }
            "IXSHD" if in_range(self.images.len()) => {
                Ok(Host::ImageExtended(item as usize - 1))
            }
            "SXSHD" if in_range(self.graphics.len()) => Ok(Host::Graphic(item as usize - 1)),
            "LXSHD" if in_range(self.labels.len()) => Ok(Host::Label(item as usize - 1)),
            "TXSHD" if in_range(self.texts.len()) => Ok(Host::Text(item as usize - 1)),
            "UDID" | "IXSHD" | "SXSHD" | "LXSHD" | "TXSHD" => {
                Err(NitfError::InvalidOverflow(format!(
                    "{kind} overflow names out-of-range segment {item}"
                )))
            }
            other => Err(NitfError::InvalidOverflow(format!(
                "unrecognized DESOFLW {other:?}"
            ))),
        }
    }

    fn section(&self, host: Host) -> &Extensions {
        match host {
            Host::HeaderUserDefined => &self.header.user_defined_section,
            Host::HeaderExtended => &self.header.extended_section,
            Host::ImageUserDefined(i) => &self.images[i].subheader.user_defined_section,
            Host::ImageExtended(i) => &self.images[i].subheader.extended_section,
            Host::Graphic(i) => &self.graphics[i].subheader.extended_section,
            Host::Label(i) => &self.labels[i].subheader.extended_section,
            Host::Text(i) => &self.texts[i].subheader.extended_section,
        }
    }

    fn section_mut(&mut self, host: Host) -> &mut Extensions {
        match host {
            Host::HeaderUserDefined => &mut self.header.user_defined_section,
            Host::HeaderExtended => &mut self.header.extended_section,
            Host::ImageUserDefined(i) => &mut self.images[i].subheader.user_defined_section,
            Host::ImageExtended(i) => &mut self.images[i].subheader.extended_section,
            Host::Graphic(i) => &mut self.graphics[i].subheader.extended_section,
            Host::Label(i) => &mut self.labels[i].subheader.extended_section,
            Host::Text(i) => &mut self.texts[i].subheader.extended_section,
        }
    }

    fn offset_field(&self, host: Host) -> &Field {
        match host {
            Host::HeaderUserDefined => &self.header.udhofl,
            Host::HeaderExtended => &self.header.xhdlofl,
            Host::ImageUserDefined(i) => &self.images[i].subheader.udofl,
            Host::ImageExtended(i) => &self.images[i].subheader.ixsofl,
            Host::Graphic(i) => &self.graphics[i].subheader.sxsofl,
            Host::Label(i) => &self.labels[i].subheader.lxsofl,
            Host::Text(i) => &self.texts[i].subheader.txsofl,
        }
    }

    fn offset_field_mut(&mut self, host: Host) -> &mut Field {
        match host {
            Host::HeaderUserDefined => &mut self.header.udhofl,
            Host::HeaderExtended => &mut self.header.xhdlofl,
            Host::ImageUserDefined(i) => &mut self.images[i].subheader.udofl,
            Host::ImageExtended(i) => &mut self.images[i].subheader.ixsofl,
            Host::Graphic(i) => &mut self.graphics[i].subheader.sxsofl,
            Host::Label(i) => &mut self.labels[i].subheader.lxsofl,
            Host::Text(i) => &mut self.texts[i].subheader.txsofl,
        }
    }

    fn length_field_mut(&mut self, host: Host) -> &mut Field {
        match host {
            Host::HeaderUserDefined => &mut self.header.udhdl,
            Host::HeaderExtended => &mut self.header.xhdl,
            Host::ImageUserDefined(i) => &mut self.images[i].subheader.udidl,
            Host::ImageExtended(i) => &mut self.images[i].subheader.ixshdl,
            Host::Graphic(i) => &mut self.graphics[i].subheader.sxshdl,
            Host::Label(i) => &mut self.labels[i].subheader.lxshdl,
            Host::Text(i) => &mut self.texts[i].subheader.txshdl,
        }
    }

    /// Classification field and security group governing a host section,
    /// cloned for transplanting into a new overflow segment.
    fn host_security(&self, host: Host) -> (Field, FileSecurity) {
        match host {
            Host::HeaderUserDefined | Host::HeaderExtended => {
                (self.header.classification.clone(), self.header.security.clone())
            }
            Host::ImageUserDefined(i) | Host::ImageExtended(i) => {
                let subheader = &self.images[i].subheader;
                (subheader.classification.clone(), subheader.security.clone())
            }
            Host::Graphic(i) => {
                let subheader = &self.graphics[i].subheader;
                (subheader.classification.clone(), subheader.security.clone())
            }
            Host::Label(i) => {
                let subheader = &self.labels[i].subheader;
                (subheader.classification.clone(), subheader.security.clone())
            }
            Host::Text(i) => {
                let subheader = &self.texts[i].subheader;
                (subheader.classification.clone(), subheader.security.clone())
            }
        }
    }

    /// Append a fresh overflow DES for `host`, copying the host's security
    /// fields, and return its 1-based index.
    fn add_overflow_segment(&mut self, host: Host) -> Result<u32> {
        let (classification, security) = self.host_security(host);
        let index = self.data_extensions.len() as u32 + 1;
        let segment = self.new_data_extension_segment()?;
        let subheader = &mut segment.subheader;
        subheader.classification = classification;
        subheader.security = security;
        subheader.destag.set_string(TRE_OVERFLOW_TAG)?;
        subheader.desver.set_u32(TRE_OVERFLOW_VERSION)?;
        subheader.desoflw.set_string(host.kind_str())?;
        subheader.desitem.set_u32(host.item())?;
        Ok(index)
    }
}

/// Shift a stored 1-based overflow index down by one when it points past
/// the removed position.
fn decrement_if_past(field: &mut Field, threshold: u32) -> Result<()> {
    let value = field.as_u32()?;
    if value > threshold {
        field.set_u32(value - 1)?;
    }
    Ok(())
}

/// Drain the TREs that do not fit: keep the longest prefix whose serialized
/// length (11-byte headers included) stays within `limit`, and return
/// everything from the first TRE past it onward, in order.
fn split_for_transfer(section: &mut Extensions, limit: u64) -> Result<Vec<Tre>> {
    let mut total = 0u64;
    let mut split = section.len();
    for (i, tre) in section.iter().enumerate() {
        total += tre.serialized_len()?;
        if total > limit {
            split = i;
            break;
        }
    }
    Ok(section.split_off(split))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tre::handler::RawHandler;
    use std::sync::Arc;

    fn raw_tre(tag: &str, payload_len: usize) -> Tre {
        let mut tre = Tre::with_handler(tag, None, Arc::new(RawHandler)).unwrap();
        tre.parse(&vec![b'x'; payload_len]).unwrap();
        tre
    }

    #[test]
    fn split_keeps_longest_fitting_prefix() {
        let mut section = Extensions::new();
        section.append(raw_tre("TRE001", 89)); // 100 with header
        section.append(raw_tre("TRE002", 89));
        section.append(raw_tre("TRE003", 89));
        let moved = split_for_transfer(&mut section, 250).unwrap();
        assert_eq!(section.len(), 2);
        assert_eq!(moved.len(), 1);
        assert_eq!(moved[0].tag(), "TRE003");
    }

    #[test]
    fn split_at_exact_boundary_moves_nothing() {
        let mut section = Extensions::new();
        section.append(raw_tre("TRE001", 89));
        section.append(raw_tre("TRE002", 89));
        let moved = split_for_transfer(&mut section, 200).unwrap();
        assert!(moved.is_empty());
        assert_eq!(section.len(), 2);
    }

    #[test]
    fn split_moves_everything_when_first_tre_is_too_big() {
        let mut section = Extensions::new();
        section.append(raw_tre("TRE001", 500));
        section.append(raw_tre("TRE002", 10));
        let moved = split_for_transfer(&mut section, 100).unwrap();
        assert!(section.is_empty());
        assert_eq!(moved.len(), 2);
    }
}
