//! Integration tests: TRE overflow unmerge/merge round trips and
//! cross-reference index maintenance under segment removal and reordering.

use std::sync::Arc;

use proptest::prelude::*;

use nitf::segment::TRE_OVERFLOW_TAG;
use nitf::tre::handler::RawHandler;
use nitf::tre::Tre;
use nitf::{Record, Version};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Raw TRE with a payload of `payload_len` bytes; serializes to
/// `payload_len + 11` bytes.
fn raw_tre(tag: &str, payload_len: usize) -> Tre {
    let mut tre = Tre::with_handler(tag, None, Arc::new(RawHandler)).unwrap();
    tre.parse(&vec![b'x'; payload_len]).unwrap();
    tre
}

/// Tags of a section's TREs, in order.
fn tags(section: &nitf::Extensions) -> Vec<String> {
    section.iter().map(|tre| tre.tag().to_string()).collect()
}

// ---------------------------------------------------------------------------
// Tests: Unmerge Then Merge
// ---------------------------------------------------------------------------

#[test]
fn image_extension_overflow_round_trip() {
    let mut record = Record::new(Version::V21);
    record.new_image_segment().unwrap();

    // Ten TREs of 10 005 serialized bytes each: 100 050 total, over the
    // 99 999 budget by one TRE.
    let section = &mut record.images[0].subheader.extended_section;
    for i in 0..10 {
        section.append(raw_tre(&format!("TRE{i:03}"), 9_994));
    }
    let original_tags = tags(section);
    assert_eq!(section.compute_length().unwrap(), 100_050);

    record.unmerge_tres().unwrap();

    // A new DES was appended and cross-linked both ways.
    assert_eq!(record.num_data_extensions().unwrap(), 1);
    let image = &record.images[0].subheader;
    assert_eq!(image.ixsofl.as_u32().unwrap(), 1);
    assert_eq!(image.extended_section.len(), 9);
    assert_eq!(image.extended_section.compute_length().unwrap(), 90_045);
    assert_eq!(image.ixshdl.as_u32().unwrap(), 90_045);

    let des = &record.data_extensions[0].subheader;
    assert_eq!(des.destag.trimmed(), TRE_OVERFLOW_TAG);
    assert_eq!(des.desver.as_u32().unwrap(), 1);
    assert_eq!(des.desoflw.trimmed(), "IXSHD");
    assert_eq!(des.desitem.as_u32().unwrap(), 1);
    assert_eq!(des.user_defined_section.len(), 1);
    assert_eq!(des.user_defined_section.get(0).unwrap().tag(), "TRE009");

    // The overflow segment inherits the host's security fields.
    assert_eq!(des.classification.raw(), image.classification.raw());

    record.merge_tres().unwrap();

    assert_eq!(record.num_data_extensions().unwrap(), 0);
    let image = &record.images[0].subheader;
    assert_eq!(image.ixsofl.as_u32().unwrap(), 0);
    assert_eq!(image.extended_section.compute_length().unwrap(), 100_050);
    assert_eq!(tags(&image.extended_section), original_tags);
}

#[test]
fn sections_within_budget_are_left_alone() {
    let mut record = Record::new(Version::V21);
    record.new_image_segment().unwrap();
    record.images[0]
        .subheader
        .extended_section
        .append(raw_tre("SMALL1", 100));

    record.unmerge_tres().unwrap();

    assert_eq!(record.num_data_extensions().unwrap(), 0);
    let image = &record.images[0].subheader;
    assert_eq!(image.ixsofl.as_u32().unwrap(), 0);
    // The length field is refreshed to the section's serialized size.
    assert_eq!(image.ixshdl.as_u32().unwrap(), 111);
}

#[test]
fn repeated_unmerge_reuses_the_overflow_segment() {
    let mut record = Record::new(Version::V21);
    record.new_image_segment().unwrap();
    for i in 0..10 {
        record.images[0]
            .subheader
            .extended_section
            .append(raw_tre(&format!("TRE{i:03}"), 9_994));
    }
    record.unmerge_tres().unwrap();
    assert_eq!(record.num_data_extensions().unwrap(), 1);

    // Grow the section past the budget again; the existing DES is reused.
    for i in 10..12 {
        record.images[0]
            .subheader
            .extended_section
            .append(raw_tre(&format!("TRE{i:03}"), 9_994));
    }
    record.unmerge_tres().unwrap();

    assert_eq!(record.num_data_extensions().unwrap(), 1);
    assert_eq!(record.images[0].subheader.ixsofl.as_u32().unwrap(), 1);
    let des = &record.data_extensions[0].subheader;
    assert_eq!(
        tags(&des.user_defined_section),
        vec!["TRE009", "TRE010", "TRE011"]
    );
}

#[test]
fn file_header_overflow_uses_item_zero() {
    let mut record = Record::new(Version::V21);
    for i in 0..11 {
        record
            .header
            .user_defined_section
            .append(raw_tre(&format!("TRE{i:03}"), 9_994));
    }
    record.unmerge_tres().unwrap();

    assert_eq!(record.header.udhofl.as_u32().unwrap(), 1);
    let des = &record.data_extensions[0].subheader;
    assert_eq!(des.desoflw.trimmed(), "UDHD");
    assert_eq!(des.desitem.as_u32().unwrap(), 0);

    record.merge_tres().unwrap();
    assert_eq!(record.header.udhofl.as_u32().unwrap(), 0);
    assert_eq!(record.header.user_defined_section.len(), 11);
    assert!(record.data_extensions.is_empty());
}

#[test]
fn graphic_budget_is_tighter() {
    let mut record = Record::new(Version::V21);
    record.new_graphic_segment().unwrap();
    // Three TREs of 4 011 serialized bytes: 12 033 > 9 741.
    for i in 0..3 {
        record.graphics[0]
            .subheader
            .extended_section
            .append(raw_tre(&format!("SGR{i:03}"), 4_000));
    }
    record.unmerge_tres().unwrap();

    let graphic = &record.graphics[0].subheader;
    assert_eq!(graphic.extended_section.len(), 2);
    assert!(graphic.extended_section.compute_length().unwrap() <= 9_741);
    assert_eq!(record.data_extensions[0].subheader.desoflw.trimmed(), "SXSHD");
}

// ---------------------------------------------------------------------------
// Tests: Index Fixups On Removal
// ---------------------------------------------------------------------------

#[test]
fn removing_a_middle_des_renumbers_offsets() {
    let mut record = Record::new(Version::V21);
    record.new_image_segment().unwrap();

    // DES 1: overflow of the file header's UDHD. DES 2: unrelated payload.
    // DES 3: overflow of image 1's IXSHD.
    record.new_data_extension_segment().unwrap();
    record.new_data_extension_segment().unwrap();
    record.new_data_extension_segment().unwrap();
    {
        let sub = &mut record.data_extensions[0].subheader;
        sub.destag.set_string(TRE_OVERFLOW_TAG).unwrap();
        sub.desoflw.set_string("UDHD").unwrap();
        sub.desitem.set_u32(0).unwrap();
    }
    record.data_extensions[1].subheader.destag.set_string("OTHERDES").unwrap();
    {
        let sub = &mut record.data_extensions[2].subheader;
        sub.destag.set_string(TRE_OVERFLOW_TAG).unwrap();
        sub.desoflw.set_string("IXSHD").unwrap();
        sub.desitem.set_u32(1).unwrap();
    }
    record.header.udhofl.set_u32(1).unwrap();
    record.images[0].subheader.ixsofl.set_u32(3).unwrap();

    record.remove_data_extension_segment(1).unwrap();

    assert_eq!(record.num_data_extensions().unwrap(), 2);
    assert_eq!(record.header.udhofl.as_u32().unwrap(), 1);
    assert_eq!(record.images[0].subheader.ixsofl.as_u32().unwrap(), 2);
}

#[test]
fn removing_a_host_segment_renumbers_desitem() {
    let mut record = Record::new(Version::V21);
    record.new_image_segment().unwrap();
    record.new_image_segment().unwrap();
    for i in 0..2 {
        for j in 0..11 {
            record.images[i]
                .subheader
                .extended_section
                .append(raw_tre(&format!("TR{i}{j:03}"), 9_994));
        }
    }
    record.unmerge_tres().unwrap();
    assert_eq!(record.num_data_extensions().unwrap(), 2);
    assert_eq!(record.data_extensions[0].subheader.desitem.as_u32().unwrap(), 1);
    assert_eq!(record.data_extensions[1].subheader.desitem.as_u32().unwrap(), 2);

    record.remove_image_segment(0).unwrap();

    // The second image's overflow now points at host 1; DES indices are
    // untouched by host removal.
    assert_eq!(record.data_extensions[1].subheader.desitem.as_u32().unwrap(), 1);
    assert_eq!(record.images[0].subheader.ixsofl.as_u32().unwrap(), 2);
}

#[test]
fn moving_segments_keeps_overflow_indexes_valid() {
    let mut record = Record::new(Version::V21);
    record.new_image_segment().unwrap();
    record.new_image_segment().unwrap();
    for i in 0..11 {
        record.images[1]
            .subheader
            .extended_section
            .append(raw_tre(&format!("TRE{i:03}"), 9_994));
    }
    record.unmerge_tres().unwrap();
    assert_eq!(record.images[1].subheader.ixsofl.as_u32().unwrap(), 1);

    record.move_image_segment(0, 1).unwrap();
    record.move_data_extension_segment(0, 0).unwrap();

    // The stored offset still names an existing overflow DES; no
    // renumbering is required by a move.
    let ofl = record.images[0].subheader.ixsofl.as_u32().unwrap();
    assert_eq!(ofl, 1);
    let des = &record.data_extensions[ofl as usize - 1].subheader;
    assert_eq!(des.destag.trimmed(), TRE_OVERFLOW_TAG);
}

// ---------------------------------------------------------------------------
// Tests: Malformed Overflow Segments
// ---------------------------------------------------------------------------

#[test]
fn merge_rejects_unknown_host_kind() {
    let mut record = Record::new(Version::V21);
    record.new_data_extension_segment().unwrap();
    let sub = &mut record.data_extensions[0].subheader;
    sub.destag.set_string(TRE_OVERFLOW_TAG).unwrap();
    sub.desoflw.set_string("BOGUS").unwrap();
    sub.desitem.set_u32(1).unwrap();

    let err = record.merge_tres().unwrap_err();
    assert_eq!(err.code(), "INVALID_OVERFLOW");
    // The malformed segment is left in place.
    assert_eq!(record.num_data_extensions().unwrap(), 1);
}

#[test]
fn merge_rejects_out_of_range_host_index() {
    let mut record = Record::new(Version::V21);
    record.new_data_extension_segment().unwrap();
    let sub = &mut record.data_extensions[0].subheader;
    sub.destag.set_string(TRE_OVERFLOW_TAG).unwrap();
    sub.desoflw.set_string("UDID").unwrap();
    sub.desitem.set_u32(4).unwrap();

    let err = record.merge_tres().unwrap_err();
    assert_eq!(err.code(), "INVALID_OVERFLOW");
}

// ---------------------------------------------------------------------------
// Property: Round Trips Over Random Sections
// ---------------------------------------------------------------------------

proptest! {
    /// After unmerge every section respects its budget, and a merge restores
    /// the original TRE sequence with no overflow segments left behind.
    #[test]
    fn unmerge_merge_round_trip(sizes in proptest::collection::vec(1usize..3_000, 0..40)) {
        let mut record = Record::new(Version::V21);
        record.new_graphic_segment().unwrap();
        for (i, size) in sizes.iter().enumerate() {
            record.graphics[0]
                .subheader
                .extended_section
                .append(raw_tre(&format!("T{i:05}"), *size));
        }
        let original = tags(&record.graphics[0].subheader.extended_section);

        record.unmerge_tres().unwrap();
        prop_assert!(
            record.graphics[0].subheader.extended_section.compute_length().unwrap() <= 9_741
        );

        record.merge_tres().unwrap();
        prop_assert_eq!(record.num_data_extensions().unwrap(), 0);
        prop_assert_eq!(tags(&record.graphics[0].subheader.extended_section), original);
    }
}
