//! Segment types: one module per segment kind, each pairing a typed
//! subheader with the byte-range seam the external reader/writer maintains.
//!
//! Subheader constructors populate the mandatory static fields and resize
//! the embedded security group before any field is written, so values are
//! justified against the correct version widths.

pub mod des;
pub mod graphic;
pub mod image;
pub mod label;
pub mod res;
pub mod text;

pub use des::{DeSegment, DeSubheader};
pub use graphic::{GraphicSegment, GraphicSubheader};
pub use image::{BandInfo, ImageSegment, ImageSubheader};
pub use label::{LabelSegment, LabelSubheader};
pub use res::{ReSegment, ReSubheader};
pub use text::{TextSegment, TextSubheader};

/// DESTAG value marking a data-extension segment that carries TREs spilled
/// out of a host subheader.
pub const TRE_OVERFLOW_TAG: &str = "TRE_OVERFLOW";

/// DESVER value written into overflow segments.
pub const TRE_OVERFLOW_VERSION: u32 = 1;
