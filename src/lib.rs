//! In-memory model for NITF 2.0 / 2.1 (and NSIF 1.0) files.
//!
//! A NITF file is a hierarchical binary container: a file header followed by
//! image, graphic, label, text, data-extension (DES), and reserved-extension
//! (RES) segments, each with a fixed-width subheader. Subheaders carry Tagged
//! Record Extensions (TREs) in ordered extension sections; TREs that do not
//! fit their section spill into synthetic `TRE_OVERFLOW` DES segments.
//!
//! This crate owns the record model and the machinery around it:
//!
//! - [`Record`] — the object graph of one file, with count/component-info
//!   invariants maintained under every add, remove, and move.
//! - The TRE overflow engine ([`Record::merge_tres`] /
//!   [`Record::unmerge_tres`]) that collapses overflow DES segments into
//!   their hosts on read and splits oversize sections back out on write,
//!   keeping all cross-reference indices correct.
//! - The [`clevel`] engine computing the minimum conforming complexity level.
//! - The process-wide [`plugin::PluginRegistry`] resolving TRE and
//!   (de)compression identifiers to handlers.
//!
//! Byte-level file I/O lives outside this crate: external readers populate a
//! `Record` from decoded subheader fields, and external writers emit bytes
//! from it.

pub mod clevel;
pub mod error;
pub mod field;
pub mod header;
pub mod plugin;
pub mod record;
pub mod security;
pub mod segment;
pub mod tre;

mod overflow;

pub use error::{NitfError, Result};
pub use field::{Field, FieldKind};
pub use header::{ComponentInfo, FileHeader};
pub use record::Record;
pub use security::FileSecurity;
pub use tre::{Extensions, Tre};

/// File-format version, per the FHDR/FVER header fields.
///
/// NSIF 1.0 (`FHDR="NSIF"`, `FVER="01.00"`) is byte-compatible with NITF 2.1
/// and reported as [`Version::V21`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    /// NITF 02.00
    V20,
    /// NITF 02.10 / NSIF 01.00
    V21,
    /// FHDR/FVER did not identify a supported version.
    Unknown,
}
