//! Tagged Record Extensions: the TRE value object and the ordered extension
//! sections that carry them.

pub mod handler;

use std::sync::Arc;

use crate::error::{NitfError, Result};
use crate::field::Field;
use crate::plugin::PluginRegistry;

pub use handler::{DescriptiveHandler, FieldDef, RawHandler, TreHandler, TreStorage, RAW_FIELD};

/// Maximum tag length (CETAG is six bytes on the wire).
pub const MAX_TAG_LEN: usize = 6;

/// Serialized per-TRE prefix: 6-byte CETAG + 5-byte CEL.
pub const TRE_HEADER_LEN: u64 = 11;

/// Sentinel id that forces the default raw handler, bypassing the registry.
pub const RAW_ID: &str = "raw";

/// One TRE instance: a tag, an optional sub-variant id, the handler that
/// interprets it, and its current field values.
///
/// The handler is shared with the process-wide registry entry that produced
/// it; cloning a TRE deep-copies the values and shares the handler.
#[derive(Debug, Clone)]
pub struct Tre {
    tag: String,
    id: Option<String>,
    handler: Arc<dyn TreHandler>,
    storage: TreStorage,
}

impl Tre {
    /// Create a TRE for `tag`, resolving a handler through the plugin
    /// registry. Falls back to the default raw handler when no plugin claims
    /// the tag, or when `id` is the [`RAW_ID`] sentinel.
    pub fn new(tag: &str, id: Option<&str>) -> Result<Self> {
        let handler = match id {
            Some(RAW_ID) => None,
            _ => PluginRegistry::retrieve_tre_handler(tag),
        };
        let handler = handler.unwrap_or_else(|| Arc::new(RawHandler) as Arc<dyn TreHandler>);
        Self::with_handler(tag, id, handler)
    }

    /// Create a TRE with an explicit handler.
    pub fn with_handler(tag: &str, id: Option<&str>, handler: Arc<dyn TreHandler>) -> Result<Self> {
        if tag.is_empty() || tag.len() > MAX_TAG_LEN {
            return Err(NitfError::InvalidObject(format!(
                "TRE tag must be 1..={} bytes, got {:?}",
                MAX_TAG_LEN, tag
            )));
        }
        let mut storage = TreStorage::new();
        handler.init(&mut storage, id)?;
        Ok(Self {
            tag: tag.to_string(),
            id: id.map(str::to_string),
            handler,
            storage,
        })
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Parse a serialized payload (the bytes following the tag/length
    /// prefix) into this TRE's fields.
    pub fn parse(&mut self, data: &[u8]) -> Result<()> {
        self.handler.parse(&mut self.storage, data)
    }

    /// Append the serialized payload to `out`.
    pub fn serialize(&self, out: &mut Vec<u8>) -> Result<()> {
        self.handler.serialize(&self.storage, out)
    }

    /// Current serialized payload size, excluding the 11-byte prefix.
    /// Recomputed from state on every call.
    pub fn size(&self) -> Result<u32> {
        self.handler.current_size(&self.storage)
    }

    /// Full on-wire length: prefix plus payload.
    pub fn serialized_len(&self) -> Result<u64> {
        Ok(TRE_HEADER_LEN + u64::from(self.size()?))
    }

    pub fn set_field(&mut self, path: &str, data: &[u8]) -> Result<()> {
        self.handler.set_field(&mut self.storage, path, data)
    }

    pub fn field(&self, path: &str) -> Option<&Field> {
        self.storage.get(path)
    }

    pub fn exists(&self, path: &str) -> bool {
        self.storage.exists(path)
    }

    /// Fields whose dotted name contains `pattern`, in definition order.
    pub fn find(&self, pattern: &str) -> Vec<(&str, &Field)> {
        self.storage.find(pattern)
    }

    /// All (name, field) pairs in definition order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.storage.iter()
    }
}

/// TREs are equal when tag, id, and serialized payload all match.
impl PartialEq for Tre {
    fn eq(&self, other: &Self) -> bool {
        if self.tag != other.tag || self.id != other.id {
            return false;
        }
        let mut a = Vec::new();
        let mut b = Vec::new();
        self.serialize(&mut a).is_ok() && other.serialize(&mut b).is_ok() && a == b
    }
}

// ── Extensions section ─────────────────────────────────────────────

/// An ordered TRE container backing one subheader extension section
/// (UDHD, XHD, UDID, IXSHD, SXSHD, LXSHD, or TXSHD). Serialization order is
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extensions {
    tres: Vec<Tre>,
}

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, tre: Tre) {
        self.tres.push(tre);
    }

    pub fn len(&self) -> usize {
        self.tres.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tres.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Tre> {
        self.tres.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Tre> {
        self.tres.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tre> {
        self.tres.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Tre> {
        self.tres.iter_mut()
    }

    /// Remove and return the TRE at `index`.
    pub fn remove(&mut self, index: usize) -> Tre {
        self.tres.remove(index)
    }

    /// Move every TRE out, leaving the section empty.
    pub fn take_all(&mut self) -> Vec<Tre> {
        std::mem::take(&mut self.tres)
    }

    /// Move the TREs from `index` onward out, preserving order.
    pub fn split_off(&mut self, index: usize) -> Vec<Tre> {
        self.tres.split_off(index)
    }

    /// Total serialized length of the section: for each TRE, the 11-byte
    /// prefix plus its current payload size.
    pub fn compute_length(&self) -> Result<u64> {
        let mut total = 0u64;
        for tre in &self.tres {
            total += tre.serialized_len()?;
        }
        Ok(total)
    }
}

impl Extend<Tre> for Extensions {
    fn extend<T: IntoIterator<Item = Tre>>(&mut self, iter: T) {
        self.tres.extend(iter);
    }
}
