//! TRE handler capability set and the built-in handlers.
//!
//! A handler is the behavior half of a TRE: it knows how to parse a payload
//! into fields, serialize them back, size the result, and vet field writes.
//! The value half lives in [`TreStorage`]. Handlers come in three flavors:
//!
//! - the default raw handler, storing one opaque byte field — the fallback
//!   when no plugin claims a tag,
//! - descriptive handlers, driven by a static field schema (this is what
//!   plugin libraries export),
//! - arbitrary custom implementations registered programmatically.
//!
//! Callers never branch on the flavor; only the capability set is invoked.

use std::collections::HashMap;
use std::fmt;

use crate::error::{NitfError, Result};
use crate::field::{Field, FieldKind};

/// Field name used by the default raw handler for its single payload field.
pub const RAW_FIELD: &str = "raw_data";

/// Capability set every TRE handler provides. Field lookup and enumeration
/// are uniform over [`TreStorage`] and need no handler involvement.
pub trait TreHandler: Send + Sync + fmt::Debug {
    /// Populate a fresh storage for a TRE, optionally for the sub-variant
    /// named by `id`.
    fn init(&self, store: &mut TreStorage, id: Option<&str>) -> Result<()>;

    /// Parse a serialized payload (without the 11-byte tag/length prefix)
    /// into fields.
    fn parse(&self, store: &mut TreStorage, data: &[u8]) -> Result<()>;

    /// Append the serialized payload to `out`.
    fn serialize(&self, store: &TreStorage, out: &mut Vec<u8>) -> Result<()>;

    /// Serialized payload size in bytes, recomputed from current state.
    fn current_size(&self, store: &TreStorage) -> Result<u32>;

    /// Write `data` into the field at `path`.
    fn set_field(&self, store: &mut TreStorage, path: &str, data: &[u8]) -> Result<()>;
}

// ── Field storage ──────────────────────────────────────────────────

/// Ordered field map of one TRE instance. Iteration order is definition
/// order, which is also serialization order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreStorage {
    fields: Vec<(String, Field)>,
    index: HashMap<String, usize>,
}

impl TreStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a field, keeping first-insertion order.
    pub fn insert(&mut self, name: &str, field: Field) {
        if let Some(&i) = self.index.get(name) {
            self.fields[i].1 = field;
        } else {
            self.index.insert(name.to_string(), self.fields.len());
            self.fields.push((name.to_string(), field));
        }
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.index.get(name).map(|&i| &self.fields[i].1)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.index.get(name).map(|&i| &mut self.fields[i].1)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// All (name, field) pairs in definition order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(n, f)| (n.as_str(), f))
    }

    /// Fields whose dotted name contains `pattern`.
    pub fn find(&self, pattern: &str) -> Vec<(&str, &Field)> {
        self.iter().filter(|(name, _)| name.contains(pattern)).collect()
    }

    pub fn clear(&mut self) {
        self.fields.clear();
        self.index.clear();
    }
}

// ── Default raw handler ────────────────────────────────────────────

/// Fallback handler storing the whole payload as one anonymous byte field.
#[derive(Debug)]
pub struct RawHandler;

impl TreHandler for RawHandler {
    fn init(&self, store: &mut TreStorage, _id: Option<&str>) -> Result<()> {
        store.insert(RAW_FIELD, Field::binary(&[]));
        Ok(())
    }

    fn parse(&self, store: &mut TreStorage, data: &[u8]) -> Result<()> {
        store.insert(RAW_FIELD, Field::binary(data));
        Ok(())
    }

    fn serialize(&self, store: &TreStorage, out: &mut Vec<u8>) -> Result<()> {
        let field = store
            .get(RAW_FIELD)
            .ok_or_else(|| NitfError::UnknownField(RAW_FIELD.to_string()))?;
        out.extend_from_slice(field.raw());
        Ok(())
    }

    fn current_size(&self, store: &TreStorage) -> Result<u32> {
        let field = store
            .get(RAW_FIELD)
            .ok_or_else(|| NitfError::UnknownField(RAW_FIELD.to_string()))?;
        Ok(field.width() as u32)
    }

    fn set_field(&self, store: &mut TreStorage, path: &str, data: &[u8]) -> Result<()> {
        if path != RAW_FIELD {
            return Err(NitfError::UnknownField(path.to_string()));
        }
        store.insert(RAW_FIELD, Field::binary(data));
        Ok(())
    }
}

// ── Descriptive handler ────────────────────────────────────────────

/// One entry of a descriptive-handler schema.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: String,
    pub kind: FieldKind,
    pub width: usize,
}

impl FieldDef {
    pub fn new(name: &str, kind: FieldKind, width: usize) -> Self {
        Self { name: name.to_string(), kind, width }
    }
}

/// Schema-driven handler: a fixed sequence of named, fixed-width fields,
/// optionally with alternate schemas keyed by TRE id.
#[derive(Debug)]
pub struct DescriptiveHandler {
    defs: Vec<FieldDef>,
    variants: Vec<(String, Vec<FieldDef>)>,
}

impl DescriptiveHandler {
    pub fn new(defs: Vec<FieldDef>) -> Self {
        Self { defs, variants: Vec::new() }
    }

    /// Register an alternate schema selected when a TRE is created with the
    /// matching id.
    pub fn with_variant(mut self, id: &str, defs: Vec<FieldDef>) -> Self {
        self.variants.push((id.to_string(), defs));
        self
    }

    fn defs_for(&self, id: Option<&str>) -> &[FieldDef] {
        if let Some(id) = id {
            for (key, defs) in &self.variants {
                if key == id {
                    return defs;
                }
            }
        }
        &self.defs
    }
}

impl TreHandler for DescriptiveHandler {
    fn init(&self, store: &mut TreStorage, id: Option<&str>) -> Result<()> {
        for def in self.defs_for(id) {
            store.insert(&def.name, Field::new(def.kind, def.width));
        }
        Ok(())
    }

    fn parse(&self, store: &mut TreStorage, data: &[u8]) -> Result<()> {
        let expected: usize = store.iter().map(|(_, f)| f.width()).sum();
        if data.len() != expected {
            return Err(NitfError::HandlerRejected(format!(
                "payload of {} bytes, schema expects {}",
                data.len(),
                expected
            )));
        }
        let mut offset = 0;
        for i in 0..store.fields.len() {
            let width = store.fields[i].1.width();
            store.fields[i].1.set_raw(&data[offset..offset + width])?;
            offset += width;
        }
        Ok(())
    }

    fn serialize(&self, store: &TreStorage, out: &mut Vec<u8>) -> Result<()> {
        for (_, field) in store.iter() {
            out.extend_from_slice(field.raw());
        }
        Ok(())
    }

    fn current_size(&self, store: &TreStorage) -> Result<u32> {
        Ok(store.iter().map(|(_, f)| f.width() as u32).sum())
    }

    fn set_field(&self, store: &mut TreStorage, path: &str, data: &[u8]) -> Result<()> {
        let field = store
            .get_mut(path)
            .ok_or_else(|| NitfError::UnknownField(path.to_string()))?;
        field.set_raw(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> DescriptiveHandler {
        DescriptiveHandler::new(vec![
            FieldDef::new("ACFT_ID", FieldKind::BcsA, 10),
            FieldDef::new("PIXEL_COUNT", FieldKind::BcsN, 8),
        ])
    }

    #[test]
    fn descriptive_parse_and_serialize() {
        let handler = schema();
        let mut store = TreStorage::new();
        handler.init(&mut store, None).unwrap();
        handler.parse(&mut store, b"HAWKEYE   00001024").unwrap();
        assert_eq!(store.get("ACFT_ID").unwrap().trimmed(), "HAWKEYE");
        assert_eq!(store.get("PIXEL_COUNT").unwrap().as_u32().unwrap(), 1024);

        let mut out = Vec::new();
        handler.serialize(&store, &mut out).unwrap();
        assert_eq!(out, b"HAWKEYE   00001024");
        assert_eq!(handler.current_size(&store).unwrap(), 18);
    }

    #[test]
    fn descriptive_rejects_wrong_length() {
        let handler = schema();
        let mut store = TreStorage::new();
        handler.init(&mut store, None).unwrap();
        let err = handler.parse(&mut store, b"short").unwrap_err();
        assert_eq!(err.code(), "HANDLER_REJECTED");
    }

    #[test]
    fn descriptive_variant_selected_by_id() {
        let handler = schema().with_variant(
            "short",
            vec![FieldDef::new("ACFT_ID", FieldKind::BcsA, 4)],
        );
        let mut store = TreStorage::new();
        handler.init(&mut store, Some("short")).unwrap();
        assert_eq!(handler.current_size(&store).unwrap(), 4);
    }

    #[test]
    fn raw_handler_stores_anonymous_bytes() {
        let handler = RawHandler;
        let mut store = TreStorage::new();
        handler.init(&mut store, None).unwrap();
        handler.parse(&mut store, b"opaque payload").unwrap();
        assert_eq!(handler.current_size(&store).unwrap(), 14);
        assert_eq!(
            handler.set_field(&mut store, "nope", b"x").unwrap_err().code(),
            "UNKNOWN_FIELD"
        );
    }

    #[test]
    fn storage_keeps_definition_order() {
        let mut store = TreStorage::new();
        store.insert("b_field", Field::new(FieldKind::BcsA, 1));
        store.insert("a_field", Field::new(FieldKind::BcsA, 1));
        store.insert("b_field", Field::new(FieldKind::BcsA, 2));
        let names: Vec<_> = store.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["b_field", "a_field"]);
        assert_eq!(store.get("b_field").unwrap().width(), 2);
    }
}
