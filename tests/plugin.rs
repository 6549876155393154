//! Integration tests: the process-wide handler registry.
//!
//! These tests share one registry instance, so every test uses identifiers
//! of its own. Dynamic loading is exercised against directories only; the
//! handler paths that matter (fallback, override, retrieval failure) are
//! covered through programmatic registration.

use std::sync::Arc;

use nitf::plugin::{
    CompressionInterface, PluginRegistry, COMPRESSION_KEY, DECOMPRESSION_KEY, TRE_KEY,
};
use nitf::tre::handler::{DescriptiveHandler, FieldDef, TreHandler, RAW_FIELD};
use nitf::tre::Tre;
use nitf::{FieldKind, Result};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Tests: TRE Handlers
// ---------------------------------------------------------------------------

fn foo_init() -> &'static [&'static str] {
    &[TRE_KEY, "FOOTRE"]
}

#[test]
fn registration_resolves_and_override_wins() {
    let first: Arc<dyn TreHandler> = Arc::new(DescriptiveHandler::new(vec![FieldDef::new(
        "SENSOR",
        FieldKind::BcsA,
        4,
    )]));
    PluginRegistry::register_tre_handler(foo_init, first).unwrap();
    assert!(PluginRegistry::tre_handler_exists("FOOTRE"));

    let tre = Tre::new("FOOTRE", None).unwrap();
    assert!(tre.exists("SENSOR"));

    // Re-registration replaces the mapping (warns, does not fail).
    let second: Arc<dyn TreHandler> = Arc::new(DescriptiveHandler::new(vec![FieldDef::new(
        "ELEVATION",
        FieldKind::BcsN,
        8,
    )]));
    PluginRegistry::register_tre_handler(foo_init, second).unwrap();
    let tre = Tre::new("FOOTRE", None).unwrap();
    assert!(tre.exists("ELEVATION"));
    assert!(!tre.exists("SENSOR"));
}

#[test]
fn unknown_tag_falls_back_to_raw_handler() {
    assert!(PluginRegistry::retrieve_tre_handler("ZZZZZZ").is_none());
    let mut tre = Tre::new("ZZZZZZ", None).unwrap();
    tre.parse(b"whatever bytes").unwrap();
    assert!(tre.exists(RAW_FIELD));
    assert_eq!(tre.size().unwrap(), 14);
}

#[test]
fn raw_sentinel_bypasses_the_registry() {
    fn init() -> &'static [&'static str] {
        &[TRE_KEY, "RAWSEL"]
    }
    let handler: Arc<dyn TreHandler> = Arc::new(DescriptiveHandler::new(vec![FieldDef::new(
        "FIELD1",
        FieldKind::BcsA,
        2,
    )]));
    PluginRegistry::register_tre_handler(init, handler).unwrap();

    let tre = Tre::new("RAWSEL", Some("raw")).unwrap();
    assert!(tre.exists(RAW_FIELD));
    assert!(!tre.exists("FIELD1"));
}

#[test]
fn identifier_spaces_normalize_to_underscores() {
    fn init() -> &'static [&'static str] {
        &[TRE_KEY, "SP TRE"]
    }
    let handler: Arc<dyn TreHandler> =
        Arc::new(DescriptiveHandler::new(vec![FieldDef::new("N", FieldKind::BcsN, 1)]));
    PluginRegistry::register_tre_handler(init, handler).unwrap();
    assert!(PluginRegistry::tre_handler_exists("SP TRE"));
    assert!(PluginRegistry::tre_handler_exists("SP_TRE"));
}

#[test]
fn kind_key_mismatch_is_rejected() {
    fn init() -> &'static [&'static str] {
        &[COMPRESSION_KEY, "NOTATRE"]
    }
    let handler: Arc<dyn TreHandler> =
        Arc::new(DescriptiveHandler::new(vec![FieldDef::new("N", FieldKind::BcsN, 1)]));
    let err = PluginRegistry::register_tre_handler(init, handler).unwrap_err();
    assert_eq!(err.code(), "INVALID_OBJECT");
    assert!(!PluginRegistry::tre_handler_exists("NOTATRE"));
}

// ---------------------------------------------------------------------------
// Tests: Compression Handlers
// ---------------------------------------------------------------------------

struct NullCodec;

impl CompressionInterface for NullCodec {}

fn null_codec(_ident: &str) -> Result<Box<dyn CompressionInterface>> {
    Ok(Box::new(NullCodec))
}

#[test]
fn compression_constructors_resolve_and_build() {
    fn init() -> &'static [&'static str] {
        &[COMPRESSION_KEY, "X7"]
    }
    PluginRegistry::register_compression_handler(init, null_codec).unwrap();
    assert!(PluginRegistry::compression_handler_exists("X7"));

    let constructor = PluginRegistry::retrieve_comp_constructor("X7").unwrap();
    constructor.construct("X7").unwrap();
}

#[test]
fn missing_codec_lookups_are_fatal() {
    let err = PluginRegistry::retrieve_comp_constructor("NOPE").unwrap_err();
    assert_eq!(err.code(), "COMPRESSION");
    let err = PluginRegistry::retrieve_decomp_constructor("NOPE").unwrap_err();
    assert_eq!(err.code(), "DECOMPRESSION");
}

#[test]
fn decompression_registration_is_separate() {
    fn init() -> &'static [&'static str] {
        &[DECOMPRESSION_KEY, "D7"]
    }
    PluginRegistry::register_decompression_handler(init, null_codec).unwrap();
    assert!(PluginRegistry::decompression_handler_exists("D7"));
    assert!(!PluginRegistry::compression_handler_exists("D7"));
}

// ---------------------------------------------------------------------------
// Tests: Directory Scanning
// ---------------------------------------------------------------------------

#[test]
fn empty_plugin_directory_loads_nothing() {
    let dir = TempDir::new().unwrap();
    PluginRegistry::load_dir(dir.path()).unwrap();
}

#[test]
fn missing_plugin_directory_is_not_fatal() {
    let dir = TempDir::new().unwrap();
    let gone = dir.path().join("never-created");
    PluginRegistry::load_dir(&gone).unwrap();
}

#[test]
fn non_library_files_are_skipped() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("README.txt"), b"not a plugin").unwrap();
    PluginRegistry::load_dir(dir.path()).unwrap();
}

#[test]
fn broken_library_files_are_skipped() {
    let dir = TempDir::new().unwrap();
    let name = format!("garbage.{}", std::env::consts::DLL_EXTENSION);
    std::fs::write(dir.path().join(name), b"\x7fELF not really").unwrap();
    // The bad candidate is logged and skipped; the scan itself succeeds.
    PluginRegistry::load_dir(dir.path()).unwrap();
}
