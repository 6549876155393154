//! Process-wide handler registry for TREs and (de)compression codecs.
//!
//! The registry maps identifier strings to handlers from two sources:
//!
//! - plugin libraries discovered on a search path (`NITF_PLUGIN_PATH`, or
//!   the compile-time default baked in via `NITF_DEFAULT_PLUGIN_PATH`),
//! - programmatic registration of statically linked handlers, which
//!   overrides file-loaded entries with the same identifier.
//!
//! A plugin library with stem `S` exports, with C linkage:
//!
//! ```text
//! S_init()      -> null-terminated string array; [0] is the kind key
//!                  ("TRE" | "COMPRESSION" | "DECOMPRESSION"), [1..] the
//!                  identifiers handled
//! S_handler()   -> TRE field-schema array (TRE kind only)
//! S_construct() -> codec constructor ((de)compression kinds only)
//! S_cleanup()   -> optional, invoked at registry shutdown
//! ```
//!
//! The singleton is initialized lazily behind a mutex; every public entry
//! point locks per call, which keeps steady-state retrieval trivially safe.

use std::collections::HashMap;
use std::ffi::{c_char, c_int, c_void, CStr, OsStr};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use libloading::Library;
use once_cell::sync::Lazy;

use crate::error::{NitfError, Result};
use crate::field::FieldKind;
use crate::tre::handler::{DescriptiveHandler, FieldDef, TreHandler};

/// Kind key advertised by TRE plugins as element 0 of their init list.
pub const TRE_KEY: &str = "TRE";
/// Kind key advertised by compression plugins.
pub const COMPRESSION_KEY: &str = "COMPRESSION";
/// Kind key advertised by decompression plugins.
pub const DECOMPRESSION_KEY: &str = "DECOMPRESSION";

/// Environment variable naming the plugin search directory.
pub const PLUGIN_PATH_VAR: &str = "NITF_PLUGIN_PATH";

/// Compile-time fallback search directory, if the build provided one.
const DEFAULT_PLUGIN_PATH: Option<&str> = option_env!("NITF_DEFAULT_PLUGIN_PATH");

/// Init function for programmatic registration: returns the identifier list
/// with the same element-0 kind-key convention as the plugin ABI.
pub type PluginInit = fn() -> &'static [&'static str];

// ── Plugin ABI types ───────────────────────────────────────────────

/// One entry of the field-schema array a TRE plugin's `S_handler` returns.
/// An entry with `kind == 0` terminates the array.
#[repr(C)]
pub struct RawTreDescription {
    /// 0 = end of array, 1 = BCS-A, 2 = BCS-N, 3 = binary.
    pub kind: c_int,
    /// Field width in bytes.
    pub width: u32,
    /// Null-terminated field name.
    pub label: *const c_char,
}

type PluginInitFn = unsafe extern "C" fn() -> *const *const c_char;
type TreHandlerFn = unsafe extern "C" fn(*mut c_int) -> *const RawTreDescription;
type CompConstructFn = unsafe extern "C" fn(*const c_char, *mut c_int) -> *mut c_void;
type CleanupFn = unsafe extern "C" fn();

// ── Compression seam ───────────────────────────────────────────────

/// Marker for codec instances. Pixel codecs live outside the record core;
/// the registry only resolves constructors for them.
pub trait CompressionInterface: Send {}

/// Constructor signature for statically registered codecs.
pub type CompressionConstructorFn = fn(&str) -> Result<Box<dyn CompressionInterface>>;

/// A resolved codec constructor, ready to be invoked by the pixel layer.
#[derive(Clone, Debug)]
pub enum CompressionConstructor {
    /// Statically registered Rust constructor.
    Static(CompressionConstructorFn),
    /// `S_construct` symbol from a loaded plugin library.
    Native(CompConstructFn),
}

/// Codec instance backed by a plugin-owned handle.
struct NativeCodec {
    _handle: *mut c_void,
}

// The handle is owned by the plugin and only ever passed back to it.
unsafe impl Send for NativeCodec {}

impl CompressionInterface for NativeCodec {}

impl CompressionConstructor {
    /// Construct a codec for `ident`.
    pub fn construct(&self, ident: &str) -> Result<Box<dyn CompressionInterface>> {
        match self {
            CompressionConstructor::Static(ctor) => ctor(ident),
            CompressionConstructor::Native(ctor) => {
                let c_ident = std::ffi::CString::new(ident)
                    .map_err(|_| NitfError::InvalidObject("identifier contains NUL".into()))?;
                let mut had_error: c_int = 0;
                let handle = unsafe { ctor(c_ident.as_ptr(), &mut had_error) };
                if handle.is_null() || had_error != 0 {
                    return Err(NitfError::HandlerRejected(format!(
                        "codec constructor for '{ident}'"
                    )));
                }
                Ok(Box::new(NativeCodec { _handle: handle }))
            }
        }
    }
}

// ── Registry ───────────────────────────────────────────────────────

struct LoadedLibrary {
    library: Library,
    stem: String,
}

/// The process-wide handler registry. All access goes through the
/// associated functions, which lock the singleton per call.
pub struct PluginRegistry {
    tre_handlers: HashMap<String, Arc<dyn TreHandler>>,
    compression_handlers: HashMap<String, CompressionConstructor>,
    decompression_handlers: HashMap<String, CompressionConstructor>,
    libraries: Vec<LoadedLibrary>,
}

static REGISTRY: Lazy<Mutex<PluginRegistry>> = Lazy::new(|| Mutex::new(PluginRegistry::bootstrap()));

fn lock() -> MutexGuard<'static, PluginRegistry> {
    REGISTRY.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Identifier keys have embedded spaces replaced with underscores.
fn normalize_ident(ident: &str) -> String {
    ident.replace(' ', "_")
}

impl PluginRegistry {
    fn empty() -> Self {
        Self {
            tre_handlers: HashMap::new(),
            compression_handlers: HashMap::new(),
            decompression_handlers: HashMap::new(),
            libraries: Vec::new(),
        }
    }

    /// First-access construction: scan the configured search path, if any.
    fn bootstrap() -> Self {
        let mut reg = Self::empty();
        let dir = std::env::var_os(PLUGIN_PATH_VAR)
            .map(PathBuf::from)
            .or_else(|| {
                DEFAULT_PLUGIN_PATH
                    .map(PathBuf::from)
                    .filter(|path| path.is_dir())
            });
        match dir {
            Some(dir) => {
                if let Err(err) = reg.load_dir_locked(&dir) {
                    tracing::warn!("plugin path scan failed: {err}");
                }
            }
            None => {
                tracing::debug!(
                    "no plugin path; set {PLUGIN_PATH_VAR} to load file plugins"
                );
            }
        }
        reg
    }

    /// Load every dynamic library in `dir`. Individual load failures are
    /// logged and skipped; a missing directory is not an error.
    pub fn load_dir(dir: &Path) -> Result<()> {
        lock().load_dir_locked(dir)
    }

    /// Load a single plugin library.
    pub fn load_plugin(path: &Path) -> Result<()> {
        lock().load_plugin_locked(path)
    }

    /// Register a statically linked TRE handler for every identifier the
    /// init function advertises. Overrides existing entries with a warning.
    pub fn register_tre_handler(init: PluginInit, handler: Arc<dyn TreHandler>) -> Result<()> {
        let idents = check_kind(init, TRE_KEY)?;
        let mut reg = lock();
        for ident in idents {
            let key = normalize_ident(ident);
            if reg.tre_handlers.insert(key.clone(), Arc::clone(&handler)).is_some() {
                tracing::warn!("static handler overriding [{key}] hook");
            }
        }
        Ok(())
    }

    /// Register a statically linked compression constructor.
    pub fn register_compression_handler(
        init: PluginInit,
        constructor: CompressionConstructorFn,
    ) -> Result<()> {
        let idents = check_kind(init, COMPRESSION_KEY)?;
        let mut reg = lock();
        for ident in idents {
            let key = normalize_ident(ident);
            if reg
                .compression_handlers
                .insert(key.clone(), CompressionConstructor::Static(constructor))
                .is_some()
            {
                tracing::warn!("static handler overriding [{key}] hook");
            }
        }
        Ok(())
    }

    /// Register a statically linked decompression constructor.
    pub fn register_decompression_handler(
        init: PluginInit,
        constructor: CompressionConstructorFn,
    ) -> Result<()> {
        let idents = check_kind(init, DECOMPRESSION_KEY)?;
        let mut reg = lock();
        for ident in idents {
            let key = normalize_ident(ident);
            if reg
                .decompression_handlers
                .insert(key.clone(), CompressionConstructor::Static(constructor))
                .is_some()
            {
                tracing::warn!("static handler overriding [{key}] hook");
            }
        }
        Ok(())
    }

    /// Look up the TRE handler for `ident`. `None` is not an error: callers
    /// fall back to the default raw handler.
    pub fn retrieve_tre_handler(ident: &str) -> Option<Arc<dyn TreHandler>> {
        lock().tre_handlers.get(&normalize_ident(ident)).cloned()
    }

    /// Look up the compression constructor for `ident`. Missing handlers are
    /// fatal to the caller.
    pub fn retrieve_comp_constructor(ident: &str) -> Result<CompressionConstructor> {
        lock()
            .compression_handlers
            .get(&normalize_ident(ident))
            .cloned()
            .ok_or_else(|| NitfError::Compression(ident.to_string()))
    }

    /// Look up the decompression constructor for `ident`.
    pub fn retrieve_decomp_constructor(ident: &str) -> Result<CompressionConstructor> {
        lock()
            .decompression_handlers
            .get(&normalize_ident(ident))
            .cloned()
            .ok_or_else(|| NitfError::Decompression(ident.to_string()))
    }

    pub fn tre_handler_exists(ident: &str) -> bool {
        lock().tre_handlers.contains_key(&normalize_ident(ident))
    }

    pub fn compression_handler_exists(ident: &str) -> bool {
        lock().compression_handlers.contains_key(&normalize_ident(ident))
    }

    pub fn decompression_handler_exists(ident: &str) -> bool {
        lock().decompression_handlers.contains_key(&normalize_ident(ident))
    }

    /// Tear the registry down: drop every handler mapping, run each loaded
    /// library's optional `S_cleanup`, and unload the libraries.
    pub fn shutdown() {
        let mut reg = lock();
        reg.tre_handlers.clear();
        reg.compression_handlers.clear();
        reg.decompression_handlers.clear();
        for loaded in reg.libraries.drain(..) {
            let symbol = format!("{}_cleanup", loaded.stem);
            unsafe {
                if let Ok(cleanup) = loaded.library.get::<CleanupFn>(symbol.as_bytes()) {
                    cleanup();
                }
            }
            // Library drop unloads the object.
        }
    }

    // ── Loading internals ──────────────────────────────────────────

    fn load_dir_locked(&mut self, dir: &Path) -> Result<()> {
        if !dir.is_dir() {
            tracing::debug!("plugin directory {} does not exist, continuing without plugins", dir.display());
            return Ok(());
        }
        let entries = std::fs::read_dir(dir)
            .map_err(|err| NitfError::OpeningFile(format!("{}: {err}", dir.display())))?;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(OsStr::to_str) != Some(std::env::consts::DLL_EXTENSION) {
                continue;
            }
            if let Err(err) = self.load_plugin_locked(&path) {
                tracing::warn!("plugin {} failed to load: {err}", path.display());
            }
        }
        Ok(())
    }

    fn load_plugin_locked(&mut self, path: &Path) -> Result<()> {
        let stem = path
            .file_stem()
            .and_then(OsStr::to_str)
            .ok_or_else(|| NitfError::LoadingLibrary(format!("{}: no stem", path.display())))?
            .to_string();

        let library = unsafe { Library::new(path) }
            .map_err(|err| NitfError::LoadingLibrary(format!("{}: {err}", path.display())))?;

        let idents = unsafe {
            let init = library
                .get::<PluginInitFn>(format!("{stem}_init").as_bytes())
                .map_err(|err| {
                    NitfError::LoadingLibrary(format!("{stem}_init not found: {err}"))
                })?;
            read_string_array(init())
        };
        let (kind, idents) = idents
            .split_first()
            .ok_or_else(|| NitfError::LoadingLibrary(format!("{stem}_init returned no kind key")))?;

        match kind.as_str() {
            TRE_KEY => {
                let schema = unsafe {
                    let hook = library
                        .get::<TreHandlerFn>(format!("{stem}_handler").as_bytes())
                        .map_err(|err| {
                            NitfError::LoadingLibrary(format!("{stem}_handler not found: {err}"))
                        })?;
                    let mut had_error: c_int = 0;
                    let descriptions = hook(&mut had_error);
                    if descriptions.is_null() || had_error != 0 {
                        return Err(NitfError::LoadingLibrary(format!(
                            "{stem}_handler returned no description"
                        )));
                    }
                    read_descriptions(descriptions)?
                };
                let handler: Arc<dyn TreHandler> = Arc::new(DescriptiveHandler::new(schema));
                for ident in idents {
                    let key = normalize_ident(ident);
                    if self.tre_handlers.insert(key.clone(), Arc::clone(&handler)).is_some() {
                        tracing::warn!("plugin {stem} overriding [{key}] hook");
                    }
                }
            }
            COMPRESSION_KEY | DECOMPRESSION_KEY => {
                let constructor = unsafe {
                    *library
                        .get::<CompConstructFn>(format!("{stem}_construct").as_bytes())
                        .map_err(|err| {
                            NitfError::LoadingLibrary(format!("{stem}_construct not found: {err}"))
                        })?
                };
                let map = if kind == COMPRESSION_KEY {
                    &mut self.compression_handlers
                } else {
                    &mut self.decompression_handlers
                };
                for ident in idents {
                    let key = normalize_ident(ident);
                    if map
                        .insert(key.clone(), CompressionConstructor::Native(constructor))
                        .is_some()
                    {
                        tracing::warn!("plugin {stem} overriding [{key}] hook");
                    }
                }
            }
            other => {
                return Err(NitfError::LoadingLibrary(format!(
                    "{stem}: unsupported identity [{other}]"
                )));
            }
        }

        self.libraries.push(LoadedLibrary { library, stem });
        Ok(())
    }
}

/// Run a registration init hook and verify its kind key.
fn check_kind(init: PluginInit, expected: &str) -> Result<&'static [&'static str]> {
    let idents = init();
    match idents.split_first() {
        Some((&kind, rest)) if kind == expected => Ok(rest),
        _ => Err(NitfError::InvalidObject(format!("expected a {expected} identity"))),
    }
}

/// Copy a null-terminated `char*` array into owned strings.
unsafe fn read_string_array(mut cursor: *const *const c_char) -> Vec<String> {
    let mut out = Vec::new();
    if cursor.is_null() {
        return out;
    }
    while !(*cursor).is_null() {
        out.push(CStr::from_ptr(*cursor).to_string_lossy().into_owned());
        cursor = cursor.add(1);
    }
    out
}

/// Copy a zero-kind-terminated description array into an owned schema.
unsafe fn read_descriptions(mut cursor: *const RawTreDescription) -> Result<Vec<FieldDef>> {
    let mut defs = Vec::new();
    while (*cursor).kind != 0 {
        let entry = &*cursor;
        let kind = match entry.kind {
            1 => FieldKind::BcsA,
            2 => FieldKind::BcsN,
            3 => FieldKind::Binary,
            other => {
                return Err(NitfError::LoadingLibrary(format!(
                    "unknown field kind {other} in plugin description"
                )));
            }
        };
        if entry.label.is_null() {
            return Err(NitfError::LoadingLibrary("unnamed field in plugin description".into()));
        }
        let name = CStr::from_ptr(entry.label).to_string_lossy().into_owned();
        defs.push(FieldDef { name, kind, width: entry.width as usize });
        cursor = cursor.add(1);
    }
    Ok(defs)
}
