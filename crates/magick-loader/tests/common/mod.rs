//! Shared fixtures: an in-process module speaking the loader ABI, and a
//! `ModuleLoader` that "loads" it after checking the extracted file.

#![allow(dead_code)]

use std::cell::RefCell;
use std::ffi::{c_char, c_void, CStr, CString};
use std::io::Write;
use std::path::Path;
use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use flate2::write::GzEncoder;
use flate2::Compression;
use magick_abi::{
    AbiStatus, ConstructorDescriptor, ModuleManifest, NativeValue, TypeDescriptor, ValueKind,
    ABI_VERSION, STATUS_BAD_ARGUMENTS, STATUS_ERROR, STATUS_OK, STATUS_UNKNOWN_METHOD,
};
use magick_loader::native::{initialize, LibraryError, ManifestModule};
use magick_loader::payload::AUXILIARY_FILES;
use magick_loader::{LoadError, ModuleDescriptor, ModuleLoader, NativeModule, Resources};

/// Content of the decompressed fixture module file.
pub const MODULE_BYTES: &[u8] = b"fixture GraphicsMagick module";

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Bundle with the module payload for `descriptor` and every auxiliary file.
pub fn full_resources(descriptor: &ModuleDescriptor) -> Resources {
    let mut resources = Resources::empty().with_bytes(descriptor.payload_key(), gzip(MODULE_BYTES));
    for name in AUXILIARY_FILES {
        resources = resources.with_bytes(
            ModuleDescriptor::auxiliary_key(name),
            format!("<!-- {} -->", name).into_bytes(),
        );
    }
    resources
}

// ============================================================================
// Fixture module
// ============================================================================

thread_local! {
    static LAST_ERROR: RefCell<CString> = RefCell::new(CString::default());
}

fn fail(status: AbiStatus, message: &str) -> AbiStatus {
    LAST_ERROR.with(|e| *e.borrow_mut() = CString::new(message).unwrap_or_default());
    status
}

unsafe extern "C" fn last_error() -> *const c_char {
    LAST_ERROR.with(|e| e.borrow().as_ptr())
}

/// `Initialize(cacheDirectory)` requires the auxiliary files to be present.
unsafe extern "C" fn graphicsmagick_static(
    method: *const c_char,
    args: *const NativeValue,
    argc: usize,
) -> AbiStatus {
    if CStr::from_ptr(method).to_bytes() != b"Initialize" {
        return fail(STATUS_UNKNOWN_METHOD, "unknown method");
    }
    let args = std::slice::from_raw_parts(args, argc);
    let directory = match args.first().and_then(|a| a.as_c_str()) {
        Some(dir) if argc == 1 => dir.to_string_lossy().into_owned(),
        _ => return fail(STATUS_BAD_ARGUMENTS, "Initialize expects one string"),
    };
    if !Path::new(&directory).join("colors.mgk").is_file() {
        return fail(STATUS_ERROR, "colors.mgk not found in cache directory");
    }
    STATUS_OK
}

unsafe extern "C" fn refusing_static(
    _method: *const c_char,
    _args: *const NativeValue,
    _argc: usize,
) -> AbiStatus {
    fail(STATUS_ERROR, "unable to locate delegates")
}

/// Stand-in for a native image object.
#[derive(Debug, PartialEq)]
pub struct FixtureImage {
    pub width: i32,
    pub height: i32,
}

unsafe extern "C" fn image_new(
    _args: *const NativeValue,
    _argc: usize,
    out: *mut *mut c_void,
) -> AbiStatus {
    *out = Box::into_raw(Box::new(FixtureImage { width: 0, height: 0 })) as *mut c_void;
    STATUS_OK
}

unsafe extern "C" fn image_new_sized(
    args: *const NativeValue,
    argc: usize,
    out: *mut *mut c_void,
) -> AbiStatus {
    let args = std::slice::from_raw_parts(args, argc);
    let (width, height) = match (args[0].as_i32(), args[1].as_i32()) {
        (Some(w), Some(h)) => (w, h),
        _ => return fail(STATUS_BAD_ARGUMENTS, "expected (i32, i32)"),
    };
    if width <= 0 || height <= 0 {
        return fail(STATUS_ERROR, "width and height must be positive");
    }
    *out = Box::into_raw(Box::new(FixtureImage { width, height })) as *mut c_void;
    STATUS_OK
}

unsafe extern "C" fn image_free(instance: *mut c_void) {
    drop(Box::from_raw(instance as *mut FixtureImage));
}

static SIZE_PARAMS: [u8; 2] = [ValueKind::I32 as u8, ValueKind::I32 as u8];

static IMAGE_CONSTRUCTORS: [ConstructorDescriptor; 2] = [
    ConstructorDescriptor {
        params: ptr::null(),
        param_count: 0,
        construct: image_new,
    },
    ConstructorDescriptor {
        params: SIZE_PARAMS.as_ptr(),
        param_count: 2,
        construct: image_new_sized,
    },
];

static TYPES: [TypeDescriptor; 2] = [
    TypeDescriptor {
        name: c"GraphicsMagick.GraphicsMagickNET".as_ptr(),
        constructors: ptr::null(),
        constructor_count: 0,
        invoke_static: Some(graphicsmagick_static),
        destroy: None,
    },
    TypeDescriptor {
        name: c"GraphicsMagick.MagickImage".as_ptr(),
        constructors: IMAGE_CONSTRUCTORS.as_ptr(),
        constructor_count: 2,
        invoke_static: None,
        destroy: Some(image_free),
    },
];

static MANIFEST: ModuleManifest = ModuleManifest {
    abi_version: ABI_VERSION,
    types: TYPES.as_ptr(),
    type_count: 2,
    last_error: Some(last_error),
};

static REFUSING_TYPES: [TypeDescriptor; 1] = [TypeDescriptor {
    name: c"GraphicsMagick.GraphicsMagickNET".as_ptr(),
    constructors: ptr::null(),
    constructor_count: 0,
    invoke_static: Some(refusing_static),
    destroy: None,
}];

static REFUSING_MANIFEST: ModuleManifest = ModuleManifest {
    abi_version: ABI_VERSION,
    types: REFUSING_TYPES.as_ptr(),
    type_count: 1,
    last_error: Some(last_error),
};

static EMPTY_MANIFEST: ModuleManifest = ModuleManifest {
    abi_version: ABI_VERSION,
    types: ptr::null(),
    type_count: 0,
    last_error: None,
};

/// Which fixture module the loader hands out.
#[derive(Debug, Clone, Copy)]
pub enum Fixture {
    /// Initializes when the auxiliary files are present
    Working,
    /// `Initialize` always fails
    Refusing,
    /// Has no initializer type
    Empty,
}

impl Fixture {
    fn manifest(self) -> &'static ModuleManifest {
        match self {
            Fixture::Working => &MANIFEST,
            Fixture::Refusing => &REFUSING_MANIFEST,
            Fixture::Empty => &EMPTY_MANIFEST,
        }
    }
}

/// Loader that accepts only the fixture module file and counts its calls.
#[derive(Debug, Clone)]
pub struct FixtureLoader {
    fixture: Fixture,
    calls: Arc<AtomicUsize>,
    delay: Duration,
}

impl FixtureLoader {
    pub fn new(fixture: Fixture) -> Self {
        Self {
            fixture,
            calls: Arc::new(AtomicUsize::new(0)),
            delay: Duration::ZERO,
        }
    }

    /// Sleep inside `load` to widen races between first callers.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Shared counter of `load` calls.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl ModuleLoader for FixtureLoader {
    fn load(&self, file: &Path, cache_directory: &Path) -> Result<Arc<dyn NativeModule>, LoadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);

        let load_error = |reason: String| LoadError::Load {
            path: file.to_path_buf(),
            source: LibraryError::Open { reason },
        };
        let bytes = std::fs::read(file).map_err(|e| load_error(e.to_string()))?;
        if bytes != MODULE_BYTES {
            return Err(load_error("invalid module image".to_string()));
        }

        let module = unsafe { ManifestModule::new(self.fixture.manifest(), None) }
            .map_err(|e| load_error(e.to_string()))?;
        initialize(&module, cache_directory)?;
        Ok(Arc::new(module))
    }
}
