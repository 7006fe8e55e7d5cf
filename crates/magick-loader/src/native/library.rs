//! Platform dynamic loader
//!
//! `dlopen`/`dlsym` on Unix, `LoadLibraryW`/`GetProcAddress` on Windows.
//! Handles are never closed.

use std::ffi::{c_void, CString};
use std::fmt;
use std::path::Path;

use thiserror::Error;

/// Errors reported by the platform loader
#[derive(Debug, Clone, Error)]
pub enum LibraryError {
    /// The file could not be mapped (missing, wrong format, unresolved dependencies)
    #[error("{reason}")]
    Open {
        /// Loader-reported reason
        reason: String,
    },

    /// The library has no such export
    #[error("symbol not found: {symbol} ({reason})")]
    SymbolNotFound {
        /// Requested export
        symbol: String,
        /// Loader-reported reason
        reason: String,
    },

    /// Path or symbol name cannot be passed to the platform loader
    #[error("invalid name: {0}")]
    InvalidName(String),
}

/// A shared library mapped into the process.
///
/// There is no `Drop`: objects created by the module may outlive every owner
/// of the handle, so [`Library::into_static`] leaks it for the process lifetime.
pub struct Library {
    handle: sys::Handle,
    path: String,
}

impl Library {
    /// Map the library at `path`.
    ///
    /// Unix resolves every symbol eagerly (`RTLD_NOW | RTLD_LOCAL`), so a
    /// missing dependency fails here rather than on first call.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LibraryError> {
        let path = path.as_ref();
        let path = path
            .to_str()
            .ok_or_else(|| LibraryError::InvalidName(path.display().to_string()))?;

        let handle = sys::open(path).map_err(|reason| LibraryError::Open { reason })?;
        Ok(Self {
            handle,
            path: path.to_string(),
        })
    }

    pub fn into_static(self) -> &'static Library {
        Box::leak(Box::new(self))
    }

    /// Address of export `symbol`, reinterpreted as `T`.
    ///
    /// # Safety
    /// `T` must be a pointer-sized type (normally an `extern "C" fn`) matching
    /// the export's real signature.
    pub unsafe fn get<T: Copy>(&self, symbol: &str) -> Result<T, LibraryError> {
        let name = CString::new(symbol).map_err(|_| LibraryError::InvalidName(symbol.to_string()))?;
        let address = sys::symbol(self.handle, &name).map_err(|reason| {
            LibraryError::SymbolNotFound {
                symbol: symbol.to_string(),
                reason,
            }
        })?;
        Ok(std::mem::transmute_copy::<*mut c_void, T>(&address))
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Debug for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Library").field("path", &self.path).finish()
    }
}

// The handle is an opaque token; the platform loaders are thread-safe.
unsafe impl Send for Library {}
unsafe impl Sync for Library {}

#[cfg(unix)]
mod sys {
    use std::ffi::{c_void, CStr, CString};

    pub type Handle = *mut c_void;

    fn last_error() -> String {
        let message = unsafe { libc::dlerror() };
        if message.is_null() {
            return "unknown error".to_string();
        }
        unsafe { CStr::from_ptr(message) }.to_string_lossy().into_owned()
    }

    pub fn open(path: &str) -> Result<Handle, String> {
        let path = CString::new(path).map_err(|e| e.to_string())?;
        let handle = unsafe { libc::dlopen(path.as_ptr(), libc::RTLD_NOW | libc::RTLD_LOCAL) };
        if handle.is_null() {
            Err(last_error())
        } else {
            Ok(handle)
        }
    }

    pub fn symbol(handle: Handle, name: &CStr) -> Result<*mut c_void, String> {
        unsafe {
            libc::dlerror();
            let address = libc::dlsym(handle, name.as_ptr());
            if address.is_null() {
                Err(last_error())
            } else {
                Ok(address)
            }
        }
    }
}

#[cfg(windows)]
mod sys {
    use std::ffi::{c_char, c_void, CStr, OsStr};
    use std::os::windows::ffi::OsStrExt;

    pub type Handle = *mut c_void;

    extern "system" {
        fn LoadLibraryW(filename: *const u16) -> Handle;
        fn GetProcAddress(module: Handle, name: *const c_char) -> *mut c_void;
        fn GetLastError() -> u32;
    }

    fn last_error() -> String {
        format!("error code: {}", unsafe { GetLastError() })
    }

    pub fn open(path: &str) -> Result<Handle, String> {
        if path.contains('\0') {
            return Err(format!("path {:?} contains a NUL byte", path));
        }
        let wide: Vec<u16> = OsStr::new(path).encode_wide().chain(Some(0)).collect();
        let handle = unsafe { LoadLibraryW(wide.as_ptr()) };
        if handle.is_null() {
            Err(last_error())
        } else {
            Ok(handle)
        }
    }

    pub fn symbol(handle: Handle, name: &CStr) -> Result<*mut c_void, String> {
        let address = unsafe { GetProcAddress(handle, name.as_ptr()) };
        if address.is_null() {
            Err(last_error())
        } else {
            Ok(address)
        }
    }
}
