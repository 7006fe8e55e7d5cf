//! Payload selection
//!
//! Picks the module name and resource keys for the running process from its
//! pointer width and the quantum depth chosen at build time.

use std::fmt;

#[cfg(all(feature = "q8", feature = "q16"))]
compile_error!("features `q8` and `q16` are mutually exclusive; enable exactly one");

#[cfg(not(any(feature = "q8", feature = "q16")))]
compile_error!("no quantum depth selected; enable exactly one of the `q8` or `q16` features");

#[cfg(not(any(target_pointer_width = "32", target_pointer_width = "64")))]
compile_error!("the embedded module is only built for 32-bit and 64-bit targets");

/// Product name used for module files and the cache directory.
pub const PRODUCT_NAME: &str = "GraphicsMagick.NET";

/// Namespace prefixing every embedded resource key.
pub const RESOURCE_NAMESPACE: &str = "GraphicsMagick";

/// Auxiliary data files written next to the module.
pub const AUXILIARY_FILES: [&str; 5] = [
    "colors.mgk",
    "delegates.mgk",
    "modules.mgk",
    "type.mgk",
    "type-ghostscript.mgk",
];

/// Process architecture the module is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Architecture {
    /// 32-bit
    X86,
    /// 64-bit
    X64,
}

impl Architecture {
    /// Architecture of the running process.
    pub const fn current() -> Self {
        #[cfg(target_pointer_width = "64")]
        {
            Architecture::X64
        }
        #[cfg(not(target_pointer_width = "64"))]
        {
            Architecture::X86
        }
    }

    /// Tag used in module names and resource keys.
    pub fn tag(self) -> &'static str {
        match self {
            Architecture::X86 => "x86",
            Architecture::X64 => "x64",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Quantum depth flavor of the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// 8 bits per channel
    Q8,
    /// 16 bits per channel
    Q16,
}

impl Variant {
    /// Variant selected by cargo features.
    #[cfg(feature = "q8")]
    pub const BUILD: Variant = Variant::Q8;

    /// Variant selected by cargo features.
    #[cfg(feature = "q16")]
    pub const BUILD: Variant = Variant::Q16;

    /// Tag used in module names and resource keys.
    pub fn tag(self) -> &'static str {
        match self {
            Variant::Q8 => "Q8",
            Variant::Q16 => "Q16",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Everything needed to find and name the module for one architecture and variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
    module_name: String,
    architecture: Architecture,
    variant: Variant,
    payload_key: String,
}

impl ModuleDescriptor {
    /// Descriptor for the given architecture and variant.
    pub fn new(architecture: Architecture, variant: Variant) -> Self {
        Self {
            module_name: format!("{}-{}-{}", PRODUCT_NAME, variant, architecture),
            architecture,
            variant,
            payload_key: format!(
                "{}.Resources.Release{}.{}-{}.gz",
                RESOURCE_NAMESPACE, variant, PRODUCT_NAME, architecture
            ),
        }
    }

    /// Descriptor for the running process and the build variant.
    pub fn current() -> Self {
        Self::new(Architecture::current(), Variant::BUILD)
    }

    /// Logical module name, e.g. `GraphicsMagick.NET-Q16-x64`.
    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn architecture(&self) -> Architecture {
        self.architecture
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Key of the gzip-compressed module in the resource bundle.
    pub fn payload_key(&self) -> &str {
        &self.payload_key
    }

    /// File name of the extracted module, with the platform's library extension.
    pub fn library_file_name(&self) -> String {
        format!("{}.{}", self.module_name, std::env::consts::DLL_EXTENSION)
    }

    /// Key of an auxiliary data file in the resource bundle.
    pub fn auxiliary_key(file_name: &str) -> String {
        format!("{}.Resources.xml.{}", RESOURCE_NAMESPACE, file_name)
    }
}
