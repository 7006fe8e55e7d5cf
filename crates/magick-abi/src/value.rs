//! Values passed across the module boundary

use std::ffi::{c_char, CStr};
use std::fmt;

/// Argument to a module call: a `#[repr(C)]` tag plus 64 bits of payload.
///
/// Scalars live in the payload. Strings and pointers are borrowed, so the
/// caller keeps the pointee alive for the duration of the call.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct NativeValue {
    tag: u8,
    data: u64,
}

/// The kind of a [`NativeValue`], used to describe constructor parameters.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// No value
    Null = 0,
    /// Boolean
    Bool = 1,
    /// 32-bit signed integer
    I32 = 2,
    /// 64-bit signed integer
    I64 = 3,
    /// 64-bit float
    F64 = 4,
    /// Opaque pointer owned by the module
    Ptr = 5,
    /// NUL-terminated UTF-8 string
    Str = 6,
}

impl ValueKind {
    /// Decode a kind from its ABI tag.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(ValueKind::Null),
            1 => Some(ValueKind::Bool),
            2 => Some(ValueKind::I32),
            3 => Some(ValueKind::I64),
            4 => Some(ValueKind::F64),
            5 => Some(ValueKind::Ptr),
            6 => Some(ValueKind::Str),
            _ => None,
        }
    }

    /// The ABI tag of this kind.
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Short lowercase name, used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::I32 => "i32",
            ValueKind::I64 => "i64",
            ValueKind::F64 => "f64",
            ValueKind::Ptr => "ptr",
            ValueKind::Str => "str",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl NativeValue {
    /// The absent value.
    pub fn null() -> Self {
        Self::with_tag(ValueKind::Null, 0)
    }

    /// Boolean, stored as 0 or 1.
    pub fn bool(b: bool) -> Self {
        Self::with_tag(ValueKind::Bool, b as u64)
    }

    /// 32-bit signed integer, zero-extended into the payload.
    pub fn i32(i: i32) -> Self {
        Self::with_tag(ValueKind::I32, i as u32 as u64)
    }

    /// 64-bit signed integer.
    pub fn i64(i: i64) -> Self {
        Self::with_tag(ValueKind::I64, i as u64)
    }

    /// Double, stored by its bit pattern.
    pub fn f64(f: f64) -> Self {
        Self::with_tag(ValueKind::F64, f.to_bits())
    }

    /// Opaque pointer owned by the module.
    pub fn ptr(ptr: *mut ()) -> Self {
        Self::with_tag(ValueKind::Ptr, ptr as usize as u64)
    }

    /// Borrow a C string.
    ///
    /// The value only stores the pointer; `s` must outlive every call the
    /// value is passed to.
    pub fn str(s: &CStr) -> Self {
        Self::with_tag(ValueKind::Str, s.as_ptr() as usize as u64)
    }

    fn with_tag(kind: ValueKind, data: u64) -> Self {
        NativeValue {
            tag: kind.tag(),
            data,
        }
    }

    /// Kind of this value, `None` if the tag is not recognised.
    pub fn kind(&self) -> Option<ValueKind> {
        ValueKind::from_tag(self.tag)
    }

    /// Raw payload, if the value holds `kind`.
    fn payload(&self, kind: ValueKind) -> Option<u64> {
        (self.tag == kind.tag()).then_some(self.data)
    }

    /// Whether this is [`NativeValue::null`].
    pub fn is_null(&self) -> bool {
        self.tag == ValueKind::Null.tag()
    }

    /// The boolean, if this is one.
    pub fn as_bool(&self) -> Option<bool> {
        self.payload(ValueKind::Bool).map(|d| d != 0)
    }

    /// The `i32`, if this is one.
    pub fn as_i32(&self) -> Option<i32> {
        self.payload(ValueKind::I32).map(|d| d as u32 as i32)
    }

    /// The `i64`, if this is one.
    pub fn as_i64(&self) -> Option<i64> {
        self.payload(ValueKind::I64).map(|d| d as i64)
    }

    /// The `f64`, if this is one.
    pub fn as_f64(&self) -> Option<f64> {
        self.payload(ValueKind::F64).map(f64::from_bits)
    }

    /// The module-owned pointer, if this is one.
    pub fn as_ptr(&self) -> Option<*mut ()> {
        self.payload(ValueKind::Ptr).map(|d| d as usize as *mut ())
    }

    /// The borrowed C string, if this is a non-null string value.
    ///
    /// # Safety
    /// The string the value was created from must still be alive.
    pub unsafe fn as_c_str<'a>(&self) -> Option<&'a CStr> {
        match self.payload(ValueKind::Str)? {
            0 => None,
            addr => Some(CStr::from_ptr(addr as usize as *const c_char)),
        }
    }
}

impl Default for NativeValue {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Debug for NativeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            Some(ValueKind::Null) => f.write_str("null"),
            Some(ValueKind::Bool) => write!(f, "{}", self.data != 0),
            Some(ValueKind::I32) => write!(f, "{}i32", self.data as u32 as i32),
            Some(ValueKind::I64) => write!(f, "{}i64", self.data as i64),
            Some(ValueKind::F64) => write!(f, "{:?}f64", f64::from_bits(self.data)),
            Some(kind) => write!(f, "{}@{:#x}", kind, self.data),
            None => write!(f, "<tag {}: {:#x}>", self.tag, self.data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_accessors() {
        assert!(NativeValue::null().is_null());
        assert_eq!(NativeValue::bool(true).as_bool(), Some(true));
        assert_eq!(NativeValue::i32(-7).as_i32(), Some(-7));
        assert_eq!(NativeValue::i64(-1 << 40).as_i64(), Some(-1 << 40));
        assert_eq!(NativeValue::f64(2.5).as_f64(), Some(2.5));
    }

    #[test]
    fn test_accessor_rejects_other_kinds() {
        let value = NativeValue::i32(1);
        assert_eq!(value.as_i64(), None);
        assert_eq!(value.as_bool(), None);
        assert!(value.as_ptr().is_none());
    }

    #[test]
    fn test_str_borrows_c_string() {
        let text = c"/tmp/cache";
        let value = NativeValue::str(text);

        assert_eq!(value.kind(), Some(ValueKind::Str));
        let read = unsafe { value.as_c_str() }.unwrap();
        assert_eq!(read.to_str().unwrap(), "/tmp/cache");
    }

    #[test]
    fn test_kind_tags() {
        for tag in 0..=6u8 {
            let kind = ValueKind::from_tag(tag).unwrap();
            assert_eq!(kind.tag(), tag);
        }
        assert_eq!(ValueKind::from_tag(7), None);
        assert_eq!(ValueKind::Str.to_string(), "str");
    }
}
