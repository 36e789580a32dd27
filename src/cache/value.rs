//! Dynamic Value Module
//!
//! A closed sum type for values stored in an untyped cache, together with the
//! narrowing rules used by the typed accessors. Conversions only widen within
//! a family; a float never satisfies an integer request and vice versa.

use std::borrow::Cow;

use crate::error::{CacheError, Result};

// == Value ==
/// A dynamically typed cache value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Isize(isize),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Usize(usize),
    F32(f32),
    F64(f64),
    String(String),
    Bytes(Vec<u8>),
    Char(char),
}

impl Value {
    /// Name of the stored type, used in `TypeMismatch` errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::I8(_) => "i8",
            Value::I16(_) => "i16",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::Isize(_) => "isize",
            Value::U8(_) => "u8",
            Value::U16(_) => "u16",
            Value::U32(_) => "u32",
            Value::U64(_) => "u64",
            Value::Usize(_) => "usize",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Char(_) => "char",
        }
    }

    fn mismatch<T>(&self, expected: &'static str) -> Result<T> {
        Err(CacheError::TypeMismatch {
            expected,
            found: self.type_name(),
        })
    }

    pub fn as_bool(&self) -> Result<bool> {
        match *self {
            Value::Bool(v) => Ok(v),
            _ => self.mismatch("bool"),
        }
    }

    /// Accepts any signed integer width.
    pub fn as_i64(&self) -> Result<i64> {
        match *self {
            Value::I8(v) => Ok(v.into()),
            Value::I16(v) => Ok(v.into()),
            Value::I32(v) => Ok(v.into()),
            Value::I64(v) => Ok(v),
            // isize is at most 64 bits on every supported target
            Value::Isize(v) => Ok(v as i64),
            _ => self.mismatch("i64"),
        }
    }

    /// Accepts any unsigned integer width.
    pub fn as_u64(&self) -> Result<u64> {
        match *self {
            Value::U8(v) => Ok(v.into()),
            Value::U16(v) => Ok(v.into()),
            Value::U32(v) => Ok(v.into()),
            Value::U64(v) => Ok(v),
            Value::Usize(v) => Ok(v as u64),
            _ => self.mismatch("u64"),
        }
    }

    pub fn as_f64(&self) -> Result<f64> {
        match *self {
            Value::F32(v) => Ok(v.into()),
            Value::F64(v) => Ok(v),
            _ => self.mismatch("f64"),
        }
    }

    /// Accepts a string, or a byte sequence decoded as UTF-8.
    ///
    /// Invalid UTF-8 sequences are replaced with U+FFFD.
    pub fn as_str(&self) -> Result<Cow<'_, str>> {
        match self {
            Value::String(v) => Ok(Cow::Borrowed(v.as_str())),
            Value::Bytes(v) => Ok(String::from_utf8_lossy(v)),
            _ => self.mismatch("string"),
        }
    }

    /// Accepts a `u8`, or an `i8` reinterpreted bit-for-bit.
    pub fn as_byte(&self) -> Result<u8> {
        match *self {
            Value::U8(v) => Ok(v),
            Value::I8(v) => Ok(v as u8),
            _ => self.mismatch("byte"),
        }
    }

    pub fn as_char(&self) -> Result<char> {
        match *self {
            Value::Char(v) => Ok(v),
            _ => self.mismatch("char"),
        }
    }
}

// == Conversions ==
macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => Usize,
    f32 => F32,
    f64 => F64,
    String => String,
    Vec<u8> => Bytes,
    char => Char,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_widening() {
        assert_eq!(Value::from(-8i8).as_i64(), Ok(-8));
        assert_eq!(Value::from(-16i16).as_i64(), Ok(-16));
        assert_eq!(Value::from(i32::MIN).as_i64(), Ok(i32::MIN as i64));
        assert_eq!(Value::from(i64::MAX).as_i64(), Ok(i64::MAX));
        assert_eq!(Value::from(-1isize).as_i64(), Ok(-1));
    }

    #[test]
    fn test_unsigned_widening() {
        assert_eq!(Value::from(8u8).as_u64(), Ok(8));
        assert_eq!(Value::from(u16::MAX).as_u64(), Ok(u16::MAX as u64));
        assert_eq!(Value::from(32u32).as_u64(), Ok(32));
        assert_eq!(Value::from(u64::MAX).as_u64(), Ok(u64::MAX));
        assert_eq!(Value::from(1usize).as_u64(), Ok(1));
    }

    #[test]
    fn test_integer_families_do_not_mix() {
        assert!(matches!(
            Value::from(1u32).as_i64(),
            Err(CacheError::TypeMismatch { expected: "i64", found: "u32" })
        ));
        assert!(matches!(
            Value::from(1i32).as_u64(),
            Err(CacheError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_float_widening() {
        assert_eq!(Value::from(0.5f32).as_f64(), Ok(0.5));
        assert_eq!(Value::from(0.1234f64).as_f64(), Ok(0.1234));
        assert!(Value::from(1i64).as_f64().is_err());
        assert!(Value::from(1.0f64).as_i64().is_err());
    }

    #[test]
    fn test_string_and_bytes() {
        assert_eq!(Value::from("abcd").as_str().unwrap(), "abcd");
        assert_eq!(Value::from(b"abc".as_slice()).as_str().unwrap(), "abc");
        assert_eq!(Value::Bytes(vec![0xff]).as_str().unwrap(), "\u{fffd}");
        assert!(Value::from('a').as_str().is_err());
    }

    #[test]
    fn test_byte_accepts_i8_bit_pattern() {
        assert_eq!(Value::from(b'b').as_byte(), Ok(b'b'));
        assert_eq!(Value::from(-1i8).as_byte(), Ok(0xff));
        assert!(Value::from(1u16).as_byte().is_err());
    }

    #[test]
    fn test_exact_types() {
        assert_eq!(Value::from(true).as_bool(), Ok(true));
        assert_eq!(Value::from('漓').as_char(), Ok('漓'));
        assert!(Value::from(1u8).as_bool().is_err());
        assert!(Value::from(97u32).as_char().is_err());
        assert!(matches!(
            Value::from(false).as_i64(),
            Err(CacheError::TypeMismatch { expected: "i64", found: "bool" })
        ));
    }
}
