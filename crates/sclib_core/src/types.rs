//! Typed value codecs.
//!
//! Every value that can live under a storage key implements [WireType].
//! Each type has two byte forms:
//! - `encode`/`decode` is used inside nested messages (varints, length prefixes)
//! - `to_bytes`/`from_bytes` is the stand-alone form stored under a key
//!
//! `from_bytes` of an empty slice is the zero value of the type.
//! Absence of a key is checked separately through `exists`.

use crate::codec::{ByteViewer, ByteWriter};
use crate::err::{Error, ScResult};

mod ids;

pub use ids::*;

/// Encoding, decoding and text conversion of a single value type.
pub trait WireType: Sized {
    /// Name used in error messages
    const TYPE_NAME: &'static str;

    /// Encode into a nested message
    fn encode(&self, enc: &mut ByteWriter);

    /// Decode from a nested message
    fn decode(dec: &mut ByteViewer) -> ScResult<Self>;

    /// Stand-alone byte form
    fn to_bytes(&self) -> Vec<u8>;

    /// Parse the stand-alone byte form. An empty slice yields the zero value.
    fn from_bytes(buf: &[u8]) -> ScResult<Self>;

    /// Human readable form
    fn to_text(&self) -> String;

    fn from_text(s: &str) -> ScResult<Self>;
}

/// Check the length of a stand-alone fixed-size value.
pub(crate) fn check_length(type_name: &'static str, expected: usize, buf: &[u8]) -> ScResult<()> {
    match buf.len() == expected {
        true => Ok(()),
        false => Err(Error::InvalidLength {
            type_name,
            expected,
            actual: buf.len(),
        }),
    }
}

/// `0x` prefixed lowercase hex, the text form of all identifier and byte types.
pub fn hex_encode(buf: &[u8]) -> String {
    format!("0x{}", hex::encode(buf))
}

pub fn hex_decode(s: &str) -> ScResult<Vec<u8>> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .ok_or_else(|| Error::InvalidValue(format!("hex string missing 0x prefix: {:?}", s)))?;

    hex::decode(digits).map_err(|e| Error::InvalidValue(format!("hex string {:?}: {}", s, e)))
}

fn parse_decimal<T: std::str::FromStr>(type_name: &'static str, s: &str) -> ScResult<T>
where
    T::Err: std::fmt::Display,
{
    s.parse::<T>()
        .map_err(|e| Error::InvalidValue(format!("{} {:?}: {}", type_name, s, e)))
}

impl WireType for bool {
    const TYPE_NAME: &'static str = "bool";

    fn encode(&self, enc: &mut ByteWriter) {
        enc.byte(*self as u8);
    }

    fn decode(dec: &mut ByteViewer) -> ScResult<Self> {
        match dec.byte()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(Error::InvalidValue(format!("bool byte {}", other))),
        }
    }

    fn to_bytes(&self) -> Vec<u8> {
        vec![*self as u8]
    }

    fn from_bytes(buf: &[u8]) -> ScResult<Self> {
        if buf.is_empty() {
            return Ok(false);
        }
        check_length(Self::TYPE_NAME, 1, buf)?;

        let mut dec = ByteViewer::from_slice(buf);
        Self::decode(&mut dec)
    }

    fn to_text(&self) -> String {
        match self {
            true => "1".to_string(),
            false => "0".to_string(),
        }
    }

    fn from_text(s: &str) -> ScResult<Self> {
        match s {
            "0" => Ok(false),
            "1" => Ok(true),
            _ => Err(Error::InvalidValue(format!("bool {:?}", s))),
        }
    }
}

/// Impl [WireType] for 8-bit integers, which encode as a single raw byte
macro_rules! wire_type_byte {
    ($num_type: ty, $name: literal) => {
        impl WireType for $num_type {
            const TYPE_NAME: &'static str = $name;

            fn encode(&self, enc: &mut ByteWriter) {
                enc.byte(*self as u8);
            }

            fn decode(dec: &mut ByteViewer) -> ScResult<Self> {
                Ok(dec.byte()? as $num_type)
            }

            fn to_bytes(&self) -> Vec<u8> {
                self.to_le_bytes().to_vec()
            }

            fn from_bytes(buf: &[u8]) -> ScResult<Self> {
                if buf.is_empty() {
                    return Ok(0);
                }
                check_length(Self::TYPE_NAME, 1, buf)?;
                Ok(buf[0] as $num_type)
            }

            fn to_text(&self) -> String {
                self.to_string()
            }

            fn from_text(s: &str) -> ScResult<Self> {
                parse_decimal(Self::TYPE_NAME, s)
            }
        }
    };
}

/// Impl [WireType] for wider integers.
///
/// `$decode` is the varint decoder of the [ByteViewer],
/// `$wide` the 64-bit type it decodes into.
macro_rules! wire_type_varint {
    ($num_type: ty, $name: literal, $encode: ident, $decode: ident, $wide: ty) => {
        impl WireType for $num_type {
            const TYPE_NAME: &'static str = $name;

            fn encode(&self, enc: &mut ByteWriter) {
                enc.$encode(*self as $wide);
            }

            fn decode(dec: &mut ByteViewer) -> ScResult<Self> {
                const BITS: u32 = <$num_type>::BITS;
                let value = dec.$decode(BITS)?;
                <$num_type>::try_from(value).map_err(|_| Error::Overflow { bits: BITS })
            }

            fn to_bytes(&self) -> Vec<u8> {
                self.to_le_bytes().to_vec()
            }

            fn from_bytes(buf: &[u8]) -> ScResult<Self> {
                const SIZE: usize = std::mem::size_of::<$num_type>();
                if buf.is_empty() {
                    return Ok(0);
                }
                check_length(Self::TYPE_NAME, SIZE, buf)?;

                let mut arr = [0_u8; SIZE];
                arr.copy_from_slice(buf);
                Ok(<$num_type>::from_le_bytes(arr))
            }

            fn to_text(&self) -> String {
                self.to_string()
            }

            fn from_text(s: &str) -> ScResult<Self> {
                parse_decimal(Self::TYPE_NAME, s)
            }
        }
    };
}

wire_type_byte! {i8, "int8"}
wire_type_byte! {u8, "uint8"}

wire_type_varint! {i16, "int16", vli_encode, vli_decode, i64}
wire_type_varint! {i32, "int32", vli_encode, vli_decode, i64}
wire_type_varint! {i64, "int64", vli_encode, vli_decode, i64}

wire_type_varint! {u16, "uint16", vlu_encode, vlu_decode, u64}
wire_type_varint! {u32, "uint32", vlu_encode, vlu_decode, u64}
wire_type_varint! {u64, "uint64", vlu_encode, vlu_decode, u64}

/// Variable-length byte string
impl WireType for Vec<u8> {
    const TYPE_NAME: &'static str = "bytes";

    fn encode(&self, enc: &mut ByteWriter) {
        enc.bytes(self);
    }

    fn decode(dec: &mut ByteViewer) -> ScResult<Self> {
        Ok(dec.bytes()?.to_vec())
    }

    fn to_bytes(&self) -> Vec<u8> {
        self.clone()
    }

    fn from_bytes(buf: &[u8]) -> ScResult<Self> {
        Ok(buf.to_vec())
    }

    fn to_text(&self) -> String {
        hex_encode(self)
    }

    fn from_text(s: &str) -> ScResult<Self> {
        hex_decode(s)
    }
}

impl WireType for String {
    const TYPE_NAME: &'static str = "string";

    fn encode(&self, enc: &mut ByteWriter) {
        enc.bytes(self.as_bytes());
    }

    fn decode(dec: &mut ByteViewer) -> ScResult<Self> {
        Self::from_bytes(dec.bytes()?)
    }

    fn to_bytes(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    fn from_bytes(buf: &[u8]) -> ScResult<Self> {
        String::from_utf8(buf.to_vec())
            .map_err(|e| Error::InvalidValue(format!("string is not utf-8: {}", e)))
    }

    fn to_text(&self) -> String {
        self.clone()
    }

    fn from_text(s: &str) -> ScResult<Self> {
        Ok(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::fmt::Debug;

    use super::*;

    /// Checks every conversion pair of a value
    fn wire_loop<T: WireType + PartialEq + Debug>(value: T) {
        let bytes = value.to_bytes();
        assert_eq!(T::from_bytes(&bytes).unwrap(), value);

        let text = value.to_text();
        assert_eq!(T::from_text(&text).unwrap(), value, "text: {}", text);

        let mut enc = ByteWriter::new();
        value.encode(&mut enc);
        let mut dec = ByteViewer::from_slice(enc.buf());
        assert_eq!(T::decode(&mut dec).unwrap(), value);
        dec.close().unwrap();
    }

    #[test]
    fn test_primitive_round_trips() {
        wire_loop(true);
        wire_loop(false);

        for v in [i8::MIN, -1, 0, 1, i8::MAX] {
            wire_loop(v);
        }
        for v in [i16::MIN, -1, 0, 1, i16::MAX] {
            wire_loop(v);
        }
        for v in [i32::MIN, -1, 0, 1, i32::MAX] {
            wire_loop(v);
        }
        for v in [i64::MIN, -1, 0, 1, i64::MAX] {
            wire_loop(v);
        }
        for v in [0, 1, u8::MAX] {
            wire_loop(v);
        }
        for v in [0, 1, u16::MAX] {
            wire_loop(v);
        }
        for v in [0, 1, u32::MAX] {
            wire_loop(v);
        }
        for v in [0, 1, u64::MAX] {
            wire_loop(v);
        }

        wire_loop(vec![0_u8, 1, 2, 0xff]);
        wire_loop(Vec::<u8>::new());
        wire_loop("hello, wörld".to_string());
        wire_loop(String::new());
    }

    #[test]
    fn test_empty_bytes_are_zero_values() {
        assert!(!bool::from_bytes(&[]).unwrap());
        assert_eq!(i8::from_bytes(&[]).unwrap(), 0);
        assert_eq!(i64::from_bytes(&[]).unwrap(), 0);
        assert_eq!(u32::from_bytes(&[]).unwrap(), 0);
        assert_eq!(String::from_bytes(&[]).unwrap(), "");
        assert!(Vec::<u8>::from_bytes(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_fixed_layouts() {
        assert_eq!(0x0102_0304_u32.to_bytes(), vec![4, 3, 2, 1]);
        assert_eq!((-2_i16).to_bytes(), vec![0xfe, 0xff]);
        assert_eq!(true.to_text(), "1");
        assert_eq!((-42_i32).to_text(), "-42");
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(
            u64::from_bytes(&[1, 2, 3]),
            Err(Error::InvalidLength {
                type_name: "uint64",
                expected: 8,
                actual: 3
            })
        );
        assert!(matches!(
            bool::from_bytes(&[2]),
            Err(Error::InvalidValue(_))
        ));
        assert!(matches!(
            bool::from_bytes(&[0, 0]),
            Err(Error::InvalidLength { .. })
        ));
        assert!(bool::from_text("true").is_err());
        assert!(u8::from_text("256").is_err());
        assert!(i32::from_text("").is_err());
        assert!(String::from_bytes(&[0xc3]).is_err());
        assert!(Vec::<u8>::from_text("abcd").is_err());

        // a decoded varint outside the type's range is not truncated
        let mut enc = ByteWriter::new();
        enc.vli_encode(40_000);
        let mut dec = ByteViewer::from_slice(enc.buf());
        assert!(matches!(
            i16::decode(&mut dec),
            Err(Error::Overflow { bits: 16 })
        ));
    }
}
