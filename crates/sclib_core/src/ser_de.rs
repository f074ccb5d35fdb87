//! Serialization and deserialization module
//!
//! A [serde] data format over [ByteWriter](crate::codec::ByteWriter) and
//! [ByteViewer](crate::codec::ByteViewer). The format is not self-describing:
//! the reader must know the shape it expects.
//!
//! - `bool`, `u8`, `i8`: one raw byte
//! - wider integers: signed or unsigned varints
//! - strings and byte buffers: length-prefixed
//! - options: `0` for none, `1` followed by the value
//! - sequences and maps: element count, then the elements
//! - tuples and structs: fields in order, without framing
//! - enums: variant index, then the payload
//!
//! Fixed-size arrays are tuples of `u8`, so they land on the wire as raw bytes.

use crate::err::ScResult;

pub mod de;
pub mod ser;

/// Serialize a data structure to a vector of bytes
pub fn serialize<T: serde::Serialize + ?Sized>(value: &T) -> ScResult<Vec<u8>> {
    let mut serializer = ser::ScSerializer::default();

    value.serialize(&mut serializer)?;

    Ok(serializer.into_bytes())
}

/// Deserialize a data structure from a slice of bytes.
///
/// Every byte of the slice must be consumed.
pub fn deserialize<'a, T>(bytes: &'a [u8]) -> ScResult<T>
where
    T: serde::Deserialize<'a>,
{
    let mut deserializer = de::ScDeserializer::from_slice(bytes);

    let value = T::deserialize(&mut deserializer)?;
    deserializer.end()?;

    Ok(value)
}
