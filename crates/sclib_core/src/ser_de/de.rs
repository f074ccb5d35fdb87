//! Implementation of [serde::de::Deserializer] for [ScDeserializer]

use serde::de::{self, DeserializeSeed, EnumAccess, IntoDeserializer, SeqAccess, VariantAccess};

use crate::codec::{ByteViewer, LENGTH_BITS};
use crate::err::{Error, ScResult};

/// This data structure reads the serialized bytes of any arbitrary data structure.
///
/// Structs/enums to be deserialized need to derive [serde::Deserialize].
pub struct ScDeserializer<'de> {
    input: ByteViewer<'de>,
}

impl<'de> ScDeserializer<'de> {
    pub fn from_slice(s: &'de [u8]) -> Self {
        Self {
            input: ByteViewer::from_slice(s),
        }
    }

    /// Finalize deserialization, failing if any input is left.
    pub fn end(self) -> ScResult<()> {
        self.input.close()
    }

    fn count(&mut self) -> ScResult<usize> {
        Ok(self.input.vlu_decode(LENGTH_BITS)? as usize)
    }
}

/// Impl deserialize signed primitives
macro_rules! deserialize_signed {
    ($fn_name: ident: $data_type: ty => $visitor_fn: ident) => {
        fn $fn_name<V>(self, visitor: V) -> Result<V::Value, Self::Error>
        where
            V: de::Visitor<'de>,
        {
            const BITS: u32 = <$data_type>::BITS;
            let value = self.input.vli_decode(BITS)?;
            let value = <$data_type>::try_from(value).map_err(|_| Error::Overflow { bits: BITS })?;
            visitor.$visitor_fn(value)
        }
    };
}

/// Impl deserialize unsigned primitives
macro_rules! deserialize_unsigned {
    ($fn_name: ident: $data_type: ty => $visitor_fn: ident) => {
        fn $fn_name<V>(self, visitor: V) -> Result<V::Value, Self::Error>
        where
            V: de::Visitor<'de>,
        {
            const BITS: u32 = <$data_type>::BITS;
            let value = self.input.vlu_decode(BITS)?;
            let value = <$data_type>::try_from(value).map_err(|_| Error::Overflow { bits: BITS })?;
            visitor.$visitor_fn(value)
        }
    };
}

impl<'de, 'a> de::Deserializer<'de> for &'a mut ScDeserializer<'de> {
    type Error = Error;

    // the format is not self-describing
    fn deserialize_any<V>(self, _visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        Err(Error::Unsupported("deserialize_any"))
    }

    fn deserialize_bool<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        match self.input.byte()? {
            0 => visitor.visit_bool(false),
            1 => visitor.visit_bool(true),
            other => Err(Error::InvalidValue(format!("bool byte {}", other))),
        }
    }

    fn deserialize_i8<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_i8(self.input.byte()? as i8)
    }

    deserialize_signed! {deserialize_i16: i16 => visit_i16}
    deserialize_signed! {deserialize_i32: i32 => visit_i32}
    deserialize_signed! {deserialize_i64: i64 => visit_i64}

    fn deserialize_u8<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_u8(self.input.byte()?)
    }

    deserialize_unsigned! {deserialize_u16: u16 => visit_u16}
    deserialize_unsigned! {deserialize_u32: u32 => visit_u32}
    deserialize_unsigned! {deserialize_u64: u64 => visit_u64}

    fn deserialize_f32<V>(self, _: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        Err(Error::Unsupported("f32"))
    }

    fn deserialize_f64<V>(self, _: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        Err(Error::Unsupported("f64"))
    }

    fn deserialize_char<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        let code = self.input.vlu_decode(u32::BITS)?;
        let c = u32::try_from(code)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| Error::InvalidValue(format!("char code point {}", code)))?;

        visitor.visit_char(c)
    }

    fn deserialize_str<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        let str_bytes = self.input.bytes()?;
        let s = std::str::from_utf8(str_bytes)
            .map_err(|e| Error::InvalidValue(format!("string is not utf-8: {}", e)))?;

        visitor.visit_borrowed_str(s)
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_borrowed_bytes(self.input.bytes()?)
    }

    fn deserialize_byte_buf<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_byte_buf(self.input.bytes()?.to_vec())
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        match self.input.byte()? {
            0 => visitor.visit_none(),
            1 => visitor.visit_some(self),
            other => Err(Error::InvalidValue(format!("option marker {}", other))),
        }
    }

    fn deserialize_unit<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        let len = self.count()?;
        visitor.visit_seq(CollectionsAccessor::from_deserializer(self, len))
    }

    fn deserialize_tuple<V>(self, len: usize, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_seq(CollectionsAccessor::from_deserializer(self, len))
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_tuple(len, visitor)
    }

    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        let len = self.count()?;
        visitor.visit_map(CollectionsAccessor::from_deserializer(self, len))
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        // structs are tuples of their fields
        self.deserialize_tuple(fields.len(), visitor)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_enum(self)
    }

    fn deserialize_identifier<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_u32(visitor)
    }

    fn deserialize_ignored_any<V>(self, _visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        Err(Error::Unsupported("deserialize_ignored_any"))
    }

    fn is_human_readable(&self) -> bool {
        false
    }
}

/// This wrapper hands out a known number of elements of a collection.
struct CollectionsAccessor<'a, 'de: 'a> {
    des: &'a mut ScDeserializer<'de>,
    remaining: usize,
}

impl<'a, 'de> CollectionsAccessor<'a, 'de> {
    fn from_deserializer(des: &'a mut ScDeserializer<'de>, remaining: usize) -> Self {
        Self { des, remaining }
    }
}

impl<'a, 'de> SeqAccess<'de> for CollectionsAccessor<'a, 'de> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>, Self::Error>
    where
        T: DeserializeSeed<'de>,
    {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;

        seed.deserialize(&mut *self.des).map(Some)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.remaining)
    }
}

impl<'a, 'de> de::MapAccess<'de> for CollectionsAccessor<'a, 'de> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>, Self::Error>
    where
        K: DeserializeSeed<'de>,
    {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;

        seed.deserialize(&mut *self.des).map(Some)
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value, Self::Error>
    where
        V: DeserializeSeed<'de>,
    {
        seed.deserialize(&mut *self.des)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.remaining)
    }
}

impl<'a, 'de> EnumAccess<'de> for &'a mut ScDeserializer<'de> {
    type Error = Error;

    type Variant = Self;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant), Self::Error>
    where
        V: DeserializeSeed<'de>,
    {
        let index = self.input.vlu_decode(u32::BITS)? as u32;
        let index: de::value::U32Deserializer<Error> = index.into_deserializer();
        let val = seed.deserialize(index)?;

        Ok((val, self))
    }
}

impl<'a, 'de> VariantAccess<'de> for &'a mut ScDeserializer<'de> {
    type Error = Error;

    fn unit_variant(self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value, Self::Error>
    where
        T: DeserializeSeed<'de>,
    {
        seed.deserialize(self)
    }

    fn tuple_variant<V>(self, len: usize, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        de::Deserializer::deserialize_tuple(self, len, visitor)
    }

    fn struct_variant<V>(
        self,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        de::Deserializer::deserialize_tuple(self, fields.len(), visitor)
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[test]
    fn test_borrowed_str() {
        #[derive(Deserialize)]
        struct Borrowing<'a> {
            name: &'a str,
            #[serde(borrow, with = "serde_bytes")]
            raw: &'a [u8],
        }

        let bytes = [3, b'a', b'b', b'c', 2, 0xca, 0xfe];
        let mut des = ScDeserializer::from_slice(&bytes);
        let b = Borrowing::deserialize(&mut des).unwrap();
        des.end().unwrap();

        assert_eq!(b.name, "abc");
        assert_eq!(b.raw, &[0xca, 0xfe]);
    }

    #[test]
    fn test_invalid_utf8() {
        let bytes = [2, 0xff, 0xfe];
        let mut des = ScDeserializer::from_slice(&bytes);

        assert!(matches!(
            String::deserialize(&mut des),
            Err(Error::InvalidValue(_))
        ));
    }

    #[test]
    fn test_unknown_variant() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        enum Two {
            A,
            B,
        }

        let mut des = ScDeserializer::from_slice(&[5]);
        assert!(matches!(
            Two::deserialize(&mut des),
            Err(Error::Custom(_))
        ));
    }
}
