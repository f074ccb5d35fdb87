//! Fixed-length identifier types.
//!
//! Identifiers are raw byte arrays on the wire, without a length prefix.
//! Their serde form is a tuple of raw bytes, which is byte-identical.

use std::fmt;

use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeTuple;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{check_length, hex_decode, hex_encode, WireType};
use crate::codec::{ByteViewer, ByteWriter};
use crate::err::ScResult;

pub const SC_ADDRESS_LENGTH: usize = 33;
pub const SC_HNAME_LENGTH: usize = 4;
pub const SC_AGENT_ID_LENGTH: usize = SC_ADDRESS_LENGTH + SC_HNAME_LENGTH;
pub const SC_CHAIN_ID_LENGTH: usize = 32;
pub const SC_HASH_LENGTH: usize = 32;
pub const SC_NFT_ID_LENGTH: usize = 32;
pub const SC_REQUEST_ID_LENGTH: usize = 34;
pub const SC_TOKEN_ID_LENGTH: usize = 38;

/// Declare a fixed-length identifier type and its codecs
macro_rules! fixed_id_type {
    ($(#[$meta: meta])* $id_type: ident, $len: expr, $name: literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $id_type([u8; $len]);

        impl $id_type {
            pub const LENGTH: usize = $len;

            pub fn from_array(id: [u8; $len]) -> Self {
                Self(id)
            }

            pub fn as_bytes(&self) -> &[u8] {
                &self.0
            }
        }

        impl Default for $id_type {
            fn default() -> Self {
                Self([0; $len])
            }
        }

        impl fmt::Debug for $id_type {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($id_type), hex_encode(&self.0))
            }
        }

        impl fmt::Display for $id_type {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", hex_encode(&self.0))
            }
        }

        impl WireType for $id_type {
            const TYPE_NAME: &'static str = $name;

            fn encode(&self, enc: &mut ByteWriter) {
                enc.fixed_bytes(&self.0);
            }

            fn decode(dec: &mut ByteViewer) -> ScResult<Self> {
                Ok(Self(dec.fixed_array::<{ $len }>()?))
            }

            fn to_bytes(&self) -> Vec<u8> {
                self.0.to_vec()
            }

            fn from_bytes(buf: &[u8]) -> ScResult<Self> {
                if buf.is_empty() {
                    return Ok(Self::default());
                }
                check_length(Self::TYPE_NAME, $len, buf)?;

                let mut id = [0_u8; $len];
                id.copy_from_slice(buf);
                Ok(Self(id))
            }

            fn to_text(&self) -> String {
                hex_encode(&self.0)
            }

            fn from_text(s: &str) -> ScResult<Self> {
                Self::from_bytes(&hex_decode(s)?)
            }
        }

        impl Serialize for $id_type {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut tup = serializer.serialize_tuple($len)?;
                for b in self.0.iter() {
                    tup.serialize_element(b)?;
                }
                tup.end()
            }
        }

        impl<'de> Deserialize<'de> for $id_type {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                struct IdVisitor;

                impl<'de> Visitor<'de> for IdVisitor {
                    type Value = $id_type;

                    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                        write!(f, "{} raw bytes", $len)
                    }

                    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                        let mut id = [0_u8; $len];
                        for (i, b) in id.iter_mut().enumerate() {
                            *b = seq
                                .next_element()?
                                .ok_or_else(|| <A::Error as de::Error>::invalid_length(i, &self))?;
                        }
                        Ok($id_type(id))
                    }
                }

                deserializer.deserialize_tuple($len, IdVisitor)
            }
        }
    };
}

fixed_id_type! {
    /// Address on the ledger. The first byte is the address kind.
    ScAddress, SC_ADDRESS_LENGTH, "address"
}

fixed_id_type! {
    /// Agent on a chain: an address plus the hname of a contract
    ScAgentID, SC_AGENT_ID_LENGTH, "agent id"
}

fixed_id_type! {
    ScChainID, SC_CHAIN_ID_LENGTH, "chain id"
}

fixed_id_type! {
    ScHash, SC_HASH_LENGTH, "hash"
}

fixed_id_type! {
    /// Non-fungible token identifier
    ScNftID, SC_NFT_ID_LENGTH, "nft id"
}

fixed_id_type! {
    /// Transaction hash followed by a little-endian u16 output index
    ScRequestID, SC_REQUEST_ID_LENGTH, "request id"
}

fixed_id_type! {
    /// Native token identifier
    ScTokenID, SC_TOKEN_ID_LENGTH, "token id"
}

impl ScAgentID {
    pub fn new(address: &ScAddress, hname: ScHname) -> Self {
        let mut id = [0_u8; SC_AGENT_ID_LENGTH];
        id[..SC_ADDRESS_LENGTH].copy_from_slice(address.as_bytes());
        id[SC_ADDRESS_LENGTH..].copy_from_slice(&hname.0.to_le_bytes());
        Self(id)
    }

    pub fn address(&self) -> ScAddress {
        let mut address = [0_u8; SC_ADDRESS_LENGTH];
        address.copy_from_slice(&self.0[..SC_ADDRESS_LENGTH]);
        ScAddress(address)
    }

    pub fn hname(&self) -> ScHname {
        let mut hname = [0_u8; SC_HNAME_LENGTH];
        hname.copy_from_slice(&self.0[SC_ADDRESS_LENGTH..]);
        ScHname(u32::from_le_bytes(hname))
    }
}

impl ScRequestID {
    pub fn output_index(&self) -> u16 {
        u16::from_le_bytes([self.0[SC_HASH_LENGTH], self.0[SC_HASH_LENGTH + 1]])
    }
}

/// Hashed name of a contract or function.
///
/// A u32 stored as 4 little-endian bytes, both on the wire and under a key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScHname(pub u32);

impl fmt::Display for ScHname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_text())
    }
}

impl WireType for ScHname {
    const TYPE_NAME: &'static str = "hname";

    fn encode(&self, enc: &mut ByteWriter) {
        enc.fixed_bytes(&self.0.to_le_bytes());
    }

    fn decode(dec: &mut ByteViewer) -> ScResult<Self> {
        Ok(Self(u32::from_le_bytes(dec.fixed_array()?)))
    }

    fn to_bytes(&self) -> Vec<u8> {
        self.0.to_le_bytes().to_vec()
    }

    fn from_bytes(buf: &[u8]) -> ScResult<Self> {
        if buf.is_empty() {
            return Ok(Self::default());
        }
        check_length(Self::TYPE_NAME, SC_HNAME_LENGTH, buf)?;
        Ok(Self(u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]])))
    }

    fn to_text(&self) -> String {
        hex_encode(&self.to_bytes())
    }

    fn from_text(s: &str) -> ScResult<Self> {
        Self::from_bytes(&hex_decode(s)?)
    }
}

impl Serialize for ScHname {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.to_le_bytes().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ScHname {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes = <[u8; SC_HNAME_LENGTH]>::deserialize(deserializer)?;
        Ok(Self(u32::from_le_bytes(bytes)))
    }
}
