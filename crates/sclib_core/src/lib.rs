//! Core data model of the contract library.
//!
//! Everything here is deterministic and free of I/O: the varint codec,
//! typed value codecs, big integers, canonical dictionaries, path proxies
//! over an injected key/value store, and asset bundles.

pub mod assets;
pub mod bigint;
pub mod codec;
pub mod dict;
pub mod err;
pub mod host;
pub mod proxy;
pub mod ser_de;
pub mod types;
pub mod values;

pub use assets::{ScAssets, ScBalances, ScTransfer};
pub use bigint::ScBigInt;
pub use codec::{ByteViewer, ByteWriter};
pub use dict::{ScDict, ScImmutableDict};
pub use err::{Error, ScResult};
pub use host::{HostCall, KvStore};
pub use proxy::Proxy;
pub use types::WireType;
pub use values::{
    ScImmutable, ScImmutableArray, ScImmutableMap, ScMutable, ScMutableArray, ScMutableMap,
};
