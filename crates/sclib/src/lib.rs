//! Contract-side library.
//!
//! Re-exports the data model of [sclib_core] and adds the pieces that talk to
//! a host: request payloads, the [sandbox::ScSandbox] and a local
//! [solo::SoloHost].

pub mod requests;
pub mod sandbox;
pub mod solo;

pub use sclib_core::{
    assets, bigint, codec, dict, err, host, proxy, ser_de, types, values, ByteViewer,
    ByteWriter, Error, HostCall, KvStore, Proxy, ScAssets, ScBalances, ScBigInt, ScDict,
    ScImmutable, ScImmutableArray, ScImmutableDict, ScImmutableMap, ScMutable, ScMutableArray,
    ScMutableMap, ScResult, ScTransfer, WireType,
};

/// Default constants shared by contracts, hosts and tools.
pub mod defaults {

    /// Width of length prefixes and element counts
    pub const LENGTH_BITS: u32 = sclib_core::codec::LENGTH_BITS;
    /// Varint width used by the inspection tool when none is given
    pub const DEFAULT_VARINT_BITS: u32 = 64;
    /// Log filter of the binaries when `RUST_LOG` is not set
    pub const DEFAULT_LOG_FILTER: &str = "INFO";

    /// Timestamp the solo host reports, in nanoseconds since the unix epoch.
    ///
    /// 2024-01-01T00:00:00Z
    pub const SOLO_START_TIMESTAMP: u64 = 1_704_067_200_000_000_000;
    /// Hname of the contract run by the solo host
    pub const SOLO_CONTRACT_HNAME: u32 = 0xcafe_f00d;
}
