//! Request payloads passed to the host.
//!
//! Fields are encoded in declaration order through [sclib_core::ser_de].
//! Nested dictionaries and transfers are carried as their serialized bytes.

use serde::{Deserialize, Serialize};
use sclib_core::err::ScResult;
use sclib_core::ser_de;
use sclib_core::types::{ScAddress, ScChainID, ScHash, ScHname};

/// Synchronous call of a function on the same chain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRequest {
    pub contract: ScHname,
    pub function: ScHname,
    #[serde(with = "serde_bytes")]
    pub params: Vec<u8>,
    #[serde(with = "serde_bytes")]
    pub allowance: Vec<u8>,
}

/// Asynchronous request to a contract, possibly on another chain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRequest {
    pub chain_id: ScChainID,
    pub contract: ScHname,
    pub function: ScHname,
    #[serde(with = "serde_bytes")]
    pub params: Vec<u8>,
    #[serde(with = "serde_bytes")]
    pub allowance: Vec<u8>,
    #[serde(with = "serde_bytes")]
    pub transfer: Vec<u8>,
    /// Seconds to wait before the request is processed
    pub delay: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployRequest {
    pub prog_hash: ScHash,
    pub name: String,
    pub description: String,
    #[serde(with = "serde_bytes")]
    pub params: Vec<u8>,
}

/// Transfer of assets to an address on the ledger
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendRequest {
    pub address: ScAddress,
    #[serde(with = "serde_bytes")]
    pub transfer: Vec<u8>,
}

/// Byte conversions for request types
macro_rules! impl_request_bytes {
    ($($req: ty),+) => {
        $(
            impl $req {
                pub fn to_bytes(&self) -> ScResult<Vec<u8>> {
                    ser_de::serialize(self)
                }

                pub fn from_bytes(buf: &[u8]) -> ScResult<Self> {
                    ser_de::deserialize(buf)
                }
            }
        )+
    };
}

impl_request_bytes! {CallRequest, PostRequest, DeployRequest, SendRequest}
