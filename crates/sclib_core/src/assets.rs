//! Asset bundles: base tokens, native token balances and NFTs.
//!
//! Wire form:
//! - base token amount, `vlu` u64
//! - `vlu` count, then (token id, big int) pairs in canonical key order
//! - `vlu` count, then NFT ids
//!
//! An empty buffer decodes to an empty bundle.

use std::collections::{BTreeSet, HashMap};

use crate::bigint::ScBigInt;
use crate::codec::{ByteViewer, ByteWriter, LENGTH_BITS};
use crate::dict::canonical_key;
use crate::err::{Error, ScResult};
use crate::types::{ScNftID, ScTokenID, WireType};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScAssets {
    base_tokens: u64,
    tokens: HashMap<ScTokenID, ScBigInt>,
    nfts: BTreeSet<ScNftID>,
}

impl ScAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(buf: &[u8]) -> ScResult<Self> {
        let mut assets = Self::new();
        if buf.is_empty() {
            return Ok(assets);
        }

        let mut dec = ByteViewer::from_slice(buf);
        assets.base_tokens = u64::decode(&mut dec)?;

        let token_count = dec.vlu_decode(LENGTH_BITS)?;
        for _ in 0..token_count {
            let token_id = ScTokenID::decode(&mut dec)?;
            let amount = ScBigInt::decode(&mut dec)?;
            if assets.tokens.insert(token_id, amount).is_some() {
                return Err(Error::InvalidValue(format!("duplicate token id {}", token_id)));
            }
        }

        let nft_count = dec.vlu_decode(LENGTH_BITS)?;
        for _ in 0..nft_count {
            let nft_id = ScNftID::decode(&mut dec)?;
            if !assets.nfts.insert(nft_id) {
                return Err(Error::InvalidValue(format!("duplicate nft id {}", nft_id)));
            }
        }
        dec.close()?;

        log::debug!(
            "decoded assets: {} base tokens, {} tokens, {} nfts",
            assets.base_tokens,
            token_count,
            nft_count
        );
        Ok(assets)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut enc = ByteWriter::new();
        self.base_tokens.encode(&mut enc);

        let token_ids = self.token_ids();
        enc.vlu_encode(token_ids.len() as u64);
        for token_id in token_ids {
            token_id.encode(&mut enc);
            self.balance(&token_id).encode(&mut enc);
        }

        enc.vlu_encode(self.nfts.len() as u64);
        for nft_id in self.nfts.iter() {
            nft_id.encode(&mut enc);
        }

        enc.into_bytes()
    }

    /// No base tokens, only zero balances and no NFTs
    pub fn is_empty(&self) -> bool {
        self.base_tokens == 0
            && self.tokens.values().all(ScBigInt::is_zero)
            && self.nfts.is_empty()
    }

    pub fn base_tokens(&self) -> u64 {
        self.base_tokens
    }

    /// Balance of a token, zero when not held
    pub fn balance(&self, token_id: &ScTokenID) -> ScBigInt {
        self.tokens.get(token_id).cloned().unwrap_or_default()
    }

    /// Token ids in canonical key order
    pub fn token_ids(&self) -> Vec<ScTokenID> {
        let mut ids: Vec<(String, ScTokenID)> = self
            .tokens
            .keys()
            .map(|id| (canonical_key(id.as_bytes()), *id))
            .collect();
        ids.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        ids.into_iter().map(|(_, id)| id).collect()
    }

    pub fn nft_ids(&self) -> impl Iterator<Item = &ScNftID> {
        self.nfts.iter()
    }

    pub fn balances(&self) -> ScBalances {
        ScBalances {
            assets: self.clone(),
        }
    }
}

/// Read-only view on an asset bundle, as returned by the host
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScBalances {
    assets: ScAssets,
}

impl ScBalances {
    pub fn from_bytes(buf: &[u8]) -> ScResult<Self> {
        Ok(ScAssets::from_bytes(buf)?.balances())
    }

    pub fn balance(&self, token_id: &ScTokenID) -> ScBigInt {
        self.assets.balance(token_id)
    }

    pub fn base_tokens(&self) -> u64 {
        self.assets.base_tokens
    }

    pub fn token_ids(&self) -> Vec<ScTokenID> {
        self.assets.token_ids()
    }

    pub fn nft_ids(&self) -> impl Iterator<Item = &ScNftID> {
        self.assets.nft_ids()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.assets.to_bytes()
    }
}

/// Assets to move in a call, post or send
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScTransfer {
    assets: ScAssets,
}

impl ScTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transfer of base tokens only
    pub fn base_tokens(amount: u64) -> Self {
        let mut transfer = Self::new();
        transfer.set_base_tokens(amount);
        transfer
    }

    /// Transfer of a single NFT
    pub fn nft(nft_id: &ScNftID) -> Self {
        let mut transfer = Self::new();
        transfer.add_nft(nft_id);
        transfer
    }

    /// Transfer of a single native token amount
    pub fn tokens(token_id: &ScTokenID, amount: &ScBigInt) -> Self {
        let mut transfer = Self::new();
        transfer.set(token_id, amount);
        transfer
    }

    /// Copy every non-zero entry of `balances`
    pub fn from_balances(balances: &ScBalances) -> Self {
        let mut transfer = Self::base_tokens(balances.base_tokens());
        for token_id in balances.token_ids() {
            let amount = balances.balance(&token_id);
            if !amount.is_zero() {
                transfer.set(&token_id, &amount);
            }
        }
        for nft_id in balances.nft_ids() {
            transfer.add_nft(nft_id);
        }
        transfer
    }

    pub fn set_base_tokens(&mut self, amount: u64) {
        self.assets.base_tokens = amount;
    }

    pub fn set(&mut self, token_id: &ScTokenID, amount: &ScBigInt) {
        self.assets.tokens.insert(*token_id, amount.clone());
    }

    pub fn add_nft(&mut self, nft_id: &ScNftID) {
        self.assets.nfts.insert(*nft_id);
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn balances(&self) -> ScBalances {
        self.assets.balances()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.assets.to_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(first: u8) -> ScTokenID {
        let mut id = [0_u8; ScTokenID::LENGTH];
        id[0] = first;
        id[ScTokenID::LENGTH - 1] = 0xaa;
        ScTokenID::from_array(id)
    }

    fn nft(first: u8) -> ScNftID {
        ScNftID::from_array([first; ScNftID::LENGTH])
    }

    #[test]
    fn test_empty_assets() {
        let empty = ScAssets::new();
        assert!(empty.is_empty());
        assert_eq!(empty.to_bytes(), vec![0, 0, 0]);
        assert_eq!(ScAssets::from_bytes(&[]).unwrap(), empty);
        assert_eq!(ScAssets::from_bytes(&[0, 0, 0]).unwrap(), empty);

        // zero balances do not count
        let mut transfer = ScTransfer::new();
        transfer.set(&token(1), &ScBigInt::new());
        assert!(transfer.is_empty());

        assert!(!ScTransfer::base_tokens(1).is_empty());
        assert!(!ScTransfer::nft(&nft(1)).is_empty());
        assert!(!ScTransfer::tokens(&token(1), &ScBigInt::from_u64(1)).is_empty());
    }

    #[test]
    fn test_assets_round_trip() {
        let mut transfer = ScTransfer::base_tokens(300);
        transfer.set(&token(9), &ScBigInt::from_u64(5));
        transfer.set(&token(2), &"123456789012345678901234567890".parse().unwrap());
        transfer.add_nft(&nft(4));
        transfer.add_nft(&nft(3));

        let bytes = transfer.to_bytes();
        // base tokens as varint, then the token count
        assert_eq!(&bytes[..3], &[0xac, 0x02, 2]);
        // lower token id goes first
        assert_eq!(bytes[3], 2);

        let assets = ScAssets::from_bytes(&bytes).unwrap();
        assert_eq!(assets.base_tokens(), 300);
        assert_eq!(assets.token_ids(), vec![token(2), token(9)]);
        assert_eq!(assets.balance(&token(9)), ScBigInt::from_u64(5));
        assert!(assets.balance(&token(7)).is_zero());
        assert_eq!(assets.nft_ids().copied().collect::<Vec<_>>(), vec![nft(3), nft(4)]);
        assert_eq!(assets.to_bytes(), bytes);
    }

    #[test]
    fn test_transfer_from_balances() {
        let mut source = ScTransfer::base_tokens(10);
        source.set(&token(1), &ScBigInt::from_u64(0));
        source.set(&token(2), &ScBigInt::from_u64(7));
        source.add_nft(&nft(5));

        let balances = ScBalances::from_bytes(&source.to_bytes()).unwrap();
        let copy = ScTransfer::from_balances(&balances);

        let copied = copy.balances();
        assert_eq!(copied.base_tokens(), 10);
        assert_eq!(copied.token_ids(), vec![token(2)]);
        assert_eq!(copied.nft_ids().count(), 1);
    }

    #[test]
    fn test_malformed_assets() {
        let mut transfer = ScTransfer::new();
        transfer.set(&token(1), &ScBigInt::from_u64(1));
        let mut bytes = transfer.to_bytes();

        bytes.push(0);
        assert_eq!(ScAssets::from_bytes(&bytes), Err(Error::TrailingData(1)));

        bytes.truncate(5);
        assert!(matches!(
            ScAssets::from_bytes(&bytes),
            Err(Error::Underflow { .. })
        ));
    }
}
