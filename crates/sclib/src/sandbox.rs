//! Typed access to host functions.
//!
//! [ScSandbox] turns each host function into a method: it encodes the input,
//! dispatches through [HostCall] and decodes the reply.

use std::cell::RefCell;
use std::rc::Rc;

use sha2::{Digest, Sha256};

use sclib_core::assets::{ScBalances, ScTransfer};
use sclib_core::dict::{ScDict, ScImmutableDict};
use sclib_core::err::{Error, ScResult};
use sclib_core::host::{HostCall, KvStore};
use sclib_core::proxy::Proxy;
use sclib_core::types::{
    ScAddress, ScAgentID, ScChainID, ScHash, ScHname, ScRequestID, ScTokenID, WireType,
};

use crate::requests::{CallRequest, DeployRequest, PostRequest, SendRequest};

const U64_SIZE: usize = std::mem::size_of::<u64>();

/// Host function opcodes
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostFunc {
    AccountID = -1,
    Allowance = -2,
    Balance = -3,
    Balances = -4,
    Call = -6,
    Caller = -7,
    ChainID = -8,
    ChainOwnerID = -9,
    Contract = -10,
    DeployContract = -11,
    Entropy = -12,
    Event = -14,
    Log = -15,
    Minted = -16,
    Panic = -17,
    Params = -18,
    Post = -19,
    RequestID = -21,
    Results = -22,
    Send = -23,
    Timestamp = -25,
    Trace = -26,
}

impl HostFunc {
    const ALL: [HostFunc; 22] = [
        HostFunc::AccountID,
        HostFunc::Allowance,
        HostFunc::Balance,
        HostFunc::Balances,
        HostFunc::Call,
        HostFunc::Caller,
        HostFunc::ChainID,
        HostFunc::ChainOwnerID,
        HostFunc::Contract,
        HostFunc::DeployContract,
        HostFunc::Entropy,
        HostFunc::Event,
        HostFunc::Log,
        HostFunc::Minted,
        HostFunc::Panic,
        HostFunc::Params,
        HostFunc::Post,
        HostFunc::RequestID,
        HostFunc::Results,
        HostFunc::Send,
        HostFunc::Timestamp,
        HostFunc::Trace,
    ];

    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.code() == code)
    }
}

/// Pseudo-random bytes drawn from the request entropy
#[derive(Debug, Clone, Default)]
struct EntropyPool {
    seed: Vec<u8>,
    offset: usize,
}

/// Contract-side view of the host
#[derive(Clone)]
pub struct ScSandbox {
    host: Rc<dyn HostCall>,
    state: Rc<dyn KvStore>,
    random_pool: Rc<RefCell<EntropyPool>>,
}

impl ScSandbox {
    pub fn new(host: Rc<dyn HostCall>, state: Rc<dyn KvStore>) -> Self {
        Self {
            host,
            state,
            random_pool: Default::default(),
        }
    }

    fn sandbox(&self, func: HostFunc, input: Option<&[u8]>) -> ScResult<Vec<u8>> {
        log::trace!(
            "host call {:?} with {} input bytes",
            func,
            input.map(<[u8]>::len).unwrap_or_default()
        );
        self.host.call(func.code(), input)
    }

    /// Decode a fixed value returned by an input-less host function
    fn query<T: WireType>(&self, func: HostFunc) -> ScResult<T> {
        T::from_bytes(&self.sandbox(func, None)?)
    }

    /// Parameters passed to the running function
    pub fn params(&self) -> ScResult<ScImmutableDict> {
        ScImmutableDict::from_bytes(&self.sandbox(HostFunc::Params, None)?)
    }

    /// Parameters behind a proxy, for typed access
    pub fn params_proxy(&self) -> ScResult<Proxy> {
        let params = ScDict::from_bytes(&self.sandbox(HostFunc::Params, None)?)?;
        Ok(Proxy::new(Rc::new(RefCell::new(params))))
    }

    pub fn results(&self, results: &ScDict) -> ScResult<()> {
        self.sandbox(HostFunc::Results, Some(&results.to_bytes()))?;
        Ok(())
    }

    /// The contract's own key/value state
    pub fn state(&self) -> Proxy {
        Proxy::new(self.state.clone())
    }

    /// Synchronous call of another function, returns its results
    pub fn call(
        &self,
        contract: ScHname,
        function: ScHname,
        params: Option<&ScDict>,
        allowance: Option<&ScTransfer>,
    ) -> ScResult<ScImmutableDict> {
        let req = CallRequest {
            contract,
            function,
            params: params.map(ScDict::to_bytes).unwrap_or_default(),
            allowance: allowance.map(ScTransfer::to_bytes).unwrap_or_default(),
        };
        let res = self.sandbox(HostFunc::Call, Some(&req.to_bytes()?))?;
        ScImmutableDict::from_bytes(&res)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn post(
        &self,
        chain_id: ScChainID,
        contract: ScHname,
        function: ScHname,
        params: Option<&ScDict>,
        allowance: &ScTransfer,
        transfer: &ScTransfer,
        delay: u32,
    ) -> ScResult<()> {
        let req = PostRequest {
            chain_id,
            contract,
            function,
            params: params.map(ScDict::to_bytes).unwrap_or_default(),
            allowance: allowance.to_bytes(),
            transfer: transfer.to_bytes(),
            delay,
        };
        self.sandbox(HostFunc::Post, Some(&req.to_bytes()?))?;
        Ok(())
    }

    pub fn deploy_contract(
        &self,
        prog_hash: ScHash,
        name: &str,
        description: &str,
        init_params: Option<&ScDict>,
    ) -> ScResult<()> {
        let req = DeployRequest {
            prog_hash,
            name: name.to_string(),
            description: description.to_string(),
            params: init_params.map(ScDict::to_bytes).unwrap_or_default(),
        };
        self.sandbox(HostFunc::DeployContract, Some(&req.to_bytes()?))?;
        Ok(())
    }

    /// Send assets to an address. An empty transfer is not sent.
    pub fn send(&self, address: ScAddress, transfer: &ScTransfer) -> ScResult<()> {
        if transfer.is_empty() {
            log::debug!("skipping send of empty transfer to {}", address);
            return Ok(());
        }

        let req = SendRequest {
            address,
            transfer: transfer.to_bytes(),
        };
        self.sandbox(HostFunc::Send, Some(&req.to_bytes()?))?;
        Ok(())
    }

    /// Balances of the contract account
    pub fn balances(&self) -> ScResult<ScBalances> {
        ScBalances::from_bytes(&self.sandbox(HostFunc::Balances, None)?)
    }

    /// Balance of a single token, or of base tokens when `token_id` is `None`
    pub fn balance(&self, token_id: Option<&ScTokenID>) -> ScResult<u64> {
        let input = token_id.map(ScTokenID::as_bytes);
        u64::from_bytes(&self.sandbox(HostFunc::Balance, input)?)
    }

    /// Assets the caller allowed this function to take
    pub fn allowance(&self) -> ScResult<ScBalances> {
        ScBalances::from_bytes(&self.sandbox(HostFunc::Allowance, None)?)
    }

    /// Assets minted by the current request
    pub fn minted(&self) -> ScResult<ScBalances> {
        ScBalances::from_bytes(&self.sandbox(HostFunc::Minted, None)?)
    }

    /// Deterministic request timestamp in nanoseconds
    pub fn timestamp(&self) -> ScResult<u64> {
        self.query(HostFunc::Timestamp)
    }

    pub fn contract(&self) -> ScResult<ScHname> {
        self.query(HostFunc::Contract)
    }

    pub fn chain_id(&self) -> ScResult<ScChainID> {
        self.query(HostFunc::ChainID)
    }

    pub fn chain_owner_id(&self) -> ScResult<ScAgentID> {
        self.query(HostFunc::ChainOwnerID)
    }

    pub fn account_id(&self) -> ScResult<ScAgentID> {
        self.query(HostFunc::AccountID)
    }

    pub fn caller(&self) -> ScResult<ScAgentID> {
        self.query(HostFunc::Caller)
    }

    pub fn request_id(&self) -> ScResult<ScRequestID> {
        self.query(HostFunc::RequestID)
    }

    /// Random seed of the current request
    pub fn entropy(&self) -> ScResult<ScHash> {
        self.query(HostFunc::Entropy)
    }

    /// Deterministic pseudo-random number in `0..max`.
    ///
    /// Consumes the request entropy 8 bytes at a time; once it is used up
    /// the seed is rehashed with SHA-256.
    pub fn random(&self, max: u64) -> ScResult<u64> {
        if max == 0 {
            return Err(self.panic("random: max parameter should be non-zero"));
        }

        let mut pool = self.random_pool.borrow_mut();
        if pool.seed.is_empty() {
            pool.seed = self.entropy()?.as_bytes().to_vec();
            pool.offset = 0;
        }
        if pool.offset + U64_SIZE > pool.seed.len() {
            pool.seed = Sha256::digest(&pool.seed).to_vec();
            pool.offset = 0;
        }

        let next = &pool.seed[pool.offset..pool.offset + U64_SIZE];
        let rnd = u64::from_bytes(next)? % max;
        pool.offset += U64_SIZE;
        Ok(rnd)
    }

    pub fn log(&self, text: &str) -> ScResult<()> {
        self.sandbox(HostFunc::Log, Some(text.as_bytes()))?;
        Ok(())
    }

    pub fn trace(&self, text: &str) -> ScResult<()> {
        self.sandbox(HostFunc::Trace, Some(text.as_bytes()))?;
        Ok(())
    }

    /// Publish an event that off-chain parties can subscribe to
    pub fn event(&self, text: &str) -> ScResult<()> {
        self.sandbox(HostFunc::Event, Some(text.as_bytes()))?;
        Ok(())
    }

    /// Report a fatal error to the host.
    ///
    /// Returns the error to propagate; the host is expected to abort the request.
    pub fn panic(&self, text: &str) -> Error {
        log::error!("contract panic: {}", text);
        match self.sandbox(HostFunc::Panic, Some(text.as_bytes())) {
            Err(e) => e,
            Ok(_) => Error::Host(text.to_string()),
        }
    }

    /// Panic with `text` unless `cond` holds
    pub fn require(&self, cond: bool, text: &str) -> ScResult<()> {
        match cond {
            true => Ok(()),
            false => Err(self.panic(text)),
        }
    }
}
