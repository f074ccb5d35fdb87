//! In-process host for running and testing contract code.
//!
//! [SoloHost] answers every [HostFunc] from local data: a state dictionary,
//! the request parameters, balances and a fixed [SoloEnv]. Outgoing requests,
//! results, log lines and events are recorded for inspection.

use std::cell::RefCell;
use std::rc::Rc;

use sclib_core::assets::{ScAssets, ScTransfer};
use sclib_core::dict::ScDict;
use sclib_core::err::{Error, ScResult};
use sclib_core::host::{HostCall, KvStore};
use sclib_core::types::{ScAgentID, ScChainID, ScHash, ScHname, ScRequestID, ScTokenID, WireType};

use crate::defaults;
use crate::requests::{CallRequest, DeployRequest, PostRequest, SendRequest};
use crate::sandbox::{HostFunc, ScSandbox};

/// Fixed request context served by the host
#[derive(Debug, Clone)]
pub struct SoloEnv {
    pub chain_id: ScChainID,
    pub chain_owner_id: ScAgentID,
    pub contract: ScHname,
    pub account_id: ScAgentID,
    pub caller: ScAgentID,
    pub request_id: ScRequestID,
    pub entropy: ScHash,
    pub timestamp: u64,
}

impl Default for SoloEnv {
    fn default() -> Self {
        Self {
            chain_id: Default::default(),
            chain_owner_id: Default::default(),
            contract: ScHname(defaults::SOLO_CONTRACT_HNAME),
            account_id: Default::default(),
            caller: Default::default(),
            request_id: Default::default(),
            entropy: Default::default(),
            timestamp: defaults::SOLO_START_TIMESTAMP,
        }
    }
}

/// Request sent out by the contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutgoingRequest {
    Call(CallRequest),
    Post(PostRequest),
    Deploy(DeployRequest),
    Send(SendRequest),
}

#[derive(Debug, Default)]
pub struct SoloHost {
    env: SoloEnv,
    state: RefCell<ScDict>,
    params: RefCell<ScDict>,
    results: RefCell<Option<ScDict>>,
    call_results: RefCell<ScDict>,
    balances: RefCell<ScTransfer>,
    allowance: RefCell<ScTransfer>,
    minted: RefCell<ScTransfer>,
    outgoing: RefCell<Vec<OutgoingRequest>>,
    logs: RefCell<Vec<String>>,
    events: RefCell<Vec<String>>,
}

impl SoloHost {
    pub fn new(env: SoloEnv) -> Self {
        Self {
            env,
            ..Default::default()
        }
    }

    /// Sandbox for contract code, backed by this host and its state
    pub fn sandbox(host: &Rc<Self>) -> ScSandbox {
        ScSandbox::new(host.clone(), host.clone())
    }

    pub fn env(&self) -> &SoloEnv {
        &self.env
    }

    pub fn set_params(&self, params: ScDict) {
        self.params.replace(params);
    }

    /// Results returned to the contract by any synchronous call
    pub fn set_call_results(&self, results: ScDict) {
        self.call_results.replace(results);
    }

    pub fn set_balances(&self, balances: ScTransfer) {
        self.balances.replace(balances);
    }

    pub fn set_allowance(&self, allowance: ScTransfer) {
        self.allowance.replace(allowance);
    }

    pub fn set_minted(&self, minted: ScTransfer) {
        self.minted.replace(minted);
    }

    /// Results posted by the contract, if any
    pub fn results(&self) -> Option<ScDict> {
        self.results.borrow().clone()
    }

    pub fn outgoing(&self) -> Vec<OutgoingRequest> {
        self.outgoing.borrow().clone()
    }

    pub fn logs(&self) -> Vec<String> {
        self.logs.borrow().clone()
    }

    pub fn events(&self) -> Vec<String> {
        self.events.borrow().clone()
    }

    /// Copy of the contract state
    pub fn state(&self) -> ScDict {
        self.state.borrow().clone()
    }

    /// Empty input asks for the base token balance
    fn balance(&self, input: &[u8]) -> ScResult<Vec<u8>> {
        let balances = self.balances.borrow().balances();
        let amount = match input.is_empty() {
            true => balances.base_tokens(),
            false => balances.balance(&ScTokenID::from_bytes(input)?).to_u64()?,
        };
        Ok(amount.to_bytes())
    }

    fn record(&self, req: OutgoingRequest) {
        log::debug!("solo host recorded {:?}", req);
        self.outgoing.borrow_mut().push(req);
    }
}

impl HostCall for SoloHost {
    fn call(&self, func: i32, input: Option<&[u8]>) -> ScResult<Vec<u8>> {
        let func = HostFunc::from_code(func)
            .ok_or_else(|| Error::Host(format!("unknown host function {}", func)))?;
        let input = input.unwrap_or_default();
        log::trace!("solo host {:?}", func);

        let empty = vec![];
        let reply = match func {
            HostFunc::AccountID => self.env.account_id.to_bytes(),
            HostFunc::Allowance => self.allowance.borrow().to_bytes(),
            HostFunc::Balance => self.balance(input)?,
            HostFunc::Balances => self.balances.borrow().to_bytes(),
            HostFunc::Call => {
                self.record(OutgoingRequest::Call(CallRequest::from_bytes(input)?));
                self.call_results.borrow().to_bytes()
            }
            HostFunc::Caller => self.env.caller.to_bytes(),
            HostFunc::ChainID => self.env.chain_id.to_bytes(),
            HostFunc::ChainOwnerID => self.env.chain_owner_id.to_bytes(),
            HostFunc::Contract => self.env.contract.to_bytes(),
            HostFunc::DeployContract => {
                self.record(OutgoingRequest::Deploy(DeployRequest::from_bytes(input)?));
                empty
            }
            HostFunc::Entropy => self.env.entropy.to_bytes(),
            HostFunc::Event => {
                let text = String::from_bytes(input)?;
                log::info!("event: {}", text);
                self.events.borrow_mut().push(text);
                empty
            }
            HostFunc::Log | HostFunc::Trace => {
                let text = String::from_bytes(input)?;
                match func {
                    HostFunc::Log => log::info!("{}", text),
                    _ => log::debug!("{}", text),
                }
                self.logs.borrow_mut().push(text);
                empty
            }
            HostFunc::Minted => self.minted.borrow().to_bytes(),
            HostFunc::Panic => {
                let text = String::from_bytes(input)?;
                log::warn!("contract panicked: {}", text);
                return Err(Error::Host(text));
            }
            HostFunc::Params => self.params.borrow().to_bytes(),
            HostFunc::Post => {
                let req = PostRequest::from_bytes(input)?;
                // validate the nested transfers before accepting the request
                ScAssets::from_bytes(&req.allowance)?;
                ScAssets::from_bytes(&req.transfer)?;
                self.record(OutgoingRequest::Post(req));
                empty
            }
            HostFunc::RequestID => self.env.request_id.to_bytes(),
            HostFunc::Results => {
                self.results.replace(Some(ScDict::from_bytes(input)?));
                empty
            }
            HostFunc::Send => {
                let req = SendRequest::from_bytes(input)?;
                if ScAssets::from_bytes(&req.transfer)?.is_empty() {
                    log::warn!("refusing send of empty transfer");
                    return Err(Error::Host("empty transfer".to_string()));
                }
                self.record(OutgoingRequest::Send(req));
                empty
            }
            HostFunc::Timestamp => self.env.timestamp.to_bytes(),
        };

        Ok(reply)
    }
}

/// Contract state lives in the host
impl KvStore for SoloHost {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        KvStore::get(&self.state, key)
    }

    fn set(&self, key: &[u8], value: &[u8]) {
        KvStore::set(&self.state, key, value)
    }

    fn exists(&self, key: &[u8]) -> bool {
        KvStore::exists(&self.state, key)
    }

    fn delete(&self, key: &[u8]) {
        KvStore::delete(&self.state, key)
    }
}
