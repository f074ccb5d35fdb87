//! Boundary between contract code and the host that runs it.
//!
//! Both traits take `&self`; implementations serialize their own access
//! (usually through a [std::cell::RefCell]).

use crate::err::ScResult;

/// Flat key/value store behind every [crate::proxy::Proxy].
///
/// An absent key and a key holding an empty value are distinct.
pub trait KvStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    fn set(&self, key: &[u8], value: &[u8]);

    fn exists(&self, key: &[u8]) -> bool;

    fn delete(&self, key: &[u8]);
}

/// Host function dispatch.
///
/// `func` is a negative opcode. `None` is the explicit marker for a call
/// without input, as opposed to an empty input buffer.
pub trait HostCall {
    fn call(&self, func: i32, input: Option<&[u8]>) -> ScResult<Vec<u8>>;
}
