//! Path proxies over a flat key/value store.
//!
//! A [Proxy] names one key inside a [KvStore]. The key is kept as a list of
//! path segments and only rendered into a flat byte key on store access.
//!
//! Key layout:
//! - a root member is the bare field name
//! - a map member is `parent . member`
//! - an array element is `parent # index`, the index as 4 little-endian bytes
//! - a container keeps its length counter (a u32) under its own key

use std::fmt;
use std::rc::Rc;

use crate::dict::canonical_key;
use crate::err::{Error, ScResult};
use crate::host::KvStore;
use crate::types::WireType;

pub const MEMBER_SEPARATOR: u8 = b'.';
pub const ELEMENT_SEPARATOR: u8 = b'#';

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Member(Vec<u8>),
    Element(u32),
}

/// Handle on a single key of a store.
///
/// A nil proxy has no store; navigating it works, store access fails with
/// [Error::Disconnected].
#[derive(Clone, Default)]
pub struct Proxy {
    store: Option<Rc<dyn KvStore>>,
    path: Vec<Segment>,
}

impl Proxy {
    /// Root proxy of a store. Its own key is empty.
    pub fn new(store: Rc<dyn KvStore>) -> Self {
        Self {
            store: Some(store),
            path: vec![],
        }
    }

    pub fn nil() -> Self {
        Self::default()
    }

    pub fn is_nil(&self) -> bool {
        self.store.is_none()
    }

    fn child(&self, segment: Segment) -> Self {
        let mut path = self.path.clone();
        path.push(segment);
        Self {
            store: self.store.clone(),
            path,
        }
    }

    /// Map member or struct field
    pub fn key(&self, key: &[u8]) -> Self {
        self.child(Segment::Member(key.to_vec()))
    }

    fn element(&self, index: u32) -> Self {
        self.child(Segment::Element(index))
    }

    /// Existing array element.
    ///
    /// Arrays only grow through [Proxy::append].
    pub fn index(&self, index: u32) -> ScResult<Self> {
        let length = self.length()?;
        if index >= length {
            return Err(Error::Index { index, length });
        }
        Ok(self.element(index))
    }

    /// Grow the array by one and return the new last element
    pub fn append(&self) -> ScResult<Self> {
        let length = self.length()?;
        let grown = length.checked_add(1).ok_or(Error::Overflow { bits: u32::BITS })?;
        self.set(&grown.to_bytes())?;
        Ok(self.element(length))
    }

    /// Length of the container at this key, zero when absent
    pub fn length(&self) -> ScResult<u32> {
        u32::from_bytes(&self.get()?)
    }

    /// Removes the length counter only. Elements and members stay in the store.
    pub fn clear_array(&self) -> ScResult<()> {
        self.delete()
    }

    /// Removes the length counter only. Members stay in the store.
    pub fn clear_map(&self) -> ScResult<()> {
        self.delete()
    }

    pub fn exists(&self) -> ScResult<bool> {
        let (store, key) = self.resolve()?;
        Ok(store.exists(&key))
    }

    /// Stored bytes, empty when the key is absent
    pub fn get(&self) -> ScResult<Vec<u8>> {
        let (store, key) = self.resolve()?;
        Ok(store.get(&key).unwrap_or_default())
    }

    pub fn set(&self, value: &[u8]) -> ScResult<()> {
        let (store, key) = self.resolve()?;
        store.set(&key, value);
        Ok(())
    }

    /// Removes exactly this key
    pub fn delete(&self) -> ScResult<()> {
        let (store, key) = self.resolve()?;
        store.delete(&key);
        Ok(())
    }

    /// The flat store key of this proxy
    pub fn flat_key(&self) -> Vec<u8> {
        let mut key = vec![];
        for (i, segment) in self.path.iter().enumerate() {
            match segment {
                Segment::Member(member) => {
                    // only the first segment is bare, even when it is empty
                    if i > 0 {
                        key.push(MEMBER_SEPARATOR);
                    }
                    key.extend_from_slice(member);
                }
                Segment::Element(index) => {
                    key.push(ELEMENT_SEPARATOR);
                    key.extend_from_slice(&index.to_le_bytes());
                }
            }
        }
        key
    }

    fn resolve(&self) -> ScResult<(&Rc<dyn KvStore>, Vec<u8>)> {
        let store = self.store.as_ref().ok_or(Error::Disconnected)?;
        let key = self.flat_key();
        log::trace!("proxy key {}", canonical_key(&key));
        Ok((store, key))
    }
}

impl fmt::Debug for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy")
            .field("key", &canonical_key(&self.flat_key()))
            .field("nil", &self.is_nil())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::dict::ScDict;

    fn dict_root() -> (Rc<RefCell<ScDict>>, Proxy) {
        let dict = Rc::new(RefCell::new(ScDict::new()));
        let root = Proxy::new(dict.clone());
        (dict, root)
    }

    #[test]
    fn test_key_layout() {
        let (_, root) = dict_root();

        assert_eq!(root.key(b"owner").flat_key(), b"owner".to_vec());
        assert_eq!(root.key(b"bets").key(b"alice").flat_key(), b"bets.alice".to_vec());
        assert_eq!(
            root.key(b"list").element(258).flat_key(),
            b"list#\x02\x01\x00\x00".to_vec()
        );
        assert_eq!(
            root.key(b"list").element(1).key(b"x").flat_key(),
            b"list#\x01\x00\x00\x00.x".to_vec()
        );

        // an empty member still gets its separator
        assert_eq!(root.key(b"").key(b"x").flat_key(), b".x".to_vec());
        assert_ne!(root.key(b"").key(b"x").flat_key(), root.key(b"x").flat_key());
        assert_eq!(root.key(b"a").key(b"").key(b"x").flat_key(), b"a..x".to_vec());
    }

    #[test]
    fn test_array_semantics() {
        let _ = pretty_env_logger::try_init();
        let (dict, root) = dict_root();
        let list = root.key(b"list");

        assert_eq!(list.length().unwrap(), 0);
        assert!(!list.exists().unwrap());

        // index == length points the caller to append
        let err = list.index(0).unwrap_err();
        assert_eq!(err, Error::Index { index: 0, length: 0 });
        assert!(err.to_string().contains("append"));

        for i in 0..3_u32 {
            let elem = list.append().unwrap();
            elem.set(&[i as u8]).unwrap();
        }
        assert_eq!(list.length().unwrap(), 3);
        assert_eq!(dict.borrow().get(b"list"), Some(&[3, 0, 0, 0][..]));

        // the i-th append lands at index i
        for i in 0..3_u32 {
            assert_eq!(list.index(i).unwrap().get().unwrap(), vec![i as u8]);
        }

        let err = list.index(7).unwrap_err();
        assert!(!err.to_string().contains("append"));

        // the counter is all that goes away
        list.clear_array().unwrap();
        assert_eq!(list.length().unwrap(), 0);
        assert!(list.index(0).is_err());
        assert_eq!(dict.borrow().len(), 3);
    }

    #[test]
    fn test_scalar_access() {
        let (dict, root) = dict_root();
        let field = root.key(b"name");

        assert!(field.get().unwrap().is_empty());

        field.set(&[]).unwrap();
        assert!(field.exists().unwrap());
        assert!(field.get().unwrap().is_empty());

        field.set(b"abc").unwrap();
        root.key(b"other").set(&[1]).unwrap();
        field.delete().unwrap();

        assert!(!field.exists().unwrap());
        assert_eq!(dict.borrow().len(), 1);
    }

    #[test]
    fn test_map_clear_keeps_members() {
        let (dict, root) = dict_root();
        let map = root.key(b"map");
        map.set(&2_u32.to_bytes()).unwrap();
        map.key(b"a").set(&[1]).unwrap();
        map.key(b"b").set(&[2]).unwrap();

        map.clear_map().unwrap();
        assert_eq!(map.length().unwrap(), 0);
        assert!(map.key(b"a").exists().unwrap());
        assert_eq!(dict.borrow().len(), 2);
    }

    #[test]
    fn test_failure_modes() {
        let nil = Proxy::nil().key(b"x");
        assert!(nil.is_nil());
        assert_eq!(nil.get(), Err(Error::Disconnected));
        assert_eq!(nil.set(&[1]), Err(Error::Disconnected));
        assert_eq!(nil.append().unwrap_err(), Error::Disconnected);

        // corrupted length counter
        let (_, root) = dict_root();
        let list = root.key(b"list");
        list.set(&[1, 2]).unwrap();
        assert!(matches!(
            list.length(),
            Err(Error::InvalidLength { .. })
        ));
    }
}
