//! Byte-keyed dictionary with a canonical serialized form.
//!
//! Entries are kept unordered and only sorted by canonical key when
//! serialized, so the same set of entries always yields the same bytes.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::codec::{ByteViewer, ByteWriter, LENGTH_BITS};
use crate::err::{Error, ScResult};
use crate::host::KvStore;

/// Printable, order-preserving and reversible form of a key.
///
/// Each byte becomes two lowercase hex characters, high nibble first.
pub fn canonical_key(key: &[u8]) -> String {
    hex::encode(key)
}

pub fn key_from_canonical(canonical: &str) -> ScResult<Vec<u8>> {
    hex::decode(canonical)
        .map_err(|e| Error::InvalidValue(format!("canonical key {:?}: {}", canonical, e)))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScDict {
    entries: HashMap<Vec<u8>, Vec<u8>>,
}

impl ScDict {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the serialized form. An empty buffer is an empty dictionary.
    pub fn from_bytes(buf: &[u8]) -> ScResult<Self> {
        let mut dict = Self::new();
        if buf.is_empty() {
            return Ok(dict);
        }

        let mut dec = ByteViewer::from_slice(buf);
        let count = dec.vlu_decode(LENGTH_BITS)?;
        for _ in 0..count {
            let key = dec.bytes()?;
            let value = dec.bytes()?;
            if dict.entries.insert(key.to_vec(), value.to_vec()).is_some() {
                return Err(Error::InvalidValue(format!(
                    "duplicate dictionary key {}",
                    canonical_key(key)
                )));
            }
        }
        dec.close()?;

        log::debug!("decoded dictionary with {} entries", count);
        Ok(dict)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut enc = ByteWriter::new();
        enc.vlu_encode(self.entries.len() as u64);
        for (key, value) in self.entries() {
            enc.bytes(key).bytes(value);
        }
        enc.into_bytes()
    }

    /// Entries in canonical key order
    pub fn entries(&self) -> Vec<(&[u8], &[u8])> {
        let mut entries: Vec<(String, &[u8], &[u8])> = self
            .entries
            .iter()
            .map(|(k, v)| (canonical_key(k), k.as_slice(), v.as_slice()))
            .collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        entries.into_iter().map(|(_, k, v)| (k, v)).collect()
    }

    pub fn set(&mut self, key: &[u8], value: &[u8]) {
        self.entries.insert(key.to_vec(), value.to_vec());
    }

    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn exists(&self, key: &[u8]) -> bool {
        self.entries.contains_key(key)
    }

    pub fn delete(&mut self, key: &[u8]) {
        self.entries.remove(key);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Freeze into a read-only view
    pub fn immutable(self) -> ScImmutableDict {
        ScImmutableDict { dict: self }
    }
}

/// A shared dictionary serves as the store behind a root proxy
impl KvStore for RefCell<ScDict> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.borrow().get(key).map(<[u8]>::to_vec)
    }

    fn set(&self, key: &[u8], value: &[u8]) {
        self.borrow_mut().set(key, value);
    }

    fn exists(&self, key: &[u8]) -> bool {
        self.borrow().exists(key)
    }

    fn delete(&self, key: &[u8]) {
        self.borrow_mut().delete(key);
    }
}

/// Read-only dictionary, such as the results of a call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScImmutableDict {
    dict: ScDict,
}

impl ScImmutableDict {
    pub fn from_bytes(buf: &[u8]) -> ScResult<Self> {
        Ok(ScDict::from_bytes(buf)?.immutable())
    }

    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.dict.get(key)
    }

    pub fn exists(&self, key: &[u8]) -> bool {
        self.dict.exists(key)
    }

    pub fn len(&self) -> usize {
        self.dict.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dict.is_empty()
    }

    pub fn entries(&self) -> Vec<(&[u8], &[u8])> {
        self.dict.entries()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.dict.to_bytes()
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

    use super::*;

    #[test]
    fn test_empty_dict() {
        assert_eq!(ScDict::new().to_bytes(), vec![0]);
        assert!(ScDict::from_bytes(&[]).unwrap().is_empty());
        assert!(ScDict::from_bytes(&[0]).unwrap().is_empty());
    }

    #[test]
    fn test_sorted_by_canonical_key() {
        let mut dict = ScDict::new();
        dict.set(b"b", &[1]);
        dict.set(b"a", &[2, 3]);

        let bytes = dict.to_bytes();
        assert_eq!(bytes, vec![2, 1, b'a', 2, 2, 3, 1, b'b', 1, 1]);
        assert_eq!(ScDict::from_bytes(&bytes).unwrap(), dict);
    }

    #[test]
    fn test_insertion_order_does_not_matter() {
        let mut entries: Vec<(Vec<u8>, Vec<u8>)> = (0..64_u8)
            .map(|i| (vec![i.wrapping_mul(37), i], vec![i; (i % 5) as usize]))
            .collect();
        entries.push((vec![], vec![9]));
        entries.push((vec![0xff; 3], vec![]));

        let mut rng = StdRng::seed_from_u64(42);
        let mut reference: Option<Vec<u8>> = None;
        for _ in 0..10 {
            entries.shuffle(&mut rng);
            let mut dict = ScDict::new();
            for (k, v) in entries.iter() {
                dict.set(k, v);
            }

            let bytes = dict.to_bytes();
            match &reference {
                Some(r) => assert_eq!(r, &bytes),
                None => reference = Some(bytes),
            }
        }
    }

    #[test]
    fn test_set_get_delete() {
        let mut dict = ScDict::new();
        assert!(!dict.exists(b"k"));
        assert_eq!(dict.get(b"k"), None);

        // empty value is not the same as absent
        dict.set(b"k", &[]);
        assert!(dict.exists(b"k"));
        assert_eq!(dict.get(b"k"), Some(&[][..]));

        dict.set(b"k", &[7]);
        assert_eq!(dict.get(b"k"), Some(&[7][..]));

        dict.delete(b"k");
        assert!(!dict.exists(b"k"));
    }

    #[test]
    fn test_malformed_dict() {
        // duplicate key
        let dup = [2, 1, b'a', 0, 1, b'a', 0];
        assert!(matches!(
            ScDict::from_bytes(&dup),
            Err(Error::InvalidValue(_))
        ));

        assert!(matches!(
            ScDict::from_bytes(&[1, 1, b'a']),
            Err(Error::Underflow { .. })
        ));
        assert_eq!(
            ScDict::from_bytes(&[1, 1, b'a', 0, 0]),
            Err(Error::TrailingData(1))
        );
    }

    #[test]
    fn test_canonical_key() {
        assert_eq!(canonical_key(&[0x00, 0xab, 0x10]), "00ab10");
        assert_eq!(key_from_canonical("00ab10").unwrap(), vec![0x00, 0xab, 0x10]);
        assert!(key_from_canonical("0g").is_err());

        // ordering is preserved
        assert!(canonical_key(&[0x01, 0xff]) < canonical_key(&[0x02]));
        assert!(canonical_key(&[0x02]) < canonical_key(&[0x02, 0x00]));
    }

    #[test]
    fn test_immutable_view() {
        let mut dict = ScDict::new();
        dict.set(b"x", &[1, 2]);
        let bytes = dict.to_bytes();

        let view = ScImmutableDict::from_bytes(&bytes).unwrap();
        assert_eq!(view.get(b"x"), Some(&[1, 2][..]));
        assert!(!view.exists(b"y"));
        assert_eq!(view.entries(), vec![(&b"x"[..], &[1, 2][..])]);
        assert_eq!(view.to_bytes(), bytes);
    }
}
