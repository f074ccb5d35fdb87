//! Typed views over [Proxy] keys.
//!
//! Absent keys read as the zero value of the type; use `exists` to tell
//! the two apart.

use std::marker::PhantomData;

use crate::err::ScResult;
use crate::proxy::Proxy;
use crate::types::WireType;

/// Read-only value of type `T` stored under one key
#[derive(Debug)]
pub struct ScImmutable<T> {
    proxy: Proxy,
    _value: PhantomData<T>,
}

impl<T: WireType> ScImmutable<T> {
    pub fn new(proxy: Proxy) -> Self {
        Self {
            proxy,
            _value: PhantomData,
        }
    }

    pub fn exists(&self) -> ScResult<bool> {
        self.proxy.exists()
    }

    pub fn value(&self) -> ScResult<T> {
        T::from_bytes(&self.proxy.get()?)
    }

    pub fn to_text(&self) -> ScResult<String> {
        Ok(self.value()?.to_text())
    }
}

/// Read-write value of type `T` stored under one key
#[derive(Debug)]
pub struct ScMutable<T> {
    proxy: Proxy,
    _value: PhantomData<T>,
}

impl<T: WireType> ScMutable<T> {
    pub fn new(proxy: Proxy) -> Self {
        Self {
            proxy,
            _value: PhantomData,
        }
    }

    pub fn exists(&self) -> ScResult<bool> {
        self.proxy.exists()
    }

    pub fn value(&self) -> ScResult<T> {
        T::from_bytes(&self.proxy.get()?)
    }

    pub fn set_value(&self, value: &T) -> ScResult<()> {
        self.proxy.set(&value.to_bytes())
    }

    pub fn delete(&self) -> ScResult<()> {
        self.proxy.delete()
    }

    pub fn to_text(&self) -> ScResult<String> {
        Ok(self.value()?.to_text())
    }

    pub fn immutable(&self) -> ScImmutable<T> {
        ScImmutable::new(self.proxy.clone())
    }
}

#[derive(Debug)]
pub struct ScImmutableArray<T> {
    proxy: Proxy,
    _value: PhantomData<T>,
}

impl<T: WireType> ScImmutableArray<T> {
    pub fn new(proxy: Proxy) -> Self {
        Self {
            proxy,
            _value: PhantomData,
        }
    }

    pub fn length(&self) -> ScResult<u32> {
        self.proxy.length()
    }

    pub fn get(&self, index: u32) -> ScResult<ScImmutable<T>> {
        Ok(ScImmutable::new(self.proxy.index(index)?))
    }
}

#[derive(Debug)]
pub struct ScMutableArray<T> {
    proxy: Proxy,
    _value: PhantomData<T>,
}

impl<T: WireType> ScMutableArray<T> {
    pub fn new(proxy: Proxy) -> Self {
        Self {
            proxy,
            _value: PhantomData,
        }
    }

    pub fn length(&self) -> ScResult<u32> {
        self.proxy.length()
    }

    pub fn get(&self, index: u32) -> ScResult<ScMutable<T>> {
        Ok(ScMutable::new(self.proxy.index(index)?))
    }

    /// Grow the array by one element
    pub fn append(&self) -> ScResult<ScMutable<T>> {
        Ok(ScMutable::new(self.proxy.append()?))
    }

    pub fn append_value(&self, value: &T) -> ScResult<()> {
        self.append()?.set_value(value)
    }

    pub fn clear(&self) -> ScResult<()> {
        self.proxy.clear_array()
    }

    pub fn immutable(&self) -> ScImmutableArray<T> {
        ScImmutableArray::new(self.proxy.clone())
    }
}

/// Read-only map. Member keys are the stand-alone bytes of `K`.
#[derive(Debug)]
pub struct ScImmutableMap<K, T> {
    proxy: Proxy,
    _entry: PhantomData<(K, T)>,
}

impl<K: WireType, T: WireType> ScImmutableMap<K, T> {
    pub fn new(proxy: Proxy) -> Self {
        Self {
            proxy,
            _entry: PhantomData,
        }
    }

    pub fn get(&self, key: &K) -> ScImmutable<T> {
        ScImmutable::new(self.proxy.key(&key.to_bytes()))
    }
}

#[derive(Debug)]
pub struct ScMutableMap<K, T> {
    proxy: Proxy,
    _entry: PhantomData<(K, T)>,
}

impl<K: WireType, T: WireType> ScMutableMap<K, T> {
    pub fn new(proxy: Proxy) -> Self {
        Self {
            proxy,
            _entry: PhantomData,
        }
    }

    pub fn get(&self, key: &K) -> ScMutable<T> {
        ScMutable::new(self.proxy.key(&key.to_bytes()))
    }

    pub fn clear(&self) -> ScResult<()> {
        self.proxy.clear_map()
    }

    pub fn immutable(&self) -> ScImmutableMap<K, T> {
        ScImmutableMap::new(self.proxy.clone())
    }
}
