use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::dataset::DataObject;
use crate::foundation::core::Extent;

/// Dynamically typed information value.
#[derive(Clone, Debug)]
pub enum InfoValue {
    /// Integer.
    Int(i64),
    /// Integer vector.
    IntVec(Vec<i64>),
    /// Double.
    Double(f64),
    /// Double vector.
    DoubleVec(Vec<f64>),
    /// Shared data object.
    Object(Arc<DataObject>),
    /// String.
    String(String),
}

impl PartialEq for InfoValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::IntVec(a), Self::IntVec(b)) => a == b,
            (Self::Double(a), Self::Double(b)) => a.to_bits() == b.to_bits(),
            (Self::DoubleVec(a), Self::DoubleVec(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
            }
            (Self::Object(a), Self::Object(b)) => Arc::ptr_eq(a, b),
            (Self::String(a), Self::String(b)) => a == b,
            _ => false,
        }
    }
}

/// Rust types that can be stored under a typed [`Key`].
pub trait InfoType: Sized {
    /// Wrap into an [`InfoValue`].
    fn into_value(self) -> InfoValue;
    /// Unwrap from an [`InfoValue`]; `None` on a type mismatch.
    fn from_value(v: &InfoValue) -> Option<Self>;
}

impl InfoType for i64 {
    fn into_value(self) -> InfoValue {
        InfoValue::Int(self)
    }
    fn from_value(v: &InfoValue) -> Option<Self> {
        match v {
            InfoValue::Int(x) => Some(*x),
            _ => None,
        }
    }
}

impl InfoType for bool {
    fn into_value(self) -> InfoValue {
        InfoValue::Int(i64::from(self))
    }
    fn from_value(v: &InfoValue) -> Option<Self> {
        i64::from_value(v).map(|x| x != 0)
    }
}

impl InfoType for Vec<i64> {
    fn into_value(self) -> InfoValue {
        InfoValue::IntVec(self)
    }
    fn from_value(v: &InfoValue) -> Option<Self> {
        match v {
            InfoValue::IntVec(x) => Some(x.clone()),
            _ => None,
        }
    }
}

impl InfoType for Extent {
    fn into_value(self) -> InfoValue {
        InfoValue::IntVec(self.to_vec())
    }
    fn from_value(v: &InfoValue) -> Option<Self> {
        match v {
            InfoValue::IntVec(x) => Extent::from_slice(x).ok(),
            _ => None,
        }
    }
}

impl InfoType for f64 {
    fn into_value(self) -> InfoValue {
        InfoValue::Double(self)
    }
    fn from_value(v: &InfoValue) -> Option<Self> {
        match v {
            InfoValue::Double(x) => Some(*x),
            _ => None,
        }
    }
}

impl InfoType for Vec<f64> {
    fn into_value(self) -> InfoValue {
        InfoValue::DoubleVec(self)
    }
    fn from_value(v: &InfoValue) -> Option<Self> {
        match v {
            InfoValue::DoubleVec(x) => Some(x.clone()),
            _ => None,
        }
    }
}

impl InfoType for [f64; 2] {
    fn into_value(self) -> InfoValue {
        InfoValue::DoubleVec(self.to_vec())
    }
    fn from_value(v: &InfoValue) -> Option<Self> {
        match v {
            InfoValue::DoubleVec(x) if x.len() == 2 => Some([x[0], x[1]]),
            _ => None,
        }
    }
}

impl InfoType for [f64; 3] {
    fn into_value(self) -> InfoValue {
        InfoValue::DoubleVec(self.to_vec())
    }
    fn from_value(v: &InfoValue) -> Option<Self> {
        match v {
            InfoValue::DoubleVec(x) if x.len() == 3 => Some([x[0], x[1], x[2]]),
            _ => None,
        }
    }
}

impl InfoType for Arc<DataObject> {
    fn into_value(self) -> InfoValue {
        InfoValue::Object(self)
    }
    fn from_value(v: &InfoValue) -> Option<Self> {
        match v {
            InfoValue::Object(x) => Some(Arc::clone(x)),
            _ => None,
        }
    }
}

impl InfoType for String {
    fn into_value(self) -> InfoValue {
        InfoValue::String(self)
    }
    fn from_value(v: &InfoValue) -> Option<Self> {
        match v {
            InfoValue::String(x) => Some(x.clone()),
            _ => None,
        }
    }
}

/// Interned, typed information key.
pub struct Key<T> {
    name: &'static str,
    _ty: PhantomData<fn() -> T>,
}

impl<T> Key<T> {
    /// Declare a key.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _ty: PhantomData,
        }
    }

    /// Key name.
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for Key<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Key<T> {}

impl<T> std::fmt::Debug for Key<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Key({})", self.name)
    }
}

/// String-keyed map of heterogeneous pipeline metadata.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Information {
    entries: BTreeMap<String, InfoValue>,
}

impl Information {
    /// Empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Typed read; `None` when absent or stored with another type.
    pub fn get<T: InfoType>(&self, key: &Key<T>) -> Option<T> {
        self.entries.get(key.name).and_then(T::from_value)
    }

    /// Typed write.
    pub fn set<T: InfoType>(&mut self, key: &Key<T>, value: T) {
        self.entries.insert(key.name.to_owned(), value.into_value());
    }

    /// `true` when the key is present (any type).
    pub fn has<T>(&self, key: &Key<T>) -> bool {
        self.entries.contains_key(key.name)
    }

    /// Remove a key.
    pub fn remove<T>(&mut self, key: &Key<T>) {
        self.entries.remove(key.name);
    }

    /// Untyped read, for keys not known at compile time.
    pub fn get_raw(&self, name: &str) -> Option<&InfoValue> {
        self.entries.get(name)
    }

    /// Untyped write.
    pub fn set_raw(&mut self, name: impl Into<String>, value: InfoValue) {
        self.entries.insert(name.into(), value);
    }

    /// Untyped remove.
    pub fn remove_raw(&mut self, name: &str) {
        self.entries.remove(name);
    }

    /// Copy every entry of `other`, overwriting duplicates.
    pub fn copy_from(&mut self, other: &Information) {
        for (k, v) in &other.entries {
            self.entries.insert(k.clone(), v.clone());
        }
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &InfoValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` without entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/information.rs"]
mod tests;
