//! Shallow Equality
//!
//! One-level structural comparison. The store uses it to decide whether a
//! committed write is visible to a subscriber: a trigger fires only when the
//! observed value is *not* shallow-equal to its predecessor.
//!
//! # Comparison Rules
//!
//! 1. Scalars, strings, and other atomic values compare by value.
//!
//! 2. Floats use bit semantics rather than IEEE `==`: every NaN equals every
//!    other NaN, and `0.0` does not equal `-0.0`. A value that did not change
//!    is never reported as changed, and a sign flip always is.
//!
//! 3. Shared pointers (`Rc`, `Arc`) compare by pointer identity and never
//!    look through to their contents.
//!
//! 4. Containers (`Vec`, slices, arrays, maps, `Option`, tuples) compare
//!    length/shape first, then each entry with `ShallowEq`.
//!
//! The comparison bottoms out at shared references: owned data has no
//! identity apart from its contents, so owned containers compare entry by
//! entry, while any `Rc` encountered along the way stops the descent.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::rc::Rc;
use std::sync::Arc;

/// One-level structural equality.
///
/// Implementations must be reflexive for unchanged data: any value is
/// shallow-equal to itself (including NaN floats). They should be cheap;
/// nothing here is expected to allocate or walk shared structures.
pub trait ShallowEq {
    /// Returns true when `self` and `other` are indistinguishable one level
    /// deep.
    fn shallow_eq(&self, other: &Self) -> bool;
}

/// Implement `ShallowEq` by delegating to `PartialEq` for atomic types.
macro_rules! shallow_eq_by_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ShallowEq for $ty {
                fn shallow_eq(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

shallow_eq_by_value!(
    (),
    bool,
    char,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    String,
    str,
);

impl ShallowEq for f32 {
    fn shallow_eq(&self, other: &Self) -> bool {
        (self.is_nan() && other.is_nan()) || self.to_bits() == other.to_bits()
    }
}

impl ShallowEq for f64 {
    fn shallow_eq(&self, other: &Self) -> bool {
        (self.is_nan() && other.is_nan()) || self.to_bits() == other.to_bits()
    }
}

impl<T: ShallowEq + ?Sized> ShallowEq for &T {
    fn shallow_eq(&self, other: &Self) -> bool {
        (**self).shallow_eq(*other)
    }
}

/// Pointer identity only. Two distinct allocations are never shallow-equal,
/// even when their contents match.
impl<T: ?Sized> ShallowEq for Rc<T> {
    fn shallow_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(self, other)
    }
}

/// Pointer identity only, as for `Rc`.
impl<T: ?Sized> ShallowEq for Arc<T> {
    fn shallow_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

/// A box uniquely owns its contents, so it compares by value.
impl<T: ShallowEq> ShallowEq for Box<T> {
    fn shallow_eq(&self, other: &Self) -> bool {
        (**self).shallow_eq(&**other)
    }
}

impl<T: ShallowEq> ShallowEq for Option<T> {
    fn shallow_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.shallow_eq(b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T: ShallowEq> ShallowEq for [T] {
    fn shallow_eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other).all(|(a, b)| a.shallow_eq(b))
    }
}

impl<T: ShallowEq> ShallowEq for Vec<T> {
    fn shallow_eq(&self, other: &Self) -> bool {
        self.as_slice().shallow_eq(other.as_slice())
    }
}

impl<T: ShallowEq, const N: usize> ShallowEq for [T; N] {
    fn shallow_eq(&self, other: &Self) -> bool {
        self.iter().zip(other).all(|(a, b)| a.shallow_eq(b))
    }
}

impl<K: Eq + Hash, V: ShallowEq> ShallowEq for HashMap<K, V> {
    fn shallow_eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.iter().all(|(key, a)| match other.get(key) {
                Some(b) => a.shallow_eq(b),
                None => false,
            })
    }
}

impl<K: Ord, V: ShallowEq> ShallowEq for BTreeMap<K, V> {
    fn shallow_eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.iter().all(|(key, a)| match other.get(key) {
                Some(b) => a.shallow_eq(b),
                None => false,
            })
    }
}

impl<A: ShallowEq, B: ShallowEq> ShallowEq for (A, B) {
    fn shallow_eq(&self, other: &Self) -> bool {
        self.0.shallow_eq(&other.0) && self.1.shallow_eq(&other.1)
    }
}

impl<A: ShallowEq, B: ShallowEq, C: ShallowEq> ShallowEq for (A, B, C) {
    fn shallow_eq(&self, other: &Self) -> bool {
        self.0.shallow_eq(&other.0) && self.1.shallow_eq(&other.1) && self.2.shallow_eq(&other.2)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
