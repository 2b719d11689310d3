// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// A record that has been handed to a broadcast adapter.
///
/// Emitting moves the record out of its producer and wraps it here. From then
/// on every consumer holds a clone of the same shared allocation and can only
/// read it: there is no `DerefMut` and no setter. The only way back to an owned,
/// mutable value is [`Frozen::try_unwrap`], which succeeds only for the last
/// remaining reader.
///
/// Reading goes through `Deref`:
///
/// ```
/// use etlflow::{Frozen, Row};
///
/// fn name(row: &Frozen<Row>) -> Option<&str> {
///     row.get("name").and_then(|value| value.as_str())
/// }
/// ```
///
/// Writing does not compile, even through a mutable handle:
///
/// ```compile_fail
/// use etlflow::{Frozen, Row};
///
/// fn rename(row: &mut Frozen<Row>) {
///     row.set("name", "grace");
/// }
/// ```
pub struct Frozen<T>(Arc<T>);

impl<T> Frozen<T> {
    pub(crate) fn new(item: T) -> Self {
        Self(Arc::new(item))
    }

    /// True when both handles point at the same emitted record.
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Arc::ptr_eq(&this.0, &other.0)
    }

    /// Number of live handles, including this one.
    pub fn reader_count(this: &Self) -> usize {
        Arc::strong_count(&this.0)
    }

    /// Recover the owned record if no other consumer still holds it.
    ///
    /// Returns the handle unchanged when the record is still shared.
    pub fn try_unwrap(this: Self) -> Result<T, Self> {
        Arc::try_unwrap(this.0).map_err(Self)
    }

    /// Clone the contents into a fresh, exclusively owned value.
    pub fn thaw(&self) -> T
    where
        T: Clone,
    {
        T::clone(&self.0)
    }
}

impl<T> Clone for Frozen<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> Deref for Frozen<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> AsRef<T> for Frozen<T> {
    fn as_ref(&self) -> &T {
        &self.0
    }
}

impl<T: fmt::Debug> fmt::Debug for Frozen<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Frozen").field(&*self.0).finish()
    }
}

impl<T: PartialEq> PartialEq for Frozen<T> {
    fn eq(&self, other: &Self) -> bool {
        *self.0 == *other.0
    }
}

impl<T: PartialEq> PartialEq<T> for Frozen<T> {
    fn eq(&self, other: &T) -> bool {
        *self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_one_allocation() {
        let first = Frozen::new(vec![1, 2, 3]);
        let second = first.clone();

        assert!(Frozen::ptr_eq(&first, &second));
        assert_eq!(Frozen::reader_count(&first), 2);
        assert_eq!(*second, vec![1, 2, 3]);
    }

    #[test]
    fn test_try_unwrap_refused_while_shared() {
        let first = Frozen::new(String::from("row"));
        let second = first.clone();

        let first = Frozen::try_unwrap(first).expect_err("record is still shared");
        drop(second);

        let owned = Frozen::try_unwrap(first).expect("last reader owns the record");
        assert_eq!(owned, "row");
    }

    #[test]
    fn test_thaw_produces_independent_copy() {
        let frozen = Frozen::new(vec![1]);
        let mut copy = frozen.thaw();
        copy.push(2);

        assert_eq!(*frozen, vec![1]);
        assert_eq!(copy, vec![1, 2]);
    }
}
