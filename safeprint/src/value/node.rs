//! Shared, interior-mutable handles for composite values.

use std::{
    fmt,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

/// A shared handle to a composite value.
///
/// Cloning a `Node` clones the handle, not the contents: every clone refers to
/// the same instance, and the printer treats them as one value. Storing a
/// clone inside its own descendants produces a cycle.
///
/// Writers on other threads may mutate the contents through [`Node::write`]
/// while a render is in progress. The printer only holds the read lock long
/// enough to copy out child handles.
pub struct Node<T>(Arc<RwLock<T>>);

/// Contents copied out under the read lock, plus whether the lock was poisoned.
pub(crate) struct Inspected<R> {
    pub(crate) value: R,
    pub(crate) poisoned: bool,
}

impl<T> Node<T> {
    /// Wraps `value` in a fresh instance.
    pub fn new(value: T) -> Self {
        Self(Arc::new(RwLock::new(value)))
    }

    /// Acquires shared read access.
    ///
    /// A lock poisoned by a panicking writer is recovered rather than
    /// propagated; the guard exposes whatever state the writer left behind.
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Acquires exclusive write access, recovering a poisoned lock.
    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` against the contents under the write lock.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.write())
    }

    /// Returns `true` if a writer panicked while holding the lock.
    pub fn is_poisoned(&self) -> bool {
        self.0.is_poisoned()
    }

    /// Returns `true` if both handles refer to the same instance.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Stable identity of the instance for as long as any handle is alive.
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.0).cast::<()>() as usize
    }

    pub(crate) fn inspect<R>(&self, f: impl FnOnce(&T) -> R) -> Inspected<R> {
        match self.0.read() {
            Ok(guard) => Inspected {
                value: f(&guard),
                poisoned: false,
            },
            Err(poisoned) => Inspected {
                value: f(&poisoned.into_inner()),
                poisoned: true,
            },
        }
    }
}

impl<T> Clone for Node<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

// Identity, not structural equality: two equal maps are still two instances.
impl<T> PartialEq for Node<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

// Never formats the contents, which may contain this node.
impl<T> fmt::Debug for Node<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({:#x})", self.identity())
    }
}

impl<T: Default> Default for Node<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
