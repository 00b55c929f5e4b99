use std::sync::Arc;

use parking_lot::RwLock;

/// A store behind one coarse lock, cheap to clone and hand across threads.
///
/// Every closure runs with the lock held for its whole duration, so a
/// caller never sees one mirror updated without the other. Watchers run
/// inside the write closure and must not call back into the same `Shared`.
pub struct Shared<S> {
    inner: Arc<RwLock<S>>,
}

impl<S> Clone for Shared<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Default> Default for Shared<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S> Shared<S> {
    pub fn new(store: S) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        let guard = self.inner.read();
        f(&*guard)
    }

    pub fn write<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let mut guard = self.inner.write();
        f(&mut *guard)
    }

    /// The store itself, if this is the last handle to it.
    pub fn into_inner(self) -> Result<S, Self> {
        Arc::try_unwrap(self.inner)
            .map(RwLock::into_inner)
            .map_err(|inner| Self { inner })
    }
}

impl<S: std::fmt::Debug> std::fmt::Debug for Shared<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Shared").field(&*self.inner.read()).finish()
    }
}
