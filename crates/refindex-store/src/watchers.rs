//! Change notification for the stores.
//!
//! A store owns one [`Watchers`] list per event kind and a single
//! [`EventQueue`]. Mutators push events onto the queue once both mirrors are
//! updated, then flush it. Watchers get `&mut` access to the store, so a
//! watcher may mutate the store it is watching. Events raised while a flush
//! is running are appended to the same queue and delivered after the current
//! event has reached every watcher, in registration order.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

/// Returned by every watcher registration; pass it back to the store's
/// `remove_watcher` to deregister. Handles are unique across lists and
/// stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatcherHandle(u64);

impl WatcherHandle {
    fn next() -> Self {
        Self(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed))
    }
}

type Callback<S, E> = Box<dyn FnMut(&mut S, &E) + Send + Sync>;

/// Registration-ordered callback list for one event kind of store `S`.
pub struct Watchers<S, E> {
    entries: Vec<(WatcherHandle, Callback<S, E>)>,
    /// Every live handle, including those whose callbacks are checked out
    /// for delivery.
    live: Vec<WatcherHandle>,
}

impl<S, E> Default for Watchers<S, E> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            live: Vec::new(),
        }
    }
}

impl<S, E> std::fmt::Debug for Watchers<S, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watchers")
            .field("live", &self.live)
            .finish()
    }
}

impl<S, E> Watchers<S, E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, callback: impl FnMut(&mut S, &E) + Send + Sync + 'static) -> WatcherHandle {
        let handle = WatcherHandle::next();
        self.entries.push((handle, Box::new(callback)));
        self.live.push(handle);
        handle
    }

    /// Deregister `handle`. Safe to call from inside a callback of this list;
    /// the removed callback is not invoked again.
    pub fn remove(&mut self, handle: WatcherHandle) -> bool {
        let Some(pos) = self.live.iter().position(|h| *h == handle) else {
            return false;
        };
        self.live.remove(pos);
        self.entries.retain(|(h, _)| *h != handle);
        true
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    fn is_live(&self, handle: WatcherHandle) -> bool {
        self.live.contains(&handle)
    }

    /// Deliver `event` to every watcher of the list `select` picks out of
    /// `store`.
    ///
    /// The callbacks are moved out of the store for the duration of the
    /// call so each one can borrow the store mutably. Watchers registered
    /// meanwhile land in the (now empty) list and are merged back after the
    /// existing ones, so they first see the next event. The callbacks are
    /// put back even when one of them panics.
    pub fn deliver(store: &mut S, select: fn(&mut S) -> &mut Watchers<S, E>, event: &E) {
        let checked_out = std::mem::take(&mut select(store).entries);
        let mut checkout = Checkout {
            store,
            select,
            checked_out,
        };
        for (handle, callback) in checkout.checked_out.iter_mut() {
            if (checkout.select)(checkout.store).is_live(*handle) {
                callback(checkout.store, event);
            }
        }
    }
}

/// Callbacks borrowed out of a [`Watchers`] list during delivery.
struct Checkout<'a, S, E> {
    store: &'a mut S,
    select: fn(&mut S) -> &mut Watchers<S, E>,
    checked_out: Vec<(WatcherHandle, Callback<S, E>)>,
}

impl<S, E> Drop for Checkout<'_, S, E> {
    fn drop(&mut self) {
        let list = (self.select)(self.store);
        let mut restored = std::mem::take(&mut self.checked_out);
        restored.append(&mut list.entries);
        restored.retain(|(handle, _)| list.live.contains(handle));
        list.entries = restored;
    }
}

/// Pending events of one store plus the re-entrancy guard around delivery.
#[derive(Debug)]
pub struct EventQueue<E> {
    pending: VecDeque<E>,
    flushing: bool,
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self {
            pending: VecDeque::new(),
            flushing: false,
        }
    }
}

impl<E> EventQueue<E> {
    pub fn push(&mut self, event: E) {
        self.pending.push_back(event);
    }

    /// Deliver queued events of `store` through `dispatch` until none are
    /// left.
    ///
    /// A call made while a flush further up the stack owns the queue returns
    /// at once; that flush delivers whatever was queued. If a watcher panics
    /// the queue is released and the events still pending are dropped, so
    /// later edits notify as usual.
    pub fn flush<S>(store: &mut S, queue: fn(&mut S) -> &mut EventQueue<E>, dispatch: fn(&mut S, E)) {
        if !queue(store).begin() {
            return;
        }
        let mut flushing = Flushing { store, queue };
        while let Some(event) = (flushing.queue)(flushing.store).next() {
            dispatch(flushing.store, event);
        }
    }

    fn begin(&mut self) -> bool {
        if self.flushing {
            return false;
        }
        self.flushing = true;
        true
    }

    fn next(&mut self) -> Option<E> {
        self.pending.pop_front()
    }

    fn end(&mut self) {
        self.pending.clear();
        self.flushing = false;
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Owns a store's queue for one flush; releases it on the way out.
struct Flushing<'a, S, E> {
    store: &'a mut S,
    queue: fn(&mut S) -> &mut EventQueue<E>,
}

impl<S, E> Drop for Flushing<'_, S, E> {
    fn drop(&mut self) {
        (self.queue)(self.store).end();
    }
}
