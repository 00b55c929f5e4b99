use std::fmt;

use crate::error::{IndexError, IndexResult};
use crate::watchers::WatcherHandle;

/// Record-store contract shared by every index in this crate.
///
/// Paging (`ids`, `values`) is offset based over the store's id order;
/// `between` takes inclusive id bounds and returns nothing when `from > to`.
pub trait Store: Sized {
    type Id: Clone + Ord + fmt::Display;
    type Value: Clone;

    fn load(&self, id: &Self::Id) -> Option<Self::Value>;

    fn load_or_fail(&self, id: &Self::Id) -> IndexResult<Self::Value> {
        self.load(id).ok_or_else(|| IndexError::not_found(id))
    }

    /// Store `value`, firing save watchers. Multi-value stores reject this.
    fn save(&mut self, value: Self::Value) -> IndexResult<Self::Value>;

    /// Remove `id` if present, firing delete watchers when something went.
    fn delete(&mut self, id: &Self::Id);

    fn count(&self) -> usize;

    fn ids(&self, offset: usize, count: usize) -> Vec<Self::Id>;

    fn values(&self, offset: usize, count: usize) -> Vec<Self::Value>;

    fn between(&self, from: &Self::Id, to: &Self::Id) -> Vec<Self::Value>;

    fn add_save_watcher(
        &mut self,
        watcher: impl FnMut(&mut Self, &Self::Value) + Send + Sync + 'static,
    ) -> IndexResult<WatcherHandle>;

    fn add_delete_watcher(
        &mut self,
        watcher: impl FnMut(&mut Self, &Self::Id) + Send + Sync + 'static,
    ) -> WatcherHandle;

    /// Deregister a watcher from whichever list holds it.
    fn remove_watcher(&mut self, handle: WatcherHandle) -> bool;
}
