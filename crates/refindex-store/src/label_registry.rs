use std::collections::{BTreeMap, BTreeSet};

use refindex_common::{CellReference, ExpressionReference, LabelMapping, LabelName};

use crate::config::IndexConfig;
use crate::error::{IndexError, IndexResult};
use crate::store::Store;
use crate::watchers::{EventQueue, WatcherHandle, Watchers};

#[derive(Debug)]
enum LabelEvent {
    Saved(LabelMapping),
    Deleted(LabelName),
}

/// Named references: each label maps to a cell, a range or another label.
///
/// Entries are keyed by [`CaseSensitivity::key`](crate::CaseSensitivity::key)
/// of the label name, so iteration and paging follow that key.
#[derive(Debug)]
pub struct LabelRegistry {
    config: IndexConfig,
    mappings: BTreeMap<String, LabelMapping>,
    saved: Watchers<Self, LabelMapping>,
    deleted: Watchers<Self, LabelName>,
    events: EventQueue<LabelEvent>,
}

impl Default for LabelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl LabelRegistry {
    pub fn new() -> Self {
        Self::with_config(IndexConfig::default())
    }

    pub fn with_config(config: IndexConfig) -> Self {
        Self {
            config,
            mappings: BTreeMap::new(),
            saved: Watchers::new(),
            deleted: Watchers::new(),
            events: EventQueue::default(),
        }
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    fn key(&self, label: &LabelName) -> String {
        self.config.label_case.key(label.as_str())
    }

    /// Follow `label` through label-to-label links to the cell or range it
    /// finally names. `Ok(None)` when a link along the way is unmapped.
    pub fn resolve(&self, label: &LabelName) -> IndexResult<Option<ExpressionReference>> {
        #[cfg(feature = "tracing")]
        let _span = tracing::trace_span!("resolve_label", label = %label).entered();

        self.walk(label, label, 0)
    }

    fn walk(
        &self,
        origin: &LabelName,
        label: &LabelName,
        depth: usize,
    ) -> IndexResult<Option<ExpressionReference>> {
        if let Some(limit) = self.config.max_label_chain
            && depth >= limit
        {
            return Err(IndexError::LabelChainTooDeep {
                label: origin.to_string(),
                limit,
            });
        }

        let Some(mapping) = self.mappings.get(&self.key(label)) else {
            return Ok(None);
        };
        match mapping.reference() {
            ExpressionReference::Label(next) => self.walk(origin, next, depth + 1),
            concrete => Ok(Some(concrete.clone())),
        }
    }

    /// The cell `label` stands for; a range stands for its `begin` corner.
    pub fn cell_reference_or_fail(&self, label: &LabelName) -> IndexResult<CellReference> {
        self.cell_reference(label)?
            .ok_or_else(|| IndexError::not_found(label))
    }

    pub fn cell_reference(&self, label: &LabelName) -> IndexResult<Option<CellReference>> {
        Ok(self
            .resolve(label)?
            .and_then(|reference| reference.to_cell()))
    }

    /// The terminal cell or range of `label`'s chain. Empty when the chain
    /// is broken or runs past the configured depth.
    pub fn load_cell_references_or_ranges(&self, label: &LabelName) -> BTreeSet<ExpressionReference> {
        match self.resolve(label) {
            Ok(Some(reference)) => BTreeSet::from([reference]),
            _ => BTreeSet::new(),
        }
    }

    /// Every label whose chain ends at `cell`, or at a range starting there.
    pub fn labels(&self, cell: CellReference) -> BTreeSet<LabelName> {
        self.mappings
            .values()
            .map(LabelMapping::label)
            .filter(|label| {
                matches!(self.cell_reference(label), Ok(Some(found)) if found == cell)
            })
            .cloned()
            .collect()
    }

    /// Up to `count` mappings whose names resemble `text`.
    ///
    /// An exact (per case policy) match comes first and, for `count == 1`,
    /// alone. The rest are names containing `text` case-insensitively, in key
    /// order, skipping names as long as `text` itself.
    pub fn find_similar(&self, text: &str, count: usize) -> Vec<LabelMapping> {
        if text.is_empty() || count == 0 {
            return Vec::new();
        }

        let exact = LabelName::new(text)
            .ok()
            .and_then(|name| self.mappings.get(&self.key(&name)))
            .cloned();
        if count == 1
            && let Some(exact) = exact
        {
            return vec![exact];
        }

        let needle = text.to_lowercase();
        let text_len = text.chars().count();
        let mut found: Vec<LabelMapping> = exact.into_iter().collect();
        for mapping in self.mappings.values() {
            if found.len() >= count {
                break;
            }
            let name = mapping.label();
            if name.len() == text_len || found.contains(mapping) {
                continue;
            }
            if name.folded().contains(&needle) {
                found.push(mapping.clone());
            }
        }
        found
    }

    fn flush(&mut self) {
        EventQueue::flush(self, Self::event_queue, Self::dispatch);
    }

    fn event_queue(registry: &mut Self) -> &mut EventQueue<LabelEvent> {
        &mut registry.events
    }

    fn dispatch(registry: &mut Self, event: LabelEvent) {
        match event {
            LabelEvent::Saved(mapping) => Watchers::deliver(registry, Self::saved_list, &mapping),
            LabelEvent::Deleted(label) => Watchers::deliver(registry, Self::deleted_list, &label),
        }
    }

    fn saved_list(registry: &mut Self) -> &mut Watchers<Self, LabelMapping> {
        &mut registry.saved
    }

    fn deleted_list(registry: &mut Self) -> &mut Watchers<Self, LabelName> {
        &mut registry.deleted
    }
}

impl Store for LabelRegistry {
    type Id = LabelName;
    type Value = LabelMapping;

    fn load(&self, label: &LabelName) -> Option<LabelMapping> {
        self.mappings.get(&self.key(label)).cloned()
    }

    /// Insert or replace the mapping for its label. Under the insensitive
    /// policy a mapping onto a differently-cased spelling of its own name is
    /// still a self-reference.
    fn save(&mut self, mapping: LabelMapping) -> IndexResult<LabelMapping> {
        let key = self.key(mapping.label());
        if let ExpressionReference::Label(target) = mapping.reference()
            && self.key(target) == key
        {
            return Err(IndexError::invalid_argument(format!(
                "label {} cannot name itself",
                mapping.label()
            )));
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(mapping = %mapping, "label saved");

        self.mappings.insert(key, mapping.clone());
        self.events.push(LabelEvent::Saved(mapping.clone()));
        self.flush();
        Ok(mapping)
    }

    fn delete(&mut self, label: &LabelName) {
        let Some(removed) = self.mappings.remove(&self.key(label)) else {
            return;
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(label = %removed.label(), "label deleted");

        let (label, _) = removed.into_parts();
        self.events.push(LabelEvent::Deleted(label));
        self.flush();
    }

    fn count(&self) -> usize {
        self.mappings.len()
    }

    fn ids(&self, offset: usize, count: usize) -> Vec<LabelName> {
        self.mappings
            .values()
            .skip(offset)
            .take(count)
            .map(|mapping| mapping.label().clone())
            .collect()
    }

    fn values(&self, offset: usize, count: usize) -> Vec<LabelMapping> {
        self.mappings
            .values()
            .skip(offset)
            .take(count)
            .cloned()
            .collect()
    }

    fn between(&self, from: &LabelName, to: &LabelName) -> Vec<LabelMapping> {
        let (from, to) = (self.key(from), self.key(to));
        if from > to {
            return Vec::new();
        }
        self.mappings.range(from..=to).map(|(_, m)| m.clone()).collect()
    }

    fn add_save_watcher(
        &mut self,
        watcher: impl FnMut(&mut Self, &LabelMapping) + Send + Sync + 'static,
    ) -> IndexResult<WatcherHandle> {
        Ok(self.saved.add(watcher))
    }

    fn add_delete_watcher(
        &mut self,
        watcher: impl FnMut(&mut Self, &LabelName) + Send + Sync + 'static,
    ) -> WatcherHandle {
        self.deleted.add(watcher)
    }

    fn remove_watcher(&mut self, handle: WatcherHandle) -> bool {
        self.saved.remove(handle) || self.deleted.remove(handle)
    }
}
