use std::collections::{BTreeMap, BTreeSet};
use std::hash::Hash;

use refindex_common::{CellRangeReference, CellReference};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::{SmallVec, smallvec};

use crate::error::{IndexError, IndexResult};
use crate::store::Store;
use crate::watchers::{EventQueue, WatcherHandle, Watchers};

/// Values attached to one range, in insertion order, without duplicates.
/// Most selections carry one or two attachments.
type Values<V> = SmallVec<[V; 2]>;

/// Begin corner → end corner → node. The only owner of the values.
type BeginIndex<V> = BTreeMap<CellReference, BTreeMap<CellReference, RangeNode<V>>>;

/// End corner → begin corners, pointing back into [`BeginIndex`].
type EndIndex = BTreeMap<CellReference, BTreeSet<CellReference>>;

#[derive(Debug, Clone)]
struct RangeNode<V> {
    range: CellRangeReference,
    values: Values<V>,
}

/// Payload of value-added / value-removed notifications.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RangeValue<V> {
    pub range: CellRangeReference,
    pub value: V,
}

#[derive(Debug)]
enum RangeEvent<V> {
    Added(RangeValue<V>),
    Removed(RangeValue<V>),
    Deleted(CellRangeReference),
}

enum RangeEdit<V> {
    Add(V),
    Replace { old: V, new: V },
    Remove(V),
    Delete,
}

/// Outcome of planning an edit against the current sequence.
struct Plan<V> {
    next: Values<V>,
    added: Option<V>,
    removed: Values<V>,
}

/// Rectangular selections mapped to the values attached to them.
///
/// ## Layout
///
/// Two mirrored sorted indices hold every entry:
/// - `by_begin`: begin corner → (end corner → node)
/// - `by_end`:   end corner → begin corners
///
/// plus a reverse map from each value to the ranges holding it. All three
/// change together inside [`RangeIndex::apply`]; no other code path writes
/// them.
///
/// ## Containment
///
/// A range covers cell `C` when `begin <= C <= end` in the row-major cell
/// order (see [`CellRangeReference::spans`]). A stabbing query walks the
/// mirror whose relevant half is nearer to `C`: `by_begin` up to `C` or
/// `by_end` from `C`.
///
/// Scalar `save` is rejected: a range's value is a growable sequence, use
/// [`add_value`](RangeIndex::add_value) and
/// [`remove_value`](RangeIndex::remove_value).
#[derive(Debug)]
pub struct RangeIndex<V> {
    by_begin: BeginIndex<V>,
    by_end: EndIndex,
    value_ranges: FxHashMap<V, BTreeSet<CellRangeReference>>,
    len: usize,
    value_added: Watchers<Self, RangeValue<V>>,
    value_removed: Watchers<Self, RangeValue<V>>,
    deleted: Watchers<Self, CellRangeReference>,
    events: EventQueue<RangeEvent<V>>,
}

impl<V: Clone + Eq + Hash> Default for RangeIndex<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + Eq + Hash> RangeIndex<V> {
    pub fn new() -> Self {
        Self {
            by_begin: BTreeMap::new(),
            by_end: BTreeMap::new(),
            value_ranges: FxHashMap::default(),
            len: 0,
            value_added: Watchers::new(),
            value_removed: Watchers::new(),
            deleted: Watchers::new(),
            events: EventQueue::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append `value` to `range` unless it is already there. Returns whether
    /// anything changed.
    pub fn add_value(&mut self, range: CellRangeReference, value: V) -> bool {
        self.apply(range, RangeEdit::Add(value))
    }

    /// Swap `old` for `new` in place. Nothing happens when `old` is not
    /// attached to `range`. If `new` is already attached, `old` is dropped
    /// and `new` keeps its position.
    pub fn replace_value(&mut self, range: CellRangeReference, new: V, old: V) -> bool {
        self.apply(range, RangeEdit::Replace { old, new })
    }

    /// Detach `value`; the range entry goes away with its last value.
    pub fn remove_value(&mut self, range: CellRangeReference, value: &V) -> bool {
        self.apply(range, RangeEdit::Remove(value.clone()))
    }

    /// Every stored range covering `cell`.
    pub fn load_cell_reference_ranges(&self, cell: CellReference) -> BTreeSet<CellRangeReference> {
        self.covering(cell).into_iter().map(|node| node.range).collect()
    }

    /// Union of the values of every range covering `cell`.
    pub fn load_cell_reference_values(&self, cell: CellReference) -> FxHashSet<V> {
        self.covering(cell)
            .into_iter()
            .flat_map(|node| node.values.iter().cloned())
            .collect()
    }

    pub fn ranges_with_value(&self, value: &V) -> BTreeSet<CellRangeReference> {
        self.value_ranges.get(value).cloned().unwrap_or_default()
    }

    pub fn add_value_added_watcher(
        &mut self,
        watcher: impl FnMut(&mut Self, &RangeValue<V>) + Send + Sync + 'static,
    ) -> WatcherHandle {
        self.value_added.add(watcher)
    }

    pub fn add_value_removed_watcher(
        &mut self,
        watcher: impl FnMut(&mut Self, &RangeValue<V>) + Send + Sync + 'static,
    ) -> WatcherHandle {
        self.value_removed.add(watcher)
    }

    fn node(&self, range: &CellRangeReference) -> Option<&RangeNode<V>> {
        self.by_begin.get(&range.begin())?.get(&range.end())
    }

    fn nodes(&self) -> impl Iterator<Item = &RangeNode<V>> {
        self.by_begin.values().flat_map(|ends| ends.values())
    }

    fn covering(&self, cell: CellReference) -> Vec<&RangeNode<V>> {
        let (Some(first_begin), Some(last_end)) =
            (self.by_begin.keys().next(), self.by_end.keys().next_back())
        else {
            return Vec::new();
        };
        if cell < *first_begin || cell > *last_end {
            return Vec::new();
        }

        let below = cell.as_u64() - first_begin.as_u64();
        let above = last_end.as_u64() - cell.as_u64();
        if below <= above {
            self.by_begin
                .range(..=cell)
                .flat_map(|(_, ends)| ends.range(cell..).map(|(_, node)| node))
                .collect()
        } else {
            self.by_end
                .range(cell..)
                .flat_map(|(end, begins)| {
                    begins
                        .range(..=cell)
                        .filter_map(move |begin| self.by_begin.get(begin)?.get(end))
                })
                .collect()
        }
    }

    /// The single write path: plan the edit, then update both mirrors, the
    /// reverse index and the event queue together.
    fn apply(&mut self, range: CellRangeReference, edit: RangeEdit<V>) -> bool {
        let current = self.node(&range).map(|node| &node.values);
        let Some(plan) = plan(current, edit) else {
            return false;
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(
            range = %range,
            added = plan.added.is_some(),
            removed = plan.removed.len(),
            remaining = plan.next.len(),
            "range index edit"
        );

        let emptied = plan.next.is_empty();
        self.write(range, plan.next);

        for value in plan.removed {
            if let Some(ranges) = self.value_ranges.get_mut(&value) {
                ranges.remove(&range);
                if ranges.is_empty() {
                    self.value_ranges.remove(&value);
                }
            }
            self.events
                .push(RangeEvent::Removed(RangeValue { range, value }));
        }
        if let Some(value) = plan.added {
            self.value_ranges
                .entry(value.clone())
                .or_default()
                .insert(range);
            self.events.push(RangeEvent::Added(RangeValue { range, value }));
        }
        if emptied {
            self.events.push(RangeEvent::Deleted(range));
        }

        self.flush();
        true
    }

    fn write(&mut self, range: CellRangeReference, values: Values<V>) {
        let (begin, end) = (range.begin(), range.end());
        if values.is_empty() {
            self.detach(begin, end);
            return;
        }

        let ends = self.by_begin.entry(begin).or_default();
        match ends.get_mut(&end) {
            Some(node) => node.values = values,
            None => {
                ends.insert(end, RangeNode { range, values });
                self.by_end.entry(end).or_default().insert(begin);
                self.len += 1;
            }
        }
    }

    fn detach(&mut self, begin: CellReference, end: CellReference) {
        let Some(ends) = self.by_begin.get_mut(&begin) else {
            return;
        };
        if ends.remove(&end).is_none() {
            return;
        }
        if ends.is_empty() {
            self.by_begin.remove(&begin);
        }
        if let Some(begins) = self.by_end.get_mut(&end) {
            begins.remove(&begin);
            if begins.is_empty() {
                self.by_end.remove(&end);
            }
        }
        self.len -= 1;
    }

    fn flush(&mut self) {
        EventQueue::flush(self, Self::event_queue, Self::dispatch);
    }

    fn event_queue(index: &mut Self) -> &mut EventQueue<RangeEvent<V>> {
        &mut index.events
    }

    fn dispatch(index: &mut Self, event: RangeEvent<V>) {
        match event {
            RangeEvent::Added(added) => Watchers::deliver(index, Self::value_added_list, &added),
            RangeEvent::Removed(removed) => {
                Watchers::deliver(index, Self::value_removed_list, &removed)
            }
            RangeEvent::Deleted(range) => Watchers::deliver(index, Self::deleted_list, &range),
        }
    }

    fn value_added_list(index: &mut Self) -> &mut Watchers<Self, RangeValue<V>> {
        &mut index.value_added
    }

    fn value_removed_list(index: &mut Self) -> &mut Watchers<Self, RangeValue<V>> {
        &mut index.value_removed
    }

    fn deleted_list(index: &mut Self) -> &mut Watchers<Self, CellRangeReference> {
        &mut index.deleted
    }
}

fn plan<V: Clone + Eq>(current: Option<&Values<V>>, edit: RangeEdit<V>) -> Option<Plan<V>> {
    let position = |value: &V| current.and_then(|values| values.iter().position(|v| v == value));

    match edit {
        RangeEdit::Add(value) => {
            if position(&value).is_some() {
                return None;
            }
            let mut next = current.cloned().unwrap_or_default();
            next.push(value.clone());
            Some(Plan {
                next,
                added: Some(value),
                removed: SmallVec::new(),
            })
        }
        RangeEdit::Replace { old, new } => {
            if old == new {
                return None;
            }
            let at = position(&old)?;
            let mut next = current.cloned().unwrap_or_default();
            if position(&new).is_some() {
                next.remove(at);
                return Some(Plan {
                    next,
                    added: None,
                    removed: smallvec![old],
                });
            }
            next[at] = new.clone();
            Some(Plan {
                next,
                added: Some(new),
                removed: smallvec![old],
            })
        }
        RangeEdit::Remove(value) => {
            let at = position(&value)?;
            let mut next = current.cloned().unwrap_or_default();
            next.remove(at);
            Some(Plan {
                next,
                added: None,
                removed: smallvec![value],
            })
        }
        RangeEdit::Delete => {
            let removed = current.filter(|values| !values.is_empty())?.clone();
            Some(Plan {
                next: SmallVec::new(),
                added: None,
                removed,
            })
        }
    }
}

#[cfg(test)]
impl<V: Clone + Eq + Hash + std::fmt::Debug> RangeIndex<V> {
    /// Panics unless both mirrors and the reverse index agree.
    pub(crate) fn assert_consistent(&self) {
        let mut pairs = 0;
        for node in self.nodes() {
            assert!(!node.values.is_empty(), "empty node {}", node.range);
            assert!(
                self.by_end
                    .get(&node.range.end())
                    .is_some_and(|begins| begins.contains(&node.range.begin())),
                "{} missing from by_end",
                node.range
            );
            for value in &node.values {
                assert!(self.value_ranges[value].contains(&node.range));
                pairs += 1;
            }
        }
        assert_eq!(self.nodes().count(), self.len);
        let mirrored: usize = self.by_end.values().map(|begins| begins.len()).sum();
        assert_eq!(mirrored, self.len);
        assert!(self.by_begin.values().all(|ends| !ends.is_empty()));
        assert!(self.by_end.values().all(|begins| !begins.is_empty()));
        let indexed: usize = self.value_ranges.values().map(|ranges| ranges.len()).sum();
        assert_eq!(indexed, pairs);
    }
}

impl<V: Clone + Eq + Hash> Store for RangeIndex<V> {
    type Id = CellRangeReference;
    type Value = Vec<V>;

    fn load(&self, range: &CellRangeReference) -> Option<Vec<V>> {
        self.node(range).map(|node| node.values.to_vec())
    }

    fn save(&mut self, _value: Vec<V>) -> IndexResult<Vec<V>> {
        Err(unsupported("save"))
    }

    fn delete(&mut self, range: &CellRangeReference) {
        self.apply(*range, RangeEdit::Delete);
    }

    fn count(&self) -> usize {
        self.len
    }

    fn ids(&self, offset: usize, count: usize) -> Vec<CellRangeReference> {
        self.nodes()
            .skip(offset)
            .take(count)
            .map(|node| node.range)
            .collect()
    }

    fn values(&self, offset: usize, count: usize) -> Vec<Vec<V>> {
        self.nodes()
            .skip(offset)
            .take(count)
            .map(|node| node.values.to_vec())
            .collect()
    }

    fn between(&self, from: &CellRangeReference, to: &CellRangeReference) -> Vec<Vec<V>> {
        if from > to {
            return Vec::new();
        }
        self.by_begin
            .range(from.begin()..=to.begin())
            .flat_map(|(_, ends)| ends.values())
            .filter(|node| node.range >= *from && node.range <= *to)
            .map(|node| node.values.to_vec())
            .collect()
    }

    fn add_save_watcher(
        &mut self,
        _watcher: impl FnMut(&mut Self, &Vec<V>) + Send + Sync + 'static,
    ) -> IndexResult<WatcherHandle> {
        Err(unsupported("add_save_watcher"))
    }

    fn add_delete_watcher(
        &mut self,
        watcher: impl FnMut(&mut Self, &CellRangeReference) + Send + Sync + 'static,
    ) -> WatcherHandle {
        self.deleted.add(watcher)
    }

    fn remove_watcher(&mut self, handle: WatcherHandle) -> bool {
        self.value_added.remove(handle)
            || self.value_removed.remove(handle)
            || self.deleted.remove(handle)
    }
}

fn unsupported(operation: &'static str) -> IndexError {
    IndexError::Unsupported {
        store: "RangeIndex",
        operation,
        instead: "add_value/replace_value/remove_value",
    }
}
