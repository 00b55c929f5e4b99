use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use refindex_common::{CellReference, ExpressionReference, LabelName};
use rustc_hash::FxHashMap;

use crate::error::{IndexError, IndexResult};
use crate::store::Store;
use crate::watchers::{EventQueue, WatcherHandle, Watchers};

/// Key type of a [`ReferenceGraph`]: anything that can depend on cells.
pub trait ReferenceTarget: Clone + Ord + fmt::Display + fmt::Debug {
    /// Whether this target *is* `cell`, which would make an edge to it a
    /// self-reference.
    fn is_cell(&self, cell: &CellReference) -> bool;
}

impl ReferenceTarget for CellReference {
    fn is_cell(&self, cell: &CellReference) -> bool {
        self == cell
    }
}

impl ReferenceTarget for LabelName {
    fn is_cell(&self, _cell: &CellReference) -> bool {
        false
    }
}

impl ReferenceTarget for ExpressionReference {
    fn is_cell(&self, cell: &CellReference) -> bool {
        self.as_cell().as_ref() == Some(cell)
    }
}

/// One dependency edge: `target` reads `reference`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetAndReference<T> {
    target: T,
    reference: CellReference,
}

impl<T: ReferenceTarget> TargetAndReference<T> {
    pub fn new(target: T, reference: CellReference) -> IndexResult<Self> {
        check_edge(&target, &reference)?;
        Ok(Self { target, reference })
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn reference(&self) -> CellReference {
        self.reference
    }
}

impl<T: fmt::Display> fmt::Display for TargetAndReference<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.target, self.reference)
    }
}

fn check_edge<T: ReferenceTarget>(target: &T, reference: &CellReference) -> IndexResult<()> {
    if target.is_cell(reference) {
        return Err(IndexError::invalid_argument(format!(
            "target {target} cannot reference itself"
        )));
    }
    Ok(())
}

#[derive(Debug)]
enum GraphEvent<T> {
    Added(TargetAndReference<T>),
    Removed(TargetAndReference<T>),
    Deleted(T),
}

/// Bidirectional many-to-many edges between targets and the cells they
/// read.
///
/// `targets` maps a target to its references and `referrers` mirrors it from
/// each cell back to the targets reading it. Only [`ReferenceGraph::apply`]
/// writes either map, so an edge is always visible from both ends or from
/// neither. A target whose last edge goes is dropped and announced to the
/// delete watchers.
#[derive(Debug)]
pub struct ReferenceGraph<T> {
    targets: BTreeMap<T, BTreeSet<CellReference>>,
    referrers: FxHashMap<CellReference, BTreeSet<T>>,
    added: Watchers<Self, TargetAndReference<T>>,
    removed: Watchers<Self, TargetAndReference<T>>,
    deleted: Watchers<Self, T>,
    events: EventQueue<GraphEvent<T>>,
}

impl<T: ReferenceTarget> Default for ReferenceGraph<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ReferenceTarget> ReferenceGraph<T> {
    pub fn new() -> Self {
        Self {
            targets: BTreeMap::new(),
            referrers: FxHashMap::default(),
            added: Watchers::new(),
            removed: Watchers::new(),
            deleted: Watchers::new(),
            events: EventQueue::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Replace the references of `target` with `references`, touching only
    /// the edges that differ. An empty set drops the target.
    pub fn save_references(
        &mut self,
        target: T,
        references: impl IntoIterator<Item = CellReference>,
    ) -> IndexResult<()> {
        let wanted: BTreeSet<CellReference> = references.into_iter().collect();
        for reference in &wanted {
            check_edge(&target, reference)?;
        }

        let (add, remove): (Vec<CellReference>, Vec<CellReference>) =
            match self.targets.get(&target) {
                Some(current) => (
                    wanted.difference(current).copied().collect(),
                    current.difference(&wanted).copied().collect(),
                ),
                None => (wanted.into_iter().collect(), Vec::new()),
            };
        self.apply(&target, &add, &remove);
        Ok(())
    }

    /// Record one edge. Returns whether it was new.
    pub fn add_reference(&mut self, edge: TargetAndReference<T>) -> bool {
        let contains = self.contains(&edge);
        !contains && self.apply(&edge.target, &[edge.reference], &[])
    }

    /// Drop one edge. Returns whether it existed.
    pub fn remove_reference(&mut self, edge: &TargetAndReference<T>) -> bool {
        self.contains(edge) && self.apply(&edge.target, &[], &[edge.reference])
    }

    /// Targets currently reading `cell`.
    pub fn load_referred(&self, cell: CellReference) -> BTreeSet<T> {
        self.referrers.get(&cell).cloned().unwrap_or_default()
    }

    pub fn contains(&self, edge: &TargetAndReference<T>) -> bool {
        self.targets
            .get(&edge.target)
            .is_some_and(|references| references.contains(&edge.reference))
    }

    pub fn add_added_reference_watcher(
        &mut self,
        watcher: impl FnMut(&mut Self, &TargetAndReference<T>) + Send + Sync + 'static,
    ) -> WatcherHandle {
        self.added.add(watcher)
    }

    pub fn add_removed_reference_watcher(
        &mut self,
        watcher: impl FnMut(&mut Self, &TargetAndReference<T>) + Send + Sync + 'static,
    ) -> WatcherHandle {
        self.removed.add(watcher)
    }

    /// The single write path. Removals are applied before additions; a
    /// target left without references is deleted.
    fn apply(&mut self, target: &T, add: &[CellReference], remove: &[CellReference]) -> bool {
        if add.is_empty() && remove.is_empty() {
            return false;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            edge_target = %target,
            added = add.len(),
            removed = remove.len(),
            "reference graph edit"
        );

        for reference in remove {
            if let Some(references) = self.targets.get_mut(target) {
                references.remove(reference);
            }
            if let Some(referrers) = self.referrers.get_mut(reference) {
                referrers.remove(target);
                if referrers.is_empty() {
                    self.referrers.remove(reference);
                }
            }
            self.events.push(GraphEvent::Removed(TargetAndReference {
                target: target.clone(),
                reference: *reference,
            }));
        }

        for reference in add {
            self.targets
                .entry(target.clone())
                .or_default()
                .insert(*reference);
            self.referrers
                .entry(*reference)
                .or_default()
                .insert(target.clone());
            self.events.push(GraphEvent::Added(TargetAndReference {
                target: target.clone(),
                reference: *reference,
            }));
        }

        if self
            .targets
            .get(target)
            .is_some_and(|references| references.is_empty())
        {
            self.targets.remove(target);
            self.events.push(GraphEvent::Deleted(target.clone()));
        }

        self.flush();
        true
    }

    fn flush(&mut self) {
        EventQueue::flush(self, Self::event_queue, Self::dispatch);
    }

    fn event_queue(graph: &mut Self) -> &mut EventQueue<GraphEvent<T>> {
        &mut graph.events
    }

    fn dispatch(graph: &mut Self, event: GraphEvent<T>) {
        match event {
            GraphEvent::Added(edge) => Watchers::deliver(graph, Self::added_list, &edge),
            GraphEvent::Removed(edge) => Watchers::deliver(graph, Self::removed_list, &edge),
            GraphEvent::Deleted(target) => Watchers::deliver(graph, Self::deleted_list, &target),
        }
    }

    fn added_list(graph: &mut Self) -> &mut Watchers<Self, TargetAndReference<T>> {
        &mut graph.added
    }

    fn removed_list(graph: &mut Self) -> &mut Watchers<Self, TargetAndReference<T>> {
        &mut graph.removed
    }

    fn deleted_list(graph: &mut Self) -> &mut Watchers<Self, T> {
        &mut graph.deleted
    }
}

impl<T: ReferenceTarget> Store for ReferenceGraph<T> {
    type Id = T;
    type Value = BTreeSet<CellReference>;

    fn load(&self, target: &T) -> Option<BTreeSet<CellReference>> {
        self.targets.get(target).cloned()
    }

    fn save(&mut self, _value: BTreeSet<CellReference>) -> IndexResult<BTreeSet<CellReference>> {
        Err(unsupported("save"))
    }

    /// Sever every edge of `target`: one removed notification per edge, then
    /// one delete notification.
    fn delete(&mut self, target: &T) {
        let severed: Vec<CellReference> = match self.targets.get(target) {
            Some(references) => references.iter().copied().collect(),
            None => return,
        };
        self.apply(target, &[], &severed);
    }

    fn count(&self) -> usize {
        self.targets.len()
    }

    fn ids(&self, offset: usize, count: usize) -> Vec<T> {
        self.targets.keys().skip(offset).take(count).cloned().collect()
    }

    fn values(&self, offset: usize, count: usize) -> Vec<BTreeSet<CellReference>> {
        self.targets
            .values()
            .skip(offset)
            .take(count)
            .cloned()
            .collect()
    }

    fn between(&self, from: &T, to: &T) -> Vec<BTreeSet<CellReference>> {
        if from > to {
            return Vec::new();
        }
        self.targets
            .range(from.clone()..=to.clone())
            .map(|(_, references)| references.clone())
            .collect()
    }

    fn add_save_watcher(
        &mut self,
        _watcher: impl FnMut(&mut Self, &BTreeSet<CellReference>) + Send + Sync + 'static,
    ) -> IndexResult<WatcherHandle> {
        Err(unsupported("add_save_watcher"))
    }

    fn add_delete_watcher(
        &mut self,
        watcher: impl FnMut(&mut Self, &T) + Send + Sync + 'static,
    ) -> WatcherHandle {
        self.deleted.add(watcher)
    }

    fn remove_watcher(&mut self, handle: WatcherHandle) -> bool {
        self.added.remove(handle) || self.removed.remove(handle) || self.deleted.remove(handle)
    }
}

#[cfg(test)]
impl<T: ReferenceTarget> ReferenceGraph<T> {
    /// Panics unless every edge is visible from both ends.
    pub(crate) fn assert_consistent(&self) {
        let mut edges = 0;
        for (target, references) in &self.targets {
            assert!(!references.is_empty(), "target {target} kept without edges");
            for reference in references {
                assert!(self.referrers[reference].contains(target));
                edges += 1;
            }
        }
        let mirrored: usize = self.referrers.values().map(|targets| targets.len()).sum();
        assert_eq!(edges, mirrored);
        assert!(self.referrers.values().all(|targets| !targets.is_empty()));
    }
}

fn unsupported(operation: &'static str) -> IndexError {
    IndexError::Unsupported {
        store: "ReferenceGraph",
        operation,
        instead: "save_references/add_reference/remove_reference",
    }
}
