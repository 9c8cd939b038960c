use crate::error::{EngineError, Result};
use crate::node_id::NodeId;
use crate::partition::PartitionStore;
use crate::type_token::{Element, TypeTag};
use crate::utils::lock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex};

/// Erased mapper. `Ok(None)` ends generation over a source handle and drops the
/// element everywhere else.
pub type MapFn = Arc<dyn Fn(&Element) -> Result<Option<Element>> + Send + Sync>;
/// Erased filter predicate (context already bound).
pub type FilterFn = Arc<dyn Fn(&Element) -> Result<bool> + Send + Sync>;
/// Erased joiner; `Ok(None)` means "no match".
pub type JoinFn = Arc<dyn Fn(&Element, &Element) -> Result<Option<Element>> + Send + Sync>;
/// Erased partitioner: `(element, num_partitions) -> index`.
pub type PartitionFn = Arc<dyn Fn(&Element, usize) -> Result<usize> + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransformKind {
    Map,
    Filter,
    Join,
    PartitionBy,
    Source,
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransformKind::Map => "Map",
            TransformKind::Filter => "Filter",
            TransformKind::Join => "Join",
            TransformKind::PartitionBy => "PartitionBy",
            TransformKind::Source => "Source",
        };
        f.write_str(name)
    }
}

#[derive(Clone)]
pub enum Transform {
    /// Partitions are supplied at construction. With `handles` set, each partition
    /// holds one drainable handle and a Map over it runs as a generator.
    Source { handles: bool },
    Map(MapFn),
    Filter(FilterFn),
    /// Per-partition cross product of two identically partitioned inputs.
    Join(JoinFn),
    /// Reads every dependency partition and keeps the elements routed to its own index.
    PartitionBy(PartitionFn),
}

impl Transform {
    pub fn kind(&self) -> TransformKind {
        match self {
            Transform::Source { .. } => TransformKind::Source,
            Transform::Map(_) => TransformKind::Map,
            Transform::Filter(_) => TransformKind::Filter,
            Transform::Join(_) => TransformKind::Join,
            Transform::PartitionBy(_) => TransformKind::PartitionBy,
        }
    }
}

struct NodeState {
    slots: Vec<Option<Arc<PartitionStore>>>,
    materialized: usize,
}

/// One lazy stage of a dataset graph.
///
/// Each slot is written once, under the node's own lock, by the single task that
/// owns that partition. Dependents only ever see a slot as empty or as a complete
/// frozen [`PartitionStore`].
pub struct Node {
    id: NodeId,
    transform: Transform,
    deps: Vec<Arc<Node>>,
    partition_count: usize,
    elem: TypeTag,
    state: Mutex<NodeState>,
}

impl Node {
    /// A node whose partitions already exist.
    pub(crate) fn source(elem: TypeTag, partitions: Vec<PartitionStore>, handles: bool) -> Arc<Node> {
        let partition_count = partitions.len();
        let slots = partitions.into_iter().map(|p| Some(Arc::new(p))).collect();
        Arc::new(Node {
            id: NodeId::next(),
            transform: Transform::Source { handles },
            deps: Vec::new(),
            partition_count,
            elem,
            state: Mutex::new(NodeState {
                slots,
                materialized: partition_count,
            }),
        })
    }

    /// A lazy node; no partition is computed here.
    pub(crate) fn derived(
        transform: Transform,
        deps: Vec<Arc<Node>>,
        partition_count: usize,
        elem: TypeTag,
    ) -> Arc<Node> {
        debug_assert!(!deps.is_empty() && deps.len() <= 2);
        Arc::new(Node {
            id: NodeId::next(),
            transform,
            deps,
            partition_count,
            elem,
            state: Mutex::new(NodeState {
                slots: vec![None; partition_count],
                materialized: 0,
            }),
        })
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> TransformKind {
        self.transform.kind()
    }

    pub fn deps(&self) -> &[Arc<Node>] {
        &self.deps
    }

    pub fn partition_count(&self) -> usize {
        self.partition_count
    }

    pub fn element_type(&self) -> TypeTag {
        self.elem
    }

    pub fn materialized_count(&self) -> usize {
        lock(&self.state).materialized
    }

    pub fn is_materialized(&self) -> bool {
        lock(&self.state).materialized == self.partition_count
    }

    pub fn has_partition(&self, p: usize) -> bool {
        lock(&self.state).slots.get(p).is_some_and(Option::is_some)
    }

    /// Indices of slots that have not been written yet.
    pub(crate) fn empty_slots(&self) -> Vec<usize> {
        let state = lock(&self.state);
        state
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_none())
            .map(|(i, _)| i)
            .collect()
    }

    /// Whether this is a source of drainable handles.
    pub fn drains_handles(&self) -> bool {
        matches!(self.transform, Transform::Source { handles: true })
    }

    pub fn partition(&self, p: usize) -> Option<Arc<PartitionStore>> {
        lock(&self.state).slots.get(p).cloned().flatten()
    }

    fn require_partition(&self, p: usize) -> Result<Arc<PartitionStore>> {
        self.partition(p).ok_or(EngineError::MissingPartition {
            node: self.id,
            partition: p,
        })
    }

    /// Every partition in index order. Fails if any slot is still empty.
    pub fn partitions(&self) -> Result<Vec<Arc<PartitionStore>>> {
        let state = lock(&self.state);
        state
            .slots
            .iter()
            .enumerate()
            .map(|(i, slot)| {
                slot.clone().ok_or(EngineError::MissingPartition {
                    node: self.id,
                    partition: i,
                })
            })
            .collect()
    }

    /// Whether the task for partition `p` can run now.
    ///
    /// Map and Filter only need the matching dependency partition; PartitionBy and
    /// Join need their dependencies complete. Counters only grow, so once this
    /// returns true it stays true.
    pub fn is_ready(&self, p: usize) -> bool {
        match &self.transform {
            Transform::Source { .. } => true,
            Transform::Map(_) | Transform::Filter(_) => self.deps[0].has_partition(p),
            Transform::PartitionBy(_) => self.deps[0].is_materialized(),
            Transform::Join(_) => self.deps.iter().all(|d| d.is_materialized()),
        }
    }

    /// Run this node's transform for partition `p`.
    ///
    /// Only reads dependency partitions; nothing is written to `self`.
    pub fn compute_partition(&self, p: usize) -> Result<PartitionStore> {
        let mut out = PartitionStore::new();
        match &self.transform {
            Transform::Source { .. } => {
                return Err(EngineError::AlreadyMaterialized {
                    node: self.id,
                    partition: p,
                });
            }
            Transform::Map(f) => {
                let dep = &self.deps[0];
                let input = dep.require_partition(p)?;
                if dep.drains_handles() {
                    for handle in input.iter() {
                        while let Some(e) = f(handle)? {
                            out.push(e);
                        }
                    }
                } else {
                    for e in input.iter() {
                        if let Some(mapped) = f(e)? {
                            out.push(mapped);
                        }
                    }
                }
            }
            Transform::Filter(keep) => {
                let input = self.deps[0].require_partition(p)?;
                for e in input.iter() {
                    if keep(e)? {
                        out.push(Arc::clone(e));
                    }
                }
            }
            Transform::Join(join) => {
                let left = self.deps[0].require_partition(p)?;
                let right = self.deps[1].require_partition(p)?;
                for a in left.iter() {
                    for b in right.iter() {
                        if let Some(joined) = join(a, b)? {
                            out.push(joined);
                        }
                    }
                }
            }
            Transform::PartitionBy(route) => {
                let n = self.partition_count;
                for input in self.deps[0].partitions()? {
                    for e in input.iter() {
                        let index = route(e, n)?;
                        if index >= n {
                            return Err(EngineError::PartitionOutOfRange {
                                index,
                                num_partitions: n,
                            });
                        }
                        if index == p {
                            out.push(Arc::clone(e));
                        }
                    }
                }
            }
        }
        Ok(out)
    }

    /// Write partition `p` and bump the materialized counter.
    ///
    /// Returns true for the one write that completes the node.
    pub fn store_partition(&self, p: usize, store: PartitionStore) -> Result<bool> {
        let mut state = lock(&self.state);
        let slot = state.slots.get_mut(p).ok_or(EngineError::MissingPartition {
            node: self.id,
            partition: p,
        })?;
        if slot.is_some() {
            return Err(EngineError::AlreadyMaterialized {
                node: self.id,
                partition: p,
            });
        }
        *slot = Some(Arc::new(store));
        state.materialized += 1;
        Ok(state.materialized == self.partition_count)
    }
}

impl Drop for Node {
    /// Unlink dependencies one level at a time so a long chain is not freed by
    /// recursion.
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.deps);
        while let Some(dep) = pending.pop() {
            if let Some(mut node) = Arc::into_inner(dep) {
                pending.append(&mut node.deps);
            }
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .field("elem", &self.elem.name)
            .field("deps", &self.deps.iter().map(|d| d.id).collect::<Vec<_>>())
            .field("partitions", &self.partition_count)
            .field("materialized", &self.materialized_count())
            .finish()
    }
}
