//! Typed dataset handles and the lazy graph constructors.
//!
//! A [`Dataset<T>`] is a cheap, clonable reference to one node of the graph. Its
//! constructors wrap strongly typed closures into the erased callables stored on the
//! node, so every element crossing a node boundary goes through a checked downcast.
//! Nothing runs until an action is invoked on a [`Runtime`](crate::Runtime).

use crate::error::Result;
use crate::node::{FilterFn, JoinFn, MapFn, Node, PartitionFn, Transform, TransformKind};
use crate::node_id::NodeId;
use crate::partition::PartitionStore;
use crate::type_token::{Data, Element, TypeTag, downcast, erase};
use std::marker::PhantomData;
use std::sync::Arc;

pub struct Dataset<T> {
    node: Arc<Node>,
    _t: PhantomData<fn() -> T>,
}

impl<T> Clone for Dataset<T> {
    fn clone(&self) -> Self {
        Self {
            node: Arc::clone(&self.node),
            _t: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for Dataset<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&self.node, f)
    }
}

impl<T: Data> Dataset<T> {
    fn wrap(node: Arc<Node>) -> Self {
        Self { node, _t: PhantomData }
    }

    /// One partition per handle, each already materialized with the handle as its
    /// only element.
    ///
    /// A [`map`](Self::map) applied directly to this dataset drains each handle: the
    /// mapper is called on the same handle until it returns `None`.
    pub fn from_sources(handles: Vec<T>) -> Self {
        let partitions = handles
            .into_iter()
            .map(|h| PartitionStore::single(erase(h)))
            .collect();
        Self::wrap(Node::source(TypeTag::of::<T>(), partitions, true))
    }

    /// A materialized dataset over plain values, one partition per inner vector.
    ///
    /// Mappers over this dataset are ordinary per-element transforms.
    pub fn from_partitions(partitions: Vec<Vec<T>>) -> Self {
        let partitions = partitions
            .into_iter()
            .map(|p| p.into_iter().map(erase).collect())
            .collect();
        Self::wrap(Node::source(TypeTag::of::<T>(), partitions, false))
    }

    /// Transform each element; `None` drops it (or ends generation over a handle).
    pub fn map<O, F>(&self, f: F) -> Dataset<O>
    where
        O: Data,
        F: Fn(&T) -> Option<O> + Send + Sync + 'static,
    {
        let mapper: MapFn = Arc::new(move |e: &Element| -> Result<Option<Element>> {
            Ok(f(downcast::<T>(e)?).map(erase))
        });
        self.derive(Transform::Map(mapper), vec![Arc::clone(&self.node)], self.num_partitions())
    }

    /// Keep the elements for which `pred` holds.
    pub fn filter<F>(&self, pred: F) -> Dataset<T>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let keep: FilterFn = Arc::new(move |e: &Element| -> Result<bool> { Ok(pred(downcast::<T>(e)?)) });
        self.derive(Transform::Filter(keep), vec![Arc::clone(&self.node)], self.num_partitions())
    }

    /// [`filter`](Self::filter) with a context owned by the node.
    pub fn filter_with<C, F>(&self, pred: F, ctx: C) -> Dataset<T>
    where
        C: Send + Sync + 'static,
        F: Fn(&T, &C) -> bool + Send + Sync + 'static,
    {
        self.filter(move |t: &T| pred(t, &ctx))
    }

    /// Per-partition cross product: partition `p` pairs every element of this
    /// dataset's partition `p` with every element of `other`'s partition `p` and
    /// keeps the `Some` results.
    ///
    /// Both sides must have the same number of partitions; the output has this
    /// dataset's count.
    pub fn join<U, O, F>(&self, other: &Dataset<U>, f: F) -> Dataset<O>
    where
        U: Data,
        O: Data,
        F: Fn(&T, &U) -> Option<O> + Send + Sync + 'static,
    {
        let joiner: JoinFn = Arc::new(move |a: &Element, b: &Element| -> Result<Option<Element>> {
            Ok(f(downcast::<T>(a)?, downcast::<U>(b)?).map(erase))
        });
        self.derive(
            Transform::Join(joiner),
            vec![Arc::clone(&self.node), Arc::clone(&other.node)],
            self.num_partitions(),
        )
    }

    /// [`join`](Self::join) with a context owned by the node.
    pub fn join_with<U, O, C, F>(&self, other: &Dataset<U>, f: F, ctx: C) -> Dataset<O>
    where
        U: Data,
        O: Data,
        C: Send + Sync + 'static,
        F: Fn(&T, &U, &C) -> Option<O> + Send + Sync + 'static,
    {
        self.join(other, move |a: &T, b: &U| f(a, b, &ctx))
    }

    /// Redistribute elements into `num_partitions` partitions.
    ///
    /// `f(element, num_partitions)` must return an index below `num_partitions`;
    /// anything else fails the action with
    /// [`PartitionOutOfRange`](crate::EngineError::PartitionOutOfRange). Each output
    /// partition keeps the relative order in which elements are met, scanning input
    /// partitions in index order.
    pub fn partition_by<F>(&self, f: F, num_partitions: usize) -> Dataset<T>
    where
        F: Fn(&T, usize) -> usize + Send + Sync + 'static,
    {
        let route: PartitionFn =
            Arc::new(move |e: &Element, n: usize| -> Result<usize> { Ok(f(downcast::<T>(e)?, n)) });
        self.derive(Transform::PartitionBy(route), vec![Arc::clone(&self.node)], num_partitions)
    }

    /// [`partition_by`](Self::partition_by) with a context owned by the node.
    pub fn partition_by_with<C, F>(&self, f: F, num_partitions: usize, ctx: C) -> Dataset<T>
    where
        C: Send + Sync + 'static,
        F: Fn(&T, usize, &C) -> usize + Send + Sync + 'static,
    {
        self.partition_by(move |t: &T, n: usize| f(t, n, &ctx), num_partitions)
    }

    fn derive<O: Data>(&self, transform: Transform, deps: Vec<Arc<Node>>, partitions: usize) -> Dataset<O> {
        Dataset::wrap(Node::derived(transform, deps, partitions, TypeTag::of::<O>()))
    }
}

impl<T> Dataset<T> {
    pub fn id(&self) -> NodeId {
        self.node.id()
    }

    pub fn kind(&self) -> TransformKind {
        self.node.kind()
    }

    pub fn num_partitions(&self) -> usize {
        self.node.partition_count()
    }

    pub fn materialized_partitions(&self) -> usize {
        self.node.materialized_count()
    }

    pub fn is_materialized(&self) -> bool {
        self.node.is_materialized()
    }

    pub(crate) fn node(&self) -> &Arc<Node> {
        &self.node
    }
}
