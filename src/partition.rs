//! Append-only partition storage.
//!
//! A [`PartitionStore`] is filled by exactly one task and then frozen behind an
//! `Arc` in its node's slot. Readers walk it with [`PartitionStore::iter`], which
//! can be restarted as often as needed (the join kernel rescans the right side once
//! per left element).

use crate::type_token::{Data, Element, downcast};
use crate::error::Result;

#[derive(Clone, Default)]
pub struct PartitionStore {
    items: Vec<Element>,
}

impl PartitionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding exactly one element (used for source handles).
    pub fn single(element: Element) -> Self {
        Self { items: vec![element] }
    }

    pub fn push(&mut self, element: Element) {
        self.items.push(element);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Forward iterator in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Element> {
        self.items.iter()
    }

    /// Typed view of every element; fails on the first element of another type.
    pub fn typed<T: Data>(&self) -> impl Iterator<Item = Result<&T>> {
        self.items.iter().map(downcast::<T>)
    }
}

impl std::fmt::Debug for PartitionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartitionStore").field("len", &self.items.len()).finish()
    }
}

impl<'a> IntoIterator for &'a PartitionStore {
    type Item = &'a Element;
    type IntoIter = std::slice::Iter<'a, Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<Element> for PartitionStore {
    fn from_iter<I: IntoIterator<Item = Element>>(iter: I) -> Self {
        Self { items: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::type_token::erase;

    #[test]
    fn iteration_is_restartable_and_ordered() {
        let store: PartitionStore = (1..=3).map(erase::<i32>).collect();
        for _ in 0..2 {
            let seen: Vec<i32> = store.typed::<i32>().map(|v| *v.unwrap()).collect();
            assert_eq!(seen, vec![1, 2, 3]);
        }
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn empty_and_single() {
        assert!(PartitionStore::new().is_empty());
        let one = PartitionStore::single(erase("handle"));
        assert_eq!(one.len(), 1);
    }
}
