//! Type tags and type-erased element helpers.
//!
//! This module provides:
//! - [`Element`]: the shared, type-erased value stored in partitions. Filter and
//!   PartitionBy stages pass the producer's `Arc` through untouched; Map and Join
//!   stages allocate new elements.
//! - [`TypeTag`]: a lightweight runtime type identifier attached to every node, so
//!   the runtime can name element types in errors and logs without a generic
//!   parameter.
//! - [`downcast`]: the checked conversion typed callables go through. It returns
//!   [`EngineError::TypeMismatch`] instead of panicking when the dynamic type does
//!   not match.

use crate::error::{EngineError, Result};
use std::any::{Any, TypeId, type_name};
use std::sync::Arc;

/// A single dataset element as stored by the runtime.
pub type Element = Arc<dyn Any + Send + Sync>;

/// Marker for values that can live in a dataset.
pub trait Data: Any + Send + Sync {}
impl<T> Data for T where T: Any + Send + Sync {}

/// A lightweight runtime type tag for debugging and assertions.
///
/// ```
/// use ironrdd::type_token::TypeTag;
/// let tag = TypeTag::of::<u32>();
/// assert_eq!(tag.name, "u32");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TypeTag {
    /// Stable Rust type identifier.
    pub id: TypeId,
    /// Human-readable type name (best-effort).
    pub name: &'static str,
}

impl TypeTag {
    /// Construct a tag for `T`.
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }
}

/// Box a value as an [`Element`].
pub fn erase<T: Data>(value: T) -> Element {
    Arc::new(value)
}

/// Borrow the concrete value behind an [`Element`].
pub fn downcast<T: Data>(element: &Element) -> Result<&T> {
    element
        .downcast_ref::<T>()
        .ok_or(EngineError::TypeMismatch { expected: type_name::<T>() })
}
