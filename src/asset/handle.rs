use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Typed key into an [`AssetCache`](super::AssetCache). The numeric value is the
/// asset's resource id, which is what gets persisted in save data.
pub struct Handle<T> {
    id: u32,
    _marker: PhantomData<fn() -> T>,
}

// Manual impls so `T` needs none of these traits itself.
impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> PartialOrd for Handle<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Handle<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.id)
    }
}

impl<T> Handle<T> {
    pub(crate) fn new(id: u32) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    pub fn resource_id(self) -> u32 {
        self.id
    }

    pub(crate) fn index(self) -> usize {
        self.id as usize
    }
}
