//! Handles are a data type which functionally are pointers without the actual
//! pointing part built into them. Every entity collection in a document is a
//! [`Storage<T>`] arena where the position of an entry is its identity, so a
//! handle is just a typed index that the resolution pass has already
//! bounds-checked.

use std::marker::PhantomData;

/// Typed index into a [`Storage<T>`] arena.
///
/// # Validity
/// Handles are only produced by the resolution pass of the document that owns
/// the arena, after checking the index against the collection bounds. A handle
/// presented to a storage it does not belong to may miss or alias another
/// entry; the query surface returns `Option` for that reason.
pub struct Handle<T> {
    /// Position in the owning `Storage<T>`.
    index: usize,

    // Phantom marker for type safety; `fn() -> T` keeps the handle
    // `Send + Sync + Copy` independent of `T`.
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub(crate) fn from_index(index: usize) -> Self {
        Self {
            index,
            _marker: PhantomData,
        }
    }

    /// Position of the referenced entry in its collection.
    pub fn index(&self) -> usize {
        self.index
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Handle<T> {}

impl<T> std::hash::Hash for Handle<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T> std::fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Handle<{}>({})", std::any::type_name::<T>(), self.index)
    }
}

/// Append-only arena of `T` where position = identity.
///
/// The document fills each storage once during resolution and never removes
/// from it afterwards, so lookups need no locking and handles never go stale.
pub struct Storage<T> {
    items: Vec<T>,
}

impl<T> Storage<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Transfer ownership of `data` to the storage, returning its handle.
    pub fn insert(&mut self, data: T) -> Handle<T> {
        let handle = Handle::from_index(self.items.len());
        self.items.push(data);
        handle
    }

    /// Gets the data underlying the handle.
    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        self.items.get(handle.index)
    }

    /// Bounds-checked promotion of a raw collection index to a handle.
    pub fn try_handle(&self, index: usize) -> Option<Handle<T>> {
        (index < self.items.len()).then(|| Handle::from_index(index))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Iterate over every handle in position order.
    pub fn handles(&self) -> impl Iterator<Item = Handle<T>> {
        (0..self.items.len()).map(Handle::from_index)
    }
}

impl<T> Default for Storage<T> {
    fn default() -> Self {
        Self::new()
    }
}
