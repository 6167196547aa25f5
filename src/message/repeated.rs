use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use tracing::trace;

/// Read-only list storage owned by an immutable message.
///
/// Clones share the same allocation. An absent (`None`) list costs no
/// allocation.
pub struct FrozenList<T>(Option<Arc<Vec<T>>>);

impl<T> FrozenList<T> {
    pub fn empty() -> Self {
        FrozenList(None)
    }

    pub fn as_slice(&self) -> &[T] {
        match &self.0 {
            Some(items) => items.as_slice(),
            None => &[],
        }
    }

    /// True when both lists point at the same allocation.
    pub fn shares_storage_with(&self, other: &FrozenList<T>) -> bool {
        match (&self.0, &other.0) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl<T> Default for FrozenList<T> {
    fn default() -> Self {
        FrozenList::empty()
    }
}

impl<T> Clone for FrozenList<T> {
    fn clone(&self) -> Self {
        FrozenList(self.0.clone())
    }
}

impl<T> Deref for FrozenList<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T: PartialEq> PartialEq for FrozenList<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: fmt::Debug> fmt::Debug for FrozenList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

/// Builder-side storage for a repeated field, with copy-on-write.
///
/// Starts out sharing a `FrozenList`'s allocation (or none at all). The
/// first mutation copies the items into private storage and sets the
/// exclusive flag; `freeze` clears the flag again before handing the
/// storage to a message, so the next mutation copies once more.
pub struct RepeatedField<T> {
    storage: Option<Arc<Vec<T>>>,
    exclusive: bool,
}

impl<T: Clone> RepeatedField<T> {
    pub fn new() -> Self {
        RepeatedField {
            storage: None,
            exclusive: false,
        }
    }

    /// Shares `list`'s storage without copying.
    pub fn shared(list: &FrozenList<T>) -> Self {
        RepeatedField {
            storage: list.0.clone(),
            exclusive: false,
        }
    }

    pub fn is_exclusive(&self) -> bool {
        self.exclusive
    }

    pub fn as_slice(&self) -> &[T] {
        match &self.storage {
            Some(items) => items.as_slice(),
            None => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }

    /// Mutable access, copying shared storage first.
    pub fn make_mut(&mut self) -> &mut Vec<T> {
        if !self.exclusive {
            let copy = match &self.storage {
                Some(shared) => Vec::clone(shared),
                None => Vec::new(),
            };
            trace!(len = copy.len(), "repeated field: copying shared storage");
            self.storage = Some(Arc::new(copy));
            self.exclusive = true;
        }
        // Exclusive storage is never aliased, so this does not clone again.
        Arc::make_mut(self.storage.get_or_insert_with(|| Arc::new(Vec::new())))
    }

    pub fn push(&mut self, value: T) {
        self.make_mut().push(value);
    }

    pub fn extend<I: IntoIterator<Item = T>>(&mut self, values: I) {
        self.make_mut().extend(values);
    }

    /// Appends `other`'s items. Shares `other`'s storage when `self` is empty.
    pub fn append_frozen(&mut self, other: &FrozenList<T>) {
        if other.is_empty() {
            return;
        }
        if self.is_empty() {
            self.storage = other.0.clone();
            self.exclusive = false;
        } else {
            self.make_mut().extend_from_slice(other.as_slice());
        }
    }

    /// Drops the storage and returns to the shared (empty) state.
    pub fn clear(&mut self) {
        self.storage = None;
        self.exclusive = false;
    }

    /// Hands the current storage to a message as an immutable list.
    pub fn freeze(&mut self) -> FrozenList<T> {
        self.exclusive = false;
        FrozenList(self.storage.clone())
    }
}

impl<T: Clone> Default for RepeatedField<T> {
    fn default() -> Self {
        RepeatedField::new()
    }
}

impl<T> Clone for RepeatedField<T> {
    /// The clone shares storage, so neither side may keep the exclusive flag.
    fn clone(&self) -> Self {
        RepeatedField {
            storage: self.storage.clone(),
            exclusive: false,
        }
    }

    fn clone_from(&mut self, source: &Self) {
        *self = source.clone();
    }
}

impl<T: fmt::Debug> fmt::Debug for RepeatedField<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items: &[T] = match &self.storage {
            Some(items) => items.as_slice(),
            None => &[],
        };
        f.debug_struct("RepeatedField")
            .field("items", &items)
            .field("exclusive", &self.exclusive)
            .finish()
    }
}
