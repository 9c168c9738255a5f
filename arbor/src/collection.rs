//! Item collections consumed by the virtualized controls.
//!
//! Items are type-erased (`Rc<dyn Any>`) so one list or tree can hold
//! heterogeneous payloads. `ObservableCollection` records a revision per
//! mutation; controls poll it at measure time instead of holding callbacks.

use std::any::Any;
use std::cell::{Ref, RefCell};
use std::rc::Rc;

/// A type-erased, shared data item.
pub type Item = Rc<dyn Any>;

/// Wrap a value as an `Item`.
pub fn item<T: Any>(value: T) -> Item {
    Rc::new(value)
}

/// Identity of an item, stable for as long as the item is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemKey(usize);

impl ItemKey {
    pub fn of(item: &Item) -> Self {
        Self(Rc::as_ptr(item) as *const () as usize)
    }
}

/// A change reported by an observable collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionChange {
    Insert { index: usize, count: usize },
    Remove { index: usize, count: usize },
    Reset,
}

#[derive(Default)]
struct CollectionInner {
    items: Vec<Item>,
    revision: u64,
    last_change: Option<CollectionChange>,
}

/// A shared, mutable item vector with change tracking.
///
/// Clones share the same storage, so the data layer keeps one handle and
/// hands another to an `ItemsList`.
#[derive(Clone, Default)]
pub struct ObservableCollection {
    inner: Rc<RefCell<CollectionInner>>,
}

impl ObservableCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: Vec<Item>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(CollectionInner {
                items,
                revision: 0,
                last_change: None,
            })),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Item> {
        self.inner.borrow().items.get(index).cloned()
    }

    /// Borrow the current items.
    pub fn items(&self) -> Ref<'_, Vec<Item>> {
        Ref::map(self.inner.borrow(), |inner| &inner.items)
    }

    /// Revision counter, bumped on every mutation.
    pub fn revision(&self) -> u64 {
        self.inner.borrow().revision
    }

    /// The most recent change, if any mutation happened.
    pub fn last_change(&self) -> Option<CollectionChange> {
        self.inner.borrow().last_change
    }

    pub fn push(&self, item: Item) {
        let mut inner = self.inner.borrow_mut();
        let index = inner.items.len();
        inner.items.push(item);
        Self::record(&mut inner, CollectionChange::Insert { index, count: 1 });
    }

    /// Insert at `index`, clamped to the current length.
    pub fn insert(&self, index: usize, item: Item) {
        let mut inner = self.inner.borrow_mut();
        let index = index.min(inner.items.len());
        inner.items.insert(index, item);
        Self::record(&mut inner, CollectionChange::Insert { index, count: 1 });
    }

    /// Remove the item at `index`. Out-of-range indices are ignored.
    pub fn remove(&self, index: usize) -> Option<Item> {
        let mut inner = self.inner.borrow_mut();
        if index >= inner.items.len() {
            return None;
        }
        let removed = inner.items.remove(index);
        Self::record(&mut inner, CollectionChange::Remove { index, count: 1 });
        Some(removed)
    }

    /// Replace the whole contents.
    pub fn reset(&self, items: Vec<Item>) {
        let mut inner = self.inner.borrow_mut();
        inner.items = items;
        Self::record(&mut inner, CollectionChange::Reset);
    }

    pub fn clear(&self) {
        self.reset(Vec::new());
    }

    fn record(inner: &mut CollectionInner, change: CollectionChange) {
        inner.revision += 1;
        inner.last_change = Some(change);
    }
}

impl std::fmt::Debug for ObservableCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("ObservableCollection")
            .field("len", &inner.items.len())
            .field("revision", &inner.revision)
            .finish()
    }
}

/// Backing store of an `ItemsList`.
#[derive(Clone, Debug)]
pub enum ItemsSource {
    /// A fixed vector. Changes must be reported explicitly.
    Static(Rc<Vec<Item>>),
    /// A shared collection whose revision is polled each pass.
    Observable(ObservableCollection),
}

impl Default for ItemsSource {
    fn default() -> Self {
        ItemsSource::Static(Rc::new(Vec::new()))
    }
}

impl ItemsSource {
    pub fn len(&self) -> usize {
        match self {
            ItemsSource::Static(items) => items.len(),
            ItemsSource::Observable(c) => c.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<Item> {
        match self {
            ItemsSource::Static(items) => items.get(index).cloned(),
            ItemsSource::Observable(c) => c.get(index),
        }
    }

    /// Revision of the source; static sources never change on their own.
    pub fn revision(&self) -> u64 {
        match self {
            ItemsSource::Static(_) => 0,
            ItemsSource::Observable(c) => c.revision(),
        }
    }

    pub fn last_change(&self) -> Option<CollectionChange> {
        match self {
            ItemsSource::Static(_) => None,
            ItemsSource::Observable(c) => c.last_change(),
        }
    }
}

impl From<Vec<Item>> for ItemsSource {
    fn from(items: Vec<Item>) -> Self {
        ItemsSource::Static(Rc::new(items))
    }
}

impl From<ObservableCollection> for ItemsSource {
    fn from(c: ObservableCollection) -> Self {
        ItemsSource::Observable(c)
    }
}
