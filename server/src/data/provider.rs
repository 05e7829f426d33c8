use std::sync::{Arc, Mutex, PoisonError, Weak};

use super::query::Query;

/// Anything a listing can show
pub trait Item: Clone + PartialEq + Send + Sync + 'static {}
impl<T: Clone + PartialEq + Send + Sync + 'static> Item for T {}

#[derive(Clone, Debug, PartialEq)]
pub enum DataChangeEvent<T> {
    /// Every item may have changed, views should fetch again
    RefreshAll,
    /// This one item was updated in place
    RefreshItem(T),
}

pub type DataProviderListener<T> = Arc<dyn Fn(&DataChangeEvent<T>) + Send + Sync>;

/// Source of listing items.
///
/// `size` and `fetch` are pure functions of the query at call time: for any
/// query, paging through `fetch` yields exactly `size` items. Neither looks
/// at the query's offset or limit when counting.
pub trait DataProvider<T: Item, F>: Send + Sync {
    /// Whether items are held in memory and sorted with the query's
    /// comparator instead of its sort orders
    fn is_in_memory(&self) -> bool;

    fn size(&self, query: &Query<T, F>) -> usize;

    fn fetch(&self, query: &Query<T, F>) -> Box<dyn Iterator<Item = T> + Send>;

    /// Whether `a` and `b` are the same item, possibly in different versions
    fn same_item(&self, a: &T, b: &T) -> bool {
        a == b
    }

    fn refresh_all(&self);

    /// Tells views that `item` was updated in place. Views holding no
    /// matching item ignore it.
    fn refresh_item(&self, item: &T);

    fn add_data_provider_listener(&self, listener: DataProviderListener<T>) -> Registration;
}

/// Handle returned when adding a listener
#[must_use = "dropping a Registration keeps the listener registered"]
pub struct Registration {
    remove: Option<Box<dyn FnOnce() + Send>>,
}

impl Registration {
    pub fn new<R: FnOnce() + Send + 'static>(remove: R) -> Self {
        Self {
            remove: Some(Box::new(remove)),
        }
    }

    pub fn remove(mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }
}

type ListenerList<T> = Mutex<Vec<(u64, DataProviderListener<T>)>>;

/// Listener bookkeeping shared by the providers that own their events
pub struct DataListeners<T> {
    listeners: Arc<ListenerList<T>>,
    next_key: Mutex<u64>,
}

impl<T: Item> DataListeners<T> {
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(Mutex::new(Vec::new())),
            next_key: Mutex::new(0),
        }
    }

    pub fn add(&self, listener: DataProviderListener<T>) -> Registration {
        let key = {
            let mut next_key = self.next_key.lock().unwrap_or_else(PoisonError::into_inner);
            *next_key += 1;
            *next_key
        };
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((key, listener));

        let listeners: Weak<ListenerList<T>> = Arc::downgrade(&self.listeners);
        Registration::new(move || {
            if let Some(listeners) = listeners.upgrade() {
                listeners
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .retain(|(existing, _)| *existing != key);
            }
        })
    }

    /// Notifies every listener. Listeners run outside the lock and may add or
    /// remove listeners.
    pub fn fire(&self, event: &DataChangeEvent<T>) {
        let snapshot: Vec<DataProviderListener<T>> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in snapshot {
            listener(event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Item> Default for DataListeners<T> {
    fn default() -> Self {
        Self::new()
    }
}
