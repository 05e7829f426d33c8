use std::{
    cmp::Ordering,
    sync::{Arc, PoisonError, RwLock},
};

use log::debug;

use super::{
    provider::{DataChangeEvent, DataListeners, DataProvider, DataProviderListener, Item, Registration},
    query::{ItemComparator, Query},
};

pub type ItemFilter<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;
type IdentityCheck<T> = Arc<dyn Fn(&T, &T) -> bool + Send + Sync>;

/// In-memory provider over a live collection.
///
/// The collection is shared with application code, which may change it at
/// any time. Nothing detects such changes: call `refresh_all` or
/// `refresh_item` afterwards so views fetch again.
pub struct ListDataProvider<T: Item> {
    items: Arc<RwLock<Vec<T>>>,
    sort_comparator: RwLock<Option<ItemComparator<T>>>,
    filter: RwLock<Option<ItemFilter<T>>>,
    identity: Option<IdentityCheck<T>>,
    listeners: DataListeners<T>,
}

impl<T: Item> ListDataProvider<T> {
    pub fn new(items: Arc<RwLock<Vec<T>>>) -> Self {
        Self {
            items,
            sort_comparator: RwLock::new(None),
            filter: RwLock::new(None),
            identity: None,
            listeners: DataListeners::new(),
        }
    }

    pub fn from_items(items: Vec<T>) -> Self {
        Self::new(Arc::new(RwLock::new(items)))
    }

    /// Items are the same item when `key` returns equal values for them
    pub fn with_identity<K, G>(mut self, key: G) -> Self
    where
        K: PartialEq,
        G: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.identity = Some(Arc::new(move |a: &T, b: &T| key(a) == key(b)));
        self
    }

    /// The live backing collection
    pub fn items(&self) -> Arc<RwLock<Vec<T>>> {
        self.items.clone()
    }

    /// Sets the order used when a query's own comparator considers two items
    /// equal, or when the query has none
    pub fn set_sort_comparator<C>(&self, comparator: Option<C>)
    where
        C: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        *self
            .sort_comparator
            .write()
            .unwrap_or_else(PoisonError::into_inner) =
            comparator.map(|c| Arc::new(c) as ItemComparator<T>);
        self.refresh_all();
    }

    /// Replaces the configured filter
    pub fn set_filter<P>(&self, filter: Option<P>)
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        *self.filter.write().unwrap_or_else(PoisonError::into_inner) =
            filter.map(|f| Arc::new(f) as ItemFilter<T>);
        self.refresh_all();
    }

    /// Narrows the configured filter: items must pass both the existing
    /// filter and `filter`
    pub fn add_filter<P>(&self, filter: P)
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        {
            let mut current = self.filter.write().unwrap_or_else(PoisonError::into_inner);
            let combined: ItemFilter<T> = match current.take() {
                Some(existing) => Arc::new(move |item: &T| existing(item) && filter(item)),
                None => Arc::new(filter),
            };
            *current = Some(combined);
        }
        self.refresh_all();
    }

    pub fn clear_filters(&self) {
        self.filter
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.refresh_all();
    }

    fn matching(&self, query: &Query<T, ItemFilter<T>>) -> Vec<T> {
        let configured = self
            .filter
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|&item| configured.as_ref().map_or(true, |f| f(item)))
            .filter(|&item| query.filter().map_or(true, |f| f(item)))
            .cloned()
            .collect()
    }
}

impl<T: Item> DataProvider<T, ItemFilter<T>> for ListDataProvider<T> {
    fn is_in_memory(&self) -> bool {
        true
    }

    fn size(&self, query: &Query<T, ItemFilter<T>>) -> usize {
        self.matching(query).len()
    }

    fn fetch(&self, query: &Query<T, ItemFilter<T>>) -> Box<dyn Iterator<Item = T> + Send> {
        let mut items = self.matching(query);

        let fallback = self
            .sort_comparator
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let primary = query.in_memory_sorting().cloned();
        if primary.is_some() || fallback.is_some() {
            // stable sort keeps collection order among items equal under both
            items.sort_by(|a, b| {
                let ordering = primary.as_ref().map_or(Ordering::Equal, |c| c(a, b));
                match (ordering, &fallback) {
                    (Ordering::Equal, Some(fallback)) => fallback(a, b),
                    (ordering, _) => ordering,
                }
            });
        }

        Box::new(
            items
                .into_iter()
                .skip(query.offset())
                .take(query.limit()),
        )
    }

    fn same_item(&self, a: &T, b: &T) -> bool {
        match &self.identity {
            Some(identity) => identity(a, b),
            None => a == b,
        }
    }

    fn refresh_all(&self) {
        debug!("ListDataProvider: refresh all");
        self.listeners.fire(&DataChangeEvent::RefreshAll);
    }

    fn refresh_item(&self, item: &T) {
        self.listeners
            .fire(&DataChangeEvent::RefreshItem(item.clone()));
    }

    fn add_data_provider_listener(&self, listener: DataProviderListener<T>) -> Registration {
        self.listeners.add(listener)
    }
}
