use std::sync::Arc;

use log::warn;

use super::{
    provider::{DataChangeEvent, DataListeners, DataProvider, DataProviderListener, Item, Registration},
    query::Query,
};

type FetchCallback<T, F> = Box<dyn Fn(&Query<T, F>) -> Vec<T> + Send + Sync>;
type CountCallback<T, F> = Box<dyn Fn(&Query<T, F>) -> usize + Send + Sync>;
type IdentityCheck<T> = Arc<dyn Fn(&T, &T) -> bool + Send + Sync>;

/// Lazy provider backed by application callbacks, typically a database or
/// service. The callbacks receive the query's paging, sort orders and
/// filter as they are.
pub struct CallbackDataProvider<T: Item, F> {
    fetch: FetchCallback<T, F>,
    count: CountCallback<T, F>,
    identity: Option<IdentityCheck<T>>,
    listeners: DataListeners<T>,
}

impl<T: Item, F> CallbackDataProvider<T, F> {
    pub fn new<FC, CC>(fetch: FC, count: CC) -> Self
    where
        FC: Fn(&Query<T, F>) -> Vec<T> + Send + Sync + 'static,
        CC: Fn(&Query<T, F>) -> usize + Send + Sync + 'static,
    {
        Self {
            fetch: Box::new(fetch),
            count: Box::new(count),
            identity: None,
            listeners: DataListeners::new(),
        }
    }

    pub fn with_identity<K, G>(mut self, key: G) -> Self
    where
        K: PartialEq,
        G: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.identity = Some(Arc::new(move |a: &T, b: &T| key(a) == key(b)));
        self
    }
}

impl<T: Item, F: Send + Sync> DataProvider<T, F> for CallbackDataProvider<T, F> {
    fn is_in_memory(&self) -> bool {
        false
    }

    fn size(&self, query: &Query<T, F>) -> usize {
        (self.count)(query)
    }

    fn fetch(&self, query: &Query<T, F>) -> Box<dyn Iterator<Item = T> + Send> {
        let mut items = (self.fetch)(query);
        if items.len() > query.limit() {
            warn!(
                "CallbackDataProvider: fetch returned {} items for a limit of {}",
                items.len(),
                query.limit()
            );
            items.truncate(query.limit());
        }
        Box::new(items.into_iter())
    }

    fn same_item(&self, a: &T, b: &T) -> bool {
        match &self.identity {
            Some(identity) => identity(a, b),
            None => a == b,
        }
    }

    fn refresh_all(&self) {
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
