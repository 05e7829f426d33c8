use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use log::debug;

use super::{
    provider::{DataChangeEvent, DataProvider, Item, Registration},
    query::Query,
};

struct WindowState<T> {
    items: Vec<T>,
    size: usize,
    stale: bool,
}

/// One page of a provider's items as a listing currently shows them.
///
/// The page is fetched lazily and kept until the provider reports a change:
/// a refresh-all makes the window stale so the next read fetches again, a
/// refresh-item swaps the updated item into the cached page if the page
/// holds it.
pub struct DataWindow<T: Item, F> {
    provider: Arc<dyn DataProvider<T, F>>,
    query: Query<T, F>,
    state: Arc<Mutex<WindowState<T>>>,
    registration: Option<Registration>,
}

impl<T: Item, F: 'static> DataWindow<T, F> {
    pub fn new(provider: Arc<dyn DataProvider<T, F>>, query: Query<T, F>) -> Self {
        let state = Arc::new(Mutex::new(WindowState {
            items: Vec::new(),
            size: 0,
            stale: true,
        }));

        let weak_state: Weak<Mutex<WindowState<T>>> = Arc::downgrade(&state);
        let weak_provider: Weak<dyn DataProvider<T, F>> = Arc::downgrade(&provider);
        let registration = provider.add_data_provider_listener(Arc::new(
            move |event: &DataChangeEvent<T>| {
                let Some(state) = weak_state.upgrade() else {
                    return;
                };
                let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
                match event {
                    DataChangeEvent::RefreshAll => state.stale = true,
                    DataChangeEvent::RefreshItem(updated) => {
                        let Some(provider) = weak_provider.upgrade() else {
                            return;
                        };
                        let position = state
                            .items
                            .iter()
                            .position(|cached| provider.same_item(cached, updated));
                        if let Some(position) = position {
                            state.items[position] = updated.clone();
                        }
                    }
                }
            },
        ));

        Self {
            provider,
            query,
            state,
            registration: Some(registration),
        }
    }

    pub fn query(&self) -> &Query<T, F> {
        &self.query
    }

    /// Moves the window, fetching on next read
    pub fn set_range(&mut self, offset: usize, limit: usize) {
        let query = std::mem::take(&mut self.query);
        self.query = query.with_offset(offset).with_limit(limit);
        self.lock().stale = true;
    }

    pub fn set_query(&mut self, query: Query<T, F>) {
        self.query = query;
        self.lock().stale = true;
    }

    pub fn is_stale(&self) -> bool {
        self.lock().stale
    }

    /// The page, fetching it first if stale
    pub fn items(&self) -> Vec<T> {
        let mut state = self.lock();
        if state.stale {
            self.reload(&mut state);
        }
        state.items.clone()
    }

    /// Total number of items matching the query, not just this page
    pub fn size(&self) -> usize {
        let mut state = self.lock();
        if state.stale {
            self.reload(&mut state);
        }
        state.size
    }

    /// The page as last fetched, without fetching
    pub fn cached(&self) -> Vec<T> {
        self.lock().items.clone()
    }

    fn reload(&self, state: &mut WindowState<T>) {
        state.items = self.provider.fetch(&self.query).collect();
        state.size = self.provider.size(&self.query);
        state.stale = false;
        debug!(
            "DataWindow: fetched {} of {} items at offset {}",
            state.items.len(),
            state.size,
            self.query.offset()
        );
    }

    fn lock(&self) -> MutexGuard<'_, WindowState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Item, F> Drop for DataWindow<T, F> {
    fn drop(&mut self) {
        if let Some(registration) = self.registration.take() {
            registration.remove();
        }
    }
}
