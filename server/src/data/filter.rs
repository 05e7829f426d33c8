use std::sync::{Arc, PoisonError, RwLock};

use super::{
    provider::{DataProvider, DataProviderListener, Item, Registration},
    query::Query,
};

type FilterConverter<Q, F> = Arc<dyn Fn(&Q) -> F + Send + Sync>;
type FilterCombiner<Q, C, F> = Arc<dyn Fn(Option<&Q>, Option<&C>) -> Option<F> + Send + Sync>;

/// Accepts queries with filters of type `Q` and hands them to a provider
/// filtering on `F`
pub struct ConvertedFilterDataProvider<T: Item, Q, F> {
    inner: Arc<dyn DataProvider<T, F>>,
    convert: FilterConverter<Q, F>,
}

impl<T: Item, Q, F> ConvertedFilterDataProvider<T, Q, F> {
    pub fn new<C>(inner: Arc<dyn DataProvider<T, F>>, convert: C) -> Self
    where
        C: Fn(&Q) -> F + Send + Sync + 'static,
    {
        Self {
            inner,
            convert: Arc::new(convert),
        }
    }

    fn inner_query(&self, query: &Query<T, Q>) -> Query<T, F> {
        query.map_filter(|filter| (self.convert)(filter))
    }
}

impl<T: Item, Q, F> DataProvider<T, Q> for ConvertedFilterDataProvider<T, Q, F> {
    fn is_in_memory(&self) -> bool {
        self.inner.is_in_memory()
    }

    fn size(&self, query: &Query<T, Q>) -> usize {
        self.inner.size(&self.inner_query(query))
    }

    fn fetch(&self, query: &Query<T, Q>) -> Box<dyn Iterator<Item = T> + Send> {
        self.inner.fetch(&self.inner_query(query))
    }

    fn same_item(&self, a: &T, b: &T) -> bool {
        self.inner.same_item(a, b)
    }

    fn refresh_all(&self) {
        self.inner.refresh_all()
    }

    fn refresh_item(&self, item: &T) {
        self.inner.refresh_item(item)
    }

    fn add_data_provider_listener(&self, listener: DataProviderListener<T>) -> Registration {
        self.inner.add_data_provider_listener(listener)
    }
}

/// Lets application code set a filter on a provider independently of the
/// filter each query carries.
///
/// The query filter (`Q`) and the configured filter (`C`) are merged into
/// the wrapped provider's filter (`F`) by the combiner. Setting the
/// configured filter notifies every view with a refresh-all.
pub struct ConfigurableFilterDataProvider<T: Item, Q, C, F> {
    inner: Arc<dyn DataProvider<T, F>>,
    configured: RwLock<Option<C>>,
    combine: FilterCombiner<Q, C, F>,
}

impl<T: Item, Q, C, F> ConfigurableFilterDataProvider<T, Q, C, F> {
    pub fn new<M>(inner: Arc<dyn DataProvider<T, F>>, combine: M) -> Self
    where
        M: Fn(Option<&Q>, Option<&C>) -> Option<F> + Send + Sync + 'static,
    {
        Self {
            inner,
            configured: RwLock::new(None),
            combine: Arc::new(combine),
        }
    }

    pub fn set_filter(&self, filter: Option<C>) {
        *self
            .configured
            .write()
            .unwrap_or_else(PoisonError::into_inner) = filter;
        self.inner.refresh_all();
    }

    pub fn has_filter(&self) -> bool {
        self.configured
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn inner_query(&self, query: &Query<T, Q>) -> Query<T, F> {
        let configured = self
            .configured
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        query.with_filter_value((self.combine)(query.filter(), configured.as_ref()))
    }
}

impl<T, Q, C, F> DataProvider<T, Q> for ConfigurableFilterDataProvider<T, Q, C, F>
where
    T: Item,
    C: Send + Sync,
{
    fn is_in_memory(&self) -> bool {
        self.inner.is_in_memory()
    }

    fn size(&self, query: &Query<T, Q>) -> usize {
        self.inner.size(&self.inner_query(query))
    }

    fn fetch(&self, query: &Query<T, Q>) -> Box<dyn Iterator<Item = T> + Send> {
        self.inner.fetch(&self.inner_query(query))
    }

    fn same_item(&self, a: &T, b: &T) -> bool {
        self.inner.same_item(a, b)
    }

    fn refresh_all(&self) {
        self.inner.refresh_all()
    }

    fn refresh_item(&self, item: &T) {
        self.inner.refresh_item(item)
    }

    fn add_data_provider_listener(&self, listener: DataProviderListener<T>) -> Registration {
        self.inner.add_data_provider_listener(listener)
    }
}

/// Filter adapters available on every provider
pub trait DataProviderExt<T: Item, F>: DataProvider<T, F> + Sized + 'static {
    /// Wraps this provider to accept `Q` filters, converted by `convert`
    fn with_converted_filter<Q, C>(self, convert: C) -> ConvertedFilterDataProvider<T, Q, F>
    where
        C: Fn(&Q) -> F + Send + Sync + 'static,
    {
        ConvertedFilterDataProvider::new(Arc::new(self), convert)
    }

    /// Wraps this provider so the filter is set from outside; query filters
    /// are ignored
    fn with_configurable_filter(self) -> ConfigurableFilterDataProvider<T, (), F, F>
    where
        F: Clone + 'static,
    {
        ConfigurableFilterDataProvider::new(Arc::new(self), |_: Option<&()>, configured: Option<&F>| {
            configured.cloned()
        })
    }

    /// Wraps this provider so a configured filter `C` is combined with each
    /// query's filter `Q` by `combine`
    fn with_configurable_filter_combined<Q, C, M>(
        self,
        combine: M,
    ) -> ConfigurableFilterDataProvider<T, Q, C, F>
    where
        M: Fn(Option<&Q>, Option<&C>) -> Option<F> + Send + Sync + 'static,
    {
        ConfigurableFilterDataProvider::new(Arc::new(self), combine)
    }
}

impl<T: Item, F, P: DataProvider<T, F> + 'static> DataProviderExt<T, F> for P {}
