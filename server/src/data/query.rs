use std::{cmp::Ordering, fmt, sync::Arc};

use serde::{Deserialize, Serialize};

pub type ItemComparator<T> = Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn reverse(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// A sort request passed through to a backend as property name plus
/// direction
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuerySortOrder {
    pub property: String,
    pub direction: SortDirection,
}

impl QuerySortOrder {
    pub fn asc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn desc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: SortDirection::Descending,
        }
    }
}

/// Which items a listing asks a [`DataProvider`](super::provider::DataProvider)
/// for.
///
/// `sort_orders` is meant for backends, `in_memory_sorting` for providers
/// that sort items themselves. A listing usually fills both from the same
/// column sort.
pub struct Query<T, F> {
    offset: usize,
    limit: usize,
    sort_orders: Vec<QuerySortOrder>,
    in_memory_sorting: Option<ItemComparator<T>>,
    filter: Option<F>,
}

impl<T, F> Query<T, F> {
    /// Every item, unsorted and unfiltered
    pub fn new() -> Self {
        Self {
            offset: 0,
            limit: usize::MAX,
            sort_orders: Vec::new(),
            in_memory_sorting: None,
            filter: None,
        }
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_sort_orders(mut self, sort_orders: Vec<QuerySortOrder>) -> Self {
        self.sort_orders = sort_orders;
        self
    }

    pub fn with_in_memory_sorting<C>(mut self, comparator: C) -> Self
    where
        C: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        self.in_memory_sorting = Some(Arc::new(comparator));
        self
    }

    pub fn with_filter(mut self, filter: F) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn sort_orders(&self) -> &[QuerySortOrder] {
        &self.sort_orders
    }

    pub fn in_memory_sorting(&self) -> Option<&ItemComparator<T>> {
        self.in_memory_sorting.as_ref()
    }

    pub fn filter(&self) -> Option<&F> {
        self.filter.as_ref()
    }

    /// Same paging and sorting, different filter
    pub fn with_filter_value<G>(&self, filter: Option<G>) -> Query<T, G> {
        Query {
            offset: self.offset,
            limit: self.limit,
            sort_orders: self.sort_orders.clone(),
            in_memory_sorting: self.in_memory_sorting.clone(),
            filter,
        }
    }

    pub fn map_filter<G>(&self, convert: impl FnOnce(&F) -> G) -> Query<T, G> {
        self.with_filter_value(self.filter.as_ref().map(convert))
    }
}

impl<T, F> Default for Query<T, F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, F: Clone> Clone for Query<T, F> {
    fn clone(&self) -> Self {
        self.with_filter_value(self.filter.clone())
    }
}

impl<T, F: fmt::Debug> fmt::Debug for Query<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("offset", &self.offset)
            .field("limit", &self.limit)
            .field("sort_orders", &self.sort_orders)
            .field("in_memory_sorting", &self.in_memory_sorting.is_some())
            .field("filter", &self.filter)
            .finish()
    }
}
