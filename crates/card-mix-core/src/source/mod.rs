//! The external warehouse boundary: row shape, filter selection and a
//! memoising fetch wrapper. Query language and transport are the caller's.

pub mod filters;
pub mod rows;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::CardMixResult;

pub use filters::{previous_month, FilterSelection, Selection};
pub use rows::TransactionRow;

/// Anything that can return warehouse rows for a filter selection.
pub trait DataSource {
    fn fetch(&self, filter: &FilterSelection) -> CardMixResult<Vec<TransactionRow>>;
}

/// A pre-loaded row set (an export file, a test fixture) filtered in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    rows: Vec<TransactionRow>,
}

impl InMemorySource {
    pub fn new(rows: Vec<TransactionRow>) -> Self {
        InMemorySource { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl DataSource for InMemorySource {
    fn fetch(&self, filter: &FilterSelection) -> CardMixResult<Vec<TransactionRow>> {
        Ok(filter.apply(&self.rows).into_iter().cloned().collect())
    }
}

/// Memoises fetches by filter key, so repeating a selection never hits the
/// inner source twice. Failed fetches are not cached and not retried.
#[derive(Debug)]
pub struct CachedSource<S: DataSource> {
    inner: S,
    cache: RefCell<HashMap<String, Vec<TransactionRow>>>,
    misses: Cell<usize>,
}

impl<S: DataSource> CachedSource<S> {
    pub fn new(inner: S) -> Self {
        CachedSource {
            inner,
            cache: RefCell::new(HashMap::new()),
            misses: Cell::new(0),
        }
    }

    /// Number of fetches forwarded to the inner source.
    pub fn misses(&self) -> usize {
        self.misses.get()
    }

    pub fn clear(&self) {
        self.cache.borrow_mut().clear();
    }
}

impl<S: DataSource> DataSource for CachedSource<S> {
    fn fetch(&self, filter: &FilterSelection) -> CardMixResult<Vec<TransactionRow>> {
        let key = filter.cache_key();
        if let Some(rows) = self.cache.borrow().get(&key) {
            log::debug!("fetch cache hit for {key}");
            return Ok(rows.clone());
        }

        self.misses.set(self.misses.get() + 1);
        let rows = self.inner.fetch(filter)?;
        log::debug!("fetched {} rows for {key}", rows.len());
        self.cache.borrow_mut().insert(key, rows.clone());
        Ok(rows)
    }
}
