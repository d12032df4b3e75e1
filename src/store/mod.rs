use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;

use crate::service::app_state::AppStoreError;

pub mod admin;
pub mod audit;
pub mod category;
pub mod provider;
pub mod seed;

pub type StoreResult<T> = Result<T, AppStoreError>;

/// A record addressable by id inside a [`MemStore`].
pub trait Record: Clone {
    fn id(&self) -> i64;
}

/// Insertion-ordered in-memory collection. Every mutation is a synchronous,
/// atomic replace of the affected entry; reads see the latest write.
pub struct MemStore<T: Record> {
    items: RwLock<Vec<T>>,
}

impl<T: Record> MemStore<T> {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
        }
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Vec<T>>> {
        self.items
            .read()
            .map_err(|e| AppStoreError::LockError(e.to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Vec<T>>> {
        self.items
            .write()
            .map_err(|e| AppStoreError::LockError(e.to_string()))
    }

    pub fn insert(&self, item: T) -> StoreResult<T> {
        let mut items = self.write()?;
        if items.iter().any(|existing| existing.id() == item.id()) {
            return Err(AppStoreError::AlreadyExists(format!(
                "record with id {} already exists",
                item.id()
            )));
        }
        items.push(item.clone());
        Ok(item)
    }

    /// Applies `apply` to the record with the given id and returns the
    /// updated record.
    pub fn update_with(&self, id: i64, apply: impl FnOnce(&mut T)) -> StoreResult<T> {
        let mut items = self.write()?;
        match items.iter_mut().find(|item| item.id() == id) {
            Some(item) => {
                apply(item);
                Ok(item.clone())
            }
            None => Err(AppStoreError::NotFound(format!(
                "record with id {} not found",
                id
            ))),
        }
    }

    /// Removes the record with the given id, returning it.
    pub fn remove(&self, id: i64) -> StoreResult<T> {
        let mut items = self.write()?;
        match items.iter().position(|item| item.id() == id) {
            Some(pos) => Ok(items.remove(pos)),
            None => Err(AppStoreError::NotFound(format!(
                "record with id {} not found",
                id
            ))),
        }
    }

    pub fn get_by_id(&self, id: i64) -> StoreResult<T> {
        self.read()?
            .iter()
            .find(|item| item.id() == id)
            .cloned()
            .ok_or_else(|| AppStoreError::NotFound(format!("record with id {} not found", id)))
    }

    pub fn find(&self, pred: impl Fn(&T) -> bool) -> StoreResult<Option<T>> {
        Ok(self.read()?.iter().find(|item| pred(item)).cloned())
    }

    /// All records in insertion order.
    pub fn list_all(&self) -> StoreResult<Vec<T>> {
        Ok(self.read()?.clone())
    }

    pub fn count(&self, pred: impl Fn(&T) -> bool) -> StoreResult<usize> {
        Ok(self.read()?.iter().filter(|item| pred(item)).count())
    }
}

impl<T: Record> Default for MemStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
pub struct ListResult<T> {
    total: i64,
    page: i64,
    page_size: i64,
    list: Vec<T>,
}

impl<T> ListResult<T> {
    /// Slices an already-filtered result set into the requested page.
    pub fn paginate(items: Vec<T>, page: Option<i64>, page_size: Option<i64>) -> ListResult<T> {
        let page_size = page_size.unwrap_or(20).max(1);
        let page = page.unwrap_or(1).max(1);
        let total = items.len() as i64;
        let offset = ((page - 1) * page_size) as usize;

        let list = items
            .into_iter()
            .skip(offset)
            .take(page_size as usize)
            .collect();

        ListResult {
            total,
            page,
            page_size,
            list,
        }
    }

    #[cfg(test)]
    pub fn items(&self) -> &[T] {
        &self.list
    }

    #[cfg(test)]
    pub fn total(&self) -> i64 {
        self.total
    }
}
