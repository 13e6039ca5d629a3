use std::ops::{Deref, DerefMut};

use crate::server::database::pool::Pool;

/// An item checked out of a [`Pool`]; hands itself back on drop.
pub(crate) struct PooledConnection<T> {
    item: Option<T>,
    pool: Pool<T>,
}

impl<T> PooledConnection<T> {
    pub fn new(item: T, pool: Pool<T>) -> Self {
        Self {
            item: Some(item),
            pool,
        }
    }
}

impl<T> Deref for PooledConnection<T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.item.as_ref().unwrap() // only None after drop
    }
}

impl<T> DerefMut for PooledConnection<T> {
    fn deref_mut(&mut self) -> &mut T {
        self.item.as_mut().unwrap() // only None after drop
    }
}

impl<T> Drop for PooledConnection<T> {
    fn drop(&mut self) {
        if let Some(item) = self.item.take() {
            self.pool.release(item);
        }
    }
}
