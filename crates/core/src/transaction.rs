//! Scoped transactions over a [`ContentStore`].
//!
//! A [`Transaction`] begins on construction and must be closed with
//! [`Transaction::commit`]. Dropping it any other way (early return, `?`,
//! panic unwinding) rolls the store back.

use crate::content::ContentStore;
use crate::error::StoreError;
use std::ops::{Deref, DerefMut};

pub struct Transaction<'a, S: ContentStore + ?Sized> {
    store: &'a mut S,
    open: bool,
}

impl<'a, S: ContentStore + ?Sized> Transaction<'a, S> {
    /// Begin a transaction on `store`.
    pub fn begin(store: &'a mut S) -> Result<Self, StoreError> {
        store.begin()?;
        Ok(Self { store, open: true })
    }

    pub fn commit(mut self) -> Result<(), StoreError> {
        self.open = false;
        self.store.commit()
    }

    pub fn rollback(mut self) -> Result<(), StoreError> {
        self.open = false;
        self.store.rollback()
    }
}

impl<S: ContentStore + ?Sized> Deref for Transaction<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.store
    }
}

impl<S: ContentStore + ?Sized> DerefMut for Transaction<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.store
    }
}

impl<S: ContentStore + ?Sized> Drop for Transaction<'_, S> {
    fn drop(&mut self) {
        if self.open {
            tracing::warn!("Transaction dropped without commit, rolling back");
            if let Err(e) = self.store.rollback() {
                tracing::error!(error = %e, "Rollback failed");
            }
        }
    }
}
