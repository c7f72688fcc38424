//! Shared handle for the single-writer, multi-reader model.
//!
//! Exactly one execution context (the feed adapter) calls [`SharedBook::apply`];
//! readers query concurrently from other threads. The read/update exclusion
//! lock is held for the duration of one apply or one query, so a reader can
//! never observe a torn update (a level's aggregate updated but its count
//! not yet). Readers that need a stable view across many lookups take a
//! [`SharedBook::snapshot`] and work on the detached copy.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::book::engine::BookEngine;
use crate::error::Result;
use crate::types::{BookSnapshot, BookUpdate, Event, Quote, TopOfBook};

/// Cloneable handle to a book engine shared across threads.
#[derive(Clone)]
pub struct SharedBook {
    inner: Arc<RwLock<BookEngine>>,
}

impl SharedBook {
    /// Wrap an engine for sharing. The caller keeps the single-writer
    /// discipline: route all `apply` calls through one context.
    pub fn new(engine: BookEngine) -> Self {
        Self {
            inner: Arc::new(RwLock::new(engine)),
        }
    }

    /// Apply one event under the write lock.
    pub fn apply(&self, event: &Event) -> Result<BookUpdate> {
        self.inner.write().apply(event)
    }

    /// Run a read-only closure under the read lock.
    ///
    /// Keep the closure short; it blocks the writer for its duration.
    pub fn read<R>(&self, f: impl FnOnce(&BookEngine) -> R) -> R {
        f(&self.inner.read())
    }

    /// Best bid under a momentary read lock.
    pub fn best_bid(&self) -> Option<Quote> {
        self.inner.read().best_bid()
    }

    /// Best ask under a momentary read lock.
    pub fn best_ask(&self) -> Option<Quote> {
        self.inner.read().best_ask()
    }

    /// Top of book under a momentary read lock.
    pub fn top_of_book(&self) -> TopOfBook {
        self.inner.read().top_of_book()
    }

    /// Detached point-in-time copy; safe to hold while applies continue.
    pub fn snapshot(&self) -> BookSnapshot {
        self.inner.read().snapshot()
    }
}
