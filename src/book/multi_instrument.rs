//! Multi-instrument book manager.
//!
//! One independent [`BookEngine`] per instrument. Engines share nothing;
//! each instrument's stream is applied to its own book.

use indexmap::IndexMap;

use crate::book::engine::{BookEngine, EngineConfig, EngineStats};
use crate::error::{BookError, Result};
use crate::types::{Action, BookSnapshot, BookUpdate, Event, Side};

/// Manages a collection of book engines, one per instrument symbol.
///
/// Symbols are listed in registration order.
pub struct MultiInstrumentBook {
    /// Configuration applied to each new engine.
    config: EngineConfig,

    /// Symbol → book engine.
    books: IndexMap<String, BookEngine>,

    /// Total events applied across all instruments.
    total_events: u64,
}

impl MultiInstrumentBook {
    /// Create an empty manager; new instruments get the default engine
    /// configuration.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create an empty manager with a configuration for new engines.
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            books: IndexMap::new(),
            total_events: 0,
        }
    }

    /// Register an instrument with a fresh empty book.
    ///
    /// Errors if the symbol is already registered.
    pub fn add_instrument(&mut self, symbol: impl Into<String>) -> Result<()> {
        let symbol = symbol.into();
        if self.books.contains_key(&symbol) {
            return Err(BookError::InstrumentExists(symbol));
        }
        self.books
            .insert(symbol, BookEngine::with_config(self.config.clone()));
        Ok(())
    }

    /// Drop an instrument and its book.
    pub fn remove_instrument(&mut self, symbol: &str) -> Result<()> {
        self.books
            .shift_remove(symbol)
            .map(|_| ())
            .ok_or_else(|| BookError::InstrumentNotFound(symbol.to_string()))
    }

    /// Apply one event to an instrument's book.
    pub fn apply(&mut self, symbol: &str, event: &Event) -> Result<BookUpdate> {
        let book = self
            .books
            .get_mut(symbol)
            .ok_or_else(|| BookError::InstrumentNotFound(symbol.to_string()))?;
        let update = book.apply(event)?;
        self.total_events += 1;
        Ok(update)
    }

    /// Borrow an instrument's book for queries.
    pub fn book(&self, symbol: &str) -> Result<&BookEngine> {
        self.books
            .get(symbol)
            .ok_or_else(|| BookError::InstrumentNotFound(symbol.to_string()))
    }

    /// Point-in-time snapshot of an instrument's book.
    pub fn snapshot(&self, symbol: &str) -> Result<BookSnapshot> {
        self.book(symbol).map(|book| book.snapshot())
    }

    /// Per-instrument engine stats.
    pub fn instrument_stats(&self, symbol: &str) -> Result<&EngineStats> {
        self.book(symbol).map(|book| book.stats())
    }

    /// Reset one instrument's book out-of-band (explicit re-seed).
    pub fn reset(&mut self, symbol: &str) -> Result<()> {
        let book = self
            .books
            .get_mut(symbol)
            .ok_or_else(|| BookError::InstrumentNotFound(symbol.to_string()))?;
        let sequence = book.last_sequence().unwrap_or(0);
        book.apply(&Event::new(sequence, Action::Reset, Side::None, 0, 0, 0))?;
        Ok(())
    }

    /// Reset every instrument's book.
    pub fn reset_all(&mut self) -> Result<()> {
        let symbols: Vec<String> = self.books.keys().cloned().collect();
        for symbol in symbols {
            self.reset(&symbol)?;
        }
        Ok(())
    }

    /// Registered symbols, in registration order.
    pub fn symbols(&self) -> Vec<&str> {
        self.books.keys().map(|s| s.as_str()).collect()
    }

    /// Whether a symbol is registered.
    pub fn has_instrument(&self, symbol: &str) -> bool {
        self.books.contains_key(symbol)
    }

    /// Number of registered instruments.
    pub fn instrument_count(&self) -> usize {
        self.books.len()
    }

    /// Total events applied across all instruments.
    pub fn total_events(&self) -> u64 {
        self.total_events
    }
}

impl Default for MultiInstrumentBook {
    fn default() -> Self {
        Self::new()
    }
}
