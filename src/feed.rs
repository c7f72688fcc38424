//! Feed source abstraction: the seam between the external feed adapter and
//! the book engine.
//!
//! The engine makes no assumption about the wire encoding, authentication,
//! or reconnection of the upstream vendor; it just consumes decoded
//! [`Event`] records in arrival order. A feed adapter implements
//! [`EventSource`] (or drives [`crate::BookEngine::apply`] directly) and is
//! expected to deliver a Reset event after any feed discontinuity.
//!
//! # Implementing a source
//!
//! ```
//! use mbo_book_engine::feed::{EventSource, SourceMetadata};
//! use mbo_book_engine::{Event, Result};
//!
//! struct ReplaySource {
//!     events: Vec<Event>,
//!     metadata: SourceMetadata,
//! }
//!
//! impl EventSource for ReplaySource {
//!     type EventIter = std::vec::IntoIter<Event>;
//!
//!     fn events(self) -> Result<Self::EventIter> {
//!         Ok(self.events.into_iter())
//!     }
//!
//!     fn metadata(&self) -> &SourceMetadata {
//!         &self.metadata
//!     }
//! }
//! ```

use crate::error::Result;
use crate::types::Event;

/// Metadata about an event source, for logging and validation.
#[derive(Debug, Clone, Default)]
pub struct SourceMetadata {
    /// Instrument symbol (e.g. "ESH6").
    pub symbol: Option<String>,

    /// Data provider name (e.g. "databento", "replay").
    pub provider: Option<String>,

    /// Estimated event count, for progress tracking.
    pub estimated_events: Option<u64>,
}

impl SourceMetadata {
    /// Create empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the symbol.
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    /// Set the provider.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Set the estimated event count.
    pub fn with_estimated_events(mut self, count: u64) -> Self {
        self.estimated_events = Some(count);
        self
    }
}

/// A source of decoded events for one instrument, in arrival order.
///
/// `events()` consumes the source for single-pass iteration; populate
/// metadata before calling it.
pub trait EventSource {
    /// Iterator over the source's events.
    type EventIter: Iterator<Item = Event>;

    /// Consume the source and iterate its events in arrival order.
    fn events(self) -> Result<Self::EventIter>;

    /// Source metadata.
    fn metadata(&self) -> &SourceMetadata;
}

/// In-memory event source, for tests and replay of captured streams.
#[derive(Debug, Clone, Default)]
pub struct VecSource {
    events: Vec<Event>,
    metadata: SourceMetadata,
}

impl VecSource {
    /// Wrap a vector of events.
    pub fn new(events: Vec<Event>) -> Self {
        let metadata = SourceMetadata::new()
            .with_provider("memory")
            .with_estimated_events(events.len() as u64);
        Self { events, metadata }
    }

    /// Attach a symbol to the metadata.
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.metadata.symbol = Some(symbol.into());
        self
    }

    /// Number of events held.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True when no events are held.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSource for VecSource {
    type EventIter = std::vec::IntoIter<Event>;

    fn events(self) -> Result<Self::EventIter> {
        Ok(self.events.into_iter())
    }

    fn metadata(&self) -> &SourceMetadata {
        &self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Action, Side};

    #[test]
    fn test_vec_source_round_trip() {
        let events = vec![
            Event::new(1, Action::Add, Side::Bid, 1, 100, 10),
            Event::new(2, Action::Cancel, Side::Bid, 1, 0, 0),
        ];
        let source = VecSource::new(events.clone()).with_symbol("ESH6");

        assert_eq!(source.len(), 2);
        assert_eq!(source.metadata().symbol.as_deref(), Some("ESH6"));
        assert_eq!(source.metadata().provider.as_deref(), Some("memory"));
        assert_eq!(source.metadata().estimated_events, Some(2));

        let replayed: Vec<Event> = source.events().unwrap().collect();
        assert_eq!(replayed, events);
    }

    #[test]
    fn test_empty_source() {
        let source = VecSource::new(Vec::new());
        assert!(source.is_empty());
        assert_eq!(source.events().unwrap().count(), 0);
    }
}
