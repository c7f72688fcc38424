//! # MBO Book Engine
//!
//! Live limit order book reconstruction from market-by-order (MBO) event
//! streams.
//!
//! A feed adapter delivers decoded, per-instrument [`Event`] records in
//! arrival order; [`BookEngine::apply`] folds each one into two
//! tightly-coupled indices (orders, price levels) and hands back a
//! [`BookUpdate`] notification. Consumers read best bid/ask, depth,
//! per-order state, or a detached [`BookSnapshot`].
//!
//! ## Quick Start
//!
//! ```rust
//! use mbo_book_engine::{Action, BookEngine, Event, Side};
//!
//! let mut book = BookEngine::new();
//!
//! // Add 10 lots at $100.00 (fixed-point, 1e-9 units).
//! let event = Event::new(1, Action::Add, Side::Bid, 1001, 100_000_000_000, 10);
//! let update = book.apply(&event).unwrap();
//!
//! let best = update.top.bid.unwrap();
//! assert_eq!(best.price, 100_000_000_000);
//! assert_eq!(best.size, 10);
//! ```
//!
//! ## Design
//!
//! - **One apply, one atomic state change**: precondition checks run before
//!   the first mutation; a rejected event leaves no partial state.
//! - **Strict arrival order**: stale events are dropped and reported;
//!   sequence holes follow the configured [`GapPolicy`] and a Reset event
//!   restores a known-consistent state.
//! - **Recoverable vs. fatal**: duplicate/unknown/stale/gap conditions are
//!   per-event errors; a cross-index [`BookError::InvariantViolation`]
//!   halts the book until reset, because continuing would corrupt every
//!   derived view.
//! - **One book per instrument**: engines are plain values owned by the
//!   caller; [`SharedBook`] adds the single-writer/multi-reader lock when
//!   readers live on other threads.
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`types`] | Event model and derived views: `Event`, `Action`, `Side`, `BookUpdate`, `BookSnapshot` |
//! | [`book`] | Reconstruction: `BookEngine`, `Ladder`, `OrderIndex`, `PriceLevel`, `MultiInstrumentBook`, `SharedBook` |
//! | [`feed`] | Inbound seam: `EventSource`, `VecSource`, `SourceMetadata` |
//! | [`warnings`] | Anomaly tracking: `WarningTracker`, `Warning`, `WarningCategory` |
//! | [`error`] | Error taxonomy: `BookError`, `Result` |

pub mod book;
pub mod error;
pub mod feed;
pub mod types;
pub mod warnings;

// Re-exports - Core types
pub use error::{BookError, Result};
pub use types::{
    Action, BookSnapshot, BookUpdate, Event, LastTrade, LevelView, Order, Quote, Side, TopOfBook,
    PRICE_SCALE,
};

// Re-exports - Book engine
pub use book::{
    BookEngine, EngineConfig, EngineStats, GapPolicy, Ladder, MultiInstrumentBook, OrderIndex,
    PriceLevel, SharedBook,
};

// Re-exports - Feed seam
pub use feed::{EventSource, SourceMetadata, VecSource};

// Re-exports - Warnings
pub use warnings::{Warning, WarningCategory, WarningSummary, WarningTracker};
