//! Limit order book reconstruction from MBO events.
//!
//! The engine owns the two tightly-coupled indices (orders and price
//! levels); cross-references are by key, never by pointer, so the central
//! invariants can be asserted in one place.

pub mod engine;
pub mod ladder;
pub mod multi_instrument;
pub mod order_index;
pub mod price_level;
pub mod shared;

pub use engine::{BookEngine, EngineConfig, EngineStats, GapPolicy};
pub use ladder::Ladder;
pub use multi_instrument::MultiInstrumentBook;
pub use order_index::OrderIndex;
pub use price_level::PriceLevel;
pub use shared::SharedBook;
