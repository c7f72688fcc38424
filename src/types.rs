//! Core data types: the canonical event record and the derived book views.
//!
//! The event model is independent of any wire format. A feed adapter decodes
//! vendor messages into [`Event`] records and hands them to the engine one at
//! a time, in arrival order. All prices are fixed-point integers; the book
//! state never touches floating point.

use serde::{Deserialize, Serialize};

use crate::error::{BookError, Result};

/// Fixed-point price scale: one price unit is 1e-9 currency units.
pub const PRICE_SCALE: f64 = 1e-9;

/// What happened to the order (the event's action tag).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Action {
    /// Add a new order to the book.
    Add = b'A',
    /// Cancel (fully remove) a resting order.
    Cancel = b'C',
    /// Modify a resting order's size and/or price.
    Modify = b'M',
    /// Execution against a resting order; size is the executed quantity.
    Fill = b'F',
    /// Informational trade report; does not mutate the book.
    Trade = b'T',
    /// Clear the book to a known-empty state.
    Reset = b'R',
}

impl Action {
    /// Parse an action from its feed byte tag.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'A' => Some(Action::Add),
            b'C' => Some(Action::Cancel),
            b'M' => Some(Action::Modify),
            b'F' => Some(Action::Fill),
            b'T' => Some(Action::Trade),
            b'R' => Some(Action::Reset),
            _ => None,
        }
    }

    /// Convert to the feed byte tag.
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// Whether this action can mutate the order/level indices.
    #[inline]
    pub fn mutates_book(self) -> bool {
        !matches!(self, Action::Trade)
    }
}

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Side {
    /// Buy order (bid).
    Bid = b'B',
    /// Sell order (ask).
    Ask = b'A',
    /// Non-directional; only valid for Trade and Reset events.
    None = b'N',
}

impl Side {
    /// Parse a side from its feed byte tag.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'B' => Some(Side::Bid),
            b'A' => Some(Side::Ask),
            b'N' => Some(Side::None),
            _ => None,
        }
    }

    /// Convert to the feed byte tag.
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// Check if this is a bid.
    #[inline(always)]
    pub fn is_bid(self) -> bool {
        matches!(self, Side::Bid)
    }

    /// Check if this is an ask.
    #[inline(always)]
    pub fn is_ask(self) -> bool {
        matches!(self, Side::Ask)
    }

    /// Check if this is a directional (book) side.
    #[inline(always)]
    pub fn is_directional(self) -> bool {
        !matches!(self, Side::None)
    }
}

/// One decoded market-by-order event.
///
/// Immutable, one per feed message. Carries both venue timestamps:
/// `ts_event` is matching-engine time, `ts_recv` is capture time; the two
/// are never conflated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Venue sequence number, monotonically increasing per instrument.
    pub sequence: u64,

    /// Matching-engine timestamp (nanoseconds since epoch).
    pub ts_event: i64,

    /// Capture-server timestamp (nanoseconds since epoch).
    pub ts_recv: i64,

    /// What happened.
    pub action: Action,

    /// Which side of the book; `None` only for Trade/Reset.
    pub side: Side,

    /// Venue-assigned order identifier. Stable while the order rests;
    /// may be reused by the venue after full removal.
    pub order_id: u64,

    /// Fixed-point price (see [`PRICE_SCALE`]).
    pub price: i64,

    /// Quantity. For Fill events this is the executed quantity,
    /// not the remaining size.
    pub size: u32,

    /// Venue-specific flag bits, passed through opaquely.
    pub flags: u8,
}

impl Event {
    /// Create a new event with zeroed timestamps and flags.
    pub fn new(
        sequence: u64,
        action: Action,
        side: Side,
        order_id: u64,
        price: i64,
        size: u32,
    ) -> Self {
        Self {
            sequence,
            ts_event: 0,
            ts_recv: 0,
            action,
            side,
            order_id,
            price,
            size,
            flags: 0,
        }
    }

    /// Set both venue timestamps.
    pub fn with_timestamps(mut self, ts_event: i64, ts_recv: i64) -> Self {
        self.ts_event = ts_event;
        self.ts_recv = ts_recv;
        self
    }

    /// Set the venue flag bits.
    pub fn with_flags(mut self, flags: u8) -> Self {
        self.flags = flags;
        self
    }

    /// Price as floating-point currency units (display only).
    #[inline]
    pub fn price_as_f64(&self) -> f64 {
        self.price as f64 * PRICE_SCALE
    }

    /// Validate field combinations for this event's action.
    ///
    /// Book-mutating actions need a real order id and a directional side;
    /// Add needs a positive price and size, Fill an executed quantity of at
    /// least one, Modify a positive (new) price. A Modify size of zero is
    /// legal and treated as a cancel by the engine.
    pub fn validate(&self) -> Result<()> {
        match self.action {
            Action::Add | Action::Cancel | Action::Modify | Action::Fill => {
                if self.order_id == 0 {
                    return Err(BookError::InvalidOrderId(0));
                }
                if !self.side.is_directional() {
                    return Err(BookError::InvalidSide { side: self.side });
                }
                match self.action {
                    Action::Add => {
                        if self.price <= 0 {
                            return Err(BookError::InvalidPrice(self.price));
                        }
                        if self.size == 0 {
                            return Err(BookError::InvalidSize(0));
                        }
                    }
                    Action::Modify => {
                        if self.price <= 0 {
                            return Err(BookError::InvalidPrice(self.price));
                        }
                    }
                    Action::Fill => {
                        if self.size == 0 {
                            return Err(BookError::InvalidSize(0));
                        }
                    }
                    _ => {}
                }
                Ok(())
            }
            Action::Trade | Action::Reset => Ok(()),
        }
    }
}

/// A resting order's current state, owned exclusively by the order index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub side: Side,
    pub price: i64,
    pub remaining_size: u32,
}

/// One side of the top of book: best price and the aggregate size there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub price: i64,
    pub size: u64,
}

/// Best bid and ask after a committed apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TopOfBook {
    pub bid: Option<Quote>,
    pub ask: Option<Quote>,
}

impl TopOfBook {
    /// Mid-price in currency units, if both sides are populated.
    #[inline]
    pub fn mid_price(&self) -> Option<f64> {
        match (self.bid, self.ask) {
            (Some(b), Some(a)) => {
                Some((b.price as f64 + a.price as f64) * PRICE_SCALE / 2.0)
            }
            _ => None,
        }
    }

    /// Spread in currency units, if both sides are populated.
    #[inline]
    pub fn spread(&self) -> Option<f64> {
        match (self.bid, self.ask) {
            (Some(b), Some(a)) => Some((a.price - b.price) as f64 * PRICE_SCALE),
            _ => None,
        }
    }
}

/// One price level as seen by consumers: price, aggregate size, order count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelView {
    pub price: i64,
    pub size: u64,
    pub order_count: usize,
}

/// Last informational trade observed on the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastTrade {
    pub price: i64,
    pub size: u32,
    pub ts_event: i64,
}

/// Notification emitted for every committed apply.
///
/// Downstream consumers that maintain their own incremental view subscribe
/// to these instead of polling snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookUpdate {
    /// Sequence of the event that produced this update.
    pub sequence: u64,

    /// Matching-engine timestamp of that event.
    pub ts_event: i64,

    /// The action that was applied.
    pub action: Action,

    /// Which side changed; `None` for Trade and Reset.
    pub side: Side,

    /// Resulting top of book.
    pub top: TopOfBook,

    /// Set when the update came from a Trade event.
    pub last_trade: Option<LastTrade>,
}

/// Immutable point-in-time copy of the full book state.
///
/// Bids are ordered best-first (descending price), asks best-first
/// (ascending price). Safe to hand to a reader while applies continue on
/// the live engine.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BookSnapshot {
    /// Sequence of the last committed event.
    pub sequence: u64,

    /// Matching-engine timestamp of the last committed event.
    pub ts_event: i64,

    /// Bid levels, best-first.
    pub bids: Vec<LevelView>,

    /// Ask levels, best-first.
    pub asks: Vec<LevelView>,

    /// Sum of remaining sizes across all bid orders.
    pub bid_size_total: u64,

    /// Sum of remaining sizes across all ask orders.
    pub ask_size_total: u64,

    /// Number of resting bid orders.
    pub bid_order_total: usize,

    /// Number of resting ask orders.
    pub ask_order_total: usize,

    /// Last informational trade, if any.
    pub last_trade: Option<LastTrade>,
}

impl BookSnapshot {
    /// Best bid as (price, aggregate size), if the bid side is non-empty.
    #[inline]
    pub fn best_bid(&self) -> Option<Quote> {
        self.bids.first().map(|l| Quote {
            price: l.price,
            size: l.size,
        })
    }

    /// Best ask as (price, aggregate size), if the ask side is non-empty.
    #[inline]
    pub fn best_ask(&self) -> Option<Quote> {
        self.asks.first().map(|l| Quote {
            price: l.price,
            size: l.size,
        })
    }

    /// Top of book for both sides.
    #[inline]
    pub fn top_of_book(&self) -> TopOfBook {
        TopOfBook {
            bid: self.best_bid(),
            ask: self.best_ask(),
        }
    }

    /// Mid-price in currency units, if both sides are populated.
    #[inline]
    pub fn mid_price(&self) -> Option<f64> {
        self.top_of_book().mid_price()
    }

    /// Spread in currency units, if both sides are populated.
    #[inline]
    pub fn spread(&self) -> Option<f64> {
        self.top_of_book().spread()
    }

    /// True when neither side has any resting orders.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_byte_round_trip() {
        for action in [
            Action::Add,
            Action::Cancel,
            Action::Modify,
            Action::Fill,
            Action::Trade,
            Action::Reset,
        ] {
            assert_eq!(Action::from_byte(action.to_byte()), Some(action));
        }
        assert_eq!(Action::from_byte(b'X'), None);
    }

    #[test]
    fn test_side_byte_round_trip() {
        assert_eq!(Side::from_byte(b'B'), Some(Side::Bid));
        assert_eq!(Side::from_byte(b'A'), Some(Side::Ask));
        assert_eq!(Side::from_byte(b'N'), Some(Side::None));
        assert_eq!(Side::from_byte(b'Q'), None);
    }

    #[test]
    fn test_side_checks() {
        assert!(Side::Bid.is_bid());
        assert!(!Side::Bid.is_ask());
        assert!(Side::Ask.is_ask());
        assert!(Side::Bid.is_directional());
        assert!(Side::Ask.is_directional());
        assert!(!Side::None.is_directional());
    }

    #[test]
    fn test_event_builder() {
        let event = Event::new(7, Action::Add, Side::Bid, 1001, 100_000_000_000, 50)
            .with_timestamps(1_700_000_000_000_000_000, 1_700_000_000_000_000_500)
            .with_flags(0x80);

        assert_eq!(event.sequence, 7);
        assert_eq!(event.ts_event, 1_700_000_000_000_000_000);
        assert_eq!(event.ts_recv, 1_700_000_000_000_000_500);
        assert_eq!(event.flags, 0x80);
        assert_eq!(event.price_as_f64(), 100.0);
    }

    #[test]
    fn test_validate_add() {
        let ok = Event::new(1, Action::Add, Side::Bid, 1, 100_000_000_000, 10);
        assert!(ok.validate().is_ok());

        let no_id = Event::new(1, Action::Add, Side::Bid, 0, 100_000_000_000, 10);
        assert_eq!(no_id.validate(), Err(BookError::InvalidOrderId(0)));

        let bad_price = Event::new(1, Action::Add, Side::Bid, 1, 0, 10);
        assert_eq!(bad_price.validate(), Err(BookError::InvalidPrice(0)));

        let bad_size = Event::new(1, Action::Add, Side::Bid, 1, 100_000_000_000, 0);
        assert_eq!(bad_size.validate(), Err(BookError::InvalidSize(0)));

        let sideless = Event::new(1, Action::Add, Side::None, 1, 100_000_000_000, 10);
        assert_eq!(
            sideless.validate(),
            Err(BookError::InvalidSide { side: Side::None })
        );
    }

    #[test]
    fn test_validate_modify_allows_zero_size() {
        // Size zero on Modify means cancel; it must pass validation.
        let event = Event::new(1, Action::Modify, Side::Ask, 9, 100_000_000_000, 0);
        assert!(event.validate().is_ok());
    }

    #[test]
    fn test_validate_fill_requires_quantity() {
        let event = Event::new(1, Action::Fill, Side::Ask, 9, 0, 0);
        assert_eq!(event.validate(), Err(BookError::InvalidSize(0)));
    }

    #[test]
    fn test_validate_trade_and_reset_sideless() {
        assert!(Event::new(1, Action::Trade, Side::None, 0, 100, 5)
            .validate()
            .is_ok());
        assert!(Event::new(2, Action::Reset, Side::None, 0, 0, 0)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_top_of_book_mid_and_spread() {
        let top = TopOfBook {
            bid: Some(Quote {
                price: 100_000_000_000,
                size: 10,
            }),
            ask: Some(Quote {
                price: 100_010_000_000,
                size: 5,
            }),
        };

        assert!((top.mid_price().unwrap() - 100.005).abs() < 1e-6);
        assert!((top.spread().unwrap() - 0.01).abs() < 1e-6);

        let one_sided = TopOfBook {
            bid: top.bid,
            ask: None,
        };
        assert!(one_sided.mid_price().is_none());
        assert!(one_sided.spread().is_none());
    }

    #[test]
    fn test_snapshot_accessors() {
        let snapshot = BookSnapshot {
            sequence: 42,
            ts_event: 0,
            bids: vec![
                LevelView {
                    price: 100_000_000_000,
                    size: 15,
                    order_count: 2,
                },
                LevelView {
                    price: 99_990_000_000,
                    size: 4,
                    order_count: 1,
                },
            ],
            asks: vec![LevelView {
                price: 100_010_000_000,
                size: 7,
                order_count: 1,
            }],
            bid_size_total: 19,
            ask_size_total: 7,
            bid_order_total: 3,
            ask_order_total: 1,
            last_trade: None,
        };

        assert_eq!(
            snapshot.best_bid(),
            Some(Quote {
                price: 100_000_000_000,
                size: 15
            })
        );
        assert_eq!(
            snapshot.best_ask(),
            Some(Quote {
                price: 100_010_000_000,
                size: 7
            })
        );
        assert!(!snapshot.is_empty());
        assert!(BookSnapshot::default().is_empty());
    }
}
