//! Book engine: applies one event at a time to the order and price-level
//! indices, enforcing invariants, and exposes the read-only query surface.
//!
//! One `apply` call is the atomic unit of state change. Precondition checks
//! run before the first index mutation, so a rejected event leaves no
//! partial state behind. Events for one instrument must arrive with
//! strictly increasing sequence numbers; stale events are dropped and holes
//! are handled per the configured [`GapPolicy`].

use crate::book::ladder::Ladder;
use crate::book::order_index::OrderIndex;
use crate::error::{BookError, Result};
use crate::types::{
    Action, BookSnapshot, BookUpdate, Event, LastTrade, LevelView, Order, Quote, Side, TopOfBook,
};
use crate::warnings::{WarningCategory, WarningTracker};

/// How to handle a hole in the sequence stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GapPolicy {
    /// Reject the gapped event and everything after it until a Reset
    /// re-baselines the stream. The safe default for a live book.
    #[default]
    Strict,

    /// Apply events across holes of at most `max_gap` missing messages,
    /// recording a warning. Larger holes behave as `Strict`.
    Tolerate { max_gap: u64 },
}

/// Configuration for book engine behavior.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How to handle sequence holes.
    pub gap_policy: GapPolicy,

    /// Whether to validate event fields before applying.
    pub validate_events: bool,

    /// Whether to log anomalies via the `log` facade.
    pub log_warnings: bool,

    /// How many warning detail records to retain (counts are unbounded).
    pub warning_retention: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            gap_policy: GapPolicy::Strict,
            validate_events: true,
            log_warnings: true,
            warning_retention: WarningTracker::DEFAULT_MAX_RETAINED,
        }
    }
}

impl EngineConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the gap policy.
    pub fn with_gap_policy(mut self, policy: GapPolicy) -> Self {
        self.gap_policy = policy;
        self
    }

    /// Enable/disable event validation.
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate_events = validate;
        self
    }

    /// Enable/disable warning logs.
    pub fn with_logging(mut self, log: bool) -> Self {
        self.log_warnings = log;
        self
    }

    /// Set the warning detail retention cap.
    pub fn with_warning_retention(mut self, retention: usize) -> Self {
        self.warning_retention = retention;
        self
    }
}

/// Counters for monitoring engine health.
#[derive(Debug, Clone, Default)]
pub struct EngineStats {
    /// Events committed (including Trade and Reset).
    pub events_applied: u64,

    /// Informational trades observed.
    pub trades_seen: u64,

    /// Adds rejected because the order id was already resting.
    pub duplicate_orders: u64,

    /// Cancel/Modify/Fill rejected for an unknown order id.
    pub unknown_orders: u64,

    /// Events dropped with a sequence at or behind the last applied.
    pub stale_events: u64,

    /// Holes detected in the sequence stream.
    pub sequence_gaps: u64,

    /// Events rejected by field validation.
    pub validation_failures: u64,

    /// Cross-index consistency failures (engine bugs).
    pub invariant_violations: u64,

    /// Reset events applied.
    pub resets: u64,

    /// Resting orders after the last committed apply.
    pub active_orders: usize,

    /// Distinct bid prices after the last committed apply.
    pub bid_levels: usize,

    /// Distinct ask prices after the last committed apply.
    pub ask_levels: usize,

    /// Matching-engine timestamp of the last committed apply.
    pub last_ts_event: Option<i64>,
}

/// Why the engine is refusing non-Reset events.
#[derive(Debug, Clone)]
enum Halt {
    /// Strict gap policy tripped; `expected` is the sequence that never
    /// arrived.
    Gap { expected: u64 },

    /// An invariant violation was detected; the detail is replayed to
    /// every caller until Reset.
    Poisoned(String),
}

/// Live limit order book for one instrument.
///
/// Constructed by the caller and owned as a plain value; one engine per
/// instrument, no shared or global state. The feed adapter is the single
/// writer; readers use [`BookEngine::snapshot`] or wrap the engine in
/// [`crate::book::shared::SharedBook`].
#[derive(Debug, Clone)]
pub struct BookEngine {
    config: EngineConfig,
    orders: OrderIndex,
    bids: Ladder,
    asks: Ladder,
    last_sequence: Option<u64>,
    halt: Option<Halt>,
    last_trade: Option<LastTrade>,
    stats: EngineStats,
    warnings: WarningTracker,
}

impl Default for BookEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl BookEngine {
    /// Create an empty book with the default configuration.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create an empty book with a custom configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        let warnings = WarningTracker::with_max_retained(config.warning_retention);
        Self {
            config,
            orders: OrderIndex::new(),
            bids: Ladder::new(Side::Bid),
            asks: Ladder::new(Side::Ask),
            last_sequence: None,
            halt: None,
            last_trade: None,
            stats: EngineStats::default(),
            warnings,
        }
    }

    /// Current configuration.
    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Apply one event to the book.
    ///
    /// Returns the committed-update notification on success. Per-event
    /// errors (duplicate, unknown, stale, gap, validation) reject the event
    /// and leave the book unchanged; the engine stays usable. An
    /// [`BookError::InvariantViolation`] marks the engine unusable until a
    /// Reset event arrives.
    pub fn apply(&mut self, event: &Event) -> Result<BookUpdate> {
        // Reset bypasses sequencing: it is exactly how a caller recovers
        // from a gap halt or a poisoned book, and it re-baselines the
        // sequence counter.
        if event.action != Action::Reset {
            self.check_sequencing(event)?;

            if self.config.validate_events {
                if let Err(err) = event.validate() {
                    // A malformed event still consumed its slot in the
                    // stream; not advancing here would fake a gap.
                    self.last_sequence = Some(event.sequence);
                    return Err(self.note_rejection(event, err));
                }
            }

            self.last_sequence = Some(event.sequence);
        }

        let side = match event.action {
            Action::Add => self.apply_add(event),
            Action::Cancel => self.apply_cancel(event),
            Action::Modify => self.apply_modify(event),
            Action::Fill => self.apply_fill(event),
            Action::Trade => self.apply_trade(event),
            Action::Reset => Ok(self.apply_reset(event)),
        };
        let side = match side {
            Ok(side) => side,
            Err(err) => return Err(self.note_rejection(event, err)),
        };

        self.stats.events_applied += 1;
        self.stats.active_orders = self.orders.len();
        self.stats.bid_levels = self.bids.level_count();
        self.stats.ask_levels = self.asks.level_count();
        self.stats.last_ts_event = Some(event.ts_event);

        #[cfg(debug_assertions)]
        if let Err(err) = self.check_integrity() {
            debug_assert!(false, "post-apply integrity: {err}");
        }

        Ok(BookUpdate {
            sequence: event.sequence,
            ts_event: event.ts_event,
            action: event.action,
            side,
            top: self.top_of_book(),
            last_trade: match event.action {
                Action::Trade => self.last_trade,
                _ => None,
            },
        })
    }

    /// Stale / halted / gap handling, in that order.
    fn check_sequencing(&mut self, event: &Event) -> Result<()> {
        if let Some(last) = self.last_sequence {
            if event.sequence <= last {
                self.stats.stale_events += 1;
                self.warnings.record(
                    WarningCategory::StaleEvent,
                    format!("sequence {} at or behind {last}", event.sequence),
                    Some(event.sequence),
                    None,
                    Some(event.ts_event),
                );
                if self.config.log_warnings {
                    log::debug!(
                        "dropped stale event: sequence {} at or behind {last}",
                        event.sequence
                    );
                }
                return Err(BookError::StaleEvent {
                    sequence: event.sequence,
                    last_applied: last,
                });
            }
        }

        match &self.halt {
            Some(Halt::Gap { expected }) => {
                return Err(BookError::SequenceGap {
                    expected: *expected,
                    got: event.sequence,
                });
            }
            Some(Halt::Poisoned(detail)) => {
                return Err(BookError::InvariantViolation(detail.clone()));
            }
            None => {}
        }

        if let Some(last) = self.last_sequence {
            let expected = last + 1;
            if event.sequence > expected {
                let missing = event.sequence - expected;
                self.stats.sequence_gaps += 1;
                self.warnings.record(
                    WarningCategory::SequenceGap,
                    format!("expected {expected}, got {} ({missing} missing)", event.sequence),
                    Some(event.sequence),
                    None,
                    Some(event.ts_event),
                );
                if self.config.log_warnings {
                    log::warn!(
                        "sequence gap: expected {expected}, got {} ({missing} missing)",
                        event.sequence
                    );
                }

                let tolerated = match self.config.gap_policy {
                    GapPolicy::Strict => false,
                    GapPolicy::Tolerate { max_gap } => missing <= max_gap,
                };
                if !tolerated {
                    self.halt = Some(Halt::Gap { expected });
                    return Err(BookError::SequenceGap {
                        expected,
                        got: event.sequence,
                    });
                }
            }
        }

        Ok(())
    }

    /// Count, record, and (for invariant violations) poison; returns the
    /// error for propagation.
    fn note_rejection(&mut self, event: &Event, err: BookError) -> BookError {
        match &err {
            BookError::DuplicateOrder(order_id) => {
                self.stats.duplicate_orders += 1;
                self.warnings.record(
                    WarningCategory::DuplicateOrder,
                    format!("add for resting order {order_id}"),
                    Some(event.sequence),
                    Some(*order_id),
                    Some(event.ts_event),
                );
                if self.config.log_warnings {
                    log::warn!("rejected add: order {order_id} already resting");
                }
            }
            BookError::UnknownOrder(order_id) => {
                self.stats.unknown_orders += 1;
                self.warnings.record(
                    WarningCategory::UnknownOrder,
                    format!("{:?} for unknown order {order_id}", event.action),
                    Some(event.sequence),
                    Some(*order_id),
                    Some(event.ts_event),
                );
                if self.config.log_warnings {
                    log::warn!(
                        "rejected {:?}: order {order_id} not resting",
                        event.action
                    );
                }
            }
            BookError::InvariantViolation(detail) => {
                self.stats.invariant_violations += 1;
                self.halt = Some(Halt::Poisoned(detail.clone()));
                self.warnings.record(
                    WarningCategory::InvariantViolation,
                    detail.clone(),
                    Some(event.sequence),
                    Some(event.order_id),
                    Some(event.ts_event),
                );
                if self.config.log_warnings {
                    log::error!("book integrity violated, halting until reset: {detail}");
                }
            }
            BookError::InvalidOrderId(_)
            | BookError::InvalidPrice(_)
            | BookError::InvalidSize(_)
            | BookError::InvalidSide { .. } => {
                self.stats.validation_failures += 1;
                self.warnings.record(
                    WarningCategory::ValidationFailure,
                    err.to_string(),
                    Some(event.sequence),
                    Some(event.order_id),
                    Some(event.ts_event),
                );
            }
            _ => {}
        }
        err
    }

    fn ladder_mut(&mut self, side: Side) -> Result<&mut Ladder> {
        match side {
            Side::Bid => Ok(&mut self.bids),
            Side::Ask => Ok(&mut self.asks),
            Side::None => Err(BookError::InvalidSide { side }),
        }
    }

    fn apply_add(&mut self, event: &Event) -> Result<Side> {
        if self.orders.contains(event.order_id) {
            return Err(BookError::DuplicateOrder(event.order_id));
        }

        let ladder = self.ladder_mut(event.side)?;
        if !ladder.add_order(event.price, event.order_id, event.size) {
            return Err(BookError::InvariantViolation(format!(
                "order {} already a member of {:?} level {} but absent from the order index",
                event.order_id, event.side, event.price
            )));
        }
        self.orders.insert(
            event.order_id,
            Order {
                side: event.side,
                price: event.price,
                remaining_size: event.size,
            },
        );
        Ok(event.side)
    }

    fn apply_cancel(&mut self, event: &Event) -> Result<Side> {
        let order = self
            .orders
            .get(event.order_id)
            .ok_or(BookError::UnknownOrder(event.order_id))?;
        self.remove_resting(event.order_id, order)?;
        Ok(order.side)
    }

    fn apply_modify(&mut self, event: &Event) -> Result<Side> {
        let order = self
            .orders
            .get(event.order_id)
            .ok_or(BookError::UnknownOrder(event.order_id))?;

        // Size zero is a cancel in modify clothing.
        if event.size == 0 {
            self.remove_resting(event.order_id, order)?;
            return Ok(order.side);
        }

        if event.price != order.price || event.side != order.side {
            // Relocation: out of the old level as a cancel (the order id
            // stays alive), in at the new price as an add. The target side
            // is checked up front so rejection cannot strand a half-moved
            // order.
            if !event.side.is_directional() {
                return Err(BookError::InvalidSide { side: event.side });
            }
            let old = self.ladder_mut(order.side)?;
            if !old.remove_order(order.price, event.order_id, order.remaining_size) {
                return Err(BookError::InvariantViolation(format!(
                    "order {} missing from {:?} level {}",
                    event.order_id, order.side, order.price
                )));
            }
            let new = self.ladder_mut(event.side)?;
            if !new.add_order(event.price, event.order_id, event.size) {
                return Err(BookError::InvariantViolation(format!(
                    "order {} already a member of {:?} level {}",
                    event.order_id, event.side, event.price
                )));
            }
            self.orders
                .relocate(event.order_id, event.side, event.price, event.size);
            return Ok(event.side);
        }

        // Size-only modify at the same price.
        let delta = i64::from(event.size) - i64::from(order.remaining_size);
        let ladder = self.ladder_mut(order.side)?;
        if !ladder.adjust_order(order.price, delta) {
            return Err(BookError::InvariantViolation(format!(
                "{:?} level {} missing for resting order {}",
                order.side, order.price, event.order_id
            )));
        }
        self.orders.update_size(event.order_id, event.size);
        Ok(order.side)
    }

    fn apply_fill(&mut self, event: &Event) -> Result<Side> {
        let order = self
            .orders
            .get(event.order_id)
            .ok_or(BookError::UnknownOrder(event.order_id))?;

        // Never fill below zero; a fill for more than rests takes what
        // there is.
        let take = event.size.min(order.remaining_size);
        let remaining = order.remaining_size - take;

        if remaining == 0 {
            self.remove_resting(event.order_id, order)?;
        } else {
            let ladder = self.ladder_mut(order.side)?;
            if !ladder.adjust_order(order.price, -i64::from(take)) {
                return Err(BookError::InvariantViolation(format!(
                    "{:?} level {} missing for resting order {}",
                    order.side, order.price, event.order_id
                )));
            }
            self.orders.update_size(event.order_id, remaining);
        }
        Ok(order.side)
    }

    fn apply_trade(&mut self, event: &Event) -> Result<Side> {
        self.last_trade = Some(LastTrade {
            price: event.price,
            size: event.size,
            ts_event: event.ts_event,
        });
        self.stats.trades_seen += 1;
        Ok(Side::None)
    }

    fn apply_reset(&mut self, event: &Event) -> Side {
        self.bids.clear();
        self.asks.clear();
        self.orders.clear();
        self.last_trade = None;
        self.halt = None;
        self.last_sequence = Some(event.sequence);
        self.stats.resets += 1;
        self.warnings.record(
            WarningCategory::BookReset,
            "book cleared by reset",
            Some(event.sequence),
            None,
            Some(event.ts_event),
        );
        if self.config.log_warnings {
            log::debug!("book reset at sequence {}", event.sequence);
        }
        Side::None
    }

    /// Remove a resting order from its level and the order index (cancel,
    /// modify-to-zero, fill-to-zero).
    fn remove_resting(&mut self, order_id: u64, order: Order) -> Result<()> {
        let ladder = self.ladder_mut(order.side)?;
        if !ladder.remove_order(order.price, order_id, order.remaining_size) {
            return Err(BookError::InvariantViolation(format!(
                "order {order_id} missing from {:?} level {}",
                order.side, order.price
            )));
        }
        self.orders.remove(order_id);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Query surface. Read-only; reflects the state after the most recently
    // committed apply.
    // ------------------------------------------------------------------

    /// Best bid (highest price) and the aggregate size there.
    #[inline]
    pub fn best_bid(&self) -> Option<Quote> {
        self.bids.best()
    }

    /// Best ask (lowest price) and the aggregate size there.
    #[inline]
    pub fn best_ask(&self) -> Option<Quote> {
        self.asks.best()
    }

    /// Top of book for both sides.
    #[inline]
    pub fn top_of_book(&self) -> TopOfBook {
        TopOfBook {
            bid: self.bids.best(),
            ask: self.asks.best(),
        }
    }

    /// Up to `n` levels on one side, best-price-first.
    pub fn depth(&self, side: Side, n: usize) -> Vec<LevelView> {
        match side {
            Side::Bid => self.bids.depth(n),
            Side::Ask => self.asks.depth(n),
            Side::None => Vec::new(),
        }
    }

    /// A resting order's current state.
    #[inline]
    pub fn order(&self, order_id: u64) -> Option<Order> {
        self.orders.get(order_id)
    }

    /// Number of resting orders on one side (O(1)).
    pub fn order_count_total(&self, side: Side) -> usize {
        match side {
            Side::Bid => self.bids.order_count_total(),
            Side::Ask => self.asks.order_count_total(),
            Side::None => 0,
        }
    }

    /// Sum of remaining sizes on one side (O(1)).
    pub fn size_total(&self, side: Side) -> u64 {
        match side {
            Side::Bid => self.bids.size_total(),
            Side::Ask => self.asks.size_total(),
            Side::None => 0,
        }
    }

    /// Total resting orders across both sides.
    #[inline]
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Distinct bid prices.
    #[inline]
    pub fn bid_levels(&self) -> usize {
        self.bids.level_count()
    }

    /// Distinct ask prices.
    #[inline]
    pub fn ask_levels(&self) -> usize {
        self.asks.level_count()
    }

    /// Last informational trade, if any.
    #[inline]
    pub fn last_trade(&self) -> Option<LastTrade> {
        self.last_trade
    }

    /// Sequence of the last applied event.
    #[inline]
    pub fn last_sequence(&self) -> Option<u64> {
        self.last_sequence
    }

    /// Whether the engine is refusing non-Reset events (gap halt or
    /// invariant violation).
    #[inline]
    pub fn is_halted(&self) -> bool {
        self.halt.is_some()
    }

    /// Immutable point-in-time copy of the full book state.
    pub fn snapshot(&self) -> BookSnapshot {
        BookSnapshot {
            sequence: self.last_sequence.unwrap_or(0),
            ts_event: self.stats.last_ts_event.unwrap_or(0),
            bids: self.bids.depth(usize::MAX),
            asks: self.asks.depth(usize::MAX),
            bid_size_total: self.bids.size_total(),
            ask_size_total: self.asks.size_total(),
            bid_order_total: self.bids.order_count_total(),
            ask_order_total: self.asks.order_count_total(),
            last_trade: self.last_trade,
        }
    }

    /// Engine health counters.
    #[inline]
    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    /// The warning record accumulated so far.
    #[inline]
    pub fn warnings(&self) -> &WarningTracker {
        &self.warnings
    }

    /// Clear one side of the book, or both when passed `Side::None`.
    ///
    /// This is an out-of-band operation for session maintenance, not an
    /// event action; sequencing state is untouched.
    pub fn clear_side(&mut self, side: Side) {
        match side {
            Side::Bid => {
                self.bids.clear();
                self.orders.remove_side(Side::Bid);
            }
            Side::Ask => {
                self.asks.clear();
                self.orders.remove_side(Side::Ask);
            }
            Side::None => {
                self.bids.clear();
                self.asks.clear();
                self.orders.clear();
            }
        }
        self.stats.active_orders = self.orders.len();
        self.stats.bid_levels = self.bids.level_count();
        self.stats.ask_levels = self.asks.level_count();
    }

    /// Full cross-index audit.
    ///
    /// Verifies that every resting order appears in exactly the level it
    /// records, that every level member is a resting order with matching
    /// side and price, that cached aggregates and running totals match the
    /// member sums, and that no empty level is retained. O(N) in resting
    /// orders; run automatically after every committed apply in debug
    /// builds.
    pub fn check_integrity(&self) -> Result<()> {
        for (order_id, order) in self.orders.iter() {
            let ladder = match order.side {
                Side::Bid => &self.bids,
                Side::Ask => &self.asks,
                Side::None => {
                    return Err(BookError::InvariantViolation(format!(
                        "order {order_id} indexed with side None"
                    )))
                }
            };
            let level = ladder.level_at(order.price).ok_or_else(|| {
                BookError::InvariantViolation(format!(
                    "order {order_id} records {:?} level {} which does not exist",
                    order.side, order.price
                ))
            })?;
            if !level.contains(order_id) {
                return Err(BookError::InvariantViolation(format!(
                    "order {order_id} absent from its recorded {:?} level {}",
                    order.side, order.price
                )));
            }
        }

        let mut member_total = 0usize;
        for ladder in [&self.bids, &self.asks] {
            let mut side_size = 0u64;
            let mut side_count = 0usize;
            for (price, level) in ladder.iter() {
                if level.is_empty() {
                    return Err(BookError::InvariantViolation(format!(
                        "empty {:?} level {price} retained",
                        ladder.side()
                    )));
                }
                let mut level_sum = 0u64;
                for order_id in level.iter() {
                    let order = self.orders.get(order_id).ok_or_else(|| {
                        BookError::InvariantViolation(format!(
                            "orphan order {order_id} in {:?} level {price}",
                            ladder.side()
                        ))
                    })?;
                    if order.side != ladder.side() || order.price != price {
                        return Err(BookError::InvariantViolation(format!(
                            "order {order_id} member of {:?} level {price} but records {:?} {}",
                            ladder.side(),
                            order.side,
                            order.price
                        )));
                    }
                    level_sum += u64::from(order.remaining_size);
                }
                if level_sum != level.aggregate_size() {
                    return Err(BookError::InvariantViolation(format!(
                        "{:?} level {price} aggregate {} != member sum {level_sum}",
                        ladder.side(),
                        level.aggregate_size()
                    )));
                }
                side_size += level.aggregate_size();
                side_count += level.order_count();
                member_total += level.order_count();
            }
            if side_size != ladder.size_total() || side_count != ladder.order_count_total() {
                return Err(BookError::InvariantViolation(format!(
                    "{:?} totals ({}, {}) != level sums ({side_size}, {side_count})",
                    ladder.side(),
                    ladder.size_total(),
                    ladder.order_count_total()
                )));
            }
        }

        // Membership count equality catches an id resting in two levels.
        if member_total != self.orders.len() {
            return Err(BookError::InvariantViolation(format!(
                "level memberships {member_total} != indexed orders {}",
                self.orders.len()
            )));
        }

        Ok(())
    }
}
