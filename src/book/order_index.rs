//! Order index: order id → current order state.
//!
//! All operations are O(1) expected. Mutating operations on an absent id
//! return `None` rather than silently succeeding — the engine turns those
//! into reported errors, because they indicate feed/state divergence.

use ahash::AHashMap;

use crate::types::{Order, Side};

/// Mapping from venue order id to the order's current side, price, and
/// remaining size. Owned exclusively by the book engine.
#[derive(Debug, Clone, Default)]
pub struct OrderIndex {
    orders: AHashMap<u64, Order>,
}

impl OrderIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an order by id.
    #[inline]
    pub fn get(&self, order_id: u64) -> Option<Order> {
        self.orders.get(&order_id).copied()
    }

    /// Insert a new order. Returns the previous order if the id was
    /// already present (callers treat that as a duplicate).
    #[inline]
    pub fn insert(&mut self, order_id: u64, order: Order) -> Option<Order> {
        self.orders.insert(order_id, order)
    }

    /// Update an order's remaining size, returning the old size.
    /// `None` if the id is absent.
    #[inline]
    pub fn update_size(&mut self, order_id: u64, new_size: u32) -> Option<u32> {
        self.orders.get_mut(&order_id).map(|order| {
            let old = order.remaining_size;
            order.remaining_size = new_size;
            old
        })
    }

    /// Move an order to a new side/price/size (price-change modify).
    /// `None` if the id is absent.
    #[inline]
    pub fn relocate(
        &mut self,
        order_id: u64,
        side: Side,
        price: i64,
        remaining_size: u32,
    ) -> Option<Order> {
        self.orders.get_mut(&order_id).map(|order| {
            let old = *order;
            order.side = side;
            order.price = price;
            order.remaining_size = remaining_size;
            old
        })
    }

    /// Remove an order, returning its final state. `None` if absent.
    #[inline]
    pub fn remove(&mut self, order_id: u64) -> Option<Order> {
        self.orders.remove(&order_id)
    }

    /// Check whether an id is resting.
    #[inline]
    pub fn contains(&self, order_id: u64) -> bool {
        self.orders.contains_key(&order_id)
    }

    /// Number of resting orders.
    #[inline]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// True when no orders rest.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Drop every order on one side (side-selective clear).
    pub fn remove_side(&mut self, side: Side) {
        self.orders.retain(|_, order| order.side != side);
    }

    /// Clear the whole index.
    #[inline]
    pub fn clear(&mut self) {
        self.orders.clear();
    }

    /// Iterate over all (order_id, order) pairs.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (u64, Order)> + '_ {
        self.orders.iter().map(|(&id, &order)| (id, order))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bid(price: i64, size: u32) -> Order {
        Order {
            side: Side::Bid,
            price,
            remaining_size: size,
        }
    }

    #[test]
    fn test_insert_and_get() {
        let mut index = OrderIndex::new();
        assert!(index.insert(1, bid(100, 10)).is_none());
        assert_eq!(index.get(1), Some(bid(100, 10)));
        assert!(index.get(2).is_none());
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_insert_duplicate_returns_previous() {
        let mut index = OrderIndex::new();
        index.insert(1, bid(100, 10));
        let previous = index.insert(1, bid(200, 5));
        assert_eq!(previous, Some(bid(100, 10)));
    }

    #[test]
    fn test_update_size_absent_is_none() {
        let mut index = OrderIndex::new();
        assert!(index.update_size(99, 5).is_none());

        index.insert(1, bid(100, 10));
        assert_eq!(index.update_size(1, 4), Some(10));
        assert_eq!(index.get(1).unwrap().remaining_size, 4);
    }

    #[test]
    fn test_relocate() {
        let mut index = OrderIndex::new();
        index.insert(1, bid(100, 10));

        let old = index.relocate(1, Side::Ask, 200, 7).unwrap();
        assert_eq!(old, bid(100, 10));

        let moved = index.get(1).unwrap();
        assert_eq!(moved.side, Side::Ask);
        assert_eq!(moved.price, 200);
        assert_eq!(moved.remaining_size, 7);
    }

    #[test]
    fn test_remove_absent_is_none() {
        let mut index = OrderIndex::new();
        assert!(index.remove(1).is_none());

        index.insert(1, bid(100, 10));
        assert_eq!(index.remove(1), Some(bid(100, 10)));
        assert!(index.is_empty());
    }

    #[test]
    fn test_remove_side() {
        let mut index = OrderIndex::new();
        index.insert(1, bid(100, 10));
        index.insert(
            2,
            Order {
                side: Side::Ask,
                price: 105,
                remaining_size: 3,
            },
        );

        index.remove_side(Side::Bid);
        assert!(!index.contains(1));
        assert!(index.contains(2));
    }
}
