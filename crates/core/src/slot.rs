//! Pooled row storage for producers.
//!
//! A producer keeps its most recent output row in a [`SharedRowSlot`]. When
//! it needs the next row it asks the slot for a mutable one: if nobody
//! downstream still holds the previous row, that same allocation is handed
//! back for in-place reuse; otherwise a fresh row is allocated and the
//! retained one is left untouched. Mutation is only possible through
//! `Rc::make_mut`/`Rc::get_mut` on a uniquely owned handle, so a row that is
//! still shared can never be overwritten.

use alloc::rc::Rc;

/// Holds at most one pooled row of type `R`.
#[derive(Debug)]
pub struct SharedRowSlot<R> {
    held: Option<Rc<R>>,
    reuse: bool,
    allocations: u64,
}

impl<R> Default for SharedRowSlot<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> SharedRowSlot<R> {
    /// Creates an empty slot with reuse enabled.
    pub fn new() -> Self {
        Self {
            held: None,
            reuse: true,
            allocations: 0,
        }
    }

    /// Enables or disables in-place reuse. With reuse disabled every call to
    /// [`SharedRowSlot::reuse_or_alloc`] allocates.
    pub fn with_reuse(mut self, reuse: bool) -> Self {
        self.reuse = reuse;
        self
    }

    /// Returns true if no row is held.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.held.is_none()
    }

    /// Returns true if the held row has another holder besides this slot.
    #[inline]
    pub fn is_shared(&self) -> bool {
        self.held
            .as_ref()
            .is_some_and(|row| Rc::strong_count(row) > 1)
    }

    /// Replaces the held row.
    pub fn hold(&mut self, row: R) {
        self.held = Some(Rc::new(row));
        self.allocations += 1;
    }

    /// Returns the held row.
    pub fn get(&self) -> Option<&R> {
        self.held.as_deref()
    }

    /// Acquires another handle to the held row.
    pub fn share(&self) -> Option<Rc<R>> {
        self.held.clone()
    }

    /// Gives up this slot's handle, leaving the slot empty.
    pub fn release(&mut self) -> Option<Rc<R>> {
        self.held.take()
    }

    /// Returns the held row mutably if nobody else holds it.
    pub fn get_mut_if_unique(&mut self) -> Option<&mut R> {
        self.held.as_mut().and_then(Rc::get_mut)
    }

    /// Number of rows this slot has allocated.
    #[inline]
    pub fn allocations(&self) -> u64 {
        self.allocations
    }
}

impl<R: Clone> SharedRowSlot<R> {
    /// Returns a row that is safe to overwrite.
    ///
    /// The held row is returned when it is not shared and reuse is enabled;
    /// otherwise the slot drops its handle and holds a new row built by `init`.
    pub fn reuse_or_alloc(&mut self, init: impl FnOnce() -> R) -> &mut R {
        // unique at this point, so this never clones
        Rc::make_mut(self.writable(init))
    }

    /// Overwrites a reusable row with `fill` and hands out a handle to it.
    pub fn produce(&mut self, init: impl FnOnce() -> R, fill: impl FnOnce(&mut R)) -> Rc<R> {
        let held = self.writable(init);
        fill(Rc::make_mut(held));
        Rc::clone(held)
    }

    fn writable(&mut self, init: impl FnOnce() -> R) -> &mut Rc<R> {
        let reusable = self.reuse
            && self
                .held
                .as_ref()
                .is_some_and(|row| Rc::strong_count(row) == 1);
        if !reusable {
            self.held = None;
        }
        let allocations = &mut self.allocations;
        self.held.get_or_insert_with(|| {
            *allocations += 1;
            Rc::new(init())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Cell(i64);

    #[test]
    fn test_empty_slot() {
        let slot: SharedRowSlot<Cell> = SharedRowSlot::new();
        assert!(slot.is_empty());
        assert!(!slot.is_shared());
        assert!(slot.get().is_none());
    }

    #[test]
    fn test_reuse_when_unshared() {
        let mut slot = SharedRowSlot::new();
        slot.reuse_or_alloc(|| Cell(0)).0 = 1;
        let first = Rc::as_ptr(&slot.share().unwrap());

        slot.reuse_or_alloc(|| Cell(0)).0 = 2;
        let second = Rc::as_ptr(&slot.share().unwrap());

        assert_eq!(first, second);
        assert_eq!(slot.get(), Some(&Cell(2)));
        assert_eq!(slot.allocations(), 1);
    }

    #[test]
    fn test_alloc_when_shared() {
        let mut slot = SharedRowSlot::new();
        slot.reuse_or_alloc(|| Cell(0)).0 = 1;
        let retained = slot.share().unwrap();
        assert!(slot.is_shared());

        slot.reuse_or_alloc(|| Cell(0)).0 = 2;

        assert_eq!(*retained, Cell(1));
        assert_eq!(slot.get(), Some(&Cell(2)));
        assert!(!slot.is_shared());
        assert_eq!(slot.allocations(), 2);
    }

    #[test]
    fn test_reuse_disabled() {
        let mut slot = SharedRowSlot::new().with_reuse(false);
        slot.reuse_or_alloc(|| Cell(0));
        slot.reuse_or_alloc(|| Cell(0));
        assert_eq!(slot.allocations(), 2);
    }

    #[test]
    fn test_get_mut_if_unique() {
        let mut slot = SharedRowSlot::new();
        slot.hold(Cell(5));
        assert!(slot.get_mut_if_unique().is_some());

        let retained = slot.share();
        assert!(slot.get_mut_if_unique().is_none());
        drop(retained);
        assert!(slot.get_mut_if_unique().is_some());
    }

    #[test]
    fn test_produce_hands_out_held_row() {
        let mut slot = SharedRowSlot::new();
        let first = slot.produce(|| Cell(0), |c| c.0 = 7);
        assert_eq!(*first, Cell(7));
        assert!(slot.is_shared());

        // first is still held, so the second row must be a new allocation
        let second = slot.produce(|| Cell(0), |c| c.0 = 8);
        assert_eq!(*first, Cell(7));
        assert_eq!(*second, Cell(8));
        assert!(!Rc::ptr_eq(&first, &second));

        drop(first);
        drop(second);
        let third = slot.produce(|| Cell(0), |c| c.0 = 9);
        assert_eq!(*third, Cell(9));
        assert_eq!(slot.allocations(), 2);
    }

    #[test]
    fn test_release() {
        let mut slot = SharedRowSlot::new();
        slot.hold(Cell(3));
        let row = slot.release().unwrap();
        assert_eq!(*row, Cell(3));
        assert!(slot.is_empty());
    }
}
