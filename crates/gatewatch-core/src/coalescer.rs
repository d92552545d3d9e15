// ── Update coalescer ──
//
// Last-write-wins slot between the event stream and the published state.
// Bursts of events within one frame interval collapse into a single
// publish carrying only the final state; intermediate states are never
// observable downstream.

/// Single-slot coalescer.
///
/// `offer` overwrites the slot; `flush` drains it. The boolean from
/// `offer` tells the caller when a flush needs scheduling: it fires only
/// on the first offer into an empty slot.
#[derive(Debug, Default)]
pub struct Coalescer<T> {
    slot: Option<T>,
}

impl<T> Coalescer<T> {
    pub fn new() -> Self {
        Self { slot: None }
    }

    /// Store a value, replacing any pending one.
    ///
    /// Returns `true` if the slot was empty -- the caller should schedule
    /// a flush. Subsequent offers before that flush return `false`.
    pub fn offer(&mut self, value: T) -> bool {
        let was_empty = self.slot.is_none();
        self.slot = Some(value);
        was_empty
    }

    /// Drain the pending value, if any.
    pub fn flush(&mut self) -> Option<T> {
        self.slot.take()
    }

    /// A flush is pending.
    pub fn is_armed(&self) -> bool {
        self.slot.is_some()
    }

    /// The pending value, without draining it.
    pub fn pending(&self) -> Option<&T> {
        self.slot.as_ref()
    }

    /// Discard any pending value without publishing it.
    pub fn clear(&mut self) {
        self.slot = None;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn burst_collapses_to_last_value() {
        let mut c = Coalescer::new();

        assert!(c.offer(1));
        assert!(!c.offer(2));
        assert!(!c.offer(3));

        assert_eq!(c.flush(), Some(3));
        assert_eq!(c.flush(), None);
    }

    #[test]
    fn offer_rearms_after_flush() {
        let mut c = Coalescer::new();

        assert!(c.offer("a"));
        c.flush();
        assert!(c.offer("b"), "slot emptied by flush, offer must re-arm");
        assert_eq!(c.flush(), Some("b"));
    }

    #[test]
    fn clear_discards_pending_value() {
        let mut c = Coalescer::new();

        c.offer(42);
        assert!(c.is_armed());
        c.clear();
        assert!(!c.is_armed());
        assert_eq!(c.flush(), None);
    }

    #[test]
    fn pending_peeks_without_draining() {
        let mut c = Coalescer::new();
        c.offer(7);
        assert_eq!(c.pending(), Some(&7));
        assert!(c.is_armed());
    }
}
