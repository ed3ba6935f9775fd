//! Single-value publication cells.

use std::sync::{Mutex, PoisonError};

/// Holds at most one value; every publish replaces the previous one.
///
/// Consumers either take the value (read-once) or clone it (repeatable
/// reads). There is no queue: a slow consumer misses superseded values.
#[derive(Debug)]
pub struct Slot<T> {
    value: Mutex<Option<T>>,
}

impl<T> Slot<T> {
    pub fn new() -> Self {
        Self {
            value: Mutex::new(None),
        }
    }

    /// Stores `value`, returning whatever it replaced.
    pub fn publish(&self, value: T) -> Option<T> {
        self.lock().replace(value)
    }

    /// Removes and returns the current value.
    pub fn take(&self) -> Option<T> {
        self.lock().take()
    }

    pub fn clear(&self) {
        self.lock().take();
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_none()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<T>> {
        // A panic while holding the lock cannot leave a torn Option.
        self.value.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> Slot<T> {
    /// Returns a copy of the current value, leaving it in place.
    pub fn peek(&self) -> Option<T> {
        self.lock().clone()
    }
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_take_is_read_once() {
        let slot = Slot::new();
        slot.publish("alert");

        assert_eq!(slot.take(), Some("alert"));
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn test_last_writer_wins() {
        let slot = Slot::new();
        assert_eq!(slot.publish(1), None);
        assert_eq!(slot.publish(2), Some(1));
        assert_eq!(slot.take(), Some(2));
    }

    #[test]
    fn test_peek_is_repeatable() {
        let slot = Slot::new();
        slot.publish(Arc::new(5u32));

        assert_eq!(slot.peek().as_deref(), Some(&5));
        assert_eq!(slot.peek().as_deref(), Some(&5));
        slot.clear();
        assert!(slot.is_empty());
    }

    #[test]
    fn test_concurrent_publish_and_take_never_tears() {
        let slot = Arc::new(Slot::new());
        let writer = {
            let slot = Arc::clone(&slot);
            std::thread::spawn(move || {
                for i in 0..10_000u64 {
                    slot.publish((i, i.wrapping_mul(31)));
                }
            })
        };

        for _ in 0..10_000 {
            if let Some((a, b)) = slot.take() {
                assert_eq!(b, a.wrapping_mul(31));
            }
        }
        writer.join().unwrap();
    }
}
