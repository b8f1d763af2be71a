use std::sync::Arc;

use parking_lot::Mutex;

/// Last-write-wins value shared between a producer thread and the render thread.
///
/// Producers call [`publish`](Self::publish) whenever a new sample arrives; the
/// render thread samples with [`get`](Self::get). Only the latest value is
/// kept, there is no queue and no backpressure. Clones share the same slot.
#[derive(Debug)]
pub struct SignalCell<T> {
    slot: Arc<Mutex<Option<T>>>,
}

impl<T> SignalCell<T> {
    /// Creates a cell with no value yet.
    pub fn empty() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
        }
    }

    pub fn new(initial: T) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(initial))),
        }
    }

    /// Replaces the stored value.
    pub fn publish(&self, value: T) {
        *self.slot.lock() = Some(value);
    }

    /// Drops the stored value; readers observe absence until the next publish.
    pub fn clear(&self) {
        *self.slot.lock() = None;
    }
}

impl<T: Clone> SignalCell<T> {
    /// Returns a copy of the latest published value.
    pub fn get(&self) -> Option<T> {
        self.slot.lock().clone()
    }
}

impl<T> Clone for SignalCell<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> Default for SignalCell<T> {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_publish_wins() {
        let cell = SignalCell::new(1);
        cell.publish(2);
        cell.publish(3);
        assert_eq!(cell.get(), Some(3));
    }

    #[test]
    fn clones_share_the_slot() {
        let cell: SignalCell<[f32; 2]> = SignalCell::empty();
        let reader = cell.clone();
        assert_eq!(reader.get(), None);

        cell.publish([0.5, 0.25]);
        assert_eq!(reader.get(), Some([0.5, 0.25]));

        cell.clear();
        assert_eq!(reader.get(), None);
    }

    #[test]
    fn publish_from_another_thread() {
        let cell = SignalCell::new(0.0f32);
        let producer = cell.clone();

        std::thread::spawn(move || producer.publish(0.75))
            .join()
            .unwrap();

        assert_eq!(cell.get(), Some(0.75));
    }
}
