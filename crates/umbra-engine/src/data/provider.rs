use std::time::Instant;

use super::SignalCell;

/// A lifecycle-managed source of one typed value.
///
/// Providers are created lazily by the registry on first read and started
/// immediately; they are stopped together when the engine shuts down.
pub trait DataProvider<T> {
    fn start(&mut self) {}

    fn stop(&mut self) {}

    /// Samples the current value. `None` means "nothing to report yet".
    fn value(&mut self) -> Option<T>;
}

/// Provider that always yields the same value.
#[derive(Debug, Clone)]
pub struct ConstantProvider<T> {
    value: T,
}

impl<T> ConstantProvider<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }
}

impl<T: Clone> DataProvider<T> for ConstantProvider<T> {
    fn value(&mut self) -> Option<T> {
        Some(self.value.clone())
    }
}

/// Seconds elapsed since the provider was started.
///
/// Reports `0.0` until started.
#[derive(Debug, Default)]
pub struct TimeProvider {
    started: Option<Instant>,
}

impl TimeProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DataProvider<f32> for TimeProvider {
    fn start(&mut self) {
        self.started = Some(Instant::now());
    }

    fn stop(&mut self) {
        self.started = None;
    }

    fn value(&mut self) -> Option<f32> {
        Some(
            self.started
                .map(|t| t.elapsed().as_secs_f32())
                .unwrap_or(0.0),
        )
    }
}

/// Samples a [`SignalCell`] written by another thread, optionally mapping the value.
pub struct SignalProvider<T> {
    read: Box<dyn FnMut() -> Option<T>>,
}

impl<T: Clone + 'static> SignalProvider<T> {
    pub fn new(cell: SignalCell<T>) -> Self {
        Self {
            read: Box::new(move || cell.get()),
        }
    }
}

impl<T: 'static> SignalProvider<T> {
    /// Derives a value from another signal on every read.
    pub fn mapped<S, F>(cell: SignalCell<S>, map: F) -> Self
    where
        S: Clone + 'static,
        F: Fn(S) -> T + 'static,
    {
        Self {
            read: Box::new(move || cell.get().map(&map)),
        }
    }
}

impl<T> DataProvider<T> for SignalProvider<T> {
    fn value(&mut self) -> Option<T> {
        (self.read)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_provider_reports_zero_before_start() {
        let mut time = TimeProvider::new();
        assert_eq!(time.value(), Some(0.0));

        time.start();
        assert!(time.value().is_some_and(|t| t >= 0.0));

        time.stop();
        assert_eq!(time.value(), Some(0.0));
    }

    #[test]
    fn constant_provider_repeats_value() {
        let mut p = ConstantProvider::new(7u32);
        assert_eq!(p.value(), Some(7));
        assert_eq!(p.value(), Some(7));
    }

    #[test]
    fn signal_provider_tracks_cell() {
        let cell = SignalCell::empty();
        let mut p = SignalProvider::new(cell.clone());
        assert_eq!(p.value(), None);

        cell.publish(true);
        assert_eq!(p.value(), Some(true));
    }

    #[test]
    fn mapped_signal_provider_applies_map() {
        let cell = SignalCell::new(10u32);
        let mut p = SignalProvider::mapped(cell.clone(), |v| v * 2);
        assert_eq!(p.value(), Some(20));

        cell.publish(4);
        assert_eq!(p.value(), Some(8));
    }
}
