use std::sync::atomic::{AtomicU64, Ordering};

/// Last-value gauge storing an `f64` as atomic bit patterns.
///
/// `add`/`sub` are read-modify-write without a CAS loop; the engine only
/// mutates gauges from the single consumer thread, where that is exact.
#[derive(Debug, Default)]
pub struct Gauge {
    value: AtomicU64,
}

impl Gauge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.value.load(Ordering::Relaxed))
    }

    pub fn set(&self, value: f64) {
        self.value.store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn add(&self, value: f64) {
        self.set(self.get() + value);
    }

    pub fn sub(&self, value: f64) {
        self.set(self.get() - value);
    }
}
