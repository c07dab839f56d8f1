use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Runtime-mutable replication parameters.
///
/// Each field is an independent atomic scalar: the leader samples them at the
/// start of every write and the replication client samples the delay bounds
/// at the start of every send, so a `/config` update takes effect on the next
/// operation without restart. No cross-field snapshot is taken; updating
/// quorum and delays together is not atomic and does not need to be.
pub struct RuntimeSettings {
    write_quorum: AtomicUsize,
    min_delay_ms: AtomicU64,
    max_delay_ms: AtomicU64,
}

impl RuntimeSettings {
    pub fn new(write_quorum: usize, min_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            write_quorum: AtomicUsize::new(write_quorum),
            min_delay_ms: AtomicU64::new(min_delay_ms),
            max_delay_ms: AtomicU64::new(max_delay_ms),
        }
    }

    pub fn write_quorum(&self) -> usize {
        self.write_quorum.load(Ordering::Relaxed)
    }

    pub fn set_write_quorum(&self, quorum: usize) {
        self.write_quorum.store(quorum, Ordering::Relaxed);
    }

    pub fn min_delay_ms(&self) -> u64 {
        self.min_delay_ms.load(Ordering::Relaxed)
    }

    pub fn set_min_delay_ms(&self, millis: u64) {
        self.min_delay_ms.store(millis, Ordering::Relaxed);
    }

    pub fn max_delay_ms(&self) -> u64 {
        self.max_delay_ms.load(Ordering::Relaxed)
    }

    pub fn set_max_delay_ms(&self, millis: u64) {
        self.max_delay_ms.store(millis, Ordering::Relaxed);
    }

    /// Effective delay bounds for one send. The upper bound is clamped to at
    /// least the lower bound so a misconfigured `min > max` never panics the
    /// random sampler.
    pub fn delay_range(&self) -> (u64, u64) {
        let min = self.min_delay_ms();
        let max = self.max_delay_ms();
        (min, max.max(min))
    }
}
