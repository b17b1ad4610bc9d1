//! Low-overhead monotonic clock calibrated against wall-clock time.
//!
//! Producers stamp every event with [`Clock::now`], so the conversion from
//! a hardware cycle count to nanoseconds must cost tens of nanoseconds and
//! make no system call. On x86_64 the clock reads the time-stamp counter
//! with the serializing `rdtscp` variant so a timestamp cannot be issued
//! ahead of the instrumented operation it belongs to. Everywhere else, or
//! when calibration fails, it falls back to [`std::time::Instant`] with
//! the same external contract at a higher per-call cost.

use std::time::{Duration, Instant, SystemTime};

use tracing::{debug, info};

/// Nanoseconds of monotonic time since the owning clock's calibration
/// reference point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(0);

    pub fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    pub fn as_nanos(self) -> u64 {
        self.0
    }

    /// Duration elapsed since `earlier`, clamped to zero if `earlier` is
    /// actually later.
    pub fn saturating_duration_since(self, earlier: Timestamp) -> Duration {
        Duration::from_nanos(self.0.saturating_sub(earlier.0))
    }
}

#[derive(Debug)]
enum ClockSource {
    /// Hardware cycle counter, converted through the calibrated ratio.
    #[cfg(target_arch = "x86_64")]
    CycleCounter {
        reference_cycles: u64,
        cycles_per_nano: f64,
    },
    /// Portable fallback reading the OS monotonic clock.
    Monotonic { anchor: Instant },
}

/// Calibrated monotonic clock.
///
/// Calibration runs once, before the processor thread starts; the ratio is
/// immutable for the clock's lifetime. Drift against the wall clock is not
/// re-corrected afterwards, which bounds accuracy to the quality of the
/// one-shot calibration. That is an accepted trade for a conversion path
/// with no synchronization and no syscall.
#[derive(Debug)]
pub struct Clock {
    source: ClockSource,
    /// Wall-clock time at the reference point where [`Timestamp`] reads zero.
    wall_anchor: SystemTime,
}

impl Clock {
    /// Calibrate a new clock by sampling the cycle counter and the wall
    /// clock across `window`.
    ///
    /// An unusable counter or a degenerate calibration window selects the
    /// portable fallback transparently.
    pub fn calibrate(window: Duration) -> Self {
        #[cfg(target_arch = "x86_64")]
        {
            if let Some(clock) = Self::calibrate_cycle_counter(window) {
                return clock;
            }
            info!("cycle counter unavailable, falling back to monotonic clock");
        }

        #[cfg(not(target_arch = "x86_64"))]
        let _ = window;

        Self {
            source: ClockSource::Monotonic {
                anchor: Instant::now(),
            },
            wall_anchor: SystemTime::now(),
        }
    }

    #[cfg(target_arch = "x86_64")]
    fn calibrate_cycle_counter(window: Duration) -> Option<Self> {
        if !cycle_counter_supported() {
            return None;
        }

        let start_cycles = read_cycle_counter();
        let start = Instant::now();
        std::thread::sleep(window);
        let end_cycles = read_cycle_counter();
        let elapsed_nanos = start.elapsed().as_nanos() as u64;

        let delta_cycles = end_cycles.wrapping_sub(start_cycles);
        if elapsed_nanos == 0 || delta_cycles == 0 {
            return None;
        }

        let cycles_per_nano = delta_cycles as f64 / elapsed_nanos as f64;
        if !cycles_per_nano.is_finite() || cycles_per_nano <= 0.0 {
            return None;
        }

        debug!(cycles_per_nano, "calibrated cycle counter clock");

        // The reference pair is sampled after calibration so timestamps
        // start near zero.
        let reference_cycles = read_cycle_counter();
        Some(Self {
            source: ClockSource::CycleCounter {
                reference_cycles,
                cycles_per_nano,
            },
            wall_anchor: SystemTime::now(),
        })
    }

    /// Current monotonic time.
    pub fn now(&self) -> Timestamp {
        match &self.source {
            #[cfg(target_arch = "x86_64")]
            ClockSource::CycleCounter {
                reference_cycles,
                cycles_per_nano,
            } => {
                let delta = read_cycle_counter().wrapping_sub(*reference_cycles);
                Timestamp::from_nanos((delta as f64 / cycles_per_nano) as u64)
            }
            ClockSource::Monotonic { anchor } => {
                Timestamp::from_nanos(anchor.elapsed().as_nanos() as u64)
            }
        }
    }

    /// Convert a timestamp from this clock into wall-clock time using the
    /// calibration anchor.
    pub fn to_system_time(&self, timestamp: Timestamp) -> SystemTime {
        self.wall_anchor + Duration::from_nanos(timestamp.as_nanos())
    }

    /// Whether the hardware cycle counter path was selected at calibration.
    pub fn uses_cycle_counter(&self) -> bool {
        match &self.source {
            #[cfg(target_arch = "x86_64")]
            ClockSource::CycleCounter { .. } => true,
            ClockSource::Monotonic { .. } => false,
        }
    }
}

/// RDTSCP support is advertised in CPUID leaf 0x8000_0001, EDX bit 27.
#[cfg(target_arch = "x86_64")]
fn cycle_counter_supported() -> bool {
    let highest = unsafe { core::arch::x86_64::__cpuid(0x8000_0000) };
    if highest.eax < 0x8000_0001 {
        return false;
    }

    let features = unsafe { core::arch::x86_64::__cpuid(0x8000_0001) };
    features.edx & (1 << 27) != 0
}

/// Read the time-stamp counter with the serializing variant, so the read
/// cannot be reordered ahead of preceding instructions.
#[cfg(target_arch = "x86_64")]
fn read_cycle_counter() -> u64 {
    let mut aux = 0u32;
    // Safety: gated on the CPUID check in `cycle_counter_supported`.
    unsafe { core::arch::x86_64::__rdtscp(&mut aux) }
}
