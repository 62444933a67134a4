use std::{fmt, time::Duration};

/// Multiplier used by the rate units. Kilo means 1024 here, not 1000.
const KILO: u64 = 1024;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// A link throughput, stored as bits per second.
///
/// Constructed from kilobits or megabits per second where kilo = 1024:
///
/// ```
/// use linkio::Rate;
///
/// assert_eq!(Rate::kbps(30).bits_per_sec(), 30 * 1024);
/// assert_eq!(Rate::mbps(1), Rate::kbps(1024));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rate(u64);

impl Rate {
    /// Creates a rate of `kbps` kilobits per second.
    pub const fn kbps(kbps: u64) -> Self {
        Self(kbps.saturating_mul(KILO))
    }

    /// Creates a rate of `mbps` megabits per second.
    pub const fn mbps(mbps: u64) -> Self {
        Self(mbps.saturating_mul(KILO * KILO))
    }

    /// Creates a rate of `bits` bits per second.
    pub const fn bps(bits: u64) -> Self {
        Self(bits)
    }

    /// This rate in bits per second.
    pub const fn bits_per_sec(&self) -> u64 {
        self.0
    }

    /// This rate in whole kilobits per second.
    pub const fn as_kbps(&self) -> u64 {
        self.0 / KILO
    }

    /// Whether this rate is zero. A zero rate cannot drive a link.
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Integer nanoseconds per bit at this rate, rounded down.
    pub const fn nanos_per_bit(&self) -> u64 {
        if self.0 == 0 {
            0
        } else {
            NANOS_PER_SEC as u64 / self.0
        }
    }

    /// The time it takes to move `bytes` bytes at this rate, rounded up to
    /// the next nanosecond.
    ///
    /// The intermediate product is computed in `u128` so large transfers at
    /// low rates cannot overflow.
    pub fn delay_for(&self, bytes: usize) -> Duration {
        if self.0 == 0 {
            return Duration::ZERO;
        }

        let bits = (bytes as u128).saturating_mul(8);
        let bps = self.0 as u128;
        let nanos = (bits.saturating_mul(NANOS_PER_SEC) + (bps - 1)) / bps;

        Duration::from_nanos(nanos.min(u64::MAX as u128) as u64)
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 >= KILO * KILO && self.0 % (KILO * KILO) == 0 {
            write!(f, "{} Mbps", self.0 / (KILO * KILO))
        } else if self.0 >= KILO && self.0 % KILO == 0 {
            write!(f, "{} Kbps", self.0 / KILO)
        } else {
            write!(f, "{} bps", self.0)
        }
    }
}
