//! CAN bus configuration and bit timing

use core::ops::RangeInclusive;
use fugit::HertzU32;

/// Configuration for the CAN bus
#[derive(Copy, Clone)]
pub struct CanConfig {
    /// The bitrate of the bus. The peripheral clock must be divisible into
    /// time quanta such that a whole number of quanta makes up one bit time
    /// at this rate.
    pub bitrate: HertzU32,
    /// Start in loop back mode; transmitted frames are mirrored into the
    /// receive path without touching the bus. See also
    /// [`Can::enable_self_test`](crate::bus::Can::enable_self_test).
    pub loopback: bool,
}

impl CanConfig {
    /// Create an instance
    ///
    /// The bitrate must be provided, all other settings come pre-populated
    /// with default values.
    pub fn new(bitrate: HertzU32) -> Self {
        Self {
            bitrate,
            loopback: false,
        }
    }
}

/// Bit-timing divisors
///
/// The bit time is determined by
/// - the time quantum `t_q`, a multiple of the peripheral clock period
///   selected by `prescaler`
/// - the number of time quanta in a bit time: one fixed synchronization
///   quantum, `propagation`, `phase_seg_1` and `phase_seg_2`
///
/// All values are *real* quanta counts; the extra `- 1` expected by the
/// hardware register is applied when the register is written.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BitTiming {
    /// Divider from the peripheral clock to the quantum clock
    pub prescaler: u16,
    /// Synchronization jump width
    pub sjw: u8,
    /// Quanta compensating for physical propagation delay
    pub propagation: u8,
    /// Time before the sample point, excluding synchronization and
    /// propagation
    pub phase_seg_1: u8,
    /// Time after the sample point
    pub phase_seg_2: u8,
}

/// Misconfigurations of the bus timing
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BitTimingError {
    /// The peripheral clock or the requested bitrate is zero
    ZeroRate,
    /// No prescaler/quanta combination reproduces the requested bitrate
    ///
    /// `can_clock` must be divisible by `bitrate * quanta` for some quanta
    /// count within the register field limits.
    NoValidPrescaler {
        /// Provided peripheral clock
        can_clock: HertzU32,
        /// Requested bitrate
        bitrate: HertzU32,
    },
}

/// Quanta counts per bit the calculator is allowed to pick from
const QUANTA_PER_BIT: RangeInclusive<u32> = 8..=25;
/// BRP is a 10-bit field
const PRESCALER_MAX: u32 = 1024;
/// TS1 is a 4-bit field and covers propagation plus phase segment 1
const SEG1_QUANTA_MAX: u32 = 16;
/// Phase segment 2 is capped by the 3-bit TS2 field
const SEG2_QUANTA_MAX: u32 = 7;

impl BitTiming {
    /// Returns the number of time quanta that make up one bit time,
    /// `t_bit / t_q`
    pub fn time_quanta_per_bit(&self) -> u32 {
        1 + u32::from(self.propagation) + u32::from(self.phase_seg_1) + u32::from(self.phase_seg_2)
    }

    /// Derives divisors reproducing `bitrate` from the `can_clock` frequency.
    ///
    /// Picks the largest quanta count for which
    /// `can_clock == bitrate * prescaler * quanta` holds exactly with an
    /// in-range prescaler. Sync and propagation take one quantum each and the
    /// remainder is split evenly between the phase segments; whatever does
    /// not fit into phase segment 2 is moved in front of the sample point.
    pub fn calculate(can_clock: HertzU32, bitrate: HertzU32) -> Result<Self, BitTimingError> {
        if can_clock.to_Hz() == 0 || bitrate.to_Hz() == 0 {
            return Err(BitTimingError::ZeroRate);
        }
        for quanta in QUANTA_PER_BIT.rev() {
            let quantum_rate = match bitrate.to_Hz().checked_mul(quanta) {
                Some(rate) => rate,
                None => continue,
            };
            if can_clock.to_Hz() % quantum_rate != 0 {
                continue;
            }
            let prescaler = can_clock.to_Hz() / quantum_rate;
            if !(1..=PRESCALER_MAX).contains(&prescaler) {
                continue;
            }
            let rest = quanta - 2;
            let mut phase_seg_2 = rest / 2;
            let mut phase_seg_1 = rest - phase_seg_2;
            if phase_seg_2 > SEG2_QUANTA_MAX {
                phase_seg_1 += phase_seg_2 - SEG2_QUANTA_MAX;
                phase_seg_2 = SEG2_QUANTA_MAX;
            }
            if 1 + phase_seg_1 > SEG1_QUANTA_MAX {
                continue;
            }
            return Ok(Self {
                prescaler: prescaler as u16,
                sjw: 1,
                propagation: 1,
                phase_seg_1: phase_seg_1 as u8,
                phase_seg_2: phase_seg_2 as u8,
            });
        }
        Err(BitTimingError::NoValidPrescaler { can_clock, bitrate })
    }
}
