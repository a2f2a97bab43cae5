//! Per-tick sensor snapshot.
//!
//! A `SensorSnapshot` is captured once at the start of a tick and reused by
//! every guard and handler in that tick, so logic never sees two different
//! readings of the same channel within one cycle. Readings are bit-packed
//! into `u64` banks, one bit per channel.

use std::time::Instant;

use static_assertions::const_assert;

use crate::consts::MAX_CHANNELS;
use crate::device::{ChannelId, DeviceError, DeviceIo};

const_assert!(MAX_CHANNELS <= u64::BITS as usize);

/// Bit for a channel, or 0 when the id is out of range.
#[inline]
const fn channel_bit(channel: ChannelId) -> u64 {
    if (channel as usize) < MAX_CHANNELS {
        1u64 << channel
    } else {
        0
    }
}

/// Set of channels a controller reads each tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleSet {
    sensors: u64,
    switches: u64,
}

impl SampleSet {
    /// Empty set.
    pub const fn new() -> Self {
        Self {
            sensors: 0,
            switches: 0,
        }
    }

    /// Add a sensor channel.
    #[must_use]
    pub const fn sensor(mut self, channel: ChannelId) -> Self {
        self.sensors |= channel_bit(channel);
        self
    }

    /// Add a switch channel.
    #[must_use]
    pub const fn switch(mut self, channel: ChannelId) -> Self {
        self.switches |= channel_bit(channel);
        self
    }

    /// Add several sensor channels.
    #[must_use]
    pub fn sensors(mut self, channels: &[ChannelId]) -> Self {
        for &ch in channels {
            self = self.sensor(ch);
        }
        self
    }

    /// Union of two sets.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self {
            sensors: self.sensors | other.sensors,
            switches: self.switches | other.switches,
        }
    }

    /// Whether the set contains the sensor channel.
    #[inline]
    pub const fn has_sensor(&self, channel: ChannelId) -> bool {
        self.sensors & channel_bit(channel) != 0
    }

    /// Whether the set contains the switch channel.
    #[inline]
    pub const fn has_switch(&self, channel: ChannelId) -> bool {
        self.switches & channel_bit(channel) != 0
    }

    /// Number of device reads one capture performs.
    #[inline]
    pub const fn len(&self) -> u32 {
        self.sensors.count_ones() + self.switches.count_ones()
    }

    /// Whether the set is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.sensors == 0 && self.switches == 0
    }
}

/// Iterate the channel ids set in a bank.
fn channels_of(bank: u64) -> impl Iterator<Item = ChannelId> {
    (0..MAX_CHANNELS as u8).filter(move |&ch| bank & (1u64 << ch) != 0)
}

/// Immutable per-tick record of sensor and switch readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorSnapshot {
    sensors: u64,
    switches: u64,
    sampled: SampleSet,
    taken_at: Instant,
}

impl SensorSnapshot {
    /// Empty snapshot taken at `taken_at` (every channel reads `false`).
    pub const fn at(taken_at: Instant) -> Self {
        Self {
            sensors: 0,
            switches: 0,
            sampled: SampleSet::new(),
            taken_at,
        }
    }

    /// Read every channel in `set` from the device, once.
    ///
    /// # Errors
    /// Returns the first `DeviceError` raised by the device; no partial
    /// snapshot is produced.
    pub fn capture<D: DeviceIo + ?Sized>(
        device: &mut D,
        set: &SampleSet,
        taken_at: Instant,
    ) -> Result<Self, DeviceError> {
        let mut snap = Self::at(taken_at);
        for ch in channels_of(set.sensors) {
            snap = snap.with_sensor(ch, device.read_sensor(ch)?);
        }
        for ch in channels_of(set.switches) {
            snap = snap.with_switch(ch, device.read_switch(ch)?);
        }
        Ok(snap)
    }

    /// Copy with a sensor reading set.
    #[must_use]
    pub const fn with_sensor(mut self, channel: ChannelId, value: bool) -> Self {
        let bit = channel_bit(channel);
        self.sampled = self.sampled.sensor(channel);
        if value {
            self.sensors |= bit;
        } else {
            self.sensors &= !bit;
        }
        self
    }

    /// Copy with a switch reading set.
    #[must_use]
    pub const fn with_switch(mut self, channel: ChannelId, value: bool) -> Self {
        let bit = channel_bit(channel);
        self.sampled = self.sampled.switch(channel);
        if value {
            self.switches |= bit;
        } else {
            self.switches &= !bit;
        }
        self
    }

    /// Sensor reading (`false` if the channel was not sampled).
    #[inline]
    pub const fn sensor(&self, channel: ChannelId) -> bool {
        self.sensors & channel_bit(channel) != 0
    }

    /// Switch reading (`false` if the channel was not sampled).
    #[inline]
    pub const fn switch(&self, channel: ChannelId) -> bool {
        self.switches & channel_bit(channel) != 0
    }

    /// Channels that were actually read.
    #[inline]
    pub const fn sampled(&self) -> &SampleSet {
        &self.sampled
    }

    /// Capture time.
    #[inline]
    pub const fn taken_at(&self) -> Instant {
        self.taken_at
    }
}
