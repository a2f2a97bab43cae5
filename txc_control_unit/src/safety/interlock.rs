//! Emergency-stop interlock.
//!
//! Trips when every listed emergency sensor reads active in the same
//! snapshot. Evaluation is pure; the caller forces actuators off.

use txc_common::config::ChannelList;
use txc_common::device::ChannelId;
use txc_common::snapshot::{SampleSet, SensorSnapshot};

/// AND-combination of emergency sensors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmergencyInterlock {
    sensors: ChannelList,
}

impl EmergencyInterlock {
    /// Interlock over `sensors`.
    ///
    /// An empty list never trips; configuration validation rejects it.
    pub fn new(sensors: ChannelList) -> Self {
        Self { sensors }
    }

    /// Emergency sensor channels.
    pub fn sensors(&self) -> &[ChannelId] {
        self.sensors.as_slice()
    }

    /// Channels the interlock needs sampled.
    pub fn sample_set(&self) -> SampleSet {
        SampleSet::new().sensors(self.sensors.as_slice())
    }

    /// Whether all emergency sensors are active in `snapshot`.
    pub fn is_tripped(&self, snapshot: &SensorSnapshot) -> bool {
        !self.sensors.is_empty() && self.sensors.iter().all(|&ch| snapshot.sensor(ch))
    }
}
