mod bandwidth;
mod latency;

pub use bandwidth::BandwidthDescription;
pub use latency::LatencyDescription;
pub(crate) use latency::LatencyTopology;

use log::debug;

use crate::time::Jiffies;

/// Prices a transfer between two hosts: sampled latency plus transmission.
pub(crate) struct Network {
    bandwidth: BandwidthDescription,
    latency: LatencyTopology,
}

impl Network {
    pub(crate) fn new(bandwidth: BandwidthDescription, latency: LatencyTopology) -> Self {
        Self { bandwidth, latency }
    }

    pub(crate) fn transfer_time(&mut self, from: &str, to: &str, size: f64) -> Jiffies {
        let duration = self.latency.sample(from, to) + self.bandwidth.transmission_time(size);
        debug!("Transfer of {size} bytes {from} -> {to} takes {duration}");
        duration
    }
}
