use crate::time::{JIFFIES_PER_SECOND, Jiffies};

#[derive(Clone, Copy, Debug)]
pub enum BandwidthDescription {
    Unbounded,
    Bounded(f64), // Bytes per second
}

impl BandwidthDescription {
    pub(crate) fn transmission_time(&self, size: f64) -> Jiffies {
        match *self {
            BandwidthDescription::Unbounded => Jiffies(0),
            BandwidthDescription::Bounded(rate) => {
                Jiffies((size / rate * JIFFIES_PER_SECOND as f64).ceil() as usize)
            }
        }
    }
}
