use std::collections::HashMap;

use log::debug;

use crate::{
    random::{Distributions, Randomizer},
    time::Jiffies,
};

/// Latency between hosts, declared on the builder.
#[derive(Clone, Copy)]
pub enum LatencyDescription {
    /// Any pair of hosts without a more specific entry.
    Default(Distributions),
    /// Processes talking on the same host.
    WithinHost(&'static str, Distributions),
    /// Both directions between two hosts.
    BetweenHosts(&'static str, &'static str, Distributions),
}

pub(crate) struct LatencyTopology {
    default: Distributions,
    links: HashMap<(String, String), Distributions>,
    randomizer: Randomizer,
}

impl LatencyTopology {
    pub(crate) fn new(descriptions: Vec<LatencyDescription>, randomizer: Randomizer) -> Self {
        let mut default = Distributions::Constant(Jiffies(0));
        let mut links = HashMap::new();
        for d in descriptions {
            match d {
                LatencyDescription::Default(distr) => default = distr,
                LatencyDescription::WithinHost(host, distr) => {
                    links.insert((host.to_string(), host.to_string()), distr);
                }
                LatencyDescription::BetweenHosts(a, b, distr) => {
                    links.insert((a.to_string(), b.to_string()), distr);
                    links.insert((b.to_string(), a.to_string()), distr);
                }
            }
        }
        Self {
            default,
            links,
            randomizer,
        }
    }

    pub(crate) fn sample(&mut self, from: &str, to: &str) -> Jiffies {
        let distr = self
            .links
            .get(&(from.to_string(), to.to_string()))
            .copied()
            .unwrap_or(self.default);
        let latency = self.randomizer.sample(distr);
        debug!("Latency {from} -> {to}: {latency}");
        latency
    }
}
